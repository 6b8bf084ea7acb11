use std::io::{self, Write};

use crate::entity::{Sound, Wall};
use crate::instruction::Instruction;
use crate::render;

/// How `print` materializes the sound sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum PrintStyle {
    /// The sum as a single character (Latin-1), no separator.
    #[default]
    Ascii,
    /// The sum in decimal, one per line.
    Numbers,
}

impl PrintStyle {
    pub fn format(self, sound_sum: u8) -> String {
        match self {
            PrintStyle::Ascii => char::from(sound_sum).to_string(),
            PrintStyle::Numbers => format!("{sound_sum}\n"),
        }
    }
}

/// Machine state at the end of one tick, handed to the renderer.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    /// The most recently dispatched instruction.
    pub instruction: Option<&'a Instruction>,
    pub sounds: &'a [Sound],
    pub walls: &'a [Wall],
    pub sound_sum: u8,
    /// Minimum number of distance cells drawn per direction.
    pub min_width: usize,
}

/// The machine's connection to the outside world.
///
/// The execution engine calls into the port for the `input` instruction,
/// for every `print` side effect, and once per tick to render a frame. All
/// calls are synchronous; `read_line` blocks the whole machine until a line
/// arrives.
pub trait Port {
    /// Read one line of text, without its line terminator. End of input
    /// reads as an empty line.
    fn read_line(&mut self) -> io::Result<String>;

    /// Emit program output.
    fn write_output(&mut self, text: &str) -> io::Result<()>;

    /// Render one frame of the simulation.
    fn render_frame(&mut self, frame: &Frame<'_>) -> String {
        render::render(frame)
    }
}

/// Rendered frames, one per tick, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameLog {
    frames: Vec<String>,
}

impl FrameLog {
    pub fn push(&mut self, frame: String) {
        self.frames.push(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    /// Write all frames separated by newlines.
    pub fn write_to<W: Write>(&self, mut out: W) -> io::Result<()> {
        for (i, frame) in self.frames.iter().enumerate() {
            if i > 0 {
                out.write_all(b"\n")?;
            }
            out.write_all(frame.as_bytes())?;
        }
        out.flush()
    }
}
