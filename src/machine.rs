use std::io;

use tracing::{debug, trace};

use crate::instruction::{Directions, Instruction};
use crate::port::{Frame, FrameLog, Port, PrintStyle};
use crate::system::System;

/// Configuration for a program run.
#[derive(Debug, Clone)]
pub struct MachineConfig {
    /// How `print` emits the sound sum.
    pub print_style: PrintStyle,
    /// Minimum number of distance cells drawn per direction in a frame.
    pub min_width: usize,
    /// Render a frame after every tick.
    pub record_frames: bool,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            print_style: PrintStyle::Ascii,
            min_width: 10,
            record_frames: true,
        }
    }
}

/// The execution engine.
///
/// Each step dispatches at most one instruction and then advances the
/// simulation by exactly one tick. While a `nop` countdown is pending, steps
/// dispatch nothing but still tick.
pub struct Machine<'p> {
    program: &'p [Instruction],
    pub system: System,
    pointer: usize,
    noop_counter: usize,
    exited: bool,
    last: Option<&'p Instruction>,
    config: MachineConfig,
    frames: FrameLog,
}

impl<'p> Machine<'p> {
    pub fn new(program: &'p [Instruction], config: MachineConfig) -> Self {
        Self {
            program,
            system: System::new(),
            pointer: 0,
            noop_counter: 0,
            exited: false,
            last: None,
            config,
            frames: FrameLog::default(),
        }
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn noop_counter(&self) -> usize {
        self.noop_counter
    }

    pub fn exited(&self) -> bool {
        self.exited
    }

    pub fn frames(&self) -> &FrameLog {
        &self.frames
    }

    /// True while there is an instruction left to run or a `nop` pending.
    pub fn is_running(&self) -> bool {
        !self.exited && (self.pointer < self.program.len() || self.noop_counter > 0)
    }

    /// Run one iteration of the execution loop. Returns false, doing
    /// nothing, once the machine has stopped.
    pub fn step<P: Port>(&mut self, port: &mut P) -> io::Result<bool> {
        if !self.is_running() {
            return Ok(false);
        }

        if self.noop_counter == 0 {
            let program = self.program;
            let instruction = &program[self.pointer];
            trace!(pointer = self.pointer, %instruction, "dispatch");
            self.last = Some(instruction);
            let jump = self.execute(instruction, port)?;
            self.pointer += 1 + jump;
        } else {
            self.noop_counter -= 1;
        }

        self.system.tick();

        if self.config.record_frames {
            let frame = Frame {
                instruction: self.last,
                sounds: &self.system.sounds,
                walls: &self.system.walls,
                sound_sum: self.system.sound_sum,
                min_width: self.config.min_width,
            };
            let rendered = port.render_frame(&frame);
            self.frames.push(rendered);
        }
        Ok(true)
    }

    /// Run until `exit` or the end of the program and return the frame log.
    pub fn run<P: Port>(mut self, port: &mut P) -> io::Result<FrameLog> {
        debug!(instructions = self.program.len(), "run started");
        let mut ticks = 0usize;
        while self.step(port)? {
            ticks += 1;
        }
        debug!(ticks, exited = self.exited, "run finished");
        Ok(self.frames)
    }

    /// Apply one instruction. Returns the extra jump added to the pointer on
    /// top of the regular advance by one.
    fn execute<P: Port>(&mut self, instruction: &Instruction, port: &mut P) -> io::Result<usize> {
        match *instruction {
            Instruction::Nop { ticks } => {
                self.noop_counter = ticks.map_or(0, |n| usize::from(n).saturating_sub(1));
            }
            Instruction::Send {
                directions,
                distance,
                intensity,
            } => {
                self.send_all(directions, u32::from(intensity), distance);
            }
            Instruction::Wall { directions, distance } => {
                for direction in directions.iter() {
                    self.system.spawn_wall(direction, u32::from(distance));
                }
            }
            Instruction::Redirect {
                directions,
                distance,
                parity,
            } => {
                let sum = u32::from(self.system.sound_sum);
                let intensity = if parity.is_none_or(|p| p & 1 == 0) {
                    sum
                } else {
                    256 - sum
                };
                self.send_all(directions, intensity, distance);
            }
            Instruction::Predirect {
                directions,
                distance,
                ..
            } => {
                self.print(port)?;
                self.send_all(directions, u32::from(self.system.sound_sum), distance);
            }
            Instruction::Print => self.print(port)?,
            Instruction::Condition {
                mask,
                value,
                offset,
            } => {
                if mask.holds(self.system.sound_sum, value) {
                    return Ok(usize::from(offset));
                }
            }
            Instruction::PCondition {
                mask,
                value,
                offset,
            } => {
                self.print(port)?;
                if mask.holds(self.system.sound_sum, value) {
                    return Ok(usize::from(offset));
                }
            }
            Instruction::Input { directions, distance } => {
                let text = port.read_line()?;
                let intensity = parse_input(&text);
                trace!(text = %text, intensity, "input");
                self.send_all(directions, intensity, distance);
            }
            Instruction::Exit => self.exited = true,
        }
        Ok(0)
    }

    fn send_all(&mut self, directions: Directions, intensity: u32, distance: u8) {
        for direction in directions.iter() {
            self.system.send(direction, intensity, u32::from(distance));
        }
    }

    fn print<P: Port>(&mut self, port: &mut P) -> io::Result<()> {
        port.write_output(&self.config.print_style.format(self.system.sound_sum))
    }
}

/// Run a flattened program to completion.
pub fn run<P: Port>(
    program: &[Instruction],
    port: &mut P,
    config: MachineConfig,
) -> io::Result<FrameLog> {
    Machine::new(program, config).run(port)
}

/// Turn one line of user input into an intensity.
///
/// An empty line is 0, a backslash followed by digits is that number mod
/// 256, and anything else is the code point of the first character (which
/// may exceed 255, in which case no sound is emitted).
pub fn parse_input(text: &str) -> u32 {
    let Some(first) = text.chars().next() else {
        return 0;
    };
    if let Some(digits) = text.strip_prefix('\\') {
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return digits
                .bytes()
                .fold(0u32, |acc, b| (acc * 10 + u32::from(b - b'0')) % 256);
        }
    }
    u32::from(first)
}
