use std::io::{self, BufRead, Write};

use crate::port::Port;

/// Prompt shown before every `input` read.
pub const INPUT_PROMPT: &str = "Character input : ";

/// A [`Port`] over a line reader and an output stream.
///
/// Output is flushed after every write so that character-mode prints show up
/// before the next prompt.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }
}

impl Console<io::StdinLock<'static>, io::Stdout> {
    /// A console on the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Port for Console<R, W> {
    fn read_line(&mut self) -> io::Result<String> {
        self.output.write_all(INPUT_PROMPT.as_bytes())?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(line)
    }

    fn write_output(&mut self, text: &str) -> io::Result<()> {
        self.output.write_all(text.as_bytes())?;
        self.output.flush()
    }
}
