pub mod entity;
pub mod error;
pub mod instruction;
pub mod flatten;
pub mod system;
pub mod port;
pub mod render;
pub mod machine;
pub mod console;

pub use error::{Error, Result};
pub use flatten::{FlattenConfig, flatten};
pub use instruction::{Instruction, parse_lines, validate};
pub use machine::{Machine, MachineConfig, run};
pub use port::{FrameLog, Port, PrintStyle};

/// Tokenize, validate and flatten source text into a runnable program.
pub fn compile<S: AsRef<str>>(source: &[S], config: &FlattenConfig) -> Result<Vec<Instruction>> {
    let commands = validate(&parse_lines(source))?;
    Ok(flatten(&commands, config)?)
}
