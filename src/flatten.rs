use std::ops::Range;

use tracing::debug;

use crate::error::FlattenError;
use crate::instruction::{Command, Instruction};

/// Limits applied while expanding `for` blocks.
#[derive(Debug, Clone)]
pub struct FlattenConfig {
    /// Maximum number of nested `for` blocks.
    pub max_depth: usize,
    /// Maximum length of the expanded instruction sequence.
    pub max_len: usize,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        Self {
            max_depth: 16,
            max_len: 1 << 20,
        }
    }
}

/// Expand every `for` block into a repetition-free instruction sequence.
///
/// `for COUNT LEN` owns the next `LEN` command lines. Its body is expanded
/// recursively (nested headers are replaced by their own expansion and the
/// lines they own are not emitted again), then repeated `COUNT` times in
/// place of the header. A body that would run past its enclosing block is
/// cut at the block's end.
pub fn flatten(
    commands: &[Command],
    config: &FlattenConfig,
) -> Result<Vec<Instruction>, FlattenError> {
    let mut out = Vec::new();
    expand_block(commands, 0..commands.len(), 0, config, &mut out)?;
    debug!(lines = commands.len(), instructions = out.len(), "program flattened");
    Ok(out)
}

fn expand_block(
    commands: &[Command],
    block: Range<usize>,
    depth: usize,
    config: &FlattenConfig,
    out: &mut Vec<Instruction>,
) -> Result<(), FlattenError> {
    let mut line = block.start;
    while line < block.end {
        match commands[line] {
            Command::Op(instruction) => {
                if out.len() >= config.max_len {
                    return Err(FlattenError::TooLong { limit: config.max_len });
                }
                out.push(instruction);
                line += 1;
            }
            Command::For { count, len } => {
                if depth >= config.max_depth {
                    return Err(FlattenError::NestingTooDeep {
                        line,
                        limit: config.max_depth,
                    });
                }
                let body_end = (line + 1 + usize::from(len)).min(block.end);
                let start = out.len();
                expand_block(commands, line + 1..body_end, depth + 1, config, out)?;

                let body_len = out.len() - start;
                let total = body_len
                    .checked_mul(usize::from(count))
                    .and_then(|n| n.checked_add(start));
                match total {
                    Some(total) if total <= config.max_len => {}
                    _ => return Err(FlattenError::TooLong { limit: config.max_len }),
                }
                if count == 0 {
                    out.truncate(start);
                }
                for _ in 1..count {
                    out.extend_from_within(start..start + body_len);
                }
                line = body_end;
            }
        }
    }
    Ok(())
}
