use std::fmt;

use tracing::debug;

use crate::error::{ErrorKind, ValidationError};

/// A tokenized command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// 0-based line number in the source text.
    pub source_line: usize,
    pub tokens: Vec<String>,
}

impl Line {
    pub fn operand(&self) -> &str {
        self.tokens.first().map(String::as_str).unwrap_or("")
    }

    /// Parameter `p` (1-based), or the empty placeholder when missing.
    pub fn param(&self, p: usize) -> &str {
        self.tokens.get(p).map(String::as_str).unwrap_or("")
    }
}

/// Tokenize source text lines, dropping blank lines and lines that do not
/// start with a letter.
pub fn parse_lines<S: AsRef<str>>(source: &[S]) -> Vec<Line> {
    source
        .iter()
        .enumerate()
        .filter_map(|(source_line, raw)| {
            let text = raw.as_ref().trim();
            match text.chars().next() {
                Some(c) if c.is_alphabetic() => Some(Line {
                    source_line,
                    tokens: text.split_whitespace().map(str::to_owned).collect(),
                }),
                _ => None,
            }
        })
        .collect()
}

/// Set of travel directions, one bit per direction in the low nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Directions(u8);

impl Directions {
    /// Returns `None` when no direction bit is set.
    pub fn new(mask: u64) -> Option<Self> {
        let bits = (mask & 0x0F) as u8;
        (bits != 0).then_some(Directions(bits))
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    /// Enabled directions in ascending order.
    pub fn iter(self) -> impl Iterator<Item = u8> {
        (0..4u8).filter(move |d| self.0 & (1 << d) != 0)
    }
}

/// Comparison flags for `condition`:
/// bit 0 = equal, bit 1 = greater, bit 2 = smaller, bit 3 = negate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionMask(u8);

impl ConditionMask {
    const EQUAL: u8 = 0b0001;
    const GREATER: u8 = 0b0010;
    const SMALLER: u8 = 0b0100;
    const NEGATE: u8 = 0b1000;

    /// Returns `None` when none of the three comparison bits is set.
    pub fn new(mask: u64) -> Option<Self> {
        let bits = (mask & 0x0F) as u8;
        (bits & 0b0111 != 0).then_some(ConditionMask(bits))
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    /// Evaluate the condition for the current sound sum against `value`.
    pub fn holds(self, sound_sum: u8, value: u8) -> bool {
        let raw = (self.0 & Self::SMALLER != 0 && sound_sum < value)
            || (self.0 & Self::GREATER != 0 && sound_sum > value)
            || (self.0 & Self::EQUAL != 0 && sound_sum == value);
        raw ^ (self.0 & Self::NEGATE != 0)
    }
}

/// One executable instruction. `for` never appears here; it is consumed by
/// flattening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Nop {
        ticks: Option<u8>,
    },
    Send {
        directions: Directions,
        distance: u8,
        intensity: u8,
    },
    Wall {
        directions: Directions,
        distance: u8,
    },
    Redirect {
        directions: Directions,
        distance: u8,
        parity: Option<u64>,
    },
    Predirect {
        directions: Directions,
        distance: u8,
        parity: Option<u64>,
    },
    Print,
    Condition {
        mask: ConditionMask,
        value: u8,
        offset: u8,
    },
    PCondition {
        mask: ConditionMask,
        value: u8,
        offset: u8,
    },
    Input {
        directions: Directions,
        distance: u8,
    },
    Exit,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Instruction::Nop { ticks: None } => write!(f, "nop"),
            Instruction::Nop { ticks: Some(n) } => write!(f, "nop {n}"),
            Instruction::Send {
                directions,
                distance,
                intensity,
            } => {
                write!(f, "send {} {distance} {intensity}", directions.bits())
            }
            Instruction::Wall { directions, distance } => {
                write!(f, "wall {} {distance}", directions.bits())
            }
            Instruction::Redirect {
                directions,
                distance,
                parity,
            }
            | Instruction::Predirect {
                directions,
                distance,
                parity,
            } => {
                let name = if matches!(self, Instruction::Redirect { .. }) {
                    "redirect"
                } else {
                    "predirect"
                };
                write!(f, "{name} {} {distance}", directions.bits())?;
                match parity {
                    Some(p) => write!(f, " {p}"),
                    None => Ok(()),
                }
            }
            Instruction::Print => write!(f, "print"),
            Instruction::Condition {
                mask,
                value,
                offset,
            } => {
                write!(f, "condition {} {value} {offset}", mask.bits())
            }
            Instruction::PCondition {
                mask,
                value,
                offset,
            } => {
                write!(f, "pcondition {} {value} {offset}", mask.bits())
            }
            Instruction::Input { directions, distance } => {
                write!(f, "input {} {distance}", directions.bits())
            }
            Instruction::Exit => write!(f, "exit"),
        }
    }
}

/// A validated command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Repeat the next `len` command lines `count` times.
    For { count: u8, len: u8 },
    Op(Instruction),
}

/// A decimal literal made only of ASCII digits.
///
/// Values that overflow `u64` keep their low bits (masks only look at those)
/// and are flagged as inexact, which puts them outside every range.
#[derive(Debug, Clone, Copy)]
struct Literal {
    value: u64,
    exact: bool,
}

impl Literal {
    fn parse(token: &str) -> Option<Self> {
        if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let mut lit = Literal {
            value: 0,
            exact: true,
        };
        for b in token.bytes() {
            let digit = u64::from(b - b'0');
            match lit.value.checked_mul(10).and_then(|v| v.checked_add(digit)) {
                Some(v) => lit.value = v,
                None => {
                    lit.exact = false;
                    lit.value = lit.value.wrapping_mul(10).wrapping_add(digit);
                }
            }
        }
        Some(lit)
    }

    /// `lo < value < hi`, both bounds exclusive.
    fn in_range(self, lo: i64, hi: i64) -> bool {
        self.exact && (lo as i128) < self.value as i128 && (self.value as i128) < hi as i128
    }
}

/// Parameter checks for one line, in the order the error kinds are reported.
struct Params<'a> {
    line: &'a Line,
}

impl Params<'_> {
    fn number(&self, p: usize) -> Result<Literal, ErrorKind> {
        Literal::parse(self.line.param(p)).ok_or(ErrorKind::NotANumber(p))
    }

    fn optional(&self, p: usize) -> Result<Option<Literal>, ErrorKind> {
        if self.line.param(p).is_empty() {
            Ok(None)
        } else {
            self.number(p).map(Some)
        }
    }

    fn ranged(&self, p: usize, lo: i64, hi: i64) -> Result<u8, ErrorKind> {
        let lit = self.number(p)?;
        if lit.in_range(lo, hi) {
            Ok(lit.value as u8)
        } else {
            Err(ErrorKind::InvalidRange(p))
        }
    }

    fn byte(&self, p: usize) -> Result<u8, ErrorKind> {
        self.ranged(p, 0, 256)
    }

    fn directions(&self, p: usize) -> Result<Directions, ErrorKind> {
        Directions::new(self.number(p)?.value).ok_or(ErrorKind::InvalidDirectionMask(p))
    }

    fn condition(&self, p: usize) -> Result<ConditionMask, ErrorKind> {
        ConditionMask::new(self.number(p)?.value).ok_or(ErrorKind::InvalidConditionMask(p))
    }
}

/// Decode a single line without looking at its neighbours.
fn decode(line: &Line) -> Result<Command, ErrorKind> {
    if line.tokens.len() > 4 {
        return Err(ErrorKind::TooManyParameters);
    }
    let params = Params { line };
    let op = match line.operand() {
        "nop" => {
            let ticks = match params.optional(1)? {
                None => None,
                Some(lit) if lit.in_range(0, 256) => Some(lit.value as u8),
                Some(_) => return Err(ErrorKind::InvalidRange(1)),
            };
            Instruction::Nop { ticks }
        }
        "send" => Instruction::Send {
            directions: params.directions(1)?,
            distance: params.byte(2)?,
            intensity: params.byte(3)?,
        },
        "redirect" | "predirect" => {
            let directions = params.directions(1)?;
            let distance = params.byte(2)?;
            let parity = params.optional(3)?.map(|lit| lit.value);
            if line.operand() == "redirect" {
                Instruction::Redirect {
                    directions,
                    distance,
                    parity,
                }
            } else {
                Instruction::Predirect {
                    directions,
                    distance,
                    parity,
                }
            }
        }
        "condition" | "pcondition" => {
            let mask = params.condition(1)?;
            let value = params.ranged(2, -1, 256)?;
            let offset = params.byte(3)?;
            if line.operand() == "condition" {
                Instruction::Condition {
                    mask,
                    value,
                    offset,
                }
            } else {
                Instruction::PCondition {
                    mask,
                    value,
                    offset,
                }
            }
        }
        "for" => {
            return Ok(Command::For {
                count: params.byte(1)?,
                len: params.byte(2)?,
            });
        }
        "input" => Instruction::Input {
            directions: params.directions(1)?,
            distance: params.byte(2)?,
        },
        "wall" => Instruction::Wall {
            directions: params.directions(1)?,
            distance: params.byte(2)?,
        },
        "print" => Instruction::Print,
        "exit" => Instruction::Exit,
        _ => return Err(ErrorKind::UnknownCommand),
    };
    Ok(Command::Op(op))
}

/// Validate every line and decode it into a [`Command`].
///
/// Runs once over the whole program before anything executes; the first bad
/// line aborts it. Besides per-line parameter checks, every `for` body must end inside the
/// program and inside any block enclosing it.
pub fn validate(lines: &[Line]) -> Result<Vec<Command>, ValidationError> {
    let mut commands = Vec::with_capacity(lines.len());
    // Inclusive last line of each open block, innermost last.
    let mut open_blocks: Vec<usize> = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        let fail = |kind: ErrorKind| ValidationError {
            line: index,
            source_line: line.source_line,
            kind,
            tokens: line.tokens.clone(),
        };

        let command = decode(line).map_err(fail)?;

        while open_blocks.last().is_some_and(|&end| end < index) {
            open_blocks.pop();
        }
        if let Command::For { len, .. } = command {
            let end = index + usize::from(len);
            let enclosing_end = open_blocks.last().copied().unwrap_or(lines.len() - 1);
            if end > enclosing_end {
                return Err(fail(ErrorKind::UnclosedBlock(2)));
            }
            open_blocks.push(end);
        }

        commands.push(command);
    }

    debug!(lines = commands.len(), "program validated");
    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(source: &[&str]) -> Vec<Line> {
        parse_lines(source)
    }

    fn first_error(source: &[&str]) -> ValidationError {
        validate(&lines(source)).unwrap_err()
    }

    // --- Tokenizer ---

    #[test]
    fn test_parse_skips_blank_and_non_letter_lines() {
        let parsed = lines(&["", "  send 1 1 5  ", "# comment", "1 2 3", "\tprint"]);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].source_line, 1);
        assert_eq!(parsed[0].tokens, vec!["send", "1", "1", "5"]);
        assert_eq!(parsed[1].source_line, 4);
        assert_eq!(parsed[1].operand(), "print");
        assert_eq!(parsed[1].param(1), "");
    }

    // --- Masks ---

    #[test]
    fn test_directions_iter() {
        let dirs = Directions::new(0b1010).unwrap();
        assert_eq!(dirs.iter().collect::<Vec<_>>(), vec![1, 3]);
        assert!(Directions::new(16).is_none());
        assert_eq!(Directions::new(17).unwrap().bits(), 1);
    }

    #[test]
    fn test_condition_mask_requires_comparison_bit() {
        assert!(ConditionMask::new(8).is_none());
        assert!(ConditionMask::new(0).is_none());
        assert!(ConditionMask::new(9).is_some());
    }

    #[test]
    fn test_condition_holds() {
        let eq = ConditionMask::new(1).unwrap();
        assert!(eq.holds(7, 7));
        assert!(!eq.holds(7, 8));
        let gt = ConditionMask::new(2).unwrap();
        assert!(gt.holds(9, 8));
        assert!(!gt.holds(8, 8));
        let le = ConditionMask::new(0b0101).unwrap();
        assert!(le.holds(3, 8));
        assert!(le.holds(8, 8));
        assert!(!le.holds(9, 8));
    }

    #[test]
    fn test_negated_equal_on_zero() {
        // equal + greater + negate, sum 0 against 0: raw true, negated false.
        let mask = ConditionMask::new(0b1011).unwrap();
        assert!(!mask.holds(0, 0));
        assert!(!mask.holds(1, 0));
        assert!(ConditionMask::new(0b1001).unwrap().holds(1, 0));
    }

    // --- Decoding ---

    #[test]
    fn test_decode_all_operands() {
        let commands = validate(&lines(&[
            "nop",
            "nop 4",
            "send 3 10 200",
            "wall 8 2",
            "redirect 1 5",
            "redirect 1 5 3",
            "predirect 2 5",
            "print",
            "condition 9 0 2",
            "pcondition 4 255 1",
            "for 2 1",
            "input 15 3",
            "exit",
        ]))
        .unwrap();
        assert_eq!(commands.len(), 13);
        assert_eq!(commands[0], Command::Op(Instruction::Nop { ticks: None }));
        assert_eq!(commands[1], Command::Op(Instruction::Nop { ticks: Some(4) }));
        assert_eq!(
            commands[2],
            Command::Op(Instruction::Send {
                directions: Directions::new(3).unwrap(),
                distance: 10,
                intensity: 200,
            })
        );
        assert_eq!(
            commands[5],
            Command::Op(Instruction::Redirect {
                directions: Directions::new(1).unwrap(),
                distance: 5,
                parity: Some(3),
            })
        );
        assert_eq!(commands[10], Command::For { count: 2, len: 1 });
        assert_eq!(commands[12], Command::Op(Instruction::Exit));
    }

    #[test]
    fn test_display_round_trips_text() {
        let source = ["send 3 10 200", "redirect 1 5 3", "nop", "condition 9 0 2"];
        let commands = validate(&lines(&source)).unwrap();
        let text: Vec<String> = commands
            .iter()
            .map(|c| match c {
                Command::Op(i) => i.to_string(),
                Command::For { .. } => unreachable!(),
            })
            .collect();
        assert_eq!(text, source);
    }

    // --- Errors ---

    #[test]
    fn test_unknown_command() {
        let err = first_error(&["print", "shout 1 2"]);
        assert_eq!(err.line, 1);
        assert_eq!(err.kind, ErrorKind::UnknownCommand);
        assert_eq!(err.tokens, vec!["shout", "1", "2"]);
    }

    #[test]
    fn test_direction_mask_without_low_bits() {
        let err = first_error(&["send 16 1 5"]);
        assert_eq!(err.kind, ErrorKind::InvalidDirectionMask(1));
        assert_eq!(err.line, 0);
    }

    #[test]
    fn test_send_checks_in_order() {
        assert_eq!(first_error(&["send"]).kind, ErrorKind::NotANumber(1));
        assert_eq!(first_error(&["send 1"]).kind, ErrorKind::NotANumber(2));
        assert_eq!(first_error(&["send 1 0 5"]).kind, ErrorKind::InvalidRange(2));
        assert_eq!(first_error(&["send 1 256 5"]).kind, ErrorKind::InvalidRange(2));
        assert_eq!(first_error(&["send 1 1"]).kind, ErrorKind::NotANumber(3));
        assert_eq!(first_error(&["send 1 1 0"]).kind, ErrorKind::InvalidRange(3));
        assert_eq!(first_error(&["send 1 1 -5"]).kind, ErrorKind::NotANumber(3));
    }

    #[test]
    fn test_nop_parameter_optional_but_ranged() {
        assert!(validate(&lines(&["nop", "nop 255"])).is_ok());
        assert_eq!(first_error(&["nop 0"]).kind, ErrorKind::InvalidRange(1));
        assert_eq!(first_error(&["nop x"]).kind, ErrorKind::NotANumber(1));
    }

    #[test]
    fn test_redirect_parity_any_number() {
        assert!(validate(&lines(&["redirect 1 1 0", "redirect 1 1 99999"])).is_ok());
        assert_eq!(first_error(&["redirect 1 1 odd"]).kind, ErrorKind::NotANumber(3));
    }

    #[test]
    fn test_condition_value_accepts_zero() {
        assert!(validate(&lines(&["condition 1 0 1", "exit"])).is_ok());
        assert_eq!(first_error(&["condition 8 0 1"]).kind, ErrorKind::InvalidConditionMask(1));
        assert_eq!(first_error(&["condition 1 256 1"]).kind, ErrorKind::InvalidRange(2));
        assert_eq!(first_error(&["condition 1 0 0"]).kind, ErrorKind::InvalidRange(3));
    }

    #[test]
    fn test_huge_literal_out_of_range_but_masks_use_low_bits() {
        assert_eq!(
            first_error(&["send 1 1 100000000000000000000000"]).kind,
            ErrorKind::InvalidRange(3)
        );
        // 10^24 is divisible by 16, so no direction bit survives.
        assert_eq!(
            first_error(&["wall 1000000000000000000000000 1"]).kind,
            ErrorKind::InvalidDirectionMask(1)
        );
        assert!(validate(&lines(&["wall 1000000000000000000000001 1"])).is_ok());
    }

    #[test]
    fn test_too_many_parameters() {
        assert_eq!(first_error(&["send 1 1 5 6"]).kind, ErrorKind::TooManyParameters);
    }

    #[test]
    fn test_first_error_wins() {
        let err = first_error(&["send 1 1 5", "wall 0 1", "bogus"]);
        assert_eq!(err.line, 1);
        assert_eq!(err.kind, ErrorKind::InvalidDirectionMask(1));
    }

    #[test]
    fn test_error_reports_source_line() {
        let err = first_error(&["", "print", "", "wall 1 0"]);
        assert_eq!(err.line, 1);
        assert_eq!(err.source_line, 3);
        assert_eq!(err.to_string(), "line 3: Invalid range (parameter 2) : wall 1 0");
    }

    // --- Block structure ---

    #[test]
    fn test_block_past_end_of_program() {
        let err = first_error(&["for 2 2", "print"]);
        assert_eq!(err.kind, ErrorKind::UnclosedBlock(2));
    }

    #[test]
    fn test_block_past_enclosing_block() {
        let err = first_error(&["for 2 2", "print", "for 3 1", "print"]);
        assert_eq!(err.line, 2);
        assert_eq!(err.kind, ErrorKind::UnclosedBlock(2));
    }

    #[test]
    fn test_nested_blocks_accepted() {
        assert!(validate(&lines(&["for 2 3", "for 3 1", "send 1 1 5", "print", "exit"])).is_ok());
    }
}
