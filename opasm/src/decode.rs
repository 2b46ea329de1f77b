//! # Instruction decoding
//! A line decodes into an [`Opcode`] and up to two operands. Operands are kept as
//! text: whether `EAX` names a register or is a (malformed) literal can only be
//! decided by the machine running the instruction. Literal operands are read with
//! [`parse_literal`].

use heapless::Vec;

use crate::{Dialect, Digits, DollarPrefix, NopMarker, Word, NOP_MARKER};

/// Operations understood by at least one of the machines.
///
/// Each machine decides which of these it implements, the rest being treated as
/// unknown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Stack machine
    Push,
    Mul,
    Div,
    Mod,
    Dup,
    Swap,
    IfZero,
    IfNotZero,

    // Register machine
    Mov,
    Xor,
    Cmp,
    Jz,
    Jnz,
    Call,
    Nop,
    Brk,

    // Shared
    Add,
    Sub,
    Jmp,
    Print,

    Unknown,
}

const MNEMONICS: [(&str, Opcode); 20] = [
    ("PUSH", Opcode::Push),
    ("MUL", Opcode::Mul),
    ("DIV", Opcode::Div),
    ("MOD", Opcode::Mod),
    ("DUP", Opcode::Dup),
    ("SWAP", Opcode::Swap),
    ("IFZERO", Opcode::IfZero),
    ("IFNZERO", Opcode::IfNotZero),
    ("MOV", Opcode::Mov),
    ("XOR", Opcode::Xor),
    ("CMP", Opcode::Cmp),
    ("JZ", Opcode::Jz),
    ("JNZ", Opcode::Jnz),
    ("CALL", Opcode::Call),
    ("NOP", Opcode::Nop),
    ("BRK", Opcode::Brk),
    ("ADD", Opcode::Add),
    ("SUB", Opcode::Sub),
    ("JMP", Opcode::Jmp),
    ("PRINT", Opcode::Print),
];

impl Opcode {
    /// Looks up a mnemonic, ignoring case.
    /// # Example
    /// ```rust
    /// # use opasm::Opcode;
    /// assert_eq!(Opcode::from_mnemonic("ifNZero"), Opcode::IfNotZero);
    /// assert_eq!(Opcode::from_mnemonic("FOO"), Opcode::Unknown);
    /// ```
    pub fn from_mnemonic(mnemonic: &str) -> Self {
        MNEMONICS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(mnemonic))
            .map_or(Self::Unknown, |&(_, opcode)| opcode)
    }

    /// Canonical mnemonic of this opcode, `None` for [`Opcode::Unknown`].
    pub fn mnemonic(self) -> Option<&'static str> {
        MNEMONICS
            .iter()
            .find(|&&(_, opcode)| opcode == self)
            .map(|&(name, _)| name)
    }

    /// Whether the operand of this opcode names a label.
    pub fn is_jump(self) -> bool {
        matches!(
            self,
            Self::Jmp | Self::Jz | Self::Jnz | Self::IfZero | Self::IfNotZero | Self::Call
        )
    }
}

/// A decoded literal operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Literal {
    Value(Word),
    /// Reference to a host variable, read at execution time.
    Variable(u32),
}

/// Reads an operand as a literal. Rules are checked in order:
/// - `V[n]` references host variable `n`.
/// - `0x` prefixed digits are hexadecimal.
/// - `$` prefixed digits are hexadecimal, or a host variable, depending on the dialect.
/// - anything else is a signed decimal integer.
///
/// Whether trailing garbage is tolerated after the digits is up to the dialect's
/// [`Digits`] policy. Anything that fails these rules is [`Word::NaN`].
/// # Example
/// ```rust
/// # use opasm::*;
/// let (stack, register) = (&Dialect::STACK, &Dialect::REGISTER);
/// assert_eq!(parse_literal("0x1f", stack), Literal::Value(Word::Int(31)));
/// assert_eq!(parse_literal("$1f", stack), Literal::Value(Word::Int(31)));
/// assert_eq!(parse_literal("$12", register), Literal::Variable(12));
/// assert_eq!(parse_literal("v[4]", stack), Literal::Variable(4));
/// assert_eq!(parse_literal("-42", register), Literal::Value(Word::Int(-42)));
/// assert_eq!(parse_literal("12abc", stack), Literal::Value(Word::NaN));
/// assert_eq!(parse_literal("12abc", register), Literal::Value(Word::Int(12)));
/// assert_eq!(parse_literal("EAX", register), Literal::Value(Word::NaN));
/// ```
pub fn parse_literal(token: &str, dialect: &Dialect) -> Literal {
    if let Some(id) = parse_variable_reference(token) {
        return Literal::Variable(id);
    }
    if let Some(digits) = strip_hex_prefix(token) {
        return Literal::Value(parse_digits(digits, 16, dialect.digits));
    }
    if let Some(rest) = token.strip_prefix('$') {
        return match dialect.dollar_prefix {
            DollarPrefix::Hexadecimal => {
                Literal::Value(parse_digits(rest, 16, dialect.digits))
            }
            DollarPrefix::Variable => rest
                .parse()
                .map_or(Literal::Value(Word::NaN), Literal::Variable),
        };
    }
    Literal::Value(parse_digits(token, 10, dialect.digits))
}

/// Reads an operand as an integer, accepting only decimal and `0x` hexadecimal forms.
pub fn parse_integer(token: &str) -> Option<i64> {
    match strip_hex_prefix(token) {
        Some(digits) => parse_digits(digits, 16, Digits::Whole),
        None => parse_digits(token, 10, Digits::Whole),
    }
    .as_int()
}

fn strip_hex_prefix(token: &str) -> Option<&str> {
    token
        .get(..2)
        .filter(|prefix| prefix.eq_ignore_ascii_case("0x"))
        .map(|_| &token[2..])
}

/// Parses digits of the given radix, signed when decimal.
fn parse_digits(token: &str, radix: u32, digits: Digits) -> Word {
    let unsigned = match radix {
        10 => token.strip_prefix(['+', '-']).unwrap_or(token),
        _ => token,
    };
    let end = unsigned
        .find(|c: char| !c.is_digit(radix))
        .unwrap_or(unsigned.len());
    if end == 0 || (digits == Digits::Whole && end != unsigned.len()) {
        return Word::NaN;
    }
    let length = token.len() - unsigned.len() + end;
    i64::from_str_radix(&token[..length], radix).map_or(Word::NaN, Word::Int)
}

/// Parses the `V[n]` form.
fn parse_variable_reference(token: &str) -> Option<u32> {
    let inner = token
        .strip_prefix('V')
        .or_else(|| token.strip_prefix('v'))?
        .strip_prefix('[')?
        .strip_suffix(']')?;
    if inner.is_empty() || !inner.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    inner.parse().ok()
}

/// A decoded line: an opcode with up to two operands borrowed from the line's text.
///
/// Operands beyond the second are ignored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction<'line> {
    pub opcode: Opcode,
    /// Mnemonic as written in the source.
    pub mnemonic: &'line str,
    pub operands: Vec<&'line str, 2>,
}
impl<'line> Instruction<'line> {
    /// Decodes a line of text. Trailing commas are stripped from operands.
    /// # Example
    /// ```rust
    /// # use opasm::*;
    /// let instruction = Instruction::decode("mov EAX, 0x10", &Dialect::REGISTER);
    /// assert_eq!(instruction.opcode, Opcode::Mov);
    /// assert_eq!(instruction.operands.as_slice(), &["EAX", "0x10"]);
    /// ```
    pub fn decode(text: &'line str, dialect: &Dialect) -> Self {
        let mut text = text.trim();
        if let Some(marked) = text.strip_prefix(NOP_MARKER) {
            match dialect.nop_marker {
                NopMarker::Execute => text = marked.trim(),
                NopMarker::Skip => {
                    return Self {
                        opcode: Opcode::Nop,
                        mnemonic: "NOP",
                        operands: Vec::new(),
                    }
                }
            }
        }

        let mut parts = text.split_whitespace();
        let mnemonic = parts.next().unwrap_or_default();
        let operands = parts
            .take(2)
            .map(|operand| operand.strip_suffix(',').unwrap_or(operand))
            .collect();
        Self {
            opcode: Opcode::from_mnemonic(mnemonic),
            mnemonic,
            operands,
        }
    }

    /// Returns the raw text of an operand.
    pub fn operand(&self, position: usize) -> Option<&'line str> {
        self.operands.get(position).copied()
    }

    /// Reads an operand as a literal, see [`parse_literal`]. A missing operand is the
    /// dialect's [`empty_operand`](Dialect::empty_operand).
    pub fn literal(&self, position: usize, dialect: &Dialect) -> Literal {
        match self.operand(position) {
            Some(token) => parse_literal(token, dialect),
            None => Literal::Value(dialect.empty_operand),
        }
    }
}
