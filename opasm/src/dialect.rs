//! # Dialects
//! The stack machine and the register machines read almost the same language. The
//! few places where they disagree are captured as policies in a [`Dialect`].

use crate::Word;

/// Registers known to the register machines unless the host says otherwise.
pub const DEFAULT_REGISTERS: [&str; 4] = ["EAX", "EBX", "ECX", "EDX"];

/// Display marker a patching host puts in front of disabled lines.
pub const NOP_MARKER: &str = "[NOP] ";

/// Where a jump to a label lands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LabelTarget {
    /// On the label line itself, which is then skipped by the execution loop.
    Label,
    /// Directly on the line following the label.
    NextLine,
}

/// Meaning of a `$` prefixed operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DollarPrefix {
    /// `$1F` is the hexadecimal literal `0x1F`.
    Hexadecimal,
    /// `$3` reads host variable 3, like `V[3]`.
    Variable,
}

/// What to do with lines carrying the [`NOP_MARKER`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NopMarker {
    /// Strip the marker and execute the underlying instruction.
    Execute,
    /// Decode the whole line as a `NOP`.
    Skip,
}

/// How much of a numeric literal has to be digits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Digits {
    /// The whole token: `12abc` is `NaN`.
    Whole,
    /// Its longest leading run only: `12abc` is `12`, `3.9` is `3`, `0x1G` is `1`.
    Leading,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Dialect {
    /// Whether `,` cuts lines like `\n` does.
    pub comma_separates_lines: bool,
    pub label_target: LabelTarget,
    pub dollar_prefix: DollarPrefix,
    pub digits: Digits,
    pub nop_marker: NopMarker,
    /// Whether `BRK` pauses execution. Without it, `BRK` is an unknown opcode.
    pub breakpoints: bool,
    /// Value of an operand that is absent altogether.
    pub empty_operand: Word,
}
impl Dialect {
    /// Dialect of the stack machine: `PUSH 5, PUSH $A, ADD`.
    pub const STACK: Self = Self {
        comma_separates_lines: true,
        label_target: LabelTarget::Label,
        dollar_prefix: DollarPrefix::Hexadecimal,
        digits: Digits::Whole,
        nop_marker: NopMarker::Execute,
        breakpoints: false,
        empty_operand: Word::NaN,
    };

    /// Dialect of the register machine: `MOV EAX, 0x10`.
    pub const REGISTER: Self = Self {
        comma_separates_lines: false,
        label_target: LabelTarget::NextLine,
        dollar_prefix: DollarPrefix::Variable,
        digits: Digits::Leading,
        nop_marker: NopMarker::Execute,
        breakpoints: false,
        empty_operand: Word::ZERO,
    };

    /// Register machine dialect where `BRK` pauses execution.
    pub const DEBUGGER: Self = Self {
        breakpoints: true,
        ..Self::REGISTER
    };
}
impl Default for Dialect {
    fn default() -> Self {
        Self::STACK
    }
}
