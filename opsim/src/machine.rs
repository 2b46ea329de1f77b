//! # Machines
//! A [`Machine`] owns the storage of one kind of toy machine (an operand stack, a
//! register file...) and knows how to run a single decoded instruction on it.
//!
//! Fetching lines, skipping labels, moving the program counter and pausing on
//! breakpoints are left to the [`Execution`](crate::execution::Execution) driving it,
//! so every machine shares the same front end and the same control loop.

use alloc::string::String;
use core::fmt::{Display, Formatter};
use opasm::{Dialect, Instruction, LabelTable};

use crate::host::Host;

/// How the program counter moves after an instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Flow {
    /// Continue with the following line.
    Next,
    /// Continue at the given line.
    Jump(usize),
}

pub trait Machine {
    /// Executes a single instruction, modifying the machine's state.
    ///
    /// Unknown opcodes and malformed operands never fail: they are logged and
    /// treated as no-ops, or produce `NaN` values.
    fn execute<H: Host>(
        &mut self,
        instruction: &Instruction<'_>,
        labels: &LabelTable,
        dialect: &Dialect,
        host: &mut H,
    ) -> Flow;

    /// Human readable dump of the machine's state.
    fn snapshot(&self) -> String;
}

/// Resolves the label operand of a jump. Missing operands and undeclared labels
/// both fall through.
pub(crate) fn jump_target(instruction: &Instruction<'_>, labels: &LabelTable) -> Flow {
    instruction
        .operand(0)
        .and_then(|label| labels.get(label))
        .map_or(Flow::Next, Flow::Jump)
}

/// Errors of the host-facing API. Programs themselves never fail.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MachineError {
    UnknownRegister(String),
    /// Register names are at most [`REGISTER_NAME_LENGTH`](crate::registers::REGISTER_NAME_LENGTH)
    /// ASCII bytes long.
    InvalidRegisterName(String),
    /// A register file holds at most [`MAX_REGISTERS`](crate::registers::MAX_REGISTERS) registers.
    TooManyRegisters,
    /// [`resume`](crate::execution::Execution::resume) was called while not paused.
    NotPaused,
}
impl Display for MachineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnknownRegister(name) => write!(f, "unknown register `{name}`"),
            Self::InvalidRegisterName(name) => write!(f, "invalid register name `{name}`"),
            Self::TooManyRegisters => f.write_str("too many registers"),
            Self::NotPaused => f.write_str("execution is not paused at a breakpoint"),
        }
    }
}
