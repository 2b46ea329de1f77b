//! # OpSim: toy stack and register machines
//! Interpreters for two tiny machines reading the line-oriented assembly of
//! [`opasm`]:
//! - a [stack machine](stack), evaluating expressions like `PUSH 5, PUSH 3, ADD`
//! - a [register machine](registers), running programs like `MOV EAX, 5` over a
//!   handful of named registers and a zero flag.
//!
//! Both are driven by the same resumable [`Execution`](execution::Execution), which
//! can pause on `BRK` lines and later resume, and both talk to the outside world
//! through a [`Host`](host::Host).
//!
//! This crate does not rely on `std`, only on an allocator.
//! ```rust
//! # use opsim::{evaluate_registers, evaluate_stack, host::NoVariables, registers::RegisterFile};
//! # use opasm::{Dialect, Word};
//! assert_eq!(evaluate_stack("PUSH 0x10, PUSH 5, ADD", NoVariables), Word::Int(21));
//!
//! let mut registers = RegisterFile::default();
//! let result = evaluate_registers(
//!     "MOV EAX, 5\nCMP EAX, 5\nJZ eq\nMOV ECX, 2\neq:\nMOV ECX, 1",
//!     Dialect::REGISTER,
//!     &mut registers,
//!     "ECX",
//!     NoVariables,
//! );
//! assert_eq!(result, Ok(Word::Int(1)));
//! assert!(registers.zero_flag);
//! ```

#![no_std]

extern crate alloc;

pub mod execution;
pub mod host;
pub mod machine;
pub mod registers;
pub mod stack;

pub use opasm;

use opasm::{Dialect, Program, Word};

use crate::{
    execution::Execution,
    host::Host,
    machine::MachineError,
    registers::{RegisterFile, RegisterMachine},
    stack::StackMachine,
};

/// Runs a stack program to its end, returning the top of the stack (zero if empty).
pub fn evaluate_stack<H: Host>(source: &str, host: H) -> Word {
    let program = Program::parse(source, Dialect::STACK);
    let mut execution = Execution::new(&program, StackMachine::new(), host);
    execution.run_to_end();
    execution.machine().result()
}

/// Runs a register program to its end on the given registers, returning the value
/// of the `output` register.
///
/// Breakpoints, if the dialect enables them, are logged and resumed immediately.
/// Hosts wanting to stop on them drive an [`Execution`] themselves.
pub fn evaluate_registers<H: Host>(
    source: &str,
    dialect: Dialect,
    registers: &mut RegisterFile,
    output: &str,
    host: H,
) -> Result<Word, MachineError> {
    if registers.get(output).is_none() {
        return Err(MachineError::UnknownRegister(output.into()));
    }
    let program = Program::parse(source, dialect);
    Execution::new(&program, RegisterMachine::new(registers), host).run_to_end();
    registers
        .get(output)
        .ok_or_else(|| MachineError::UnknownRegister(output.into()))
}

#[cfg(test)]
mod test;
