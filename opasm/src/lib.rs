//! # OpAsm
//! Front end for the opsim toy machines: a line-oriented assembly language where
//! every non-empty line is either a `label:` or an instruction such as `PUSH 0x10`
//! or `MOV EAX, 5`.
//!
//! Like its machine companion, it does not require [`std`], only an allocator.
//!
//! ## Two passes
//! Programs are handled in two passes:
//! - tokenizing, where the source is cut into trimmed, non-empty [`Line`]s and
//!   labels are collected into a [`LabelTable`].
//! - decoding, done lazily by the machine as it executes, where a line becomes an
//!   [`Instruction`] with an [`Opcode`] and up to two operands.
//!
//! The [disassembler](disassemble) works on the tokenized lines directly and never
//! needs the labels.
//!
//! ## Dialects
//! The stack machine and the register machines don't agree on a few details (whether
//! commas separate lines, where a label points to, what `$` means...). These are all
//! gathered in a [`Dialect`].
//! ```rust
//! # use opasm::*;
//! let program = Program::parse("PUSH 10, PUSH 0x2, ADD", Dialect::STACK);
//! assert_eq!(program.len(), 3);
//! assert_eq!(program.disassemble(), "[0] PUSH     0xA\n[1] PUSH     0x2\n[2] ADD");
//! ```

#![no_std]

extern crate alloc;

mod decode;
mod dialect;
mod disasm;
mod labels;
mod patch;
mod program;
mod word;

pub use decode::*;
pub use dialect::*;
pub use disasm::disassemble;
pub use labels::LabelTable;
pub use patch::PatchError;
pub use program::*;
pub use word::Word;
