//! # Stack machine
//! The stack machine works on a growable stack of [`Word`]s and understands
//! `PUSH`, `ADD`, `SUB`, `MUL`, `DIV`, `MOD`, `DUP`, `SWAP`, `PRINT`, `JMP`, `IFZERO`
//! and `IFNZERO`.
//!
//! Popping an empty stack gives `NaN` instead of failing, which then propagates
//! through arithmetic.

use alloc::{string::String, vec::Vec};
use core::fmt::{Display, Formatter};
use log::warn;
use opasm::{Dialect, Instruction, LabelTable, Opcode, Word};

use crate::{
    host::Host,
    machine::{jump_target, Flow, Machine},
};

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct StackMachine {
    stack: Vec<Word>,
}
impl StackMachine {
    /// Returns a machine with an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Values on the stack, bottom first.
    pub fn stack(&self) -> &[Word] {
        &self.stack
    }

    pub fn push(&mut self, value: Word) {
        self.stack.push(value)
    }

    /// Pops the top of the stack, `NaN` if it is empty.
    pub fn pop(&mut self) -> Word {
        self.stack.pop().unwrap_or(Word::NaN)
    }

    /// Final result of a run: the top of the stack, or zero if it is empty.
    /// # Example
    /// ```rust
    /// # use opsim::{evaluate_stack, host::NoVariables};
    /// # use opasm::Word;
    /// assert_eq!(evaluate_stack("PUSH 9, PUSH 2, DIV", NoVariables), Word::Int(4));
    /// assert_eq!(evaluate_stack("PUSH 9, PUSH 2, SUB, PUSH 7, MOD", NoVariables), Word::Int(0));
    /// assert_eq!(evaluate_stack("", NoVariables), Word::ZERO);
    /// ```
    pub fn result(&self) -> Word {
        self.stack.last().copied().unwrap_or(Word::ZERO)
    }

    /// Pops `b`, then `a`, and pushes `a OP b`.
    fn binary(&mut self, operation: impl FnOnce(Word, Word) -> Word) {
        let b = self.pop();
        let a = self.pop();
        self.push(operation(a, b))
    }

    /// Pops the condition of a conditional jump, then jumps if it holds.
    fn branch_if(
        &mut self,
        condition: impl FnOnce(Word) -> bool,
        instruction: &Instruction<'_>,
        labels: &LabelTable,
    ) -> Flow {
        if condition(self.pop()) {
            jump_target(instruction, labels)
        } else {
            Flow::Next
        }
    }
}
impl Machine for StackMachine {
    fn execute<H: Host>(
        &mut self,
        instruction: &Instruction<'_>,
        labels: &LabelTable,
        dialect: &Dialect,
        host: &mut H,
    ) -> Flow {
        match instruction.opcode {
            Opcode::Push => {
                let value = host.resolve(instruction.literal(0, dialect));
                self.push(value)
            }
            Opcode::Add => self.binary(|a, b| a + b),
            Opcode::Sub => self.binary(|a, b| a - b),
            Opcode::Mul => self.binary(|a, b| a * b),
            Opcode::Div => self.binary(Word::floor_div),
            Opcode::Mod => self.binary(Word::truncating_rem),
            Opcode::Dup => {
                // Duplicating an empty stack pushes NaN.
                let top = self.stack.last().copied().unwrap_or(Word::NaN);
                self.push(top)
            }
            Opcode::Swap => {
                let b = self.pop();
                let a = self.pop();
                self.push(b);
                self.push(a);
            }
            Opcode::Print => host.print(&*self),
            Opcode::Jmp => return jump_target(instruction, labels),
            Opcode::IfZero => return self.branch_if(|c| c.equals(Word::ZERO), instruction, labels),
            Opcode::IfNotZero => {
                return self.branch_if(|c| !c.equals(Word::ZERO), instruction, labels)
            }
            _ => warn!("unknown opcode: {}", instruction.mnemonic),
        }
        Flow::Next
    }

    fn snapshot(&self) -> String {
        alloc::format!("{self}")
    }
}
impl Display for StackMachine {
    /// Prints the stack bottom first, e.g. `Stack: [1, 2, NaN]`.
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str("Stack: [")?;
        for (i, value) in self.stack.iter().enumerate() {
            if i != 0 {
                f.write_str(", ")?;
            }
            write!(f, "{value}")?;
        }
        f.write_str("]")
    }
}
