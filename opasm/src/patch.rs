//! # Program patching
//! Hosts may let players tamper with a program before running it: disabling lines,
//! rewriting instructions or dropping breakpoints in. These transforms only ever
//! happen between runs, a running program borrows its lines immutably.

use alloc::string::String;
use core::fmt::{Display, Formatter};

use crate::{program::Line, Opcode, Program, DEFAULT_REGISTERS};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PatchError {
    NoSuchLine(usize),
    /// Labels are jump targets, they cannot be disabled or rewritten.
    LabelNotPatchable(usize),
    Empty,
    InvalidOpcode,
    /// `NOP` followed by something else than a comment, or a `CMP`/`MOV`/`XOR` not
    /// written as `OP REG, value`.
    InvalidOperands(Opcode),
    MissingLabel(Opcode),
    /// Edited text ending in `:` would turn the line into a label.
    DeclaresLabel,
}
impl Display for PatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NoSuchLine(index) => write!(f, "no line {index} in program"),
            Self::LabelNotPatchable(index) => write!(f, "line {index} is a label"),
            Self::Empty => f.write_str("empty instruction"),
            Self::InvalidOpcode => f.write_str("invalid opcode"),
            Self::InvalidOperands(Opcode::Nop) => {
                f.write_str("invalid use of NOP, either use 'NOP' or 'NOP ...comment'")
            }
            Self::InvalidOperands(opcode) => write!(
                f,
                "invalid syntax, expected {} REG, value",
                opcode.mnemonic().unwrap_or("OP")
            ),
            Self::MissingLabel(opcode) => {
                write!(f, "missing label for {}", opcode.mnemonic().unwrap_or("jump"))
            }
            Self::DeclaresLabel => f.write_str("edited instructions cannot end with ':'"),
        }
    }
}

/// Opcodes a player may write when editing a line.
const EDITABLE: [Opcode; 8] = [
    Opcode::Nop,
    Opcode::Cmp,
    Opcode::Mov,
    Opcode::Xor,
    Opcode::Jnz,
    Opcode::Jz,
    Opcode::Jmp,
    Opcode::Brk,
];

impl Program {
    fn patchable_line(&mut self, index: usize) -> Result<&mut Line, PatchError> {
        let line = self
            .lines
            .get_mut(index)
            .ok_or(PatchError::NoSuchLine(index))?;
        if line.is_label {
            return Err(PatchError::LabelNotPatchable(index));
        }
        Ok(line)
    }

    /// Disables a line by replacing it with `NOP`.
    /// # Example
    /// ```rust
    /// # use opasm::*;
    /// let mut program = Program::parse("MOV EAX, 1\nend:", Dialect::REGISTER);
    /// program.nop(0).unwrap();
    /// assert_eq!(program.source(), "NOP\nend:");
    /// assert_eq!(program.nop(1), Err(PatchError::LabelNotPatchable(1)));
    /// ```
    pub fn nop(&mut self, index: usize) -> Result<(), PatchError> {
        self.patchable_line(index)?.text = String::from("NOP");
        Ok(())
    }

    /// Replaces a line with new instruction text, after checking it is well formed.
    ///
    /// Writing exactly `BRK` does not replace the line but inserts a breakpoint after
    /// it, see [`Program::insert_breakpoint`]. Any `NOP` (comment included) is stored
    /// as a bare `NOP`. Other text may not end with `:`, which would make it a label.
    /// # Example
    /// ```rust
    /// # use opasm::*;
    /// let mut program = Program::parse("MOV EAX, 1\nJZ end\nend:", Dialect::DEBUGGER);
    /// program.edit(0, "MOV EBX, 0x10").unwrap();
    /// program.edit(0, "brk").unwrap();
    /// assert_eq!(program.source(), "MOV EBX, 0x10\nBRK\nJZ end\nend:");
    /// assert_eq!(program.edit(2, "JZ"), Err(PatchError::MissingLabel(Opcode::Jz)));
    /// ```
    pub fn edit(&mut self, index: usize, text: &str) -> Result<(), PatchError> {
        self.patchable_line(index)?;
        let text = text.trim();
        let opcode = validate_edit(text)?;
        if opcode != Opcode::Nop && text.ends_with(':') {
            return Err(PatchError::DeclaresLabel);
        }

        if text.eq_ignore_ascii_case("BRK") {
            return self.insert_breakpoint(index);
        }
        let line = self.patchable_line(index)?;
        line.text = String::from(if opcode == Opcode::Nop { "NOP" } else { text });
        Ok(())
    }

    /// Inserts a `BRK` line right after the given line, renumbering the lines below it.
    pub fn insert_breakpoint(&mut self, after: usize) -> Result<(), PatchError> {
        if after >= self.lines.len() {
            return Err(PatchError::NoSuchLine(after));
        }
        self.lines.insert(after + 1, Line::new(after + 1, "BRK"));
        self.reindex();
        Ok(())
    }
}

/// Checks an edited instruction, returning its opcode.
fn validate_edit(text: &str) -> Result<Opcode, PatchError> {
    let mut parts = text.split_whitespace();
    let mnemonic = parts.next().ok_or(PatchError::Empty)?;
    let opcode = Opcode::from_mnemonic(mnemonic);
    if !EDITABLE.contains(&opcode) {
        return Err(PatchError::InvalidOpcode);
    }

    match opcode {
        Opcode::Nop if parts.next().is_some() && !text.starts_with("NOP ") => {
            Err(PatchError::InvalidOperands(opcode))
        }
        Opcode::Cmp | Opcode::Mov | Opcode::Xor => {
            let (register, value) = text[mnemonic.len()..]
                .split_once(',')
                .ok_or(PatchError::InvalidOperands(opcode))?;
            let register = register.trim_start();
            let well_formed = text[mnemonic.len()..].starts_with(char::is_whitespace)
                && DEFAULT_REGISTERS.contains(&register)
                && !value.trim().is_empty();
            if well_formed {
                Ok(opcode)
            } else {
                Err(PatchError::InvalidOperands(opcode))
            }
        }
        Opcode::Jmp | Opcode::Jz | Opcode::Jnz if parts.next().is_none() => {
            Err(PatchError::MissingLabel(opcode))
        }
        _ => Ok(opcode),
    }
}
