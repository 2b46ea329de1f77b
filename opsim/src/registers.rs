//! # Register machine
//! The register machine works on a [`RegisterFile`]: a handful of named registers
//! (`EAX`, `EBX`, `ECX` and `EDX` by default) and a zero flag set by `CMP`.
//!
//! The register file is owned by the host and only borrowed for a run. Hosts wanting
//! registers to persist from one run to the next simply keep the same file around,
//! patching registers in between if they wish; others create a fresh one per run.
//! ```rust
//! # use opsim::{execution::Execution, host::NoVariables, registers::*};
//! # use opasm::{Dialect, Program, Word};
//! let mut registers = RegisterFile::default();
//! registers.patch("EBX", Word::Int(0x42)).unwrap();
//!
//! let program = Program::parse("MOV EAX, EBX\nADD EAX, 1", Dialect::REGISTER);
//! Execution::new(&program, RegisterMachine::new(&mut registers), NoVariables).run();
//! assert_eq!(registers.get("eax"), Some(Word::Int(0x43)));
//! ```

use alloc::string::{String, ToString};
use core::fmt::{Display, Formatter};
use log::{debug, warn};
use opasm::{Dialect, Instruction, LabelTable, Opcode, Word, DEFAULT_REGISTERS};

use crate::{
    host::Host,
    machine::{jump_target, Flow, Machine, MachineError},
};

/// Longest register name, in bytes.
pub const REGISTER_NAME_LENGTH: usize = 8;
/// Most registers a [`RegisterFile`] can hold.
pub const MAX_REGISTERS: usize = 8;

pub type RegisterName = heapless::String<REGISTER_NAME_LENGTH>;

/// Named registers along with the zero flag. Register names are case-insensitive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterFile {
    registers: heapless::Vec<(RegisterName, Word), MAX_REGISTERS>,
    pub zero_flag: bool,
}
impl Default for RegisterFile {
    /// Returns `EAX`, `EBX`, `ECX` and `EDX`, all zeroed.
    fn default() -> Self {
        let mut registers = heapless::Vec::new();
        for name in DEFAULT_REGISTERS {
            let mut register = RegisterName::new();
            let _ = register.push_str(name);
            let _ = registers.push((register, Word::ZERO));
        }
        Self {
            registers,
            zero_flag: false,
        }
    }
}
impl RegisterFile {
    /// Returns a register file with the given registers, all zeroed.
    /// # Example
    /// ```rust
    /// # use opsim::registers::RegisterFile;
    /// # use opasm::Word;
    /// let registers = RegisterFile::with_registers(["r0", "r1"]).unwrap();
    /// assert_eq!(registers.get("R1"), Some(Word::ZERO));
    /// assert_eq!(registers.get("EAX"), None);
    /// assert!(RegisterFile::with_registers(["accumulator"]).is_err());
    /// ```
    pub fn with_registers<'a>(
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, MachineError> {
        let mut file = Self {
            registers: heapless::Vec::new(),
            zero_flag: false,
        };
        for name in names {
            let mut register = RegisterName::new();
            let valid = !name.is_empty()
                && name.bytes().all(|b| b.is_ascii_alphanumeric())
                && register.push_str(&name.to_ascii_uppercase()).is_ok();
            if !valid {
                return Err(MachineError::InvalidRegisterName(name.to_string()));
            }
            if file.position(name).is_none() {
                file.registers
                    .push((register, Word::ZERO))
                    .map_err(|_| MachineError::TooManyRegisters)?;
            }
        }
        Ok(file)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.registers
            .iter()
            .position(|(register, _)| register.eq_ignore_ascii_case(name))
    }

    /// Returns the value of a register, `None` if there is no such register.
    pub fn get(&self, name: &str) -> Option<Word> {
        self.position(name).map(|i| self.registers[i].1)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Word> {
        self.position(name).map(|i| &mut self.registers[i].1)
    }

    /// Sets the value of a register, typically before running a program.
    pub fn patch(&mut self, name: &str, value: Word) -> Result<(), MachineError> {
        let register = self
            .get_mut(name)
            .ok_or_else(|| MachineError::UnknownRegister(name.to_string()))?;
        *register = value;
        Ok(())
    }

    /// Iterates over registers and their values, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Word)> {
        self.registers
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
    }
}
impl Display for RegisterFile {
    /// One register per line, followed by the zero flag.
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        for (name, value) in self.iter() {
            writeln!(f, "{name}: {value}")?;
        }
        write!(f, "ZF:  {}", self.zero_flag as u8)
    }
}

/// Machine running on a borrowed [`RegisterFile`], understanding `MOV`, `ADD`, `SUB`,
/// `XOR`, `CMP`, `JZ`, `JNZ`, `JMP`, `CALL`, `NOP` and `PRINT`.
///
/// Two operand instructions read their source as a register when it names one,
/// as a literal otherwise.
#[derive(Debug)]
pub struct RegisterMachine<'r> {
    registers: &'r mut RegisterFile,
}
impl<'r> RegisterMachine<'r> {
    /// Prepares a run on the given registers. The zero flag is cleared, registers
    /// are left untouched.
    pub fn new(registers: &'r mut RegisterFile) -> Self {
        registers.zero_flag = false;
        Self { registers }
    }

    pub fn registers(&self) -> &RegisterFile {
        &*self.registers
    }

    /// Reads an operand, first as a register, then as a literal.
    fn read<H: Host>(
        &self,
        instruction: &Instruction<'_>,
        position: usize,
        dialect: &Dialect,
        host: &mut H,
    ) -> Word {
        instruction
            .operand(position)
            .and_then(|name| self.registers.get(name))
            .unwrap_or_else(|| host.resolve(instruction.literal(position, dialect)))
    }

    /// Combines the destination register with the source operand.
    fn update<H: Host>(
        &mut self,
        instruction: &Instruction<'_>,
        dialect: &Dialect,
        host: &mut H,
        operation: impl FnOnce(Word, Word) -> Word,
    ) {
        let source = self.read(instruction, 1, dialect, host);
        let destination = instruction.operand(0).unwrap_or_default();
        match self.registers.get_mut(destination) {
            Some(register) => *register = operation(*register, source),
            None => warn!(
                "{}: unknown destination register `{destination}`",
                instruction.mnemonic
            ),
        }
    }
}
impl Machine for RegisterMachine<'_> {
    fn execute<H: Host>(
        &mut self,
        instruction: &Instruction<'_>,
        labels: &LabelTable,
        dialect: &Dialect,
        host: &mut H,
    ) -> Flow {
        match instruction.opcode {
            Opcode::Mov => self.update(instruction, dialect, host, |_, source| source),
            Opcode::Add => self.update(instruction, dialect, host, |a, b| a + b),
            Opcode::Sub => self.update(instruction, dialect, host, |a, b| a - b),
            Opcode::Xor => self.update(instruction, dialect, host, |a, b| a ^ b),
            Opcode::Cmp => {
                let a = self.read(instruction, 0, dialect, host);
                let b = self.read(instruction, 1, dialect, host);
                self.registers.zero_flag = a.equals(b);
                debug!("CMP {a} {b}: ZF = {}", self.registers.zero_flag as u8);
            }
            Opcode::Jz if self.registers.zero_flag => return jump_target(instruction, labels),
            Opcode::Jnz if !self.registers.zero_flag => return jump_target(instruction, labels),
            Opcode::Jz | Opcode::Jnz => {}
            Opcode::Jmp => return jump_target(instruction, labels),
            Opcode::Call => host.call(instruction.operand(0).unwrap_or_default()),
            Opcode::Nop => {}
            Opcode::Print => host.print(&*self.registers),
            _ => warn!("unknown opcode: {}", instruction.mnemonic),
        }
        Flow::Next
    }

    fn snapshot(&self) -> String {
        self.registers.to_string()
    }
}
