//! # Executions
//! An [`Execution`] runs a [`Program`] on a [`Machine`], one line at a time.
//!
//! It is an iterator over the lines it executes, which makes it easy to trace a run
//! or to bound the number of steps a program may take:
//! ```rust
//! # use opsim::{execution::*, stack::StackMachine, host::NoVariables};
//! # use opasm::{Dialect, Program};
//! let program = Program::parse("loop:, PUSH 1, JMP loop", Dialect::STACK);
//! let mut execution = Execution::new(&program, StackMachine::new(), NoVariables);
//! for line in execution.by_ref().take(30) {
//!     println!("{}", line.text);
//! }
//! assert_eq!(execution.machine().stack().len(), 10);
//! ```
//!
//! Executions are resumable state machines: when the dialect allows breakpoints, a
//! `BRK` line pauses the execution, exposing a [`Breakpoint`] with a snapshot of the
//! machine. Nothing happens until the host calls [`Execution::resume`], which
//! continues with the line following the breakpoint.

use alloc::string::String;
use core::fmt::{Display, Formatter};
use log::{debug, info, trace};
use opasm::{LabelTable, Line, Opcode, Program};

use crate::{
    host::Host,
    machine::{Flow, Machine, MachineError},
};

/// State of a machine paused on a `BRK` line.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Breakpoint {
    /// Index of the `BRK` line.
    pub line: usize,
    pub text: String,
    /// Machine state when the breakpoint was hit.
    pub snapshot: String,
}
impl Display for Breakpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "Breakpoint hit at line {}:\n{}\n{}",
            self.line + 1,
            self.text,
            self.snapshot
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ExecutionState {
    Running,
    /// Waiting for [`Execution::resume`].
    Paused(Breakpoint),
    /// The program counter went past the last line.
    Halted,
}

pub struct Execution<'p, M, H> {
    program: &'p Program,
    labels: LabelTable,
    program_counter: usize,
    state: ExecutionState,
    machine: M,
    host: H,
}
impl<'p, M: Machine, H: Host> Execution<'p, M, H> {
    /// Prepares the execution of a program, resolving its labels.
    pub fn new(program: &'p Program, machine: M, host: H) -> Self {
        let mut execution = Self {
            program,
            labels: program.labels(),
            program_counter: 0,
            state: ExecutionState::Running,
            machine,
            host,
        };
        execution.halt_past_end();
        execution
    }

    /// Index of the next line to execute.
    pub fn pc(&self) -> usize {
        self.program_counter
    }

    pub fn state(&self) -> &ExecutionState {
        &self.state
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn machine(&self) -> &M {
        &self.machine
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Gives back the machine and the host.
    pub fn into_parts(self) -> (M, H) {
        (self.machine, self.host)
    }

    fn halt_past_end(&mut self) {
        if self.state == ExecutionState::Running && self.program_counter >= self.program.len() {
            self.state = ExecutionState::Halted
        }
    }

    /// Runs until the program pauses on a breakpoint or halts.
    pub fn run(&mut self) -> &ExecutionState {
        while self.next().is_some() {}
        &self.state
    }

    /// Continues past the breakpoint the execution is paused on, without running
    /// anything yet.
    pub fn resume(&mut self) -> Result<(), MachineError> {
        if !matches!(self.state, ExecutionState::Paused(_)) {
            return Err(MachineError::NotPaused);
        }
        self.step_past_breakpoint();
        Ok(())
    }

    fn step_past_breakpoint(&mut self) {
        self.state = ExecutionState::Running;
        self.program_counter += 1;
        self.halt_past_end();
    }

    /// Runs the program to its end, resuming past every breakpoint.
    pub fn run_to_end(&mut self) {
        while let ExecutionState::Paused(breakpoint) = self.run() {
            info!("{breakpoint}");
            self.step_past_breakpoint();
        }
    }
}
impl<'p, M: Machine, H: Host> Iterator for Execution<'p, M, H> {
    type Item = &'p Line;

    /// Executes the line under the program counter, returning it. Returns `None`
    /// once paused or halted.
    fn next(&mut self) -> Option<Self::Item> {
        if self.state != ExecutionState::Running {
            return None;
        }
        let program = self.program;
        let line = program.get(self.program_counter)?;
        trace!("[{}] {}", self.program_counter, line.text);

        if line.is_label {
            self.program_counter += 1;
            self.halt_past_end();
            return Some(line);
        }

        let dialect = program.dialect();
        let instruction = line.decode(&dialect);
        if instruction.opcode == Opcode::Brk && dialect.breakpoints {
            let breakpoint = Breakpoint {
                line: self.program_counter,
                text: line.text.clone(),
                snapshot: self.machine.snapshot(),
            };
            debug!("paused at line {}", breakpoint.line);
            self.state = ExecutionState::Paused(breakpoint);
            return Some(line);
        }

        match self
            .machine
            .execute(&instruction, &self.labels, &dialect, &mut self.host)
        {
            Flow::Next => self.program_counter += 1,
            Flow::Jump(target) => {
                debug!("{} jumps to line {target}", line.text);
                self.program_counter = target
            }
        }
        self.halt_past_end();
        Some(line)
    }
}
