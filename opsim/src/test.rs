use alloc::{
    string::{String, ToString},
    vec,
    vec::Vec,
};
use core::fmt::Display;
use opasm::{Dialect, Literal, NopMarker, Program, Word};

use crate::{
    evaluate_registers, evaluate_stack,
    execution::{Execution, ExecutionState},
    host::{Host, NoVariables},
    machine::MachineError,
    registers::{RegisterFile, RegisterMachine},
    stack::StackMachine,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Default)]
struct RecordingHost {
    printed: Vec<String>,
    calls: Vec<String>,
}
impl Host for RecordingHost {
    fn read_variable(&mut self, id: u32) -> Word {
        Word::Int(id as i64 * 10)
    }
    fn print(&mut self, snapshot: &dyn Display) {
        self.printed.push(snapshot.to_string())
    }
    fn call(&mut self, label: &str) {
        self.calls.push(label.to_string())
    }
}

/// Doubles every literal value it resolves.
struct DoublingHost;
impl Host for DoublingHost {
    fn read_variable(&mut self, _id: u32) -> Word {
        Word::ZERO
    }
    fn resolve(&mut self, literal: Literal) -> Word {
        match literal {
            Literal::Value(value) => value + value,
            Literal::Variable(id) => self.read_variable(id),
        }
    }
}

fn stack_after(source: &str) -> Vec<Word> {
    let program = Program::parse(source, Dialect::STACK);
    let mut execution = Execution::new(&program, StackMachine::new(), NoVariables);
    execution.run_to_end();
    execution.machine().stack().to_vec()
}

fn registers_after(source: &str, dialect: Dialect) -> RegisterFile {
    let mut registers = RegisterFile::default();
    let program = Program::parse(source, dialect);
    Execution::new(&program, RegisterMachine::new(&mut registers), NoVariables).run_to_end();
    registers
}

#[test]
fn test_push_only_programs() {
    init_logger();
    assert_eq!(
        stack_after("PUSH 1, PUSH 2\nPUSH 3"),
        [Word::Int(1), Word::Int(2), Word::Int(3)]
    );
    assert_eq!(evaluate_stack("PUSH 1, PUSH 2, PUSH 3", NoVariables), Word::Int(3));
    assert_eq!(evaluate_stack("", NoVariables), Word::ZERO);
}

#[test]
fn test_stack_arithmetic() {
    init_logger();
    assert_eq!(evaluate_stack("PUSH 0x10, PUSH 5, ADD", NoVariables), Word::Int(21));
    assert_eq!(evaluate_stack("PUSH $A, PUSH 4, SUB", NoVariables), Word::Int(6));
    assert_eq!(evaluate_stack("PUSH 6, PUSH -7, MUL", NoVariables), Word::Int(-42));
    assert_eq!(evaluate_stack("PUSH 9, PUSH 2, DIV", NoVariables), Word::Int(4));
    assert_eq!(evaluate_stack("PUSH -7, PUSH 2, DIV", NoVariables), Word::Int(-4));
    assert_eq!(evaluate_stack("PUSH -7, PUSH 2, MOD", NoVariables), Word::Int(-1));
    assert_eq!(
        stack_after("PUSH 1, PUSH 2, SWAP, DUP"),
        [Word::Int(2), Word::Int(1), Word::Int(1)]
    );
}

#[test]
fn test_stack_anomalies_give_nan() {
    init_logger();
    assert_eq!(evaluate_stack("PUSH 1, PUSH 0, DIV", NoVariables), Word::NaN);
    assert_eq!(evaluate_stack("PUSH 1, PUSH 0, MOD", NoVariables), Word::NaN);
    assert_eq!(evaluate_stack("PUSH 1, ADD", NoVariables), Word::NaN);
    assert_eq!(evaluate_stack("DUP", NoVariables), Word::NaN);
    assert_eq!(evaluate_stack("PUSH, PUSH 2, ADD", NoVariables), Word::NaN);
    assert_eq!(evaluate_stack("PUSH 12abc", NoVariables), Word::NaN);
    assert_eq!(
        evaluate_stack("PUSH 1, PUSH 0, DIV, PUSH 3, MUL", NoVariables),
        Word::NaN
    );
}

#[test]
fn test_host_variables() {
    init_logger();
    assert_eq!(
        evaluate_stack("PUSH V[1], PUSH V[5], ADD", vec![3_i64, 4]),
        Word::Int(4)
    );
    assert_eq!(evaluate_stack("PUSH V[2]", RecordingHost::default()), Word::Int(20));

    let mut registers = RegisterFile::default();
    let result = evaluate_registers(
        "MOV EAX, $1\nADD EAX, V[0]",
        Dialect::REGISTER,
        &mut registers,
        "EAX",
        vec![5_i64, 7],
    );
    assert_eq!(result, Ok(Word::Int(12)));
}

#[test]
fn test_jump_moves_program_counter() {
    init_logger();
    let program = Program::parse("JMP end, PUSH 1, end:, PUSH 2", Dialect::STACK);
    let mut execution = Execution::new(&program, StackMachine::new(), NoVariables);
    assert_eq!(execution.next().map(|line| line.index), Some(0));
    assert_eq!(execution.pc(), 2);
    execution.run_to_end();
    assert_eq!(execution.machine().stack(), [Word::Int(2)]);
    assert_eq!(execution.state(), &ExecutionState::Halted);
}

#[test]
fn test_undeclared_labels_fall_through() {
    init_logger();
    assert_eq!(stack_after("JMP nowhere, PUSH 1"), [Word::Int(1)]);
    assert_eq!(stack_after("PUSH 1, JMP"), [Word::Int(1)]);
}

#[test]
fn test_conditional_jumps_pop_their_condition() {
    init_logger();
    let source = "PUSH 7, PUSH 0, IFZERO skip, PUSH 1, skip:, PUSH 2";
    assert_eq!(stack_after(source), [Word::Int(7), Word::Int(2)]);

    let source = "PUSH 3, IFNZERO skip, PUSH 1, skip:";
    assert!(stack_after(source).is_empty());

    // NaN is not zero.
    let source = "PUSH 1, PUSH 0, DIV, IFNZERO skip, PUSH 1, skip:, PUSH 2";
    assert_eq!(stack_after(source), [Word::Int(2)]);
}

#[test]
fn test_countdown_loop() {
    init_logger();
    let source = "
        PUSH 0
        PUSH 5
        loop:
        DUP
        IFZERO end
        SWAP
        PUSH 1
        ADD
        SWAP
        PUSH 1
        SUB
        JMP loop
        end:
    ";
    assert_eq!(stack_after(source), [Word::Int(5), Word::Int(0)]);
}

#[test]
fn test_infinite_loops_can_be_bounded() {
    init_logger();
    let program = Program::parse("top:, PUSH 1, JMP top", Dialect::STACK);
    let mut execution = Execution::new(&program, StackMachine::new(), NoVariables);
    assert_eq!(execution.by_ref().take(300).count(), 300);
    assert_eq!(execution.machine().stack().len(), 100);
    assert_eq!(execution.state(), &ExecutionState::Running);
}

#[test]
fn test_unknown_opcodes_are_skipped() {
    init_logger();
    assert_eq!(
        evaluate_stack("PUSH 1, FOO, PUSH 2, ADD", NoVariables),
        evaluate_stack("PUSH 1, PUSH 2, ADD", NoVariables)
    );
    // Register only opcodes are unknown to the stack machine.
    assert_eq!(stack_after("PUSH 1, MOV EAX, 2"), [Word::Int(1)]);

    let with_unknown = registers_after("MOV EAX, 3\nFOO EAX, 1\nADD EAX, 1", Dialect::REGISTER);
    let without = registers_after("MOV EAX, 3\nADD EAX, 1", Dialect::REGISTER);
    assert_eq!(with_unknown, without);
}

#[test]
fn test_register_compare_and_branch() {
    init_logger();
    let registers = registers_after(
        "MOV EAX, 5\nMOV EBX, 5\nCMP EAX, EBX\nJZ equal\nMOV ECX, 2\nJMP end\nequal:\nMOV ECX, 1\nend:",
        Dialect::REGISTER,
    );
    assert_eq!(registers.get("ECX"), Some(Word::Int(1)));
    assert!(registers.zero_flag);

    let registers = registers_after(
        "MOV EAX, 4\nCMP EAX, 5\nJNZ different\nMOV ECX, 2\ndifferent:\nADD ECX, 7",
        Dialect::REGISTER,
    );
    assert_eq!(registers.get("ECX"), Some(Word::Int(7)));
    assert!(!registers.zero_flag);
}

#[test]
fn test_register_operations() {
    init_logger();
    let registers = registers_after(
        "mov eax, 0x10\nMOV EBX, EAX\nSUB EBX, 1\nXOR EAX, 0xFF\nMOV EDX\nADD ECX, bogus",
        Dialect::REGISTER,
    );
    assert_eq!(registers.get("EAX"), Some(Word::Int(0xEF)));
    assert_eq!(registers.get("EBX"), Some(Word::Int(0xF)));
    assert_eq!(registers.get("ECX"), Some(Word::NaN));
    // A missing source reads as zero in register dialects.
    assert_eq!(registers.get("EDX"), Some(Word::ZERO));
}

#[test]
fn test_unknown_destinations_are_ignored() {
    init_logger();
    let registers = registers_after("MOV EEX, 5\nADD EAX, 1", Dialect::REGISTER);
    assert_eq!(registers, {
        let mut expected = RegisterFile::default();
        expected.patch("EAX", Word::Int(1)).unwrap();
        expected
    });
}

#[test]
fn test_custom_register_files() {
    init_logger();
    let mut registers = RegisterFile::with_registers(["R0", "R1"]).unwrap();
    let result = evaluate_registers(
        "MOV R0, 2\nADD R1, R0\nADD R1, R1",
        Dialect::REGISTER,
        &mut registers,
        "r1",
        NoVariables,
    );
    assert_eq!(result, Ok(Word::Int(4)));
    assert_eq!(registers.to_string(), "R0: 2\nR1: 4\nZF:  0");

    assert_eq!(
        evaluate_registers("", Dialect::REGISTER, &mut registers, "EAX", NoVariables),
        Err(MachineError::UnknownRegister("EAX".to_string()))
    );
    assert_eq!(
        RegisterFile::with_registers(["A", "B", "C", "D", "E", "F", "G", "H", "I"]),
        Err(MachineError::TooManyRegisters)
    );
    assert_eq!(
        RegisterFile::with_registers(["E-X"]),
        Err(MachineError::InvalidRegisterName("E-X".to_string()))
    );
}

#[test]
fn test_registers_persist_across_runs() {
    init_logger();
    let mut registers = RegisterFile::default();
    for expected in 1..=3 {
        let result = evaluate_registers(
            "ADD EAX, 1\nCMP EAX, 2",
            Dialect::REGISTER,
            &mut registers,
            "EAX",
            NoVariables,
        );
        assert_eq!(result, Ok(Word::Int(expected)));
    }
    assert!(!registers.zero_flag);

    registers.zero_flag = true;
    evaluate_registers("NOP", Dialect::REGISTER, &mut registers, "EAX", NoVariables).unwrap();
    assert!(!registers.zero_flag);
}

#[test]
fn test_breakpoints_pause_and_resume() {
    init_logger();
    let source = "MOV EAX, 1\nBRK\nADD EAX, 2";
    let program = Program::parse(source, Dialect::DEBUGGER);
    let mut registers = RegisterFile::default();
    let mut execution = Execution::new(&program, RegisterMachine::new(&mut registers), NoVariables);

    let ExecutionState::Paused(breakpoint) = execution.run().clone() else {
        panic!("expected a breakpoint, got {:?}", execution.state())
    };
    assert_eq!(breakpoint.line, 1);
    assert_eq!(breakpoint.text, "BRK");
    assert_eq!(
        breakpoint.to_string(),
        "Breakpoint hit at line 2:\nBRK\nEAX: 1\nEBX: 0\nECX: 0\nEDX: 0\nZF:  0"
    );

    // Nothing runs while paused.
    assert!(execution.next().is_none());
    assert_eq!(execution.pc(), 1);
    assert_eq!(
        execution.machine().registers().get("EAX"),
        Some(Word::Int(1))
    );

    execution.resume().unwrap();
    assert_eq!(execution.pc(), 2);
    assert_eq!(execution.run(), &ExecutionState::Halted);
    assert_eq!(execution.resume(), Err(MachineError::NotPaused));
    drop(execution);

    assert_eq!(registers, registers_after("MOV EAX, 1\nADD EAX, 2", Dialect::REGISTER));
}

#[test]
fn test_breakpoint_on_last_line_halts_on_resume() {
    init_logger();
    let program = Program::parse("MOV EAX, 1\nBRK", Dialect::DEBUGGER);
    let mut registers = RegisterFile::default();
    let mut execution = Execution::new(&program, RegisterMachine::new(&mut registers), NoVariables);
    assert!(matches!(execution.run(), ExecutionState::Paused(_)));
    execution.resume().unwrap();
    assert_eq!(execution.state(), &ExecutionState::Halted);
}

#[test]
fn test_breakpoints_need_a_debugger_dialect() {
    init_logger();
    let registers = registers_after("MOV EAX, 1\nBRK\nADD EAX, 2", Dialect::REGISTER);
    assert_eq!(registers.get("EAX"), Some(Word::Int(3)));

    let mut registers = RegisterFile::default();
    let result = evaluate_registers(
        "MOV EAX, 1\nBRK\nADD EAX, 2\nBRK",
        Dialect::DEBUGGER,
        &mut registers,
        "EAX",
        NoVariables,
    );
    assert_eq!(result, Ok(Word::Int(3)));
}

#[test]
fn test_patched_programs() {
    init_logger();
    let mut program = Program::parse("MOV EAX, 1\nADD EAX, 2\nADD EAX, 4", Dialect::DEBUGGER);
    program.nop(1).unwrap();
    program.insert_breakpoint(0).unwrap();
    program.edit(3, "XOR EAX, 0x10").unwrap();

    let mut registers = RegisterFile::default();
    let mut execution = Execution::new(&program, RegisterMachine::new(&mut registers), NoVariables);
    let ExecutionState::Paused(breakpoint) = execution.run() else {
        panic!("expected a breakpoint")
    };
    assert_eq!(breakpoint.line, 1);
    execution.run_to_end();
    drop(execution);
    assert_eq!(registers.get("EAX"), Some(Word::Int(0x11)));
}

#[test]
fn test_nop_marker_policies() {
    init_logger();
    let source = "[NOP] MOV EAX, 5";
    let registers = registers_after(source, Dialect::REGISTER);
    assert_eq!(registers.get("EAX"), Some(Word::Int(5)));

    let skipping = Dialect {
        nop_marker: NopMarker::Skip,
        ..Dialect::REGISTER
    };
    let registers = registers_after(source, skipping);
    assert_eq!(registers.get("EAX"), Some(Word::ZERO));
}

#[test]
fn test_print_and_call_reach_the_host() {
    init_logger();
    let mut host = RecordingHost::default();
    evaluate_stack("PUSH 1, PRINT, PUSH 2, PRINT", &mut host);
    assert_eq!(host.printed, ["Stack: [1]", "Stack: [1, 2]"]);

    let mut registers = RegisterFile::default();
    evaluate_registers(
        "CALL printf\nMOV EAX, 1\nPRINT",
        Dialect::REGISTER,
        &mut registers,
        "EAX",
        &mut host,
    )
    .unwrap();
    assert_eq!(host.calls, ["printf"]);
    assert_eq!(host.printed[2], "EAX: 1\nEBX: 0\nECX: 0\nEDX: 0\nZF:  0");
}

#[test]
fn test_label_conventions() {
    init_logger();
    let program = Program::parse("JMP end\nend:\nMOV EAX, 1", Dialect::REGISTER);
    let mut registers = RegisterFile::default();
    let mut execution = Execution::new(&program, RegisterMachine::new(&mut registers), NoVariables);
    execution.next();
    // Register dialects land right after the label.
    assert_eq!(execution.pc(), 2);
    assert_eq!(execution.labels().get("END"), Some(2));

    let program = Program::parse("JMP end, end:, PUSH 1", Dialect::STACK);
    let mut execution = Execution::new(&program, StackMachine::new(), NoVariables);
    execution.next();
    assert_eq!(execution.pc(), 1);
    assert_eq!(execution.next().map(|line| line.is_label), Some(true));
}

#[test]
fn test_empty_programs_are_halted() {
    let program = Program::parse("\n\n , ", Dialect::STACK);
    let mut execution = Execution::new(&program, StackMachine::new(), NoVariables);
    assert_eq!(execution.state(), &ExecutionState::Halted);
    assert!(execution.next().is_none());
}

#[test]
fn test_register_literals_read_leading_digits() {
    init_logger();
    let registers = registers_after(
        "MOV EAX, 12abc\nMOV EBX, 3.9\nMOV ECX, 0x1G\nMOV EDX, abc",
        Dialect::REGISTER,
    );
    assert_eq!(registers.get("EAX"), Some(Word::Int(12)));
    assert_eq!(registers.get("EBX"), Some(Word::Int(3)));
    assert_eq!(registers.get("ECX"), Some(Word::Int(1)));
    assert_eq!(registers.get("EDX"), Some(Word::NaN));

    let registers = registers_after("MOV EAX, 7x\nCMP EAX, 7.5", Dialect::DEBUGGER);
    assert!(registers.zero_flag);
    assert_eq!(stack_after("PUSH 3.9, PUSH 0x1G"), [Word::NaN, Word::NaN]);
}

#[test]
fn test_run_to_end_resumes_every_breakpoint() {
    init_logger();
    let program = Program::parse("BRK\nADD EAX, 1\nBRK\nBRK", Dialect::DEBUGGER);
    let mut registers = RegisterFile::default();
    let mut execution = Execution::new(&program, RegisterMachine::new(&mut registers), NoVariables);
    execution.run_to_end();
    assert_eq!(execution.state(), &ExecutionState::Halted);
    assert_eq!(execution.pc(), 4);
    assert_eq!(execution.resume(), Err(MachineError::NotPaused));
    drop(execution);
    assert_eq!(registers.get("EAX"), Some(Word::Int(1)));
}

#[test]
fn test_borrowed_host_keeps_its_resolve() {
    init_logger();
    assert_eq!(evaluate_stack("PUSH 4", DoublingHost), Word::Int(8));
    let mut host = DoublingHost;
    assert_eq!(evaluate_stack("PUSH 4, PUSH 1, ADD", &mut host), Word::Int(10));

    let mut registers = RegisterFile::default();
    let result = evaluate_registers(
        "MOV EAX, 5\nADD EAX, EAX",
        Dialect::REGISTER,
        &mut registers,
        "EAX",
        &mut host,
    );
    assert_eq!(result, Ok(Word::Int(20)));
}
