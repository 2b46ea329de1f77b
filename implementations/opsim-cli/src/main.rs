use std::{
    collections::BTreeMap,
    fmt::Display,
    fs,
    io::{self, BufRead, Read, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{Parser, ValueEnum};
use log::{warn, LevelFilter};
use opasm::{parse_integer, parse_literal, Dialect, PatchError, Program, Word};
use opsim::{
    execution::{Execution, ExecutionState},
    host::Host,
    machine::{Machine, MachineError},
    registers::{RegisterFile, RegisterMachine},
    stack::StackMachine,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Arguments {
    /// Program to run, `-` to read it from stdin.
    program: PathBuf,
    #[arg(short, long, value_enum, default_value_t = DialectArg::Stack)]
    dialect: DialectArg,
    /// Register holding the result of register programs.
    #[arg(short, long, default_value = "EAX")]
    output: String,
    /// Sets a register before running, e.g. `--set EBX=0x10`.
    #[arg(long = "set", value_name = "REG=VALUE", value_parser = parse_assignment)]
    registers: Vec<(String, String)>,
    /// Sets a host variable, read by `V[ID]` operands.
    #[arg(long = "var", value_name = "ID=VALUE", value_parser = parse_variable)]
    variables: Vec<(u32, i64)>,
    /// Replaces a line with `NOP`.
    #[arg(long = "nop", value_name = "LINE")]
    nops: Vec<usize>,
    /// Inserts a `BRK` after a line.
    #[arg(long = "break-after", value_name = "LINE")]
    breakpoints: Vec<usize>,
    /// Prints the program listing instead of running it.
    #[arg(long)]
    disassemble: bool,
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DialectArg {
    Stack,
    Register,
    Debugger,
}
impl From<DialectArg> for Dialect {
    fn from(dialect: DialectArg) -> Self {
        match dialect {
            DialectArg::Stack => Dialect::STACK,
            DialectArg::Register => Dialect::REGISTER,
            DialectArg::Debugger => Dialect::DEBUGGER,
        }
    }
}

fn parse_assignment(argument: &str) -> Result<(String, String), String> {
    let (name, value) = argument
        .split_once('=')
        .ok_or_else(|| format!("expected REG=VALUE, got `{argument}`"))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

fn parse_variable(argument: &str) -> Result<(u32, i64), String> {
    let (id, value) = argument
        .split_once('=')
        .ok_or_else(|| format!("expected ID=VALUE, got `{argument}`"))?;
    let id = id
        .trim()
        .parse()
        .map_err(|_| format!("invalid variable id `{id}`"))?;
    let value =
        parse_integer(value.trim()).ok_or_else(|| format!("invalid variable value `{value}`"))?;
    Ok((id, value))
}

/// Prints to stdout and serves variables given on the command line.
#[derive(Debug, Default)]
struct CliHost {
    variables: BTreeMap<u32, i64>,
}
impl Host for CliHost {
    fn read_variable(&mut self, id: u32) -> Word {
        self.variables.read_variable(id)
    }
    fn print(&mut self, snapshot: &dyn Display) {
        println!("{snapshot}")
    }
    fn call(&mut self, label: &str) {
        println!("CALL {label}")
    }
}

#[derive(Debug)]
enum CliError {
    Io(io::Error),
    Patch(PatchError),
    Machine(MachineError),
}
impl From<io::Error> for CliError {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}
impl From<PatchError> for CliError {
    fn from(error: PatchError) -> Self {
        Self::Patch(error)
    }
}
impl From<MachineError> for CliError {
    fn from(error: MachineError) -> Self {
        Self::Machine(error)
    }
}
impl Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(error) => write!(f, "{error}"),
            Self::Patch(error) => write!(f, "cannot patch program: {error}"),
            Self::Machine(error) => write!(f, "{error}"),
        }
    }
}

fn read_source(path: &Path) -> io::Result<String> {
    if path == Path::new("-") {
        let mut source = String::new();
        io::stdin().read_to_string(&mut source)?;
        Ok(source)
    } else {
        fs::read_to_string(path)
    }
}

/// Runs to the end, waiting for Enter on every breakpoint.
fn drive<M: Machine, H: Host>(execution: &mut Execution<'_, M, H>) -> Result<(), CliError> {
    while let ExecutionState::Paused(breakpoint) = execution.run() {
        println!("{breakpoint}");
        print!("Press Enter to resume...");
        io::stdout().flush()?;
        io::stdin().lock().read_line(&mut String::new())?;
        execution.resume()?;
    }
    Ok(())
}

fn run(args: Arguments) -> Result<(), CliError> {
    let source = read_source(&args.program)?;
    let dialect = Dialect::from(args.dialect);
    let mut program = Program::parse(&source, dialect);

    for &line in &args.nops {
        program.nop(line)?;
    }
    if !args.breakpoints.is_empty() && !dialect.breakpoints {
        warn!("the {:?} dialect ignores breakpoints", args.dialect);
    }
    let mut breakpoints = args.breakpoints.clone();
    breakpoints.sort_unstable();
    breakpoints.dedup();
    // Bottom up, so line numbers refer to the program as written.
    for &line in breakpoints.iter().rev() {
        program.insert_breakpoint(line)?;
    }

    if args.disassemble {
        println!("{}", program.disassemble());
        return Ok(());
    }

    let mut host = CliHost {
        variables: args.variables.into_iter().collect(),
    };
    if args.dialect == DialectArg::Stack {
        if !args.registers.is_empty() {
            warn!("the stack machine has no registers, ignoring --set");
        }
        let mut execution = Execution::new(&program, StackMachine::new(), &mut host);
        drive(&mut execution)?;
        println!("{}", execution.machine().result());
        return Ok(());
    }

    let mut registers = RegisterFile::default();
    for (name, value) in &args.registers {
        let value = host.resolve(parse_literal(value, &dialect));
        registers.patch(name, value)?;
    }
    let unknown_output = || MachineError::UnknownRegister(args.output.clone());
    if registers.get(&args.output).is_none() {
        return Err(unknown_output().into());
    }
    let mut execution = Execution::new(&program, RegisterMachine::new(&mut registers), &mut host);
    drive(&mut execution)?;
    drop(execution);
    let result = registers.get(&args.output).ok_or_else(unknown_output)?;
    println!("{result}");
    Ok(())
}

fn main() -> ExitCode {
    let args = Arguments::parse();
    env_logger::Builder::new()
        .filter_level(if args.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        })
        .parse_default_env()
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}
