use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use vm_lib::debug::DebugView;
use vm_lib::io::store::DirStore;
use vm_lib::io::trace::LogTrace;
use vm_lib::{DebugHandler, Machine};

use log::info;

#[derive(Parser)]
#[command(about = "16-bit real-mode machine emulator")]
struct Args {
    /// Program binary loaded at address zero.
    bin: Option<PathBuf>,

    /// Raw disk image; boots from sector zero when no program is given.
    #[arg(long)]
    disk: Option<PathBuf>,

    /// Directory searched by the load-and-execute service.
    #[arg(long, default_value = "programs")]
    programs: PathBuf,

    /// Override the entry point.
    #[arg(long, value_parser = parse_addr)]
    start: Option<u16>,

    /// Log every executed instruction.
    #[arg(long)]
    trace: bool,

    /// Pause at this address (may be repeated).
    #[arg(long = "break", value_parser = parse_addr)]
    breakpoints: Vec<u16>,
}

fn parse_addr(s: &str) -> Result<u16, String> {
    let parsed = if let Some(hex) = s.strip_prefix("0x") {
        u16::from_str_radix(hex, 16)
    } else {
        s.parse()
    };
    parsed.map_err(|err| err.to_string())
}

// Prints the machine view and waits for Enter.
struct ConsoleDebug;

impl DebugHandler for ConsoleDebug {
    fn on_breakpoint(&mut self, view: &DebugView) {
        println!("{}", view.registers);
        for line in &view.disassembly {
            println!("  {line}");
        }
        print!("(paused, enter to continue) ");
        io::stdout().flush().ok();
        let mut line = String::new();
        io::stdin().read_line(&mut line).ok();
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let mut machine = Machine::new();
    machine.set_program_store(DirStore::new(&args.programs));
    if args.trace {
        machine.set_trace_sink(LogTrace);
    }
    if !args.breakpoints.is_empty() {
        machine.set_debug_handler(ConsoleDebug);
        for addr in &args.breakpoints {
            machine.set_breakpoint(*addr);
        }
    }

    if let Some(path) = &args.disk {
        match std::fs::read(path) {
            Ok(image) => machine.load_disk_image(&image),
            Err(err) => {
                eprintln!("{}: {err}", path.display());
                return ExitCode::FAILURE;
            }
        }
    }

    if let Some(path) = &args.bin {
        let program = match std::fs::read(path) {
            Ok(program) => program,
            Err(err) => {
                eprintln!("{}: {err}", path.display());
                return ExitCode::FAILURE;
            }
        };
        if let Err(fault) = machine.load_program(&program) {
            eprintln!("{}: {fault}", path.display());
            return ExitCode::FAILURE;
        }
    } else if args.disk.is_some() {
        if let Err(err) = machine.boot_from_disk() {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    } else {
        eprintln!("nothing to run: give a program binary or --disk");
        return ExitCode::FAILURE;
    }

    match args.start {
        Some(start) => machine.run_at(start),
        None => machine.run(),
    }

    info!("executed {} instructions", machine.get_state().num_ins());
    ExitCode::SUCCESS
}
