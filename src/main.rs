//! strvmc: loads DIF programs into a kernel and steps them to completion.
//!
//! # Usage
//! ```text
//! strvmc [OPTIONS | FILE]...
//! ```
//!
//! Arguments are processed strictly in order; any argument that is not a
//! recognized option is loaded as a DIF program file. A file that fails to
//! load is reported and skipped, the remaining arguments still apply. Memory
//! options replace the kernel, dropping programs loaded before them.

use std::{env, fs, process};
use strobe_vm::dif;
use strobe_vm::errors::DifError;
use strobe_vm::hardware::Console;
use strobe_vm::isa::Instruction;
use strobe_vm::kernel::{Kernel, BIOS_IMAGE, DEFAULT_MEMORY};
use strobe_vm::utils::log;
use strobe_vm::{debug, error, info};
use thiserror::Error;

/// Why a program file could not be loaded.
#[derive(Debug, Error)]
enum LoadError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Dif(#[from] DifError),
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let mut kernel = Kernel::new(DEFAULT_MEMORY, Console::new());
    let mut debug_dump = false;

    for arg in &args[1..] {
        match arg.to_ascii_lowercase().as_str() {
            "-h" | "--help" => {
                print_usage(&args[0]);
                return;
            }
            "--debug" => {
                debug_dump = true;
                log::set_verbose(true);
            }
            "--save" => save_programs(&kernel),
            "--1m" => kernel = Kernel::new(1024 * 1024, Console::new()),
            "--32m" => kernel = Kernel::new(32 * 1024 * 1024, Console::new()),
            "--512m" => kernel = Kernel::new(512 * 1024 * 1024, Console::new()),
            "--1g" => kernel = Kernel::new(1024 * 1024 * 1024, Console::new()),
            "--bios" => match dif::decode(BIOS_IMAGE) {
                Ok(program) => kernel.start(program),
                Err(e) => error!("bios image rejected: {}", e),
            },
            _ => match load_program(arg) {
                Ok(program) => {
                    debug!("loaded {} ({} instructions)", arg, program.len());
                    kernel.start(program);
                }
                Err(e) => error!("{} @ {}", e, arg),
            },
        }
    }

    if debug_dump {
        dump_programs(&kernel);
    }

    while kernel.running() > 0 {
        if let Err(e) = kernel.step() {
            error!("VM fault: {}", e);
            process::exit(1);
        }
    }
    if let Some(code) = kernel.exit_code() {
        process::exit(code);
    }
}

/// Reads and DIF-decodes one program file.
fn load_program(path: &str) -> Result<Vec<Instruction>, LoadError> {
    Ok(dif::decode(&fs::read(path)?)?)
}

/// Writes each loaded program back out as `bin<N>.dif`.
fn save_programs(kernel: &Kernel<Console>) {
    for (n, program) in kernel.save().iter().enumerate() {
        let path = format!("bin{}.dif", n);
        match fs::write(&path, dif::encode(program)) {
            Ok(()) => info!("saved {}", path),
            Err(e) => error!("failed to save {}: {}", path, e),
        }
    }
}

/// Prints every loaded program as mnemonics with hex parameters.
fn dump_programs(kernel: &Kernel<Console>) {
    for (n, program) in kernel.save().iter().enumerate() {
        println!("program {}:", n);
        for instr in program {
            println!("  {}", instr);
        }
    }
}

const USAGE: &str = "\
StrobeVM Runner

USAGE:
    {program} [OPTIONS | FILE]...

Arguments are processed in order. Any argument that is not an option is
loaded as a DIF program file; load failures are reported and skipped.

OPTIONS:
    --debug      Enable debug logging and dump loaded programs
    --save       Write each currently loaded program to bin<N>.dif
    --1m         Restart the kernel with a 1 MiB memory budget (default)
    --32m        Restart the kernel with a 32 MiB memory budget
    --512m       Restart the kernel with a 512 MiB memory budget
    --1g         Restart the kernel with a 1 GiB memory budget
    --bios       Start the built-in BIOS program
    -h, --help   Print this help message

NOTE:
    Memory options replace the kernel and drop programs loaded before them;
    pass them first.

EXAMPLES:
    # Run a program with debug output
    {program} --debug program.dif

    # Run the BIOS and a program with a larger memory budget
    {program} --512m --bios program.dif
";

/// Prints usage information to stderr.
fn print_usage(program: &str) {
    eprintln!("{}", USAGE.replace("{program}", program));
}
