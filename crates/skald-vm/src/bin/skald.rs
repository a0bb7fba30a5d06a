// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Skald command-line interface: compile and run programs, disassemble or
//! serialize bytecode, single-step, or start a REPL.

use anyhow::{Context, Result, bail};
use clap::Parser;
use skald_vm::builtins::Builtins;
use skald_vm::codegen::{FsResolver, Generator};
use skald_vm::loader;
use skald_vm::parse::{Lexer, parse_program};
use skald_vm::repl;
use skald_vm::vm::{Vm, print};
use std::fs::File;
use std::io::{IsTerminal, Read, Write};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "skald", version, about = "Skald - run Skald programs")]
struct Cli {
    /// Input file, or '-' for stdin
    input: Option<String>,

    /// Print the generated bytecode, don't execute
    #[arg(long)]
    bytecode: bool,

    /// Step through the program
    #[arg(long)]
    step: bool,

    /// Start a repl
    #[arg(long)]
    repl: bool,

    /// Write bytecode to a file ('-' for stdout)
    #[arg(short, long, value_name = "PATH")]
    output: Option<String>,

    /// Stop execution after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<f64>,

    /// Trace the lexer
    #[arg(long)]
    trace_lexer: bool,

    /// Trace the parser
    #[arg(long)]
    trace_parser: bool,

    /// Trace the vm
    #[arg(long)]
    trace_vm: bool,
}

fn init_tracing(cli: &Cli) -> Result<()> {
    let mut filter =
        EnvFilter::try_from_env("SKALD_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    if cli.trace_lexer {
        filter = filter.add_directive("skald_vm::parse::lexer=trace".parse()?);
    }
    if cli.trace_parser {
        filter = filter.add_directive("skald_vm::parse::parser=trace".parse()?);
    }
    if cli.trace_vm {
        filter = filter.add_directive("skald_vm::vm=trace".parse()?);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn read_input(input: &str) -> Result<Vec<u8>> {
    if input == "-" {
        let mut data = Vec::new();
        std::io::stdin()
            .read_to_end(&mut data)
            .context("reading stdin")?;
        Ok(data)
    } else {
        std::fs::read(input).with_context(|| input.to_string())
    }
}

fn step_through(vm: &mut Vm) {
    let mut out = std::io::stdout();
    let _ = writeln!(out, "=====\n\nInitial state:");
    print::print_state(&mut out, vm);

    let stdin = std::io::stdin();
    let mut line = String::new();
    while !vm.halted {
        let _ = write!(out, "\n======\n\n({}) Will run instr: ", vm.iptr());
        let mut pos = vm.iptr();
        print::print_op(&mut out, vm.ops(), &mut pos);
        let _ = out.flush();

        line.clear();
        if stdin.read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }

        vm.step();
        vm.gc();
        print::print_state(&mut out, vm);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    let mut builtins = Builtins::new();

    // No input on a terminal means interactive use.
    let interactive =
        cli.repl || (cli.input.is_none() && std::io::stdin().is_terminal());
    if interactive {
        repl::run_interactive(&mut builtins)?;
        println!();
        return Ok(());
    }

    let input = cli.input.as_deref().unwrap_or("-");
    let data = read_input(input)?;

    // Compiled bytecode starts with ESC 'g' 'l' 'c'.
    let code = if data.first() == Some(&loader::MAGIC[0]) {
        loader::load(&mut &data[..]).with_context(|| input.to_string())?
    } else {
        let mut resolver = FsResolver::new(input);
        let mut generator = Generator::new(&mut builtins, Some(&mut resolver));

        let mut src: &[u8] = &data;
        let mut lexer = Lexer::new(&mut src);
        if let Err(e) = parse_program(&mut lexer, &mut generator) {
            bail!("Parse error: {input}:{}:{}: {}", e.line, e.ch, e.message);
        }

        generator.finish()
    };

    if cli.bytecode {
        print::print_bytecode(&mut std::io::stdout(), &code);
    }

    if let Some(path) = &cli.output {
        if path == "-" {
            loader::serialize(&mut std::io::stdout(), &code)?;
        } else {
            let mut file = File::create(path).with_context(|| path.to_string())?;
            loader::serialize(&mut file, &code)?;
        }
    }

    if cli.bytecode || cli.output.is_some() {
        return Ok(());
    }

    let mut vm = Vm::new(
        code,
        Box::new(std::io::stdout()),
        Box::new(std::io::stderr()),
        &mut builtins,
    );

    if cli.step {
        step_through(&mut vm);
    } else if let Some(timeout) = cli.timeout {
        let deadline = Instant::now() + Duration::from_secs_f64(timeout);
        while !vm.halted {
            vm.step();
            if Instant::now() >= deadline {
                eprintln!("Timeout reached.");
                break;
            }
        }
    } else {
        vm.run();
    }

    Ok(())
}
