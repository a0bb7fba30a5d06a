// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Interactive evaluation.
//!
//! Each line is compiled as `$$ := <line>` followed by `print $$`, appended
//! to the session's persistent code buffer; the VM resumes at the first new
//! instruction, so bindings and values survive between lines. A line that
//! fails to parse is rolled back from the buffer.
//!
//! [`Session`] holds the compile/run state and is independent of any
//! terminal; [`run_interactive`] wraps it in a line editor.

#[cfg(test)]
mod mod_test;

use crate::codegen::Generator;
use crate::module::Module;
use crate::parse::{Lexer, ParseError, parse_program};
use crate::vm::{Vm, print};
use rustyline::error::ReadlineError;
use std::io::Write;

/// A persistent compile-and-run session.
pub struct Session {
    generator: Generator<'static>,
    vm: Vm,
}

impl Session {
    /// Create a session. `builtins` seeds both the generator's and the VM's
    /// atom tables so compiled atom ids resolve at run time.
    pub fn new(
        builtins: &mut dyn Module,
        output: Box<dyn Write>,
        error: Box<dyn Write>,
    ) -> Self {
        let generator = Generator::new(builtins, None);
        let vm = Vm::new(Vec::new(), output, error, builtins);
        Self { generator, vm }
    }

    /// Compile and run one input line. The line's value is bound to `$$`
    /// and printed. Output goes to the session's writers.
    pub fn eval_line(&mut self, line: &str) -> Result<(), ParseError> {
        let start = self.generator.pos();

        let wrapped = format!("$$ := {line}\n");
        let mut src: &[u8] = wrapped.as_bytes();
        {
            let mut lexer = Lexer::new(&mut src);
            if let Err(e) = parse_program(&mut lexer, &mut self.generator) {
                self.generator.truncate(start);
                return Err(e);
            }
        }

        // Drop the trailing HALT so the result print runs in the same batch.
        let without_halt = self.generator.pos() - 1;
        self.generator.truncate(without_halt);

        let mut print_src: &[u8] = b"print $$\n";
        {
            let mut lexer = Lexer::new(&mut print_src);
            if let Err(e) = parse_program(&mut lexer, &mut self.generator) {
                self.generator.truncate(start);
                return Err(e);
            }
        }

        self.generator.apply_relocs();
        self.vm.set_ops(self.generator.bytecode().to_vec());
        self.vm.set_iptr(start as usize);
        self.vm.halted = false;
        self.vm.run();
        self.vm.gc();
        Ok(())
    }

    /// Dump the VM state (the `\state` command).
    pub fn dump_state(&self, w: &mut dyn Write) {
        print::print_state(w, &self.vm);
    }
}

/// Run the interactive loop on the current terminal.
pub fn run_interactive(builtins: &mut dyn Module) -> rustyline::Result<()> {
    let mut rl = rustyline::DefaultEditor::new()?;
    let mut session = Session::new(
        builtins,
        Box::new(std::io::stdout()),
        Box::new(std::io::stderr()),
    );

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                if line.trim() == "\\state" {
                    let mut out = std::io::stdout();
                    session.dump_state(&mut out);
                    continue;
                }

                if let Err(e) = session.eval_line(&line) {
                    eprintln!("Parse error: {e}\n -- {line}");
                }
            }
            Err(ReadlineError::Interrupted) => {}
            Err(ReadlineError::Eof) => return Ok(()),
            Err(e) => return Err(e),
        }
    }
}
