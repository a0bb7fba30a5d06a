// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! End-to-end tests for the VM: compile Skald source, run it, check the
//! produced output and heap state.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod arithmetic_test;
mod literal_test;

use super::Vm;
use crate::builtins::Builtins;
use crate::codegen::Generator;
use crate::parse::{Lexer, parse_program};
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

/// A cloneable in-memory writer for capturing VM output in tests.
#[derive(Clone, Default)]
pub(crate) struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl SharedBuf {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the captured bytes as a string.
    pub fn take_string(&self) -> String {
        let bytes = std::mem::take(&mut *self.0.borrow_mut());
        String::from_utf8(bytes).expect("output is UTF-8")
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Compile source to bytecode with relocations applied.
pub(crate) fn compile(src: &str) -> Vec<u8> {
    let mut builtins = Builtins::new();
    let mut generator = Generator::new(&mut builtins, None);

    let mut bytes = src.as_bytes();
    let mut lexer = Lexer::new(&mut bytes);
    parse_program(&mut lexer, &mut generator).expect("parse error");

    generator.finish()
}

/// Compile and run a fresh VM. Returns (stdout, stderr, vm).
pub(crate) fn run(src: &str) -> (String, String, Vm) {
    let code = compile(src);
    let out = SharedBuf::new();
    let err = SharedBuf::new();

    let mut builtins = Builtins::new();
    let mut vm = Vm::new(
        code,
        Box::new(out.clone()),
        Box::new(err.clone()),
        &mut builtins,
    );
    vm.run();

    (out.take_string(), err.take_string(), vm)
}

/// Compile, run, and return standard output. Panics if anything was
/// written to standard error.
pub(crate) fn eval(src: &str) -> String {
    let (out, err, _) = run(src);
    assert_eq!(err, "", "unexpected error output");
    out
}

/// Compile, run, and return standard error.
pub(crate) fn eval_err(src: &str) -> String {
    let (_, err, _) = run(src);
    err
}
