// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! # Skald VM
//!
//! A single-pass bytecode compiler and stack-based virtual machine for the
//! Skald scripting language.
//!
//! This crate provides:
//! - Lexer and recursive-descent parser for Skald source code
//! - A code generator that emits bytecode directly while parsing
//! - A tagged-value heap with small-buffer optimized arrays and buffers
//! - A stack VM with call frames, first-class continuations and a
//!   mark-and-sweep garbage collector
//! - The built-in module (arithmetic, comparison, `print`, control flow)
//! - Bytecode file (de)serialization, a disassembler and a REPL
//!
//! The pipeline is `text -> lexer -> parser -> generator -> bytecode -> VM`;
//! the parser drives the generator, so there is no intermediate syntax tree.

pub mod bitset;
pub mod builtins;
pub mod bytecode;
pub mod codegen;
pub mod interner;
pub mod io;
pub mod loader;
pub mod module;
pub mod parse;
pub mod repl;
pub mod value;
pub mod vm;

// Re-export commonly used types at crate root
pub use value::{Value, Word};
pub use vm::Vm;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tmp_dbg_test;
