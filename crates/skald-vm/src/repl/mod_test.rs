// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Tests for the REPL session (without a terminal).

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::Session;
use crate::builtins::Builtins;
use crate::vm::vm_test::SharedBuf;

fn session() -> (Session, SharedBuf, SharedBuf) {
    let out = SharedBuf::new();
    let err = SharedBuf::new();
    let mut builtins = Builtins::new();
    let session = Session::new(&mut builtins, Box::new(out.clone()), Box::new(err.clone()));
    (session, out, err)
}

#[test]
fn evaluates_and_prints_the_result() {
    let (mut s, out, _) = session();
    s.eval_line("1 + 2").unwrap();
    assert_eq!(out.take_string(), "3\n");
}

#[test]
fn bindings_survive_between_lines() {
    let (mut s, out, _) = session();
    s.eval_line("x := 5").unwrap();
    assert_eq!(out.take_string(), "5\n");
    s.eval_line("x + 1").unwrap();
    assert_eq!(out.take_string(), "6\n");
}

#[test]
fn the_last_result_is_available_as_dollar_dollar() {
    let (mut s, out, _) = session();
    s.eval_line("40").unwrap();
    out.take_string();
    s.eval_line("$$ + 2").unwrap();
    assert_eq!(out.take_string(), "42\n");
}

#[test]
fn parse_errors_roll_the_buffer_back() {
    let (mut s, out, _) = session();
    assert!(s.eval_line("(((").is_err());
    s.eval_line("2").unwrap();
    assert_eq!(out.take_string(), "2\n");
}

#[test]
fn runtime_errors_do_not_kill_the_session() {
    let (mut s, out, err) = session();
    s.eval_line("1 / 0").unwrap();
    assert_eq!(err.take_string(), "Error: Division by zero\n");
    s.eval_line("7").unwrap();
    assert_eq!(out.take_string(), "7\n");
}

#[test]
fn definitions_compose_across_lines() {
    let (mut s, out, _) = session();
    s.eval_line("double := { $.0 * 2 }").unwrap();
    out.take_string();
    s.eval_line("double(21)").unwrap();
    assert_eq!(out.take_string(), "42\n");
}

#[test]
fn state_dump_mentions_the_stack_sections() {
    let (mut s, _, _) = session();
    s.eval_line("x := 1").unwrap();
    let mut dump = Vec::new();
    s.dump_state(&mut dump);
    let dump = String::from_utf8(dump).unwrap();
    assert!(dump.contains("Stack:"));
    assert!(dump.contains("Heap:"));
    assert!(dump.contains("Frame Stack:"));
}
