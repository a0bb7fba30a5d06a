// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Arithmetic, comparison and logical builtins through the VM.

use super::{eval, eval_err};

#[test]
fn basic_operators() {
    assert_eq!(eval("print (7 - 2)\n"), "5\n");
    assert_eq!(eval("print (6 * 7)\n"), "42\n");
    assert_eq!(eval("print (10 / 4)\n"), "2.5\n");
}

#[test]
fn infix_chains_fold_left() {
    assert_eq!(eval("print (10 - 3 - 2)\n"), "5\n");
    assert_eq!(eval("print (2 * 3 + 4)\n"), "10\n");
}

#[test]
fn operators_are_plain_functions() {
    // Prefix call syntax folds over all arguments.
    assert_eq!(eval("print (+(1 2 3 4))\n"), "10\n");
    assert_eq!(eval("print (*())\n"), "1\n");
    assert_eq!(eval("print (+())\n"), "0\n");
}

#[test]
fn unary_forms_apply_the_identity() {
    assert_eq!(eval("print (-(3))\n"), "-3\n");
    assert_eq!(eval("print (/(4))\n"), "0.25\n");
}

#[test]
fn division_by_zero_is_an_error() {
    assert_eq!(eval("print (1 / 0)\n"), "(error: Division by zero)\n");
    assert_eq!(eval_err("1 / 0\n"), "Error: Division by zero\n");
    assert_eq!(eval("print (/(0))\n"), "(error: Division by zero)\n");
}

#[test]
fn comparisons_yield_atoms() {
    assert_eq!(eval("print (1 < 2) (2 < 1)\n"), "(true) (false)\n");
    assert_eq!(eval("print (2 <= 2) (3 <= 2)\n"), "(true) (false)\n");
    assert_eq!(eval("print (3 > 2) (2 > 3)\n"), "(true) (false)\n");
    assert_eq!(eval("print (2 >= 3)\n"), "(false)\n");
}

#[test]
fn comparison_chains() {
    assert_eq!(eval("print (<(1 2 3))\n"), "(true)\n");
    assert_eq!(eval("print (<(1 3 2))\n"), "(false)\n");
}

#[test]
fn equality_compares_values() {
    assert_eq!(eval("print (1 == 1) (1 == 2)\n"), "(true) (false)\n");
    assert_eq!(eval("print (\"ab\" == \"ab\")\n"), "(true)\n");
    assert_eq!(eval("print (\"ab\" == \"ac\")\n"), "(false)\n");
    assert_eq!(eval("print (1 != 2) (1 != 1)\n"), "(true) (false)\n");
    // Different types are never equal.
    assert_eq!(eval("print (1 == \"1\")\n"), "(false)\n");
}

#[test]
fn logical_operators() {
    assert_eq!(eval("print ((1 < 2) && (2 < 3))\n"), "(true)\n");
    assert_eq!(eval("print ((1 < 2) && (3 < 2))\n"), "(false)\n");
    assert_eq!(eval("print ((3 < 2) || (1 < 2))\n"), "(true)\n");
    assert_eq!(eval("print ((3 < 2) || (2 < 1))\n"), "(false)\n");
}

#[test]
fn first_takes_the_first_non_none() {
    assert_eq!(eval("print (missing ?? 5)\n"), "5\n");
    assert_eq!(eval("print (3 ?? 5)\n"), "3\n");
}

#[test]
fn type_errors_surface_at_statement_boundaries() {
    assert_eq!(eval_err("1 + 'x\n"), "Error: Unexpected type ATOM\n");
}

#[test]
fn errors_pass_through_arithmetic_unchanged() {
    // The inner division error survives the outer addition.
    assert_eq!(eval_err("1 + (1 / 0)\n"), "Error: Division by zero\n");
}

#[test]
fn execution_stops_at_the_failing_statement() {
    let (out, err, _) = super::run("print 1\n1 + 'x\nprint 2\n");
    assert_eq!(out, "1\n");
    assert_eq!(err, "Error: Unexpected type ATOM\n");
}
