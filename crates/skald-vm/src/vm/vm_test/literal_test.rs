// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Literals and printing.

use super::eval;

#[test]
fn integral_reals_print_as_integers() {
    assert_eq!(eval("print 0 1 42 100000\n"), "0 1 42 100000\n");
}

#[test]
fn fractional_reals_keep_their_point() {
    assert_eq!(eval("print (1 / 2)\n"), "0.5\n");
}

#[test]
fn string_literals_print_their_bytes() {
    assert_eq!(eval("print \"hello world\"\n"), "hello world\n");
}

#[test]
fn string_escapes_resolve() {
    assert_eq!(eval("write \"a\\tb\\n\"\n"), "a\tb\n");
}

#[test]
fn duplicate_string_literals_share_storage() {
    // Both literals decode from the same code-stream bytes.
    assert_eq!(eval("print \"dup\"\nprint \"dup\"\n"), "dup\ndup\n");
}

#[test]
fn long_strings_exceed_inline_storage() {
    let s = "this string is long enough to spill onto the heap";
    assert_eq!(eval(&format!("print \"{s}\"\n")), format!("{s}\n"));
}

#[test]
fn atoms_print_by_id() {
    assert_eq!(eval("print 'true 'false\n"), "(true) (false)\n");
}

#[test]
fn custom_atoms_are_interned() {
    assert_eq!(eval("print ('red == 'red) ('red == 'blue)\n"), "(true) (false)\n");
}

#[test]
fn unbound_names_look_up_as_none() {
    assert_eq!(eval("print missing\n"), "(none)\n");
}

#[test]
fn empty_object_literal_is_a_namespace() {
    assert_eq!(eval("o := {}\nprint o\n"), "(namespace)\n");
}

#[test]
fn functions_print_opaquely() {
    assert_eq!(eval("f := { 1 }\nprint f print\n"), "(function) (function)\n");
}
