// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Direct tests for builtin helpers; the control-flow builtins are covered
//! end to end in the VM test suite.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::{Builtins, print_value, write_real};
use crate::value::{ArrayData, BufferData, Payload, ValueFlags};
use crate::vm::Vm;

fn fresh_vm() -> Vm {
    let mut builtins = Builtins::new();
    Vm::new(
        Vec::new(),
        Box::new(std::io::sink()),
        Box::new(std::io::sink()),
        &mut builtins,
    )
}

fn rendered(vm: &Vm, id: crate::value::Word) -> String {
    let mut out = Vec::new();
    print_value(vm, &mut out, id, 0);
    String::from_utf8(out).unwrap()
}

#[test]
fn real_formatting_matches_user_expectations() {
    let cases: &[(f64, &str)] = &[
        (0.0, "0"),
        (10.0, "10"),
        (-3.0, "-3"),
        (0.5, "0.5"),
        (-0.25, "-0.25"),
        (1_000_000.0, "1000000"),
    ];
    for &(num, expected) in cases {
        let mut out = Vec::new();
        write_real(&mut out, num);
        assert_eq!(String::from_utf8(out).unwrap(), expected, "for {num}");
    }
}

#[test]
fn prelude_values_render() {
    let vm = fresh_vm();
    assert_eq!(rendered(&vm, vm.knone), "(none)");
    assert_eq!(rendered(&vm, vm.ktrue), "(true)");
    assert_eq!(rendered(&vm, vm.kfalse), "(false)");
}

#[test]
fn buffers_render_their_raw_bytes() {
    let mut vm = fresh_vm();
    let id = vm.alloc(
        Payload::Buffer(BufferData::from_slice(b"raw")),
        ValueFlags::empty(),
    );
    assert_eq!(rendered(&vm, id), "raw");
}

#[test]
fn arrays_render_recursively() {
    let mut vm = fresh_vm();
    let one = vm.alloc(Payload::Real(1.0), ValueFlags::empty());
    let two = vm.alloc(Payload::Real(2.0), ValueFlags::empty());
    let inner = vm.alloc(
        Payload::Array(ArrayData::from_slice(&[two])),
        ValueFlags::empty(),
    );
    let outer = vm.alloc(
        Payload::Array(ArrayData::from_slice(&[one, inner])),
        ValueFlags::empty(),
    );
    assert_eq!(rendered(&vm, outer), "[1 [2]]");
}

#[test]
fn self_referential_arrays_hit_the_depth_cap() {
    let mut vm = fresh_vm();
    let arr = vm.alloc(
        Payload::Array(ArrayData::from_slice(&[0])),
        ValueFlags::empty(),
    );
    if let Payload::Array(data) = &mut vm.value_mut(arr).payload {
        assert!(data.set(0, arr));
    }

    let out = rendered(&vm, arr);
    assert!(out.contains("Print recursion limit reached"));
}

#[test]
fn errors_render_with_their_message() {
    let mut vm = fresh_vm();
    let err = vm.error(String::from("boom"));
    assert_eq!(rendered(&vm, err), "(error: boom)");
}

#[test]
fn the_module_binds_every_builtin() {
    let vm = fresh_vm();

    let names = [
        "+", "-", "*", "/", "==", "!=", "<", "<=", ">", ">=", "&&", "||", "??", "print",
        "write", "len", "if", "loop", "while", "for", "guard",
    ];
    for name in names {
        let atom = vm.atoms.lookup(name);
        assert_ne!(atom, 0, "{name} has no atom");

        // Frame 1 is the user frame; its chain reaches the builtins scope.
        let val = vm.namespace_get(vm.frames()[1].ns, atom);
        assert_ne!(val, 0, "{name} is not bound");
        assert!(
            matches!(vm.value(val).payload, Payload::CFunction { .. }),
            "{name} is not a native function"
        );
        assert!(vm.value(val).flags.contains(ValueFlags::CONST));
    }
}
