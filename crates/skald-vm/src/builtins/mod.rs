// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The built-in module: arithmetic, comparison, logical operators,
//! `print`/`write`/`len`, and the continuation-based control flow
//! (`if`, `loop`, `while`, `for`, `guard`).
//!
//! Builtins are ordinary `CFUNCTION` values bound in the outermost scope;
//! the VM dispatch loop does not special-case them. Control-flow builtins
//! never call back into the VM — they return continuation values the VM
//! drives itself.

#[cfg(test)]
mod builtins_test;

use crate::module::Module;
use crate::value::{
    ArrayData, CFunction, ContState, Continuation, NamespaceData, Payload, ValueFlags, Word,
};
use crate::vm::Vm;
use std::io::Write;

/// Names the VM reserves before any functions: `none` and the three atoms
/// the runtime itself produces.
const PRELUDE_ATOMS: [&str; 4] = ["none", "true", "false", "stop"];

/// Name/function table; the interning order here is the contract between
/// the compiler and the VM.
const FUNCTIONS: [(&str, CFunction); 21] = [
    ("+", builtin_add),
    ("-", builtin_sub),
    ("*", builtin_mul),
    ("/", builtin_div),
    ("==", builtin_eq),
    ("!=", builtin_neq),
    ("<", builtin_lt),
    ("<=", builtin_lteq),
    (">", builtin_gt),
    (">=", builtin_gteq),
    ("&&", builtin_land),
    ("||", builtin_lor),
    ("??", builtin_first),
    ("print", builtin_print),
    ("write", builtin_write),
    ("len", builtin_len),
    ("if", builtin_if),
    ("loop", builtin_loop),
    ("while", builtin_while),
    ("for", builtin_for),
    ("guard", builtin_guard),
];

/// The built-in module.
#[derive(Default)]
pub struct Builtins {
    atoms: Vec<Word>,
}

impl Builtins {
    /// Create the module; atoms are assigned by `init`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Module for Builtins {
    fn name(&self) -> &'static str {
        "builtins"
    }

    fn init(&mut self, alloc: &mut dyn FnMut(&str) -> Word) {
        for name in PRELUDE_ATOMS {
            alloc(name);
        }

        self.atoms.clear();
        for (name, _) in FUNCTIONS {
            self.atoms.push(alloc(name));
        }
    }

    fn create(&mut self, vm: &mut Vm) -> Word {
        let ns = vm.alloc(Payload::Namespace(NamespaceData::new(0)), ValueFlags::empty());

        for (atom, (_, func)) in self.atoms.iter().zip(FUNCTIONS) {
            let id = vm.alloc(
                Payload::CFunction { func, module: 0 },
                ValueFlags::CONST,
            );
            vm.namespace_set(ns, *atom, id);
        }

        ns
    }

    fn mark(&self, _mark: &mut dyn FnMut(Word)) {}
}

/// Extract a real operand; errors pass through, other types become a type
/// error.
fn expect_real(vm: &mut Vm, id: Word) -> Result<f64, Word> {
    match vm.value(id).payload {
        Payload::Real(num) => Ok(num),
        _ => Err(vm.type_error(id)),
    }
}

fn alloc_real(vm: &mut Vm, num: f64) -> Word {
    vm.alloc(Payload::Real(num), ValueFlags::empty())
}

macro_rules! fold_arith {
    ($name:ident, $identity:expr, $op:tt) => {
        fn $name(vm: &mut Vm, args: &[Word]) -> Word {
            if args.is_empty() {
                return alloc_real(vm, $identity);
            }

            let first = match expect_real(vm, args[0]) {
                Ok(num) => num,
                Err(err) => return err,
            };

            if args.len() == 1 {
                return alloc_real(vm, $identity $op first);
            }

            let mut sum = first;
            for &arg in &args[1..] {
                match expect_real(vm, arg) {
                    Ok(num) => sum = sum $op num,
                    Err(err) => return err,
                }
            }

            alloc_real(vm, sum)
        }
    };
}

fold_arith!(builtin_add, 0.0, +);
fold_arith!(builtin_sub, 0.0, -);
fold_arith!(builtin_mul, 1.0, *);

fn builtin_div(vm: &mut Vm, args: &[Word]) -> Word {
    if args.is_empty() {
        return alloc_real(vm, 1.0);
    }

    let first = match expect_real(vm, args[0]) {
        Ok(num) => num,
        Err(err) => return err,
    };

    if args.len() == 1 {
        if first == 0.0 {
            return vm.error(String::from("Division by zero"));
        }
        return alloc_real(vm, 1.0 / first);
    }

    let mut quotient = first;
    for &arg in &args[1..] {
        match expect_real(vm, arg) {
            Ok(num) if num == 0.0 => return vm.error(String::from("Division by zero")),
            Ok(num) => quotient /= num,
            Err(err) => return err,
        }
    }

    alloc_real(vm, quotient)
}

fn values_equal(vm: &Vm, a: Word, b: Word) -> bool {
    if a == b {
        return true;
    }

    match (&vm.value(a).payload, &vm.value(b).payload) {
        (Payload::Atom(x), Payload::Atom(y)) => x == y,
        (Payload::Real(x), Payload::Real(y)) => x == y,
        (Payload::Buffer(x), Payload::Buffer(y)) => x.as_slice() == y.as_slice(),
        _ => false,
    }
}

fn builtin_eq(vm: &mut Vm, args: &[Word]) -> Word {
    for pair in args.windows(2) {
        if !values_equal(vm, pair[0], pair[1]) {
            return vm.kfalse;
        }
    }
    vm.ktrue
}

fn builtin_neq(vm: &mut Vm, args: &[Word]) -> Word {
    let result = builtin_eq(vm, args);
    if result == vm.ktrue {
        vm.kfalse
    } else if result == vm.kfalse {
        vm.ktrue
    } else {
        result
    }
}

macro_rules! chain_cmp {
    ($name:ident, $op:tt) => {
        fn $name(vm: &mut Vm, args: &[Word]) -> Word {
            if args.len() < 2 {
                return vm.ktrue;
            }

            let mut lhs = match expect_real(vm, args[0]) {
                Ok(num) => num,
                Err(err) => return err,
            };

            for &arg in &args[1..] {
                let rhs = match expect_real(vm, arg) {
                    Ok(num) => num,
                    Err(err) => return err,
                };
                if !(lhs $op rhs) {
                    return vm.kfalse;
                }
                lhs = rhs;
            }

            vm.ktrue
        }
    };
}

chain_cmp!(builtin_lt, <);
chain_cmp!(builtin_lteq, <=);
chain_cmp!(builtin_gt, >);
chain_cmp!(builtin_gteq, >=);

fn builtin_land(vm: &mut Vm, args: &[Word]) -> Word {
    for &arg in args {
        if vm.value(arg).is_error() {
            return arg;
        }
        if !vm.val_is_true(arg) {
            return vm.kfalse;
        }
    }
    vm.ktrue
}

fn builtin_lor(vm: &mut Vm, args: &[Word]) -> Word {
    for &arg in args {
        if vm.value(arg).is_error() {
            return arg;
        }
        if vm.val_is_true(arg) {
            return vm.ktrue;
        }
    }
    vm.kfalse
}

/// `??`: the first argument that is not none.
fn builtin_first(vm: &mut Vm, args: &[Word]) -> Word {
    for &arg in args {
        if !matches!(vm.value(arg).payload, Payload::None) {
            return arg;
        }
    }
    vm.knone
}

/// Depth cap for printing self-referential structures.
const MAX_PRINT_DEPTH: usize = 64;

/// Write a real the way users expect to read it: integral values print as
/// integers.
pub(crate) fn write_real(w: &mut dyn Write, num: f64) {
    if num.is_finite() && num == num.trunc() && num.abs() < 1e15 {
        let _ = write!(w, "{}", num as i64);
    } else {
        let _ = write!(w, "{num}");
    }
}

/// Print a value the way `print` does.
pub fn print_value(vm: &Vm, w: &mut dyn Write, id: Word, depth: usize) {
    if depth > MAX_PRINT_DEPTH {
        let _ = write!(w, "Print recursion limit reached");
        return;
    }

    match &vm.value(id).payload {
        Payload::None => {
            let _ = write!(w, "(none)");
        }
        Payload::Atom(atom) => {
            if vm.val_is_true(id) {
                let _ = write!(w, "(true)");
            } else if id == vm.kfalse || values_equal(vm, id, vm.kfalse) {
                let _ = write!(w, "(false)");
            } else {
                let _ = write!(w, "(atom {atom})");
            }
        }
        Payload::Real(num) => write_real(w, *num),
        Payload::Buffer(buf) => {
            let _ = w.write_all(buf.as_slice());
        }
        Payload::Array(arr) => {
            let _ = write!(w, "[");
            for (i, &item) in arr.as_slice().iter().enumerate() {
                if i != 0 {
                    let _ = write!(w, " ");
                }
                print_value(vm, w, item, depth + 1);
            }
            let _ = write!(w, "]");
        }
        Payload::Namespace(_) => {
            let _ = write!(w, "(namespace)");
        }
        Payload::Function { .. } | Payload::CFunction { .. } => {
            let _ = write!(w, "(function)");
        }
        Payload::Continuation(_) => {
            let _ = write!(w, "(continuation)");
        }
        Payload::Return(_) => {
            let _ = write!(w, "(return)");
        }
        Payload::Error(message) => {
            let _ = write!(w, "(error: {message})");
        }
    }
}

fn write_values(vm: &mut Vm, args: &[Word], separator: Option<&str>) -> Word {
    // The output writer and the value table both live in the VM; detach the
    // writer while printing reads values.
    let mut out = vm.take_output();
    for (i, &arg) in args.iter().enumerate() {
        if i != 0 {
            if let Some(sep) = separator {
                let _ = out.write_all(sep.as_bytes());
            }
        }
        print_value(vm, &mut out, arg, 0);
    }
    if separator.is_some() {
        let _ = out.write_all(b"\n");
    }
    vm.restore_output(out);
    vm.knone
}

fn builtin_print(vm: &mut Vm, args: &[Word]) -> Word {
    write_values(vm, args, Some(" "))
}

fn builtin_write(vm: &mut Vm, args: &[Word]) -> Word {
    write_values(vm, args, None)
}

fn builtin_len(vm: &mut Vm, args: &[Word]) -> Word {
    if args.len() != 1 {
        return vm.error(String::from("Expected 1 argument"));
    }

    let len = match &vm.value(args[0]).payload {
        Payload::Buffer(buf) => buf.len(),
        Payload::Array(arr) => arr.len(),
        Payload::Namespace(ns) => ns.len(),
        _ => 0,
    };

    alloc_real(vm, len as f64)
}

fn make_continuation(vm: &mut Vm, cont: Continuation) -> Word {
    vm.alloc(Payload::Continuation(Box::new(cont)), ValueFlags::empty())
}

fn builtin_if(vm: &mut Vm, args: &[Word]) -> Word {
    if args.len() != 2 && args.len() != 3 {
        return vm.error(String::from("Expected 2 or 3 arguments"));
    }

    if vm.val_is_true(args[0]) {
        make_continuation(
            vm,
            Continuation {
                call: args[1],
                args: 0,
                callback: None,
                state: ContState::None,
            },
        )
    } else if args.len() == 3 {
        make_continuation(
            vm,
            Continuation {
                call: args[2],
                args: 0,
                callback: None,
                state: ContState::None,
            },
        )
    } else {
        vm.knone
    }
}

fn loop_callback(vm: &mut Vm, retval: Word, cont: Word) -> Word {
    if vm.value(retval).is_error() {
        return retval;
    }
    if vm.val_is_stop(retval) {
        return vm.knone;
    }
    cont
}

fn builtin_loop(vm: &mut Vm, args: &[Word]) -> Word {
    if args.len() != 1 {
        return vm.error(String::from("Expected 1 argument"));
    }

    make_continuation(
        vm,
        Continuation {
            call: args[0],
            args: 0,
            callback: Some(loop_callback),
            state: ContState::Loop { body: args[0] },
        },
    )
}

fn while_callback(vm: &mut Vm, retval: Word, cont_id: Word) -> Word {
    if vm.value(retval).is_error() {
        return retval;
    }

    let (current, cond, body) = match &vm.value(cont_id).payload {
        Payload::Continuation(cont) => match cont.state {
            ContState::While { cond, body } => (cont.call, cond, body),
            _ => return retval,
        },
        _ => return retval,
    };

    let next = if current == cond {
        if !vm.val_is_true(retval) {
            return vm.knone;
        }
        body
    } else {
        cond
    };

    if let Payload::Continuation(cont) = &mut vm.value_mut(cont_id).payload {
        cont.call = next;
    }
    cont_id
}

fn builtin_while(vm: &mut Vm, args: &[Word]) -> Word {
    if args.len() != 2 {
        return vm.error(String::from("Expected 2 arguments"));
    }

    make_continuation(
        vm,
        Continuation {
            call: args[0],
            args: 0,
            callback: Some(while_callback),
            state: ContState::While {
                cond: args[0],
                body: args[1],
            },
        },
    )
}

fn for_callback(vm: &mut Vm, retval: Word, cont_id: Word) -> Word {
    if vm.value(retval).is_error() {
        return retval;
    }

    let (current, args_id, iter, body) = match &vm.value(cont_id).payload {
        Payload::Continuation(cont) => match cont.state {
            ContState::For { iter, body } => (cont.call, cont.args, iter, body),
            _ => return retval,
        },
        _ => return retval,
    };

    let next = if current == iter {
        if vm.val_is_stop(retval) {
            return vm.knone;
        }
        // Hand the produced value to the body.
        vm.value_mut(args_id).payload = Payload::Array(ArrayData::from_slice(&[retval]));
        body
    } else {
        vm.value_mut(args_id).payload = Payload::Array(ArrayData::from_slice(&[]));
        iter
    };

    if let Payload::Continuation(cont) = &mut vm.value_mut(cont_id).payload {
        cont.call = next;
    }
    cont_id
}

fn builtin_for(vm: &mut Vm, args: &[Word]) -> Word {
    if args.len() != 2 {
        return vm.error(String::from("Expected 2 arguments"));
    }

    let call_args = vm.alloc(
        Payload::Array(ArrayData::from_slice(&[])),
        ValueFlags::empty(),
    );

    make_continuation(
        vm,
        Continuation {
            call: args[0],
            args: call_args,
            callback: Some(for_callback),
            state: ContState::For {
                iter: args[0],
                body: args[1],
            },
        },
    )
}

fn guard_callback(vm: &mut Vm, retval: Word, cont_id: Word) -> Word {
    // Rewrite the continuation into a return wrapper; the VM unwinds the
    // enclosing function when it sees it.
    let val = vm.value_mut(cont_id);
    val.payload = Payload::Return(retval);
    val.flags = ValueFlags::empty();
    cont_id
}

fn builtin_guard(vm: &mut Vm, args: &[Word]) -> Word {
    if args.is_empty() || args.len() > 2 {
        return vm.error(String::from("Expected 1 or 2 arguments"));
    }

    if vm.value(args[0]).is_error() {
        return args[0];
    }

    if args.len() == 1 {
        if !vm.val_is_true(args[0]) {
            return vm.knone;
        }
        let none = vm.knone;
        return vm.alloc(Payload::Return(none), ValueFlags::empty());
    }

    if vm.value(args[1]).is_error() {
        return args[1];
    }

    if !vm.val_is_true(args[0]) {
        return vm.knone;
    }

    make_continuation(
        vm,
        Continuation {
            call: args[1],
            args: 0,
            callback: Some(guard_callback),
            state: ContState::None,
        },
    )
}
