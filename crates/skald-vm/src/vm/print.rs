// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Bytecode disassembler and VM state inspector.
//!
//! Used by `--bytecode`, `--step` and the tests. Instructions decode into a
//! structured [`Instr`] so tests can assert on opcode sequences instead of
//! formatted text. String literals are embedded in the code stream, so a
//! linear disassembly prints their bytes as unknown instructions; that is
//! expected.

use super::Vm;
use crate::bytecode::{Opcode, decode_d8le, decode_u4le, decode_uint};
use crate::builtins::write_real;
use crate::value::{Payload, Word};
use std::fmt;
use std::io::Write;

/// A decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instr {
    /// `NOP`
    Nop,
    /// `DISCARD`
    Discard,
    /// `SWAP_DISCARD`
    SwapDiscard,
    /// `DUP`
    Dup,
    /// `ADD`
    Add,
    /// `FUNC_CALL argc`
    FuncCall(Word),
    /// `FUNC_CALL_INFIX`
    FuncCallInfix,
    /// `RJMP offset`
    Rjmp(Word),
    /// `STACK_FRAME_GET_ARGS`
    StackFrameGetArgs,
    /// `STACK_FRAME_LOOKUP atom`
    StackFrameLookup(Word),
    /// `STACK_FRAME_SET atom`
    StackFrameSet(Word),
    /// `STACK_FRAME_REPLACE atom`
    StackFrameReplace(Word),
    /// `RET`
    Ret,
    /// `ALLOC_NONE`
    AllocNone,
    /// `ALLOC_ATOM atom`
    AllocAtom(Word),
    /// `ALLOC_REAL num`
    AllocReal(f64),
    /// `ALLOC_BUFFER_STATIC length offset`
    AllocBufferStatic(Word, Word),
    /// `ALLOC_ARRAY count`
    AllocArray(Word),
    /// `ALLOC_NAMESPACE`
    AllocNamespace,
    /// `ALLOC_FUNCTION pos`
    AllocFunction(Word),
    /// `NAMESPACE_SET atom`
    NamespaceSet(Word),
    /// `NAMESPACE_LOOKUP atom`
    NamespaceLookup(Word),
    /// `ARRAY_LOOKUP index`
    ArrayLookup(Word),
    /// `ARRAY_SET index`
    ArraySet(Word),
    /// `DYNAMIC_LOOKUP`
    DynamicLookup,
    /// `DYNAMIC_SET`
    DynamicSet,
    /// `HALT`
    Halt,
    /// Not a known opcode (string-literal bytes decode as this).
    Unknown(u8),
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nop => write!(f, "NOP"),
            Self::Discard => write!(f, "DISCARD"),
            Self::SwapDiscard => write!(f, "SWAP_DISCARD"),
            Self::Dup => write!(f, "DUP"),
            Self::Add => write!(f, "ADD"),
            Self::FuncCall(argc) => write!(f, "FUNC_CALL {argc}"),
            Self::FuncCallInfix => write!(f, "FUNC_CALL_INFIX"),
            Self::Rjmp(offset) => write!(f, "RJMP {offset}"),
            Self::StackFrameGetArgs => write!(f, "STACK_FRAME_GET_ARGS"),
            Self::StackFrameLookup(atom) => write!(f, "STACK_FRAME_LOOKUP {atom}"),
            Self::StackFrameSet(atom) => write!(f, "STACK_FRAME_SET {atom}"),
            Self::StackFrameReplace(atom) => write!(f, "STACK_FRAME_REPLACE {atom}"),
            Self::Ret => write!(f, "RET"),
            Self::AllocNone => write!(f, "ALLOC_NONE"),
            Self::AllocAtom(atom) => write!(f, "ALLOC_ATOM {atom}"),
            Self::AllocReal(num) => write!(f, "ALLOC_REAL {num}"),
            Self::AllocBufferStatic(length, offset) => {
                write!(f, "ALLOC_BUFFER_STATIC {length} {offset}")
            }
            Self::AllocArray(count) => write!(f, "ALLOC_ARRAY {count}"),
            Self::AllocNamespace => write!(f, "ALLOC_NAMESPACE"),
            Self::AllocFunction(pos) => write!(f, "ALLOC_FUNCTION {pos}"),
            Self::NamespaceSet(atom) => write!(f, "NAMESPACE_SET {atom}"),
            Self::NamespaceLookup(atom) => write!(f, "NAMESPACE_LOOKUP {atom}"),
            Self::ArrayLookup(index) => write!(f, "ARRAY_LOOKUP {index}"),
            Self::ArraySet(index) => write!(f, "ARRAY_SET {index}"),
            Self::DynamicLookup => write!(f, "DYNAMIC_LOOKUP"),
            Self::DynamicSet => write!(f, "DYNAMIC_SET"),
            Self::Halt => write!(f, "HALT"),
            Self::Unknown(byte) => write!(f, "? 0x{byte:02x}"),
        }
    }
}

/// Decode one instruction at `*pos`, advancing past it. `None` at the end
/// of the buffer or on a truncated operand.
#[must_use]
pub fn read_instr(ops: &[u8], pos: &mut usize) -> Option<Instr> {
    let byte = *ops.get(*pos)?;
    *pos += 1;

    let Ok(opcode) = Opcode::try_from(byte) else {
        return Some(Instr::Unknown(byte));
    };

    let instr = match opcode {
        Opcode::Nop => Instr::Nop,
        Opcode::Discard => Instr::Discard,
        Opcode::SwapDiscard => Instr::SwapDiscard,
        Opcode::Dup => Instr::Dup,
        Opcode::Add => Instr::Add,
        Opcode::FuncCallU4 => Instr::FuncCall(decode_uint(ops, pos)?),
        Opcode::FuncCallU1 => Instr::FuncCall(read_u1(ops, pos)?),
        Opcode::FuncCallInfix => Instr::FuncCallInfix,
        Opcode::RjmpU4 => Instr::Rjmp(decode_u4le(ops, pos)?),
        Opcode::RjmpU1 => Instr::Rjmp(read_u1(ops, pos)?),
        Opcode::StackFrameGetArgs => Instr::StackFrameGetArgs,
        Opcode::StackFrameLookupU4 => Instr::StackFrameLookup(decode_uint(ops, pos)?),
        Opcode::StackFrameLookupU1 => Instr::StackFrameLookup(read_u1(ops, pos)?),
        Opcode::StackFrameSetU4 => Instr::StackFrameSet(decode_uint(ops, pos)?),
        Opcode::StackFrameSetU1 => Instr::StackFrameSet(read_u1(ops, pos)?),
        Opcode::StackFrameReplaceU4 => Instr::StackFrameReplace(decode_uint(ops, pos)?),
        Opcode::StackFrameReplaceU1 => Instr::StackFrameReplace(read_u1(ops, pos)?),
        Opcode::Ret => Instr::Ret,
        Opcode::AllocNone => Instr::AllocNone,
        Opcode::AllocAtomU4 => Instr::AllocAtom(decode_uint(ops, pos)?),
        Opcode::AllocAtomU1 => Instr::AllocAtom(read_u1(ops, pos)?),
        Opcode::AllocRealD8 => Instr::AllocReal(decode_d8le(ops, pos)?),
        Opcode::AllocBufferStaticU4 => {
            let length = decode_uint(ops, pos)?;
            let offset = decode_uint(ops, pos)?;
            Instr::AllocBufferStatic(length, offset)
        }
        Opcode::AllocBufferStaticU1 => {
            let length = read_u1(ops, pos)?;
            let offset = read_u1(ops, pos)?;
            Instr::AllocBufferStatic(length, offset)
        }
        Opcode::AllocArrayU4 => Instr::AllocArray(decode_uint(ops, pos)?),
        Opcode::AllocArrayU1 => Instr::AllocArray(read_u1(ops, pos)?),
        Opcode::AllocNamespace => Instr::AllocNamespace,
        Opcode::AllocFunctionU4 => Instr::AllocFunction(decode_uint(ops, pos)?),
        Opcode::AllocFunctionU1 => Instr::AllocFunction(read_u1(ops, pos)?),
        Opcode::NamespaceSetU4 => Instr::NamespaceSet(decode_uint(ops, pos)?),
        Opcode::NamespaceSetU1 => Instr::NamespaceSet(read_u1(ops, pos)?),
        Opcode::NamespaceLookupU4 => Instr::NamespaceLookup(decode_uint(ops, pos)?),
        Opcode::NamespaceLookupU1 => Instr::NamespaceLookup(read_u1(ops, pos)?),
        Opcode::ArrayLookupU4 => Instr::ArrayLookup(decode_uint(ops, pos)?),
        Opcode::ArrayLookupU1 => Instr::ArrayLookup(read_u1(ops, pos)?),
        Opcode::ArraySetU4 => Instr::ArraySet(decode_uint(ops, pos)?),
        Opcode::ArraySetU1 => Instr::ArraySet(read_u1(ops, pos)?),
        Opcode::DynamicLookup => Instr::DynamicLookup,
        Opcode::DynamicSet => Instr::DynamicSet,
        Opcode::Halt => Instr::Halt,
    };

    Some(instr)
}

fn read_u1(ops: &[u8], pos: &mut usize) -> Option<Word> {
    let byte = *ops.get(*pos)?;
    *pos += 1;
    Some(Word::from(byte))
}

/// Disassemble a whole code buffer.
pub fn print_bytecode(w: &mut dyn Write, ops: &[u8]) {
    let mut pos = 0;
    while pos < ops.len() {
        let at = pos;
        match read_instr(ops, &mut pos) {
            Some(instr) => {
                let _ = writeln!(w, "{at:04} {instr}");
            }
            None => {
                let _ = writeln!(w, "{at:04} (truncated)");
                return;
            }
        }
    }
}

/// Disassemble the single instruction at `*pos`.
pub fn print_op(w: &mut dyn Write, ops: &[u8], pos: &mut usize) {
    match read_instr(ops, pos) {
        Some(instr) => {
            let _ = writeln!(w, "{instr}");
        }
        None => {
            let _ = writeln!(w, "(truncated)");
        }
    }
}

/// Debug-print one value (inspector format, not `print` format).
pub fn print_val(w: &mut dyn Write, vm: &Vm, id: Word) {
    match &vm.value(id).payload {
        Payload::None => {
            let _ = writeln!(w, "NONE");
        }
        Payload::Atom(atom) => match vm.atoms.name(*atom) {
            Some(name) => {
                let _ = writeln!(w, "ATOM {atom} '{name}'");
            }
            None => {
                let _ = writeln!(w, "ATOM {atom}");
            }
        },
        Payload::Real(num) => {
            let _ = write!(w, "REAL ");
            write_real(w, *num);
            let _ = writeln!(w);
        }
        Payload::Buffer(buf) => {
            let _ = writeln!(w, "BUFFER, len {}", buf.len());
        }
        Payload::Array(arr) => {
            let _ = writeln!(w, "ARRAY, len {}", arr.len());
            for (i, item) in arr.as_slice().iter().enumerate() {
                let _ = writeln!(w, "    {i}: {item}");
            }
        }
        Payload::Namespace(ns) => {
            let _ = writeln!(w, "NAMESPACE, len {}, parent {}", ns.len(), ns.parent);
            for (key, val) in ns.entries() {
                let _ = writeln!(w, "    {key}: {val}");
            }
        }
        Payload::Function { pos, ns } => {
            let _ = writeln!(w, "FUNCTION, pos {pos}, ns {ns}");
        }
        Payload::CFunction { module, .. } => {
            let _ = writeln!(w, "C FUNCTION, module {module}");
        }
        Payload::Continuation(cont) => {
            let _ = writeln!(w, "CONTINUATION, call {}, args {}", cont.call, cont.args);
        }
        Payload::Return(inner) => {
            let _ = writeln!(w, "RETURN, {inner}");
        }
        Payload::Error(message) => {
            let _ = writeln!(w, "ERROR, {message}");
        }
    }
}

/// Dump the operand stack.
pub fn print_stack(w: &mut dyn Write, vm: &Vm) {
    for i in 0..vm.sptr {
        let _ = writeln!(w, "  {i}: {}", vm.stack[i]);
    }
}

/// Dump the live heap from the first non-const id.
pub fn print_heap(w: &mut dyn Write, vm: &Vm) {
    let _ = writeln!(w, "  0-{}: (builtins)", vm.gc_start - 1);
    for id in vm.valueset.iter_from(vm.gc_start as usize) {
        let _ = write!(w, "  {id}: ");
        print_val(w, vm, id as Word);
    }
}

/// Dump the frame stack.
pub fn print_fstack(w: &mut dyn Write, vm: &Vm) {
    for i in 0..vm.fsptr {
        let frame = vm.fstack[i];
        let _ = writeln!(
            w,
            "  {i}: ns {}, ret {}, stack base {}, args {}",
            frame.ns, frame.retptr, frame.sptr, frame.args
        );
    }
}

/// Dump the full VM state.
pub fn print_state(w: &mut dyn Write, vm: &Vm) {
    let _ = writeln!(w, "Stack:");
    print_stack(w, vm);
    let _ = writeln!(w, "Heap:");
    print_heap(w, vm);
    let _ = writeln!(w, "Frame Stack:");
    print_fstack(w, vm);
}
