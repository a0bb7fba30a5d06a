// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Bytecode format for the Skald VM.
//!
//! Instructions are a one-byte opcode followed by zero or more operands.
//! Every wide opcode (`*U4`) has a `*U1` sibling; the generator picks the
//! one-byte form whenever the operand fits in 8 bits.
//!
//! Operand encodings:
//! - `U1`: a single raw byte.
//! - `U4`: a varint — big-endian groups of 7 bits, high bit set on every
//!   byte except the last. Exception: [`Opcode::RjmpU4`] always carries a
//!   fixed 4-byte little-endian offset so that forward-jump placeholders can
//!   be patched in place once a function body's length is known.
//! - `D8`: a fixed 8-byte little-endian IEEE-754 double.


use crate::value::Word;
use num_enum::TryFromPrimitive;

/// Version stamped into serialized bytecode files. Compiler and VM must
/// agree; a mismatch is a load error.
pub const BYTECODE_VERSION: Word = 2;

/// Bytecode opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum Opcode {
    /// Do nothing.
    Nop = 0,
    /// Pop the top element; print-and-halt if it is an error value.
    Discard,
    /// Store the top element into the second-top slot, then pop. Same
    /// error-propagation rule as `Discard`.
    SwapDiscard,
    /// Push a copy of the top element.
    Dup,
    /// Pop two reals, push their sum.
    Add,
    /// Call a function; operand is the argument count.
    FuncCallU4,
    /// One-byte-operand form of `FuncCallU4`.
    FuncCallU1,
    /// Pop rhs, function, lhs; call function with (lhs, rhs).
    FuncCallInfix,
    /// Jump forwards; operand is the byte count (fixed 4-byte LE).
    RjmpU4,
    /// One-byte-operand form of `RjmpU4`.
    RjmpU1,
    /// Push the current frame's arguments array.
    StackFrameGetArgs,
    /// Look up an atom in the current frame's scope chain; push the value.
    StackFrameLookupU4,
    /// One-byte-operand form of `StackFrameLookupU4`.
    StackFrameLookupU1,
    /// Bind the top of stack (without popping) in the current frame.
    StackFrameSetU4,
    /// One-byte-operand form of `StackFrameSetU4`.
    StackFrameSetU1,
    /// Overwrite an existing binding in the nearest enclosing scope.
    StackFrameReplaceU4,
    /// One-byte-operand form of `StackFrameReplaceU4`.
    StackFrameReplaceU1,
    /// Return from a function.
    Ret,
    /// Push the `none` value (id 0).
    AllocNone,
    /// Allocate an atom value; operand is the atom id.
    AllocAtomU4,
    /// One-byte-operand form of `AllocAtomU4`.
    AllocAtomU1,
    /// Allocate a real; operand is an 8-byte LE double.
    AllocRealD8,
    /// Allocate a buffer from static code-stream data; operands are length
    /// and offset.
    AllocBufferStaticU4,
    /// One-byte-operand form of `AllocBufferStaticU4`.
    AllocBufferStaticU1,
    /// Pop `count` values, push an array of them.
    AllocArrayU4,
    /// One-byte-operand form of `AllocArrayU4`.
    AllocArrayU1,
    /// Allocate an empty namespace.
    AllocNamespace,
    /// Allocate a function; operand is its bytecode position. The captured
    /// namespace is the current frame's.
    AllocFunctionU4,
    /// One-byte-operand form of `AllocFunctionU4`.
    AllocFunctionU1,
    /// Set `ns[key] = val` where val is top, ns second-top; pops neither.
    NamespaceSetU4,
    /// One-byte-operand form of `NamespaceSetU4`.
    NamespaceSetU1,
    /// Pop a namespace, push its value for the atom operand.
    NamespaceLookupU4,
    /// One-byte-operand form of `NamespaceLookupU4`.
    NamespaceLookupU1,
    /// Pop an array, push its element at the index operand.
    ArrayLookupU4,
    /// One-byte-operand form of `ArrayLookupU4`.
    ArrayLookupU1,
    /// Set `arr[key] = val` where val is top, arr second-top; pops neither,
    /// leaves val.
    ArraySetU4,
    /// One-byte-operand form of `ArraySetU4`.
    ArraySetU1,
    /// Pop key and container, push `container[key]`.
    DynamicLookup,
    /// Pop val, key and container; assign and push val.
    DynamicSet,
    /// Halt execution.
    Halt,
}

/// Encode a varint into `out`, returning the number of bytes used (1-5).
pub fn encode_uint(mut word: Word, out: &mut [u8; 5]) -> usize {
    let mut groups = [0u8; 5];
    let mut count = 0;
    loop {
        groups[count] = (word & 0x7f) as u8;
        count += 1;
        word >>= 7;
        if word == 0 {
            break;
        }
    }

    for i in 0..count - 1 {
        out[i] = groups[count - 1 - i] | 0x80;
    }
    out[count - 1] = groups[0];
    count
}

/// Decode a varint from `ops` at `*pos`, advancing `*pos` past it.
///
/// Returns `None` if the encoding runs past the end of `ops`.
#[must_use]
pub fn decode_uint(ops: &[u8], pos: &mut usize) -> Option<Word> {
    let mut word: Word = 0;
    loop {
        let byte = *ops.get(*pos)?;
        *pos += 1;
        word = (word << 7) | Word::from(byte & 0x7f);
        if byte & 0x80 == 0 {
            return Some(word);
        }
    }
}

/// Encode a fixed 4-byte little-endian word.
#[must_use]
pub fn encode_u4le(word: Word) -> [u8; 4] {
    word.to_le_bytes()
}

/// Decode a fixed 4-byte little-endian word, advancing `*pos`.
#[must_use]
pub fn decode_u4le(ops: &[u8], pos: &mut usize) -> Option<Word> {
    let bytes = ops.get(*pos..*pos + 4)?;
    *pos += 4;
    Some(Word::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Encode a double as 8 little-endian bytes.
#[must_use]
pub fn encode_d8le(num: f64) -> [u8; 8] {
    num.to_bits().to_le_bytes()
}

/// Decode an 8-byte little-endian double, advancing `*pos`.
#[must_use]
pub fn decode_d8le(ops: &[u8], pos: &mut usize) -> Option<f64> {
    let bytes = ops.get(*pos..*pos + 8)?;
    *pos += 8;
    let mut arr = [0u8; 8];
    arr.copy_from_slice(bytes);
    Some(f64::from_bits(u64::from_le_bytes(arr)))
}
