// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Code generator.
//!
//! A thin layer over the output buffer plus the atom and string-literal
//! interners, the relocation list, and the registered native modules. The
//! parser calls one emit method per recognized construct; nothing is
//! buffered beyond the bytecode itself.
//!
//! String literals are embedded in the code stream behind a forward jump
//! and deduplicated: a second occurrence of the same bytes reuses the first
//! occurrence's `(length, offset)` pair.

mod fs_resolver;

#[cfg(test)]
mod fs_resolver_test;

pub use fs_resolver::FsResolver;

use crate::bytecode::{Opcode, encode_u4le, encode_uint};
use crate::interner::Interner;
use crate::module::Module;
use crate::value::Word;
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Pluggable import resolution (see the CLI's [`FsResolver`]).
///
/// `normalize` resolves a path relative to the source currently being
/// compiled; `open` yields a reader for the canonical path and pushes it
/// onto the resolver's stack of in-progress sources, so nested imports
/// resolve against their own directory; `close` pops it again.
pub trait ImportResolver {
    /// Canonicalize an import path relative to the current source.
    fn normalize(&mut self, path: &str) -> Result<PathBuf, String>;

    /// Open a canonical path and enter it.
    fn open(&mut self, path: &Path) -> Result<Box<dyn Read>, String>;

    /// Leave the most recently opened source.
    fn close(&mut self);
}

/// A deferred patch: write `replacement` at byte offset `pos` (4 bytes,
/// little-endian) once the full program has been generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reloc {
    /// Byte offset of the placeholder payload.
    pub pos: Word,
    /// Value to write there.
    pub replacement: Word,
}

#[derive(Debug, Clone, Copy)]
struct StringLoc {
    length: Word,
    pos: Word,
}

/// The code generator.
pub struct Generator<'m> {
    buf: Vec<u8>,
    atoms: Interner,
    strings: HashMap<Box<str>, StringLoc>,
    relocs: Vec<Reloc>,
    modules: Vec<Word>,
    resolver: Option<&'m mut dyn ImportResolver>,
}

impl<'m> Generator<'m> {
    /// Create a generator. The builtins module's names are interned first so
    /// that its atom ids match the VM's.
    pub fn new(
        builtins: &mut dyn Module,
        resolver: Option<&'m mut dyn ImportResolver>,
    ) -> Self {
        let mut atoms = Interner::new();
        builtins.init(&mut |name| atoms.intern(name));

        Self {
            buf: Vec::new(),
            atoms,
            strings: HashMap::new(),
            relocs: Vec::new(),
            modules: Vec::new(),
            resolver,
        }
    }

    /// Register a native module: interns its name and its exported atoms.
    pub fn register_module(&mut self, module: &mut dyn Module) {
        let id = self.atoms.intern(module.name());
        module.init(&mut |name| self.atoms.intern(name));
        self.modules.push(id);
    }

    /// Current emit position.
    #[must_use]
    pub fn pos(&self) -> Word {
        self.buf.len() as Word
    }

    /// The generated bytecode. Call [`Self::apply_relocs`] first if any
    /// function bodies were emitted.
    #[must_use]
    pub fn bytecode(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the generator, yielding the bytecode with relocations
    /// applied.
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        self.apply_relocs();
        self.buf
    }

    /// Intern an atom without emitting anything.
    pub fn intern_atom(&mut self, name: &str) -> Word {
        self.atoms.intern(name)
    }

    /// The pending relocations.
    #[must_use]
    pub fn relocs(&self) -> &[Reloc] {
        &self.relocs
    }

    /// Record a relocation for a placeholder at `pos`.
    pub fn add_reloc(&mut self, pos: Word, replacement: Word) {
        self.relocs.push(Reloc { pos, replacement });
    }

    /// Patch all recorded relocations into the buffer and clear the list.
    pub fn apply_relocs(&mut self) {
        for reloc in std::mem::take(&mut self.relocs) {
            let pos = reloc.pos as usize;
            self.buf[pos..pos + 4].copy_from_slice(&encode_u4le(reloc.replacement));
        }
    }

    /// Roll the buffer back to `pos`, dropping relocations and string
    /// locations past it. Used by the REPL to discard a line that failed to
    /// parse.
    pub fn truncate(&mut self, pos: Word) {
        self.buf.truncate(pos as usize);
        self.relocs.retain(|r| r.pos < pos);
        self.strings.retain(|_, loc| loc.pos + loc.length <= pos);
    }

    fn put(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    fn put_op(&mut self, op: Opcode) {
        self.buf.push(op as u8);
    }

    fn put_uint(&mut self, word: Word) {
        let mut out = [0u8; 5];
        let len = encode_uint(word, &mut out);
        self.buf.extend_from_slice(&out[..len]);
    }

    /// Emit an operand-carrying instruction, picking the one-byte form when
    /// the operand fits.
    fn put_sized(&mut self, wide: Opcode, narrow: Opcode, operand: Word) {
        if operand <= 0xff {
            self.put_op(narrow);
            self.put(operand as u8);
        } else {
            self.put_op(wide);
            self.put_uint(operand);
        }
    }

    /// Emit `HALT`.
    pub fn halt(&mut self) {
        self.put_op(Opcode::Halt);
    }

    /// Emit a forward jump over `len` bytes.
    pub fn rjmp(&mut self, len: Word) {
        if len <= 0xff {
            self.put_op(Opcode::RjmpU1);
            self.put(len as u8);
        } else {
            // RJMP_U4 always carries a fixed 4-byte LE offset.
            self.put_op(Opcode::RjmpU4);
            self.buf.extend_from_slice(&encode_u4le(len));
        }
    }

    /// Emit a forward jump with a zeroed 4-byte payload, to be patched via a
    /// relocation. The payload starts at `self.pos() + 1` before the call.
    pub fn rjmp_placeholder(&mut self) {
        self.put_op(Opcode::RjmpU4);
        self.buf.extend_from_slice(&[0, 0, 0, 0]);
    }

    /// Emit `DISCARD`.
    pub fn discard(&mut self) {
        self.put_op(Opcode::Discard);
    }

    /// Emit `SWAP_DISCARD`.
    pub fn swap_discard(&mut self) {
        self.put_op(Opcode::SwapDiscard);
    }

    /// Emit `RET`.
    pub fn ret(&mut self) {
        self.put_op(Opcode::Ret);
    }

    /// Emit `ALLOC_NONE`.
    pub fn none(&mut self) {
        self.put_op(Opcode::AllocNone);
    }

    /// Emit a real literal.
    pub fn number(&mut self, num: f64) {
        self.put_op(Opcode::AllocRealD8);
        self.buf
            .extend_from_slice(&crate::bytecode::encode_d8le(num));
    }

    /// Emit an atom literal, interning its name.
    pub fn atom(&mut self, name: &str) {
        let id = self.atoms.intern(name);
        self.put_sized(Opcode::AllocAtomU4, Opcode::AllocAtomU1, id);
    }

    /// Emit a string literal. The bytes are embedded in the code stream
    /// behind a forward jump on first use; later uses share the same
    /// `(length, offset)`.
    pub fn string(&mut self, s: &str) {
        let loc = if let Some(&loc) = self.strings.get(s) {
            loc
        } else {
            let length = s.len() as Word;
            self.rjmp(length);
            let pos = self.pos();
            self.buf.extend_from_slice(s.as_bytes());

            let loc = StringLoc { length, pos };
            self.strings.insert(s.into(), loc);
            loc
        };

        self.buffer_static(loc.length, loc.pos);
    }

    fn buffer_static(&mut self, length: Word, pos: Word) {
        if length <= 0xff && pos <= 0xff {
            self.put_op(Opcode::AllocBufferStaticU1);
            self.put(length as u8);
            self.put(pos as u8);
        } else {
            self.put_op(Opcode::AllocBufferStaticU4);
            self.put_uint(length);
            self.put_uint(pos);
        }
    }

    /// Emit a function allocation pointing at `pos`.
    pub fn function(&mut self, pos: Word) {
        self.put_sized(Opcode::AllocFunctionU4, Opcode::AllocFunctionU1, pos);
    }

    /// Emit an array allocation consuming `count` stack values.
    pub fn array(&mut self, count: Word) {
        self.put_sized(Opcode::AllocArrayU4, Opcode::AllocArrayU1, count);
    }

    /// Emit a namespace allocation.
    pub fn namespace(&mut self) {
        self.put_op(Opcode::AllocNamespace);
    }

    /// Emit a namespace insert for `ident`.
    pub fn namespace_set(&mut self, ident: &str) {
        let id = self.atoms.intern(ident);
        self.put_sized(Opcode::NamespaceSetU4, Opcode::NamespaceSetU1, id);
    }

    /// Emit a namespace lookup for `ident`.
    pub fn namespace_lookup(&mut self, ident: &str) {
        let id = self.atoms.intern(ident);
        self.put_sized(Opcode::NamespaceLookupU4, Opcode::NamespaceLookupU1, id);
    }

    /// Emit a positional array lookup.
    pub fn array_lookup(&mut self, index: Word) {
        self.put_sized(Opcode::ArrayLookupU4, Opcode::ArrayLookupU1, index);
    }

    /// Emit a positional array assignment.
    pub fn array_set(&mut self, index: Word) {
        self.put_sized(Opcode::ArraySetU4, Opcode::ArraySetU1, index);
    }

    /// Emit a dynamic (runtime-keyed) lookup.
    pub fn dynamic_lookup(&mut self) {
        self.put_op(Opcode::DynamicLookup);
    }

    /// Emit a dynamic (runtime-keyed) assignment.
    pub fn dynamic_set(&mut self) {
        self.put_op(Opcode::DynamicSet);
    }

    /// Emit a push of the current frame's arguments array.
    pub fn stack_frame_get_args(&mut self) {
        self.put_op(Opcode::StackFrameGetArgs);
    }

    /// Emit a scope-chain lookup for `ident`.
    pub fn stack_frame_lookup(&mut self, ident: &str) {
        let id = self.atoms.intern(ident);
        self.stack_frame_lookup_atom(id);
    }

    /// Emit a scope-chain lookup for an already-interned atom.
    pub fn stack_frame_lookup_atom(&mut self, id: Word) {
        self.put_sized(
            Opcode::StackFrameLookupU4,
            Opcode::StackFrameLookupU1,
            id,
        );
    }

    /// Emit a binding of `ident` in the current frame.
    pub fn stack_frame_set(&mut self, ident: &str) {
        let id = self.atoms.intern(ident);
        self.put_sized(Opcode::StackFrameSetU4, Opcode::StackFrameSetU1, id);
    }

    /// Emit a replacement of `ident` in the nearest enclosing scope.
    pub fn stack_frame_replace(&mut self, ident: &str) {
        let id = self.atoms.intern(ident);
        self.put_sized(
            Opcode::StackFrameReplaceU4,
            Opcode::StackFrameReplaceU1,
            id,
        );
    }

    /// Emit a function call with `argc` arguments.
    pub fn func_call(&mut self, argc: Word) {
        self.put_sized(Opcode::FuncCallU4, Opcode::FuncCallU1, argc);
    }

    /// Emit an infix function call.
    pub fn func_call_infix(&mut self) {
        self.put_op(Opcode::FuncCallInfix);
    }

    /// If `name` is a registered native module, emit a lookup of its
    /// namespace and return true.
    pub fn cmodule(&mut self, name: &str) -> bool {
        let id = self.atoms.lookup(name);
        if id == 0 || !self.modules.contains(&id) {
            return false;
        }

        self.stack_frame_lookup_atom(id);
        true
    }

    /// Resolve an import path to a reader via the configured resolver.
    pub fn open_import(&mut self, path: &str) -> Result<Box<dyn Read>, String> {
        let resolver = self
            .resolver
            .as_mut()
            .ok_or_else(|| String::from("no import resolver configured"))?;
        let canonical = resolver.normalize(path)?;
        resolver.open(&canonical)
    }

    /// Leave the most recently opened import source.
    pub fn close_import(&mut self) {
        if let Some(resolver) = self.resolver.as_mut() {
            resolver.close();
        }
    }
}
