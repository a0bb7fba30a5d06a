// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Mark-and-sweep garbage collection.
//!
//! Roots are every operand-stack slot, each active frame's namespace and
//! arguments array (the outermost frame holds only const builtins and is
//! skipped), and the namespaces of registered native modules. Marking uses
//! an explicit worklist, so self-referential structures terminate and deep
//! structures cannot exhaust the host stack. The sweep walks the live
//! bitset from the first non-const id and releases the payload of every
//! unmarked value.

use super::Vm;
use crate::value::{Payload, ValueFlags, Word};
use tracing::trace;

impl Vm {
    /// Run one full collection cycle. Returns the number of freed values.
    pub fn gc(&mut self) -> usize {
        for i in 0..self.sptr {
            self.mark(self.stack[i]);
        }

        // Frame 0 is the builtins scope; its contents are const and are
        // never swept.
        for f in 1..self.fsptr {
            let frame = self.fstack[f];
            self.mark(frame.ns);
            self.mark(frame.args);
        }

        let modules = std::mem::take(&mut self.modules);
        for entry in &modules {
            self.mark(entry.ns);
            entry.module.mark(&mut |id| self.mark(id));
        }
        self.modules = modules;

        let freed = self.sweep();
        trace!(freed, "gc cycle");
        freed
    }

    /// Mark everything reachable from `root`.
    fn mark(&mut self, root: Word) {
        let mut worklist = vec![root];

        while let Some(id) = worklist.pop() {
            let val = &mut self.values[id as usize];
            if val.flags.contains(ValueFlags::MARKED) {
                continue;
            }
            val.flags.insert(ValueFlags::MARKED);

            match &val.payload {
                Payload::Array(arr) => {
                    worklist.extend_from_slice(arr.as_slice());
                }
                Payload::Namespace(ns) => {
                    if ns.parent != 0 {
                        worklist.push(ns.parent);
                    }
                    // Keys are atom ids, not value ids; only values are
                    // traced.
                    worklist.extend(ns.entries().map(|(_, val)| val));
                }
                Payload::Function { ns, .. } => {
                    worklist.push(*ns);
                }
                Payload::Continuation(cont) => {
                    worklist.push(cont.call);
                    if cont.args != 0 {
                        worklist.push(cont.args);
                    }
                    cont.state.roots(|id| worklist.push(id));
                }
                Payload::Return(inner) => {
                    worklist.push(*inner);
                }
                Payload::None
                | Payload::Atom(_)
                | Payload::Real(_)
                | Payload::Buffer(_)
                | Payload::CFunction { .. }
                | Payload::Error(_) => {}
            }
        }
    }

    fn sweep(&mut self) -> usize {
        let mut freed = 0;

        let live: Vec<usize> = self.valueset.iter_from(self.gc_start as usize).collect();
        for id in live {
            let val = &mut self.values[id];
            if val.flags.contains(ValueFlags::MARKED) || val.flags.contains(ValueFlags::CONST) {
                val.flags.remove(ValueFlags::MARKED);
            } else {
                val.payload = Payload::None;
                val.flags = ValueFlags::empty();
                self.valueset.unset(id);
                freed += 1;
            }
        }

        // The const prefix is marked through namespaces but never swept.
        for id in 0..self.gc_start as usize {
            self.values[id].flags.remove(ValueFlags::MARKED);
        }

        freed
    }
}
