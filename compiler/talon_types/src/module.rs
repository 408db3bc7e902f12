//! What one compiled module exposes to its importers.

use rustc_hash::FxHashMap;
use talon_ir::Name;

use crate::{Idx, Signature};

/// Index of a compiled module in the session.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ModuleId(u32);

impl ModuleId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        ModuleId(raw)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Top-level functions and types declared by a module.
#[derive(Clone, Debug, Default)]
pub struct ModuleNamespace {
    pub functions: FxHashMap<Name, Signature>,
    pub types: FxHashMap<Name, Idx>,
}

impl ModuleNamespace {
    pub fn function(&self, name: Name) -> Option<&Signature> {
        self.functions.get(&name)
    }

    pub fn lookup_type(&self, name: Name) -> Option<Idx> {
        self.types.get(&name).copied()
    }
}
