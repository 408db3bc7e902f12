//! The global type environment.
//!
//! Built once per session and passed by reference to every type
//! calculator, including the nested ones that compile imports, so all
//! modules agree on what `Integer` or `String` means.

use rustc_hash::FxHashMap;
use talon_ir::{Name, StringInterner};

use crate::Idx;

/// Functions every module can call without declaring them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Builtin {
    /// `reclaim(object)`: release a heap-allocated object.
    Reclaim,
}

pub struct GlobalEnv {
    types: FxHashMap<Name, Idx>,
    builtins: FxHashMap<Name, Builtin>,
}

impl GlobalEnv {
    pub fn new(interner: &StringInterner) -> Self {
        let types = [
            ("Integer", Idx::INTEGER),
            ("Boolean", Idx::BOOLEAN),
            ("Char", Idx::CHAR),
            ("Void", Idx::VOID),
            ("String", Idx::STRING),
            ("Type", Idx::TYPE),
            ("Dynamic", Idx::DYNAMIC),
        ]
        .into_iter()
        .map(|(name, idx)| (interner.intern(name), idx))
        .collect();
        let builtins = [(interner.intern("reclaim"), Builtin::Reclaim)]
            .into_iter()
            .collect();
        GlobalEnv { types, builtins }
    }

    pub fn lookup_type(&self, name: Name) -> Option<Idx> {
        self.types.get(&name).copied()
    }

    pub fn builtin(&self, name: Name) -> Option<Builtin> {
        self.builtins.get(&name).copied()
    }
}
