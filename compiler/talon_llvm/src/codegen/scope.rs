//! Local variable bindings for function lowering.
//!
//! `Scope` uses `im::HashMap`, so entering a `when` arm or a lambda body
//! clones the enclosing bindings in O(1) and the child's additions vanish
//! when it is dropped.

use im::HashMap;
use talon_ir::Name;

use super::value_id::{LLVMTypeId, ValueId};

/// How a variable is stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeBinding {
    /// SSA value; cannot be reassigned (the receiver `self`).
    Immutable(ValueId),
    /// Stack slot with explicit load/store.
    Mutable {
        /// The alloca.
        ptr: ValueId,
        /// Type of the stored value, needed for `load`.
        ty: LLVMTypeId,
    },
}

#[derive(Clone, Debug, Default)]
pub struct Scope {
    bindings: HashMap<Name, ScopeBinding>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// A child scope that starts with all of this scope's bindings.
    #[must_use]
    pub fn child(&self) -> Self {
        self.clone()
    }

    pub fn bind_immutable(&mut self, name: Name, val: ValueId) {
        self.bindings.insert(name, ScopeBinding::Immutable(val));
    }

    pub fn bind_mutable(&mut self, name: Name, ptr: ValueId, ty: LLVMTypeId) {
        self.bindings.insert(name, ScopeBinding::Mutable { ptr, ty });
    }

    pub fn lookup(&self, name: Name) -> Option<ScopeBinding> {
        self.bindings.get(&name).copied()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn name(n: u32) -> Name {
        Name::from_raw(n)
    }

    #[test]
    fn child_sees_parent_bindings_but_not_the_reverse() {
        let mut parent = Scope::new();
        parent.bind_immutable(name(1), ValueId::NONE);

        let mut child = parent.child();
        child.bind_mutable(name(2), ValueId::NONE, LLVMTypeId::NONE);

        assert!(child.lookup(name(1)).is_some());
        assert!(child.lookup(name(2)).is_some());
        assert!(parent.lookup(name(2)).is_none());
    }

    #[test]
    fn shadowing_in_child_leaves_parent_binding() {
        let mut parent = Scope::new();
        parent.bind_immutable(name(1), ValueId::NONE);
        let mut child = parent.child();
        child.bind_mutable(name(1), ValueId::NONE, LLVMTypeId::NONE);

        assert!(matches!(
            child.lookup(name(1)),
            Some(ScopeBinding::Mutable { .. })
        ));
        assert_eq!(
            parent.lookup(name(1)),
            Some(ScopeBinding::Immutable(ValueId::NONE))
        );
    }
}
