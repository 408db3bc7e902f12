//! Generic declarations and their expansions.

use talon_ir::{Name, NodeId};

use crate::Idx;

/// Index of a template within its module.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TemplateId(u32);

impl TemplateId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        TemplateId(raw)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// One walk of (part of) the syntax tree.
///
/// Plain code is walked once under [`InstanceId::ROOT`]. Each generic
/// expansion and each trait inclusion walks its declaration body again
/// under a fresh id, so memo entries are keyed by `(InstanceId, NodeId)`
/// instead of by copies of the tree.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct InstanceId(u32);

impl InstanceId {
    pub const ROOT: InstanceId = InstanceId(0);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        InstanceId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// A generic `class` or `data` declaration with one type parameter.
#[derive(Clone, Debug)]
pub struct Template {
    pub name: Name,
    pub param: Name,
    /// The `ClassDef` or `DataDef` node.
    pub decl: NodeId,
    /// Every concrete expansion produced so far, in creation order.
    pub expansions: Vec<ExpandedTemplate>,
}

/// One concrete instantiation of a template.
#[derive(Clone, Debug)]
pub struct ExpandedTemplate {
    pub args: Vec<Idx>,
    pub ty: Idx,
    /// Walk id under which the declaration body was typed.
    pub instance: InstanceId,
}
