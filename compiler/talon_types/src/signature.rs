//! Callable signatures.

use talon_ir::Name;

use crate::Idx;

/// One declared parameter. Only named parameters accept named arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub name: Option<Name>,
    pub ty: Idx,
}

impl Param {
    pub fn named(name: Name, ty: Idx) -> Self {
        Param {
            name: Some(name),
            ty,
        }
    }

    pub fn anonymous(ty: Idx) -> Self {
        Param { name: None, ty }
    }
}

/// The type-level view of a function, method or external declaration.
///
/// Built once when the declaration is first seen and shared by call typing
/// and call lowering. Method signatures leave out the receiver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    /// Name as written at call sites.
    pub name: Name,
    /// Symbol the code generator defines or declares.
    pub link_name: Name,
    pub params: Vec<Param>,
    pub ret: Idx,
    /// Accepts extra arguments after the declared ones.
    pub varargs: bool,
}

impl Signature {
    /// Number of declared (fixed) parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn param_types(&self) -> impl Iterator<Item = Idx> + '_ {
        self.params.iter().map(|p| p.ty)
    }
}
