//! Type model and type calculator for Talon.
//!
//! Types live in a [`Pool`] and are referred to by [`Idx`] handles. The
//! [`TypeCalculator`] walks a syntax tree once, assigns a type to every
//! node and records its decisions in a [`TypeTable`] keyed by
//! `(InstanceId, NodeId)`, which the code generator then reads.
//!
//! # Type variables
//!
//! Untyped lambda parameters start as [`VarState::Unresolved`] entries and
//! are forwarded exactly once, when the lambda is passed where a concrete
//! closure type is expected. Operators applied to an open variable produce
//! a [`DerivedType`] that evaluates once the variable is known.

mod args;
mod calc;
mod data;
mod flags;
mod global;
mod idx;
mod module;
mod ops;
mod pool;
mod scope;
mod signature;
mod table;
mod template;

pub use args::{order_arguments, OrderedArgs};
pub use calc::{ImportResolver, NoImports, TypeCalculator, TypedModule};
pub use data::{
    CaseType, ClosureType, DataType, DerivedType, ParamList, ReferenceType, TypeData, VarState,
};
pub use flags::TypeFlags;
pub use global::{Builtin, GlobalEnv};
pub use idx::Idx;
pub use module::{ModuleId, ModuleNamespace};
pub use ops::Operation;
pub use pool::{Conversion, Pool};
pub use scope::{Binding, Scope, ScopeChain};
pub use signature::{Param, Signature};
pub use table::{Target, TypeTable};
pub use template::{ExpandedTemplate, InstanceId, Template, TemplateId};

#[cfg(target_pointer_width = "64")]
mod size_asserts {
    use super::{Idx, InstanceId};
    const _: () = assert!(std::mem::size_of::<Idx>() == 4);
    const _: () = assert!(std::mem::size_of::<InstanceId>() == 4);
}
