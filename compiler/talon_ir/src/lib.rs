//! Syntax tree for the Talon compiler core.
//!
//! The parser lives outside this workspace; it hands both compiler passes a
//! [`SyntaxTree`], an arena of [`NodeKind`]s addressed by [`NodeId`]. Node kinds
//! form the closed sum type [`NodeKind`], so the type calculator and the code
//! generator each match it exhaustively.
//!
//! Identifiers are [`Name`]s interned in a [`StringInterner`] that every tree
//! of a compilation session shares.

mod interner;
mod name;
mod node;
mod tree;

pub use interner::StringInterner;
pub use name::Name;
pub use node::{Attribute, BinaryOp, NodeId, NodeKind, UnaryOp};
pub use tree::{SyntaxTree, TreeBuilder};
