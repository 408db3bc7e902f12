//! Code generation from a typed syntax tree to LLVM IR.
//!
//! The generator reads only what the type calculator recorded in the
//! [`TypeTable`](talon_types::TypeTable): node types, resolved call
//! targets and declaration signatures. It never re-derives a type.
//!
//! # Module Organization
//!
//! ```text
//! codegen/
//! ├── value_id.rs            ID handles and the arena behind them
//! ├── ir_builder/            ID-based wrapper over inkwell's builder
//! ├── scope.rs               persistent-map variable scoping
//! ├── context.rs             caches shared across imported modules
//! ├── type_lowering.rs       Idx -> LLVM types, layouts, runtime records
//! ├── module_visitor.rs      declaration pass, then definition pass
//! ├── class_visitor.rs       methods of classes, data types and traits
//! ├── function_visitor.rs    one function body, dispatch per node kind
//! ├── lower_operators.rs     binary and unary operators
//! ├── lower_control_flow.rs  sequences, if, while, case, return
//! ├── lower_calls.rs         calls and argument passing
//! ├── lower_data.rs          construction, ivars, case values
//! ├── lower_dynamic.rs       conversions and the Dynamic box
//! └── lower_closures.rs      lambdas and closure calls
//! ```

mod class_visitor;
pub mod context;
mod function_visitor;
pub mod ir_builder;
mod lower_calls;
mod lower_closures;
mod lower_control_flow;
mod lower_data;
mod lower_dynamic;
mod lower_operators;
mod module_visitor;
pub mod scope;
mod type_lowering;
pub mod value_id;

use rustc_hash::FxHashMap;
use talon_ir::{Name, NodeId, NodeKind, StringInterner, SyntaxTree};
use talon_types::{Pool, TypedModule};

pub use context::CodegenContext;
pub use ir_builder::{FunctionSig, IrBuilder, Position};
pub use scope::{Scope, ScopeBinding};
pub use value_id::{BlockId, FunctionId, LLVMTypeId, ValueId};

/// Generates one typed module into a shared [`CodegenContext`].
pub struct CodeGenerator<'a, 'ctx> {
    pub(crate) tree: &'a SyntaxTree,
    pub(crate) interner: &'a StringInterner,
    pub(crate) pool: &'a Pool,
    pub(crate) typed: &'a TypedModule,
    pub(crate) cx: &'a mut CodegenContext<'ctx>,
    /// Trait bodies declared in this module, for `include`.
    pub(crate) traits: FxHashMap<Name, NodeId>,
}

impl<'a, 'ctx> CodeGenerator<'a, 'ctx> {
    pub fn new(
        tree: &'a SyntaxTree,
        interner: &'a StringInterner,
        pool: &'a Pool,
        typed: &'a TypedModule,
        cx: &'a mut CodegenContext<'ctx>,
    ) -> Self {
        let traits = statements(tree, tree.root())
            .into_iter()
            .filter_map(|stmt| match tree.kind(stmt) {
                NodeKind::TraitDef { name, body } => Some((*name, *body)),
                _ => None,
            })
            .collect();
        CodeGenerator {
            tree,
            interner,
            pool,
            typed,
            cx,
            traits,
        }
    }

    pub(crate) fn text(&self, name: Name) -> &'static str {
        self.interner.lookup(name)
    }
}

/// Children of a `Seq`, or the node itself.
pub(crate) fn statements(tree: &SyntaxTree, node: NodeId) -> Vec<NodeId> {
    match tree.kind(node) {
        NodeKind::Seq(stmts) => stmts.clone(),
        _ => vec![node],
    }
}
