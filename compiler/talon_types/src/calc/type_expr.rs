//! Type expressions: `Integer`, `*T`, `Box<Integer>`, `Closure<(A) -> R>`.

use smallvec::SmallVec;
use talon_diagnostic::{CompileError, CompileResult};
use talon_ir::{NodeId, NodeKind};

use super::TypeCalculator;
use crate::{Binding, Idx};

impl TypeCalculator<'_> {
    /// The type a type expression denotes, recording it on the node.
    pub(super) fn resolve_type_expr(&mut self, node: NodeId) -> CompileResult<Idx> {
        let tree = self.tree;
        let ty = match tree.kind(node) {
            NodeKind::NamedType(name) => match self.scopes.lookup(*name) {
                Some(Binding::Type(ty)) => ty,
                Some(_) => {
                    return Err(CompileError::type_mismatch(format!(
                        "'{}' is not a type",
                        self.text(*name)
                    )))
                }
                None if self.scopes.find_template(*name).is_some() => {
                    return Err(CompileError::type_mismatch(format!(
                        "'{}' needs a type argument",
                        self.text(*name)
                    )))
                }
                None => return Err(CompileError::uninitialized(self.text(*name))),
            },
            NodeKind::PointerType(inner) => {
                let inner = self.resolve_type_expr(*inner)?;
                self.pool.pointer(inner)
            }
            NodeKind::TemplatedType { name, args } => {
                let id = self.scopes.find_template(*name).ok_or_else(|| {
                    CompileError::type_mismatch(format!(
                        "'{}' is not a generic type",
                        self.text(*name)
                    ))
                })?;
                let args = args
                    .iter()
                    .map(|&arg| self.resolve_type_expr(arg))
                    .collect::<CompileResult<Vec<_>>>()?;
                self.expand(id, args)?
            }
            NodeKind::ClosureType { params, ret } => {
                let params = params
                    .iter()
                    .map(|&p| self.resolve_type_expr(p))
                    .collect::<CompileResult<SmallVec<_>>>()?;
                let ret = self.resolve_type_expr(*ret)?;
                self.pool.closure(params, ret, SmallVec::new())
            }
            NodeKind::TypedIdent { ty, .. } => self.resolve_type_expr(*ty)?,
            _ => return Err(CompileError::internal("node is not a type expression")),
        };
        self.record(node, ty);
        Ok(ty)
    }
}
