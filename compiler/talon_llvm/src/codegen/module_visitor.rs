//! Module-level generation.
//!
//! Two passes over the top-level statements. The first declares every
//! function and method so bodies can call each other in any order; the
//! second defines the bodies.

use talon_diagnostic::{CompileError, CompileResult};
use talon_ir::{NodeId, NodeKind};
use talon_types::{Idx, InstanceId, Signature};

use super::function_visitor::FunctionVisitor;
use super::{statements, CodeGenerator};
use super::value_id::FunctionId;

impl CodeGenerator<'_, '_> {
    /// Generate every declaration of the module.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn generate(mut self) -> CompileResult<()> {
        let stmts = statements(self.tree, self.tree.root());
        for &stmt in &stmts {
            self.declare_statement(stmt)?;
        }
        for &stmt in &stmts {
            self.define_statement(stmt)?;
        }
        tracing::debug!(
            functions = self.cx.builder.module().get_functions().count(),
            errors = self.cx.codegen_error_count(),
            "module generated"
        );
        Ok(())
    }

    fn declare_statement(&mut self, stmt: NodeId) -> CompileResult<()> {
        match self.tree.kind(stmt) {
            NodeKind::MethodDef { .. } | NodeKind::MethodDec { .. } => {
                let sig = self.typed.table.signature(InstanceId::ROOT, stmt)?.clone();
                self.declare_function(&sig, false)?;
            }
            NodeKind::ClassDef { .. } | NodeKind::DataDef { .. } => {
                for (instance, ty) in self.type_instances(stmt)? {
                    self.declare_type(stmt, instance, ty)?;
                }
            }
            NodeKind::TraitDef { .. } | NodeKind::Import(_) | NodeKind::Package(_) => {}
            _ => return Err(self.executable_at_top_level()),
        }
        Ok(())
    }

    fn define_statement(&mut self, stmt: NodeId) -> CompileResult<()> {
        match self.tree.kind(stmt) {
            NodeKind::MethodDef { .. } => {
                FunctionVisitor::define_method(self, stmt, InstanceId::ROOT, None)?;
            }
            NodeKind::ClassDef { .. } | NodeKind::DataDef { .. } => {
                for (instance, ty) in self.type_instances(stmt)? {
                    self.define_type(stmt, instance, ty)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn executable_at_top_level(&self) -> CompileError {
        CompileError::type_mismatch(
            "only declarations may appear at the top level of a module; move statements into 'main'",
        )
    }

    /// Walks of a type declaration: the declaration itself, or every
    /// expansion of a generic one.
    fn type_instances(&self, decl: NodeId) -> CompileResult<Vec<(InstanceId, Idx)>> {
        if let Some(template) = self.typed.template_for(decl) {
            return Ok(template
                .expansions
                .iter()
                .map(|expansion| (expansion.instance, expansion.ty))
                .collect());
        }
        let ty = self.typed.table.type_of(InstanceId::ROOT, decl)?;
        Ok(vec![(InstanceId::ROOT, ty)])
    }

    /// Declare the function `sig` links to, or return the existing
    /// declaration.
    pub(crate) fn declare_function(
        &mut self,
        sig: &Signature,
        receiver: bool,
    ) -> CompileResult<FunctionId> {
        let fn_ty = self.signature_type(sig, receiver)?;
        let name = self.text(sig.link_name);
        if let Some(existing) = self.cx.builder.get_function(name) {
            if !self.cx.builder.signature_matches(existing, &fn_ty) {
                return Err(CompileError::type_mismatch(format!(
                    "'{name}' is declared twice with different types"
                )));
            }
            return Ok(existing);
        }
        Ok(self.cx.builder.declare_function(name, &fn_ty))
    }

    /// The function declared for `sig` in the declaration pass.
    pub(crate) fn function_for(&self, sig: &Signature) -> CompileResult<FunctionId> {
        let name = self.text(sig.link_name);
        self.cx
            .builder
            .get_function(name)
            .ok_or_else(|| CompileError::internal(format!("function '{name}' was never declared")))
    }
}
