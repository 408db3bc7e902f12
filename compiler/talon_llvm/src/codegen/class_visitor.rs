//! Classes and data types.
//!
//! A type declaration contributes its struct layouts and one function per
//! method, its own and those pulled in through `include`. Generic
//! declarations are visited once per expansion.

use talon_diagnostic::{CompileError, CompileResult};
use talon_ir::{NodeId, NodeKind};
use talon_types::{Idx, InstanceId};

use super::function_visitor::FunctionVisitor;
use super::{statements, CodeGenerator};

impl CodeGenerator<'_, '_> {
    /// Lay out `ty` and declare its methods.
    pub(crate) fn declare_type(
        &mut self,
        decl: NodeId,
        instance: InstanceId,
        ty: Idx,
    ) -> CompileResult<()> {
        self.layout(ty)?;
        let pool = self.pool;
        if let Some(data) = pool.data_type(ty) {
            for &case in &data.cases {
                self.layout(case)?;
            }
        }
        for (walk, method) in self.collect_methods(decl, instance)? {
            let sig = self.typed.table.signature(walk, method)?.clone();
            self.declare_function(&sig, true)?;
        }
        Ok(())
    }

    /// Define the body of every method of `ty` that has one.
    pub(crate) fn define_type(
        &mut self,
        decl: NodeId,
        instance: InstanceId,
        ty: Idx,
    ) -> CompileResult<()> {
        for (walk, method) in self.collect_methods(decl, instance)? {
            if matches!(self.tree.kind(method), NodeKind::MethodDef { .. }) {
                FunctionVisitor::define_method(self, method, walk, Some(ty))?;
            }
        }
        Ok(())
    }

    /// Method nodes of a type declaration, each with the walk its
    /// signature was recorded under.
    fn collect_methods(
        &self,
        decl: NodeId,
        instance: InstanceId,
    ) -> CompileResult<Vec<(InstanceId, NodeId)>> {
        let body = match self.tree.kind(decl) {
            NodeKind::ClassDef { body, .. } => Some(*body),
            NodeKind::DataDef { body, .. } => *body,
            _ => None,
        };
        let mut methods = Vec::new();
        if let Some(body) = body {
            self.collect_body(body, instance, &mut methods)?;
        }
        Ok(methods)
    }

    fn collect_body(
        &self,
        body: NodeId,
        instance: InstanceId,
        methods: &mut Vec<(InstanceId, NodeId)>,
    ) -> CompileResult<()> {
        for stmt in statements(self.tree, body) {
            match self.tree.kind(stmt) {
                NodeKind::MethodDef { .. } | NodeKind::MethodDec { .. } => {
                    methods.push((instance, stmt));
                }
                NodeKind::Include(name) => {
                    let walk = self.typed.table.include(instance, stmt).ok_or_else(|| {
                        CompileError::internal("include was not typed before generation")
                    })?;
                    let trait_body = self.traits.get(name).copied().ok_or_else(|| {
                        CompileError::internal(format!(
                            "trait '{}' is not declared in this module",
                            self.text(*name)
                        ))
                    })?;
                    self.collect_body(trait_body, walk, methods)?;
                }
                _ => {}
            }
        }
        Ok(())
    }
}
