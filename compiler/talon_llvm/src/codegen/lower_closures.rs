//! Lambdas and closure calls.
//!
//! A lambda becomes a private function `_Tc_lambda.N` taking the closure
//! object first. At the creation site the object is allocated on the heap
//! and filled with the function pointer and a copy of every capture.

use talon_diagnostic::{CompileError, CompileResult};
use talon_ir::{Name, NodeId, NodeKind};
use talon_types::{Idx, Signature};

use super::function_visitor::FunctionVisitor;
use super::value_id::ValueId;

impl FunctionVisitor<'_, '_, '_> {
    pub(crate) fn lower_lambda(
        &mut self,
        node: NodeId,
        params: &[NodeId],
        captures: &[Name],
        body: NodeId,
    ) -> CompileResult<ValueId> {
        let closure_ty = self.type_of(node)?;
        let pool = self.gen.pool;
        let closure = pool
            .closure_type(closure_ty)
            .ok_or_else(|| CompileError::internal("lambda is not typed as a closure"))?;
        let layout = self.gen.layout(closure_ty)?;
        let fn_ty = self.gen.closure_fn_type(&closure.params, closure.ret)?;
        let name = self.gen.cx.next_lambda_name();
        let function = self.gen.cx.builder.declare_function(&name, &fn_ty);
        tracing::trace!(lambda = %name, "defining lambda");

        let saved = self.gen.cx.builder.save_position();
        {
            let tree = self.gen.tree;
            let mut inner = FunctionVisitor::open(
                &mut *self.gen,
                function,
                self.instance,
                None,
                name,
                closure.ret,
            )?;
            inner.gen.cx.builder.set_param_name(function, 0, "closure");
            let env = inner.gen.cx.builder.get_param(function, 0);
            for (index, (&param, &ty)) in params.iter().zip(&closure.params).enumerate() {
                let param_name = match tree.kind(param) {
                    NodeKind::Ident(name) | NodeKind::TypedIdent { name, .. } => *name,
                    _ => return Err(CompileError::internal("lambda parameter is not a name")),
                };
                inner.bind_param(field_index(index)?, param_name, ty)?;
            }
            for (index, (&capture, &ty)) in captures.iter().zip(&closure.captures).enumerate() {
                let value_ty = inner.gen.value_type(ty)?;
                let text = inner.gen.text(capture);
                let slot_name = format!("{text}.ptr");
                let field = field_index(index)?;
                let builder = &mut inner.gen.cx.builder;
                let slot = builder.struct_gep(layout, env, field, &slot_name);
                let value = builder.load(value_ty, slot, text);
                inner.bind_local(capture, value, ty)?;
            }
            inner.run(body)?;
        }
        self.gen.cx.builder.restore_position(saved);

        let object = self.allocate(layout, false, "closure")?;
        let fn_value = self.gen.cx.builder.function_value(function);
        let fn_slot = self.gen.cx.builder.struct_gep(layout, object, 0, "fn.ptr");
        self.gen.cx.builder.store(fn_value, fn_slot);
        for (index, &capture) in captures.iter().enumerate() {
            let value = self.load_local(capture)?;
            let field = field_index(index)?;
            let slot_name = format!("{}.ptr", self.gen.text(capture));
            let builder = &mut self.gen.cx.builder;
            let slot = builder.struct_gep(layout, object, field, &slot_name);
            builder.store(value, slot);
        }
        Ok(object)
    }

    /// Call the closure stored in local `name`.
    ///
    /// Closure objects of one signature share their first field, so the
    /// function pointer is read through the capture-less layout.
    pub(crate) fn call_closure(
        &mut self,
        name: Name,
        sig: &Signature,
        args: &[NodeId],
    ) -> CompileResult<Option<ValueId>> {
        let closure = self.load_local(name)?;
        let params: Vec<Idx> = sig.param_types().collect();
        let header = self.gen.closure_layout(&params, sig.ret, &[])?;
        let fn_ty = self.gen.closure_fn_type(&params, sig.ret)?;
        let mut values = vec![closure];
        values.extend(self.lower_args(sig, args)?);

        let builder = &mut self.gen.cx.builder;
        let ptr = builder.ptr_type();
        let fn_slot = builder.struct_gep(header, closure, 0, "fn.ptr");
        let callee = builder.load(ptr, fn_slot, "fn");
        Ok(builder.call_indirect(&fn_ty, callee, &values, "closure.call"))
    }
}

/// Position of the `index`th parameter or capture, after the closure or
/// function pointer in slot 0.
fn field_index(index: usize) -> CompileResult<u32> {
    u32::try_from(index + 1)
        .map_err(|_| CompileError::type_mismatch("a lambda has too many parameters or captures"))
}
