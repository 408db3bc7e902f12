//! Calls and argument passing.
//!
//! The target of every call was resolved by the type calculator; lowering
//! only dispatches on the recorded [`Target`].

use talon_diagnostic::{CompileError, CompileResult};
use talon_ir::{Name, NodeId, NodeKind};
use talon_types::{order_arguments, Builtin, Idx, Signature, Target};

use super::function_visitor::FunctionVisitor;
use super::value_id::ValueId;

impl FunctionVisitor<'_, '_, '_> {
    pub(crate) fn lower_call(
        &mut self,
        node: NodeId,
        receiver: Option<NodeId>,
        method: Name,
        args: &[NodeId],
    ) -> CompileResult<Option<ValueId>> {
        let explicit_receiver = || {
            receiver.ok_or_else(|| CompileError::internal("method call without a receiver"))
        };
        match self.target(node)? {
            // Module-qualified calls need no receiver value.
            Target::Function(sig) => self.call_function(&sig, None, args),
            Target::Method(sig) => {
                let receiver = self.lower_value(explicit_receiver()?)?;
                self.call_function(&sig, Some(receiver), args)
            }
            Target::SelfMethod(sig) => {
                let receiver = self.receiver()?;
                self.call_function(&sig, Some(receiver), args)
            }
            Target::Element { index } => {
                let receiver = explicit_receiver()?;
                self.lower_element(node, receiver, method, index).map(Some)
            }
            Target::Closure(sig) => self.call_closure(method, &sig, args),
            Target::Construct { .. } | Target::ConstructCase { .. } => {
                self.lower_construction(node, args, false).map(Some)
            }
            Target::Builtin(Builtin::Reclaim) => {
                let [object] = args else {
                    return Err(CompileError::internal("'reclaim' takes one argument"));
                };
                let object = self.lower_value(*object)?;
                let free = self.gen.cx.runtime.free;
                self.gen.cx.builder.call(free, &[object], "");
                Ok(None)
            }
            other @ (Target::Local | Target::Singleton(_)) => Err(CompileError::internal(
                format!("call resolved to {other:?}"),
            )),
        }
    }

    /// Direct call of `sig`, with `receiver` first for methods.
    fn call_function(
        &mut self,
        sig: &Signature,
        receiver: Option<ValueId>,
        args: &[NodeId],
    ) -> CompileResult<Option<ValueId>> {
        let function = self.gen.function_for(sig)?;
        let mut values: Vec<ValueId> = receiver.into_iter().collect();
        values.extend(self.lower_args(sig, args)?);
        let name = self.gen.text(sig.name);
        Ok(self.gen.cx.builder.call(function, &values, name))
    }

    /// Read field `index` of a built-in record.
    fn lower_element(
        &mut self,
        node: NodeId,
        receiver: NodeId,
        method: Name,
        index: u32,
    ) -> CompileResult<ValueId> {
        let receiver_ty = self.type_of(receiver)?;
        let result_ty = self.type_of(node)?;
        let object = self.lower_value(receiver)?;
        let layout = self.gen.layout(receiver_ty)?;
        let value_ty = self.gen.value_type(result_ty)?;
        let text = self.gen.text(method);
        let builder = &mut self.gen.cx.builder;
        let slot = builder.struct_gep(layout, object, index, &format!("{text}.ptr"));
        Ok(builder.load(value_ty, slot, text))
    }

    /// Arguments of a call to `sig`, in declared parameter order and
    /// converted to the parameter types.
    ///
    /// Arguments are evaluated in the order they are written, whatever
    /// order their names put them in. Extra arguments to a variadic
    /// target are passed as they are, with Booleans widened to Integer.
    pub(crate) fn lower_args(
        &mut self,
        sig: &Signature,
        args: &[NodeId],
    ) -> CompileResult<Vec<ValueId>> {
        let tree = self.gen.tree;
        let labeled: Vec<(Option<Name>, usize)> = args
            .iter()
            .enumerate()
            .map(|(position, &arg)| match tree.kind(arg) {
                NodeKind::NamedArg { name, .. } => (Some(*name), position),
                _ => (None, position),
            })
            .collect();
        let ordered = order_arguments(sig, &labeled, self.gen.interner)?;

        let mut lowered = Vec::with_capacity(args.len());
        for &arg in args {
            let value = self.lower_value(arg)?;
            lowered.push((value, self.type_of(arg)?));
        }

        let mut values = Vec::with_capacity(args.len());
        for (&position, param) in ordered.fixed.iter().zip(&sig.params) {
            let (value, ty) = lowered[position];
            values.push(self.convert(value, ty, param.ty)?);
        }
        for &position in &ordered.extra {
            let (value, ty) = lowered[position];
            let value = if ty == Idx::BOOLEAN {
                self.convert(value, ty, Idx::INTEGER)?
            } else {
                value
            };
            values.push(value);
        }
        Ok(values)
    }
}
