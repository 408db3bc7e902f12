//! Object construction and instance variables.

use talon_diagnostic::{CompileError, CompileResult};
use talon_ir::{Name, NodeId};
use talon_types::{Idx, Signature, Target};

use super::function_visitor::FunctionVisitor;
use super::value_id::{LLVMTypeId, ValueId};

impl FunctionVisitor<'_, '_, '_> {
    /// Storage for one `layout`: `malloc` on the heap, or an entry-block
    /// `alloca` for `~` constructions.
    pub(crate) fn allocate(
        &mut self,
        layout: LLVMTypeId,
        on_stack: bool,
        name: &str,
    ) -> CompileResult<ValueId> {
        let builder = &mut self.gen.cx.builder;
        if on_stack {
            return Ok(builder.create_entry_alloca(self.function, name, layout));
        }
        let size = i64::try_from(builder.size_of(layout))
            .map_err(|_| CompileError::internal("object size overflows i64"))?;
        let size = builder.const_i64(size);
        let malloc = self.gen.cx.runtime.malloc;
        self.gen
            .cx
            .builder
            .call(malloc, &[size], name)
            .ok_or_else(|| CompileError::internal("malloc returned no value"))
    }

    /// A class or case construction recorded on `node`.
    pub(crate) fn lower_construction(
        &mut self,
        node: NodeId,
        args: &[NodeId],
        on_stack: bool,
    ) -> CompileResult<ValueId> {
        match self.target(node)? {
            Target::Construct { ty, init } => self.construct_object(ty, init.as_ref(), args, on_stack),
            Target::ConstructCase { case, sig } => self.construct_case(case, &sig, args, on_stack),
            other => Err(CompileError::internal(format!(
                "construction resolved to {other:?}"
            ))),
        }
    }

    /// Allocate a class instance and run `initialize` on it.
    fn construct_object(
        &mut self,
        ty: Idx,
        init: Option<&Signature>,
        args: &[NodeId],
        on_stack: bool,
    ) -> CompileResult<ValueId> {
        let layout = self.gen.layout(ty)?;
        let object = self.allocate(layout, on_stack, "object")?;
        if let Some(init) = init {
            let function = self.gen.function_for(init)?;
            let mut values = vec![object];
            values.extend(self.lower_args(init, args)?);
            self.gen.cx.builder.call(function, &values, "");
        } else if !args.is_empty() {
            return Err(CompileError::internal(
                "arguments passed to a class without 'initialize'",
            ));
        }
        Ok(object)
    }

    /// Allocate a case, store its tag in the envelope, then its fields.
    fn construct_case(
        &mut self,
        case: Idx,
        sig: &Signature,
        args: &[NodeId],
        on_stack: bool,
    ) -> CompileResult<ValueId> {
        let pool = self.gen.pool;
        let case_type = pool.case_type(case).ok_or_else(|| {
            CompileError::internal(format!("'{}' is not a data case", self.gen.show(case)))
        })?;
        let tag = i32::try_from(case_type.tag)
            .map_err(|_| CompileError::internal("case tag overflows i32"))?;
        let values = self.lower_args(sig, args)?;

        let layout = self.gen.layout(case)?;
        let envelope_layout = self.gen.layout(case_type.data)?;
        let object = self.allocate(layout, on_stack, "case")?;
        let builder = &mut self.gen.cx.builder;
        let envelope = builder.struct_gep(layout, object, 0, "envelope");
        let tag_slot = builder.struct_gep(envelope_layout, envelope, 0, "tag.ptr");
        let tag = builder.const_i32(tag);
        builder.store(tag, tag_slot);
        for (index, (value, &(field, _))) in values.into_iter().zip(&case_type.fields).enumerate() {
            let index = u32::try_from(index + 1)
                .map_err(|_| CompileError::internal("case field index overflows u32"))?;
            let slot_name = format!("{}.ptr", self.gen.text(field));
            let builder = &mut self.gen.cx.builder;
            let slot = builder.struct_gep(layout, object, index, &slot_name);
            builder.store(value, slot);
        }
        Ok(object)
    }

    // -----------------------------------------------------------------------
    // Instance variables
    // -----------------------------------------------------------------------

    /// Address and IR type of ivar `name` of the receiver.
    pub(crate) fn ivar_slot(&mut self, name: Name) -> CompileResult<(ValueId, LLVMTypeId)> {
        let unavailable = || {
            CompileError::type_mismatch(format!(
                "instance variable '@{}' is not available here",
                self.gen.text(name)
            ))
        };
        let (Some(owner), Some(receiver)) = (self.owner, self.self_value) else {
            return Err(unavailable());
        };
        let pool = self.gen.pool;
        let reference = pool.reference(owner).ok_or_else(unavailable)?;
        let index = reference
            .ivar_index(name)
            .ok_or_else(|| CompileError::uninitialized(format!("@{}", self.gen.text(name))))?;
        let ivar_ty = reference.ivars[index].1;

        let layout = self.gen.layout(owner)?;
        let value_ty = self.gen.value_type(ivar_ty)?;
        let index = u32::try_from(index)
            .map_err(|_| CompileError::internal("ivar index overflows u32"))?;
        let slot_name = format!("{}.ptr", self.gen.text(name));
        let slot = self
            .gen
            .cx
            .builder
            .struct_gep(layout, receiver, index, &slot_name);
        Ok((slot, value_ty))
    }

    pub(crate) fn lower_ivar(&mut self, name: Name) -> CompileResult<ValueId> {
        let (slot, ty) = self.ivar_slot(name)?;
        let text = self.gen.text(name);
        Ok(self.gen.cx.builder.load(ty, slot, text))
    }
}
