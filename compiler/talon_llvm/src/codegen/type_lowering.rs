//! From pool types to IR types.
//!
//! Primitives are passed in registers (`i32`, `i1`, `i8`). Everything else
//! is a `ptr` to a named struct whose layout is built here on first use:
//!
//! | Type | Layout |
//! |------|--------|
//! | `String` | `%String = {i32, ptr}` |
//! | `Type` | `%Type = {ptr}` (its name as a `String`) |
//! | `Dynamic` | `%Dynamic = {ptr}` (the `Type` of the payload) |
//! | class | one field per ivar, in declaration order |
//! | data | `{i32}`, the tag |
//! | case | `{data envelope, fields...}` |
//! | closure | `{fn ptr, captures...}` |
//!
//! Each pool type gets its own struct. Types that print alike (a class
//! and an imported class of the same name, two expansions of a generic)
//! still get distinct structs, which LLVM tells apart by a numeric suffix.

use talon_diagnostic::{CompileError, CompileResult};
use talon_types::{Idx, Signature, TypeData};

use super::CodeGenerator;
use super::context::ClosureKey;
use super::ir_builder::FunctionSig;
use super::value_id::{LLVMTypeId, ValueId};

impl CodeGenerator<'_, '_> {
    /// `ty` with all variables followed; open variables are an error.
    pub(crate) fn resolve(&self, ty: Idx) -> CompileResult<Idx> {
        self.pool.resolve_strict(ty, self.interner)
    }

    pub(crate) fn show(&self, ty: Idx) -> String {
        self.pool.display(ty, self.interner)
    }

    /// LLVM type of a value of `ty`. `Void` has no values.
    pub(crate) fn value_type(&mut self, ty: Idx) -> CompileResult<LLVMTypeId> {
        let ty = self.resolve(ty)?;
        let builder = &mut self.cx.builder;
        Ok(match self.pool.data(ty) {
            TypeData::Integer => builder.i32_type(),
            TypeData::Boolean => builder.bool_type(),
            TypeData::Char => builder.i8_type(),
            TypeData::Str
            | TypeData::TypeRecord
            | TypeData::Dynamic
            | TypeData::Pointer(_)
            | TypeData::Reference(_)
            | TypeData::Data(_)
            | TypeData::Case(_)
            | TypeData::Closure(_) => builder.ptr_type(),
            TypeData::Void => {
                return Err(CompileError::internal("'Void' has no value representation"))
            }
            TypeData::Var(_) | TypeData::Derived(_) => {
                return Err(CompileError::internal(
                    "unresolved type reached code generation",
                ))
            }
        })
    }

    /// Return type of a function returning `ty`; `None` for `Void`.
    pub(crate) fn return_type(&mut self, ty: Idx) -> CompileResult<Option<LLVMTypeId>> {
        if self.resolve(ty)? == Idx::VOID {
            return Ok(None);
        }
        self.value_type(ty).map(Some)
    }

    /// Struct a by-pointer value of `ty` points at.
    pub(crate) fn layout(&mut self, ty: Idx) -> CompileResult<LLVMTypeId> {
        let ty = self.resolve(ty)?;
        if let Some(&layout) = self.cx.layouts.get(&ty) {
            return Ok(layout);
        }
        let pool = self.pool;
        let layout = match pool.data(ty) {
            TypeData::Str => {
                let fields = [self.cx.builder.i32_type(), self.cx.builder.ptr_type()];
                self.define_struct("String", &fields)
            }
            TypeData::TypeRecord | TypeData::Dynamic => {
                let name = if matches!(pool.data(ty), TypeData::Dynamic) {
                    "Dynamic"
                } else {
                    "Type"
                };
                let fields = [self.cx.builder.ptr_type()];
                self.define_struct(name, &fields)
            }
            TypeData::Reference(reference) => {
                // Register before lowering fields so self-referencing
                // classes find their own struct.
                let name = self.text(reference.name);
                let st = self.cx.builder.named_struct(name);
                self.cx.layouts.insert(ty, st);
                let mut fields = Vec::with_capacity(reference.ivars.len());
                for &(_, ivar) in &reference.ivars {
                    fields.push(self.value_type(ivar)?);
                }
                self.cx.builder.set_struct_body(st, &fields);
                st
            }
            TypeData::Data(data) => {
                let name = self.text(data.name);
                let fields = [self.cx.builder.i32_type()];
                self.define_struct(name, &fields)
            }
            TypeData::Case(case) => {
                let mut fields = vec![self.layout(case.data)?];
                for &(_, field) in &case.fields {
                    fields.push(self.value_type(field)?);
                }
                let name = self.text(case.name);
                self.define_struct(name, &fields)
            }
            TypeData::Closure(closure) => {
                self.closure_layout(&closure.params, closure.ret, &closure.captures)?
            }
            TypeData::Integer
            | TypeData::Boolean
            | TypeData::Char
            | TypeData::Void
            | TypeData::Pointer(_)
            | TypeData::Var(_)
            | TypeData::Derived(_) => {
                return Err(CompileError::internal(format!(
                    "'{}' has no struct layout",
                    self.show(ty)
                )))
            }
        };
        self.cx.layouts.insert(ty, layout);
        Ok(layout)
    }

    /// A new named struct holding `fields`.
    fn define_struct(&mut self, name: &str, fields: &[LLVMTypeId]) -> LLVMTypeId {
        let st = self.cx.builder.named_struct(name);
        self.cx.builder.set_struct_body(st, fields);
        st
    }

    // -----------------------------------------------------------------------
    // Closures
    // -----------------------------------------------------------------------

    /// `lambda<(A, B => R)>`, or `lambda<(A => R), C...>` with captures.
    fn closure_layout_name(&self, key: &ClosureKey) -> String {
        let shown = |types: &[Idx]| -> Vec<String> {
            types.iter().map(|&t| self.show(t)).collect()
        };
        let signature = format!(
            "({} => {})",
            shown(&key.params).join(", "),
            self.show(key.ret)
        );
        if key.captures.is_empty() {
            format!("lambda<{signature}>")
        } else {
            format!("lambda<{signature}, {}>", shown(&key.captures).join(", "))
        }
    }

    /// `{fn ptr, captures...}`. Every closure with the same parameters
    /// shares field 0, so calls go through the capture-less layout.
    pub(crate) fn closure_layout(
        &mut self,
        params: &[Idx],
        ret: Idx,
        captures: &[Idx],
    ) -> CompileResult<LLVMTypeId> {
        let resolved = |types: &[Idx]| -> CompileResult<Vec<Idx>> {
            types.iter().map(|&t| self.resolve(t)).collect()
        };
        let key = ClosureKey {
            params: resolved(params)?,
            ret: self.resolve(ret)?,
            captures: resolved(captures)?,
        };
        if let Some(&layout) = self.cx.closure_layouts.get(&key) {
            return Ok(layout);
        }
        let mut fields = vec![self.cx.builder.ptr_type()];
        for &capture in &key.captures {
            fields.push(self.value_type(capture)?);
        }
        let name = self.closure_layout_name(&key);
        let layout = self.define_struct(&name, &fields);
        self.cx.closure_layouts.insert(key, layout);
        Ok(layout)
    }

    /// Signature of a closure body: the closure itself, then the declared
    /// parameters.
    pub(crate) fn closure_fn_type(
        &mut self,
        params: &[Idx],
        ret: Idx,
    ) -> CompileResult<FunctionSig> {
        let mut types = vec![self.cx.builder.ptr_type()];
        for &param in params {
            types.push(self.value_type(param)?);
        }
        Ok(FunctionSig {
            params: types,
            ret: self.return_type(ret)?,
            varargs: false,
        })
    }

    // -----------------------------------------------------------------------
    // Functions
    // -----------------------------------------------------------------------

    /// LLVM signature of `sig`; methods take the receiver first.
    pub(crate) fn signature_type(
        &mut self,
        sig: &Signature,
        receiver: bool,
    ) -> CompileResult<FunctionSig> {
        let mut params = Vec::with_capacity(sig.arity() + usize::from(receiver));
        if receiver {
            params.push(self.cx.builder.ptr_type());
        }
        for ty in sig.param_types() {
            params.push(self.value_type(ty)?);
        }
        Ok(FunctionSig {
            params,
            ret: self.return_type(sig.ret)?,
            varargs: sig.varargs,
        })
    }

    // -----------------------------------------------------------------------
    // Dynamic boxes and runtime records
    // -----------------------------------------------------------------------

    /// `talon.Dynamic[T] = {%Dynamic, T}`.
    pub(crate) fn dynamic_layout(&mut self, payload: Idx) -> CompileResult<LLVMTypeId> {
        let payload = self.resolve(payload)?;
        if let Some(&layout) = self.cx.dynamic_layouts.get(&payload) {
            return Ok(layout);
        }
        let header = self.layout(Idx::DYNAMIC)?;
        let value = self.value_type(payload)?;
        let name = format!("talon.Dynamic[{}]", self.show(payload));
        let layout = self.define_struct(&name, &[header, value]);
        self.cx.dynamic_layouts.insert(payload, layout);
        Ok(layout)
    }

    /// Address of the `Type` record describing `ty`, one per type.
    pub(crate) fn runtime_type(&mut self, ty: Idx) -> CompileResult<ValueId> {
        let ty = self.resolve(ty)?;
        if let Some(&record) = self.cx.runtime_types.get(&ty) {
            return Ok(record);
        }
        let name = self.show(ty);
        let name_record = self.string_literal(&name)?;
        let layout = self.layout(Idx::TYPE)?;
        let builder = &mut self.cx.builder;
        let init = builder.const_struct(layout, &[name_record]);
        let record = builder.add_constant(&format!("talon.Type.{name}"), layout, init);
        self.cx.runtime_types.insert(ty, record);
        Ok(record)
    }

    /// Address of a constant `String` record holding `text`.
    pub(crate) fn string_literal(&mut self, text: &str) -> CompileResult<ValueId> {
        if let Some(&record) = self.cx.strings.get(text) {
            return Ok(record);
        }
        let length = i32::try_from(text.len()).map_err(|_| {
            CompileError::type_mismatch("string literal is too long")
        })?;
        let layout = self.layout(Idx::STRING)?;
        let builder = &mut self.cx.builder;
        let bytes = builder.const_string(text);
        let array = builder.type_of(bytes);
        let chars = builder.add_constant(".str", array, bytes);
        let length = builder.const_i32(length);
        let init = builder.const_struct(layout, &[length, chars]);
        let record = builder.add_constant(".string", layout, init);
        self.cx.strings.insert(text.to_owned(), record);
        Ok(record)
    }

    /// The shared constant of a field-less case.
    pub(crate) fn singleton(&mut self, case: Idx) -> CompileResult<ValueId> {
        let case = self.resolve(case)?;
        if let Some(&value) = self.cx.singletons.get(&case) {
            return Ok(value);
        }
        let Some(case_type) = self.pool.case_type(case) else {
            return Err(CompileError::internal(format!(
                "'{}' is not a data case",
                self.show(case)
            )));
        };
        let tag = i32::try_from(case_type.tag)
            .map_err(|_| CompileError::internal("case tag overflows i32"))?;
        let layout = self.layout(case)?;
        let envelope = self.layout(case_type.data)?;
        let name = format!("{}.singleton", self.text(case_type.name));
        let builder = &mut self.cx.builder;
        let tag = builder.const_i32(tag);
        let envelope_init = builder.const_struct(envelope, &[tag]);
        let init = builder.const_struct(layout, &[envelope_init]);
        let value = builder.add_constant(&name, layout, init);
        self.cx.singletons.insert(case, value);
        Ok(value)
    }
}
