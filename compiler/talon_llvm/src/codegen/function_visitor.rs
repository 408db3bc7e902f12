//! Function body generation.
//!
//! `FunctionVisitor` owns the state of one function under construction
//! (insertion point, scope, exit block) and dispatches each node kind to
//! a focused `lower_*` method implemented in a sibling file.
//!
//! Every function gets a single exit block. `return` statements and the
//! fall-through value branch there, and the exit block merges the values
//! in a `return_value` phi before the one `ret`. A single incoming value
//! is returned as is.

use talon_diagnostic::{CompileError, CompileResult};
use talon_ir::{Name, NodeId, NodeKind};
use talon_stack::ensure_sufficient_stack;
use talon_types::{Idx, InstanceId, Target};

use super::scope::{Scope, ScopeBinding};
use super::CodeGenerator;
use super::value_id::{BlockId, FunctionId, ValueId};

pub(crate) struct FunctionVisitor<'g, 'a, 'ctx> {
    pub(crate) gen: &'g mut CodeGenerator<'a, 'ctx>,
    pub(crate) function: FunctionId,
    /// Walk whose type table entries describe this body.
    pub(crate) instance: InstanceId,
    /// Type whose method is being generated.
    pub(crate) owner: Option<Idx>,
    /// The receiver; absent in free functions and lambdas.
    pub(crate) self_value: Option<ValueId>,
    pub(crate) scope: Scope,
    /// Name used in messages.
    name: String,
    ret: Idx,
    exit: BlockId,
    /// `(value, block)` for every edge into the exit block.
    return_sites: Vec<(ValueId, BlockId)>,
}

impl<'g, 'a, 'ctx> FunctionVisitor<'g, 'a, 'ctx> {
    /// Open `function` for a body and position at its entry block.
    pub(crate) fn open(
        gen: &'g mut CodeGenerator<'a, 'ctx>,
        function: FunctionId,
        instance: InstanceId,
        owner: Option<Idx>,
        name: String,
        ret: Idx,
    ) -> CompileResult<Self> {
        if gen.cx.builder.has_body(function) {
            return Err(CompileError::type_mismatch(format!(
                "'{name}' is defined more than once"
            )));
        }
        let ret = gen.resolve(ret)?;
        let entry = gen.cx.builder.append_block(function, "entry");
        let exit = gen.cx.builder.append_block(function, "exit");
        gen.cx.builder.set_current_function(function);
        gen.cx.builder.position_at_end(entry);
        Ok(FunctionVisitor {
            gen,
            function,
            instance,
            owner,
            self_value: None,
            scope: Scope::new(),
            name,
            ret,
            exit,
            return_sites: Vec::new(),
        })
    }

    /// Generate the body of the `MethodDef` node `node`.
    ///
    /// `owner` is the class or data type for methods; the function then
    /// takes the receiver as its first parameter.
    pub(crate) fn define_method(
        gen: &'g mut CodeGenerator<'a, 'ctx>,
        node: NodeId,
        instance: InstanceId,
        owner: Option<Idx>,
    ) -> CompileResult<()> {
        let NodeKind::MethodDef { body, .. } = gen.tree.kind(node) else {
            return Err(CompileError::internal("method body requested for a non-method"));
        };
        let body = *body;
        let sig = gen.typed.table.signature(instance, node)?.clone();
        let function = gen.function_for(&sig)?;
        let name = gen.text(sig.name).to_owned();
        tracing::trace!(function = %gen.text(sig.link_name), "defining function");

        let mut visitor = FunctionVisitor::open(gen, function, instance, owner, name, sig.ret)?;
        let mut index = 0u32;
        if owner.is_some() {
            visitor.gen.cx.builder.set_param_name(function, 0, "self");
            visitor.self_value = Some(visitor.gen.cx.builder.get_param(function, 0));
            index = 1;
        }
        for param in &sig.params {
            if let Some(param_name) = param.name {
                visitor.bind_param(index, param_name, param.ty)?;
            }
            index += 1;
        }
        visitor.run(body)
    }

    /// Copy parameter `index` into a stack slot bound to `name`.
    pub(crate) fn bind_param(&mut self, index: u32, name: Name, ty: Idx) -> CompileResult<()> {
        let text = self.gen.text(name);
        self.gen.cx.builder.set_param_name(self.function, index, text);
        let value = self.gen.cx.builder.get_param(self.function, index);
        self.bind_local(name, value, ty)
    }

    /// A fresh mutable local `name` holding `value`.
    pub(crate) fn bind_local(&mut self, name: Name, value: ValueId, ty: Idx) -> CompileResult<()> {
        let llvm_ty = self.gen.value_type(ty)?;
        let text = self.gen.text(name);
        let slot = self
            .gen
            .cx
            .builder
            .create_entry_alloca(self.function, &format!("{text}.addr"), llvm_ty);
        self.gen.cx.builder.store(value, slot);
        self.scope.bind_mutable(name, slot, llvm_ty);
        Ok(())
    }

    /// Generate `body`, then the exit block.
    pub(crate) fn run(mut self, body: NodeId) -> CompileResult<()> {
        let value = self.lower(body)?;
        if !self.gen.cx.builder.current_block_terminated() {
            self.fall_through(value, body)?;
        }

        let builder = &mut self.gen.cx.builder;
        builder.move_block_to_end(self.exit);
        builder.position_at_end(self.exit);
        if self.ret == Idx::VOID {
            builder.ret_void();
        } else {
            let ret_ty = self.gen.value_type(self.ret)?;
            let builder = &mut self.gen.cx.builder;
            match builder.phi_from_incoming(ret_ty, &self.return_sites, "return_value") {
                Some(value) => builder.ret(value),
                None => builder.unreachable(),
            }
        }
        Ok(())
    }

    /// The body ran off its end: its last value is the result.
    fn fall_through(&mut self, value: Option<ValueId>, body: NodeId) -> CompileResult<()> {
        if self.ret == Idx::VOID {
            self.gen.cx.builder.br(self.exit);
            return Ok(());
        }
        let Some(value) = value else {
            return Err(CompileError::type_mismatch(format!(
                "'{}' can reach its end without returning a '{}'",
                self.name,
                self.gen.show(self.ret)
            )));
        };
        let body_ty = self.type_of(body)?;
        self.add_return_site(value, body_ty)
    }

    /// Branch to the exit block, passing `value` of type `ty`.
    pub(crate) fn add_return_site(&mut self, value: ValueId, ty: Idx) -> CompileResult<()> {
        let value = self.convert(value, ty, self.ret)?;
        if let Some(block) = self.gen.cx.builder.current_block() {
            self.return_sites.push((value, block));
        }
        self.gen.cx.builder.br(self.exit);
        Ok(())
    }

    /// Branch to the exit block of a void function.
    pub(crate) fn return_void(&mut self) {
        self.gen.cx.builder.br(self.exit);
    }

    pub(crate) fn returns_void(&self) -> bool {
        self.ret == Idx::VOID
    }

    // -----------------------------------------------------------------------
    // Table access
    // -----------------------------------------------------------------------

    /// The concrete type recorded for `node` in this walk.
    pub(crate) fn type_of(&self, node: NodeId) -> CompileResult<Idx> {
        let ty = self.gen.typed.table.type_of(self.instance, node)?;
        self.gen.resolve(ty)
    }

    pub(crate) fn target(&self, node: NodeId) -> CompileResult<Target> {
        self.gen.typed.table.target(self.instance, node).cloned()
    }

    pub(crate) fn block(&mut self, name: &str) -> BlockId {
        self.gen.cx.builder.append_block(self.function, name)
    }

    pub(crate) fn terminated(&self) -> bool {
        self.gen.cx.builder.current_block_terminated()
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Generate `node`; `None` for statements without a value.
    pub(crate) fn lower(&mut self, node: NodeId) -> CompileResult<Option<ValueId>> {
        ensure_sufficient_stack(|| self.lower_kind(node))
    }

    /// Generate `node`, which must produce a value.
    pub(crate) fn lower_value(&mut self, node: NodeId) -> CompileResult<ValueId> {
        self.lower(node)?.ok_or_else(|| {
            CompileError::internal(format!("node {} produced no value", node.raw()))
        })
    }

    fn lower_kind(&mut self, node: NodeId) -> CompileResult<Option<ValueId>> {
        let tree = self.gen.tree;
        match tree.kind(node) {
            NodeKind::Seq(stmts) => self.lower_seq(stmts),
            NodeKind::Number(n) => {
                let n = i32::try_from(*n).map_err(|_| {
                    CompileError::type_mismatch(format!(
                        "integer literal {n} does not fit in an 'Integer'"
                    ))
                })?;
                Ok(Some(self.gen.cx.builder.const_i32(n)))
            }
            NodeKind::Bool(b) => Ok(Some(self.gen.cx.builder.const_bool(*b))),
            NodeKind::Str(text) => {
                let text = self.gen.text(*text);
                self.gen.string_literal(text).map(Some)
            }
            NodeKind::Ident(name) => self.lower_ident(node, *name).map(Some),
            NodeKind::IVar(name) => self.lower_ivar(*name).map(Some),
            NodeKind::SelfRef => self.receiver().map(Some),
            NodeKind::TypedIdent { .. }
            | NodeKind::VarArgs
            | NodeKind::NamedType(_)
            | NodeKind::PointerType(_)
            | NodeKind::TemplatedType { .. }
            | NodeKind::ClosureType { .. } => Ok(None),

            NodeKind::MethodDef { .. }
            | NodeKind::MethodDec { .. }
            | NodeKind::ClassDef { .. }
            | NodeKind::DataDef { .. }
            | NodeKind::CaseDef { .. }
            | NodeKind::IVarDecl { .. }
            | NodeKind::TraitDef { .. }
            | NodeKind::Include(_)
            | NodeKind::Import(_)
            | NodeKind::Package(_) => Err(CompileError::type_mismatch(
                "declarations are only allowed at the top level or in a type body",
            )),

            NodeKind::Var { name, value, .. } => self.lower_var(node, *name, *value).map(Some),
            NodeKind::Assign { target, value } => self.lower_assign(*target, *value).map(Some),
            NodeKind::Call {
                receiver,
                method,
                args,
            } => self.lower_call(node, *receiver, *method, args),
            NodeKind::NamedArg { value, .. } => self.lower(*value),
            NodeKind::TemplatedInstance { args, .. } => {
                self.lower_construction(node, args, false).map(Some)
            }
            NodeKind::Binary { op, lhs, rhs } => self.lower_binary(node, *op, *lhs, *rhs).map(Some),
            NodeKind::Unary { op, operand } => self.lower_unary(*op, *operand).map(Some),
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.lower_if(*cond, *then_branch, *else_branch)?;
                Ok(None)
            }
            NodeKind::While { cond, body } => {
                self.lower_while(*cond, *body)?;
                Ok(None)
            }
            NodeKind::Case { cond, whens } => {
                self.lower_case(*cond, whens)?;
                Ok(None)
            }
            NodeKind::When { .. } | NodeKind::Pattern { .. } => Err(CompileError::internal(
                "case arm visited outside of its case",
            )),
            NodeKind::Return(value) => {
                self.lower_return(*value)?;
                Ok(None)
            }
            NodeKind::Lambda {
                params,
                captures,
                body,
            } => self.lower_lambda(node, params, captures, *body).map(Some),
        }
    }

    // -----------------------------------------------------------------------
    // Locals
    // -----------------------------------------------------------------------

    fn lower_ident(&mut self, node: NodeId, name: Name) -> CompileResult<ValueId> {
        match self.target(node)? {
            Target::Local => self.load_local(name),
            Target::Singleton(case) => self.gen.singleton(case),
            other => Err(CompileError::internal(format!(
                "identifier resolved to {other:?}"
            ))),
        }
    }

    pub(crate) fn load_local(&mut self, name: Name) -> CompileResult<ValueId> {
        match self.scope.lookup(name) {
            Some(ScopeBinding::Immutable(value)) => Ok(value),
            Some(ScopeBinding::Mutable { ptr, ty }) => {
                let text = self.gen.text(name);
                Ok(self.gen.cx.builder.load(ty, ptr, text))
            }
            None => Err(CompileError::internal(format!(
                "'{}' has no storage in this function",
                self.gen.text(name)
            ))),
        }
    }

    fn lower_var(&mut self, node: NodeId, name: Name, value: NodeId) -> CompileResult<ValueId> {
        let value_ty = self.type_of(value)?;
        let var_ty = self.type_of(node)?;
        let v = self.lower_value(value)?;
        let v = self.convert(v, value_ty, var_ty)?;
        self.bind_local(name, v, var_ty)?;
        Ok(v)
    }

    fn lower_assign(&mut self, target: NodeId, value: NodeId) -> CompileResult<ValueId> {
        let tree = self.gen.tree;
        let value_ty = self.type_of(value)?;
        let target_ty = self.type_of(target)?;
        let v = self.lower_value(value)?;
        let converted = self.convert(v, value_ty, target_ty)?;
        match tree.kind(target) {
            NodeKind::IVar(name) => {
                let (slot, _) = self.ivar_slot(*name)?;
                self.gen.cx.builder.store(converted, slot);
            }
            NodeKind::Ident(name) => match self.scope.lookup(*name) {
                Some(ScopeBinding::Mutable { ptr, .. }) => {
                    self.gen.cx.builder.store(converted, ptr);
                }
                Some(ScopeBinding::Immutable(_)) => {
                    return Err(CompileError::type_mismatch(format!(
                        "cannot assign to '{}'; it is bound by a 'when' pattern",
                        self.gen.text(*name)
                    )))
                }
                None => {
                    return Err(CompileError::internal(format!(
                        "'{}' has no storage in this function",
                        self.gen.text(*name)
                    )))
                }
            },
            _ => return Err(CompileError::internal("assignment to a non-variable")),
        }
        Ok(v)
    }

    /// `self`, if this function has a receiver.
    pub(crate) fn receiver(&self) -> CompileResult<ValueId> {
        self.self_value.ok_or_else(|| {
            CompileError::type_mismatch("'self' is not available inside a lambda")
        })
    }
}
