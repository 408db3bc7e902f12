//! Calls and constructions.
//!
//! Every call records a [`Target`] on its node so the code generator never
//! repeats the lookup.

use talon_diagnostic::{CompileError, CompileResult};
use talon_ir::{Name, NodeId, NodeKind};

use super::TypeCalculator;
use crate::{
    order_arguments, Binding, Builtin, Idx, Operation, Param, Signature, Target, TypeData,
    VarState,
};

impl TypeCalculator<'_> {
    pub(super) fn infer_call(
        &mut self,
        node: NodeId,
        receiver: Option<NodeId>,
        method: Name,
        args: &[NodeId],
    ) -> CompileResult<Idx> {
        match receiver {
            Some(receiver) => self.infer_receiver_call(node, receiver, method, args),
            None => self.infer_bare_call(node, method, args),
        }
    }

    fn infer_receiver_call(
        &mut self,
        node: NodeId,
        receiver: NodeId,
        method: Name,
        args: &[NodeId],
    ) -> CompileResult<Idx> {
        let tree = self.tree;
        if let NodeKind::Ident(module_name) = tree.kind(receiver) {
            if let Some(Binding::Module(module)) = self.scopes.lookup(*module_name) {
                self.record(receiver, Idx::VOID);
                let namespace = self.resolver.namespace(module).ok_or_else(|| {
                    CompileError::internal("imported module has no namespace")
                })?;
                if let Some(sig) = namespace.function(method).cloned() {
                    self.check_arguments(&sig, args)?;
                    self.table
                        .set_target(self.instance, node, Target::Function(sig.clone()));
                    return Ok(sig.ret);
                }
                if let Some(ty) = namespace.lookup_type(method) {
                    return self.infer_construction(node, ty, args);
                }
                return Err(CompileError::type_mismatch(format!(
                    "module '{}' has no function '{}'",
                    self.text(*module_name),
                    self.text(method)
                )));
            }
        }

        let receiver_ty = self.infer(receiver)?;
        let receiver_ty = self.pool.resolve_strict(receiver_ty, self.interner)?;
        let sig = self
            .pool
            .find_signature(receiver_ty, method, self.interner)
            .ok_or_else(|| {
                CompileError::type_mismatch(format!(
                    "'{}' has no method '{}'",
                    self.show(receiver_ty),
                    self.text(method)
                ))
            })?;
        self.check_arguments(&sig, args)?;
        let target = match self.pool.find_operation(receiver_ty, method, self.interner)? {
            Operation::Element { index, .. } => Target::Element { index },
            _ => Target::Method(sig.clone()),
        };
        self.table.set_target(self.instance, node, target);
        Ok(sig.ret)
    }

    fn infer_bare_call(
        &mut self,
        node: NodeId,
        method: Name,
        args: &[NodeId],
    ) -> CompileResult<Idx> {
        let binding = self.scopes.lookup(method);

        if let Some(Binding::Value(ty)) = binding {
            let closure = self.pool.closure_type(ty).cloned().ok_or_else(|| {
                CompileError::type_mismatch(format!(
                    "'{}' is a '{}', not a function",
                    self.text(method),
                    self.show(ty)
                ))
            })?;
            let sig = Signature {
                name: method,
                link_name: method,
                params: closure.params.iter().map(|&p| Param::anonymous(p)).collect(),
                ret: closure.ret,
                varargs: false,
            };
            self.check_arguments(&sig, args)?;
            self.table
                .set_target(self.instance, node, Target::Closure(sig.clone()));
            return Ok(sig.ret);
        }

        if let Some(owner) = self.scopes.current_type() {
            if let Some(sig) = self.pool.find_signature(owner, method, self.interner) {
                self.check_arguments(&sig, args)?;
                let ret = sig.ret;
                self.table
                    .set_target(self.instance, node, Target::SelfMethod(sig));
                return Ok(ret);
            }
        }

        if let Some(sig) = self.namespace.function(method).cloned() {
            self.check_arguments(&sig, args)?;
            let ret = sig.ret;
            self.table
                .set_target(self.instance, node, Target::Function(sig));
            return Ok(ret);
        }

        if binding.is_none() {
            if let Some(builtin) = self.scopes.global().builtin(method) {
                return self.infer_builtin(node, builtin, args);
            }
        }

        match binding {
            Some(Binding::Type(ty)) => self.infer_construction(node, ty, args),
            Some(Binding::GenericCase { .. }) => Err(CompileError::type_mismatch(format!(
                "case '{}' of a generic type needs a type argument",
                self.text(method)
            ))),
            Some(Binding::Module(_)) => Err(CompileError::type_mismatch(format!(
                "module '{}' called like a function",
                self.text(method)
            ))),
            Some(Binding::Value(_)) | None => Err(CompileError::type_mismatch(format!(
                "unknown function '{}'",
                self.text(method)
            ))),
        }
    }

    fn infer_builtin(
        &mut self,
        node: NodeId,
        builtin: Builtin,
        args: &[NodeId],
    ) -> CompileResult<Idx> {
        match builtin {
            Builtin::Reclaim => {
                let [object] = args else {
                    return Err(CompileError::missing_arguments("reclaim", 1, args.len()));
                };
                let ty = self.infer(*object)?;
                if !self.pool.is_by_pointer(ty) {
                    return Err(CompileError::type_mismatch(format!(
                        "cannot reclaim a '{}'",
                        self.show(ty)
                    )));
                }
            }
        }
        self.table
            .set_target(self.instance, node, Target::Builtin(builtin));
        Ok(Idx::VOID)
    }

    /// `Type(args...)`: a class instance or a data case.
    fn infer_construction(
        &mut self,
        node: NodeId,
        ty: Idx,
        args: &[NodeId],
    ) -> CompileResult<Idx> {
        match self.pool.data(ty) {
            TypeData::Reference(r) => {
                let init = r.methods.get(&self.well_known.initialize).cloned();
                let name = r.name;
                match &init {
                    Some(init) => self.check_arguments(init, args)?,
                    None if !args.is_empty() => {
                        for &arg in args {
                            self.infer(arg)?;
                        }
                        return Err(CompileError::missing_arguments(
                            self.text(name),
                            0,
                            args.len(),
                        ));
                    }
                    None => {}
                }
                self.table
                    .set_target(self.instance, node, Target::Construct { ty, init });
                Ok(ty)
            }
            TypeData::Case(case) => {
                let data = case.data;
                let sig = Signature {
                    name: case.short_name,
                    link_name: case.name,
                    params: case
                        .fields
                        .iter()
                        .map(|&(name, ty)| Param::named(name, ty))
                        .collect(),
                    ret: data,
                    varargs: false,
                };
                self.check_arguments(&sig, args)?;
                self.table
                    .set_target(self.instance, node, Target::ConstructCase { case: ty, sig });
                Ok(data)
            }
            _ => Err(CompileError::type_mismatch(format!(
                "'{}' cannot be constructed",
                self.show(ty)
            ))),
        }
    }

    /// `Box<Integer>(...)` or `Some<Integer>(...)`.
    pub(super) fn infer_templated_instance(
        &mut self,
        node: NodeId,
        name: Name,
        type_args: &[NodeId],
        args: &[NodeId],
    ) -> CompileResult<Idx> {
        let type_args = type_args
            .iter()
            .map(|&arg| self.resolve_type_expr(arg))
            .collect::<CompileResult<Vec<_>>>()?;
        if let Some(id) = self.scopes.find_template(name) {
            let ty = self.expand(id, type_args)?;
            return self.infer_construction(node, ty, args);
        }
        match self.scopes.lookup(name) {
            Some(Binding::GenericCase { template, index }) => {
                let data = self.expand(template, type_args)?;
                let case = self
                    .pool
                    .data_type(data)
                    .and_then(|d| d.cases.get(index).copied())
                    .ok_or_else(|| CompileError::internal("expanded data type lost a case"))?;
                self.infer_construction(node, case, args)
            }
            _ => Err(CompileError::type_mismatch(format!(
                "'{}' is not a generic type",
                self.text(name)
            ))),
        }
    }

    /// Type the arguments of a call to `sig` and check them against its
    /// parameters.
    ///
    /// A lambda argument whose parameters are still open is unified with
    /// the closure type the parameter expects before the check.
    fn check_arguments(&mut self, sig: &Signature, args: &[NodeId]) -> CompileResult<()> {
        let tree = self.tree;
        let mut typed = Vec::with_capacity(args.len());
        for &arg in args {
            let label = match tree.kind(arg) {
                NodeKind::NamedArg { name, .. } => Some(*name),
                _ => None,
            };
            typed.push((label, self.infer(arg)?));
        }

        let ordered = order_arguments(sig, &typed, self.interner)?;
        for (i, (&have, param)) in ordered.fixed.iter().zip(&sig.params).enumerate() {
            self.unify_closure_params(have, param.ty)?;
            if !self.pool.can_convert(have, param.ty) {
                return Err(CompileError::type_mismatch(format!(
                    "unable to pass a '{}' as a '{}' for argument {} of '{}'",
                    self.show(have),
                    self.show(param.ty),
                    i + 1,
                    self.text(sig.name)
                )));
            }
        }
        for &extra in &ordered.extra {
            let extra = self.pool.resolve_strict(extra, self.interner)?;
            if extra == Idx::VOID {
                return Err(CompileError::type_mismatch(format!(
                    "cannot pass a 'Void' value to '{}'",
                    self.text(sig.name)
                )));
            }
        }
        Ok(())
    }

    /// Fix the open parameter types of a lambda from the closure type it
    /// is passed as.
    fn unify_closure_params(&mut self, have: Idx, want: Idx) -> CompileResult<()> {
        let (Some(have), Some(want)) = (
            self.pool.closure_type(have).cloned(),
            self.pool.closure_type(want).cloned(),
        ) else {
            return Ok(());
        };
        if have.params.len() != want.params.len() {
            return Ok(());
        }
        for (&open, &wanted) in have.params.iter().zip(&want.params) {
            if matches!(
                self.pool.data(open),
                TypeData::Var(VarState::Unresolved)
            ) {
                self.pool.unify(open, wanted)?;
            }
        }
        Ok(())
    }
}
