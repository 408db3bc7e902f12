//! Expressions and statements inside bodies.

use smallvec::SmallVec;
use talon_diagnostic::{CompileError, CompileResult};
use talon_ir::{BinaryOp, Name, NodeId, NodeKind, UnaryOp};

use super::TypeCalculator;
use crate::{Binding, Idx, Scope, Target, TypeData};

impl TypeCalculator<'_> {
    pub(super) fn infer_ident(&mut self, node: NodeId, name: Name) -> CompileResult<Idx> {
        match self.scopes.lookup(name) {
            Some(Binding::Value(ty)) => {
                self.table.set_target(self.instance, node, Target::Local);
                Ok(ty)
            }
            Some(Binding::Type(ty)) => match self.pool.case_type(ty) {
                Some(case) if case.is_singleton() => {
                    let data = case.data;
                    self.table
                        .set_target(self.instance, node, Target::Singleton(ty));
                    Ok(data)
                }
                Some(_) => Err(CompileError::type_mismatch(format!(
                    "case '{}' has fields; construct it with arguments",
                    self.text(name)
                ))),
                None => Err(CompileError::type_mismatch(format!(
                    "type '{}' used as a value",
                    self.text(name)
                ))),
            },
            Some(Binding::GenericCase { .. }) => Err(CompileError::type_mismatch(format!(
                "case '{}' of a generic type needs a type argument",
                self.text(name)
            ))),
            Some(Binding::Module(_)) => Err(CompileError::type_mismatch(format!(
                "module '{}' used as a value",
                self.text(name)
            ))),
            None => Err(CompileError::uninitialized(self.text(name))),
        }
    }

    pub(super) fn infer_var(
        &mut self,
        name: Name,
        declared: Option<NodeId>,
        value: NodeId,
    ) -> CompileResult<Idx> {
        let value_ty = self.infer(value)?;
        if self.pool.resolve(value_ty) == Idx::VOID {
            return Err(CompileError::type_mismatch(format!(
                "'{}' cannot be initialized with a value of type 'Void'",
                self.text(name)
            )));
        }
        let ty = match declared {
            Some(declared) => {
                let declared = self.resolve_type_expr(declared)?;
                if !self.pool.can_convert(value_ty, declared) {
                    return Err(CompileError::type_mismatch(format!(
                        "'{}' is declared as '{}' but initialized with a '{}'",
                        self.text(name),
                        self.show(declared),
                        self.show(value_ty)
                    )));
                }
                declared
            }
            None => value_ty,
        };
        self.scopes.bind(name, Binding::Value(ty));
        Ok(ty)
    }

    pub(super) fn infer_assign(&mut self, target: NodeId, value: NodeId) -> CompileResult<Idx> {
        let tree = self.tree;
        let value_ty = self.infer(value)?;
        match tree.kind(target) {
            NodeKind::IVar(name) => {
                let ivar_ty = self.scopes.lookup_ivar(*name).ok_or_else(|| {
                    CompileError::uninitialized(format!("@{}", self.text(*name)))
                })?;
                if !self.pool.can_convert(value_ty, ivar_ty) {
                    return Err(CompileError::type_mismatch(format!(
                        "cannot assign a '{}' to '@{}' of type '{}'",
                        self.show(value_ty),
                        self.text(*name),
                        self.show(ivar_ty)
                    )));
                }
                self.record(target, ivar_ty);
            }
            NodeKind::Ident(name) => {
                let local_ty = self
                    .scopes
                    .lookup_value(*name)
                    .ok_or_else(|| CompileError::uninitialized(self.text(*name)))?;
                if !self.pool.same_type(value_ty, local_ty) {
                    return Err(CompileError::type_mismatch(format!(
                        "cannot assign a '{}' to '{}' of type '{}'",
                        self.show(value_ty),
                        self.text(*name),
                        self.show(local_ty)
                    )));
                }
                self.table.set_target(self.instance, target, Target::Local);
                self.record(target, local_ty);
            }
            _ => {
                return Err(CompileError::type_mismatch(
                    "only locals and instance variables can be assigned",
                ))
            }
        }
        Ok(value_ty)
    }

    pub(super) fn infer_binary(
        &mut self,
        op: BinaryOp,
        lhs: NodeId,
        rhs: NodeId,
    ) -> CompileResult<Idx> {
        let lhs_ty = self.infer(lhs)?;
        let rhs_ty = self.infer(rhs)?;
        // An operand typed by a lambda parameter defers the check until
        // the parameter is unified at the call that receives the lambda.
        if self.pool.is_unresolved(lhs_ty) {
            return Ok(self.pool.derived(lhs_ty, op, rhs_ty));
        }
        if self.pool.is_unresolved(rhs_ty) {
            return Ok(self.pool.derived(rhs_ty, op, lhs_ty));
        }
        self.pool.binary_result(lhs_ty, op, rhs_ty, self.interner)
    }

    pub(super) fn infer_unary(&mut self, op: UnaryOp, operand: NodeId) -> CompileResult<Idx> {
        let ty = self.infer(operand)?;
        match op {
            UnaryOp::Stack => match self.table.target(self.instance, operand) {
                Ok(Target::Construct { .. } | Target::ConstructCase { .. }) => Ok(ty),
                _ => Err(CompileError::type_mismatch(
                    "'~' must be applied to a construction",
                )),
            },
            UnaryOp::Not if self.pool.resolve(ty) == Idx::BOOLEAN => Ok(Idx::BOOLEAN),
            UnaryOp::Not => Err(CompileError::unknown_operation("!", self.show(ty))),
        }
    }

    /// `if`/`while` conditions: Boolean, or Integer compared against zero.
    pub(super) fn infer_condition(&mut self, cond: NodeId) -> CompileResult<Idx> {
        let ty = self.infer(cond)?;
        match self.pool.resolve(ty) {
            Idx::BOOLEAN | Idx::INTEGER => Ok(ty),
            _ => Err(CompileError::type_mismatch(format!(
                "a condition must be a 'Boolean', got a '{}'",
                self.show(ty)
            ))),
        }
    }

    pub(super) fn infer_case(&mut self, cond: NodeId, whens: &[NodeId]) -> CompileResult<Idx> {
        let tree = self.tree;
        let cond_ty = self.infer(cond)?;
        let cond_ty = self.pool.resolve(cond_ty);
        let dynamic = match self.pool.data(cond_ty) {
            TypeData::Data(_) => false,
            TypeData::Dynamic => true,
            _ => {
                return Err(CompileError::type_mismatch(format!(
                    "case needs a data or 'Dynamic' value, got a '{}'",
                    self.show(cond_ty)
                )))
            }
        };

        for &when in whens {
            let NodeKind::When { pattern, body } = tree.kind(when) else {
                return Err(CompileError::internal("case arm is not a 'when'"));
            };
            let NodeKind::Pattern { ty, binder, fields } = tree.kind(*pattern) else {
                return Err(CompileError::internal("'when' without a pattern"));
            };
            let mut frame = Scope::new();
            let pattern_ty = if dynamic {
                let ty = self.resolve_type_expr(*ty)?;
                if !fields.is_empty() {
                    return Err(CompileError::type_mismatch(
                        "a 'Dynamic' pattern cannot bind fields",
                    ));
                }
                if let Some(binder) = binder {
                    frame.bind(*binder, Binding::Value(ty));
                }
                ty
            } else {
                let case = self.pattern_case(*ty, cond_ty)?;
                self.bind_case_fields(&mut frame, case, fields)?;
                if let Some(binder) = binder {
                    frame.bind(*binder, Binding::Value(cond_ty));
                }
                case
            };
            self.record(*pattern, pattern_ty);

            self.scopes.push(frame);
            let body = self.infer(*body);
            self.scopes.pop();
            body?;
            self.record(when, Idx::VOID);
        }
        Ok(Idx::VOID)
    }

    /// The case of `data` a data pattern names.
    fn pattern_case(&mut self, ty: NodeId, data: Idx) -> CompileResult<Idx> {
        let tree = self.tree;
        let NodeKind::NamedType(name) = tree.kind(ty) else {
            return Err(CompileError::type_mismatch(
                "a data pattern must name a case",
            ));
        };
        let cases = self
            .pool
            .data_type(data)
            .map(|d| d.cases.clone())
            .unwrap_or_default();
        let case = cases.into_iter().find(|&case| {
            self.pool
                .case_type(case)
                .is_some_and(|c| c.short_name == *name)
        });
        let case = case.ok_or_else(|| {
            CompileError::type_mismatch(format!(
                "'{}' is not a case of '{}'",
                self.text(*name),
                self.show(data)
            ))
        })?;
        self.record(ty, case);
        Ok(case)
    }

    fn bind_case_fields(
        &self,
        frame: &mut Scope,
        case: Idx,
        binders: &[Name],
    ) -> CompileResult<()> {
        if binders.is_empty() {
            return Ok(());
        }
        let fields = self
            .pool
            .case_type(case)
            .map(|c| c.fields.clone())
            .unwrap_or_default();
        if binders.len() != fields.len() {
            return Err(CompileError::type_mismatch(format!(
                "'{}' has {} fields but the pattern binds {}",
                self.show(case),
                fields.len(),
                binders.len()
            )));
        }
        for (&binder, &(_, ty)) in binders.iter().zip(&fields) {
            frame.bind(binder, Binding::Value(ty));
        }
        Ok(())
    }

    pub(super) fn infer_return(&mut self, value: Option<NodeId>) -> CompileResult<Idx> {
        let Some(expected) = self.return_type else {
            return Err(CompileError::type_mismatch("'return' outside of a method"));
        };
        match value {
            None if expected == Idx::VOID => {}
            None => {
                return Err(CompileError::type_mismatch(format!(
                    "missing return value of type '{}'",
                    self.show(expected)
                )))
            }
            Some(value) => {
                let ty = self.infer(value)?;
                if expected == Idx::VOID {
                    return Err(CompileError::type_mismatch(
                        "returning a value from a method without a return type",
                    ));
                }
                if !self.pool.can_convert(ty, expected) {
                    return Err(CompileError::type_mismatch(format!(
                        "cannot return a '{}' from a method returning '{}'",
                        self.show(ty),
                        self.show(expected)
                    )));
                }
            }
        }
        Ok(Idx::VOID)
    }

    /// A lambda: untyped parameters get fresh type variables, captures are
    /// copied by value at creation.
    pub(super) fn infer_lambda(
        &mut self,
        params: &[NodeId],
        captures: &[Name],
        body: NodeId,
    ) -> CompileResult<Idx> {
        let tree = self.tree;
        let mut frame = Scope::new();
        let mut param_types: SmallVec<[Idx; 4]> = SmallVec::new();
        for &param in params {
            let (name, ty) = match tree.kind(param) {
                NodeKind::TypedIdent { name, ty } => (*name, self.resolve_type_expr(*ty)?),
                NodeKind::Ident(name) => (*name, self.pool.fresh_var()),
                _ => return Err(CompileError::internal("lambda parameter is not a name")),
            };
            self.record(param, ty);
            frame.bind(name, Binding::Value(ty));
            param_types.push(ty);
        }

        let mut capture_types: SmallVec<[Idx; 4]> = SmallVec::new();
        for &capture in captures {
            let ty = self
                .scopes
                .lookup_value(capture)
                .ok_or_else(|| CompileError::uninitialized(self.text(capture)))?;
            frame.bind(capture, Binding::Value(ty));
            capture_types.push(ty);
        }

        self.scopes.push(frame);
        let outer_return = self.return_type.take();
        let body_ty = self.infer(body);
        self.return_type = outer_return;
        self.scopes.pop();
        let body_ty = body_ty?;

        Ok(self.pool.closure(param_types, body_ty, capture_types))
    }
}
