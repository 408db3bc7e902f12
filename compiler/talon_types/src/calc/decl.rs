//! Declarations: types, layouts, signatures, member bodies and generic
//! expansion.

use std::mem;

use talon_diagnostic::{CompileError, CompileResult};
use talon_ir::{Name, NodeId, NodeKind};

use super::TypeCalculator;
use crate::{
    Binding, ExpandedTemplate, Idx, InstanceId, Param, Scope, Signature, Template, TemplateId,
    TypeData,
};

impl TypeCalculator<'_> {
    // === Step 1: names ===

    pub(super) fn declare_types(&mut self, stmts: &[NodeId]) -> CompileResult<()> {
        let tree = self.tree;
        for &stmt in stmts {
            match tree.kind(stmt) {
                NodeKind::Package(path) => {
                    let parts: Vec<&str> = path.iter().map(|&p| self.text(p)).collect();
                    self.package = Some(parts.join("."));
                }
                NodeKind::Import(path) => self.import(path)?,
                NodeKind::TraitDef { name, body } => self.scopes.register_trait(*name, *body),
                NodeKind::ClassDef {
                    name,
                    type_param: None,
                    ..
                } => {
                    let qualified = self.qualified(*name);
                    let ty = self.pool.new_reference(qualified);
                    self.declare_type_name(stmt, *name, ty);
                }
                NodeKind::DataDef {
                    name,
                    type_param: None,
                    ..
                } => {
                    let qualified = self.qualified(*name);
                    let ty = self.pool.new_data(qualified);
                    self.declare_type_name(stmt, *name, ty);
                }
                NodeKind::ClassDef {
                    name,
                    type_param: Some(param),
                    ..
                } => {
                    self.declare_template(stmt, *name, *param);
                }
                NodeKind::DataDef {
                    name,
                    type_param: Some(param),
                    cases,
                    ..
                } => {
                    let template = self.declare_template(stmt, *name, *param);
                    for (index, &case) in cases.iter().enumerate() {
                        if let NodeKind::CaseDef { name, .. } = tree.kind(case) {
                            self.scopes
                                .bind_module(*name, Binding::GenericCase { template, index });
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn declare_type_name(&mut self, decl: NodeId, name: Name, ty: Idx) {
        self.scopes.bind_module(name, Binding::Type(ty));
        self.namespace.types.insert(name, ty);
        self.record(decl, ty);
    }

    fn declare_template(&mut self, decl: NodeId, name: Name, param: Name) -> TemplateId {
        let id = TemplateId::from_raw(
            u32::try_from(self.templates.len()).unwrap_or_else(|_| panic!("too many templates")),
        );
        self.templates.push(Template {
            name,
            param,
            decl,
            expansions: Vec::new(),
        });
        self.scopes.register_template(name, id);
        id
    }

    fn import(&mut self, path: &[Name]) -> CompileResult<()> {
        let Some(&last) = path.last() else {
            return Err(CompileError::internal("empty import path"));
        };
        let dotted: Vec<&str> = path.iter().map(|&p| self.text(p)).collect();
        let dotted = dotted.join(".");
        tracing::debug!(module = %dotted, "importing");
        let module = self.resolver.resolve_import(self.pool, path, &dotted)?;
        self.scopes.bind_module(last, Binding::Module(module));
        Ok(())
    }

    // === Step 2: layouts ===

    pub(super) fn lay_out_types(&mut self, stmts: &[NodeId]) -> CompileResult<()> {
        let tree = self.tree;
        for &stmt in stmts {
            match tree.kind(stmt) {
                NodeKind::ClassDef {
                    type_param: None,
                    body,
                    ..
                } => {
                    let ty = self.table.type_of(self.instance, stmt)?;
                    let ivars = self.collect_ivars(*body)?;
                    self.pool.set_ivars(ty, ivars)?;
                }
                NodeKind::DataDef {
                    type_param: None,
                    cases,
                    ..
                } => {
                    let ty = self.table.type_of(self.instance, stmt)?;
                    for case in self.add_cases(ty, cases)? {
                        if let Some(c) = self.pool.case_type(case) {
                            let short = c.short_name;
                            self.scopes.bind_module(short, Binding::Type(case));
                            self.namespace.types.insert(short, case);
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Ivars declared in a class body (and the traits it includes), in
    /// source order.
    fn collect_ivars(&mut self, body: NodeId) -> CompileResult<Vec<(Name, Idx)>> {
        let mut ivars = Vec::new();
        self.collect_ivars_into(body, true, &mut ivars)?;
        Ok(ivars)
    }

    fn collect_ivars_into(
        &mut self,
        body: NodeId,
        record: bool,
        ivars: &mut Vec<(Name, Idx)>,
    ) -> CompileResult<()> {
        let tree = self.tree;
        for stmt in self.statements(body) {
            match tree.kind(stmt) {
                NodeKind::IVarDecl { name, ty } => {
                    let ty = self.resolve_type_expr(*ty)?;
                    if ivars.iter().any(|&(n, _)| n == *name) {
                        return Err(CompileError::type_mismatch(format!(
                            "instance variable '@{}' is declared twice",
                            self.text(*name)
                        )));
                    }
                    if record {
                        self.record(stmt, ty);
                    }
                    ivars.push((*name, ty));
                }
                NodeKind::Include(name) => {
                    let trait_body = self.find_trait(*name)?;
                    self.collect_ivars_into(trait_body, false, ivars)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Create the case types of `data`, in declaration order.
    fn add_cases(&mut self, data: Idx, cases: &[NodeId]) -> CompileResult<Vec<Idx>> {
        let tree = self.tree;
        let data_name = self.show(data);
        let mut created = Vec::with_capacity(cases.len());
        for &case in cases {
            let NodeKind::CaseDef { name, fields } = tree.kind(case) else {
                return Err(CompileError::internal("data declaration holds a non-case"));
            };
            let mut field_types = Vec::with_capacity(fields.len());
            for &field in fields {
                let NodeKind::TypedIdent { name, ty } = tree.kind(field) else {
                    return Err(CompileError::type_mismatch(format!(
                        "fields of case '{}' need a declared type",
                        self.text(*name)
                    )));
                };
                let ty = self.resolve_type_expr(*ty)?;
                self.record(field, ty);
                field_types.push((*name, ty));
            }
            let linkage = self
                .interner
                .intern(&format!("{data_name}.{}", self.text(*name)));
            let case_ty = self.pool.add_case(data, linkage, *name, field_types)?;
            self.record(case, case_ty);
            created.push(case_ty);
        }
        Ok(created)
    }

    fn find_trait(&self, name: Name) -> CompileResult<NodeId> {
        self.scopes
            .find_trait(name)
            .ok_or_else(|| CompileError::uninitialized(self.text(name)))
    }

    // === Step 3: signatures ===

    pub(super) fn declare_signatures(&mut self, stmts: &[NodeId]) -> CompileResult<()> {
        let tree = self.tree;
        for &stmt in stmts {
            match tree.kind(stmt) {
                NodeKind::MethodDef { name, .. } | NodeKind::MethodDec { name, .. } => {
                    let sig = self.signature_of(stmt, None)?;
                    if self.namespace.functions.contains_key(name) {
                        return Err(CompileError::type_mismatch(format!(
                            "function '{}' is already defined",
                            self.text(*name)
                        )));
                    }
                    self.namespace.functions.insert(*name, sig.clone());
                    self.table.set_signature(self.instance, stmt, sig);
                }
                NodeKind::ClassDef {
                    type_param: None,
                    body,
                    ..
                } => {
                    let ty = self.table.type_of(self.instance, stmt)?;
                    self.with_type_scope(ty, |this| this.declare_methods(*body, ty))?;
                }
                NodeKind::DataDef {
                    type_param: None,
                    body: Some(body),
                    ..
                } => {
                    let ty = self.table.type_of(self.instance, stmt)?;
                    self.with_type_scope(ty, |this| this.declare_methods(*body, ty))?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Run `f` with a frame for the body of `ty` pushed.
    fn with_type_scope<T>(
        &mut self,
        ty: Idx,
        f: impl FnOnce(&mut Self) -> CompileResult<T>,
    ) -> CompileResult<T> {
        let ivars = self
            .pool
            .reference(ty)
            .map(|r| r.ivars.clone())
            .unwrap_or_default();
        self.scopes.push(Scope::for_type(ty, &ivars));
        let result = f(self);
        self.scopes.pop();
        result
    }

    /// Register the signature of every method in a type body on `owner`.
    fn declare_methods(&mut self, body: NodeId, owner: Idx) -> CompileResult<()> {
        let tree = self.tree;
        for stmt in self.statements(body) {
            match tree.kind(stmt) {
                NodeKind::MethodDef { .. } | NodeKind::MethodDec { .. } => {
                    let sig = self.signature_of(stmt, Some(owner))?;
                    self.pool.add_method(owner, sig.clone(), self.interner)?;
                    self.table.set_signature(self.instance, stmt, sig);
                }
                NodeKind::Include(name) => {
                    let trait_body = self.find_trait(*name)?;
                    let included = self.table.fresh_instance();
                    self.table.set_include(self.instance, stmt, included);
                    let outer = mem::replace(&mut self.instance, included);
                    let result = self.declare_methods(trait_body, owner);
                    self.instance = outer;
                    result?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Signature of a `MethodDef`/`MethodDec` node.
    fn signature_of(&mut self, node: NodeId, owner: Option<Idx>) -> CompileResult<Signature> {
        let tree = self.tree;
        let (name, params, ret, attribute) = match tree.kind(node) {
            NodeKind::MethodDef {
                name, params, ret, ..
            } => (*name, params, *ret, None),
            NodeKind::MethodDec {
                name,
                params,
                ret,
                attribute,
            } => (*name, params, *ret, attribute.as_ref()),
            _ => return Err(CompileError::internal("signature of a non-method")),
        };

        let mut declared = Vec::with_capacity(params.len());
        let mut varargs = false;
        for (i, &param) in params.iter().enumerate() {
            match tree.kind(param) {
                NodeKind::VarArgs if i + 1 == params.len() => varargs = true,
                NodeKind::TypedIdent { name: pname, ty } => {
                    let ty = self.resolve_type_expr(*ty)?;
                    self.record(param, ty);
                    declared.push(Param::named(*pname, ty));
                }
                _ => {
                    return Err(CompileError::type_mismatch(format!(
                        "parameter {} of '{}' needs a declared type",
                        i + 1,
                        self.text(name)
                    )))
                }
            }
        }
        let ret = match ret {
            Some(ret) => self.resolve_type_expr(ret)?,
            None => Idx::VOID,
        };

        let link_name = match (owner, attribute) {
            (_, Some(attr)) => attr.value(self.well_known.link).unwrap_or(name),
            (Some(owner), None) => self
                .interner
                .intern(&format!("_Tc_{}_{}", self.show(owner), self.text(name))),
            (None, None) if name == self.well_known.main => name,
            (None, None) => self.qualified(name),
        };
        Ok(Signature {
            name,
            link_name,
            params: declared,
            ret,
            varargs,
        })
    }

    // === Step 4: bodies ===

    /// Walk the members of a non-generic class or data type.
    pub(super) fn walk_declared_type(
        &mut self,
        decl: NodeId,
        body: Option<NodeId>,
    ) -> CompileResult<Idx> {
        let tree = self.tree;
        let generic = matches!(
            tree.kind(decl),
            NodeKind::ClassDef {
                type_param: Some(_),
                ..
            } | NodeKind::DataDef {
                type_param: Some(_),
                ..
            }
        );
        if generic {
            return Ok(Idx::VOID);
        }
        let ty = self.table.type_of(self.instance, decl)?;
        if let Some(body) = body {
            self.with_type_scope(ty, |this| this.walk_members(body))?;
        }
        Ok(ty)
    }

    fn walk_members(&mut self, body: NodeId) -> CompileResult<()> {
        let tree = self.tree;
        for stmt in self.statements(body) {
            match tree.kind(stmt) {
                NodeKind::MethodDef { .. } => {
                    self.walk_method(stmt)?;
                    self.record(stmt, Idx::VOID);
                }
                NodeKind::Include(name) => {
                    let trait_body = self.find_trait(*name)?;
                    let included = self.table.include(self.instance, stmt).ok_or_else(|| {
                        CompileError::internal("trait inclusion was not declared")
                    })?;
                    let outer = mem::replace(&mut self.instance, included);
                    let result = self.walk_members(trait_body);
                    self.instance = outer;
                    result?;
                    self.record(stmt, Idx::VOID);
                }
                NodeKind::IVarDecl { .. } | NodeKind::MethodDec { .. } => {
                    if self.table.get(self.instance, stmt).is_none() {
                        self.record(stmt, Idx::VOID);
                    }
                }
                _ => {
                    self.infer(stmt)?;
                }
            }
        }
        Ok(())
    }

    /// Type a method or function body against its declared signature.
    pub(super) fn walk_method(&mut self, node: NodeId) -> CompileResult<()> {
        let tree = self.tree;
        let NodeKind::MethodDef { params, body, .. } = tree.kind(node) else {
            return Err(CompileError::internal("method walk on a non-method"));
        };
        let sig = self.table.signature(self.instance, node)?.clone();

        let mut frame = Scope::new();
        for (&param, declared) in params.iter().zip(&sig.params) {
            if let (NodeKind::TypedIdent { name, .. }, Some(_)) = (tree.kind(param), declared.name)
            {
                frame.bind(*name, Binding::Value(declared.ty));
            }
        }
        self.scopes.push(frame);
        let outer_return = self.return_type.replace(sig.ret);
        let body_ty = self.infer(*body);
        self.return_type = outer_return;
        self.scopes.pop();
        let body_ty = body_ty?;

        if sig.ret != Idx::VOID
            && body_ty != Idx::VOID
            && !self.pool.is_unresolved(body_ty)
            && !self.pool.can_convert(body_ty, sig.ret)
        {
            return Err(CompileError::type_mismatch(format!(
                "'{}' returns '{}' but its body ends with a '{}'",
                self.text(sig.name),
                self.show(sig.ret),
                self.show(body_ty)
            )));
        }
        Ok(())
    }

    // === Generic expansion ===

    /// The concrete type for `template<args>`, expanding it on first use.
    pub(super) fn expand(&mut self, id: TemplateId, args: Vec<Idx>) -> CompileResult<Idx> {
        let template = &self.templates[id.index()];
        let cached = template.expansions.iter().find(|e| {
            e.args.len() == args.len()
                && e.args
                    .iter()
                    .zip(&args)
                    .all(|(&a, &b)| self.pool.same_type(a, b))
        });
        if let Some(expansion) = cached {
            return Ok(expansion.ty);
        }
        let (name, param, decl) = (template.name, template.param, template.decl);
        let [arg] = args[..] else {
            return Err(CompileError::type_mismatch(format!(
                "'{}' takes exactly one type argument, got {}",
                self.text(name),
                args.len()
            )));
        };

        let qualified = self.qualified(name);
        let linkage = self.interner.intern(&format!(
            "{}<{}>",
            self.text(qualified),
            self.show(arg)
        ));
        let instance = self.table.fresh_instance();
        let tree = self.tree;
        let ty = match tree.kind(decl) {
            NodeKind::ClassDef { .. } => self.pool.new_reference(linkage),
            NodeKind::DataDef { .. } => self.pool.new_data(linkage),
            _ => return Err(CompileError::internal("template is not a type declaration")),
        };
        tracing::debug!(template = self.text(name), ty = self.text(linkage), "expanding");

        // Registered before the body is typed so self-references hit the cache.
        let index = self.templates[id.index()].expansions.len();
        self.templates[id.index()].expansions.push(ExpandedTemplate {
            args,
            ty,
            instance,
        });
        self.scopes.bind_module(linkage, Binding::Type(ty));
        self.table.record(instance, decl, ty);

        let mut frame = Scope::for_type(ty, &[]);
        frame.bind(param, Binding::Type(arg));
        self.with_isolated_scope(instance, frame, |this| match tree.kind(decl) {
            NodeKind::ClassDef { body, .. } => {
                let ivars = this.collect_ivars(*body)?;
                for &(ivar, ivar_ty) in &ivars {
                    this.scopes.add_ivar(ivar, ivar_ty);
                }
                this.pool.set_ivars(ty, ivars)?;
                this.declare_methods(*body, ty)
            }
            NodeKind::DataDef { cases, body, .. } => {
                this.add_cases(ty, cases)?;
                match body {
                    Some(body) => this.declare_methods(*body, ty),
                    None => Ok(()),
                }
            }
            _ => Ok(()),
        })?;

        self.pending.push_back((id, index));
        Ok(ty)
    }

    /// Run `f` under walk `instance` with only the module frame and
    /// `frame` visible.
    fn with_isolated_scope<T>(
        &mut self,
        instance: InstanceId,
        frame: Scope,
        f: impl FnOnce(&mut Self) -> CompileResult<T>,
    ) -> CompileResult<T> {
        let saved_frames = self.scopes.isolate();
        let saved_instance = mem::replace(&mut self.instance, instance);
        let saved_return = self.return_type.take();
        self.scopes.push(frame);
        let result = f(self);
        self.scopes.restore(saved_frames);
        self.instance = saved_instance;
        self.return_type = saved_return;
        result
    }

    /// Walk the member bodies of every expansion created so far, including
    /// expansions triggered while doing so.
    pub(super) fn drain_pending(&mut self) -> CompileResult<()> {
        let tree = self.tree;
        while let Some((id, index)) = self.pending.pop_front() {
            let template = &self.templates[id.index()];
            let expansion = template.expansions[index].clone();
            let (param, decl) = (template.param, template.decl);
            let body = match tree.kind(decl) {
                NodeKind::ClassDef { body, .. } => Some(*body),
                NodeKind::DataDef { body, .. } => *body,
                _ => None,
            };
            let Some(body) = body else { continue };

            let ivars = match self.pool.data(expansion.ty) {
                TypeData::Reference(r) => r.ivars.clone(),
                _ => Vec::new(),
            };
            let mut frame = Scope::for_type(expansion.ty, &ivars);
            frame.bind(param, Binding::Type(expansion.args[0]));
            self.with_isolated_scope(expansion.instance, frame, |this| this.walk_members(body))?;
        }
        Ok(())
    }
}
