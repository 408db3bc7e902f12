//! The type calculator.
//!
//! A recursive walk over the syntax tree that assigns a type to every node
//! it visits and records how identifiers and calls resolved. The walk runs
//! in four steps over the top-level statements:
//!
//! 1. declare every class, data type, template, trait and import by name;
//! 2. lay out ivars and data cases;
//! 3. build the signature of every function and method;
//! 4. walk all bodies.
//!
//! Generic declarations are expanded on demand. Each expansion is typed
//! under its own [`InstanceId`]; its method bodies are queued and walked
//! after the main tree so forward references work the same way inside and
//! outside generic code.

mod call;
mod decl;
mod expr;
mod type_expr;

use std::collections::VecDeque;

use talon_diagnostic::{CompileError, CompileResult};
use talon_ir::{Name, NodeId, NodeKind, StringInterner, SyntaxTree};
use talon_stack::ensure_sufficient_stack;

use crate::{
    GlobalEnv, Idx, InstanceId, ModuleId, ModuleNamespace, Pool, ScopeChain, Template,
    TemplateId, TypeTable,
};

/// Compiles imported modules on behalf of the calculator.
///
/// The driver implements this by running a nested calculator and code
/// generator over the imported tree against the same pool and global
/// environment.
pub trait ImportResolver {
    /// Compile, or reuse, the module at `path` (`dotted` is the same path
    /// joined with dots) and return its id.
    fn resolve_import(
        &mut self,
        pool: &mut Pool,
        path: &[Name],
        dotted: &str,
    ) -> CompileResult<ModuleId>;

    /// Namespace of a module returned by [`resolve_import`](Self::resolve_import).
    fn namespace(&self, module: ModuleId) -> Option<&ModuleNamespace>;
}

/// Resolver for units that may not import anything.
pub struct NoImports;

impl ImportResolver for NoImports {
    fn resolve_import(&mut self, _: &mut Pool, _: &[Name], dotted: &str) -> CompileResult<ModuleId> {
        Err(CompileError::ImportNotFound {
            path: dotted.to_owned(),
        })
    }

    fn namespace(&self, _: ModuleId) -> Option<&ModuleNamespace> {
        None
    }
}

/// Everything the code generator needs from the calculator.
#[derive(Debug)]
pub struct TypedModule {
    pub table: TypeTable,
    pub templates: Vec<Template>,
    /// Top-level functions and types of this module.
    pub namespace: ModuleNamespace,
}

impl TypedModule {
    /// The template declared by the `ClassDef`/`DataDef` node `decl`.
    pub fn template_for(&self, decl: NodeId) -> Option<&Template> {
        self.templates.iter().find(|t| t.decl == decl)
    }
}

/// Interned names the calculator compares against.
struct WellKnown {
    initialize: Name,
    main: Name,
    link: Name,
}

pub struct TypeCalculator<'a> {
    tree: &'a SyntaxTree,
    interner: &'a StringInterner,
    pool: &'a mut Pool,
    resolver: &'a mut dyn ImportResolver,
    scopes: ScopeChain<'a>,
    table: TypeTable,
    templates: Vec<Template>,
    namespace: ModuleNamespace,
    package: Option<String>,
    /// Walk the current node belongs to.
    instance: InstanceId,
    /// Declared return type of the enclosing method; `None` at top level
    /// and inside closures.
    return_type: Option<Idx>,
    /// Expansions whose member bodies still need a walk.
    pending: VecDeque<(TemplateId, usize)>,
    well_known: WellKnown,
}

impl<'a> TypeCalculator<'a> {
    pub fn new(
        tree: &'a SyntaxTree,
        interner: &'a StringInterner,
        global: &'a GlobalEnv,
        pool: &'a mut Pool,
        resolver: &'a mut dyn ImportResolver,
    ) -> Self {
        TypeCalculator {
            tree,
            interner,
            pool,
            resolver,
            scopes: ScopeChain::new(global),
            table: TypeTable::new(),
            templates: Vec::new(),
            namespace: ModuleNamespace::default(),
            package: None,
            instance: InstanceId::ROOT,
            return_type: None,
            pending: VecDeque::new(),
            well_known: WellKnown {
                initialize: interner.intern("initialize"),
                main: interner.intern("main"),
                link: interner.intern("name"),
            },
        }
    }

    /// Type the whole tree.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn calculate(mut self) -> CompileResult<TypedModule> {
        let root = self.tree.root();
        let stmts = self.statements(root);
        self.declare_types(&stmts)?;
        self.lay_out_types(&stmts)?;
        self.declare_signatures(&stmts)?;
        self.infer(root)?;
        self.drain_pending()?;
        tracing::debug!(
            nodes = self.table.len(),
            templates = self.templates.len(),
            "type calculation finished"
        );
        Ok(TypedModule {
            table: self.table,
            templates: self.templates,
            namespace: self.namespace,
        })
    }

    /// Children of a `Seq`, or the node itself.
    fn statements(&self, node: NodeId) -> Vec<NodeId> {
        match self.tree.kind(node) {
            NodeKind::Seq(stmts) => stmts.clone(),
            _ => vec![node],
        }
    }

    fn text(&self, name: Name) -> &'static str {
        self.interner.lookup(name)
    }

    fn show(&self, ty: Idx) -> String {
        self.pool.display(ty, self.interner)
    }

    fn record(&mut self, node: NodeId, ty: Idx) {
        self.table.record(self.instance, node, ty);
    }

    /// `name` with the package prefix, if a package was declared.
    fn qualified(&self, name: Name) -> Name {
        match &self.package {
            Some(package) => self
                .interner
                .intern(&format!("{package}.{}", self.text(name))),
            None => name,
        }
    }

    /// Type `node` and record the result.
    fn infer(&mut self, node: NodeId) -> CompileResult<Idx> {
        ensure_sufficient_stack(|| {
            let ty = self.infer_kind(node)?;
            self.record(node, ty);
            Ok(ty)
        })
    }

    fn infer_kind(&mut self, node: NodeId) -> CompileResult<Idx> {
        let tree = self.tree;
        match tree.kind(node) {
            NodeKind::Seq(stmts) => {
                let mut last = Idx::VOID;
                for &stmt in stmts {
                    last = self.infer(stmt)?;
                }
                Ok(last)
            }
            NodeKind::Number(_) => Ok(Idx::INTEGER),
            NodeKind::Bool(_) => Ok(Idx::BOOLEAN),
            NodeKind::Str(_) => Ok(Idx::STRING),
            NodeKind::Ident(name) => self.infer_ident(node, *name),
            NodeKind::IVar(name) => self
                .scopes
                .lookup_ivar(*name)
                .ok_or_else(|| CompileError::uninitialized(format!("@{}", self.text(*name)))),
            NodeKind::SelfRef => self
                .scopes
                .current_type()
                .ok_or_else(|| CompileError::uninitialized("self")),
            NodeKind::VarArgs => Ok(Idx::VOID),
            NodeKind::TypedIdent { .. }
            | NodeKind::NamedType(_)
            | NodeKind::PointerType(_)
            | NodeKind::TemplatedType { .. }
            | NodeKind::ClosureType { .. } => self.resolve_type_expr(node),

            NodeKind::MethodDef { .. } => {
                self.walk_method(node)?;
                Ok(Idx::VOID)
            }
            NodeKind::MethodDec { .. } | NodeKind::TraitDef { .. } => Ok(Idx::VOID),
            NodeKind::ClassDef { body, .. } => self.walk_declared_type(node, Some(*body)),
            NodeKind::DataDef { body, .. } => self.walk_declared_type(node, *body),
            NodeKind::CaseDef { .. } => self.table.type_of(self.instance, node),
            NodeKind::IVarDecl { ty, .. } => self.resolve_type_expr(*ty),
            NodeKind::Include(_) => Err(CompileError::type_mismatch(
                "'include' is only allowed inside a class body",
            )),

            NodeKind::Var { name, ty, value } => self.infer_var(*name, *ty, *value),
            NodeKind::Assign { target, value } => self.infer_assign(*target, *value),
            NodeKind::Call {
                receiver,
                method,
                args,
            } => self.infer_call(node, *receiver, *method, args),
            NodeKind::NamedArg { value, .. } => self.infer(*value),
            NodeKind::TemplatedInstance {
                name,
                type_args,
                args,
            } => self.infer_templated_instance(node, *name, type_args, args),
            NodeKind::Binary { op, lhs, rhs } => self.infer_binary(*op, *lhs, *rhs),
            NodeKind::Unary { op, operand } => self.infer_unary(*op, *operand),
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.infer_condition(*cond)?;
                self.infer(*then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.infer(*else_branch)?;
                }
                Ok(Idx::VOID)
            }
            NodeKind::While { cond, body } => {
                self.infer_condition(*cond)?;
                self.infer(*body)?;
                Ok(Idx::VOID)
            }
            NodeKind::Case { cond, whens } => self.infer_case(*cond, whens),
            NodeKind::When { .. } | NodeKind::Pattern { .. } => Err(CompileError::internal(
                "case arm visited outside of its case",
            )),
            NodeKind::Return(value) => self.infer_return(*value),
            NodeKind::Lambda {
                params,
                captures,
                body,
            } => self.infer_lambda(params, captures, *body),
            NodeKind::Import(_) | NodeKind::Package(_) => Ok(Idx::VOID),
        }
    }
}

#[cfg(test)]
mod tests;
