//! Arena-allocated syntax tree.

use super::{Attribute, BinaryOp, Name, NodeId, NodeKind, StringInterner, UnaryOp};

/// A parsed compilation unit.
///
/// Nodes are stored flat and referenced by [`NodeId`]. The tree is
/// immutable once built; both passes only read it.
#[derive(Clone, Debug)]
pub struct SyntaxTree {
    nodes: Vec<NodeKind>,
    root: NodeId,
}

impl SyntaxTree {
    /// The top-level statement sequence.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Kind of `id`.
    ///
    /// # Panics
    /// If `id` does not belong to this tree.
    #[inline]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Builds a [`SyntaxTree`] bottom-up.
///
/// The parser uses [`push`](Self::push); the helper constructors keep
/// hand-written trees in tests readable.
pub struct TreeBuilder<'a> {
    interner: &'a StringInterner,
    nodes: Vec<NodeKind>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(interner: &'a StringInterner) -> Self {
        TreeBuilder {
            interner,
            nodes: Vec::new(),
        }
    }

    /// Intern `s` in the session interner.
    pub fn name(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    fn names(&self, parts: &[&str]) -> Vec<Name> {
        parts.iter().map(|p| self.name(p)).collect()
    }

    /// Append a node and return its id.
    pub fn push(&mut self, kind: NodeKind) -> NodeId {
        let raw = u32::try_from(self.nodes.len())
            .unwrap_or_else(|_| panic!("syntax tree exceeded u32::MAX nodes"));
        self.nodes.push(kind);
        NodeId::from_raw(raw)
    }

    /// Finish the tree with `root` as the top-level sequence.
    pub fn finish(self, root: NodeId) -> SyntaxTree {
        SyntaxTree {
            nodes: self.nodes,
            root,
        }
    }

    // -- Literals and names --

    pub fn seq(&mut self, stmts: Vec<NodeId>) -> NodeId {
        self.push(NodeKind::Seq(stmts))
    }

    pub fn num(&mut self, n: i64) -> NodeId {
        self.push(NodeKind::Number(n))
    }

    pub fn boolean(&mut self, b: bool) -> NodeId {
        self.push(NodeKind::Bool(b))
    }

    pub fn string(&mut self, s: &str) -> NodeId {
        let s = self.name(s);
        self.push(NodeKind::Str(s))
    }

    pub fn ident(&mut self, s: &str) -> NodeId {
        let s = self.name(s);
        self.push(NodeKind::Ident(s))
    }

    pub fn ivar(&mut self, s: &str) -> NodeId {
        let s = self.name(s);
        self.push(NodeKind::IVar(s))
    }

    pub fn self_ref(&mut self) -> NodeId {
        self.push(NodeKind::SelfRef)
    }

    pub fn typed(&mut self, name: &str, ty: NodeId) -> NodeId {
        let name = self.name(name);
        self.push(NodeKind::TypedIdent { name, ty })
    }

    pub fn varargs(&mut self) -> NodeId {
        self.push(NodeKind::VarArgs)
    }

    // -- Types --

    pub fn ty(&mut self, name: &str) -> NodeId {
        let name = self.name(name);
        self.push(NodeKind::NamedType(name))
    }

    pub fn pointer(&mut self, inner: NodeId) -> NodeId {
        self.push(NodeKind::PointerType(inner))
    }

    pub fn templated_type(&mut self, name: &str, args: Vec<NodeId>) -> NodeId {
        let name = self.name(name);
        self.push(NodeKind::TemplatedType { name, args })
    }

    pub fn closure_type(&mut self, params: Vec<NodeId>, ret: NodeId) -> NodeId {
        self.push(NodeKind::ClosureType { params, ret })
    }

    // -- Declarations --

    pub fn method(
        &mut self,
        name: &str,
        params: Vec<NodeId>,
        ret: Option<NodeId>,
        body: NodeId,
    ) -> NodeId {
        let name = self.name(name);
        self.push(NodeKind::MethodDef {
            name,
            params,
            ret,
            body,
        })
    }

    pub fn method_dec(
        &mut self,
        name: &str,
        params: Vec<NodeId>,
        ret: Option<NodeId>,
        attribute: Option<Attribute>,
    ) -> NodeId {
        let name = self.name(name);
        self.push(NodeKind::MethodDec {
            name,
            params,
            ret,
            attribute,
        })
    }

    /// `%Import(name="link")`
    pub fn import_attribute(&self, link: &str) -> Attribute {
        Attribute {
            name: self.name("Import"),
            values: vec![(self.name("name"), self.name(link))],
        }
    }

    pub fn class(&mut self, name: &str, type_param: Option<&str>, body: NodeId) -> NodeId {
        let name = self.name(name);
        let type_param = type_param.map(|p| self.name(p));
        self.push(NodeKind::ClassDef {
            name,
            type_param,
            body,
        })
    }

    pub fn data(
        &mut self,
        name: &str,
        type_param: Option<&str>,
        cases: Vec<NodeId>,
        body: Option<NodeId>,
    ) -> NodeId {
        let name = self.name(name);
        let type_param = type_param.map(|p| self.name(p));
        self.push(NodeKind::DataDef {
            name,
            type_param,
            cases,
            body,
        })
    }

    pub fn case_def(&mut self, name: &str, fields: Vec<NodeId>) -> NodeId {
        let name = self.name(name);
        self.push(NodeKind::CaseDef { name, fields })
    }

    pub fn ivar_decl(&mut self, name: &str, ty: NodeId) -> NodeId {
        let name = self.name(name);
        self.push(NodeKind::IVarDecl { name, ty })
    }

    pub fn trait_def(&mut self, name: &str, body: NodeId) -> NodeId {
        let name = self.name(name);
        self.push(NodeKind::TraitDef { name, body })
    }

    pub fn include(&mut self, name: &str) -> NodeId {
        let name = self.name(name);
        self.push(NodeKind::Include(name))
    }

    // -- Statements and expressions --

    pub fn var(&mut self, name: &str, value: NodeId) -> NodeId {
        let name = self.name(name);
        self.push(NodeKind::Var {
            name,
            ty: None,
            value,
        })
    }

    pub fn var_typed(&mut self, name: &str, ty: NodeId, value: NodeId) -> NodeId {
        let name = self.name(name);
        self.push(NodeKind::Var {
            name,
            ty: Some(ty),
            value,
        })
    }

    pub fn assign(&mut self, target: NodeId, value: NodeId) -> NodeId {
        self.push(NodeKind::Assign { target, value })
    }

    pub fn call(&mut self, receiver: Option<NodeId>, method: &str, args: Vec<NodeId>) -> NodeId {
        let method = self.name(method);
        self.push(NodeKind::Call {
            receiver,
            method,
            args,
        })
    }

    pub fn named_arg(&mut self, name: &str, value: NodeId) -> NodeId {
        let name = self.name(name);
        self.push(NodeKind::NamedArg { name, value })
    }

    pub fn instance(&mut self, name: &str, type_args: Vec<NodeId>, args: Vec<NodeId>) -> NodeId {
        let name = self.name(name);
        self.push(NodeKind::TemplatedInstance {
            name,
            type_args,
            args,
        })
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.push(NodeKind::Binary { op, lhs, rhs })
    }

    pub fn unary(&mut self, op: UnaryOp, operand: NodeId) -> NodeId {
        self.push(NodeKind::Unary { op, operand })
    }

    pub fn if_else(
        &mut self,
        cond: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    ) -> NodeId {
        self.push(NodeKind::If {
            cond,
            then_branch,
            else_branch,
        })
    }

    pub fn while_loop(&mut self, cond: NodeId, body: NodeId) -> NodeId {
        self.push(NodeKind::While { cond, body })
    }

    pub fn case(&mut self, cond: NodeId, whens: Vec<NodeId>) -> NodeId {
        self.push(NodeKind::Case { cond, whens })
    }

    pub fn when(&mut self, pattern: NodeId, body: NodeId) -> NodeId {
        self.push(NodeKind::When { pattern, body })
    }

    pub fn pattern(&mut self, ty: NodeId, binder: Option<&str>, fields: &[&str]) -> NodeId {
        let binder = binder.map(|b| self.name(b));
        let fields = self.names(fields);
        self.push(NodeKind::Pattern { ty, binder, fields })
    }

    pub fn ret(&mut self, value: Option<NodeId>) -> NodeId {
        self.push(NodeKind::Return(value))
    }

    pub fn lambda(&mut self, params: Vec<NodeId>, captures: &[&str], body: NodeId) -> NodeId {
        let captures = self.names(captures);
        self.push(NodeKind::Lambda {
            params,
            captures,
            body,
        })
    }

    pub fn import(&mut self, path: &[&str]) -> NodeId {
        let path = self.names(path);
        self.push(NodeKind::Import(path))
    }

    pub fn package(&mut self, path: &[&str]) -> NodeId {
        let path = self.names(path);
        self.push(NodeKind::Package(path))
    }
}
