//! Node kinds of the syntax tree.

use std::fmt;

use super::Name;

/// Index of a node in its [`SyntaxTree`](crate::SyntaxTree).
///
/// Node ids are only meaningful for the tree that produced them. Memo
/// tables that span generic instantiations pair a `NodeId` with an
/// instantiation id instead of copying nodes.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        NodeId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Binary operators. Integer arithmetic, shifts and comparisons.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
}

impl BinaryOp {
    /// Surface spelling, also used as the operation name on a type.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
        }
    }

    /// True for operators that produce a Boolean.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge | BinaryOp::Eq | BinaryOp::Ne
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum UnaryOp {
    /// `~Foo(...)`: construct on the stack instead of the heap.
    Stack,
    /// `!b`
    Not,
}

/// `%Name(key="value", ...)` attached to a method declaration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Attribute {
    pub name: Name,
    pub values: Vec<(Name, Name)>,
}

impl Attribute {
    /// Value of `key`, if present.
    pub fn value(&self, key: Name) -> Option<Name> {
        self.values
            .iter()
            .find_map(|&(k, v)| if k == key { Some(v) } else { None })
    }
}

/// Every construct the parser can produce.
///
/// Both passes match this enum exhaustively; adding a variant is a compile
/// error until each pass handles it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NodeKind {
    /// Statements evaluated in order; the value is the last statement's.
    Seq(Vec<NodeId>),
    Number(i64),
    Bool(bool),
    Str(Name),
    Ident(Name),
    /// `@name`
    IVar(Name),
    /// `self` inside a method body.
    SelfRef,
    /// `name : Type` in a parameter list or pattern.
    TypedIdent { name: Name, ty: NodeId },
    /// `...` as the last parameter of a declaration.
    VarArgs,

    // -- Type expressions --
    NamedType(Name),
    /// `*T`
    PointerType(NodeId),
    /// `Name<Arg>` in type position.
    TemplatedType { name: Name, args: Vec<NodeId> },
    /// `Closure<(A, B) -> R>`
    ClosureType { params: Vec<NodeId>, ret: NodeId },

    // -- Declarations --
    MethodDef {
        name: Name,
        params: Vec<NodeId>,
        ret: Option<NodeId>,
        body: NodeId,
    },
    /// Bodiless declaration, usually of an external function.
    MethodDec {
        name: Name,
        params: Vec<NodeId>,
        ret: Option<NodeId>,
        attribute: Option<Attribute>,
    },
    ClassDef {
        name: Name,
        type_param: Option<Name>,
        body: NodeId,
    },
    DataDef {
        name: Name,
        type_param: Option<Name>,
        cases: Vec<NodeId>,
        body: Option<NodeId>,
    },
    /// One case of a `data` declaration; fields are `TypedIdent`s.
    CaseDef { name: Name, fields: Vec<NodeId> },
    /// `var @name : Type` inside a class body.
    IVarDecl { name: Name, ty: NodeId },
    TraitDef { name: Name, body: NodeId },
    Include(Name),

    // -- Statements and expressions --
    /// `var name [: Type] = value`
    Var {
        name: Name,
        ty: Option<NodeId>,
        value: NodeId,
    },
    /// `target = value`; the target is an `Ident` or `IVar`.
    Assign { target: NodeId, value: NodeId },
    Call {
        receiver: Option<NodeId>,
        method: Name,
        args: Vec<NodeId>,
    },
    /// `name: value` inside an argument list.
    NamedArg { name: Name, value: NodeId },
    /// `Name<TypeArgs>(args)`
    TemplatedInstance {
        name: Name,
        type_args: Vec<NodeId>,
        args: Vec<NodeId>,
    },
    Binary {
        op: BinaryOp,
        lhs: NodeId,
        rhs: NodeId,
    },
    Unary { op: UnaryOp, operand: NodeId },
    If {
        cond: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    While { cond: NodeId, body: NodeId },
    /// `case cond; when ...; end`; `whens` are `When` nodes.
    Case { cond: NodeId, whens: Vec<NodeId> },
    /// `when pattern => body`; the pattern is a `Pattern` node.
    When { pattern: NodeId, body: NodeId },
    /// `Case(a, b)` or `name : Type`: a type to test plus bindings.
    Pattern {
        ty: NodeId,
        binder: Option<Name>,
        fields: Vec<Name>,
    },
    Return(Option<NodeId>),
    /// `|params| body`; `captures` names outer locals copied in by value.
    Lambda {
        params: Vec<NodeId>,
        captures: Vec<Name>,
        body: NodeId,
    },
    Import(Vec<Name>),
    Package(Vec<Name>),
}
