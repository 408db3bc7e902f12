//! Pool entries.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use talon_ir::{BinaryOp, Name};

use crate::{Idx, Signature, TypeFlags};

/// Parameter list storage; most closures take few arguments.
pub type ParamList = SmallVec<[Idx; 4]>;

/// What a pool entry is.
#[derive(Clone, Debug)]
pub enum TypeData {
    Integer,
    Boolean,
    Char,
    Void,
    /// Built-in `String` record.
    Str,
    /// Built-in runtime type record.
    TypeRecord,
    /// Built-in dynamic box header.
    Dynamic,
    Pointer(Idx),
    Reference(ReferenceType),
    Data(DataType),
    Case(CaseType),
    Closure(ClosureType),
    Var(VarState),
    Derived(DerivedType),
}

impl TypeData {
    pub(crate) fn flags(&self) -> TypeFlags {
        match self {
            TypeData::Integer | TypeData::Boolean | TypeData::Char | TypeData::Void => {
                TypeFlags::IS_PRIMITIVE
            }
            TypeData::Str | TypeData::TypeRecord | TypeData::Dynamic => {
                TypeFlags::BY_POINTER | TypeFlags::IS_BUILTIN_STRUCT
            }
            TypeData::Pointer(_) => TypeFlags::empty(),
            TypeData::Reference(_) | TypeData::Data(_) | TypeData::Case(_) => {
                TypeFlags::BY_POINTER | TypeFlags::IS_NOMINAL
            }
            TypeData::Closure(_) => TypeFlags::BY_POINTER | TypeFlags::IS_CLOSURE,
            TypeData::Var(_) | TypeData::Derived(_) => TypeFlags::IS_VAR,
        }
    }
}

/// A class: an ordered ivar layout plus method signatures.
#[derive(Clone, Debug)]
pub struct ReferenceType {
    /// Linkage name, including package prefix and generic arguments.
    pub name: Name,
    /// Instance variables in declaration order; the position is the
    /// field offset.
    pub ivars: Vec<(Name, Idx)>,
    pub methods: FxHashMap<Name, Signature>,
}

impl ReferenceType {
    /// Field offset of `ivar`.
    pub fn ivar_index(&self, ivar: Name) -> Option<usize> {
        self.ivars.iter().position(|&(n, _)| n == ivar)
    }

    pub fn ivar_type(&self, ivar: Name) -> Option<Idx> {
        self.ivars
            .iter()
            .find_map(|&(n, ty)| if n == ivar { Some(ty) } else { None })
    }
}

/// A tagged union. Values point at the shared envelope `{i32 tag}`.
#[derive(Clone, Debug)]
pub struct DataType {
    pub name: Name,
    /// Cases in declaration order; a case's tag is its position.
    pub cases: Vec<Idx>,
    pub methods: FxHashMap<Name, Signature>,
}

/// One case of a data type, laid out as `{envelope, fields...}`.
#[derive(Clone, Debug)]
pub struct CaseType {
    /// Linkage name, `Data.Case`.
    pub name: Name,
    /// Name as written in the declaration.
    pub short_name: Name,
    pub tag: u32,
    pub data: Idx,
    pub fields: Vec<(Name, Idx)>,
}

impl CaseType {
    /// A case without fields is represented by one shared constant.
    pub fn is_singleton(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A function value: `{fn, captures...}` behind a pointer.
#[derive(Clone, Debug)]
pub struct ClosureType {
    pub params: ParamList,
    pub ret: Idx,
    pub captures: ParamList,
}

/// State of a type variable. Set at most once.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum VarState {
    Unresolved,
    Resolved(Idx),
}

/// The result of an operator applied to a not-yet-resolved operand.
///
/// Resolves once `root` does, by looking the operator up on the
/// resolved type.
#[derive(Copy, Clone, Debug)]
pub struct DerivedType {
    pub root: Idx,
    pub op: BinaryOp,
    pub rhs: Idx,
}
