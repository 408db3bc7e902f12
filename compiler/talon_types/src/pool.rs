//! The type pool: storage, interning and type relations.

use rustc_hash::FxHashMap;
use talon_diagnostic::{CompileError, CompileResult};
use talon_ir::{BinaryOp, Name, StringInterner};

use crate::data::{
    CaseType, ClosureType, DataType, DerivedType, ParamList, ReferenceType, TypeData, VarState,
};
use crate::{Idx, Signature, TypeFlags};

/// How a value of one type is turned into a value of another at a call
/// site, assignment or return.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Conversion {
    Identity,
    /// Box the value together with its runtime type record.
    WrapDynamic,
    /// Zero-extend a Boolean to an Integer.
    WidenBool,
    /// Reinterpret a closure pointer as a closure type with the same
    /// parameters.
    CastClosure,
}

/// Owns every type of a compilation session.
///
/// Pointer types are interned by pointee, capture-less closures by
/// `(params, return)`; requesting the same structure twice yields the same
/// [`Idx`]. Nominal types are created fresh and mutated while their
/// declarations are processed (ivar layout, method signatures).
pub struct Pool {
    items: Vec<TypeData>,
    flags: Vec<TypeFlags>,
    pointers: FxHashMap<Idx, Idx>,
    closures: FxHashMap<(ParamList, Idx), Idx>,
    char_pointer: Idx,
}

impl Pool {
    pub fn new() -> Self {
        let mut pool = Pool {
            items: Vec::with_capacity(64),
            flags: Vec::with_capacity(64),
            pointers: FxHashMap::default(),
            closures: FxHashMap::default(),
            char_pointer: Idx::VOID,
        };
        for data in [
            TypeData::Integer,
            TypeData::Boolean,
            TypeData::Char,
            TypeData::Void,
            TypeData::Str,
            TypeData::TypeRecord,
            TypeData::Dynamic,
        ] {
            pool.push(data);
        }
        debug_assert_eq!(pool.items.len(), Idx::BUILTIN_COUNT as usize);
        pool.char_pointer = pool.pointer(Idx::CHAR);
        pool
    }

    fn push(&mut self, data: TypeData) -> Idx {
        let raw = u32::try_from(self.items.len())
            .unwrap_or_else(|_| panic!("type pool exceeded u32::MAX entries"));
        self.flags.push(data.flags());
        self.items.push(data);
        Idx::from_raw(raw)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The raw entry at `idx`, without following type variables.
    #[inline]
    pub fn data(&self, idx: Idx) -> &TypeData {
        &self.items[idx.index()]
    }

    /// Flags of the type `idx` resolves to.
    pub fn flags(&self, idx: Idx) -> TypeFlags {
        self.flags[self.resolve(idx).index()]
    }

    /// True if values of `idx` are pointers to a struct.
    pub fn is_by_pointer(&self, idx: Idx) -> bool {
        self.flags(idx).contains(TypeFlags::BY_POINTER)
    }

    /// `*Char`, the result of `String#c_str`.
    pub fn char_pointer(&self) -> Idx {
        self.char_pointer
    }

    // === Construction ===

    /// The interned pointer type to `inner`.
    pub fn pointer(&mut self, inner: Idx) -> Idx {
        let inner = self.resolve(inner);
        if let Some(&idx) = self.pointers.get(&inner) {
            return idx;
        }
        let idx = self.push(TypeData::Pointer(inner));
        self.pointers.insert(inner, idx);
        idx
    }

    /// A closure type. Capture-less closures are interned by
    /// `(params, ret)`; capturing closures always get a fresh entry.
    pub fn closure(&mut self, params: ParamList, ret: Idx, captures: ParamList) -> Idx {
        if !captures.is_empty() {
            return self.push(TypeData::Closure(ClosureType {
                params,
                ret,
                captures,
            }));
        }
        let key = (params, ret);
        if let Some(&idx) = self.closures.get(&key) {
            return idx;
        }
        let idx = self.push(TypeData::Closure(ClosureType {
            params: key.0.clone(),
            ret,
            captures,
        }));
        self.closures.insert(key, idx);
        idx
    }

    pub fn fresh_var(&mut self) -> Idx {
        self.push(TypeData::Var(VarState::Unresolved))
    }

    /// The type of `root op rhs` while `root` is still unresolved.
    pub fn derived(&mut self, root: Idx, op: BinaryOp, rhs: Idx) -> Idx {
        self.push(TypeData::Derived(DerivedType { root, op, rhs }))
    }

    pub fn new_reference(&mut self, name: Name) -> Idx {
        self.push(TypeData::Reference(ReferenceType {
            name,
            ivars: Vec::new(),
            methods: FxHashMap::default(),
        }))
    }

    pub fn new_data(&mut self, name: Name) -> Idx {
        self.push(TypeData::Data(DataType {
            name,
            cases: Vec::new(),
            methods: FxHashMap::default(),
        }))
    }

    /// Append a case to `data`. Its tag is the number of cases before it.
    pub fn add_case(
        &mut self,
        data: Idx,
        name: Name,
        short_name: Name,
        fields: Vec<(Name, Idx)>,
    ) -> CompileResult<Idx> {
        let tag = match self.data(data) {
            TypeData::Data(d) => u32::try_from(d.cases.len())
                .map_err(|_| CompileError::internal("too many data cases"))?,
            _ => return Err(CompileError::internal("cases can only be added to data types")),
        };
        let case = self.push(TypeData::Case(CaseType {
            name,
            short_name,
            tag,
            data,
            fields,
        }));
        if let TypeData::Data(d) = &mut self.items[data.index()] {
            d.cases.push(case);
        }
        Ok(case)
    }

    /// Fix the ivar layout of a class.
    pub fn set_ivars(&mut self, ty: Idx, ivars: Vec<(Name, Idx)>) -> CompileResult<()> {
        match &mut self.items[ty.index()] {
            TypeData::Reference(r) => {
                r.ivars = ivars;
                Ok(())
            }
            _ => Err(CompileError::internal("ivars can only be laid out on classes")),
        }
    }

    /// Register a method signature on a class or data type.
    pub fn add_method(
        &mut self,
        owner: Idx,
        sig: Signature,
        interner: &StringInterner,
    ) -> CompileResult<()> {
        let owner_name = self.display(owner, interner);
        let methods = match &mut self.items[owner.index()] {
            TypeData::Reference(r) => &mut r.methods,
            TypeData::Data(d) => &mut d.methods,
            _ => {
                return Err(CompileError::internal(format!(
                    "methods cannot be declared on '{owner_name}'"
                )))
            }
        };
        if methods.contains_key(&sig.name) {
            return Err(CompileError::type_mismatch(format!(
                "method '{}' is already defined on '{owner_name}'",
                interner.lookup(sig.name)
            )));
        }
        methods.insert(sig.name, sig);
        Ok(())
    }

    // === Access ===

    pub fn reference(&self, idx: Idx) -> Option<&ReferenceType> {
        match self.data(self.resolve(idx)) {
            TypeData::Reference(r) => Some(r),
            _ => None,
        }
    }

    pub fn data_type(&self, idx: Idx) -> Option<&DataType> {
        match self.data(self.resolve(idx)) {
            TypeData::Data(d) => Some(d),
            _ => None,
        }
    }

    pub fn case_type(&self, idx: Idx) -> Option<&CaseType> {
        match self.data(self.resolve(idx)) {
            TypeData::Case(c) => Some(c),
            _ => None,
        }
    }

    pub fn closure_type(&self, idx: Idx) -> Option<&ClosureType> {
        match self.data(self.resolve(idx)) {
            TypeData::Closure(c) => Some(c),
            _ => None,
        }
    }

    /// Linkage name of a class, data type or case.
    pub fn nominal_name(&self, idx: Idx) -> Option<Name> {
        match self.data(self.resolve(idx)) {
            TypeData::Reference(r) => Some(r.name),
            TypeData::Data(d) => Some(d.name),
            TypeData::Case(c) => Some(c.name),
            _ => None,
        }
    }

    // === Type variables ===

    /// Follow forwarding and evaluate derived types as far as possible.
    ///
    /// Returns a variable (or derived) entry if resolution is blocked on a
    /// still-unresolved variable.
    pub fn resolve(&self, idx: Idx) -> Idx {
        match self.data(idx) {
            TypeData::Var(VarState::Resolved(target)) => self.resolve(*target),
            TypeData::Derived(d) => {
                let root = self.resolve(d.root);
                if self.is_var_entry(root) {
                    return idx;
                }
                self.binary_operation(root, d.op)
                    .map_or(idx, |op| op.result_type(root))
            }
            _ => idx,
        }
    }

    fn is_var_entry(&self, idx: Idx) -> bool {
        matches!(self.data(idx), TypeData::Var(_) | TypeData::Derived(_))
    }

    /// True if `idx` does not (yet) stand for a concrete type.
    pub fn is_unresolved(&self, idx: Idx) -> bool {
        self.is_var_entry(self.resolve(idx))
    }

    /// Resolve `idx`, failing if it is still open.
    pub fn resolve_strict(&self, idx: Idx, interner: &StringInterner) -> CompileResult<Idx> {
        let resolved = self.resolve(idx);
        match self.data(resolved) {
            TypeData::Var(_) => Err(CompileError::type_mismatch(
                "Unable to intuit lambda argument type from usage",
            )),
            TypeData::Derived(d) => {
                let root = self.resolve_strict(d.root, interner)?;
                let rhs = self.resolve_strict(d.rhs, interner)?;
                self.binary_result(root, d.op, rhs, interner)
            }
            _ => Ok(resolved),
        }
    }

    /// Forward the unresolved variable `var` to `target`.
    ///
    /// A variable is forwarded at most once; unifying an already resolved
    /// variable is an internal error.
    pub fn unify(&mut self, var: Idx, target: Idx) -> CompileResult<()> {
        let target = self.resolve(target);
        let state = match self.data(var) {
            TypeData::Var(state) => *state,
            _ => return Err(CompileError::internal("unify called on a concrete type")),
        };
        match state {
            VarState::Unresolved => {
                if target != var {
                    self.items[var.index()] = TypeData::Var(VarState::Resolved(target));
                }
                Ok(())
            }
            VarState::Resolved(_) => Err(CompileError::internal(
                "type variable unified a second time",
            )),
        }
    }

    // === Relations ===

    /// Type equality. Concrete types compare by identity; closures compare
    /// structurally, including their capture lists.
    pub fn same_type(&self, a: Idx, b: Idx) -> bool {
        let (a, b) = (self.resolve(a), self.resolve(b));
        if a == b {
            return true;
        }
        match (self.data(a), self.data(b)) {
            (TypeData::Closure(x), TypeData::Closure(y)) => {
                self.same_list(&x.params, &y.params)
                    && self.same_type(x.ret, y.ret)
                    && self.same_list(&x.captures, &y.captures)
            }
            _ => false,
        }
    }

    fn same_list(&self, a: &[Idx], b: &[Idx]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(&x, &y)| self.same_type(x, y))
    }

    /// How to pass a `from` value where a `to` value is required.
    pub fn conversion(&self, from: Idx, to: Idx) -> Option<Conversion> {
        if self.same_type(from, to) {
            return Some(Conversion::Identity);
        }
        let (from, to) = (self.resolve(from), self.resolve(to));
        if self.is_var_entry(from) || self.is_var_entry(to) {
            return None;
        }
        match (self.data(from), self.data(to)) {
            (TypeData::Void, _) => None,
            (_, TypeData::Dynamic) => Some(Conversion::WrapDynamic),
            (TypeData::Boolean, TypeData::Integer) => Some(Conversion::WidenBool),
            (TypeData::Closure(have), TypeData::Closure(want)) => {
                (self.same_list(&have.params, &want.params) && self.same_type(have.ret, want.ret))
                    .then_some(Conversion::CastClosure)
            }
            _ => None,
        }
    }

    pub fn can_convert(&self, from: Idx, to: Idx) -> bool {
        self.conversion(from, to).is_some()
    }

    // === Display ===

    /// Source-level spelling of a type, for messages and generated names.
    pub fn display(&self, idx: Idx, interner: &StringInterner) -> String {
        let resolved = self.resolve(idx);
        match self.data(resolved) {
            TypeData::Integer => "Integer".to_owned(),
            TypeData::Boolean => "Boolean".to_owned(),
            TypeData::Char => "Char".to_owned(),
            TypeData::Void => "Void".to_owned(),
            TypeData::Str => "String".to_owned(),
            TypeData::TypeRecord => "Type".to_owned(),
            TypeData::Dynamic => "Dynamic".to_owned(),
            TypeData::Pointer(inner) => format!("*{}", self.display(*inner, interner)),
            TypeData::Reference(ReferenceType { name, .. })
            | TypeData::Data(DataType { name, .. })
            | TypeData::Case(CaseType { name, .. }) => interner.lookup(*name).to_owned(),
            TypeData::Closure(c) => {
                let params: Vec<String> =
                    c.params.iter().map(|&p| self.display(p, interner)).collect();
                format!(
                    "Closure<({}) -> {}>",
                    params.join(", "),
                    self.display(c.ret, interner)
                )
            }
            TypeData::Var(_) | TypeData::Derived(_) => format!("?T{}", resolved.raw()),
        }
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
