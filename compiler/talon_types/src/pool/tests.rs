use pretty_assertions::assert_eq;
use smallvec::smallvec;
use talon_diagnostic::CompileError;
use talon_ir::{BinaryOp, StringInterner};

use super::*;

#[test]
fn builtins_sit_at_fixed_indices() {
    let pool = Pool::new();
    assert!(matches!(pool.data(Idx::INTEGER), TypeData::Integer));
    assert!(matches!(pool.data(Idx::STRING), TypeData::Str));
    assert!(matches!(pool.data(Idx::DYNAMIC), TypeData::Dynamic));
    assert!(pool.flags(Idx::BOOLEAN).contains(TypeFlags::IS_PRIMITIVE));
    assert!(pool.is_by_pointer(Idx::TYPE));
    assert!(matches!(
        pool.data(pool.char_pointer()),
        TypeData::Pointer(Idx::CHAR)
    ));
}

#[test]
fn pointers_are_interned() {
    let mut pool = Pool::new();
    let a = pool.pointer(Idx::INTEGER);
    let b = pool.pointer(Idx::INTEGER);
    assert_eq!(a, b);
    assert_ne!(a, pool.pointer(Idx::BOOLEAN));
}

#[test]
fn capture_free_closures_are_interned() {
    let mut pool = Pool::new();
    let a = pool.closure(smallvec![Idx::INTEGER], Idx::BOOLEAN, smallvec![]);
    let b = pool.closure(smallvec![Idx::INTEGER], Idx::BOOLEAN, smallvec![]);
    assert_eq!(a, b);

    let captured = pool.closure(smallvec![Idx::INTEGER], Idx::BOOLEAN, smallvec![Idx::CHAR]);
    let again = pool.closure(smallvec![Idx::INTEGER], Idx::BOOLEAN, smallvec![Idx::CHAR]);
    assert_ne!(captured, again);
    assert!(pool.same_type(captured, again));
    assert!(!pool.same_type(a, captured));
}

#[test]
fn unify_forwards_once_then_fails_loudly() {
    let mut pool = Pool::new();
    let var = pool.fresh_var();
    assert!(pool.is_unresolved(var));

    pool.unify(var, Idx::INTEGER).unwrap();
    assert_eq!(pool.resolve(var), Idx::INTEGER);
    assert!(pool.same_type(var, Idx::INTEGER));

    let err = pool.unify(var, Idx::BOOLEAN).unwrap_err();
    assert!(matches!(err, CompileError::Internal { .. }));
    assert_eq!(pool.resolve(var), Idx::INTEGER);
}

#[test]
fn unify_rejects_concrete_types() {
    let mut pool = Pool::new();
    assert!(pool.unify(Idx::INTEGER, Idx::BOOLEAN).is_err());
}

#[test]
fn derived_type_evaluates_after_unification() {
    let interner = StringInterner::new();
    let mut pool = Pool::new();
    let var = pool.fresh_var();
    let sum = pool.derived(var, BinaryOp::Add, Idx::INTEGER);
    let test = pool.derived(var, BinaryOp::Lt, Idx::INTEGER);
    assert!(pool.is_unresolved(sum));

    pool.unify(var, Idx::INTEGER).unwrap();
    assert_eq!(pool.resolve(sum), Idx::INTEGER);
    assert_eq!(pool.resolve(test), Idx::BOOLEAN);
    assert_eq!(pool.resolve_strict(sum, &interner).unwrap(), Idx::INTEGER);
}

#[test]
fn open_variable_cannot_be_resolved_strictly() {
    let interner = StringInterner::new();
    let mut pool = Pool::new();
    let var = pool.fresh_var();
    let err = pool.resolve_strict(var, &interner).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Unable to intuit lambda argument type from usage"
    );
}

#[test]
fn conversions() {
    let mut pool = Pool::new();
    assert_eq!(
        pool.conversion(Idx::INTEGER, Idx::INTEGER),
        Some(Conversion::Identity)
    );
    assert_eq!(
        pool.conversion(Idx::BOOLEAN, Idx::INTEGER),
        Some(Conversion::WidenBool)
    );
    assert_eq!(pool.conversion(Idx::INTEGER, Idx::BOOLEAN), None);
    assert_eq!(
        pool.conversion(Idx::STRING, Idx::DYNAMIC),
        Some(Conversion::WrapDynamic)
    );
    assert_eq!(pool.conversion(Idx::VOID, Idx::DYNAMIC), None);

    let returns_int = pool.closure(smallvec![Idx::INTEGER], Idx::INTEGER, smallvec![]);
    let returns_void = pool.closure(smallvec![Idx::INTEGER], Idx::VOID, smallvec![]);
    let takes_bool = pool.closure(smallvec![Idx::BOOLEAN], Idx::VOID, smallvec![]);
    let captures_int =
        pool.closure(smallvec![Idx::INTEGER], Idx::INTEGER, smallvec![Idx::INTEGER]);
    assert_eq!(
        pool.conversion(captures_int, returns_int),
        Some(Conversion::CastClosure)
    );
    assert_eq!(pool.conversion(returns_void, returns_int), None);
    assert_eq!(pool.conversion(returns_int, takes_bool), None);
}

#[test]
fn closure_results_are_not_discarded_by_conversion() {
    let mut pool = Pool::new();
    let returns_int = pool.closure(smallvec![Idx::INTEGER], Idx::INTEGER, smallvec![]);
    let returns_void = pool.closure(smallvec![Idx::INTEGER], Idx::VOID, smallvec![]);
    assert_eq!(pool.conversion(returns_int, returns_void), None);
    assert!(!pool.can_convert(returns_int, returns_void));
}

#[test]
fn open_variables_never_convert() {
    let mut pool = Pool::new();
    let var = pool.fresh_var();
    assert!(!pool.can_convert(var, Idx::INTEGER));
    assert!(!pool.can_convert(Idx::INTEGER, var));
}

#[test]
fn data_cases_are_tagged_in_order() {
    let interner = StringInterner::new();
    let mut pool = Pool::new();
    let option = pool.new_data(interner.intern("Option"));
    let none = pool
        .add_case(option, interner.intern("Option.None"), interner.intern("None"), vec![])
        .unwrap();
    let some = pool
        .add_case(
            option,
            interner.intern("Option.Some"),
            interner.intern("Some"),
            vec![(interner.intern("value"), Idx::INTEGER)],
        )
        .unwrap();

    assert_eq!(pool.case_type(none).unwrap().tag, 0);
    assert_eq!(pool.case_type(some).unwrap().tag, 1);
    assert!(pool.case_type(none).unwrap().is_singleton());
    assert_eq!(pool.data_type(option).unwrap().cases, vec![none, some]);

    let stray = interner.intern("Stray");
    assert!(pool.add_case(Idx::INTEGER, stray, stray, vec![]).is_err());
}

#[test]
fn duplicate_methods_are_rejected() {
    let interner = StringInterner::new();
    let mut pool = Pool::new();
    let point = pool.new_reference(interner.intern("Point"));
    let sig = Signature {
        name: interner.intern("x"),
        link_name: interner.intern("_Tc_Point_x"),
        params: Vec::new(),
        ret: Idx::INTEGER,
        varargs: false,
    };
    pool.add_method(point, sig.clone(), &interner).unwrap();
    assert!(matches!(
        pool.add_method(point, sig, &interner),
        Err(CompileError::TypeMismatch { .. })
    ));
}

#[test]
fn display_spells_source_types() {
    let interner = StringInterner::new();
    let mut pool = Pool::new();
    let ptr = pool.pointer(Idx::CHAR);
    let closure = pool.closure(smallvec![Idx::INTEGER, Idx::STRING], Idx::BOOLEAN, smallvec![]);
    assert_eq!(pool.display(Idx::INTEGER, &interner), "Integer");
    assert_eq!(pool.display(ptr, &interner), "*Char");
    assert_eq!(
        pool.display(closure, &interner),
        "Closure<(Integer, String) -> Boolean>"
    );
    let var = pool.fresh_var();
    assert_eq!(pool.display(var, &interner), format!("?T{}", var.raw()));
}
