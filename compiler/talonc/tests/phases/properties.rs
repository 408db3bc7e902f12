//! Whole-program behaviour of the type calculator and code generator.

use pretty_assertions::assert_eq;
use talon_diagnostic::CompileError;
use talon_ir::{BinaryOp, NodeId, TreeBuilder};
use talon_llvm::Context;
use talonc::MemoryLoader;

use crate::common::{compile_with, compiled, int_param, ir, main_returning, run_main};

/// `def pair(a: Integer, b: Integer) -> Integer { a - b }`
fn pair_function(b: &mut TreeBuilder<'_>) -> NodeId {
    let a = int_param(b, "a");
    let second = int_param(b, "b");
    let lhs = b.ident("a");
    let rhs = b.ident("b");
    let body = b.binary(BinaryOp::Sub, lhs, rhs);
    let ret = b.ty("Integer");
    b.method("pair", vec![a, second], Some(ret), body)
}

fn error_of(build: impl FnOnce(&mut TreeBuilder<'_>) -> Vec<NodeId>) -> CompileError {
    let ctx = Context::create();
    match compile_with(&ctx, &MemoryLoader::new(), build) {
        Ok(module) => panic!("expected a compile error\n{}", ir(&module)),
        Err(err) => err,
    }
}

// === Calls ===

#[test]
fn arity_is_checked_both_ways() {
    for count in [1, 3] {
        let err = error_of(|b| {
            let pair = pair_function(b);
            let args = (0..count).map(|i| b.num(i)).collect();
            let call = b.call(None, "pair", args);
            vec![pair, main_returning(b, vec![call])]
        });
        assert_eq!(
            err,
            CompileError::MissingArguments {
                function: "pair".to_owned(),
                needed: 2,
                given: usize::try_from(count).unwrap(),
            }
        );
    }
}

#[test]
fn named_arguments_must_follow_positional_ones_and_exist() {
    let positional_after_named = error_of(|b| {
        let pair = pair_function(b);
        let one = b.num(1);
        let named = b.named_arg("a", one);
        let two = b.num(2);
        let call = b.call(None, "pair", vec![named, two]);
        vec![pair, main_returning(b, vec![call])]
    });
    assert!(matches!(positional_after_named, CompileError::BadCall { .. }));

    let unknown_name = error_of(|b| {
        let pair = pair_function(b);
        let one = b.num(1);
        let first = b.named_arg("a", one);
        let two = b.num(2);
        let second = b.named_arg("c", two);
        let call = b.call(None, "pair", vec![first, second]);
        vec![pair, main_returning(b, vec![call])]
    });
    assert!(matches!(unknown_name, CompileError::BadCall { .. }));
}

#[test]
fn booleans_widen_but_integers_do_not_become_objects() {
    let ctx = Context::create();
    let module = compiled(&ctx, |b| {
        let pair = pair_function(b);
        let yes = b.boolean(true);
        let zero = b.num(0);
        let call = b.call(None, "pair", vec![yes, zero]);
        vec![pair, main_returning(b, vec![call])]
    });
    assert_eq!(run_main(module), 1);

    let err = error_of(|b| {
        let body = b.seq(vec![]);
        let class = b.class("Empty", None, body);
        let ty = b.ty("Empty");
        let param = b.typed("e", ty);
        let zero = b.num(0);
        let ret = b.ty("Integer");
        let take = b.method("take", vec![param], Some(ret), zero);
        let one = b.num(1);
        let call = b.call(None, "take", vec![one]);
        vec![class, take, main_returning(b, vec![call])]
    });
    assert!(matches!(err, CompileError::TypeMismatch { .. }));
}

// === Generics ===

#[test]
fn one_layout_per_generic_argument() {
    let ctx = Context::create();
    let module = compiled(&ctx, |b| {
        let t = b.ty("T");
        let ivar = b.ivar_decl("value", t);
        let body = b.seq(vec![ivar]);
        let class = b.class("Box", Some("T"), body);
        let mut stmts = Vec::new();
        for (i, arg) in ["Integer", "Boolean", "Integer"].into_iter().enumerate() {
            let ty = b.ty(arg);
            let make = b.instance("Box", vec![ty], vec![]);
            stmts.push(b.var(&format!("box{i}"), make));
        }
        stmts.push(b.num(0));
        vec![class, main_returning(b, stmts)]
    });
    let text = ir(&module);
    assert_eq!(text.matches("%\"Box<Integer>\" = type").count(), 1, "{text}");
    assert_eq!(text.matches("%\"Box<Boolean>\" = type").count(), 1, "{text}");
}

// === Data types ===

/// `data Maybe { Nothing; Just(value: Integer) }` and
/// `def classify(m: Maybe) -> Integer { case m { when Just(value): return value; when Nothing: return -1 }; 0 }`
fn maybe_and_classify(b: &mut TreeBuilder<'_>) -> Vec<NodeId> {
    let nothing = b.case_def("Nothing", vec![]);
    let value = int_param(b, "value");
    let just = b.case_def("Just", vec![value]);
    let maybe = b.data("Maybe", None, vec![nothing, just], None);

    let maybe_ty = b.ty("Maybe");
    let m = b.typed("m", maybe_ty);
    let subject = b.ident("m");
    let just_ty = b.ty("Just");
    let just_pattern = b.pattern(just_ty, None, &["value"]);
    let bound = b.ident("value");
    let just_body = b.ret(Some(bound));
    let just_arm = b.when(just_pattern, just_body);
    let nothing_ty = b.ty("Nothing");
    let nothing_pattern = b.pattern(nothing_ty, None, &[]);
    let minus = b.num(-1);
    let nothing_body = b.ret(Some(minus));
    let nothing_arm = b.when(nothing_pattern, nothing_body);
    let case = b.case(subject, vec![just_arm, nothing_arm]);
    let zero = b.num(0);
    let body = b.seq(vec![case, zero]);
    let ret = b.ty("Integer");
    let classify = b.method("classify", vec![m], Some(ret), body);
    vec![maybe, classify]
}

#[test]
fn constructed_case_matches_its_own_arm() {
    let ctx = Context::create();
    let module = compiled(&ctx, |b| {
        let mut stmts = maybe_and_classify(b);
        let five = b.num(5);
        let just = b.call(None, "Just", vec![five]);
        let call = b.call(None, "classify", vec![just]);
        stmts.push(main_returning(b, vec![call]));
        stmts
    });
    assert_eq!(run_main(module), 5);
}

#[test]
fn singleton_case_matches_its_own_arm() {
    let ctx = Context::create();
    let module = compiled(&ctx, |b| {
        let mut stmts = maybe_and_classify(b);
        let nothing = b.ident("Nothing");
        let call = b.call(None, "classify", vec![nothing]);
        stmts.push(main_returning(b, vec![call]));
        stmts
    });
    assert_eq!(run_main(module), -1);
}

#[test]
fn unmatched_case_falls_through() {
    let ctx = Context::create();
    let module = compiled(&ctx, |b| {
        let mut stmts = maybe_and_classify(b);
        // Only `Nothing` is handled here; `Just` runs past the case.
        let maybe_ty = b.ty("Maybe");
        let m = b.typed("m", maybe_ty);
        let subject = b.ident("m");
        let nothing_ty = b.ty("Nothing");
        let pattern = b.pattern(nothing_ty, None, &[]);
        let one = b.num(1);
        let body = b.ret(Some(one));
        let arm = b.when(pattern, body);
        let case = b.case(subject, vec![arm]);
        let seven = b.num(7);
        let body = b.seq(vec![case, seven]);
        let ret = b.ty("Integer");
        stmts.push(b.method("partial", vec![m], Some(ret), body));

        let two = b.num(2);
        let just = b.call(None, "Just", vec![two]);
        let call = b.call(None, "partial", vec![just]);
        stmts.push(main_returning(b, vec![call]));
        stmts
    });
    assert_eq!(run_main(module), 7);
}

// === Closures ===

/// `def apply(f: Closure<(Integer) -> Integer>) -> Integer { f(1) }`
fn apply_function(b: &mut TreeBuilder<'_>) -> NodeId {
    let param = b.ty("Integer");
    let ret = b.ty("Integer");
    let closure = b.closure_type(vec![param], ret);
    let f = b.typed("f", closure);
    let ret = b.ty("Integer");
    let one = b.num(1);
    let body = b.call(None, "f", vec![one]);
    b.method("apply", vec![f], Some(ret), body)
}

#[test]
fn lambda_parameter_is_unified_before_lowering() {
    let ctx = Context::create();
    let module = compiled(&ctx, |b| {
        let apply = apply_function(b);
        let x = b.ident("x");
        let lhs = b.ident("x");
        let one = b.num(1);
        let body = b.binary(BinaryOp::Add, lhs, one);
        let lambda = b.lambda(vec![x], &[], body);
        let call = b.call(None, "apply", vec![lambda]);
        vec![apply, main_returning(b, vec![call])]
    });
    assert!(ir(&module).contains("define i32 @_Tc_lambda.0(ptr %closure, i32 %x)"));
    assert_eq!(run_main(module), 2);
}

#[test]
fn lambda_with_an_open_parameter_cannot_be_lowered() {
    let err = error_of(|b| {
        let x = b.ident("x");
        let body = b.ident("x");
        let lambda = b.lambda(vec![x], &[], body);
        let g = b.var("g", lambda);
        let zero = b.num(0);
        vec![main_returning(b, vec![g, zero])]
    });
    assert_eq!(
        err.to_string(),
        "Unable to intuit lambda argument type from usage"
    );
}

// === Dynamic ===

#[test]
fn one_runtime_record_per_type() {
    let ctx = Context::create();
    let module = compiled(&ctx, |b| {
        let dynamic = b.ty("Dynamic");
        let one = b.num(1);
        let first = b.var_typed("first", dynamic, one);
        let dynamic = b.ty("Dynamic");
        let two = b.num(2);
        let second = b.var_typed("second", dynamic, two);
        let subject = b.ident("second");
        let int = b.ty("Integer");
        let pattern = b.pattern(int, Some("n"), &[]);
        let n = b.ident("n");
        let body = b.ret(Some(n));
        let arm = b.when(pattern, body);
        let case = b.case(subject, vec![arm]);
        let zero = b.num(0);
        vec![main_returning(b, vec![first, second, case, zero])]
    });
    let text = ir(&module);
    assert_eq!(text.matches("@talon.Type.Integer = ").count(), 1, "{text}");
    assert_eq!(run_main(module), 2);
}

// === Reachability ===

#[test]
fn both_branches_returning_leave_no_merge_block() {
    let ctx = Context::create();
    let module = compiled(&ctx, |b| {
        let yes = b.boolean(true);
        let one = b.num(1);
        let first = b.ret(Some(one));
        let two = b.num(2);
        let second = b.ret(Some(two));
        let body = b.if_else(yes, first, Some(second));
        let ret = b.ty("Integer");
        let f = b.method("f", vec![], Some(ret), body);
        let call = b.call(None, "f", vec![]);
        vec![f, main_returning(b, vec![call])]
    });
    let text = ir(&module);
    assert!(!text.contains("if.end"), "{text}");
    assert!(
        text.contains("%return_value = phi i32 [ 1, %if.then ], [ 2, %if.else ]"),
        "{text}"
    );
    assert_eq!(run_main(module), 1);
}
