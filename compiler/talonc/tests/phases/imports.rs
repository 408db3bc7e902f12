//! Imported modules are compiled into the importer's IR module.

use pretty_assertions::assert_eq;
use talon_diagnostic::CompileError;
use talon_ir::{NodeId, StringInterner, TreeBuilder};
use talon_llvm::Context;
use talon_types::{GlobalEnv, Pool};
use talonc::{MemoryLoader, Session};

use crate::common::{compile_with, int_param, ir, main_returning, run_main, square_function};

/// `def <name> -> Integer { <module>.square(<n>) }`
fn square_of(b: &mut TreeBuilder<'_>, name: &str, module: &str, n: i64) -> NodeId {
    let receiver = b.ident(module);
    let arg = b.num(n);
    let call = b.call(Some(receiver), "square", vec![arg]);
    let ret = b.ty("Integer");
    b.method(name, vec![], Some(ret), call)
}

/// Two modules that both import `shared`.
fn diamond() -> MemoryLoader {
    MemoryLoader::new()
        .with_module("shared", |b| vec![square_function(b)])
        .with_module("left", |b| {
            let import = b.import(&["shared"]);
            vec![import, square_of(b, "left_value", "shared", 2)]
        })
        .with_module("right", |b| {
            let import = b.import(&["shared"]);
            vec![import, square_of(b, "right_value", "shared", 3)]
        })
}

fn diamond_root(b: &mut TreeBuilder<'_>) -> Vec<NodeId> {
    let left = b.import(&["left"]);
    let right = b.import(&["right"]);
    let l = b.ident("left");
    let lhs = b.call(Some(l), "left_value", vec![]);
    let r = b.ident("right");
    let rhs = b.call(Some(r), "right_value", vec![]);
    let sum = b.binary(talon_ir::BinaryOp::Add, lhs, rhs);
    vec![left, right, main_returning(b, vec![sum])]
}

#[test]
fn imported_function_is_called_through_its_module() {
    let loader = MemoryLoader::new().with_module("util.math", |b| vec![square_function(b)]);
    let ctx = Context::create();
    let module = compile_with(&ctx, &loader, |b| {
        let import = b.import(&["util", "math"]);
        let receiver = b.ident("math");
        let seven = b.num(7);
        let call = b.call(Some(receiver), "square", vec![seven]);
        vec![import, main_returning(b, vec![call])]
    })
    .unwrap();
    assert!(ir(&module).contains("define i32 @square(i32 %n)"));
    assert_eq!(run_main(module), 49);
}

#[test]
fn shared_import_is_compiled_once() {
    let ctx = Context::create();
    let module = compile_with(&ctx, &diamond(), diamond_root).unwrap();
    assert_eq!(run_main(module), 13);
}

#[test]
fn session_counts_each_import_once() {
    let interner = StringInterner::new();
    let global = GlobalEnv::new(&interner);
    let mut pool = Pool::new();
    let loader = diamond();
    let mut b = TreeBuilder::new(&interner);
    let stmts = diamond_root(&mut b);
    let root = b.seq(stmts);
    let tree = b.finish(root);

    let ctx = Context::create();
    let mut session = Session::new(&ctx, &interner, &global, &loader, "main").unwrap();
    session.compile_unit(&tree, &mut pool).unwrap();
    assert_eq!(session.import_count(), 3);
    let module = session.finish(false).unwrap();
    assert_eq!(module.get_name().to_str(), Ok("main"));
}

#[test]
fn imported_class_is_constructed_through_its_module() {
    let loader = MemoryLoader::new().with_module("geometry", |b| {
        let ivar_ty = b.ty("Integer");
        let ivar = b.ivar_decl("x", ivar_ty);
        let param = int_param(b, "x");
        let target = b.ivar("x");
        let value = b.ident("x");
        let assign = b.assign(target, value);
        let init = b.method("initialize", vec![param], None, assign);
        let ret = b.ty("Integer");
        let read = b.ivar("x");
        let getter = b.method("x", vec![], Some(ret), read);
        let body = b.seq(vec![ivar, init, getter]);
        vec![b.class("Point", None, body)]
    });
    let ctx = Context::create();
    let module = compile_with(&ctx, &loader, |b| {
        let import = b.import(&["geometry"]);
        let receiver = b.ident("geometry");
        let three = b.num(3);
        let make = b.call(Some(receiver), "Point", vec![three]);
        let p = b.var("p", make);
        let recv = b.ident("p");
        let read = b.call(Some(recv), "x", vec![]);
        vec![import, main_returning(b, vec![p, read])]
    })
    .unwrap();
    assert_eq!(run_main(module), 3);
}

#[test]
fn package_prefixes_link_names() {
    let loader = MemoryLoader::new().with_module("geo.shapes", |b| {
        let package = b.package(&["geo"]);
        let six = b.num(6);
        let ret = b.ty("Integer");
        vec![package, b.method("area", vec![], Some(ret), six)]
    });
    let ctx = Context::create();
    let module = compile_with(&ctx, &loader, |b| {
        let import = b.import(&["geo", "shapes"]);
        let receiver = b.ident("shapes");
        let call = b.call(Some(receiver), "area", vec![]);
        vec![import, main_returning(b, vec![call])]
    })
    .unwrap();
    let text = ir(&module);
    assert!(text.contains("define i32 @geo.area()"), "{text}");
    assert!(text.contains("call i32 @geo.area()"), "{text}");
    assert_eq!(run_main(module), 6);
}

#[test]
fn import_cycle_is_reported() {
    let loader = MemoryLoader::new()
        .with_module("one", |b| vec![b.import(&["two"])])
        .with_module("two", |b| vec![b.import(&["one"])]);
    let ctx = Context::create();
    let err = compile_with(&ctx, &loader, |b| {
        let import = b.import(&["one"]);
        let zero = b.num(0);
        vec![import, main_returning(b, vec![zero])]
    })
    .unwrap_err();
    assert_eq!(
        err,
        CompileError::ImportCycle {
            path: "one".to_owned()
        }
    );
}

#[test]
fn missing_import_is_reported() {
    let ctx = Context::create();
    let err = compile_with(&ctx, &MemoryLoader::new(), |b| {
        let import = b.import(&["nowhere", "land"]);
        let zero = b.num(0);
        vec![import, main_returning(b, vec![zero])]
    })
    .unwrap_err();
    assert_eq!(err.to_string(), "unable to find 'nowhere.land' to import");
}

#[test]
fn functions_share_one_link_namespace() {
    let loader = MemoryLoader::new().with_module("util", |b| vec![square_function(b)]);
    let ctx = Context::create();
    let err = compile_with(&ctx, &loader, |b| {
        let import = b.import(&["util"]);
        let square = square_function(b);
        let zero = b.num(0);
        vec![import, square, main_returning(b, vec![zero])]
    })
    .unwrap_err();
    assert_eq!(err.to_string(), "'square' is defined more than once");
}

/// `class Point { @a: <ty> }` without methods, and `def <user> -> Integer`
/// that builds one and returns `result`.
fn bare_point_module(b: &mut TreeBuilder<'_>, ty: &str, user: &str, result: i64) -> Vec<NodeId> {
    let ivar_ty = b.ty(ty);
    let ivar = b.ivar_decl("a", ivar_ty);
    let body = b.seq(vec![ivar]);
    let class = b.class("Point", None, body);
    let make = b.call(None, "Point", vec![]);
    let p = b.var("p", make);
    let value = b.num(result);
    let body = b.seq(vec![p, value]);
    let ret = b.ty("Integer");
    let user = b.method(user, vec![], Some(ret), body);
    vec![class, user]
}

#[test]
fn same_named_classes_keep_their_own_layouts() {
    let loader =
        MemoryLoader::new().with_module("single", |b| bare_point_module(b, "Integer", "one", 1));
    let ctx = Context::create();
    let module = compile_with(&ctx, &loader, |b| {
        let import = b.import(&["single"]);
        // class Point { @a: Integer; @b: Integer; def initialize(a, b); def sum -> Integer }
        let a_ty = b.ty("Integer");
        let a_ivar = b.ivar_decl("a", a_ty);
        let b_ty = b.ty("Integer");
        let b_ivar = b.ivar_decl("b", b_ty);
        let first = int_param(b, "x");
        let second = int_param(b, "y");
        let target = b.ivar("a");
        let value = b.ident("x");
        let set_a = b.assign(target, value);
        let target = b.ivar("b");
        let value = b.ident("y");
        let set_b = b.assign(target, value);
        let init_body = b.seq(vec![set_a, set_b]);
        let init = b.method("initialize", vec![first, second], None, init_body);
        let lhs = b.ivar("a");
        let rhs = b.ivar("b");
        let sum = b.binary(talon_ir::BinaryOp::Add, lhs, rhs);
        let ret = b.ty("Integer");
        let sum = b.method("sum", vec![], Some(ret), sum);
        let body = b.seq(vec![a_ivar, b_ivar, init, sum]);
        let class = b.class("Point", None, body);

        let receiver = b.ident("single");
        let one = b.call(Some(receiver), "one", vec![]);
        let two = b.num(20);
        let three = b.num(300);
        let make = b.call(None, "Point", vec![two, three]);
        let p = b.var("p", make);
        let recv = b.ident("p");
        let sum = b.call(Some(recv), "sum", vec![]);
        let total = b.binary(talon_ir::BinaryOp::Add, one, sum);
        vec![import, class, main_returning(b, vec![p, total])]
    })
    .unwrap();
    let text = ir(&module);
    assert!(text.contains("%Point = type { i32 }"), "{text}");
    assert!(
        text.lines()
            .any(|line| line.starts_with("%Point.") && line.ends_with("= type { i32, i32 }")),
        "{text}"
    );
    assert_eq!(run_main(module), 321);
}

#[test]
fn same_named_class_with_a_narrower_field_does_not_truncate_stores() {
    let loader = MemoryLoader::new()
        .with_module("flags", |b| bare_point_module(b, "Boolean", "flagged", 0));
    let ctx = Context::create();
    let module = compile_with(&ctx, &loader, |b| {
        let import = b.import(&["flags"]);
        // class Point { @a: Integer; def set_a(v: Integer) { @a = v }; def a -> Integer { @a } }
        let a_ty = b.ty("Integer");
        let a_ivar = b.ivar_decl("a", a_ty);
        let v = int_param(b, "v");
        let target = b.ivar("a");
        let value = b.ident("v");
        let assign = b.assign(target, value);
        let setter = b.method("set_a", vec![v], None, assign);
        let read = b.ivar("a");
        let ret = b.ty("Integer");
        let getter = b.method("a", vec![], Some(ret), read);
        let body = b.seq(vec![a_ivar, setter, getter]);
        let class = b.class("Point", None, body);

        let receiver = b.ident("flags");
        let flagged = b.call(Some(receiver), "flagged", vec![]);
        let make = b.call(None, "Point", vec![]);
        let p = b.var("p", make);
        let recv = b.ident("p");
        let value = b.num(300);
        let set = b.call(Some(recv), "set_a", vec![value]);
        let recv = b.ident("p");
        let read = b.call(Some(recv), "a", vec![]);
        let total = b.binary(talon_ir::BinaryOp::Add, flagged, read);
        vec![import, class, main_returning(b, vec![p, set, total])]
    })
    .unwrap();
    let text = ir(&module);
    assert!(text.contains("%Point = type { i1 }"), "{text}");
    assert!(text.contains("define void @_Tc_Point_set_a(ptr %self, i32 %v)"), "{text}");
    assert_eq!(run_main(module), 300);
}
