use pretty_assertions::assert_eq;
use talon_diagnostic::CompileError;
use talon_ir::{BinaryOp, NodeId, StringInterner, SyntaxTree, TreeBuilder, UnaryOp};

use super::*;
use crate::{Target, TypeData, VarState};

struct Checked {
    interner: StringInterner,
    pool: Pool,
    result: CompileResult<TypedModule>,
}

impl Checked {
    fn module(&self) -> &TypedModule {
        match &self.result {
            Ok(module) => module,
            Err(err) => panic!("type calculation failed: {err}"),
        }
    }

    fn error(&self) -> &CompileError {
        match &self.result {
            Ok(_) => panic!("expected a type error"),
            Err(err) => err,
        }
    }

    fn type_of(&self, node: NodeId) -> Idx {
        self.module().table.type_of(InstanceId::ROOT, node).unwrap()
    }

    fn name(&self, s: &str) -> Name {
        self.interner.intern(s)
    }
}

/// Build a module from top-level statements and type it.
fn check(build: impl FnOnce(&mut TreeBuilder<'_>) -> Vec<NodeId>) -> Checked {
    let interner = StringInterner::new();
    let tree: SyntaxTree = {
        let mut b = TreeBuilder::new(&interner);
        let stmts = build(&mut b);
        let root = b.seq(stmts);
        b.finish(root)
    };
    let global = GlobalEnv::new(&interner);
    let mut pool = Pool::new();
    let mut resolver = NoImports;
    let result =
        TypeCalculator::new(&tree, &interner, &global, &mut pool, &mut resolver).calculate();
    Checked {
        interner,
        pool,
        result,
    }
}

/// `def name(a: Integer, b: Integer) -> Integer { a }`
fn two_int_function(b: &mut TreeBuilder<'_>, name: &str) -> NodeId {
    let a_ty = b.ty("Integer");
    let a = b.typed("a", a_ty);
    let b_ty = b.ty("Integer");
    let second = b.typed("b", b_ty);
    let ret = b.ty("Integer");
    let body = b.ident("a");
    b.method(name, vec![a, second], Some(ret), body)
}

// === Literals and locals ===

#[test]
fn literals_and_locals() {
    let mut nodes = Vec::new();
    let checked = check(|b| {
        let one = b.num(1);
        let x = b.var("x", one);
        let text = b.string("hi");
        let s = b.var("s", text);
        let lhs = b.ident("x");
        let two = b.num(2);
        let sum = b.binary(BinaryOp::Add, lhs, two);
        let lhs = b.ident("x");
        let three = b.num(3);
        let less = b.binary(BinaryOp::Lt, lhs, three);
        nodes = vec![x, s, sum, less];
        nodes.clone()
    });
    let types: Vec<Idx> = nodes.iter().map(|&n| checked.type_of(n)).collect();
    assert_eq!(
        types,
        vec![Idx::INTEGER, Idx::STRING, Idx::INTEGER, Idx::BOOLEAN]
    );
}

#[test]
fn unknown_identifier_is_uninitialized() {
    let checked = check(|b| vec![b.ident("ghost")]);
    assert_eq!(checked.error().to_string(), "unable to find 'ghost' in scope");
}

#[test]
fn operator_on_mismatched_operands_fails() {
    let checked = check(|b| {
        let one = b.num(1);
        let text = b.string("a");
        vec![b.binary(BinaryOp::Add, one, text)]
    });
    assert!(matches!(checked.error(), CompileError::TypeMismatch { .. }));
}

#[test]
fn declared_local_type_must_accept_value() {
    let checked = check(|b| {
        let ty = b.ty("Boolean");
        let one = b.num(1);
        vec![b.var_typed("flag", ty, one)]
    });
    assert!(matches!(checked.error(), CompileError::TypeMismatch { .. }));
}

#[test]
fn reassigning_a_local_keeps_its_type() {
    let checked = check(|b| {
        let one = b.num(1);
        let x = b.var("x", one);
        let target = b.ident("x");
        let yes = b.boolean(true);
        let assign = b.assign(target, yes);
        vec![x, assign]
    });
    assert!(matches!(checked.error(), CompileError::TypeMismatch { .. }));
}

#[test]
fn var_rejects_void_initializer() {
    let checked = check(|b| {
        let body = b.seq(vec![]);
        let touch = b.method("touch", vec![], None, body);
        let call = b.call(None, "touch", vec![]);
        let x = b.var("x", call);
        vec![touch, x]
    });
    assert_eq!(
        checked.error().to_string(),
        "'x' cannot be initialized with a value of type 'Void'"
    );
}

/// `class Counter { @n: Integer; def set(v: <param>) { @n = v } }`
fn counter_with_setter(b: &mut TreeBuilder<'_>, param: &str) -> NodeId {
    let ivar_ty = b.ty("Integer");
    let ivar = b.ivar_decl("n", ivar_ty);
    let param_ty = b.ty(param);
    let v = b.typed("v", param_ty);
    let target = b.ivar("n");
    let value = b.ident("v");
    let assign = b.assign(target, value);
    let set = b.method("set", vec![v], None, assign);
    let body = b.seq(vec![ivar, set]);
    b.class("Counter", None, body)
}

#[test]
fn ivar_assignment_must_convert() {
    let widened = check(|b| vec![counter_with_setter(b, "Boolean")]);
    widened.module();

    let checked = check(|b| vec![counter_with_setter(b, "String")]);
    assert_eq!(
        checked.error().to_string(),
        "cannot assign a 'String' to '@n' of type 'Integer'"
    );
}

// === Calls ===

#[test]
fn missing_arguments_report_counts() {
    let checked = check(|b| {
        let f = two_int_function(b, "f");
        let one = b.num(1);
        let call = b.call(None, "f", vec![one]);
        vec![f, call]
    });
    assert_eq!(
        checked.error().to_string(),
        "missing arguments to 'f' (needed 2, got 1)"
    );
}

#[test]
fn named_arguments_fill_their_parameters() {
    let mut call = None;
    let checked = check(|b| {
        let f = two_int_function(b, "f");
        let two = b.num(2);
        let named_b = b.named_arg("b", two);
        let one = b.num(1);
        let named_a = b.named_arg("a", one);
        let c = b.call(None, "f", vec![named_b, named_a]);
        call = Some(c);
        vec![f, c]
    });
    let call = call.unwrap();
    assert_eq!(checked.type_of(call), Idx::INTEGER);
    let target = checked.module().table.target(InstanceId::ROOT, call).unwrap();
    assert!(matches!(target, Target::Function(sig) if sig.name == checked.name("f")));
}

#[test]
fn positional_after_named_is_rejected() {
    let checked = check(|b| {
        let f = two_int_function(b, "f");
        let one = b.num(1);
        let named_a = b.named_arg("a", one);
        let two = b.num(2);
        let call = b.call(None, "f", vec![named_a, two]);
        vec![f, call]
    });
    assert!(matches!(checked.error(), CompileError::BadCall { .. }));
}

#[test]
fn argument_type_mismatch_names_the_position() {
    let checked = check(|b| {
        let f = two_int_function(b, "f");
        let one = b.num(1);
        let text = b.string("x");
        let call = b.call(None, "f", vec![one, text]);
        vec![f, call]
    });
    assert_eq!(
        checked.error().to_string(),
        "unable to pass a 'String' as a 'Integer' for argument 2 of 'f'"
    );
}

#[test]
fn boolean_widens_to_integer_argument() {
    let checked = check(|b| {
        let f = two_int_function(b, "f");
        let yes = b.boolean(true);
        let one = b.num(1);
        let call = b.call(None, "f", vec![yes, one]);
        vec![f, call]
    });
    assert!(checked.result.is_ok());
}

#[test]
fn external_declarations_take_extra_arguments() {
    let mut link = None;
    let checked = check(|b| {
        let fmt_ty = b.ty("Char");
        let fmt_ptr = b.pointer(fmt_ty);
        let fmt = b.typed("fmt", fmt_ptr);
        let rest = b.varargs();
        let ret = b.ty("Integer");
        let attr = b.import_attribute("printf");
        let dec = b.method_dec("print", vec![fmt, rest], Some(ret), Some(attr));
        let text = b.string("%d");
        let c_str = b.call(Some(text), "c_str", vec![]);
        let one = b.num(1);
        let two = b.num(2);
        let call = b.call(None, "print", vec![c_str, one, two]);
        link = Some(b.name("printf"));
        vec![dec, call]
    });
    let sig = checked
        .module()
        .namespace
        .function(checked.name("print"))
        .unwrap();
    assert_eq!(Some(sig.link_name), link);
    assert!(sig.varargs);
}

#[test]
fn reclaim_needs_a_heap_object() {
    let checked = check(|b| {
        let one = b.num(1);
        vec![b.call(None, "reclaim", vec![one])]
    });
    assert_eq!(checked.error().to_string(), "cannot reclaim a 'Integer'");
}

#[test]
fn stack_allocation_needs_a_construction() {
    let checked = check(|b| {
        let one = b.num(1);
        vec![b.unary(UnaryOp::Stack, one)]
    });
    assert!(matches!(checked.error(), CompileError::TypeMismatch { .. }));
}

// === Classes ===

/// `class Point { @x: Integer; def initialize(x: Integer) { @x = x }; def x -> Integer { @x } }`
fn point_class(b: &mut TreeBuilder<'_>) -> NodeId {
    let ivar_ty = b.ty("Integer");
    let ivar = b.ivar_decl("x", ivar_ty);
    let param_ty = b.ty("Integer");
    let param = b.typed("x", param_ty);
    let target = b.ivar("x");
    let value = b.ident("x");
    let assign = b.assign(target, value);
    let init = b.method("initialize", vec![param], None, assign);
    let ret = b.ty("Integer");
    let read = b.ivar("x");
    let getter = b.method("x", vec![], Some(ret), read);
    let body = b.seq(vec![ivar, init, getter]);
    b.class("Point", None, body)
}

#[test]
fn class_methods_get_mangled_link_names() {
    let mut point = None;
    let checked = check(|b| {
        let class = point_class(b);
        point = Some(class);
        let seven = b.num(7);
        let make = b.call(None, "Point", vec![seven]);
        let p = b.var("p", make);
        let recv = b.ident("p");
        let read = b.call(Some(recv), "x", vec![]);
        vec![class, p, read]
    });
    let ty = checked.type_of(point.unwrap());
    let class = checked.pool.reference(ty).unwrap();
    assert_eq!(class.ivars, vec![(checked.name("x"), Idx::INTEGER)]);
    let getter = &class.methods[&checked.name("x")];
    assert_eq!(checked.interner.lookup(getter.link_name), "_Tc_Point_x");
}

#[test]
fn constructor_arguments_follow_initialize() {
    let checked = check(|b| {
        let class = point_class(b);
        let make = b.call(None, "Point", vec![]);
        vec![class, make]
    });
    assert_eq!(
        checked.error().to_string(),
        "missing arguments to 'initialize' (needed 1, got 0)"
    );
}

#[test]
fn unknown_method_on_class_is_reported() {
    let checked = check(|b| {
        let class = point_class(b);
        let one = b.num(1);
        let make = b.call(None, "Point", vec![one]);
        let call = b.call(Some(make), "y", vec![]);
        vec![class, call]
    });
    assert_eq!(checked.error().to_string(), "'Point' has no method 'y'");
}

#[test]
fn included_trait_methods_are_walked_separately() {
    let mut include = None;
    let checked = check(|b| {
        let ret = b.ty("Integer");
        let one = b.num(1);
        let answer = b.method("answer", vec![], Some(ret), one);
        let trait_body = b.seq(vec![answer]);
        let greets = b.trait_def("Answers", trait_body);

        let inc_a = b.include("Answers");
        let body_a = b.seq(vec![inc_a]);
        let a = b.class("A", None, body_a);
        let inc_b = b.include("Answers");
        let body_b = b.seq(vec![inc_b]);
        let class_b = b.class("B", None, body_b);
        include = Some(inc_a);

        let make = b.call(None, "B", vec![]);
        let call = b.call(Some(make), "answer", vec![]);
        vec![greets, a, class_b, call]
    });
    let table = &checked.module().table;
    let instance = table.include(InstanceId::ROOT, include.unwrap()).unwrap();
    assert_ne!(instance, InstanceId::ROOT);
}

// === Generics ===

/// `class Box<T> { @value: T; def get -> T { @value } }`
fn box_class(b: &mut TreeBuilder<'_>) -> NodeId {
    let t = b.ty("T");
    let ivar = b.ivar_decl("value", t);
    let ret = b.ty("T");
    let read = b.ivar("value");
    let get = b.method("get", vec![], Some(ret), read);
    let body = b.seq(vec![ivar, get]);
    b.class("Box", Some("T"), body)
}

#[test]
fn generic_expansions_are_memoized() {
    let mut decl = None;
    let mut gets = Vec::new();
    let checked = check(|b| {
        let class = box_class(b);
        decl = Some(class);
        let mut stmts = vec![class];
        for arg in ["Integer", "Boolean", "Integer"] {
            let ty = b.ty(arg);
            let make = b.instance("Box", vec![ty], vec![]);
            let get = b.call(Some(make), "get", vec![]);
            gets.push(get);
            stmts.push(get);
        }
        stmts
    });
    let module = checked.module();
    let template = module.template_for(decl.unwrap()).unwrap();
    assert_eq!(template.expansions.len(), 2);
    assert_eq!(
        checked.pool.display(template.expansions[0].ty, &checked.interner),
        "Box<Integer>"
    );
    let returned: Vec<Idx> = gets.iter().map(|&g| checked.type_of(g)).collect();
    assert_eq!(returned, vec![Idx::INTEGER, Idx::BOOLEAN, Idx::INTEGER]);
}

#[test]
fn generic_type_without_arguments_is_rejected() {
    let checked = check(|b| {
        let class = box_class(b);
        let ty = b.ty("Box");
        let one = b.num(1);
        let local = b.var_typed("b", ty, one);
        vec![class, local]
    });
    assert_eq!(checked.error().to_string(), "'Box' needs a type argument");
}

// === Data types ===

/// `data Shape { Empty; Square(side: Integer) }`
fn shape_data(b: &mut TreeBuilder<'_>) -> NodeId {
    let empty = b.case_def("Empty", vec![]);
    let side_ty = b.ty("Integer");
    let side = b.typed("side", side_ty);
    let square = b.case_def("Square", vec![side]);
    b.data("Shape", None, vec![empty, square], None)
}

#[test]
fn case_binds_fields_of_the_matched_case() {
    let mut body = None;
    let checked = check(|b| {
        let shape = shape_data(b);
        let four = b.num(4);
        let make = b.call(None, "Square", vec![four]);
        let s = b.var("s", make);

        let subject = b.ident("s");
        let square = b.ty("Square");
        let pattern = b.pattern(square, None, &["side"]);
        let side = b.ident("side");
        body = Some(side);
        let arm = b.when(pattern, side);
        let empty = b.ty("Empty");
        let empty_pattern = b.pattern(empty, None, &[]);
        let zero = b.num(0);
        let empty_arm = b.when(empty_pattern, zero);
        let case = b.case(subject, vec![arm, empty_arm]);
        vec![shape, s, case]
    });
    assert_eq!(checked.type_of(body.unwrap()), Idx::INTEGER);
}

#[test]
fn singleton_case_is_a_value_of_its_data_type() {
    let mut decl = None;
    let mut value = None;
    let checked = check(|b| {
        let shape = shape_data(b);
        decl = Some(shape);
        let empty = b.ident("Empty");
        value = Some(empty);
        vec![shape, empty]
    });
    assert_eq!(
        checked.type_of(value.unwrap()),
        checked.type_of(decl.unwrap())
    );
}

#[test]
fn case_needs_data_or_dynamic() {
    let checked = check(|b| {
        let one = b.num(1);
        let ty = b.ty("Integer");
        let pattern = b.pattern(ty, None, &[]);
        let zero = b.num(0);
        let arm = b.when(pattern, zero);
        vec![b.case(one, vec![arm])]
    });
    assert!(matches!(checked.error(), CompileError::TypeMismatch { .. }));
}

#[test]
fn pattern_must_name_a_case_of_the_subject() {
    let checked = check(|b| {
        let shape = shape_data(b);
        let subject = b.ident("Empty");
        let ty = b.ty("Circle");
        let pattern = b.pattern(ty, None, &[]);
        let zero = b.num(0);
        let arm = b.when(pattern, zero);
        let case = b.case(subject, vec![arm]);
        vec![shape, case]
    });
    assert_eq!(
        checked.error().to_string(),
        "'Circle' is not a case of 'Shape'"
    );
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
fn lambda_parameters_unify_with_the_expected_closure() {
    let mut param = None;
    let checked = check(|b| {
        let apply = apply_function(b);
        let x = b.ident("x");
        param = Some(x);
        let use_x = b.ident("x");
        let one = b.num(1);
        let body = b.binary(BinaryOp::Add, use_x, one);
        let lambda = b.lambda(vec![x], &[], body);
        let call = b.call(None, "apply", vec![lambda]);
        vec![apply, call]
    });
    let ty = checked.type_of(param.unwrap());
    assert!(matches!(
        checked.pool.data(ty),
        TypeData::Var(VarState::Resolved(_))
    ));
    assert_eq!(checked.pool.resolve(ty), Idx::INTEGER);
}

#[test]
fn unused_lambda_keeps_an_open_parameter() {
    let mut param = None;
    let checked = check(|b| {
        let x = b.ident("x");
        param = Some(x);
        let body = b.ident("x");
        let lambda = b.lambda(vec![x], &[], body);
        vec![b.var("g", lambda)]
    });
    let ty = checked.type_of(param.unwrap());
    assert!(checked.pool.is_unresolved(ty));
    assert_eq!(
        checked
            .pool
            .resolve_strict(ty, &checked.interner)
            .unwrap_err()
            .to_string(),
        "Unable to intuit lambda argument type from usage"
    );
}

#[test]
fn captured_names_must_exist() {
    let checked = check(|b| {
        let body = b.num(1);
        let lambda = b.lambda(vec![], &["missing"], body);
        vec![lambda]
    });
    assert_eq!(
        checked.error().to_string(),
        "unable to find 'missing' in scope"
    );
}

// === Returns ===

#[test]
fn return_value_must_match_declaration() {
    let checked = check(|b| {
        let ret_ty = b.ty("Integer");
        let text = b.string("no");
        let ret = b.ret(Some(text));
        vec![b.method("f", vec![], Some(ret_ty), ret)]
    });
    assert_eq!(
        checked.error().to_string(),
        "cannot return a 'String' from a method returning 'Integer'"
    );
}

#[test]
fn void_method_cannot_return_a_value() {
    let checked = check(|b| {
        let one = b.num(1);
        let ret = b.ret(Some(one));
        vec![b.method("f", vec![], None, ret)]
    });
    assert!(matches!(checked.error(), CompileError::TypeMismatch { .. }));
}

// === Modules ===

#[test]
fn package_prefixes_link_names_except_main() {
    let checked = check(|b| {
        let pkg = b.package(&["geo"]);
        let ret = b.ty("Integer");
        let one = b.num(1);
        let area = b.method("area", vec![], Some(ret), one);
        let zero = b.num(0);
        let ret = b.ty("Integer");
        let main = b.method("main", vec![], Some(ret), zero);
        vec![pkg, area, main]
    });
    let ns = &checked.module().namespace;
    let link = |name: &str| checked.interner.lookup(ns.function(checked.name(name)).unwrap().link_name);
    assert_eq!(link("area"), "geo.area");
    assert_eq!(link("main"), "main");
}

#[test]
fn imports_without_a_resolver_fail() {
    let checked = check(|b| vec![b.import(&["util", "math"])]);
    assert_eq!(
        checked.error().to_string(),
        "unable to find 'util.math' to import"
    );
}
