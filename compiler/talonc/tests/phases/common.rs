//! Shared helpers for the phase tests.

use talon_diagnostic::CompileResult;
use talon_ir::{NodeId, StringInterner, TreeBuilder};
use talon_llvm::{Context, Evaluator, Module};
use talonc::{compile, CompileOptions, MemoryLoader, SourceLoader};

/// Compile the module made of `build`'s statements, importing through `loader`.
pub fn compile_with<'ctx>(
    context: &'ctx Context,
    loader: &dyn SourceLoader,
    build: impl FnOnce(&mut TreeBuilder<'_>) -> Vec<NodeId>,
) -> CompileResult<Module<'ctx>> {
    let interner = StringInterner::new();
    let mut b = TreeBuilder::new(&interner);
    let stmts = build(&mut b);
    let root = b.seq(stmts);
    let tree = b.finish(root);
    compile(context, &tree, &interner, loader, &CompileOptions::default())
}

/// Compile a module without imports, panicking on errors.
pub fn compiled(
    context: &Context,
    build: impl FnOnce(&mut TreeBuilder<'_>) -> Vec<NodeId>,
) -> Module<'_> {
    compile_with(context, &MemoryLoader::new(), build).unwrap_or_else(|err| panic!("{err}"))
}

/// The module as LLVM assembly.
pub fn ir(module: &Module<'_>) -> String {
    module.print_to_string().to_string()
}

/// Run `main` in the JIT and return its Integer result.
pub fn run_main(module: Module<'_>) -> i32 {
    Evaluator::new(module).unwrap().run_i32("main").unwrap()
}

/// `def main -> Integer { body }`
pub fn main_returning(b: &mut TreeBuilder<'_>, body: Vec<NodeId>) -> NodeId {
    let ret = b.ty("Integer");
    let body = b.seq(body);
    b.method("main", vec![], Some(ret), body)
}

/// `name: Integer`
pub fn int_param(b: &mut TreeBuilder<'_>, name: &str) -> NodeId {
    let ty = b.ty("Integer");
    b.typed(name, ty)
}

/// `def square(n: Integer) -> Integer { n * n }`
pub fn square_function(b: &mut TreeBuilder<'_>) -> NodeId {
    let n = int_param(b, "n");
    let lhs = b.ident("n");
    let rhs = b.ident("n");
    let body = b.binary(talon_ir::BinaryOp::Mul, lhs, rhs);
    let ret = b.ty("Integer");
    b.method("square", vec![n], Some(ret), body)
}
