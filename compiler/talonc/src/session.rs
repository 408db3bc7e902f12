//! One compilation: a root module and everything it imports.
//!
//! Every module is typed against the same [`Pool`] and [`GlobalEnv`] and
//! generated into the same [`CodegenContext`], so an import's functions
//! and layouts are already declared when the importer's code refers to
//! them. Each import path is compiled once per session.

use rustc_hash::FxHashMap;
use talon_diagnostic::{CompileError, CompileResult};
use talon_ir::{Name, StringInterner, SyntaxTree};
use talon_llvm::{CodeGenerator, CodegenContext, Context, Module};
use talon_types::{
    GlobalEnv, ImportResolver, ModuleId, ModuleNamespace, Pool, TypeCalculator, TypedModule,
};

use crate::SourceLoader;

pub struct Session<'a, 'ctx> {
    interner: &'a StringInterner,
    global: &'a GlobalEnv,
    loader: &'a dyn SourceLoader,
    cx: CodegenContext<'ctx>,
    /// Namespaces of compiled imports, indexed by [`ModuleId`].
    modules: Vec<ModuleNamespace>,
    by_path: FxHashMap<String, ModuleId>,
    /// Imports being compiled, outermost first.
    in_progress: Vec<String>,
}

impl<'a, 'ctx> Session<'a, 'ctx> {
    /// Start a session whose module lives in `context`.
    ///
    /// Fails when LLVM cannot describe the host target.
    pub fn new(
        context: &'ctx Context,
        interner: &'a StringInterner,
        global: &'a GlobalEnv,
        loader: &'a dyn SourceLoader,
        module_name: &str,
    ) -> CompileResult<Self> {
        Ok(Session {
            interner,
            global,
            loader,
            cx: CodegenContext::new(context, module_name)?,
            modules: Vec::new(),
            by_path: FxHashMap::default(),
            in_progress: Vec::new(),
        })
    }

    /// Type `tree` and generate it into the session's module.
    ///
    /// Imports met by the type calculator are compiled first, recursively,
    /// through this session.
    pub fn compile_unit(&mut self, tree: &SyntaxTree, pool: &mut Pool) -> CompileResult<TypedModule> {
        let (interner, global) = (self.interner, self.global);
        let typed = TypeCalculator::new(tree, interner, global, pool, self).calculate()?;
        CodeGenerator::new(tree, interner, pool, &typed, &mut self.cx).generate()?;
        Ok(typed)
    }

    /// Number of imports compiled so far.
    pub fn import_count(&self) -> usize {
        self.modules.len()
    }

    /// The generated module, checked.
    ///
    /// With `dump_ir` the module text goes to stderr before any check, so a
    /// module that fails verification can still be inspected.
    pub fn finish(self, dump_ir: bool) -> CompileResult<Module<'ctx>> {
        let builder_errors = self.cx.codegen_error_count();
        let module = self.cx.into_module();
        let name = module.get_name().to_string_lossy().into_owned();
        if dump_ir {
            eprintln!("{}", module.print_to_string().to_string());
        }
        if builder_errors > 0 {
            return Err(CompileError::internal(format!(
                "{builder_errors} invalid IR builder operation(s) in '{name}'"
            )));
        }
        module
            .verify()
            .map_err(|err| CompileError::internal(err.to_string()))?;
        tracing::debug!(
            module = %name,
            functions = module.get_functions().count(),
            "module verified"
        );
        Ok(module)
    }
}

impl ImportResolver for Session<'_, '_> {
    fn resolve_import(
        &mut self,
        pool: &mut Pool,
        path: &[Name],
        dotted: &str,
    ) -> CompileResult<ModuleId> {
        if let Some(&id) = self.by_path.get(dotted) {
            return Ok(id);
        }
        if self.in_progress.iter().any(|p| p == dotted) {
            return Err(CompileError::ImportCycle {
                path: dotted.to_owned(),
            });
        }

        let segments: Vec<&str> = path.iter().map(|&p| self.interner.lookup(p)).collect();
        let tree = self.loader.load(&segments, self.interner)?;
        tracing::debug!(module = dotted, "compiling import");
        self.in_progress.push(dotted.to_owned());
        let typed = self.compile_unit(&tree, pool);
        self.in_progress.pop();
        let typed = typed?;

        let raw = u32::try_from(self.modules.len())
            .unwrap_or_else(|_| panic!("module count {} exceeds u32", self.modules.len()));
        let id = ModuleId::from_raw(raw);
        self.modules.push(typed.namespace);
        self.by_path.insert(dotted.to_owned(), id);
        Ok(id)
    }

    fn namespace(&self, module: ModuleId) -> Option<&ModuleNamespace> {
        self.modules.get(module.index())
    }
}
