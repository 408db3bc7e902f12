//! Where imported modules come from.
//!
//! Parsing is outside this workspace, so a [`SourceLoader`] hands back
//! finished syntax trees. [`FsLoader`] reads files from the import roots
//! and delegates to a [`Parser`]; [`MemoryLoader`] builds trees in memory.

use std::fs;
use std::path::PathBuf;

use rustc_hash::FxHashMap;
use talon_diagnostic::{CompileError, CompileResult};
use talon_ir::{NodeId, StringInterner, SyntaxTree, TreeBuilder};

use crate::CompileOptions;

/// Turns source text into a syntax tree.
pub trait Parser {
    fn parse(&self, source: &str, interner: &StringInterner) -> CompileResult<SyntaxTree>;
}

/// Produces the tree of the module imported as `path` (`["util", "math"]`
/// for `import util.math`).
pub trait SourceLoader {
    fn load(&self, path: &[&str], interner: &StringInterner) -> CompileResult<SyntaxTree>;
}

/// Loads `a/b.<extension>` from the first import root that has it.
pub struct FsLoader<P> {
    parser: P,
    import_paths: Vec<PathBuf>,
    extension: String,
}

impl<P: Parser> FsLoader<P> {
    pub fn new(parser: P, options: &CompileOptions) -> Self {
        FsLoader {
            parser,
            import_paths: options.import_paths.clone(),
            extension: options.extension.clone(),
        }
    }

    /// The file `path` resolves to, if any root holds it.
    pub fn locate(&self, path: &[&str]) -> Option<PathBuf> {
        self.import_paths.iter().find_map(|root| {
            let mut file = root.clone();
            file.extend(path);
            file.set_extension(&self.extension);
            file.is_file().then_some(file)
        })
    }
}

impl<P: Parser> SourceLoader for FsLoader<P> {
    fn load(&self, path: &[&str], interner: &StringInterner) -> CompileResult<SyntaxTree> {
        let dotted = path.join(".");
        let file = self
            .locate(path)
            .ok_or_else(|| CompileError::ImportNotFound {
                path: dotted.clone(),
            })?;
        tracing::debug!(file = %file.display(), "loading import");
        let source = fs::read_to_string(&file).map_err(|err| {
            tracing::debug!(file = %file.display(), error = %err, "unreadable import");
            CompileError::ImportNotFound { path: dotted }
        })?;
        self.parser.parse(&source, interner)
    }
}

type BuildFn = Box<dyn Fn(&mut TreeBuilder<'_>) -> Vec<NodeId>>;

/// Modules registered by dotted path, each built from top-level statements.
#[derive(Default)]
pub struct MemoryLoader {
    modules: FxHashMap<String, BuildFn>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_module(
        mut self,
        dotted: &str,
        build: impl Fn(&mut TreeBuilder<'_>) -> Vec<NodeId> + 'static,
    ) -> Self {
        self.modules.insert(dotted.to_owned(), Box::new(build));
        self
    }
}

impl SourceLoader for MemoryLoader {
    fn load(&self, path: &[&str], interner: &StringInterner) -> CompileResult<SyntaxTree> {
        let dotted = path.join(".");
        let build = self
            .modules
            .get(&dotted)
            .ok_or(CompileError::ImportNotFound { path: dotted })?;
        let mut builder = TreeBuilder::new(interner);
        let stmts = build(&mut builder);
        let root = builder.seq(stmts);
        Ok(builder.finish(root))
    }
}
