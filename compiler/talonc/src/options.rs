//! Driver configuration.

use std::path::PathBuf;

/// How a compilation session finds imports and what it reports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileOptions {
    /// `; ModuleID` of the generated module.
    pub module_name: String,
    /// Roots searched, in order, for `import a.b` as `a/b.<extension>`.
    pub import_paths: Vec<PathBuf>,
    pub extension: String,
    /// Write the generated IR to stderr before it is verified.
    pub dump_ir: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            module_name: "main".to_owned(),
            import_paths: vec![PathBuf::from("lib")],
            extension: "tln".to_owned(),
            dump_ir: false,
        }
    }
}

impl CompileOptions {
    /// Defaults overridden by `TALON_DEBUG` and `TALON_PATH`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    ///
    /// Any non-empty `TALON_DEBUG` turns on the IR dump. `TALON_PATH` is a
    /// colon-separated list of import roots replacing the default `lib`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut options = CompileOptions::default();
        if let Some(debug) = lookup("TALON_DEBUG") {
            options.dump_ir = !debug.is_empty();
        }
        if let Some(paths) = lookup("TALON_PATH") {
            let paths: Vec<PathBuf> = paths
                .split(':')
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
                .collect();
            if !paths.is_empty() {
                options.import_paths = paths;
            }
        }
        options
    }

    #[must_use]
    pub fn with_module_name(mut self, name: impl Into<String>) -> Self {
        self.module_name = name.into();
        self
    }

    #[must_use]
    pub fn with_import_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.import_paths.push(path.into());
        self
    }
}
