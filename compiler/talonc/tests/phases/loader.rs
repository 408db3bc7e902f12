//! Imports read from disk through `FsLoader`.

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use talon_diagnostic::{CompileError, CompileResult};
use talon_ir::{StringInterner, SyntaxTree, TreeBuilder};
use talon_llvm::Context;
use talonc::{compile, CompileOptions, FsLoader, Parser, SourceLoader};

use crate::common::{main_returning, run_main};

/// Reads a file holding one integer `n` as `def answer -> Integer { n }`.
struct AnswerParser;

impl Parser for AnswerParser {
    fn parse(&self, source: &str, interner: &StringInterner) -> CompileResult<SyntaxTree> {
        let n: i64 = source.trim().parse().map_err(|_| {
            CompileError::internal(format!("not an integer: {source:?}"))
        })?;
        let mut b = TreeBuilder::new(interner);
        let value = b.num(n);
        let ret = b.ty("Integer");
        let answer = b.method("answer", vec![], Some(ret), value);
        let root = b.seq(vec![answer]);
        Ok(b.finish(root))
    }
}

fn write(root: &Path, relative: &str, contents: &str) {
    let file = root.join(relative);
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(file, contents).unwrap();
}

fn options_for(roots: &[&Path]) -> CompileOptions {
    CompileOptions {
        import_paths: roots.iter().map(|r| r.to_path_buf()).collect(),
        ..CompileOptions::default()
    }
}

#[test]
fn locate_searches_roots_in_order() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    write(second.path(), "util/answer.tln", "1");
    write(second.path(), "util/other.tln", "2");
    write(first.path(), "util/other.tln", "3");

    let loader = FsLoader::new(AnswerParser, &options_for(&[first.path(), second.path()]));
    assert_eq!(
        loader.locate(&["util", "answer"]),
        Some(second.path().join("util/answer.tln"))
    );
    assert_eq!(
        loader.locate(&["util", "other"]),
        Some(first.path().join("util/other.tln"))
    );
    assert_eq!(loader.locate(&["util", "missing"]), None);
}

#[test]
fn other_extensions_are_not_imports() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "util/answer.txt", "1");
    let loader = FsLoader::new(AnswerParser, &options_for(&[dir.path()]));
    assert_eq!(loader.locate(&["util", "answer"]), None);

    let interner = StringInterner::new();
    let err = loader.load(&["util", "answer"], &interner).unwrap_err();
    assert_eq!(
        err,
        CompileError::ImportNotFound {
            path: "util.answer".to_owned()
        }
    );
}

#[test]
fn imported_file_is_parsed_and_compiled() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "util/answer.tln", "42\n");
    let options = options_for(&[dir.path()]);
    let loader = FsLoader::new(AnswerParser, &options);

    let ctx = Context::create();
    let interner = StringInterner::new();
    let mut b = TreeBuilder::new(&interner);
    let import = b.import(&["util", "answer"]);
    let receiver = b.ident("answer");
    let call = b.call(Some(receiver), "answer", vec![]);
    let main = main_returning(&mut b, vec![call]);
    let root = b.seq(vec![import, main]);
    let tree = b.finish(root);

    let module = compile(&ctx, &tree, &interner, &loader, &options).unwrap();
    assert_eq!(run_main(module), 42);
}

#[test]
fn parse_errors_abandon_the_compilation() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "broken.tln", "forty-two");
    let options = options_for(&[dir.path()]);
    let loader = FsLoader::new(AnswerParser, &options);

    let ctx = Context::create();
    let interner = StringInterner::new();
    let mut b = TreeBuilder::new(&interner);
    let import = b.import(&["broken"]);
    let zero = b.num(0);
    let main = main_returning(&mut b, vec![zero]);
    let root = b.seq(vec![import, main]);
    let tree = b.finish(root);

    let err = compile(&ctx, &tree, &interner, &loader, &options).unwrap_err();
    assert!(matches!(err, CompileError::Internal { .. }), "{err}");
}
