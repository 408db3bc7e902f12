use std::path::PathBuf;

use pretty_assertions::assert_eq;

use super::CompileOptions;

fn options_from(vars: &[(&str, &str)]) -> CompileOptions {
    CompileOptions::from_lookup(|key| {
        vars.iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| (*v).to_owned())
    })
}

#[test]
fn defaults_without_environment() {
    let options = options_from(&[]);
    assert_eq!(options, CompileOptions::default());
    assert_eq!(options.import_paths, vec![PathBuf::from("lib")]);
    assert_eq!(options.extension, "tln");
    assert!(!options.dump_ir);
}

#[test]
fn debug_flag_needs_a_value() {
    assert!(options_from(&[("TALON_DEBUG", "1")]).dump_ir);
    assert!(!options_from(&[("TALON_DEBUG", "")]).dump_ir);
}

#[test]
fn import_path_is_split_on_colons() {
    let options = options_from(&[("TALON_PATH", "std:vendor/pkg::")]);
    assert_eq!(
        options.import_paths,
        vec![PathBuf::from("std"), PathBuf::from("vendor/pkg")]
    );
    assert_eq!(options_from(&[("TALON_PATH", ":")]).import_paths, vec![PathBuf::from("lib")]);
}

#[test]
fn builders_extend_the_defaults() {
    let options = CompileOptions::default()
        .with_module_name("app")
        .with_import_path("vendor");
    assert_eq!(options.module_name, "app");
    assert_eq!(
        options.import_paths,
        vec![PathBuf::from("lib"), PathBuf::from("vendor")]
    );
}
