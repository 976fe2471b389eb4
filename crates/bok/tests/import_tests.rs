//! Import loader tests: file resolution, namespacing, and the module
//! boundary.

use std::fs;

use bok::{Error, Machine, Value};
use pretty_assertions::assert_eq;

fn write_module(dir: &std::path::Path, name: &str, source: &str) {
    fs::write(dir.join(name), source).unwrap();
}

#[test]
fn test_import_injects_prefixed_definitions() {
    let dir = tempfile::tempdir().unwrap();
    write_module(dir.path(), "geometry.bok", "(sq dup *) (double 2 *)");

    let mut machine = Machine::new();
    machine.add_lib_path(dir.path());
    machine
        .run_source("import 'geometry' 3 geometry.sq println")
        .unwrap();
    assert_eq!(machine.take_output(), "9\n");

    machine.run_source("5 geometry.double").unwrap();
    assert_eq!(machine.stack(), &[Value::Int(10)]);
}

#[test]
fn test_import_by_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    write_module(dir.path(), "util.bok", "(triple 3 *)");

    let path = dir.path().join("util.bok");
    let mut machine = Machine::new();
    machine
        .run_source(&format!("import '{}' 2 util.triple", path.display()))
        .unwrap();
    assert_eq!(machine.stack(), &[Value::Int(6)]);
}

#[test]
fn test_import_appends_the_suffix() {
    let dir = tempfile::tempdir().unwrap();
    write_module(dir.path(), "m.bok", "(one 1)");

    let mut machine = Machine::new();
    machine.add_lib_path(dir.path());
    // Both spellings resolve to the same file and module name.
    machine.run_source("import 'm' import 'm.bok' m.one").unwrap();
    assert_eq!(machine.stack(), &[Value::Int(1)]);
}

#[test]
fn test_import_discards_top_level_code() {
    let dir = tempfile::tempdir().unwrap();
    write_module(dir.path(), "noisy.bok", "1 2 3 (word 9)");

    let mut machine = Machine::new();
    machine.add_lib_path(dir.path());
    machine.run_source("import 'noisy'").unwrap();
    // The imported file's own pushes never reach this stack.
    assert_eq!(machine.stack(), &[] as &[Value]);
    machine.run_source("noisy.word").unwrap();
    assert_eq!(machine.stack(), &[Value::Int(9)]);
}

#[test]
fn test_import_does_not_reexport_builtins() {
    let dir = tempfile::tempdir().unwrap();
    write_module(dir.path(), "tiny.bok", "(only 1)");

    let mut machine = Machine::new();
    machine.add_lib_path(dir.path());
    machine.run_source("import 'tiny'").unwrap();

    let names = machine.word_names();
    assert!(names.iter().any(|n| n == "tiny.only"));
    assert!(!names.iter().any(|n| n == "tiny.dup"));
    assert!(!names.iter().any(|n| n == "only"));
}

#[test]
fn test_imports_are_not_transitive() {
    let dir = tempfile::tempdir().unwrap();
    write_module(dir.path(), "base.bok", "(unit 1)");
    write_module(dir.path(), "layer.bok", "import 'base' (two base.unit 1 +)");

    let mut machine = Machine::new();
    machine.add_lib_path(dir.path());
    machine.run_source("import 'layer'").unwrap();

    machine.run_source("layer.two").unwrap();
    assert_eq!(machine.stack(), &[Value::Int(2)]);
    // The inner import stays inside the imported module's dictionary.
    let names = machine.word_names();
    assert!(!names.iter().any(|n| n == "base.unit"));
}

#[test]
fn test_missing_import_is_an_error() {
    let mut machine = Machine::new();
    assert!(matches!(
        machine.run_source("import 'no_such_module'"),
        Err(Error::Argument(_))
    ));
}

#[test]
fn test_imported_words_keep_docstrings() {
    let dir = tempfile::tempdir().unwrap();
    write_module(dir.path(), "doc.bok", "(sq d'( x -- x*x )' dup *)");

    let mut machine = Machine::new();
    machine.add_lib_path(dir.path());
    machine.run_source("import 'doc' [doc.sq] help").unwrap();
    assert_eq!(machine.take_output(), "( x -- x*x )\n");
}
