//! Type tables seeded from a directory of declaration sources

mod common;

use common::{init_logging, load, print};
use retarget::rewrite::{retarget_unit, RetargetOptions, RewriteContext};
use retarget::types::{TypeSystem, TypeTable};
use retarget::Config;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, source: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, source).unwrap();
}

fn classpath() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "lib/Old.java",
        "package lib;\n\npublic abstract class Old {\n    public void describe() { }\n}\n",
    );
    write(
        dir.path(),
        "lib/deep/New.java",
        "package lib.deep;\n\npublic abstract class New {\n    public abstract int size();\n}\n",
    );
    write(dir.path(), "lib/Broken.java", "package lib; public class Broken {");
    write(dir.path(), "lib/notes.txt", "not java");
    dir
}

#[test]
fn load_dir_indexes_nested_sources_and_skips_broken_ones() {
    init_logging();
    let dir = classpath();
    let table = TypeTable::load_dir(dir.path()).unwrap();

    assert!(table.contains("lib.Old"));
    assert!(table.contains("lib.deep.New"));
    assert!(!table.contains("lib.Broken"));
    // the seeded java.lang types are still there
    assert!(table.contains("java.lang.Object"));

    let new = table.class_info("lib.deep.New").unwrap();
    assert!(new.ty.is_abstract);
    assert_eq!(new.methods_named("size").count(), 1);
}

#[test]
fn load_dir_of_missing_directory_yields_seed_table() {
    let dir = TempDir::new().unwrap();
    let table = TypeTable::load_dir(dir.path().join("absent")).unwrap();
    assert_eq!(table.len(), TypeTable::new().len());
}

#[test]
fn retarget_against_a_classpath_directory() {
    let dir = classpath();
    let table = TypeTable::load_dir(dir.path()).unwrap();
    let source = r#"
package app;

import lib.Old;

public class Widget extends Old {
}
"#;
    let (unit, table) = load(source, &table);
    let config = Config::default().with_classpath(dir.path());
    let ctx = RewriteContext::new(&table, &config);
    let options = RetargetOptions {
        add_abstract_methods: true,
        ..RetargetOptions::default()
    };

    let (unit, report) = retarget_unit(unit, "lib.Old", "lib.deep.New", options, &ctx);
    assert_eq!(report.find("app.Widget").unwrap().stubs_added, 1);
    let printed = print(&unit);
    assert!(printed.contains("import lib.deep.New;"), "{}", printed);
    assert!(printed.contains("public class Widget extends New {"));
    assert!(printed.contains("public int size() {"));
}
