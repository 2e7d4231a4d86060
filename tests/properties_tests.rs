//! Behaviour every pass must keep regardless of input shape

mod common;

use common::{first_class, init_logging, load, normalized, print, table};
use retarget::rewrite::{
    add_missing_abstract_methods, remove_unnecessary_overrides, remove_unnecessary_super_calls, run_pass,
    AbstractMemberSet, RewriteContext,
};
use retarget::types::TypeTable;
use retarget::Config;

fn add_missing(source: &str, table: &TypeTable) -> (String, usize) {
    let (unit, table) = load(source, table);
    let config = Config::default();
    let ctx = RewriteContext::new(&table, &config);
    let (unit, changes) = run_pass(unit, &ctx, add_missing_abstract_methods);
    (print(&unit), changes)
}

#[test]
fn stubs_inherited_abstract_method_in_default_package() {
    init_logging();
    let source = r#"
abstract class AbstractParent {
    public abstract void doSomething(String input);
}

class Child extends AbstractParent {
}
"#;
    let (printed, changes) = add_missing(source, &TypeTable::new());
    assert_eq!(changes, 1);
    let lines = normalized(&printed);
    let at = lines
        .iter()
        .position(|l| l == "public void doSomething(java.lang.String input) {")
        .unwrap_or_else(|| panic!("{}", printed));
    assert_eq!(lines[at - 1], "@Override");
    assert_eq!(lines[at + 1], "throw new java.lang.UnsupportedOperationException();");
    // the abstract parent itself is left alone
    assert_eq!(printed.matches("doSomething").count(), 2);
}

#[test]
fn stubs_members_of_every_interface() {
    let source = r#"
interface Reader {
    String read();
}

interface Writer {
    void write(String text);
}

class Pipe implements Reader, Writer {
}
"#;
    let (printed, changes) = add_missing(source, &TypeTable::new());
    assert_eq!(changes, 2);
    assert!(printed.contains("public java.lang.String read() {"), "{}", printed);
    assert!(printed.contains("public void write(java.lang.String text) {"));
}

#[test]
fn implemented_members_are_not_stubbed_again() {
    let source = r#"
abstract class AbstractParent {
    public abstract void doSomething(String input);
    public abstract int count();
}

class Child extends AbstractParent {
    @Override
    public void doSomething(String input) {
        System.out.println(input);
    }
}
"#;
    let (printed, changes) = add_missing(source, &TypeTable::new());
    assert_eq!(changes, 1);
    assert_eq!(printed.matches("public void doSomething(").count(), 1);
    assert!(printed.contains("public int count() {"));
}

#[test]
fn adding_missing_methods_is_idempotent() {
    let table = table(&["package lib; public interface Shape { double area(); String label(); }"]);
    let source = "package app;\n\nimport lib.Shape;\n\npublic class Square implements Shape {\n}\n";
    let (unit, table) = load(source, &table);
    let config = Config::default();
    let ctx = RewriteContext::new(&table, &config);

    let (unit, first) = run_pass(unit, &ctx, add_missing_abstract_methods);
    assert_eq!(first, 2);
    let once = print(&unit);
    let (unit, second) = run_pass(unit, &ctx, add_missing_abstract_methods);
    assert_eq!(second, 0);
    assert_eq!(print(&unit), once);
}

#[test]
fn generic_parent_stub_uses_the_type_argument() {
    let table = table(&[r#"
package lib;

public abstract class Parent<T> {
    public abstract T getValue();
    public abstract void setValue(T value);
}
"#]);
    let source = "package app;\n\nimport lib.Parent;\n\npublic class Child extends Parent<String> {\n}\n";
    let (printed, changes) = add_missing(source, &table);
    assert_eq!(changes, 2);
    assert!(printed.contains("public java.lang.String getValue() {"), "{}", printed);
    assert!(printed.contains("public void setValue(java.lang.String value) {"));
    assert!(!printed.contains(" T "));
}

#[test]
fn generic_subclass_keeps_its_own_type_variable() {
    let table = table(&["package lib; public abstract class Parent<T> { public abstract T getValue(); }"]);
    let source = "package app;\n\nimport lib.Parent;\n\npublic class Holder<E> extends Parent<E> {\n}\n";
    let (printed, changes) = add_missing(source, &table);
    assert_eq!(changes, 1);
    assert!(printed.contains("public E getValue() {"), "{}", printed);
}

#[test]
fn no_abstract_member_is_left_missing() {
    let table = table(&[
        "package lib; public interface Named { String name(); }",
        "package lib; public abstract class Base implements Named { public abstract void run(); public void stop() { } }",
    ]);
    let source = r#"
package app;

import lib.Base;

public class Job extends Base {
    public void run() {
    }
}
"#;
    let (unit, table) = load(source, &table);
    let config = Config::default();
    let ctx = RewriteContext::new(&table, &config);
    let (unit, changes) = run_pass(unit, &ctx, add_missing_abstract_methods);
    assert_eq!(changes, 1);

    let class = first_class(&unit);
    let members = AbstractMemberSet::collect(class.resolved.as_ref().unwrap(), &table);
    assert!(members.complete);
    assert_eq!(members.len(), 2);
    assert!(members.missing_from(class, &table).is_empty());
}

#[test]
fn unknown_hierarchy_keeps_markers_and_super_calls() {
    let source = r#"
package app;

public class Orphan extends Missing {
    @Override
    public void start() {
        super.start();
        System.out.println("started");
    }
}
"#;
    let (unit, table) = load(source, &TypeTable::new());
    let before = print(&unit);
    let config = Config::default();
    let ctx = RewriteContext::new(&table, &config);

    let (unit, markers) = run_pass(unit, &ctx, remove_unnecessary_overrides);
    let (unit, calls) = run_pass(unit, &ctx, remove_unnecessary_super_calls);
    let (unit, stubs) = run_pass(unit, &ctx, add_missing_abstract_methods);
    assert_eq!((markers, calls, stubs), (0, 0, 0));
    assert_eq!(print(&unit), before);
}

#[test]
fn anonymous_bodies_follow_the_anonymous_class_setting() {
    let source = r#"
package app;

public class Launcher {
    public void launch() {
        Runnable task = new Runnable() {
            @Override
            public void run() {
            }

            @Override
            public void cleanup() {
            }
        };
    }
}
"#;
    let (unit, table) = load(source, &TypeTable::new());

    let config = Config::default();
    let ctx = RewriteContext::new(&table, &config);
    let (stripped, removed) = run_pass(unit.clone(), &ctx, remove_unnecessary_overrides);
    assert_eq!(removed, 1);
    assert_eq!(print(&stripped).matches("@Override").count(), 1);

    let config = Config::default().with_ignore_anonymous_class_methods(true);
    let ctx = RewriteContext::new(&table, &config);
    let (_, removed) = run_pass(unit, &ctx, remove_unnecessary_overrides);
    assert_eq!(removed, 0);
}
