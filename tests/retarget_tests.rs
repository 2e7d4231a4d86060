mod common;

use common::{first_class, init_logging, load, normalized, print, table};
use retarget::rewrite::{
    remove_supertypes_unit, retarget_unit, RetargetOptions, RewriteContext, SupertypeFilter,
};
use retarget::types::JavaType;
use retarget::Config;

const OLD: &str = r#"
package lib;

public abstract class Old {
    public void describe() { }
    public String label() { return "old"; }
}
"#;

const NEW: &str = r#"
package lib;

public abstract class New {
    public abstract String name();
}
"#;

#[test]
fn retarget_repairs_overrides_stubs_and_super_calls() {
    init_logging();
    let table = table(&[OLD, NEW]);
    let source = r#"
package app;

import lib.Old;

public class A extends Old {
    @Override
    public void describe() {
        super.describe();
        System.out.println("a");
    }

    @Override
    public String label() {
        return super.label();
    }
}
"#;
    let (unit, table) = load(source, &table);
    let config = Config::default();
    let ctx = RewriteContext::new(&table, &config);
    let options = RetargetOptions {
        add_abstract_methods: true,
        remove_unnecessary_overrides: true,
        ..RetargetOptions::default()
    };

    let (unit, report) = retarget_unit(unit, "lib.Old", "lib.New", options, &ctx);
    let outcome = report.find("app.A").expect("A was retargeted");
    assert_eq!(outcome.markers_removed, 2);
    assert_eq!(outcome.stubs_added, 1);
    assert_eq!(outcome.calls_removed, 1);

    let printed = print(&unit);
    assert_eq!(
        normalized(&printed),
        vec![
            "package app;",
            "import lib.New;",
            "public class A extends New {",
            "public void describe() {",
            "System.out.println(\"a\");",
            "}",
            "public String label() {",
            "return super.label();",
            "}",
            "@Override",
            "public String name() {",
            "throw new UnsupportedOperationException();",
            "}",
            "}",
        ],
        "{}",
        printed
    );
}

#[test]
fn retarget_updates_the_resolved_hierarchy() {
    let table = table(&[OLD, NEW]);
    let (unit, table) = load(
        "package app; import lib.Old; public class A extends Old { }",
        &table,
    );
    let config = Config::default().with_shorten_references(false);
    let ctx = RewriteContext::new(&table, &config);

    let (unit, report) = retarget_unit(unit, "lib.Old", "lib.New", RetargetOptions::default(), &ctx);
    assert_eq!(report.retargeted(), 1);
    let class = first_class(&unit);
    assert_eq!(class.extends.as_ref().unwrap().name, "lib.New");
    assert_eq!(
        class.resolved.as_ref().unwrap().supertype,
        Some(JavaType::named("lib.New"))
    );
    // the old import is unused either way
    assert!(unit.imports.is_empty());
}

#[test]
fn retarget_leaves_other_units_alone() {
    let table = table(&[OLD, NEW]);
    let source = "package app;\n\npublic class B {\n    @Override\n    public String toString() {\n        return super.toString();\n    }\n}\n";
    let (unit, table) = load(source, &table);
    let before = print(&unit);
    let config = Config::default();
    let ctx = RewriteContext::new(&table, &config);

    let (unit, report) = retarget_unit(unit, "lib.Old", "lib.New", RetargetOptions::all_enabled(), &ctx);
    assert!(report.is_empty());
    assert_eq!(print(&unit), before);
}

#[test]
fn super_constructor_call_is_removed_in_place() {
    let table = table(&[
        "package lib; public class Base { public Base(String name) { } }",
        "package lib; public class Plain { }",
    ]);
    let source = r#"
package app;

import lib.Base;

public class B extends Base {
    public B(String name) {
        super(name);
        System.out.println("first");
        System.out.println(name);
    }
}
"#;
    let (unit, table) = load(source, &table);
    let config = Config::default();
    let ctx = RewriteContext::new(&table, &config);

    let (unit, report) = retarget_unit(unit, "lib.Base", "lib.Plain", RetargetOptions::default(), &ctx);
    assert_eq!(report.find("app.B").unwrap().calls_removed, 1);

    let lines = normalized(&print(&unit));
    assert!(!lines.iter().any(|l| l.starts_with("super(")), "{:?}", lines);
    let first = lines.iter().position(|l| l == "System.out.println(\"first\");").unwrap();
    let second = lines.iter().position(|l| l == "System.out.println(name);").unwrap();
    assert_eq!(second, first + 1);
    assert!(lines.contains(&"public class B extends Plain {".to_string()));
}

#[test]
fn super_constructor_call_with_matching_arity_is_kept() {
    let table = table(&[
        "package lib; public class Base { public Base(String name) { } }",
        "package lib; public class Named { public Named(String name) { } }",
    ]);
    let source = r#"
package app;

import lib.Base;

public class B extends Base {
    public B(String name) {
        super(name);
    }
}
"#;
    let (unit, table) = load(source, &table);
    let config = Config::default();
    let ctx = RewriteContext::new(&table, &config);

    let (unit, report) = retarget_unit(unit, "lib.Base", "lib.Named", RetargetOptions::default(), &ctx);
    assert_eq!(report.find("app.B").unwrap().calls_removed, 0);
    assert!(print(&unit).contains("super(name);"));
}

#[test]
fn only_the_matching_interface_is_removed() {
    let table = table(&[
        "package io.legacy; public interface Lifecycle { void start(); }",
        "package app.api; public interface Named { String name(); }",
    ]);
    let source = r#"
package app;

import io.legacy.Lifecycle;
import app.api.Named;

public class Worker implements Lifecycle, Named {
    @Override
    public void start() {
        System.out.println("start");
    }

    @Override
    public String name() {
        return "worker";
    }
}
"#;
    let (unit, table) = load(source, &table);
    let config = Config::default();
    let ctx = RewriteContext::new(&table, &config);
    let body_before: Vec<String> = normalized(&print(&unit))
        .into_iter()
        .skip_while(|l| !l.starts_with("public class Worker"))
        .skip(1)
        .collect();

    let filter = SupertypeFilter::Type("io.legacy.Lifecycle".to_string());
    let (unit, changes) = remove_supertypes_unit(unit, &filter, &ctx);
    // the reference and its import
    assert_eq!(changes, 2);

    let class = first_class(&unit);
    assert_eq!(class.implements.len(), 1);
    assert_eq!(class.implements[0].resolved_fqn(), Some("app.api.Named"));
    assert_eq!(
        class.resolved.as_ref().unwrap().interfaces,
        vec![JavaType::named("app.api.Named")]
    );

    let lines = normalized(&print(&unit));
    assert_eq!(lines[1], "import app.api.Named;");
    assert!(lines.contains(&"public class Worker implements Named {".to_string()));
    let body_after: Vec<String> = lines
        .into_iter()
        .skip_while(|l| !l.starts_with("public class Worker"))
        .skip(1)
        .collect();
    assert_eq!(body_after, body_before);
}

#[test]
fn package_filter_removes_every_supertype_under_the_prefix() {
    let table = table(&[
        "package io.legacy.core; public abstract class Managed { public void stop() { } }",
        "package io.legacy.health; public interface Checked { }",
        "package app.api; public interface Named { }",
    ]);
    let source = r#"
package app;

import io.legacy.core.Managed;
import io.legacy.health.Checked;
import app.api.Named;

public class Worker extends Managed implements Checked, Named {
    public void close() {
        super.stop();
    }
}
"#;
    let (unit, table) = load(source, &table);
    let config = Config::default();
    let ctx = RewriteContext::new(&table, &config);

    let filter = SupertypeFilter::Package("io.legacy".to_string());
    let (unit, changes) = remove_supertypes_unit(unit, &filter, &ctx);
    // two references, one super call, two imports
    assert_eq!(changes, 5);
    let class = first_class(&unit);
    assert!(class.extends.is_none());
    assert_eq!(class.resolved.as_ref().unwrap().supertype, Some(JavaType::object()));
    let printed = print(&unit);
    assert!(!printed.contains("super.stop()"), "{}", printed);
    assert!(!printed.contains("io.legacy"));
}

#[test]
fn nested_classes_are_retargeted_too() {
    let table = table(&[OLD, NEW]);
    let source = r#"
package app;

import lib.Old;

public class Outer {
    public static class Inner extends Old {
        @Override
        public void describe() {
        }
    }
}
"#;
    let (unit, table) = load(source, &table);
    let config = Config::default();
    let ctx = RewriteContext::new(&table, &config);

    let options = RetargetOptions {
        add_abstract_methods: true,
        remove_unnecessary_overrides: true,
        ..RetargetOptions::default()
    };
    let (unit, report) = retarget_unit(unit, "lib.Old", "lib.New", options, &ctx);
    assert_eq!(report.retargeted(), 1);
    let outcome = report.find("app.Outer.Inner").unwrap();
    assert_eq!((outcome.markers_removed, outcome.stubs_added), (1, 1));

    let inner = unit.find_class("Inner").unwrap();
    assert_eq!(inner.extends.as_ref().unwrap().name, "New");
    assert!(inner.find_method("name").unwrap().has_annotation("Override"));
    assert!(!inner.find_method("describe").unwrap().has_annotation("Override"));
    assert!(unit.find_class("Outer").unwrap().extends.is_none());
}
