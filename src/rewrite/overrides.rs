//! Override marker legality
//!
//! A marker stays unless the hierarchy proves the method overrides nothing.

use super::matcher::matches;
use super::{for_each_anonymous_body, RewriteContext, Rewritten};
use crate::ast::{ClassDecl, ClassMember, MethodDecl};
use crate::types::{ancestors, ClassType, JavaType, Signature, TypeSystem, Verdict};

/// Whether `sig`, declared in `class_type`, overrides or implements an
/// inherited member
pub fn overrides(sig: &Signature, class_type: &ClassType, types: &dyn TypeSystem) -> Verdict {
    if sig.is_constructor() || sig.flags.is_static || sig.flags.is_private {
        return Verdict::No;
    }

    let mut roots: Vec<JavaType> = class_type.direct_supertypes().cloned().collect();
    // interfaces implicitly declare the root type's public members
    if class_type.is_interface() {
        roots.push(JavaType::object());
    }
    // a binding relinked onto an ancestor names that ancestor directly
    if sig.declaring_type.fqn() != Some(class_type.fqn.as_str()) && !roots.contains(&sig.declaring_type) {
        roots.push(sig.declaring_type.clone());
    }

    let ancestry = ancestors(types, &roots);
    let mut undecidable = !ancestry.complete || !sig.is_fully_resolved();
    for ancestor in &ancestry.ancestors {
        for inherited in ancestor.info.methods_named(&sig.name) {
            if inherited.flags.is_private || inherited.flags.is_static || inherited.arity() != sig.arity() {
                continue;
            }
            if matches(sig, inherited, Some(&ancestor.reference), types) {
                return Verdict::Yes;
            }
            if !inherited.is_fully_resolved() {
                undecidable = true;
            }
        }
    }
    if undecidable {
        Verdict::Unknown
    } else {
        Verdict::No
    }
}

/// Whether `method`'s override marker should stay
///
/// Methods without a binding, and methods whose verdict is unknown, keep it.
pub fn should_keep_override_marker(method: &MethodDecl, class_type: &ClassType, ctx: &RewriteContext<'_>) -> bool {
    let Some(sig) = &method.binding else {
        log::debug!("overrides: keeping marker on unbound {}", method.name);
        return true;
    };
    match overrides(sig, class_type, ctx.types) {
        Verdict::No => false,
        Verdict::Yes => true,
        Verdict::Unknown => {
            log::debug!("overrides: keeping marker on {}, hierarchy unresolved", sig);
            true
        }
    }
}

/// Strip override markers from methods that override nothing
///
/// Anonymous class bodies in the class's members are processed too unless
/// `Config::ignore_anonymous_class_methods` is set. Only the marker is
/// removed; the method is left as is.
pub fn remove_unnecessary_overrides(mut class: ClassDecl, ctx: &RewriteContext<'_>) -> Rewritten {
    let mut changes = strip_markers(&mut class, ctx);
    if !ctx.config.ignore_anonymous_class_methods {
        changes += for_each_anonymous_body(&mut class, &mut |body| strip_markers(body, ctx));
    }
    Rewritten { class, changes }
}

fn strip_markers(class: &mut ClassDecl, ctx: &RewriteContext<'_>) -> usize {
    let Some(class_type) = class.resolved.clone() else {
        log::debug!("overrides: {} is not attributed, skipping", class.name);
        return 0;
    };
    let marker = ctx.config.override_annotation.as_str();
    let mut removed = 0;
    for member in &mut class.body {
        let ClassMember::Method(method) = member else {
            continue;
        };
        if method.has_annotation(marker) && !should_keep_override_marker(method, &class_type, ctx) {
            method.annotations.retain(|a| !a.is_named(marker));
            log::debug!("overrides: removed @{} from {}.{}", marker, class_type.fqn, method.name);
            removed += 1;
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::attribute_unit;
    use crate::config::Config;
    use crate::parser::parse_compilation_unit;
    use crate::types::TypeTable;

    fn run(table: &TypeTable, config: &Config, source: &str) -> Rewritten {
        let ctx = RewriteContext::new(table, config);
        let unit = attribute_unit(parse_compilation_unit(source).unwrap(), table);
        remove_unnecessary_overrides(unit.type_decls.into_iter().next().unwrap(), &ctx)
    }

    fn marked(class: &ClassDecl, name: &str) -> bool {
        class.find_method(name).unwrap().has_annotation("Override")
    }

    #[test]
    fn keeps_real_overrides_and_strips_the_rest() {
        let table = TypeTable::from_sources(&["package p; public abstract class Base { public abstract void start(); }"]).unwrap();
        let out = run(
            &table,
            &Config::default(),
            r#"
package p;
public class Impl extends Base implements Runnable {
    @Override
    public void start() { }
    @Override
    public void run() { }
    @Override
    public String toString() { return "impl"; }
    @Override
    public void stop() { }
    @Override
    public void start(int delay) { }
}
"#,
        );
        assert_eq!(out.changes, 2);
        assert!(marked(&out.class, "run"));
        assert!(marked(&out.class, "toString"));
        assert!(!marked(&out.class, "stop"));
        let start_overloads: Vec<bool> = out
            .class
            .methods()
            .filter(|m| m.name == "start")
            .map(|m| m.has_annotation("Override"))
            .collect();
        assert_eq!(start_overloads, vec![true, false]);
    }

    #[test]
    fn unknown_hierarchy_keeps_markers() {
        let table = TypeTable::new();
        let out = run(
            &table,
            &Config::default(),
            "package p; public class Impl extends q.Missing { @Override public void stop() { } }",
        );
        assert_eq!(out.changes, 0);
        assert!(marked(&out.class, "stop"));
    }

    #[test]
    fn generic_parameter_types_resolve_through_reference() {
        let table = TypeTable::from_sources(&["package p; public interface Handler<T> { void handle(T event); }"]).unwrap();
        let out = run(
            &table,
            &Config::default(),
            r#"
package p;
public class StringHandler implements Handler<String> {
    @Override
    public void handle(String event) { }
    @Override
    public void handle(Integer event) { }
}
"#,
        );
        assert_eq!(out.changes, 1);
        let flags: Vec<bool> = out.class.methods().map(|m| m.has_annotation("Override")).collect();
        assert_eq!(flags, vec![true, false]);
    }

    #[test]
    fn anonymous_bodies_follow_configuration() {
        let table = TypeTable::new();
        let source = r#"
package p;
public class Host {
    Runnable task = new Runnable() {
        @Override
        public void run() { }
        @Override
        public void helper() { }
    };
}
"#;
        let out = run(&table, &Config::default(), source);
        assert_eq!(out.changes, 1);
        let ignoring = Config::default().with_ignore_anonymous_class_methods(true);
        assert_eq!(run(&table, &ignoring, source).changes, 0);
    }
}
