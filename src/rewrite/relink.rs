//! Keeps a class's resolved type and cached member bindings in step with its
//! `extends`/`implements` clauses after a supertype edit

use super::{RewriteContext, Rewritten};
use crate::ast::{ClassDecl, ClassMember, TypeRef};
use crate::types::{JavaType, Signature};

/// Sync `class.resolved` with its syntax and point the bindings of marked
/// overrides at `new_supertype`
///
/// Returns the number of bindings and class-type fields that changed.
pub fn relink(mut class: ClassDecl, new_supertype: &JavaType, ctx: &RewriteContext<'_>) -> Rewritten {
    let Some(old) = class.resolved.clone() else {
        log::debug!("relink: {} is not attributed, skipping", class.name);
        return Rewritten::unchanged(class);
    };
    let mut changes = 0;

    let mut ty = old.clone();
    ty.supertype = if class.is_interface() {
        None
    } else {
        Some(
            class
                .extends
                .as_ref()
                .map(resolved_or_unknown)
                .unwrap_or_else(|| JavaType::named(ctx.config.root_type.as_str())),
        )
    };
    ty.interfaces = class.implements.iter().map(resolved_or_unknown).collect();
    if ty != old {
        log::debug!(
            "relink: {} now extends {}",
            ty.fqn,
            ty.supertype.as_ref().map_or_else(|| "nothing".to_string(), |s| s.to_string())
        );
        changes += 1;
    }
    class.resolved = Some(ty);

    let marker = ctx.config.override_annotation.as_str();
    for member in &mut class.body {
        let ClassMember::Method(method) = member else {
            continue;
        };
        if !method.has_annotation(marker) {
            continue;
        }
        if let Some(binding) = method.binding.as_mut() {
            if relink_binding(binding, new_supertype) {
                log::trace!("relink: {} now declared against {}", binding.name, new_supertype);
                changes += 1;
            }
        }
    }
    Rewritten { class, changes }
}

fn relink_binding(binding: &mut Signature, new_supertype: &JavaType) -> bool {
    if binding.declaring_type.is_unknown() || &binding.declaring_type == new_supertype {
        return false;
    }
    binding.declaring_type = new_supertype.clone();
    true
}

fn resolved_or_unknown(type_ref: &TypeRef) -> JavaType {
    type_ref.resolved.clone().unwrap_or(JavaType::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::attribute_unit;
    use crate::config::Config;
    use crate::parser::parse_compilation_unit;
    use crate::types::TypeTable;

    fn child(table: &TypeTable) -> ClassDecl {
        let source = r#"
package p;
public class Child extends Old implements Runnable {
    @Override
    public void run() { }
    public void helper() { }
}
"#;
        let unit = attribute_unit(parse_compilation_unit(source).unwrap(), table);
        unit.type_decls.into_iter().next().unwrap()
    }

    #[test]
    fn resolved_type_follows_the_edited_clauses() {
        let table = TypeTable::from_sources(&["package p; public class Old { }", "package p; public class New { }"]).unwrap();
        let config = Config::default();
        let ctx = RewriteContext::new(&table, &config);
        let mut class = child(&table);

        let mut new_ref = TypeRef::named("p.New");
        new_ref.resolved = Some(JavaType::named("p.New"));
        class.extends = Some(new_ref);
        class.implements.clear();

        let out = relink(class, &JavaType::named("p.New"), &ctx);
        assert_eq!(out.changes, 2);
        let ty = out.class.resolved.as_ref().unwrap();
        assert_eq!(ty.supertype, Some(JavaType::named("p.New")));
        assert!(ty.interfaces.is_empty());

        let run = out.class.find_method("run").unwrap().binding.as_ref().unwrap();
        assert_eq!(run.declaring_type, JavaType::named("p.New"));
        let helper = out.class.find_method("helper").unwrap().binding.as_ref().unwrap();
        assert_eq!(helper.declaring_type, JavaType::named("p.Child"));
    }

    #[test]
    fn removed_extends_falls_back_to_root_and_relinking_is_stable() {
        let table = TypeTable::from_sources(&["package p; public class Old { }"]).unwrap();
        let config = Config::default();
        let ctx = RewriteContext::new(&table, &config);
        let mut class = child(&table);
        class.extends = None;

        let root = JavaType::object();
        let out = relink(class, &root, &ctx);
        assert_eq!(
            out.class.resolved.as_ref().unwrap().supertype,
            Some(JavaType::object())
        );
        let again = relink(out.class, &root, &ctx);
        assert_eq!(again.changes, 0);
    }
}
