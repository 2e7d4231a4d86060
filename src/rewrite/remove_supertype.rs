//! Removal of supertype references chosen by type or package

use super::imports::maybe_remove_import;
use super::relink::relink;
use super::super_calls::remove_unnecessary_super_calls;
use super::{map_classes, RewriteContext, Rewritten};
use crate::ast::{ClassDecl, CompilationUnit, TypeRef};
use crate::types::JavaType;

/// Which supertype references to remove
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupertypeFilter {
    /// Exactly this fully qualified type
    Type(String),
    /// Any type whose package name starts with this prefix
    Package(String),
}

impl SupertypeFilter {
    pub fn matches(&self, type_ref: &TypeRef) -> bool {
        let Some(resolved) = type_ref.resolved.as_ref().filter(|t| !t.is_unknown()) else {
            return false;
        };
        match self {
            Self::Type(fqn) => resolved.fqn() == Some(fqn.as_str()),
            // raw prefix, so "io.drop" also matches "io.dropwizard"
            Self::Package(prefix) => resolved
                .package_name()
                .map_or(false, |package| package.starts_with(prefix.as_str())),
        }
    }
}

/// Strip matching references from `class`; returns the removed types'
/// fully qualified names
fn strip(class: &mut ClassDecl, filter: &SupertypeFilter, extends_only: bool) -> Vec<String> {
    let mut removed = Vec::new();
    let mut record = |type_ref: &TypeRef| {
        if let Some(fqn) = type_ref.resolved_fqn() {
            removed.push(fqn.to_string());
        }
    };
    if class.extends.as_ref().map_or(false, |e| filter.matches(e)) {
        if let Some(extends) = class.extends.take() {
            record(&extends);
        }
    }
    if !extends_only {
        class.implements.retain(|i| {
            let keep = !filter.matches(i);
            if !keep {
                record(i);
            }
            keep
        });
    }
    removed
}

fn remove_matching(
    mut class: ClassDecl,
    filter: &SupertypeFilter,
    extends_only: bool,
    ctx: &RewriteContext<'_>,
) -> (Rewritten, Vec<String>) {
    let removed = strip(&mut class, filter, extends_only);
    if removed.is_empty() {
        return (Rewritten::unchanged(class), removed);
    }
    let name = class.fqn().unwrap_or(&class.name).to_string();
    log::debug!("remove supertype: {} no longer references {}", name, removed.join(", "));

    let root = JavaType::named(ctx.config.root_type.as_str());
    let relinked = relink(class, &root, ctx);
    let cleaned = remove_unnecessary_super_calls(relinked.class, ctx);
    let changes = removed.len() + cleaned.changes;
    (
        Rewritten {
            class: cleaned.class,
            changes,
        },
        removed,
    )
}

/// Remove the `extends` reference and every `implements` reference `filter`
/// matches, then drop the super calls that no longer resolve
pub fn remove_supertypes(class: ClassDecl, filter: &SupertypeFilter, ctx: &RewriteContext<'_>) -> Rewritten {
    remove_matching(class, filter, false, ctx).0
}

/// Like [`remove_supertypes`] with an exact type, but only for the `extends`
/// clause
pub fn remove_superclass_by_type(class: ClassDecl, fqn: &str, ctx: &RewriteContext<'_>) -> Rewritten {
    remove_matching(class, &SupertypeFilter::Type(fqn.to_string()), true, ctx).0
}

/// [`remove_supertypes`] over every named class of `unit`, followed by
/// removal of imports left unused; returns the total edit count
pub fn remove_supertypes_unit(
    unit: CompilationUnit,
    filter: &SupertypeFilter,
    ctx: &RewriteContext<'_>,
) -> (CompilationUnit, usize) {
    let mut total = 0;
    let mut removed_types: Vec<String> = Vec::new();
    let mut unit = map_classes(unit, |class| {
        let (out, removed) = remove_matching(class, filter, false, ctx);
        total += out.changes;
        for fqn in removed {
            if !removed_types.contains(&fqn) {
                removed_types.push(fqn);
            }
        }
        out.class
    });
    for fqn in &removed_types {
        if maybe_remove_import(&mut unit, fqn) {
            total += 1;
        }
    }
    (unit, total)
}
