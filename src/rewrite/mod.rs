//! Class hierarchy rewrite passes
//!
//! Every pass takes an attributed [`ClassDecl`] by value and returns the
//! rewritten declaration together with a count of the edits it made. Passes
//! never fail on missing type information: a check that cannot be decided
//! leaves the member alone and logs why.
//!
//! [`retarget::retarget`] chains the passes in a fixed order; each one can
//! also be run on its own through the `*_unit` drivers.

pub mod abstract_members;
pub mod imports;
pub mod matcher;
pub mod overrides;
pub mod relink;
pub mod remove_supertype;
pub mod retarget;
pub mod stub;
pub mod super_calls;
pub mod template;

pub use abstract_members::{add_missing_abstract_methods, AbstractMember, AbstractMemberSet};
pub use imports::{maybe_add_import, maybe_remove_import, shorten_references_in};
pub use matcher::matches;
pub use overrides::{overrides, remove_unnecessary_overrides, should_keep_override_marker};
pub use relink::relink;
pub use remove_supertype::{remove_superclass_by_type, remove_supertypes, remove_supertypes_unit, SupertypeFilter};
pub use retarget::{retarget, retarget_unit, RetargetOptions, RetargetOutcome, RetargetReport, RetargetState};
pub use stub::{synthesize, TextBlock};
pub use super_calls::{remove_unnecessary_super_calls, should_remove_super_call};
pub use template::splice_member;

use crate::ast::{walk_class_decl_mut, AstVisitorMut, ClassDecl, ClassMember, CompilationUnit};
use crate::config::Config;
use crate::types::TypeSystem;

/// Read-only services every pass consults
#[derive(Clone, Copy)]
pub struct RewriteContext<'a> {
    pub types: &'a dyn TypeSystem,
    pub config: &'a Config,
}

impl<'a> RewriteContext<'a> {
    pub fn new(types: &'a dyn TypeSystem, config: &'a Config) -> Self {
        Self { types, config }
    }
}

/// Output of one pass over one class
#[derive(Debug, Clone)]
pub struct Rewritten {
    pub class: ClassDecl,
    pub changes: usize,
}

impl Rewritten {
    pub fn unchanged(class: ClassDecl) -> Self {
        Self { class, changes: 0 }
    }

    pub fn is_changed(&self) -> bool {
        self.changes > 0
    }
}

/// Apply `f` to every named class of `unit`, nested classes before their
/// enclosing class
pub fn map_classes<F>(mut unit: CompilationUnit, mut f: F) -> CompilationUnit
where
    F: FnMut(ClassDecl) -> ClassDecl,
{
    unit.type_decls = unit
        .type_decls
        .into_iter()
        .map(|class| map_class_tree(class, &mut f))
        .collect();
    unit
}

fn map_class_tree<F>(mut class: ClassDecl, f: &mut F) -> ClassDecl
where
    F: FnMut(ClassDecl) -> ClassDecl,
{
    class.body = class
        .body
        .into_iter()
        .map(|member| match member {
            ClassMember::TypeDecl(nested) => ClassMember::TypeDecl(map_class_tree(nested, f)),
            other => other,
        })
        .collect();
    f(class)
}

/// Run a single-class pass over every named class of `unit`
pub fn run_pass<P>(unit: CompilationUnit, ctx: &RewriteContext<'_>, pass: P) -> (CompilationUnit, usize)
where
    P: Fn(ClassDecl, &RewriteContext<'_>) -> Rewritten,
{
    let mut total = 0;
    let unit = map_classes(unit, |class| {
        let rewritten = pass(class, ctx);
        total += rewritten.changes;
        rewritten.class
    });
    (unit, total)
}

struct AnonymousBodies<'f> {
    f: &'f mut dyn FnMut(&mut ClassDecl) -> usize,
    changes: usize,
}

impl AstVisitorMut for AnonymousBodies<'_> {
    fn visit_class_decl_mut(&mut self, class: &mut ClassDecl) {
        // named nested classes get their own pass run
        if class.is_anonymous() {
            walk_class_decl_mut(self, class);
            self.changes += (self.f)(class);
        }
    }
}

/// Apply `f` to every anonymous class body in `class`'s members, innermost
/// first; returns the summed counts
pub(crate) fn for_each_anonymous_body(class: &mut ClassDecl, f: &mut dyn FnMut(&mut ClassDecl) -> usize) -> usize {
    let mut visitor = AnonymousBodies { f, changes: 0 };
    walk_class_decl_mut(&mut visitor, class);
    visitor.changes
}
