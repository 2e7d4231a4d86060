//! Import bookkeeping after structural edits
//!
//! Passes write new type references fully qualified. These helpers add and
//! drop single-type imports and turn qualified references back into simple
//! names where that cannot change what the name means.

use crate::ast::{
    walk_expr, walk_type_ref, walk_type_ref_mut, Annotation, AstVisitor, AstVisitorMut, ClassDecl, ClassMember,
    CompilationUnit, Expr, ImportDecl, TypeRef,
};
use crate::types::JavaType;
use std::collections::HashMap;

const JAVA_LANG: &str = "java.lang";

fn split_fqn(fqn: &str) -> Option<(&str, &str)> {
    fqn.rsplit_once('.')
}

/// Simple names of every class declared in `unit`, nested ones included
fn declared_simple_names(unit: &CompilationUnit) -> Vec<String> {
    fn collect(class: &ClassDecl, out: &mut Vec<String>) {
        out.push(class.name.clone());
        for nested in class.nested_classes() {
            collect(nested, out);
        }
    }
    let mut out = Vec::new();
    for class in &unit.type_decls {
        collect(class, &mut out);
    }
    out
}

/// How `fqn` would be referenced by its simple name from `unit`
enum Visibility {
    /// Already visible under its simple name
    Visible,
    /// Visible once a single-type import is added
    Importable,
    /// The simple name means something else here
    Conflict,
}

fn visibility(unit: &CompilationUnit, fqn: &str) -> Visibility {
    let Some((package, simple)) = split_fqn(fqn) else {
        return Visibility::Conflict;
    };
    let single_imports = unit.imports.iter().filter(|i| !i.is_static && !i.is_wildcard);
    let mut clashing = false;
    for import in single_imports {
        if import.name == fqn {
            return Visibility::Visible;
        }
        if import.simple_name() == simple {
            clashing = true;
        }
    }
    if clashing {
        return Visibility::Conflict;
    }
    let declared = declared_simple_names(unit);
    if declared.iter().any(|name| name == simple) {
        let own = unit
            .type_decls
            .iter()
            .any(|c| c.fqn() == Some(fqn) || c.nested_classes().any(|n| n.fqn() == Some(fqn)));
        return if own { Visibility::Visible } else { Visibility::Conflict };
    }
    if package == JAVA_LANG || unit.package_name() == Some(package) {
        return Visibility::Visible;
    }
    if unit
        .imports
        .iter()
        .any(|i| i.is_wildcard && !i.is_static && i.name == package)
    {
        return Visibility::Visible;
    }
    Visibility::Importable
}

/// Import `fqn` unless it is already visible or its simple name is taken
pub fn maybe_add_import(unit: &mut CompilationUnit, fqn: &str) -> bool {
    match visibility(unit, fqn) {
        Visibility::Importable => {
            unit.imports.push(ImportDecl::single(fqn));
            log::debug!("imports: added {}", fqn);
            true
        }
        Visibility::Visible | Visibility::Conflict => false,
    }
}

/// Written-name references to one simple name
struct References<'s> {
    simple: &'s str,
    found: bool,
}

impl References<'_> {
    fn names(&self, written: &str) -> bool {
        written == self.simple
            || written
                .strip_prefix(self.simple)
                .map_or(false, |rest| rest.starts_with('.'))
    }
}

impl AstVisitor for References<'_> {
    fn visit_type_ref(&mut self, type_ref: &TypeRef) {
        if self.names(&type_ref.name) {
            self.found = true;
        }
        walk_type_ref(self, type_ref);
    }

    fn visit_annotation(&mut self, annotation: &Annotation) {
        if self.names(&annotation.name) {
            self.found = true;
        }
    }

    fn visit_expr(&mut self, expr: &Expr) {
        if let Expr::Identifier(ident) = expr {
            if ident.name == self.simple {
                self.found = true;
            }
        }
        walk_expr(self, expr);
    }
}

/// Drop the single-type import of `fqn` when nothing refers to it by its
/// simple name any more
pub fn maybe_remove_import(unit: &mut CompilationUnit, fqn: &str) -> bool {
    let Some(position) = unit
        .imports
        .iter()
        .position(|i| !i.is_static && !i.is_wildcard && i.name == fqn)
    else {
        return false;
    };
    let Some((_, simple)) = split_fqn(fqn) else {
        return false;
    };
    let mut refs = References { simple, found: false };
    for class in &unit.type_decls {
        refs.visit_class_decl(class);
    }
    if refs.found {
        log::trace!("imports: {} is still referenced", fqn);
        return false;
    }
    unit.imports.remove(position);
    log::debug!("imports: removed {}", fqn);
    true
}

fn class_fqn_of(ty: &JavaType) -> Option<&str> {
    match ty {
        JavaType::Array(element) => class_fqn_of(element),
        other => other.fqn(),
    }
}

/// Whether `type_ref` is written as the fully qualified name it resolves to
fn written_qualified(type_ref: &TypeRef) -> Option<&str> {
    let fqn = type_ref.resolved.as_ref().and_then(class_fqn_of)?;
    (type_ref.name.contains('.') && type_ref.name == fqn).then_some(fqn)
}

#[derive(Default)]
struct QualifiedRefs(Vec<String>);

impl AstVisitor for QualifiedRefs {
    fn visit_type_ref(&mut self, type_ref: &TypeRef) {
        if let Some(fqn) = written_qualified(type_ref) {
            if !self.0.iter().any(|seen| seen == fqn) {
                self.0.push(fqn.to_string());
            }
        }
        walk_type_ref(self, type_ref);
    }
}

struct Shortener {
    renames: HashMap<String, String>,
    count: usize,
}

impl AstVisitorMut for Shortener {
    fn visit_type_ref_mut(&mut self, type_ref: &mut TypeRef) {
        let simple = written_qualified(type_ref).and_then(|fqn| self.renames.get(fqn)).cloned();
        if let Some(simple) = simple {
            type_ref.name = simple;
            self.count += 1;
        }
        walk_type_ref_mut(self, type_ref);
    }
}

fn find_class_mut<'a>(classes: &'a mut [ClassDecl], fqn: &str) -> Option<&'a mut ClassDecl> {
    for class in classes.iter_mut() {
        if class.fqn() == Some(fqn) {
            return Some(class);
        }
        for member in class.body.iter_mut() {
            if let ClassMember::TypeDecl(nested) = member {
                if let Some(found) = find_class_mut(std::slice::from_mut(nested), fqn) {
                    return Some(found);
                }
            }
        }
    }
    None
}

/// Rewrite fully qualified type references inside the class `class_fqn` to
/// simple names, importing them where needed; returns the references changed
pub fn shorten_references_in(unit: &mut CompilationUnit, class_fqn: &str) -> usize {
    let qualified = {
        let Some(class) = find_class_mut(&mut unit.type_decls, class_fqn) else {
            return 0;
        };
        let mut refs = QualifiedRefs::default();
        refs.visit_class_decl(class);
        refs.0
    };

    let mut renames = HashMap::new();
    let mut taken: HashMap<String, String> = HashMap::new();
    for fqn in qualified {
        let Some((_, simple)) = split_fqn(&fqn) else {
            continue;
        };
        // two qualified names sharing a simple name: the first one wins
        if taken.get(simple).map_or(false, |other| other != &fqn) {
            continue;
        }
        let usable = match visibility(unit, &fqn) {
            Visibility::Visible => true,
            Visibility::Importable => maybe_add_import(unit, &fqn),
            Visibility::Conflict => false,
        };
        if usable {
            taken.insert(simple.to_string(), fqn.clone());
            renames.insert(fqn.clone(), simple.to_string());
        }
    }
    if renames.is_empty() {
        return 0;
    }

    let mut shortener = Shortener { renames, count: 0 };
    if let Some(class) = find_class_mut(&mut unit.type_decls, class_fqn) {
        shortener.visit_class_decl_mut(class);
    }
    log::debug!("imports: shortened {} reference(s) in {}", shortener.count, class_fqn);
    shortener.count
}
