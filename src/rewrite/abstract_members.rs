//! Inherited abstract members and stubs for the ones a class lacks

use super::matcher::matches;
use super::stub::synthesize;
use super::template::splice_member;
use super::{RewriteContext, Rewritten};
use crate::ast::ClassDecl;
use crate::consts::ROOT_MEMBER_NAMES;
use crate::types::{ancestors, ClassType, JavaType, Signature, TypeSystem};
use std::collections::HashSet;

/// One abstract member a concrete subclass must supply
#[derive(Debug, Clone)]
pub struct AbstractMember {
    /// In the subclass's terms, declared against `via`
    pub signature: Signature,
    /// As written in the declaring ancestor
    pub declared: Signature,
    /// The declaring ancestor as referenced from the subclass
    pub via: JavaType,
}

#[derive(Debug, Clone, Default)]
pub struct AbstractMemberSet {
    pub members: Vec<AbstractMember>,
    /// False when some ancestor could not be looked up
    pub complete: bool,
}

impl AbstractMemberSet {
    /// Abstract members `class_type` inherits and no ancestor implements
    pub fn collect(class_type: &ClassType, types: &dyn TypeSystem) -> Self {
        let roots: Vec<JavaType> = class_type.direct_supertypes().cloned().collect();
        let ancestry = ancestors(types, &roots);

        let mut seen = HashSet::new();
        let mut members = Vec::new();
        for ancestor in &ancestry.ancestors {
            for declared in &ancestor.info.methods {
                if !declared.is_abstract()
                    || declared.flags.is_default
                    || declared.flags.is_static
                    || ROOT_MEMBER_NAMES.contains(declared.name.as_str())
                {
                    continue;
                }
                let implemented = ancestry.ancestors.iter().any(|other| {
                    other.info.methods_named(&declared.name).any(|concrete| {
                        !concrete.is_abstract()
                            && !concrete.flags.is_static
                            && matches(
                                &concrete.substitute(&other.substitution),
                                declared,
                                Some(&ancestor.reference),
                                types,
                            )
                    })
                });
                if implemented {
                    continue;
                }
                let signature = declared
                    .substitute(&ancestor.substitution)
                    .with_declaring_type(ancestor.reference.clone());
                let key = signature.erased_key().unwrap_or_else(|| signature.to_string());
                if seen.insert(key) {
                    members.push(AbstractMember {
                        signature,
                        declared: declared.clone(),
                        via: ancestor.reference.clone(),
                    });
                }
            }
        }
        Self {
            members,
            complete: ancestry.complete,
        }
    }

    /// Members `class` does not implement yet
    ///
    /// A method of the same name and arity whose types did not resolve counts
    /// as an implementation, so an unresolved member is never stubbed twice.
    pub fn missing_from<'s>(&'s self, class: &ClassDecl, types: &dyn TypeSystem) -> Vec<&'s AbstractMember> {
        self.members
            .iter()
            .filter(|member| {
                !class.methods().any(|method| {
                    if method.name != member.declared.name || method.parameters.len() != member.declared.arity() {
                        return false;
                    }
                    match &method.binding {
                        Some(binding) if binding.is_fully_resolved() => {
                            matches(binding, &member.declared, Some(&member.via), types)
                        }
                        _ => true,
                    }
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Append a stub for every inherited abstract member `class` lacks
///
/// Abstract classes and interfaces are left alone. Members whose types did
/// not resolve are skipped.
pub fn add_missing_abstract_methods(mut class: ClassDecl, ctx: &RewriteContext<'_>) -> Rewritten {
    let Some(class_type) = class.resolved.clone() else {
        log::debug!("abstract members: {} is not attributed, skipping", class.name);
        return Rewritten::unchanged(class);
    };
    if class_type.is_interface() || class_type.is_abstract {
        return Rewritten::unchanged(class);
    }

    let set = AbstractMemberSet::collect(&class_type, ctx.types);
    if !set.complete {
        log::debug!("abstract members: hierarchy of {} is incomplete", class_type.fqn);
    }
    let stubs: Vec<_> = set
        .missing_from(&class, ctx.types)
        .into_iter()
        .filter_map(|member| synthesize(&member.signature, &class_type.type_params, ctx.config))
        .collect();

    let mut changes = 0;
    for stub in stubs {
        match splice_member(&mut class, &stub, ctx) {
            Ok(()) => changes += 1,
            Err(e) => log::warn!("abstract members: could not add stub to {}: {}", class_type.fqn, e),
        }
    }
    if changes > 0 {
        log::debug!("abstract members: added {} stub(s) to {}", changes, class_type.fqn);
    }
    Rewritten { class, changes }
}
