use super::{ClassInfo, JavaType, SubstitutionMap, TypeSystem};
use crate::consts::MAX_HIERARCHY_STEPS;
use std::collections::{HashSet, VecDeque};

/// A supertype reached by a hierarchy walk
#[derive(Debug, Clone)]
pub struct Ancestor<'a> {
    pub info: &'a ClassInfo,
    /// Reference to this ancestor in the terms of the walk's starting class,
    /// e.g. `Parent<java.util.List<String>>` reached through `Mid<String>`
    pub reference: JavaType,
    /// Maps the ancestor's own type variables to the arguments in `reference`
    pub substitution: SubstitutionMap,
    pub depth: usize,
}

/// Result of a hierarchy walk
#[derive(Debug, Clone, Default)]
pub struct Ancestry<'a> {
    /// Breadth-first, roots first; each class appears once
    pub ancestors: Vec<Ancestor<'a>>,
    /// `false` when some supertype could not be resolved, so absence of a
    /// class or member from `ancestors` proves nothing
    pub complete: bool,
}

impl<'a> Ancestry<'a> {
    pub fn find(&self, fqn: &str) -> Option<&Ancestor<'a>> {
        self.ancestors.iter().find(|a| a.info.fqn() == fqn)
    }
}

/// Walk `roots` and everything above them, composing generic substitutions
/// along the way
pub fn ancestors<'a>(types: &'a dyn TypeSystem, roots: &[JavaType]) -> Ancestry<'a> {
    let mut queue: VecDeque<(JavaType, usize)> = roots.iter().cloned().map(|r| (r, 0)).collect();
    let mut seen: HashSet<String> = HashSet::new();
    let mut ancestors = Vec::new();
    let mut complete = true;

    while let Some((reference, depth)) = queue.pop_front() {
        if seen.len() >= MAX_HIERARCHY_STEPS {
            log::warn!("hierarchy walk stopped after {} types", MAX_HIERARCHY_STEPS);
            complete = false;
            break;
        }
        let Some(fqn) = reference.fqn() else {
            log::trace!("unresolvable supertype {}", reference);
            complete = false;
            continue;
        };
        if !seen.insert(fqn.to_string()) {
            continue;
        }
        let Some(info) = types.class_info(fqn) else {
            log::trace!("supertype {} not in type system", fqn);
            complete = false;
            continue;
        };
        let substitution = SubstitutionMap::from_reference(&info.ty.type_params, &reference);
        for supertype in info.ty.direct_supertypes() {
            queue.push_back((supertype.substitute(&substitution), depth + 1));
        }
        ancestors.push(Ancestor {
            info,
            reference,
            substitution,
            depth,
        });
    }

    Ancestry { ancestors, complete }
}
