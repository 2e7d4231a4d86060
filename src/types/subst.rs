use super::{JavaType, TypeVariable};
use std::collections::HashMap;

/// Type-variable name to concrete type mapping
///
/// Built from a parameterized reference to a generic class: `Parent<String>`
/// against `class Parent<T>` yields `T -> String`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionMap {
    entries: HashMap<String, JavaType>,
}

impl SubstitutionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `type_params` positionally onto the arguments of `reference`
    ///
    /// A raw reference to a generic class maps each variable to its erasure,
    /// which is how inherited members of a raw supertype look. Arity
    /// mismatches map only the common prefix.
    pub fn from_reference(type_params: &[TypeVariable], reference: &JavaType) -> Self {
        let mut map = Self::new();
        match reference {
            JavaType::Parameterized { args, .. } => {
                for (var, arg) in type_params.iter().zip(args) {
                    map.insert(var.name.clone(), arg.clone());
                }
            }
            JavaType::Named(_) => {
                for var in type_params {
                    map.insert(var.name.clone(), var.erasure());
                }
            }
            _ => {}
        }
        map
    }

    pub fn insert(&mut self, name: impl Into<String>, ty: JavaType) {
        self.entries.insert(name.into(), ty);
    }

    pub fn get(&self, name: &str) -> Option<&JavaType> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Copy without the given variables, for scopes that redeclare them
    pub fn without(&self, shadowed: &[TypeVariable]) -> Self {
        if shadowed.is_empty() {
            return self.clone();
        }
        Self {
            entries: self
                .entries
                .iter()
                .filter(|(name, _)| !shadowed.iter().any(|v| &v.name == *name))
                .map(|(name, ty)| (name.clone(), ty.clone()))
                .collect(),
        }
    }
}
