//! Generic-aware signature matching
//!
//! Decides whether an existing method satisfies an inherited one. With a
//! parameterized ancestor reference the candidate's type variables are
//! resolved through the reference's type arguments; without one, parameters
//! are compared by erasure. Unresolved types never match.

use crate::types::{is_assignable, JavaType, Signature, SubstitutionMap, TypeSystem, TypeVariable, WildcardBound};

/// Whether `existing` overrides or implements `candidate`
///
/// `candidate` is in the terms of its declaring class; `generic_ref` is that
/// class as referenced from the class owning `existing`, e.g. `Parent<String>`.
pub fn matches(
    existing: &Signature,
    candidate: &Signature,
    generic_ref: Option<&JavaType>,
    types: &dyn TypeSystem,
) -> bool {
    if existing.name != candidate.name || existing.arity() != candidate.arity() {
        return false;
    }
    if !existing.is_fully_resolved() || !candidate.is_fully_resolved() {
        return false;
    }

    let reference = generic_ref.filter(|r| !r.type_args().is_empty());
    let Some(reference) = reference else {
        return erased_params_equal(existing, candidate);
    };
    let Some(info) = reference.fqn().and_then(|fqn| types.class_info(fqn)) else {
        return false;
    };

    let generic = GenericMatch {
        map: SubstitutionMap::from_reference(&info.ty.type_params, reference).without(&candidate.type_params),
        existing_vars: &existing.type_params,
        candidate_vars: &candidate.type_params,
        types,
    };
    existing
        .param_types
        .iter()
        .zip(&candidate.param_types)
        .all(|(e, c)| generic.type_matches(e, c))
        && generic.return_matches(&existing.return_type, &candidate.return_type)
}

fn erased_params_equal(existing: &Signature, candidate: &Signature) -> bool {
    match (existing.erased_key(), candidate.erased_key()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

struct GenericMatch<'s> {
    map: SubstitutionMap,
    existing_vars: &'s [TypeVariable],
    candidate_vars: &'s [TypeVariable],
    types: &'s dyn TypeSystem,
}

impl GenericMatch<'_> {
    fn type_matches(&self, existing: &JavaType, candidate: &JavaType) -> bool {
        match candidate {
            JavaType::TypeVariable(var) => self.variable_matches(existing, var),
            JavaType::Parameterized { base, args } => match existing {
                JavaType::Parameterized {
                    base: existing_base,
                    args: existing_args,
                } => {
                    existing_base == base
                        && existing_args.len() == args.len()
                        && existing_args
                            .iter()
                            .zip(args)
                            .all(|(e, c)| self.type_matches(e, c))
                }
                // raw form of the same class
                JavaType::Named(name) => name == base,
                _ => false,
            },
            JavaType::Array(element) => match existing {
                JavaType::Array(existing_element) => self.type_matches(existing_element, element),
                _ => false,
            },
            JavaType::Wildcard(bound) => match (existing, bound) {
                (JavaType::Wildcard(None), None) => true,
                (JavaType::Wildcard(Some(WildcardBound::Extends(e))), Some(WildcardBound::Extends(c)))
                | (JavaType::Wildcard(Some(WildcardBound::Super(e))), Some(WildcardBound::Super(c))) => {
                    self.type_matches(e, c)
                }
                _ => false,
            },
            other => same_type(existing, other),
        }
    }

    fn variable_matches(&self, existing: &JavaType, var: &TypeVariable) -> bool {
        if let Some(bound) = self.map.get(&var.name) {
            return same_type(existing, bound);
        }
        // method-level variables pair up by position
        if let Some(index) = self.candidate_vars.iter().position(|v| v.name == var.name) {
            return match (existing, self.existing_vars.get(index)) {
                (JavaType::TypeVariable(e), Some(declared)) => {
                    e.name == declared.name && self.bounds_agree(declared, &self.candidate_vars[index])
                }
                _ => false,
            };
        }
        if var.bounds.is_empty() {
            return existing.is_reference();
        }
        var.bounds
            .iter()
            .all(|bound| is_assignable(existing, bound, self.types).is_yes())
    }

    /// Bounds of a paired method variable, with the candidate's variables
    /// renamed to the existing method's
    fn bounds_agree(&self, existing: &TypeVariable, candidate: &TypeVariable) -> bool {
        let mut renames = self.map.clone();
        for (c, e) in self.candidate_vars.iter().zip(self.existing_vars) {
            renames.insert(c.name.clone(), JavaType::type_var(e.name.clone()));
        }
        let bounds: Vec<JavaType> = candidate.bounds.iter().map(|b| b.substitute(&renames)).collect();

        let candidate_erasure = bounds.first().map(|b| b.erasure()).unwrap_or_else(JavaType::object);
        if existing.erasure() != candidate_erasure {
            return false;
        }
        let from = JavaType::TypeVariable(existing.clone());
        bounds.iter().all(|bound| {
            existing.bounds.iter().any(|declared| same_type(declared, bound))
                || is_assignable(&from, bound, self.types).is_yes()
        })
    }

    /// Return types may be covariant
    fn return_matches(&self, existing: &JavaType, candidate: &JavaType) -> bool {
        if self.type_matches(existing, candidate) {
            return true;
        }
        if existing.is_void() || candidate.is_void() || existing.is_primitive() {
            return false;
        }
        is_assignable(existing, &candidate.substitute(&self.map), self.types).is_yes()
    }
}

/// Structural equality where type variables compare by name
fn same_type(a: &JavaType, b: &JavaType) -> bool {
    match (a, b) {
        (JavaType::TypeVariable(x), JavaType::TypeVariable(y)) => x.name == y.name,
        (
            JavaType::Parameterized { base: ab, args: aa },
            JavaType::Parameterized { base: bb, args: ba },
        ) => ab == bb && aa.len() == ba.len() && aa.iter().zip(ba).all(|(x, y)| same_type(x, y)),
        (JavaType::Array(x), JavaType::Array(y)) => same_type(x, y),
        (JavaType::Wildcard(Some(WildcardBound::Extends(x))), JavaType::Wildcard(Some(WildcardBound::Extends(y))))
        | (JavaType::Wildcard(Some(WildcardBound::Super(x))), JavaType::Wildcard(Some(WildcardBound::Super(y)))) => {
            same_type(x, y)
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Primitive, TypeTable};

    fn table() -> TypeTable {
        TypeTable::from_sources(&[
            "package p; public abstract class Parent<T> { public abstract T getValue(); public abstract void setValue(T value); }",
            "package p; public interface Converter<A, B extends Number> { B convert(A input, java.util.List<A> all); }",
            "package p; public interface Sink { void accept(Object value); }",
        ])
        .unwrap()
    }

    fn string() -> JavaType {
        JavaType::named("java.lang.String")
    }

    fn declared<'t>(table: &'t TypeTable, class: &str, method: &'t str) -> &'t Signature {
        table
            .class_info(class)
            .unwrap()
            .methods_named(method)
            .next()
            .unwrap()
    }

    fn child_method(name: &str) -> Signature {
        Signature::method(name, JavaType::named("p.Child"))
    }

    #[test]
    fn resolves_class_variables_through_the_reference() {
        let table = table();
        let reference = JavaType::parameterized("p.Parent", vec![string()]);
        let get = declared(&table, "p.Parent", "getValue");
        assert!(matches(&child_method("getValue").returning(string()), get, Some(&reference), &table));
        assert!(!matches(
            &child_method("getValue").returning(JavaType::Primitive(Primitive::Int)),
            get,
            Some(&reference),
            &table
        ));

        let set = declared(&table, "p.Parent", "setValue");
        assert!(matches(&child_method("setValue").with_param(string(), "v"), set, Some(&reference), &table));
        assert!(!matches(&child_method("setValue").with_param(JavaType::object(), "v"), set, Some(&reference), &table));
    }

    #[test]
    fn compares_parameterized_arguments_pairwise() {
        let table = table();
        let reference = JavaType::parameterized(
            "p.Converter",
            vec![string(), JavaType::named("java.lang.Integer")],
        );
        let convert = declared(&table, "p.Converter", "convert");
        let list_of = |t: JavaType| JavaType::parameterized("java.util.List", vec![t]);
        let ok = child_method("convert")
            .with_param(string(), "input")
            .with_param(list_of(string()), "all")
            .returning(JavaType::named("java.lang.Integer"));
        assert!(matches(&ok, convert, Some(&reference), &table));

        let wrong_arg = child_method("convert")
            .with_param(string(), "input")
            .with_param(list_of(JavaType::named("java.lang.Integer")), "all")
            .returning(JavaType::named("java.lang.Integer"));
        assert!(!matches(&wrong_arg, convert, Some(&reference), &table));
    }

    #[test]
    fn without_generic_reference_compares_erasure() {
        let table = table();
        let accept = declared(&table, "p.Sink", "accept");
        assert!(matches(&child_method("accept").with_param(JavaType::object(), "v"), accept, None, &table));
        assert!(!matches(&child_method("accept").with_param(string(), "v"), accept, None, &table));
        // raw reference to a generic class erases its variables
        let raw = JavaType::named("p.Parent");
        let set = declared(&table, "p.Parent", "setValue");
        assert!(matches(&child_method("setValue").with_param(JavaType::object(), "v"), set, Some(&raw), &table));
    }

    #[test]
    fn unresolved_types_never_match() {
        let table = table();
        let accept = declared(&table, "p.Sink", "accept");
        assert!(!matches(&child_method("accept").with_param(JavaType::Unknown, "v"), accept, None, &table));
        let reference = JavaType::parameterized("q.Missing", vec![string()]);
        assert!(!matches(&child_method("accept").with_param(JavaType::object(), "v"), accept, Some(&reference), &table));
    }

    #[test]
    fn unmapped_variable_accepts_types_within_its_bounds() {
        let table = table();
        let bounded = Signature::method("size", JavaType::named("p.Parent"))
            .with_param(
                JavaType::TypeVariable(TypeVariable::with_bounds("N", vec![JavaType::named("java.lang.Number")])),
                "n",
            );
        let reference = JavaType::parameterized("p.Parent", vec![string()]);
        let existing = child_method("size").with_param(JavaType::named("java.lang.Integer"), "n");
        assert!(matches(&existing, &bounded, Some(&reference), &table));
        let existing = child_method("size").with_param(string(), "n");
        assert!(!matches(&existing, &bounded, Some(&reference), &table));
    }

    #[test]
    fn method_type_parameters_pair_by_position() {
        let table = table();
        let reference = JavaType::parameterized("p.Parent", vec![string()]);
        let candidate = Signature::method("wrap", JavaType::named("p.Parent"))
            .with_type_param(TypeVariable::new("R"))
            .with_param(JavaType::type_var("R"), "r")
            .returning(JavaType::type_var("R"));
        let existing = child_method("wrap")
            .with_type_param(TypeVariable::new("X"))
            .with_param(JavaType::type_var("X"), "x")
            .returning(JavaType::type_var("X"));
        assert!(matches(&existing, &candidate, Some(&reference), &table));
    }

    #[test]
    fn paired_method_variables_must_agree_on_bounds() {
        let table = table();
        let reference = JavaType::parameterized("p.Parent", vec![string()]);
        let number = || JavaType::named("java.lang.Number");
        let bounded = TypeVariable::with_bounds("R", vec![number()]);
        let candidate = Signature::method("take", JavaType::named("p.Parent"))
            .with_type_param(bounded.clone())
            .with_param(JavaType::TypeVariable(bounded), "r");

        let take = |var: TypeVariable| {
            child_method("take")
                .with_type_param(var.clone())
                .with_param(JavaType::TypeVariable(var), "x")
        };
        assert!(!matches(&take(TypeVariable::new("X")), &candidate, Some(&reference), &table));
        assert!(matches(
            &take(TypeVariable::with_bounds("X", vec![number()])),
            &candidate,
            Some(&reference),
            &table
        ));
        assert!(!matches(
            &take(TypeVariable::with_bounds("X", vec![JavaType::named("java.lang.Integer")])),
            &candidate,
            Some(&reference),
            &table
        ));
    }
}
