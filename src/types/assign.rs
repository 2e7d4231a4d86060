use super::hierarchy::ancestors;
use super::{JavaType, Primitive, TypeSystem, Verdict, WildcardBound};
use crate::consts::OBJECT_TYPE;

/// Whether a value of type `from` may be assigned to a variable of type `to`
///
/// No boxing or unchecked conversions. Any unresolved component, or a
/// hierarchy walk that runs into a class the type system does not know,
/// yields `Unknown`.
pub fn is_assignable(from: &JavaType, to: &JavaType, types: &dyn TypeSystem) -> Verdict {
    if from.contains_unknown() || to.contains_unknown() {
        return Verdict::Unknown;
    }
    if from == to {
        return Verdict::Yes;
    }
    match (from, to) {
        (JavaType::Primitive(a), JavaType::Primitive(b)) => {
            Verdict::from_bool(primitive_widening_allows(*a, *b))
        }
        (JavaType::Primitive(_), _) | (_, JavaType::Primitive(_)) => Verdict::No,
        (s, JavaType::Named(n)) if n == OBJECT_TYPE && s.is_reference() => Verdict::Yes,
        (JavaType::Array(a), JavaType::Array(b)) => {
            if a.is_primitive() || b.is_primitive() {
                Verdict::from_bool(a == b)
            } else {
                is_assignable(a, b, types)
            }
        }
        (JavaType::Array(_), JavaType::Named(n)) => {
            Verdict::from_bool(n == "java.lang.Cloneable" || n == "java.io.Serializable")
        }
        // A type variable is assignable wherever one of its bounds is
        (JavaType::TypeVariable(v), t) => v
            .bounds
            .iter()
            .fold(Verdict::No, |acc, bound| acc.or(is_assignable(bound, t, types))),
        (_, JavaType::TypeVariable(_)) => Verdict::No,
        (s, t) => match (s.fqn(), t.fqn()) {
            (Some(src), Some(dst)) => class_assignable(s, src, t, dst, types),
            _ => Verdict::No,
        },
    }
}

fn class_assignable(
    from: &JavaType,
    from_fqn: &str,
    to: &JavaType,
    to_fqn: &str,
    types: &dyn TypeSystem,
) -> Verdict {
    let nominal = is_subclass(from_fqn, to_fqn, types);
    if !nominal.is_yes() {
        return nominal;
    }
    if to.type_args().is_empty() {
        return Verdict::Yes;
    }
    let from_is_raw = from.type_args().is_empty()
        && types
            .class_info(from_fqn)
            .map_or(false, |info| !info.ty.type_params.is_empty());
    if from_is_raw {
        // raw to parameterized is an unchecked conversion
        return Verdict::No;
    }
    // Compare against `to` as seen from `from`, e.g. ArrayList<String> as List<String>
    let view = if from_fqn == to_fqn {
        Some(from.clone())
    } else {
        let ancestry = ancestors(types, std::slice::from_ref(from));
        ancestry
            .ancestors
            .iter()
            .find(|a| a.info.fqn() == to_fqn)
            .map(|a| a.reference.clone())
    };
    let Some(view) = view else {
        return Verdict::Unknown;
    };
    if view.type_args().len() != to.type_args().len() {
        return Verdict::No;
    }
    view.type_args()
        .iter()
        .zip(to.type_args())
        .fold(Verdict::Yes, |acc, (actual, target)| {
            acc.and(type_arg_contains(target, actual, types))
        })
}

/// Whether type argument `target` contains `actual` (JLS 4.5.1)
fn type_arg_contains(target: &JavaType, actual: &JavaType, types: &dyn TypeSystem) -> Verdict {
    match target {
        JavaType::Wildcard(None) => Verdict::Yes,
        JavaType::Wildcard(Some(WildcardBound::Extends(bound))) => match actual {
            JavaType::Wildcard(Some(WildcardBound::Extends(inner))) => is_assignable(inner, bound, types),
            JavaType::Wildcard(_) => Verdict::from_bool(bound.fqn() == Some(OBJECT_TYPE)),
            _ => is_assignable(actual, bound, types),
        },
        JavaType::Wildcard(Some(WildcardBound::Super(bound))) => match actual {
            JavaType::Wildcard(Some(WildcardBound::Super(inner))) => is_assignable(bound, inner, types),
            JavaType::Wildcard(_) => Verdict::No,
            _ => is_assignable(bound, actual, types),
        },
        _ => Verdict::from_bool(target == actual),
    }
}

/// Nominal subclassing between two class names, reflexive
pub fn is_subclass(from: &str, to: &str, types: &dyn TypeSystem) -> Verdict {
    if from == to || to == OBJECT_TYPE {
        return Verdict::Yes;
    }
    let ancestry = ancestors(types, &[JavaType::named(from)]);
    if ancestry.ancestors.iter().any(|a| a.info.fqn() == to) {
        Verdict::Yes
    } else if ancestry.complete {
        Verdict::No
    } else {
        Verdict::Unknown
    }
}

fn primitive_widening_allows(from: Primitive, to: Primitive) -> bool {
    use Primitive::*;
    if from == to {
        return true;
    }
    matches!(
        (from, to),
        (Byte, Short | Int | Long | Float | Double)
            | (Short, Int | Long | Float | Double)
            | (Char, Int | Long | Float | Double)
            | (Int, Long | Float | Double)
            | (Long, Float | Double)
            | (Float, Double)
    )
}
