use super::{JavaType, TypeSystem};
use crate::attr::Scope;
use crate::error::{Error, Result};
use crate::parser::parse_type_expr;

/// Build a type from its source text, e.g. `java.util.List<String>`
///
/// Qualified names are taken as written even when the type system does not
/// know them; simple names must resolve through `java.lang` or the table.
pub fn build_type(text: &str, types: &dyn TypeSystem) -> Result<JavaType> {
    let type_ref = parse_type_expr(text.trim())?;
    let ty = Scope::new(types).resolve_type_ref(&type_ref);
    if ty.contains_unknown() {
        return Err(Error::unresolved_type(text.trim()));
    }
    Ok(ty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeTable;

    #[test]
    fn qualifies_java_lang_and_keeps_unknown_packages() {
        let table = TypeTable::new();
        let ty = build_type("java.util.Map<String, java.util.List<Integer>>", &table).unwrap();
        assert_eq!(
            ty.to_string(),
            "java.util.Map<java.lang.String, java.util.List<java.lang.Integer>>"
        );
        assert_eq!(build_type("org.example.Missing", &table).unwrap(), JavaType::named("org.example.Missing"));
    }

    #[test]
    fn rejects_unresolvable_simple_names() {
        let table = TypeTable::new();
        assert!(matches!(build_type("Missing", &table), Err(Error::UnresolvedType { .. })));
        assert!(build_type("List<", &table).is_err());
    }
}
