//! Rendering of "not implemented" member stubs
//!
//! A stub is rendered as Java source with fully qualified type names and
//! parsed back in through [`super::template::splice_member`], so it carries
//! the same bindings as hand-written members.

use crate::config::Config;
use crate::types::{Signature, TypeVariable};
use std::fmt;

/// Rendered source text of one class member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock(String);

impl TextBlock {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TextBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render a stub implementing `sig`, already substituted into the terms of
/// the class receiving it
///
/// `class_type_params` are the receiving class's own type variables; they are
/// in scope and not redeclared on the method. Returns `None` when a parameter
/// or the return type is unresolved, since the stub would have to guess.
pub fn synthesize(sig: &Signature, class_type_params: &[TypeVariable], config: &Config) -> Option<TextBlock> {
    if !sig.is_fully_resolved() {
        log::debug!("stub: skipping {} with unresolved types", sig);
        return None;
    }

    let mut free = Vec::new();
    sig.return_type.collect_type_variables(&mut free);
    for param in &sig.param_types {
        param.collect_type_variables(&mut free);
    }
    // a method variable shadows a class variable of the same name
    free.retain(|var| {
        sig.type_params.iter().any(|d| d.name == var.name) || !class_type_params.iter().any(|c| c.name == var.name)
    });
    // declared bounds win over the bare occurrence
    let free: Vec<TypeVariable> = free
        .into_iter()
        .map(|var| {
            sig.type_params
                .iter()
                .find(|declared| declared.name == var.name)
                .cloned()
                .unwrap_or(var)
        })
        .collect();

    let mut out = format!("@{}\npublic ", config.override_annotation);
    if !free.is_empty() {
        let vars: Vec<String> = free.iter().map(|v| v.to_string()).collect();
        out.push_str(&format!("<{}> ", vars.join(", ")));
    }
    out.push_str(&format!("{} {}(", sig.return_type, sig.name));

    let params: Vec<String> = sig
        .param_types
        .iter()
        .enumerate()
        .map(|(i, ty)| {
            let name = sig
                .param_names
                .get(i)
                .filter(|n| !n.is_empty())
                .cloned()
                .unwrap_or_else(|| format!("arg{}", i));
            format!("{} {}", ty, name)
        })
        .collect();
    out.push_str(&params.join(", "));
    out.push(')');

    let thrown: Vec<String> = sig
        .thrown
        .iter()
        .filter(|t| !t.contains_unknown())
        .map(|t| t.to_string())
        .collect();
    if !thrown.is_empty() {
        out.push_str(&format!(" throws {}", thrown.join(", ")));
    }

    out.push_str(&format!(
        " {{\n{}throw new {}();\n}}",
        " ".repeat(config.indent),
        config.stub_exception
    ));
    Some(TextBlock(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JavaType;

    fn config() -> Config {
        Config::default()
    }

    #[test]
    fn renders_simple_stub() {
        let sig = Signature::method("name", JavaType::named("p.Old")).returning(JavaType::named("java.lang.String"));
        let text = synthesize(&sig, &[], &config()).unwrap();
        assert_eq!(
            text.as_str(),
            "@Override\npublic java.lang.String name() {\n    throw new java.lang.UnsupportedOperationException();\n}"
        );
    }

    #[test]
    fn declares_free_type_variables_with_bounds() {
        let bounded = TypeVariable::with_bounds(
            "U",
            vec![JavaType::named("java.lang.Number"), JavaType::named("java.lang.Runnable")],
        );
        let sig = Signature::method("transform", JavaType::named("p.Api"))
            .with_type_param(TypeVariable::new("T"))
            .with_type_param(bounded.clone())
            .with_param(
                JavaType::parameterized("java.util.Map", vec![JavaType::type_var("T"), JavaType::TypeVariable(bounded)]),
                "input",
            )
            .with_param(JavaType::array(JavaType::type_var("E")), "")
            .returning(JavaType::parameterized("java.util.List", vec![JavaType::type_var("T")]));
        let class_vars = vec![TypeVariable::new("E")];
        let text = synthesize(&sig, &class_vars, &config()).unwrap();
        assert!(text.as_str().starts_with(
            "@Override\npublic <T, U extends java.lang.Number & java.lang.Runnable> java.util.List<T> transform(java.util.Map<T, U> input, E[] arg1) {"
        ));
    }

    #[test]
    fn method_variable_shadowing_a_class_variable_is_declared() {
        let sig = Signature::method("convert", JavaType::named("p.Conv"))
            .with_type_param(TypeVariable::new("T"))
            .with_param(JavaType::type_var("T"), "x")
            .returning(JavaType::type_var("T"));
        let class_vars = vec![TypeVariable::new("T")];
        let text = synthesize(&sig, &class_vars, &config()).unwrap();
        assert!(text.as_str().contains("public <T> T convert(T x) {"), "{}", text.as_str());
    }

    #[test]
    fn drops_unresolved_thrown_types_and_skips_unresolved_signatures() {
        let sig = Signature::method("close", JavaType::named("p.Res"))
            .throwing(JavaType::named("java.io.IOException"))
            .throwing(JavaType::Unknown);
        let text = synthesize(&sig, &[], &config()).unwrap();
        assert!(text.as_str().contains("public void close() throws java.io.IOException {"));

        let unresolved = Signature::method("load", JavaType::named("p.Res")).with_param(JavaType::Unknown, "x");
        assert!(synthesize(&unresolved, &[], &config()).is_none());
    }

    #[test]
    fn honors_configured_exception_and_indent() {
        let config = Config::default()
            .with_stub_exception("java.lang.IllegalStateException")
            .with_indent(2);
        let sig = Signature::method("run", JavaType::named("java.lang.Runnable"));
        let text = synthesize(&sig, &[], &config).unwrap();
        assert!(text.as_str().ends_with("{\n  throw new java.lang.IllegalStateException();\n}"));
    }
}
