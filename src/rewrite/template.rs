use super::stub::TextBlock;
use super::RewriteContext;
use crate::ast::ClassDecl;
use crate::attr::attribute_member;
use crate::error::{Error, Result};
use crate::parser::parse_member;

/// Parse `text` as a member, attribute it inside `class` and append it as the
/// class's last member
pub fn splice_member(class: &mut ClassDecl, text: &TextBlock, ctx: &RewriteContext<'_>) -> Result<()> {
    let class_type = class
        .resolved
        .clone()
        .ok_or_else(|| Error::template_error(format!("class {} has no resolved type", class.name)))?;
    let member = parse_member(text.as_str())
        .map_err(|e| Error::template_error(format!("rendered member does not parse: {}", e)))?;
    class.body.push(attribute_member(member, &class_type, ctx.types));
    log::trace!("template: spliced member into {}", class_type.fqn);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ClassMember;
    use crate::attr::attribute_unit;
    use crate::config::Config;
    use crate::parser::parse_compilation_unit;
    use crate::types::{JavaType, TypeTable};

    #[test]
    fn spliced_member_is_attributed_in_class_scope() {
        let table = TypeTable::new();
        let config = Config::default();
        let ctx = RewriteContext::new(&table, &config);
        let unit = attribute_unit(parse_compilation_unit("package p; class Box<E> { }").unwrap(), &table);
        let mut class = unit.type_decls.into_iter().next().unwrap();

        let text = TextBlock::new("@Override\npublic E get(int index) {\n    throw new java.lang.UnsupportedOperationException();\n}");
        splice_member(&mut class, &text, &ctx).unwrap();
        let Some(ClassMember::Method(method)) = class.body.last() else {
            panic!("expected a method");
        };
        let binding = method.binding.as_ref().unwrap();
        assert_eq!(binding.return_type, JavaType::type_var("E"));
        assert_eq!(binding.declaring_type.to_string(), "p.Box<E>");
    }

    #[test]
    fn malformed_text_is_a_template_error() {
        let table = TypeTable::new();
        let config = Config::default();
        let ctx = RewriteContext::new(&table, &config);
        let unit = attribute_unit(parse_compilation_unit("class A { }").unwrap(), &table);
        let mut class = unit.type_decls.into_iter().next().unwrap();
        let err = splice_member(&mut class, &TextBlock::new("public void broken( {"), &ctx).unwrap_err();
        assert!(matches!(err, Error::Template { .. }));
        assert!(class.body.is_empty());
    }
}
