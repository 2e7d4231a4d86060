//! Parser module for Java sources
//!
//! Lexical analysis with `logos` and a recursive descent parser producing the
//! [`crate::ast`] tree. Parsed trees carry no bindings; run [`crate::attr`]
//! to resolve them.

pub mod error;
pub mod lexer;
pub mod parser;

pub use error::ParseError;
pub use lexer::{Lexer, LexicalToken, Token};
pub use parser::Parser;

use crate::ast::{ClassMember, CompilationUnit, TypeRef};
use crate::error::Result;

/// Parse a Java source file into an AST
pub fn parse_compilation_unit(source: &str) -> Result<CompilationUnit> {
    Parser::new(source)?.parse()
}

/// Parse several source files, failing on the first error
pub fn parse_compilation_units(sources: &[&str]) -> Result<Vec<CompilationUnit>> {
    sources.iter().map(|s| parse_compilation_unit(s)).collect()
}

/// Parse a single class member, such as a rendered method stub
pub fn parse_member(source: &str) -> Result<ClassMember> {
    Parser::new(source)?.parse_single_member()
}

/// Parse a type expression such as `java.util.List<T>`
pub fn parse_type_expr(source: &str) -> Result<TypeRef> {
    Parser::new(source)?.parse_single_type()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_class() {
        let source = r#"
package com.example;

public class HelloWorld {
    public static void main(String[] args) {
        System.out.println("Hello, World!");
    }
}
"#;

        let unit = parse_compilation_unit(source).expect("Failed to parse");
        assert_eq!(unit.type_decls.len(), 1);
        assert_eq!(unit.type_decls[0].name, "HelloWorld");
    }

    #[test]
    fn test_parse_with_imports() {
        let source = r#"
package com.example;

import java.util.List;
import java.util.ArrayList;

public class TestClass {
    private List<String> items = new ArrayList<>();
}
"#;

        let unit = parse_compilation_unit(source).expect("Failed to parse");
        assert_eq!(unit.imports.len(), 2);
    }

    #[test]
    fn test_parse_member_stub() {
        let member = parse_member(
            "@Override\npublic <T> java.util.List<T> transform(java.util.Map<java.lang.String, T> input) {\n    throw new java.lang.UnsupportedOperationException();\n}",
        )
        .unwrap();
        match member {
            ClassMember::Method(m) => {
                assert_eq!(m.name, "transform");
                assert_eq!(m.type_params.len(), 1);
            }
            other => panic!("unexpected member {other:?}"),
        }
    }

    #[test]
    fn test_parse_type_expr() {
        let t = parse_type_expr("java.util.Map<K, java.util.List<? extends V>>[]").unwrap();
        assert_eq!(t.name, "java.util.Map");
        assert_eq!(t.type_args.len(), 2);
        assert_eq!(t.array_dims, 1);
        assert!(parse_type_expr("List<").is_err());
    }
}
