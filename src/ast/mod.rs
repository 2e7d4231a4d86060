//! Abstract Syntax Tree for the Java subset the rewrite passes operate on
//!
//! Nodes carry optional resolved bindings (`TypeRef::resolved`,
//! `MethodDecl::binding`, `MethodCallExpr::binding`, `ClassDecl::resolved`)
//! filled in by [`crate::attr`]. A missing binding means the type system could
//! not resolve the node.

mod nodes;
mod printer;
mod visitor;

pub use nodes::*;
pub use printer::*;
pub use visitor::*;

use std::fmt;

/// Source location information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Location {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self { line, column, offset }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Span of source code (start and end locations)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: Location,
    pub end: Location,
}

impl Span {
    pub fn new(start: Location, end: Location) -> Self {
        Self { start, end }
    }

    /// Span for synthesized nodes that have no source text
    pub fn synthetic() -> Self {
        Self::default()
    }
}

/// Root node: one source file
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    pub package_decl: Option<PackageDecl>,
    pub imports: Vec<ImportDecl>,
    pub type_decls: Vec<ClassDecl>,
    pub span: Span,
}

impl CompilationUnit {
    pub fn package_name(&self) -> Option<&str> {
        self.package_decl.as_ref().map(|p| p.name.as_str())
    }

    /// Find a top-level or nested class by simple name
    pub fn find_class(&self, name: &str) -> Option<&ClassDecl> {
        fn find<'a>(classes: &'a [ClassDecl], name: &str) -> Option<&'a ClassDecl> {
            for class in classes {
                if class.name == name {
                    return Some(class);
                }
                let nested: Vec<&ClassDecl> = class.nested_classes().collect();
                for inner in nested {
                    if let Some(found) = find(std::slice::from_ref(inner), name) {
                        return Some(found);
                    }
                }
            }
            None
        }
        find(&self.type_decls, name)
    }
}

impl fmt::Display for CompilationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", AstPrinter::new(4).print(self))
    }
}
