//! Class-hierarchy retargeting for Java sources
//!
//! Changes which type a class extends and repairs what the change breaks:
//! stale `@Override` markers, abstract members the new hierarchy requires,
//! and `super` calls that no longer resolve.
//!
//! ## Architecture
//!
//! - **parser**: Lexical analysis and parsing of a Java subset into an AST
//! - **ast**: Syntax tree, visitors and the source printer
//! - **types**: Resolved types, signatures, the type table and hierarchy walks
//! - **attr**: Name resolution and binding of declarations and super calls
//! - **rewrite**: The rewrite passes and the retargeting state machine
//! - **bin**: Command-line driver
//!
//! ## Flow
//!
//! ```text
//! Java Source → Parser → AST → Attr → Rewrite passes → Printer → Java Source
//!                                ↑
//!                  TypeTable (classpath sources + the unit itself)
//! ```
//!
//! Type information is treated as best effort. Whatever cannot be resolved
//! makes the affected check return [`types::Verdict::Unknown`], and the pass
//! leaves that member as it is.

pub mod ast;
pub mod attr;
pub mod config;
pub mod consts;
pub mod error;
pub mod parser;
pub mod rewrite;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};

use ast::CompilationUnit;
use types::TypeTable;

/// Parse and attribute `source` against `table`
///
/// The unit's own declarations are added to a copy of `table` first, so
/// classes in the same file see each other.
pub fn load_unit(source: &str, table: &TypeTable) -> Result<(CompilationUnit, TypeTable)> {
    let mut table = table.clone();
    table.add_source(source)?;
    let unit = parser::parse_compilation_unit(source)?;
    let unit = attr::attribute_unit(unit, &table);
    log::debug!("loaded unit with {} type declaration(s)", unit.type_decls.len());
    Ok((unit, table))
}

/// Render `unit` with the configured indent
pub fn print_unit(unit: &CompilationUnit, config: &Config) -> String {
    ast::AstPrinter::new(config.indent).print(unit)
}
