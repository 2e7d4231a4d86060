// Common test utilities
#![allow(dead_code)]

use retarget::ast::{ClassDecl, CompilationUnit};
use retarget::types::TypeTable;
use retarget::{load_unit, print_unit, Config};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Type table seeded with `java.lang` plus the given declarations
pub fn table(sources: &[&str]) -> TypeTable {
    TypeTable::from_sources(sources).expect("declarations should parse")
}

/// Parse and attribute `source`; the returned table also knows the unit's
/// own classes
pub fn load(source: &str, table: &TypeTable) -> (CompilationUnit, TypeTable) {
    load_unit(source, table).expect("source should parse")
}

pub fn print(unit: &CompilationUnit) -> String {
    print_unit(unit, &Config::default())
}

/// First top-level class of `unit`
pub fn first_class(unit: &CompilationUnit) -> &ClassDecl {
    unit.type_decls.first().expect("unit declares a class")
}

/// Printed text with blank lines dropped and indentation stripped, so
/// assertions do not depend on layout
pub fn normalized(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
