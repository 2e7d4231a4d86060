use once_cell::sync::Lazy;
use std::collections::HashSet;

// Hierarchy walks: upper bound on visited types per walk
pub const MAX_HIERARCHY_STEPS: usize = 10_000;

// Parser: guard for loops that must consume at least one token per iteration
pub const PARSER_MAX_LOOP_ITERS: usize = 200_000;

pub const OBJECT_TYPE: &str = "java.lang.Object";
pub const OVERRIDE_ANNOTATION: &str = "Override";
pub const UNSUPPORTED_OPERATION: &str = "java.lang.UnsupportedOperationException";

// Well-known simple names from java.lang that resolve without an import
pub const JAVA_LANG_SIMPLE_TYPES: &[&str] = &[
    "String", "Object", "Throwable", "Cloneable", "Iterable", "Comparable",
    "Integer", "Long", "Float", "Double", "Boolean", "Character", "Number",
    "Short", "Byte", "Void", "Class", "Runnable", "CharSequence", "AutoCloseable",
    "Exception", "RuntimeException", "Error", "AssertionError",
    "UnsupportedOperationException", "IllegalArgumentException", "IllegalStateException",
    "NullPointerException", "Override", "Deprecated", "SuppressWarnings", "FunctionalInterface",
    "System", "Math",
];

// Members every class inherits from the root type; never candidates for stubbing
pub static ROOT_MEMBER_NAMES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "equals", "hashCode", "toString", "clone", "finalize",
        "getClass", "notify", "notifyAll", "wait",
    ]
    .into_iter()
    .collect()
});

pub fn is_java_lang_simple(name: &str) -> bool {
    JAVA_LANG_SIMPLE_TYPES.contains(&name)
}
