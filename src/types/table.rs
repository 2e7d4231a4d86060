use super::{ClassKind, ClassType, JavaType, Primitive, Signature, TypeVariable};
use crate::consts::OBJECT_TYPE;
use crate::error::Result;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Declared members of one class, in the class's own terms
#[derive(Debug, Clone, PartialEq)]
pub struct ClassInfo {
    pub ty: ClassType,
    pub methods: Vec<Signature>,
    pub constructors: Vec<Signature>,
}

impl ClassInfo {
    pub fn new(ty: ClassType) -> Self {
        Self {
            ty,
            methods: Vec::new(),
            constructors: Vec::new(),
        }
    }

    pub fn fqn(&self) -> &str {
        &self.ty.fqn
    }

    /// Add a method declared by this class; the declaring type is filled in
    pub fn with_method(mut self, sig: Signature) -> Self {
        let sig = sig.with_declaring_type(self.ty.as_type());
        self.methods.push(sig);
        self
    }

    pub fn with_constructor(mut self, mut sig: Signature) -> Self {
        sig.declaring_type = self.ty.as_type();
        sig.flags.is_constructor = true;
        self.constructors.push(sig);
        self
    }

    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Signature> {
        self.methods.iter().filter(move |m| m.name == name)
    }

    /// Constructors as Java sees them: a class declaring none has an implicit
    /// no-argument constructor
    pub fn has_constructor_arity(&self, arity: usize) -> bool {
        if self.constructors.is_empty() {
            return arity == 0 && !self.ty.is_interface();
        }
        self.constructors.iter().any(|c| c.arity() == arity)
    }
}

/// Lookup of resolved class declarations by fully qualified name
///
/// Every hierarchy query in the engine goes through this trait, so callers can
/// back it with a prebuilt table, a classpath scan, or a test fixture.
pub trait TypeSystem {
    fn class_info(&self, fqn: &str) -> Option<&ClassInfo>;

    fn contains(&self, fqn: &str) -> bool {
        self.class_info(fqn).is_some()
    }
}

/// In-memory [`TypeSystem`] built from Java declaration sources
#[derive(Debug, Clone)]
pub struct TypeTable {
    classes: HashMap<String, ClassInfo>,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

// Global cache for classpath tables to avoid rescanning per source file
static CLASSPATH_TABLE_CACHE: OnceCell<(PathBuf, Arc<TypeTable>)> = OnceCell::new();

impl TypeTable {
    /// Table seeded with the `java.lang` types the passes rely on
    pub fn new() -> Self {
        let mut table = Self::empty();
        table.insert_lang_types();
        table
    }

    pub fn empty() -> Self {
        Self {
            classes: HashMap::new(),
        }
    }

    pub fn insert(&mut self, info: ClassInfo) {
        log::trace!("type table: declare {}", info.fqn());
        self.classes.insert(info.ty.fqn.clone(), info);
    }

    pub fn remove(&mut self, fqn: &str) -> Option<ClassInfo> {
        self.classes.remove(fqn)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(|k| k.as_str())
    }

    /// Seeded table extended with the declarations in `sources`
    pub fn from_sources(sources: &[&str]) -> Result<Self> {
        let mut table = Self::new();
        table.add_sources(sources)?;
        Ok(table)
    }

    pub fn add_source(&mut self, source: &str) -> Result<()> {
        self.add_sources(&[source])
    }

    /// Declare every class in `sources`
    ///
    /// Two phases: all class names are entered first so references between
    /// the sources resolve regardless of order, then full declarations.
    pub fn add_sources(&mut self, sources: &[&str]) -> Result<()> {
        let units = crate::parser::parse_compilation_units(sources)?;
        for unit in &units {
            for header in crate::attr::declare_headers(unit) {
                if !self.classes.contains_key(header.fqn()) {
                    self.insert(header);
                }
            }
        }
        let mut declared = Vec::new();
        for unit in units {
            declared.extend(crate::attr::declare_types(unit, self));
        }
        for info in declared {
            self.insert(info);
        }
        Ok(())
    }

    /// Seeded table extended with every `.java` file under `dir`
    ///
    /// Files that fail to parse are skipped with a warning; the table is a
    /// best-effort view and missing classes only make verdicts `Unknown`.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut sources = Vec::new();
        for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if entry.file_type().is_file() && path.extension().map_or(false, |e| e == "java") {
                let source = fs::read_to_string(path)?;
                if crate::parser::parse_compilation_unit(&source).is_ok() {
                    log::debug!("[classpath] indexed {}", path.display());
                    sources.push(source);
                } else {
                    log::warn!("[classpath] skipping unparsable {}", path.display());
                }
            }
        }
        let refs: Vec<&str> = sources.iter().map(|s| s.as_str()).collect();
        Self::from_sources(&refs)
    }

    /// [`TypeTable::load_dir`] memoized for the first directory requested
    pub fn load_dir_cached(dir: impl AsRef<Path>) -> Result<Arc<TypeTable>> {
        let dir = dir.as_ref();
        if let Some((cached_dir, cached)) = CLASSPATH_TABLE_CACHE.get() {
            if cached_dir == dir {
                return Ok(Arc::clone(cached));
            }
        }
        let table = Arc::new(Self::load_dir(dir)?);
        let _ = CLASSPATH_TABLE_CACHE.set((dir.to_path_buf(), Arc::clone(&table)));
        Ok(table)
    }

    fn insert_lang_types(&mut self) {
        let object = JavaType::object;
        let string = || JavaType::named("java.lang.String");
        let int = || JavaType::Primitive(Primitive::Int);
        let t = || JavaType::type_var("T");

        self.insert(
            ClassInfo::new(ClassType::new(OBJECT_TYPE, ClassKind::Class))
                .with_method(
                    Signature::method("equals", object())
                        .with_param(object(), "obj")
                        .returning(JavaType::Primitive(Primitive::Boolean)),
                )
                .with_method(Signature::method("hashCode", object()).returning(int()))
                .with_method(Signature::method("toString", object()).returning(string()))
                .with_method(
                    Signature::method("clone", object())
                        .returning(object())
                        .throwing(JavaType::named("java.lang.CloneNotSupportedException")),
                )
                .with_method(
                    Signature::method("finalize", object()).throwing(JavaType::named("java.lang.Throwable")),
                ),
        );

        for name in ["String", "Boolean", "Character", "Void", "Math", "System"] {
            self.insert(ClassInfo::new(ClassType::class(format!("java.lang.{}", name))));
        }
        self.insert(ClassInfo::new(
            ClassType::class("java.lang.Class").with_type_params(vec![TypeVariable::new("T")]),
        ));
        self.insert(
            ClassInfo::new(ClassType::class("java.lang.Number").abstract_class())
                .with_method(Signature::method("intValue", object()).returning(int()).abstract_member())
                .with_method(
                    Signature::method("longValue", object())
                        .returning(JavaType::Primitive(Primitive::Long))
                        .abstract_member(),
                ),
        );
        for name in ["Integer", "Long", "Double", "Float", "Short", "Byte"] {
            self.insert(ClassInfo::new(
                ClassType::class(format!("java.lang.{}", name))
                    .with_supertype(Some(JavaType::named("java.lang.Number"))),
            ));
        }

        let mut parent = JavaType::object();
        for name in [
            "java.lang.Throwable",
            "java.lang.Exception",
            "java.lang.RuntimeException",
        ] {
            self.insert(
                ClassInfo::new(ClassType::class(name).with_supertype(Some(parent.clone())))
                    .with_constructor(Signature::constructor(JavaType::named(name)))
                    .with_constructor(
                        Signature::constructor(JavaType::named(name)).with_param(string(), "message"),
                    ),
            );
            parent = JavaType::named(name);
        }
        for name in [
            "java.lang.UnsupportedOperationException",
            "java.lang.IllegalArgumentException",
            "java.lang.IllegalStateException",
            "java.lang.NullPointerException",
        ] {
            self.insert(
                ClassInfo::new(
                    ClassType::class(name).with_supertype(Some(JavaType::named("java.lang.RuntimeException"))),
                )
                .with_constructor(Signature::constructor(JavaType::named(name)))
                .with_constructor(Signature::constructor(JavaType::named(name)).with_param(string(), "message")),
            );
        }
        self.insert(
            ClassInfo::new(ClassType::class("java.lang.Error").with_supertype(Some(JavaType::named("java.lang.Throwable"))))
                .with_constructor(Signature::constructor(JavaType::named("java.lang.Error"))),
        );

        self.insert(
            ClassInfo::new(ClassType::interface("java.lang.Runnable"))
                .with_method(Signature::method("run", object()).abstract_member()),
        );
        self.insert(
            ClassInfo::new(ClassType::interface("java.lang.AutoCloseable")).with_method(
                Signature::method("close", object())
                    .throwing(JavaType::named("java.lang.Exception"))
                    .abstract_member(),
            ),
        );
        self.insert(
            ClassInfo::new(ClassType::interface("java.lang.Comparable").with_type_params(vec![TypeVariable::new("T")]))
                .with_method(
                    Signature::method("compareTo", object())
                        .with_param(t(), "o")
                        .returning(int())
                        .abstract_member(),
                ),
        );
        self.insert(
            ClassInfo::new(ClassType::interface("java.lang.Iterable").with_type_params(vec![TypeVariable::new("T")]))
                .with_method(
                    Signature::method("iterator", object())
                        .returning(JavaType::parameterized("java.util.Iterator", vec![t()]))
                        .abstract_member(),
                ),
        );
        self.insert(
            ClassInfo::new(ClassType::interface("java.lang.CharSequence"))
                .with_method(Signature::method("length", object()).returning(int()).abstract_member())
                .with_method(
                    Signature::method("charAt", object())
                        .with_param(int(), "index")
                        .returning(JavaType::Primitive(Primitive::Char))
                        .abstract_member(),
                ),
        );
        for name in ["Cloneable", "Override", "Deprecated", "SuppressWarnings", "FunctionalInterface"] {
            self.insert(ClassInfo::new(ClassType::interface(format!("java.lang.{}", name))));
        }
    }
}

impl TypeSystem for TypeTable {
    fn class_info(&self, fqn: &str) -> Option<&ClassInfo> {
        self.classes.get(fqn)
    }
}

impl<T: TypeSystem + ?Sized> TypeSystem for Arc<T> {
    fn class_info(&self, fqn: &str) -> Option<&ClassInfo> {
        (**self).class_info(fqn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn seeded_with_root_and_lang_types() {
        let table = TypeTable::new();
        let object = table.class_info(OBJECT_TYPE).unwrap();
        assert!(object.ty.supertype.is_none());
        assert!(object.methods_named("toString").next().is_some());
        let runnable = table.class_info("java.lang.Runnable").unwrap();
        assert!(runnable.ty.is_interface());
        assert!(runnable.methods[0].is_abstract());
        assert_eq!(
            runnable.methods[0].declaring_type,
            JavaType::named("java.lang.Runnable")
        );
    }

    #[test]
    fn implicit_no_arg_constructor() {
        let table = TypeTable::new();
        assert!(table.class_info("java.lang.String").unwrap().has_constructor_arity(0));
        let exception = table.class_info("java.lang.Exception").unwrap();
        assert!(exception.has_constructor_arity(1));
        assert!(!exception.has_constructor_arity(2));
    }

    #[test]
    fn sources_may_reference_each_other_in_any_order() {
        let table = TypeTable::from_sources(&[
            "package p; public class Child extends Parent<String> { }",
            "package p; public abstract class Parent<T> { public abstract T getValue(); }",
        ])
        .unwrap();
        let child = table.class_info("p.Child").unwrap();
        assert_eq!(
            child.ty.supertype.as_ref().map(|t| t.to_string()).as_deref(),
            Some("p.Parent<java.lang.String>")
        );
        let parent = table.class_info("p.Parent").unwrap();
        assert_eq!(parent.methods[0].return_type, JavaType::type_var("T"));
        assert!(parent.methods[0].is_abstract());
    }

    #[test]
    fn load_dir_walks_java_files_and_skips_broken_ones() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("org/example");
        fs::create_dir_all(&nested).unwrap();
        let mut good = fs::File::create(nested.join("Base.java")).unwrap();
        writeln!(good, "package org.example; public interface Base {{ void apply(); }}").unwrap();
        let mut broken = fs::File::create(nested.join("Broken.java")).unwrap();
        writeln!(broken, "package org.example; class Broken {{ int x = ; }}").unwrap();
        fs::write(nested.join("notes.txt"), "not java").unwrap();

        let table = TypeTable::load_dir(dir.path()).unwrap();
        assert!(table.contains("org.example.Base"));
        assert!(!table.contains("org.example.Broken"));
    }
}
