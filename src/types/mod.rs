//! Type model shared by attribution and the rewrite passes
//!
//! Types are fully qualified and immutable. A [`JavaType::Unknown`] anywhere in
//! a type means the type system could not resolve it; queries over such types
//! answer [`Verdict::Unknown`] rather than guessing.

mod assign;
mod build;
mod hierarchy;
mod subst;
mod table;

pub use assign::{is_assignable, is_subclass};
pub use build::build_type;
pub use hierarchy::{ancestors, Ancestor, Ancestry};
pub use subst::SubstitutionMap;
pub use table::{ClassInfo, TypeSystem, TypeTable};

use crate::consts::OBJECT_TYPE;
use std::fmt;

/// Three-valued answer to a type query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Yes,
    No,
    Unknown,
}

impl Verdict {
    pub fn from_bool(b: bool) -> Self {
        if b {
            Verdict::Yes
        } else {
            Verdict::No
        }
    }

    pub fn is_yes(self) -> bool {
        self == Verdict::Yes
    }

    pub fn is_unknown(self) -> bool {
        self == Verdict::Unknown
    }

    /// `No` dominates, then `Unknown`
    pub fn and(self, other: Verdict) -> Verdict {
        match (self, other) {
            (Verdict::No, _) | (_, Verdict::No) => Verdict::No,
            (Verdict::Unknown, _) | (_, Verdict::Unknown) => Verdict::Unknown,
            _ => Verdict::Yes,
        }
    }

    /// `Yes` dominates, then `Unknown`
    pub fn or(self, other: Verdict) -> Verdict {
        match (self, other) {
            (Verdict::Yes, _) | (_, Verdict::Yes) => Verdict::Yes,
            (Verdict::Unknown, _) | (_, Verdict::Unknown) => Verdict::Unknown,
            _ => Verdict::No,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Void,
}

impl Primitive {
    pub fn keyword(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Char => "char",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Void => "void",
        }
    }

    pub fn from_keyword(s: &str) -> Option<Self> {
        Some(match s {
            "boolean" => Primitive::Boolean,
            "byte" => Primitive::Byte,
            "char" => Primitive::Char,
            "short" => Primitive::Short,
            "int" => Primitive::Int,
            "long" => Primitive::Long,
            "float" => Primitive::Float,
            "double" => Primitive::Double,
            "void" => Primitive::Void,
            _ => return None,
        })
    }
}

/// A declared type parameter; `bounds` are upper bounds, empty meaning `Object`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeVariable {
    pub name: String,
    pub bounds: Vec<JavaType>,
}

impl TypeVariable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bounds: Vec::new(),
        }
    }

    pub fn with_bounds(name: impl Into<String>, bounds: Vec<JavaType>) -> Self {
        Self {
            name: name.into(),
            bounds,
        }
    }

    /// Erasure: the first bound's erasure, or the root type
    pub fn erasure(&self) -> JavaType {
        self.bounds
            .first()
            .map(|b| b.erasure())
            .unwrap_or_else(JavaType::object)
    }
}

impl fmt::Display for TypeVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for (i, bound) in self.bounds.iter().enumerate() {
            let sep = if i == 0 { " extends " } else { " & " };
            write!(f, "{}{}", sep, bound)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WildcardBound {
    Extends(Box<JavaType>),
    Super(Box<JavaType>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JavaType {
    Primitive(Primitive),
    /// Non-generic or raw class reference
    Named(String),
    Parameterized { base: String, args: Vec<JavaType> },
    TypeVariable(TypeVariable),
    Array(Box<JavaType>),
    Wildcard(Option<WildcardBound>),
    Unknown,
}

impl JavaType {
    pub fn named(fqn: impl Into<String>) -> Self {
        JavaType::Named(fqn.into())
    }

    pub fn parameterized(base: impl Into<String>, args: Vec<JavaType>) -> Self {
        JavaType::Parameterized {
            base: base.into(),
            args,
        }
    }

    pub fn array(element: JavaType) -> Self {
        JavaType::Array(Box::new(element))
    }

    pub fn type_var(name: impl Into<String>) -> Self {
        JavaType::TypeVariable(TypeVariable::new(name))
    }

    pub fn object() -> Self {
        JavaType::Named(OBJECT_TYPE.to_string())
    }

    pub fn void() -> Self {
        JavaType::Primitive(Primitive::Void)
    }

    /// Fully qualified name of a class type, raw or parameterized
    pub fn fqn(&self) -> Option<&str> {
        match self {
            JavaType::Named(name) => Some(name),
            JavaType::Parameterized { base, .. } => Some(base),
            _ => None,
        }
    }

    pub fn type_args(&self) -> &[JavaType] {
        match self {
            JavaType::Parameterized { args, .. } => args,
            _ => &[],
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, JavaType::Unknown)
    }

    /// Whether any component of this type failed to resolve
    pub fn contains_unknown(&self) -> bool {
        match self {
            JavaType::Unknown => true,
            JavaType::Parameterized { args, .. } => args.iter().any(|a| a.contains_unknown()),
            JavaType::Array(element) => element.contains_unknown(),
            JavaType::TypeVariable(v) => v.bounds.iter().any(|b| b.contains_unknown()),
            JavaType::Wildcard(Some(WildcardBound::Extends(b)))
            | JavaType::Wildcard(Some(WildcardBound::Super(b))) => b.contains_unknown(),
            _ => false,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, JavaType::Primitive(p) if *p != Primitive::Void)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, JavaType::Primitive(Primitive::Void))
    }

    /// Reference types: classes, arrays and type variables
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            JavaType::Named(_)
                | JavaType::Parameterized { .. }
                | JavaType::Array(_)
                | JavaType::TypeVariable(_)
        )
    }

    /// Raw form of a class type; other types are returned as is
    pub fn raw(&self) -> JavaType {
        match self {
            JavaType::Parameterized { base, .. } => JavaType::Named(base.clone()),
            other => other.clone(),
        }
    }

    /// Type erasure as defined for method signatures
    pub fn erasure(&self) -> JavaType {
        match self {
            JavaType::Parameterized { base, .. } => JavaType::Named(base.clone()),
            JavaType::TypeVariable(v) => v.erasure(),
            JavaType::Array(element) => JavaType::array(element.erasure()),
            JavaType::Wildcard(Some(WildcardBound::Extends(b))) => b.erasure(),
            JavaType::Wildcard(_) => JavaType::object(),
            other => other.clone(),
        }
    }

    /// Erased type name used to compare signatures; `None` if unresolved
    pub fn erased_name(&self) -> Option<String> {
        if self.contains_unknown() {
            return None;
        }
        Some(self.erasure().to_string())
    }

    /// Replace type variables according to `map`
    pub fn substitute(&self, map: &SubstitutionMap) -> JavaType {
        if map.is_empty() {
            return self.clone();
        }
        match self {
            JavaType::TypeVariable(v) => match map.get(&v.name) {
                Some(replacement) => replacement.clone(),
                None => JavaType::TypeVariable(TypeVariable {
                    name: v.name.clone(),
                    bounds: v.bounds.iter().map(|b| b.substitute(map)).collect(),
                }),
            },
            JavaType::Parameterized { base, args } => JavaType::Parameterized {
                base: base.clone(),
                args: args.iter().map(|a| a.substitute(map)).collect(),
            },
            JavaType::Array(element) => JavaType::array(element.substitute(map)),
            JavaType::Wildcard(Some(WildcardBound::Extends(b))) => {
                JavaType::Wildcard(Some(WildcardBound::Extends(Box::new(b.substitute(map)))))
            }
            JavaType::Wildcard(Some(WildcardBound::Super(b))) => {
                JavaType::Wildcard(Some(WildcardBound::Super(Box::new(b.substitute(map)))))
            }
            other => other.clone(),
        }
    }

    /// Package of a class type: everything before the last dot
    pub fn package_name(&self) -> Option<&str> {
        self.fqn().and_then(|fqn| fqn.rsplit_once('.').map(|(pkg, _)| pkg))
    }

    pub fn simple_name(&self) -> Option<&str> {
        self.fqn().map(|fqn| fqn.rsplit('.').next().unwrap_or(fqn))
    }

    /// Type variables referenced anywhere in this type, bounds included,
    /// in first-occurrence order
    pub fn collect_type_variables(&self, out: &mut Vec<TypeVariable>) {
        match self {
            JavaType::TypeVariable(v) => {
                if !out.iter().any(|seen| seen.name == v.name) {
                    out.push(v.clone());
                    for bound in &v.bounds {
                        bound.collect_type_variables(out);
                    }
                }
            }
            JavaType::Parameterized { args, .. } => {
                for arg in args {
                    arg.collect_type_variables(out);
                }
            }
            JavaType::Array(element) => element.collect_type_variables(out),
            JavaType::Wildcard(Some(WildcardBound::Extends(b)))
            | JavaType::Wildcard(Some(WildcardBound::Super(b))) => b.collect_type_variables(out),
            _ => {}
        }
    }
}

impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JavaType::Primitive(p) => write!(f, "{}", p.keyword()),
            JavaType::Named(name) => write!(f, "{}", name),
            JavaType::Parameterized { base, args } => {
                write!(f, "{}<", base)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ">")
            }
            JavaType::TypeVariable(v) => write!(f, "{}", v.name),
            JavaType::Array(element) => write!(f, "{}[]", element),
            JavaType::Wildcard(None) => write!(f, "?"),
            JavaType::Wildcard(Some(WildcardBound::Extends(b))) => write!(f, "? extends {}", b),
            JavaType::Wildcard(Some(WildcardBound::Super(b))) => write!(f, "? super {}", b),
            JavaType::Unknown => write!(f, "<unknown>"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MemberFlags {
    pub is_abstract: bool,
    pub is_default: bool,
    pub is_static: bool,
    pub is_private: bool,
    pub is_constructor: bool,
}

/// Resolved signature of a method or constructor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub name: String,
    pub type_params: Vec<TypeVariable>,
    pub param_types: Vec<JavaType>,
    pub param_names: Vec<String>,
    pub return_type: JavaType,
    pub declaring_type: JavaType,
    pub thrown: Vec<JavaType>,
    pub flags: MemberFlags,
}

impl Signature {
    pub fn method(name: impl Into<String>, declaring_type: JavaType) -> Self {
        Self {
            name: name.into(),
            type_params: Vec::new(),
            param_types: Vec::new(),
            param_names: Vec::new(),
            return_type: JavaType::void(),
            declaring_type,
            thrown: Vec::new(),
            flags: MemberFlags::default(),
        }
    }

    pub fn constructor(declaring_type: JavaType) -> Self {
        let mut sig = Self::method("<init>", declaring_type);
        sig.flags.is_constructor = true;
        sig
    }

    pub fn with_param(mut self, ty: JavaType, name: impl Into<String>) -> Self {
        self.param_types.push(ty);
        self.param_names.push(name.into());
        self
    }

    pub fn returning(mut self, ty: JavaType) -> Self {
        self.return_type = ty;
        self
    }

    pub fn throwing(mut self, ty: JavaType) -> Self {
        self.thrown.push(ty);
        self
    }

    pub fn with_type_param(mut self, var: TypeVariable) -> Self {
        self.type_params.push(var);
        self
    }

    pub fn abstract_member(mut self) -> Self {
        self.flags.is_abstract = true;
        self
    }

    pub fn arity(&self) -> usize {
        self.param_types.len()
    }

    pub fn is_abstract(&self) -> bool {
        self.flags.is_abstract
    }

    pub fn is_constructor(&self) -> bool {
        self.flags.is_constructor
    }

    pub fn with_declaring_type(&self, declaring_type: JavaType) -> Self {
        Self {
            declaring_type,
            ..self.clone()
        }
    }

    /// Apply a class-level substitution; the signature's own type parameters
    /// shadow same-named entries in `map`
    pub fn substitute(&self, map: &SubstitutionMap) -> Self {
        let map = map.without(&self.type_params);
        if map.is_empty() {
            return self.clone();
        }
        Self {
            name: self.name.clone(),
            type_params: self
                .type_params
                .iter()
                .map(|v| TypeVariable {
                    name: v.name.clone(),
                    bounds: v.bounds.iter().map(|b| b.substitute(&map)).collect(),
                })
                .collect(),
            param_types: self.param_types.iter().map(|t| t.substitute(&map)).collect(),
            param_names: self.param_names.clone(),
            return_type: self.return_type.substitute(&map),
            declaring_type: self.declaring_type.clone(),
            thrown: self.thrown.iter().map(|t| t.substitute(&map)).collect(),
            flags: self.flags,
        }
    }

    /// Whether every parameter and the return type resolved
    pub fn is_fully_resolved(&self) -> bool {
        !self.return_type.contains_unknown() && !self.param_types.iter().any(|t| t.contains_unknown())
    }

    /// `name(erased, params)`; `None` if any parameter is unresolved
    pub fn erased_key(&self) -> Option<String> {
        let params = self
            .param_types
            .iter()
            .map(|t| t.erased_name())
            .collect::<Option<Vec<_>>>()?;
        Some(format!("{}({})", self.name, params.join(",")))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}(", self.declaring_type, self.name)?;
        for (i, ty) in self.param_types.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", ty)?;
        }
        write!(f, ")")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
}

/// Resolved type of a class or interface declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassType {
    pub fqn: String,
    pub kind: ClassKind,
    pub is_abstract: bool,
    pub type_params: Vec<TypeVariable>,
    /// `None` for interfaces and the root type
    pub supertype: Option<JavaType>,
    pub interfaces: Vec<JavaType>,
}

impl ClassType {
    pub fn new(fqn: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            fqn: fqn.into(),
            kind,
            is_abstract: kind == ClassKind::Interface,
            type_params: Vec::new(),
            supertype: None,
            interfaces: Vec::new(),
        }
    }

    pub fn class(fqn: impl Into<String>) -> Self {
        Self::new(fqn, ClassKind::Class).with_supertype(Some(JavaType::object()))
    }

    pub fn interface(fqn: impl Into<String>) -> Self {
        Self::new(fqn, ClassKind::Interface)
    }

    pub fn with_supertype(&self, supertype: Option<JavaType>) -> Self {
        Self {
            supertype,
            ..self.clone()
        }
    }

    pub fn with_interfaces(&self, interfaces: Vec<JavaType>) -> Self {
        Self {
            interfaces,
            ..self.clone()
        }
    }

    pub fn with_type_params(mut self, type_params: Vec<TypeVariable>) -> Self {
        self.type_params = type_params;
        self
    }

    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    /// The type as seen from inside its own declaration: parameterized by its
    /// own type variables when generic
    pub fn as_type(&self) -> JavaType {
        if self.type_params.is_empty() {
            JavaType::Named(self.fqn.clone())
        } else {
            JavaType::Parameterized {
                base: self.fqn.clone(),
                args: self
                    .type_params
                    .iter()
                    .cloned()
                    .map(JavaType::TypeVariable)
                    .collect(),
            }
        }
    }

    pub fn package_name(&self) -> Option<&str> {
        self.fqn.rsplit_once('.').map(|(pkg, _)| pkg)
    }

    /// Direct supertypes: superclass first, then interfaces
    pub fn direct_supertypes(&self) -> impl Iterator<Item = &JavaType> {
        self.supertype.iter().chain(self.interfaces.iter())
    }
}
