use super::{AstVisitor, Span};
use crate::types::{ClassKind, ClassType, JavaType, Signature};
use std::fmt;

/// Common behavior of nodes that carry a source span
pub trait AstNode {
    fn span(&self) -> Span;
    fn accept<V: AstVisitor + ?Sized>(&self, visitor: &mut V);
}

// Package and Import Declarations
#[derive(Debug, Clone)]
pub struct PackageDecl {
    pub name: String,
    pub span: Span,
}

impl fmt::Display for PackageDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "package {};", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    pub name: String,
    pub is_static: bool,
    pub is_wildcard: bool,
    pub span: Span,
}

impl ImportDecl {
    pub fn single(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_static: false,
            is_wildcard: false,
            span: Span::synthetic(),
        }
    }

    /// Last segment of a single-type import
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

impl fmt::Display for ImportDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_static {
            write!(f, "import static ")?;
        } else {
            write!(f, "import ")?;
        }

        if self.is_wildcard {
            write!(f, "{}.*;", self.name)
        } else {
            write!(f, "{};", self.name)
        }
    }
}

/// Class or interface declaration; anonymous class bodies use an empty name
#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub modifiers: Vec<Modifier>,
    pub annotations: Vec<Annotation>,
    pub kind: ClassKind,
    pub name: String,
    pub type_params: Vec<TypeParam>,
    /// Superclass clause; always `None` for interfaces
    pub extends: Option<TypeRef>,
    /// `implements` clause of a class, `extends` clause of an interface
    pub implements: Vec<TypeRef>,
    pub body: Vec<ClassMember>,
    pub resolved: Option<ClassType>,
    pub span: Span,
}

impl ClassDecl {
    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    pub fn is_abstract(&self) -> bool {
        self.modifiers.contains(&Modifier::Abstract)
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.body.iter().filter_map(|m| match m {
            ClassMember::Method(method) => Some(method),
            _ => None,
        })
    }

    pub fn constructors(&self) -> impl Iterator<Item = &ConstructorDecl> {
        self.body.iter().filter_map(|m| match m {
            ClassMember::Constructor(ctor) => Some(ctor),
            _ => None,
        })
    }

    pub fn nested_classes(&self) -> impl Iterator<Item = &ClassDecl> {
        self.body.iter().filter_map(|m| match m {
            ClassMember::TypeDecl(class) => Some(class),
            _ => None,
        })
    }

    pub fn find_method(&self, name: &str) -> Option<&MethodDecl> {
        self.methods().find(|m| m.name == name)
    }

    /// Fully qualified name recorded by attribution
    pub fn fqn(&self) -> Option<&str> {
        self.resolved.as_ref().map(|t| t.fqn.as_str())
    }
}

impl AstNode for ClassDecl {
    fn span(&self) -> Span {
        self.span
    }

    fn accept<V: AstVisitor + ?Sized>(&self, visitor: &mut V) {
        visitor.visit_class_decl(self)
    }
}

impl fmt::Display for ClassDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ClassKind::Interface => write!(f, "interface {}", self.name),
            ClassKind::Class => write!(f, "class {}", self.name),
        }
    }
}

// Modifiers and Annotations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Abstract,
    Static,
    Final,
    Native,
    Synchronized,
    Transient,
    Volatile,
    Strictfp,
    // Java 8: default interface method
    Default,
}

impl Modifier {
    pub fn keyword(self) -> &'static str {
        match self {
            Modifier::Public => "public",
            Modifier::Protected => "protected",
            Modifier::Private => "private",
            Modifier::Abstract => "abstract",
            Modifier::Static => "static",
            Modifier::Final => "final",
            Modifier::Native => "native",
            Modifier::Synchronized => "synchronized",
            Modifier::Transient => "transient",
            Modifier::Volatile => "volatile",
            Modifier::Strictfp => "strictfp",
            Modifier::Default => "default",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Annotation {
    pub name: String,
    pub arguments: Vec<AnnotationArg>,
    pub span: Span,
}

impl Annotation {
    pub fn marker(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
            span: Span::synthetic(),
        }
    }

    /// Whether this annotation names `simple`, written plain or as `java.lang.<simple>`
    pub fn is_named(&self, simple: &str) -> bool {
        self.name == simple
            || self
                .name
                .strip_prefix("java.lang.")
                .map_or(false, |rest| rest == simple)
    }
}

#[derive(Debug, Clone)]
pub enum AnnotationArg {
    Value(Expr),
    Named(String, Expr),
}

// Type References
#[derive(Debug, Clone)]
pub struct TypeRef {
    /// Name as written: primitive keyword, simple name or qualified name
    pub name: String,
    pub type_args: Vec<TypeArg>,
    pub array_dims: usize,
    pub resolved: Option<JavaType>,
    pub span: Span,
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_args: Vec::new(),
            array_dims: 0,
            resolved: None,
            span: Span::synthetic(),
        }
    }

    /// Resolved fully qualified name of the base type, if attribution found one
    pub fn resolved_fqn(&self) -> Option<&str> {
        self.resolved.as_ref().and_then(|t| t.fqn())
    }

    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

impl AstNode for TypeRef {
    fn span(&self) -> Span {
        self.span
    }

    fn accept<V: AstVisitor + ?Sized>(&self, visitor: &mut V) {
        visitor.visit_type_ref(self)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.type_args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.type_args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ">")?;
        }
        for _ in 0..self.array_dims {
            write!(f, "[]")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum TypeArg {
    Type(TypeRef),
    Wildcard(WildcardType),
}

impl fmt::Display for TypeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeArg::Type(t) => write!(f, "{}", t),
            TypeArg::Wildcard(w) => match &w.bound {
                None => write!(f, "?"),
                Some((BoundKind::Extends, t)) => write!(f, "? extends {}", t),
                Some((BoundKind::Super, t)) => write!(f, "? super {}", t),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct WildcardType {
    pub bound: Option<(BoundKind, TypeRef)>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundKind {
    Extends,
    Super,
}

#[derive(Debug, Clone)]
pub struct TypeParam {
    pub name: String,
    pub bounds: Vec<TypeRef>,
    pub span: Span,
}

impl fmt::Display for TypeParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for (i, bound) in self.bounds.iter().enumerate() {
            let sep = if i == 0 { " extends " } else { " & " };
            write!(f, "{}{}", sep, bound)?;
        }
        Ok(())
    }
}

// Class Members
#[derive(Debug, Clone)]
pub enum ClassMember {
    Field(FieldDecl),
    Method(MethodDecl),
    Constructor(ConstructorDecl),
    Initializer(InitializerBlock),
    TypeDecl(ClassDecl),
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub modifiers: Vec<Modifier>,
    pub annotations: Vec<Annotation>,
    pub type_ref: TypeRef,
    pub name: String,
    pub initializer: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub modifiers: Vec<Modifier>,
    pub annotations: Vec<Annotation>,
    pub type_params: Vec<TypeParam>,
    pub return_type: TypeRef,
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub throws: Vec<TypeRef>,
    pub body: Option<Block>,
    pub binding: Option<Signature>,
    pub span: Span,
}

impl MethodDecl {
    pub fn has_annotation(&self, simple: &str) -> bool {
        self.annotations.iter().any(|a| a.is_named(simple))
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.contains(&Modifier::Static)
    }
}

impl AstNode for MethodDecl {
    fn span(&self) -> Span {
        self.span
    }

    fn accept<V: AstVisitor + ?Sized>(&self, visitor: &mut V) {
        visitor.visit_method_decl(self)
    }
}

#[derive(Debug, Clone)]
pub struct ConstructorDecl {
    pub modifiers: Vec<Modifier>,
    pub annotations: Vec<Annotation>,
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub throws: Vec<TypeRef>,
    pub body: Block,
    pub binding: Option<Signature>,
    pub span: Span,
}

impl AstNode for ConstructorDecl {
    fn span(&self) -> Span {
        self.span
    }

    fn accept<V: AstVisitor + ?Sized>(&self, visitor: &mut V) {
        visitor.visit_constructor_decl(self)
    }
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub modifiers: Vec<Modifier>,
    pub annotations: Vec<Annotation>,
    pub type_ref: TypeRef,
    pub name: String,
    pub varargs: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct InitializerBlock {
    pub is_static: bool,
    pub body: Block,
    pub span: Span,
}

// Statements
#[derive(Debug, Clone)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

impl AstNode for Block {
    fn span(&self) -> Span {
        self.span
    }

    fn accept<V: AstVisitor + ?Sized>(&self, visitor: &mut V) {
        visitor.visit_block(self)
    }
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Expression(ExprStmt),
    Declaration(VarDeclStmt),
    If(IfStmt),
    While(WhileStmt),
    Return(ReturnStmt),
    Throw(ThrowStmt),
    Block(Block),
    Empty,
}

#[derive(Debug, Clone)]
pub struct ExprStmt {
    pub expr: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct VarDeclStmt {
    pub modifiers: Vec<Modifier>,
    pub type_ref: TypeRef,
    pub variables: Vec<VariableDeclarator>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct VariableDeclarator {
    pub name: String,
    pub initializer: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Box<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ThrowStmt {
    pub expr: Expr,
    pub span: Span,
}

// Expressions
#[derive(Debug, Clone)]
pub enum Expr {
    Literal(LiteralExpr),
    /// Plain names, including `this` and `super`
    Identifier(IdentifierExpr),
    Binary(BinaryExpr),
    Unary(UnaryExpr),
    Assignment(AssignmentExpr),
    MethodCall(MethodCallExpr),
    FieldAccess(FieldAccessExpr),
    ArrayAccess(ArrayAccessExpr),
    Cast(CastExpr),
    InstanceOf(InstanceOfExpr),
    Conditional(ConditionalExpr),
    New(NewExpr),
    Parenthesized(Box<Expr>),
    // Used for annotation element array values like @SuppressWarnings({"a", "b"})
    ArrayInitializer(Vec<Expr>),
}

impl Expr {
    pub fn is_identifier(&self, name: &str) -> bool {
        matches!(self, Expr::Identifier(id) if id.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct LiteralExpr {
    pub value: Literal,
    pub span: Span,
}

/// Literal values keep their source lexeme so printing is lossless
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(String),
    Boolean(bool),
    /// Contents between the quotes, escapes kept as written
    String(String),
    Char(String),
    Null,
}

#[derive(Debug, Clone)]
pub struct IdentifierExpr {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct BinaryExpr {
    pub left: Box<Expr>,
    pub operator: BinaryOp,
    pub right: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add, Sub, Mul, Div, Mod,
    Lt, Le, Gt, Ge, Eq, Ne,
    And, Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UnaryExpr {
    pub operator: UnaryOp,
    pub operand: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus, Minus, Not, PreInc, PreDec, PostInc, PostDec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOp {
    Assign, AddAssign, SubAssign, MulAssign, DivAssign, ModAssign,
}

impl AssignmentOp {
    pub fn symbol(self) -> &'static str {
        match self {
            AssignmentOp::Assign => "=",
            AssignmentOp::AddAssign => "+=",
            AssignmentOp::SubAssign => "-=",
            AssignmentOp::MulAssign => "*=",
            AssignmentOp::DivAssign => "/=",
            AssignmentOp::ModAssign => "%=",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssignmentExpr {
    pub target: Box<Expr>,
    pub operator: AssignmentOp,
    pub value: Box<Expr>,
    pub span: Span,
}

/// Method invocation; `super(..)` and `this(..)` are calls named `super`/`this`
/// with no target
#[derive(Debug, Clone)]
pub struct MethodCallExpr {
    pub target: Option<Box<Expr>>,
    pub name: String,
    pub arguments: Vec<Expr>,
    pub binding: Option<Signature>,
    pub span: Span,
}

impl MethodCallExpr {
    /// `super(..)`
    pub fn is_super_constructor_call(&self) -> bool {
        self.target.is_none() && self.name == "super"
    }

    /// `super.name(..)`
    pub fn is_super_method_call(&self) -> bool {
        self.target.as_deref().map_or(false, |t| t.is_identifier("super"))
    }

    pub fn is_super_call(&self) -> bool {
        self.is_super_constructor_call() || self.is_super_method_call()
    }
}

impl AstNode for MethodCallExpr {
    fn span(&self) -> Span {
        self.span
    }

    fn accept<V: AstVisitor + ?Sized>(&self, visitor: &mut V) {
        visitor.visit_method_call_expr(self)
    }
}

#[derive(Debug, Clone)]
pub struct FieldAccessExpr {
    pub target: Box<Expr>,
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ArrayAccessExpr {
    pub array: Box<Expr>,
    pub index: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct CastExpr {
    pub target_type: TypeRef,
    pub expr: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct InstanceOfExpr {
    pub expr: Box<Expr>,
    pub target_type: TypeRef,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ConditionalExpr {
    pub condition: Box<Expr>,
    pub then_expr: Box<Expr>,
    pub else_expr: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct NewExpr {
    pub target_type: TypeRef,
    /// `new Foo<>()`
    pub diamond: bool,
    pub arguments: Vec<Expr>,
    pub anonymous_body: Option<ClassDecl>,
    pub span: Span,
}
