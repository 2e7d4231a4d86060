use super::*;

/// Read-only AST traversal
///
/// Every method defaults to walking its children, so implementors override
/// only the nodes they care about and call the matching `walk_*` function to
/// keep descending.
pub trait AstVisitor {
    fn visit_compilation_unit(&mut self, unit: &CompilationUnit) {
        walk_compilation_unit(self, unit)
    }

    fn visit_class_decl(&mut self, class: &ClassDecl) {
        walk_class_decl(self, class)
    }

    fn visit_field_decl(&mut self, field: &FieldDecl) {
        walk_field_decl(self, field)
    }

    fn visit_method_decl(&mut self, method: &MethodDecl) {
        walk_method_decl(self, method)
    }

    fn visit_constructor_decl(&mut self, ctor: &ConstructorDecl) {
        walk_constructor_decl(self, ctor)
    }

    fn visit_block(&mut self, block: &Block) {
        walk_block(self, block)
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt)
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr)
    }

    fn visit_method_call_expr(&mut self, call: &MethodCallExpr) {
        walk_method_call_expr(self, call)
    }

    fn visit_type_ref(&mut self, type_ref: &TypeRef) {
        walk_type_ref(self, type_ref)
    }

    fn visit_type_param(&mut self, param: &TypeParam) {
        for bound in &param.bounds {
            self.visit_type_ref(bound);
        }
    }

    fn visit_annotation(&mut self, _annotation: &Annotation) {}
}

pub fn walk_compilation_unit<V: AstVisitor + ?Sized>(v: &mut V, unit: &CompilationUnit) {
    for class in &unit.type_decls {
        v.visit_class_decl(class);
    }
}

pub fn walk_class_decl<V: AstVisitor + ?Sized>(v: &mut V, class: &ClassDecl) {
    for annotation in &class.annotations {
        v.visit_annotation(annotation);
    }
    for param in &class.type_params {
        v.visit_type_param(param);
    }
    if let Some(extends) = &class.extends {
        v.visit_type_ref(extends);
    }
    for iface in &class.implements {
        v.visit_type_ref(iface);
    }
    for member in &class.body {
        match member {
            ClassMember::Field(field) => v.visit_field_decl(field),
            ClassMember::Method(method) => v.visit_method_decl(method),
            ClassMember::Constructor(ctor) => v.visit_constructor_decl(ctor),
            ClassMember::Initializer(init) => v.visit_block(&init.body),
            ClassMember::TypeDecl(nested) => v.visit_class_decl(nested),
        }
    }
}

pub fn walk_field_decl<V: AstVisitor + ?Sized>(v: &mut V, field: &FieldDecl) {
    for annotation in &field.annotations {
        v.visit_annotation(annotation);
    }
    v.visit_type_ref(&field.type_ref);
    if let Some(init) = &field.initializer {
        v.visit_expr(init);
    }
}

pub fn walk_method_decl<V: AstVisitor + ?Sized>(v: &mut V, method: &MethodDecl) {
    for annotation in &method.annotations {
        v.visit_annotation(annotation);
    }
    for param in &method.type_params {
        v.visit_type_param(param);
    }
    v.visit_type_ref(&method.return_type);
    for param in &method.parameters {
        v.visit_type_ref(&param.type_ref);
    }
    for thrown in &method.throws {
        v.visit_type_ref(thrown);
    }
    if let Some(body) = &method.body {
        v.visit_block(body);
    }
}

pub fn walk_constructor_decl<V: AstVisitor + ?Sized>(v: &mut V, ctor: &ConstructorDecl) {
    for annotation in &ctor.annotations {
        v.visit_annotation(annotation);
    }
    for param in &ctor.parameters {
        v.visit_type_ref(&param.type_ref);
    }
    for thrown in &ctor.throws {
        v.visit_type_ref(thrown);
    }
    v.visit_block(&ctor.body);
}

pub fn walk_block<V: AstVisitor + ?Sized>(v: &mut V, block: &Block) {
    for stmt in &block.statements {
        v.visit_stmt(stmt);
    }
}

pub fn walk_stmt<V: AstVisitor + ?Sized>(v: &mut V, stmt: &Stmt) {
    match stmt {
        Stmt::Expression(s) => v.visit_expr(&s.expr),
        Stmt::Declaration(decl) => {
            v.visit_type_ref(&decl.type_ref);
            for var in &decl.variables {
                if let Some(init) = &var.initializer {
                    v.visit_expr(init);
                }
            }
        }
        Stmt::If(s) => {
            v.visit_expr(&s.condition);
            v.visit_stmt(&s.then_branch);
            if let Some(else_branch) = &s.else_branch {
                v.visit_stmt(else_branch);
            }
        }
        Stmt::While(s) => {
            v.visit_expr(&s.condition);
            v.visit_stmt(&s.body);
        }
        Stmt::Return(s) => {
            if let Some(value) = &s.value {
                v.visit_expr(value);
            }
        }
        Stmt::Throw(s) => v.visit_expr(&s.expr),
        Stmt::Block(block) => v.visit_block(block),
        Stmt::Empty => {}
    }
}

pub fn walk_expr<V: AstVisitor + ?Sized>(v: &mut V, expr: &Expr) {
    match expr {
        Expr::Literal(_) | Expr::Identifier(_) => {}
        Expr::Binary(b) => {
            v.visit_expr(&b.left);
            v.visit_expr(&b.right);
        }
        Expr::Unary(u) => v.visit_expr(&u.operand),
        Expr::Assignment(a) => {
            v.visit_expr(&a.target);
            v.visit_expr(&a.value);
        }
        Expr::MethodCall(call) => v.visit_method_call_expr(call),
        Expr::FieldAccess(fa) => v.visit_expr(&fa.target),
        Expr::ArrayAccess(aa) => {
            v.visit_expr(&aa.array);
            v.visit_expr(&aa.index);
        }
        Expr::Cast(c) => {
            v.visit_type_ref(&c.target_type);
            v.visit_expr(&c.expr);
        }
        Expr::InstanceOf(io) => {
            v.visit_expr(&io.expr);
            v.visit_type_ref(&io.target_type);
        }
        Expr::Conditional(c) => {
            v.visit_expr(&c.condition);
            v.visit_expr(&c.then_expr);
            v.visit_expr(&c.else_expr);
        }
        Expr::New(n) => {
            v.visit_type_ref(&n.target_type);
            for arg in &n.arguments {
                v.visit_expr(arg);
            }
            if let Some(body) = &n.anonymous_body {
                v.visit_class_decl(body);
            }
        }
        Expr::Parenthesized(inner) => v.visit_expr(inner),
        Expr::ArrayInitializer(values) => {
            for value in values {
                v.visit_expr(value);
            }
        }
    }
}

pub fn walk_method_call_expr<V: AstVisitor + ?Sized>(v: &mut V, call: &MethodCallExpr) {
    if let Some(target) = &call.target {
        v.visit_expr(target);
    }
    for arg in &call.arguments {
        v.visit_expr(arg);
    }
}

pub fn walk_type_ref<V: AstVisitor + ?Sized>(v: &mut V, type_ref: &TypeRef) {
    for arg in &type_ref.type_args {
        match arg {
            TypeArg::Type(t) => v.visit_type_ref(t),
            TypeArg::Wildcard(w) => {
                if let Some((_, bound)) = &w.bound {
                    v.visit_type_ref(bound);
                }
            }
        }
    }
}

/// In-place AST traversal used by passes that edit names or nested classes
pub trait AstVisitorMut {
    fn visit_class_decl_mut(&mut self, class: &mut ClassDecl) {
        walk_class_decl_mut(self, class)
    }

    fn visit_block_mut(&mut self, block: &mut Block) {
        walk_block_mut(self, block)
    }

    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        walk_stmt_mut(self, stmt)
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr)
    }

    fn visit_type_ref_mut(&mut self, type_ref: &mut TypeRef) {
        walk_type_ref_mut(self, type_ref)
    }
}

pub fn walk_class_decl_mut<V: AstVisitorMut + ?Sized>(v: &mut V, class: &mut ClassDecl) {
    for param in &mut class.type_params {
        for bound in &mut param.bounds {
            v.visit_type_ref_mut(bound);
        }
    }
    if let Some(extends) = &mut class.extends {
        v.visit_type_ref_mut(extends);
    }
    for iface in &mut class.implements {
        v.visit_type_ref_mut(iface);
    }
    for member in &mut class.body {
        match member {
            ClassMember::Field(field) => {
                v.visit_type_ref_mut(&mut field.type_ref);
                if let Some(init) = &mut field.initializer {
                    v.visit_expr_mut(init);
                }
            }
            ClassMember::Method(method) => {
                for param in &mut method.type_params {
                    for bound in &mut param.bounds {
                        v.visit_type_ref_mut(bound);
                    }
                }
                v.visit_type_ref_mut(&mut method.return_type);
                for param in &mut method.parameters {
                    v.visit_type_ref_mut(&mut param.type_ref);
                }
                for thrown in &mut method.throws {
                    v.visit_type_ref_mut(thrown);
                }
                if let Some(body) = &mut method.body {
                    v.visit_block_mut(body);
                }
            }
            ClassMember::Constructor(ctor) => {
                for param in &mut ctor.parameters {
                    v.visit_type_ref_mut(&mut param.type_ref);
                }
                for thrown in &mut ctor.throws {
                    v.visit_type_ref_mut(thrown);
                }
                v.visit_block_mut(&mut ctor.body);
            }
            ClassMember::Initializer(init) => v.visit_block_mut(&mut init.body),
            ClassMember::TypeDecl(nested) => v.visit_class_decl_mut(nested),
        }
    }
}

pub fn walk_block_mut<V: AstVisitorMut + ?Sized>(v: &mut V, block: &mut Block) {
    for stmt in &mut block.statements {
        v.visit_stmt_mut(stmt);
    }
}

pub fn walk_stmt_mut<V: AstVisitorMut + ?Sized>(v: &mut V, stmt: &mut Stmt) {
    match stmt {
        Stmt::Expression(s) => v.visit_expr_mut(&mut s.expr),
        Stmt::Declaration(decl) => {
            v.visit_type_ref_mut(&mut decl.type_ref);
            for var in &mut decl.variables {
                if let Some(init) = &mut var.initializer {
                    v.visit_expr_mut(init);
                }
            }
        }
        Stmt::If(s) => {
            v.visit_expr_mut(&mut s.condition);
            v.visit_stmt_mut(&mut s.then_branch);
            if let Some(else_branch) = &mut s.else_branch {
                v.visit_stmt_mut(else_branch);
            }
        }
        Stmt::While(s) => {
            v.visit_expr_mut(&mut s.condition);
            v.visit_stmt_mut(&mut s.body);
        }
        Stmt::Return(s) => {
            if let Some(value) = &mut s.value {
                v.visit_expr_mut(value);
            }
        }
        Stmt::Throw(s) => v.visit_expr_mut(&mut s.expr),
        Stmt::Block(block) => v.visit_block_mut(block),
        Stmt::Empty => {}
    }
}

pub fn walk_expr_mut<V: AstVisitorMut + ?Sized>(v: &mut V, expr: &mut Expr) {
    match expr {
        Expr::Literal(_) | Expr::Identifier(_) => {}
        Expr::Binary(b) => {
            v.visit_expr_mut(&mut b.left);
            v.visit_expr_mut(&mut b.right);
        }
        Expr::Unary(u) => v.visit_expr_mut(&mut u.operand),
        Expr::Assignment(a) => {
            v.visit_expr_mut(&mut a.target);
            v.visit_expr_mut(&mut a.value);
        }
        Expr::MethodCall(call) => {
            if let Some(target) = &mut call.target {
                v.visit_expr_mut(target);
            }
            for arg in &mut call.arguments {
                v.visit_expr_mut(arg);
            }
        }
        Expr::FieldAccess(fa) => v.visit_expr_mut(&mut fa.target),
        Expr::ArrayAccess(aa) => {
            v.visit_expr_mut(&mut aa.array);
            v.visit_expr_mut(&mut aa.index);
        }
        Expr::Cast(c) => {
            v.visit_type_ref_mut(&mut c.target_type);
            v.visit_expr_mut(&mut c.expr);
        }
        Expr::InstanceOf(io) => {
            v.visit_expr_mut(&mut io.expr);
            v.visit_type_ref_mut(&mut io.target_type);
        }
        Expr::Conditional(c) => {
            v.visit_expr_mut(&mut c.condition);
            v.visit_expr_mut(&mut c.then_expr);
            v.visit_expr_mut(&mut c.else_expr);
        }
        Expr::New(n) => {
            v.visit_type_ref_mut(&mut n.target_type);
            for arg in &mut n.arguments {
                v.visit_expr_mut(arg);
            }
            if let Some(body) = &mut n.anonymous_body {
                v.visit_class_decl_mut(body);
            }
        }
        Expr::Parenthesized(inner) => v.visit_expr_mut(inner),
        Expr::ArrayInitializer(values) => {
            for value in values {
                v.visit_expr_mut(value);
            }
        }
    }
}

pub fn walk_type_ref_mut<V: AstVisitorMut + ?Sized>(v: &mut V, type_ref: &mut TypeRef) {
    for arg in &mut type_ref.type_args {
        match arg {
            TypeArg::Type(t) => v.visit_type_ref_mut(t),
            TypeArg::Wildcard(w) => {
                if let Some((_, bound)) = &mut w.bound {
                    v.visit_type_ref_mut(bound);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_compilation_unit;

    #[derive(Default)]
    struct TypeNames(Vec<String>);

    impl AstVisitor for TypeNames {
        fn visit_type_ref(&mut self, type_ref: &TypeRef) {
            self.0.push(type_ref.name.clone());
            walk_type_ref(self, type_ref);
        }
    }

    #[test]
    fn collects_type_refs_including_arguments_and_anonymous_bodies() {
        let unit = parse_compilation_unit(
            r#"
class A extends B<C> {
    void run() {
        Runnable r = new Runnable() {
            public void run() {}
        };
    }
}
"#,
        )
        .unwrap();
        let mut names = TypeNames::default();
        names.visit_compilation_unit(&unit);
        assert_eq!(names.0, vec!["B", "C", "void", "Runnable", "Runnable", "void"]);
    }

    struct Renamer;

    impl AstVisitorMut for Renamer {
        fn visit_type_ref_mut(&mut self, type_ref: &mut TypeRef) {
            if type_ref.name == "Old" {
                type_ref.name = "New".to_string();
            }
            walk_type_ref_mut(self, type_ref);
        }
    }

    #[test]
    fn mutable_walk_reaches_nested_type_arguments() {
        let mut unit = parse_compilation_unit("class A { java.util.List<Old> xs; }").unwrap();
        Renamer.visit_class_decl_mut(&mut unit.type_decls[0]);
        assert!(unit.to_string().contains("java.util.List<New> xs;"));
    }
}
