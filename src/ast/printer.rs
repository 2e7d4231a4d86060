use super::nodes::*;
use super::visitor::AstVisitor;
use super::CompilationUnit;

/// Renders an AST back to Java source
///
/// Output is normalized: one member per line group, a blank line between
/// members, and `indent` spaces per nesting level.
pub struct AstPrinter {
    indent_width: usize,
    indent_level: usize,
    output: String,
}

impl AstPrinter {
    pub fn new(indent_width: usize) -> Self {
        Self {
            indent_width,
            indent_level: 0,
            output: String::new(),
        }
    }

    pub fn print(&mut self, unit: &CompilationUnit) -> String {
        self.output.clear();
        self.indent_level = 0;
        self.visit_compilation_unit(unit);
        std::mem::take(&mut self.output)
    }

    pub fn print_expr(&mut self, expr: &Expr) -> String {
        self.output.clear();
        self.write_expr(expr);
        std::mem::take(&mut self.output)
    }

    fn indent(&mut self) {
        self.indent_level += 1;
    }

    fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent_level * self.indent_width {
            self.output.push(' ');
        }
    }

    fn writeln(&mut self, s: &str) {
        self.write_indent();
        self.output.push_str(s);
        self.output.push('\n');
    }

    fn write(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn write_annotation_lines(&mut self, annotations: &[Annotation]) {
        for annotation in annotations {
            let text = self.annotation_text(annotation);
            self.writeln(&text);
        }
    }

    fn annotation_text(&mut self, annotation: &Annotation) -> String {
        let mut text = format!("@{}", annotation.name);
        if !annotation.arguments.is_empty() {
            let args: Vec<String> = annotation
                .arguments
                .iter()
                .map(|arg| match arg {
                    AnnotationArg::Value(e) => AstPrinter::new(self.indent_width).print_expr(e),
                    AnnotationArg::Named(name, e) => {
                        format!("{} = {}", name, AstPrinter::new(self.indent_width).print_expr(e))
                    }
                })
                .collect();
            text.push('(');
            text.push_str(&args.join(", "));
            text.push(')');
        }
        text
    }

    fn modifiers_text(modifiers: &[Modifier]) -> String {
        modifiers.iter().map(|m| format!("{} ", m.keyword())).collect()
    }

    fn type_params_text(params: &[TypeParam]) -> String {
        if params.is_empty() {
            return String::new();
        }
        let rendered: Vec<String> = params.iter().map(|p| p.to_string()).collect();
        format!("<{}>", rendered.join(", "))
    }

    fn parameters_text(params: &[Parameter]) -> String {
        params
            .iter()
            .map(|p| {
                let mut text = Self::modifiers_text(&p.modifiers);
                for annotation in &p.annotations {
                    text.push_str(&format!("@{} ", annotation.name));
                }
                if p.varargs {
                    text.push_str(&format!("{}... {}", p.type_ref, p.name));
                } else {
                    text.push_str(&format!("{} {}", p.type_ref, p.name));
                }
                text
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn throws_text(throws: &[TypeRef]) -> String {
        if throws.is_empty() {
            return String::new();
        }
        let names: Vec<String> = throws.iter().map(|t| t.to_string()).collect();
        format!(" throws {}", names.join(", "))
    }

    /// Class body members, each separated by a blank line
    fn write_members(&mut self, members: &[ClassMember]) {
        for (i, member) in members.iter().enumerate() {
            if i > 0 {
                self.output.push('\n');
            }
            match member {
                ClassMember::Field(field) => self.visit_field_decl(field),
                ClassMember::Method(method) => self.visit_method_decl(method),
                ClassMember::Constructor(ctor) => self.visit_constructor_decl(ctor),
                ClassMember::Initializer(init) => {
                    self.write_indent();
                    if init.is_static {
                        self.write("static ");
                    }
                    self.write_block_inline(&init.body);
                    self.output.push('\n');
                }
                ClassMember::TypeDecl(nested) => self.visit_class_decl(nested),
            }
        }
    }

    /// Writes `{ ... }` starting at the current position; the closing brace is
    /// indented at the current level and not followed by a newline
    fn write_block_inline(&mut self, block: &Block) {
        self.write("{\n");
        self.indent();
        for stmt in &block.statements {
            self.visit_stmt(stmt);
        }
        self.dedent();
        self.write_indent();
        self.write("}");
    }

    /// Branch of an `if`/`while`: blocks stay on the header line, single
    /// statements go on their own indented line
    fn write_branch(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(block) => {
                self.write(" ");
                self.write_block_inline(block);
            }
            other => {
                self.write("\n");
                self.indent();
                self.visit_stmt(other);
                self.dedent();
                // visit_stmt ended the line; trim it so callers can continue
                if self.output.ends_with('\n') {
                    self.output.pop();
                }
            }
        }
    }

    fn write_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(lit) => match &lit.value {
                Literal::Number(n) => self.write(n),
                Literal::Boolean(b) => self.write(if *b { "true" } else { "false" }),
                Literal::String(s) => {
                    let text = format!("\"{}\"", s);
                    self.write(&text);
                }
                Literal::Char(c) => {
                    let text = format!("'{}'", c);
                    self.write(&text);
                }
                Literal::Null => self.write("null"),
            },
            Expr::Identifier(id) => self.write(&id.name),
            Expr::Binary(b) => {
                self.write_expr(&b.left);
                let op = format!(" {} ", b.operator.symbol());
                self.write(&op);
                self.write_expr(&b.right);
            }
            Expr::Unary(u) => match u.operator {
                UnaryOp::PostInc => {
                    self.write_expr(&u.operand);
                    self.write("++");
                }
                UnaryOp::PostDec => {
                    self.write_expr(&u.operand);
                    self.write("--");
                }
                op => {
                    self.write(match op {
                        UnaryOp::Plus => "+",
                        UnaryOp::Minus => "-",
                        UnaryOp::Not => "!",
                        UnaryOp::PreInc => "++",
                        _ => "--",
                    });
                    self.write_expr(&u.operand);
                }
            },
            Expr::Assignment(a) => {
                self.write_expr(&a.target);
                let op = format!(" {} ", a.operator.symbol());
                self.write(&op);
                self.write_expr(&a.value);
            }
            Expr::MethodCall(call) => {
                if let Some(target) = &call.target {
                    self.write_expr(target);
                    self.write(".");
                }
                self.write(&call.name);
                self.write_args(&call.arguments);
            }
            Expr::FieldAccess(fa) => {
                self.write_expr(&fa.target);
                self.write(".");
                self.write(&fa.name);
            }
            Expr::ArrayAccess(aa) => {
                self.write_expr(&aa.array);
                self.write("[");
                self.write_expr(&aa.index);
                self.write("]");
            }
            Expr::Cast(c) => {
                let prefix = format!("({}) ", c.target_type);
                self.write(&prefix);
                self.write_expr(&c.expr);
            }
            Expr::InstanceOf(io) => {
                self.write_expr(&io.expr);
                let suffix = format!(" instanceof {}", io.target_type);
                self.write(&suffix);
            }
            Expr::Conditional(c) => {
                self.write_expr(&c.condition);
                self.write(" ? ");
                self.write_expr(&c.then_expr);
                self.write(" : ");
                self.write_expr(&c.else_expr);
            }
            Expr::New(n) => {
                let head = format!("new {}", n.target_type);
                self.write(&head);
                if n.diamond {
                    self.write("<>");
                }
                self.write_args(&n.arguments);
                if let Some(body) = &n.anonymous_body {
                    self.write(" {\n");
                    self.indent();
                    self.write_members(&body.body);
                    self.dedent();
                    self.write_indent();
                    self.write("}");
                }
            }
            Expr::Parenthesized(inner) => {
                self.write("(");
                self.write_expr(inner);
                self.write(")");
            }
            Expr::ArrayInitializer(values) => {
                self.write("{");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.write_expr(value);
                }
                self.write("}");
            }
        }
    }

    fn write_args(&mut self, args: &[Expr]) {
        self.write("(");
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.write_expr(arg);
        }
        self.write(")");
    }
}

impl AstVisitor for AstPrinter {
    fn visit_compilation_unit(&mut self, unit: &CompilationUnit) {
        if let Some(package) = &unit.package_decl {
            self.writeln(&package.to_string());
            if !unit.imports.is_empty() || !unit.type_decls.is_empty() {
                self.output.push('\n');
            }
        }

        for import in &unit.imports {
            self.writeln(&import.to_string());
        }
        if !unit.imports.is_empty() && !unit.type_decls.is_empty() {
            self.output.push('\n');
        }

        for (i, class) in unit.type_decls.iter().enumerate() {
            if i > 0 {
                self.output.push('\n');
            }
            self.visit_class_decl(class);
        }
    }

    fn visit_class_decl(&mut self, class: &ClassDecl) {
        self.write_annotation_lines(&class.annotations);
        let mut header = Self::modifiers_text(&class.modifiers);
        header.push_str(match class.kind {
            crate::types::ClassKind::Interface => "interface ",
            crate::types::ClassKind::Class => "class ",
        });
        header.push_str(&class.name);
        header.push_str(&Self::type_params_text(&class.type_params));
        if let Some(extends) = &class.extends {
            header.push_str(&format!(" extends {}", extends));
        }
        if !class.implements.is_empty() {
            let keyword = if class.is_interface() { "extends" } else { "implements" };
            let names: Vec<String> = class.implements.iter().map(|t| t.to_string()).collect();
            header.push_str(&format!(" {} {}", keyword, names.join(", ")));
        }
        header.push_str(" {");
        self.writeln(&header);
        self.indent();
        self.write_members(&class.body);
        self.dedent();
        self.writeln("}");
    }

    fn visit_field_decl(&mut self, field: &FieldDecl) {
        self.write_annotation_lines(&field.annotations);
        self.write_indent();
        let decl = format!(
            "{}{} {}",
            Self::modifiers_text(&field.modifiers),
            field.type_ref,
            field.name
        );
        self.write(&decl);
        if let Some(init) = &field.initializer {
            self.write(" = ");
            self.write_expr(init);
        }
        self.write(";\n");
    }

    fn visit_method_decl(&mut self, method: &MethodDecl) {
        self.write_annotation_lines(&method.annotations);
        self.write_indent();
        let mut header = Self::modifiers_text(&method.modifiers);
        if !method.type_params.is_empty() {
            header.push_str(&Self::type_params_text(&method.type_params));
            header.push(' ');
        }
        header.push_str(&format!(
            "{} {}({}){}",
            method.return_type,
            method.name,
            Self::parameters_text(&method.parameters),
            Self::throws_text(&method.throws)
        ));
        self.write(&header);
        match &method.body {
            Some(body) => {
                self.write(" ");
                self.write_block_inline(body);
                self.write("\n");
            }
            None => self.write(";\n"),
        }
    }

    fn visit_constructor_decl(&mut self, ctor: &ConstructorDecl) {
        self.write_annotation_lines(&ctor.annotations);
        self.write_indent();
        let header = format!(
            "{}{}({}){} ",
            Self::modifiers_text(&ctor.modifiers),
            ctor.name,
            Self::parameters_text(&ctor.parameters),
            Self::throws_text(&ctor.throws)
        );
        self.write(&header);
        self.write_block_inline(&ctor.body);
        self.write("\n");
    }

    fn visit_block(&mut self, block: &Block) {
        self.write_indent();
        self.write_block_inline(block);
        self.write("\n");
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expression(s) => {
                self.write_indent();
                self.write_expr(&s.expr);
                self.write(";\n");
            }
            Stmt::Declaration(decl) => {
                self.write_indent();
                let head = format!("{}{} ", Self::modifiers_text(&decl.modifiers), decl.type_ref);
                self.write(&head);
                for (i, var) in decl.variables.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.write(&var.name);
                    if let Some(init) = &var.initializer {
                        self.write(" = ");
                        self.write_expr(init);
                    }
                }
                self.write(";\n");
            }
            Stmt::If(s) => {
                self.write_indent();
                self.write("if (");
                self.write_expr(&s.condition);
                self.write(")");
                self.write_branch(&s.then_branch);
                if let Some(else_branch) = &s.else_branch {
                    if matches!(**else_branch, Stmt::Block(_)) || matches!(**else_branch, Stmt::If(_)) {
                        self.write(" else");
                    } else {
                        self.write("\n");
                        self.write_indent();
                        self.write("else");
                    }
                    if let Stmt::If(_) = **else_branch {
                        // `else if` continues on the same line
                        self.write(" ");
                        let start = self.output.len();
                        self.visit_stmt(else_branch);
                        let rendered = self.output.split_off(start);
                        self.write(rendered.trim_start());
                        if self.output.ends_with('\n') {
                            self.output.pop();
                        }
                    } else {
                        self.write_branch(else_branch);
                    }
                }
                self.write("\n");
            }
            Stmt::While(s) => {
                self.write_indent();
                self.write("while (");
                self.write_expr(&s.condition);
                self.write(")");
                self.write_branch(&s.body);
                self.write("\n");
            }
            Stmt::Return(s) => {
                self.write_indent();
                match &s.value {
                    Some(value) => {
                        self.write("return ");
                        self.write_expr(value);
                        self.write(";\n");
                    }
                    None => self.write("return;\n"),
                }
            }
            Stmt::Throw(s) => {
                self.write_indent();
                self.write("throw ");
                self.write_expr(&s.expr);
                self.write(";\n");
            }
            Stmt::Block(block) => self.visit_block(block),
            Stmt::Empty => self.writeln(";"),
        }
    }
}
