//! Recursive descent parser for the Java subset used by the rewrite passes
//!
//! Covers package/import headers, classes and interfaces (nested and
//! anonymous), fields, methods, constructors, initializer blocks, and the
//! statement and expression forms that show up in method bodies being
//! retargeted. Anything else is reported as a [`ParseError`] rather than
//! guessed at.

use super::error::ParseError;
use super::lexer::{Lexer, LexicalToken, Token};
use crate::ast::*;
use crate::consts::PARSER_MAX_LOOP_ITERS;
use crate::error::Result;
use crate::types::ClassKind;

pub struct Parser {
    tokens: Vec<LexicalToken>,
    current: usize,
}

impl Parser {
    /// Create a new parser from source code
    pub fn new(source: &str) -> Result<Self> {
        let tokens = Lexer::new(source).tokenize().map_err(|message| ParseError::LexicalError {
            message,
            location: Location::default(),
        })?;
        Ok(Self { tokens, current: 0 })
    }

    /// Parse a whole source file
    pub fn parse(mut self) -> Result<CompilationUnit> {
        let start = self.location();

        let package_decl = if self.check(&Token::Package) {
            Some(self.parse_package_decl()?)
        } else {
            None
        };

        let mut imports = Vec::new();
        while self.check(&Token::Import) {
            imports.push(self.parse_import_decl()?);
        }

        let mut type_decls = Vec::new();
        while !self.is_at_end() {
            if self.match_token(&Token::Semicolon) {
                continue;
            }
            let (annotations, modifiers) = self.parse_annotations_and_modifiers()?;
            type_decls.push(self.parse_type_decl(annotations, modifiers)?);
        }

        Ok(CompilationUnit {
            package_decl,
            imports,
            type_decls,
            span: Span::new(start, self.previous_location()),
        })
    }

    /// Parse exactly one class member, as produced by a code template
    pub fn parse_single_member(mut self) -> Result<ClassMember> {
        let mut members = Vec::new();
        self.parse_class_member(None, &mut members)?;
        if !self.is_at_end() {
            return Err(self.error_here("end of member").into());
        }
        match members.len() {
            1 => Ok(members.remove(0)),
            n => Err(ParseError::invalid_syntax(
                format!("expected a single member, found {}", n),
                Location::default(),
            )
            .into()),
        }
    }

    /// Parse a standalone type expression such as `java.util.Map<K, V>[]`
    pub fn parse_single_type(mut self) -> Result<TypeRef> {
        let type_ref = self.parse_type_ref()?;
        if !self.is_at_end() {
            return Err(self.error_here("end of type").into());
        }
        Ok(type_ref)
    }

    // Helper methods
    fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    fn check(&self, token_type: &Token) -> bool {
        self.peek_at(0) == Some(token_type)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.current + offset).map(|t| t.token_type())
    }

    fn token_at(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index).map(|t| t.token_type())
    }

    fn advance(&mut self) -> LexicalToken {
        let token = self.tokens.get(self.current).cloned();
        if !self.is_at_end() {
            self.current += 1;
        }
        token.unwrap_or_else(|| LexicalToken::new(Token::Semicolon, String::new(), self.previous_location()))
    }

    fn match_token(&mut self, token_type: &Token) -> bool {
        if self.check(token_type) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    fn location(&self) -> Location {
        self.tokens
            .get(self.current)
            .map(|t| t.location())
            .unwrap_or_else(|| self.previous_location())
    }

    fn previous_location(&self) -> Location {
        if self.current == 0 {
            return Location::default();
        }
        self.tokens
            .get(self.current - 1)
            .map(|t| t.location())
            .unwrap_or_default()
    }

    fn span_from(&self, start: Location) -> Span {
        Span::new(start, self.previous_location())
    }

    fn error_here(&self, expected: &str) -> ParseError {
        match self.tokens.get(self.current) {
            Some(token) => ParseError::unexpected_token(expected, token.lexeme(), token.location()),
            None => ParseError::unexpected_end_of_input(expected, self.previous_location()),
        }
    }

    fn consume(&mut self, token_type: &Token, expected: &str) -> Result<LexicalToken> {
        if self.check(token_type) {
            Ok(self.advance())
        } else {
            Err(self.error_here(expected).into())
        }
    }

    fn parse_identifier(&mut self) -> Result<String> {
        Ok(self.consume(&Token::Identifier, "identifier")?.lexeme)
    }

    fn parse_qualified_name(&mut self) -> Result<String> {
        let mut name = self.parse_identifier()?;
        while self.check(&Token::Dot) && self.peek_at(1) == Some(&Token::Identifier) {
            self.advance();
            name.push('.');
            name.push_str(&self.parse_identifier()?);
        }
        Ok(name)
    }

    fn parse_package_decl(&mut self) -> Result<PackageDecl> {
        let start = self.location();
        self.consume(&Token::Package, "'package'")?;
        let name = self.parse_qualified_name()?;
        self.consume(&Token::Semicolon, "';' after package name")?;
        Ok(PackageDecl {
            name,
            span: self.span_from(start),
        })
    }

    fn parse_import_decl(&mut self) -> Result<ImportDecl> {
        let start = self.location();
        self.consume(&Token::Import, "'import'")?;
        let is_static = self.match_token(&Token::Static);
        let mut name = self.parse_identifier()?;
        let mut is_wildcard = false;
        while self.match_token(&Token::Dot) {
            if self.match_token(&Token::Star) {
                is_wildcard = true;
                break;
            }
            name.push('.');
            name.push_str(&self.parse_identifier()?);
        }
        self.consume(&Token::Semicolon, "';' after import")?;
        Ok(ImportDecl {
            name,
            is_static,
            is_wildcard,
            span: self.span_from(start),
        })
    }

    fn parse_annotations_and_modifiers(&mut self) -> Result<(Vec<Annotation>, Vec<Modifier>)> {
        let mut annotations = Vec::new();
        let mut modifiers = Vec::new();
        loop {
            if self.check(&Token::At) && self.peek_at(1) != Some(&Token::Interface) {
                annotations.push(self.parse_annotation()?);
            } else if let Some(modifier) = self.parse_modifier() {
                modifiers.push(modifier);
            } else {
                break;
            }
        }
        Ok((annotations, modifiers))
    }

    fn parse_modifier(&mut self) -> Option<Modifier> {
        let modifier = match self.peek_at(0)? {
            Token::Public => Modifier::Public,
            Token::Protected => Modifier::Protected,
            Token::Private => Modifier::Private,
            Token::Abstract => Modifier::Abstract,
            Token::Static => Modifier::Static,
            Token::Final => Modifier::Final,
            Token::Native => Modifier::Native,
            Token::Synchronized => Modifier::Synchronized,
            Token::Transient => Modifier::Transient,
            Token::Volatile => Modifier::Volatile,
            Token::Strictfp => Modifier::Strictfp,
            Token::Default => Modifier::Default,
            _ => return None,
        };
        self.advance();
        Some(modifier)
    }

    fn parse_annotation(&mut self) -> Result<Annotation> {
        let start = self.location();
        self.consume(&Token::At, "'@'")?;
        let name = self.parse_qualified_name()?;
        let mut arguments = Vec::new();
        if self.match_token(&Token::LParen) {
            if !self.check(&Token::RParen) {
                if self.check(&Token::Identifier) && self.peek_at(1) == Some(&Token::Assign) {
                    loop {
                        let key = self.parse_identifier()?;
                        self.consume(&Token::Assign, "'=' in annotation argument")?;
                        arguments.push(AnnotationArg::Named(key, self.parse_conditional_expr()?));
                        if !self.match_token(&Token::Comma) {
                            break;
                        }
                    }
                } else {
                    arguments.push(AnnotationArg::Value(self.parse_conditional_expr()?));
                }
            }
            self.consume(&Token::RParen, "')' after annotation arguments")?;
        }
        Ok(Annotation {
            name,
            arguments,
            span: self.span_from(start),
        })
    }

    fn parse_type_decl(
        &mut self,
        annotations: Vec<Annotation>,
        modifiers: Vec<Modifier>,
    ) -> Result<ClassDecl> {
        let start = self.location();
        let kind = if self.match_token(&Token::Class) {
            ClassKind::Class
        } else if self.match_token(&Token::Interface) {
            ClassKind::Interface
        } else {
            return Err(self.error_here("'class' or 'interface'").into());
        };
        let name = self.parse_identifier()?;
        let type_params = if self.check(&Token::Lt) {
            self.parse_type_parameters()?
        } else {
            Vec::new()
        };

        let mut extends = None;
        let mut implements = Vec::new();
        match kind {
            ClassKind::Class => {
                if self.match_token(&Token::Extends) {
                    extends = Some(self.parse_type_ref()?);
                }
                if self.match_token(&Token::Implements) {
                    implements = self.parse_type_list()?;
                }
            }
            ClassKind::Interface => {
                if self.match_token(&Token::Extends) {
                    implements = self.parse_type_list()?;
                }
            }
        }

        let body = self.parse_class_body(Some(&name))?;
        Ok(ClassDecl {
            modifiers,
            annotations,
            kind,
            name,
            type_params,
            extends,
            implements,
            body,
            resolved: None,
            span: self.span_from(start),
        })
    }

    fn parse_type_parameters(&mut self) -> Result<Vec<TypeParam>> {
        self.consume(&Token::Lt, "'<'")?;
        let mut params = Vec::new();
        loop {
            let start = self.location();
            let name = self.parse_identifier()?;
            let mut bounds = Vec::new();
            if self.match_token(&Token::Extends) {
                bounds.push(self.parse_type_ref()?);
                while self.match_token(&Token::Amp) {
                    bounds.push(self.parse_type_ref()?);
                }
            }
            params.push(TypeParam {
                name,
                bounds,
                span: self.span_from(start),
            });
            if !self.match_token(&Token::Comma) {
                break;
            }
        }
        self.consume(&Token::Gt, "'>' after type parameters")?;
        Ok(params)
    }

    fn parse_type_ref(&mut self) -> Result<TypeRef> {
        let start = self.location();
        let name = match self.peek_at(0) {
            Some(t) if t.is_primitive_type() => self.advance().lexeme,
            _ => self.parse_qualified_name()?,
        };
        let type_args = if self.check(&Token::Lt) {
            self.parse_type_arguments()?
        } else {
            Vec::new()
        };
        let mut array_dims = 0;
        while self.check(&Token::LBracket) && self.peek_at(1) == Some(&Token::RBracket) {
            self.advance();
            self.advance();
            array_dims += 1;
        }
        Ok(TypeRef {
            name,
            type_args,
            array_dims,
            resolved: None,
            span: self.span_from(start),
        })
    }

    fn parse_type_arguments(&mut self) -> Result<Vec<TypeArg>> {
        self.consume(&Token::Lt, "'<'")?;
        let mut args = Vec::new();
        loop {
            let start = self.location();
            if self.match_token(&Token::Question) {
                let bound = if self.match_token(&Token::Extends) {
                    Some((BoundKind::Extends, self.parse_type_ref()?))
                } else if self.match_token(&Token::Super) {
                    Some((BoundKind::Super, self.parse_type_ref()?))
                } else {
                    None
                };
                args.push(TypeArg::Wildcard(WildcardType {
                    bound,
                    span: self.span_from(start),
                }));
            } else {
                args.push(TypeArg::Type(self.parse_type_ref()?));
            }
            if !self.match_token(&Token::Comma) {
                break;
            }
        }
        self.consume(&Token::Gt, "'>' after type arguments")?;
        Ok(args)
    }

    fn parse_type_list(&mut self) -> Result<Vec<TypeRef>> {
        let mut types = vec![self.parse_type_ref()?];
        while self.match_token(&Token::Comma) {
            types.push(self.parse_type_ref()?);
        }
        Ok(types)
    }

    /// `{ members }`; `class_name` is used to recognize constructors
    fn parse_class_body(&mut self, class_name: Option<&str>) -> Result<Vec<ClassMember>> {
        self.consume(&Token::LBrace, "'{' to open class body")?;
        let mut members = Vec::new();
        let mut iterations = 0;
        while !self.check(&Token::RBrace) && !self.is_at_end() {
            iterations += 1;
            if iterations > PARSER_MAX_LOOP_ITERS {
                return Err(ParseError::invalid_syntax("class body too large", self.location()).into());
            }
            if self.match_token(&Token::Semicolon) {
                continue;
            }
            // Anonymous bodies never declare constructors
            let ctor_name = class_name.or(Some(""));
            self.parse_class_member(ctor_name, &mut members)?;
        }
        self.consume(&Token::RBrace, "'}' to close class body")?;
        Ok(members)
    }

    /// Parse one member declaration; a field declaration with several
    /// declarators pushes one member per name. A `class_name` of `None`
    /// accepts any constructor name.
    fn parse_class_member(&mut self, class_name: Option<&str>, out: &mut Vec<ClassMember>) -> Result<()> {
        let start = self.location();

        if self.check(&Token::LBrace)
            || (self.check(&Token::Static) && self.peek_at(1) == Some(&Token::LBrace))
        {
            let is_static = self.match_token(&Token::Static);
            let body = self.parse_block()?;
            out.push(ClassMember::Initializer(InitializerBlock {
                is_static,
                body,
                span: self.span_from(start),
            }));
            return Ok(());
        }

        let (annotations, modifiers) = self.parse_annotations_and_modifiers()?;

        if self.check(&Token::Class) || self.check(&Token::Interface) {
            out.push(ClassMember::TypeDecl(self.parse_type_decl(annotations, modifiers)?));
            return Ok(());
        }

        let type_params = if self.check(&Token::Lt) {
            self.parse_type_parameters()?
        } else {
            Vec::new()
        };

        let is_ctor = self.check(&Token::Identifier)
            && self.peek_at(1) == Some(&Token::LParen)
            && class_name.map_or(true, |name| self.tokens[self.current].lexeme() == name);
        if is_ctor {
            let name = self.parse_identifier()?;
            let parameters = self.parse_parameter_list()?;
            let throws = self.parse_throws()?;
            let body = self.parse_block()?;
            out.push(ClassMember::Constructor(ConstructorDecl {
                modifiers,
                annotations,
                name,
                parameters,
                throws,
                body,
                binding: None,
                span: self.span_from(start),
            }));
            return Ok(());
        }

        let return_type = self.parse_type_ref()?;
        let name = self.parse_identifier()?;

        if self.check(&Token::LParen) {
            let parameters = self.parse_parameter_list()?;
            let throws = self.parse_throws()?;
            let body = if self.match_token(&Token::Semicolon) {
                None
            } else {
                Some(self.parse_block()?)
            };
            out.push(ClassMember::Method(MethodDecl {
                modifiers,
                annotations,
                type_params,
                return_type,
                name,
                parameters,
                throws,
                body,
                binding: None,
                span: self.span_from(start),
            }));
            return Ok(());
        }

        if !type_params.is_empty() {
            return Err(ParseError::invalid_syntax("type parameters on a field", start).into());
        }

        let mut name = name;
        loop {
            let initializer = if self.match_token(&Token::Assign) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            out.push(ClassMember::Field(FieldDecl {
                modifiers: modifiers.clone(),
                annotations: annotations.clone(),
                type_ref: return_type.clone(),
                name,
                initializer,
                span: self.span_from(start),
            }));
            if !self.match_token(&Token::Comma) {
                break;
            }
            name = self.parse_identifier()?;
        }
        self.consume(&Token::Semicolon, "';' after field declaration")?;
        Ok(())
    }

    fn parse_throws(&mut self) -> Result<Vec<TypeRef>> {
        if self.match_token(&Token::Throws) {
            self.parse_type_list()
        } else {
            Ok(Vec::new())
        }
    }

    fn parse_parameter_list(&mut self) -> Result<Vec<Parameter>> {
        self.consume(&Token::LParen, "'(' before parameters")?;
        let mut parameters = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                let start = self.location();
                let (annotations, modifiers) = self.parse_annotations_and_modifiers()?;
                let type_ref = self.parse_type_ref()?;
                let varargs = self.match_token(&Token::Ellipsis);
                let name = self.parse_identifier()?;
                parameters.push(Parameter {
                    modifiers,
                    annotations,
                    type_ref,
                    name,
                    varargs,
                    span: self.span_from(start),
                });
                if !self.match_token(&Token::Comma) {
                    break;
                }
            }
        }
        self.consume(&Token::RParen, "')' after parameters")?;
        Ok(parameters)
    }

    fn parse_argument_list(&mut self) -> Result<Vec<Expr>> {
        self.consume(&Token::LParen, "'(' before arguments")?;
        let mut args = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.match_token(&Token::Comma) {
                    break;
                }
            }
        }
        self.consume(&Token::RParen, "')' after arguments")?;
        Ok(args)
    }

    fn parse_block(&mut self) -> Result<Block> {
        let start = self.location();
        self.consume(&Token::LBrace, "'{' to open block")?;
        let mut statements = Vec::new();
        let mut iterations = 0;
        while !self.check(&Token::RBrace) && !self.is_at_end() {
            iterations += 1;
            if iterations > PARSER_MAX_LOOP_ITERS {
                return Err(ParseError::invalid_syntax("block too large", self.location()).into());
            }
            statements.push(self.parse_statement()?);
        }
        self.consume(&Token::RBrace, "'}' to close block")?;
        Ok(Block {
            statements,
            span: self.span_from(start),
        })
    }

    fn parse_statement(&mut self) -> Result<Stmt> {
        let start = self.location();
        match self.peek_at(0) {
            Some(Token::LBrace) => Ok(Stmt::Block(self.parse_block()?)),
            Some(Token::Semicolon) => {
                self.advance();
                Ok(Stmt::Empty)
            }
            Some(Token::If) => {
                self.advance();
                self.consume(&Token::LParen, "'(' after 'if'")?;
                let condition = self.parse_expression()?;
                self.consume(&Token::RParen, "')' after condition")?;
                let then_branch = Box::new(self.parse_statement()?);
                let else_branch = if self.match_token(&Token::Else) {
                    Some(Box::new(self.parse_statement()?))
                } else {
                    None
                };
                Ok(Stmt::If(IfStmt {
                    condition,
                    then_branch,
                    else_branch,
                    span: self.span_from(start),
                }))
            }
            Some(Token::While) => {
                self.advance();
                self.consume(&Token::LParen, "'(' after 'while'")?;
                let condition = self.parse_expression()?;
                self.consume(&Token::RParen, "')' after condition")?;
                let body = Box::new(self.parse_statement()?);
                Ok(Stmt::While(WhileStmt {
                    condition,
                    body,
                    span: self.span_from(start),
                }))
            }
            Some(Token::Return) => {
                self.advance();
                let value = if self.check(&Token::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.consume(&Token::Semicolon, "';' after return")?;
                Ok(Stmt::Return(ReturnStmt {
                    value,
                    span: self.span_from(start),
                }))
            }
            Some(Token::Throw) => {
                self.advance();
                let expr = self.parse_expression()?;
                self.consume(&Token::Semicolon, "';' after throw")?;
                Ok(Stmt::Throw(ThrowStmt {
                    expr,
                    span: self.span_from(start),
                }))
            }
            _ if self.is_variable_declaration_start() => self.parse_variable_declaration_stmt(),
            _ => {
                let expr = self.parse_expression()?;
                self.consume(&Token::Semicolon, "';' after expression")?;
                Ok(Stmt::Expression(ExprStmt {
                    expr,
                    span: self.span_from(start),
                }))
            }
        }
    }

    /// Token index just past a type starting at `i`, if one is there
    fn scan_type(&self, mut i: usize) -> Option<usize> {
        match self.token_at(i)? {
            t if t.is_primitive_type() => i += 1,
            Token::Identifier => {
                i += 1;
                while self.token_at(i) == Some(&Token::Dot) && self.token_at(i + 1) == Some(&Token::Identifier) {
                    i += 2;
                }
            }
            _ => return None,
        }
        if self.token_at(i) == Some(&Token::Lt) {
            let mut depth = 0usize;
            loop {
                match self.token_at(i)? {
                    Token::Lt => depth += 1,
                    Token::Gt => {
                        depth -= 1;
                        if depth == 0 {
                            i += 1;
                            break;
                        }
                    }
                    Token::Identifier
                    | Token::Dot
                    | Token::Comma
                    | Token::Question
                    | Token::Extends
                    | Token::Super
                    | Token::Amp
                    | Token::LBracket
                    | Token::RBracket => {}
                    t if t.is_primitive_type() => {}
                    _ => return None,
                }
                i += 1;
            }
        }
        while self.token_at(i) == Some(&Token::LBracket) && self.token_at(i + 1) == Some(&Token::RBracket) {
            i += 2;
        }
        Some(i)
    }

    fn is_variable_declaration_start(&self) -> bool {
        let mut i = self.current;
        while self.token_at(i) == Some(&Token::Final) {
            i += 1;
        }
        match self.scan_type(i) {
            Some(after) => {
                self.token_at(after) == Some(&Token::Identifier)
                    && matches!(
                        self.token_at(after + 1),
                        Some(Token::Assign) | Some(Token::Semicolon) | Some(Token::Comma) | Some(Token::Colon)
                    )
            }
            None => false,
        }
    }

    fn parse_variable_declaration_stmt(&mut self) -> Result<Stmt> {
        let start = self.location();
        let mut modifiers = Vec::new();
        while self.match_token(&Token::Final) {
            modifiers.push(Modifier::Final);
        }
        let type_ref = self.parse_type_ref()?;
        let mut variables = Vec::new();
        loop {
            let var_start = self.location();
            let name = self.parse_identifier()?;
            let initializer = if self.match_token(&Token::Assign) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            variables.push(VariableDeclarator {
                name,
                initializer,
                span: self.span_from(var_start),
            });
            if !self.match_token(&Token::Comma) {
                break;
            }
        }
        self.consume(&Token::Semicolon, "';' after variable declaration")?;
        Ok(Stmt::Declaration(VarDeclStmt {
            modifiers,
            type_ref,
            variables,
            span: self.span_from(start),
        }))
    }

    pub(crate) fn parse_expression(&mut self) -> Result<Expr> {
        self.parse_assignment_expr()
    }

    fn parse_assignment_expr(&mut self) -> Result<Expr> {
        let start = self.location();
        let target = self.parse_conditional_expr()?;
        let operator = match self.peek_at(0) {
            Some(Token::Assign) => AssignmentOp::Assign,
            Some(Token::AddAssign) => AssignmentOp::AddAssign,
            Some(Token::SubAssign) => AssignmentOp::SubAssign,
            Some(Token::MulAssign) => AssignmentOp::MulAssign,
            Some(Token::DivAssign) => AssignmentOp::DivAssign,
            Some(Token::ModAssign) => AssignmentOp::ModAssign,
            _ => return Ok(target),
        };
        self.advance();
        let value = self.parse_assignment_expr()?;
        Ok(Expr::Assignment(AssignmentExpr {
            target: Box::new(target),
            operator,
            value: Box::new(value),
            span: self.span_from(start),
        }))
    }

    fn parse_conditional_expr(&mut self) -> Result<Expr> {
        let start = self.location();
        let condition = self.parse_logical_or_expr()?;
        if !self.match_token(&Token::Question) {
            return Ok(condition);
        }
        let then_expr = self.parse_expression()?;
        self.consume(&Token::Colon, "':' in conditional expression")?;
        let else_expr = self.parse_conditional_expr()?;
        Ok(Expr::Conditional(ConditionalExpr {
            condition: Box::new(condition),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
            span: self.span_from(start),
        }))
    }

    fn binary(&self, left: Expr, operator: BinaryOp, right: Expr, start: Location) -> Expr {
        Expr::Binary(BinaryExpr {
            left: Box::new(left),
            operator,
            right: Box::new(right),
            span: self.span_from(start),
        })
    }

    fn parse_logical_or_expr(&mut self) -> Result<Expr> {
        let start = self.location();
        let mut expr = self.parse_logical_and_expr()?;
        while self.match_token(&Token::Or) {
            let right = self.parse_logical_and_expr()?;
            expr = self.binary(expr, BinaryOp::Or, right, start);
        }
        Ok(expr)
    }

    fn parse_logical_and_expr(&mut self) -> Result<Expr> {
        let start = self.location();
        let mut expr = self.parse_equality_expr()?;
        while self.match_token(&Token::And) {
            let right = self.parse_equality_expr()?;
            expr = self.binary(expr, BinaryOp::And, right, start);
        }
        Ok(expr)
    }

    fn parse_equality_expr(&mut self) -> Result<Expr> {
        let start = self.location();
        let mut expr = self.parse_relational_expr()?;
        loop {
            let operator = match self.peek_at(0) {
                Some(Token::Eq) => BinaryOp::Eq,
                Some(Token::Ne) => BinaryOp::Ne,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational_expr()?;
            expr = self.binary(expr, operator, right, start);
        }
        Ok(expr)
    }

    fn parse_relational_expr(&mut self) -> Result<Expr> {
        let start = self.location();
        let mut expr = self.parse_additive_expr()?;
        loop {
            let operator = match self.peek_at(0) {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::Le) => BinaryOp::Le,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::Ge) => BinaryOp::Ge,
                Some(Token::Instanceof) => {
                    self.advance();
                    let target_type = self.parse_type_ref()?;
                    expr = Expr::InstanceOf(InstanceOfExpr {
                        expr: Box::new(expr),
                        target_type,
                        span: self.span_from(start),
                    });
                    continue;
                }
                _ => break,
            };
            self.advance();
            let right = self.parse_additive_expr()?;
            expr = self.binary(expr, operator, right, start);
        }
        Ok(expr)
    }

    fn parse_additive_expr(&mut self) -> Result<Expr> {
        let start = self.location();
        let mut expr = self.parse_multiplicative_expr()?;
        loop {
            let operator = match self.peek_at(0) {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative_expr()?;
            expr = self.binary(expr, operator, right, start);
        }
        Ok(expr)
    }

    fn parse_multiplicative_expr(&mut self) -> Result<Expr> {
        let start = self.location();
        let mut expr = self.parse_unary_expr()?;
        loop {
            let operator = match self.peek_at(0) {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary_expr()?;
            expr = self.binary(expr, operator, right, start);
        }
        Ok(expr)
    }

    fn parse_unary_expr(&mut self) -> Result<Expr> {
        let start = self.location();
        let operator = match self.peek_at(0) {
            Some(Token::Not) => Some(UnaryOp::Not),
            Some(Token::Minus) => Some(UnaryOp::Minus),
            Some(Token::Plus) => Some(UnaryOp::Plus),
            Some(Token::Inc) => Some(UnaryOp::PreInc),
            Some(Token::Dec) => Some(UnaryOp::PreDec),
            _ => None,
        };
        if let Some(operator) = operator {
            self.advance();
            let operand = self.parse_unary_expr()?;
            return Ok(Expr::Unary(UnaryExpr {
                operator,
                operand: Box::new(operand),
                span: self.span_from(start),
            }));
        }
        if self.is_cast_start() {
            self.consume(&Token::LParen, "'('")?;
            let target_type = self.parse_type_ref()?;
            self.consume(&Token::RParen, "')' after cast type")?;
            let expr = self.parse_unary_expr()?;
            return Ok(Expr::Cast(CastExpr {
                target_type,
                expr: Box::new(expr),
                span: self.span_from(start),
            }));
        }
        self.parse_postfix_expr()
    }

    /// `(Type) operand`, told apart from a parenthesized expression by what
    /// follows the closing parenthesis
    fn is_cast_start(&self) -> bool {
        if !self.check(&Token::LParen) {
            return false;
        }
        let primitive = self.peek_at(1).map_or(false, |t| t.is_primitive_type());
        let Some(after) = self.scan_type(self.current + 1) else {
            return false;
        };
        if self.token_at(after) != Some(&Token::RParen) {
            return false;
        }
        if primitive {
            return true;
        }
        match self.token_at(after + 1) {
            Some(t) if t.is_literal() => true,
            Some(Token::Identifier) | Some(Token::LParen) | Some(Token::This) | Some(Token::Super)
            | Some(Token::New) | Some(Token::Not) => true,
            _ => false,
        }
    }

    fn parse_postfix_expr(&mut self) -> Result<Expr> {
        let start = self.location();
        let mut expr = self.parse_primary_expr()?;
        loop {
            if self.match_token(&Token::Dot) {
                let name = self.parse_identifier()?;
                if self.check(&Token::LParen) {
                    let arguments = self.parse_argument_list()?;
                    expr = Expr::MethodCall(MethodCallExpr {
                        target: Some(Box::new(expr)),
                        name,
                        arguments,
                        binding: None,
                        span: self.span_from(start),
                    });
                } else {
                    expr = Expr::FieldAccess(FieldAccessExpr {
                        target: Box::new(expr),
                        name,
                        span: self.span_from(start),
                    });
                }
            } else if self.match_token(&Token::LBracket) {
                let index = self.parse_expression()?;
                self.consume(&Token::RBracket, "']' after index")?;
                expr = Expr::ArrayAccess(ArrayAccessExpr {
                    array: Box::new(expr),
                    index: Box::new(index),
                    span: self.span_from(start),
                });
            } else if self.check(&Token::Inc) || self.check(&Token::Dec) {
                let operator = if self.match_token(&Token::Inc) {
                    UnaryOp::PostInc
                } else {
                    self.advance();
                    UnaryOp::PostDec
                };
                expr = Expr::Unary(UnaryExpr {
                    operator,
                    operand: Box::new(expr),
                    span: self.span_from(start),
                });
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn literal(&self, value: Literal, start: Location) -> Expr {
        Expr::Literal(LiteralExpr {
            value,
            span: self.span_from(start),
        })
    }

    fn parse_primary_expr(&mut self) -> Result<Expr> {
        let start = self.location();
        let Some(token) = self.peek_at(0).cloned() else {
            return Err(self.error_here("expression").into());
        };
        match token {
            Token::IntegerLiteral | Token::FloatLiteral => {
                let lexeme = self.advance().lexeme;
                Ok(self.literal(Literal::Number(lexeme), start))
            }
            Token::StringLiteral => {
                let lexeme = self.advance().lexeme;
                let inner = lexeme[1..lexeme.len() - 1].to_string();
                Ok(self.literal(Literal::String(inner), start))
            }
            Token::CharLiteral => {
                let lexeme = self.advance().lexeme;
                let inner = lexeme[1..lexeme.len() - 1].to_string();
                Ok(self.literal(Literal::Char(inner), start))
            }
            Token::True | Token::False => {
                self.advance();
                Ok(self.literal(Literal::Boolean(token == Token::True), start))
            }
            Token::Null => {
                self.advance();
                Ok(self.literal(Literal::Null, start))
            }
            Token::This | Token::Super | Token::Identifier => {
                let name = self.advance().lexeme;
                if self.check(&Token::LParen) {
                    let arguments = self.parse_argument_list()?;
                    return Ok(Expr::MethodCall(MethodCallExpr {
                        target: None,
                        name,
                        arguments,
                        binding: None,
                        span: self.span_from(start),
                    }));
                }
                Ok(Expr::Identifier(IdentifierExpr {
                    name,
                    span: self.span_from(start),
                }))
            }
            Token::New => self.parse_new_expression(),
            Token::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.consume(&Token::RParen, "')' after expression")?;
                Ok(Expr::Parenthesized(Box::new(inner)))
            }
            Token::LBrace => {
                self.advance();
                let mut values = Vec::new();
                while !self.check(&Token::RBrace) {
                    values.push(self.parse_conditional_expr()?);
                    if !self.match_token(&Token::Comma) {
                        break;
                    }
                }
                self.consume(&Token::RBrace, "'}' after array initializer")?;
                Ok(Expr::ArrayInitializer(values))
            }
            _ => Err(self.error_here("expression").into()),
        }
    }

    fn parse_new_expression(&mut self) -> Result<Expr> {
        let start = self.location();
        self.consume(&Token::New, "'new'")?;
        let type_start = self.location();
        let name = self.parse_qualified_name()?;
        let mut diamond = false;
        let type_args = if self.check(&Token::Lt) && self.peek_at(1) == Some(&Token::Gt) {
            self.advance();
            self.advance();
            diamond = true;
            Vec::new()
        } else if self.check(&Token::Lt) {
            self.parse_type_arguments()?
        } else {
            Vec::new()
        };
        let target_type = TypeRef {
            name,
            type_args,
            array_dims: 0,
            resolved: None,
            span: self.span_from(type_start),
        };
        let arguments = self.parse_argument_list()?;
        let anonymous_body = if self.check(&Token::LBrace) {
            let body_start = self.location();
            let body = self.parse_class_body(None)?;
            Some(ClassDecl {
                modifiers: Vec::new(),
                annotations: Vec::new(),
                kind: ClassKind::Class,
                name: String::new(),
                type_params: Vec::new(),
                extends: None,
                implements: Vec::new(),
                body,
                resolved: None,
                span: self.span_from(body_start),
            })
        } else {
            None
        };
        Ok(Expr::New(NewExpr {
            target_type,
            diamond,
            arguments,
            anonymous_body,
            span: self.span_from(start),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn ok(src: &str) -> CompilationUnit {
        match Parser::new(src).and_then(|p| p.parse()) {
            Ok(unit) => unit,
            Err(e) => panic!("expected parse success, got {e}\n{src}"),
        }
    }

    fn err_contains(src: &str, needle: &str) {
        match Parser::new(src).and_then(|p| p.parse()) {
            Ok(_) => panic!("expected parse error containing '{needle}'"),
            Err(e) => {
                let msg = e.to_string();
                assert!(msg.contains(needle), "error '{msg}' missing '{needle}'");
            }
        }
    }

    fn first_method(unit: &CompilationUnit) -> &MethodDecl {
        unit.type_decls[0].methods().next().unwrap()
    }

    #[test]
    fn parses_headers_and_supertypes() {
        let unit = ok(r#"
package org.example;

import java.util.List;
import static java.util.Collections.*;

public class Child extends Parent<String> implements Runnable, java.io.Serializable {
}
"#);
        assert_eq!(unit.package_name(), Some("org.example"));
        assert_eq!(unit.imports.len(), 2);
        assert!(unit.imports[1].is_static && unit.imports[1].is_wildcard);
        let class = &unit.type_decls[0];
        let extends = class.extends.as_ref().unwrap();
        assert_eq!(extends.name, "Parent");
        assert_eq!(extends.type_args.len(), 1);
        assert_eq!(class.implements[1].name, "java.io.Serializable");
    }

    #[test]
    fn interface_extends_goes_to_implements() {
        let unit = ok("interface I<T> extends J<T>, K { T get(); default void run() {} }");
        let class = &unit.type_decls[0];
        assert!(class.is_interface());
        assert!(class.extends.is_none());
        assert_eq!(class.implements.len(), 2);
        assert!(class.methods().nth(1).unwrap().modifiers.contains(&Modifier::Default));
    }

    #[test]
    fn parses_generic_method_with_bounds_and_throws() {
        let unit = ok("abstract class A { protected abstract <T extends Number & Comparable<T>> java.util.Map<String, java.util.List<T>> group(T[] items, Class<? super T> kind) throws java.io.IOException, Exception; }");
        let method = first_method(&unit);
        assert_eq!(method.type_params[0].bounds.len(), 2);
        assert_eq!(method.return_type.to_string(), "java.util.Map<String, java.util.List<T>>");
        assert_eq!(method.parameters[0].type_ref.array_dims, 1);
        assert_eq!(method.throws.len(), 2);
        assert!(method.body.is_none());
    }

    #[test]
    fn recognizes_constructors_and_super_calls() {
        let unit = ok("class A extends B { A(String s) { super(s); this.x = s; } }");
        let ctor = unit.type_decls[0].constructors().next().unwrap();
        match &ctor.body.statements[0] {
            Stmt::Expression(s) => match &s.expr {
                Expr::MethodCall(call) => assert!(call.is_super_constructor_call()),
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(&ctor.body.statements[1], Stmt::Expression(s) if matches!(s.expr, Expr::Assignment(_))));
    }

    #[test]
    fn super_method_call_has_super_target() {
        let unit = ok("class A extends B { void m() { super.m(); } }");
        let body = first_method(&unit).body.as_ref().unwrap();
        match &body.statements[0] {
            Stmt::Expression(s) => match &s.expr {
                Expr::MethodCall(call) => {
                    assert!(call.is_super_method_call());
                    assert_eq!(call.name, "m");
                }
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn distinguishes_declarations_from_expressions() {
        let unit = ok("class A { void m() { java.util.List<String> xs = null; x = 1; a.b(c); int[] ys; } }");
        let statements = &first_method(&unit).body.as_ref().unwrap().statements;
        assert!(matches!(statements[0], Stmt::Declaration(_)));
        assert!(matches!(statements[1], Stmt::Expression(_)));
        assert!(matches!(statements[2], Stmt::Expression(_)));
        assert!(matches!(statements[3], Stmt::Declaration(_)));
    }

    #[test]
    fn parses_casts_and_parenthesized_expressions() {
        let unit = ok("class A { Object m(Object o, int a, int b) { String s = (String) o; int c = (a) + b; return (int) (a * 2.5); } }");
        let statements = &first_method(&unit).body.as_ref().unwrap().statements;
        match &statements[0] {
            Stmt::Declaration(d) => assert!(matches!(d.variables[0].initializer, Some(Expr::Cast(_)))),
            other => panic!("unexpected {other:?}"),
        }
        match &statements[1] {
            Stmt::Declaration(d) => assert!(matches!(d.variables[0].initializer, Some(Expr::Binary(_)))),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_anonymous_class_and_diamond() {
        let unit = ok("class A { void m() { Object o = new java.util.ArrayList<>(); Runnable r = new Runnable() { @Override public void run() { } }; } }");
        let statements = &first_method(&unit).body.as_ref().unwrap().statements;
        match &statements[0] {
            Stmt::Declaration(d) => match &d.variables[0].initializer {
                Some(Expr::New(n)) => assert!(n.diamond),
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
        match &statements[1] {
            Stmt::Declaration(d) => match &d.variables[0].initializer {
                Some(Expr::New(n)) => {
                    let body = n.anonymous_body.as_ref().unwrap();
                    assert!(body.is_anonymous());
                    assert!(body.find_method("run").unwrap().has_annotation("Override"));
                }
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn splits_multi_declarator_fields() {
        let unit = ok("class A { private int a = 1, b; }");
        assert_eq!(unit.type_decls[0].body.len(), 2);
    }

    #[test]
    fn annotations_with_arguments() {
        let unit = ok(r#"@SuppressWarnings({"a", "b"}) class A { @Deprecated(since = "1", forRemoval = true) void m() {} }"#);
        assert_eq!(unit.type_decls[0].annotations[0].arguments.len(), 1);
        assert_eq!(first_method(&unit).annotations[0].arguments.len(), 2);
    }

    #[test]
    fn reports_missing_semicolon_with_position() {
        err_contains("class A {\n  int x = 1\n}", "line 3");
    }

    #[test]
    fn reports_unknown_characters_as_lexical_errors() {
        let err = Parser::new("class A { # }").err().unwrap();
        assert!(matches!(err, Error::Lexical { .. }));
    }

    #[test]
    fn single_member_rejects_trailing_tokens() {
        assert!(Parser::new("void m() {} void n() {}")
            .and_then(|p| p.parse_single_member())
            .is_err());
        assert!(Parser::new("@Override public void m() {}")
            .and_then(|p| p.parse_single_member())
            .is_ok());
    }
}
