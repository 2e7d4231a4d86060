//! Attribution: resolve names in a parsed unit and fill its bindings
//!
//! Runs after parsing and before any rewrite pass. Class declarations get
//! their [`ClassType`], methods and constructors their [`Signature`], type
//! references their [`JavaType`], and `super.m(..)` / `super(..)` calls the
//! member they invoke. Names that cannot be resolved become
//! [`JavaType::Unknown`]; calls that cannot be resolved keep no binding.
//!
//! Simple class names resolve in this order: enclosing and nested classes,
//! single-type imports, the current package, `java.lang`, wildcard imports.

use crate::ast::*;
use crate::consts::{is_java_lang_simple, OBJECT_TYPE};
use crate::types::{
    ancestors, ClassInfo, ClassType, JavaType, MemberFlags, Primitive, Signature, SubstitutionMap,
    TypeSystem, TypeVariable, WildcardBound,
};
use std::collections::HashSet;

/// Names visible at one point of a compilation unit
pub struct Scope<'a> {
    types: &'a dyn TypeSystem,
    package: Option<String>,
    imports: Vec<ImportDecl>,
    /// Classes declared by the unit being attributed, known before the table has them
    local_classes: HashSet<String>,
    /// Enclosing classes, innermost last
    enclosing: Vec<String>,
    /// Type variables in scope, innermost last
    type_vars: Vec<TypeVariable>,
}

impl<'a> Scope<'a> {
    /// Empty scope: only `java.lang`, the table and qualified names resolve
    pub fn new(types: &'a dyn TypeSystem) -> Self {
        Self {
            types,
            package: None,
            imports: Vec::new(),
            local_classes: HashSet::new(),
            enclosing: Vec::new(),
            type_vars: Vec::new(),
        }
    }

    pub fn for_unit(unit: &CompilationUnit, types: &'a dyn TypeSystem) -> Self {
        let mut scope = Self::new(types);
        scope.package = unit.package_name().map(str::to_string);
        scope.imports = unit.imports.clone();
        scope.local_classes = declare_headers(unit)
            .into_iter()
            .map(|info| info.ty.fqn)
            .collect();
        scope
    }

    /// Scope inside a resolved class body, used for members spliced in later
    pub fn for_class(class_type: &ClassType, types: &'a dyn TypeSystem) -> Self {
        let mut scope = Self::new(types);
        scope.package = class_type.package_name().map(str::to_string);
        scope.enclosing.push(class_type.fqn.clone());
        scope.type_vars = class_type.type_params.clone();
        scope
    }

    fn is_known(&self, fqn: &str) -> bool {
        self.local_classes.contains(fqn) || self.types.contains(fqn)
    }

    fn type_var(&self, name: &str) -> Option<&TypeVariable> {
        self.type_vars.iter().rev().find(|v| v.name == name)
    }

    /// Fully qualified name for a class name as written
    ///
    /// A dotted name whose first segment is a visible class names a nested
    /// class; any other dotted name is taken as already qualified.
    pub fn resolve_class_name(&self, name: &str) -> Option<String> {
        if let Some((head, rest)) = name.split_once('.') {
            return Some(match self.resolve_simple_name(head) {
                Some(outer) => format!("{}.{}", outer, rest),
                None => name.to_string(),
            });
        }
        self.resolve_simple_name(name)
    }

    fn resolve_simple_name(&self, name: &str) -> Option<String> {
        for outer in self.enclosing.iter().rev() {
            let nested = format!("{}.{}", outer, name);
            if self.is_known(&nested) {
                return Some(nested);
            }
            if outer.rsplit('.').next() == Some(name) {
                return Some(outer.clone());
            }
        }
        if let Some(import) = self
            .imports
            .iter()
            .find(|i| !i.is_static && !i.is_wildcard && i.simple_name() == name)
        {
            return Some(import.name.clone());
        }
        let same_package = qualify(self.package.as_deref(), name);
        if self.is_known(&same_package) {
            return Some(same_package);
        }
        let lang = format!("java.lang.{}", name);
        if self.types.contains(&lang) || is_java_lang_simple(name) {
            return Some(lang);
        }
        self.imports
            .iter()
            .filter(|i| i.is_wildcard && !i.is_static)
            .map(|i| format!("{}.{}", i.name, name))
            .find(|candidate| self.is_known(candidate))
    }

    pub fn resolve_type_ref(&self, type_ref: &TypeRef) -> JavaType {
        let base = if let Some(primitive) = Primitive::from_keyword(&type_ref.name) {
            JavaType::Primitive(primitive)
        } else if let Some(var) = self.type_var(&type_ref.name) {
            JavaType::TypeVariable(var.clone())
        } else {
            match self.resolve_class_name(&type_ref.name) {
                Some(fqn) if type_ref.type_args.is_empty() => JavaType::Named(fqn),
                Some(fqn) => JavaType::Parameterized {
                    base: fqn,
                    args: type_ref.type_args.iter().map(|a| self.resolve_type_arg(a)).collect(),
                },
                None => {
                    log::trace!("attr: unresolved type name {}", type_ref.name);
                    JavaType::Unknown
                }
            }
        };
        (0..type_ref.array_dims).fold(base, |ty, _| JavaType::array(ty))
    }

    fn resolve_type_arg(&self, arg: &TypeArg) -> JavaType {
        match arg {
            TypeArg::Type(t) => self.resolve_type_ref(t),
            TypeArg::Wildcard(w) => JavaType::Wildcard(w.bound.as_ref().map(|(kind, bound)| {
                let bound = Box::new(self.resolve_type_ref(bound));
                match kind {
                    BoundKind::Extends => WildcardBound::Extends(bound),
                    BoundKind::Super => WildcardBound::Super(bound),
                }
            })),
        }
    }

    /// Resolve `type_ref` and record the result on it and its type arguments
    pub fn fill_type_ref(&self, type_ref: &mut TypeRef) -> JavaType {
        for arg in &mut type_ref.type_args {
            match arg {
                TypeArg::Type(t) => {
                    self.fill_type_ref(t);
                }
                TypeArg::Wildcard(w) => {
                    if let Some((_, bound)) = &mut w.bound {
                        self.fill_type_ref(bound);
                    }
                }
            }
        }
        let ty = self.resolve_type_ref(type_ref);
        type_ref.resolved = Some(ty.clone());
        ty
    }

    fn parameter_type(&self, param: &mut Parameter) -> JavaType {
        let ty = self.fill_type_ref(&mut param.type_ref);
        if param.varargs {
            JavaType::array(ty)
        } else {
            ty
        }
    }
}

fn qualify(package: Option<&str>, name: &str) -> String {
    match package {
        Some(package) if !package.is_empty() => format!("{}.{}", package, name),
        _ => name.to_string(),
    }
}

struct Attributor<'a> {
    scope: Scope<'a>,
    /// Resolved types of the enclosing classes, innermost last
    classes: Vec<ClassType>,
    anonymous_count: usize,
}

impl<'a> Attributor<'a> {
    fn new(scope: Scope<'a>) -> Self {
        Self {
            scope,
            classes: Vec::new(),
            anonymous_count: 0,
        }
    }

    fn attribute_class(&mut self, class: &mut ClassDecl, anonymous_target: Option<JavaType>) {
        let fqn = self.class_fqn(class);
        let mark = self.scope.type_vars.len();
        self.scope.enclosing.push(fqn.clone());

        let type_params = self.declare_type_params(&mut class.type_params);
        let extends = class.extends.as_mut().map(|e| self.scope.fill_type_ref(e));
        let implements: Vec<JavaType> = class
            .implements
            .iter_mut()
            .map(|i| self.scope.fill_type_ref(i))
            .collect();
        let ty = match anonymous_target {
            Some(target) => self.anonymous_class_type(fqn, target),
            None => declared_class_type(fqn, class, type_params, extends, implements),
        };
        log::trace!("attr: class {}", ty.fqn);
        class.resolved = Some(ty.clone());

        self.classes.push(ty);
        for member in &mut class.body {
            self.attribute_member(member);
        }
        self.classes.pop();
        self.scope.enclosing.pop();
        self.scope.type_vars.truncate(mark);
    }

    fn class_fqn(&mut self, class: &ClassDecl) -> String {
        if class.is_anonymous() {
            self.anonymous_count += 1;
            let outer = self.scope.enclosing.first().cloned().unwrap_or_default();
            return format!("{}${}", outer, self.anonymous_count);
        }
        match self.scope.enclosing.last() {
            Some(outer) => format!("{}.{}", outer, class.name),
            None => qualify(self.scope.package.as_deref(), &class.name),
        }
    }

    /// `new T() { .. }` extends `T` when it is a class and implements it when
    /// it is an interface; an unknown `T` is treated as a class
    fn anonymous_class_type(&self, fqn: String, target: JavaType) -> ClassType {
        let is_interface = target
            .fqn()
            .and_then(|name| self.scope.types.class_info(name))
            .map_or(false, |info| info.ty.is_interface());
        let ty = ClassType::class(fqn);
        if is_interface {
            ty.with_interfaces(vec![target])
        } else {
            ty.with_supertype(Some(target))
        }
    }

    /// Bring type parameters into scope; bounds may mention the parameters
    /// themselves, as in `T extends Comparable<T>`
    fn declare_type_params(&mut self, params: &mut [TypeParam]) -> Vec<TypeVariable> {
        let mark = self.scope.type_vars.len();
        self.scope
            .type_vars
            .extend(params.iter().map(|p| TypeVariable::new(p.name.clone())));
        let declared: Vec<TypeVariable> = params
            .iter_mut()
            .map(|p| {
                let bounds = p.bounds.iter_mut().map(|b| self.scope.fill_type_ref(b)).collect();
                TypeVariable::with_bounds(p.name.clone(), bounds)
            })
            .collect();
        self.scope.type_vars.truncate(mark);
        self.scope.type_vars.extend(declared.iter().cloned());
        declared
    }

    fn attribute_member(&mut self, member: &mut ClassMember) {
        match member {
            ClassMember::Field(field) => {
                self.scope.fill_type_ref(&mut field.type_ref);
                if let Some(init) = &mut field.initializer {
                    self.visit_expr_mut(init);
                }
            }
            ClassMember::Method(method) => self.attribute_method(method),
            ClassMember::Constructor(ctor) => self.attribute_constructor(ctor),
            ClassMember::Initializer(init) => self.visit_block_mut(&mut init.body),
            ClassMember::TypeDecl(nested) => self.attribute_class(nested, None),
        }
    }

    fn attribute_method(&mut self, method: &mut MethodDecl) {
        let Some(class) = self.classes.last().cloned() else {
            return;
        };
        let mark = self.scope.type_vars.len();
        let type_params = self.declare_type_params(&mut method.type_params);
        let return_type = self.scope.fill_type_ref(&mut method.return_type);

        let mut sig = Signature::method(method.name.clone(), class.as_type()).returning(return_type);
        sig.type_params = type_params;
        for param in &mut method.parameters {
            let ty = self.scope.parameter_type(param);
            sig = sig.with_param(ty, param.name.clone());
        }
        sig.thrown = method
            .throws
            .iter_mut()
            .map(|t| self.scope.fill_type_ref(t))
            .collect();

        let is_default = method.modifiers.contains(&Modifier::Default);
        let is_static = method.is_static();
        let implicitly_abstract = class.is_interface() && method.body.is_none() && !is_default && !is_static;
        sig.flags = MemberFlags {
            is_abstract: method.modifiers.contains(&Modifier::Abstract) || implicitly_abstract,
            is_default,
            is_static,
            is_private: method.modifiers.contains(&Modifier::Private),
            is_constructor: false,
        };
        method.binding = Some(sig);

        if let Some(body) = &mut method.body {
            self.visit_block_mut(body);
        }
        self.scope.type_vars.truncate(mark);
    }

    fn attribute_constructor(&mut self, ctor: &mut ConstructorDecl) {
        let Some(class) = self.classes.last().cloned() else {
            return;
        };
        let mut sig = Signature::constructor(class.as_type());
        for param in &mut ctor.parameters {
            let ty = self.scope.parameter_type(param);
            sig = sig.with_param(ty, param.name.clone());
        }
        sig.thrown = ctor.throws.iter_mut().map(|t| self.scope.fill_type_ref(t)).collect();
        sig.flags.is_private = ctor.modifiers.contains(&Modifier::Private);
        ctor.binding = Some(sig);
        self.visit_block_mut(&mut ctor.body);
    }

    /// Member invoked by `super(..)` or `super.m(..)` in the innermost class
    fn bind_super_call(&self, call: &MethodCallExpr) -> Option<Signature> {
        let class = self.classes.last()?;
        let supertype = class.supertype.as_ref()?;
        let types = self.scope.types;

        if call.is_super_constructor_call() {
            let info = types.class_info(supertype.fqn()?)?;
            if info.constructors.is_empty() {
                let implicit = call.arguments.is_empty() && !info.ty.is_interface();
                return implicit.then(|| Signature::constructor(supertype.clone()));
            }
            let map = SubstitutionMap::from_reference(&info.ty.type_params, supertype);
            return info
                .constructors
                .iter()
                .find(|c| c.arity() == call.arguments.len())
                .map(|c| c.substitute(&map).with_declaring_type(supertype.clone()));
        }

        let ancestry = ancestors(types, std::slice::from_ref(supertype));
        ancestry.ancestors.iter().find_map(|ancestor| {
            ancestor
                .info
                .methods_named(&call.name)
                .find(|m| m.arity() == call.arguments.len() && !m.flags.is_static)
                .map(|m| {
                    m.substitute(&ancestor.substitution)
                        .with_declaring_type(ancestor.reference.clone())
                })
        })
    }
}

impl AstVisitorMut for Attributor<'_> {
    fn visit_class_decl_mut(&mut self, class: &mut ClassDecl) {
        self.attribute_class(class, None);
    }

    fn visit_type_ref_mut(&mut self, type_ref: &mut TypeRef) {
        self.scope.fill_type_ref(type_ref);
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        match expr {
            Expr::New(new) => {
                let target = self.scope.fill_type_ref(&mut new.target_type);
                for arg in &mut new.arguments {
                    self.visit_expr_mut(arg);
                }
                if let Some(body) = &mut new.anonymous_body {
                    self.attribute_class(body, Some(target));
                }
            }
            _ => {
                walk_expr_mut(self, expr);
                if let Expr::MethodCall(call) = expr {
                    if call.is_super_call() {
                        call.binding = self.bind_super_call(call);
                        if call.binding.is_none() {
                            log::debug!("attr: unresolved super call {}(..)", call.name);
                        }
                    }
                }
            }
        }
    }
}

fn declared_class_type(
    fqn: String,
    class: &ClassDecl,
    type_params: Vec<TypeVariable>,
    extends: Option<JavaType>,
    implements: Vec<JavaType>,
) -> ClassType {
    let mut ty = ClassType::new(fqn, class.kind).with_type_params(type_params);
    ty.is_abstract = class.is_interface() || class.is_abstract();
    if !class.is_interface() && ty.fqn != OBJECT_TYPE {
        ty.supertype = Some(extends.unwrap_or_else(JavaType::object));
    }
    ty.interfaces = implements;
    ty
}

/// Resolve every name and binding in `unit`
pub fn attribute_unit(mut unit: CompilationUnit, types: &dyn TypeSystem) -> CompilationUnit {
    let mut attributor = Attributor::new(Scope::for_unit(&unit, types));
    for class in &mut unit.type_decls {
        attributor.anonymous_count = 0;
        attributor.attribute_class(class, None);
    }
    unit
}

/// Attribute a member parsed outside any unit as if declared in `class_type`
///
/// Only qualified names, `java.lang` names and the class's own type
/// variables resolve, which is what rendered templates use.
pub fn attribute_member(mut member: ClassMember, class_type: &ClassType, types: &dyn TypeSystem) -> ClassMember {
    let mut attributor = Attributor::new(Scope::for_class(class_type, types));
    attributor.classes.push(class_type.clone());
    attributor.attribute_member(&mut member);
    member
}

/// Class names and kinds declared by `unit`, nested classes included,
/// without resolving anything they reference
pub fn declare_headers(unit: &CompilationUnit) -> Vec<ClassInfo> {
    fn collect(class: &ClassDecl, fqn: String, out: &mut Vec<ClassInfo>) {
        for nested in class.nested_classes() {
            collect(nested, format!("{}.{}", fqn, nested.name), out);
        }
        let type_params = class
            .type_params
            .iter()
            .map(|p| TypeVariable::new(p.name.clone()))
            .collect();
        let mut ty = ClassType::new(fqn, class.kind).with_type_params(type_params);
        ty.is_abstract = class.is_interface() || class.is_abstract();
        if !class.is_interface() && ty.fqn != OBJECT_TYPE {
            ty.supertype = Some(JavaType::object());
        }
        out.push(ClassInfo::new(ty));
    }

    let mut out = Vec::new();
    for class in &unit.type_decls {
        collect(class, qualify(unit.package_name(), &class.name), &mut out);
    }
    out
}

/// Fully resolved member tables for every class declared by `unit`
pub fn declare_types(unit: CompilationUnit, types: &dyn TypeSystem) -> Vec<ClassInfo> {
    let unit = attribute_unit(unit, types);
    let mut out = Vec::new();
    for class in &unit.type_decls {
        collect_class_info(class, &mut out);
    }
    out
}

fn collect_class_info(class: &ClassDecl, out: &mut Vec<ClassInfo>) {
    let Some(ty) = class.resolved.clone() else {
        return;
    };
    let mut info = ClassInfo::new(ty);
    for member in &class.body {
        match member {
            ClassMember::Method(method) => info.methods.extend(method.binding.clone()),
            ClassMember::Constructor(ctor) => info.constructors.extend(ctor.binding.clone()),
            ClassMember::TypeDecl(nested) => collect_class_info(nested, out),
            _ => {}
        }
    }
    out.push(info);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_compilation_unit;
    use crate::types::TypeTable;

    fn attribute(table: &TypeTable, source: &str) -> CompilationUnit {
        attribute_unit(parse_compilation_unit(source).unwrap(), table)
    }

    fn field_type(class: &ClassDecl, name: &str) -> String {
        class
            .body
            .iter()
            .find_map(|m| match m {
                ClassMember::Field(f) if f.name == name => f.type_ref.resolved.as_ref().map(|t| t.to_string()),
                _ => None,
            })
            .unwrap()
    }

    #[derive(Default)]
    struct Calls(Vec<MethodCallExpr>);

    impl AstVisitor for Calls {
        fn visit_method_call_expr(&mut self, call: &MethodCallExpr) {
            self.0.push(call.clone());
            walk_method_call_expr(self, call);
        }
    }

    #[test]
    fn resolves_names_through_imports_package_and_nesting() {
        let table = TypeTable::from_sources(&[
            "package p; public class Base { }",
            "package q; public class Helper { }",
        ])
        .unwrap();
        let unit = attribute(
            &table,
            r#"
package p;

import java.util.List;
import q.*;

public class A extends Base implements Runnable {
    static class Inner { }
    List<String> names;
    Inner inner;
    Helper helper;
    Missing missing;
    public void run() { }
}
"#,
        );
        let class = &unit.type_decls[0];
        let ty = class.resolved.as_ref().unwrap();
        assert_eq!(ty.fqn, "p.A");
        assert_eq!(ty.supertype, Some(JavaType::named("p.Base")));
        assert_eq!(ty.interfaces, vec![JavaType::named("java.lang.Runnable")]);
        assert_eq!(field_type(class, "names"), "java.util.List<java.lang.String>");
        assert_eq!(field_type(class, "inner"), "p.A.Inner");
        assert_eq!(field_type(class, "helper"), "q.Helper");
        assert_eq!(field_type(class, "missing"), "<unknown>");
    }

    #[test]
    fn interface_methods_without_body_are_abstract() {
        let table = TypeTable::new();
        let unit = attribute(
            &table,
            r#"
package p;
public interface Shape<T extends Comparable<T>> {
    T area();
    default String describe() { return "shape"; }
    static Shape<?> none() { return null; }
}
"#,
        );
        let class = &unit.type_decls[0];
        let ty = class.resolved.as_ref().unwrap();
        assert!(ty.is_interface());
        assert!(ty.supertype.is_none());
        assert_eq!(ty.type_params[0].to_string(), "T extends java.lang.Comparable<T>");

        let binding = |name: &str| class.find_method(name).unwrap().binding.clone().unwrap();
        let area = binding("area");
        assert!(area.is_abstract());
        assert_eq!(area.return_type.to_string(), "T");
        assert_eq!(area.declaring_type.to_string(), "p.Shape<T>");
        assert!(!binding("describe").is_abstract());
        assert!(binding("describe").flags.is_default);
        assert!(binding("none").flags.is_static);
        assert!(!binding("none").is_abstract());
    }

    #[test]
    fn binds_super_calls_through_the_generic_supertype() {
        let table = TypeTable::from_sources(&[
            "package p; public class Parent<T> { public Parent(T value) { } public T getValue() { return null; } }",
        ])
        .unwrap();
        let unit = attribute(
            &table,
            r#"
package p;
public class Child extends Parent<String> {
    public Child(String name) {
        super(name);
    }

    @Override
    public String getValue() {
        return super.getValue();
    }
}
"#,
        );
        let mut calls = Calls::default();
        calls.visit_compilation_unit(&unit);
        assert_eq!(calls.0.len(), 2);

        let ctor_call = calls.0.iter().find(|c| c.is_super_constructor_call()).unwrap();
        let ctor = ctor_call.binding.as_ref().unwrap();
        assert!(ctor.is_constructor());
        assert_eq!(ctor.param_types, vec![JavaType::named("java.lang.String")]);

        let method_call = calls.0.iter().find(|c| c.is_super_method_call()).unwrap();
        let target = method_call.binding.as_ref().unwrap();
        assert_eq!(target.return_type, JavaType::named("java.lang.String"));
        assert_eq!(target.declaring_type.to_string(), "p.Parent<java.lang.String>");
    }

    #[test]
    fn super_call_into_unknown_supertype_stays_unbound() {
        let table = TypeTable::new();
        let unit = attribute(
            &table,
            "package p; public class Child extends q.Missing { public void run() { super.run(); } }",
        );
        let mut calls = Calls::default();
        calls.visit_compilation_unit(&unit);
        assert!(calls.0[0].binding.is_none());
    }

    #[test]
    fn anonymous_class_implements_interface_target() {
        let table = TypeTable::new();
        let unit = attribute(
            &table,
            r#"
package p;
public class Host {
    Runnable task = new Runnable() {
        public void run() { }
    };
}
"#,
        );
        let ClassMember::Field(field) = &unit.type_decls[0].body[0] else {
            panic!("expected field");
        };
        let Some(Expr::New(new)) = &field.initializer else {
            panic!("expected new expression");
        };
        let body = new.anonymous_body.as_ref().unwrap();
        let ty = body.resolved.as_ref().unwrap();
        assert_eq!(ty.fqn, "p.Host$1");
        assert_eq!(ty.supertype, Some(JavaType::object()));
        assert_eq!(ty.interfaces, vec![JavaType::named("java.lang.Runnable")]);
        let run = body.find_method("run").unwrap().binding.as_ref().unwrap();
        assert_eq!(run.declaring_type, JavaType::named("p.Host$1"));
    }

    #[test]
    fn headers_include_nested_classes() {
        let unit = parse_compilation_unit("package p; class Outer<T> { interface Inner { } }").unwrap();
        let headers = declare_headers(&unit);
        let names: Vec<&str> = headers.iter().map(|h| h.fqn()).collect();
        assert_eq!(names, vec!["p.Outer.Inner", "p.Outer"]);
        assert!(headers[0].ty.is_interface());
        assert_eq!(headers[1].ty.type_params.len(), 1);
    }

    #[test]
    fn spliced_member_sees_class_type_variables() {
        let table = TypeTable::new();
        let class_type = ClassType::class("p.Box").with_type_params(vec![TypeVariable::new("E")]);
        let member = crate::parser::parse_member("public E get(java.util.List<String> xs) { return null; }").unwrap();
        let ClassMember::Method(method) = attribute_member(member, &class_type, &table) else {
            panic!("expected method");
        };
        let sig = method.binding.unwrap();
        assert_eq!(sig.return_type, JavaType::type_var("E"));
        assert_eq!(sig.param_types[0].to_string(), "java.util.List<java.lang.String>");
        assert_eq!(sig.declaring_type.to_string(), "p.Box<E>");
    }
}
