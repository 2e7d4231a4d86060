//! Removal of `super(..)` and `super.m(..)` calls the hierarchy no longer supports
//!
//! A call is removable when the class has no superclass besides the root
//! type, or when the current superclass chain provides nothing the call could
//! invoke. Only calls that form a whole statement are removed, and only from
//! statement lists; a call nested in a larger expression or used as the
//! unbraced body of an `if`/`while` is kept.

use super::matcher::matches;
use super::{for_each_anonymous_body, RewriteContext, Rewritten};
use crate::ast::{walk_method_call_expr, AstVisitor, Block, ClassDecl, ClassMember, Expr, MethodCallExpr, Stmt};
use crate::types::{ancestors, ClassType, Verdict};

/// Whether `call`, made from inside `enclosing`, can be deleted
pub fn should_remove_super_call(call: &MethodCallExpr, enclosing: &ClassType, ctx: &RewriteContext<'_>) -> bool {
    match removal_verdict(call, enclosing, ctx) {
        Verdict::Yes => true,
        Verdict::No => false,
        Verdict::Unknown => {
            log::debug!("super calls: keeping {}(..) in {}, unresolved", call.name, enclosing.fqn);
            false
        }
    }
}

fn removal_verdict(call: &MethodCallExpr, enclosing: &ClassType, ctx: &RewriteContext<'_>) -> Verdict {
    if !call.is_super_call() || enclosing.is_interface() {
        return Verdict::No;
    }
    let Some(supertype) = enclosing.supertype.as_ref() else {
        return Verdict::Yes;
    };
    if supertype.fqn() == Some(ctx.config.root_type.as_str()) {
        return Verdict::Yes;
    }
    let Some(fqn) = supertype.fqn() else {
        return Verdict::Unknown;
    };
    if supertype.contains_unknown() {
        return Verdict::Unknown;
    }

    if call.is_super_constructor_call() {
        // arguments are not typed, so constructors are told apart by arity
        return match ctx.types.class_info(fqn) {
            Some(info) => Verdict::from_bool(!info.has_constructor_arity(call.arguments.len())),
            None => Verdict::Unknown,
        };
    }

    let Some(binding) = &call.binding else {
        return Verdict::Unknown;
    };
    let ancestry = ancestors(ctx.types, std::slice::from_ref(supertype));
    let mut undecidable = !ancestry.complete || !binding.is_fully_resolved();
    for ancestor in &ancestry.ancestors {
        for member in ancestor.info.methods_named(&call.name) {
            if member.arity() != call.arguments.len()
                || member.flags.is_private
                || member.flags.is_static
                || member.is_abstract()
            {
                continue;
            }
            if matches(binding, member, Some(&ancestor.reference), ctx.types) {
                return Verdict::No;
            }
            if !member.is_fully_resolved() {
                undecidable = true;
            }
        }
    }
    if undecidable {
        Verdict::Unknown
    } else {
        Verdict::Yes
    }
}

/// Delete unsupported super calls from every method, constructor and
/// initializer of `class`, anonymous class bodies included
pub fn remove_unnecessary_super_calls(mut class: ClassDecl, ctx: &RewriteContext<'_>) -> Rewritten {
    let mut changes = prune_class(&mut class, ctx);
    changes += for_each_anonymous_body(&mut class, &mut |body| prune_class(body, ctx));
    Rewritten { class, changes }
}

fn prune_class(class: &mut ClassDecl, ctx: &RewriteContext<'_>) -> usize {
    let Some(class_type) = class.resolved.clone() else {
        log::debug!("super calls: {} is not attributed, skipping", class.name);
        return 0;
    };
    let mut removed = 0;
    for member in &mut class.body {
        let block = match member {
            ClassMember::Method(method) => method.body.as_mut(),
            ClassMember::Constructor(ctor) => Some(&mut ctor.body),
            ClassMember::Initializer(init) => Some(&mut init.body),
            _ => None,
        };
        if let Some(block) = block {
            removed += prune_block(block, &class_type, ctx);
            warn_dangling(block, &class_type, ctx);
        }
    }
    removed
}

/// Super calls the hierarchy no longer supports that could not be removed
/// because they are not whole statements
struct DanglingCalls<'a, 'c> {
    class_type: &'a ClassType,
    ctx: &'a RewriteContext<'c>,
    found: Vec<String>,
}

impl AstVisitor for DanglingCalls<'_, '_> {
    // anonymous bodies get their own pass
    fn visit_class_decl(&mut self, _class: &ClassDecl) {}

    fn visit_method_call_expr(&mut self, call: &MethodCallExpr) {
        if removal_verdict(call, self.class_type, self.ctx).is_yes() {
            self.found.push(describe(call));
        }
        walk_method_call_expr(self, call);
    }
}

fn warn_dangling(block: &Block, class_type: &ClassType, ctx: &RewriteContext<'_>) -> Vec<String> {
    let mut calls = DanglingCalls {
        class_type,
        ctx,
        found: Vec::new(),
    };
    calls.visit_block(block);
    for call in &calls.found {
        log::warn!("super calls: kept {}(..) in {}, it no longer resolves", call, class_type.fqn);
    }
    calls.found
}

fn prune_block(block: &mut Block, class_type: &ClassType, ctx: &RewriteContext<'_>) -> usize {
    let before = block.statements.len();
    block.statements.retain(|stmt| match removable_call(stmt) {
        Some(call) if should_remove_super_call(call, class_type, ctx) => {
            log::debug!("super calls: removed {}(..) from {}", describe(call), class_type.fqn);
            false
        }
        _ => true,
    });
    let mut removed = before - block.statements.len();
    for stmt in &mut block.statements {
        removed += prune_nested(stmt, class_type, ctx);
    }
    removed
}

fn prune_nested(stmt: &mut Stmt, class_type: &ClassType, ctx: &RewriteContext<'_>) -> usize {
    match stmt {
        Stmt::Block(block) => prune_block(block, class_type, ctx),
        Stmt::If(s) => {
            prune_nested(&mut s.then_branch, class_type, ctx)
                + s.else_branch
                    .as_mut()
                    .map_or(0, |e| prune_nested(e, class_type, ctx))
        }
        Stmt::While(s) => prune_nested(&mut s.body, class_type, ctx),
        _ => 0,
    }
}

/// The super call forming the whole of `stmt`, if any
fn removable_call(stmt: &Stmt) -> Option<&MethodCallExpr> {
    match stmt {
        Stmt::Expression(s) => match &s.expr {
            Expr::MethodCall(call) if call.is_super_call() => Some(call),
            _ => None,
        },
        _ => None,
    }
}

fn describe(call: &MethodCallExpr) -> String {
    if call.is_super_constructor_call() {
        "super".to_string()
    } else {
        format!("super.{}", call.name)
    }
}
