//! Supertype retargeting
//!
//! Swaps the superclass of every class extending a given type and then runs
//! the repair passes in a fixed order:
//!
//! ```text
//! Matched -> Retargeted -> Relinked -> OverridesCleaned -> StubsAdded -> CallsCleaned -> Done
//! ```
//!
//! Stubs are added after relinking so the abstract member set is computed
//! against the new ancestor, and after override cleanup so a marker that is
//! about to become legitimate again is not judged stale. Optional steps are
//! passed through without changes when disabled.

use super::abstract_members::add_missing_abstract_methods;
use super::imports::{maybe_remove_import, shorten_references_in};
use super::overrides::remove_unnecessary_overrides;
use super::relink::relink;
use super::super_calls::remove_unnecessary_super_calls;
use super::{map_classes, RewriteContext};
use crate::ast::{ClassDecl, CompilationUnit, TypeRef};
use crate::types::{build_type, JavaType};
use std::fmt;

/// Which optional repairs run after the supertype swap
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetargetOptions {
    /// Copy the old reference's type arguments onto the new one
    pub keep_type_parameters: bool,
    /// Implement the new type instead of extending it
    pub convert_to_interface: bool,
    pub add_abstract_methods: bool,
    pub remove_unnecessary_overrides: bool,
}

impl RetargetOptions {
    /// Every option on, as the superclass-changing recipe defaults to
    pub fn all_enabled() -> Self {
        Self {
            keep_type_parameters: true,
            convert_to_interface: true,
            add_abstract_methods: true,
            remove_unnecessary_overrides: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetargetState {
    Matched,
    Retargeted,
    Relinked,
    OverridesCleaned,
    StubsAdded,
    CallsCleaned,
    Done,
}

impl RetargetState {
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Matched => Some(Self::Retargeted),
            Self::Retargeted => Some(Self::Relinked),
            Self::Relinked => Some(Self::OverridesCleaned),
            Self::OverridesCleaned => Some(Self::StubsAdded),
            Self::StubsAdded => Some(Self::CallsCleaned),
            Self::CallsCleaned => Some(Self::Done),
            Self::Done => None,
        }
    }
}

impl fmt::Display for RetargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Matched => "matched",
            Self::Retargeted => "retargeted",
            Self::Relinked => "relinked",
            Self::OverridesCleaned => "overrides-cleaned",
            Self::StubsAdded => "stubs-added",
            Self::CallsCleaned => "calls-cleaned",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// What retargeting did to one class
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetargetOutcome {
    pub class: String,
    pub bindings_relinked: usize,
    pub markers_removed: usize,
    pub stubs_added: usize,
    pub calls_removed: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RetargetReport {
    pub outcomes: Vec<RetargetOutcome>,
}

impl RetargetReport {
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn retargeted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn find(&self, class: &str) -> Option<&RetargetOutcome> {
        self.outcomes.iter().find(|o| o.class == class)
    }
}

impl fmt::Display for RetargetReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for o in &self.outcomes {
            writeln!(
                f,
                "{}: {} binding(s) relinked, {} marker(s) removed, {} stub(s) added, {} call(s) removed",
                o.class, o.bindings_relinked, o.markers_removed, o.stubs_added, o.calls_removed
            )?;
        }
        Ok(())
    }
}

struct Retargeting<'r, 'c> {
    state: RetargetState,
    new_type: JavaType,
    new_supertype: &'r str,
    options: RetargetOptions,
    ctx: &'r RewriteContext<'c>,
    outcome: RetargetOutcome,
}

impl Retargeting<'_, '_> {
    fn run(mut self, mut class: ClassDecl) -> (ClassDecl, RetargetOutcome) {
        while let Some(next) = self.state.next() {
            class = self.advance(class);
            log::trace!("retarget: {} {} -> {}", self.outcome.class, self.state, next);
            self.state = next;
        }
        (class, self.outcome)
    }

    /// Perform the work that leads out of the current state
    fn advance(&mut self, class: ClassDecl) -> ClassDecl {
        match self.state {
            RetargetState::Matched => self.swap_supertype(class),
            RetargetState::Retargeted => {
                let out = relink(class, &self.new_type, self.ctx);
                self.outcome.bindings_relinked = out.changes;
                out.class
            }
            RetargetState::Relinked if self.options.remove_unnecessary_overrides => {
                let out = remove_unnecessary_overrides(class, self.ctx);
                self.outcome.markers_removed = out.changes;
                out.class
            }
            RetargetState::OverridesCleaned if self.options.add_abstract_methods => {
                let out = add_missing_abstract_methods(class, self.ctx);
                self.outcome.stubs_added = out.changes;
                out.class
            }
            RetargetState::StubsAdded => {
                let out = remove_unnecessary_super_calls(class, self.ctx);
                self.outcome.calls_removed = out.changes;
                out.class
            }
            _ => class,
        }
    }

    fn swap_supertype(&mut self, mut class: ClassDecl) -> ClassDecl {
        let old_ref = class.extends.take();
        let mut new_ref = TypeRef::named(self.new_supertype);

        let base = match build_type(self.new_supertype, self.ctx.types) {
            Ok(ty) => ty,
            Err(e) => {
                log::debug!("retarget: {} kept as a bare name: {}", self.new_supertype, e);
                JavaType::named(self.new_supertype)
            }
        };
        let mut resolved = base.raw();
        if self.options.keep_type_parameters {
            if let Some(old_ref) = &old_ref {
                new_ref.type_args = old_ref.type_args.clone();
                let args = old_ref.resolved.as_ref().map(|t| t.type_args().to_vec()).unwrap_or_default();
                let base_fqn = resolved.fqn().map(str::to_string);
                if let (false, Some(fqn)) = (args.is_empty(), base_fqn) {
                    resolved = JavaType::parameterized(fqn, args);
                }
            }
        }
        new_ref.resolved = Some(resolved.clone());
        self.new_type = resolved;

        let clause = if self.options.convert_to_interface {
            class.implements.push(new_ref);
            "implements"
        } else {
            class.extends = Some(new_ref);
            "extends"
        };
        log::debug!("retarget: {} now {} {}", self.outcome.class, clause, self.new_type);
        class
    }
}

/// Whether `class` extends `old`, by resolved or written name
fn extends_target(class: &ClassDecl, old: &str) -> bool {
    class
        .extends
        .as_ref()
        .map_or(false, |e| e.resolved_fqn() == Some(old) || e.name == old)
}

/// Retarget `class` from `old_supertype` to `new_supertype`
///
/// Returns the class untouched and no outcome when it does not extend
/// `old_supertype`.
pub fn retarget(
    class: ClassDecl,
    old_supertype: &str,
    new_supertype: &str,
    options: RetargetOptions,
    ctx: &RewriteContext<'_>,
) -> (ClassDecl, Option<RetargetOutcome>) {
    if !extends_target(&class, old_supertype) {
        return (class, None);
    }
    let name = class.fqn().unwrap_or(&class.name).to_string();
    log::debug!("retarget: {} extends {}", name, old_supertype);
    let machine = Retargeting {
        state: RetargetState::Matched,
        new_type: JavaType::named(new_supertype),
        new_supertype,
        options,
        ctx,
        outcome: RetargetOutcome {
            class: name,
            ..RetargetOutcome::default()
        },
    };
    let (class, outcome) = machine.run(class);
    (class, Some(outcome))
}

/// Retarget every matching class of `unit`, nested classes included, then
/// tidy the unit's imports
pub fn retarget_unit(
    unit: CompilationUnit,
    old_supertype: &str,
    new_supertype: &str,
    options: RetargetOptions,
    ctx: &RewriteContext<'_>,
) -> (CompilationUnit, RetargetReport) {
    let mut report = RetargetReport::default();
    let mut unit = map_classes(unit, |class| {
        let (class, outcome) = retarget(class, old_supertype, new_supertype, options, ctx);
        report.outcomes.extend(outcome);
        class
    });
    if report.is_empty() {
        return (unit, report);
    }

    if ctx.config.shorten_references {
        for outcome in &report.outcomes {
            shorten_references_in(&mut unit, &outcome.class);
        }
    }
    maybe_remove_import(&mut unit, old_supertype);
    log::info!("retarget: {} class(es) moved from {} to {}", report.retargeted(), old_supertype, new_supertype);
    (unit, report)
}
