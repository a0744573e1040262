//! The fixpoint registration scheduler.
//!
//! Definitions register a `(required names, callback)` pair; the
//! scheduler repeatedly scans the queue and executes every entry whose
//! requirements are defined, until one full pass makes no progress.
//! Execution order among simultaneously eligible entries follows
//! registration order, so diagnostics are deterministic across runs.
//!
//! The queue is data — required-name sets plus boxed continuations —
//! processed by this outer driver loop; the termination condition is the
//! no-progress pass. No attempt is made at a sorted topological pass:
//! declaration counts are small per document, and correctness wins over
//! asymptotic optimality.

use rustc_hash::FxHashSet;

use rill_diagnostic::{Diagnostic, ErrorCode};
use rill_ir::{Name, Span};

use crate::checker::Checker;
use crate::free::Require;

/// A queued registration.
struct Registration<'a> {
    /// Name published once the callback executes, for `define` entries.
    defines: Option<Name>,
    /// Additional names published on execution (`::field` aliases).
    publishes: Vec<Name>,
    requires: Vec<Require>,
    span: Span,
    callback: Box<dyn FnOnce(&mut Checker<'a>) + 'a>,
}

/// The top-level dependency-ordered scheduler.
pub struct TypeCheckerRoot<'a> {
    entries: Vec<Option<Registration<'a>>>,
    defined: FxHashSet<Name>,
}

impl<'a> TypeCheckerRoot<'a> {
    pub fn new() -> Self {
        TypeCheckerRoot {
            entries: Vec::new(),
            defined: FxHashSet::default(),
        }
    }

    /// Enqueue an anonymous registration.
    pub fn register(
        &mut self,
        requires: Vec<Require>,
        span: Span,
        callback: impl FnOnce(&mut Checker<'a>) + 'a,
    ) {
        self.entries.push(Some(Registration {
            defines: None,
            publishes: Vec::new(),
            requires,
            span,
            callback: Box::new(callback),
        }));
    }

    /// Enqueue a registration that publishes `name` (and any aliases)
    /// once executed, making dependent registrations eligible.
    ///
    /// A required name equal to the published name is a forward
    /// self-reference: reported immediately, never enqueued.
    pub fn define(
        &mut self,
        ck: &mut Checker<'a>,
        name: Name,
        publishes: Vec<Name>,
        requires: Vec<Require>,
        span: Span,
        callback: impl FnOnce(&mut Checker<'a>) + 'a,
    ) {
        if requires.iter().any(|r| r.name == name) {
            ck.emit(
                Diagnostic::error(ErrorCode::E1002)
                    .with_message(format!(
                        "definition of `{}` depends on itself",
                        ck.context.strings.resolve(name)
                    ))
                    .with_label(span, "forward self-reference"),
            );
            return;
        }
        self.entries.push(Some(Registration {
            defines: Some(name),
            publishes,
            requires,
            span,
            callback: Box::new(callback),
        }));
    }

    /// Whether a name has been published by an executed registration.
    pub fn is_defined(&self, name: Name) -> bool {
        self.defined.contains(&name)
    }

    /// Number of registrations not yet executed.
    pub fn pending(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// Drive the queue to fixpoint.
    ///
    /// Runs in two stages: stage one treats synthetic `::field`
    /// requirements as hard; once stalled, stage two treats
    /// still-unpublished synthetics as satisfied ordering hints and
    /// resumes. Entries still unsatisfiable after both stages are
    /// reported — one undefined-name diagnostic per missing name, not
    /// per entry — and never executed.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn run(&mut self, ck: &mut Checker<'a>) {
        let mut relax_hints = false;
        let mut pass = 0usize;
        loop {
            pass += 1;
            let mut progressed = false;
            for i in 0..self.entries.len() {
                let eligible = self.entries[i]
                    .as_ref()
                    .is_some_and(|reg| self.is_eligible(reg, relax_hints));
                if !eligible {
                    continue;
                }
                // Take the entry out so it executes at most once.
                let Some(reg) = self.entries[i].take() else {
                    continue;
                };
                (reg.callback)(ck);
                if let Some(name) = reg.defines {
                    self.defined.insert(name);
                }
                for published in reg.publishes {
                    self.defined.insert(published);
                }
                progressed = true;
            }
            tracing::debug!(pass, progressed, relax_hints, "scheduler pass complete");
            if !progressed {
                if relax_hints {
                    break;
                }
                relax_hints = true;
            }
        }
        self.report_unresolved(ck);
    }

    fn is_eligible(&self, reg: &Registration<'a>, relax_hints: bool) -> bool {
        reg.requires
            .iter()
            .all(|r| self.defined.contains(&r.name) || (relax_hints && r.ordering_hint))
    }

    /// One diagnostic per missing name across all stalled entries.
    fn report_unresolved(&self, ck: &mut Checker<'a>) {
        let mut reported: FxHashSet<Name> = FxHashSet::default();
        for entry in self.entries.iter().flatten() {
            for require in &entry.requires {
                if require.ordering_hint || self.defined.contains(&require.name) {
                    continue;
                }
                if reported.insert(require.name) {
                    ck.emit(
                        Diagnostic::error(ErrorCode::E1001)
                            .with_message(format!(
                                "name `{}` was never defined",
                                ck.context.strings.resolve(require.name)
                            ))
                            .with_label(entry.span, "required here"),
                    );
                }
            }
        }
    }
}

impl Default for TypeCheckerRoot<'_> {
    fn default() -> Self {
        Self::new()
    }
}
