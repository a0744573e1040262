//! Dependency watchers.
//!
//! A watcher observes every name lookup performed through an
//! [`Environment`](crate::Environment) (and through any environment
//! derived from it) and accumulates the referenced names into a set
//! owned by the caller — a function's dependency list, a lambda's
//! capture set. Watchers chain: attaching a new one never suppresses an
//! outer one.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashSet;

use rill_ir::{Name, TypeId};

/// Where a resolved name came from, relative to the lookup site.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ReferenceOrigin {
    /// Bound in the current function/handler frame.
    Local,
    /// Bound outside a lambda boundary — a capture.
    Enclosing,
    /// Resolved against the document scope (reactive field, function).
    Document,
}

/// Accumulated references, deduplicated, in first-reference order.
///
/// Typing is static, so a name is recorded once per distinct lookup
/// site set, not per dynamic occurrence.
#[derive(Default)]
pub struct DependencyTracker {
    seen: FxHashSet<Name>,
    items: Vec<(Name, TypeId)>,
}

impl DependencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reference; repeated names are ignored.
    pub fn record(&mut self, name: Name, ty: TypeId) {
        if self.seen.insert(name) {
            self.items.push((name, ty));
        }
    }

    /// Whether a name has been recorded.
    pub fn contains(&self, name: Name) -> bool {
        self.seen.contains(&name)
    }

    /// The recorded references in first-reference order.
    pub fn items(&self) -> &[(Name, TypeId)] {
        &self.items
    }

    /// Copy the accumulated set out for declaration metadata.
    pub fn to_vec(&self) -> Vec<(Name, TypeId)> {
        self.items.clone()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Shared handle to a tracker owned by the declaration being analyzed.
pub type DepHandle = Rc<RefCell<DependencyTracker>>;

/// What a watcher is collecting.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum WatcherKind {
    /// Reactive names a function/field/metric body transitively reads.
    FunctionDependencies,
    /// Free variables a lambda captures from its enclosing scope.
    ClosureCaptures,
    /// Captures scoped to a single aggregate-apply call site.
    AggregateInputs,
}

/// An observer attached to an environment's lookups.
#[derive(Clone)]
pub struct Watcher {
    kind: WatcherKind,
    deps: DepHandle,
}

impl Watcher {
    pub fn new(kind: WatcherKind) -> Self {
        Watcher {
            kind,
            deps: Rc::new(RefCell::new(DependencyTracker::new())),
        }
    }

    pub fn kind(&self) -> WatcherKind {
        self.kind
    }

    /// The tracker this watcher feeds.
    pub fn handle(&self) -> DepHandle {
        self.deps.clone()
    }

    /// Observe one lookup; each kind filters by origin.
    pub fn observe(&self, name: Name, ty: TypeId, origin: ReferenceOrigin) {
        let interested = match self.kind {
            WatcherKind::FunctionDependencies => origin == ReferenceOrigin::Document,
            WatcherKind::ClosureCaptures | WatcherKind::AggregateInputs => {
                origin == ReferenceOrigin::Enclosing
            }
        };
        if interested {
            self.deps.borrow_mut().record(name, ty);
        }
    }
}
