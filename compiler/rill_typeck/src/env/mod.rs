//! The composable scope/context model.
//!
//! An [`Environment`] bundles a symbol-frame chain, the contextual-rule
//! flags, the current return contract, and the chain of active watchers.
//! Every `scope_as_*`/`scope_with_*` operation returns a *new*
//! environment with exactly one dimension changed and all others
//! inherited — scopes never mutate an ancestor. Frames use Rc-based
//! parent sharing, so child creation is O(1) and binding into a scope
//! copy-on-writes only that scope's own frame.

mod flags;

pub use flags::ScopeFlags;

use std::rc::Rc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use rill_ir::{Name, Span, TypeId};

use crate::watch::{DepHandle, ReferenceOrigin, Watcher};

/// A locally bound name.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Local {
    pub ty: TypeId,
    /// `let`-bound names are assignable; parameters and loop/message
    /// bindings are not.
    pub mutable: bool,
    pub span: Span,
}

/// What the end of the contained block must produce.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum ReturnContract {
    /// No return value permitted.
    #[default]
    Void,
    /// A value storable into this type is required.
    Type(TypeId),
    /// A value of some message shape is required (web handlers).
    AnyMessage,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum FrameKind {
    Block,
    /// Crossing this frame during lookup marks the hit as a capture.
    LambdaBoundary,
}

#[derive(Clone)]
struct FrameInner {
    bindings: FxHashMap<Name, Local>,
    kind: FrameKind,
    parent: Option<Frame>,
}

/// One link of the symbol-frame chain; cheap to clone.
#[derive(Clone)]
struct Frame(Rc<FrameInner>);

impl Frame {
    fn root() -> Self {
        Frame(Rc::new(FrameInner {
            bindings: FxHashMap::default(),
            kind: FrameKind::Block,
            parent: None,
        }))
    }

    fn child(&self, kind: FrameKind) -> Self {
        Frame(Rc::new(FrameInner {
            bindings: FxHashMap::default(),
            kind,
            parent: Some(self.clone()),
        }))
    }

    fn bind(&mut self, name: Name, local: Local) -> Result<(), Span> {
        let inner = Rc::make_mut(&mut self.0);
        if let Some(prior) = inner.bindings.get(&name) {
            return Err(prior.span);
        }
        inner.bindings.insert(name, local);
        Ok(())
    }

    /// Walk the chain; `crossed_lambda` reports whether a lambda
    /// boundary sits between the lookup site and the binding.
    fn lookup(&self, name: Name) -> Option<LookupHit> {
        let mut frame = self;
        let mut crossed_lambda = false;
        loop {
            if let Some(local) = frame.0.bindings.get(&name) {
                return Some(LookupHit {
                    local: *local,
                    crossed_lambda,
                });
            }
            if frame.0.kind == FrameKind::LambdaBoundary {
                crossed_lambda = true;
            }
            match &frame.0.parent {
                Some(parent) => frame = parent,
                None => return None,
            }
        }
    }
}

/// A successful local lookup.
#[derive(Copy, Clone, Debug)]
pub struct LookupHit {
    pub local: Local,
    /// The binding lives outside a lambda boundary — a capture.
    pub crossed_lambda: bool,
}

impl LookupHit {
    pub fn origin(&self) -> ReferenceOrigin {
        if self.crossed_lambda {
            ReferenceOrigin::Enclosing
        } else {
            ReferenceOrigin::Local
        }
    }
}

/// The immutable-style context threaded through expression typing.
#[derive(Clone)]
pub struct Environment {
    frame: Frame,
    flags: ScopeFlags,
    ret: ReturnContract,
    watchers: SmallVec<[Watcher; 2]>,
    viewer: Option<DepHandle>,
}

impl Environment {
    /// The environment rooted at document scope: statement context, no
    /// boundaries, no watchers. Document names resolve through the
    /// registry fallback, not through frames.
    pub fn document_root() -> Self {
        Environment {
            frame: Frame::root(),
            flags: ScopeFlags::empty(),
            ret: ReturnContract::Void,
            watchers: SmallVec::new(),
            viewer: None,
        }
    }

    // --- scope operations: each changes exactly one dimension ---

    /// Enter computation context (the value is consumed).
    #[must_use]
    pub fn scope_as_computation(&self) -> Self {
        self.with_flag(ScopeFlags::COMPUTE, true)
    }

    /// Enter statement context.
    #[must_use]
    pub fn scope_as_statement(&self) -> Self {
        self.with_flag(ScopeFlags::COMPUTE, false)
    }

    /// Set the read-only boundary for the remainder of the subtree.
    #[must_use]
    pub fn scope_as_read_only(&self) -> Self {
        self.with_flag(ScopeFlags::READ_ONLY, true)
    }

    /// Enter a pure scope.
    #[must_use]
    pub fn scope_as_pure(&self) -> Self {
        self.with_flag(ScopeFlags::PURE, true)
    }

    /// Permit abort-style exits.
    #[must_use]
    pub fn scope_as_abortable(&self) -> Self {
        self.with_flag(ScopeFlags::ABORTABLE, true)
    }

    /// Enter a message-handler body.
    #[must_use]
    pub fn scope_as_message_handler(&self) -> Self {
        self.with_flag(ScopeFlags::MESSAGE_HANDLER, true)
    }

    /// Enter a web `get` handler body.
    #[must_use]
    pub fn scope_as_web_get(&self) -> Self {
        self.with_flag(ScopeFlags::WEB_GET, true)
    }

    /// Enter a web `put` handler body.
    #[must_use]
    pub fn scope_as_web_put(&self) -> Self {
        self.with_flag(ScopeFlags::WEB_PUT, true)
    }

    /// Enter a static policy block.
    #[must_use]
    pub fn scope_as_static_policy(&self) -> Self {
        self.with_flag(ScopeFlags::STATIC_POLICY, true)
    }

    /// Make a remote-call cache reachable.
    #[must_use]
    pub fn scope_with_cache(&self) -> Self {
        self.with_flag(ScopeFlags::CACHE, true)
    }

    /// Expose the viewer field set, recording reads into `tracker`.
    #[must_use]
    pub fn scope_with_viewer(&self, tracker: DepHandle) -> Self {
        let mut env = self.with_flag(ScopeFlags::VIEWER, true);
        env.viewer = Some(tracker);
        env
    }

    /// Set the return contract for the contained block.
    #[must_use]
    pub fn scope_with_return(&self, ret: ReturnContract) -> Self {
        let mut env = self.clone();
        env.ret = ret;
        env
    }

    /// Child scope for a nested block.
    #[must_use]
    pub fn scoped(&self) -> Self {
        let mut env = self.clone();
        env.frame = self.frame.child(FrameKind::Block);
        env
    }

    /// Child scope behind a lambda boundary; lookups resolving past it
    /// are classified as captures.
    #[must_use]
    pub fn scope_as_lambda(&self) -> Self {
        let mut env = self.clone();
        env.frame = self.frame.child(FrameKind::LambdaBoundary);
        env
    }

    /// Attach a watcher. Chained, not replaced: the outer watchers keep
    /// observing every lookup performed by descendants.
    #[must_use]
    pub fn watching(&self, watcher: Watcher) -> Self {
        let mut env = self.clone();
        env.watchers.push(watcher);
        env
    }

    fn with_flag(&self, flag: ScopeFlags, on: bool) -> Self {
        let mut env = self.clone();
        env.flags.set(flag, on);
        env
    }

    // --- queries ---

    pub fn flags(&self) -> ScopeFlags {
        self.flags
    }

    pub fn is_compute_context(&self) -> bool {
        self.flags.contains(ScopeFlags::COMPUTE)
    }

    pub fn is_read_only(&self) -> bool {
        self.flags.contains(ScopeFlags::READ_ONLY)
    }

    pub fn is_pure(&self) -> bool {
        self.flags.contains(ScopeFlags::PURE)
    }

    pub fn is_static_policy(&self) -> bool {
        self.flags.contains(ScopeFlags::STATIC_POLICY)
    }

    pub fn has_viewer(&self) -> bool {
        self.flags.contains(ScopeFlags::VIEWER)
    }

    /// Abort and abortable calls are legal in abortable scopes and
    /// message handlers.
    pub fn can_abort(&self) -> bool {
        self.flags
            .intersects(ScopeFlags::ABORTABLE | ScopeFlags::MESSAGE_HANDLER)
    }

    /// Remote calls need a reachable cache; web `get` handlers are
    /// permitted without one because the endpoint kind is idempotent.
    pub fn can_call_service(&self) -> bool {
        self.flags.intersects(ScopeFlags::CACHE | ScopeFlags::WEB_GET)
    }

    pub fn return_contract(&self) -> ReturnContract {
        self.ret
    }

    /// The tracker collecting viewer-field reads for the enclosing
    /// declaration, when a viewer scope is active.
    pub fn viewer_tracker(&self) -> Option<&DepHandle> {
        self.viewer.as_ref()
    }

    // --- bindings ---

    /// Bind a name in the current frame. Fails with the prior binding's
    /// span when the frame already holds the name.
    pub fn define(&mut self, name: Name, local: Local) -> Result<(), Span> {
        self.frame.bind(name, local)
    }

    /// Look up a name in the frame chain only; document fallback is the
    /// checker's job.
    pub fn lookup_local(&self, name: Name) -> Option<LookupHit> {
        self.frame.lookup(name)
    }

    /// Notify every attached watcher of a committed lookup.
    pub fn notify(&self, name: Name, ty: TypeId, origin: ReferenceOrigin) {
        for watcher in &self.watchers {
            watcher.observe(name, ty, origin);
        }
    }
}
