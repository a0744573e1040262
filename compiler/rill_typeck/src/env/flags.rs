//! Contextual-rule flags.

use bitflags::bitflags;

bitflags! {
    /// The contextual axes threaded through expression typing.
    ///
    /// Every contextual rule in the language is one flag here; scope
    /// operations on [`Environment`](crate::Environment) change exactly
    /// one axis at a time, and flags never leak across unrelated axes.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct ScopeFlags: u16 {
        /// Computation context: the expression's value is consumed.
        /// Cleared = statement context.
        const COMPUTE = 1 << 0;
        /// Read-only boundary: assignments and mutating calls rejected
        /// for the remainder of the subtree.
        const READ_ONLY = 1 << 1;
        /// Pure scope: only pure functions may be invoked.
        const PURE = 1 << 2;
        /// Abort-style non-local exits permitted.
        const ABORTABLE = 1 << 3;
        /// Inside a message handler body.
        const MESSAGE_HANDLER = 1 << 4;
        /// Inside a web `get` handler body.
        const WEB_GET = 1 << 5;
        /// Inside a web `put` handler body.
        const WEB_PUT = 1 << 6;
        /// Per-connection viewer field set exposed.
        const VIEWER = 1 << 7;
        /// Inside a static policy block (no document instance).
        const STATIC_POLICY = 1 << 8;
        /// A remote-call cache object is reachable in scope.
        const CACHE = 1 << 9;
    }
}
