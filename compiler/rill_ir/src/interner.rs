//! String interner for efficient identifier storage.
//!
//! Provides O(1) interning and lookup with thread-safe access.

// Arc is needed here for SharedInterner - the interner is shared between
// the parser that produced the tree and the type-checking run.
use super::Name;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Internal storage for interned strings.
struct InternerInner {
    /// Map from string content to index.
    map: FxHashMap<&'static str, u32>,
    /// Storage for string contents.
    strings: Vec<&'static str>,
}

impl InternerInner {
    fn with_empty() -> Self {
        // Pre-intern the empty string at index 0 so Name::EMPTY resolves.
        let empty: &'static str = "";
        let mut map = FxHashMap::default();
        map.insert(empty, 0);
        InternerInner {
            map,
            strings: vec![empty],
        }
    }
}

/// String interner with O(1) lookup and equality comparison.
///
/// # Thread Safety
/// Uses an `RwLock` for concurrent read/write access. Wrap in
/// [`SharedInterner`] for sharing across compiler phases.
pub struct StringInterner {
    inner: RwLock<InternerInner>,
}

impl StringInterner {
    /// Create a new interner with the empty string pre-interned.
    pub fn new() -> Self {
        StringInterner {
            inner: RwLock::new(InternerInner::with_empty()),
        }
    }

    /// Intern a string, returning its [`Name`].
    ///
    /// Interning the same content twice returns the same `Name`.
    pub fn intern(&self, s: &str) -> Name {
        // Fast path: already interned.
        {
            let guard = self.inner.read();
            if let Some(&idx) = guard.map.get(s) {
                return Name::from_raw(idx);
            }
        }

        let mut guard = self.inner.write();

        // Double-check after acquiring the write lock.
        if let Some(&idx) = guard.map.get(s) {
            return Name::from_raw(idx);
        }

        // Leak the string to get a 'static lifetime; the interner lives
        // for the whole compilation anyway.
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let idx = u32::try_from(guard.strings.len()).unwrap_or_else(|_| {
            panic!("interner exceeded capacity: {} strings", guard.strings.len())
        });
        guard.strings.push(leaked);
        guard.map.insert(leaked, idx);
        Name::from_raw(idx)
    }

    /// Resolve a [`Name`] back to its string content.
    pub fn resolve(&self, name: Name) -> &'static str {
        let guard = self.inner.read();
        guard.strings.get(name.index()).copied().unwrap_or("")
    }

    /// Number of interned strings.
    pub fn len(&self) -> usize {
        self.inner.read().strings.len()
    }

    /// Check whether only the pre-interned empty string is present.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle to a [`StringInterner`].
///
/// This newtype enforces that all interner sharing goes through this type,
/// preventing accidental direct `Arc<StringInterner>` usage.
#[derive(Clone)]
pub struct SharedInterner(Arc<StringInterner>);

impl SharedInterner {
    /// Create a fresh interner behind a shared handle.
    pub fn new() -> Self {
        SharedInterner(Arc::new(StringInterner::new()))
    }
}

impl Default for SharedInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for SharedInterner {
    type Target = StringInterner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_dedupes() {
        let interner = StringInterner::new();
        let a = interner.intern("balance");
        let b = interner.intern("balance");
        assert_eq!(a, b);
    }

    #[test]
    fn test_intern_distinct() {
        let interner = StringInterner::new();
        let a = interner.intern("x");
        let b = interner.intern("y");
        assert_ne!(a, b);
    }

    #[test]
    fn test_resolve_roundtrip() {
        let interner = StringInterner::new();
        let name = interner.intern("handler");
        assert_eq!(interner.resolve(name), "handler");
    }

    #[test]
    fn test_empty_pre_interned() {
        let interner = StringInterner::new();
        assert_eq!(interner.intern(""), Name::EMPTY);
        assert_eq!(interner.resolve(Name::EMPTY), "");
    }

    #[test]
    fn test_shared_interner_deref() {
        let shared = SharedInterner::default();
        let name = shared.intern("doc");
        let clone = shared.clone();
        assert_eq!(clone.resolve(name), "doc");
    }
}
