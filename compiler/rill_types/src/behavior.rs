//! Access/mutability modes of type occurrences.

use rill_ir::{Span, TypeId};

/// The access/mutability mode of a type occurrence.
///
/// A document field is stored behind an accessor; a local or a literal is
/// a plain value. The mode decides whether assignment is legal and
/// whether a computation-context read needs extraction.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Behavior {
    /// A plain value; cannot be assigned to.
    ReadOnlyValue,
    /// Stored state reachable through an accessor; assignable.
    ReadWriteWithAccessor,
    /// Stored state whose accessor has been made read-only by an
    /// enclosing boundary.
    ReadOnlyWithAccessor,
}

impl Behavior {
    /// Whether an occurrence with this behavior is a legal assignment
    /// target.
    pub fn is_assignable(self) -> bool {
        matches!(self, Behavior::ReadWriteWithAccessor)
    }

    /// Whether the occurrence reads through an accessor (stored state).
    pub fn has_accessor(self) -> bool {
        !matches!(self, Behavior::ReadOnlyValue)
    }
}

/// One occurrence of a type: structural id + behavior + source position.
///
/// Copy-with-new-position preserves behavior; downgrades recompute it
/// explicitly. Structural identity lives entirely in `id`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct TyType {
    pub id: TypeId,
    pub behavior: Behavior,
    pub span: Span,
}

impl TyType {
    /// A plain read-only value occurrence.
    pub fn value(id: TypeId, span: Span) -> Self {
        TyType {
            id,
            behavior: Behavior::ReadOnlyValue,
            span,
        }
    }

    /// A read-write stored occurrence.
    pub fn accessor(id: TypeId, span: Span) -> Self {
        TyType {
            id,
            behavior: Behavior::ReadWriteWithAccessor,
            span,
        }
    }

    /// Copy with a new position; behavior is preserved.
    #[must_use]
    pub fn with_span(self, span: Span) -> Self {
        TyType { span, ..self }
    }

    /// Downgrade a read-write accessor to read-only; values are
    /// unchanged.
    #[must_use]
    pub fn as_read_only(self) -> Self {
        match self.behavior {
            Behavior::ReadWriteWithAccessor => TyType {
                behavior: Behavior::ReadOnlyWithAccessor,
                ..self
            },
            _ => self,
        }
    }

    /// The extracted value form used in computation context.
    #[must_use]
    pub fn as_value(self) -> Self {
        TyType {
            behavior: Behavior::ReadOnlyValue,
            ..self
        }
    }
}
