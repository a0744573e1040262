//! Type checker output.
//!
//! Every expression node's resolved type is cached exactly once; the
//! side-channel flag sets (optional lifts, numeric promotions, filled
//! defaults) plus the per-declaration metadata are everything a
//! downstream code generator needs.

use rustc_hash::{FxHashMap, FxHashSet};

use rill_diagnostic::Diagnostic;
use rill_ir::{ExprId, Name, TypeId};
use rill_types::{FuncKind, TyType};

/// Metadata recorded for a function, procedure, dispatcher, or rpc.
#[derive(Clone, Debug)]
pub struct FunctionRecord {
    pub name: Name,
    pub params: Vec<TypeId>,
    pub ret: TypeId,
    pub kind: FuncKind,
    pub abortable: bool,
    /// Reactive names the body transitively reads, each exactly once,
    /// in first-reference order — the reactive-invalidation wiring input.
    pub dependencies: Vec<(Name, TypeId)>,
    /// Distinct viewer fields referenced by the body.
    pub viewer_fields: Vec<Name>,
}

/// Metadata recorded for a reactive field's initializer.
#[derive(Clone, Debug)]
pub struct FieldRecord {
    pub name: Name,
    pub ty: TypeId,
    pub viewer: bool,
    pub dependencies: Vec<(Name, TypeId)>,
    pub viewer_fields: Vec<Name>,
}

/// Metadata recorded for a metric.
#[derive(Clone, Debug)]
pub struct MetricRecord {
    pub name: Name,
    pub ty: TypeId,
    pub dependencies: Vec<(Name, TypeId)>,
}

/// Mutable output state accumulated during a run.
#[derive(Default)]
pub struct OutputState {
    /// Resolved type per expression; `None` records a typing failure so
    /// re-entry stays idempotent. Set exactly once per node.
    expr_types: FxHashMap<u32, Option<TyType>>,
    /// Expressions the generator must wrap in an optional lift.
    pub lifted: FxHashSet<u32>,
    /// Expressions the generator must numerically widen.
    pub promoted: FxHashSet<u32>,
    /// Object literals with fields filled from declared defaults.
    pub defaults_filled: FxHashMap<u32, Vec<Name>>,
    /// Per-lambda capture sets (exactly the enclosing names referenced).
    pub captures: FxHashMap<u32, Vec<(Name, TypeId)>>,
    /// Enclosing reads of lambda arguments, keyed per call-site lambda.
    pub aggregate_inputs: FxHashMap<u32, Vec<(Name, TypeId)>>,
    pub functions: Vec<FunctionRecord>,
    pub fields: Vec<FieldRecord>,
    pub metrics: Vec<MetricRecord>,
}

impl OutputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached result for a node, if typing already ran.
    pub fn cached(&self, id: ExprId) -> Option<Option<TyType>> {
        self.expr_types.get(&id.raw()).copied()
    }

    /// Cache a node's resolved type. A second write with a different
    /// value is a checker bug.
    pub(crate) fn cache(&mut self, id: ExprId, ty: Option<TyType>) {
        let prior = self.expr_types.insert(id.raw(), ty);
        debug_assert!(
            prior.is_none() || prior == Some(ty),
            "expression type cached twice with different values"
        );
    }
}

/// The resolved output of one type-checking run.
pub struct TypedScript {
    /// Resolved type per successfully typed expression, keyed by raw
    /// expression id.
    pub expr_types: FxHashMap<u32, TypeId>,
    pub lifted: FxHashSet<u32>,
    pub promoted: FxHashSet<u32>,
    pub defaults_filled: FxHashMap<u32, Vec<Name>>,
    pub captures: FxHashMap<u32, Vec<(Name, TypeId)>>,
    pub aggregate_inputs: FxHashMap<u32, Vec<(Name, TypeId)>>,
    pub functions: Vec<FunctionRecord>,
    pub fields: Vec<FieldRecord>,
    pub metrics: Vec<MetricRecord>,
    /// Synthesized names for deduplicated anonymous structural types.
    pub structural_names: FxHashMap<TypeId, Name>,
    /// Ordered diagnostics; non-empty means no code generation.
    pub diagnostics: Vec<Diagnostic>,
}

impl TypedScript {
    /// Whether any error was reported; a script with errors must not
    /// proceed to code generation.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == rill_diagnostic::Severity::Error)
    }

    /// The resolved type of an expression, if it typed successfully.
    pub fn expr_type(&self, id: ExprId) -> Option<TypeId> {
        self.expr_types.get(&id.raw()).copied()
    }

    /// The record for a named function, if one was checked.
    pub fn function(&self, name: Name) -> Option<&FunctionRecord> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// The record for a reactive field.
    pub fn field(&self, name: Name) -> Option<&FieldRecord> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The capture set of a lambda expression.
    pub fn captures_of(&self, id: ExprId) -> &[(Name, TypeId)] {
        self.captures.get(&id.raw()).map_or(&[], Vec::as_slice)
    }

    /// Whether the generator must wrap this expression in an optional
    /// lift.
    pub fn was_lifted(&self, id: ExprId) -> bool {
        self.lifted.contains(&id.raw())
    }

    /// Whether the generator must numerically widen this expression.
    pub fn was_promoted(&self, id: ExprId) -> bool {
        self.promoted.contains(&id.raw())
    }
}
