//! Type checker run state.
//!
//! A [`Checker`] bundles everything one compilation run touches: the
//! arena/interner references, the structural type interner, the
//! document registry, the diagnostic sink, and the accumulated output.
//! All of it is created at the start of a run, passed by reference
//! throughout, and consumed into a [`TypedScript`] at the end — never a
//! hidden global.

pub mod output;
pub mod registry;

#[cfg(test)]
mod tests;

use rill_diagnostic::{Diagnostic, DiagnosticSink, ErrorCode, SinkConfig};
use rill_ir::{ExprArena, ExprId, Name, Script, StringInterner, TypeExpr, TypeExprKind, TypeId};
use rill_types::{format_type, TyType, TypeInterner};

use crate::root::TypeCheckerRoot;
use output::{OutputState, TypedScript};
use registry::DocumentRegistry;

/// Context references for type checking (external, immutable).
pub struct CheckContext<'a> {
    /// Expression arena for looking up nodes.
    pub arena: &'a ExprArena,
    /// String interner for looking up names.
    pub strings: &'a StringInterner,
}

impl<'a> CheckContext<'a> {
    pub fn new(arena: &'a ExprArena, strings: &'a StringInterner) -> Self {
        Self { arena, strings }
    }
}

/// Configuration for a checking run.
#[derive(Clone, Debug, Default)]
pub struct CheckConfig {
    pub diagnostics: SinkConfig,
}

/// State for one type-checking run.
pub struct Checker<'a> {
    /// Immutable references for node lookup.
    pub context: CheckContext<'a>,
    /// Structural type interner (the dedupe table).
    pub types: TypeInterner,
    /// Document-scope registry.
    pub registry: DocumentRegistry,
    /// Shared diagnostic sink.
    pub diagnostics: DiagnosticSink,
    /// Accumulated output.
    pub output: OutputState,
    /// Speculation depth; estimate passes must be side-effect-free, so
    /// while nonzero nothing is emitted, cached, or recorded.
    speculation: u32,
}

impl<'a> Checker<'a> {
    pub fn new(arena: &'a ExprArena, strings: &'a StringInterner) -> Self {
        Self::with_config(arena, strings, CheckConfig::default())
    }

    pub fn with_config(
        arena: &'a ExprArena,
        strings: &'a StringInterner,
        config: CheckConfig,
    ) -> Self {
        Checker {
            context: CheckContext::new(arena, strings),
            types: TypeInterner::new(),
            registry: DocumentRegistry::new(),
            diagnostics: DiagnosticSink::with_config(config.diagnostics),
            output: OutputState::new(),
            speculation: 0,
        }
    }

    /// Whether typing is committing (not inside an estimate pass).
    pub fn is_committing(&self) -> bool {
        self.speculation == 0
    }

    /// Run a closure in speculative mode: diagnostics, caches, watcher
    /// notifications, and side-channel records are all suppressed, so
    /// the result can be discarded if a later suggestion supersedes it.
    pub fn speculate<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.speculation += 1;
        let result = f(self);
        self.speculation -= 1;
        result
    }

    /// Report a diagnostic; dropped while speculating.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if self.is_committing() {
            self.diagnostics.push(diagnostic);
        }
    }

    /// Cache a node's resolved type; skipped while speculating.
    pub fn cache_expr(&mut self, id: ExprId, ty: Option<TyType>) {
        if self.is_committing() {
            self.output.cache(id, ty);
        }
    }

    /// The cached result for a node, if typing already ran.
    pub fn cached_expr(&self, id: ExprId) -> Option<Option<TyType>> {
        self.output.cached(id)
    }

    /// Record an optional-lift on an expression.
    pub fn record_lift(&mut self, id: ExprId) {
        if self.is_committing() {
            self.output.lifted.insert(id.raw());
        }
    }

    /// Record a numeric promotion on an expression.
    pub fn record_promotion(&mut self, id: ExprId) {
        if self.is_committing() {
            self.output.promoted.insert(id.raw());
        }
    }

    /// Resolve a primitive type name.
    pub fn primitive_type(&self, name: Name) -> Option<TypeId> {
        match self.context.strings.resolve(name) {
            "void" => Some(TypeId::VOID),
            "bool" => Some(TypeId::BOOL),
            "int" => Some(TypeId::INT),
            "long" => Some(TypeId::LONG),
            "double" => Some(TypeId::DOUBLE),
            "string" => Some(TypeId::STRING),
            "principal" => Some(TypeId::PRINCIPAL),
            "date" => Some(TypeId::DATE),
            _ => None,
        }
    }

    /// Resolve a parsed type annotation against primitives and the
    /// registry, reporting unknown names.
    pub fn resolve_type_expr(&mut self, ty: &TypeExpr) -> Option<TypeId> {
        match &ty.kind {
            TypeExprKind::Named(name) => {
                if let Some(prim) = self.primitive_type(*name) {
                    return Some(prim);
                }
                if let Some(declared) = self.registry.named_type(*name) {
                    return Some(declared);
                }
                let rendered = self.context.strings.resolve(*name);
                self.emit(
                    Diagnostic::error(ErrorCode::E2002)
                        .with_message(format!("unknown type `{rendered}`"))
                        .with_label(ty.span, "type not found"),
                );
                None
            }
            TypeExprKind::Maybe(inner) => {
                let inner = self.resolve_type_expr(inner)?;
                Some(self.types.maybe_of(inner))
            }
            TypeExprKind::List(elem) => {
                let elem = self.resolve_type_expr(elem)?;
                Some(self.types.list_of(elem))
            }
            TypeExprKind::Map(key, value) => {
                let key = self.resolve_type_expr(key)?;
                let value = self.resolve_type_expr(value)?;
                Some(self.types.map_of(key, value))
            }
            TypeExprKind::Tuple(elems) => {
                let mut resolved = Vec::with_capacity(elems.len());
                for elem in elems {
                    resolved.push(self.resolve_type_expr(elem)?);
                }
                Some(self.types.tuple_of(resolved))
            }
            TypeExprKind::Func { params, ret } => {
                let mut resolved = Vec::with_capacity(params.len());
                for param in params {
                    resolved.push(self.resolve_type_expr(param)?);
                }
                let ret = self.resolve_type_expr(ret)?;
                Some(self.types.intern(rill_types::TypeData::Func(rill_types::FuncData {
                    params: resolved,
                    ret,
                    kind: rill_types::FuncKind::Pure,
                    abortable: false,
                })))
            }
        }
    }

    /// Render a type for a diagnostic message.
    pub fn render_type(&self, id: TypeId) -> String {
        format_type(&self.types, self.context.strings, id)
    }

    /// Consume the run state into the resolved output.
    pub fn finish(self) -> TypedScript {
        let mut expr_types = rustc_hash::FxHashMap::default();
        for index in 0..self.context.arena.expr_count() {
            let id = ExprId::from_raw(index as u32);
            if let Some(Some(ty)) = self.output.cached(id) {
                expr_types.insert(id.raw(), ty.id);
            }
        }
        TypedScript {
            expr_types,
            lifted: self.output.lifted,
            promoted: self.output.promoted,
            defaults_filled: self.output.defaults_filled,
            captures: self.output.captures,
            aggregate_inputs: self.output.aggregate_inputs,
            functions: self.output.functions,
            fields: self.output.fields,
            metrics: self.output.metrics,
            structural_names: self.registry.structural_names().clone(),
            diagnostics: self.diagnostics.into_sorted(),
        }
    }
}

/// Type check a parsed script.
///
/// Every definition registers against its free names; the scheduler
/// resolves registrations in dependency order and each callback types
/// its bodies. The result carries resolved types, per-declaration
/// metadata, and the ordered diagnostics.
#[tracing::instrument(level = "debug", skip_all, fields(defs = script.defs.len()))]
pub fn check_script<'a>(
    script: &'a Script,
    arena: &'a ExprArena,
    strings: &'a StringInterner,
) -> TypedScript {
    check_script_with_config(script, arena, strings, CheckConfig::default())
}

/// Type check with an explicit configuration.
#[tracing::instrument(level = "debug", skip_all)]
pub fn check_script_with_config<'a>(
    script: &'a Script,
    arena: &'a ExprArena,
    strings: &'a StringInterner,
    config: CheckConfig,
) -> TypedScript {
    let mut ck = Checker::with_config(arena, strings, config);
    let mut root = TypeCheckerRoot::new();
    crate::definitions::register_script(&mut root, &mut ck, script);
    root.run(&mut ck);
    tracing::debug!(
        errors = ck.diagnostics.error_count(),
        "type checking complete"
    );
    ck.finish()
}
