//! Free-variable extraction over statement and expression trees.
//!
//! A definition's free names — referenced but not locally bound — drive
//! its position in the dependency-ordered pass. Field accesses
//! additionally require a synthetic `::field` name so registration can
//! also depend on structural shape, not just variable names; these
//! synthetics are ordering hints, relaxed by the scheduler when nothing
//! publishes them.

use rustc_hash::FxHashSet;

use rill_ir::{
    ExprArena, ExprId, ExprKind, Name, StmtId, StmtKind, StmtRange, StringInterner, TypeExpr,
    TypeExprKind,
};

/// One required name of a registration.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Require {
    pub name: Name,
    /// Synthetic `::field` shape dependency; relaxed if never published.
    pub ordering_hint: bool,
}

/// Accumulates the free-name set of one definition.
///
/// Grows monotonically during a single walk; entering a name-binding
/// construct pushes a nested scope whose bound names are excluded from
/// the final set.
pub struct FreeEnvironment {
    scopes: Vec<FxHashSet<Name>>,
    free: Vec<Require>,
    seen: FxHashSet<Name>,
}

impl FreeEnvironment {
    pub fn new() -> Self {
        FreeEnvironment {
            scopes: vec![FxHashSet::default()],
            free: Vec::new(),
            seen: FxHashSet::default(),
        }
    }

    /// Enter a name-binding construct.
    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashSet::default());
    }

    /// Leave a name-binding construct, dropping its bound names.
    pub fn pop_scope(&mut self) {
        debug_assert!(self.scopes.len() > 1, "cannot pop the root scope");
        self.scopes.pop();
    }

    /// Mark a name as bound in the innermost scope.
    pub fn bind(&mut self, name: Name) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name);
        }
    }

    /// Record a referenced name, unless bound at any enclosing level.
    pub fn require(&mut self, name: Name) {
        if self.scopes.iter().any(|scope| scope.contains(&name)) {
            return;
        }
        if self.seen.insert(name) {
            self.free.push(Require {
                name,
                ordering_hint: false,
            });
        }
    }

    /// Record a synthetic `::field` shape dependency.
    pub fn require_field(&mut self, field: Name, strings: &StringInterner) {
        let synthetic = strings.intern(&format!("::{}", strings.resolve(field)));
        if self.seen.insert(synthetic) {
            self.free.push(Require {
                name: synthetic,
                ordering_hint: true,
            });
        }
    }

    /// The accumulated free set, in first-reference order.
    pub fn into_requires(self) -> Vec<Require> {
        self.free
    }
}

impl Default for FreeEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a type-annotation name is a primitive (never a dependency).
pub fn is_primitive_name(text: &str) -> bool {
    matches!(
        text,
        "void" | "bool" | "int" | "long" | "double" | "string" | "principal" | "date"
    )
}

/// Collect requirements from a type annotation.
pub fn free_type_expr(strings: &StringInterner, fe: &mut FreeEnvironment, ty: &TypeExpr) {
    match &ty.kind {
        TypeExprKind::Named(name) => {
            if !is_primitive_name(strings.resolve(*name)) {
                fe.require(*name);
            }
        }
        TypeExprKind::Maybe(inner) | TypeExprKind::List(inner) => {
            free_type_expr(strings, fe, inner);
        }
        TypeExprKind::Map(key, value) => {
            free_type_expr(strings, fe, key);
            free_type_expr(strings, fe, value);
        }
        TypeExprKind::Tuple(elems) => {
            for elem in elems {
                free_type_expr(strings, fe, elem);
            }
        }
        TypeExprKind::Func { params, ret } => {
            for param in params {
                free_type_expr(strings, fe, param);
            }
            free_type_expr(strings, fe, ret);
        }
    }
}

/// Collect free names from an expression subtree.
pub fn free_expr(
    arena: &ExprArena,
    strings: &StringInterner,
    fe: &mut FreeEnvironment,
    id: ExprId,
) {
    match &arena.get_expr(id).kind {
        ExprKind::Int(_)
        | ExprKind::Long(_)
        | ExprKind::Double(_)
        | ExprKind::Bool(_)
        | ExprKind::Str(_)
        | ExprKind::Null => {}

        ExprKind::Ident(name) => fe.require(*name),

        // Viewer fields resolve against the viewer table, but their
        // declarations still publish the name, so the reference orders
        // after the declaration.
        ExprKind::ViewerRef(name) => fe.require(*name),

        ExprKind::Binary { left, right, .. } => {
            free_expr(arena, strings, fe, *left);
            free_expr(arena, strings, fe, *right);
        }
        ExprKind::Unary { operand, .. } => free_expr(arena, strings, fe, *operand),
        ExprKind::Assign { target, value } => {
            free_expr(arena, strings, fe, *target);
            free_expr(arena, strings, fe, *value);
        }
        ExprKind::Ternary {
            cond,
            then_value,
            else_value,
        } => {
            free_expr(arena, strings, fe, *cond);
            free_expr(arena, strings, fe, *then_value);
            free_expr(arena, strings, fe, *else_value);
        }
        ExprKind::Call { callee, args } => {
            free_expr(arena, strings, fe, *callee);
            for arg in arena.get_expr_list(*args) {
                free_expr(arena, strings, fe, *arg);
            }
        }
        ExprKind::Field { receiver, field } => {
            free_expr(arena, strings, fe, *receiver);
            fe.require_field(*field, strings);
        }
        ExprKind::Index { receiver, index } => {
            free_expr(arena, strings, fe, *receiver);
            free_expr(arena, strings, fe, *index);
        }
        ExprKind::Array(elements) | ExprKind::Tuple(elements) => {
            for elem in arena.get_expr_list(*elements) {
                free_expr(arena, strings, fe, *elem);
            }
        }
        ExprKind::Object(fields) => {
            for field in arena.get_fields(*fields) {
                match field.value {
                    Some(value) => free_expr(arena, strings, fe, value),
                    // Shorthand { x } references x.
                    None => fe.require(field.name),
                }
            }
        }
        ExprKind::Lambda { params, body } => {
            fe.push_scope();
            for param in arena.get_params(*params) {
                fe.bind(param.name);
                if let Some(ty) = &param.ty {
                    free_type_expr(strings, fe, ty);
                }
            }
            free_expr(arena, strings, fe, *body);
            fe.pop_scope();
        }
    }
}

/// Collect free names from a statement.
pub fn free_stmt(
    arena: &ExprArena,
    strings: &StringInterner,
    fe: &mut FreeEnvironment,
    id: StmtId,
) {
    match &arena.get_stmt(id).kind {
        StmtKind::Expr(expr) => free_expr(arena, strings, fe, *expr),
        StmtKind::Let { name, ty, init } => {
            if let Some(ty) = ty {
                free_type_expr(strings, fe, ty);
            }
            // The initializer is evaluated before the binding exists.
            free_expr(arena, strings, fe, *init);
            fe.bind(*name);
        }
        StmtKind::Return { value } => {
            if let Some(value) = value {
                free_expr(arena, strings, fe, *value);
            }
        }
        StmtKind::Abort => {}
        StmtKind::If {
            cond,
            then_block,
            else_block,
        } => {
            free_expr(arena, strings, fe, *cond);
            free_block(arena, strings, fe, *then_block);
            if let Some(else_block) = else_block {
                free_block(arena, strings, fe, *else_block);
            }
        }
        StmtKind::While { cond, body } => {
            free_expr(arena, strings, fe, *cond);
            free_block(arena, strings, fe, *body);
        }
        StmtKind::Foreach {
            binding,
            iter,
            body,
        } => {
            free_expr(arena, strings, fe, *iter);
            fe.push_scope();
            fe.bind(*binding);
            free_block(arena, strings, fe, *body);
            fe.pop_scope();
        }
        StmtKind::Block(block) => free_block(arena, strings, fe, *block),
    }
}

/// Collect free names from a block, scoping its `let` bindings.
pub fn free_block(
    arena: &ExprArena,
    strings: &StringInterner,
    fe: &mut FreeEnvironment,
    block: StmtRange,
) {
    fe.push_scope();
    for stmt in arena.get_block(block) {
        free_stmt(arena, strings, fe, *stmt);
    }
    fe.pop_scope();
}
