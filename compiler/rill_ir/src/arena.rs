//! Arena storage for expression and statement trees.
//!
//! Nodes are owned by a single [`ExprArena`] and addressed by compact
//! u32 ids. Variable-length children (argument lists, blocks, literal
//! fields, lambda parameters) live in flattened side-buffers addressed
//! by `*Range` values, keeping the node enums `Copy`-friendly.

use crate::ast::expr::{Expr, ExprKind, FieldInit, Param};
use crate::ast::stmt::{Stmt, StmtKind};
use crate::Span;

/// Index of an expression in the arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct ExprId(u32);

impl ExprId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Reconstruct from a raw id previously obtained via [`ExprId::raw`].
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        ExprId(raw)
    }
}

/// Index of a statement in the arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct StmtId(u32);

impl StmtId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Range into the arena's flattened expression-list buffer.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct ExprRange {
    pub start: u32,
    pub len: u32,
}

/// Range into the arena's flattened statement-list buffer (a block).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct StmtRange {
    pub start: u32,
    pub len: u32,
}

/// Range into the arena's parameter buffer.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct ParamRange {
    pub start: u32,
    pub len: u32,
}

/// Range into the arena's object-literal field buffer.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct FieldRange {
    pub start: u32,
    pub len: u32,
}

/// Arena owning every expression and statement of one parsed script.
#[derive(Default)]
pub struct ExprArena {
    exprs: Vec<Expr>,
    stmts: Vec<Stmt>,
    expr_lists: Vec<ExprId>,
    stmt_lists: Vec<StmtId>,
    params: Vec<Param>,
    fields: Vec<FieldInit>,
}

impl ExprArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an expression node.
    pub fn alloc_expr(&mut self, kind: ExprKind, span: Span) -> ExprId {
        let id = ExprId(index_u32(self.exprs.len(), "expression"));
        self.exprs.push(Expr { kind, span });
        id
    }

    /// Allocate a statement node.
    pub fn alloc_stmt(&mut self, kind: StmtKind, span: Span) -> StmtId {
        let id = StmtId(index_u32(self.stmts.len(), "statement"));
        self.stmts.push(Stmt { kind, span });
        id
    }

    /// Flatten a list of expression ids into the side-buffer.
    pub fn alloc_expr_list(&mut self, items: &[ExprId]) -> ExprRange {
        let start = index_u32(self.expr_lists.len(), "expression list");
        self.expr_lists.extend_from_slice(items);
        ExprRange {
            start,
            len: index_u32(items.len(), "expression list"),
        }
    }

    /// Flatten a list of statement ids into a block range.
    pub fn alloc_block(&mut self, items: &[StmtId]) -> StmtRange {
        let start = index_u32(self.stmt_lists.len(), "block");
        self.stmt_lists.extend_from_slice(items);
        StmtRange {
            start,
            len: index_u32(items.len(), "block"),
        }
    }

    /// Flatten lambda parameters into the side-buffer.
    pub fn alloc_params(&mut self, items: Vec<Param>) -> ParamRange {
        let start = index_u32(self.params.len(), "parameter list");
        let len = index_u32(items.len(), "parameter list");
        self.params.extend(items);
        ParamRange { start, len }
    }

    /// Flatten object-literal fields into the side-buffer.
    pub fn alloc_fields(&mut self, items: Vec<FieldInit>) -> FieldRange {
        let start = index_u32(self.fields.len(), "field list");
        let len = index_u32(items.len(), "field list");
        self.fields.extend(items);
        FieldRange { start, len }
    }

    /// Look up an expression node.
    pub fn get_expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    /// Look up a statement node.
    pub fn get_stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    /// Resolve an expression-list range.
    pub fn get_expr_list(&self, range: ExprRange) -> &[ExprId] {
        &self.expr_lists[range.start as usize..(range.start + range.len) as usize]
    }

    /// Resolve a block range.
    pub fn get_block(&self, range: StmtRange) -> &[StmtId] {
        &self.stmt_lists[range.start as usize..(range.start + range.len) as usize]
    }

    /// Resolve a parameter range.
    pub fn get_params(&self, range: ParamRange) -> &[Param] {
        &self.params[range.start as usize..(range.start + range.len) as usize]
    }

    /// Resolve an object-literal field range.
    pub fn get_fields(&self, range: FieldRange) -> &[FieldInit] {
        &self.fields[range.start as usize..(range.start + range.len) as usize]
    }

    /// Total number of allocated expressions.
    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }
}

/// Convert a buffer length to u32, panicking on overflow.
fn index_u32(len: usize, what: &str) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| panic!("{what} buffer exceeded u32 capacity: {len}"))
}
