//! Structural-completeness analysis.
//!
//! Dispatchers, valued functions, and web handlers must produce a value
//! on every path; a body that can fall through is reported, not
//! defaulted.

use rill_ir::{ExprArena, StmtId, StmtKind, StmtRange};

/// Whether every path through the block terminates in a return or
/// abort.
pub fn block_always_returns(arena: &ExprArena, block: StmtRange) -> bool {
    arena
        .get_block(block)
        .iter()
        .any(|stmt| stmt_always_returns(arena, *stmt))
}

fn stmt_always_returns(arena: &ExprArena, id: StmtId) -> bool {
    match &arena.get_stmt(id).kind {
        StmtKind::Return { .. } | StmtKind::Abort => true,
        StmtKind::If {
            then_block,
            else_block: Some(else_block),
            ..
        } => block_always_returns(arena, *then_block) && block_always_returns(arena, *else_block),
        StmtKind::Block(block) => block_always_returns(arena, *block),
        // A loop body may never run.
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_ir::{ExprKind, Span};

    #[test]
    fn test_plain_return_terminates() {
        let mut arena = ExprArena::new();
        let ret = arena.alloc_stmt(StmtKind::Return { value: None }, Span::DUMMY);
        let block = arena.alloc_block(&[ret]);
        assert!(block_always_returns(&arena, block));
    }

    #[test]
    fn test_if_without_else_falls_through() {
        let mut arena = ExprArena::new();
        let cond = arena.alloc_expr(ExprKind::Bool(true), Span::DUMMY);
        let ret = arena.alloc_stmt(StmtKind::Return { value: None }, Span::DUMMY);
        let then_block = arena.alloc_block(&[ret]);
        let branch = arena.alloc_stmt(
            StmtKind::If {
                cond,
                then_block,
                else_block: None,
            },
            Span::DUMMY,
        );
        let block = arena.alloc_block(&[branch]);
        assert!(!block_always_returns(&arena, block));
    }

    #[test]
    fn test_if_with_both_branches_returning() {
        let mut arena = ExprArena::new();
        let cond = arena.alloc_expr(ExprKind::Bool(true), Span::DUMMY);
        let ret_a = arena.alloc_stmt(StmtKind::Return { value: None }, Span::DUMMY);
        let ret_b = arena.alloc_stmt(StmtKind::Abort, Span::DUMMY);
        let then_block = arena.alloc_block(&[ret_a]);
        let else_block = arena.alloc_block(&[ret_b]);
        let branch = arena.alloc_stmt(
            StmtKind::If {
                cond,
                then_block,
                else_block: Some(else_block),
            },
            Span::DUMMY,
        );
        let block = arena.alloc_block(&[branch]);
        assert!(block_always_returns(&arena, block));
    }

    #[test]
    fn test_while_does_not_guarantee_return() {
        let mut arena = ExprArena::new();
        let cond = arena.alloc_expr(ExprKind::Bool(true), Span::DUMMY);
        let ret = arena.alloc_stmt(StmtKind::Return { value: None }, Span::DUMMY);
        let body = arena.alloc_block(&[ret]);
        let looped = arena.alloc_stmt(StmtKind::While { cond, body }, Span::DUMMY);
        let block = arena.alloc_block(&[looped]);
        assert!(!block_always_returns(&arena, block));
    }
}
