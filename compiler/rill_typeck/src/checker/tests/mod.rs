//! Tests for the dependency-ordered checker.

#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

mod scope_tests;
mod watcher_tests;

pub(crate) mod support;

use rill_diagnostic::ErrorCode;

use crate::checker::check_script;
use support::Build;

fn error_codes(diags: &[rill_diagnostic::Diagnostic]) -> Vec<ErrorCode> {
    diags.iter().map(|d| d.code).collect()
}

#[test]
fn test_forward_reference_resolves() {
    // `a` is registered before `b` but depends on it; the scheduler
    // must execute `b` first.
    let mut b = Build::new();
    let b_ref = b.ident("b");
    let one = b.int(1);
    let sum = b.binary(rill_ir::BinaryOp::Add, b_ref, one);
    b.field_def("a", None, Some(sum));
    let init = b.int(1);
    b.field_def("b", None, Some(init));

    let typed = b.check();
    assert!(!typed.has_errors(), "diagnostics: {:?}", typed.diagnostics);
    let a = typed.field(b.name("a")).unwrap();
    assert_eq!(a.ty, rill_ir::TypeId::INT);
    // The dependency on `b` is recorded for invalidation wiring.
    assert!(a.dependencies.iter().any(|(n, _)| *n == b.name("b")));
}

#[test]
fn test_undefined_name_reported_once() {
    let mut b = Build::new();
    let missing = b.ident("missing");
    let one = b.int(1);
    let sum = b.binary(rill_ir::BinaryOp::Add, missing, one);
    b.field_def("a", None, Some(sum));

    let typed = b.check();
    assert_eq!(error_codes(&typed.diagnostics), vec![ErrorCode::E1001]);
    assert!(typed.diagnostics[0].message.contains("missing"));
    // The callback never executed: no field record, no cached types.
    assert!(typed.field(b.name("a")).is_none());
}

#[test]
fn test_undefined_name_shared_across_dependents() {
    // Two definitions both depend on the same missing name; still one
    // diagnostic, not one per dependent.
    let mut b = Build::new();
    let m1 = b.ident("missing");
    b.field_def("a", None, Some(m1));
    let m2 = b.ident("missing");
    b.field_def("c", None, Some(m2));

    let typed = b.check();
    assert_eq!(error_codes(&typed.diagnostics), vec![ErrorCode::E1001]);
}

#[test]
fn test_forward_self_reference_is_error() {
    let mut b = Build::new();
    let callee = b.ident("f");
    let call = b.call(callee, &[]);
    let ret = b.ret(Some(call));
    let body = b.block(&[ret]);
    b.function(
        "f",
        &[],
        Some("int"),
        body,
        rill_ir::FunctionPurity::Pure,
        false,
    );

    let typed = b.check();
    assert!(typed
        .diagnostics
        .iter()
        .any(|d| d.code == ErrorCode::E1002 && d.message.contains('f')));
}

#[test]
fn test_mutual_recursion_surfaces_as_unresolved() {
    let mut b = Build::new();
    let g_ref = b.ident("g");
    let g_call = b.call(g_ref, &[]);
    let f_ret = b.ret(Some(g_call));
    let f_body = b.block(&[f_ret]);
    b.function("f", &[], Some("int"), f_body, rill_ir::FunctionPurity::Pure, false);

    let f_ref = b.ident("f");
    let f_call = b.call(f_ref, &[]);
    let g_ret = b.ret(Some(f_call));
    let g_body = b.block(&[g_ret]);
    b.function("g", &[], Some("int"), g_body, rill_ir::FunctionPurity::Pure, false);

    let typed = b.check();
    let codes = error_codes(&typed.diagnostics);
    assert_eq!(codes.iter().filter(|c| **c == ErrorCode::E1001).count(), 2);
}

#[test]
fn test_duplicate_declaration() {
    let mut b = Build::new();
    let one = b.int(1);
    b.field_def("score", None, Some(one));
    let two = b.int(2);
    b.field_def("score", None, Some(two));

    let typed = b.check();
    assert_eq!(error_codes(&typed.diagnostics), vec![ErrorCode::E4001]);
}

#[test]
fn test_order_independence() {
    // The same definitions in both orders produce identical diagnostics
    // and identical resolved field types.
    let build_one = |flip: bool| {
        let mut b = Build::new();
        let defs: Vec<Box<dyn Fn(&mut Build)>> = vec![
            Box::new(|b: &mut Build| {
                let r = b.ident("total");
                let two = b.int(2);
                let product = b.binary(rill_ir::BinaryOp::Mul, r, two);
                b.field_def("doubled", None, Some(product));
            }),
            Box::new(|b: &mut Build| {
                let init = b.int(21);
                b.field_def("total", None, Some(init));
            }),
        ];
        if flip {
            for def in defs.iter().rev() {
                def(&mut b);
            }
        } else {
            for def in defs.iter() {
                def(&mut b);
            }
        }
        b
    };

    let forward = build_one(false);
    let reversed = build_one(true);
    let typed_forward = forward.check();
    let typed_reversed = reversed.check();

    assert_eq!(
        error_codes(&typed_forward.diagnostics),
        error_codes(&typed_reversed.diagnostics)
    );
    assert_eq!(
        typed_forward.field(forward.name("doubled")).unwrap().ty,
        typed_reversed.field(reversed.name("doubled")).unwrap().ty
    );
}

#[test]
fn test_message_shape_orders_handler() {
    // The handler's body touches `m.amount`; the `::amount` synthetic
    // orders it after the message declaration regardless of source
    // order. With the message declared, everything resolves.
    let mut b = Build::new();
    let m_ref = b.ident("m");
    let amount = b.field_access(m_ref, "amount");
    let balance = b.ident("balance");
    let assign = b.assign(balance, amount);
    let stmt = b.expr_stmt(assign);
    let body = b.block(&[stmt]);
    b.handler("deposits", "Deposit", "m", body);

    b.message("Deposit", &[("amount", "int", None)]);
    let zero = b.int(0);
    b.field_def("balance", Some("int"), Some(zero));

    let typed = b.check();
    assert!(!typed.has_errors(), "diagnostics: {:?}", typed.diagnostics);
}

#[test]
fn test_unmatched_shape_synthetic_relaxes() {
    // Field access on a message binding whose field exists: the
    // `::missing_shape` hint for a field no message declares must not
    // deadlock unrelated definitions.
    let mut b = Build::new();
    b.message("Point", &[("x", "int", None)]);
    let p_ref = b.ident("p");
    let x = b.field_access(p_ref, "x");
    let ret = b.ret(Some(x));
    let body = b.block(&[ret]);
    b.function(
        "get_x",
        &[("p", "Point")],
        Some("int"),
        body,
        rill_ir::FunctionPurity::Pure,
        false,
    );

    let typed = b.check();
    assert!(!typed.has_errors(), "diagnostics: {:?}", typed.diagnostics);
    let record = typed.function(b.name("get_x")).unwrap();
    assert_eq!(record.ret, rill_ir::TypeId::INT);
}

#[test]
fn test_constructor_and_cron_type_against_fields() {
    let mut b = Build::new();
    let zero = b.int(0);
    b.field_def("hits", Some("int"), Some(zero));

    let target = b.ident("hits");
    let value = b.int(1);
    let assign = b.assign(target, value);
    let stmt = b.expr_stmt(assign);
    let body = b.block(&[stmt]);
    b.constructor(body);

    let target2 = b.ident("hits");
    let hits = b.ident("hits");
    let one = b.int(1);
    let sum = b.binary(rill_ir::BinaryOp::Add, hits, one);
    let assign2 = b.assign(target2, sum);
    let stmt2 = b.expr_stmt(assign2);
    let body2 = b.block(&[stmt2]);
    b.cron("nightly", "daily", body2);

    let typed = b.check();
    assert!(!typed.has_errors(), "diagnostics: {:?}", typed.diagnostics);
}

#[test]
fn test_check_script_entry_point_is_reusable() {
    let mut b = Build::new();
    let one = b.int(1);
    b.field_def("x", None, Some(one));

    let first = check_script(&b.script, &b.arena, &b.strings);
    let second = check_script(&b.script, &b.arena, &b.strings);
    assert!(!first.has_errors());
    assert_eq!(
        error_codes(&first.diagnostics),
        error_codes(&second.diagnostics)
    );
}
