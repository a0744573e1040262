//! Contextual-rule (scope violation) tests.

use rill_diagnostic::ErrorCode;
use rill_ir::FunctionPurity;

use super::error_codes;
use super::support::Build;

#[test]
fn test_pure_function_cannot_call_procedure() {
    let mut b = Build::new();
    // A mutating procedure.
    let zero = b.int(0);
    b.field_def("counter", Some("int"), Some(zero));
    let target = b.ident("counter");
    let one = b.int(1);
    let bump = b.assign(target, one);
    let bump_stmt = b.expr_stmt(bump);
    let proc_body = b.block(&[bump_stmt]);
    b.function("bump", &[], None, proc_body, FunctionPurity::Procedure, false);

    // A pure function calling it.
    let callee = b.ident("bump");
    let call = b.call(callee, &[]);
    let call_stmt = b.expr_stmt(call);
    let pure_body = b.block(&[call_stmt]);
    b.function("probe", &[], None, pure_body, FunctionPurity::Pure, false);

    let typed = b.check();
    assert_eq!(error_codes(&typed.diagnostics), vec![ErrorCode::E3002]);
    // The violated call has no resolved type.
    assert_eq!(typed.expr_type(call), None);
}

#[test]
fn test_pure_function_may_call_pure() {
    let mut b = Build::new();
    let one = b.int(1);
    let ret = b.ret(Some(one));
    let body = b.block(&[ret]);
    b.function("unit", &[], Some("int"), body, FunctionPurity::Pure, false);

    let callee = b.ident("unit");
    let call = b.call(callee, &[]);
    let ret2 = b.ret(Some(call));
    let body2 = b.block(&[ret2]);
    b.function("twice", &[], Some("int"), body2, FunctionPurity::Pure, false);

    let typed = b.check();
    assert!(!typed.has_errors(), "diagnostics: {:?}", typed.diagnostics);
}

#[test]
fn test_abort_outside_abortable_scope() {
    let mut b = Build::new();
    let abort = b.abort_stmt();
    let body = b.block(&[abort]);
    b.function("quit", &[], None, body, FunctionPurity::Procedure, false);

    let typed = b.check();
    assert_eq!(error_codes(&typed.diagnostics), vec![ErrorCode::E3003]);
}

#[test]
fn test_abort_inside_message_handler() {
    let mut b = Build::new();
    b.message("Ping", &[]);
    let abort = b.abort_stmt();
    let body = b.block(&[abort]);
    b.handler("pings", "Ping", "m", body);

    let typed = b.check();
    assert!(!typed.has_errors(), "diagnostics: {:?}", typed.diagnostics);
}

#[test]
fn test_abortable_function_requires_abortable_caller() {
    let mut b = Build::new();
    let abort = b.abort_stmt();
    let risky_body = b.block(&[abort]);
    b.function("risky", &[], None, risky_body, FunctionPurity::Procedure, true);

    // Calling from a plain function is rejected...
    let callee = b.ident("risky");
    let call = b.call(callee, &[]);
    let stmt = b.expr_stmt(call);
    let body = b.block(&[stmt]);
    b.function("caller", &[], None, body, FunctionPurity::Procedure, false);

    // ...but calling from a handler is fine.
    b.message("Go", &[]);
    let callee2 = b.ident("risky");
    let call2 = b.call(callee2, &[]);
    let stmt2 = b.expr_stmt(call2);
    let handler_body = b.block(&[stmt2]);
    b.handler("go", "Go", "m", handler_body);

    let typed = b.check();
    assert_eq!(error_codes(&typed.diagnostics), vec![ErrorCode::E3003]);
    assert_eq!(typed.expr_type(call), None);
    assert!(typed.expr_type(call2).is_some());
}

#[test]
fn test_web_get_is_read_only() {
    let mut b = Build::new();
    let zero = b.int(0);
    b.field_def("hits", Some("int"), Some(zero));
    b.message("Page", &[]);

    let target = b.ident("hits");
    let one = b.int(1);
    let assign = b.assign(target, one);
    let stmt = b.expr_stmt(assign);
    let response = b.object(&[]);
    let ret = b.ret(Some(response));
    let body = b.block(&[stmt, ret]);
    b.web_get("/stats", body);

    let typed = b.check();
    assert_eq!(error_codes(&typed.diagnostics), vec![ErrorCode::E3001]);
}

#[test]
fn test_handler_may_mutate_fields() {
    let mut b = Build::new();
    let zero = b.int(0);
    b.field_def("balance", Some("int"), Some(zero));
    b.message("Deposit", &[("amount", "int", None)]);

    let target = b.ident("balance");
    let balance = b.ident("balance");
    let m = b.ident("m");
    let amount = b.field_access(m, "amount");
    let sum = b.binary(rill_ir::BinaryOp::Add, balance, amount);
    let assign = b.assign(target, sum);
    let stmt = b.expr_stmt(assign);
    let body = b.block(&[stmt]);
    b.handler("deposits", "Deposit", "m", body);

    let typed = b.check();
    assert!(!typed.has_errors(), "diagnostics: {:?}", typed.diagnostics);
}

#[test]
fn test_service_call_requires_cache() {
    let mut b = Build::new();
    b.message("Query", &[]);
    b.message("Answer", &[]);
    b.service("oracle", &[("ask", "Query", "Answer")]);

    // From a plain function: no cache in scope.
    let service = b.ident("oracle");
    let method = b.field_access(service, "ask");
    let arg = b.object(&[]);
    let call = b.call(method, &[arg]);
    let stmt = b.expr_stmt(call);
    let body = b.block(&[stmt]);
    b.function("probe", &[], None, body, FunctionPurity::Procedure, false);

    let typed = b.check();
    assert_eq!(error_codes(&typed.diagnostics), vec![ErrorCode::E3004]);
}

#[test]
fn test_service_call_allowed_in_handler_and_web_get() {
    let mut b = Build::new();
    b.message("Query", &[]);
    b.message("Answer", &[]);
    b.service("oracle", &[("ask", "Query", "Answer")]);

    // Handler: cache reachable.
    b.message("Go", &[]);
    let service = b.ident("oracle");
    let method = b.field_access(service, "ask");
    let arg = b.object(&[]);
    let call = b.call(method, &[arg]);
    let stmt = b.expr_stmt(call);
    let handler_body = b.block(&[stmt]);
    b.handler("go", "Go", "m", handler_body);

    // Web get: read-only yet idempotent, so still permitted.
    let service2 = b.ident("oracle");
    let method2 = b.field_access(service2, "ask");
    let arg2 = b.object(&[]);
    let call2 = b.call(method2, &[arg2]);
    let ret = b.ret(Some(call2));
    let get_body = b.block(&[ret]);
    b.web_get("/ask", get_body);

    let typed = b.check();
    assert!(!typed.has_errors(), "diagnostics: {:?}", typed.diagnostics);
}

#[test]
fn test_viewer_access_outside_viewer_scope() {
    let mut b = Build::new();
    let zero = b.int(0);
    b.viewer_field_def("cursor", Some("int"), Some(zero));

    let cursor = b.viewer_ref("cursor");
    b.field_def("snapshot", Some("int"), Some(cursor));

    let typed = b.check();
    assert_eq!(error_codes(&typed.diagnostics), vec![ErrorCode::E3005]);
}

#[test]
fn test_viewer_field_reads_recorded() {
    let mut b = Build::new();
    let zero = b.int(0);
    b.viewer_field_def("cursor", Some("int"), Some(zero));

    let cursor = b.viewer_ref("cursor");
    let two = b.int(2);
    let doubled = b.binary(rill_ir::BinaryOp::Mul, cursor, two);
    b.viewer_field_def("cursor_doubled", None, Some(doubled));

    let typed = b.check();
    assert!(!typed.has_errors(), "diagnostics: {:?}", typed.diagnostics);
    let record = typed.field(b.name("cursor_doubled")).unwrap();
    assert!(record.viewer);
    assert_eq!(record.viewer_fields, vec![b.name("cursor")]);
}

#[test]
fn test_static_policy_cannot_touch_document_state() {
    let mut b = Build::new();
    let zero = b.int(0);
    b.field_def("balance", Some("int"), Some(zero));

    let balance = b.ident("balance");
    let limit = b.int(10);
    let check = b.binary(rill_ir::BinaryOp::Lt, balance, limit);
    b.static_block(&[("create", check)]);

    let typed = b.check();
    assert!(typed
        .diagnostics
        .iter()
        .any(|d| d.code == ErrorCode::E3006 && d.message.contains("balance")));
}

#[test]
fn test_static_policy_must_be_bool() {
    let mut b = Build::new();
    let number = b.int(1);
    b.static_block(&[("create", number)]);

    let typed = b.check();
    assert_eq!(error_codes(&typed.diagnostics), vec![ErrorCode::E2001]);
}

#[test]
fn test_bare_literal_statement_rejected() {
    let mut b = Build::new();
    let orphan = b.int(5);
    let stmt = b.expr_stmt(orphan);
    let body = b.block(&[stmt]);
    b.function("noop", &[], None, body, FunctionPurity::Procedure, false);

    let typed = b.check();
    assert_eq!(error_codes(&typed.diagnostics), vec![ErrorCode::E3006]);
}

#[test]
fn test_metric_must_be_numeric_and_pure() {
    let mut b = Build::new();
    let zero = b.int(0);
    b.field_def("load", Some("int"), Some(zero));
    let load = b.ident("load");
    b.metric("load_metric", load);

    let flag = b.boolean(true);
    b.metric("bad_metric", flag);

    let typed = b.check();
    assert_eq!(error_codes(&typed.diagnostics), vec![ErrorCode::E2001]);
    let record = typed
        .metrics
        .iter()
        .find(|m| m.name == b.name("load_metric"))
        .unwrap();
    assert!(record.dependencies.iter().any(|(n, _)| *n == b.name("load")));
}

#[test]
fn test_dispatcher_requires_totality() {
    let mut b = Build::new();
    b.enum_def("Color", &["Red", "Blue"]);

    let cond = b.boolean(true);
    let one = b.int(1);
    let ret = b.ret(Some(one));
    let then_block = b.block(&[ret]);
    let branch = b.if_stmt(cond, then_block, None);
    let body = b.block(&[branch]);
    let def = rill_ir::DispatcherDef {
        name: b.name("rank"),
        enum_name: b.name("Color"),
        params: vec![],
        ret: Some(b.named_ty("int")),
        body,
    };
    b.script
        .push(rill_ir::DefinitionKind::Dispatcher(def), rill_ir::Span::DUMMY);

    let typed = b.check();
    assert_eq!(error_codes(&typed.diagnostics), vec![ErrorCode::E5001]);
}

#[test]
fn test_web_put_requires_response_on_all_paths() {
    let mut b = Build::new();
    b.message("Update", &[]);
    let stmt_expr = b.object(&[]);
    let ret = b.ret(Some(stmt_expr));
    let cond = b.boolean(true);
    let then_block = b.block(&[ret]);
    let branch = b.if_stmt(cond, then_block, None);
    let body = b.block(&[branch]);
    b.web_put("/update", "Update", "m", body);

    let typed = b.check();
    assert_eq!(error_codes(&typed.diagnostics), vec![ErrorCode::E5001]);
}

#[test]
fn test_read_only_flag_does_not_enable_abort() {
    // Scope non-leakage: a read-only environment stays non-abortable.
    let mut b = Build::new();
    b.message("Page", &[]);
    let abort = b.abort_stmt();
    let response = b.object(&[]);
    let ret = b.ret(Some(response));
    let body = b.block(&[abort, ret]);
    b.web_get("/dump", body);

    let typed = b.check();
    assert_eq!(error_codes(&typed.diagnostics), vec![ErrorCode::E3003]);
}
