//! Dependency-watcher and closure-capture tests.

use pretty_assertions::assert_eq;

use rill_ir::{BinaryOp, FunctionPurity, TypeId};

use super::support::Build;

#[test]
fn test_lambda_captures_exactly_the_enclosing_names() {
    // let total = ...; let scale = (x) -> x + total
    // The closure's capture set is exactly {total}: the parameter is
    // bound, the unrelated local is never referenced.
    let mut b = Build::new();
    let ten = b.int(10);
    let total_let = b.let_stmt("total", None, ten);
    let unused_init = b.int(99);
    let unused_let = b.let_stmt("unrelated", None, unused_init);

    let x = b.ident("x");
    let total = b.ident("total");
    let sum = b.binary(BinaryOp::Add, x, total);
    let lambda = b.lambda(&[("x", Some("int"))], sum);
    let lambda_let = b.let_stmt("scale", None, lambda);

    let body = b.block(&[total_let, unused_let, lambda_let]);
    b.function("make", &[], None, body, FunctionPurity::Procedure, false);

    let typed = b.check();
    assert!(!typed.has_errors(), "diagnostics: {:?}", typed.diagnostics);
    assert_eq!(
        typed.captures_of(lambda),
        &[(b.name("total"), TypeId::INT)][..]
    );
}

#[test]
fn test_lambda_does_not_capture_document_fields() {
    // Document-scope reads are function dependencies, not captures.
    let mut b = Build::new();
    let zero = b.int(0);
    b.field_def("base", Some("int"), Some(zero));

    let x = b.ident("x");
    let base = b.ident("base");
    let sum = b.binary(BinaryOp::Add, x, base);
    let lambda = b.lambda(&[("x", Some("int"))], sum);
    let lambda_let = b.let_stmt("shift", None, lambda);
    let body = b.block(&[lambda_let]);
    b.function("make", &[], None, body, FunctionPurity::Procedure, false);

    let typed = b.check();
    assert!(!typed.has_errors(), "diagnostics: {:?}", typed.diagnostics);
    assert!(typed.captures_of(lambda).is_empty());
    // The field still lands in the enclosing function's dependencies.
    let record = typed.function(b.name("make")).unwrap();
    assert!(record.dependencies.iter().any(|(n, _)| *n == b.name("base")));
}

#[test]
fn test_field_recorded_once_despite_repeated_references() {
    let mut b = Build::new();
    let zero = b.int(0);
    b.field_def("balance", Some("int"), Some(zero));

    let first = b.ident("balance");
    let second = b.ident("balance");
    let sum = b.binary(BinaryOp::Add, first, second);
    let ret = b.ret(Some(sum));
    let body = b.block(&[ret]);
    b.function("doubled", &[], Some("int"), body, FunctionPurity::Pure, false);

    let typed = b.check();
    assert!(!typed.has_errors(), "diagnostics: {:?}", typed.diagnostics);
    let record = typed.function(b.name("doubled")).unwrap();
    let hits = record
        .dependencies
        .iter()
        .filter(|(n, _)| *n == b.name("balance"))
        .count();
    assert_eq!(hits, 1);
}

#[test]
fn test_dependencies_are_transitive_through_calls() {
    // b() reads nothing directly, but calls a() which reads `balance`;
    // the scheduler types a() first, so its reads fold into b's set.
    let mut b = Build::new();
    let zero = b.int(0);
    b.field_def("balance", Some("int"), Some(zero));

    let balance = b.ident("balance");
    let ret_a = b.ret(Some(balance));
    let body_a = b.block(&[ret_a]);
    b.function("level", &[], Some("int"), body_a, FunctionPurity::Pure, false);

    let callee = b.ident("level");
    let call = b.call(callee, &[]);
    let ret_b = b.ret(Some(call));
    let body_b = b.block(&[ret_b]);
    b.function("via", &[], Some("int"), body_b, FunctionPurity::Pure, false);

    let typed = b.check();
    assert!(!typed.has_errors(), "diagnostics: {:?}", typed.diagnostics);
    let record = typed.function(b.name("via")).unwrap();
    assert!(record.dependencies.iter().any(|(n, _)| *n == b.name("level")));
    assert!(record.dependencies.iter().any(|(n, _)| *n == b.name("balance")));
}

#[test]
fn test_field_initializer_dependencies_recorded() {
    let mut b = Build::new();
    let zero = b.int(0);
    b.field_def("price", Some("int"), Some(zero));
    let one = b.int(1);
    b.field_def("count", Some("int"), Some(one));

    let price = b.ident("price");
    let count = b.ident("count");
    let product = b.binary(BinaryOp::Mul, price, count);
    b.field_def("cost", None, Some(product));

    let typed = b.check();
    assert!(!typed.has_errors(), "diagnostics: {:?}", typed.diagnostics);
    let record = typed.field(b.name("cost")).unwrap();
    let names: Vec<_> = record.dependencies.iter().map(|(n, _)| *n).collect();
    assert_eq!(names, vec![b.name("price"), b.name("count")]);
}

#[test]
fn test_aggregate_inputs_scoped_to_call_site() {
    // A lambda argument is watched per call site; the aggregate set and
    // the closure capture set both see the enclosing read, because
    // watchers chain rather than replace.
    let mut b = Build::new();

    // apply(f: func(int) -> int) -> int
    let f_ref = b.ident("f");
    let one = b.int(1);
    let inner_call = b.call(f_ref, &[one]);
    let ret = b.ret(Some(inner_call));
    let apply_body = b.block(&[ret]);
    let annotation = b.func_ty(&[b.named_ty("int")], b.named_ty("int"));
    let f_param = b.param("f", annotation);
    b.function_typed(
        "apply",
        vec![f_param],
        Some("int"),
        apply_body,
        FunctionPurity::Pure,
        false,
    );

    // caller: let bias = 5; let r = apply((x: int) -> x + bias)
    let five = b.int(5);
    let bias_let = b.let_stmt("bias", None, five);
    let x = b.ident("x");
    let bias = b.ident("bias");
    let sum = b.binary(BinaryOp::Add, x, bias);
    let lambda = b.lambda(&[("x", Some("int"))], sum);
    let callee = b.ident("apply");
    let call = b.call(callee, &[lambda]);
    let call_let = b.let_stmt("r", None, call);
    let body = b.block(&[bias_let, call_let]);
    b.function("caller", &[], None, body, FunctionPurity::Procedure, false);

    let typed = b.check();
    assert!(!typed.has_errors(), "diagnostics: {:?}", typed.diagnostics);
    assert_eq!(
        typed.captures_of(lambda),
        &[(b.name("bias"), TypeId::INT)][..]
    );
    assert_eq!(
        typed.aggregate_inputs.get(&lambda.raw()),
        Some(&vec![(b.name("bias"), TypeId::INT)])
    );
}

#[test]
fn test_estimate_pass_does_not_pollute_dependency_sets() {
    // The array literal's estimate pass visits `seed` speculatively;
    // only the committed pass may record it, and exactly once.
    let mut b = Build::new();
    let zero = b.int(0);
    b.field_def("seed", Some("int"), Some(zero));

    let seed = b.ident("seed");
    let array = b.array(&[seed]);
    b.field_def("series", None, Some(array));

    let typed = b.check();
    assert!(!typed.has_errors(), "diagnostics: {:?}", typed.diagnostics);
    let record = typed.field(b.name("series")).unwrap();
    let hits = record
        .dependencies
        .iter()
        .filter(|(n, _)| *n == b.name("seed"))
        .count();
    assert_eq!(hits, 1);
}
