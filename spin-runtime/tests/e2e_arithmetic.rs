//! End-to-end tests: arithmetic and the Processor's operator totality /
//! commutativity properties (spec §8, properties 3 and 4).

mod common;

use common::run_source;
use spin_runtime::Object;

#[test]
fn precedence_multiplies_before_adding() {
    let (mut interp, result) = run_source("Integer x = 2 + 3 * 4;");
    result.expect("program should evaluate without error");
    assert!(matches!(interp.global("x"), Some(Object::Integer(14))));
}

#[test]
fn integer_division_by_zero_is_an_evaluation_error() {
    let (_interp, result) = run_source("Integer x = 1 / 0;");
    assert!(result.is_err());
}

#[test]
fn addition_is_commutative_for_integer_and_real() {
    let (mut a, result_a) = run_source("Integer x = 3; Real y = 4.0; Real z = x + y;");
    result_a.expect("x + y should evaluate");
    let (mut b, result_b) = run_source("Integer x = 3; Real y = 4.0; Real z = y + x;");
    result_b.expect("y + x should evaluate");
    match (a.global("z"), b.global("z")) {
        (Some(Object::Real(r1)), Some(Object::Real(r2))) => assert_eq!(r1, r2),
        other => panic!("expected two Real results, found {:?}", other),
    }
}

#[test]
fn unsupported_operand_pairing_names_both_types_in_the_error() {
    let (_interp, result) = run_source("Boolean x = true + \"s\";");
    let err = result.expect_err("Boolean + String has no defined operator arm");
    assert!(err.message.contains("Boolean"));
    assert!(err.message.contains("String"));
}
