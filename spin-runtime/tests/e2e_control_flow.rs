//! End-to-end tests: short-circuit logical operators, block scoping, and
//! recursion (spec §4.5, §8 properties 5-6).

mod common;

use common::run_source;
use spin_runtime::Object;

#[test]
fn and_short_circuits_without_evaluating_the_right_operand() {
    // If '&&' evaluated the right operand, the division by zero would turn
    // this into an evaluation error.
    let (mut interp, result) = run_source("Boolean b = false && (1 / 0 == 0);");
    result.expect("short-circuited '&&' must not evaluate its right operand");
    assert!(matches!(interp.global("b"), Some(Object::Boolean(false))));
}

#[test]
fn or_short_circuits_without_evaluating_the_right_operand() {
    let (mut interp, result) = run_source("Boolean b = true || (1 / 0 == 0);");
    result.expect("short-circuited '||' must not evaluate its right operand");
    assert!(matches!(interp.global("b"), Some(Object::Boolean(true))));
}

#[test]
fn and_does_evaluate_the_right_operand_when_the_left_is_true() {
    let (_interp, result) = run_source("Boolean b = true && (1 / 0 == 0);");
    assert!(result.is_err(), "'&&' must evaluate its right operand once the left is true");
}

#[test]
fn a_block_scoped_binding_does_not_leak_to_the_enclosing_scope() {
    let (mut interp, result) = run_source(
        "Integer outer = 1; { Integer inner = 2; outer = inner + outer; } Integer after = outer;",
    );
    result.expect("program should evaluate without error");
    assert!(matches!(interp.global("outer"), Some(Object::Integer(3))));
    assert!(matches!(interp.global("after"), Some(Object::Integer(3))));
    assert!(interp.global("inner").is_none(), "'inner' must not be visible outside its block");
}

#[test]
fn recursive_fibonacci_of_ten_is_fifty_five() {
    let (mut interp, result) = run_source(
        "func fib(n: Integer) -> Integer { \
             if (n < 2) { return n; } \
             return fib(n - 1) + fib(n - 2); \
         } \
         Integer result = fib(10);",
    );
    result.expect("program should evaluate without error");
    assert!(matches!(interp.global("result"), Some(Object::Integer(55))));
}
