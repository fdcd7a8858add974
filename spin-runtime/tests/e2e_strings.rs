//! End-to-end tests: string concatenation (spec §4.4's `+`-overload rule:
//! any operand paired with a `String` stringifies rather than erroring).

mod common;

use common::run_source;
use spin_runtime::Object;

#[test]
fn string_plus_integer_stringifies_the_integer() {
    let (mut interp, result) = run_source("String s = \"n=\" + 42;");
    result.expect("program should evaluate without error");
    assert!(matches!(interp.global("s"), Some(Object::String(ref v)) if v == "n=42"));
}

#[test]
fn string_plus_boolean_stringifies_the_boolean() {
    let (mut interp, result) = run_source("String s = \"flag=\" + true;");
    result.expect("program should evaluate without error");
    assert!(matches!(interp.global("s"), Some(Object::String(ref v)) if v == "flag=true"));
}

#[test]
fn string_plus_character_concatenates() {
    let (mut interp, result) = run_source("String s = \"ab\" + 'c';");
    result.expect("program should evaluate without error");
    assert!(matches!(interp.global("s"), Some(Object::String(ref v)) if v == "abc"));
}
