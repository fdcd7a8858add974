//! End-to-end tests: Complex scalar arithmetic (spec §3/§4.4).

mod common;

use common::run_source;
use spin_runtime::Object;

#[test]
fn squaring_one_plus_two_i_matches_foil_expansion() {
    let (mut interp, result) = run_source("Complex z = 1 + 2i; Complex w = z * z;");
    result.expect("program should evaluate without error");
    match interp.global("w") {
        Some(Object::Complex(c)) => {
            assert_eq!(c.re, -3.0);
            assert_eq!(c.im, 4.0);
        }
        other => panic!("expected a Complex result, found {:?}", other),
    }
}

#[test]
fn dividing_by_a_zero_magnitude_complex_is_an_evaluation_error() {
    let (_interp, result) = run_source("Complex z = 1 + 1i; Complex w = z / (0 + 0i);");
    assert!(result.is_err());
}
