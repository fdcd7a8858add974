//! End-to-end tests: bra/ket Vectors and inner products (spec §3 Glossary,
//! §4.4, §8 properties 8-9).

mod common;

use common::run_source;
use spin_runtime::Object;

#[test]
fn inner_product_of_orthogonal_basis_vectors_is_zero() {
    let (mut interp, result) = run_source("Vector <v| = <0|; Vector |w> = |1>; Complex z = <v|w>;");
    result.expect("program should evaluate without error");
    match interp.global("z") {
        Some(Object::Complex(c)) => {
            assert!(c.re.abs() < 1e-9 && c.im.abs() < 1e-9);
        }
        other => panic!("expected a Complex zero, found {:?}", other),
    }
}

#[test]
fn inner_product_of_a_basis_ket_with_itself_is_one() {
    let (mut interp, result) = run_source("Vector <v| = <0|; Vector |w> = |0>; Complex z = <v|w>;");
    result.expect("program should evaluate without error");
    match interp.global("z") {
        Some(Object::Complex(c)) => {
            assert!((c.re - 1.0).abs() < 1e-9);
            assert!(c.im.abs() < 1e-9);
        }
        other => panic!("expected Complex(1, 0), found {:?}", other),
    }
}

#[test]
fn dagger_of_a_ket_becomes_a_bra() {
    let (mut interp, result) = run_source("Vector |v> = |1>; Vector <d| = v';");
    result.expect("program should evaluate without error");
    match interp.global("d") {
        Some(Object::Vector(v)) => assert!(v.is_bra()),
        other => panic!("expected a Vector, found {:?}", other),
    }
}
