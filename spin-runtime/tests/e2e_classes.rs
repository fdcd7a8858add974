//! End-to-end tests: classes, constructors, and Instance assignment
//! semantics (spec §3 Glossary, §4.3, §8 property 7).

mod common;

use common::run_source;
use spin_runtime::Object;

#[test]
fn constructor_runs_and_sets_attributes_from_arguments() {
    let (mut interp, result) = run_source(
        "class C { @public Integer k; @create proc C(v: Integer) { self.k = v; } } C a = new C(7);",
    );
    result.expect("program should evaluate without error");
    let k = interp.interner().lookup("k").expect("'k' should have been interned");
    match interp.global("a") {
        Some(Object::Instance(inst)) => {
            assert!(matches!(inst.get(k), Some((_, Object::Integer(7)))));
        }
        other => panic!("expected an Instance, found {:?}", other),
    }
}

#[test]
fn assigning_an_instance_copies_attributes_but_not_identity() {
    let (mut interp, result) = run_source(
        "class C { @public Integer k; @create proc C(v: Integer) { self.k = v; } } \
         C p = new C(7); C q = p; q.k = 9;",
    );
    result.expect("program should evaluate without error");
    let k = interp.interner().lookup("k").expect("'k' should have been interned");
    let p = match interp.global("p") {
        Some(Object::Instance(inst)) => inst,
        other => panic!("expected an Instance for p, found {:?}", other),
    };
    let q = match interp.global("q") {
        Some(Object::Instance(inst)) => inst,
        other => panic!("expected an Instance for q, found {:?}", other),
    };
    assert!(p.same_class(&q), "p and q remain the same class after assignment");
    assert!(matches!(p.get(k), Some((_, Object::Integer(7)))), "mutating q must not affect p's copy");
    assert!(matches!(q.get(k), Some((_, Object::Integer(9)))));
}
