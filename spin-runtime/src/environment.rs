//! Lexical scoping (spec §3 `Environment`, §5 resource model).
//!
//! A chain of owned maps, each holding an optional non-owning link to
//! its parent (spec §9: "Environment as an owned map plus an optional
//! parent handle, not a pointer-swap hack"). Every `Block`/loop-body/
//! call pushes a new link and the interpreter drops it on scope exit;
//! [`Environment::orphan`] exists for the one case where a value must
//! outlive the frame that created it without outliving the program —
//! constructor-returned instances bound to no variable (spec §5).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use spin_base::Symbol;

use crate::value::Object;

struct EnvironmentData<'a> {
    values: HashMap<Symbol, Object<'a>>,
    parent: Option<Environment<'a>>,
    /// Values that fell out of scope while still reachable from elsewhere
    /// (e.g. returned from a constructor call used as a sub-expression).
    /// Kept alive for the remainder of the program, per spec §5's
    /// "no destructor is invoked at block exit" discipline.
    orphans: Vec<Object<'a>>,
}

/// A cheap, `Clone`-able handle onto a scope frame.
#[derive(Clone)]
pub struct Environment<'a> {
    data: Rc<RefCell<EnvironmentData<'a>>>,
}

impl<'a> Environment<'a> {
    pub fn root() -> Self {
        Environment {
            data: Rc::new(RefCell::new(EnvironmentData {
                values: HashMap::new(),
                parent: None,
                orphans: Vec::new(),
            })),
        }
    }

    /// A new scope nested directly inside `self`.
    pub fn child(&self) -> Self {
        Environment {
            data: Rc::new(RefCell::new(EnvironmentData {
                values: HashMap::new(),
                parent: Some(self.clone()),
                orphans: Vec::new(),
            })),
        }
    }

    pub fn parent(&self) -> Option<Environment<'a>> {
        self.data.borrow().parent.clone()
    }

    /// Introduces `name` in this frame, shadowing any outer binding.
    pub fn define(&self, name: Symbol, value: Object<'a>) {
        self.data.borrow_mut().values.insert(name, value);
    }

    /// `true` if `name` is bound in this exact frame, ignoring `parent`.
    /// Used to reject redeclaration the way the original evaluator's
    /// `Environment::define` does (it only ever inspects its own map).
    pub fn defined_here(&self, name: Symbol) -> bool {
        self.data.borrow().values.contains_key(&name)
    }

    pub fn get_value(&self, name: Symbol) -> Option<Object<'a>> {
        let data = self.data.borrow();
        if let Some(v) = data.values.get(&name) {
            return Some(v.clone());
        }
        data.parent.as_ref().and_then(|p| p.get_value(name))
    }

    /// Walks the chain looking for the frame that owns `name`, and
    /// assigns into it directly — used by plain identifier assignment,
    /// which must mutate the existing binding rather than shadow it.
    pub fn assign(&self, name: Symbol, value: Object<'a>) -> bool {
        let mut data = self.data.borrow_mut();
        if data.values.contains_key(&name) {
            data.values.insert(name, value);
            return true;
        }
        match &data.parent {
            Some(p) => p.assign(name, value),
            None => false,
        }
    }

    pub fn is_defined(&self, name: Symbol) -> bool {
        let data = self.data.borrow();
        data.values.contains_key(&name) || data.parent.as_ref().is_some_and(|p| p.is_defined(name))
    }

    /// Removes `name` from this frame only, unlike [`assign`]. Mirrors
    /// the original evaluator's `Environment::forget`, which looks only
    /// at its own `values` map and never walks to `enclosing` (spec §4.5
    /// `Delete`: "forget the name in the current frame only; error if
    /// not present").
    pub fn forget(&self, name: Symbol) -> bool {
        self.data.borrow_mut().values.remove(&name).is_some()
    }

    /// Keeps `value` alive past this frame's own lifetime without
    /// binding it to any name.
    pub fn orphan(&self, value: Object<'a>) {
        self.data.borrow_mut().orphans.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spin_base::Interner;

    #[test]
    fn child_scope_sees_parent_bindings() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let root = Environment::root();
        root.define(x, Object::Integer(1));
        let child = root.child();
        assert!(matches!(child.get_value(x), Some(Object::Integer(1))));
    }

    #[test]
    fn assignment_mutates_the_declaring_frame_not_the_inner_one() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let root = Environment::root();
        root.define(x, Object::Integer(1));
        let child = root.child();
        assert!(child.assign(x, Object::Integer(2)));
        assert!(matches!(root.get_value(x), Some(Object::Integer(2))));
        assert!(child.is_defined(x));
    }

    #[test]
    fn shadowing_does_not_touch_the_outer_binding() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let root = Environment::root();
        root.define(x, Object::Integer(1));
        let child = root.child();
        child.define(x, Object::Integer(99));
        assert!(matches!(child.get_value(x), Some(Object::Integer(99))));
        assert!(matches!(root.get_value(x), Some(Object::Integer(1))));
    }

    #[test]
    fn forget_only_removes_from_the_current_frame() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let root = Environment::root();
        root.define(x, Object::Integer(1));
        let child = root.child();
        assert!(!child.forget(x));
        assert!(root.is_defined(x));
    }

    #[test]
    fn forget_removes_a_binding_declared_in_this_frame() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let root = Environment::root();
        let child = root.child();
        child.define(x, Object::Integer(1));
        assert!(child.forget(x));
        assert!(!child.is_defined(x));
    }
}
