//! `Class` and `Instance` (spec §3).
//!
//! `Class` is a shared, non-owning handle (`Rc`) — every `Object::Class`
//! value referring to the same declaration points at the same
//! `ClassData`, so a `StaticSet` through one handle is visible through
//! every other. `Instance` shares its attribute store the same way so
//! that a bound `self` inside a method mutates the very object the
//! caller holds; [`Instance::deep_clone`] is the one place that breaks
//! that sharing, used by `Processor::apply_assignment` for `Instance =
//! Instance` (spec §4.4: "the right-hand instance is deep-copied by
//! value and replaces the left-hand payload").

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use spin_base::Symbol;
use spin_syntax::ast::AccessModifier;

use super::routine::Routine;
use super::Object;

/// One `Variable`/`Vector` declaration inside a class body, replayed for
/// every new instance (spec §3: "initialised by replaying the class's
/// dynamic-attribute declarations at construction time").
#[derive(Clone, Copy)]
pub struct AttributeDecl<'a> {
    pub modifier: AccessModifier,
    pub declaration: &'a spin_syntax::ast::Statement<'a>,
}

pub struct ClassData<'a> {
    pub name: Symbol,
    pub static_members: RefCell<HashMap<Symbol, (AccessModifier, Object<'a>)>>,
    pub dynamic_attrs: Vec<AttributeDecl<'a>>,
    pub at_create: Option<Routine<'a>>,
    pub at_delete: Option<Routine<'a>>,
}

pub type Class<'a> = Rc<ClassData<'a>>;

#[derive(Clone)]
pub struct Instance<'a> {
    pub class: Class<'a>,
    attributes: Rc<RefCell<HashMap<Symbol, (AccessModifier, Object<'a>)>>>,
}

impl<'a> Instance<'a> {
    pub fn new(class: Class<'a>, attributes: HashMap<Symbol, (AccessModifier, Object<'a>)>) -> Self {
        Instance {
            class,
            attributes: Rc::new(RefCell::new(attributes)),
        }
    }

    pub fn get(&self, name: Symbol) -> Option<(AccessModifier, Object<'a>)> {
        self.attributes.borrow().get(&name).cloned()
    }

    pub fn set(&self, name: Symbol, value: Object<'a>) -> bool {
        let mut attrs = self.attributes.borrow_mut();
        match attrs.get_mut(&name) {
            Some(slot) => {
                slot.1 = value;
                true
            }
            None => false,
        }
    }

    pub fn modifier_of(&self, name: Symbol) -> Option<AccessModifier> {
        self.attributes.borrow().get(&name).map(|(m, _)| *m)
    }

    /// Same backing `Class` declaration — required before an
    /// `Instance = Instance` assignment may proceed (spec §4.4).
    pub fn same_class(&self, other: &Instance<'a>) -> bool {
        Rc::ptr_eq(&self.class, &other.class)
    }

    /// Breaks attribute-store sharing: every attribute value is itself
    /// deep-cloned (nested instances recursively), and the result owns a
    /// fresh `Rc<RefCell<..>>`.
    pub fn deep_clone(&self) -> Instance<'a> {
        let cloned: HashMap<_, _> = self
            .attributes
            .borrow()
            .iter()
            .map(|(k, (m, v))| (*k, (*m, v.deep_clone())))
            .collect();
        Instance {
            class: self.class.clone(),
            attributes: Rc::new(RefCell::new(cloned)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spin_base::Interner;

    #[test]
    fn mutating_through_one_handle_is_visible_through_another() {
        let mut interner = Interner::new();
        let class = Rc::new(ClassData {
            name: interner.intern("C"),
            static_members: RefCell::new(HashMap::new()),
            dynamic_attrs: Vec::new(),
            at_create: None,
            at_delete: None,
        });
        let k = interner.intern("k");
        let mut attrs = HashMap::new();
        attrs.insert(k, (AccessModifier::Public, Object::Integer(1)));
        let instance = Instance::new(class, attrs);
        let handle = instance.clone();
        handle.set(k, Object::Integer(42));
        assert!(matches!(instance.get(k), Some((_, Object::Integer(42)))));
    }

    #[test]
    fn deep_clone_is_observationally_independent() {
        let mut interner = Interner::new();
        let class = Rc::new(ClassData {
            name: interner.intern("C"),
            static_members: RefCell::new(HashMap::new()),
            dynamic_attrs: Vec::new(),
            at_create: None,
            at_delete: None,
        });
        let k = interner.intern("k");
        let mut attrs = HashMap::new();
        attrs.insert(k, (AccessModifier::Public, Object::Integer(1)));
        let p = Instance::new(class, attrs);
        let q = p.deep_clone();
        q.set(k, Object::Integer(99));
        assert!(matches!(p.get(k), Some((_, Object::Integer(1)))));
        assert!(matches!(q.get(k), Some((_, Object::Integer(99)))));
    }
}
