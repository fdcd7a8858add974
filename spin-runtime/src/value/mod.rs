//! Runtime values (spec §3). `Object` is the tagged union every
//! expression evaluates to; `BasicType` names the subset of tags a
//! `Variable` declaration may restrict itself to (spec §4.5: "a
//! `Variable` whose declared type is a basic type rejects an
//! initializer or assignment of any other tag").

pub mod class;
pub mod complex;
pub mod routine;
pub mod vector;

use std::fmt;
use std::rc::Rc;

use spin_base::Symbol;

pub use class::{AttributeDecl, Class, ClassData, Instance};
pub use complex::Complex;
pub use routine::{NativeDef, NativeFn, Routine, RoutineDef};
pub use vector::{Direction, Vector};

/// The closed set of basic (non-reference) type names a `Variable`
/// declaration can name (spec §3 Data Model, `BasicType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicType {
    Boolean,
    Character,
    Byte,
    Integer,
    Real,
    Imaginary,
    Complex,
    String,
}

impl BasicType {
    pub fn from_name(name: &str) -> Option<BasicType> {
        Some(match name {
            "Boolean" => BasicType::Boolean,
            "Character" => BasicType::Character,
            "Byte" => BasicType::Byte,
            "Integer" => BasicType::Integer,
            "Real" => BasicType::Real,
            "Imaginary" => BasicType::Imaginary,
            "Complex" => BasicType::Complex,
            "String" => BasicType::String,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            BasicType::Boolean => "Boolean",
            BasicType::Character => "Character",
            BasicType::Byte => "Byte",
            BasicType::Integer => "Integer",
            BasicType::Real => "Real",
            BasicType::Imaginary => "Imaginary",
            BasicType::Complex => "Complex",
            BasicType::String => "String",
        }
    }
}

/// A fixed-length, type-tag-uniform (after the first assignment)
/// runtime array (spec §3: `Array`). `Rc<RefCell<..>>` so subscript
/// assignment (`a[0] = x`) mutates the same storage every alias sees,
/// matching Instance's sharing story.
pub type ArrayData<'a> = Rc<std::cell::RefCell<Vec<Object<'a>>>>;

/// Every value a Spin expression can evaluate to (spec §3, `Object`).
#[derive(Clone)]
pub enum Object<'a> {
    Boolean(bool),
    Character(char),
    Byte(u8),
    Integer(i64),
    Real(f64),
    Imaginary(f64),
    Complex(Complex),
    String(String),
    Array(ArrayData<'a>),
    Vector(Vector),
    Routine(Routine<'a>),
    Class(Class<'a>),
    Instance(Instance<'a>),
    /// The absence of a value — an uninitialised `Variable`, or a
    /// `Procedure`/native-procedure call result (spec §4.6: procedures
    /// never produce a usable expression value).
    Unknown,
}

impl<'a> Object<'a> {
    /// Human-readable type name for diagnostics (spec §7: error messages
    /// name both operand types on an unsupported pairing).
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Boolean(_) => "Boolean",
            Object::Character(_) => "Character",
            Object::Byte(_) => "Byte",
            Object::Integer(_) => "Integer",
            Object::Real(_) => "Real",
            Object::Imaginary(_) => "Imaginary",
            Object::Complex(_) => "Complex",
            Object::String(_) => "String",
            Object::Array(_) => "Array",
            Object::Vector(v) if v.is_bra() => "Bra",
            Object::Vector(_) => "Ket",
            Object::Routine(_) => "Routine",
            Object::Class(_) => "Class",
            Object::Instance(_) => "Instance",
            Object::Unknown => "Unknown",
        }
    }

    pub fn basic_type(&self) -> Option<BasicType> {
        Some(match self {
            Object::Boolean(_) => BasicType::Boolean,
            Object::Character(_) => BasicType::Character,
            Object::Byte(_) => BasicType::Byte,
            Object::Integer(_) => BasicType::Integer,
            Object::Real(_) => BasicType::Real,
            Object::Imaginary(_) => BasicType::Imaginary,
            Object::Complex(_) => BasicType::Complex,
            Object::String(_) => BasicType::String,
            _ => return None,
        })
    }

    /// Truthiness for `if`/`while`/short-circuit conditions (spec §4.5:
    /// only `Boolean` participates — anything else is a type error at
    /// the call site, not coerced here).
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Deep copy used by `Processor::apply_assignment` for `Instance =
    /// Instance` and by array-literal/array-copy construction. Scalars
    /// and shared handles (`Class`, `Routine`) are unaffected — spec §3:
    /// "copying deep-copies the payload, except Class and Routine".
    pub fn deep_clone(&self) -> Object<'a> {
        match self {
            Object::Array(data) => {
                let cloned: Vec<Object<'a>> = data.borrow().iter().map(|o| o.deep_clone()).collect();
                Object::Array(Rc::new(std::cell::RefCell::new(cloned)))
            }
            Object::Instance(instance) => Object::Instance(instance.deep_clone()),
            other => other.clone(),
        }
    }

    /// String conversion used for `+`-concatenation with a non-String
    /// operand and for `Console.write` (spec §4.4, §6). `name` resolves
    /// a `Symbol` back to text for `Routine`/`Class`/`Instance` display.
    pub fn stringify(&self, resolve: impl Fn(Symbol) -> String) -> String {
        match self {
            Object::Boolean(b) => b.to_string(),
            Object::Character(c) => c.to_string(),
            Object::Byte(b) => b.to_string(),
            Object::Integer(i) => i.to_string(),
            Object::Real(r) => r.to_string(),
            Object::Imaginary(i) => format!("{}i", i),
            Object::Complex(c) => c.to_string(),
            Object::String(s) => s.clone(),
            Object::Array(data) => {
                let items: Vec<String> = data
                    .borrow()
                    .iter()
                    .map(|o| o.stringify(&resolve))
                    .collect();
                format!("[{}]", items.join(", "))
            }
            Object::Vector(v) => {
                let inner: Vec<String> = v.components.iter().map(|c| c.to_string()).collect();
                if v.is_bra() {
                    format!("<{}|", inner.join(", "))
                } else {
                    format!("|{}>", inner.join(", "))
                }
            }
            Object::Routine(r) => format!("<routine {}>", r.name()),
            Object::Class(c) => format!("<class {}>", resolve(c.name)),
            Object::Instance(i) => format!("<instance of {}>", resolve(i.class.name)),
            Object::Unknown => "unknown".to_string(),
        }
    }
}

impl<'a> fmt::Debug for Object<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_clone_of_array_is_independent() {
        let inner = Rc::new(std::cell::RefCell::new(vec![Object::Integer(1), Object::Integer(2)]));
        let a = Object::Array(inner);
        let b = a.deep_clone();
        if let Object::Array(data) = &a {
            data.borrow_mut()[0] = Object::Integer(99);
        }
        if let Object::Array(data) = &b {
            assert!(matches!(data.borrow()[0], Object::Integer(1)));
        } else {
            panic!("expected array");
        }
    }

    #[test]
    fn basic_type_round_trips_through_name() {
        for t in [
            BasicType::Boolean,
            BasicType::Character,
            BasicType::Byte,
            BasicType::Integer,
            BasicType::Real,
            BasicType::Imaginary,
            BasicType::Complex,
            BasicType::String,
        ] {
            assert_eq!(BasicType::from_name(t.name()), Some(t));
        }
    }
}
