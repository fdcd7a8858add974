//! Callable runtime values (spec §4.6): `Function`, `Procedure`,
//! `NativeFunction`, `NativeProcedure`. All four share the `CallProtocol`
//! capability — `call`, `arity`, `stringValue`, `copy`, and a bound `self`
//! slot — implemented here as inherent methods on [`Routine`] rather than
//! a trait, since every variant needs interpreter access to actually run.

use std::fmt;
use std::rc::Rc;

use spin_base::Symbol;
use spin_syntax::ast::{Param, Statement};

use super::class::Instance;
use super::Object;

/// A user-defined `func`/`proc` declaration plus the environment it closed
/// over. Shared by `Rc` so copying a `Routine` value (e.g. returning it
/// from a `DynamicGet`) is cheap and every copy still calls the same body.
pub struct RoutineDef<'a> {
    pub name: Symbol,
    pub params: &'a [Param],
    /// `Some` for a `Function` (its declared return type name); `None`
    /// would be a contradiction for this struct — procedures use a
    /// separate variant precisely so this stays meaningful.
    pub return_type: Symbol,
    pub body: &'a [Statement<'a>],
    pub closure: crate::environment::Environment<'a>,
}

/// A host-implemented routine (`Console.write`, `clock`, `random`, …).
/// `arity: None` marks the "mutable parameters" escape hatch spec §4.6
/// mentions for variadic/typeless natives like `Console.write`.
pub struct NativeDef<'a> {
    pub name: &'static str,
    pub arity: Option<usize>,
    pub func: NativeFn<'a>,
}

pub type NativeFn<'a> = Rc<
    dyn Fn(
        &mut crate::interpreter::Interpreter<'a>,
        &[Object<'a>],
        spin_base::Span,
    ) -> spin_base::Result<Option<Object<'a>>>,
>;

#[derive(Clone)]
pub enum Routine<'a> {
    Function(Rc<RoutineDef<'a>>, Option<Box<Instance<'a>>>),
    Procedure(Rc<RoutineDef<'a>>, Option<Box<Instance<'a>>>),
    NativeFunction(Rc<NativeDef<'a>>, Option<Box<Instance<'a>>>),
    NativeProcedure(Rc<NativeDef<'a>>, Option<Box<Instance<'a>>>),
}

impl<'a> Routine<'a> {
    pub fn name(&self) -> &str {
        match self {
            Routine::Function(def, _) | Routine::Procedure(def, _) => {
                // Symbol text isn't reachable without an interner here;
                // callers that need the name for diagnostics resolve it
                // themselves. This accessor exists for natives only.
                let _ = def;
                "<routine>"
            }
            Routine::NativeFunction(def, _) | Routine::NativeProcedure(def, _) => def.name,
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Routine::Function(..) | Routine::NativeFunction(..))
    }

    pub fn arity(&self) -> Option<usize> {
        match self {
            Routine::Function(def, _) | Routine::Procedure(def, _) => Some(def.params.len()),
            Routine::NativeFunction(def, _) | Routine::NativeProcedure(def, _) => def.arity,
        }
    }

    /// Binds `obj` as `self` for an instance-method call (spec §4.6's
    /// "Method binding"). Returns a new `Routine` value sharing the same
    /// underlying definition.
    pub fn bind(&self, obj: Instance<'a>) -> Routine<'a> {
        match self {
            Routine::Function(def, _) => Routine::Function(def.clone(), Some(Box::new(obj))),
            Routine::Procedure(def, _) => Routine::Procedure(def.clone(), Some(Box::new(obj))),
            Routine::NativeFunction(def, _) => {
                Routine::NativeFunction(def.clone(), Some(Box::new(obj)))
            }
            Routine::NativeProcedure(def, _) => {
                Routine::NativeProcedure(def.clone(), Some(Box::new(obj)))
            }
        }
    }

    pub fn bound_self(&self) -> Option<&Instance<'a>> {
        match self {
            Routine::Function(_, s)
            | Routine::Procedure(_, s)
            | Routine::NativeFunction(_, s)
            | Routine::NativeProcedure(_, s) => s.as_deref(),
        }
    }
}

impl<'a> fmt::Debug for Routine<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Routine({})", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_arity_none_marks_mutable_parameters() {
        let def = Rc::new(NativeDef {
            name: "write",
            arity: None,
            func: Rc::new(|_interp, _args, _span| Ok(None)),
        });
        let routine = Routine::NativeProcedure(def, None);
        assert_eq!(routine.arity(), None);
    }
}
