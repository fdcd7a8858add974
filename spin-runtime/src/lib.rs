//! # spin-runtime
//!
//! Values, scoping, operator dispatch, and the tree-walking evaluator for
//! the Spin language (spec §3–§6). Depends on `spin-syntax` for the AST it
//! walks and `spin-base` for the structural atoms (`Span`, `Symbol`,
//! `SpannedError`) every stage shares; has no knowledge of lexing, Wings
//! resolution, or parsing beyond the tree it's handed.

pub mod environment;
pub mod interpreter;
pub mod library;
pub mod processor;
pub mod value;

pub use environment::Environment;
pub use interpreter::{Flow, Interpreter};
pub use processor::Processor;
pub use value::{
    ArrayData, AttributeDecl, BasicType, Class, ClassData, Complex, Direction, Instance, NativeDef,
    NativeFn, Object, Routine, RoutineDef, Vector,
};
