//! Arena-allocated abstract syntax tree.
//!
//! `Expression` and `Statement` are the two Visitor-dispatched sum types
//! the rest of the pipeline walks (§3 of the data model this grammar
//! implements). Every node is allocated out of an [`AstContext`]'s arenas
//! and cross-referenced by `&'a` borrow rather than `Box`, so a whole
//! parsed unit is freed in one stroke when its arenas drop.

pub mod expr;
pub mod stmt;

pub use expr::{BraKetRef, Expression, LiteralValue};
pub use stmt::{AccessModifier, ClassMember, Param, Statement};

use spin_base::Arena;

/// The arenas a parser run allocates `Expression`/`Statement` nodes from.
///
/// Mirrors the one-context-per-parse pattern: a single value threaded
/// through every recursive-descent production instead of each production
/// owning its own arena handle.
#[derive(Clone, Copy)]
pub struct AstContext<'a> {
    pub exprs: &'a Arena<Expression<'a>>,
    pub stmts: &'a Arena<Statement<'a>>,
    pub params: &'a Arena<Param>,
    pub members: &'a Arena<ClassMember<'a>>,
}

impl<'a> AstContext<'a> {
    pub fn new(
        exprs: &'a Arena<Expression<'a>>,
        stmts: &'a Arena<Statement<'a>>,
        params: &'a Arena<Param>,
        members: &'a Arena<ClassMember<'a>>,
    ) -> Self {
        AstContext {
            exprs,
            stmts,
            params,
            members,
        }
    }
}

/// Parsed program for one code unit (spec's `SyntaxTree`): the statement
/// list plus which built-in libraries it pulled in via `import`.
pub struct SyntaxTree<'a> {
    pub statements: Vec<&'a Statement<'a>>,
    pub libraries: Vec<crate::wings::LibraryId>,
}
