//! Statement nodes.

use spin_base::{Span, Symbol};

use super::expr::Expression;

/// A function/procedure parameter: a name and its declared type. `is_basic`
/// distinguishes a `BasicType` parameter from a class-typed one, mirroring
/// the same split used for variable declarations.
#[derive(Debug, Clone, Copy)]
pub struct Param {
    pub name: Symbol,
    pub type_name: Symbol,
    pub is_basic: bool,
}

/// Field/method access level (spec §3's `AccessModifier`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessModifier {
    Public,
    Hidden,
    Secure,
    Immune,
}

/// One brace-delimited class body member, already classified by the
/// parser: its access level, whether `@static`/`@shared` made it
/// class-scoped rather than per-instance, and whether it is the
/// constructor/destructor hook.
#[derive(Debug, Clone, Copy)]
pub struct ClassMember<'a> {
    pub modifier: AccessModifier,
    pub class_scoped: bool,
    pub is_create: bool,
    pub is_delete: bool,
    pub declaration: &'a Statement<'a>,
}

#[derive(Debug, Clone, Copy)]
pub enum Statement<'a> {
    Block(&'a [Statement<'a>]),
    If {
        condition: &'a Expression<'a>,
        then_branch: &'a Statement<'a>,
        else_branch: Option<&'a Statement<'a>>,
        span: Span,
    },
    /// Pre-test: loop while `condition` is true.
    While {
        condition: &'a Expression<'a>,
        body: &'a Statement<'a>,
        span: Span,
    },
    /// Post-test: run `body` once, then loop while `condition` is true.
    DoWhile {
        body: &'a Statement<'a>,
        condition: &'a Expression<'a>,
        span: Span,
    },
    /// Pre-test: loop while `condition` is false.
    Until {
        condition: &'a Expression<'a>,
        body: &'a Statement<'a>,
        span: Span,
    },
    /// Post-test: run `body` once, then loop while `condition` is false.
    RepeatUntil {
        body: &'a Statement<'a>,
        condition: &'a Expression<'a>,
        span: Span,
    },
    /// Unconditional; only exits via `break`.
    Loop {
        body: &'a Statement<'a>,
        span: Span,
    },
    For {
        declaration: &'a Statement<'a>,
        condition: &'a Expression<'a>,
        stepper: &'a Expression<'a>,
        body: &'a Statement<'a>,
        span: Span,
    },
    Break {
        span: Span,
    },
    Continue {
        span: Span,
    },
    /// `rest;` — a no-op statement.
    Rest {
        span: Span,
    },
    Return {
        value: Option<&'a Expression<'a>>,
        span: Span,
    },
    /// `delete name;` — unbinds `name` from the current frame only.
    Delete {
        name: Symbol,
        span: Span,
    },
    /// Covers both `BasicType IDENT (= expr)? ;` and
    /// `ClassName IDENT (= new ClassName(args))? ;`; `is_basic` tells the
    /// interpreter whether `type_name` names a `BasicType` or a class.
    Variable {
        type_name: Symbol,
        is_basic: bool,
        name: Symbol,
        initializer: Option<&'a Expression<'a>>,
        span: Span,
    },
    /// `Vector |name> = expr? ;` or `Vector <name| = expr? ;`.
    Vector {
        name: Symbol,
        is_ket: bool,
        initializer: Option<&'a Expression<'a>>,
        span: Span,
    },
    Function {
        name: Symbol,
        params: &'a [Param],
        return_type: Symbol,
        body: &'a [Statement<'a>],
        span: Span,
    },
    Procedure {
        name: Symbol,
        params: &'a [Param],
        body: &'a [Statement<'a>],
        span: Span,
    },
    Class {
        name: Symbol,
        members: &'a [ClassMember<'a>],
        span: Span,
    },
    Expr(&'a Expression<'a>),
    /// Records the current file name for diagnostics; emitted once per
    /// code unit ahead of its statements.
    File {
        name: Symbol,
        span: Span,
    },
}

impl<'a> Statement<'a> {
    pub fn span(&self) -> Span {
        match self {
            Statement::Block(stmts) => stmts
                .first()
                .map(|s| s.span())
                .unwrap_or_default(),
            Statement::If { span, .. }
            | Statement::While { span, .. }
            | Statement::DoWhile { span, .. }
            | Statement::Until { span, .. }
            | Statement::RepeatUntil { span, .. }
            | Statement::Loop { span, .. }
            | Statement::For { span, .. }
            | Statement::Break { span }
            | Statement::Continue { span }
            | Statement::Rest { span }
            | Statement::Return { span, .. }
            | Statement::Delete { span, .. }
            | Statement::Variable { span, .. }
            | Statement::Vector { span, .. }
            | Statement::Function { span, .. }
            | Statement::Procedure { span, .. }
            | Statement::Class { span, .. }
            | Statement::File { span, .. } => *span,
            Statement::Expr(expr) => expr.span(),
        }
    }
}
