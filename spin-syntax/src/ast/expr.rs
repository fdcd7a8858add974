//! Expression nodes.
//!
//! Literal payloads are parsed scalars (`LiteralValue`), not runtime
//! `Object`s — the AST must not depend on the runtime crate that walks
//! it. The interpreter converts a `LiteralValue` into an `Object` on
//! first visit; unlike the original evaluator this value isn't cached
//! back into the node (that would need interior mutability of a runtime
//! type living inside a syntax-only crate), but the conversion is a
//! single match arm, cheap enough to repeat on every visit.

use spin_base::{Span, Symbol};

use crate::token::TokenKind;

/// A literal scalar as the parser understood it from its token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiteralValue {
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Imaginary(f64),
    Character(u8),
    String(Symbol),
}

/// Which basis or named vector a `Bra`/`Ket` expression refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BraKetRef {
    /// `<0|`, `<1|`, `|0>`, `|1>` — the fixed two-dimensional basis.
    Basis(u8),
    /// `<name|` or `|name>` — a previously declared Vector.
    Named(Symbol),
}

#[derive(Debug, Clone, Copy)]
pub enum Expression<'a> {
    Literal {
        value: LiteralValue,
        span: Span,
    },
    Identifier {
        name: Symbol,
        span: Span,
    },
    SelfExpr {
        span: Span,
    },
    Grouping(&'a Expression<'a>),
    List {
        elements: &'a [Expression<'a>],
        span: Span,
    },
    /// `target = value`, produced only when the parsed target is an
    /// identifier, `DynamicGet`, or `StaticGet` (spec assignment desugaring).
    Assignment {
        target: &'a Expression<'a>,
        value: &'a Expression<'a>,
        span: Span,
    },
    /// A compound-assign (`+=` … `^=`) whose left side was an identifier;
    /// kept distinct from `Binary` so the interpreter can dispatch straight
    /// to `Processor::apply_mutable_assignment`.
    Mutable {
        name: Symbol,
        op: TokenKind,
        value: &'a Expression<'a>,
        span: Span,
    },
    Binary {
        left: &'a Expression<'a>,
        op: TokenKind,
        right: &'a Expression<'a>,
        span: Span,
    },
    Comparison {
        left: &'a Expression<'a>,
        op: TokenKind,
        right: &'a Expression<'a>,
        span: Span,
    },
    /// `&&` / `||`, short-circuiting; both operands must evaluate Boolean.
    Logical {
        left: &'a Expression<'a>,
        op: TokenKind,
        right: &'a Expression<'a>,
        span: Span,
    },
    /// Prefix (`- + ~ !`) or postfix (`° ^ '`) unary application.
    Unary {
        op: TokenKind,
        operand: &'a Expression<'a>,
        postfix: bool,
        span: Span,
    },
    /// `target[index]`. `index` is `None` for a bare `target[]`, which the
    /// grammar permits but evaluation always rejects (mirrors the
    /// original parser's `completeSubscript`, which allows a null index
    /// expression to flow through to the evaluator rather than rejecting
    /// it at parse time).
    Subscript {
        target: &'a Expression<'a>,
        index: Option<&'a Expression<'a>>,
        span: Span,
    },
    /// `new`-qualified calls mark `is_new`; the parser has already checked
    /// that such a call's callee names a type.
    Call {
        callee: &'a Expression<'a>,
        args: &'a [Expression<'a>],
        is_new: bool,
        span: Span,
    },
    /// `object.name` — `self_reference` is set when the chain started at
    /// `self`, letting the interpreter bypass the external access modifier.
    DynamicGet {
        object: &'a Expression<'a>,
        name: Symbol,
        self_reference: bool,
        span: Span,
    },
    /// `object::name` — static member access.
    StaticGet {
        object: &'a Expression<'a>,
        name: Symbol,
        self_reference: bool,
        span: Span,
    },
    DynamicSet {
        object: &'a Expression<'a>,
        name: Symbol,
        value: &'a Expression<'a>,
        self_reference: bool,
        span: Span,
    },
    StaticSet {
        object: &'a Expression<'a>,
        name: Symbol,
        value: &'a Expression<'a>,
        self_reference: bool,
        span: Span,
    },
    Bra {
        which: BraKetRef,
        span: Span,
    },
    Ket {
        which: BraKetRef,
        span: Span,
    },
    /// `<a|b>` literal, names extracted from the single lexeme.
    Inner {
        bra: Symbol,
        ket: Symbol,
        span: Span,
    },
    /// `|a><b|` literal. Outer-product *evaluation* is an intentionally
    /// unimplemented gap carried over from the original evaluator (see
    /// the interpreter's `visit_outer`); the node itself parses fine.
    Outer {
        ket: Symbol,
        bra: Symbol,
        span: Span,
    },
}

impl<'a> Expression<'a> {
    pub fn span(&self) -> Span {
        match self {
            Expression::Literal { span, .. }
            | Expression::Identifier { span, .. }
            | Expression::SelfExpr { span }
            | Expression::List { span, .. }
            | Expression::Assignment { span, .. }
            | Expression::Mutable { span, .. }
            | Expression::Binary { span, .. }
            | Expression::Comparison { span, .. }
            | Expression::Logical { span, .. }
            | Expression::Unary { span, .. }
            | Expression::Subscript { span, .. }
            | Expression::Call { span, .. }
            | Expression::DynamicGet { span, .. }
            | Expression::StaticGet { span, .. }
            | Expression::DynamicSet { span, .. }
            | Expression::StaticSet { span, .. }
            | Expression::Bra { span, .. }
            | Expression::Ket { span, .. }
            | Expression::Inner { span, .. }
            | Expression::Outer { span, .. } => *span,
            Expression::Grouping(inner) => inner.span(),
        }
    }
}
