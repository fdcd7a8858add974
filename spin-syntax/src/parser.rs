//! Recursive-descent parser implementing the precedence-climbing grammar.
//!
//! One [`Parser`] is built once and reused across every code unit in a
//! program; [`Parser::parse`] resets its token cursor and control-flow
//! flags on every call rather than allocating a fresh parser per unit.
//! Errors don't abort a parse: each failing production is caught at the
//! statement boundary, recorded, and the parser resynchronises on the next
//! `;` or statement-starting keyword, so one unit can report every syntax
//! error it contains in a single pass.

use std::fmt;

use spin_base::{ErrorCode, Interner, Span, SpannedError, Symbol};

use crate::ast::{
    AccessModifier, AstContext, BraKetRef, ClassMember, Expression, LiteralValue, Param,
    Statement, SyntaxTree,
};
use crate::token::{Token, TokenKind};

type PResult<T> = std::result::Result<T, SpannedError>;

/// Every syntax error collected during one [`Parser::parse`] call.
#[derive(Debug)]
pub struct ParserErrorException {
    pub errors: Vec<SpannedError>,
}

impl fmt::Display for ParserErrorException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} syntax error(s)", self.errors.len())
    }
}

impl std::error::Error for ParserErrorException {}

const LOW_PRIO: &[TokenKind] = &[
    TokenKind::Plus,
    TokenKind::Minus,
    TokenKind::Pipe,
    TokenKind::PlusEqual,
    TokenKind::MinusEqual,
    TokenKind::PipeEqual,
];

const MED_PRIO: &[TokenKind] = &[
    TokenKind::Star,
    TokenKind::Slash,
    TokenKind::Percent,
    TokenKind::Amp,
    TokenKind::Caret,
    TokenKind::StarEqual,
    TokenKind::SlashEqual,
    TokenKind::PercentEqual,
    TokenKind::AmpEqual,
    TokenKind::CaretEqual,
];

fn is_compound_assign(op: TokenKind) -> bool {
    matches!(
        op,
        TokenKind::PlusEqual
            | TokenKind::MinusEqual
            | TokenKind::PipeEqual
            | TokenKind::StarEqual
            | TokenKind::SlashEqual
            | TokenKind::PercentEqual
            | TokenKind::AmpEqual
            | TokenKind::CaretEqual
    )
}

pub struct Parser<'a, 'i> {
    ast: AstContext<'a>,
    interner: &'i mut Interner,
    tokens: &'a [Token],
    current: usize,
    errors: Vec<SpannedError>,
    in_loop: bool,
    in_function: bool,
    in_procedure: bool,
    in_class: bool,
    current_class: Symbol,
}

impl<'a, 'i> Parser<'a, 'i> {
    pub fn new(ast: AstContext<'a>, interner: &'i mut Interner) -> Self {
        Parser {
            ast,
            interner,
            tokens: &[],
            current: 0,
            errors: Vec::new(),
            in_loop: false,
            in_function: false,
            in_procedure: false,
            in_class: false,
            current_class: Symbol::EMPTY,
        }
    }

    /// Parses one code unit's token stream, hoisting `class`/`func`/`proc`
    /// declarations ahead of the remaining top-level statements so forward
    /// references resolve the way the interpreter's single-pass environment
    /// expects.
    pub fn parse(
        &mut self,
        tokens: &'a [Token],
    ) -> std::result::Result<SyntaxTree<'a>, ParserErrorException> {
        self.tokens = tokens;
        self.current = if matches!(tokens.first(), Some(t) if t.kind == TokenKind::BeginFile) {
            1
        } else {
            0
        };
        self.errors.clear();
        self.in_loop = false;
        self.in_function = false;
        self.in_procedure = false;
        self.in_class = false;
        self.current_class = Symbol::EMPTY;

        let mut statements = Vec::new();
        while !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => statements.push(stmt),
                Err(e) => {
                    log::warn!("parse error, synchronizing: {}", e);
                    self.errors.push(e);
                    self.synchronize();
                }
            }
        }

        if !self.errors.is_empty() {
            log::debug!("parse failed with {} error(s)", self.errors.len());
            return Err(ParserErrorException {
                errors: std::mem::take(&mut self.errors),
            });
        }

        let (mut hoisted, mut rest) = (Vec::new(), Vec::new());
        for s in statements {
            match s {
                Statement::Class { .. } | Statement::Function { .. } | Statement::Procedure { .. } => {
                    hoisted.push(s)
                }
                _ => rest.push(s),
            }
        }
        hoisted.extend(rest);
        let statements = hoisted
            .into_iter()
            .map(|s| &*self.ast.stmts.alloc(s))
            .collect();
        Ok(SyntaxTree {
            statements,
            libraries: Vec::new(),
        })
    }

    // ---- token stream primitives ----

    fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len() || self.peek().kind == TokenKind::EndFile
    }

    fn peek(&self) -> Token {
        self.tokens[self.current]
    }

    fn previous(&self) -> Token {
        self.tokens[self.current - 1]
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn match_kind(&mut self, kinds: &[TokenKind]) -> bool {
        for &k in kinds {
            if self.check(k) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn consume(&mut self, kind: TokenKind, msg: &str) -> PResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(msg))
        }
    }

    fn error(&self, msg: impl Into<String>) -> SpannedError {
        SpannedError::new(ErrorCode::Syntax, msg, Span::at(self.peek().position as usize))
    }

    fn synchronize(&mut self) {
        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }
            match self.peek().kind {
                TokenKind::IfKeyword
                | TokenKind::WhileKeyword
                | TokenKind::ForKeyword
                | TokenKind::LoopKeyword
                | TokenKind::RepeatKeyword
                | TokenKind::UntilKeyword
                | TokenKind::DoKeyword
                | TokenKind::FuncKeyword
                | TokenKind::ProcKeyword
                | TokenKind::ClassKeyword
                | TokenKind::ReturnKeyword
                | TokenKind::BreakKeyword
                | TokenKind::ContinueKeyword
                | TokenKind::DeleteKeyword
                | TokenKind::LeftBrace
                | TokenKind::BasicType => return,
                _ => {}
            }
            self.advance();
        }
    }

    fn text(&self, tok: Token) -> &str {
        self.interner.resolve(tok.lexeme)
    }

    // ---- declarations / statements ----

    fn declaration(&mut self) -> PResult<Statement<'a>> {
        if self.check(TokenKind::ClassKeyword) {
            return self.class_decl();
        }
        if self.check(TokenKind::FuncKeyword) {
            return self.function_decl();
        }
        if self.check(TokenKind::ProcKeyword) {
            return self.procedure_decl();
        }
        self.statement()
    }

    fn statement(&mut self) -> PResult<Statement<'a>> {
        if self.check(TokenKind::ImportKeyword) {
            return Err(self.error(
                "import directives are preprocessor-only and must appear before any declaration",
            ));
        }
        if self.match_kind(&[TokenKind::IfKeyword]) {
            return self.if_stmt();
        }
        if self.match_kind(&[TokenKind::WhileKeyword]) {
            return self.while_stmt();
        }
        if self.match_kind(&[TokenKind::DoKeyword]) {
            return self.do_while_stmt();
        }
        if self.match_kind(&[TokenKind::UntilKeyword]) {
            return self.until_stmt();
        }
        if self.match_kind(&[TokenKind::RepeatKeyword]) {
            return self.repeat_until_stmt();
        }
        if self.match_kind(&[TokenKind::LoopKeyword]) {
            return self.loop_stmt();
        }
        if self.match_kind(&[TokenKind::ForKeyword]) {
            return self.for_stmt();
        }
        if self.check(TokenKind::LeftBrace) {
            return self.block();
        }
        if self.match_kind(&[TokenKind::BreakKeyword]) {
            let span = Span::at(self.previous().position as usize);
            if !self.in_loop {
                return Err(self.error("'break' used outside of a loop"));
            }
            self.consume(TokenKind::Semicolon, "expected ';' after 'break'")?;
            return Ok(Statement::Break { span });
        }
        if self.match_kind(&[TokenKind::ContinueKeyword]) {
            let span = Span::at(self.previous().position as usize);
            if !self.in_loop {
                return Err(self.error("'continue' used outside of a loop"));
            }
            self.consume(TokenKind::Semicolon, "expected ';' after 'continue'")?;
            return Ok(Statement::Continue { span });
        }
        if self.match_kind(&[TokenKind::RestKeyword]) {
            let span = Span::at(self.previous().position as usize);
            self.consume(TokenKind::Semicolon, "expected ';' after 'rest'")?;
            return Ok(Statement::Rest { span });
        }
        if self.match_kind(&[TokenKind::ReturnKeyword]) {
            return self.return_stmt();
        }
        if self.match_kind(&[TokenKind::DeleteKeyword]) {
            let start = self.previous().position as usize;
            let name_tok = self.consume(TokenKind::Identifier, "expected a name after 'delete'")?;
            let name = name_tok.lexeme;
            let end = name_tok.position as usize + self.text(name_tok).len();
            self.consume(TokenKind::Semicolon, "expected ';' after 'delete' statement")?;
            return Ok(Statement::Delete {
                name,
                span: Span::new(start, end),
            });
        }
        if self.check(TokenKind::BasicType) {
            return self.variable_or_vector_decl();
        }
        if self.check(TokenKind::CustomType) {
            return self.class_typed_decl();
        }
        self.expression_stmt()
    }

    fn block(&mut self) -> PResult<Statement<'a>> {
        self.consume(TokenKind::LeftBrace, "expected '{'")?;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            stmts.push(self.declaration()?);
        }
        self.consume(TokenKind::RightBrace, "expected '}' to close block")?;
        Ok(Statement::Block(self.ast.stmts.alloc_slice(stmts)))
    }

    fn if_stmt(&mut self) -> PResult<Statement<'a>> {
        let start = self.previous().position as usize;
        self.consume(TokenKind::LeftParen, "expected '(' after 'if'")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "expected ')' after if condition")?;
        let then_branch = self.ast.stmts.alloc(self.statement()?);
        let else_branch = if self.match_kind(&[TokenKind::ElseKeyword]) {
            let stmt = self.statement()?;
            Some(&*self.ast.stmts.alloc(stmt))
        } else {
            None
        };
        let end = else_branch
            .map(|s: &Statement<'a>| s.span().end)
            .unwrap_or(then_branch.span().end);
        Ok(Statement::If {
            condition,
            then_branch,
            else_branch,
            span: Span::new(start, end),
        })
    }

    fn while_stmt(&mut self) -> PResult<Statement<'a>> {
        let start = self.previous().position as usize;
        self.consume(TokenKind::LeftParen, "expected '(' after 'while'")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "expected ')' after while condition")?;
        let body = self.loop_body()?;
        Ok(Statement::While {
            condition,
            body,
            span: Span::new(start, body.span().end),
        })
    }

    fn do_while_stmt(&mut self) -> PResult<Statement<'a>> {
        let start = self.previous().position as usize;
        let body = self.loop_body()?;
        self.consume(TokenKind::WhileKeyword, "expected 'while' after 'do' block")?;
        self.consume(TokenKind::LeftParen, "expected '(' after 'while'")?;
        let condition = self.expression()?;
        let close = self.consume(TokenKind::RightParen, "expected ')' after while condition")?;
        let end = close.position as usize + 1;
        self.consume(TokenKind::Semicolon, "expected ';' after 'do ... while (...)'")?;
        Ok(Statement::DoWhile {
            body,
            condition,
            span: Span::new(start, end),
        })
    }

    fn until_stmt(&mut self) -> PResult<Statement<'a>> {
        let start = self.previous().position as usize;
        self.consume(TokenKind::LeftParen, "expected '(' after 'until'")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "expected ')' after until condition")?;
        let body = self.loop_body()?;
        Ok(Statement::Until {
            condition,
            body,
            span: Span::new(start, body.span().end),
        })
    }

    fn repeat_until_stmt(&mut self) -> PResult<Statement<'a>> {
        let start = self.previous().position as usize;
        let body = self.loop_body()?;
        self.consume(TokenKind::UntilKeyword, "expected 'until' after 'repeat' block")?;
        self.consume(TokenKind::LeftParen, "expected '(' after 'until'")?;
        let condition = self.expression()?;
        let close = self.consume(TokenKind::RightParen, "expected ')' after until condition")?;
        let end = close.position as usize + 1;
        self.consume(TokenKind::Semicolon, "expected ';' after 'repeat ... until (...)'")?;
        Ok(Statement::RepeatUntil {
            body,
            condition,
            span: Span::new(start, end),
        })
    }

    fn loop_stmt(&mut self) -> PResult<Statement<'a>> {
        let start = self.previous().position as usize;
        let body = self.loop_body()?;
        Ok(Statement::Loop {
            body,
            span: Span::new(start, body.span().end),
        })
    }

    fn for_stmt(&mut self) -> PResult<Statement<'a>> {
        let start = self.previous().position as usize;
        self.consume(TokenKind::LeftParen, "expected '(' after 'for'")?;
        let declaration = if self.check(TokenKind::BasicType) {
            self.ast.stmts.alloc(self.variable_or_vector_decl()?)
        } else if self.check(TokenKind::CustomType) {
            self.ast.stmts.alloc(self.class_typed_decl()?)
        } else {
            self.ast.stmts.alloc(self.expression_stmt()?)
        };
        let condition = self.expression()?;
        self.consume(TokenKind::Semicolon, "expected ';' after for-loop condition")?;
        let stepper = self.expression()?;
        self.consume(TokenKind::RightParen, "expected ')' after for-loop clauses")?;
        let body = self.loop_body()?;
        Ok(Statement::For {
            declaration,
            condition,
            stepper,
            body,
            span: Span::new(start, body.span().end),
        })
    }

    /// Parses a loop body with `in_loop` set, restoring the previous value
    /// afterwards so a non-loop construct nested in a loop body doesn't
    /// inherit loop-control validity it shouldn't have.
    fn loop_body(&mut self) -> PResult<&'a Statement<'a>> {
        let was_in_loop = self.in_loop;
        self.in_loop = true;
        let body = self.statement();
        self.in_loop = was_in_loop;
        Ok(self.ast.stmts.alloc(body?))
    }

    fn return_stmt(&mut self) -> PResult<Statement<'a>> {
        let start = self.previous().position as usize;
        if !self.in_function && !self.in_procedure {
            return Err(self.error("'return' used outside of a function or procedure"));
        }
        if self.check(TokenKind::Semicolon) {
            if self.in_function {
                return Err(self.error("function must return a value"));
            }
            let end = self.peek().position as usize + 1;
            self.advance();
            return Ok(Statement::Return {
                value: None,
                span: Span::new(start, end),
            });
        }
        if self.in_procedure && !self.in_function {
            return Err(self.error("procedure may not return a value"));
        }
        let value = self.expression()?;
        let end = value.span().end;
        self.consume(TokenKind::Semicolon, "expected ';' after return value")?;
        Ok(Statement::Return {
            value: Some(value),
            span: Span::new(start, end),
        })
    }

    fn variable_or_vector_decl(&mut self) -> PResult<Statement<'a>> {
        let type_tok = self.advance();
        let start = type_tok.position as usize;
        if self.text(type_tok) == "Vector" {
            return self.vector_decl(start);
        }
        let name_tok = self.consume(TokenKind::Identifier, "expected a variable name")?;
        let name = name_tok.lexeme;
        let initializer = if self.match_kind(&[TokenKind::Equal]) {
            Some(self.expression()?)
        } else {
            None
        };
        let end = self.previous().position as usize + 1;
        self.consume(TokenKind::Semicolon, "expected ';' after variable declaration")?;
        Ok(Statement::Variable {
            type_name: type_tok.lexeme,
            is_basic: true,
            name,
            initializer,
            span: Span::new(start, end),
        })
    }

    fn vector_decl(&mut self, start: usize) -> PResult<Statement<'a>> {
        let declarator = self.advance();
        let (name, is_ket) = match declarator.kind {
            TokenKind::KetSymbol => (self.extract_ket_name(declarator)?, true),
            TokenKind::BraSymbol => (self.extract_bra_name(declarator)?, false),
            _ => return Err(self.error("expected a bra or ket declarator after 'Vector'")),
        };
        let initializer = if self.match_kind(&[TokenKind::Equal]) {
            Some(self.expression()?)
        } else {
            None
        };
        let end = self.previous().position as usize + 1;
        self.consume(TokenKind::Semicolon, "expected ';' after vector declaration")?;
        Ok(Statement::Vector {
            name,
            is_ket,
            initializer,
            span: Span::new(start, end),
        })
    }

    fn class_typed_decl(&mut self) -> PResult<Statement<'a>> {
        let type_tok = self.advance();
        let start = type_tok.position as usize;
        let name_tok = self.consume(TokenKind::Identifier, "expected a variable name")?;
        let name = name_tok.lexeme;
        let initializer = if self.match_kind(&[TokenKind::Equal]) {
            Some(self.expression()?)
        } else {
            None
        };
        let end = self.previous().position as usize + 1;
        self.consume(TokenKind::Semicolon, "expected ';' after variable declaration")?;
        Ok(Statement::Variable {
            type_name: type_tok.lexeme,
            is_basic: false,
            name,
            initializer,
            span: Span::new(start, end),
        })
    }

    fn expression_stmt(&mut self) -> PResult<Statement<'a>> {
        let expr = self.expression()?;
        self.consume(TokenKind::Semicolon, "expected ';' after expression")?;
        Ok(Statement::Expr(expr))
    }

    fn params(&mut self) -> PResult<&'a [Param]> {
        self.consume(TokenKind::LeftParen, "expected '(' to start parameter list")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                let name_tok = self.consume(TokenKind::Identifier, "expected a parameter name")?;
                let name = name_tok.lexeme;
                self.consume(TokenKind::Colon, "expected ':' before a parameter's type")
                    .map_err(|_| self.error("expected ':' before a parameter's type"))?;
                let (is_basic, type_name) = if self.check(TokenKind::BasicType) {
                    (true, self.advance().lexeme)
                } else if self.check(TokenKind::CustomType) {
                    (false, self.advance().lexeme)
                } else {
                    return Err(self.error("expected a parameter type"));
                };
                params.push(Param {
                    name,
                    type_name,
                    is_basic,
                });
                if !self.match_kind(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "expected ')' to close parameter list")?;
        Ok(self.ast.params.alloc_slice(params))
    }

    fn function_decl(&mut self) -> PResult<Statement<'a>> {
        self.advance();
        let start = self.previous().position as usize;
        let name_tok = self.consume(TokenKind::Identifier, "expected a function name")?;
        let name = name_tok.lexeme;
        let params = self.params()?;
        self.consume(TokenKind::Arrow, "expected '->' before a function's return type")?;
        let return_type = if self.check(TokenKind::BasicType) || self.check(TokenKind::CustomType) {
            self.advance().lexeme
        } else {
            return Err(self.error("expected a return type after '->'"));
        };
        let was_fn = self.in_function;
        self.in_function = true;
        let body_stmt = self.block();
        self.in_function = was_fn;
        let body = match body_stmt? {
            Statement::Block(stmts) => stmts,
            _ => unreachable!("block() always returns Statement::Block"),
        };
        let end = self.previous().position as usize + 1;
        Ok(Statement::Function {
            name,
            params,
            return_type,
            body,
            span: Span::new(start, end),
        })
    }

    fn procedure_decl(&mut self) -> PResult<Statement<'a>> {
        self.advance();
        let start = self.previous().position as usize;
        let name_tok = self.consume(TokenKind::Identifier, "expected a procedure name")?;
        let name = name_tok.lexeme;
        let params = self.params()?;
        let was_proc = self.in_procedure;
        self.in_procedure = true;
        let body_stmt = self.block();
        self.in_procedure = was_proc;
        let body = match body_stmt? {
            Statement::Block(stmts) => stmts,
            _ => unreachable!("block() always returns Statement::Block"),
        };
        let end = self.previous().position as usize + 1;
        Ok(Statement::Procedure {
            name,
            params,
            body,
            span: Span::new(start, end),
        })
    }

    fn class_decl(&mut self) -> PResult<Statement<'a>> {
        self.advance();
        let start = self.previous().position as usize;
        let name_tok = self.consume(TokenKind::Identifier, "expected a class name")?;
        let class_name = name_tok.lexeme;
        self.consume(TokenKind::LeftBrace, "expected '{' to start class body")?;

        let was_in_class = self.in_class;
        let outer_class = self.current_class;
        self.in_class = true;
        self.current_class = class_name;

        let mut members = Vec::new();
        let mut has_create = false;
        let mut has_delete = false;
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            match self.class_member(class_name, &mut has_create, &mut has_delete) {
                Ok(member) => members.push(member),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize();
                }
            }
        }
        let close = self.consume(TokenKind::RightBrace, "expected '}' to close class body");

        self.in_class = was_in_class;
        self.current_class = outer_class;

        close?;
        let end = self.previous().position as usize + 1;
        Ok(Statement::Class {
            name: class_name,
            members: self.ast.members.alloc_slice(members),
            span: Span::new(start, end),
        })
    }

    fn class_member(
        &mut self,
        class_name: Symbol,
        has_create: &mut bool,
        has_delete: &mut bool,
    ) -> PResult<ClassMember<'a>> {
        let mut modifier = AccessModifier::Public;
        let mut class_scoped = false;
        let mut is_create = false;
        let mut is_delete = false;

        loop {
            match self.peek().kind {
                TokenKind::PublicModifier => {
                    self.advance();
                    modifier = AccessModifier::Public;
                }
                TokenKind::HiddenModifier => {
                    self.advance();
                    modifier = AccessModifier::Hidden;
                }
                TokenKind::SecureModifier => {
                    self.advance();
                    modifier = AccessModifier::Secure;
                }
                TokenKind::ImmuneModifier => {
                    self.advance();
                    modifier = AccessModifier::Immune;
                }
                TokenKind::StaticModifier => {
                    self.advance();
                    modifier = AccessModifier::Hidden;
                    class_scoped = true;
                }
                TokenKind::SharedModifier => {
                    self.advance();
                    modifier = AccessModifier::Public;
                    class_scoped = true;
                }
                TokenKind::CreateSpecifier => {
                    self.advance();
                    is_create = true;
                }
                TokenKind::DeleteSpecifier => {
                    self.advance();
                    is_delete = true;
                }
                _ => break,
            }
        }

        if (is_create || is_delete)
            && matches!(modifier, AccessModifier::Secure | AccessModifier::Immune)
        {
            return Err(self.error("'@secure'/'@immune' may not modify a constructor or destructor"));
        }

        let declaration = if is_create || is_delete {
            if !self.check(TokenKind::ProcKeyword) {
                return Err(self.error("'@create'/'@delete' must introduce a procedure"));
            }
            let proc = self.procedure_decl()?;
            let (proc_name, param_count) = match proc {
                Statement::Procedure { name, params, .. } => (name, params.len()),
                _ => unreachable!(),
            };
            if proc_name != class_name {
                return Err(self.error("constructor/destructor name must match its class"));
            }
            if is_create {
                if *has_create {
                    return Err(self.error("duplicate constructor declaration"));
                }
                *has_create = true;
            }
            if is_delete {
                if *has_delete {
                    return Err(self.error("duplicate destructor declaration"));
                }
                if param_count != 0 {
                    return Err(self.error("destructor has no parameters"));
                }
                *has_delete = true;
            }
            proc
        } else if self.check(TokenKind::FuncKeyword) {
            self.function_decl()?
        } else if self.check(TokenKind::ProcKeyword) {
            self.procedure_decl()?
        } else if self.check(TokenKind::BasicType) {
            self.variable_or_vector_decl()?
        } else if self.check(TokenKind::CustomType) {
            self.class_typed_decl()?
        } else {
            return Err(self.error("expected a field or method declaration inside a class body"));
        };

        if matches!(modifier, AccessModifier::Secure | AccessModifier::Immune)
            && matches!(declaration, Statement::Function { .. } | Statement::Procedure { .. })
        {
            return Err(self.error("'@secure'/'@immune' may not modify a method"));
        }

        Ok(ClassMember {
            modifier,
            class_scoped,
            is_create,
            is_delete,
            declaration: self.ast.stmts.alloc(declaration),
        })
    }

    // ---- expressions, precedence climbing ----

    fn expression(&mut self) -> PResult<&'a Expression<'a>> {
        self.assignment()
    }

    fn assignment(&mut self) -> PResult<&'a Expression<'a>> {
        let expr = self.short_or()?;
        if self.match_kind(&[TokenKind::Equal]) {
            let value = self.assignment()?;
            let span = expr.span().merge(value.span());
            return match *expr {
                Expression::Identifier { .. } => Ok(self
                    .ast
                    .exprs
                    .alloc(Expression::Assignment { target: expr, value, span })),
                Expression::DynamicGet { object, name, self_reference, .. } => {
                    Ok(self.ast.exprs.alloc(Expression::DynamicSet {
                        object,
                        name,
                        value,
                        self_reference,
                        span,
                    }))
                }
                Expression::StaticGet { object, name, self_reference, .. } => {
                    Ok(self.ast.exprs.alloc(Expression::StaticSet {
                        object,
                        name,
                        value,
                        self_reference,
                        span,
                    }))
                }
                _ => Err(self.error("invalid assignment target")),
            };
        }
        Ok(expr)
    }

    fn short_or(&mut self) -> PResult<&'a Expression<'a>> {
        let mut expr = self.short_and()?;
        while self.check(TokenKind::PipePipe) {
            let op = self.advance().kind;
            let right = self.short_and()?;
            let span = expr.span().merge(right.span());
            expr = self.ast.exprs.alloc(Expression::Logical { left: expr, op, right, span });
        }
        Ok(expr)
    }

    fn short_and(&mut self) -> PResult<&'a Expression<'a>> {
        let mut expr = self.equality()?;
        while self.check(TokenKind::AmpAmp) {
            let op = self.advance().kind;
            let right = self.equality()?;
            let span = expr.span().merge(right.span());
            expr = self.ast.exprs.alloc(Expression::Logical { left: expr, op, right, span });
        }
        Ok(expr)
    }

    fn equality(&mut self) -> PResult<&'a Expression<'a>> {
        let mut expr = self.comparison()?;
        while self.check(TokenKind::EqualEqual) || self.check(TokenKind::BangEqual) {
            let op = self.advance().kind;
            let right = self.comparison()?;
            let span = expr.span().merge(right.span());
            expr = self.ast.exprs.alloc(Expression::Comparison { left: expr, op, right, span });
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> PResult<&'a Expression<'a>> {
        let mut expr = self.low_priority()?;
        while matches!(
            self.peek().kind,
            TokenKind::Less | TokenKind::LessEqual | TokenKind::Greater | TokenKind::GreaterEqual
        ) {
            let op = self.advance().kind;
            let right = self.low_priority()?;
            let span = expr.span().merge(right.span());
            expr = self.ast.exprs.alloc(Expression::Comparison { left: expr, op, right, span });
        }
        Ok(expr)
    }

    fn low_priority(&mut self) -> PResult<&'a Expression<'a>> {
        let mut expr = self.medium_priority()?;
        while self.match_kind(LOW_PRIO) {
            let op = self.previous().kind;
            let rhs = self.medium_priority()?;
            expr = self.reduce_binary(expr, op, rhs)?;
        }
        Ok(expr)
    }

    fn medium_priority(&mut self) -> PResult<&'a Expression<'a>> {
        let mut expr = self.postfix()?;
        while self.match_kind(MED_PRIO) {
            let op = self.previous().kind;
            let rhs = self.postfix()?;
            expr = self.reduce_binary(expr, op, rhs)?;
        }
        Ok(expr)
    }

    fn reduce_binary(
        &mut self,
        left: &'a Expression<'a>,
        op: TokenKind,
        right: &'a Expression<'a>,
    ) -> PResult<&'a Expression<'a>> {
        let span = left.span().merge(right.span());
        if is_compound_assign(op) {
            return match *left {
                Expression::Identifier { name, .. } => {
                    Ok(self.ast.exprs.alloc(Expression::Mutable { name, op, value: right, span }))
                }
                _ => Err(self.error("compound-assignment target must be an identifier")),
            };
        }
        Ok(self.ast.exprs.alloc(Expression::Binary { left, op, right, span }))
    }

    /// `prefix ( "°" | "'" )*`. `^` is never consumed here: in the original
    /// lexer `^` always becomes the binary XOR token, never a postfix one
    /// (only a bare `'` that fails to form a character literal, or the `†`
    /// glyph, produce the postfix/dagger token) — so despite the grammar
    /// comment's wording there's no real ambiguity left to resolve against
    /// `medium_priority`'s `^`.
    fn postfix(&mut self) -> PResult<&'a Expression<'a>> {
        let mut expr = self.prefix()?;
        while self.check(TokenKind::Degree) || self.check(TokenKind::Apostrophe) {
            let op = self.advance().kind;
            let span = expr.span();
            expr = self.ast.exprs.alloc(Expression::Unary { op, operand: expr, postfix: true, span });
        }
        Ok(expr)
    }

    fn prefix(&mut self) -> PResult<&'a Expression<'a>> {
        if self.match_kind(&[TokenKind::Minus, TokenKind::Plus, TokenKind::Tilde, TokenKind::Bang]) {
            let op_tok = self.previous();
            let op = op_tok.kind;
            let pos = op_tok.position as usize;
            let operand = self.prefix()?;
            let span = Span::new(pos, operand.span().end);
            return Ok(self.ast.exprs.alloc(Expression::Unary { op, operand, postfix: false, span }));
        }
        self.subscription()
    }

    fn subscription(&mut self) -> PResult<&'a Expression<'a>> {
        let mut expr = self.call_expr()?;
        while self.check(TokenKind::LeftBracket) {
            self.advance();
            let index = if self.check(TokenKind::RightBracket) {
                None
            } else {
                Some(self.expression()?)
            };
            let close = self.consume(TokenKind::RightBracket, "expected ']' to close a subscript")?;
            let span = Span::new(expr.span().start, close.position as usize + 1);
            expr = self.ast.exprs.alloc(Expression::Subscript { target: expr, index, span });
        }
        Ok(expr)
    }

    fn call_expr(&mut self) -> PResult<&'a Expression<'a>> {
        let is_new = self.match_kind(&[TokenKind::NewKeyword]);
        let mut expr = self.primary()?;
        loop {
            if self.check(TokenKind::LeftParen) {
                self.advance();
                let mut args = Vec::new();
                if !self.check(TokenKind::RightParen) {
                    loop {
                        args.push(*self.expression()?);
                        if !self.match_kind(&[TokenKind::Comma]) {
                            break;
                        }
                    }
                }
                let close =
                    self.consume(TokenKind::RightParen, "expected ')' to close a call's arguments")?;
                let span = Span::new(expr.span().start, close.position as usize + 1);
                expr = self.ast.exprs.alloc(Expression::Call {
                    callee: expr,
                    args: self.ast.exprs.alloc_slice(args),
                    is_new,
                    span,
                });
            } else if self.match_kind(&[TokenKind::Dot]) {
                let self_reference = matches!(*expr, Expression::SelfExpr { .. });
                let name_tok = self.consume(TokenKind::Identifier, "expected a member name after '.'")?;
                let span = Span::new(expr.span().start, name_tok.position as usize + 1);
                expr = self.ast.exprs.alloc(Expression::DynamicGet {
                    object: expr,
                    name: name_tok.lexeme,
                    self_reference,
                    span,
                });
            } else if self.match_kind(&[TokenKind::ColonColon]) {
                let self_reference = matches!(*expr, Expression::SelfExpr { .. });
                let name_tok = self.consume(TokenKind::Identifier, "expected a member name after '::'")?;
                let span = Span::new(expr.span().start, name_tok.position as usize + 1);
                expr = self.ast.exprs.alloc(Expression::StaticGet {
                    object: expr,
                    name: name_tok.lexeme,
                    self_reference,
                    span,
                });
            } else {
                break;
            }
        }
        if is_new && !matches!(*expr, Expression::Call { .. }) {
            return Err(self.error("'new' must be followed by a constructor call"));
        }
        Ok(expr)
    }

    fn primary(&mut self) -> PResult<&'a Expression<'a>> {
        let tok = self.peek();
        let pos = tok.position as usize;
        match tok.kind {
            TokenKind::IntegerLiteral => {
                self.advance();
                let text = self.text(tok).to_string();
                let value = parse_integer_literal(&text);
                Ok(self.literal(LiteralValue::Integer(value), pos, text.len()))
            }
            TokenKind::RealLiteral => {
                self.advance();
                let text = self.text(tok).to_string();
                let value: f64 = text.parse().unwrap_or(0.0);
                Ok(self.literal(LiteralValue::Real(value), pos, text.len()))
            }
            TokenKind::ImaginaryLiteral => {
                self.advance();
                let text = self.text(tok).to_string();
                let value: f64 = text.trim_end_matches('i').parse().unwrap_or(0.0);
                Ok(self.literal(LiteralValue::Imaginary(value), pos, text.len()))
            }
            TokenKind::RealIdiom => {
                self.advance();
                let text = self.text(tok).to_string();
                let value = if text == "infinity" { f64::INFINITY } else { f64::NAN };
                Ok(self.literal(LiteralValue::Real(value), pos, text.len()))
            }
            TokenKind::BooleanLiteral => {
                self.advance();
                let text = self.text(tok).to_string();
                let is_true = text == "true";
                Ok(self.literal(LiteralValue::Boolean(is_true), pos, text.len()))
            }
            TokenKind::CharacterLiteral => {
                self.advance();
                let text = self.text(tok).to_string();
                let byte = decode_character_literal(&text);
                Ok(self.literal(LiteralValue::Character(byte), pos, text.len()))
            }
            TokenKind::StringLiteral => {
                self.advance();
                let len = self.text(tok).len();
                Ok(self.literal(LiteralValue::String(tok.lexeme), pos, len))
            }
            TokenKind::Identifier
            | TokenKind::CustomType
            | TokenKind::SleepKeyword
            | TokenKind::ClockKeyword
            | TokenKind::RandomKeyword
            | TokenKind::WriteKeyword
            | TokenKind::ReadKeyword => {
                // The always-available globals and the Console shorthand
                // keywords lex distinctly (so they can never be shadowed as
                // ordinary identifiers) but otherwise behave like a plain
                // name in expression position: `sleep(500)`, `write("hi")`.
                self.advance();
                let len = self.text(tok).len();
                Ok(self.ast.exprs.alloc(Expression::Identifier {
                    name: tok.lexeme,
                    span: Span::new(pos, pos + len),
                }))
            }
            TokenKind::SelfKeyword => {
                self.advance();
                if !self.in_class {
                    return Err(self.error("'self' used outside of a class body"));
                }
                Ok(self.ast.exprs.alloc(Expression::SelfExpr { span: Span::at(pos) }))
            }
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.expression()?;
                self.consume(TokenKind::RightParen, "expected ')' to close a grouped expression")?;
                Ok(self.ast.exprs.alloc(Expression::Grouping(inner)))
            }
            TokenKind::LeftBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(TokenKind::RightBracket) {
                    loop {
                        elements.push(*self.expression()?);
                        if !self.match_kind(&[TokenKind::Comma]) {
                            break;
                        }
                    }
                }
                let close = self.consume(TokenKind::RightBracket, "expected ']' to close a list literal")?;
                let span = Span::new(pos, close.position as usize + 1);
                Ok(self.ast.exprs.alloc(Expression::List {
                    elements: self.ast.exprs.alloc_slice(elements),
                    span,
                }))
            }
            TokenKind::BasisBraKet => {
                self.advance();
                let text = self.text(tok).to_string();
                let span = Span::new(pos, pos + text.len());
                let which = BraKetRef::Basis(if text.contains('1') { 1 } else { 0 });
                if text.starts_with('<') {
                    Ok(self.ast.exprs.alloc(Expression::Bra { which, span }))
                } else {
                    Ok(self.ast.exprs.alloc(Expression::Ket { which, span }))
                }
            }
            TokenKind::BraSymbol => {
                self.advance();
                let name = self.extract_bra_name(tok)?;
                let len = self.text(tok).len();
                Ok(self.ast.exprs.alloc(Expression::Bra {
                    which: BraKetRef::Named(name),
                    span: Span::new(pos, pos + len),
                }))
            }
            TokenKind::KetSymbol => {
                self.advance();
                let name = self.extract_ket_name(tok)?;
                let len = self.text(tok).len();
                Ok(self.ast.exprs.alloc(Expression::Ket {
                    which: BraKetRef::Named(name),
                    span: Span::new(pos, pos + len),
                }))
            }
            TokenKind::BraKetSymbol => {
                self.advance();
                let text = self.text(tok).to_string();
                let span = Span::new(pos, pos + text.len());
                let (bra_text, ket_text) = text
                    .trim_start_matches('<')
                    .trim_end_matches('>')
                    .split_once('|')
                    .ok_or_else(|| SpannedError::new(ErrorCode::Syntax, "malformed braket literal", span))?;
                let (bra_text, ket_text) = (bra_text.to_string(), ket_text.to_string());
                let bra = self.interner.intern(&bra_text);
                let ket = self.interner.intern(&ket_text);
                Ok(self.ast.exprs.alloc(Expression::Inner { bra, ket, span }))
            }
            TokenKind::KetBraSymbol => {
                self.advance();
                let text = self.text(tok).to_string();
                let span = Span::new(pos, pos + text.len());
                let (ket_text, bra_text) = text
                    .trim_start_matches('|')
                    .trim_end_matches('|')
                    .split_once('>')
                    .ok_or_else(|| SpannedError::new(ErrorCode::Syntax, "malformed ketbra literal", span))?;
                let ket_text = ket_text.to_string();
                let bra_text = bra_text.trim_start_matches('<').to_string();
                let ket = self.interner.intern(&ket_text);
                let bra = self.interner.intern(&bra_text);
                Ok(self.ast.exprs.alloc(Expression::Outer { ket, bra, span }))
            }
            _ => Err(self.error("expected an expression")),
        }
    }

    fn literal(&mut self, value: LiteralValue, pos: usize, len: usize) -> &'a Expression<'a> {
        self.ast.exprs.alloc(Expression::Literal {
            value,
            span: Span::new(pos, pos + len),
        })
    }

    /// `<ident|` — the name is everything between the delimiters.
    fn extract_bra_name(&mut self, tok: Token) -> PResult<Symbol> {
        let text = self.text(tok).to_string();
        let name = text
            .strip_prefix('<')
            .and_then(|s| s.strip_suffix('|'))
            .ok_or_else(|| self.error("malformed bra literal"))?
            .to_string();
        Ok(self.interner.intern(&name))
    }

    /// `|ident>` — the name is everything between the delimiters.
    fn extract_ket_name(&mut self, tok: Token) -> PResult<Symbol> {
        let text = self.text(tok).to_string();
        let name = text
            .strip_prefix('|')
            .and_then(|s| s.strip_suffix('>'))
            .ok_or_else(|| self.error("malformed ket literal"))?
            .to_string();
        Ok(self.interner.intern(&name))
    }
}

/// Parses a lexed integer literal, honouring the `0x`/`0b`/`0o`/`0d` prefixes.
fn parse_integer_literal(text: &str) -> i64 {
    if let Some(rest) = text.strip_prefix("0x") {
        return i64::from_str_radix(rest, 16).unwrap_or(0);
    }
    if let Some(rest) = text.strip_prefix("0b") {
        return i64::from_str_radix(rest, 2).unwrap_or(0);
    }
    if let Some(rest) = text.strip_prefix("0o") {
        return i64::from_str_radix(rest, 8).unwrap_or(0);
    }
    if let Some(rest) = text.strip_prefix("0d") {
        return rest.parse().unwrap_or(0);
    }
    text.parse().unwrap_or(0)
}

/// Decodes a `'x'` or `'\ESC'`/`'\0xNN'` character literal's payload byte.
fn decode_character_literal(text: &str) -> u8 {
    let inner = text.trim_start_matches('\'').trim_end_matches('\'');
    if let Some(escape) = inner.strip_prefix('\\') {
        if let Some(hex) = escape.strip_prefix("0x") {
            return u8::from_str_radix(hex, 16).unwrap_or(0);
        }
        return match escape {
            "n" => b'\n',
            "t" => b'\t',
            "r" => b'\r',
            "0" => 0,
            "\\" => b'\\',
            "'" => b'\'',
            other => other.as_bytes().first().copied().unwrap_or(0),
        };
    }
    inner.as_bytes().first().copied().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AstContext;
    use crate::lexer::Lexer;
    use spin_base::Arena;

    fn parse_ok<'a>(
        source: &str,
        exprs: &'a Arena<Expression<'a>>,
        stmts: &'a Arena<Statement<'a>>,
        params: &'a Arena<Param>,
        members: &'a Arena<ClassMember<'a>>,
        interner: &mut Interner,
    ) -> SyntaxTree<'a> {
        let tokens = Lexer::new(source, interner).tokenize();
        let tokens = Box::leak(tokens.into_boxed_slice());
        let ast = AstContext::new(exprs, stmts, params, members);
        let mut parser = Parser::new(ast, interner);
        parser.parse(tokens).expect("expected a successful parse")
    }

    #[test]
    fn parses_arithmetic_precedence() {
        let mut interner = Interner::new();
        let exprs = Arena::new();
        let stmts = Arena::new();
        let params = Arena::new();
        let members = Arena::new();
        let tree = parse_ok(
            "Integer x = 1 + 2 * 3;",
            &exprs,
            &stmts,
            &params,
            &members,
            &mut interner,
        );
        assert_eq!(tree.statements.len(), 1);
        match tree.statements[0] {
            Statement::Variable { initializer: Some(init), .. } => {
                assert!(matches!(**init, Expression::Binary { op: TokenKind::Plus, .. }));
            }
            other => panic!("expected a variable declaration, got {:?}", other),
        }
    }

    #[test]
    fn function_and_recursive_call_parse() {
        let mut interner = Interner::new();
        let exprs = Arena::new();
        let stmts = Arena::new();
        let params = Arena::new();
        let members = Arena::new();
        let tree = parse_ok(
            "func f(n: Integer) -> Integer { if (n < 2) return n; return f(n-1) + f(n-2); }",
            &exprs,
            &stmts,
            &params,
            &members,
            &mut interner,
        );
        assert_eq!(tree.statements.len(), 1);
        assert!(matches!(tree.statements[0], Statement::Function { .. }));
    }

    #[test]
    fn break_outside_loop_is_syntax_error() {
        let mut interner = Interner::new();
        let exprs = Arena::new();
        let stmts = Arena::new();
        let params = Arena::new();
        let members = Arena::new();
        let tokens = Lexer::new("break;", &mut interner).tokenize();
        let tokens = Box::leak(tokens.into_boxed_slice());
        let ast = AstContext::new(&exprs, &stmts, &params, &members);
        let mut parser = Parser::new(ast, &mut interner);
        let err = parser.parse(tokens).unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].code, ErrorCode::Syntax);
    }

    #[test]
    fn class_with_constructor_parses() {
        let mut interner = Interner::new();
        let exprs = Arena::new();
        let stmts = Arena::new();
        let params = Arena::new();
        let members = Arena::new();
        let tree = parse_ok(
            "class C { @public Integer k; @create proc C(v: Integer) { self.k = v; } }",
            &exprs,
            &stmts,
            &params,
            &members,
            &mut interner,
        );
        match tree.statements[0] {
            Statement::Class { members, .. } => {
                assert_eq!(members.len(), 2);
                assert!(members[1].is_create);
            }
            other => panic!("expected a class declaration, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_destructor_is_rejected() {
        let mut interner = Interner::new();
        let exprs = Arena::new();
        let stmts = Arena::new();
        let params = Arena::new();
        let members = Arena::new();
        let tokens = Lexer::new(
            "class C { @delete proc C() { } @delete proc C() { } }",
            &mut interner,
        )
        .tokenize();
        let tokens = Box::leak(tokens.into_boxed_slice());
        let ast = AstContext::new(&exprs, &stmts, &params, &members);
        let mut parser = Parser::new(ast, &mut interner);
        let err = parser.parse(tokens).unwrap_err();
        assert!(err
            .errors
            .iter()
            .any(|e| e.message.contains("duplicate destructor")));
    }

    #[test]
    fn destructor_with_parameters_is_rejected() {
        let mut interner = Interner::new();
        let exprs = Arena::new();
        let stmts = Arena::new();
        let params = Arena::new();
        let members = Arena::new();
        let tokens = Lexer::new("class C { @delete proc C(v: Integer) { } }", &mut interner).tokenize();
        let tokens = Box::leak(tokens.into_boxed_slice());
        let ast = AstContext::new(&exprs, &stmts, &params, &members);
        let mut parser = Parser::new(ast, &mut interner);
        let err = parser.parse(tokens).unwrap_err();
        assert!(err
            .errors
            .iter()
            .any(|e| e.message.contains("destructor has no parameters")));
    }

    #[test]
    fn named_bra_ket_and_inner_product_parse() {
        let mut interner = Interner::new();
        let exprs = Arena::new();
        let stmts = Arena::new();
        let params = Arena::new();
        let members = Arena::new();
        let tree = parse_ok(
            "Vector |psi> = |0>; Vector <phi| = <1|; Complex c = <phi|psi>;",
            &exprs,
            &stmts,
            &params,
            &members,
            &mut interner,
        );
        assert_eq!(tree.statements.len(), 3);
        assert!(matches!(tree.statements[0], Statement::Vector { is_ket: true, .. }));
        assert!(matches!(tree.statements[1], Statement::Vector { is_ket: false, .. }));
    }
}
