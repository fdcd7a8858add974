//! Shared end-to-end test harness: lex, parse, and run one source string
//! against a fresh interpreter. Mirrors `interpreter.rs`'s own `run_source`
//! unit-test helper, leaking the arenas and token buffer so the returned
//! `Interpreter<'static>` can outlive this function — acceptable for a
//! process that exits at the end of the test binary.

use spin_base::{Arena, Interner};
use spin_runtime::Interpreter;
use spin_syntax::ast::{AstContext, ClassMember, Expression, Param, Statement};
use spin_syntax::{Lexer, Parser};

pub fn run_source(source: &str) -> (Interpreter<'static>, spin_base::Result<()>) {
    let exprs: &'static Arena<Expression<'static>> = Box::leak(Box::new(Arena::new()));
    let stmts: &'static Arena<Statement<'static>> = Box::leak(Box::new(Arena::new()));
    let params: &'static Arena<Param> = Box::leak(Box::new(Arena::new()));
    let members: &'static Arena<ClassMember<'static>> = Box::leak(Box::new(Arena::new()));
    let mut interner = Interner::new();
    let tokens = Lexer::new(source, &mut interner).tokenize();
    let tokens: &'static [spin_syntax::Token] = Box::leak(tokens.into_boxed_slice());
    let ast = AstContext::new(exprs, stmts, params, members);
    let mut parser = Parser::new(ast, &mut interner);
    let tree = parser.parse(tokens).expect("expected a successful parse");
    let mut interpreter = Interpreter::new(interner);
    let result = interpreter.run(std::slice::from_ref(&tree));
    std::mem::forget(tree);
    (interpreter, result)
}

/// Like [`run_source`], but returns the parse error instead of panicking —
/// for tests asserting on malformed programs.
pub fn try_parse(source: &str) -> Result<(), spin_syntax::parser::ParserErrorException> {
    let exprs: &'static Arena<Expression<'static>> = Box::leak(Box::new(Arena::new()));
    let stmts: &'static Arena<Statement<'static>> = Box::leak(Box::new(Arena::new()));
    let params: &'static Arena<Param> = Box::leak(Box::new(Arena::new()));
    let members: &'static Arena<ClassMember<'static>> = Box::leak(Box::new(Arena::new()));
    let mut interner = Interner::new();
    let tokens = Lexer::new(source, &mut interner).tokenize();
    let ast = AstContext::new(exprs, stmts, params, members);
    let mut parser = Parser::new(ast, &mut interner);
    parser.parse(&tokens).map(|_| ())
}
