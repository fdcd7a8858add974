//! Shared lexer test harness.

use spin_base::Interner;
use spin_syntax::{Lexer, Token};

pub fn lex(source: &str) -> (Vec<Token>, Interner) {
    let mut interner = Interner::new();
    let tokens = Lexer::new(source, &mut interner).tokenize();
    (tokens, interner)
}
