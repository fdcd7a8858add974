//! End-to-end tests: the lexer never aborts and always brackets its output
//! with the file sentinels (spec §8 property 1).

mod common;

use common::lex;
use spin_syntax::TokenKind;

#[test]
fn every_token_stream_starts_and_ends_with_the_file_sentinels() {
    let (tokens, _interner) = lex("Integer x = 1 + 2;");
    assert_eq!(tokens.first().map(|t| t.kind), Some(TokenKind::BeginFile));
    assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::EndFile));
}

#[test]
fn an_empty_source_buffer_still_produces_the_two_sentinels() {
    let (tokens, _interner) = lex("");
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].kind, TokenKind::BeginFile);
    assert_eq!(tokens[1].kind, TokenKind::EndFile);
}

#[test]
fn unrecognised_byte_runs_become_invalid_tokens_instead_of_aborting() {
    let (tokens, _interner) = lex("Integer x = 1; # $ %");
    assert_eq!(tokens.first().map(|t| t.kind), Some(TokenKind::BeginFile));
    assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::EndFile));
    assert!(
        tokens.iter().any(|t| t.kind == TokenKind::Invalid),
        "stray punctuation should surface as Invalid tokens, not stop tokenisation"
    );
}

#[test]
fn every_tokens_position_is_a_valid_offset_into_the_source() {
    let source = "Integer x = 1 + 2; String s = \"hi\";";
    let (tokens, _interner) = lex(source);
    for token in &tokens {
        assert!(
            (token.position as usize) <= source.len(),
            "token {:?} has an out-of-range position {}",
            token.kind,
            token.position
        );
    }
}
