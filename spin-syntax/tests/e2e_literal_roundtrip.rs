//! End-to-end tests: re-lexing a literal's own canonical text produces a
//! single token of the same kind (spec §8 property 2).

mod common;

use common::lex;
use spin_syntax::TokenKind;

fn single_literal_kind(source: &str) -> TokenKind {
    let (tokens, _interner) = lex(source);
    let literals: Vec<_> = tokens
        .iter()
        .filter(|t| !matches!(t.kind, TokenKind::BeginFile | TokenKind::EndFile))
        .collect();
    assert_eq!(literals.len(), 1, "expected exactly one literal token from {:?}, got {:?}", source, tokens);
    literals[0].kind
}

#[test]
fn an_integer_literal_round_trips_to_a_single_integer_token() {
    assert_eq!(single_literal_kind("42"), TokenKind::IntegerLiteral);
}

#[test]
fn a_real_literal_round_trips_to_a_single_real_token() {
    assert_eq!(single_literal_kind("3.5"), TokenKind::RealLiteral);
}

#[test]
fn an_imaginary_literal_round_trips_to_a_single_imaginary_token() {
    assert_eq!(single_literal_kind("2i"), TokenKind::ImaginaryLiteral);
}

#[test]
fn a_string_literal_round_trips_to_a_single_string_token() {
    assert_eq!(single_literal_kind("\"hello\""), TokenKind::StringLiteral);
}

#[test]
fn a_character_literal_round_trips_to_a_single_character_token() {
    assert_eq!(single_literal_kind("'a'"), TokenKind::CharacterLiteral);
}

#[test]
fn a_boolean_literal_round_trips_to_a_single_boolean_token() {
    assert_eq!(single_literal_kind("true"), TokenKind::BooleanLiteral);
}
