//! Single-pass, longest-match tokeniser.
//!
//! One [`Lexer`] per source buffer. It walks the byte array with two
//! cursors (`start` of the token being built, `current` scan position),
//! never backtracks except for the bounded bra/ket lookahead described
//! below, and never aborts: anything it cannot classify becomes a single
//! `invalid` token so later stages can report it with a location instead
//! of the whole pipeline dying mid-file.

use spin_base::{Interner, Symbol};

use crate::token::{Token, TokenKind};

const KEYWORDS: &[(&str, TokenKind)] = &[
    ("var", TokenKind::VarKeyword),
    ("con", TokenKind::ConKeyword),
    ("vec", TokenKind::VecKeyword),
    ("mat", TokenKind::MatKeyword),
    ("if", TokenKind::IfKeyword),
    ("else", TokenKind::ElseKeyword),
    ("swap", TokenKind::SwapKeyword),
    ("while", TokenKind::WhileKeyword),
    ("do", TokenKind::DoKeyword),
    ("loop", TokenKind::LoopKeyword),
    ("for", TokenKind::ForKeyword),
    ("repeat", TokenKind::RepeatKeyword),
    ("until", TokenKind::UntilKeyword),
    ("break", TokenKind::BreakKeyword),
    ("continue", TokenKind::ContinueKeyword),
    ("self", TokenKind::SelfKeyword),
    ("sleep", TokenKind::SleepKeyword),
    ("clock", TokenKind::ClockKeyword),
    ("random", TokenKind::RandomKeyword),
    ("import", TokenKind::ImportKeyword),
    ("func", TokenKind::FuncKeyword),
    ("proc", TokenKind::ProcKeyword),
    ("rest", TokenKind::RestKeyword),
    ("return", TokenKind::ReturnKeyword),
    ("write", TokenKind::WriteKeyword),
    ("read", TokenKind::ReadKeyword),
    ("new", TokenKind::NewKeyword),
    ("delete", TokenKind::DeleteKeyword),
    ("class", TokenKind::ClassKeyword),
    ("true", TokenKind::BooleanLiteral),
    ("false", TokenKind::BooleanLiteral),
    ("infinity", TokenKind::RealIdiom),
    ("undefined", TokenKind::RealIdiom),
    ("Boolean", TokenKind::BasicType),
    ("Byte", TokenKind::BasicType),
    ("Character", TokenKind::BasicType),
    ("Complex", TokenKind::BasicType),
    ("Imaginary", TokenKind::BasicType),
    ("Integer", TokenKind::BasicType),
    ("Real", TokenKind::BasicType),
    ("String", TokenKind::BasicType),
    ("Array", TokenKind::BasicType),
    ("Vector", TokenKind::BasicType),
];

const MODIFIERS: &[(&str, TokenKind)] = &[
    ("@public", TokenKind::PublicModifier),
    ("@hidden", TokenKind::HiddenModifier),
    ("@secure", TokenKind::SecureModifier),
    ("@immune", TokenKind::ImmuneModifier),
    ("@static", TokenKind::StaticModifier),
    ("@shared", TokenKind::SharedModifier),
    ("@create", TokenKind::CreateSpecifier),
    ("@delete", TokenKind::DeleteSpecifier),
];

pub struct Lexer<'i> {
    source: &'i str,
    bytes: &'i [u8],
    start: usize,
    current: usize,
    interner: &'i mut Interner,
}

impl<'i> Lexer<'i> {
    pub fn new(source: &'i str, interner: &'i mut Interner) -> Self {
        Lexer {
            source,
            bytes: source.as_bytes(),
            start: 0,
            current: 0,
            interner,
        }
    }

    /// Tokenises the whole buffer, bracketed by `beginFile`/`endFile`.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        tokens.push(Token::new(TokenKind::BeginFile, Symbol::EMPTY, 0));
        while !self.at_end() {
            self.skip_trivia();
            if self.at_end() {
                break;
            }
            self.start = self.current;
            if let Some(token) = self.scan_token() {
                tokens.push(token);
            }
        }
        tokens.push(Token::new(
            TokenKind::EndFile,
            Symbol::EMPTY,
            self.bytes.len() as u32,
        ));
        tokens
    }

    fn at_end(&self) -> bool {
        self.current >= self.bytes.len()
    }

    fn peek(&self) -> u8 {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        self.bytes.get(self.current + offset).copied().unwrap_or(0)
    }

    fn advance(&mut self) -> u8 {
        let b = self.bytes[self.current];
        self.current += 1;
        b
    }

    fn matches(&mut self, expected: u8) -> bool {
        if self.at_end() || self.bytes[self.current] != expected {
            return false;
        }
        self.current += 1;
        true
    }

    fn lexeme(&self) -> &'i str {
        &self.source[self.start..self.current]
    }

    fn make(&mut self, kind: TokenKind) -> Token {
        let sym = self.interner.intern(self.lexeme());
        Token::new(kind, sym, self.start as u32)
    }

    /// Skips whitespace, line comments, and terminated block comments.
    /// An unterminated block comment is left for `scan_token` to turn
    /// into a trailing `invalid` run rather than silently dropped.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    self.current += 1;
                }
                b'/' if self.peek_at(1) == b'/' => {
                    while !self.at_end() && self.peek() != b'\n' {
                        self.current += 1;
                    }
                }
                b'/' if self.peek_at(1) == b'*' => {
                    let comment_start = self.current;
                    self.current += 2;
                    let mut closed = false;
                    while !self.at_end() {
                        if self.peek() == b'*' && self.peek_at(1) == b'/' {
                            self.current += 2;
                            closed = true;
                            break;
                        }
                        self.current += 1;
                    }
                    if !closed {
                        self.current = comment_start;
                        return;
                    }
                }
                _ => return,
            }
        }
    }

    fn scan_token(&mut self) -> Option<Token> {
        let b = self.advance();
        let token = match b {
            b'(' => self.make(TokenKind::LeftParen),
            b')' => self.make(TokenKind::RightParen),
            b'{' => self.make(TokenKind::LeftBrace),
            b'}' => self.make(TokenKind::RightBrace),
            b'[' => self.make(TokenKind::LeftBracket),
            b']' => self.make(TokenKind::RightBracket),
            b',' => self.make(TokenKind::Comma),
            b';' => self.make(TokenKind::Semicolon),
            b'.' => self.make(TokenKind::Dot),
            b'^' => {
                let kind = if self.matches(b'=') {
                    TokenKind::CaretEqual
                } else {
                    TokenKind::Caret
                };
                self.make(kind)
            }
            b'%' => {
                let kind = if self.matches(b'=') {
                    TokenKind::PercentEqual
                } else {
                    TokenKind::Percent
                };
                self.make(kind)
            }
            b'~' => {
                let kind = if self.matches(b'=') {
                    TokenKind::TildeEqual
                } else {
                    TokenKind::Tilde
                };
                self.make(kind)
            }
            b'\'' => return Some(self.scan_apostrophe_or_character()),
            b'!' => {
                let kind = if self.matches(b'=') {
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                };
                self.make(kind)
            }
            b'=' => {
                let kind = if self.matches(b'=') {
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                };
                self.make(kind)
            }
            b'+' => {
                let kind = if self.matches(b'=') {
                    TokenKind::PlusEqual
                } else {
                    TokenKind::Plus
                };
                self.make(kind)
            }
            b'-' => {
                let kind = if self.matches(b'=') {
                    TokenKind::MinusEqual
                } else if self.matches(b'>') {
                    TokenKind::Arrow
                } else {
                    TokenKind::Minus
                };
                self.make(kind)
            }
            b'*' => {
                let kind = if self.matches(b'=') {
                    TokenKind::StarEqual
                } else if self.matches(b'>') {
                    TokenKind::StarGreater
                } else {
                    TokenKind::Star
                };
                self.make(kind)
            }
            b'>' => {
                let kind = if self.matches(b'=') {
                    TokenKind::GreaterEqual
                } else if self.matches(b'>') {
                    TokenKind::GreaterGreater
                } else {
                    TokenKind::Greater
                };
                self.make(kind)
            }
            b'/' => {
                let kind = if self.matches(b'=') {
                    TokenKind::SlashEqual
                } else {
                    TokenKind::Slash
                };
                self.make(kind)
            }
            b'&' => {
                let kind = if self.matches(b'&') {
                    TokenKind::AmpAmp
                } else if self.matches(b'=') {
                    TokenKind::AmpEqual
                } else {
                    TokenKind::Amp
                };
                self.make(kind)
            }
            b'$' => {
                let kind = if self.matches(b'=') {
                    TokenKind::DollarEqual
                } else {
                    return Some(self.invalid_run());
                };
                self.make(kind)
            }
            b':' => {
                let kind = if self.matches(b':') {
                    TokenKind::ColonColon
                } else {
                    TokenKind::Colon
                };
                self.make(kind)
            }
            b'<' => return Some(self.scan_angle_or_bra()),
            b'|' => return Some(self.scan_pipe_or_ket()),
            b'"' => return Some(self.scan_string()),
            b'@' => return Some(self.scan_at_word()),
            0xC2 if self.peek() == 0xB0 => {
                self.current += 1;
                self.make(TokenKind::Degree)
            }
            0xE2 if self.peek() == 0x80 && self.peek_at(1) == 0xA0 => {
                self.current += 2;
                self.make(TokenKind::Apostrophe)
            }
            b if b.is_ascii_digit() => self.scan_number(),
            b if b.is_ascii_alphabetic() || b == b'_' => self.scan_identifier(),
            _ => return Some(self.invalid_run()),
        };
        Some(token)
    }

    /// Consumes one or more bytes the lexer cannot classify into a single
    /// `invalid` token, so a run of garbage produces one diagnostic.
    fn invalid_run(&mut self) -> Token {
        while !self.at_end() && !self.peek().is_ascii_whitespace() && !self.starts_known_token() {
            self.current += 1;
        }
        self.make(TokenKind::Invalid)
    }

    fn starts_known_token(&self) -> bool {
        matches!(
            self.peek(),
            b'(' | b')' | b'{' | b'}' | b'[' | b']' | b',' | b';' | b'"'
        )
    }

    fn scan_identifier(&mut self) -> Token {
        while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
            self.current += 1;
        }
        let word = self.lexeme();
        if let Some(&(_, kind)) = KEYWORDS.iter().find(|(k, _)| *k == word) {
            return self.make(kind);
        }
        self.make(TokenKind::Identifier)
    }

    fn scan_at_word(&mut self) -> Token {
        while self.peek().is_ascii_alphanumeric() {
            self.current += 1;
        }
        let word = self.lexeme();
        if let Some(&(_, kind)) = MODIFIERS.iter().find(|(k, _)| *k == word) {
            return self.make(kind);
        }
        self.make(TokenKind::Invalid)
    }

    fn scan_number(&mut self) -> Token {
        if self.bytes[self.start] == b'0' {
            match self.peek() {
                b'x' | b'b' | b'o' | b'd' => {
                    self.current += 1;
                    while self.peek().is_ascii_alphanumeric() {
                        self.current += 1;
                    }
                    return self.finish_numeric_literal();
                }
                _ => {}
            }
        }
        while self.peek().is_ascii_digit() {
            self.current += 1;
        }
        let mut is_real = false;
        if self.peek() == b'.' && self.peek_at(1).is_ascii_digit() {
            is_real = true;
            self.current += 1;
            while self.peek().is_ascii_digit() {
                self.current += 1;
            }
        }
        if matches!(self.peek(), b'e' | b'E') {
            let save = self.current;
            self.current += 1;
            if self.peek() == b'-' {
                self.current += 1;
            }
            if self.peek().is_ascii_digit() {
                is_real = true;
                while self.peek().is_ascii_digit() {
                    self.current += 1;
                }
            } else {
                self.current = save;
            }
        }
        let _ = is_real;
        self.finish_numeric_literal()
    }

    fn finish_numeric_literal(&mut self) -> Token {
        let is_real = self.lexeme().contains('.') || self.lexeme().contains(['e', 'E']);
        if self.peek() == b'i' {
            self.current += 1;
            return self.make(TokenKind::ImaginaryLiteral);
        }
        if is_real {
            self.make(TokenKind::RealLiteral)
        } else {
            self.make(TokenKind::IntegerLiteral)
        }
    }

    fn scan_string(&mut self) -> Token {
        while !self.at_end() && self.peek() != b'"' {
            if self.peek() == b'\\' {
                self.current += 1;
            }
            self.current += 1;
        }
        if self.at_end() {
            return self.make(TokenKind::Invalid);
        }
        self.current += 1;
        self.make(TokenKind::StringLiteral)
    }

    /// `'` is overloaded between the dagger postfix operator and a
    /// character literal delimiter. Probes forward for a well-formed
    /// `'x'` / `'\ESC'` body without committing, and falls back to a bare
    /// `Apostrophe` (dagger) token when the probe fails — so `v'` (dagger
    /// applied to `v`) and `'a'` both lex correctly from the same byte.
    fn scan_apostrophe_or_character(&mut self) -> Token {
        let save = self.current;
        if let Some(end) = self.character_literal_end(save) {
            self.current = end;
            return self.make(TokenKind::CharacterLiteral);
        }
        self.current = save;
        self.make(TokenKind::Apostrophe)
    }

    /// Returns the cursor position just past the closing `'` if a
    /// character literal starts at `start`, without mutating `self.current`.
    fn character_literal_end(&self, start: usize) -> Option<usize> {
        let mut pos = start;
        if pos >= self.bytes.len() {
            return None;
        }
        if self.bytes[pos] == b'\\' {
            pos += 1;
            if pos >= self.bytes.len() {
                return None;
            }
            if self.bytes[pos] == b'0' && self.bytes.get(pos + 1) == Some(&b'x') {
                pos += 2;
                while pos < self.bytes.len() && self.bytes[pos].is_ascii_hexdigit() {
                    pos += 1;
                }
            } else {
                pos += 1;
            }
        } else {
            pos += 1;
        }
        if self.bytes.get(pos) == Some(&b'\'') {
            Some(pos + 1)
        } else {
            None
        }
    }

    /// `<` may begin `<=`, `<<`, `<*`, a basis ket-bra `<0|`/`<1|`, a named
    /// bra `<ident|`, a braket `<a|b>`, or fall back to plain `<`. The
    /// lookahead rolls back to `current` unchanged whenever the longer
    /// forms don't pan out.
    fn scan_angle_or_bra(&mut self) -> Token {
        if self.matches(b'=') {
            return self.make(TokenKind::LessEqual);
        }
        if self.matches(b'<') {
            return self.make(TokenKind::LessLess);
        }
        if self.matches(b'*') {
            return self.make(TokenKind::LessStar);
        }
        if let Some(tok) = self.try_bra_forms() {
            return tok;
        }
        self.make(TokenKind::Less)
    }

    fn try_bra_forms(&mut self) -> Option<Token> {
        let save = self.current;
        if matches!(self.peek(), b'0' | b'1') && self.peek_at(1) == b'|' {
            self.current += 2;
            return Some(self.make(TokenKind::BasisBraKet));
        }
        if !(self.peek().is_ascii_alphabetic() || self.peek() == b'_') {
            return None;
        }
        while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
            self.current += 1;
        }
        if self.peek() != b'|' {
            self.current = save;
            return None;
        }
        self.current += 1;
        let after_bar = self.current;
        if self.peek().is_ascii_alphabetic() || self.peek() == b'_' {
            while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
                self.current += 1;
            }
            if self.peek() == b'>' {
                self.current += 1;
                return Some(self.make(TokenKind::BraKetSymbol));
            }
            self.current = after_bar;
        }
        Some(self.make(TokenKind::BraSymbol))
    }

    /// `|` may begin `||`, `|=`, a basis ket `|0>`/`|1>`, a named ket
    /// `|ident>`, a ketbra `|a><b|`, or fall back to plain `|`.
    fn scan_pipe_or_ket(&mut self) -> Token {
        if self.matches(b'|') {
            return self.make(TokenKind::PipePipe);
        }
        if self.matches(b'=') {
            return self.make(TokenKind::PipeEqual);
        }
        if let Some(tok) = self.try_ket_forms() {
            return tok;
        }
        self.make(TokenKind::Pipe)
    }

    fn try_ket_forms(&mut self) -> Option<Token> {
        let save = self.current;
        if matches!(self.peek(), b'0' | b'1') && self.peek_at(1) == b'>' {
            self.current += 2;
            return Some(self.make(TokenKind::BasisBraKet));
        }
        if !(self.peek().is_ascii_alphabetic() || self.peek() == b'_') {
            return None;
        }
        while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
            self.current += 1;
        }
        if self.peek() != b'>' {
            self.current = save;
            return None;
        }
        self.current += 1;
        let after_ket = self.current;
        if self.peek() == b'<' {
            self.current += 1;
            let second_start = self.current;
            while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
                self.current += 1;
            }
            if self.current > second_start && self.peek() == b'|' {
                self.current += 1;
                return Some(self.make(TokenKind::KetBraSymbol));
            }
            self.current = after_ket;
        }
        Some(self.make(TokenKind::KetSymbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut interner = Interner::new();
        Lexer::new(source, &mut interner)
            .tokenize()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn brackets_sentinels() {
        let k = kinds("");
        assert_eq!(k, vec![TokenKind::BeginFile, TokenKind::EndFile]);
    }

    #[test]
    fn integer_literal() {
        let k = kinds("42");
        assert_eq!(
            k,
            vec![TokenKind::BeginFile, TokenKind::IntegerLiteral, TokenKind::EndFile]
        );
    }

    #[test]
    fn real_literal_requires_fractional_digit() {
        let k = kinds("3.14");
        assert!(k.contains(&TokenKind::RealLiteral));
    }

    #[test]
    fn imaginary_literal_trailing_i() {
        let k = kinds("2i");
        assert!(k.contains(&TokenKind::ImaginaryLiteral));
    }

    #[test]
    fn hex_prefixed_integer() {
        let k = kinds("0xFF");
        assert!(k.contains(&TokenKind::IntegerLiteral));
    }

    #[test]
    fn multi_char_operators_tried_before_prefixes() {
        let k = kinds("<= == != += ->");
        assert_eq!(
            k,
            vec![
                TokenKind::BeginFile,
                TokenKind::LessEqual,
                TokenKind::EqualEqual,
                TokenKind::BangEqual,
                TokenKind::PlusEqual,
                TokenKind::Arrow,
                TokenKind::EndFile,
            ]
        );
    }

    #[test]
    fn keyword_reclassifies_identifier() {
        let k = kinds("while");
        assert!(k.contains(&TokenKind::WhileKeyword));
    }

    #[test]
    fn reserved_unused_keyword_still_lexes() {
        let k = kinds("swap");
        assert!(k.contains(&TokenKind::SwapKeyword));
    }

    #[test]
    fn basis_bra_and_ket() {
        let k = kinds("<0| |1>");
        assert!(k.contains(&TokenKind::BasisBraKet));
        assert_eq!(k.iter().filter(|t| **t == TokenKind::BasisBraKet).count(), 2);
    }

    #[test]
    fn named_bra_and_ket() {
        let k = kinds("<a| |b>");
        assert!(k.contains(&TokenKind::BraSymbol));
        assert!(k.contains(&TokenKind::KetSymbol));
    }

    #[test]
    fn braket_inner_product_literal() {
        let k = kinds("<a|b>");
        assert!(k.contains(&TokenKind::BraKetSymbol));
    }

    #[test]
    fn lone_angle_and_pipe_still_tokenize() {
        let k = kinds("< |");
        assert!(k.contains(&TokenKind::Less));
        assert!(k.contains(&TokenKind::Pipe));
    }

    #[test]
    fn unterminated_string_is_invalid() {
        let k = kinds("\"abc");
        assert!(k.contains(&TokenKind::Invalid));
    }

    #[test]
    fn unrecognised_byte_becomes_single_invalid_run() {
        let k = kinds("#?");
        let invalid_count = k.iter().filter(|t| **t == TokenKind::Invalid).count();
        assert_eq!(invalid_count, 1);
    }

    #[test]
    fn line_comment_is_discarded() {
        let k = kinds("1 // trailing comment\n2");
        assert_eq!(
            k,
            vec![
                TokenKind::BeginFile,
                TokenKind::IntegerLiteral,
                TokenKind::IntegerLiteral,
                TokenKind::EndFile
            ]
        );
    }

    #[test]
    fn block_comment_is_discarded() {
        let k = kinds("1 /* not this */ 2");
        assert_eq!(
            k,
            vec![
                TokenKind::BeginFile,
                TokenKind::IntegerLiteral,
                TokenKind::IntegerLiteral,
                TokenKind::EndFile
            ]
        );
    }

    #[test]
    fn access_modifier_word() {
        let k = kinds("@public");
        assert!(k.contains(&TokenKind::PublicModifier));
    }

    #[test]
    fn lifecycle_specifier_word() {
        let k = kinds("@create @delete");
        assert!(k.contains(&TokenKind::CreateSpecifier));
        assert!(k.contains(&TokenKind::DeleteSpecifier));
    }

    #[test]
    fn character_literal_and_dagger_share_a_byte() {
        let k = kinds("'a'");
        assert!(k.contains(&TokenKind::CharacterLiteral));
        let k = kinds("v'");
        assert!(k.contains(&TokenKind::Apostrophe));
    }

    #[test]
    fn escaped_character_literal() {
        let k = kinds("'\\n'");
        assert!(k.contains(&TokenKind::CharacterLiteral));
    }

    #[test]
    fn shift_and_bra_ket_delimiters_tokenize() {
        let k = kinds("<< >> <* *>");
        assert_eq!(
            k,
            vec![
                TokenKind::BeginFile,
                TokenKind::LessLess,
                TokenKind::GreaterGreater,
                TokenKind::LessStar,
                TokenKind::StarGreater,
                TokenKind::EndFile,
            ]
        );
    }
}
