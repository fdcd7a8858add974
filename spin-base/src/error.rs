//! Error types with source location tracking.
//!
//! Every error that can be surfaced to a Spin program's author carries a
//! short diagnostic code (spec §7) and a [`Span`] pointing at the token or
//! construct responsible. The five codes are a closed set, one per
//! pipeline stage:
//!
//! - `flm` — file management (missing source, unreadable wing).
//! - `lxr` — a lexer `invalid` token reached a later stage.
//! - `ppr` — preprocessor (Wings): malformed or repeated `import`.
//! - `syx` — parser: unexpected token, misuse of control-flow keywords.
//! - `evl` — interpreter/processor: everything that only an actual run
//!   of the program can discover (type mismatch, divide-by-zero, arity).

use crate::span::Span;
use std::fmt;

/// The five diagnostic codes from spec §7, one per pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// File management: missing source, unreadable wing, write failure.
    FileManagement,
    /// Lexer: an `invalid` token reached a later stage.
    Lexer,
    /// Preprocessor (Wings): malformed `import`.
    Preprocessor,
    /// Parser: syntax error.
    Syntax,
    /// Interpreter/Processor: evaluation error.
    Evaluation,
}

impl ErrorCode {
    /// The three-letter short code printed in diagnostics.
    pub fn short(self) -> &'static str {
        match self {
            ErrorCode::FileManagement => "flm",
            ErrorCode::Lexer => "lxr",
            ErrorCode::Preprocessor => "ppr",
            ErrorCode::Syntax => "syx",
            ErrorCode::Evaluation => "evl",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short())
    }
}

/// An error annotated with its diagnostic code and source location.
///
/// Implements [`std::error::Error`] and [`fmt::Display`]. The display
/// format is `{code}: {message} at {start}..{end}`; the driver is
/// responsible for resolving the span to a line number and prefixing the
/// file name (spec §6: `file[line]: code: message`).
#[derive(Debug, Clone)]
pub struct SpannedError {
    /// Human-readable error description.
    pub message: String,
    /// Location in source where the error occurred.
    pub span: Span,
    /// Which pipeline stage raised the error.
    pub code: ErrorCode,
}

impl SpannedError {
    /// Creates an error with the given code, message, and source location.
    pub fn new(code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            code,
        }
    }

    /// Renders the error the way the driver prints it to stderr:
    /// `{file}[{line}]: {code}: {message}`.
    pub fn render(&self, file: &str, source: &str) -> String {
        format!(
            "{}[{}]: {}: {}",
            file,
            self.span.line_in(source),
            self.code,
            self.message
        )
    }
}

impl fmt::Display for SpannedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} at {}..{}",
            self.code, self.message, self.span.start, self.span.end
        )
    }
}

impl std::error::Error for SpannedError {}

/// Alias for `std::result::Result<T, SpannedError>`. Use this as the
/// return type for any fallible operation in the Spin toolchain.
pub type Result<T> = std::result::Result<T, SpannedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spanned_error_display_includes_code_and_message() {
        let err = SpannedError::new(ErrorCode::Syntax, "expected ';'", Span::new(5, 10));
        let display = format!("{}", err);
        assert!(display.contains("syx"));
        assert!(display.contains("expected ';'"));
        assert!(display.contains("5..10"));
    }

    #[test]
    fn render_resolves_line_number() {
        let source = "a\nb\nInteger x = ;";
        let err = SpannedError::new(ErrorCode::Syntax, "expected expression", Span::at(16));
        let rendered = err.render("main.spin", source);
        assert_eq!(rendered, "main.spin[3]: syx: expected expression");
    }

    #[test]
    fn error_code_short_codes_match_spec() {
        assert_eq!(ErrorCode::FileManagement.short(), "flm");
        assert_eq!(ErrorCode::Lexer.short(), "lxr");
        assert_eq!(ErrorCode::Preprocessor.short(), "ppr");
        assert_eq!(ErrorCode::Syntax.short(), "syx");
        assert_eq!(ErrorCode::Evaluation.short(), "evl");
    }
}
