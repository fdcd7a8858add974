#![cfg_attr(docsrs, feature(doc_cfg))]

//! # spin-base
//!
//! Pure structural atoms shared by every stage of the Spin toolchain:
//!
//! - [`Arena`] — bump allocation for AST nodes that must outlive parsing.
//! - [`Interner`]/[`Symbol`] — string interning for O(1) identifier equality.
//! - [`Span`] — byte-offset source location tracking.
//! - [`SpannedError`]/[`Result`] — errors carrying the span that produced them.
//!
//! This crate has no knowledge of Spin's grammar, tokens, or runtime values.
//! It only provides generic, reusable infrastructure that the lexer, parser,
//! and interpreter crates build upon.

pub mod arena;
pub mod intern;
pub mod span;
pub mod error;

pub use arena::Arena;
pub use intern::{Interner, Symbol, SymbolEq};
pub use span::Span;
pub use error::{SpannedError, Result};
