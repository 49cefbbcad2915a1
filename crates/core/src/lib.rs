#![allow(clippy::result_large_err)]
//! cascade-syntax: Cascade schema language frontend.
//!
//! Turns schema source text into a syntax tree:
//!
//! 1. [`lexer`] -- characters to tokens, with context-sensitive keywords
//! 2. [`parser`] -- recursive descent plus precedence climbing to [`Root`]
//! 3. [`humanize`] / [`diagnostics`] -- user-facing error text and editor
//!    marker projections
//!
//! # Public API
//!
//! - [`parse()`] -- text to [`Root`] or a [`SyntaxError`]
//! - [`tokenize()`] -- text to [`Token`]s
//! - [`validate()`] / [`is_valid()`] -- never-failing checks for editors
//! - AST types: [`Root`], [`InputDeclaration`], [`ValueDeclaration`],
//!   [`TraitDeclaration`], [`Expression`], [`Literal`]

pub mod ast;
pub mod diagnostics;
pub mod error;
pub mod frontend;
pub mod humanize;
pub mod lexer;
pub mod parser;
pub mod token;

// ── Convenience re-exports: key types ────────────────────────────────

pub use ast::{
    AccessMode, CaseExpression, Domain, Expression, ImportDeclaration, InputDeclaration,
    InputType, Literal, Number, PrimitiveType, Root, TraitDeclaration, ValueDeclaration,
};
pub use diagnostics::{Diagnostic, DiagnosticCollection, DiagnosticKind, Severity};
pub use error::{ErrorOrigin, ParseError, SyntaxError, TokenizerError};
pub use token::{Location, Token, TokenKind};

// ── Convenience re-exports: entry points ─────────────────────────────

pub use frontend::{is_valid, parse, tokenize, validate};
pub use humanize::humanize_error_message;
