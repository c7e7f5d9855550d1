//! The column store's native query language.
//!
//! A small CQL dialect covering what the mapping engine emits and what named
//! query templates may contain:
//!
//! ```text
//! SELECT * | COUNT(*) | col, ... FROM family [WHERE rel AND ...] [LIMIT n]
//! UPDATE family SET col = term, col = col + n WHERE KEY IN (...)
//! DELETE [col, ...] FROM family WHERE KEY = term
//! ```
//!
//! Statements are built as an AST ([`Statement`]), rendered with `Display`
//! and parsed back with [`parse`]. Templates may carry `:name` placeholders
//! that [`Statement::bind`] fills in.

mod ast;
mod lexer;
mod parser;

pub use ast::{
    AssignOp, Assignment, DeleteStatement, Operator, Projection, Relation, SelectStatement,
    Statement, Subject, Term, UpdateStatement, quote_identifier,
};
pub use parser::parse;

/// Result type for query language operations.
pub type CqlResult<T> = Result<T, CqlError>;

/// Errors raised while parsing or binding statements.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CqlError {
    /// The text is not a valid statement.
    #[error("syntax error at byte {position}: {message}")]
    Syntax { position: usize, message: String },

    /// A placeholder has no value in the parameter map.
    #[error("unbound parameter: {0}")]
    UnboundParameter(String),
}
