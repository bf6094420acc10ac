//! Statement interpreter front end for the emulated backends.
//!
//! SQL text is tokenized ([`lexer`]) and parsed into a [`Statement`]. The
//! grammar is a fixed subset: single-table SELECT with one applied filter,
//! INSERT/UPDATE/DELETE, CREATE/DROP TABLE and `PRAGMA table_info`.
//! Execution lives in [`crate::store`].

pub mod ast;
mod lexer;
mod parser;

pub use ast::*;
pub use parser::{parse, ParseError};
