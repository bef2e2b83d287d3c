//! Abstract Syntax Tree (AST) definitions for placeholder expressions
//!
//! The tree is rebuilt for every placeholder on every resolution pass; there
//! is no incremental re-parsing.

mod expression;

pub use expression::*;
