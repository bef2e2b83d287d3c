//! Placeholder evaluation
//!
//! [`Resolver`] is the public entry point: it owns a [`Context`](crate::context::Context),
//! scans templates for placeholders and evaluates each expression body
//! through the private AST walker in `engine`.

mod config;
mod engine;
mod resolver;


pub use config::ResolverConfig;
pub use resolver::Resolver;
