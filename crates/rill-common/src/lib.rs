//! Shared types for the Rill front end and type checker.

pub mod span;
pub mod token;
