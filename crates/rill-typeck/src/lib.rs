//! Rill type checker: flow-sensitive inference with union types.
//!
//! Rill has no type annotations. Every expression, local, method parameter,
//! and block parameter gets a type by following values through the program:
//! a local's type is whatever it holds at that point, and where several
//! control-flow paths meet the types are joined into a union.
//!
//! # Architecture
//!
//! - [`ty`]: primitive and union types
//! - [`env`]: scope arena, binding tables, snapshots for merges
//! - [`unify`]: joins and assignment narrowing
//! - [`module`]: type registry, method caches, node annotations
//! - [`error`]: type errors
//! - [`diagnostics`]: ariadne/JSON rendering of type errors
//! - [`config`]: inference limits
//! - `infer`, `methods`, `blocks`: the engine (visitor, method registry,
//!   block/yield resolver)

pub mod config;
pub mod diagnostics;
pub mod env;
pub mod error;
pub mod module;
pub mod ty;
pub mod unify;

mod blocks;
mod infer;
mod methods;

use rill_parser::ast::Program;

pub use config::InferConfig;
pub use error::TypeError;
pub use module::Module;
pub use ty::Ty;

/// Infer types for `program` with the default configuration.
pub fn infer(program: &Program) -> Result<Module, TypeError> {
    infer_with_config(program, &InferConfig::default())
}

/// Infer types for `program`. Stops at the first type error.
pub fn infer_with_config(program: &Program, config: &InferConfig) -> Result<Module, TypeError> {
    infer::Inferencer::new(config).run(program)
}
