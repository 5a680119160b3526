//! Codec generation for the typecodec type algebra.
//!
//! Given a [`ClassTable`](typecodec_types::ClassTable) and a root type, this
//! crate decides which strategy handles every nested type, checks the
//! dependency graph for illegal recursion and synthesizes encode/decode
//! [plans](plan::Plan). Plans can be printed or executed directly by the
//! [`Evaluator`].
//!
//! | Module | Role |
//! |--------|------|
//! | [`registry`] | registered strategy patterns, most-specific selection |
//! | [`linker`] | symbol lookup and memoised dependency resolution |
//! | [`symbols`] | one strategy per structural shape |
//! | [`bean`] | introspection, deserialization planning, bean serialization |
//! | [`dependency_check`] | cycle detection before planning |
//! | [`generator`] | per-type driver and worklist over a model |
//! | [`plan`] | statement IR and its pseudo-code rendering |
//! | [`eval`] | plan interpreter over the runtime protocols |
//!
//! Generation of one type reads only shared immutable inputs, so callers may
//! generate independent types in parallel.

pub mod bean;
pub mod config;
pub mod context;
pub mod dependency_check;
pub mod eval;
pub mod generator;
pub mod linker;
pub mod plan;
pub mod registry;
pub mod symbols;

pub use config::GeneratorConfig;
pub use context::{GeneratorContext, Injection};
pub use eval::{CodecSet, EvalError, Evaluator, WriteHook};
pub use generator::{GeneratedCodec, GenerationOutput, ResolvedInjection, SingletonGenerator};
pub use linker::{CodecKey, Direction, Link, Linker, Resolution, ResolvedCodec};
pub use plan::{Block, Expr, Failure, Local, Plan, PlanKind, Stmt};
pub use registry::{Registry, RegistryEntry, StrategyKind, TypeResolutionError};
pub use symbols::Symbol;

#[cfg(test)]
#[path = "../tests/fixtures.rs"]
pub(crate) mod fixtures;
