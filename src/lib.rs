//! Command-line front end for the typecodec generator.
//!
//! The generator itself lives in the workspace crates, leaves first:
//!
//! | Crate | Role |
//! |-------|------|
//! | [`common`] | problem reporting, limits, recursion guards |
//! | [`types`] | element model, type algebra, inference |
//! | [`runtime`] | JSON decoder/encoder protocols and the runtime value model |
//! | [`codegen`] | registry, linker, strategies, bean planning, plan evaluator |
//!
//! This package adds the configuration file, JSON model descriptors and the
//! `typecodec` binary with its `plan`, `decode` and `check` commands.

pub use typecodec_common as common;
pub use typecodec_gen as codegen;
pub use typecodec_runtime as runtime;
pub use typecodec_types as types;

pub mod cli;

// Tracing configuration (TYPECODEC_LOG / TYPECODEC_LOG_FORMAT)
pub mod tracing_config;
