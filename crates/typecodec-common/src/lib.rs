//! Common types and utilities for the typecodec crates.
//!
//! This crate provides foundational pieces used across all typecodec crates:
//! - Problem reporting (`Problem`, `ProblemCode`, `ProblemReporter`)
//! - Generator limits and thresholds
//! - Recursion guards for cycle detection and depth limiting

// Problem reporting for generation rounds
pub mod diagnostics;
pub use diagnostics::{Problem, ProblemCategory, ProblemCode, ProblemReporter};

// Centralized limits and thresholds
pub mod limits;

// Cycle detection / depth limiting
pub mod recursion;
pub use recursion::{DepthCounter, RecursionGuard, RecursionProfile, RecursionResult};
