//! Centralized limits and thresholds for the generator.
//!
//! None of these limits are reached by well-formed input. They exist so that
//! a malformed element model (for example a class that lists itself as its
//! own supertype) ends in a reported failure instead of a stack overflow.
//!
//! Recursion limits for guards are expressed through
//! [`RecursionProfile`](crate::recursion::RecursionProfile); the constants
//! here are the values those profiles use.

// =============================================================================
// Type algebra
// =============================================================================

/// Maximum number of supertype/interface hops walked by
/// `find_parameterization` before giving up.
///
/// Real Java hierarchies are rarely deeper than 10 levels.
pub const MAX_HIERARCHY_DEPTH: u32 = 64;

// =============================================================================
// Dependency graph
// =============================================================================

/// Maximum nesting depth of the dependency walk that precedes plan
/// construction. Each nested property type adds a level.
pub const MAX_DEPENDENCY_DEPTH: u32 = 256;

/// Maximum number of dependency edges visited for a single root type.
pub const MAX_DEPENDENCY_EDGES: u32 = 100_000;

// =============================================================================
// Linking
// =============================================================================

/// Maximum depth of nested strategy resolution (`List<List<List<...>>>`).
pub const MAX_LINK_DEPTH: u32 = 128;

// =============================================================================
// Runtime
// =============================================================================

/// Maximum nesting of objects/arrays the evaluator will follow in one
/// document.
pub const MAX_DOCUMENT_DEPTH: u32 = 512;
