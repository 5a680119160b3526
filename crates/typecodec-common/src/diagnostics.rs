//! Problem reporting for a generation round.
//!
//! Linking and introspection failures are not thrown at the point they are
//! found. They are recorded against the program element they originate from,
//! and the driver decides afterwards which types are skipped. A single round
//! therefore surfaces every independent failure at once.

use serde::Serialize;
use std::fmt;
use tracing::debug;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProblemCategory {
    Error,
    Warning,
}

/// Stable problem codes.
///
/// Codes are grouped by the stage that produces them:
///
/// | Range | Stage |
/// |-------|-------|
/// | 1xxx  | type resolution / linking |
/// | 2xxx  | dependency graph checking |
/// | 3xxx  | bean introspection |
/// | 4xxx  | plan construction |
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ProblemCode {
    /// No registered strategy applies to a type.
    NoCodec,
    /// A free variable was bound to two different types.
    InconsistentBinding,
    /// A strategy dependency still mentions a variable after substitution.
    UnboundVariable,
    /// Unguarded recursive reference between beans.
    CyclicDependency,
    /// The bean has no usable creator for deserialization.
    NoCreator,
    /// Two properties claim the same JSON name.
    DuplicatePropertyName,
    /// `unwrapped` on a property whose type is not an inline bean.
    InvalidUnwrapped,
    /// Conflicting or unusable annotations.
    InvalidAnnotation,
    /// Polymorphic configuration that cannot be planned.
    InvalidSubtyping,
    /// The type shape is recognised but not supported in this direction.
    UnsupportedType,
}

impl ProblemCode {
    pub const fn code(self) -> u32 {
        match self {
            Self::NoCodec => 1001,
            Self::InconsistentBinding => 1002,
            Self::UnboundVariable => 1003,
            Self::CyclicDependency => 2001,
            Self::NoCreator => 3001,
            Self::DuplicatePropertyName => 3002,
            Self::InvalidUnwrapped => 3003,
            Self::InvalidAnnotation => 3004,
            Self::InvalidSubtyping => 3005,
            Self::UnsupportedType => 4001,
        }
    }
}

/// One recorded problem.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub category: ProblemCategory,
    pub code: ProblemCode,
    /// Readable name of the originating element, e.g. `com.example.Node#children`.
    pub element: String,
    pub message_text: String,
}

impl Problem {
    pub fn error(code: ProblemCode, element: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            category: ProblemCategory::Error,
            code,
            element: element.into(),
            message_text: message.into(),
        }
    }

    pub fn warning(
        code: ProblemCode,
        element: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category: ProblemCategory::Warning,
            code,
            element: element.into(),
            message_text: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.category == ProblemCategory::Error
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.category {
            ProblemCategory::Error => "error",
            ProblemCategory::Warning => "warning",
        };
        write!(
            f,
            "{label} TC{}: {}: {}",
            self.code.code(),
            self.element,
            self.message_text
        )
    }
}

/// Accumulates problems for one generation unit.
///
/// Errors mark the reporter as failed; warnings do not.
#[derive(Debug, Default)]
pub struct ProblemReporter {
    problems: Vec<Problem>,
    failed: bool,
}

impl ProblemReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error against `element`.
    pub fn fail(&mut self, code: ProblemCode, element: impl Into<String>, message: impl Into<String>) {
        let problem = Problem::error(code, element, message);
        debug!(target: "typecodec::problems", %problem, "recorded failure");
        self.failed = true;
        self.problems.push(problem);
    }

    /// Record a warning against `element`.
    pub fn warn(&mut self, code: ProblemCode, element: impl Into<String>, message: impl Into<String>) {
        let problem = Problem::warning(code, element, message);
        debug!(target: "typecodec::problems", %problem, "recorded warning");
        self.problems.push(problem);
    }

    pub fn report(&mut self, problem: Problem) {
        if problem.is_error() {
            self.failed = true;
        }
        self.problems.push(problem);
    }

    /// Returns `true` once any error has been recorded.
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn take_problems(&mut self) -> Vec<Problem> {
        self.failed = false;
        std::mem::take(&mut self.problems)
    }

    /// Move every problem of `other` into `self`.
    pub fn absorb(&mut self, mut other: ProblemReporter) {
        self.failed |= other.failed;
        self.problems.append(&mut other.problems);
    }
}

#[cfg(test)]
#[path = "../tests/diagnostics_tests.rs"]
mod diagnostics_tests;
