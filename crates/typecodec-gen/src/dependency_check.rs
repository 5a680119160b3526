//! Cycle detection over the inline dependency graph.
//!
//! Inline beans are expanded at every use site, so an inline bean that
//! reaches itself through inline edges only would expand forever. The
//! checker walks [`Symbol::visit_dependencies`] from a root with the
//! current path on a [`RecursionGuard`] and reports such a cycle before
//! any plan is built.
//!
//! Edges through an injected codec are recorded but not followed: the
//! injected codec is generated separately and looked up by key at use
//! time, which is also what `permit recursive serialization` turns a bean
//! edge into.

use crate::linker::Linker;
use crate::symbols::{DependencyVisitor, Symbol};
use indexmap::IndexSet;
use std::fmt;
use tracing::debug;
use typecodec_common::{ProblemCode, ProblemReporter, RecursionGuard, RecursionProfile, RecursionResult};
use typecodec_types::TypeExpr;

/// An inline bean that contains itself without indirection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CyclicDependencyError {
    /// Readable path from the root to the repeated bean.
    pub path: String,
    /// The walk gave up at the depth or edge limit instead of finding a
    /// repeat.
    pub exceeded: bool,
}

impl fmt::Display for CyclicDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.exceeded {
            write!(f, "Dependency graph exceeds the nesting limit at {}", self.path)
        } else {
            write!(
                f,
                "Circular dependency: {}. Mark a property on the cycle to permit recursive serialization",
                self.path
            )
        }
    }
}

impl std::error::Error for CyclicDependencyError {}

pub struct DependencyGraphChecker<'l, 'a> {
    linker: &'l Linker<'a>,
    guard: RecursionGuard<TypeExpr>,
    path: Vec<String>,
    errors: Vec<CyclicDependencyError>,
    injected: IndexSet<(TypeExpr, bool)>,
}

impl<'l, 'a> DependencyGraphChecker<'l, 'a> {
    pub fn new(linker: &'l Linker<'a>) -> Self {
        Self {
            linker,
            guard: RecursionGuard::with_profile(RecursionProfile::DependencyGraph),
            path: Vec::new(),
            errors: Vec::new(),
            injected: IndexSet::new(),
        }
    }

    /// Walk everything the bean `root` inlines.
    pub fn check_root(&mut self, root: &TypeExpr) {
        let display = root.display(self.linker.table()).to_string();
        self.path.push(display);
        self.enter_bean(root);
        self.path.pop();
    }

    fn enter_bean(&mut self, ty: &TypeExpr) {
        match self.guard.enter(ty.clone()) {
            RecursionResult::Entered => {
                let linker = self.linker;
                Symbol::Bean.visit_dependencies(linker, ty, self);
                self.guard.leave(ty);
            }
            RecursionResult::Cycle => self.record(false),
            RecursionResult::DepthExceeded | RecursionResult::IterationExceeded => self.record(true),
        }
    }

    fn record(&mut self, exceeded: bool) {
        let error = CyclicDependencyError {
            path: self.path.join("->"),
            exceeded,
        };
        debug!(target: "typecodec::dependency_check", path = %error.path, exceeded, "cycle detected");
        if !self.errors.contains(&error) {
            self.errors.push(error);
        }
    }

    /// Injected codecs reached from the root, with the provider flag.
    pub fn injected(&self) -> impl Iterator<Item = &(TypeExpr, bool)> {
        self.injected.iter()
    }

    pub fn errors(&self) -> &[CyclicDependencyError] {
        &self.errors
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Record every error against `element`.
    pub fn report(&self, element: &str, problems: &mut ProblemReporter) {
        for error in &self.errors {
            problems.fail(ProblemCode::CyclicDependency, element, error.to_string());
        }
    }
}

impl DependencyVisitor for DependencyGraphChecker<'_, '_> {
    fn visit_structure_element(&mut self, symbol: &Symbol, ty: &TypeExpr, segment: &str) {
        let mut core = symbol;
        while let Symbol::Nullable(inner) = core {
            core = inner;
        }
        self.path.push(segment.to_owned());
        match core {
            Symbol::Bean => self.enter_bean(ty),
            other => {
                let linker = self.linker;
                other.visit_dependencies(linker, ty, self);
            }
        }
        self.path.pop();
    }

    fn visit_injected(&mut self, ty: &TypeExpr, provider: bool) {
        self.injected.insert((ty.clone(), provider));
    }
}

#[cfg(test)]
#[path = "../tests/dependency_check_tests.rs"]
mod dependency_check_tests;
