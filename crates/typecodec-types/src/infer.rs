//! Type inference: unify a generic pattern with a concrete type.
//!
//! ```text
//! infer_exact(List<E>, List<String>)               = { E -> String }
//! infer_contravariant(List<E>, ArrayList<String>)  = { E -> String }   // via Iterable walk
//! infer_covariant(ArrayList<E>, List<String>)      = { E -> String }
//! ```
//!
//! Exact inference is purely structural. The first occurrence of a pattern
//! variable binds it; later occurrences must be equal to that binding (by
//! `TypeExpr` equality, never re-derived).
//!
//! The variance-aware entry points first align the two shapes with
//! `find_parameterization` and then delegate to exact inference:
//! - contravariant: the pattern is a supertype of the concrete type (a
//!   serializer for `List<E>` serving an `ArrayList<String>`),
//! - covariant: the pattern is a subtype of the concrete type (a decoder
//!   producing `ArrayList<E>` serving a `List<String>` target).

use crate::def::ClassTable;
use crate::types::{TypeExpr, TypeVar};
use indexmap::IndexMap;
use tracing::trace;

/// Mapping from free type variables to types, in binding order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Substitution {
    bindings: IndexMap<TypeVar, TypeExpr>,
}

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, var: &TypeVar) -> Option<&TypeExpr> {
        self.bindings.get(var)
    }

    /// Bind `var` unless it is already bound. Returns the conflicting
    /// existing binding if it differs from `ty`.
    pub fn bind(&mut self, var: TypeVar, ty: TypeExpr) -> Result<(), TypeExpr> {
        match self.bindings.get(&var) {
            Some(existing) if *existing == ty => Ok(()),
            Some(existing) => Err(existing.clone()),
            None => {
                self.bindings.insert(var, ty);
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TypeVar, &TypeExpr)> {
        self.bindings.iter()
    }

    /// Replace every bound variable in `ty`; unbound variables stay.
    pub fn apply(&self, ty: &TypeExpr) -> TypeExpr {
        if self.bindings.is_empty() {
            return ty.clone();
        }
        ty.fold(&mut |t| {
            if let TypeExpr::Variable(var) = &t {
                if let Some(bound) = self.bindings.get(var) {
                    return bound.clone();
                }
            }
            t
        })
    }
}

impl FromIterator<(TypeVar, TypeExpr)> for Substitution {
    fn from_iter<I: IntoIterator<Item = (TypeVar, TypeExpr)>>(iter: I) -> Self {
        Self {
            bindings: iter.into_iter().collect(),
        }
    }
}

impl TypeExpr {
    /// Fold `self` through `substitution`.
    pub fn substitute(&self, substitution: &Substitution) -> TypeExpr {
        substitution.apply(self)
    }
}

/// Why exact inference failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InferenceError {
    /// Raw classes, arity or variant kinds differ.
    ShapeMismatch { pattern: TypeExpr, concrete: TypeExpr },
    /// A variable occurs twice with different bindings.
    Conflict {
        var: TypeVar,
        first: TypeExpr,
        second: TypeExpr,
    },
    /// The concrete type does not implement the pattern's class (or the
    /// reverse, for covariant inference).
    NotRelated { pattern: TypeExpr, concrete: TypeExpr },
}

/// Structural unification of `pattern` against `concrete`.
pub fn infer_exact(table: &ClassTable, pattern: &TypeExpr, concrete: &TypeExpr) -> Option<Substitution> {
    try_infer_exact(table, pattern, concrete).ok()
}

/// Like [`infer_exact`], reporting why unification failed.
pub fn try_infer_exact(
    table: &ClassTable,
    pattern: &TypeExpr,
    concrete: &TypeExpr,
) -> Result<Substitution, InferenceError> {
    let mut substitution = Substitution::new();
    unify(table, &mut substitution, pattern, concrete)?;
    trace!(
        target: "typecodec::infer",
        pattern = %pattern.display(table),
        concrete = %concrete.display(table),
        bindings = substitution.len(),
        "infer_exact"
    );
    Ok(substitution)
}

/// The pattern is a supertype of `concrete`.
pub fn infer_contravariant(
    table: &ClassTable,
    pattern: &TypeExpr,
    concrete: &TypeExpr,
) -> Option<Substitution> {
    try_infer_contravariant(table, pattern, concrete).ok()
}

pub fn try_infer_contravariant(
    table: &ClassTable,
    pattern: &TypeExpr,
    concrete: &TypeExpr,
) -> Result<Substitution, InferenceError> {
    let aligned = concrete
        .find_parameterization(table, &pattern.erasure(table))
        .ok_or_else(|| InferenceError::NotRelated {
            pattern: pattern.clone(),
            concrete: concrete.clone(),
        })?;
    try_infer_exact(table, pattern, &aligned)
}

/// The pattern is a subtype of `concrete`.
pub fn infer_covariant(
    table: &ClassTable,
    pattern: &TypeExpr,
    concrete: &TypeExpr,
) -> Option<Substitution> {
    try_infer_covariant(table, pattern, concrete).ok()
}

pub fn try_infer_covariant(
    table: &ClassTable,
    pattern: &TypeExpr,
    concrete: &TypeExpr,
) -> Result<Substitution, InferenceError> {
    let aligned = pattern
        .find_parameterization(table, &concrete.erasure(table))
        .ok_or_else(|| InferenceError::NotRelated {
            pattern: pattern.clone(),
            concrete: concrete.clone(),
        })?;
    try_infer_exact(table, &aligned, concrete)
}

fn unify(
    table: &ClassTable,
    substitution: &mut Substitution,
    pattern: &TypeExpr,
    concrete: &TypeExpr,
) -> Result<(), InferenceError> {
    let mismatch = || InferenceError::ShapeMismatch {
        pattern: pattern.clone(),
        concrete: concrete.clone(),
    };
    match (pattern, concrete) {
        (TypeExpr::Variable(var), _) => {
            substitution
                .bind(var.clone(), concrete.clone())
                .map_err(|first| InferenceError::Conflict {
                    var: var.clone(),
                    first,
                    second: concrete.clone(),
                })
        }
        (TypeExpr::Raw(a), TypeExpr::Raw(b)) => {
            if a == b {
                Ok(())
            } else {
                Err(mismatch())
            }
        }
        (TypeExpr::Array(a), TypeExpr::Array(b)) => unify(table, substitution, a, b),
        (TypeExpr::Parameterized(a), TypeExpr::Parameterized(b)) => {
            if a.raw != b.raw || a.params.len() != b.params.len() {
                return Err(mismatch());
            }
            if table.is_inner_class(a.raw) {
                match (&a.outer, &b.outer) {
                    (Some(pa), Some(pb)) => unify(table, substitution, pa, pb)?,
                    (None, None) => {}
                    _ => return Err(mismatch()),
                }
            }
            for (pa, pb) in a.params.iter().zip(b.params.iter()) {
                unify(table, substitution, pa, pb)?;
            }
            Ok(())
        }
        (TypeExpr::Wildcard(a), TypeExpr::Wildcard(b)) => {
            if a.upper.len() != b.upper.len() || a.lower.len() != b.lower.len() {
                return Err(mismatch());
            }
            for (pa, pb) in a.upper.iter().zip(b.upper.iter()) {
                unify(table, substitution, pa, pb)?;
            }
            for (pa, pb) in a.lower.iter().zip(b.lower.iter()) {
                unify(table, substitution, pa, pb)?;
            }
            Ok(())
        }
        _ => Err(mismatch()),
    }
}

#[cfg(test)]
#[path = "../tests/infer_tests.rs"]
mod infer_tests;
