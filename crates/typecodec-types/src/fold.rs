//! Structural rewrites over [`TypeExpr`]: folding, erasure and free
//! variable collection.
//!
//! ## Two folding modes
//!
//! - [`TypeExpr::fold`] rewrites bottom-up: children first, then the node
//!   itself is passed to `f`. Substitution is a fold that replaces
//!   variables.
//! - [`TypeExpr::fold_type_variables_eager`] only maps variables, but a
//!   variable mapped to "erase" (`None`) makes the enclosing parameterized
//!   type collapse to its raw class, the way a raw type reference erases
//!   every generic member in Java. An erased wildcard bound erases the
//!   parameterized type that holds it; an erased array component turns the
//!   array into the array of the component's erasure.

use crate::def::{ClassTable, well_known};
use crate::types::{ParameterizedType, TypeExpr, TypeVar, WildcardType};
use indexmap::IndexSet;
use std::sync::Arc;
use typecodec_common::limits::MAX_HIERARCHY_DEPTH;

impl TypeExpr {
    /// Post-order rewrite of every member type, then of `self`.
    pub fn fold<F>(&self, f: &mut F) -> TypeExpr
    where
        F: FnMut(TypeExpr) -> TypeExpr,
    {
        let rebuilt = match self {
            TypeExpr::Raw(_) | TypeExpr::Variable(_) => self.clone(),
            TypeExpr::Array(component) => TypeExpr::array(component.fold(f)),
            TypeExpr::Parameterized(p) => TypeExpr::Parameterized(Arc::new(ParameterizedType {
                outer: p.outer.as_ref().map(|outer| outer.fold(f)),
                raw: p.raw,
                params: p.params.iter().map(|param| param.fold(f)).collect(),
            })),
            TypeExpr::Wildcard(w) => TypeExpr::Wildcard(Arc::new(WildcardType {
                upper: w.upper.iter().map(|b| b.fold(f)).collect(),
                lower: w.lower.iter().map(|b| b.fold(f)).collect(),
            })),
        };
        f(rebuilt)
    }

    /// Map type variables through `f`, erasing eagerly where `f` returns
    /// `None`.
    ///
    /// Returns `None` only when `self` is itself an erased variable or a
    /// wildcard with an erased bound; the caller decides what that erases.
    pub fn fold_type_variables_eager<F>(&self, table: &ClassTable, f: &mut F) -> Option<TypeExpr>
    where
        F: FnMut(&TypeVar) -> Option<TypeExpr> + ?Sized,
    {
        match self {
            TypeExpr::Raw(_) => Some(self.clone()),
            TypeExpr::Variable(var) => f(var),
            TypeExpr::Array(component) => match component.fold_type_variables_eager(table, f) {
                Some(folded) => Some(TypeExpr::array(folded)),
                None => Some(TypeExpr::array(component.erasure(table))),
            },
            TypeExpr::Parameterized(p) => {
                let mut params = smallvec::SmallVec::with_capacity(p.params.len());
                for param in &p.params {
                    match param.fold_type_variables_eager(table, f) {
                        Some(folded) => params.push(folded),
                        None => return Some(TypeExpr::Raw(p.raw)),
                    }
                }
                let outer = match &p.outer {
                    Some(outer) => match outer.fold_type_variables_eager(table, f) {
                        Some(folded) => Some(folded),
                        None => return Some(TypeExpr::Raw(p.raw)),
                    },
                    None => None,
                };
                Some(TypeExpr::Parameterized(Arc::new(ParameterizedType {
                    outer,
                    raw: p.raw,
                    params,
                })))
            }
            TypeExpr::Wildcard(w) => {
                let upper = w
                    .upper
                    .iter()
                    .map(|b| b.fold_type_variables_eager(table, f))
                    .collect::<Option<_>>()?;
                let lower = w
                    .lower
                    .iter()
                    .map(|b| b.fold_type_variables_eager(table, f))
                    .collect::<Option<_>>()?;
                Some(TypeExpr::Wildcard(Arc::new(WildcardType { upper, lower })))
            }
        }
    }

    /// Erase every variable, collapsing generic types to raw form.
    pub fn erase_variables(&self, table: &ClassTable) -> TypeExpr {
        self.fold_type_variables_eager(table, &mut |_| None)
            .unwrap_or_else(|| self.erasure(table))
    }

    /// The erasure: always a `Raw` or an array of an erasure.
    pub fn erasure(&self, table: &ClassTable) -> TypeExpr {
        self.erasure_bounded(table, 0)
    }

    fn erasure_bounded(&self, table: &ClassTable, depth: u32) -> TypeExpr {
        if depth > MAX_HIERARCHY_DEPTH {
            return TypeExpr::Raw(well_known::OBJECT);
        }
        match self {
            TypeExpr::Raw(_) => self.clone(),
            TypeExpr::Array(component) => {
                TypeExpr::array(component.erasure_bounded(table, depth + 1))
            }
            TypeExpr::Parameterized(p) => TypeExpr::Raw(p.raw),
            TypeExpr::Variable(var) => match table.variable_bounds(var).first() {
                Some(bound) => bound.erasure_bounded(table, depth + 1),
                None => TypeExpr::Raw(well_known::OBJECT),
            },
            TypeExpr::Wildcard(w) => match w.upper.first() {
                Some(bound) => bound.erasure_bounded(table, depth + 1),
                None => TypeExpr::Raw(well_known::OBJECT),
            },
        }
    }

    /// Every reachable variable, in first-occurrence order.
    pub fn free_variables(&self) -> IndexSet<TypeVar> {
        let mut out = IndexSet::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut IndexSet<TypeVar>) {
        match self {
            TypeExpr::Raw(_) => {}
            TypeExpr::Variable(var) => {
                out.insert(var.clone());
            }
            TypeExpr::Array(component) => component.collect_variables(out),
            TypeExpr::Parameterized(p) => {
                if let Some(outer) = &p.outer {
                    outer.collect_variables(out);
                }
                for param in &p.params {
                    param.collect_variables(out);
                }
            }
            TypeExpr::Wildcard(w) => {
                for bound in w.upper.iter().chain(w.lower.iter()) {
                    bound.collect_variables(out);
                }
            }
        }
    }

    pub fn has_free_variables(&self) -> bool {
        match self {
            TypeExpr::Raw(_) => false,
            TypeExpr::Variable(_) => true,
            TypeExpr::Array(component) => component.has_free_variables(),
            TypeExpr::Parameterized(p) => {
                p.outer.as_ref().is_some_and(TypeExpr::has_free_variables)
                    || p.params.iter().any(TypeExpr::has_free_variables)
            }
            TypeExpr::Wildcard(w) => w
                .upper
                .iter()
                .chain(w.lower.iter())
                .any(TypeExpr::has_free_variables),
        }
    }
}

#[cfg(test)]
#[path = "../tests/fold_tests.rs"]
mod fold_tests;
