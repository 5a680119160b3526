//! Supertype queries: parameterization lookup and assignability.
//!
//! `find_parameterization(on, target)` answers "how does `on` implement
//! `target`?". For `ArrayList<String>` and `Iterable` it returns
//! `Iterable<String>`: the walk goes up the declared supertype chain and
//! interface lists, substituting the type arguments of each level into the
//! next one.
//!
//! ## Special cases
//!
//! - `Object` is implemented by every non-primitive type, interfaces
//!   included, even though it never appears in an interface's declaration.
//! - Arrays implement `Object`, `Cloneable`, `Serializable` and the arrays of
//!   their component's supertypes (covariance).
//! - A raw reference to a generic class erases every generic supertype on
//!   the way up (`ArrayList` raw implements raw `List`).
//!
//! ## Strict assignability
//!
//! `is_assignable_from(to, from, antisymmetric)` follows Java's rules, except
//! that with `antisymmetric = true` a raw source is not assignable to a
//! parameterized target. That keeps the relation a partial order on concrete
//! types, which strategy tie-breaking needs.

use crate::def::{ClassId, ClassTable, well_known};
use crate::types::{TypeExpr, TypeVar};
use rustc_hash::FxHashMap;
use tracing::debug;
use typecodec_common::{DepthCounter, RecursionProfile};

impl TypeExpr {
    /// Find how `self` implements `target`.
    ///
    /// Returns `target` itself (raw) when `self` only implements it raw, a
    /// parameterized type with raw class `target` otherwise, or `None` when
    /// `target` is not a supertype.
    pub fn find_parameterization(&self, table: &ClassTable, target: &TypeExpr) -> Option<TypeExpr> {
        let mut depth = DepthCounter::with_profile(RecursionProfile::TypeHierarchy);
        let result = find_parameterization_inner(table, self, target, &mut depth);
        if depth.is_exceeded() {
            debug!(
                target: "typecodec::types",
                on = %self.display(table),
                target_type = %target.display(table),
                "find_parameterization: hierarchy depth exceeded"
            );
        }
        result
    }

    /// Whether a value of type `from` may be used where `self` is expected.
    ///
    /// Variables and wildcards are not materialized types and are never
    /// assignable targets.
    pub fn is_assignable_from(&self, table: &ClassTable, from: &TypeExpr, antisymmetric: bool) -> bool {
        match self {
            TypeExpr::Raw(_) => from.find_parameterization(table, self).is_some(),
            TypeExpr::Array(component) => match from {
                TypeExpr::Array(from_component) => {
                    component.is_assignable_from(table, from_component, antisymmetric)
                }
                _ => false,
            },
            TypeExpr::Parameterized(to) => {
                let Some(found) = from.find_parameterization(table, &TypeExpr::Raw(to.raw)) else {
                    return false;
                };
                let from_p = match &found {
                    // Raw -> parameterized is allowed by Java, but would make
                    // `List` and `List<String>` mutually assignable.
                    TypeExpr::Raw(_) => return !antisymmetric,
                    TypeExpr::Parameterized(p) => p,
                    _ => return false,
                };
                if let Some(to_outer) = &to.outer {
                    if table.is_inner_class(to.raw) {
                        match &from_p.outer {
                            Some(from_outer)
                                if to_outer.is_assignable_from(table, from_outer, antisymmetric) => {}
                            _ => return false,
                        }
                    }
                }
                if to.params.len() != from_p.params.len() {
                    return false;
                }
                to.params.iter().zip(from_p.params.iter()).all(|(to_arg, from_arg)| match to_arg {
                    TypeExpr::Wildcard(_) => to_arg.wildcard_contains(table, from_arg, antisymmetric),
                    _ => to_arg == from_arg,
                })
            }
            TypeExpr::Variable(_) | TypeExpr::Wildcard(_) => false,
        }
    }

    /// For a wildcard `self`: whether `ty` lies within its bounds. Every
    /// upper bound must accept `ty`, and `ty` must accept every lower bound.
    pub fn wildcard_contains(&self, table: &ClassTable, ty: &TypeExpr, antisymmetric: bool) -> bool {
        let TypeExpr::Wildcard(w) = self else {
            return false;
        };
        w.upper
            .iter()
            .all(|upper| upper.is_assignable_from(table, ty, antisymmetric))
            && w.lower
                .iter()
                .all(|lower| ty.is_assignable_from(table, lower, antisymmetric))
    }
}

fn find_parameterization_inner(
    table: &ClassTable,
    on: &TypeExpr,
    target: &TypeExpr,
    depth: &mut DepthCounter,
) -> Option<TypeExpr> {
    if !depth.enter() {
        return None;
    }
    let result = match on {
        TypeExpr::Raw(id) => {
            if on == target {
                Some(target.clone())
            } else if let TypeExpr::Raw(target_id) = target {
                walk_supertypes(table, *id, *target_id, depth, &mut |_| None)
            } else {
                None
            }
        }
        TypeExpr::Array(component) => match target {
            TypeExpr::Raw(id)
                if matches!(
                    *id,
                    well_known::OBJECT | well_known::CLONEABLE | well_known::SERIALIZABLE
                ) =>
            {
                Some(target.clone())
            }
            TypeExpr::Array(target_component) => {
                find_parameterization_inner(table, component, target_component, depth)
                    .map(TypeExpr::array)
            }
            _ => None,
        },
        TypeExpr::Parameterized(p) => match target {
            TypeExpr::Raw(target_id) if *target_id == p.raw => Some(on.clone()),
            TypeExpr::Raw(target_id) => {
                let mut bindings = FxHashMap::default();
                collect_bindings(table, on, &mut bindings);
                walk_supertypes(table, p.raw, *target_id, depth, &mut |var| {
                    bindings.get(var).cloned()
                })
            }
            _ => None,
        },
        TypeExpr::Variable(var) => table
            .variable_bounds(var)
            .iter()
            .find_map(|bound| find_parameterization_inner(table, bound, target, depth)),
        TypeExpr::Wildcard(w) => w
            .upper
            .iter()
            .find_map(|bound| find_parameterization_inner(table, bound, target, depth)),
    };
    depth.leave();
    result
}

/// Walk the declared supertypes of `class` looking for `target`, folding
/// each declared supertype through `lookup` first.
fn walk_supertypes(
    table: &ClassTable,
    class: ClassId,
    target: ClassId,
    depth: &mut DepthCounter,
    lookup: &mut dyn FnMut(&TypeVar) -> Option<TypeExpr>,
) -> Option<TypeExpr> {
    if target == well_known::OBJECT && !table.is_primitive(class) {
        return Some(TypeExpr::Raw(well_known::OBJECT));
    }
    let decl = table.class(class);
    let target_type = TypeExpr::Raw(target);
    if table.is_interface(target) {
        for itf in &decl.interfaces {
            let Some(folded) = itf.fold_type_variables_eager(table, &mut *lookup) else {
                continue;
            };
            if let Some(found) = find_parameterization_inner(table, &folded, &target_type, depth) {
                return Some(found);
            }
        }
    }
    let supertype = decl.supertype.as_ref()?;
    let folded = supertype.fold_type_variables_eager(table, &mut *lookup)?;
    find_parameterization_inner(table, &folded, &target_type, depth)
}

/// Map the class variables of `ty` (and of its outer types) to its
/// arguments.
fn collect_bindings(table: &ClassTable, ty: &TypeExpr, out: &mut FxHashMap<TypeVar, TypeExpr>) {
    let TypeExpr::Parameterized(p) = ty else {
        return;
    };
    for (var, arg) in table.type_variables(p.raw).into_iter().zip(p.params.iter()) {
        out.insert(var, arg.clone());
    }
    if let Some(outer) = &p.outer {
        collect_bindings(table, outer, out);
    }
}

#[cfg(test)]
#[path = "../tests/hierarchy_tests.rs"]
mod hierarchy_tests;
