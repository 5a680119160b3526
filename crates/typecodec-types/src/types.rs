//! Type expressions.
//!
//! A [`TypeExpr`] is an immutable tree describing a (possibly generic) type.
//! Children are shared through `Arc`, so cloning a type is cheap and folding
//! only rebuilds the spine that changes.
//!
//! | Variant | Java form | Notes |
//! |---------|-----------|-------|
//! | `Raw` | `String`, `int`, raw `List` | nominal identity |
//! | `Array` | `T[]` | component is never a wildcard |
//! | `Parameterized` | `Map<K, V>`, `Outer<A>.Inner<B>` | `outer` only for inner classes |
//! | `Variable` | `T` | identity is `(owner, name)` |
//! | `Wildcard` | `? extends A`, `? super B` | only as a type argument |
//!
//! Type variables carry no bounds. Bounds may mention the variable itself
//! (`T extends Comparable<T>`), so they are read from the declaring element
//! through the [`ClassTable`] instead of being stored in the tree.

use crate::def::{ClassId, ClassTable, Name, well_known};
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// Where a type variable is declared.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VarOwner {
    Class(ClassId),
    Method { class: ClassId, method: Name },
}

/// A type variable, identified by its declaring element and name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeVar {
    pub owner: VarOwner,
    pub name: Name,
}

impl TypeVar {
    pub fn new(owner: VarOwner, name: &str) -> Self {
        Self {
            owner,
            name: Name::from(name),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParameterizedType {
    /// Present only when `raw` is an inner (non-static nested) class.
    pub outer: Option<TypeExpr>,
    pub raw: ClassId,
    pub params: SmallVec<[TypeExpr; 2]>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct WildcardType {
    /// Never empty; an unbounded wildcard has `Object` as its upper bound.
    pub upper: SmallVec<[TypeExpr; 1]>,
    pub lower: SmallVec<[TypeExpr; 1]>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    Raw(ClassId),
    Array(Arc<TypeExpr>),
    Parameterized(Arc<ParameterizedType>),
    Variable(TypeVar),
    Wildcard(Arc<WildcardType>),
}

impl TypeExpr {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    pub fn raw(id: ClassId) -> Self {
        Self::Raw(id)
    }

    /// Array of `component`.
    ///
    /// A wildcard component is not a type; callers never produce one.
    pub fn array(component: TypeExpr) -> Self {
        debug_assert!(
            !matches!(component, TypeExpr::Wildcard(_)),
            "cannot create an array of a wildcard type"
        );
        Self::Array(Arc::new(component))
    }

    pub fn parameterized(raw: ClassId, params: Vec<TypeExpr>) -> Self {
        Self::Parameterized(Arc::new(ParameterizedType {
            outer: None,
            raw,
            params: params.into(),
        }))
    }

    /// `Outer<..>.Inner<..>` for an inner class.
    pub fn inner(outer: TypeExpr, raw: ClassId, params: Vec<TypeExpr>) -> Self {
        Self::Parameterized(Arc::new(ParameterizedType {
            outer: Some(outer),
            raw,
            params: params.into(),
        }))
    }

    pub fn variable(owner: VarOwner, name: &str) -> Self {
        Self::Variable(TypeVar::new(owner, name))
    }

    pub fn wildcard(upper: Vec<TypeExpr>, lower: Vec<TypeExpr>) -> Self {
        let upper: SmallVec<[TypeExpr; 1]> = if upper.is_empty() {
            smallvec::smallvec![TypeExpr::Raw(well_known::OBJECT)]
        } else {
            upper.into()
        };
        Self::Wildcard(Arc::new(WildcardType {
            upper,
            lower: lower.into(),
        }))
    }

    /// `?`
    pub fn unbounded_wildcard() -> Self {
        Self::wildcard(Vec::new(), Vec::new())
    }

    /// `? extends bound`
    pub fn extends(bound: TypeExpr) -> Self {
        Self::wildcard(vec![bound], Vec::new())
    }

    /// `? super bound`
    pub fn super_of(bound: TypeExpr) -> Self {
        Self::wildcard(Vec::new(), vec![bound])
    }

    // -------------------------------------------------------------------------
    // Shape queries
    // -------------------------------------------------------------------------

    /// The nominal class of a `Raw` or `Parameterized` type.
    pub fn class_id(&self) -> Option<ClassId> {
        match self {
            TypeExpr::Raw(id) => Some(*id),
            TypeExpr::Parameterized(p) => Some(p.raw),
            _ => None,
        }
    }

    /// Type arguments of a `Parameterized` type; empty otherwise.
    pub fn params(&self) -> &[TypeExpr] {
        match self {
            TypeExpr::Parameterized(p) => &p.params,
            _ => &[],
        }
    }

    pub fn component(&self) -> Option<&TypeExpr> {
        match self {
            TypeExpr::Array(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, TypeExpr::Raw(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeExpr::Array(_))
    }

    pub fn is_primitive(&self, table: &ClassTable) -> bool {
        matches!(self, TypeExpr::Raw(id) if table.is_primitive(*id))
    }

    /// Render with fully qualified names.
    pub fn display<'a>(&'a self, table: &'a ClassTable) -> TypeDisplay<'a> {
        TypeDisplay { ty: self, table }
    }
}

// =============================================================================
// Formatting
// =============================================================================

/// Java-like rendering of a type: `java.util.List<? extends T>`, `int[]`.
pub struct TypeDisplay<'a> {
    ty: &'a TypeExpr,
    table: &'a ClassTable,
}

impl TypeDisplay<'_> {
    fn write(&self, f: &mut fmt::Formatter<'_>, ty: &TypeExpr) -> fmt::Result {
        match ty {
            TypeExpr::Raw(id) => f.write_str(self.table.name(*id)),
            TypeExpr::Array(component) => {
                self.write(f, component)?;
                f.write_str("[]")
            }
            TypeExpr::Parameterized(p) => {
                match &p.outer {
                    Some(outer) => {
                        self.write(f, outer)?;
                        write!(f, ".{}", self.table.class(p.raw).simple_name())?;
                    }
                    None => f.write_str(self.table.name(p.raw))?,
                }
                if !p.params.is_empty() {
                    f.write_str("<")?;
                    for (i, param) in p.params.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        self.write(f, param)?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            TypeExpr::Variable(var) => f.write_str(&var.name),
            TypeExpr::Wildcard(w) => {
                f.write_str("?")?;
                let only_object =
                    w.upper.len() == 1 && w.upper[0] == TypeExpr::Raw(well_known::OBJECT);
                if !only_object {
                    for (i, bound) in w.upper.iter().enumerate() {
                        f.write_str(if i == 0 { " extends " } else { " & " })?;
                        self.write(f, bound)?;
                    }
                }
                for (i, bound) in w.lower.iter().enumerate() {
                    f.write_str(if i == 0 { " super " } else { " & " })?;
                    self.write(f, bound)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f, self.ty)
    }
}

#[cfg(test)]
#[path = "../tests/types_tests.rs"]
mod types_tests;
