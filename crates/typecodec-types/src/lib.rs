//! Generic type algebra for the typecodec generator.
//!
//! This crate models Java-style generic types and answers the questions the
//! codec generator needs:
//!
//! - **Element model** (`ClassTable`): declared classes, members and
//!   annotations, as handed over by the front end
//! - **Type expressions** (`TypeExpr`): raw, array, parameterized, variable
//!   and wildcard types, with fold/erasure/free-variable operations
//! - **Hierarchy queries**: `find_parameterization` and strict or Java-rule
//!   assignability
//! - **Inference**: exact, covariant and contravariant unification of a
//!   generic pattern against a concrete type
//!
//! All operations are pure; nothing here is mutated after construction.
pub mod annotations;
pub mod def;
mod fold;
mod hierarchy;
pub mod infer;
pub mod signature;
pub mod types;

pub use annotations::{
    ClassAnnotations, Inclusion, MemberAnnotations, SubtypeDecl, SubtypeInfo, SubtypeShape,
};
pub use def::{
    ClassDecl, ClassId, ClassKind, ClassTable, FieldElement, MethodElement, Modifiers, Name,
    ParameterElement, TypeParamDecl, well_known,
};
pub use infer::{
    InferenceError, Substitution, infer_contravariant, infer_covariant, infer_exact,
    try_infer_contravariant, try_infer_covariant, try_infer_exact,
};
pub use signature::{SignatureError, parse_type, parse_type_in};
pub use types::{ParameterizedType, TypeDisplay, TypeExpr, TypeVar, VarOwner, WildcardType};

#[cfg(test)]
#[path = "../tests/type_law_tests.rs"]
mod type_law_tests;
