//! Primitive, boxed, big-number and string strategies.

use super::Setter;
use crate::plan::{Block, Expr, Local, ScalarKind, Stmt};
use typecodec_runtime::Value;
use typecodec_types::{ClassTable, TypeExpr, well_known};

fn kind_of(ty: &TypeExpr) -> Option<ScalarKind> {
    match ty {
        TypeExpr::Raw(id) => ScalarKind::of_class(*id),
        _ => None,
    }
}

pub(super) fn is_primitive_like(ty: &TypeExpr) -> bool {
    kind_of(ty).is_some_and(|kind| kind != ScalarKind::String)
}

pub(super) fn is_string(ty: &TypeExpr) -> bool {
    kind_of(ty) == Some(ScalarKind::String)
}

pub(super) fn serialize(ty: &TypeExpr, encoder: Local, value: Expr) -> Block {
    let kind = kind_of(ty).unwrap_or(ScalarKind::String);
    let value = if *ty == TypeExpr::Raw(well_known::CHAR_SEQUENCE) {
        Expr::ToString(Box::new(value))
    } else {
        value
    };
    Block::of(Stmt::Encode { encoder, kind, value })
}

pub(super) fn deserialize(ty: &TypeExpr, decoder: Local, setter: Setter<'_>) -> Block {
    let kind = kind_of(ty).unwrap_or(ScalarKind::String);
    setter(Expr::Decode { decoder, kind })
}

pub(super) fn default_value(table: &ClassTable, ty: &TypeExpr) -> Expr {
    match kind_of(ty) {
        Some(kind) if ty.is_primitive(table) => Expr::Const(kind.zero()),
        _ => Expr::Const(Value::Null),
    }
}
