//! Iterable, array and string-keyed map strategies.
//!
//! Elements are planned with their own symbol under the `[*]` path segment.
//! Element symbols without null support are wrapped in the null guard, so
//! `[1, null]` decodes for a `List<Integer>`.

use super::{Setter, Symbol};
use crate::context::GeneratorContext;
use crate::linker::{Linker, capture_wildcards};
use crate::plan::{Block, Expr, Local, Stmt, StructureKind};
use typecodec_types::{ClassTable, TypeExpr, well_known};

const ITERABLE_CLASSES: [typecodec_types::ClassId; 5] = [
    well_known::ITERABLE,
    well_known::COLLECTION,
    well_known::LIST,
    well_known::ARRAY_LIST,
    well_known::SET,
];

const MAP_CLASSES: [typecodec_types::ClassId; 3] =
    [well_known::MAP, well_known::HASH_MAP, well_known::LINKED_HASH_MAP];

pub(super) fn is_iterable(ty: &TypeExpr) -> bool {
    match ty {
        TypeExpr::Array(_) => true,
        _ => ty.class_id().is_some_and(|id| ITERABLE_CLASSES.contains(&id)),
    }
}

pub(super) fn is_string_map(table: &ClassTable, ty: &TypeExpr) -> bool {
    if !ty.class_id().is_some_and(|id| MAP_CLASSES.contains(&id)) {
        return false;
    }
    map_arguments(table, ty).is_some_and(|(key, _)| key == TypeExpr::Raw(well_known::STRING))
}

fn map_arguments(table: &ClassTable, ty: &TypeExpr) -> Option<(TypeExpr, TypeExpr)> {
    let map = ty.find_parameterization(table, &TypeExpr::Raw(well_known::MAP))?;
    match map.params() {
        [key, value] => Some((capture_wildcards(key), capture_wildcards(value))),
        _ => None,
    }
}

/// Element type of an array or iterable. Raw iterables hold `Object`.
pub(crate) fn element_type(table: &ClassTable, ty: &TypeExpr) -> TypeExpr {
    if let TypeExpr::Array(component) = ty {
        return (**component).clone();
    }
    ty.find_parameterization(table, &TypeExpr::Raw(well_known::ITERABLE))
        .and_then(|iterable| iterable.params().first().map(capture_wildcards))
        .unwrap_or(TypeExpr::Raw(well_known::OBJECT))
}

pub(super) fn map_value_type(table: &ClassTable, ty: &TypeExpr) -> TypeExpr {
    map_arguments(table, ty)
        .map(|(_, value)| value)
        .unwrap_or(TypeExpr::Raw(well_known::OBJECT))
}

pub(super) fn element_symbol(linker: &Linker<'_>, ty: &TypeExpr, recursive: bool) -> Symbol {
    let mut symbol = linker.find_symbol(ty);
    if recursive {
        symbol = symbol.with_recursive_serialization();
    }
    if ty.is_primitive(linker.table()) {
        symbol
    } else {
        symbol.nullable()
    }
}

// =============================================================================
// Iterable
// =============================================================================

pub(super) fn serialize_iterable(
    ctx: &mut GeneratorContext<'_>,
    ty: &TypeExpr,
    encoder: Local,
    value: Expr,
    recursive: bool,
) -> Block {
    let element = element_type(ctx.table(), ty);
    let symbol = element_symbol(ctx.linker(), &element, recursive);
    let array = ctx.new_local("arrayEncoder");
    let item = ctx.new_local("item");
    let body = ctx.with_sub_path("[*]", |ctx| symbol.serialize(ctx, &element, array, Expr::Local(item)));
    Block::from(vec![
        Stmt::OpenEncoder {
            child: array,
            parent: encoder,
            kind: StructureKind::Array,
        },
        Stmt::ForEach {
            item,
            iterable: value,
            body,
        },
        Stmt::FinishEncoder(array),
    ])
}

pub(super) fn deserialize_iterable(
    ctx: &mut GeneratorContext<'_>,
    ty: &TypeExpr,
    decoder: Local,
    setter: Setter<'_>,
    recursive: bool,
) -> Block {
    let element = element_type(ctx.table(), ty);
    let symbol = element_symbol(ctx.linker(), &element, recursive);
    let distinct = ty.class_id() == Some(well_known::SET);
    let array = ctx.new_local("arrayDecoder");
    let list = ctx.new_local("list");

    let mut loop_body = Block::of(Stmt::If {
        cond: Expr::HasNextArrayValue(array).not(),
        then: Block::of(Stmt::Break),
        otherwise: Block::new(),
    });
    let read = ctx.with_sub_path("[*]", |ctx| {
        symbol.deserialize(
            ctx,
            &element,
            array,
            Box::new(move |value| Block::of(Stmt::Push { list, value, distinct })),
        )
    });
    loop_body.append(read);

    let mut out = Block::from(vec![
        Stmt::OpenDecoder {
            child: array,
            parent: decoder,
            kind: StructureKind::Array,
        },
        Stmt::Let {
            local: list,
            value: Expr::NewList,
        },
        Stmt::Loop(loop_body),
        Stmt::FinishDecoder(array),
    ]);
    out.append(setter(Expr::Local(list)));
    out
}

// =============================================================================
// StringMap
// =============================================================================

pub(super) fn serialize_map(
    ctx: &mut GeneratorContext<'_>,
    ty: &TypeExpr,
    encoder: Local,
    value: Expr,
    recursive: bool,
) -> Block {
    let value_ty = map_value_type(ctx.table(), ty);
    let symbol = element_symbol(ctx.linker(), &value_ty, recursive);
    let object = ctx.new_local("objectEncoder");
    let key = ctx.new_local("key");
    let entry = ctx.new_local("entryValue");

    let mut body = Block::of(Stmt::EncodeKey {
        encoder: object,
        key: Expr::Local(key),
    });
    body.append(ctx.with_sub_path("[*]", |ctx| symbol.serialize(ctx, &value_ty, object, Expr::Local(entry))));
    Block::from(vec![
        Stmt::OpenEncoder {
            child: object,
            parent: encoder,
            kind: StructureKind::Object,
        },
        Stmt::ForEachEntry {
            key,
            value: entry,
            map: value,
            body,
        },
        Stmt::FinishEncoder(object),
    ])
}

pub(super) fn deserialize_map(
    ctx: &mut GeneratorContext<'_>,
    ty: &TypeExpr,
    decoder: Local,
    setter: Setter<'_>,
    recursive: bool,
) -> Block {
    let value_ty = map_value_type(ctx.table(), ty);
    let symbol = element_symbol(ctx.linker(), &value_ty, recursive);
    let object = ctx.new_local("objectDecoder");
    let map = ctx.new_local("map");
    let key = ctx.new_local("key");

    let mut loop_body = Block::from(vec![
        Stmt::Let {
            local: key,
            value: Expr::DecodeKey(object),
        },
        Stmt::If {
            cond: Expr::Local(key).is_null(),
            then: Block::of(Stmt::Break),
            otherwise: Block::new(),
        },
    ]);
    let read = ctx.with_sub_path("[*]", |ctx| {
        symbol.deserialize(
            ctx,
            &value_ty,
            object,
            Box::new(move |value| {
                Block::of(Stmt::Put {
                    map,
                    key: Expr::Local(key),
                    value,
                })
            }),
        )
    });
    loop_body.append(read);

    let mut out = Block::from(vec![
        Stmt::OpenDecoder {
            child: object,
            parent: decoder,
            kind: StructureKind::Object,
        },
        Stmt::Let {
            local: map,
            value: Expr::NewMap,
        },
        Stmt::Loop(loop_body),
        Stmt::FinishDecoder(object),
    ]);
    out.append(setter(Expr::Local(map)));
    out
}
