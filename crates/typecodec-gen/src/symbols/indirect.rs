//! Strategies that wrap or defer to another codec: `Optional`, the null
//! guard and injected codecs.

use super::{Setter, Symbol};
use crate::context::GeneratorContext;
use crate::linker::{Direction, Linker, capture_wildcards};
use crate::plan::{Block, Expr, Local, Stmt};
use typecodec_runtime::Value;
use typecodec_types::{TypeExpr, well_known};

pub(super) fn optional_inner(ty: &TypeExpr) -> TypeExpr {
    ty.params()
        .first()
        .map(capture_wildcards)
        .unwrap_or(TypeExpr::Raw(well_known::OBJECT))
}

pub(super) fn optional_symbol(linker: &Linker<'_>, inner: &TypeExpr, recursive: bool) -> Symbol {
    let symbol = linker.find_symbol(inner);
    if recursive {
        symbol.with_recursive_serialization()
    } else {
        symbol
    }
}

// =============================================================================
// Optional
// =============================================================================

pub(super) fn serialize_optional(
    ctx: &mut GeneratorContext<'_>,
    ty: &TypeExpr,
    encoder: Local,
    value: Expr,
    recursive: bool,
) -> Block {
    let inner = optional_inner(ty);
    let symbol = optional_symbol(ctx.linker(), &inner, recursive);
    let optional = ctx.new_local("optional");
    let present = symbol.serialize(ctx, &inner, encoder, Expr::OptionalGet(Box::new(Expr::Local(optional))));
    Block::from(vec![
        Stmt::Let {
            local: optional,
            value,
        },
        Stmt::If {
            cond: Expr::IsPresent(Box::new(Expr::Local(optional))),
            then: present,
            otherwise: Block::of(Stmt::EncodeNull(encoder)),
        },
    ])
}

pub(super) fn deserialize_optional(
    ctx: &mut GeneratorContext<'_>,
    ty: &TypeExpr,
    decoder: Local,
    setter: Setter<'_>,
    recursive: bool,
) -> Block {
    let inner = optional_inner(ty);
    let symbol = optional_symbol(ctx.linker(), &inner, recursive);
    let optional = ctx.new_local("optional");
    let read = symbol.deserialize(
        ctx,
        &inner,
        decoder,
        Box::new(move |value| {
            Block::of(Stmt::Let {
                local: optional,
                value: Expr::Present(Box::new(value)),
            })
        }),
    );
    let mut out = Block::from(vec![
        Stmt::Let {
            local: optional,
            value: Expr::EmptyOptional,
        },
        Stmt::If {
            cond: Expr::DecodeNull(decoder).not(),
            then: read,
            otherwise: Block::new(),
        },
    ]);
    out.append(setter(Expr::Local(optional)));
    out
}

// =============================================================================
// Null guard
// =============================================================================

pub(super) fn serialize_nullable(
    ctx: &mut GeneratorContext<'_>,
    inner: &Symbol,
    ty: &TypeExpr,
    encoder: Local,
    value: Expr,
) -> Block {
    let checked = ctx.new_local("nullable");
    let not_null = inner.serialize(ctx, ty, encoder, Expr::Local(checked));
    Block::from(vec![
        Stmt::Let { local: checked, value },
        Stmt::If {
            cond: Expr::Local(checked).is_null(),
            then: Block::of(Stmt::EncodeNull(encoder)),
            otherwise: not_null,
        },
    ])
}

pub(super) fn deserialize_nullable(
    ctx: &mut GeneratorContext<'_>,
    inner: &Symbol,
    ty: &TypeExpr,
    decoder: Local,
    setter: Setter<'_>,
) -> Block {
    let decoded = ctx.new_local("nullable");
    let read = inner.deserialize(
        ctx,
        ty,
        decoder,
        Box::new(move |value| Block::of(Stmt::Let { local: decoded, value })),
    );
    let mut out = Block::from(vec![
        Stmt::Let {
            local: decoded,
            value: Expr::Const(Value::Null),
        },
        Stmt::If {
            cond: Expr::DecodeNull(decoder).not(),
            then: read,
            otherwise: Block::new(),
        },
    ]);
    out.append(setter(Expr::Local(decoded)));
    out
}

// =============================================================================
// Injected
// =============================================================================

pub(super) fn serialize_injected(
    ctx: &mut GeneratorContext<'_>,
    ty: &TypeExpr,
    encoder: Local,
    value: Expr,
    provider: bool,
) -> Block {
    let injection = ctx.request_injection(ty, Direction::Serialize, provider);
    Block::of(Stmt::EncodeInjected {
        encoder,
        injection,
        value,
    })
}

pub(super) fn deserialize_injected(
    ctx: &mut GeneratorContext<'_>,
    ty: &TypeExpr,
    decoder: Local,
    setter: Setter<'_>,
    provider: bool,
) -> Block {
    let injection = ctx.request_injection(ty, Direction::Deserialize, provider);
    setter(Expr::DecodeInjected { decoder, injection })
}
