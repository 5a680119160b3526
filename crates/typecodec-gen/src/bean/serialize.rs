//! Bean serialization plans.

use super::definition::{BeanDefinition, Subtyping};
use super::introspect::introspect;
use crate::context::GeneratorContext;
use crate::linker::Direction;
use crate::plan::{Block, Expr, Failure, Local, ScalarKind, Stmt, StructureKind};
use tracing::trace;
use typecodec_common::ProblemCode;
use typecodec_types::{SubtypeShape, TypeExpr};

pub(crate) fn serialize_bean(ctx: &mut GeneratorContext<'_>, ty: &TypeExpr, encoder: Local, value: Expr) -> Block {
    let table = ctx.table();
    let config = ctx.config();
    let Some(def) = introspect(table, config, ty, Direction::Serialize, ctx.problems_mut()) else {
        let message = format!("{} is not a bean", ty.display(table));
        ctx.fail(ProblemCode::UnsupportedType, message.clone());
        return Block::of(Stmt::Fail(Failure::Unsupported { message }));
    };
    let bean = ctx.new_local("bean");
    let mut out = Block::of(Stmt::Let { local: bean, value });
    match &def.subtyping {
        Some(subtyping) => out.append(serialize_subtypes(ctx, &def, subtyping, encoder, bean)),
        None => out.append(serialize_definition(ctx, &def, encoder, bean)),
    }
    out
}

/// The value property if there is one, otherwise an object of all
/// properties.
fn serialize_definition(ctx: &mut GeneratorContext<'_>, def: &BeanDefinition, encoder: Local, bean: Local) -> Block {
    if let Some(prop) = &def.value_prop {
        let symbol = prop.symbol(ctx.linker());
        let read = prop.read(Expr::Local(bean));
        return ctx.with_sub_path(&prop.member, |ctx| symbol.serialize(ctx, &prop.ty, encoder, read));
    }
    let object = ctx.new_local("objectEncoder");
    let mut out = Block::of(Stmt::OpenEncoder {
        child: object,
        parent: encoder,
        kind: StructureKind::Object,
    });
    out.append(write_properties(ctx, def, object, bean, 0));
    out.push(Stmt::FinishEncoder(object));
    out
}

/// Key and value of every property of `def`, read from `bean`.
/// Unwrapped properties write their nested properties into `object`.
fn write_properties(
    ctx: &mut GeneratorContext<'_>,
    def: &BeanDefinition,
    object: Local,
    bean: Local,
    depth: u32,
) -> Block {
    let mut out = Block::new();
    for prop in &def.props {
        let read = prop.read(Expr::Local(bean));
        if prop.unwrapped {
            let table = ctx.table();
            let config = ctx.config();
            let nested_def = match introspect(table, config, &prop.ty, Direction::Serialize, ctx.problems_mut()) {
                Some(nested) if depth < typecodec_common::limits::MAX_DEPENDENCY_DEPTH => nested,
                _ => continue,
            };
            let nested = ctx.new_local(&prop.member);
            let inner = ctx.with_sub_path(&prop.member, |ctx| {
                write_properties(ctx, &nested_def, object, nested, depth + 1)
            });
            out.push(Stmt::Let {
                local: nested,
                value: read,
            });
            out.push(Stmt::If {
                cond: Expr::Local(nested).is_null().not(),
                then: inner,
                otherwise: Block::new(),
            });
            continue;
        }

        let symbol = prop.symbol(ctx.linker());
        trace!(target: "typecodec::planner", member = %prop.member, ?symbol, "serialize property");
        let (body, condition) = ctx.with_sub_path(&prop.member, |ctx| {
            let mut body = Block::of(Stmt::EncodeKey {
                encoder: object,
                key: Expr::string(&prop.name),
            });
            body.append(symbol.serialize(ctx, &prop.ty, object, read.clone()));
            let condition = symbol.should_include(ctx, &prop.ty, prop.inclusion).build(&read);
            (body, condition)
        });
        match condition {
            Some(cond) => out.push(Stmt::If {
                cond,
                then: body,
                otherwise: Block::new(),
            }),
            None => out.append(body),
        }
    }
    out
}

/// Dispatch on the runtime class of `bean` and write the tag in the
/// configured shape. A subtype that was not declared is an error.
fn serialize_subtypes(
    ctx: &mut GeneratorContext<'_>,
    def: &BeanDefinition,
    subtyping: &Subtyping,
    encoder: Local,
    bean: Local,
) -> Block {
    let table = ctx.table();
    let config = ctx.config();
    let mut chain = Block::of(Stmt::Fail(Failure::UnknownSubtype {
        type_name: def.class_name.to_string(),
    }));
    for sub in subtyping.subtypes.iter().rev() {
        let Some(sub_def) = introspect(table, config, &sub.ty, Direction::Serialize, ctx.problems_mut()) else {
            continue;
        };
        let tag = sub.names.first().map(|name| name.to_string()).unwrap_or_default();
        let segment = table.class(sub.class).simple_name().to_owned();
        let body = ctx.with_sub_path(&segment, |ctx| match subtyping.shape {
            SubtypeShape::WrapperObject => {
                let wrapper = ctx.new_local("wrapperEncoder");
                let mut body = Block::from(vec![
                    Stmt::OpenEncoder {
                        child: wrapper,
                        parent: encoder,
                        kind: StructureKind::Object,
                    },
                    Stmt::EncodeKey {
                        encoder: wrapper,
                        key: Expr::string(&tag),
                    },
                ]);
                body.append(serialize_definition(ctx, &sub_def, wrapper, bean));
                body.push(Stmt::FinishEncoder(wrapper));
                body
            }
            SubtypeShape::WrapperArray => {
                let wrapper = ctx.new_local("wrapperEncoder");
                let mut body = Block::from(vec![
                    Stmt::OpenEncoder {
                        child: wrapper,
                        parent: encoder,
                        kind: StructureKind::Array,
                    },
                    Stmt::Encode {
                        encoder: wrapper,
                        kind: ScalarKind::String,
                        value: Expr::string(&tag),
                    },
                ]);
                body.append(serialize_definition(ctx, &sub_def, wrapper, bean));
                body.push(Stmt::FinishEncoder(wrapper));
                body
            }
            SubtypeShape::Property => {
                let object = ctx.new_local("objectEncoder");
                let mut body = Block::from(vec![
                    Stmt::OpenEncoder {
                        child: object,
                        parent: encoder,
                        kind: StructureKind::Object,
                    },
                    Stmt::EncodeKey {
                        encoder: object,
                        key: Expr::string(&subtyping.property),
                    },
                    Stmt::Encode {
                        encoder: object,
                        kind: ScalarKind::String,
                        value: Expr::string(&tag),
                    },
                ]);
                body.append(write_properties(ctx, &sub_def, object, bean, 0));
                body.push(Stmt::FinishEncoder(object));
                body
            }
            SubtypeShape::Deduction => serialize_definition(ctx, &sub_def, encoder, bean),
        });
        chain = Block::of(Stmt::If {
            cond: Expr::InstanceOf {
                value: Box::new(Expr::Local(bean)),
                class: sub_def.class_name.clone(),
            },
            then: body,
            otherwise: chain,
        });
    }
    chain
}
