//! Enum strategy: a string switch over the constants known at generation
//! time, in both directions.
//!
//! A decoded string that is not a constant is a parse error. An encoded
//! constant that is not in the switch was added after generation; the plan
//! fails instead of writing partial output.

use super::Setter;
use crate::context::GeneratorContext;
use crate::plan::{Block, Expr, Failure, Local, ScalarKind, Stmt, SwitchCase};
use typecodec_types::{Name, TypeExpr};

fn constants(ctx: &GeneratorContext<'_>, ty: &TypeExpr) -> (Name, Vec<Name>) {
    match ty.class_id() {
        Some(id) => {
            let decl = ctx.table().class(id);
            (decl.name.clone(), decl.enum_constants.clone())
        }
        None => (Name::from("?"), Vec::new()),
    }
}

pub(super) fn serialize(ctx: &mut GeneratorContext<'_>, ty: &TypeExpr, encoder: Local, value: Expr) -> Block {
    let (class, constants) = constants(ctx, ty);
    let cases = constants
        .into_iter()
        .map(|constant| SwitchCase {
            body: Block::of(Stmt::Encode {
                encoder,
                kind: ScalarKind::String,
                value: Expr::string(&constant),
            }),
            labels: vec![constant],
        })
        .collect();
    Block::of(Stmt::Switch {
        on: Expr::EnumName(Box::new(value)),
        cases,
        default: Block::of(Stmt::Fail(Failure::UnknownEnumConstant { class })),
    })
}

pub(super) fn deserialize(ctx: &mut GeneratorContext<'_>, ty: &TypeExpr, decoder: Local, setter: Setter<'_>) -> Block {
    let (class, constants) = constants(ctx, ty);
    let text = ctx.new_local("enumValue");
    let result = ctx.new_local("enumConstant");
    let cases = constants
        .into_iter()
        .map(|constant| SwitchCase {
            body: Block::of(Stmt::Let {
                local: result,
                value: Expr::EnumConstant {
                    class: class.clone(),
                    constant: constant.clone(),
                },
            }),
            labels: vec![constant],
        })
        .collect();

    let mut out = Block::from(vec![
        Stmt::Let {
            local: text,
            value: Expr::Decode {
                decoder,
                kind: ScalarKind::String,
            },
        },
        Stmt::Switch {
            on: Expr::Local(text),
            cases,
            default: Block::of(Stmt::Fail(Failure::BadEnumValue {
                path: ctx.readable_path(),
                value: text,
            })),
        },
    ]);
    out.append(setter(Expr::Local(result)));
    out
}
