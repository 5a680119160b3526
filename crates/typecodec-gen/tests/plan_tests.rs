use super::*;

fn names(names: &[&str]) -> Vec<Name> {
    names.iter().map(|n| Name::from(*n)).collect()
}

#[test]
fn test_scalar_kind_of_class() {
    assert_eq!(ScalarKind::of_class(well_known::INT), Some(ScalarKind::Int));
    assert_eq!(ScalarKind::of_class(well_known::INTEGER), Some(ScalarKind::Int));
    assert_eq!(ScalarKind::of_class(well_known::CHAR_SEQUENCE), Some(ScalarKind::String));
    assert_eq!(ScalarKind::of_class(well_known::LIST), None);
    assert_eq!(ScalarKind::Long.zero(), Value::Long(0));
    assert_eq!(ScalarKind::String.zero(), Value::Null);
}

#[test]
fn test_block_append_keeps_order() {
    let mut block = Block::of(Stmt::Break);
    block.append(Block::from(vec![Stmt::EncodeNull(Local(0)), Stmt::Break]));
    assert_eq!(block.len(), 3);
    assert_eq!(block.stmts[1], Stmt::EncodeNull(Local(0)));
    assert!(Block::new().is_empty());
}

#[test]
fn test_unknown_local_renders_placeholder() {
    let plan = Plan {
        kind: PlanKind::Decode,
        params: vec![Local(0)],
        body: Block::new(),
        locals: names(&["decoder"]),
    };
    assert_eq!(plan.local_name(Local(0)), "decoder");
    assert_eq!(plan.local_name(Local(7)), "?");
}

#[test]
fn test_render_encode_plan() {
    let plan = Plan {
        kind: PlanKind::Encode,
        params: vec![Local(0), Local(1)],
        body: Block::of(Stmt::If {
            cond: Expr::Local(Local(1)).is_null(),
            then: Block::of(Stmt::EncodeNull(Local(0))),
            otherwise: Block::from(vec![
                Stmt::OpenEncoder {
                    child: Local(2),
                    parent: Local(0),
                    kind: StructureKind::Object,
                },
                Stmt::EncodeKey {
                    encoder: Local(2),
                    key: Expr::string("x"),
                },
                Stmt::Encode {
                    encoder: Local(2),
                    kind: ScalarKind::Int,
                    value: Expr::GetField {
                        target: Box::new(Expr::Local(Local(1))),
                        field: Name::from("x"),
                    },
                },
                Stmt::FinishEncoder(Local(2)),
            ]),
        }),
        locals: names(&["encoder", "value", "objectEncoder"]),
    };
    let expected = "\
encode(encoder, value) {
    if (value == null) {
        encoder.encodeNull();
    } else {
        objectEncoder = encoder.encodeObject();
        objectEncoder.encodeKey(\"x\");
        objectEncoder.encodeInt(value.x);
        objectEncoder.finishStructure();
    }
}
";
    assert_eq!(plan.display().to_string(), expected);
}

#[test]
fn test_render_parse_loop_with_failures() {
    let decoder = Local(0);
    let object = Local(1);
    let key = Local(2);
    let mask = Local(3);
    let plan = Plan {
        kind: PlanKind::Decode,
        params: vec![decoder],
        body: Block::from(vec![
            Stmt::Let {
                local: mask,
                value: Expr::Const(Value::Long(0)),
            },
            Stmt::OpenDecoder {
                child: object,
                parent: decoder,
                kind: StructureKind::Object,
            },
            Stmt::Loop(Block::from(vec![
                Stmt::Let {
                    local: key,
                    value: Expr::DecodeKey(object),
                },
                Stmt::If {
                    cond: Expr::Local(key).is_null(),
                    then: Block::of(Stmt::Break),
                    otherwise: Block::new(),
                },
                Stmt::Switch {
                    on: Expr::Local(key),
                    cases: vec![SwitchCase {
                        labels: names(&["id", "ident"]),
                        body: Block::of(Stmt::SetBits { mask, bits: 1 }),
                    }],
                    default: Block::of(Stmt::Fail(Failure::UnknownProperty {
                        type_name: "com.example.Item".into(),
                        key,
                    })),
                },
            ])),
            Stmt::If {
                cond: Expr::AllBits { mask, bits: 1 }.not(),
                then: Block::of(Stmt::Fail(Failure::MissingProperty { name: "id".into() })),
                otherwise: Block::new(),
            },
            Stmt::Return(Expr::Construct {
                class: "com.example.Item".into(),
                creator: CreatorCall::Factory { method: "of".into() },
                args: vec![("id".into(), Expr::Const(Value::Int(1)))],
            }),
        ]),
        locals: names(&["decoder", "objectDecoder", "key", "readProperties"]),
    };
    let expected = "\
decode(decoder) {
    readProperties = 0L;
    objectDecoder = decoder.decodeObject();
    while (true) {
        key = objectDecoder.decodeKey();
        if (key == null) {
            break;
        }
        switch (key) {
            case \"id\":
            case \"ident\":
                readProperties |= 0x1;
            default:
                throw parseError(\"Unknown property for type com.example.Item: \" + key);
        }
    }
    if (!((readProperties & 0x1) == 0x1)) {
        throw parseError(\"Missing property id\");
    }
    return com.example.Item.of(1);
}
";
    assert_eq!(plan.display().to_string(), expected);
}

#[test]
fn test_render_boolean_combinators() {
    let plan = Plan {
        kind: PlanKind::Decode,
        params: vec![Local(0)],
        body: Block::from(vec![
            Stmt::If {
                cond: Expr::And(vec![]),
                then: Block::new(),
                otherwise: Block::new(),
            },
            Stmt::If {
                cond: Expr::Or(vec![
                    Expr::MultipleBits(vec![Local(1), Local(2)]),
                    Expr::AnyBits { mask: Local(1), bits: 6 },
                ]),
                then: Block::of(Stmt::Fail(Failure::AmbiguousType)),
                otherwise: Block::new(),
            },
        ]),
        locals: names(&["decoder", "possibleTypes", "possibleTypes1"]),
    };
    let text = plan.display().to_string();
    assert!(text.contains("if (true) {"), "{text}");
    assert!(
        text.contains("if ((Long.bitCount(possibleTypes) + Long.bitCount(possibleTypes1) > 1) || ((possibleTypes & 0x6) != 0)) {"),
        "{text}"
    );
    assert!(text.contains("throw parseError(\"Ambiguous type\");"), "{text}");
}
