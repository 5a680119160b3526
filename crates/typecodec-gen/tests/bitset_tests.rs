use super::*;
use crate::fixtures::*;
use typecodec_types::ClassTable;

fn with_ctx<T>(f: impl FnOnce(&mut GeneratorContext<'_>) -> T) -> T {
    let model = Model::new(ClassTable::new());
    let linker = model.linker();
    let root = string();
    let mut ctx = GeneratorContext::new(&linker, &root);
    f(&mut ctx)
}

#[test]
fn test_offsets_and_words() {
    with_ctx(|ctx| {
        let set = InlineBitSet::new(ctx, "seen", ["a", "b", "a", "c"]);
        assert_eq!(set.len(), 3);
        assert_eq!(set.masks().len(), 1);
        assert_eq!(set.offset(&"c"), Some(2));
        assert_eq!(set.offset(&"z"), None);
        let mask = set.masks()[0];
        assert_eq!(
            set.declarations(true).stmts,
            vec![Stmt::Let {
                local: mask,
                value: Expr::Const(Value::Long(0b111)),
            }]
        );
        assert_eq!(set.set(&"b").stmts, vec![Stmt::SetBits { mask, bits: 0b10 }]);
        assert_eq!(set.is_set(&"c"), Expr::AnyBits { mask, bits: 0b100 });
        assert_eq!(set.is_set(&"z"), Expr::Const(Value::Bool(false)));
        assert_eq!(set.all_set(&["a", "c"]), Expr::AllBits { mask, bits: 0b101 });
    });
}

#[test]
fn test_masks_span_words() {
    with_ctx(|ctx| {
        let set = InlineBitSet::new(ctx, "possibleTypes", 0..70usize);
        let [low, high] = set.masks() else {
            panic!("expected two words");
        };
        let (low, high) = (*low, *high);
        assert_ne!(low, high);
        assert_eq!(
            set.declarations(true).stmts,
            vec![
                Stmt::Let {
                    local: low,
                    value: Expr::Const(Value::Long(-1)),
                },
                Stmt::Let {
                    local: high,
                    value: Expr::Const(Value::Long(0b11_1111)),
                },
            ]
        );
        assert_eq!(
            set.any_set(&[1, 65]),
            Expr::Or(vec![
                Expr::AnyBits { mask: low, bits: 0b10 },
                Expr::AnyBits { mask: high, bits: 0b10 },
            ])
        );
        assert_eq!(
            set.and(&[64]).stmts,
            vec![
                Stmt::KeepBits { mask: low, bits: 0 },
                Stmt::KeepBits { mask: high, bits: 1 },
            ]
        );
        assert_eq!(set.more_than_one(), Expr::MultipleBits(vec![low, high]));
    });
}

#[test]
fn test_empty_set_has_no_masks() {
    with_ctx(|ctx| {
        let set: InlineBitSet<u8> = InlineBitSet::new(ctx, "empty", []);
        assert!(set.is_empty());
        assert!(set.declarations(false).is_empty());
        assert!(set.on_missing(&[], |_| Block::new()).is_empty());
    });
}

#[test]
fn test_duplicate_manager_statements() {
    with_ctx(|ctx| {
        let dup = DuplicatePropertyManager::new(ctx, vec![(0u8, Name::from("id")), (1u8, Name::from("name"))]);
        let declarations = dup.declarations();
        let [Stmt::Let { local: mask, value }] = declarations.stmts.as_slice() else {
            panic!("{declarations:?}");
        };
        assert_eq!(value, &Expr::Const(Value::Long(0)));
        let mask = *mask;

        assert_eq!(
            dup.mark_read(&1).stmts,
            vec![Stmt::If {
                cond: Expr::AnyBits { mask, bits: 0b10 },
                then: Block::of(Stmt::Fail(Failure::DuplicateProperty { name: "name".into() })),
                otherwise: Block::of(Stmt::SetBits { mask, bits: 0b10 }),
            }]
        );
        assert_eq!(dup.has_been_read(&0), Expr::AnyBits { mask, bits: 0b1 });
    });
}

#[test]
fn test_required_check_names_each_property() {
    with_ctx(|ctx| {
        let dup = DuplicatePropertyManager::new(ctx, vec![("x", Name::from("x")), ("y", Name::from("y"))]);
        let block = dup.check_required(&["x", "y"]);
        let [Stmt::If { cond, then, otherwise }] = block.stmts.as_slice() else {
            panic!("{block:?}");
        };
        let mask = dup.declarations().stmts.iter().find_map(|stmt| match stmt {
            Stmt::Let { local, .. } => Some(*local),
            _ => None,
        });
        let mask = mask.unwrap();
        assert_eq!(cond, &Expr::AllBits { mask, bits: 0b11 }.not());
        assert!(otherwise.is_empty());
        let failures: Vec<&Failure> = then
            .stmts
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::If { then, .. } => match then.stmts.as_slice() {
                    [Stmt::Fail(failure)] => Some(failure),
                    _ => None,
                },
                _ => None,
            })
            .collect();
        assert_eq!(
            failures,
            [
                &Failure::MissingProperty { name: "x".into() },
                &Failure::MissingProperty { name: "y".into() },
            ]
        );
        assert!(dup.check_required(&[]).is_empty());
    });
}
