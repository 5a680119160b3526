use super::*;
use crate::fixtures::*;
use crate::plan::{Failure, InjectionId, ScalarKind, Stmt, StructureKind};
use typecodec_runtime::Value;

#[derive(Default)]
struct Recorder {
    elements: Vec<(Symbol, TypeExpr, String)>,
    injected: Vec<(TypeExpr, bool)>,
}

impl DependencyVisitor for Recorder {
    fn visit_structure_element(&mut self, symbol: &Symbol, ty: &TypeExpr, segment: &str) {
        self.elements.push((symbol.clone(), ty.clone(), segment.to_owned()));
    }

    fn visit_injected(&mut self, ty: &TypeExpr, provider: bool) {
        self.injected.push((ty.clone(), provider));
    }
}

fn store(local: Local) -> Setter<'static> {
    Box::new(move |value| Block::of(Stmt::Let { local, value }))
}

// =============================================================================
// Classification
// =============================================================================

#[test]
fn test_nullable_wraps_only_once() {
    assert_eq!(Symbol::Primitive.nullable(), Symbol::Nullable(Box::new(Symbol::Primitive)));
    assert_eq!(Symbol::Primitive.nullable().nullable(), Symbol::Nullable(Box::new(Symbol::Primitive)));
    assert_eq!(
        Symbol::Optional { recursive: false }.nullable(),
        Symbol::Optional { recursive: false }
    );
    assert_eq!(
        Symbol::Injected { provider: false }.nullable(),
        Symbol::Injected { provider: false }
    );
}

#[test]
fn test_recursive_serialization_variants() {
    assert_eq!(Symbol::Bean.with_recursive_serialization(), Symbol::Injected { provider: true });
    assert_eq!(
        Symbol::Iterable { recursive: false }.with_recursive_serialization(),
        Symbol::Iterable { recursive: true }
    );
    assert_eq!(Symbol::String.with_recursive_serialization(), Symbol::String);
    assert_eq!(
        Symbol::Nullable(Box::new(Symbol::Bean)).with_recursive_serialization(),
        Symbol::Injected { provider: true }
    );
}

#[test]
fn test_can_serialize() {
    let mut table = ClassTable::new();
    let color = enumeration(&mut table, "com.example.Color", &["RED"]);
    assert!(Symbol::Enum.can_serialize(&table, &TypeExpr::Raw(color)));
    assert!(!Symbol::Enum.can_serialize(&table, &string()));
    assert!(Symbol::String.can_serialize(&table, &TypeExpr::Raw(well_known::CHAR_SEQUENCE)));
    assert!(!Symbol::Primitive.can_serialize(&table, &string()));
    let int_keys = TypeExpr::parameterized(well_known::MAP, vec![integer(), string()]);
    assert!(!Symbol::StringMap { recursive: false }.can_serialize(&table, &int_keys));
    assert!(Symbol::Injected { provider: false }.can_serialize(&table, &int_keys));
}

#[test]
fn test_default_expressions() {
    let table = ClassTable::new();
    assert_eq!(Symbol::Primitive.default_expr(&table, &int()), Expr::Const(Value::Int(0)));
    assert_eq!(Symbol::Primitive.default_expr(&table, &integer()), Expr::Const(Value::Null));
    assert_eq!(
        Symbol::Optional { recursive: false }.default_expr(&table, &optional_of(int())),
        Expr::EmptyOptional
    );
    assert_eq!(
        Symbol::Iterable { recursive: false }.default_expr(&table, &list_of(int())),
        Expr::Const(Value::Null)
    );
}

// =============================================================================
// Dependencies
// =============================================================================

#[test]
fn test_container_dependencies() {
    let mut table = ClassTable::new();
    let point = bean(&mut table, "com.example.Point", &[("x", int())]);
    let model = Model::new(table);
    let linker = model.linker();

    let mut recorder = Recorder::default();
    Symbol::Iterable { recursive: false }.visit_dependencies(&linker, &TypeExpr::array(int()), &mut recorder);
    Symbol::StringMap { recursive: false }.visit_dependencies(
        &linker,
        &map_of(TypeExpr::Raw(point)),
        &mut recorder,
    );
    Symbol::Optional { recursive: true }.visit_dependencies(&linker, &optional_of(string()), &mut recorder);
    assert_eq!(
        recorder.elements,
        vec![
            (Symbol::Primitive, int(), "[*]".to_owned()),
            (Symbol::Injected { provider: false }, TypeExpr::Raw(point), "[*]".to_owned()),
            (Symbol::String, string(), "[*]".to_owned()),
        ]
    );

    Symbol::Injected { provider: true }.visit_dependencies(&linker, &TypeExpr::Raw(point), &mut recorder);
    assert_eq!(recorder.injected, vec![(TypeExpr::Raw(point), true)]);
}

#[test]
fn test_list_elements_are_nullable() {
    let model = Model::new(ClassTable::new());
    let linker = model.linker();
    let mut recorder = Recorder::default();
    Symbol::Iterable { recursive: false }.visit_dependencies(&linker, &list_of(integer()), &mut recorder);
    assert_eq!(recorder.elements[0].0, Symbol::Nullable(Box::new(Symbol::Primitive)));
}

// =============================================================================
// Statements
// =============================================================================

#[test]
fn test_iterable_deserialize_shape() {
    let model = Model::new(ClassTable::new());
    let linker = model.linker();
    let ty = set_of(string());
    let mut ctx = GeneratorContext::new(&linker, &ty);
    let decoder = ctx.new_local("decoder");
    let out = ctx.new_local("out");
    let block = Symbol::Iterable { recursive: false }.deserialize(&mut ctx, &ty, decoder, store(out));

    let Stmt::OpenDecoder { child, parent, kind } = &block.stmts[0] else {
        panic!("{block:?}");
    };
    assert_eq!((*parent, *kind), (decoder, StructureKind::Array));
    let Stmt::Loop(body) = &block.stmts[2] else {
        panic!("{block:?}");
    };
    assert!(
        body.stmts
            .iter()
            .any(|stmt| matches!(stmt, Stmt::Push { list, distinct: true, .. } if *list != out)),
        "{body:?}"
    );
    assert_eq!(block.stmts[3], Stmt::FinishDecoder(*child));
    assert!(matches!(block.stmts.last(), Some(Stmt::Let { local, .. }) if *local == out));
}

#[test]
fn test_enum_serialize_switches_on_constants() {
    let mut table = ClassTable::new();
    let color = enumeration(&mut table, "com.example.Color", &["RED", "GREEN"]);
    let model = Model::new(table);
    let linker = model.linker();
    let ty = TypeExpr::Raw(color);
    let mut ctx = GeneratorContext::new(&linker, &ty);
    let encoder = ctx.new_local("encoder");
    let value = ctx.new_local("value");
    let block = Symbol::Enum.serialize(&mut ctx, &ty, encoder, Expr::Local(value));

    let [Stmt::Switch { cases, default, .. }] = block.stmts.as_slice() else {
        panic!("{block:?}");
    };
    let labels: Vec<&str> = cases.iter().flat_map(|c| c.labels.iter().map(|l| &**l)).collect();
    assert_eq!(labels, ["RED", "GREEN"]);
    assert_eq!(
        default.stmts,
        vec![Stmt::Fail(Failure::UnknownEnumConstant {
            class: "com.example.Color".into()
        })]
    );
}

#[test]
fn test_injected_requests_are_shared() {
    let mut table = ClassTable::new();
    let point = bean(&mut table, "com.example.Point", &[("x", int())]);
    let model = Model::new(table);
    let linker = model.linker();
    let ty = TypeExpr::Raw(point);
    let mut ctx = GeneratorContext::new(&linker, &ty);
    let encoder = ctx.new_local("encoder");
    let value = ctx.new_local("value");

    let first = Symbol::Injected { provider: false }.serialize(&mut ctx, &ty, encoder, Expr::Local(value));
    let second = Symbol::Injected { provider: true }.serialize(&mut ctx, &ty, encoder, Expr::Local(value));
    assert_eq!(first, second);
    assert_eq!(ctx.injections().len(), 1);
    assert!(ctx.injections()[0].provider);
    assert!(matches!(
        first.stmts[0],
        Stmt::EncodeInjected {
            injection: InjectionId(0),
            ..
        }
    ));
}

#[test]
fn test_scalar_round_statements() {
    let model = Model::new(ClassTable::new());
    let linker = model.linker();
    let ty = TypeExpr::Raw(well_known::CHAR_SEQUENCE);
    let mut ctx = GeneratorContext::new(&linker, &ty);
    let coder = ctx.new_local("coder");
    let out = ctx.new_local("out");

    let written = Symbol::String.serialize(&mut ctx, &ty, coder, Expr::Local(out));
    assert_eq!(
        written.stmts,
        vec![Stmt::Encode {
            encoder: coder,
            kind: ScalarKind::String,
            value: Expr::ToString(Box::new(Expr::Local(out))),
        }]
    );
    let read = Symbol::Primitive.deserialize(&mut ctx, &TypeExpr::Raw(well_known::BOXED_LONG), coder, store(out));
    assert_eq!(
        read.stmts,
        vec![Stmt::Let {
            local: out,
            value: Expr::Decode {
                decoder: coder,
                kind: ScalarKind::Long,
            },
        }]
    );
}

// =============================================================================
// Inclusion
// =============================================================================

#[test]
fn test_inclusion_conditions() {
    let mut table = ClassTable::new();
    let point = bean(&mut table, "com.example.Point", &[("x", int())]);
    let model = Model::new(table);
    let linker = model.linker();
    let ty = TypeExpr::Raw(point);
    let mut ctx = GeneratorContext::new(&linker, &ty);

    assert!(Symbol::String.should_include(&mut ctx, &string(), Inclusion::Always).is_always());
    assert_eq!(
        Symbol::Primitive
            .should_include(&mut ctx, &int(), Inclusion::NonDefault)
            .checks(),
        [Check::NotDefault(Value::Int(0))]
    );
    assert!(Symbol::Primitive.should_include(&mut ctx, &int(), Inclusion::NonEmpty).is_always());
    assert_eq!(
        Symbol::Primitive
            .nullable()
            .should_include(&mut ctx, &integer(), Inclusion::NonNull)
            .checks(),
        [Check::NotNull]
    );
    assert_eq!(
        Symbol::Optional { recursive: false }
            .should_include(&mut ctx, &optional_of(int()), Inclusion::NonAbsent)
            .checks(),
        [Check::NotNull, Check::Present]
    );
    assert_eq!(
        Symbol::Nullable(Box::new(Symbol::Iterable { recursive: false }))
            .should_include(&mut ctx, &list_of(int()), Inclusion::NonEmpty)
            .checks(),
        [Check::NotNull, Check::NotEmpty]
    );

    let condition = Symbol::Injected { provider: false }.should_include(&mut ctx, &ty, Inclusion::NonEmpty);
    assert_eq!(condition.checks(), [Check::NotNull, Check::InjectedNotEmpty(InjectionId(0))]);
    assert_eq!(ctx.injections().len(), 1);
}

#[test]
fn test_condition_build() {
    let value = Expr::Local(Local(0));
    assert_eq!(Condition::always().build(&value), None);
    assert_eq!(
        Condition::always().with(Check::NotNull).build(&value),
        Some(value.clone().is_null().not())
    );
    let both = Condition::always()
        .with(Check::NotEmpty)
        .prepend(Check::NotNull)
        .build(&value);
    assert_eq!(
        both,
        Some(Expr::And(vec![
            value.clone().is_null().not(),
            Expr::IsEmpty(Box::new(value)).not(),
        ]))
    );
}
