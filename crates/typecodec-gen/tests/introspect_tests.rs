use super::*;
use crate::fixtures::*;
use typecodec_types::{FieldElement, SubtypeInfo};

fn run(table: &ClassTable, ty: &TypeExpr, direction: Direction) -> (BeanDefinition, Vec<ProblemCode>) {
    let mut problems = ProblemReporter::new();
    let def = introspect(table, GeneratorConfig::default(), ty, direction, &mut problems)
        .unwrap_or_else(|| panic!("{} is not a bean", ty.display(table)));
    let codes = problems.problems().iter().map(|p| p.code).collect();
    (def, codes)
}

fn members(props: &[Property]) -> Vec<&str> {
    props.iter().map(|p| &*p.member).collect()
}

/// `Account` with a private `balance` behind a getter and setter, plus a
/// read-only `isActive()`.
fn account(table: &mut ClassTable) -> ClassId {
    let id = table.declare("com.example.Account", ClassKind::Class);
    let decl = table.class_mut(id);
    decl.annotations.serializable = true;
    decl.fields
        .push(FieldElement::new("balance", long()).with_modifiers(Modifiers::empty()));
    decl.methods = vec![
        MethodElement::new("getBalance", vec![], Some(long())),
        MethodElement::new("setBalance", vec![ParameterElement::new("value", long())], None),
        MethodElement::new("isActive", vec![], Some(TypeExpr::Raw(well_known::BOOLEAN))),
        MethodElement::new("isReady", vec![], Some(string())),
        MethodElement::new("helper", vec![], Some(string())).with_modifiers(Modifiers::empty()),
    ];
    id
}

fn long() -> TypeExpr {
    TypeExpr::Raw(well_known::LONG)
}

#[test]
fn test_non_class_types_are_not_beans() {
    let mut table = ClassTable::new();
    let color = enumeration(&mut table, "com.example.Color", &["RED"]);
    let mut problems = ProblemReporter::new();
    let config = GeneratorConfig::default();
    for ty in [int(), TypeExpr::array(string()), TypeExpr::Raw(color)] {
        assert!(introspect(&table, config, &ty, Direction::Serialize, &mut problems).is_none());
    }
}

#[test]
fn test_accessors_per_direction() {
    let mut table = ClassTable::new();
    let ty = TypeExpr::Raw(account(&mut table));

    let (read, problems) = run(&table, &ty, Direction::Serialize);
    assert!(problems.is_empty());
    assert_eq!(members(&read.props), ["balance", "active"]);
    assert_eq!(
        read.props[0].accessor,
        Accessor::Getter {
            method: "getBalance".into()
        }
    );
    assert!(read.creator.is_none());

    let (write, _) = run(&table, &ty, Direction::Deserialize);
    assert_eq!(members(&write.props), ["balance"]);
    assert_eq!(
        write.props[0].accessor,
        Accessor::Setter {
            method: "setBalance".into()
        }
    );
    assert_eq!(
        write.creator,
        Some(Creator {
            call: CreatorCall::Constructor,
            params: vec![],
        })
    );
}

#[test]
fn test_record_components_form_the_creator() {
    let mut table = ClassTable::new();
    let item = record(
        &mut table,
        "com.example.Item",
        &[("id", int()), ("note", optional_of(string())), ("label", string())],
    );
    let ty = TypeExpr::Raw(item);

    let (def, _) = run(&table, &ty, Direction::Deserialize);
    assert!(def.props.is_empty());
    assert_eq!(members(&def.creator_props), ["id", "note", "label"]);
    let required: Vec<bool> = def.creator_props.iter().map(|p| p.required).collect();
    assert_eq!(required, [true, false, true]);
    assert_eq!(def.creator_props[2].accessor, Accessor::CreatorParam { index: 2 });

    let (read, _) = run(&table, &ty, Direction::Serialize);
    assert_eq!(members(&read.props), ["id", "note", "label"]);
    assert!(read.props.iter().all(|p| p.accessor == Accessor::Field));
}

#[test]
fn test_annotated_constructor_wins() {
    let mut table = ClassTable::new();
    let id = bean(&mut table, "com.example.User", &[("name", string()), ("age", int())]);
    let creator = MemberAnnotations {
        creator: true,
        ..MemberAnnotations::default()
    };
    let decl = table.class_mut(id);
    decl.constructors = vec![
        MethodElement::constructor(vec![]),
        MethodElement::constructor(vec![
            ParameterElement::new("name", string()).with_annotations(MemberAnnotations::named("userName")),
        ])
        .with_annotations(creator),
    ];
    let (def, problems) = run(&table, &TypeExpr::Raw(id), Direction::Deserialize);
    assert!(problems.is_empty(), "{problems:?}");
    assert!(def.delegating_prop.is_none());
    assert_eq!(members(&def.creator_props), ["name"]);
    assert_eq!(&*def.creator_props[0].name, "userName");
    assert_eq!(members(&def.props), ["age"]);
}

#[test]
fn test_single_unnamed_creator_parameter_delegates() {
    let mut table = ClassTable::new();
    let id = bean(&mut table, "com.example.Email", &[]);
    table.class_mut(id).methods = vec![
        MethodElement::new(
            "parse",
            vec![ParameterElement::new("text", string())],
            Some(TypeExpr::Raw(id)),
        )
        .with_modifiers(Modifiers::PUBLIC | Modifiers::STATIC)
        .with_annotations(MemberAnnotations {
            creator: true,
            ..MemberAnnotations::default()
        }),
    ];
    let (def, _) = run(&table, &TypeExpr::Raw(id), Direction::Deserialize);
    assert_eq!(
        def.creator.map(|c| c.call),
        Some(CreatorCall::Factory { method: "parse".into() })
    );
    let delegating = def.delegating_prop.unwrap();
    assert_eq!(&*delegating.member, "text");
    assert!(def.creator_props.is_empty());
}

#[test]
fn test_two_annotated_creators_are_rejected() {
    let mut table = ClassTable::new();
    let id = bean(&mut table, "com.example.Pair", &[("a", int())]);
    let creator = MemberAnnotations {
        creator: true,
        ..MemberAnnotations::default()
    };
    table.class_mut(id).constructors = vec![
        MethodElement::constructor(vec![ParameterElement::new("a", int())]).with_annotations(creator.clone()),
        MethodElement::constructor(vec![]).with_annotations(creator),
    ];
    let (def, problems) = run(&table, &TypeExpr::Raw(id), Direction::Deserialize);
    assert!(def.creator.is_none());
    assert_eq!(problems, [ProblemCode::InvalidAnnotation]);
}

#[test]
fn test_ambiguous_public_constructors_leave_no_creator() {
    let mut table = ClassTable::new();
    let id = bean(&mut table, "com.example.Range", &[("low", int()), ("high", int())]);
    table.class_mut(id).constructors = vec![
        MethodElement::constructor(vec![ParameterElement::new("low", int())]),
        MethodElement::constructor(vec![ParameterElement::new("high", int())]),
    ];
    let (def, _) = run(&table, &TypeExpr::Raw(id), Direction::Deserialize);
    assert!(def.creator.is_none());
}

#[test]
fn test_ignored_members_and_transient_fields() {
    let mut table = ClassTable::new();
    let id = bean(
        &mut table,
        "com.example.Secret",
        &[("visible", int()), ("hidden", int()), ("listed", int())],
    );
    annotate_field(
        &mut table,
        id,
        "hidden",
        MemberAnnotations {
            ignore: true,
            ..MemberAnnotations::default()
        },
    );
    let decl = table.class_mut(id);
    decl.annotations.ignored_properties = vec!["listed".into()];
    decl.fields
        .push(FieldElement::new("cache", int()).with_modifiers(Modifiers::PUBLIC | Modifiers::TRANSIENT));
    decl.fields
        .push(FieldElement::new("COUNT", int()).with_modifiers(Modifiers::PUBLIC | Modifiers::STATIC));

    let (def, _) = run(&table, &TypeExpr::Raw(id), Direction::Serialize);
    assert_eq!(members(&def.props), ["visible"]);
    assert_eq!(def.ignored, vec![Name::from("listed")]);
}

#[test]
fn test_duplicate_wire_names_are_reported() {
    let mut table = ClassTable::new();
    let id = bean(&mut table, "com.example.Clash", &[("a", int()), ("b", int())]);
    annotate_field(&mut table, id, "b", MemberAnnotations::named("a"));
    let (_, problems) = run(&table, &TypeExpr::Raw(id), Direction::Serialize);
    assert_eq!(problems, [ProblemCode::DuplicatePropertyName]);
}

#[test]
fn test_unwrapped_requires_a_bean() {
    let mut table = ClassTable::new();
    let id = bean(&mut table, "com.example.Holder", &[("tags", list_of(string()))]);
    annotate_field(
        &mut table,
        id,
        "tags",
        MemberAnnotations {
            unwrapped: true,
            ..MemberAnnotations::default()
        },
    );
    let (def, problems) = run(&table, &TypeExpr::Raw(id), Direction::Serialize);
    assert_eq!(problems, [ProblemCode::InvalidUnwrapped]);
    assert!(!def.props[0].unwrapped);
}

#[test]
fn test_superclass_members_come_first() {
    let mut table = ClassTable::new();
    let base = bean(&mut table, "com.example.Base", &[("id", long())]);
    let derived = bean(&mut table, "com.example.Derived", &[("name", string())]);
    table.class_mut(derived).supertype = Some(TypeExpr::Raw(base));
    let (def, _) = run(&table, &TypeExpr::Raw(derived), Direction::Serialize);
    assert_eq!(members(&def.props), ["id", "name"]);
}

#[test]
fn test_generic_members_are_bound() {
    let mut table = ClassTable::new();
    let boxed = table.declare("com.example.Box", ClassKind::Class);
    let t = table.add_type_param(boxed, "T", vec![]);
    table.class_mut(boxed).annotations.serializable = true;
    table
        .class_mut(boxed)
        .fields
        .extend([FieldElement::new("value", t.clone()), FieldElement::new("all", list_of(t))]);

    let concrete = TypeExpr::parameterized(boxed, vec![string()]);
    let (def, _) = run(&table, &concrete, Direction::Serialize);
    assert_eq!(def.props[0].ty, string());
    assert_eq!(def.props[1].ty, list_of(string()));

    let (raw, _) = run(&table, &TypeExpr::Raw(boxed), Direction::Serialize);
    assert_eq!(raw.props[0].ty, TypeExpr::Raw(well_known::OBJECT));
}

#[test]
fn test_subtype_names_default_to_type_name_then_simple_name() {
    let mut table = ClassTable::new();
    let shapes = shapes(&mut table, |circle, square| {
        SubtypeInfo::new(SubtypeShape::Property)
            .with_subtype(circle, &[])
            .with_subtype(square, &["sq", "box"])
    });
    table.class_mut(shapes.circle).annotations.type_name = Some("round".into());
    let (def, problems) = run(&table, &TypeExpr::Raw(shapes.shape), Direction::Deserialize);
    assert!(problems.is_empty(), "{problems:?}");
    assert!(def.creator.is_none());
    let subtyping = def.subtyping.unwrap();
    assert_eq!(subtyping.property, Name::from("@type"));
    let names: Vec<Vec<Name>> = subtyping.subtypes.iter().map(|s| s.names.clone()).collect();
    assert_eq!(names, [vec![Name::from("round")], vec![Name::from("sq"), Name::from("box")]]);
}

#[test]
fn test_invalid_subtypes_drop_subtyping() {
    let mut table = ClassTable::new();
    let stranger = bean(&mut table, "com.example.Stranger", &[]);
    let shapes = shapes(&mut table, |circle, square| {
        SubtypeInfo::new(SubtypeShape::WrapperObject)
            .with_subtype(circle, &["c"])
            .with_subtype(stranger, &["s"])
            .with_subtype(square, &["c"])
    });
    let (def, problems) = run(&table, &TypeExpr::Raw(shapes.shape), Direction::Serialize);
    assert!(def.subtyping.is_none());
    assert_eq!(problems, [ProblemCode::InvalidSubtyping, ProblemCode::InvalidSubtyping]);
}

#[test]
fn test_config_defaults_apply() {
    let mut table = ClassTable::new();
    let id = bean(&mut table, "com.example.Point", &[("x", int())]);
    let config = GeneratorConfig {
        ignore_unknown: true,
        inclusion: Inclusion::NonNull,
    };
    let mut problems = ProblemReporter::new();
    let def = introspect(&table, config, &TypeExpr::Raw(id), Direction::Deserialize, &mut problems).unwrap();
    assert!(def.ignore_unknown);
    assert_eq!(def.props[0].inclusion, Inclusion::NonNull);

    table.class_mut(id).annotations.ignore_unknown = Some(false);
    table.class_mut(id).annotations.inclusion = Some(Inclusion::NonDefault);
    let def = introspect(&table, config, &TypeExpr::Raw(id), Direction::Deserialize, &mut problems).unwrap();
    assert!(!def.ignore_unknown);
    assert_eq!(def.props[0].inclusion, Inclusion::NonDefault);
}

#[test]
fn test_member_name_of_accessor() {
    assert_eq!(member_name_of_accessor("getName"), "name");
    assert_eq!(member_name_of_accessor("setURL"), "URL");
    assert_eq!(member_name_of_accessor("isActive"), "active");
    assert_eq!(member_name_of_accessor("getter"), "getter");
    assert_eq!(member_name_of_accessor("value"), "value");
}
