use super::*;
use crate::def::{ClassKind, ClassTable};

#[test]
fn test_variable_identity_ignores_bounds() {
    let mut table = ClassTable::new();
    let a = table.declare("com.example.A", ClassKind::Class);
    let t1 = table.add_type_param(a, "T", vec![TypeExpr::Raw(well_known::NUMBER)]);
    let t2 = TypeExpr::variable(VarOwner::Class(a), "T");
    assert_eq!(t1, t2);
    let other_owner = TypeExpr::variable(VarOwner::Class(well_known::LIST), "T");
    assert_ne!(t1, other_owner);
}

#[test]
fn test_unbounded_wildcard_has_object_upper_bound() {
    let TypeExpr::Wildcard(w) = TypeExpr::unbounded_wildcard() else {
        panic!("expected wildcard");
    };
    assert_eq!(w.upper.as_slice(), &[TypeExpr::Raw(well_known::OBJECT)]);
    assert!(w.lower.is_empty());
}

#[test]
fn test_display_parameterized_and_wildcards() {
    let table = ClassTable::new();
    let ty = TypeExpr::parameterized(
        well_known::MAP,
        vec![
            TypeExpr::Raw(well_known::STRING),
            TypeExpr::parameterized(
                well_known::LIST,
                vec![TypeExpr::extends(TypeExpr::Raw(well_known::NUMBER))],
            ),
        ],
    );
    assert_eq!(
        ty.display(&table).to_string(),
        "java.util.Map<java.lang.String, java.util.List<? extends java.lang.Number>>"
    );
    let sup = TypeExpr::parameterized(
        well_known::LIST,
        vec![TypeExpr::super_of(TypeExpr::Raw(well_known::INTEGER))],
    );
    assert_eq!(sup.display(&table).to_string(), "java.util.List<? super java.lang.Integer>");
    let any = TypeExpr::parameterized(well_known::LIST, vec![TypeExpr::unbounded_wildcard()]);
    assert_eq!(any.display(&table).to_string(), "java.util.List<?>");
}

#[test]
fn test_display_arrays_and_variables() {
    let table = ClassTable::new();
    let ints = TypeExpr::array(TypeExpr::array(TypeExpr::Raw(well_known::INT)));
    assert_eq!(ints.display(&table).to_string(), "int[][]");
    let e = TypeExpr::variable(VarOwner::Class(well_known::LIST), "E");
    assert_eq!(TypeExpr::array(e).display(&table).to_string(), "E[]");
}

#[test]
fn test_display_inner_class() {
    let mut table = ClassTable::new();
    let outer = table.declare("com.example.Outer", ClassKind::Class);
    table.add_type_param(outer, "A", Vec::new());
    let inner = table.declare_nested(outer, "Inner", ClassKind::Class, false);
    let ty = TypeExpr::inner(
        TypeExpr::parameterized(outer, vec![TypeExpr::Raw(well_known::STRING)]),
        inner,
        Vec::new(),
    );
    assert_eq!(ty.display(&table).to_string(), "com.example.Outer<java.lang.String>.Inner");
}

#[test]
fn test_shape_queries() {
    let list = TypeExpr::parameterized(well_known::LIST, vec![TypeExpr::Raw(well_known::STRING)]);
    assert_eq!(list.class_id(), Some(well_known::LIST));
    assert_eq!(list.params(), &[TypeExpr::Raw(well_known::STRING)]);
    assert!(!list.is_raw());
    let array = TypeExpr::array(TypeExpr::Raw(well_known::INT));
    assert_eq!(array.component(), Some(&TypeExpr::Raw(well_known::INT)));
    assert_eq!(array.class_id(), None);
}
