use super::*;
use crate::def::{ClassKind, well_known};
use crate::signature::{parse_type, parse_type_in};
use crate::types::VarOwner;

fn var(owner: crate::def::ClassId, name: &str) -> TypeVar {
    TypeVar::new(VarOwner::Class(owner), name)
}

#[test]
fn test_exact_binds_variable() {
    let table = ClassTable::new();
    let e = var(well_known::LIST, "E");
    let pattern = parse_type_in(&table, "java.util.List<E>", &[e.clone()]).unwrap();
    let concrete = parse_type(&table, "java.util.List<String>").unwrap();
    let substitution = infer_exact(&table, &pattern, &concrete).unwrap();
    assert_eq!(substitution.get(&e), Some(&TypeExpr::Raw(well_known::STRING)));
    assert_eq!(substitution.len(), 1);
}

#[test]
fn test_exact_rejects_different_raw_classes() {
    let table = ClassTable::new();
    let e = var(well_known::LIST, "E");
    let pattern = parse_type_in(&table, "java.util.List<E>", &[e]).unwrap();
    let concrete = parse_type(&table, "java.util.Set<String>").unwrap();
    assert!(matches!(
        try_infer_exact(&table, &pattern, &concrete),
        Err(InferenceError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_exact_repeated_variable_must_agree() {
    let table = ClassTable::new();
    let k = var(well_known::MAP, "K");
    let pattern = parse_type_in(&table, "java.util.Map<K, K>", &[k.clone()]).unwrap();
    let same = parse_type(&table, "java.util.Map<String, String>").unwrap();
    assert!(infer_exact(&table, &pattern, &same).is_some());

    let different = parse_type(&table, "java.util.Map<String, Integer>").unwrap();
    match try_infer_exact(&table, &pattern, &different) {
        Err(InferenceError::Conflict { var, first, second }) => {
            assert_eq!(var, k);
            assert_eq!(first, TypeExpr::Raw(well_known::STRING));
            assert_eq!(second, TypeExpr::Raw(well_known::INTEGER));
        }
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[test]
fn test_exact_binds_through_arrays_and_wildcards() {
    let table = ClassTable::new();
    let t = var(well_known::OPTIONAL, "T");
    let pattern = parse_type_in(&table, "java.util.List<? extends T>[]", &[t.clone()]).unwrap();
    let concrete = parse_type(&table, "java.util.List<? extends Number>[]").unwrap();
    let substitution = infer_exact(&table, &pattern, &concrete).unwrap();
    assert_eq!(substitution.get(&t), Some(&TypeExpr::Raw(well_known::NUMBER)));
}

#[test]
fn test_variable_pattern_binds_whole_type() {
    let table = ClassTable::new();
    let t = var(well_known::OPTIONAL, "T");
    let concrete = parse_type(&table, "java.util.List<String>").unwrap();
    let substitution = infer_exact(&table, &TypeExpr::Variable(t.clone()), &concrete).unwrap();
    assert_eq!(substitution.get(&t), Some(&concrete));
}

#[test]
fn test_contravariant_aligns_concrete_to_pattern() {
    let table = ClassTable::new();
    let e = var(well_known::LIST, "E");
    let pattern = parse_type_in(&table, "java.util.List<E>", &[e.clone()]).unwrap();
    let concrete = parse_type(&table, "java.util.ArrayList<String>").unwrap();
    let substitution = infer_contravariant(&table, &pattern, &concrete).unwrap();
    assert_eq!(substitution.get(&e), Some(&TypeExpr::Raw(well_known::STRING)));
}

#[test]
fn test_contravariant_enum_pattern() {
    let mut table = ClassTable::new();
    let color = table.declare("com.example.Color", ClassKind::Enum);
    let e = TypeVar::new(VarOwner::Class(well_known::ENUM), "E");
    let pattern = TypeExpr::parameterized(well_known::ENUM, vec![TypeExpr::Variable(e.clone())]);
    let substitution = infer_contravariant(&table, &pattern, &TypeExpr::Raw(color)).unwrap();
    assert_eq!(substitution.get(&e), Some(&TypeExpr::Raw(color)));
}

#[test]
fn test_contravariant_unrelated() {
    let table = ClassTable::new();
    let e = var(well_known::LIST, "E");
    let pattern = parse_type_in(&table, "java.util.List<E>", &[e]).unwrap();
    let concrete = parse_type(&table, "java.util.Set<String>").unwrap();
    assert!(matches!(
        try_infer_contravariant(&table, &pattern, &concrete),
        Err(InferenceError::NotRelated { .. })
    ));
}

#[test]
fn test_covariant_aligns_pattern_to_concrete() {
    let table = ClassTable::new();
    let e = var(well_known::ARRAY_LIST, "E");
    let pattern = parse_type_in(&table, "java.util.ArrayList<E>", &[e.clone()]).unwrap();
    let concrete = parse_type(&table, "java.util.List<String>").unwrap();
    let substitution = infer_covariant(&table, &pattern, &concrete).unwrap();
    assert_eq!(substitution.get(&e), Some(&TypeExpr::Raw(well_known::STRING)));
    assert!(infer_covariant(&table, &pattern, &parse_type(&table, "java.util.Map<String, String>").unwrap()).is_none());
}

#[test]
fn test_substitute_replaces_only_bound_variables() {
    let table = ClassTable::new();
    let k = var(well_known::MAP, "K");
    let v = var(well_known::MAP, "V");
    let ty = parse_type_in(&table, "java.util.Map<K, java.util.List<V>>", &[k.clone(), v.clone()]).unwrap();
    let substitution: Substitution = [(k, TypeExpr::Raw(well_known::STRING))].into_iter().collect();
    assert_eq!(
        ty.substitute(&substitution),
        parse_type_in(&table, "java.util.Map<String, java.util.List<V>>", &[v]).unwrap()
    );
}

#[test]
fn test_bind_returns_existing_on_conflict() {
    let mut substitution = Substitution::new();
    let t = var(well_known::OPTIONAL, "T");
    assert!(substitution.bind(t.clone(), TypeExpr::Raw(well_known::STRING)).is_ok());
    assert!(substitution.bind(t.clone(), TypeExpr::Raw(well_known::STRING)).is_ok());
    assert_eq!(
        substitution.bind(t, TypeExpr::Raw(well_known::INTEGER)),
        Err(TypeExpr::Raw(well_known::STRING))
    );
}
