//! Algebraic laws that must hold across the whole type algebra.

use super::*;

fn sample_types(table: &ClassTable) -> Vec<TypeExpr> {
    [
        "int",
        "String",
        "Integer",
        "Number",
        "Object",
        "java.util.List<String>",
        "java.util.ArrayList<String>",
        "java.util.Collection<String>",
        "java.util.List<Integer>",
        "java.util.Map<String, Integer>",
        "java.util.LinkedHashMap<String, Integer>",
        "String[]",
        "Object[]",
        "int[]",
    ]
    .into_iter()
    .map(|text| parse_type(table, text).unwrap())
    .collect()
}

#[test]
fn test_erasure_is_idempotent() {
    let table = ClassTable::new();
    for ty in sample_types(&table) {
        let once = ty.erasure(&table);
        assert_eq!(once.erasure(&table), once, "{}", ty.display(&table));
    }
}

#[test]
fn test_strict_assignability_is_antisymmetric() {
    let table = ClassTable::new();
    let types = sample_types(&table);
    for a in &types {
        for b in &types {
            if a != b && a.is_assignable_from(&table, b, true) {
                assert!(
                    !b.is_assignable_from(&table, a, true),
                    "{} and {} are mutually assignable",
                    a.display(&table),
                    b.display(&table)
                );
            }
        }
    }
}

#[test]
fn test_assignability_is_reflexive() {
    let table = ClassTable::new();
    for ty in sample_types(&table) {
        assert!(ty.is_assignable_from(&table, &ty, true), "{}", ty.display(&table));
    }
}

#[test]
fn test_find_parameterization_of_own_erasure() {
    let table = ClassTable::new();
    for ty in sample_types(&table) {
        if ty.is_array() {
            continue;
        }
        assert_eq!(
            ty.find_parameterization(&table, &ty.erasure(&table)).as_ref(),
            Some(&ty),
            "{}",
            ty.display(&table)
        );
    }
}

#[test]
fn test_integer_is_more_specific_than_number() {
    let table = ClassTable::new();
    let integer = TypeExpr::Raw(well_known::INTEGER);
    let number = TypeExpr::Raw(well_known::NUMBER);
    let object = TypeExpr::Raw(well_known::OBJECT);
    assert!(number.is_assignable_from(&table, &integer, true));
    assert!(object.is_assignable_from(&table, &number, true));
    assert!(!integer.is_assignable_from(&table, &number, true));
}
