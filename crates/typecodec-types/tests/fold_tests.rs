use super::*;
use crate::def::{ClassKind, ClassTable};
use crate::signature::{parse_type, parse_type_in};
use crate::types::VarOwner;

fn list_e() -> TypeVar {
    TypeVar::new(VarOwner::Class(well_known::LIST), "E")
}

#[test]
fn test_eager_fold_substitutes_bound_variables() {
    let table = ClassTable::new();
    let e = list_e();
    let pattern = parse_type_in(&table, "java.util.List<E>", &[e.clone()]).unwrap();
    let folded = pattern
        .fold_type_variables_eager(&table, &mut |var: &TypeVar| {
            (var == &e).then(|| TypeExpr::Raw(well_known::STRING))
        })
        .unwrap();
    assert_eq!(folded, parse_type(&table, "java.util.List<String>").unwrap());
}

#[test]
fn test_eager_fold_erases_enclosing_parameterized_type() {
    let table = ClassTable::new();
    let e = list_e();
    let pattern =
        parse_type_in(&table, "java.util.Map<String, java.util.List<E>>", &[e]).unwrap();
    let folded = pattern.fold_type_variables_eager(&table, &mut |_| None).unwrap();
    // The inner List<E> collapses, the outer Map keeps its arguments.
    assert_eq!(
        folded,
        TypeExpr::parameterized(
            well_known::MAP,
            vec![TypeExpr::Raw(well_known::STRING), TypeExpr::Raw(well_known::LIST)]
        )
    );
}

#[test]
fn test_eager_fold_erased_wildcard_bound_erases_holder() {
    let table = ClassTable::new();
    let e = list_e();
    let pattern = parse_type_in(&table, "java.util.List<? extends E>", &[e]).unwrap();
    assert_eq!(
        pattern.fold_type_variables_eager(&table, &mut |_| None),
        Some(TypeExpr::Raw(well_known::LIST))
    );
}

#[test]
fn test_eager_fold_erased_array_component() {
    let mut table = ClassTable::new();
    let holder = table.declare("com.example.Holder", ClassKind::Class);
    let t = table.add_type_param(holder, "T", vec![TypeExpr::Raw(well_known::NUMBER)]);
    let array = TypeExpr::array(t);
    assert_eq!(
        array.fold_type_variables_eager(&table, &mut |_| None),
        Some(TypeExpr::array(TypeExpr::Raw(well_known::NUMBER)))
    );
}

#[test]
fn test_erasure_of_each_variant() {
    let mut table = ClassTable::new();
    let holder = table.declare("com.example.Holder", ClassKind::Class);
    let t = table.add_type_param(holder, "T", vec![TypeExpr::Raw(well_known::NUMBER)]);
    assert_eq!(t.erasure(&table), TypeExpr::Raw(well_known::NUMBER));
    assert_eq!(
        parse_type(&table, "java.util.List<String>").unwrap().erasure(&table),
        TypeExpr::Raw(well_known::LIST)
    );
    assert_eq!(
        TypeExpr::extends(TypeExpr::Raw(well_known::INTEGER)).erasure(&table),
        TypeExpr::Raw(well_known::INTEGER)
    );
    assert_eq!(
        TypeExpr::array(parse_type(&table, "java.util.List<String>").unwrap()).erasure(&table),
        TypeExpr::array(TypeExpr::Raw(well_known::LIST))
    );
}

#[test]
fn test_erasure_of_recursive_bound_terminates() {
    let table = ClassTable::new();
    // E extends Enum<E>
    let e = TypeExpr::variable(VarOwner::Class(well_known::ENUM), "E");
    assert_eq!(e.erasure(&table), TypeExpr::Raw(well_known::ENUM));
}

#[test]
fn test_free_variables_in_first_occurrence_order() {
    let table = ClassTable::new();
    let k = TypeVar::new(VarOwner::Class(well_known::MAP), "K");
    let v = TypeVar::new(VarOwner::Class(well_known::MAP), "V");
    let ty = parse_type_in(
        &table,
        "java.util.Map<V, java.util.List<K>>",
        &[k.clone(), v.clone()],
    )
    .unwrap();
    assert_eq!(ty.free_variables().into_iter().collect::<Vec<_>>(), vec![v, k]);
    assert!(ty.has_free_variables());
    assert!(!parse_type(&table, "java.util.List<String>[]").unwrap().has_free_variables());
}

#[test]
fn test_fold_visits_children_before_parent() {
    let table = ClassTable::new();
    let ty = parse_type(&table, "java.util.List<java.util.Set<String>>").unwrap();
    let mut seen = Vec::new();
    ty.fold(&mut |t| {
        seen.push(t.display(&table).to_string());
        t
    });
    assert_eq!(
        seen,
        vec![
            "java.lang.String",
            "java.util.Set<java.lang.String>",
            "java.util.List<java.util.Set<java.lang.String>>",
        ]
    );
}
