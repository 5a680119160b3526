use super::*;
use crate::def::ClassKind;
use crate::signature::parse_type;

fn ty(table: &ClassTable, text: &str) -> TypeExpr {
    parse_type(table, text).unwrap()
}

#[test]
fn test_enum_implements_enum_of_itself() {
    let mut table = ClassTable::new();
    let color = table.declare("com.example.Color", ClassKind::Enum);
    let found = TypeExpr::Raw(color).find_parameterization(&table, &TypeExpr::Raw(well_known::ENUM));
    assert_eq!(
        found,
        Some(TypeExpr::parameterized(well_known::ENUM, vec![TypeExpr::Raw(color)]))
    );
}

#[test]
fn test_array_list_implements_iterable() {
    let table = ClassTable::new();
    let found = ty(&table, "java.util.ArrayList<String>")
        .find_parameterization(&table, &TypeExpr::Raw(well_known::ITERABLE));
    assert_eq!(found, Some(ty(&table, "java.lang.Iterable<String>")));
}

#[test]
fn test_raw_source_erases_generic_supertypes() {
    let table = ClassTable::new();
    let found = TypeExpr::Raw(well_known::ARRAY_LIST)
        .find_parameterization(&table, &TypeExpr::Raw(well_known::LIST));
    assert_eq!(found, Some(TypeExpr::Raw(well_known::LIST)));
}

#[test]
fn test_linked_hash_map_implements_map_through_superclass() {
    let table = ClassTable::new();
    let found = ty(&table, "java.util.LinkedHashMap<String, Integer>")
        .find_parameterization(&table, &TypeExpr::Raw(well_known::MAP));
    assert_eq!(found, Some(ty(&table, "java.util.Map<String, Integer>")));
}

#[test]
fn test_interfaces_implement_object() {
    let table = ClassTable::new();
    let found = ty(&table, "java.util.List<String>")
        .find_parameterization(&table, &TypeExpr::Raw(well_known::OBJECT));
    assert_eq!(found, Some(TypeExpr::Raw(well_known::OBJECT)));
    assert_eq!(
        TypeExpr::Raw(well_known::INT).find_parameterization(&table, &TypeExpr::Raw(well_known::OBJECT)),
        None
    );
}

#[test]
fn test_unrelated_types_have_no_parameterization() {
    let table = ClassTable::new();
    assert_eq!(
        TypeExpr::Raw(well_known::STRING).find_parameterization(&table, &TypeExpr::Raw(well_known::NUMBER)),
        None
    );
}

#[test]
fn test_arrays_implement_object_cloneable_and_covariant_arrays() {
    let table = ClassTable::new();
    let strings = ty(&table, "String[]");
    for target in [well_known::OBJECT, well_known::CLONEABLE, well_known::SERIALIZABLE] {
        assert_eq!(
            strings.find_parameterization(&table, &TypeExpr::Raw(target)),
            Some(TypeExpr::Raw(target))
        );
    }
    assert_eq!(
        strings.find_parameterization(&table, &ty(&table, "Object[]")),
        Some(ty(&table, "Object[]"))
    );
    assert_eq!(
        strings.find_parameterization(&table, &ty(&table, "CharSequence[]")),
        Some(ty(&table, "CharSequence[]"))
    );
    assert_eq!(ty(&table, "int[]").find_parameterization(&table, &ty(&table, "Object[]")), None);
}

#[test]
fn test_variable_uses_its_bounds() {
    let mut table = ClassTable::new();
    let holder = table.declare("com.example.Holder", ClassKind::Class);
    let t = table.add_type_param(holder, "T", vec![ty(&table, "java.util.List<String>")]);
    assert_eq!(
        t.find_parameterization(&table, &TypeExpr::Raw(well_known::COLLECTION)),
        Some(ty(&table, "java.util.Collection<String>"))
    );
}

#[test]
fn test_integer_is_assignable_to_number_not_reverse() {
    let table = ClassTable::new();
    let number = TypeExpr::Raw(well_known::NUMBER);
    let integer = TypeExpr::Raw(well_known::INTEGER);
    assert!(number.is_assignable_from(&table, &integer, true));
    assert!(!integer.is_assignable_from(&table, &number, true));
}

#[test]
fn test_raw_source_to_parameterized_target() {
    let table = ClassTable::new();
    let list_string = ty(&table, "java.util.List<String>");
    let raw_list = TypeExpr::Raw(well_known::LIST);
    assert!(list_string.is_assignable_from(&table, &raw_list, false));
    assert!(!list_string.is_assignable_from(&table, &raw_list, true));
    assert!(raw_list.is_assignable_from(&table, &list_string, true));
}

#[test]
fn test_type_arguments_are_invariant() {
    let table = ClassTable::new();
    let list_number = ty(&table, "java.util.List<Number>");
    let list_integer = ty(&table, "java.util.ArrayList<Integer>");
    assert!(!list_number.is_assignable_from(&table, &list_integer, false));
    let list_string = ty(&table, "java.util.List<String>");
    assert!(list_string.is_assignable_from(&table, &ty(&table, "java.util.ArrayList<String>"), true));
}

#[test]
fn test_wildcard_arguments_use_containment() {
    let table = ClassTable::new();
    let extends = ty(&table, "java.util.List<? extends Number>");
    assert!(extends.is_assignable_from(&table, &ty(&table, "java.util.ArrayList<Integer>"), true));
    assert!(!extends.is_assignable_from(&table, &ty(&table, "java.util.List<String>"), true));

    let sup = ty(&table, "java.util.List<? super Integer>");
    assert!(sup.is_assignable_from(&table, &ty(&table, "java.util.List<Number>"), true));
    assert!(!sup.is_assignable_from(&table, &ty(&table, "java.util.List<String>"), true));

    let any = ty(&table, "java.util.List<?>");
    assert!(any.is_assignable_from(&table, &ty(&table, "java.util.List<String>"), true));
}

#[test]
fn test_variables_and_wildcards_are_never_targets() {
    let table = ClassTable::new();
    let e = TypeExpr::variable(crate::types::VarOwner::Class(well_known::LIST), "E");
    assert!(!e.is_assignable_from(&table, &e, false));
    let w = TypeExpr::unbounded_wildcard();
    assert!(!w.is_assignable_from(&table, &TypeExpr::Raw(well_known::STRING), false));
}

#[test]
fn test_array_assignability_is_covariant() {
    let table = ClassTable::new();
    assert!(ty(&table, "Object[]").is_assignable_from(&table, &ty(&table, "String[]"), true));
    assert!(!ty(&table, "String[]").is_assignable_from(&table, &ty(&table, "Object[]"), true));
    assert!(TypeExpr::Raw(well_known::CLONEABLE).is_assignable_from(&table, &ty(&table, "int[]"), true));
}

#[test]
fn test_inner_class_assignability_checks_outer() {
    let mut table = ClassTable::new();
    let outer = table.declare("com.example.Outer", ClassKind::Class);
    table.add_type_param(outer, "A", Vec::new());
    table.declare_nested(outer, "Inner", ClassKind::Class, false);
    let of_string = ty(&table, "com.example.Outer<String>.Inner");
    let of_integer = ty(&table, "com.example.Outer<Integer>.Inner");
    assert!(of_string.is_assignable_from(&table, &of_string, true));
    assert!(!of_string.is_assignable_from(&table, &of_integer, true));
}
