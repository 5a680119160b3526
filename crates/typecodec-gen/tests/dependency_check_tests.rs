use super::*;
use crate::fixtures::*;
use typecodec_types::{ClassTable, MemberAnnotations};

fn inline_node(table: &mut ClassTable, field: TypeExpr) -> TypeExpr {
    let node = bean(table, "com.example.Node", &[]);
    table.class_mut(node).annotations.inline = true;
    table
        .class_mut(node)
        .fields
        .push(typecodec_types::FieldElement::new("next", field));
    TypeExpr::Raw(node)
}

fn self_ref(table: &mut ClassTable) -> TypeExpr {
    let node = table.declare("com.example.Node", typecodec_types::ClassKind::Class);
    inline_node(table, TypeExpr::Raw(node))
}

fn check(model: &Model, root: &TypeExpr) -> (Vec<CyclicDependencyError>, Vec<(TypeExpr, bool)>) {
    let linker = model.linker();
    let mut checker = DependencyGraphChecker::new(&linker);
    checker.check_root(root);
    (checker.errors().to_vec(), checker.injected().cloned().collect())
}

#[test]
fn test_inline_self_reference_is_a_cycle() {
    let mut table = ClassTable::new();
    let node = self_ref(&mut table);
    let model = Model::new(table);
    let (errors, injected) = check(&model, &node);
    assert_eq!(
        errors,
        vec![CyclicDependencyError {
            path: "com.example.Node->next".into(),
            exceeded: false,
        }]
    );
    assert!(injected.is_empty());
}

#[test]
fn test_inline_cycle_through_a_list() {
    let mut table = ClassTable::new();
    let node = table.declare("com.example.Node", typecodec_types::ClassKind::Class);
    let root = inline_node(&mut table, list_of(TypeExpr::Raw(node)));
    let model = Model::new(table);
    let (errors, _) = check(&model, &root);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, "com.example.Node->next->[*]");
}

#[test]
fn test_permit_recursive_injects_the_edge() {
    let mut table = ClassTable::new();
    let node = self_ref(&mut table);
    let id = node.class_id().unwrap();
    annotate_field(
        &mut table,
        id,
        "next",
        MemberAnnotations {
            permit_recursive_serialization: true,
            ..MemberAnnotations::default()
        },
    );
    let model = Model::new(table);
    let (errors, injected) = check(&model, &node);
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(injected, vec![(node, true)]);
}

#[test]
fn test_non_inline_recursion_is_injected() {
    let mut table = ClassTable::new();
    let tree = bean(&mut table, "com.example.Tree", &[]);
    table
        .class_mut(tree)
        .fields
        .push(typecodec_types::FieldElement::new("children", list_of(TypeExpr::Raw(tree))));
    let model = Model::new(table);
    let (errors, injected) = check(&model, &TypeExpr::Raw(tree));
    assert!(errors.is_empty());
    assert_eq!(injected, vec![(TypeExpr::Raw(tree), false)]);
}

#[test]
fn test_report_fails_the_element() {
    let mut table = ClassTable::new();
    let node = self_ref(&mut table);
    let model = Model::new(table);
    let linker = model.linker();
    let mut checker = DependencyGraphChecker::new(&linker);
    checker.check_root(&node);
    assert!(!checker.is_ok());

    let mut problems = ProblemReporter::new();
    checker.report("com.example.Node", &mut problems);
    let [problem] = problems.problems() else {
        panic!("{:?}", problems.problems());
    };
    assert_eq!(problem.code, ProblemCode::CyclicDependency);
    assert!(problem.message_text.contains("permit recursive serialization"));
}

#[test]
fn test_error_display() {
    let exceeded = CyclicDependencyError {
        path: "a->b".into(),
        exceeded: true,
    };
    assert_eq!(exceeded.to_string(), "Dependency graph exceeds the nesting limit at a->b");
}
