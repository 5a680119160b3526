use super::*;

#[test]
fn test_reporter_starts_clean() {
    let reporter = ProblemReporter::new();
    assert!(!reporter.is_failed());
    assert!(reporter.problems().is_empty());
}

#[test]
fn test_warning_does_not_fail() {
    let mut reporter = ProblemReporter::new();
    reporter.warn(ProblemCode::InvalidAnnotation, "com.example.A#x", "ignored");
    assert!(!reporter.is_failed());
    assert_eq!(reporter.problems().len(), 1);
}

#[test]
fn test_errors_accumulate() {
    let mut reporter = ProblemReporter::new();
    reporter.fail(ProblemCode::NoCodec, "com.example.A#x", "No serializer for type java.lang.Thread");
    reporter.fail(ProblemCode::NoCreator, "com.example.B", "No creator");
    assert!(reporter.is_failed());
    assert_eq!(reporter.problems().len(), 2);
    assert_eq!(reporter.problems()[1].code, ProblemCode::NoCreator);
}

#[test]
fn test_absorb_keeps_failed_flag() {
    let mut outer = ProblemReporter::new();
    let mut inner = ProblemReporter::new();
    inner.fail(ProblemCode::CyclicDependency, "com.example.Node", "cycle");
    outer.absorb(inner);
    assert!(outer.is_failed());
    assert_eq!(outer.take_problems().len(), 1);
    assert!(!outer.is_failed());
}

#[test]
fn test_problem_display() {
    let problem = Problem::error(ProblemCode::NoCodec, "com.example.A#x", "No codec");
    assert_eq!(problem.to_string(), "error TC1001: com.example.A#x: No codec");
}

#[test]
fn test_problem_serializes_camel_case() {
    let problem = Problem::warning(ProblemCode::InvalidAnnotation, "A", "msg");
    let json = serde_json::to_value(&problem).unwrap();
    assert_eq!(json["category"], "warning");
    assert_eq!(json["messageText"], "msg");
    assert_eq!(json["code"], "InvalidAnnotation");
}
