use super::*;

#[test]
fn test_enter_and_leave() {
    let mut guard: RecursionGuard<u32> = RecursionGuard::new(10, 100);
    assert_eq!(guard.enter(1), RecursionResult::Entered);
    assert!(guard.is_visiting(&1));
    assert_eq!(guard.depth(), 1);
    guard.leave(&1);
    assert!(!guard.is_visiting(&1));
    assert_eq!(guard.depth(), 0);
}

#[test]
fn test_cycle_detected_for_key_on_path() {
    let mut guard: RecursionGuard<&str> = RecursionGuard::with_profile(RecursionProfile::DependencyGraph);
    assert!(guard.enter("Node").is_entered());
    assert!(guard.enter("List<Node>").is_entered());
    assert!(guard.enter("Node").is_cycle());
    guard.leave(&"List<Node>");
    guard.leave(&"Node");
    assert!(!guard.is_exceeded());
}

#[test]
fn test_depth_exceeded_is_sticky() {
    let mut guard: RecursionGuard<u32> = RecursionGuard::new(2, 100);
    assert!(guard.enter(1).is_entered());
    assert!(guard.enter(2).is_entered());
    assert_eq!(guard.enter(3), RecursionResult::DepthExceeded);
    guard.leave(&2);
    guard.leave(&1);
    assert!(guard.is_exceeded());
    guard.reset();
    assert!(!guard.is_exceeded());
}

#[test]
fn test_iteration_limit() {
    let mut guard: RecursionGuard<u32> =
        RecursionGuard::with_profile(RecursionProfile::Custom { max_depth: 10, max_iterations: 2 });
    assert!(guard.enter(1).is_entered());
    guard.leave(&1);
    assert!(guard.enter(1).is_entered());
    guard.leave(&1);
    assert_eq!(guard.enter(1), RecursionResult::IterationExceeded);
    assert!(RecursionResult::IterationExceeded.is_exceeded());
}

#[test]
fn test_scope_runs_closure_and_leaves() {
    let mut guard: RecursionGuard<u32> = RecursionGuard::new(4, 100);
    let value = guard.scope(7, || 42);
    assert_eq!(value, Ok(42));
    assert!(!guard.is_visiting(&7));
}

#[test]
fn test_scope_denied_on_cycle() {
    let mut guard: RecursionGuard<u32> = RecursionGuard::new(4, 100);
    assert!(guard.enter(7).is_entered());
    assert_eq!(guard.scope(7, || 1), Err(RecursionResult::Cycle));
    guard.leave(&7);
}

#[test]
fn test_depth_counter() {
    let mut counter = DepthCounter::new(2);
    assert!(counter.enter());
    assert!(counter.enter());
    assert!(!counter.enter());
    assert!(counter.is_exceeded());
    counter.leave();
    counter.leave();
    assert_eq!(counter.depth(), 0);
}

#[test]
fn test_profiles_use_central_limits() {
    assert_eq!(
        RecursionProfile::TypeHierarchy.max_depth(),
        crate::limits::MAX_HIERARCHY_DEPTH
    );
    assert_eq!(
        RecursionProfile::DependencyGraph.max_iterations(),
        crate::limits::MAX_DEPENDENCY_EDGES
    );
}
