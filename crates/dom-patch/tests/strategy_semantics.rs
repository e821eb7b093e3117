use dom_patch::{
    ErrorKind, FailurePolicy, HaltOnFailure, IgnoreFailureAndContinue, Patch, PatchApplicationState, PatchError,
    PatchOperation,
};
use serde_json::{json, Value};

fn mixed_patch() -> Patch {
    vec![
        PatchOperation::add("/a".parse().unwrap(), 1),
        PatchOperation::replace("/missing".parse().unwrap(), 0),
        PatchOperation::add("/c".parse().unwrap(), 3),
    ]
    .into()
}

#[test]
fn halt_leaves_prefix() {
    let result = mixed_patch().apply(&json!({}), &mut HaltOnFailure);
    assert_eq!(result.doc, json!({"a": 1}));
    assert_eq!(result.outcome.unwrap_err().kind(), ErrorKind::Missing);
}

#[test]
fn continue_applies_the_rest() {
    let result = mixed_patch().apply(&json!({}), &mut IgnoreFailureAndContinue);
    assert_eq!(result.doc, json!({"a": 1, "c": 3}));
    match result.outcome {
        Err(PatchError::Aggregate(failures)) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].index, 1);
            assert_eq!(failures[0].error.kind(), ErrorKind::Missing);
        }
        other => panic!("expected aggregate, got {other:?}"),
    }
}

#[test]
fn policy_matches_builtin_strategies() {
    let patch = mixed_patch();
    let doc = json!({});
    assert_eq!(
        patch.apply(&doc, &mut FailurePolicy::Halt),
        patch.apply(&doc, &mut HaltOnFailure)
    );
    assert_eq!(
        patch.apply(&doc, &mut "continue".parse::<FailurePolicy>().unwrap()),
        patch.apply(&doc, &mut IgnoreFailureAndContinue)
    );
}

fn observe<F: FnMut(&mut PatchApplicationState<'_>)>(f: F) -> F {
    f
}

#[test]
fn strategy_sees_every_step() {
    let mut seen: Vec<(usize, bool, Value)> = Vec::new();
    let mut strategy = observe(|state| {
        seen.push((state.operation_index, state.outcome.is_ok(), state.current_state.clone()));
        assert_eq!(state.patch.len(), 3);
        assert_eq!(state.last_operation, &state.patch[state.operation_index]);
        state.should_continue = true;
    });
    let result = mixed_patch().apply(&json!({}), &mut strategy);
    assert!(result.outcome.is_err());
    assert_eq!(
        seen,
        vec![
            (0, true, json!({"a": 1})),
            (1, false, json!({"a": 1})),
            (2, true, json!({"a": 1, "c": 3})),
        ]
    );
}

#[test]
fn strategy_can_halt_after_success() {
    let mut stop_after_first = observe(|state| state.should_continue = false);
    let result = mixed_patch().apply(&json!({}), &mut stop_after_first);
    assert_eq!(result.doc, json!({"a": 1}));
    assert_eq!(result.outcome, Ok(()));
}

#[test]
fn halting_after_tolerated_failures_aggregates() {
    let patch: Patch = vec![
        PatchOperation::remove("/x".parse().unwrap()),
        PatchOperation::remove("/y".parse().unwrap()),
    ]
    .into();
    let mut halt_on_second = observe(|state| state.should_continue = state.operation_index == 0);
    let outcome = patch.apply(&json!({}), &mut halt_on_second).outcome;
    match outcome {
        Err(PatchError::Aggregate(failures)) => {
            assert_eq!(failures.iter().map(|f| f.index).collect::<Vec<_>>(), [0, 1]);
        }
        other => panic!("expected aggregate, got {other:?}"),
    }
}
