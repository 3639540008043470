// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn step(name: &str, depends_on: &[&str]) -> Step {
    Step {
        name: name.to_string(),
        action: "noop".to_string(),
        depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
        on_error: OnError::default(),
        timeout: None,
        config: Vec::new(),
    }
}

#[test]
fn chain_validates_and_orders_in_sequence() {
    let def = JobDefinition::new("chain", vec![step("a", &[]), step("b", &["a"]), step("c", &["b"])]);
    def.validate().unwrap();
    let order: Vec<&str> = def.topological_order().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(order, vec!["a", "b", "c"]);
}

#[test]
fn unknown_dependency_is_rejected() {
    let def = JobDefinition::new("bad", vec![step("a", &["missing"])]);
    assert_eq!(
        def.validate(),
        Err(DefinitionError::UnknownDependency("a".into(), "missing".into()))
    );
}

#[test]
fn duplicate_step_names_are_rejected() {
    let def = JobDefinition::new("dup", vec![step("a", &[]), step("a", &[])]);
    assert_eq!(def.validate(), Err(DefinitionError::DuplicateStep("a".into())));
}

#[test]
fn cycles_are_rejected() {
    let def = JobDefinition::new("cycle", vec![step("a", &["b"]), step("b", &["a"])]);
    assert!(matches!(def.validate(), Err(DefinitionError::CyclicDependency(_))));
}

#[test]
fn siblings_with_no_ordering_both_appear() {
    let def = JobDefinition::new(
        "fanout",
        vec![step("a", &[]), step("b", &[]), step("c", &["a", "b"])],
    );
    def.validate().unwrap();
    let order: Vec<&str> = def.topological_order().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(order.last(), Some(&"c"));
    assert!(order.contains(&"a"));
    assert!(order.contains(&"b"));
}

#[test]
fn retry_on_error_defaults_fall_back_to_fail() {
    let strategy = OnError::Retry {
        max_attempts: default_max_attempts(),
        delay: default_retry_delay(),
        then: RetryFallback::default(),
    };
    match strategy {
        OnError::Retry { then: RetryFallback::Fail, max_attempts: 3, .. } => {}
        _ => panic!("expected retry defaults"),
    }
}
