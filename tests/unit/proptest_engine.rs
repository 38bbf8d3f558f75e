//! Property-based tests for the engine
//!
//! Rules here read fields of the probe body, so the expected outcome of any
//! generated checklist can be computed directly from the generated body.

use std::collections::BTreeMap;

use proptest::prelude::*;
use wiverify::core::models::{Checklist, Expectation, HttpQuery, Input, Query, Rule, Status};
use wiverify::core::services::Engine;

use crate::common::mocks::{EXTERNAL_IP, MockEnvironment};

fn body_strategy() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map("[a-d]", "[xy]{0,2}", 0..4)
}

/// (field, expectation kind, expected value)
fn rules_strategy() -> impl Strategy<Value = Vec<(String, u8, String)>> {
    prop::collection::vec(("[a-e]", 0..3u8, "[xy]{1,2}"), 1..8)
}

fn probe(field: &str) -> Query {
    Query::Http(HttpQuery {
        address: Input::literal(EXTERNAL_IP),
        path: "/".to_string(),
        field: field.to_string(),
    })
}

fn build(specs: &[(String, u8, String)]) -> Checklist {
    let rules = specs
        .iter()
        .enumerate()
        .map(|(i, (field, kind, value))| {
            let expectation = match kind {
                0 => Expectation::Observe,
                1 => Expectation::NonEmpty,
                _ => Expectation::equals(value.as_str()),
            };
            Rule::new(format!("r{i}"), format!("field {field}"), probe(field), expectation)
        })
        .collect();
    Checklist::new(rules).unwrap()
}

fn environment(body: &BTreeMap<String, String>) -> MockEnvironment {
    MockEnvironment {
        probe_body: serde_json::to_value(body).unwrap(),
        ..MockEnvironment::healthy()
    }
}

fn expected_status(
    body: &BTreeMap<String, String>,
    (field, kind, value): &(String, u8, String),
) -> Status {
    if *kind == 0 {
        return Status::Info;
    }
    let Some(observed) = body.get(field) else {
        return Status::Error;
    };
    let holds = match kind {
        1 => !observed.is_empty(),
        _ => observed == value,
    };
    if holds { Status::Pass } else { Status::Fail }
}

proptest! {
    /// One result per rule, in checklist order
    #[test]
    fn one_result_per_rule_in_order(body in body_strategy(), specs in rules_strategy()) {
        let env = environment(&body);
        let checklist = build(&specs);
        let summary = Engine::new(&env, &env, &env).run(&checklist);

        prop_assert_eq!(summary.results.len(), checklist.len());
        for (rule, result) in checklist.rules().iter().zip(&summary.results) {
            prop_assert_eq!(&rule.name, &result.rule);
        }
    }

    /// Statuses and success follow from the observed body
    #[test]
    fn statuses_match_model(body in body_strategy(), specs in rules_strategy()) {
        let env = environment(&body);
        let summary = Engine::new(&env, &env, &env).run(&build(&specs));

        let expected: Vec<Status> = specs.iter().map(|s| expected_status(&body, s)).collect();
        let actual: Vec<Status> = summary.results.iter().map(|r| r.status).collect();
        prop_assert_eq!(&actual, &expected);
        prop_assert_eq!(summary.success, !expected.iter().any(|s| s.is_gating_failure()));
        prop_assert_eq!(
            summary.passed + summary.failed + summary.errors + summary.info,
            specs.len()
        );
    }

    /// Running twice against the same environment gives the same summary
    #[test]
    fn runs_are_idempotent(body in body_strategy(), specs in rules_strategy()) {
        let env = environment(&body);
        let checklist = build(&specs);
        let engine = Engine::new(&env, &env, &env);

        let first = engine.run(&checklist);
        let second = engine.run(&checklist);
        prop_assert_eq!(first, second);
    }

    /// Observation-only rules never fail a run, even when the field is missing
    #[test]
    fn info_never_fails(body in body_strategy(), fields in prop::collection::vec("[a-e]", 1..6)) {
        let specs: Vec<_> = fields.iter().map(|f| (f.clone(), 0u8, String::new())).collect();
        let env = environment(&body);
        let summary = Engine::new(&env, &env, &env).run(&build(&specs));

        prop_assert!(summary.success);
        prop_assert_eq!(summary.info, specs.len());
        prop_assert_eq!(summary.errors, 0);
        for (field, result) in fields.iter().zip(&summary.results) {
            prop_assert_eq!(result.detail.is_some(), !body.contains_key(field));
        }
    }

    /// Observation-only rules stay informational when the endpoint is down
    #[test]
    fn info_survives_unavailable_probe(fields in prop::collection::vec("[a-e]", 1..6)) {
        let specs: Vec<_> = fields.iter().map(|f| (f.clone(), 0u8, String::new())).collect();
        let env = MockEnvironment {
            unavailable: vec!["get_json"],
            ..MockEnvironment::healthy()
        };
        let summary = Engine::new(&env, &env, &env).run(&build(&specs));

        prop_assert!(summary.success);
        prop_assert_eq!(summary.info, specs.len());
        prop_assert!(summary.results.iter().all(|r| r.remediation.is_none()));
    }

    /// Dependents observe the captured value without querying again
    #[test]
    fn captured_values_are_not_requeried(value in "[a-z0-9]{1,12}", depth in 1usize..6) {
        let env = MockEnvironment {
            probe_body: serde_json::json!({ "value": value.clone() }),
            ..MockEnvironment::healthy()
        };
        let mut rules = vec![Rule::new("source", "Source", probe("value"), Expectation::NonEmpty)];
        for i in 0..depth {
            let previous = if i == 0 { "source".to_string() } else { format!("copy{}", i - 1) };
            rules.push(Rule::new(
                format!("copy{i}"),
                "Copy",
                Query::Captured(previous),
                Expectation::matches_captured("source"),
            ));
        }
        let summary = Engine::new(&env, &env, &env).run(&Checklist::new(rules).unwrap());

        prop_assert!(summary.success);
        prop_assert_eq!(env.call_count("get_json"), 1);
        for result in &summary.results {
            prop_assert_eq!(result.observed.as_deref(), Some(value.as_str()));
        }
    }
}
