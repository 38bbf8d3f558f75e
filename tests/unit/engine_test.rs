//! Tests for the Engine service
//!
//! The engine queries each external fact once and hands captured values to
//! later rules by name.

use wiverify::core::models::{Checklist, Status, System};
use wiverify::core::services::{Engine, Identifiers, rules};

use crate::common::mocks::MockEnvironment;

#[test]
fn each_external_rule_queries_once() {
    let env = MockEnvironment::healthy();
    let checklist = Checklist::new(rules(&env.ids)).unwrap();
    let _ = Engine::new(&env, &env, &env).run(&checklist);

    let external = checklist
        .rules()
        .iter()
        .filter(|r| r.query.system() != System::Derived)
        .count();
    assert_eq!(env.calls().len(), external);
    assert_eq!(env.call_count("managed_cluster"), 3);
    assert_eq!(env.call_count("federated_credential"), 4);
}

#[test]
fn queries_follow_rule_order() {
    let env = MockEnvironment::healthy();
    let checklist = Checklist::new(rules(&env.ids)).unwrap();
    let _ = Engine::new(&env, &env, &env).run(&checklist);

    let calls = env.calls();
    assert_eq!(calls.first(), Some(&"managed_cluster"));
    assert_eq!(calls.last(), Some(&"get_json"));
    let credential = calls.iter().position(|c| *c == "federated_credential").unwrap();
    let namespace = calls.iter().position(|c| *c == "namespace").unwrap();
    assert!(credential < namespace);
}

#[test]
fn selection_runs_dependencies_only() {
    let env = MockEnvironment::healthy();
    let checklist = Checklist::new(rules(&env.ids))
        .unwrap()
        .select(&["credential.issuer".to_string()])
        .unwrap();
    let summary = Engine::new(&env, &env, &env).run(&checklist);

    let ran: Vec<&str> = summary.results.iter().map(|r| r.rule.as_str()).collect();
    assert_eq!(ran, vec!["aks.oidc-issuer-url", "credential.issuer"]);
    assert!(summary.success);
    assert_eq!(env.calls(), vec!["managed_cluster", "federated_credential"]);
}

#[test]
fn selection_by_glob_includes_transitive_inputs() {
    let env = MockEnvironment::healthy();
    let checklist = Checklist::new(rules(&env.ids))
        .unwrap()
        .select(&["probe.*".to_string()])
        .unwrap();

    let names: Vec<&str> = checklist.rules().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["keyvault.secret-value", "service.external-address", "probe.secret-value"]
    );
    assert!(Engine::new(&env, &env, &env).run(&checklist).success);
}

#[test]
fn custom_identifiers_flow_into_queries() {
    let ids = Identifiers {
        namespace: "payments".to_string(),
        service_account: "payments-sa".to_string(),
        ..Identifiers::default()
    };
    let env = MockEnvironment {
        credential_subject: ids.subject(),
        deployment_service_account: ids.service_account.clone(),
        ids,
        ..MockEnvironment::healthy()
    };
    let summary = Engine::new(&env, &env, &env).run(&Checklist::new(rules(&env.ids)).unwrap());
    assert!(summary.success);

    let wrong = MockEnvironment {
        ids: Identifiers {
            namespace: "payments".to_string(),
            ..Identifiers::default()
        },
        ..MockEnvironment::healthy()
    };
    let summary =
        Engine::new(&wrong, &wrong, &wrong).run(&Checklist::new(rules(&wrong.ids)).unwrap());
    assert_eq!(summary.result("credential.subject").unwrap().status, Status::Fail);
}

#[test]
fn remediation_substitutes_values() {
    let env = MockEnvironment {
        deployment_service_account: "default".to_string(),
        ..MockEnvironment::healthy()
    };
    let summary = Engine::new(&env, &env, &env).run(&Checklist::new(rules(&env.ids)).unwrap());

    let hint = summary
        .result("deployment.service-account")
        .unwrap()
        .remediation
        .clone()
        .unwrap();
    assert!(hint.starts_with("Deployment uses default;"));
    assert!(hint.ends_with(&env.ids.service_account));
}

#[test]
fn absent_observation_renders_placeholder() {
    let env = MockEnvironment {
        credential_exists: false,
        ..MockEnvironment::healthy()
    };
    let summary = Engine::new(&env, &env, &env).run(&Checklist::new(rules(&env.ids)).unwrap());

    let subject = summary.result("credential.subject").unwrap();
    assert_eq!(subject.status, Status::Fail);
    assert!(subject.remediation.as_deref().unwrap().starts_with("Subject is <absent>"));
}
