//! Verify command tests
//!
//! `az` and `kubectl` are replaced by small shell scripts so a run can be
//! driven end to end without a cloud account.

use std::fs;
use std::path::{Path, PathBuf};

use predicates::prelude::*;
use tempfile::TempDir;

use super::wiverify;

const ISSUER: &str = "https://issuer.example/abc/";

/// Write an executable script into `dir/bin`
#[cfg(unix)]
fn install(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let bin = dir.join("bin");
    fs::create_dir_all(&bin).unwrap();
    let path = bin.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    bin
}

/// Fake `az` answering the cluster and federated credential queries
#[cfg(unix)]
fn fake_az(dir: &Path, credential_issuer: &str) -> PathBuf {
    install(
        dir,
        "az",
        &format!(
            r#"case "$1 $2" in
  "aks show")
    echo '{{"name":"aks-workload-identity","oidcIssuerProfile":{{"enabled":true,"issuerUrl":"{ISSUER}"}},"securityProfile":{{"workloadIdentity":{{"enabled":true}}}}}}'
    ;;
  "identity federated-credential")
    echo '{{"name":"fc-workload-identity","issuer":"{credential_issuer}","subject":"system:serviceaccount:workload-identity:workload-identity-sa","audiences":["api://AzureADTokenExchange"]}}'
    ;;
  *)
    echo "ERROR: (ResourceNotFound) The resource could not be found." >&2
    exit 3
    ;;
esac
"#
        ),
    )
}

#[test]
fn test_verify_without_tools_reports_errors() {
    let temp = TempDir::new().unwrap();
    let empty = temp.path().join("empty");
    fs::create_dir_all(&empty).unwrap();

    let output = wiverify(temp.path())
        .args(["verify", "--json"])
        .env("PATH", &empty)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["passed"], 0);
    assert!(json["errors"].as_u64().unwrap() > 0);
    assert_eq!(json["results"][0]["status"], "error");
    assert!(json["results"][0]["detail"].as_str().unwrap().contains("cannot run az"));
}

#[test]
fn test_absent_policy_turns_errors_into_failures() {
    let temp = TempDir::new().unwrap();
    let empty = temp.path().join("empty");
    fs::create_dir_all(&empty).unwrap();
    fs::write(temp.path().join("wiverify.toml"), "[engine]\nquery_errors = \"absent\"\n").unwrap();

    let output = wiverify(temp.path())
        .args(["verify", "--json", "--only", "aks.*"])
        .env("PATH", &empty)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["errors"], 0);
    assert_eq!(json["failed"], 3);
    assert!(json["config"].as_str().unwrap().ends_with("wiverify.toml"));
}

#[cfg(unix)]
#[test]
fn test_verify_matching_issuer_passes() {
    let temp = TempDir::new().unwrap();
    let bin = fake_az(temp.path(), ISSUER);

    wiverify(temp.path())
        .args(["verify", "--only", "credential.issuer"])
        .env("PATH", &bin)
        .assert()
        .success()
        .stdout(predicate::str::contains("[PASS]"))
        .stdout(predicate::str::contains("VERIFIED: all gating rules passed"));
}

#[cfg(unix)]
#[test]
fn test_verify_issuer_mismatch_fails() {
    let temp = TempDir::new().unwrap();
    let bin = fake_az(temp.path(), "https://issuer.example/xyz/");

    wiverify(temp.path())
        .args(["verify", "--only", "credential.issuer"])
        .env("PATH", &bin)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("[FAIL]"))
        .stdout(predicate::str::contains("https://issuer.example/xyz/"))
        .stdout(predicate::str::contains(ISSUER))
        .stdout(predicate::str::contains("NOT VERIFIED: 1 gating rule(s) did not pass"));
}

#[cfg(unix)]
#[test]
fn test_verify_missing_vault_is_failure_not_error() {
    let temp = TempDir::new().unwrap();
    let bin = fake_az(temp.path(), ISSUER);

    let output = wiverify(temp.path())
        .args(["verify", "--json", "--only", "keyvault.exists"])
        .env("PATH", &bin)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let result = &json["results"][0];
    assert_eq!(result["status"], "fail");
    assert!(result["observed"].is_null());
    assert!(result["remediation"].as_str().unwrap().contains("az keyvault create"));
}

#[cfg(unix)]
#[test]
fn test_verify_passes_subscription() {
    let temp = TempDir::new().unwrap();
    let bin = install(
        temp.path(),
        "az",
        r#"for arg in "$@"; do
  if [ "$arg" = "sub-1234" ]; then
    echo '{"id":"/vaults/kv","name":"kv-workload-identity","properties":{"enableRbacAuthorization":true}}'
    exit 0
  fi
done
echo "ERROR: subscription not set" >&2
exit 1
"#,
    );

    wiverify(temp.path())
        .args(["verify", "--only", "keyvault.rbac-authorization"])
        .env("PATH", &bin)
        .env("WIVERIFY_SUBSCRIPTION", "sub-1234")
        .assert()
        .success();
}
