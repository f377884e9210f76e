//! Provisioning through real child processes
//!
//! `true` and `false` ignore their arguments, which makes them stand-ins for a
//! cloud SDK that succeeds or fails. Scripts written to a temp dir cover
//! argument passing and the optional timeout.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use resource_scaler::{
    provisioner::{CommandProvisioner, ProvisionError, Provisioner},
    scaler::{ScaleOutcome, Scaler},
};

use crate::helpers::create_test_spec;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[tokio::test]
async fn test_successful_command() {
    let scaler = Scaler::new(CommandProvisioner::new("true"), create_test_spec());
    assert_eq!(scaler.scale_out().await, ScaleOutcome::Succeeded);
}

#[tokio::test]
async fn test_non_zero_exit_is_failure() {
    let provisioner = CommandProvisioner::new("false");

    let result = provisioner.provision(&create_test_spec()).await;

    assert_matches!(result, Err(ProvisionError::Exited { code: Some(1), .. }));
}

#[tokio::test]
async fn test_missing_program_becomes_failed_outcome() {
    let scaler = Scaler::new(
        CommandProvisioner::new("./google-cloud-sdk/bin/does-not-exist"),
        create_test_spec(),
    );

    let outcome = scaler.scale_out().await;

    assert!(!outcome.is_success());
    assert!(
        outcome
            .error()
            .unwrap()
            .starts_with("failed to run `./google-cloud-sdk/bin/does-not-exist compute instances create")
    );
}

#[tokio::test]
async fn test_scripted_sdk() {
    let dir = tempfile::tempdir().unwrap();

    // arguments reach the command unchanged
    let args_file = dir.path().join("args.txt");
    let recorder = write_script(
        dir.path(),
        "record",
        &format!("echo \"$@\" > {}", args_file.display()),
    );
    CommandProvisioner::new(&recorder)
        .provision(&create_test_spec())
        .await
        .unwrap();
    assert_eq!(
        std::fs::read_to_string(&args_file).unwrap().trim(),
        "compute instances create gcp-instance --machine-type=e2-medium --zone=asia-south2-a"
    );

    // exit codes other than 1 are reported as-is
    let quota = write_script(dir.path(), "quota", "exit 3");
    let result = CommandProvisioner::new(&quota)
        .provision(&create_test_spec())
        .await;
    assert_matches!(result, Err(ProvisionError::Exited { code: Some(3), .. }));

    // a hanging command is cut off only when a timeout is configured
    let hanging = write_script(dir.path(), "hang", "sleep 30");
    let result = CommandProvisioner::new(&hanging)
        .with_timeout(Some(Duration::from_millis(200)))
        .provision(&create_test_spec())
        .await;
    assert_matches!(result, Err(ProvisionError::TimedOut { .. }));
}
