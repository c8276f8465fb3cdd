use fj_cli::commands::{inspect_command, lower_command, InspectArgs, LowerArgs};
use fj_cli::config::FjConfig;
use fj_cli::diagnostics::FjDiagnostic;
use fj_cli::CliError;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

mod support;

use support::{broken, returns_int, sample_class, write_class};

fn lower_args(input: std::path::PathBuf) -> LowerArgs {
    LowerArgs {
        input,
        ..LowerArgs::default()
    }
}

#[test]
fn lowered_artifact_can_be_inspected() {
    let dir = TempDir::new().unwrap();
    let input = write_class(dir.path(), &sample_class(vec![returns_int("answer", 42)]));

    let summary = lower_command(lower_args(input), &FjConfig::default()).unwrap();
    assert_eq!(summary.output, dir.path().join("Main.fjc"));
    assert_eq!(summary.methods, 1);
    assert!(summary.failed.is_empty());
    assert!(summary.listing.is_none());

    let listing = inspect_command(InspectArgs {
        input: summary.output,
    })
    .unwrap();
    assert!(listing.starts_with("class demo/Main (version 55"), "{}", listing);
    assert!(listing.contains("method answer()I"), "{}", listing);
    assert!(listing.contains("bipush 42"), "{}", listing);
    assert!(listing.contains("ireturn"), "{}", listing);
}

#[test]
fn listing_matches_the_inspected_artifact() {
    let dir = TempDir::new().unwrap();
    let input = write_class(dir.path(), &sample_class(vec![returns_int("answer", 7)]));
    let args = LowerArgs {
        listing: true,
        output: Some(dir.path().join("out.bin")),
        ..lower_args(input)
    };

    let summary = lower_command(args, &FjConfig::default()).unwrap();
    let inspected = inspect_command(InspectArgs {
        input: dir.path().join("out.bin"),
    })
    .unwrap();
    assert_eq!(summary.listing, Some(inspected));
}

#[test]
fn command_line_flags_override_the_config() {
    let dir = TempDir::new().unwrap();
    let input = write_class(dir.path(), &sample_class(vec![returns_int("answer", 1)]));
    let mut config = FjConfig::default();
    config.output.extension = "art".to_string();
    let args = LowerArgs {
        class_version: Some(52),
        listing: true,
        ..lower_args(input)
    };

    let summary = lower_command(args, &config).unwrap();
    assert_eq!(summary.output, dir.path().join("Main.art"));
    assert!(summary.listing.unwrap().contains("(version 52,"));
}

#[test]
fn failed_methods_are_reported_and_left_out() {
    let dir = TempDir::new().unwrap();
    let class = sample_class(vec![returns_int("ok", 1), broken("stop")]);
    let input = write_class(dir.path(), &class);

    let summary = lower_command(lower_args(input), &FjConfig::default()).unwrap();
    assert_eq!(summary.methods, 1);
    assert_eq!(summary.failed, vec!["demo.Main.stop".to_string()]);
}

#[test]
fn fail_fast_turns_a_failure_into_an_error() {
    let dir = TempDir::new().unwrap();
    let input = write_class(dir.path(), &sample_class(vec![broken("stop")]));
    let args = LowerArgs {
        fail_fast: true,
        ..lower_args(input)
    };

    let err = lower_command(args, &FjConfig::default()).unwrap_err();
    assert!(matches!(err, CliError::Lowering(_)), "{:?}", err);
    assert!(!dir.path().join("Main.fjc").exists());
}

#[test]
fn malformed_json_becomes_a_diagnostic() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("Main.json");
    std::fs::write(&input, "{\n  \"name\": \n").unwrap();

    let err = lower_command(lower_args(input), &FjConfig::default()).unwrap_err();
    assert!(
        matches!(err, CliError::Diagnostic(FjDiagnostic::InvalidIr { .. })),
        "{:?}",
        err
    );
}

#[test]
fn garbage_artifact_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("Main.fjc");
    std::fs::write(&input, b"not an artifact").unwrap();

    let err = inspect_command(InspectArgs { input }).unwrap_err();
    assert!(
        matches!(err, CliError::Diagnostic(FjDiagnostic::BadArtifact { .. })),
        "{:?}",
        err
    );
}
