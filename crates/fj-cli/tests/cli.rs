use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

mod support;

use support::{broken, returns_int, sample_class, write_class};

fn fj(dir: &TempDir) -> Command {
    let config = dir.path().join("fj.toml");
    if !config.exists() {
        std::fs::write(&config, "").unwrap();
    }
    let mut cmd = Command::cargo_bin("fj").unwrap();
    cmd.current_dir(dir.path()).arg("--config").arg(config);
    cmd
}

#[test]
fn help_lists_the_subcommands() {
    Command::cargo_bin("fj")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("lower"))
        .stdout(predicate::str::contains("inspect"));
}

#[test]
fn version_is_reported() {
    Command::cargo_bin("fj")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn lower_prints_the_listing_and_writes_the_artifact() {
    let dir = TempDir::new().unwrap();
    let input = write_class(dir.path(), &sample_class(vec![returns_int("answer", 42)]));

    fj(&dir)
        .arg("lower")
        .arg(&input)
        .arg("--listing")
        .assert()
        .success()
        .stdout(predicate::str::contains("method answer()I"))
        .stdout(predicate::str::contains("bipush 42"));
    assert!(dir.path().join("Main.fjc").is_file());

    fj(&dir)
        .arg("inspect")
        .arg(dir.path().join("Main.fjc"))
        .assert()
        .success()
        .stdout(predicate::str::contains("class demo/Main"));
}

#[test]
fn config_file_enables_the_listing() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("fj.toml"), "[output]\nlisting = true\n").unwrap();
    let input = write_class(dir.path(), &sample_class(vec![returns_int("answer", 3)]));

    fj(&dir)
        .arg("lower")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("iconst_3"));
}

#[test]
fn method_failure_is_a_warning_not_an_exit_code() {
    let dir = TempDir::new().unwrap();
    let input = write_class(dir.path(), &sample_class(vec![returns_int("ok", 1), broken("stop")]));

    fj(&dir)
        .arg("lower")
        .arg(&input)
        .assert()
        .success()
        .stderr(predicate::str::contains("fj::method_failed"))
        .stderr(predicate::str::contains("demo.Main.stop"));
}

#[test]
fn invalid_input_fails_with_a_diagnostic() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("Main.json");
    std::fs::write(&input, "{ \"name\": [ }").unwrap();

    fj(&dir)
        .arg("lower")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("fj::invalid_ir"));
}
