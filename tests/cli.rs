use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

struct TestEnv {
    root: tempfile::TempDir,
}

impl TestEnv {
    fn new() -> Self {
        let root = tempdir().expect("temp dir");
        fs::create_dir_all(root.path().join("recipes")).unwrap();
        fs::create_dir_all(root.path().join("library")).unwrap();
        TestEnv { root }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("recipe-deck").expect("binary exists");
        cmd.env("RECIPES_FOLDER", self.root.path().join("recipes"))
            .env("LIBRARY_FOLDER", self.root.path().join("library"))
            .env("CONFIG_FILE", self.root.path().join("config.json"))
            .env("CRON_FILE", self.root.path().join("cron_recipes"))
            .env("CRON_RELOAD_CMD", "true")
            .env("CONVERTER_COMMAND", "true");
        cmd
    }
}

#[test]
fn scan_lists_discovered_recipes() {
    let env = TestEnv::new();
    fs::write(
        env.root.path().join("recipes").join("daily.recipe"),
        "title = 'Daily'",
    )
    .unwrap();

    env.command()
        .arg("scan")
        .assert()
        .success()
        .stdout(predicate::str::contains("daily"))
        .stdout(predicate::str::contains("Daily"));
}

#[test]
fn run_all_reports_per_recipe_outcomes() {
    let env = TestEnv::new();
    fs::write(
        env.root.path().join("recipes").join("daily.recipe"),
        "title = 'Daily'",
    )
    .unwrap();

    env.command().arg("scan").assert().success();
    env.command()
        .arg("run-all")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"success\": true"));
}

#[test]
fn run_all_on_fresh_environment_reconciles_before_converting() {
    let env = TestEnv::new();
    fs::write(
        env.root.path().join("recipes").join("daily.recipe"),
        "title = 'Daily'",
    )
    .unwrap();

    // No prior scan: the config document does not exist yet. The recipe must
    // still be discovered and converted.
    env.command()
        .arg("run-all")
        .assert()
        .success()
        .stdout(predicate::str::contains("daily"))
        .stdout(predicate::str::contains("\"success\": true"));
}

#[test]
fn running_unknown_recipe_fails_with_not_found() {
    let env = TestEnv::new();
    env.command()
        .arg("run")
        .arg("ghost")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn schedule_command_writes_cron_file() {
    let env = TestEnv::new();
    env.command()
        .arg("schedule")
        .arg("*/3")
        .arg("45")
        .assert()
        .success();

    let cron = fs::read_to_string(env.root.path().join("cron_recipes")).unwrap();
    assert!(cron.starts_with("45 */3 * * * "));
}

#[test]
fn import_command_copies_and_registers_recipes() {
    let env = TestEnv::new();
    let incoming = env.root.path().join("incoming");
    fs::create_dir_all(&incoming).unwrap();
    fs::write(incoming.join("fresh.recipe"), "title = 'Fresh'").unwrap();

    env.command()
        .arg("import")
        .arg(&incoming)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"imported\": 1"));

    assert!(env
        .root
        .path()
        .join("recipes")
        .join("fresh.recipe")
        .exists());
}
