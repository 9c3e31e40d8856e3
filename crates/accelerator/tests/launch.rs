use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::str::contains;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn config_dir(instance: &str, contents: &str) -> TempDir {
  let dir = TempDir::new().expect("create config dir");
  fs::write(dir.path().join(instance), contents).expect("write argument file");
  dir
}

fn launch(dir: &Path) -> Command {
  let mut cmd = cargo_bin_cmd!("accelerator-launch");
  cmd
    .env_remove("ACCELERATOR_PROGRAM")
    .env_remove("LOG_FORMAT")
    .arg("--config-dir")
    .arg(dir);
  cmd
}

#[test]
fn forwards_argument_file_verbatim() {
  let dir = config_dir("logitechrecv", "--device=logitechrecv --sensitivity=5\n");

  launch(dir.path())
    .args(&["--program", "/bin/echo", "logitechrecv"])
    .assert()
    .success()
    .stdout("--device=logitechrecv --sensitivity=5\n");
}

#[test]
fn comments_are_not_forwarded() {
  let dir = config_dir(
    "logitechrecv",
    "# Logitech M570\n-m 0.8 -a 0.05\n/dev/input/logitechrecv\n",
  );

  launch(dir.path())
    .args(&["--program", "/bin/echo", "logitechrecv"])
    .assert()
    .success()
    .stdout("-m 0.8 -a 0.05 /dev/input/logitechrecv\n");
}

#[test]
fn dry_run_prints_command_line() {
  let dir = config_dir("logitechrecv", "-m 1 -a 0.1 /dev/input/logitechrecv");

  launch(dir.path())
    .args(&["--dry-run", "logitechrecv"])
    .assert()
    .success()
    .stdout("/usr/local/bin/accelerator -m 1 -a 0.1 /dev/input/logitechrecv\n");
}

#[test]
fn missing_argument_file_fails() {
  let dir = TempDir::new().expect("create config dir");

  launch(dir.path())
    .args(&["--program", "/bin/echo", "logitechrecv"])
    .assert()
    .failure()
    .stdout("")
    .stderr(contains("logitechrecv"));
}

#[test]
fn instance_cannot_escape_config_dir() {
  let dir = config_dir("logitechrecv", "-m 1");

  launch(dir.path())
    .args(&["--program", "/bin/echo", "../logitechrecv"])
    .assert()
    .failure()
    .stderr(contains("Invalid device instance name"));
}

#[test]
fn unknown_program_fails() {
  let dir = config_dir("logitechrecv", "-m 1");

  launch(dir.path())
    .args(&["--program", "/nonexistent/accelerator", "logitechrecv"])
    .assert()
    .failure()
    .stderr(contains("/nonexistent/accelerator"));
}
