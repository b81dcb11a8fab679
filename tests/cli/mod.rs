use std::path::Path;
use std::process::Output;

use tempfile::TempDir;
use tokio::process::Command;

use crate::commons::unique_database_url;
use crate::commons::write_service_account;

/// Credentials and emulator state shared by the invocations of one test.
struct Workspace {
    dir: TempDir,
    url: String,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        write_service_account(&dir);
        Self {
            dir,
            url: unique_database_url(),
        }
    }

    fn cert(&self) -> std::path::PathBuf {
        self.dir.path().join("serviceAccountKey.json")
    }

    fn state_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("state")
    }

    async fn run(
        &self,
        args: &[&str],
    ) -> Output {
        harness_command()
            .arg("--database-url")
            .arg(&self.url)
            .arg("--cert")
            .arg(self.cert())
            .arg("--state-dir")
            .arg(self.state_dir())
            .args(args)
            .output()
            .await
            .unwrap()
    }
}

fn harness_command() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_rtdb-race"));
    // Keep ambient configuration out of the child process.
    command.env_remove("RTDB__DATABASE__URL");
    command.env_remove("RTDB__DATABASE__CERT");
    command.env_remove("RTDB__EMULATOR__STATE_DIR");
    command.env_remove("CONFIG_PATH");
    command.env("RUST_LOG", "error");
    command
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn assert_success(output: &Output) {
    assert!(output.status.success(), "stderr: {}", stderr(output));
}

fn state_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

#[tokio::test]
async fn all_command_succeeds_against_emulator() {
    let workspace = Workspace::new();
    assert_success(&workspace.run(&["all"]).await);
}

#[tokio::test]
async fn reset_then_race_in_separate_processes() {
    let workspace = Workspace::new();

    assert_success(&workspace.run(&["reset"]).await);
    assert_eq!(state_files(&workspace.state_dir()), 1);

    let race = workspace.run(&["race"]).await;
    assert_success(&race);
    assert!(!stderr(&race).contains("Calls missing"));
}

#[tokio::test]
async fn race_before_reset_asks_for_seed() {
    let workspace = Workspace::new();

    let output = workspace.run(&["race"]).await;
    assert!(!output.status.success());
    let stderr = stderr(&output);
    assert!(stderr.contains("not seeded"), "stderr: {}", stderr);
    assert!(!stderr.contains("Calls missing"));
    // Failures are logged once, without a debug dump of the error.
    assert!(!stderr.contains("NotSeeded"));
}

#[tokio::test]
async fn pause_flag_applies_to_all() {
    let workspace = Workspace::new();
    assert_success(&workspace.run(&["--pause-ms", "20", "all"]).await);
    assert_success(&workspace.run(&["race", "--pause-ms", "20"]).await);
}

#[tokio::test]
async fn missing_cert_fails_before_connecting() {
    let output = harness_command()
        .arg("--database-url")
        .arg(unique_database_url())
        .arg("--cert")
        .arg("/definitely/not/here.json")
        .arg("reset")
        .output()
        .await
        .unwrap();

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Problem reading certificate"));
}

#[tokio::test]
async fn probe_reports_reproduction_rate() {
    let workspace = Workspace::new();

    let output = workspace.run(&["probe", "--iterations", "3"]).await;
    assert_success(&output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("reproduced 0 of 3 races"));
}
