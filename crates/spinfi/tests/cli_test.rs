//! Integration tests for the `spinfi` CLI binary.
//!
//! Every test runs against a throwaway config and ledger in a temp dir,
//! so nothing touches the user's real state. Hotspot logins go to a
//! wiremock server.
#![allow(clippy::unwrap_used)]

use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

// ── Helpers ─────────────────────────────────────────────────────────

const NEUTRAL_ONLY: &str = r#"
[wheel]
prizes = [{ name = "Thanks", weight = 1, category = "neutral" }]
"#;

const ALWAYS_OPEN: &str = r#"
[free_window]
days = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"]
start_hour = 0
end_hour = 24
username = "free-user"
password_env = "HOTSPOT_TEST_PW"
"#;

const NEVER_OPEN: &str = r#"
[free_window]
days = []
username = "free-user"
password_env = "HOTSPOT_TEST_PW"
"#;

/// Isolated config + ledger pair.
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new(config: &str) -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.toml"), config).unwrap();
        Self { dir }
    }

    fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    fn ledger_path(&self) -> PathBuf {
        self.dir.path().join("ledger.json")
    }

    /// `spinfi` pointed at this sandbox, with delays disabled.
    fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = spinfi_cmd();
        cmd.env("HOME", self.dir.path())
            .env("XDG_CONFIG_HOME", self.dir.path())
            .env("XDG_DATA_HOME", self.dir.path())
            .arg("--config")
            .arg(self.config_path())
            .arg("--ledger")
            .arg(self.ledger_path())
            .args(["--instant", "--color", "never"]);
        cmd
    }

    fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.cmd().args(args).args(["-o", "json"]).output().unwrap();
        assert!(
            output.status.success(),
            "spinfi {args:?} failed:\n{}",
            combined_output(&output)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

/// Build a [`Command`] for the `spinfi` binary with env isolation.
fn spinfi_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("spinfi");
    cmd.env("HOME", "/tmp/spinfi-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/spinfi-cli-test-nonexistent")
        .env("XDG_DATA_HOME", "/tmp/spinfi-cli-test-nonexistent")
        .env("HOTSPOT_TEST_PW", "letmein")
        .env_remove("SPINFI_CONFIG_FILE")
        .env_remove("SPINFI_LEDGER_FILE")
        .env_remove("SPINFI_OUTPUT")
        .env_remove("SPINFI_INSTANT")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = spinfi_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    spinfi_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("reward wheel")
            .and(predicate::str::contains("spin"))
            .and(predicate::str::contains("free-connect"))
            .and(predicate::str::contains("simulate")),
    );
}

#[test]
fn test_version_flag() {
    spinfi_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("spinfi"));
}

#[test]
fn test_invalid_subcommand() {
    spinfi_cmd()
        .arg("teleport")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    spinfi_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    spinfi_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Prize table ─────────────────────────────────────────────────────

#[test]
fn test_prizes_lists_standard_table() {
    let sandbox = Sandbox::new("");
    sandbox
        .cmd()
        .args(["prizes", "-o", "plain"])
        .assert()
        .success()
        .stdout("Thanks\n3 Hours\n100MB\n1GB\n500MB\n1 Hour\n1 More Chance\n");
}

#[test]
fn test_simulate_counts_every_draw() {
    let sandbox = Sandbox::new("");
    let tally = sandbox.json(&["simulate", "-n", "2000", "--seed", "42"]);
    let rows = tally.as_array().unwrap();
    assert_eq!(rows.len(), 7);

    let total: u64 = rows.iter().map(|r| r["count"].as_u64().unwrap()).sum();
    assert_eq!(total, 2000);

    let thanks = &rows[0];
    assert_eq!(thanks["prize"], "Thanks");
    assert!(thanks["count"].as_u64().unwrap() > 1000);
}

#[test]
fn test_simulate_is_reproducible_with_seed() {
    let sandbox = Sandbox::new("");
    let a = sandbox.json(&["simulate", "-n", "500", "--seed", "7"]);
    let b = sandbox.json(&["simulate", "-n", "500", "--seed", "7"]);
    assert_eq!(a, b);
}

// ── Free window ─────────────────────────────────────────────────────

#[test]
fn test_window_open_on_saturday_night() {
    let sandbox = Sandbox::new("");
    sandbox
        .cmd()
        .args(["window", "--at", "2026-10-24 01:30", "-o", "plain"])
        .assert()
        .success()
        .stdout("open\n");
}

#[test]
fn test_window_closed_at_end_hour_and_on_weekdays() {
    let sandbox = Sandbox::new("");
    for at in ["2026-10-24 03:00", "2026-10-19 01:00"] {
        sandbox
            .cmd()
            .args(["window", "--at", at, "-o", "plain"])
            .assert()
            .success()
            .stdout("closed\n");
    }
}

#[test]
fn test_window_rejects_bad_time() {
    let sandbox = Sandbox::new("");
    sandbox
        .cmd()
        .args(["window", "--at", "saturday"])
        .assert()
        .code(2);
}

#[test]
fn test_free_connect_outside_window() {
    let sandbox = Sandbox::new(NEVER_OPEN);
    sandbox
        .cmd()
        .arg("free-connect")
        .assert()
        .code(5)
        .stderr(predicate::str::contains("free access window is closed"));
}

#[test]
fn test_free_connect_without_login_url() {
    let sandbox = Sandbox::new(ALWAYS_OPEN);
    sandbox
        .cmd()
        .arg("free-connect")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Authentication system not ready"));
}

// ── Spinning ────────────────────────────────────────────────────────

#[test]
fn test_two_spins_per_day_then_denied() {
    let sandbox = Sandbox::new(NEUTRAL_ONLY);

    let first = sandbox.json(&["spin"]);
    assert_eq!(first["outcomes"][0]["kind"], "thanks");
    assert_eq!(first["spins_remaining"], 1);

    let second = sandbox.json(&["spin"]);
    assert_eq!(second["spins_remaining"], 0);

    let third = sandbox.json(&["spin"]);
    assert_eq!(third["outcomes"][0]["title"], "No Spins Left");
    assert_eq!(third["outcomes"][0]["failure"], "no_spins_left");

    let status = sandbox.json(&["status"]);
    assert_eq!(status["spins_remaining"], 0);
    assert_eq!(status["total_spins"], 2);
    assert_eq!(status["history_len"], 2);
}

#[test]
fn test_history_newest_first() {
    let sandbox = Sandbox::new(NEUTRAL_ONLY);
    sandbox.json(&["spin"]);
    sandbox.json(&["spin"]);

    let history = sandbox.json(&["history", "--limit", "1"]);
    let rows = history.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["prize"], "Thanks");
    assert_eq!(rows[0]["type"], "thanks");
}

#[test]
fn test_fresh_ledger_status() {
    let sandbox = Sandbox::new("");
    let status = sandbox.json(&["status"]);
    assert_eq!(status["spins_remaining"], 2);
    assert_eq!(status["total_spins"], 0);
    assert!(status["next_free_window"].is_string());

    // Shutdown leaves a feature-state snapshot behind.
    let ledger = std::fs::read_to_string(sandbox.ledger_path()).unwrap();
    assert!(ledger.contains("smartnet_feature_state"));
}

#[test]
fn test_session_prize_without_credential() {
    let sandbox = Sandbox::new(
        r#"
        [wheel]
        prizes = [{ name = "3 Hours", weight = 1, category = "time_grant", payload = "3h" }]
        "#,
    );
    sandbox
        .cmd()
        .args(["spin", "-o", "plain"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Connection Error"))
        .stderr(predicate::str::contains("[credentials.3h]"));
}

#[test]
fn test_reset_requires_yes_when_not_interactive() {
    let sandbox = Sandbox::new(NEUTRAL_ONLY);
    sandbox
        .cmd()
        .arg("reset")
        .write_stdin("")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--yes"));
}

#[test]
fn test_reset_restores_allowance() {
    let sandbox = Sandbox::new(NEUTRAL_ONLY);
    sandbox.json(&["spin"]);
    sandbox.json(&["spin"]);

    sandbox.cmd().args(["reset", "--yes"]).assert().success();
    let status = sandbox.json(&["status"]);
    assert_eq!(status["spins_remaining"], 2);
    assert_eq!(status["total_spins"], 2);
}

#[test]
fn test_corrupt_ledger_is_reported() {
    let sandbox = Sandbox::new("");
    std::fs::write(sandbox.ledger_path(), "{not json").unwrap();
    sandbox
        .cmd()
        .arg("status")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Ledger unavailable"));
}

// ── Hotspot login ───────────────────────────────────────────────────

mod hotspot {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn with_login_url(config: &str, server: &MockServer) -> String {
        format!(
            "{config}\n[hotspot]\nlogin_url = \"{}/login\"\ntimeout = 5\n",
            server.uri()
        )
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn time_prize_logs_the_winner_in() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .and(body_string_contains("username=winner-3h"))
            .and(body_string_contains("password=letmein"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let sandbox = Sandbox::new(&with_login_url(
            r#"
            [wheel]
            prizes = [{ name = "3 Hours", weight = 1, category = "time_grant", payload = "3h" }]

            [credentials.3h]
            username = "winner-3h"
            password_env = "HOTSPOT_TEST_PW"
            "#,
            &server,
        ));

        let report = sandbox.json(&["spin"]);
        assert_eq!(report["outcomes"][0]["kind"], "win");
        assert_eq!(report["outcomes"][0]["title"], "Congratulations!");
        assert_eq!(report["sessions_started"], 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn free_connect_logs_in_during_window() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .and(body_string_contains("username=free-user"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let sandbox = Sandbox::new(&with_login_url(ALWAYS_OPEN, &server));
        sandbox
            .cmd()
            .arg("free-connect")
            .assert()
            .success()
            .stderr(predicate::str::contains("Connecting to Free WiFi..."));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rejected_login_exits_with_connection_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let sandbox = Sandbox::new(&with_login_url(ALWAYS_OPEN, &server));
        sandbox.cmd().arg("free-connect").assert().code(7);
    }
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_prints_both_files() {
    let sandbox = Sandbox::new("");
    sandbox
        .cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains(sandbox.config_path().display().to_string())
                .and(predicate::str::contains(
                    sandbox.ledger_path().display().to_string(),
                )),
        );
}

#[test]
fn test_config_show_redacts_passwords() {
    let sandbox = Sandbox::new(
        r#"
        [free_window]
        username = "free-user"
        password = "hunter2"
        "#,
    );
    sandbox
        .cmd()
        .args(["config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("free-user").and(predicate::str::contains("hunter2").not()));
}

#[test]
fn test_config_set_password_validates_scope() {
    let sandbox = Sandbox::new("");
    sandbox
        .cmd()
        .args(["config", "set-password", "nonsense"])
        .assert()
        .code(2);
}
