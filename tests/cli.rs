// Drives the compiled binary for the non-interactive subcommands. HOME and
// the XDG dirs point into a temp dir so no real state is touched.

use assert_cmd::Command;
use tempfile::{tempdir, TempDir};

fn kogni(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("kogni").unwrap();
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_DATA_HOME", home.path().join("data"))
        .env_remove("KOGNI_LOG");
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "{:?}", output);
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn levels_prints_the_memory_table() {
    let home = tempdir().unwrap();
    let out = stdout_of(kogni(&home).args(["levels", "--game", "verbal-memory"]));
    assert!(out.starts_with("Verbal Memory"));
    assert!(out.contains(" 1  10 rounds  6 digits, shown 2000ms, answer 10000ms"));
    assert!(out.contains("15  10 rounds  10 digits, shown 1000ms, answer 8000ms"));
    assert!(out.contains("exam  21 rounds  4 to 10 digits"));
}

#[test]
fn fresh_history_is_empty() {
    let home = tempdir().unwrap();
    let out = stdout_of(kogni(&home).arg("history"));
    assert!(out.is_empty());
    assert!(home
        .path()
        .join(".local/state/kogni/results.db")
        .exists());
}

#[test]
fn stats_and_export_work_without_results() {
    let home = tempdir().unwrap();
    let out = stdout_of(kogni(&home).args(["stats", "--player", "ada"]));
    assert!(out.contains("player       ada"));
    assert!(out.contains("tests        0"));

    let csv = home.path().join("out.csv");
    kogni(&home)
        .args(["export", csv.to_str().unwrap()])
        .assert()
        .success()
        .stderr("exported 0 results\n");
    let text = std::fs::read_to_string(csv).unwrap();
    assert_eq!(text, "played_at,game_name,level,score\n");
}

#[test]
#[cfg(target_os = "linux")]
fn config_changes_are_saved() {
    let home = tempdir().unwrap();
    stdout_of(kogni(&home).args(["config", "--game", "corridor-memory", "--level", "6"]));

    let out = stdout_of(kogni(&home).arg("config"));
    assert!(out.contains("kogni/config.json"));
    assert!(out.contains(r#""default_game": "corridor-memory""#));
    assert!(out.contains(r#""default_level": 6"#));
    assert!(home.path().join("config/kogni/config.json").exists());
}

#[test]
fn play_needs_a_terminal() {
    let home = tempdir().unwrap();
    let output = kogni(&home)
        .args(["play", "--game", "corridor-memory"])
        .write_stdin("")
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("stdin must be a tty"));
}

#[test]
fn unknown_game_is_rejected() {
    let home = tempdir().unwrap();
    kogni(&home)
        .args(["levels", "--game", "chess"])
        .assert()
        .failure();
}

#[test]
#[cfg(target_os = "linux")]
fn malformed_config_is_logged_and_ignored() {
    let home = tempdir().unwrap();
    let config_dir = home.path().join("config/kogni");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.json"), "not json").unwrap();

    let output = kogni(&home)
        .args(["levels", "-g", "corridor-memory"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("warning: ignoring"));

    let log = std::fs::read_to_string(home.path().join(".local/state/kogni/kogni.log")).unwrap();
    assert!(log.contains("WARN"));
    assert!(log.contains("ignoring unreadable config"));
    assert!(log.contains("malformed config"));
}
