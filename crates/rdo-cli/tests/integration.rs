use assert_cmd::Command;
use predicates::prelude::*;

fn rdo() -> Command {
    Command::cargo_bin("rdo").unwrap()
}

#[test]
fn unknown_command_exits_one_with_usage_on_stderr() {
    rdo()
        .arg("frobnicate")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn bad_flag_exits_one() {
    rdo().args(["validate", "--mode", "nope"]).assert().code(1);
}

#[test]
fn help_lists_modes() {
    rdo()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("replicate"))
        .stdout(predicate::str::contains("deploy-ha"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn validate_without_configuration_fails_naming_missing_vars() {
    let dir = tempfile::tempdir().unwrap();
    rdo()
        .current_dir(dir.path())
        .env_remove("REDIS_PASSWORD")
        .env_remove("REDIS_MAXMEMORY")
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing required variables"))
        .stderr(predicate::str::contains("REDIS_PASSWORD"));
}

#[test]
fn validate_rejects_malformed_maxmemory() {
    let dir = tempfile::tempdir().unwrap();
    rdo()
        .current_dir(dir.path())
        .env("REDIS_PASSWORD", "pw")
        .env("REDIS_MAXMEMORY", "lots")
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("REDIS_MAXMEMORY"));
}

#[test]
fn init_then_validate_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    rdo()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("will not be shown again"));

    assert!(dir.path().join(".env").exists());
    assert!(dir.path().join("docker-compose.yml").exists());
    assert!(dir.path().join("Dockerfile").exists());

    rdo()
        .current_dir(dir.path())
        .env_remove("REDIS_PASSWORD")
        .env_remove("REDIS_MAXMEMORY")
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("configuration valid"));

    // sentinel mode is also satisfied by the scaffold, and the quorum it
    // configured is reported back
    rdo()
        .current_dir(dir.path())
        .env_remove("REDIS_MAXMEMORY")
        .env_remove("SENTINEL_QUORUM")
        .args(["validate", "--mode", "full"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sentinel quorum: 2"));
}

#[test]
fn init_scaffold_quorum_matches_env() {
    let dir = tempfile::tempdir().unwrap();
    rdo().current_dir(dir.path()).arg("init").assert().success();

    let env_file = std::fs::read_to_string(dir.path().join(".env")).unwrap();
    let quorum = env_file
        .lines()
        .find_map(|l| l.strip_prefix("SENTINEL_QUORUM="))
        .unwrap();
    let sentinel = std::fs::read_to_string(dir.path().join("sentinel.conf")).unwrap();
    assert!(sentinel.contains(&format!("sentinel monitor rdo-primary redis-primary 6379 {quorum}")));
}

#[test]
fn init_refuses_to_overwrite_env() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".env"), "REDIS_PASSWORD=existing\n").unwrap();
    rdo()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("refusing to overwrite"));
    let contents = std::fs::read_to_string(dir.path().join(".env")).unwrap();
    assert_eq!(contents, "REDIS_PASSWORD=existing\n");
}

#[test]
fn init_does_not_echo_generated_password() {
    let dir = tempfile::tempdir().unwrap();
    let output = rdo().current_dir(dir.path()).arg("init").output().unwrap();
    assert!(output.status.success());
    let env_file = std::fs::read_to_string(dir.path().join(".env")).unwrap();
    let password = env_file
        .lines()
        .find_map(|l| l.strip_prefix("REDIS_PASSWORD="))
        .unwrap()
        .to_string();
    assert_eq!(password.len(), 32);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains(&password));
}
