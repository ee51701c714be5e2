use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const PASSWORD: &str = "test-password-secure-123";

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_owl"))
}

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    fn config_path(&self) -> PathBuf {
        self.dir.path().join("owl.toml")
    }

    fn logs_dir(&self) -> PathBuf {
        self.dir.path().join("owl-logs")
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(bin());
        cmd.env("OWL_CONFIG", self.config_path())
            .env_remove("OWL_PASSWORD")
            .env_remove("OWL_LOG")
            .env("NO_COLOR", "1");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command().args(args).output().expect("run owl")
    }

    fn run_with_password(&self, args: &[&str], password: &str) -> Output {
        self.command()
            .args(args)
            .env("OWL_PASSWORD", password)
            .output()
            .expect("run owl")
    }

    /// Write a config whose capture commands are plain shell echoes.
    fn write_config(&self, encrypted: bool, key_gen_rate: u32) {
        let contents = format!(
            r#"outDir = "owl-logs"
loggingInterval = 1
idleThreshold = 60

[encryption]
enabled = {}
keyGenRate = {}

[capture]
windowsCommand = "echo '[{{\"title\":\"Editor\",\"path\":\"/usr/bin/editor\",\"isActive\":true}}]'"
idleCommand = "echo 0"
"#,
            encrypted, key_gen_rate
        );
        std::fs::write(self.config_path(), contents).expect("write config");
    }

    fn encrypted_logs(&self) -> Vec<PathBuf> {
        logs_with_suffix(&self.logs_dir(), ".json.log.enc")
    }
}

fn logs_with_suffix(dir: &Path, suffix: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .expect("read logs dir")
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(suffix))
        })
        .collect();
    files.sort();
    files
}

fn assert_success(output: &Output, what: &str) {
    assert!(
        output.status.success(),
        "{} failed: stdout={}, stderr={}",
        what,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn setup_encrypted(ws: &Workspace) {
    ws.write_config(false, 2);
    let setup = ws.run_with_password(&["setup", "--bits", "1024", "--no-input"], PASSWORD);
    assert_success(&setup, "setup");
}

#[test]
fn test_init_writes_default_config_and_refuses_overwrite() {
    let ws = Workspace::new();

    let init = ws.run(&["init"]);
    assert_success(&init, "init");
    let contents = std::fs::read_to_string(ws.config_path()).expect("read config");
    assert!(contents.contains("outDir"));
    assert!(contents.contains("keyGenRate"));

    let again = ws.run(&["init"]);
    assert_eq!(again.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&again.stderr).contains("--force"));

    let forced = ws.run(&["init", "--force", "--out-dir", "elsewhere"]);
    assert_success(&forced, "init --force");
    let contents = std::fs::read_to_string(ws.config_path()).expect("read config");
    assert!(contents.contains("elsewhere"));
}

#[test]
fn test_plain_capture_appends_json_lines() {
    let ws = Workspace::new();
    ws.write_config(false, 10);

    for _ in 0..2 {
        assert_success(&ws.run(&["capture"]), "capture");
    }

    let logs = logs_with_suffix(&ws.logs_dir(), ".json.log");
    assert!(!logs.is_empty());
    let contents: String = logs
        .iter()
        .map(|path| std::fs::read_to_string(path).expect("read log"))
        .collect();
    let lines: Vec<&str> = contents.split('\n').filter(|l| !l.is_empty()).collect();
    assert_eq!(lines.len(), 2);
    for line in lines {
        let value: serde_json::Value = serde_json::from_str(line).expect("parse entry");
        assert!(value.get("time").is_some());
        assert_eq!(value["apps"][0]["title"], "Editor");
    }
}

#[test]
fn test_setup_capture_inspect_decrypt() {
    let ws = Workspace::new();
    setup_encrypted(&ws);

    let config = std::fs::read_to_string(ws.config_path()).expect("read config");
    assert!(config.contains("enabled = true"));
    assert!(ws.dir.path().join("keys").join("public.key").exists());
    assert!(ws.dir.path().join("keys").join("private.key").exists());
    assert!(ws.dir.path().join("keys").join("salt").exists());

    for _ in 0..3 {
        assert_success(&ws.run(&["capture"]), "capture");
    }

    let logs = ws.encrypted_logs();
    assert!(!logs.is_empty());
    let raw = std::fs::read(&logs[0]).expect("read encrypted log");
    assert_eq!(raw[0], b'A');
    assert!(!String::from_utf8_lossy(&raw).contains("Editor"));

    let inspect = ws.run(&["inspect", logs[0].to_str().expect("utf-8 path")]);
    assert_success(&inspect, "inspect");
    let listing = String::from_utf8_lossy(&inspect.stdout);
    assert!(listing.contains("symkey"));
    assert!(listing.contains("json"));

    let decrypt = ws.run_with_password(&["decrypt", "--no-input"], PASSWORD);
    assert_success(&decrypt, "decrypt");

    let decrypted = logs_with_suffix(&ws.logs_dir().join("decrypted"), ".json.log");
    assert_eq!(decrypted.len(), logs.len());
    let contents: String = decrypted
        .iter()
        .map(|path| std::fs::read_to_string(path).expect("read decrypted log"))
        .collect();
    assert_eq!(contents.matches("\"Editor\"").count(), 3);
}

#[test]
fn test_setup_refuses_to_replace_keys() {
    let ws = Workspace::new();
    setup_encrypted(&ws);

    let again = ws.run_with_password(&["setup", "--bits", "1024", "--no-input"], PASSWORD);
    assert_eq!(again.status.code(), Some(4));
}

#[test]
fn test_setup_rejects_short_password() {
    let ws = Workspace::new();
    ws.write_config(false, 2);

    let setup = ws.run_with_password(&["setup", "--bits", "1024", "--no-input"], "short");
    assert_eq!(setup.status.code(), Some(4));
    assert!(!ws.dir.path().join("keys").join("private.key").exists());
}

#[test]
fn test_decrypt_with_wrong_password_fails_auth() {
    let ws = Workspace::new();
    setup_encrypted(&ws);
    assert_success(&ws.run(&["capture"]), "capture");

    let decrypt = ws.run_with_password(&["decrypt", "--no-input"], "not-the-password");
    assert_eq!(decrypt.status.code(), Some(5));
    assert!(!ws.logs_dir().join("decrypted").exists());
}

#[test]
fn test_decrypt_reports_partial_failure() {
    let ws = Workspace::new();
    setup_encrypted(&ws);
    assert_success(&ws.run(&["capture"]), "capture");

    std::fs::write(ws.logs_dir().join("19990101.json.log.enc"), b"Z").expect("write corrupt log");

    let decrypt = ws.run_with_password(&["decrypt", "--no-input"], PASSWORD);
    assert_eq!(decrypt.status.code(), Some(6));
    let stderr = String::from_utf8_lossy(&decrypt.stderr);
    assert!(stderr.contains("could not be decrypted"));

    let decrypted = logs_with_suffix(&ws.logs_dir().join("decrypted"), ".json.log");
    assert_eq!(decrypted.len(), 1);
}

#[test]
fn test_decrypt_missing_source_is_not_found() {
    let ws = Workspace::new();
    ws.write_config(true, 2);

    let decrypt = ws.run_with_password(
        &["decrypt", "--no-input", "--source", "/nonexistent/owl-logs"],
        PASSWORD,
    );
    assert_eq!(decrypt.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&decrypt.stderr).contains("owl-logs"));
}

#[test]
fn test_capture_without_keys_points_to_setup() {
    let ws = Workspace::new();
    ws.write_config(true, 2);

    let capture = ws.run(&["capture"]);
    assert_eq!(capture.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&capture.stderr).contains("owl setup"));
}

#[test]
fn test_run_stops_after_max_captures() {
    let ws = Workspace::new();
    setup_encrypted(&ws);

    let run = ws.run(&["run", "--interval", "1", "--max-captures", "2"]);
    assert_success(&run, "run");

    let decrypt = ws.run_with_password(&["decrypt", "--no-input"], PASSWORD);
    assert_success(&decrypt, "decrypt");
    let contents: String = logs_with_suffix(&ws.logs_dir().join("decrypted"), ".json.log")
        .iter()
        .map(|path| std::fs::read_to_string(path).expect("read decrypted log"))
        .collect();
    assert_eq!(contents.matches("\"Editor\"").count(), 2);
}

#[test]
fn test_run_with_huge_interval_stops_cleanly() {
    let ws = Workspace::new();
    ws.write_config(false, 2);

    let interval = u64::MAX.to_string();
    let run = ws.run(&["run", "--interval", &interval, "--max-captures", "2"]);
    assert_success(&run, "run");

    let contents: String = logs_with_suffix(&ws.logs_dir(), ".json.log")
        .iter()
        .map(|path| std::fs::read_to_string(path).expect("read log"))
        .collect();
    assert_eq!(contents.matches("\"Editor\"").count(), 1);
}

#[test]
fn test_run_rejects_zero_interval() {
    let ws = Workspace::new();
    ws.write_config(false, 2);

    let run = ws.run(&["run", "--interval", "0", "--max-captures", "1"]);
    assert_eq!(run.status.code(), Some(4));
}
