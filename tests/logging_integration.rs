use serde_json::Value;
use std::fs;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
    let addr = listener.local_addr().expect("address should be available");
    drop(listener);
    format!("http://{addr}")
}

fn unique_temp_dir(suffix: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock should be after unix epoch")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "factline-{suffix}-{stamp}-{}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("failed to create temp directory");
    dir
}

/// Runs the binary against endpoints that refuse connections, so the
/// completion call fails after startup logging has happened.
fn run_failing_completion(
    work_dir: &Path,
    log_output: &str,
    log_format: &str,
    log_file_path: Option<&Path>,
) -> Output {
    let base = unreachable_base_url();
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_factline"));
    cmd.arg("completion")
        .current_dir(work_dir)
        .env("OPENAI_API_KEY", "sk-test")
        .env("OPENAI_BASE_URL", &base)
        .env("FACTS_URL", format!("{base}/api/v2/facts/random"))
        .env("RETRY_ATTEMPTS", "0")
        .env("HTTP_TIMEOUT_SECS", "2")
        .env("RUST_LOG", "factline=info")
        .env("LOG_OUTPUT", log_output)
        .env("LOG_FORMAT", log_format);

    if let Some(path) = log_file_path {
        cmd.env("LOG_FILE_PATH", path);
    } else {
        cmd.env_remove("LOG_FILE_PATH");
    }

    cmd.output().expect("failed to run factline binary")
}

fn find_rotated_log_file(dir: &Path, base_file_name: &str) -> PathBuf {
    let expected_prefix = format!("{base_file_name}.");
    let mut matches: Vec<PathBuf> = fs::read_dir(dir)
        .expect("failed to read temp directory")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(&expected_prefix))
        })
        .collect();

    matches.sort();
    matches
        .pop()
        .expect("expected a rotated log file to be created")
}

#[test]
fn missing_openai_key_exits_non_zero() {
    let dir = unique_temp_dir("nokey");
    let output = Command::new(env!("CARGO_BIN_EXE_factline"))
        .current_dir(&dir)
        .env_remove("OPENAI_API_KEY")
        .env("LOG_OUTPUT", "stderr")
        .output()
        .expect("failed to run factline binary");

    assert!(!output.status.success(), "missing key should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("OPENAI_API_KEY"),
        "expected missing-key message, got:\n{stderr}"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn unsupported_flow_exits_non_zero() {
    let dir = unique_temp_dir("flow");
    let output = Command::new(env!("CARGO_BIN_EXE_factline"))
        .arg("interpretive-dance")
        .current_dir(&dir)
        .env("OPENAI_API_KEY", "sk-test")
        .env("LOG_OUTPUT", "stderr")
        .output()
        .expect("failed to run factline binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Unsupported flow 'interpretive-dance'"),
        "unexpected stderr:\n{stderr}"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn json_format_emits_json_log_lines_on_stderr() {
    let dir = unique_temp_dir("json");
    let output = run_failing_completion(&dir, "stderr", "json", None);
    assert!(
        !output.status.success(),
        "unreachable model API should fail command"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    let parsed: Vec<Value> = stderr
        .lines()
        .filter(|line| line.trim_start().starts_with('{'))
        .map(|line| serde_json::from_str::<Value>(line).expect("line should be valid JSON"))
        .collect();
    assert!(
        parsed.iter().any(|entry| {
            entry
                .get("fields")
                .and_then(|fields| fields.get("message"))
                .and_then(Value::as_str)
                == Some("loaded runtime configuration")
        }),
        "expected startup log message in JSON output, got stderr:\n{stderr}"
    );
    assert!(
        stderr.contains("Error calling OpenAI API"),
        "expected command error output on stderr:\n{stderr}"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn file_output_writes_logs_to_rotated_file() {
    let dir = unique_temp_dir("file");
    let log_path = dir.join("factline.log");
    let output = run_failing_completion(&dir, "file", "pretty", Some(&log_path));
    assert!(!output.status.success());

    let rotated = find_rotated_log_file(&dir, "factline.log");
    let file_contents = fs::read_to_string(&rotated).expect("failed to read rotated log file");
    assert!(
        file_contents.contains("loaded runtime configuration"),
        "expected startup log message in file, got:\n{file_contents}"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        !stderr.contains("loaded runtime configuration"),
        "did not expect normal logs on stderr for file-only mode:\n{stderr}"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn both_output_writes_logs_to_stderr_and_file() {
    let dir = unique_temp_dir("both");
    let log_path = dir.join("factline.log");
    let output = run_failing_completion(&dir, "both", "pretty", Some(&log_path));
    assert!(!output.status.success());

    let rotated = find_rotated_log_file(&dir, "factline.log");
    let file_contents = fs::read_to_string(&rotated).expect("failed to read rotated log file");
    assert!(file_contents.contains("loaded runtime configuration"));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("loaded runtime configuration"),
        "expected startup log message on stderr, got:\n{stderr}"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn invalid_file_path_falls_back_to_stderr_logging() {
    let dir = unique_temp_dir("fallback");
    let blocking_file = dir.join("not-a-directory");
    fs::write(&blocking_file, "block").expect("failed to create blocking file");
    let log_path = blocking_file.join("factline.log");

    let output = run_failing_completion(&dir, "file", "pretty", Some(&log_path));
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("failed to initialize LOG_OUTPUT=file"),
        "expected fallback warning, got:\n{stderr}"
    );
    assert!(stderr.contains("using stderr instead"));
    assert!(
        stderr.contains("loaded runtime configuration"),
        "expected logs to continue on stderr after fallback, got:\n{stderr}"
    );

    let _ = fs::remove_dir_all(&dir);
}
