//! CLI integration tests
//!
//! Tests the command-line interface end-to-end.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// Run passlock with the password piped through stdin
fn run_passlock(subcommand: &str, input: &Path, output: &Path, password: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_passlock"))
        .arg("--password-stdin")
        .arg(subcommand)
        .arg("-i")
        .arg(input)
        .arg("-o")
        .arg(output)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn passlock");

    {
        let stdin = child.stdin.as_mut().expect("failed to open stdin");
        // Ignore BrokenPipe errors - the command may exit before reading stdin
        // if it encounters an error (e.g., file not found)
        let _ = stdin.write_all(password.as_bytes());
    }

    child.wait_with_output().expect("failed to wait for passlock")
}

fn assert_success(output: &Output, what: &str) {
    assert!(
        output.status.success(),
        "{} failed: {}",
        what,
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_create_open_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let plaintext = temp_dir.path().join("hello.txt");
    let vault = temp_dir.path().join("hello.passlock");
    let opened = temp_dir.path().join("hello-opened.txt");

    fs::write(&plaintext, "hello vault\n").unwrap();

    assert_success(&run_passlock("create", &plaintext, &vault, "correct horse"), "create");
    let armored = fs::read_to_string(&vault).unwrap();
    assert!(armored.starts_with("passlock1:"));
    assert!(!armored.contains("hello"));

    assert_success(&run_passlock("open", &vault, &opened, "correct horse"), "open");
    assert_eq!(fs::read_to_string(&opened).unwrap(), "hello vault\n");
}

#[test]
fn test_trailing_newline_in_password_is_ignored() {
    let temp_dir = TempDir::new().unwrap();
    let plaintext = temp_dir.path().join("plain.txt");
    let vault = temp_dir.path().join("plain.passlock");
    let opened = temp_dir.path().join("opened.txt");

    fs::write(&plaintext, "content").unwrap();

    assert_success(&run_passlock("create", &plaintext, &vault, "pw\n"), "create");
    assert_success(&run_passlock("open", &vault, &opened, "pw"), "open");
    assert_eq!(fs::read_to_string(&opened).unwrap(), "content");
}

#[test]
fn test_open_with_wrong_password_fails() {
    let temp_dir = TempDir::new().unwrap();
    let plaintext = temp_dir.path().join("plain.txt");
    let vault = temp_dir.path().join("plain.passlock");
    let opened = temp_dir.path().join("opened.txt");

    fs::write(&plaintext, "secret").unwrap();
    assert_success(&run_passlock("create", &plaintext, &vault, "correct horse"), "create");

    let result = run_passlock("open", &vault, &opened, "wrong horse");
    assert!(!result.status.success());
    assert!(!opened.exists());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(
        stderr.contains("wrong password"),
        "Expected error message about the password, got: {}",
        stderr
    );
}

#[test]
fn test_update_operation() {
    let temp_dir = TempDir::new().unwrap();
    let plaintext1 = temp_dir.path().join("plaintext1.txt");
    let plaintext2 = temp_dir.path().join("plaintext2.txt");
    let vault = temp_dir.path().join("vault.passlock");
    let opened = temp_dir.path().join("opened.txt");

    fs::write(&plaintext1, "Original content").unwrap();
    assert_success(&run_passlock("create", &plaintext1, &vault, "test"), "create");

    fs::write(&plaintext2, "Updated content").unwrap();
    assert_success(&run_passlock("update", &plaintext2, &vault, "test"), "update");

    assert_success(&run_passlock("open", &vault, &opened, "test"), "open");
    assert_eq!(fs::read_to_string(&opened).unwrap(), "Updated content");
}

#[test]
fn test_update_with_wrong_password_fails() {
    let temp_dir = TempDir::new().unwrap();
    let plaintext1 = temp_dir.path().join("plaintext1.txt");
    let plaintext2 = temp_dir.path().join("plaintext2.txt");
    let vault = temp_dir.path().join("vault.passlock");

    fs::write(&plaintext1, "Original").unwrap();
    assert_success(
        &run_passlock("create", &plaintext1, &vault, "correct_password"),
        "create",
    );
    let before = fs::read(&vault).unwrap();

    fs::write(&plaintext2, "Updated").unwrap();
    let result = run_passlock("update", &plaintext2, &vault, "wrong_password");

    assert!(!result.status.success());
    assert_eq!(fs::read(&vault).unwrap(), before);
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(
        stderr.contains("decrypt"),
        "Expected error message about decryption, got: {}",
        stderr
    );
}

#[test]
fn test_create_refuses_existing_vault() {
    let temp_dir = TempDir::new().unwrap();
    let plaintext = temp_dir.path().join("plain.txt");
    let vault = temp_dir.path().join("vault.passlock");

    fs::write(&plaintext, "content").unwrap();
    assert_success(&run_passlock("create", &plaintext, &vault, "test"), "create");
    let before = fs::read(&vault).unwrap();

    let result = run_passlock("create", &plaintext, &vault, "test");
    assert!(!result.status.success());
    assert_eq!(fs::read(&vault).unwrap(), before);
}

#[test]
fn test_open_nonexistent_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let nonexistent = temp_dir.path().join("nonexistent.passlock");
    let output = temp_dir.path().join("output.txt");

    let result = run_passlock("open", &nonexistent, &output, "test");

    assert!(!result.status.success());
    assert!(!output.exists());
}

#[test]
fn test_empty_password_fails() {
    let temp_dir = TempDir::new().unwrap();
    let plaintext = temp_dir.path().join("plain.txt");
    let vault = temp_dir.path().join("vault.passlock");

    fs::write(&plaintext, "content").unwrap();

    let result = run_passlock("create", &plaintext, &vault, "");
    assert!(!result.status.success());
    assert!(!vault.exists());
}

#[test]
fn test_empty_file_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let plaintext = temp_dir.path().join("empty.txt");
    let vault = temp_dir.path().join("empty.passlock");
    let opened = temp_dir.path().join("empty-opened.txt");

    fs::write(&plaintext, b"").unwrap();

    assert_success(&run_passlock("create", &plaintext, &vault, "test"), "create");
    assert_success(&run_passlock("open", &vault, &opened, "test"), "open");
    assert_eq!(fs::read(&opened).unwrap(), b"");
}

#[test]
fn test_large_file_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let plaintext = temp_dir.path().join("large.bin");
    let vault = temp_dir.path().join("large.passlock");
    let opened = temp_dir.path().join("large-opened.bin");

    let large_content = vec![0x42u8; 1024 * 1024];
    fs::write(&plaintext, &large_content).unwrap();

    assert_success(&run_passlock("create", &plaintext, &vault, "test"), "create");
    assert_success(&run_passlock("open", &vault, &opened, "test"), "open");
    assert_eq!(fs::read(&opened).unwrap(), large_content);
}
