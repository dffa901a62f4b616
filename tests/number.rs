use std::io::Write;
use std::process::{Command, Stdio};

fn run_number(input: &str) -> std::process::Output {
    let dir = tempfile::tempdir().unwrap();
    let mut child = Command::new(env!("CARGO_BIN_EXE_kestrel"))
        .arg("number")
        .current_dir(dir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

#[test]
fn number_assigns_new_file_line_numbers() {
    let diff = "diff --git a/src/lib.rs b/src/lib.rs\n\
                --- a/src/lib.rs\n\
                +++ b/src/lib.rs\n\
                @@ -1,3 +1,3 @@\n a\n-b\n+c\n d\n";
    let output = run_number(diff);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("## src/lib.rs"));
    assert!(stdout.contains("@@ -1,3 +1,3 @@"));
    assert!(stdout.contains("1: a"));
    assert!(stdout.contains("2: c"));
    assert!(stdout.contains("3: d"));
    // The removed line is dropped.
    assert!(!stdout.contains(": b"));
}

#[test]
fn number_rejects_empty_input() {
    let output = run_number("");
    assert!(!output.status.success());
}

#[test]
fn number_rejects_non_diff_input() {
    let output = run_number("this is not a diff\n");
    assert!(!output.status.success());
}
