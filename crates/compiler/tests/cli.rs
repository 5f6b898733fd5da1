//! Binary-level tests: drive the `rexc` executable the way a user does.

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn rexc(dir: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_rexc"));
    command.current_dir(dir);
    command
}

#[test]
fn asm_flag_writes_rexion_asm_in_working_directory() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("hello.r4"), "define x : int;\nprint x;\n").unwrap();

    let result = rexc(dir.path())
        .args(["hello.r4", "--asm"])
        .output()
        .unwrap();
    assert!(result.status.success());
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("rexion.asm"));

    let asm = fs::read_to_string(dir.path().join("rexion.asm")).unwrap();
    assert!(asm.contains("_start:"));
    assert!(asm.contains("mov eax, 60"));
}

#[test]
fn stage_flags_accumulate_over_one_compilation() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("hello.r4"), "define x : int;\nprint x;\n").unwrap();

    let result = rexc(dir.path())
        .args(["hello.r4", "--tokens", "--parse", "--ir"])
        .output()
        .unwrap();
    assert!(result.status.success());
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("Token Dump"));
    assert!(stdout.contains("Program\n  Define x : int"));
    assert!(stdout.contains("[IR] PRINT x"));
}

#[test]
fn parse_error_exits_2() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("bad.r4"), "define x\n").unwrap();

    let result = rexc(dir.path()).args(["bad.r4", "--parse"]).output().unwrap();
    assert_eq!(result.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("expected"));
}

#[test]
fn missing_source_exits_1() {
    let dir = tempdir().unwrap();
    let result = rexc(dir.path())
        .args(["absent.r4", "--tokens"])
        .output()
        .unwrap();
    assert_eq!(result.status.code(), Some(1));
}

#[test]
fn unknown_target_exits_1() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("hello.r4"), "print x;\n").unwrap();
    let result = rexc(dir.path())
        .args(["hello.r4", "--asm", "--target", "mips"])
        .output()
        .unwrap();
    assert_eq!(result.status.code(), Some(1));
}

#[test]
fn unimplemented_target_fails_loudly() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("hello.r4"), "print x;\n").unwrap();
    let result = rexc(dir.path())
        .args(["hello.r4", "--asm", "--target", "arm64"])
        .output()
        .unwrap();
    assert_eq!(result.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("unsupported architecture"));
    assert!(!dir.path().join("rexion.asm").exists());
}

#[test]
fn meta_and_complete_macros_list_the_table() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("macros.r4meta"),
        r#"{"macros":[{"name":"ADDXY","expansion":"LOAD R1, x\nADD R3, R1"}]}"#,
    )
    .unwrap();

    let result = rexc(dir.path())
        .args(["--meta", "macros.r4meta", "--complete-macros"])
        .output()
        .unwrap();
    assert!(result.status.success());
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("|ADDXY|"));
    assert!(stdout.contains("ADD R3, R1"));
}

#[test]
fn rewrite_flag_expands_macro_lines() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("macros.r4meta"),
        r#"{"macros":[{"name":"HELLOPRINT","expansion":"LOAD R1, 'Hello, Rexion!'\nPRINT R1"}]}"#,
    )
    .unwrap();
    fs::write(dir.path().join("hello.r4"), "|HELLOPRINT|\nprint x;\n").unwrap();

    let result = rexc(dir.path())
        .args([
            "hello.r4",
            "--meta",
            "macros.r4meta",
            "--rewrite",
            "hello.rexasm",
        ])
        .output()
        .unwrap();
    assert!(result.status.success());
    let rewritten = fs::read_to_string(dir.path().join("hello.rexasm")).unwrap();
    assert_eq!(
        rewritten,
        ";; [Macro: HELLOPRINT]\nLOAD R1, 'Hello, Rexion!'\nPRINT R1\nprint x;\n"
    );
}

#[test]
fn batch_flag_processes_a_directory() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("macros.r4meta"), r#"{"macros":[]}"#).unwrap();
    fs::create_dir(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/a.r4"), "|MISSING|\n").unwrap();
    fs::write(dir.path().join("src/b.r4"), "print x;\n").unwrap();

    let result = rexc(dir.path())
        .args(["--meta", "macros.r4meta", "--batch", "src", "build"])
        .output()
        .unwrap();
    assert!(result.status.success());
    assert!(dir.path().join("build/a.rexasm").exists());
    assert_eq!(
        fs::read_to_string(dir.path().join("build/b.rexasm")).unwrap(),
        "print x;\n"
    );
}

#[test]
fn codex_flag_renders_the_overview_when_present() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("docs")).unwrap();
    fs::write(
        dir.path().join("docs/rexion_language_overview.md"),
        "# Rexion\n- define\n",
    )
    .unwrap();

    let result = rexc(dir.path()).arg("--codex").output().unwrap();
    assert!(result.status.success());
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("# Rexion"));

    let empty = tempdir().unwrap();
    let result = rexc(empty.path()).arg("--codex").output().unwrap();
    assert_eq!(result.status.code(), Some(1));
}

#[test]
fn stage_flags_without_source_exit_1() {
    let dir = tempdir().unwrap();
    let result = rexc(dir.path()).arg("--tokens").output().unwrap();
    assert_eq!(result.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("source file is required"));
}
