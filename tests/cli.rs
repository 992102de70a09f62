use std::{
    fs,
    path::Path,
    process::{Command, Output},
};

fn lumo(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lumo"))
        .current_dir(dir)
        .args(args)
        .env_remove("LUMO_DEBUG_TRACE")
        .env("LUMO_HOST_COMPILER", "lumo-missing-host-compiler")
        .output()
        .expect("failed to run lumo")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn compiles_into_the_output_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("hello.lumo"),
        "val greeting = \"hi\"\n{Browse greeting}\n",
    )
    .expect("write source");

    let output = lumo(dir.path(), &["-d", "out", "hello.lumo"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let text = fs::read_to_string(dir.path().join("out").join("hello.oz")).expect("generated");
    assert_eq!(
        text,
        "local\n  Greeting = \"hi\"\nin\n  {Browse Greeting}\nend\n"
    );
}

#[test]
fn semantic_errors_exit_with_one() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("bad.lumo"), "val x = 1\n{Show y}\n").expect("write source");

    let output = lumo(dir.path(), &["bad.lumo"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("bad.lumo:2: undefined variable y"));
    assert!(!dir.path().join("bad.oz").exists());
}

#[test]
fn usage_errors_exit_with_two() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = lumo(dir.path(), &["notes.txt"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("only .lumo files are accepted"));
}

#[test]
fn parse_flag_dumps_without_writing() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("tree.lumo"), "skip\n").expect("write source");

    let output = lumo(dir.path(), &["--parse", "tree.lumo"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Program"));
    assert!(!dir.path().join("tree.oz").exists());
}

#[test]
fn host_compiler_failure_keeps_the_generated_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("main.lumo"), "skip\n").expect("write source");

    let output = lumo(dir.path(), &["-c", "main.lumo"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("host compiler `lumo-missing-host-compiler` failed"));
    assert!(dir.path().join("main.oz").exists());
}
