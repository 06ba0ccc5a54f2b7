use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

fn spawn_shell() -> (Child, ChildStdin) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_musash"))
        .arg("--no-history-file")
        .env_remove("MUSASH_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to start musash");
    let stdin = child.stdin.take().unwrap();
    (child, stdin)
}

fn run_script(script: &str) -> Output {
    let (child, mut stdin) = spawn_shell();
    stdin.write_all(script.as_bytes()).unwrap();
    drop(stdin);
    child.wait_with_output().unwrap()
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn end_of_input_exits_cleanly() {
    let output = run_script("");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout_of(&output), "");
}

#[test]
fn output_redirect_goes_to_file_only() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.txt");
    fs::write(&out, "old contents\n").unwrap();

    let output = run_script(&format!("echo hi > {}\n", out.display()));
    assert_eq!(fs::read_to_string(&out).unwrap(), "hi\n");
    assert_eq!(stdout_of(&output), "child exited with status 0\n");
}

#[test]
fn input_redirect_feeds_program() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("words.txt");
    fs::write(&input, "pear\napple\n").unwrap();

    let output = run_script(&format!("sort < {}\n", input.display()));
    assert_eq!(
        stdout_of(&output),
        "apple\npear\nchild exited with status 0\n"
    );
}

#[test]
fn foreground_status_is_the_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("three.sh");
    fs::write(&script, "exit 3\n").unwrap();

    let output = run_script(&format!("sh {}\n", script.display()));
    assert_eq!(stdout_of(&output), "child exited with status 3\n");
}

#[test]
fn unknown_program_fails_in_child() {
    let output = run_script("musash-definitely-missing\necho still-here\n");
    assert!(stderr_of(&output).contains("musash-definitely-missing: command not found"));
    assert_eq!(
        stdout_of(&output),
        "child exited with status 127\nstill-here\nchild exited with status 0\n"
    );
}

#[test]
fn two_stage_pipeline_runs_to_completion() {
    let output = run_script("printf one\\ntwo\\nthree\\n | grep t\n");
    assert_eq!(
        stdout_of(&output),
        "two\nthree\nchild exited with status 0\n"
    );
}

#[test]
fn longer_pipelines_are_rejected() {
    let output = run_script("echo a | cat | cat\n");
    assert_eq!(stdout_of(&output), "");
    assert!(stderr_of(&output).contains("invalid pipe command"));
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn too_many_words_are_rejected() {
    let output = run_script("echo 1 2 3 4 5 6 7 8 9 10 11\n");
    assert_eq!(stdout_of(&output), "");
    assert!(stderr_of(&output).contains("too many arguments"));
}

#[test]
fn background_job_is_listed_then_reaped() {
    let (child, mut stdin) = spawn_shell();
    stdin.write_all(b"sleep 1 &\njobs\n").unwrap();
    stdin.flush().unwrap();
    thread::sleep(Duration::from_millis(2000));
    stdin.write_all(b"jobs\n").unwrap();
    drop(stdin);

    let output = child.wait_with_output().unwrap();
    let stdout = stdout_of(&output);
    let lines: Vec<&str> = stdout.lines().collect();

    assert!(lines[0].starts_with("[1] "), "unexpected output: {}", stdout);
    let pid = lines[0].trim_start_matches("[1] ");
    assert_eq!(lines[1], format!("[1] sleep 1 (PID: {})", pid));
    assert_eq!(lines[2], "[1] Done  sleep 1");
    assert_eq!(lines[3], "No background jobs");
}

#[test]
fn full_job_table_leaves_process_untracked() {
    let (child, mut stdin) = spawn_shell();
    let mut script = String::new();
    for _ in 0..11 {
        script.push_str("sleep 1 &\n");
    }
    script.push_str("jobs\n");
    stdin.write_all(script.as_bytes()).unwrap();
    drop(stdin);

    let output = child.wait_with_output().unwrap();
    let stdout = stdout_of(&output);
    let listed = stdout.lines().filter(|line| line.contains("(PID: ")).count();
    assert_eq!(listed, 10);
    assert!(stderr_of(&output).contains("job list is full"));
}

#[test]
fn variables_and_history_replay() {
    let output = run_script("who=world\necho hello $who\n!-1\n!1\nlistvars\n");
    assert_eq!(
        stdout_of(&output),
        "hello world\n\
         child exited with status 0\n\
         Repeating command: echo hello $who\n\
         hello world\n\
         child exited with status 0\n\
         Repeating command: who=world\n\
         User-defined variables:\n\
         who=world\n"
    );
}

#[test]
fn exit_builtin_ends_the_session() {
    let output = run_script("exit 5\necho never\n");
    assert_eq!(stdout_of(&output), "Exiting shell...\n");
    assert_eq!(output.status.code(), Some(5));
}

#[test]
fn cd_changes_directory_for_later_commands() {
    let dir = tempfile::tempdir().unwrap();
    let real = dir.path().canonicalize().unwrap();
    let output = run_script(&format!("cd {}\npwd\n", real.display()));
    assert_eq!(
        stdout_of(&output),
        format!("{}\nchild exited with status 0\n", real.display())
    );
}

#[test]
fn invalid_utf8_line_does_not_end_the_session() {
    let (child, mut stdin) = spawn_shell();
    stdin.write_all(b"echo \xff\necho still-here\n").unwrap();
    drop(stdin);

    let output = child.wait_with_output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout_of(&output).ends_with("still-here\nchild exited with status 0\n"));
}

#[test]
fn pipeline_waits_for_a_left_stage_that_outlives_the_right() {
    let (mut child, mut stdin) = spawn_shell();
    let mut stdout = BufReader::new(child.stdout.take().unwrap());
    let started = Instant::now();
    stdin.write_all(b"sleep 1 | true\n").unwrap();
    stdin.flush().unwrap();

    let mut line = String::new();
    stdout.read_line(&mut line).unwrap();
    assert_eq!(line, "child exited with status 0\n");
    assert!(
        started.elapsed() >= Duration::from_millis(900),
        "status reported after {:?}",
        started.elapsed()
    );

    drop(stdin);
    assert_eq!(child.wait().unwrap().code(), Some(0));
}

#[test]
fn pipeline_reports_right_stage_status() {
    let output = run_script("true | false\nfalse | true\n");
    assert_eq!(
        stdout_of(&output),
        "child exited with status 1\nchild exited with status 0\n"
    );
}

#[test]
fn pipeline_stage_redirect_captures_output() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("count.txt");

    let output = run_script(&format!("printf a\\nb\\nc\\n | wc -l > {}\n", out.display()));
    assert_eq!(stdout_of(&output), "child exited with status 0\n");
    assert_eq!(fs::read_to_string(&out).unwrap().trim(), "3");
}

#[test]
fn signal_death_is_reported_above_128() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("die.sh");
    fs::write(&script, "kill -9 $$\n").unwrap();

    let output = run_script(&format!("sh {}\n", script.display()));
    assert_eq!(stdout_of(&output), "child exited with status 137\n");
}

#[test]
fn unreadable_input_fails_only_the_child() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.txt");

    let output = run_script(&format!("cat < {}\necho after\n", missing.display()));
    assert!(stderr_of(&output).contains("missing.txt"));
    assert_eq!(
        stdout_of(&output),
        "child exited with status 1\nafter\nchild exited with status 0\n"
    );
}

#[test]
fn failed_background_job_reports_its_status() {
    let (child, mut stdin) = spawn_shell();
    stdin.write_all(b"false &\n").unwrap();
    stdin.flush().unwrap();
    thread::sleep(Duration::from_millis(500));
    stdin.write_all(b"jobs\n").unwrap();
    drop(stdin);

    let output = child.wait_with_output().unwrap();
    let stdout = stdout_of(&output);
    let lines: Vec<&str> = stdout.lines().collect();
    assert!(lines[0].starts_with("[1] "), "unexpected output: {}", stdout);
    assert_eq!(lines[1], "[1] Exit 1  false");
    assert_eq!(lines[2], "No background jobs");
}
