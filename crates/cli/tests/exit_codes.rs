//! Exit status tests for the fleet-ping binary
//!
//! Every node answers through a shell one-liner, so no network is needed.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

use tempfile::TempDir;

const ALIVE_CMD: &str = "sh -c 'echo $0 is alive'";
const HUNG_CMD: &str = "sh -c 'sleep 30'";

fn write_conf(dir: &TempDir, ping_cmd: &str, nodes: &[&str]) -> PathBuf {
    let mut body = format!("ping_cmd = \"{ping_cmd}\"\nnodename = \"controller\"\n");
    for node in nodes {
        body.push_str(&format!("\n[[nodes]]\nname = \"{node}\"\ngroups = [\"web\"]\n"));
    }

    let path = dir.path().join("fleetping.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(body.as_bytes()).unwrap();
    path
}

fn fleet_ping(conf: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_fleet-ping"));
    command.env_remove("RUST_LOG").arg("--conf").arg(conf);
    command
}

fn run(command: &mut Command) -> Output {
    command.stdin(Stdio::null()).output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Wait for a child without blocking forever
fn wait_for(child: &mut std::process::Child, limit: Duration) -> std::process::ExitStatus {
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait().unwrap() {
            return status;
        }
        if started.elapsed() > limit {
            let _ = child.kill();
            panic!("fleet-ping still running after {limit:?}");
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

#[test]
fn test_all_nodes_up_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let conf = write_conf(&dir, ALIVE_CMD, &["a", "b", "c"]);

    let output = run(&mut fleet_ping(&conf));

    assert_eq!(output.status.code(), Some(0));
    let mut lines: Vec<String> = stdout(&output).lines().map(str::to_string).collect();
    lines.sort();
    assert_eq!(lines, vec!["a: up", "b: up", "c: up"]);
}

#[test]
fn test_everything_excluded_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    let conf = write_conf(&dir, ALIVE_CMD, &["a", "b"]);

    let output = run(fleet_ping(&conf).args(["-x", "a,b"]));

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output), "no valid nodes specified\n");
}

#[test]
fn test_unknown_node_exits_one_before_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    let conf = write_conf(&dir, ALIVE_CMD, &["a", "b"]);

    let output = run(fleet_ping(&conf).args(["-n", "a,nosuch"]));

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).contains("nosuch"));
}

#[test]
fn test_unknown_group_exits_one_before_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    let conf = write_conf(&dir, ALIVE_CMD, &["a", "b"]);

    let output = run(fleet_ping(&conf).args(["-g", "nosuchgroup"]));

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).contains("nosuchgroup"));
}

#[test]
fn test_missing_config_is_reported_once() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");

    let output = run(&mut fleet_ping(&missing));

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stderr(&output).matches("no such configuration file").count(),
        1
    );
}

#[test]
fn test_usage_errors_exit_one() {
    let dir = tempfile::tempdir().unwrap();
    let conf = write_conf(&dir, ALIVE_CMD, &["a"]);

    let output = run(fleet_ping(&conf).args(["-p", "0"]));
    assert_eq!(output.status.code(), Some(1));

    let output = run(fleet_ping(&conf).arg("--bogus"));
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_help_exits_zero() {
    let output = run(Command::new(env!("CARGO_BIN_EXE_fleet-ping")).arg("--help"));

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("--exclude-group"));
}

#[test]
fn test_aggregated_output_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let conf = write_conf(&dir, ALIVE_CMD, &["a", "b", "c"]);

    let output = run(fleet_ping(&conf).arg("-a"));

    assert_eq!(output.status.code(), Some(0));
    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with(": up"));
    for node in ["a", "b", "c"] {
        assert!(lines[0].contains(node));
    }
}

#[test]
fn test_failed_aggregation_exits_255() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");

    let output = run(fleet_ping(&missing).arg("-a"));

    assert_eq!(output.status.code(), Some(255));
    assert!(stdout(&output).is_empty());
}

/// The reader closes stdout before the first result is written
#[test]
fn test_closed_stdout_exits_zero_quietly() {
    let dir = tempfile::tempdir().unwrap();
    let nodes: Vec<String> = (1..=40).map(|i| format!("n{i:02}")).collect();
    let names: Vec<&str> = nodes.iter().map(String::as_str).collect();
    let conf = write_conf(&dir, ALIVE_CMD, &names);

    let mut child = fleet_ping(&conf)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    drop(child.stdout.take());

    let output = child.wait_with_output().unwrap();

    assert_eq!(output.status.code(), Some(0));
    let diagnostics = stderr(&output);
    assert!(!diagnostics.contains("WARN"), "unexpected warnings: {diagnostics}");
    assert!(!diagnostics.contains("panicked"), "unexpected panic: {diagnostics}");
}

/// SIGINT during a condensed run ends it cleanly
#[test]
fn test_interrupted_aggregation_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let conf = write_conf(&dir, HUNG_CMD, &["a", "b"]);

    let mut child = fleet_ping(&conf)
        .arg("-a")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    // let the signal handler and the replayed run get going
    std::thread::sleep(Duration::from_millis(1000));
    let sent = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(sent.success());

    let status = wait_for(&mut child, Duration::from_secs(10));
    assert_eq!(status.code(), Some(0));
}

/// SIGINT during a direct run ends it cleanly too
#[test]
fn test_interrupted_dispatch_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let conf = write_conf(&dir, HUNG_CMD, &["a", "b"]);

    let mut child = fleet_ping(&conf)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    std::thread::sleep(Duration::from_millis(1000));
    let sent = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(sent.success());

    let status = wait_for(&mut child, Duration::from_secs(10));
    assert_eq!(status.code(), Some(0));
}
