//! Signal cleanup through the `tf-local` binary
//!
//! These tests verify:
//! - SIGTERM to a serving provider kills the running command's process group
//! - The provider exits with 128 + signal
//! - A kill grace period set by a `configure` request is honoured

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use serde_json::json;
use std::io::Write;
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Whether `pid` exists and is not a zombie
fn is_process_alive(pid: u32) -> bool {
    if signal::kill(Pid::from_raw(pid as i32), None).is_err() {
        return false;
    }

    if let Ok(stat) = std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
        if let Some((_, rest)) = stat.rsplit_once(')') {
            if let Some(state) = rest.split_whitespace().next() {
                return !matches!(state, "Z" | "X");
            }
        }
    }

    true
}

fn wait_for_process_death(pid: u32, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if !is_process_alive(pid) {
            return true;
        }
        thread::sleep(Duration::from_millis(50));
    }
    false
}

/// Poll until the command has written its PID
fn wait_for_pid_file(path: &Path, timeout: Duration) -> u32 {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if let Ok(text) = std::fs::read_to_string(path) {
            if let Ok(pid) = text.trim().parse() {
                return pid;
            }
        }
        thread::sleep(Duration::from_millis(20));
    }
    panic!("command never wrote {}", path.display());
}

/// Start `tf-local serve`, keeping stdin open for further requests
fn spawn_serve() -> (Child, ChildStdin) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_tf-local"))
        .arg("serve")
        .env("RUST_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn tf-local serve");
    let stdin = child.stdin.take().unwrap();
    (child, stdin)
}

fn send(stdin: &mut ChildStdin, request: serde_json::Value) {
    writeln!(stdin, "{}", request).unwrap();
    stdin.flush().unwrap();
}

fn create_exec(command: String) -> serde_json::Value {
    json!({
        "operation": "create",
        "type_name": "tf_local_exec",
        "planned_state": {"command": command}
    })
}

// =============================================================================
// Cleanup on signal
// =============================================================================

#[test]
fn test_sigterm_kills_running_command_group() {
    let dir = TempDir::new().unwrap();
    let pid_file = dir.path().join("sleep.pid");

    let (mut provider, mut stdin) = spawn_serve();
    // The backgrounded sleep is a grandchild; only the group signal reaches it
    send(
        &mut stdin,
        create_exec(format!("sleep 60 & echo $! > {}; wait", pid_file.display())),
    );

    let sleep_pid = wait_for_pid_file(&pid_file, Duration::from_secs(5));
    assert!(is_process_alive(sleep_pid));

    signal::kill(Pid::from_raw(provider.id() as i32), Signal::SIGTERM).unwrap();
    let status = provider.wait().unwrap();

    assert_eq!(status.code(), Some(128 + Signal::SIGTERM as i32));
    assert!(
        wait_for_process_death(sleep_pid, Duration::from_secs(5)),
        "sleep {} survived provider shutdown",
        sleep_pid
    );
}

#[test]
fn test_configured_grace_period_is_used_on_signal() {
    let dir = TempDir::new().unwrap();
    let pid_file = dir.path().join("shell.pid");

    let (mut provider, mut stdin) = spawn_serve();
    send(
        &mut stdin,
        json!({"operation": "configure", "config": {"kill_grace_period_secs": 0}}),
    );
    // Ignores SIGTERM, so only the SIGKILL after the grace period stops it
    send(
        &mut stdin,
        create_exec(format!("trap '' TERM; echo $$ > {}; sleep 30", pid_file.display())),
    );

    let shell_pid = wait_for_pid_file(&pid_file, Duration::from_secs(5));

    let start = Instant::now();
    signal::kill(Pid::from_raw(provider.id() as i32), Signal::SIGTERM).unwrap();
    let status = provider.wait().unwrap();
    let elapsed = start.elapsed();

    assert_eq!(status.code(), Some(128 + Signal::SIGTERM as i32));
    assert!(
        elapsed < Duration::from_millis(1500),
        "shutdown took {:?}, default grace period still in effect",
        elapsed
    );
    assert!(wait_for_process_death(shell_pid, Duration::from_secs(5)));
}
