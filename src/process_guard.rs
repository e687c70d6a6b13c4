//! Lifecycle management for spawned shell commands
//!
//! Commands run by `local_exec` can be long-lived (`sleep`, servers, package
//! installs). If the provider is interrupted mid-apply those shells must not
//! outlive it, so each one:
//!
//! - runs in its own process group (PGID = child PID),
//! - gets `SIGTERM` from the kernel if the provider dies (`PR_SET_PDEATHSIG`),
//! - is tracked in a global registry while it runs.
//!
//! On SIGINT/SIGTERM/SIGHUP, or when the [`ProcessGuard`] held by `main`
//! drops, every tracked group receives SIGTERM and, after the registry's
//! grace period, SIGKILL. The grace period is read at cleanup time, so a
//! later `configure` request still takes effect.

use crate::config::DEFAULT_KILL_GRACE_PERIOD_SECS;
use nix::libc;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

static CHILD_REGISTRY: OnceLock<Arc<Mutex<ChildRegistry>>> = OnceLock::new();

/// Registry of running child process groups
#[derive(Debug)]
pub struct ChildRegistry {
    pids: HashSet<u32>,
    /// Time between SIGTERM and SIGKILL during cleanup
    grace_period: Duration,
    /// Set once cleanup starts so concurrent shutdown paths don't race
    cleanup_initiated: bool,
}

impl Default for ChildRegistry {
    fn default() -> Self {
        Self {
            pids: HashSet::new(),
            grace_period: Duration::from_secs(DEFAULT_KILL_GRACE_PERIOD_SECS),
            cleanup_initiated: false,
        }
    }
}

impl ChildRegistry {
    /// Get or create the process-wide registry
    pub fn global() -> Arc<Mutex<ChildRegistry>> {
        CHILD_REGISTRY
            .get_or_init(|| Arc::new(Mutex::new(ChildRegistry::default())))
            .clone()
    }

    pub fn register(&mut self, pid: u32) {
        self.pids.insert(pid);
        debug!(pid, "Registered child process");
    }

    pub fn unregister(&mut self, pid: u32) {
        self.pids.remove(&pid);
        debug!(pid, "Unregistered child process");
    }

    pub fn count(&self) -> usize {
        self.pids.len()
    }

    pub fn contains(&self, pid: u32) -> bool {
        self.pids.contains(&pid)
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    pub fn set_grace_period(&mut self, grace_period: Duration) {
        debug!(grace_ms = grace_period.as_millis() as u64, "Kill grace period set");
        self.grace_period = grace_period;
    }

    /// Terminate every tracked process group.
    ///
    /// Sends SIGTERM, waits up to the grace period for the groups to exit,
    /// then sends SIGKILL to whatever is left. Runs at most once per registry.
    pub fn terminate_all(&mut self) {
        if self.cleanup_initiated {
            debug!("Cleanup already initiated, skipping");
            return;
        }
        self.cleanup_initiated = true;

        if self.pids.is_empty() {
            return;
        }

        info!(count = self.pids.len(), "Terminating running commands");

        let pids: Vec<u32> = self.pids.iter().copied().collect();
        for &pid in &pids {
            if let Err(e) = send_signal_to_group(pid, Signal::SIGTERM) {
                warn!(pid, error = %e, "SIGTERM to process group failed, signalling process");
                if let Err(e) = send_signal(pid, Signal::SIGTERM) {
                    warn!(pid, error = %e, "SIGTERM to process failed");
                }
            }
        }

        let grace_period = self.grace_period;
        let start = Instant::now();
        while start.elapsed() < grace_period {
            if pids.iter().all(|&pid| !is_process_alive(pid)) {
                info!("All commands terminated gracefully");
                self.pids.clear();
                return;
            }
            std::thread::sleep(Duration::from_millis(50));
        }

        for &pid in &pids {
            if is_process_alive(pid) {
                warn!(pid, "Command ignored SIGTERM, sending SIGKILL");
                if let Err(e) = send_signal_to_group(pid, Signal::SIGKILL) {
                    error!(pid, error = %e, "SIGKILL to process group failed");
                    let _ = send_signal(pid, Signal::SIGKILL);
                }
            }
        }

        self.pids.clear();
    }
}

fn send_signal(pid: u32, signal: Signal) -> Result<(), nix::Error> {
    signal::kill(Pid::from_raw(pid as i32), signal)
}

/// Negative PID addresses the whole group, so grandchildren of the shell
/// are signalled too.
fn send_signal_to_group(pgid: u32, signal: Signal) -> Result<(), nix::Error> {
    signal::kill(Pid::from_raw(-(pgid as i32)), signal)
}

/// Whether `pid` exists and is not a zombie.
fn is_process_alive(pid: u32) -> bool {
    if signal::kill(Pid::from_raw(pid as i32), None).is_err() {
        return false;
    }

    // Field 3 of /proc/<pid>/stat is the state letter
    if let Ok(stat) = std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
        // The command name (field 2) may contain spaces; the state follows the closing paren
        if let Some(rest) = stat.rsplit_once(')').map(|(_, rest)| rest) {
            if let Some(state) = rest.split_whitespace().next() {
                return !matches!(state, "Z" | "X");
            }
        }
    }

    true
}

/// RAII guard that terminates all tracked commands when dropped
pub struct ProcessGuard {
    registry: Arc<Mutex<ChildRegistry>>,
}

impl ProcessGuard {
    /// Guard over the global registry
    pub fn new() -> Self {
        Self::with_registry(ChildRegistry::global())
    }

    pub fn with_registry(registry: Arc<Mutex<ChildRegistry>>) -> Self {
        Self { registry }
    }
}

impl Default for ProcessGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        if let Ok(mut registry) = self.registry.lock() {
            registry.terminate_all();
        }
    }
}

/// Install handlers for SIGINT, SIGTERM and SIGHUP.
///
/// On receipt, running commands are terminated and the provider exits with
/// `128 + signal`. Call once at startup.
pub fn init_signal_handlers() -> Result<(), std::io::Error> {
    use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])?;

    std::thread::spawn(move || {
        if let Some(sig) = signals.forever().next() {
            let name = match sig {
                SIGINT => "SIGINT",
                SIGTERM => "SIGTERM",
                SIGHUP => "SIGHUP",
                _ => "UNKNOWN",
            };
            info!(signal = name, "Received signal, cleaning up");

            if let Ok(mut registry) = ChildRegistry::global().lock() {
                registry.terminate_all();
            }

            std::process::exit(128 + sig);
        }
    });

    Ok(())
}

/// Extension trait for `std::process::Command` to isolate children
pub trait CommandProcessGroup {
    /// Run the command as leader of a new process group that is signalled
    /// when this process dies.
    fn in_new_process_group(&mut self) -> &mut Self;
}

impl CommandProcessGroup for std::process::Command {
    fn in_new_process_group(&mut self) -> &mut Self {
        use std::os::unix::process::CommandExt;
        // SAFETY: the closure only calls async-signal-safe functions
        // (setpgid, prctl) between fork and exec.
        unsafe {
            self.pre_exec(|| {
                nix::unistd::setpgid(Pid::from_raw(0), Pid::from_raw(0))
                    .map_err(std::io::Error::other)?;

                if libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM) == -1 {
                    return Err(std::io::Error::last_os_error());
                }

                Ok(())
            });
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    /// Reap `pid` if it is our child, or wait for it to disappear.
    fn wait_for_process_death(pid: u32, timeout: Duration) -> bool {
        use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};

        let start = Instant::now();
        let nix_pid = Pid::from_raw(pid as i32);

        while start.elapsed() < timeout {
            match waitpid(nix_pid, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::Exited(_, _)) | Ok(WaitStatus::Signaled(_, _, _)) => return true,
                Ok(WaitStatus::StillAlive) => {}
                Err(nix::errno::Errno::ECHILD) => {
                    if !is_process_alive(pid) {
                        return true;
                    }
                }
                _ => {}
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn test_registry_register_unregister() {
        let mut registry = ChildRegistry::default();

        registry.register(1234);
        registry.register(5678);
        assert_eq!(registry.count(), 2);
        assert!(registry.contains(1234));

        registry.unregister(1234);
        assert_eq!(registry.count(), 1);
        assert!(!registry.contains(1234));
    }

    #[test]
    fn test_terminate_all_kills_process_group() {
        let child = Command::new("sh")
            .args(["-c", "sleep 60"])
            .in_new_process_group()
            .spawn()
            .expect("spawn sh");
        let pid = child.id();

        let mut registry = ChildRegistry::default();
        registry.set_grace_period(Duration::from_millis(500));
        registry.register(pid);
        assert!(is_process_alive(pid));

        registry.terminate_all();

        assert!(wait_for_process_death(pid, Duration::from_secs(2)));
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_sigkill_after_grace_period() {
        let child = Command::new("sh")
            .args(["-c", "trap '' TERM; sleep 60"])
            .in_new_process_group()
            .spawn()
            .expect("spawn sh");
        let pid = child.id();
        std::thread::sleep(Duration::from_millis(50));

        let mut registry = ChildRegistry::default();
        registry.set_grace_period(Duration::from_millis(200));
        registry.register(pid);
        registry.terminate_all();

        assert!(wait_for_process_death(pid, Duration::from_secs(3)));
    }

    #[test]
    fn test_zero_grace_period_kills_immediately() {
        let child = Command::new("sh")
            .args(["-c", "trap '' TERM; sleep 60"])
            .in_new_process_group()
            .spawn()
            .expect("spawn sh");
        let pid = child.id();
        std::thread::sleep(Duration::from_millis(50));

        let mut registry = ChildRegistry::default();
        registry.set_grace_period(Duration::ZERO);
        registry.register(pid);

        let start = Instant::now();
        registry.terminate_all();
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(wait_for_process_death(pid, Duration::from_secs(2)));
    }

    #[test]
    fn test_guard_terminates_on_drop() {
        let child = Command::new("sh")
            .args(["-c", "sleep 60"])
            .in_new_process_group()
            .spawn()
            .expect("spawn sh");
        let pid = child.id();

        let registry = Arc::new(Mutex::new(ChildRegistry::default()));
        {
            let mut locked = registry.lock().unwrap();
            locked.set_grace_period(Duration::from_millis(500));
            locked.register(pid);
        }

        drop(ProcessGuard::with_registry(registry.clone()));

        assert!(wait_for_process_death(pid, Duration::from_secs(2)));
        assert_eq!(registry.lock().unwrap().count(), 0);
    }

    #[test]
    fn test_default_grace_period() {
        let registry = ChildRegistry::default();
        assert_eq!(registry.grace_period(), Duration::from_secs(3));
    }

    #[test]
    fn test_terminate_all_runs_once() {
        let mut registry = ChildRegistry::default();
        registry.terminate_all();
        assert!(registry.cleanup_initiated);

        registry.register(4321);
        registry.terminate_all();
        // Second call returned early without touching the set
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_is_process_alive() {
        assert!(is_process_alive(std::process::id()));
        assert!(!is_process_alive(999_999_999));
    }

    #[test]
    fn test_send_signal_to_nonexistent_pid() {
        assert!(send_signal(999_999_999, Signal::SIGTERM).is_err());
    }
}
