//! Shell command execution
//!
//! All `local_exec` commands go through [`run_shell_command`], which:
//!
//! - runs `<shell> -c <command>` with stdin attached to `/dev/null`,
//! - captures stdout and stderr through one pipe so the output keeps the
//!   order in which the command wrote it,
//! - isolates the shell in its own process group and registers it with the
//!   [`ChildRegistry`] until it exits.

use crate::error::{ProviderError, Result};
use crate::process_guard::{ChildRegistry, CommandProcessGroup};
use std::io::Read;
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Shell used when the provider configuration does not name one.
pub const DEFAULT_SHELL: &str = "sh";

/// Exit code recorded when the command was terminated by a signal.
pub const SIGNAL_EXIT_CODE: i64 = -1;

/// Result of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Combined stdout and stderr.
    pub output: String,
    pub exit_code: i64,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Run `command` with the default shell.
pub fn execute_local_command(command: &str, fail_if_nonzero: bool) -> Result<CommandOutput> {
    run_shell_command(DEFAULT_SHELL, command, fail_if_nonzero)
}

/// Run `command` through `shell -c`.
///
/// # Returns
///
/// - `Ok(output)` - the command ran; non-zero exits land here too unless
///   `fail_if_nonzero` is set
/// - `Err(EmptyCommand)` - `command` is empty
/// - `Err(Spawn)` - the shell could not be started or its output read
/// - `Err(NonZeroExit)` - non-zero exit with `fail_if_nonzero` set
pub fn run_shell_command(
    shell: &str,
    command: &str,
    fail_if_nonzero: bool,
) -> Result<CommandOutput> {
    if command.is_empty() {
        return Err(ProviderError::EmptyCommand);
    }

    info!(shell, command, "Executing local command");

    let (mut reader, writer) = std::io::pipe().map_err(ProviderError::Spawn)?;
    let stderr_writer = writer.try_clone().map_err(ProviderError::Spawn)?;

    let mut cmd = Command::new(shell);
    cmd.arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(writer)
        .stderr(stderr_writer)
        .in_new_process_group();

    let mut child = cmd.spawn().map_err(ProviderError::Spawn)?;
    // The Command keeps the parent's copies of the write end open; drop it
    // so the read below sees EOF once the shell exits.
    drop(cmd);

    let pid = child.id();
    if let Ok(mut registry) = ChildRegistry::global().lock() {
        registry.register(pid);
    }

    let mut raw = Vec::new();
    let read_result = reader.read_to_end(&mut raw);
    if read_result.is_err() {
        let _ = child.kill();
    }
    let wait_result = child.wait();

    if let Ok(mut registry) = ChildRegistry::global().lock() {
        registry.unregister(pid);
    }

    read_result.map_err(ProviderError::Spawn)?;
    let status = wait_result.map_err(ProviderError::Spawn)?;

    let output = String::from_utf8_lossy(&raw).into_owned();
    let exit_code = status.code().map(i64::from).unwrap_or(SIGNAL_EXIT_CODE);

    debug!(exit_code, bytes = raw.len(), "Command finished");

    if exit_code != 0 {
        info!(exit_code, "Command exited non-zero");
        if fail_if_nonzero {
            return Err(ProviderError::NonZeroExit { code: exit_code, output });
        }
    }

    Ok(CommandOutput { output, exit_code })
}
