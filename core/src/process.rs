//! Lifecycle management for the wrapped command-line tools.
//!
//! Every external tool is launched through [`ToolCommand`] and owned by a
//! [`ToolProcess`]. Termination follows the same pattern everywhere:
//! 1. Send SIGTERM so the tool can flush its output files
//! 2. Wait up to [`TERMINATE_GRACE_PERIOD`] for it to exit
//! 3. Send SIGKILL and reap it if it is still running
//!
//! Each spawned tool leads its own process group and signals go to the
//! whole group. With `sudo` the direct child is sudo itself, which does not
//! relay signals sent from inside its own group, and SIGKILL would only
//! reach sudo.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output, Stdio};
use std::time::Duration;

use tokio::process::{Child, ChildStdout, Command};
use tokio::time::{timeout, Instant};
use tracing::{debug, warn};

use crate::cancel::CancellationToken;
use crate::error::{Error, Result};

/// Grace period between SIGTERM and SIGKILL.
pub const TERMINATE_GRACE_PERIOD: Duration = Duration::from_secs(3);

/// Description of an external tool invocation.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: String,
    args: Vec<OsString>,
    sudo: bool,
    capture_stdout: bool,
}

impl ToolCommand {
    /// Creates a command for `program` with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            sudo: false,
            capture_stdout: false,
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Runs the tool through `sudo` when `enabled`.
    pub fn sudo(mut self, enabled: bool) -> Self {
        self.sudo = enabled;
        self
    }

    /// Pipes stdout so the caller can read it line by line.
    pub fn capture_stdout(mut self) -> Self {
        self.capture_stdout = true;
        self
    }

    /// The tool binary name (without `sudo`).
    pub fn program(&self) -> &str {
        &self.program
    }

    fn build(&self) -> Command {
        let mut command = if self.sudo {
            let mut c = Command::new("sudo");
            c.arg(&self.program);
            c
        } else {
            Command::new(&self.program)
        };
        command.args(&self.args);
        command
    }

    /// Starts the tool in the background.
    pub fn spawn(&self) -> Result<ToolProcess> {
        let mut command = self.build();
        command
            .stdin(Stdio::null())
            .stdout(if self.capture_stdout {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stderr(Stdio::null())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let child = command
            .spawn()
            .map_err(|e| Error::from_spawn(self.spawn_name(), e))?;

        debug!(tool = %self, pid = ?child.id(), "Spawned tool");
        Ok(ToolProcess {
            child,
            label: self.program.clone(),
        })
    }

    /// Runs the tool to completion and captures stdout and stderr.
    pub async fn output(&self) -> Result<Output> {
        let mut command = self.build();
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(tool = %self, "Running tool");
        command
            .output()
            .await
            .map_err(|e| Error::from_spawn(self.spawn_name(), e))
    }

    fn spawn_name(&self) -> &str {
        if self.sudo {
            "sudo"
        } else {
            &self.program
        }
    }
}

impl std::fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.sudo {
            write!(f, "sudo ")?;
        }
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// A running external tool.
///
/// Dropping a `ToolProcess` kills the child; call [`ToolProcess::terminate`]
/// for an orderly shutdown.
#[derive(Debug)]
pub struct ToolProcess {
    child: Child,
    label: String,
}

impl ToolProcess {
    /// OS process id, `None` once the process has been reaped.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Takes the piped stdout handle.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Returns the exit status if the process already exited.
    pub fn try_status(&mut self) -> Option<ExitStatus> {
        self.child.try_wait().ok().flatten()
    }

    /// Waits for the process to exit on its own.
    pub async fn wait(&mut self) -> Result<ExitStatus> {
        Ok(self.child.wait().await?)
    }

    /// Terminates the process with the default grace period.
    pub async fn terminate(mut self) -> Result<ExitStatus> {
        self.terminate_within(TERMINATE_GRACE_PERIOD).await
    }

    /// Sends SIGTERM, waits up to `grace`, then SIGKILLs and reaps.
    pub async fn terminate_within(&mut self, grace: Duration) -> Result<ExitStatus> {
        if let Some(status) = self.try_status() {
            debug!(tool = %self.label, ?status, "Tool already exited");
            return Ok(status);
        }

        // Read before reaping: the group id is the leader's pid.
        let group = self.child.id();
        signal_group(group, &self.label, GroupSignal::Term);

        let status = match timeout(grace, self.child.wait()).await {
            Ok(status) => {
                let status = status?;
                debug!(tool = %self.label, ?status, "Tool terminated");
                status
            }
            Err(_) => {
                warn!(tool = %self.label, "Tool ignored SIGTERM, killing");
                signal_group(group, &self.label, GroupSignal::Kill);
                if self.child.try_wait()?.is_none() {
                    self.child.start_kill()?;
                }
                self.child.wait().await?
            }
        };

        // Members that outlived the leader (a tool under sudo, a wrapper's
        // children) go with it.
        signal_group(group, &self.label, GroupSignal::Kill);
        Ok(status)
    }
}

impl Drop for ToolProcess {
    fn drop(&mut self) {
        // `kill_on_drop` only reaches the leader.
        if let Some(pid) = self.child.id() {
            signal_group(Some(pid), &self.label, GroupSignal::Kill);
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum GroupSignal {
    Term,
    Kill,
}

#[cfg(unix)]
fn signal_group(group: Option<u32>, label: &str, signal: GroupSignal) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = group else {
        return;
    };
    let signal = match signal {
        GroupSignal::Term => Signal::SIGTERM,
        GroupSignal::Kill => Signal::SIGKILL,
    };
    match killpg(Pid::from_raw(pid as i32), signal) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => debug!(tool = %label, pid, ?signal, error = %e, "Group signal failed"),
    }
}

#[cfg(not(unix))]
fn signal_group(_group: Option<u32>, _label: &str, _signal: GroupSignal) {}

/// How a bounded tool run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedRun {
    pub elapsed: Duration,
    /// Cancelled before the duration elapsed.
    pub interrupted: bool,
    /// The tool exited by itself before it was stopped.
    pub exited_early: bool,
}

/// Runs `command` until `duration` elapses, `cancel` fires or the tool exits,
/// then always terminates and reaps it.
pub async fn run_bounded(
    command: &ToolCommand,
    duration: Duration,
    cancel: &CancellationToken,
) -> Result<BoundedRun> {
    let started = Instant::now();
    let mut process = command.spawn()?;

    let (interrupted, exited_early) = tokio::select! {
        _ = cancel.cancelled() => (true, false),
        _ = tokio::time::sleep(duration) => (false, false),
        status = process.wait() => {
            debug!(tool = %command, ?status, "Tool exited before the deadline");
            (false, true)
        }
    };

    process.terminate().await?;
    Ok(BoundedRun {
        elapsed: started.elapsed(),
        interrupted,
        exited_early,
    })
}

/// Validates sudo credentials up front, prompting on the terminal if needed.
///
/// Spawned tools lead their own process group, so a sudo password prompt
/// from inside one would stop on terminal input. Does nothing as root.
pub async fn authorize_sudo() -> Result<()> {
    #[cfg(unix)]
    if nix::unistd::Uid::effective().is_root() {
        return Ok(());
    }

    let status = Command::new("sudo")
        .arg("-v")
        .status()
        .await
        .map_err(|e| Error::from_spawn("sudo", e))?;
    if status.success() {
        Ok(())
    } else {
        Err(Error::Precondition("sudo authentication failed".to_string()))
    }
}

/// Looks up `program` on `PATH`.
pub fn locate(program: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

/// Removes a file written by a tool, retrying through `sudo rm` when the
/// tool ran as root and left a file the current user cannot delete.
pub async fn remove_tool_file(path: &Path, sudo: bool) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied && sudo => {
            let output = ToolCommand::new("rm")
                .arg("-f")
                .arg(path)
                .sudo(true)
                .output()
                .await?;
            if output.status.success() {
                Ok(())
            } else {
                Err(Error::CommandFailed(format!(
                    "sudo rm {} failed: {}",
                    path.display(),
                    String::from_utf8_lossy(&output.stderr).trim()
                )))
            }
        }
        Err(e) => Err(e.into()),
    }
}

/// Copies a file written by a tool, retrying through `sudo cp` on permission errors.
pub async fn copy_tool_file(from: &Path, to: &Path, sudo: bool) -> Result<()> {
    match tokio::fs::copy(from, to).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied && sudo => {
            let output = ToolCommand::new("cp")
                .arg(from)
                .arg(to)
                .sudo(true)
                .output()
                .await?;
            if output.status.success() {
                Ok(())
            } else {
                Err(Error::CommandFailed(format!(
                    "sudo cp {} failed: {}",
                    from.display(),
                    String::from_utf8_lossy(&output.stderr).trim()
                )))
            }
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::{Path, PathBuf};

    /// Write an executable `sh` script standing in for a tool.
    pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// Whether `pid` is a live process; zombies count as gone.
    pub fn is_alive(pid: i32) -> bool {
        match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
            Ok(stat) => stat
                .rsplit(')')
                .next()
                .map(|rest| !rest.trim_start().starts_with('Z'))
                .unwrap_or(false),
            Err(_) => nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid), None::<nix::sys::signal::Signal>).is_ok(),
        }
    }
}
