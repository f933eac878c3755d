//! External provisioning tool invocation.

use keysweep_core::{Error, Result};
use std::io::Read;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::debug;

/// Captured result of one external command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Seam between the fetch layer and the external tool. Tests substitute a
/// recording fake; production uses [`ProcessRunner`].
pub trait CommandRunner: Send + Sync {
    fn run(&self, command: &str) -> Result<CommandOutput>;
}

/// Runs command strings as subprocesses.
#[derive(Debug, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound each invocation; a child still running past the deadline is
    /// killed and reported as a command failure.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }

    fn spawn_argv(command: &str) -> Result<(String, Vec<String>)> {
        let argv = shell_words::split(command)
            .map_err(|e| Error::command(command, format!("unparseable command: {e}"), None))?;
        let Some((binary, args)) = argv.split_first() else {
            return Err(Error::command(command, "empty command", None));
        };
        Ok((binary.clone(), args.to_vec()))
    }

    fn run_bounded(&self, command: &str, timeout: Duration) -> Result<CommandOutput> {
        let (binary, args) = Self::spawn_argv(command)?;
        let mut child = Command::new(&binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::command(command, e.to_string(), None))?;

        let deadline = Instant::now() + timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(Error::command(
                            command,
                            format!("timed out after {timeout:?}"),
                            None,
                        ));
                    }
                    std::thread::sleep(Duration::from_millis(25));
                }
                Err(e) => return Err(Error::command(command, e.to_string(), None)),
            }
        };

        let mut stdout = String::new();
        let mut stderr = String::new();
        if let Some(mut out) = child.stdout.take() {
            let _ = out.read_to_string(&mut stdout);
        }
        if let Some(mut err) = child.stderr.take() {
            let _ = err.read_to_string(&mut stderr);
        }

        Ok(CommandOutput {
            stdout,
            stderr,
            exit_code: status.code(),
        })
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, command: &str) -> Result<CommandOutput> {
        debug!(command, "running external command");

        if let Some(timeout) = self.timeout {
            return self.run_bounded(command, timeout);
        }

        let (binary, args) = Self::spawn_argv(command)?;
        let output = Command::new(&binary)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::command(command, e.to_string(), None))?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}
