use crate::command::{ExecutableCommand, ExitCode, NOT_EXECUTABLE};
use crate::env::Environment;
use crate::resolver::Resolver;
use anyhow::{Context, Result};
use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

/// Command that is not a builtin, already resolved to an executable path.
pub struct ExternalCommand {
    name: String,
    path: PathBuf,
    args: Vec<OsString>,
}

impl ExternalCommand {
    pub fn new(name: impl Into<String>, path: PathBuf, args: &[&str]) -> Self {
        Self {
            name: name.into(),
            path,
            args: args.iter().map(OsString::from).collect(),
        }
    }
}

impl ExecutableCommand for ExternalCommand {
    /// Runs the program and copies its standard output and standard error,
    /// interleaved as the program wrote them, to `stdout`.
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        env: &mut Environment,
        _resolver: &Resolver,
    ) -> Result<ExitCode> {
        let (mut output, writer) = std::io::pipe().context("failed to create output pipe")?;

        let mut cmd = std::process::Command::new(&self.path);
        cmd.args(&self.args)
            .stdin(Stdio::inherit())
            .stdout(writer.try_clone()?)
            .stderr(writer)
            .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&env.current_dir);
        set_arg0(&mut cmd, &self.name);
        let spawned = cmd.spawn();
        // The builder still owns the write ends of the pipe.
        drop(cmd);

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "spawn failed");
                writeln!(stdout, "{}: {}", self.name, e)?;
                return Ok(NOT_EXECUTABLE);
            }
        };

        if let Err(e) = std::io::copy(&mut output, stdout) {
            // Nobody reads the pipe any more; don't leave the child behind.
            let _ = child.kill();
            let _ = child.wait();
            return Err(e).context("failed to relay command output");
        }
        let exit_status = child.wait()?;
        tracing::debug!(name = %self.name, status = %exit_status, "command finished");
        match exit_status.code() {
            Some(x) => Ok(x),
            None => Ok(terminated_by_signal(exit_status)),
        }
    }
}

#[cfg(unix)]
fn set_arg0(cmd: &mut std::process::Command, name: &str) {
    use std::os::unix::process::CommandExt;
    cmd.arg0(name);
}

#[cfg(not(unix))]
fn set_arg0(_cmd: &mut std::process::Command, _name: &str) {}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}
