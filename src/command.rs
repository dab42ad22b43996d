use crate::env::Environment;
use crate::resolver::Resolver;
use anyhow::Result;
use std::io::Write;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// Status reported when a line fails to tokenize.
pub const SYNTAX_ERROR: ExitCode = 2;
/// Status reported when an external command exists but cannot be started.
pub const NOT_EXECUTABLE: ExitCode = 126;
/// Status reported when a command name does not resolve.
pub const NOT_FOUND: ExitCode = 127;

/// Object-safe trait for any command that can be executed by the shell.
///
/// This is implemented by built-ins via a blanket impl and by external commands.
pub trait ExecutableCommand {
    /// Executes the command, writing everything it prints to `stdout`.
    ///
    /// `resolver` is the shell's own resolver, for commands that need to
    /// look other commands up.
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        env: &mut Environment,
        resolver: &Resolver,
    ) -> Result<ExitCode>;
}
