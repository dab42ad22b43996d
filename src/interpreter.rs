use crate::builtin;
use crate::command::{ExecutableCommand, ExitCode, NOT_FOUND, SYNTAX_ERROR};
use crate::config::ShellConfig;
use crate::env::Environment;
use crate::external::ExternalCommand;
use crate::lexer;
use crate::resolver::{Command, Registry, Resolver};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::Write;

/// A minimal shell that tokenizes lines, resolves command names and runs them.
///
/// The interpreter owns the shell [`Environment`] and a [`Resolver`] built from
/// the [`Registry`] it was given. See [`Default`] for the standard builtins.
///
/// Example
/// ```
/// use myshell::Interpreter;
/// let mut sh = Interpreter::default();
/// let mut out = Vec::new();
/// let code = sh.run_line("echo 'hello   world'", &mut out).unwrap();
/// assert_eq!(code, 0);
/// assert_eq!(out, b"hello   world\n");
/// ```
pub struct Interpreter {
    env: Environment,
    resolver: Resolver,
}

impl Interpreter {
    /// Create a new interpreter over the current process environment.
    pub fn new(registry: Registry) -> Self {
        Self::with_environment(registry, Environment::new())
    }

    pub fn with_environment(registry: Registry, env: Environment) -> Self {
        Self {
            env,
            resolver: Resolver::new(registry),
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// True once `exit` has run.
    pub fn should_exit(&self) -> bool {
        self.env.should_exit
    }

    /// Tokenize, resolve and run one input line.
    ///
    /// Parse failures and unknown commands are reported on `stdout` and turned
    /// into a status (2 and 127); only I/O failures of the shell itself are
    /// returned as errors. A blank line does nothing and succeeds.
    pub fn run_line(&mut self, line: &str, stdout: &mut dyn Write) -> anyhow::Result<ExitCode> {
        let argv = match lexer::tokenize(line) {
            Ok(argv) => argv,
            Err(e) => {
                tracing::debug!(error = %e, "rejected line");
                writeln!(stdout, "{e}")?;
                return Ok(SYNTAX_ERROR);
            }
        };
        let Some((name, args)) = argv.split_first() else {
            return Ok(0);
        };
        tracing::debug!(
            argv = %argv.iter().map(|t| lexer::quote(t)).collect::<Vec<_>>().join(" "),
            "tokenized"
        );

        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run(name, &args, stdout)
    }

    /// Run a single command invocation by name with arguments.
    pub fn run(&mut self, name: &str, args: &[&str], stdout: &mut dyn Write) -> anyhow::Result<ExitCode> {
        match self.resolver.resolve(name, &self.env) {
            Ok(command) => {
                tracing::debug!(?command, "resolved");
                self.dispatch(&command, args, stdout)
            }
            Err(e) => {
                tracing::debug!(error = %e, "resolution failed");
                writeln!(stdout, "{e}")?;
                Ok(NOT_FOUND)
            }
        }
    }

    /// Run an already resolved command.
    pub fn dispatch(
        &mut self,
        command: &Command,
        args: &[&str],
        stdout: &mut dyn Write,
    ) -> anyhow::Result<ExitCode> {
        let executable: Box<dyn ExecutableCommand> = match command {
            Command::Builtin { name, kind } => builtin::create(*kind, name, args),
            Command::External { name, path } => {
                Box::new(ExternalCommand::new(name.as_str(), path.clone(), args))
            }
        };
        executable.execute(stdout, &mut self.env, &self.resolver)
    }

    /// Read-Eval-Print Loop over the terminal.
    ///
    /// Ends on end of input or after `exit`, returning the status of the last
    /// command that ran. Ctrl-C only discards the current line.
    pub fn repl(&mut self, config: &ShellConfig) -> anyhow::Result<ExitCode> {
        let rl_config = rustyline::Config::builder()
            .max_history_size(config.history_size)?
            .auto_add_history(false)
            .build();
        let mut rl = DefaultEditor::with_config(rl_config)?;
        if let Some(path) = &config.history_file {
            if let Err(e) = rl.load_history(path) {
                tracing::debug!(path = %path.display(), error = %e, "no history loaded");
            }
        }

        let mut status = 0;
        loop {
            match rl.readline(&config.prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(line)?;

                    let mut stdout = std::io::stdout().lock();
                    status = self.run_line(line, &mut stdout)?;
                    stdout.flush()?;
                    if self.env.should_exit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err.into()),
            }
        }

        if let Some(path) = &config.history_file {
            if let Err(e) = rl.save_history(path) {
                tracing::warn!(path = %path.display(), error = %e, "failed to save history");
            }
        }
        Ok(status)
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the standard builtins:
    /// `echo`, `exit`, `type`, `pwd` and `cd`.
    fn default() -> Self {
        Self::new(Registry::standard())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::BuiltinKind;
    use crate::testutil::lock_current_dir;
    use std::fs;
    use tempfile::TempDir;

    fn interpreter_with_path(path: &str) -> Interpreter {
        Interpreter::with_environment(
            Registry::standard(),
            Environment::with_vars([("PATH", path)]),
        )
    }

    fn run_line(sh: &mut Interpreter, line: &str) -> (ExitCode, String) {
        let mut out = Vec::new();
        let code = sh.run_line(line, &mut out).unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_echo_with_quotes() {
        let mut sh = interpreter_with_path("");
        let (code, out) = run_line(&mut sh, r#"echo 'hello   world' "a\"b" c\ d"#);
        assert_eq!(code, 0);
        assert_eq!(out, "hello   world a\"b c d\n");
    }

    #[test]
    fn test_blank_line_does_nothing() {
        let mut sh = interpreter_with_path("");
        assert_eq!(run_line(&mut sh, "   "), (0, String::new()));
    }

    #[test]
    fn test_unterminated_quote_is_reported() {
        let mut sh = interpreter_with_path("");
        let (code, out) = run_line(&mut sh, "echo 'oops");
        assert_eq!(code, SYNTAX_ERROR);
        assert_eq!(out, "syntax error: unterminated ' quote\n");
    }

    #[test]
    fn test_unknown_command_is_reported() {
        let mut sh = interpreter_with_path("");
        let (code, out) = run_line(&mut sh, "definitely-not-a-real-command arg");
        assert_eq!(code, NOT_FOUND);
        assert_eq!(out, "definitely-not-a-real-command: command not found\n");
        assert!(!sh.should_exit());
    }

    #[test]
    fn test_quoted_command_name() {
        let mut sh = interpreter_with_path("");
        let (code, out) = run_line(&mut sh, "'ec'ho hi");
        assert_eq!(code, 0);
        assert_eq!(out, "hi\n");
    }

    #[test]
    fn test_exit_stops_shell() {
        let mut sh = interpreter_with_path("");
        let (code, _) = run_line(&mut sh, "exit 4");
        assert_eq!(code, 4);
        assert!(sh.should_exit());
    }

    #[test]
    fn test_type_through_line() {
        let mut sh = interpreter_with_path("");
        let (code, out) = run_line(&mut sh, "type cd nope-xyz");
        assert_eq!(code, 1);
        assert_eq!(out, "cd is a shell builtin\nnope-xyz: not found\n");
    }

    #[test]
    fn test_dispatch_resolved_builtin() {
        let mut sh = interpreter_with_path("");
        let cmd = Command::Builtin {
            name: "echo".to_string(),
            kind: BuiltinKind::Echo,
        };
        let mut out = Vec::new();
        let code = sh.dispatch(&cmd, &["x", "y"], &mut out).unwrap();
        assert_eq!(code, 0);
        assert_eq!(out, b"x y\n");
    }

    #[test]
    #[cfg(unix)]
    fn test_external_command_on_path() {
        use std::os::unix::fs::PermissionsExt;

        let _lock = lock_current_dir();
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("greet");
        fs::write(&script, "#!/bin/sh\necho \"hi $1\"\necho warn >&2\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        // A PATH entry named like a builtin never shadows it.
        fs::write(dir.path().join("echo"), "").unwrap();

        let mut sh = interpreter_with_path(&dir.path().to_string_lossy());
        let (code, out) = run_line(&mut sh, "greet 'big world'");
        assert_eq!(code, 0);
        assert_eq!(out, "hi big world\nwarn\n");

        let (_, out) = run_line(&mut sh, "echo builtin");
        assert_eq!(out, "builtin\n");
    }

    #[test]
    fn test_cd_then_pwd() {
        let _lock = lock_current_dir();
        let orig = std::env::current_dir().unwrap();
        let dir = TempDir::new().unwrap();
        let canonical = fs::canonicalize(dir.path()).unwrap();

        let mut sh = interpreter_with_path("");
        let line = format!("cd {}", lexer::quote(&canonical.to_string_lossy()));
        let (code, _) = run_line(&mut sh, &line);
        assert_eq!(code, 0);
        let (_, out) = run_line(&mut sh, "pwd");
        assert_eq!(out, format!("{}\n", canonical.display()));
        assert_eq!(sh.env().current_dir, canonical);

        std::env::set_current_dir(orig).expect("failed to restore cwd");
    }
}
