use crate::command::{ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::resolver::{BuiltinKind, Command, Resolver};
use anyhow::{Context, Result, bail};
use argh::{EarlyExit, FromArgs};
use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
///
/// Most builtins are parsed using the [`argh`] crate (`FromArgs`) and all are
/// executed directly in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized {
    /// Executes the command using provided output stream and environment.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(
        self,
        stdout: &mut dyn Write,
        env: &mut Environment,
        resolver: &Resolver,
    ) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        env: &mut Environment,
        resolver: &Resolver,
    ) -> Result<ExitCode> {
        match <T as BuiltinCommand>::execute(*self, stdout, env, resolver) {
            Ok(x) => Ok(x),
            Err(e) => {
                writeln!(stdout, "{e}")?;
                Ok(1)
            }
        }
    }
}

/// Usage or `--help` output produced by argh instead of a parsed command.
struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        _env: &mut Environment,
        _resolver: &Resolver,
    ) -> Result<ExitCode> {
        stdout.write_all(self.output.as_bytes())?;
        if !self.output.ends_with('\n') {
            writeln!(stdout)?;
        }
        Ok(if self.is_error { 2 } else { 0 })
    }
}

/// Build the handler for `kind`, invoked as `name` with `args`.
///
/// Argument errors do not fail here: they become a command that prints the
/// usage message and returns a non-zero status.
pub(crate) fn create(kind: BuiltinKind, name: &str, args: &[&str]) -> Box<dyn ExecutableCommand> {
    match kind {
        BuiltinKind::Echo => Box::new(Echo::from_words(args)),
        BuiltinKind::Exit => parse::<Exit>(name, &negative_as_positional(args)),
        BuiltinKind::Type => parse::<Type>(name, args),
        BuiltinKind::Pwd => parse::<Pwd>(name, args),
        BuiltinKind::Cd => parse::<Cd>(name, args),
    }
}

fn parse<T: BuiltinCommand + FromArgs + 'static>(
    name: &str,
    args: &[&str],
) -> Box<dyn ExecutableCommand> {
    match T::from_args(&[name], args) {
        Ok(cmd) => Box::new(cmd),
        Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
            output,
            is_error: status.is_err(),
        }),
    }
}

/// Puts `--` in front of the arguments when one of them is a negative
/// number, so argh reads it as a value instead of an unknown option.
fn negative_as_positional<'a>(args: &[&'a str]) -> Vec<&'a str> {
    let negative = args
        .iter()
        .any(|arg| arg.starts_with('-') && arg.parse::<i64>().is_ok());
    if negative {
        std::iter::once("--").chain(args.iter().copied()).collect()
    } else {
        args.to_vec()
    }
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn execute(
        self,
        stdout: &mut dyn Write,
        env: &mut Environment,
        _resolver: &Resolver,
    ) -> Result<ExitCode> {
        writeln!(stdout, "{}", env.current_dir.display())?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory. A leading `~` stands for $HOME.
    pub target: String,
}

impl Cd {
    fn expand_home(&self, env: &Environment) -> String {
        match (self.target.strip_prefix('~'), env.get_var("HOME")) {
            (Some(rest), Some(home)) => format!("{home}{rest}"),
            _ => self.target.clone(),
        }
    }
}

impl BuiltinCommand for Cd {
    fn execute(
        self,
        _stdout: &mut dyn Write,
        env: &mut Environment,
        _resolver: &Resolver,
    ) -> Result<ExitCode> {
        let target = PathBuf::from(self.expand_home(env));
        let new_dir = if target.is_absolute() {
            target
        } else {
            env.current_dir.join(target)
        };

        let canonical = match fs::canonicalize(&new_dir) {
            Ok(dir) if dir.is_dir() => dir,
            _ => bail!("cd: {}: No such file or directory", self.target),
        };

        env::set_current_dir(&canonical)
            .with_context(|| format!("cd: can't chdir to {}", canonical.display()))?;
        env.current_dir = canonical;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Exit the shell with the given status.
pub struct Exit {
    #[argh(positional)]
    /// exit status reported to the parent process.
    pub code: i32,
}

impl BuiltinCommand for Exit {
    fn execute(
        self,
        _stdout: &mut dyn Write,
        env: &mut Environment,
        _resolver: &Resolver,
    ) -> Result<ExitCode> {
        env.should_exit = true;
        Ok(self.code)
    }
}

/// Write the arguments to standard output, separated by spaces.
///
/// Only leading `-n` words are options (no trailing newline). Every other
/// word, dashes included, is printed as-is.
pub struct Echo {
    pub no_newline: bool,
    pub args: Vec<String>,
}

impl Echo {
    fn from_words(words: &[&str]) -> Self {
        let switches = words.iter().take_while(|word| **word == "-n").count();
        Self {
            no_newline: switches > 0,
            args: words[switches..].iter().map(|word| word.to_string()).collect(),
        }
    }
}

impl BuiltinCommand for Echo {
    fn execute(
        self,
        stdout: &mut dyn Write,
        _env: &mut Environment,
        _resolver: &Resolver,
    ) -> Result<ExitCode> {
        let s = self.args.join(" ");
        if self.no_newline {
            write!(stdout, "{}", s)?;
        } else {
            writeln!(stdout, "{}", s)?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Tell how each name would be interpreted if used as a command.
pub struct Type {
    #[argh(positional, greedy)]
    /// command names to look up.
    pub names: Vec<String>,
}

impl BuiltinCommand for Type {
    fn execute(
        self,
        stdout: &mut dyn Write,
        env: &mut Environment,
        resolver: &Resolver,
    ) -> Result<ExitCode> {
        let mut status = 0;
        for name in &self.names {
            match resolver.resolve(name, env) {
                Ok(Command::Builtin { .. }) => writeln!(stdout, "{name} is a shell builtin")?,
                Ok(Command::External { path, .. }) => {
                    writeln!(stdout, "{name} is {}", path.display())?
                }
                Err(_) => {
                    writeln!(stdout, "{name}: not found")?;
                    status = 1;
                }
            }
        }
        Ok(status)
    }
}
