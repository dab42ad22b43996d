//! Mapping command names to builtins or to executables on the search path.

use crate::env::Environment;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf, is_separator};
use thiserror::Error;

/// Handler identifier for every builtin the shell knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinKind {
    Echo,
    Exit,
    Type,
    Pwd,
    Cd,
}

impl BuiltinKind {
    /// All builtins, in registration order.
    pub const ALL: [BuiltinKind; 5] = [
        BuiltinKind::Echo,
        BuiltinKind::Exit,
        BuiltinKind::Type,
        BuiltinKind::Pwd,
        BuiltinKind::Cd,
    ];

    /// Conventional name the builtin is registered under.
    pub fn name(self) -> &'static str {
        match self {
            BuiltinKind::Echo => "echo",
            BuiltinKind::Exit => "exit",
            BuiltinKind::Type => "type",
            BuiltinKind::Pwd => "pwd",
            BuiltinKind::Cd => "cd",
        }
    }
}

/// Builtin names known to the shell.
///
/// Filled once at startup and read-only afterwards: there is no way to add
/// or remove an entry from an existing registry.
#[derive(Debug, Clone)]
pub struct Registry {
    builtins: HashMap<String, BuiltinKind>,
}

impl Registry {
    pub fn new<N: Into<String>>(entries: impl IntoIterator<Item = (N, BuiltinKind)>) -> Self {
        Self {
            builtins: entries
                .into_iter()
                .map(|(name, kind)| (name.into(), kind))
                .collect(),
        }
    }

    /// `echo`, `exit`, `type`, `pwd` and `cd` under their usual names.
    pub fn standard() -> Self {
        Self::new(BuiltinKind::ALL.map(|kind| (kind.name(), kind)))
    }

    pub fn get(&self, name: &str) -> Option<BuiltinKind> {
        self.builtins.get(name).copied()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Outcome of a successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Runs in-process.
    Builtin { name: String, kind: BuiltinKind },
    /// Runs the executable at `path`, which is always a concrete location.
    External { name: String, path: PathBuf },
}

impl Command {
    /// The name the command was requested by.
    pub fn name(&self) -> &str {
        match self {
            Command::Builtin { name, .. } | Command::External { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("{0}: command not found")]
    CommandNotFound(String),
}

/// Resolves command names against a [`Registry`] and the `PATH` variable.
///
/// Nothing is cached: every call reads `PATH` again and stats the
/// filesystem again, so a lookup always reflects the state at call time.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    registry: Registry,
}

impl Resolver {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Resolve `name` to a builtin or to an executable path.
    ///
    /// Builtins always win over an executable of the same name. Otherwise
    /// the directories of `PATH` are searched in order and the first one
    /// holding an entry called `name` is used. Names containing a path
    /// separator skip the search and must point at an existing entry
    /// themselves; relative ones are taken against `env.current_dir`.
    ///
    /// Only existence is checked, not the execute permission.
    pub fn resolve(&self, name: &str, env: &Environment) -> Result<Command, ResolveError> {
        if let Some(kind) = self.registry.get(name) {
            return Ok(Command::Builtin {
                name: name.to_string(),
                kind,
            });
        }

        let search_paths = env.get_var("PATH").unwrap_or_default();
        find_command_path(OsStr::new(&search_paths), &env.current_dir, name)
            .map(|path| Command::External {
                name: name.to_string(),
                path,
            })
            .ok_or_else(|| ResolveError::CommandNotFound(name.to_string()))
    }
}

/// Locate an external command the way `resolve` does, ignoring builtins.
///
/// - Empty name: `None`.
/// - No separator anywhere (this includes `.` and `..`): search each directory
///   in `search_paths` and return the first existing `dir/name`.
/// - Anything with a separator: return it (joined onto `current_dir` when
///   relative) if it exists. The name is used as written, so `sh/` only
///   matches a directory.
pub fn find_command_path(search_paths: &OsStr, current_dir: &Path, name: &str) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }
    if !name.contains(is_separator) {
        return find_in_path(search_paths, OsStr::new(name));
    }

    let path = Path::new(name);
    let full = if path.is_absolute() {
        path.to_path_buf()
    } else {
        current_dir.join(path)
    };
    find_by_path(full)
}

/// First directory of `search_paths` holding an entry named `cmd`.
///
/// Empty entries are skipped rather than treated as a directory. Candidates
/// are built with [`Path::join`], so an entry written with a trailing `/`
/// yields `/usr/bin/ls`, not `/usr/bin//ls`; both name the same file.
pub fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .filter(|dir| !dir.as_os_str().is_empty())
        .find_map(|dir| find_by_path(dir.join(cmd)))
}

fn find_by_path(path: PathBuf) -> Option<PathBuf> {
    if path.exists() { Some(path) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::TempDir;

    fn env_with_path(dirs: &[&Path]) -> Environment {
        let joined = std::env::join_paths(dirs).expect("valid PATH entries");
        Environment::with_vars([("PATH", joined.to_string_lossy().to_string())])
    }

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        File::create(&path).expect("create file");
        path
    }

    #[test]
    fn test_builtin_wins_over_path() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "echo");
        let env = env_with_path(&[dir.path()]);

        let cmd = Resolver::default().resolve("echo", &env).unwrap();
        assert_eq!(
            cmd,
            Command::Builtin {
                name: "echo".to_string(),
                kind: BuiltinKind::Echo
            }
        );
    }

    #[test]
    fn test_first_directory_wins() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let expected = touch(first.path(), "ls");
        touch(second.path(), "ls");
        let env = env_with_path(&[first.path(), second.path()]);

        let cmd = Resolver::default().resolve("ls", &env).unwrap();
        assert_eq!(
            cmd,
            Command::External {
                name: "ls".to_string(),
                path: expected
            }
        );
    }

    #[test]
    fn test_later_directory_used_when_earlier_misses() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let expected = touch(second.path(), "tool");
        let env = env_with_path(&[first.path(), second.path()]);

        let cmd = Resolver::default().resolve("tool", &env).unwrap();
        assert_eq!(cmd.name(), "tool");
        assert!(matches!(cmd, Command::External { path, .. } if path == expected));
    }

    #[test]
    fn test_not_found() {
        let dir = TempDir::new().unwrap();
        let env = env_with_path(&[dir.path()]);

        let err = Resolver::default()
            .resolve("definitely-not-a-real-command", &env)
            .unwrap_err();
        assert_eq!(
            err,
            ResolveError::CommandNotFound("definitely-not-a-real-command".to_string())
        );
        assert_eq!(
            err.to_string(),
            "definitely-not-a-real-command: command not found"
        );
    }

    #[test]
    fn test_empty_name_not_found() {
        let env = env_with_path(&[]);
        assert!(Resolver::default().resolve("", &env).is_err());
    }

    #[test]
    fn test_non_executable_file_still_resolves() {
        let dir = TempDir::new().unwrap();
        let expected = touch(dir.path(), "data.txt");
        let env = env_with_path(&[dir.path()]);

        let cmd = Resolver::default().resolve("data.txt", &env).unwrap();
        assert!(matches!(cmd, Command::External { path, .. } if path == expected));
    }

    #[test]
    fn test_no_caching_between_calls() {
        let dir = TempDir::new().unwrap();
        let env = env_with_path(&[dir.path()]);
        let resolver = Resolver::default();

        assert!(resolver.resolve("late", &env).is_err());
        touch(dir.path(), "late");
        assert!(resolver.resolve("late", &env).is_ok());
        fs::remove_file(dir.path().join("late")).unwrap();
        assert!(resolver.resolve("late", &env).is_err());
    }

    #[test]
    fn test_path_change_is_observed() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        touch(first.path(), "tool");
        let in_second = touch(second.path(), "tool");
        let resolver = Resolver::default();

        let mut env = env_with_path(&[first.path()]);
        assert!(resolver.resolve("tool", &env).is_ok());
        env.set_var("PATH", second.path().to_string_lossy().to_string());
        let cmd = resolver.resolve("tool", &env).unwrap();
        assert!(matches!(cmd, Command::External { path, .. } if path == in_second));
    }

    #[test]
    fn test_custom_registry() {
        let resolver = Resolver::new(Registry::new([("say", BuiltinKind::Echo)]));
        let env = env_with_path(&[]);

        let cmd = resolver.resolve("say", &env).unwrap();
        assert!(matches!(cmd, Command::Builtin { kind: BuiltinKind::Echo, .. }));
        assert_eq!(resolver.registry().get("echo"), None);
    }

    #[test]
    fn test_standard_registry_names() {
        let registry = Registry::standard();
        for (name, kind) in [
            ("cd", BuiltinKind::Cd),
            ("echo", BuiltinKind::Echo),
            ("exit", BuiltinKind::Exit),
            ("pwd", BuiltinKind::Pwd),
            ("type", BuiltinKind::Type),
        ] {
            assert_eq!(registry.get(name), Some(kind));
        }
        assert_eq!(registry.get("ls"), None);
    }

    #[test]
    fn test_trailing_slash_is_not_stripped() {
        let dir = TempDir::new().unwrap();
        let cwd = TempDir::new().unwrap();
        touch(dir.path(), "sh");
        let mut env = env_with_path(&[dir.path()]);
        env.current_dir = cwd.path().to_path_buf();

        let err = Resolver::default().resolve("sh/", &env).unwrap_err();
        assert_eq!(err, ResolveError::CommandNotFound("sh/".to_string()));
    }

    #[test]
    fn test_path_entry_with_trailing_slash() {
        let dir = TempDir::new().unwrap();
        let expected = touch(dir.path(), "ls");
        let entry = format!("{}/", dir.path().display());
        let env = Environment::with_vars([("PATH", entry.as_str())]);

        let cmd = Resolver::default().resolve("ls", &env).unwrap();
        assert!(matches!(cmd, Command::External { path, .. } if path == expected));
    }

    #[test]
    fn test_dot_names_are_searched_on_path() {
        let dir = TempDir::new().unwrap();
        let cwd = TempDir::new().unwrap();
        let mut env = env_with_path(&[dir.path()]);
        env.current_dir = cwd.path().to_path_buf();

        let cmd = Resolver::default().resolve(".", &env).unwrap();
        assert!(matches!(cmd, Command::External { path, .. } if path == dir.path().join(".")));

        let mut empty = env_with_path(&[]);
        empty.current_dir = cwd.path().to_path_buf();
        assert!(Resolver::default().resolve("..", &empty).is_err());
    }

    #[test]
    fn test_empty_path_entries_are_skipped() {
        let dir = TempDir::new().unwrap();
        let expected = touch(dir.path(), "tool");
        let search = format!(":{}:", dir.path().display());

        let found = find_in_path(OsStr::new(&search), OsStr::new("tool"));
        assert_eq!(found, Some(expected));
    }

    #[test]
    fn test_path_with_separator_skips_search() {
        let cwd = TempDir::new().unwrap();
        fs::create_dir(cwd.path().join("bin")).unwrap();
        let expected = touch(&cwd.path().join("bin"), "run");

        let found = find_command_path(OsStr::new(""), cwd.path(), "bin/run");
        assert_eq!(found, Some(expected.clone()));

        let absolute = expected.to_string_lossy().to_string();
        let found = find_command_path(OsStr::new(""), Path::new("/"), &absolute);
        assert_eq!(found, Some(expected));

        assert_eq!(find_command_path(OsStr::new(""), cwd.path(), "bin/missing"), None);
    }

    #[test]
    #[cfg(unix)]
    fn test_dot_slash_is_relative_to_current_dir() {
        let cwd = TempDir::new().unwrap();
        touch(cwd.path(), "script");

        let found = find_command_path(OsStr::new("/bin"), cwd.path(), "./script");
        assert_eq!(found, Some(cwd.path().join("./script")));
    }
}
