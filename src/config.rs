//! Settings for the interactive loop.

use crate::env::Environment;
use std::path::PathBuf;

/// Overrides the prompt when set.
pub const PROMPT_VAR: &str = "MYSHELL_PROMPT";
/// Enables persistent history in the named file when set.
pub const HISTFILE_VAR: &str = "MYSHELL_HISTFILE";

const DEFAULT_PROMPT: &str = "$ ";
const DEFAULT_HISTORY_SIZE: usize = 1000;

/// How the REPL presents itself and where it keeps line history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub prompt: String,
    /// History is kept in memory only when `None`.
    pub history_file: Option<PathBuf>,
    pub history_size: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            history_file: None,
            history_size: DEFAULT_HISTORY_SIZE,
        }
    }
}

impl ShellConfig {
    /// Defaults, overridden by [`PROMPT_VAR`] and [`HISTFILE_VAR`].
    ///
    /// An empty history variable counts as unset.
    pub fn from_env(env: &Environment) -> Self {
        let mut config = Self::default();
        if let Some(prompt) = env.get_var(PROMPT_VAR) {
            config.prompt = prompt;
        }
        config.history_file = env
            .get_var(HISTFILE_VAR)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);
        config
    }

    /// Apply values given on the command line, which win over everything else.
    pub fn with_overrides(mut self, prompt: Option<String>, history_file: Option<PathBuf>) -> Self {
        if let Some(prompt) = prompt {
            self.prompt = prompt;
        }
        if let Some(history_file) = history_file {
            self.history_file = Some(history_file);
        }
        self
    }
}
