//! A small interactive command shell.
//!
//! A line goes through two steps before anything runs. [`tokenize`] splits it
//! into words following POSIX-like single quote, double quote and backslash
//! rules, and [`Resolver::resolve`] maps the first word to a builtin from the
//! [`Registry`] or to the first matching executable on `PATH`.
//!
//! [`Interpreter`] ties both together with the builtins (`echo`, `exit`,
//! `type`, `pwd`, `cd`), the external command runner and a rustyline REPL.
//! Variable expansion, globbing, pipelines and redirection are not supported:
//! `$`, `*` and `|` are ordinary characters.

mod builtin;
pub mod command;
pub mod config;
pub mod env;
mod external;
mod interpreter;
pub mod lexer;
pub mod resolver;
#[cfg(test)]
mod testutil;

/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;
pub use lexer::{ArgumentVector, LexingError, QuoteMode, Token, quote, tokenize};
pub use resolver::{BuiltinKind, Command, Registry, ResolveError, Resolver};
