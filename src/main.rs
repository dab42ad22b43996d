use argh::FromArgs;
use myshell::Interpreter;
use myshell::config::ShellConfig;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// A small interactive command shell.
struct Args {
    #[argh(option, short = 'c')]
    /// run a single command line and exit with its status.
    command: Option<String>,

    #[argh(option)]
    /// prompt shown before each line.
    prompt: Option<String>,

    #[argh(option)]
    /// file to load line history from and save it to.
    history: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    // Diagnostics go to stderr so they never mix with command output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args: Args = argh::from_env();
    let mut shell = Interpreter::default();

    let code = match args.command {
        Some(line) => shell.run_line(line.trim(), &mut std::io::stdout().lock())?,
        None => {
            let config =
                ShellConfig::from_env(shell.env()).with_overrides(args.prompt, args.history);
            shell.repl(&config)?
        }
    };

    std::io::stdout().flush()?;
    std::process::exit(code)
}
