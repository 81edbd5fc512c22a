//! Interactive demo shell.
//!
//! Reads lines from stdin and runs them against the command table given as
//! the first argument, or the built-in table. End a line with `?` for help
//! on what may follow, or with a TAB to complete the last word.

mod actions;
mod session;

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use vtysh_types::config::ShellConfig;

use session::Session;

/// Command table used when no file is given.
pub(crate) const BUILTIN_DEFS: &str = include_str!("../defs/shell.toml");

fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            ShellConfig::load(&path).with_context(|| format!("loading command table {path}"))?
        },
        None => ShellConfig::from_toml_str(BUILTIN_DEFS).context("parsing built-in command table")?,
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_filter))
        .init();
    log::info!(
        "Starting vtysh ({} modes, {} commands)",
        config.modes.len(),
        config.commands.len()
    );

    let mut session = Session::new(&config)?;
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();

    while !session.finished() {
        write!(stdout, "{}", session.prompt())?;
        stdout.flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            writeln!(stdout)?;
            break;
        }
        let output = session.handle_line(line.trim_end_matches(['\r', '\n']));
        if !output.is_empty() {
            writeln!(stdout, "{output}")?;
        }
    }

    log::info!("Session closed");
    Ok(())
}
