//! Print the effective binder config (defaults + file + env overrides) as JSON.
//!
//! Usage: `print_effective_config [path/to/config.{json,toml}]`

use formbind_config::{load_binder_config_std_env, to_pretty_json};
use std::io;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() -> std::process::ExitCode {
    init_tracing();
    match run() {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            std::process::ExitCode::from(1)
        },
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = load_binder_config_std_env(path.as_deref(), None)?;
    let output = to_pretty_json(&config)?;

    let mut stdout = io::stdout();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;

    Ok(())
}
