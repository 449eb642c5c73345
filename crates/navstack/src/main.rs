mod demo;
mod shell;

use anyhow::{Context, Error};
use clap::Parser;
use navstack_core::logging::{get_run_id, init_logging, shutdown_logging};
use navstack_core::navigation::NavigationEngine;
use navstack_core::settings::{Settings, SETTINGS_FILE};
use shell::Shell;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "navstack")]
#[command(about = "Drive a screen and popup navigation stack from the command line")]
struct Cli {
    /// Settings file to load
    #[arg(long, default_value = SETTINGS_FILE)]
    settings: PathBuf,
    /// Read commands from a file instead of stdin
    #[arg(long)]
    script: Option<PathBuf>,
}

fn run(cli: Cli) -> Result<(), Error> {
    let settings = Settings::load(&cli.settings);
    init_logging(&settings.logging)?;
    info!(run_id = get_run_id(), settings = %cli.settings.display(), "navstack started");

    let engine = NavigationEngine::new(demo::demo_registry(), settings.navigation.clone());
    let shell = Shell::new(&engine);
    let mut stdout = io::stdout().lock();

    let result = match &cli.script {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("can't open script {}", path.display()))?;
            shell.run(BufReader::new(file), &mut stdout)
        }
        None => shell.run(io::stdin().lock(), &mut stdout),
    };

    info!(contexts = engine.stack_count(), "navstack stopped");
    result
}

fn main() -> Result<(), Error> {
    let result = run(Cli::parse());
    shutdown_logging();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["navstack"]);
        assert_eq!(cli.settings, PathBuf::from(SETTINGS_FILE));
        assert!(cli.script.is_none());
    }

    #[test]
    fn test_cli_script_flag() {
        let cli = Cli::parse_from(["navstack", "--settings", "custom.toml", "--script", "demo.nav"]);
        assert_eq!(cli.settings, PathBuf::from("custom.toml"));
        assert_eq!(cli.script, Some(PathBuf::from("demo.nav")));
    }
}
