use beacon::BeaconConfig;
use beacon_bin::{
    cli::{Cli, Command},
    commands,
    script::Script,
};
use beacon_log::LogConfig;
use clap::Parser;
use std::{io, path::PathBuf};
use tracing::debug;

fn main() {
    let cli = Cli::parse();

    let _log_guard = match beacon_log::init(LogConfig {
        log_file_path: cli.log_file.clone(),
    }) {
        Ok(guard) => {
            debug!(log_file = %guard.log_file.display(), "Logging initialized");
            Some(guard)
        },
        Err(e) => {
            eprintln!("Warning: Failed to initialize logging: {e}");
            None
        },
    };

    let discovered = discover_config();
    let config = BeaconConfig::load_with_overrides(cli.config.as_deref(), discovered.as_deref())
        .unwrap_or_else(|e| {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        });

    let mut stdout = io::stdout().lock();
    let result = match cli.command {
        Command::Replay { script } => Script::load(&script)
            .and_then(|script| commands::replay::run(config, &script, &mut stdout)),
        Command::Config => commands::config::run(&config, &mut stdout),
    };

    if let Err(e) = result {
        eprintln!("Command failed: {e:#}");
        std::process::exit(1);
    }
}

/// `<config_dir>/beacon/config.toml`, when it exists.
fn discover_config() -> Option<PathBuf> {
    let path = dirs::config_dir()?.join("beacon").join("config.toml");
    path.is_file().then_some(path)
}
