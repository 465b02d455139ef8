use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "beacon", about = "Fading cursor beacons for large jumps")]
pub struct Cli {
    /// Config file, overriding the discovered one.
    #[arg(long, env = "BEACON_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log file or directory. Defaults to the platform data directory.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Parser)]
pub enum Command {
    /// Replay a scripted editor session and print what the editor was asked to draw.
    Replay {
        /// TOML script with `[[buffer]]` and `[[step]]` tables.
        script: PathBuf,
    },
    /// Print the effective configuration.
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_replay_with_global_flags() {
        let cli = Cli::parse_from(["beacon", "replay", "jumps.toml", "--config", "my.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("my.toml")));
        assert!(matches!(
            cli.command,
            Command::Replay { script } if script == PathBuf::from("jumps.toml")
        ));
    }

    #[test]
    fn parses_config_command() {
        let cli = Cli::parse_from(["beacon", "config"]);
        assert!(matches!(cli.command, Command::Config));
    }
}
