//! Beacon configuration, loaded from `config.toml`.
//!
//! # Architecture
//!
//! 1. The host integration picks a config path (or none)
//! 2. [`BeaconConfig::load_with_overrides`] resolves it: CLI override > discovered > embedded defaults
//! 3. The [`BeaconConfig`] is handed to [`crate::BeaconSession::new`], which owns it for the session
//!
//! The session reads the config on every operation, so a toggle or reload takes
//! effect on the next event. Beacons already on screen keep the fade step they
//! were created with.
//!
//! Values are deliberately not validated. A zero fade step or an interval longer
//! than the timeout is tolerated; the timeout bounds every beacon's lifetime.
//! [`BeaconConfig::check`] only reports such combinations.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use tracing::warn;

/// Configuration for beacon detection and rendering.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BeaconConfig {
    /// Master switch. When false, [`crate::BeaconRenderer::show`] is a no-op.
    pub enabled: bool,

    /// Minimum line distance a keyboard move must cover to show a beacon.
    pub min_jump: u32,

    /// Transparency added to a beacon per tick, in percent.
    pub fade_step: u8,

    /// Default and maximum beacon width, in columns.
    pub max_width: u32,

    /// Hard upper bound on a beacon's lifetime, in milliseconds.
    pub timeout_ms: u64,

    /// Milliseconds between fade ticks.
    pub interval_ms: u64,

    /// Skip beacons for cursor moves that follow a mouse click.
    pub ignore_mouse: bool,

    /// Highlight group (or color style) the host draws the beacon with.
    pub highlight: String,

    /// React to cursor-moved events.
    pub cursor_events: bool,

    /// React to buffer-enter events.
    pub buffer_events: bool,

    /// Filetypes where automatic beacons are skipped. Manual triggers still work.
    pub ignore_filetypes: Vec<String>,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_jump: 10,
            fade_step: 10,
            max_width: 40,
            timeout_ms: 500,
            interval_ms: 40,
            ignore_mouse: true,
            highlight: "Beacon".to_string(),
            cursor_events: true,
            buffer_events: true,
            ignore_filetypes: Vec::new(),
        }
    }
}

impl BeaconConfig {
    /// Read and deserialize a TOML config file from the given path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: BeaconConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration with priority: CLI override > discovered path > defaults.
    pub fn load_with_overrides(
        cli_override: Option<&Path>,
        discovered_path: Option<&Path>,
    ) -> Result<Self> {
        if let Some(path) = cli_override {
            return Self::load(path);
        }
        if let Some(path) = discovered_path {
            return Self::load(path);
        }
        Self::load_embedded()
    }

    fn load_embedded() -> Result<Self> {
        let source = include_str!("../../config.toml");
        toml::from_str(source).context("Failed to parse embedded config.toml")
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Number of ticks a beacon needs to fade out completely.
    ///
    /// `None` when `fade_step` is zero, in which case only the timeout ends it.
    pub fn fade_ticks(&self) -> Option<u32> {
        if self.fade_step == 0 {
            return None;
        }
        Some(100u32.div_ceil(u32::from(self.fade_step)))
    }

    /// How long a full fade takes at the configured interval.
    pub fn fade_duration(&self) -> Option<Duration> {
        self.fade_ticks().map(|ticks| self.interval() * ticks)
    }

    /// Whether the fade completes before the timeout cuts it short.
    ///
    /// Logs a warning for each inconsistency. Nothing is rejected.
    pub fn check(&self) -> bool {
        match self.fade_duration() {
            None => {
                warn!(
                    timeout_ms = self.timeout_ms,
                    "fade_step is 0, beacons only disappear on timeout"
                );
                false
            },
            Some(fade) if fade > self.timeout() => {
                warn!(
                    fade_ms = fade.as_millis() as u64,
                    timeout_ms = self.timeout_ms,
                    "Beacon fade outlasts timeout, beacons will be cut short"
                );
                false
            },
            Some(_) => true,
        }
    }

    /// Whether automatic beacons are suppressed for this filetype.
    pub fn ignores_filetype(&self, filetype: &str) -> bool {
        self.ignore_filetypes.iter().any(|ignored| ignored == filetype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn loads_empty_config() {
        let tmp_dir = tempdir().unwrap();
        let config_path = tmp_dir.path().join("config.toml");
        std::fs::write(&config_path, "").unwrap();

        let config = BeaconConfig::load(&config_path).unwrap();
        assert_eq!(config, BeaconConfig::default());
    }

    #[test]
    fn errors_on_invalid_toml() {
        let tmp_dir = tempdir().unwrap();
        let config_path = tmp_dir.path().join("config.toml");
        std::fs::write(&config_path, "invalid toml {{{{").unwrap();

        let result = BeaconConfig::load(&config_path);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Failed to parse"));
    }

    #[test]
    fn errors_on_nonexistent_file() {
        let tmp_dir = tempdir().unwrap();
        let config_path = tmp_dir.path().join("nonexistent.toml");

        let result = BeaconConfig::load(&config_path);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Failed to read"));
    }

    #[test]
    fn errors_on_unknown_field() {
        let tmp_dir = tempdir().unwrap();
        let config_path = tmp_dir.path().join("config.toml");
        std::fs::write(&config_path, "min_jmp = 3").unwrap();

        assert!(BeaconConfig::load(&config_path).is_err());
    }

    #[test]
    fn cli_override_takes_priority() {
        let tmp_dir = tempdir().unwrap();
        let cli_path = tmp_dir.path().join("cli.toml");
        let discovered_path = tmp_dir.path().join("discovered.toml");
        std::fs::write(&cli_path, "min_jump = 3").unwrap();
        std::fs::write(&discovered_path, "min_jump = 30").unwrap();

        let config =
            BeaconConfig::load_with_overrides(Some(&cli_path), Some(&discovered_path)).unwrap();
        assert_eq!(config.min_jump, 3);
    }

    #[test]
    fn discovered_path_used_when_no_cli_override() {
        let tmp_dir = tempdir().unwrap();
        let discovered_path = tmp_dir.path().join("discovered.toml");
        std::fs::write(&discovered_path, "min_jump = 30\nignore_mouse = false").unwrap();

        let config = BeaconConfig::load_with_overrides(None, Some(&discovered_path)).unwrap();
        assert_eq!(config.min_jump, 30);
        assert!(!config.ignore_mouse);
        assert_eq!(config.fade_step, 10);
    }

    #[test]
    fn embedded_defaults_match_default_impl() {
        let config = BeaconConfig::load_with_overrides(None, None).unwrap();
        assert_eq!(config, BeaconConfig::default());
    }

    #[test]
    fn loads_ignore_filetypes() {
        let tmp_dir = tempdir().unwrap();
        let config_path = tmp_dir.path().join("config.toml");
        std::fs::write(&config_path, "ignore_filetypes = [\"help\", \"terminal\"]").unwrap();

        let config = BeaconConfig::load(&config_path).unwrap();
        assert!(config.ignores_filetype("help"));
        assert!(config.ignores_filetype("terminal"));
        assert!(!config.ignores_filetype("rust"));
    }

    #[test]
    fn fade_duration_rounds_ticks_up() {
        let config = BeaconConfig {
            fade_step: 8,
            interval_ms: 50,
            ..BeaconConfig::default()
        };
        assert_eq!(config.fade_ticks(), Some(13));
        assert_eq!(config.fade_duration(), Some(Duration::from_millis(650)));
    }

    #[test]
    fn check_flags_fade_longer_than_timeout() {
        beacon_log::test();

        assert!(BeaconConfig::default().check());

        let slow = BeaconConfig {
            fade_step: 8,
            interval_ms: 50,
            timeout_ms: 500,
            ..BeaconConfig::default()
        };
        assert!(!slow.check());

        let stuck = BeaconConfig {
            fade_step: 0,
            ..BeaconConfig::default()
        };
        assert_eq!(stuck.fade_duration(), None);
        assert!(!stuck.check());
    }
}
