use anyhow::{Context, Result};
use beacon::BeaconConfig;
use std::io::Write;

/// Print the effective configuration as TOML.
pub fn run(config: &BeaconConfig, out: &mut impl Write) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to render config")?;
    out.write_all(rendered.as_bytes())?;

    if let Some(fade) = config.fade_duration() {
        writeln!(out, "\n# full fade takes {}ms", fade.as_millis())?;
    }
    if !config.check() {
        writeln!(out, "# warning: beacons are cut short by timeout_ms")?;
    }
    Ok(())
}
