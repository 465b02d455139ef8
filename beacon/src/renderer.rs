//! Beacon rendering and fade animation.
//!
//! Each call to [`BeaconRenderer::show`] creates an independent beacon: one
//! overlay, one repeating ticker and one safety-net deadline. Ticks raise the
//! overlay's transparency by the beacon's fade step until it reaches 100.
//!
//! A beacon ends in exactly one of these ways, whichever comes first:
//!
//! - [`Teardown::FadedOut`]: transparency reached 100
//! - [`Teardown::HostInvalidated`]: the host destroyed the overlay
//! - [`Teardown::TimedOut`]: the deadline fired
//! - [`Teardown::Cleared`]: the session shut down
//!
//! All of them go through [`BeaconRenderer::release`]. Release removes the
//! beacon from the map before touching any handle, so a second release of the
//! same beacon finds nothing and does nothing.

use crate::{
    host::{Host, OverlayId, OverlaySpec, TimerId, TOPMOST_Z_INDEX},
    BeaconConfig, CursorPosition,
};
use rustc_hash::FxHashMap;
use std::{fmt, time::Duration};
use tracing::{debug, trace, warn};

/// Narrowest beacon drawn on a short line.
pub const MIN_WIDTH: u32 = 10;

/// Fully transparent.
pub const TRANSPARENT: u8 = 100;

/// Hosts schedule a zero period as a busy loop; never ask for one.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BeaconId(pub u64);

impl fmt::Display for BeaconId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "beacon#{}", self.0)
    }
}

/// Why a beacon was torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Teardown {
    FadedOut,
    HostInvalidated,
    TimedOut,
    Cleared,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct BeaconInstance {
    overlay: OverlayId,
    ticker: TimerId,
    deadline: TimerId,
    transparency: u8,
    target: CursorPosition,
    width: u32,
    /// Captured at creation so config changes never affect a running fade.
    fade_step: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerRole {
    Tick,
    Deadline,
}

/// Owns every beacon currently on screen.
#[derive(Debug, Default)]
pub struct BeaconRenderer {
    next_id: u64,
    beacons: FxHashMap<BeaconId, BeaconInstance>,
    timers: FxHashMap<TimerId, (BeaconId, TimerRole)>,
}

impl BeaconRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a beacon at `position`.
    ///
    /// `width` defaults to `config.max_width` and is narrowed to the line's
    /// length, never below [`MIN_WIDTH`]. Returns `None` when beacons are
    /// disabled or the host refuses the overlay; nothing is left allocated in
    /// either case.
    pub fn show(
        &mut self,
        host: &mut impl Host,
        config: &BeaconConfig,
        position: CursorPosition,
        width: Option<u32>,
    ) -> Option<BeaconId> {
        if !config.enabled {
            trace!(at = %position, "Beacons disabled, not showing");
            return None;
        }

        let requested = width.unwrap_or(config.max_width);
        let width = clamp_width(&*host, position.line, requested, config);
        let spec = OverlaySpec {
            anchor: position,
            width,
            height: 1,
            transparency: 0,
            highlight: config.highlight.clone(),
            focusable: false,
            z_index: TOPMOST_Z_INDEX,
        };

        let overlay = match host.open_overlay(&spec) {
            Ok(overlay) => overlay,
            Err(e) => {
                warn!(at = %position, error = %e, "Could not open beacon overlay");
                return None;
            },
        };

        let ticker = host.start_interval(Duration::ZERO, config.interval().max(MIN_INTERVAL));
        let deadline = host.start_timeout(config.timeout());

        let id = BeaconId(self.next_id);
        self.next_id += 1;

        self.timers.insert(ticker, (id, TimerRole::Tick));
        self.timers.insert(deadline, (id, TimerRole::Deadline));
        self.beacons.insert(
            id,
            BeaconInstance {
                overlay,
                ticker,
                deadline,
                transparency: 0,
                target: position,
                width,
                fade_step: config.fade_step,
            },
        );

        debug!(beacon = %id, %overlay, at = %position, width, "Showing beacon");
        Some(id)
    }

    /// Handle a timer delivery. Returns false for timers this renderer does not own.
    pub fn on_timer(&mut self, host: &mut impl Host, timer: TimerId) -> bool {
        let Some(&(id, role)) = self.timers.get(&timer) else {
            return false;
        };

        match role {
            TimerRole::Tick => self.tick(host, id),
            TimerRole::Deadline => {
                self.release(host, id, Teardown::TimedOut);
            },
        }
        true
    }

    fn tick(&mut self, host: &mut impl Host, id: BeaconId) {
        let Some(beacon) = self.beacons.get_mut(&id) else {
            return;
        };

        if !host.overlay_is_valid(beacon.overlay) {
            self.release(host, id, Teardown::HostInvalidated);
            return;
        }

        let next = u32::from(beacon.transparency) + u32::from(beacon.fade_step);
        if next >= u32::from(TRANSPARENT) {
            self.release(host, id, Teardown::FadedOut);
            return;
        }

        // next < 100, fits in u8
        let next = next as u8;
        if let Err(e) = host.set_overlay_transparency(beacon.overlay, next) {
            debug!(beacon = %id, error = %e, "Overlay rejected transparency update");
            self.release(host, id, Teardown::HostInvalidated);
            return;
        }

        beacon.transparency = next;
        trace!(beacon = %id, transparency = next, "Beacon faded");
    }

    /// Tear a beacon down: stop both timers and close the overlay if it still exists.
    ///
    /// Returns false when the beacon was already released.
    pub fn release(&mut self, host: &mut impl Host, id: BeaconId, reason: Teardown) -> bool {
        let Some(beacon) = self.beacons.remove(&id) else {
            trace!(beacon = %id, ?reason, "Beacon already released");
            return false;
        };

        self.timers.remove(&beacon.ticker);
        self.timers.remove(&beacon.deadline);
        host.stop_timer(beacon.ticker);
        host.stop_timer(beacon.deadline);

        if reason != Teardown::HostInvalidated && host.overlay_is_valid(beacon.overlay) {
            host.close_overlay(beacon.overlay);
        }

        debug!(
            beacon = %id,
            ?reason,
            transparency = beacon.transparency,
            at = %beacon.target,
            "Beacon released"
        );
        true
    }

    /// Release every active beacon.
    pub fn clear(&mut self, host: &mut impl Host) {
        let mut ids: Vec<BeaconId> = self.beacons.keys().copied().collect();
        ids.sort();
        for id in ids {
            self.release(host, id, Teardown::Cleared);
        }
    }

    pub fn is_active(&self, id: BeaconId) -> bool {
        self.beacons.contains_key(&id)
    }

    pub fn active_count(&self) -> usize {
        self.beacons.len()
    }

    /// Current transparency of an active beacon.
    pub fn transparency(&self, id: BeaconId) -> Option<u8> {
        self.beacons.get(&id).map(|beacon| beacon.transparency)
    }

    /// Width an active beacon was drawn with.
    pub fn width(&self, id: BeaconId) -> Option<u32> {
        self.beacons.get(&id).map(|beacon| beacon.width)
    }

    pub fn overlay(&self, id: BeaconId) -> Option<OverlayId> {
        self.beacons.get(&id).map(|beacon| beacon.overlay)
    }
}

fn clamp_width(host: &impl Host, line: u32, requested: u32, config: &BeaconConfig) -> u32 {
    match host.line_len(line) {
        Ok(len) => requested.min(len.max(MIN_WIDTH)),
        Err(e) => {
            debug!(line, error = %e, "Could not read line, using default width");
            config.max_width
        },
    }
}
