//! The plugin surface a host adapter talks to.
//!
//! A [`BeaconSession`] lives as long as the editing session. The host adapter
//! wires editor events to it:
//!
//! | Editor event              | Session method                       |
//! |---------------------------|--------------------------------------|
//! | cursor moved              | [`BeaconSession::cursor_moved`]      |
//! | buffer entered            | [`BeaconSession::buffer_entered`]    |
//! | mouse button pressed      | [`BeaconSession::mouse_button`]      |
//! | any timer fired           | [`BeaconSession::on_timer`]          |
//!
//! and exposes the user-facing commands: [`BeaconSession::show_at_cursor`],
//! [`BeaconSession::toggle`] and [`BeaconSession::jump`] for enhanced jump-list
//! bindings.

use crate::{
    host::{Host, JumpDirection, MouseEvent, TimerId},
    jump::{JumpClassifier, TrackingState},
    renderer::{BeaconId, BeaconRenderer},
    BeaconConfig, CursorPosition,
};
use rustc_hash::FxHashMap;
use std::time::Duration;
use tracing::{debug, info, trace};

/// How long after a jump-list navigation the cursor is compared again.
///
/// Editors often apply the navigation on the next turn of their event loop.
pub const JUMP_SETTLE_DELAY: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy)]
struct PendingJump {
    origin: CursorPosition,
    direction: JumpDirection,
}

#[derive(Debug)]
pub struct BeaconSession {
    config: BeaconConfig,
    classifier: JumpClassifier,
    renderer: BeaconRenderer,
    pending_jumps: FxHashMap<TimerId, PendingJump>,
}

impl BeaconSession {
    /// Start a session, tracking from the host's current cursor.
    pub fn new(config: BeaconConfig, host: &impl Host) -> Self {
        config.check();

        let initial = host.cursor().unwrap_or_else(|e| {
            debug!(error = %e, "No cursor at session start, tracking from origin");
            CursorPosition::default()
        });

        Self {
            config,
            classifier: JumpClassifier::new(initial),
            renderer: BeaconRenderer::new(),
            pending_jumps: FxHashMap::default(),
        }
    }

    pub fn config(&self) -> &BeaconConfig {
        &self.config
    }

    /// Replace the live configuration. Beacons already showing keep fading as before.
    pub fn set_config(&mut self, config: BeaconConfig) {
        config.check();
        self.config = config;
    }

    pub fn renderer(&self) -> &BeaconRenderer {
        &self.renderer
    }

    pub fn tracking(&self) -> &TrackingState {
        self.classifier.state()
    }

    /// Flip `enabled`. Returns the new value.
    pub fn toggle(&mut self) -> bool {
        self.config.enabled = !self.config.enabled;
        info!(enabled = self.config.enabled, "Toggled beacons");
        self.config.enabled
    }

    /// Classify a cursor move and show a beacon if it was a jump.
    ///
    /// The move is tracked even with `cursor_events` off, so turning them back
    /// on measures from the latest position.
    pub fn cursor_moved(&mut self, host: &mut impl Host) -> Option<BeaconId> {
        let current = match host.cursor() {
            Ok(current) => current,
            Err(e) => {
                debug!(error = %e, "Ignoring cursor move, no cursor");
                return None;
            },
        };

        let classification = self
            .classifier
            .on_cursor_moved(current, host.now(), &self.config);
        if !self.config.cursor_events {
            return None;
        }
        let target = classification.trigger()?;
        debug!(movement = ?classification.movement, at = %target, "Jump detected");
        self.auto_show(host, target)
    }

    /// Show a beacon in the buffer just entered. Tracked like [`Self::cursor_moved`].
    pub fn buffer_entered(&mut self, host: &mut impl Host) -> Option<BeaconId> {
        let current = match host.cursor() {
            Ok(current) => current,
            Err(e) => {
                debug!(error = %e, "Ignoring buffer enter, no cursor");
                return None;
            },
        };

        let classification = self.classifier.on_buffer_enter(current);
        if !self.config.buffer_events {
            return None;
        }
        let target = classification.trigger()?;
        self.auto_show(host, target)
    }

    /// Observe a pointer button press. The event is returned unchanged.
    pub fn mouse_button(&mut self, host: &impl Host, event: MouseEvent) -> MouseEvent {
        self.classifier.on_mouse_button(event, host.now())
    }

    /// Show a beacon at the cursor, regardless of how far it moved.
    pub fn show_at_cursor(&mut self, host: &mut impl Host) -> Option<BeaconId> {
        match host.cursor() {
            Ok(current) => self.show(host, current, None),
            Err(e) => {
                debug!(error = %e, "Cannot show beacon, no cursor");
                None
            },
        }
    }

    /// Show a beacon at an explicit position.
    pub fn show(
        &mut self,
        host: &mut impl Host,
        position: CursorPosition,
        width: Option<u32>,
    ) -> Option<BeaconId> {
        self.renderer.show(host, &self.config, position, width)
    }

    /// Run the editor's jump-list navigation, then show a beacon if the cursor moved.
    ///
    /// The comparison happens [`JUMP_SETTLE_DELAY`] later through
    /// [`BeaconSession::on_timer`]. An automatic beacon shown before then marks
    /// the landing spot already and cancels the comparison. Returns false when
    /// nothing was scheduled.
    pub fn jump(&mut self, host: &mut impl Host, direction: JumpDirection) -> bool {
        let origin = match host.cursor() {
            Ok(origin) => origin,
            Err(e) => {
                debug!(error = %e, ?direction, "Cannot jump, no cursor");
                return false;
            },
        };

        if let Err(e) = host.navigate(direction) {
            debug!(error = %e, ?direction, "Jump-list navigation failed");
            return false;
        }

        // Hosts that apply the navigation right away report the landing spot now.
        if let Ok(landed) = host.cursor() {
            self.classifier.sync(landed);
        }

        let timer = host.start_timeout(JUMP_SETTLE_DELAY);
        self.pending_jumps.insert(timer, PendingJump { origin, direction });
        true
    }

    /// Handle a timer delivery from the host.
    ///
    /// Returns false for timers the session does not own.
    pub fn on_timer(&mut self, host: &mut impl Host, timer: TimerId) -> bool {
        if let Some(pending) = self.pending_jumps.remove(&timer) {
            self.settle_jump(host, pending);
            return true;
        }
        self.renderer.on_timer(host, timer)
    }

    fn settle_jump(&mut self, host: &mut impl Host, pending: PendingJump) {
        match host.cursor() {
            Ok(current) if current != pending.origin => {
                debug!(
                    direction = ?pending.direction,
                    from = %pending.origin,
                    to = %current,
                    "Jump moved cursor"
                );
                self.classifier.sync(current);
                self.show(host, current, None);
            },
            Ok(_) => {
                trace!(direction = ?pending.direction, "Jump left cursor in place");
            },
            Err(e) => {
                debug!(error = %e, "Cannot compare jump, no cursor");
            },
        }
    }

    /// Remove every beacon and cancel pending jump checks.
    pub fn shutdown(&mut self, host: &mut impl Host) {
        self.renderer.clear(host);
        self.cancel_pending_jumps(host);
    }

    fn cancel_pending_jumps(&mut self, host: &mut impl Host) {
        for (timer, pending) in self.pending_jumps.drain() {
            trace!(direction = ?pending.direction, %timer, "Pending jump check cancelled");
            host.stop_timer(timer);
        }
    }

    fn auto_show(&mut self, host: &mut impl Host, target: CursorPosition) -> Option<BeaconId> {
        if let Some(filetype) = host.filetype() {
            if self.config.ignores_filetype(&filetype) {
                trace!(%filetype, "Filetype ignored, not showing");
                return None;
            }
        }
        let id = self.show(host, target, None)?;
        self.cancel_pending_jumps(host);
        Some(id)
    }
}
