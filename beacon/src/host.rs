//! The editor capabilities the beacon core depends on.
//!
//! The core never talks to an editor directly. A host adapter implements
//! [`Host`] over the editor's window, buffer, highlight and timer APIs, and
//! forwards editor events into [`crate::BeaconSession`]. Timers are reported
//! back by id through [`crate::BeaconSession::on_timer`], one delivery at a
//! time on the editor's event loop.

use crate::CursorPosition;
use std::{
    fmt,
    time::{Duration, Instant},
};
use thiserror::Error;

/// Handle to an overlay created by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(pub u64);

/// Handle to a repeating or one-shot timer created by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "overlay#{}", self.0)
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Layer the beacon is drawn on. Above every normal window and float.
pub const TOPMOST_Z_INDEX: u32 = 1000;

/// Everything the host needs to allocate a beacon overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlaySpec {
    /// Top-left cell of the overlay.
    pub anchor: CursorPosition,
    pub width: u32,
    pub height: u32,
    /// 0 is opaque, 100 is fully transparent.
    pub transparency: u8,
    /// Highlight group or color style reference.
    pub highlight: String,
    pub focusable: bool,
    pub z_index: u32,
}

/// Direction of a jump-list navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JumpDirection {
    Backward,
    Forward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// A pointer button press as seen by the host.
///
/// The session only observes these. The same value is handed back so the host
/// can continue with its native click handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub button: MouseButton,
    /// Cell under the pointer, when the host knows it.
    pub position: Option<CursorPosition>,
}

impl MouseEvent {
    pub fn new(button: MouseButton) -> Self {
        Self {
            button,
            position: None,
        }
    }

    pub fn at(mut self, position: CursorPosition) -> Self {
        self.position = Some(position);
        self
    }
}

/// Failures reported by host capabilities.
///
/// None of these escape the core. They are logged and turned into a no-op or
/// a fallback value at the call site.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("no active window")]
    NoActiveWindow,

    #[error("line {line} is out of range")]
    LineOutOfRange { line: u32 },

    #[error("{0} is no longer valid")]
    InvalidOverlay(OverlayId),

    #[error("overlay rejected: {reason}")]
    OverlayRejected { reason: String },

    #[error("navigation failed: {reason}")]
    Navigation { reason: String },
}

/// Editor capabilities consumed by the beacon core.
pub trait Host {
    /// Monotonic time on the host's clock.
    fn now(&self) -> Instant;

    /// Cursor position in the active window.
    fn cursor(&self) -> Result<CursorPosition, HostError>;

    /// Filetype of the active buffer, if it has one.
    fn filetype(&self) -> Option<String>;

    /// Visible length of a line in the active buffer.
    fn line_len(&self, line: u32) -> Result<u32, HostError>;

    /// Create a non-interactive overlay.
    fn open_overlay(&mut self, spec: &OverlaySpec) -> Result<OverlayId, HostError>;

    fn overlay_is_valid(&self, overlay: OverlayId) -> bool;

    fn set_overlay_transparency(
        &mut self,
        overlay: OverlayId,
        transparency: u8,
    ) -> Result<(), HostError>;

    /// Remove an overlay. Must be a no-op for an overlay that is already gone.
    fn close_overlay(&mut self, overlay: OverlayId);

    /// Start a repeating timer. The first delivery happens after `initial_delay`.
    fn start_interval(&mut self, initial_delay: Duration, period: Duration) -> TimerId;

    /// Start a one-shot timer.
    fn start_timeout(&mut self, delay: Duration) -> TimerId;

    /// Stop a timer. Must be a no-op for a timer that already stopped or fired.
    fn stop_timer(&mut self, timer: TimerId);

    /// Run the editor's native jump-list navigation.
    fn navigate(&mut self, direction: JumpDirection) -> Result<(), HostError>;
}
