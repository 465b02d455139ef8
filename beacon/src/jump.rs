//! Jump detection.
//!
//! The [`JumpClassifier`] watches cursor movement and decides which moves are
//! large enough to deserve a beacon. It is a small state machine over
//! [`TrackingState`]:
//!
//! - a click within [`MOUSE_DETECTION_WINDOW`] of the next move marks that move
//!   as mouse-driven, which never triggers when `ignore_mouse` is set
//! - a keyboard move triggers when it covers at least `min_jump` lines
//! - entering a buffer always triggers
//!
//! Every processed event leaves `last_position` at the event's position, so
//! distances are always measured from the previous event.

use crate::{host::MouseEvent, BeaconConfig, CursorPosition};
use std::time::{Duration, Instant};
use tracing::trace;

/// Cursor moves reported this soon after a click are treated as mouse-driven.
pub const MOUSE_DETECTION_WINDOW: Duration = Duration::from_millis(100);

/// What the classifier remembers between events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackingState {
    pub last_position: CursorPosition,
    pub last_click: Option<Instant>,
}

/// How a position change was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    /// Caused by a recent click.
    Mouse,
    /// The active buffer changed.
    BufferSwitch,
    /// Keyboard move shorter than `min_jump`.
    Step { distance: u32 },
    /// Keyboard move of at least `min_jump` lines.
    Jump { distance: u32 },
}

/// Result of feeding one event to the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub movement: Movement,
    pub target: CursorPosition,
}

impl Classification {
    /// Position to show a beacon at, if this movement warrants one.
    pub fn trigger(&self) -> Option<CursorPosition> {
        match self.movement {
            Movement::Jump { .. } | Movement::BufferSwitch => Some(self.target),
            Movement::Mouse | Movement::Step { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct JumpClassifier {
    state: TrackingState,
}

impl JumpClassifier {
    /// Start tracking from a known cursor position.
    pub fn new(initial: CursorPosition) -> Self {
        Self {
            state: TrackingState {
                last_position: initial,
                last_click: None,
            },
        }
    }

    pub fn state(&self) -> &TrackingState {
        &self.state
    }

    /// Classify a cursor move within the current buffer.
    pub fn on_cursor_moved(
        &mut self,
        current: CursorPosition,
        now: Instant,
        config: &BeaconConfig,
    ) -> Classification {
        let movement = if config.ignore_mouse && self.within_click_window(now) {
            Movement::Mouse
        } else {
            let distance = self.state.last_position.line_distance(&current);
            if distance >= config.min_jump {
                Movement::Jump { distance }
            } else {
                Movement::Step { distance }
            }
        };

        trace!(from = %self.state.last_position, to = %current, ?movement, "Cursor moved");
        self.state.last_position = current;

        Classification {
            movement,
            target: current,
        }
    }

    /// Classify entering a buffer. Always a trigger.
    pub fn on_buffer_enter(&mut self, current: CursorPosition) -> Classification {
        trace!(at = %current, "Buffer entered");
        self.state.last_position = current;

        Classification {
            movement: Movement::BufferSwitch,
            target: current,
        }
    }

    /// Follow a cursor change the session already handled, without classifying it.
    pub fn sync(&mut self, current: CursorPosition) {
        trace!(at = %current, "Tracking synced");
        self.state.last_position = current;
    }

    /// Record a click and hand the event back untouched.
    pub fn on_mouse_button(&mut self, event: MouseEvent, now: Instant) -> MouseEvent {
        trace!(button = ?event.button, "Mouse button pressed");
        self.state.last_click = Some(now);
        event
    }

    fn within_click_window(&self, now: Instant) -> bool {
        self.state
            .last_click
            .is_some_and(|click| now.saturating_duration_since(click) <= MOUSE_DETECTION_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MouseButton;

    fn config(min_jump: u32, ignore_mouse: bool) -> BeaconConfig {
        BeaconConfig {
            min_jump,
            ignore_mouse,
            ..BeaconConfig::default()
        }
    }

    fn at(line: u32) -> CursorPosition {
        CursorPosition::new(line, 0)
    }

    #[test]
    fn triggers_exactly_at_threshold() {
        let config = config(10, true);
        let now = Instant::now();

        for delta in 0..30u32 {
            let mut down = JumpClassifier::new(at(100));
            let result = down.on_cursor_moved(at(100 + delta), now, &config);
            assert_eq!(result.trigger().is_some(), delta >= 10, "down by {delta}");

            let mut up = JumpClassifier::new(at(100));
            let result = up.on_cursor_moved(at(100 - delta), now, &config);
            assert_eq!(result.trigger().is_some(), delta >= 10, "up by {delta}");
        }
    }

    #[test]
    fn column_changes_never_trigger() {
        let config = config(1, true);
        let mut classifier = JumpClassifier::new(CursorPosition::new(4, 0));

        let result =
            classifier.on_cursor_moved(CursorPosition::new(4, 200), Instant::now(), &config);
        assert_eq!(result.movement, Movement::Step { distance: 0 });
        assert_eq!(classifier.state().last_position, CursorPosition::new(4, 200));
    }

    #[test]
    fn distance_measured_from_previous_event() {
        let config = config(10, true);
        let now = Instant::now();
        let mut classifier = JumpClassifier::new(at(0));

        assert!(classifier.on_cursor_moved(at(6), now, &config).trigger().is_none());
        assert!(classifier.on_cursor_moved(at(12), now, &config).trigger().is_none());
        assert_eq!(
            classifier.on_cursor_moved(at(22), now, &config).movement,
            Movement::Jump { distance: 10 }
        );
    }

    #[test]
    fn sync_moves_the_reference_point() {
        let config = config(10, true);
        let now = Instant::now();
        let mut classifier = JumpClassifier::new(at(120));

        classifier.sync(at(0));
        assert_eq!(classifier.state().last_position, at(0));
        assert_eq!(
            classifier.on_cursor_moved(at(3), now, &config).movement,
            Movement::Step { distance: 3 }
        );
    }

    #[test]
    fn click_suppresses_following_move() {
        let config = config(10, true);
        let start = Instant::now();
        let mut classifier = JumpClassifier::new(at(25));

        let event = MouseEvent::new(MouseButton::Left).at(at(40));
        let returned = classifier.on_mouse_button(event, start);
        assert_eq!(returned, event);

        for offset in [0, 30, 100] {
            let mut classifier = classifier.clone();
            let result =
                classifier.on_cursor_moved(at(40), start + Duration::from_millis(offset), &config);
            assert_eq!(result.movement, Movement::Mouse, "{offset}ms after click");
            assert_eq!(classifier.state().last_position, at(40));
        }
    }

    #[test]
    fn click_window_expires() {
        let config = config(10, true);
        let start = Instant::now();
        let mut classifier = JumpClassifier::new(at(25));

        classifier.on_mouse_button(MouseEvent::new(MouseButton::Middle), start);
        let result =
            classifier.on_cursor_moved(at(40), start + Duration::from_millis(101), &config);
        assert_eq!(result.movement, Movement::Jump { distance: 15 });
    }

    #[test]
    fn clicks_ignored_when_mouse_detection_disabled() {
        let config = config(10, false);
        let start = Instant::now();
        let mut classifier = JumpClassifier::new(at(25));

        classifier.on_mouse_button(MouseEvent::new(MouseButton::Right), start);
        let result = classifier.on_cursor_moved(at(40), start + Duration::from_millis(30), &config);
        assert_eq!(result.trigger(), Some(at(40)));
    }

    #[test]
    fn buffer_enter_always_triggers() {
        let config = config(10, true);
        let now = Instant::now();
        let mut classifier = JumpClassifier::new(at(40));
        classifier.on_mouse_button(MouseEvent::new(MouseButton::Left), now);

        let result = classifier.on_buffer_enter(at(40));
        assert_eq!(result.movement, Movement::BufferSwitch);
        assert_eq!(result.trigger(), Some(at(40)));

        // Tracking restarts from the buffer's position.
        let result = classifier.on_cursor_moved(at(45), now + Duration::from_secs(1), &config);
        assert_eq!(result.movement, Movement::Step { distance: 5 });
    }

    #[test]
    fn mouse_press_changes_nothing_but_click_time() {
        let now = Instant::now();
        let mut classifier = JumpClassifier::new(at(7));

        classifier.on_mouse_button(MouseEvent::new(MouseButton::Left), now);
        assert_eq!(
            classifier.state(),
            &TrackingState {
                last_position: at(7),
                last_click: Some(now),
            }
        );
    }
}
