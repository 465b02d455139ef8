//! An in-memory editor for driving beacons without a real host.
//!
//! [`SimHost`] implements [`Host`] over a virtual clock. Nothing happens on its
//! own: tests and the `beacon replay` command move the cursor, click, switch
//! buffers and then call [`SimHost::run_for`] to let time pass. Timers are
//! delivered one at a time in `(due, id)` order, which mirrors an editor event
//! loop that never runs two callbacks at once.
//!
//! Every host-side effect is appended to [`SimHost::log`] with the virtual time
//! it happened at.

use crate::{
    host::{
        Host, HostError, JumpDirection, MouseButton, MouseEvent, OverlayId, OverlaySpec, TimerId,
    },
    BeaconSession, CursorPosition,
};
use rustc_hash::FxHashMap;
use std::{
    collections::BTreeMap,
    fmt,
    time::{Duration, Instant},
};

/// A buffer in the simulated editor. Only line lengths matter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimBuffer {
    pub name: String,
    pub filetype: Option<String>,
    line_lens: Vec<u32>,
    /// Cursor restored when the buffer is entered again.
    cursor: CursorPosition,
}

impl SimBuffer {
    /// A buffer of `count` lines, each `width` columns long.
    pub fn uniform(name: impl Into<String>, count: u32, width: u32) -> Self {
        Self {
            name: name.into(),
            filetype: None,
            line_lens: vec![width; count as usize],
            cursor: CursorPosition::default(),
        }
    }

    pub fn from_lines(name: impl Into<String>, lines: &[&str]) -> Self {
        Self {
            name: name.into(),
            filetype: None,
            line_lens: lines
                .iter()
                .map(|line| line.chars().count() as u32)
                .collect(),
            cursor: CursorPosition::default(),
        }
    }

    pub fn with_filetype(mut self, filetype: impl Into<String>) -> Self {
        self.filetype = Some(filetype.into());
        self
    }

    pub fn line_count(&self) -> u32 {
        self.line_lens.len() as u32
    }
}

/// Something the simulated editor did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEvent {
    CursorMoved { to: CursorPosition },
    Clicked { button: MouseButton, at: Option<CursorPosition> },
    BufferEntered { name: String },
    Navigated { direction: JumpDirection, to: CursorPosition },
    OverlayOpened { overlay: OverlayId, spec: OverlaySpec },
    TransparencySet { overlay: OverlayId, transparency: u8 },
    OverlayClosed { overlay: OverlayId },
    OverlayDestroyed { overlay: OverlayId },
    TimerStarted { timer: TimerId, period: Option<Duration> },
    TimerStopped { timer: TimerId },
}

impl fmt::Display for SimEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimEvent::CursorMoved { to } => write!(f, "cursor moved to {to}"),
            SimEvent::Clicked {
                button,
                at: Some(at),
            } => write!(f, "{button:?} click at {at}"),
            SimEvent::Clicked { button, at: None } => write!(f, "{button:?} click"),
            SimEvent::BufferEntered { name } => write!(f, "entered buffer {name}"),
            SimEvent::Navigated { direction, to } => write!(f, "jumped {direction:?} to {to}"),
            SimEvent::OverlayOpened { overlay, spec } => write!(
                f,
                "{overlay} opened at {} width {} ({})",
                spec.anchor, spec.width, spec.highlight
            ),
            SimEvent::TransparencySet {
                overlay,
                transparency,
            } => write!(f, "{overlay} transparency {transparency}"),
            SimEvent::OverlayClosed { overlay } => write!(f, "{overlay} closed"),
            SimEvent::OverlayDestroyed { overlay } => write!(f, "{overlay} destroyed by editor"),
            SimEvent::TimerStarted {
                timer,
                period: Some(period),
            } => write!(f, "{timer} started every {}ms", period.as_millis()),
            SimEvent::TimerStarted {
                timer,
                period: None,
            } => write!(f, "{timer} started once"),
            SimEvent::TimerStopped { timer } => write!(f, "{timer} stopped"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedEvent {
    /// Virtual time since the host was created.
    pub at: Duration,
    pub event: SimEvent,
}

#[derive(Debug, Clone)]
struct SimOverlay {
    spec: OverlaySpec,
    open: bool,
    /// Every transparency the overlay showed, starting with the initial one.
    history: Vec<u8>,
}

#[derive(Debug, Clone, Copy)]
struct SimTimer {
    due: Duration,
    period: Option<Duration>,
}

#[derive(Debug)]
pub struct SimHost {
    origin: Instant,
    elapsed: Duration,
    buffers: Vec<SimBuffer>,
    active: usize,
    jumplist: Vec<(usize, CursorPosition)>,
    jump_index: usize,
    overlays: BTreeMap<OverlayId, SimOverlay>,
    close_calls: FxHashMap<OverlayId, usize>,
    timers: BTreeMap<TimerId, SimTimer>,
    next_overlay: u64,
    next_timer: u64,
    refuse_overlays: bool,
    cursor_unavailable: bool,
    log: Vec<LoggedEvent>,
}

impl SimHost {
    pub fn new(buffer: SimBuffer) -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Duration::ZERO,
            buffers: vec![buffer],
            active: 0,
            jumplist: Vec::new(),
            jump_index: 0,
            overlays: BTreeMap::new(),
            close_calls: FxHashMap::default(),
            timers: BTreeMap::new(),
            next_overlay: 0,
            next_timer: 0,
            refuse_overlays: false,
            cursor_unavailable: false,
            log: Vec::new(),
        }
    }

    /// Virtual time since the host was created.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn log(&self) -> &[LoggedEvent] {
        &self.log
    }

    fn record(&mut self, event: SimEvent) {
        self.log.push(LoggedEvent {
            at: self.elapsed,
            event,
        });
    }

    // ===== Editor side =====

    /// Add a buffer without entering it. Returns its index.
    pub fn add_buffer(&mut self, buffer: SimBuffer) -> usize {
        self.buffers.push(buffer);
        self.buffers.len() - 1
    }

    pub fn active_buffer(&self) -> &SimBuffer {
        &self.buffers[self.active]
    }

    pub fn buffer_index(&self, name: &str) -> Option<usize> {
        self.buffers.iter().position(|buffer| buffer.name == name)
    }

    /// Move the cursor without touching the jump list, like a plain motion.
    pub fn set_cursor(&mut self, to: CursorPosition) {
        self.buffers[self.active].cursor = to;
        self.record(SimEvent::CursorMoved { to });
    }

    /// Press a mouse button. Moving the cursor to the clicked cell is up to the caller.
    pub fn click(&mut self, event: &MouseEvent) {
        self.record(SimEvent::Clicked {
            button: event.button,
            at: event.position,
        });
    }

    /// Move the cursor and remember the old position in the jump list.
    pub fn jump_to(&mut self, to: CursorPosition) {
        self.jumplist.truncate(self.jump_index);
        self.jumplist.push((self.active, self.current_cursor()));
        self.jump_index = self.jumplist.len();
        self.set_cursor(to);
    }

    /// Switch to another buffer, restoring its last cursor.
    pub fn enter_buffer(&mut self, index: usize) {
        if index >= self.buffers.len() {
            return;
        }
        self.jumplist.truncate(self.jump_index);
        self.jumplist.push((self.active, self.current_cursor()));
        self.jump_index = self.jumplist.len();
        self.active = index;
        let name = self.buffers[index].name.clone();
        self.record(SimEvent::BufferEntered { name });
    }

    fn current_cursor(&self) -> CursorPosition {
        self.buffers[self.active].cursor
    }

    // ===== Failure injection =====

    pub fn refuse_overlays(&mut self, refuse: bool) {
        self.refuse_overlays = refuse;
    }

    pub fn set_cursor_unavailable(&mut self, unavailable: bool) {
        self.cursor_unavailable = unavailable;
    }

    /// Close an overlay behind the core's back, as a window close would.
    pub fn destroy_overlay(&mut self, overlay: OverlayId) {
        if let Some(entry) = self.overlays.get_mut(&overlay) {
            if entry.open {
                entry.open = false;
                self.record(SimEvent::OverlayDestroyed { overlay });
            }
        }
    }

    // ===== Inspection =====

    pub fn open_overlay_count(&self) -> usize {
        self.overlays.values().filter(|overlay| overlay.open).count()
    }

    pub fn open_overlays(&self) -> Vec<OverlayId> {
        self.overlays
            .iter()
            .filter(|(_, overlay)| overlay.open)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn overlay_spec(&self, overlay: OverlayId) -> Option<&OverlaySpec> {
        self.overlays.get(&overlay).map(|entry| &entry.spec)
    }

    pub fn transparency_history(&self, overlay: OverlayId) -> Option<&[u8]> {
        self.overlays
            .get(&overlay)
            .map(|entry| entry.history.as_slice())
    }

    /// How many times [`Host::close_overlay`] was called for this overlay.
    pub fn close_calls(&self, overlay: OverlayId) -> usize {
        self.close_calls.get(&overlay).copied().unwrap_or(0)
    }

    pub fn running_timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Running timers in creation order.
    pub fn running_timers(&self) -> Vec<TimerId> {
        self.timers.keys().copied().collect()
    }

    // ===== Clock =====

    /// Let `duration` of virtual time pass, delivering due timers to `session`.
    pub fn run_for(&mut self, session: &mut BeaconSession, duration: Duration) {
        let until = self.elapsed + duration;
        self.run_until(session, until);
    }

    /// Deliver every timer due up to `until`, then set the clock to `until`.
    pub fn run_until(&mut self, session: &mut BeaconSession, until: Duration) {
        while let Some(timer) = self.pop_due(until) {
            session.on_timer(self, timer);
        }
        self.elapsed = self.elapsed.max(until);
    }

    fn pop_due(&mut self, until: Duration) -> Option<TimerId> {
        let (&id, &timer) = self
            .timers
            .iter()
            .min_by_key(|(id, timer)| (timer.due, **id))?;
        if timer.due > until {
            return None;
        }

        self.elapsed = self.elapsed.max(timer.due);
        match timer.period {
            Some(period) => {
                if let Some(entry) = self.timers.get_mut(&id) {
                    entry.due = timer.due + period;
                }
            },
            None => {
                self.timers.remove(&id);
            },
        }
        Some(id)
    }

    fn start_timer(&mut self, delay: Duration, period: Option<Duration>) -> TimerId {
        let timer = TimerId(self.next_timer);
        self.next_timer += 1;
        self.timers.insert(
            timer,
            SimTimer {
                due: self.elapsed + delay,
                period,
            },
        );
        self.record(SimEvent::TimerStarted { timer, period });
        timer
    }
}

impl Host for SimHost {
    fn now(&self) -> Instant {
        self.origin + self.elapsed
    }

    fn cursor(&self) -> Result<CursorPosition, HostError> {
        if self.cursor_unavailable {
            return Err(HostError::NoActiveWindow);
        }
        Ok(self.current_cursor())
    }

    fn filetype(&self) -> Option<String> {
        self.active_buffer().filetype.clone()
    }

    fn line_len(&self, line: u32) -> Result<u32, HostError> {
        self.active_buffer()
            .line_lens
            .get(line as usize)
            .copied()
            .ok_or(HostError::LineOutOfRange { line })
    }

    fn open_overlay(&mut self, spec: &OverlaySpec) -> Result<OverlayId, HostError> {
        if self.refuse_overlays {
            return Err(HostError::OverlayRejected {
                reason: "window is closing".to_string(),
            });
        }

        let overlay = OverlayId(self.next_overlay);
        self.next_overlay += 1;
        self.overlays.insert(
            overlay,
            SimOverlay {
                spec: spec.clone(),
                open: true,
                history: vec![spec.transparency],
            },
        );
        self.record(SimEvent::OverlayOpened {
            overlay,
            spec: spec.clone(),
        });
        Ok(overlay)
    }

    fn overlay_is_valid(&self, overlay: OverlayId) -> bool {
        self.overlays.get(&overlay).is_some_and(|entry| entry.open)
    }

    fn set_overlay_transparency(
        &mut self,
        overlay: OverlayId,
        transparency: u8,
    ) -> Result<(), HostError> {
        match self.overlays.get_mut(&overlay) {
            Some(entry) if entry.open => {
                entry.history.push(transparency);
                self.record(SimEvent::TransparencySet {
                    overlay,
                    transparency,
                });
                Ok(())
            },
            _ => Err(HostError::InvalidOverlay(overlay)),
        }
    }

    fn close_overlay(&mut self, overlay: OverlayId) {
        *self.close_calls.entry(overlay).or_default() += 1;
        if let Some(entry) = self.overlays.get_mut(&overlay) {
            if entry.open {
                entry.open = false;
                self.record(SimEvent::OverlayClosed { overlay });
            }
        }
    }

    fn start_interval(&mut self, initial_delay: Duration, period: Duration) -> TimerId {
        self.start_timer(initial_delay, Some(period))
    }

    fn start_timeout(&mut self, delay: Duration) -> TimerId {
        self.start_timer(delay, None)
    }

    fn stop_timer(&mut self, timer: TimerId) {
        if self.timers.remove(&timer).is_some() {
            self.record(SimEvent::TimerStopped { timer });
        }
    }

    fn navigate(&mut self, direction: JumpDirection) -> Result<(), HostError> {
        let (buffer, to) = match direction {
            JumpDirection::Backward => {
                if self.jump_index == 0 {
                    return Err(HostError::Navigation {
                        reason: "at start of jump list".to_string(),
                    });
                }
                if self.jump_index == self.jumplist.len() {
                    self.jumplist.push((self.active, self.current_cursor()));
                }
                self.jump_index -= 1;
                self.jumplist[self.jump_index]
            },
            JumpDirection::Forward => {
                if self.jump_index + 1 >= self.jumplist.len() {
                    return Err(HostError::Navigation {
                        reason: "at end of jump list".to_string(),
                    });
                }
                self.jump_index += 1;
                self.jumplist[self.jump_index]
            },
        };

        self.active = buffer;
        self.buffers[buffer].cursor = to;
        self.record(SimEvent::Navigated { direction, to });
        Ok(())
    }
}
