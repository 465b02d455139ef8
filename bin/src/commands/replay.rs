use crate::script::{Script, Step};
use anyhow::Result;
use beacon::{
    session::JUMP_SETTLE_DELAY,
    sim::{SimEvent, SimHost},
    BeaconConfig, BeaconSession, CursorPosition, MouseEvent,
};
use std::io::Write;
use tracing::{debug, info};

/// Replay `script` against a simulated editor and write the editor-side trace to `out`.
pub fn run(config: BeaconConfig, script: &Script, out: &mut impl Write) -> Result<()> {
    let mut buffers = script.sim_buffers().into_iter();
    let Some(first) = buffers.next() else {
        return Ok(());
    };
    let mut host = SimHost::new(first);
    for buffer in buffers {
        host.add_buffer(buffer);
    }

    let mut session = BeaconSession::new(config, &host);
    info!(steps = script.steps.len(), "Replaying script");

    for step in &script.steps {
        debug!(?step, at_ms = host.elapsed().as_millis() as u64, "Step");
        apply(&mut host, &mut session, step);
    }

    // Let every beacon still on screen run to its end.
    let drain = session.config().timeout() + session.config().interval() + JUMP_SETTLE_DELAY;
    host.run_for(&mut session, drain);
    session.shutdown(&mut host);

    let mut shown = 0;
    for logged in host.log() {
        if matches!(logged.event, SimEvent::OverlayOpened { .. }) {
            shown += 1;
        }
        writeln!(out, "{:>6}ms  {}", logged.at.as_millis(), logged.event)?;
    }
    writeln!(out, "{shown} beacon(s) shown")?;
    Ok(())
}

fn apply(host: &mut SimHost, session: &mut BeaconSession, step: &Step) {
    match step {
        Step::Move { line, column } => {
            host.set_cursor(CursorPosition::new(*line, *column));
            session.cursor_moved(host);
        },
        Step::JumpTo { line, column } => {
            host.jump_to(CursorPosition::new(*line, *column));
            session.cursor_moved(host);
        },
        Step::Click {
            button,
            line,
            column,
        } => {
            let mut event = MouseEvent::new((*button).into());
            if let Some(line) = line {
                event = event.at(CursorPosition::new(*line, *column));
            }
            host.click(&event);
            let event = session.mouse_button(&*host, event);
            if let Some(position) = event.position {
                host.set_cursor(position);
                session.cursor_moved(host);
            }
        },
        Step::Enter { buffer } => {
            if let Some(index) = host.buffer_index(buffer) {
                host.enter_buffer(index);
                session.buffer_entered(host);
            }
        },
        Step::Jump { direction } => {
            let before = host.active_buffer().name.clone();
            if session.jump(host, (*direction).into()) {
                // The editor reports the navigation like any other cursor change.
                if host.active_buffer().name != before {
                    session.buffer_entered(host);
                }
                session.cursor_moved(host);
            }
        },
        Step::Show => {
            session.show_at_cursor(host);
        },
        Step::Toggle => {
            session.toggle();
        },
        Step::Wait { ms } => {
            host.run_for(session, std::time::Duration::from_millis(*ms));
        },
        Step::CloseOverlays => {
            for overlay in host.open_overlays() {
                host.destroy_overlay(overlay);
            }
        },
    }
}
