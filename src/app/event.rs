//! Terminal input abstraction.
//!
//! A background task blocks on crossterm and forwards input over a channel;
//! frame and settle timing come from tokio intervals in the main loop, so
//! this reader never has to invent ticks.

use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind, MouseEvent};
use tokio::sync::mpsc;

/// Input consumed by the application.
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
}

/// Map a raw crossterm event.  Key releases/repeats from terminals with the
/// kitty protocol are dropped so one press moves one cell.
fn translate(ev: CtEvent) -> Option<AppEvent> {
    match ev {
        CtEvent::Key(k) if k.kind == KeyEventKind::Press => Some(AppEvent::Key(k)),
        CtEvent::Mouse(m) => Some(AppEvent::Mouse(m)),
        CtEvent::Resize(w, h) => Some(AppEvent::Resize(w, h)),
        _ => None,
    }
}

/// Spawn the reader.  `poll_every` bounds how long a `poll` blocks so the
/// task notices a dropped receiver.
pub fn spawn_event_reader(poll_every: Duration) -> mpsc::UnboundedReceiver<AppEvent> {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::task::spawn_blocking(move || loop {
        if tx.is_closed() {
            break;
        }
        match event::poll(poll_every) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(err) => {
                tracing::warn!("terminal poll failed: {err}");
                break;
            }
        }
        let Ok(ev) = event::read() else {
            continue;
        };
        if let Some(app_event) = translate(ev) {
            if tx.send(app_event).is_err() {
                break;
            }
        }
    });

    rx
}
