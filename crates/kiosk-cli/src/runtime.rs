//! The kiosk actor.
//!
//! One task owns the repository, the display state machine, the notifier and
//! the connection status. Hub messages, timer ticks and keyboard commands all
//! arrive as [`Command`]s on a single channel, so every mutation is
//! serialized without locks.

use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Datelike;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use kiosk_core::{Clock, ConnectionStatus, ProductEvent};
use kiosk_display::{
    DisplayStateMachine, Notifier, ProductView, Screen, ScreenContent, ScreenModel,
};
use kiosk_protocol::InboundMessage;
use kiosk_store::{ProductRepository, reconcile};

/// Clears the terminal and homes the cursor.
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Input to the kiosk actor.
#[derive(Debug, Clone)]
pub enum Command {
    /// A product message arrived on a subscribed hub channel.
    Message {
        channel: String,
        message: InboundMessage,
    },
    Connection(ConnectionStatus),
    Tick,
    ToggleSound,
    Quit,
}

/// Whether the actor keeps running after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue { redraw: bool },
    Quit,
}

/// Kiosk state and the rules applied to each command.
pub struct Kiosk {
    repository: ProductRepository,
    display: DisplayStateMachine,
    notifier: Notifier,
    status: ConnectionStatus,
    screen: Screen,
    clock: Arc<dyn Clock>,
    /// Repository revisions not yet looked at.
    changes: watch::Receiver<u64>,
    /// Current product as of the last seen revision, compared by identity.
    shown: Option<Arc<ProductEvent>>,
}

impl Kiosk {
    pub fn new(
        repository: ProductRepository,
        inactivity_timeout: Duration,
        notifier: Notifier,
        screen: Screen,
        clock: Arc<dyn Clock>,
        now: Instant,
    ) -> Self {
        let mut changes = repository.subscribe();
        changes.mark_unchanged();
        let shown = repository.current().cloned();
        let display = DisplayStateMachine::mounted(inactivity_timeout, shown.is_some(), now);
        Self {
            repository,
            display,
            notifier,
            status: ConnectionStatus::Connecting,
            screen,
            clock,
            changes,
            shown,
        }
    }

    pub fn repository(&self) -> &ProductRepository {
        &self.repository
    }

    pub fn display(&self) -> &DisplayStateMachine {
        &self.display
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn sound_enabled(&self) -> bool {
        self.notifier.is_enabled()
    }

    /// Apply one command at `now`.
    pub fn handle(&mut self, command: Command, now: Instant) -> Flow {
        match command {
            Command::Message { channel, message } => {
                let outcome = reconcile(&mut self.repository, &message, self.clock.as_ref());
                debug!(%channel, ?outcome, "message reconciled");
                Flow::Continue {
                    redraw: self.sync_current(now),
                }
            }
            Command::Connection(status) => {
                let changed = self.status != status;
                if changed {
                    match status {
                        ConnectionStatus::Disconnected => warn!("hub connection is down"),
                        _ => info!(%status, "hub connection status"),
                    }
                }
                self.status = status;
                Flow::Continue { redraw: changed }
            }
            Command::Tick => {
                self.display.tick(now);
                // The waiting screen counts seconds, so every tick repaints.
                Flow::Continue { redraw: true }
            }
            Command::ToggleSound => {
                let enabled = self.notifier.toggle();
                info!(enabled, "sound preference changed");
                Flow::Continue { redraw: true }
            }
            Command::Quit => Flow::Quit,
        }
    }

    /// React to a change of the repository's current reference.
    fn sync_current(&mut self, now: Instant) -> bool {
        // The repository owns the sender, so the channel never closes.
        if !self.changes.has_changed().unwrap_or(true) {
            return false;
        }
        self.changes.mark_unchanged();

        let current = self.repository.current().cloned();
        let unchanged = match (&self.shown, &current) {
            (Some(shown), Some(current)) => Arc::ptr_eq(shown, current),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return false;
        }

        if current.is_some() {
            self.notifier.notify();
        }
        self.display.on_current_changed(current.is_some(), now);
        self.shown = current;
        true
    }

    /// Render the full screen for `now`.
    pub fn frame(&self, now: Instant) -> String {
        let view = self
            .shown
            .as_deref()
            .filter(|_| self.display.is_showing())
            .map(ProductView::from_event);
        let content = match &view {
            Some(view) => ScreenContent::Showing(view),
            None => ScreenContent::Waiting {
                seconds_since_last: self.display.seconds_since_activity(now),
            },
        };
        self.screen.render(&ScreenModel {
            status: self.status,
            sound_enabled: self.notifier.is_enabled(),
            content,
            year: self.clock.now().year(),
        })
    }
}

impl std::fmt::Debug for Kiosk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kiosk")
            .field("products", &self.repository().len())
            .field("state", &self.display().state())
            .field("status", &self.status())
            .field("sound_enabled", &self.sound_enabled())
            .finish_non_exhaustive()
    }
}

/// Drive `kiosk` until `Quit` or until every command sender is gone.
///
/// Ticks every `check_interval` and repaints `out` whenever the screen may
/// have changed. Returns the writer for inspection.
pub async fn run<W: Write>(
    mut kiosk: Kiosk,
    mut commands: mpsc::Receiver<Command>,
    check_interval: Duration,
    mut out: W,
) -> W {
    let mut ticker = tokio::time::interval(check_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    draw(&kiosk, &mut out, now());

    loop {
        let command = tokio::select! {
            command = commands.recv() => match command {
                Some(command) => command,
                None => break,
            },
            _ = ticker.tick() => Command::Tick,
        };

        let at = now();
        match kiosk.handle(command, at) {
            Flow::Continue { redraw: true } => draw(&kiosk, &mut out, at),
            Flow::Continue { redraw: false } => {}
            Flow::Quit => break,
        }
    }

    debug!(?kiosk, "kiosk stopped");
    out
}

fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

fn draw<W: Write>(kiosk: &Kiosk, out: &mut W, now: Instant) {
    if let Err(e) = write_frame(out, &kiosk.frame(now)) {
        debug!("Could not draw screen: {}", e);
    }
}

fn write_frame<W: Write>(out: &mut W, frame: &str) -> std::io::Result<()> {
    out.write_all(CLEAR_SCREEN.as_bytes())?;
    out.write_all(frame.as_bytes())?;
    out.flush()
}
