//! Display layer of the RFID kiosk.
//!
//! - [`DisplayStateMachine`]: Waiting/Showing with the inactivity timeout
//! - [`ProductView`]: display strings for the current product
//! - [`Screen`]: fixed-width text renderer for both screens
//! - [`Notifier`]: notification sound gated by the user's preference
//!
//! Nothing here owns a timer or a task; the kiosk runtime drives every
//! type with explicit instants and events.

pub mod error;
pub mod screen;
pub mod sound;
pub mod state_machine;
pub mod view;

pub use error::{Result, SoundError};
pub use screen::{
    Alignment, DEFAULT_WIDTH, MIN_WIDTH, Screen, ScreenContent, ScreenModel, align_text,
    header_badge, truncate_text, waiting_badge,
};
#[cfg(feature = "audio")]
pub use sound::WavPlayer;
pub use sound::{BellPlayer, Notifier, SoundPlayer, SoundPreference};
pub use state_machine::{DisplayState, DisplayStateMachine, DisplayTransition, TransitionReason};
pub use view::ProductView;
