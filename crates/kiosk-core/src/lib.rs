//! Core domain types for the RFID product kiosk.
//!
//! This crate holds the pieces every other kiosk crate agrees on: the
//! product data model, the Spanish date formatter used on screen, a
//! pluggable clock and the shared constants.

pub mod clock;
pub mod constants;
pub mod date;
pub mod error;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use date::format_date;
pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
