//! Shared constants for the RFID kiosk.
//!
//! Values here are the literals the kiosk shows when inbound data is missing,
//! the hub channel names it listens on and the timing of the display.
//!
//! # Usage
//!
//! ```
//! use kiosk_core::constants::*;
//! use std::time::Duration;
//!
//! assert_eq!(CHANNEL_NEW_PALLET, "NewPallet");
//! let timeout = Duration::from_millis(INACTIVITY_TIMEOUT_MS);
//! assert_eq!(timeout.as_secs(), 15);
//! ```

// ============================================================================
// Hub Channels
// ============================================================================

/// Channel carrying operator associations for already-detected products.
pub const CHANNEL_NEW_ASSOCIATION: &str = "NewAssociation";

/// Channel carrying first-time product detections.
pub const CHANNEL_NEW_PALLET: &str = "NewPallet";

/// Every channel the kiosk subscribes to, in subscription order.
pub const SUBSCRIBED_CHANNELS: [&str; 2] = [CHANNEL_NEW_ASSOCIATION, CHANNEL_NEW_PALLET];

/// Default hub endpoint of the reader service.
pub const DEFAULT_HUB_URL: &str = "http://172.16.10.31:81/readerHub";

// ============================================================================
// Fallback Literals
// ============================================================================

/// Shown when a product arrives without a name.
pub const UNNAMED_PRODUCT: &str = "Producto sin nombre";

/// Image reference used when a product arrives without one.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

/// Image reference used by the view when the stored reference is empty.
pub const PLACEHOLDER_IMAGE_SIZED: &str = "/placeholder.svg?height=300&width=300";

/// Literal for missing measurement and descriptive fields.
pub const NOT_AVAILABLE: &str = "N/A";

/// Operator placeholder for products without an associated operator.
pub const UNASSIGNED_OPERATOR: &str = "Indefinido";

/// Returned by [`format_date`](crate::format_date) for unparseable input.
pub const INVALID_DATE: &str = "FECHA INVÁLIDA";

/// Shift label shown next to the entry time. Not sourced from any event.
pub const SHIFT_LABEL: &str = "TURNO NEGRO";

// ============================================================================
// Display Timing
// ============================================================================

/// Inactivity threshold after which the display reverts to waiting (15 seconds).
pub const INACTIVITY_TIMEOUT_MS: u64 = 15_000;

/// Period of the recurring inactivity check (1 second).
pub const INACTIVITY_CHECK_INTERVAL_MS: u64 = 1_000;

// ============================================================================
// Sound
// ============================================================================

/// Notification volume (0.0 - 1.0).
pub const NOTIFICATION_VOLUME: f32 = 0.5;

/// Default location of the notification sound asset.
pub const DEFAULT_SOUND_FILE: &str = "assets/mixkit-bell-notification-933.wav";
