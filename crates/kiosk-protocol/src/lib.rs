//! Wire formats for the RFID kiosk.
//!
//! Two layers live here:
//!
//! - The **product message** pushed by the reader service on the
//!   `NewAssociation` and `NewPallet` channels ([`InboundMessage`]). Every
//!   field is optional on the wire; [`fallback`] declares, in one table, what
//!   each missing field becomes when a [`ProductEvent`](kiosk_core::ProductEvent)
//!   is built.
//! - The **hub framing** carrying those messages: JSON records terminated by
//!   `0x1E` ([`HubCodec`]), the handshake, and the hub message kinds the
//!   kiosk understands ([`HubMessage`]).
//!
//! # Example
//!
//! ```
//! use kiosk_protocol::InboundMessage;
//! use kiosk_core::SystemClock;
//!
//! let json = serde_json::json!({
//!     "success": true,
//!     "product": { "id": "P-1", "epc": "E200-01", "name": "Tarima 1" }
//! });
//! let message = InboundMessage::from_value(json);
//! assert_eq!(message.tag_key(), "E200-01");
//!
//! let event = message.to_event(&SystemClock);
//! assert_eq!(event.product.net_weight, "N/A");
//! ```

pub mod codec;
pub mod error;
pub mod fallback;
pub mod hub;
pub mod message;

pub use codec::HubCodec;
pub use error::{ProtocolError, Result};
pub use fallback::{Fallback, ProductField};
pub use hub::{HandshakeRequest, HandshakeResponse, HubMessage, RECORD_SEPARATOR};
pub use message::{InboundMessage, WireOperatorInfo, WireProduct};
