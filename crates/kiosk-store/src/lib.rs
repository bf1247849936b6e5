//! In-memory product state for the RFID kiosk.
//!
//! [`ProductRepository`] is the single source of truth for received product
//! events. It is an explicit value owned by whoever drives the kiosk (the
//! kiosk actor in the binary) and handed by reference to the code that needs
//! it. Observers follow changes through [`ProductRepository::subscribe`].
//!
//! [`reconcile`] applies the rules that turn an inbound hub message into
//! repository mutations, exactly once per logical product.
//!
//! # Example
//!
//! ```
//! use kiosk_core::SystemClock;
//! use kiosk_protocol::InboundMessage;
//! use kiosk_store::{ProductRepository, Reconciliation, reconcile};
//!
//! let mut repo = ProductRepository::new();
//! let pallet = InboundMessage::from_value(serde_json::json!({
//!     "success": true,
//!     "product": { "id": "P-1", "epc": "E1" }
//! }));
//!
//! let outcome = reconcile(&mut repo, &pallet, &SystemClock);
//! assert!(matches!(outcome, Reconciliation::Added { .. }));
//! assert_eq!(repo.len(), 1);
//! assert_eq!(repo.current().unwrap().product.id, "P-1");
//! ```

mod reconcile;
mod repository;

pub use reconcile::{Reconciliation, reconcile};
pub use repository::ProductRepository;
