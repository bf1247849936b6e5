//! Real-time hub client for the RFID kiosk.
//!
//! The reader service pushes product detections through a hub endpoint
//! speaking the JSON hub protocol over WebSockets. This crate owns that
//! connection:
//!
//! - **negotiate**: `POST {url}/negotiate?negotiateVersion=1` for a
//!   connection token (skippable)
//! - **connect**: WebSocket upgrade and protocol handshake
//! - **run**: keep-alive pings, server timeout detection, forwarding of
//!   subscribed invocations, automatic reconnection after a lost connection
//!
//! Everything observable is reported as a [`HubEvent`] on an mpsc channel.
//!
//! # Example
//!
//! ```no_run
//! use kiosk_network::{HubClient, HubClientConfig, HubEvent};
//! use tokio::sync::mpsc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HubClientConfig::new("http://172.16.10.31:81/readerHub".parse()?);
//! let client = HubClient::new(config).on("NewPallet").on("NewAssociation");
//!
//! let (tx, mut rx) = mpsc::channel(64);
//! let shutdown = CancellationToken::new();
//! tokio::spawn(client.run(tx, shutdown.clone()));
//!
//! while let Some(event) = rx.recv().await {
//!     if let HubEvent::Invocation { target, arguments } = event {
//!         println!("{target}: {arguments:?}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod connection;
mod error;
mod negotiate;

pub use client::{HubClient, HubClientConfig, HubEvent};
pub use connection::HubConnection;
pub use error::{HubClientError, Result};
pub use negotiate::{NegotiateResponse, negotiate_url, websocket_url};
