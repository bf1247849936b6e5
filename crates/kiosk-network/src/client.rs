//! Long-running hub client with keep-alive and automatic reconnection.
//!
//! ```text
//!            connect ok                  lost / timeout
//! Connecting ──────────> Connected ─────────────────────> Reconnecting
//!     │                    ▲   │                              │   │
//!     │ connect failed     │   │ Close(allowReconnect=false)  │   │ delays
//!     ▼                    │   ▼                              │   │ exhausted
//! Disconnected <───────────┼── Disconnected                   │   ▼
//!                          └──────────────────────────────────┘ Disconnected
//! ```
//!
//! A failed initial connection is final; only a connection that was once
//! established is retried.

use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};
use url::Url;

use kiosk_core::ConnectionStatus;
use kiosk_protocol::HubMessage;

use crate::HubConnection;

/// Interval between client pings.
pub const DEFAULT_KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Silence after which the server is considered gone.
pub const DEFAULT_SERVER_TIMEOUT: Duration = Duration::from_secs(30);

/// Bound on negotiate, upgrade and handshake together.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Waits before each reconnection attempt.
pub const DEFAULT_RECONNECT_DELAYS: [Duration; 4] = [
    Duration::ZERO,
    Duration::from_secs(2),
    Duration::from_secs(10),
    Duration::from_secs(30),
];

/// Configuration for [`HubClient`].
#[derive(Debug, Clone)]
pub struct HubClientConfig {
    /// Hub endpoint (`http`, `https`, `ws` or `wss`).
    pub url: Url,

    /// Connect straight over WebSockets without the negotiate request.
    pub skip_negotiation: bool,

    pub connect_timeout: Duration,

    pub keep_alive_interval: Duration,

    pub server_timeout: Duration,

    /// One reconnection attempt per entry, in order.
    pub reconnect_delays: Vec<Duration>,
}

impl HubClientConfig {
    /// Configuration with default timings for the given hub URL.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            skip_negotiation: false,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            keep_alive_interval: DEFAULT_KEEP_ALIVE_INTERVAL,
            server_timeout: DEFAULT_SERVER_TIMEOUT,
            reconnect_delays: DEFAULT_RECONNECT_DELAYS.to_vec(),
        }
    }
}

/// What the client reports to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum HubEvent {
    /// Connection status changed.
    Status(ConnectionStatus),

    /// The server invoked a subscribed target.
    Invocation { target: String, arguments: Vec<Value> },
}

/// Why a connection stopped pumping messages.
#[derive(Debug)]
enum PumpEnd {
    Shutdown,
    ReceiverGone,
    /// Server closed and asked us not to come back.
    Closed,
    Lost(String),
}

/// Hub client for a fixed set of subscribed targets.
///
/// Build with [`HubClient::new`], subscribe with [`HubClient::on`] and
/// drive with [`HubClient::run`], typically on its own task.
#[derive(Debug)]
pub struct HubClient {
    config: HubClientConfig,
    /// Lowercased target names; matching is case-insensitive.
    subscriptions: Vec<String>,
    http: reqwest::Client,
}

impl HubClient {
    pub fn new(config: HubClientConfig) -> Self {
        Self {
            config,
            subscriptions: Vec::new(),
            http: reqwest::Client::new(),
        }
    }

    /// Subscribe to invocations of `target`.
    #[must_use]
    pub fn on(mut self, target: impl AsRef<str>) -> Self {
        let target = target.as_ref().to_lowercase();
        if !self.subscriptions.contains(&target) {
            self.subscriptions.push(target);
        }
        self
    }

    /// Returns `true` if invocations of `target` are forwarded.
    pub fn is_subscribed(&self, target: &str) -> bool {
        let target = target.to_lowercase();
        self.subscriptions.iter().any(|s| *s == target)
    }

    pub fn config(&self) -> &HubClientConfig {
        &self.config
    }

    /// Connect and forward events until shutdown or a final disconnect.
    ///
    /// The last event sent is always `Status(Disconnected)` unless the
    /// receiver was dropped first.
    pub async fn run(self, events: mpsc::Sender<HubEvent>, shutdown: CancellationToken) {
        if !emit(&events, ConnectionStatus::Connecting).await {
            return;
        }

        let connected = tokio::select! {
            _ = shutdown.cancelled() => None,
            result = HubConnection::connect(&self.config, &self.http) => match result {
                Ok(connection) => Some(connection),
                Err(e) => {
                    error!(url = %self.config.url, "Error connecting to hub: {}", e);
                    None
                }
            },
        };
        let Some(mut connection) = connected else {
            emit(&events, ConnectionStatus::Disconnected).await;
            return;
        };
        if !emit(&events, ConnectionStatus::Connected).await {
            close_quietly(&mut connection).await;
            return;
        }

        loop {
            match self.pump(&mut connection, &events, &shutdown).await {
                PumpEnd::Shutdown => {
                    close_quietly(&mut connection).await;
                    info!("hub client stopped");
                    emit(&events, ConnectionStatus::Disconnected).await;
                    return;
                }
                PumpEnd::ReceiverGone => {
                    close_quietly(&mut connection).await;
                    return;
                }
                PumpEnd::Closed => {
                    info!("hub closed the connection without reconnect");
                    emit(&events, ConnectionStatus::Disconnected).await;
                    return;
                }
                PumpEnd::Lost(reason) => {
                    warn!(%reason, "hub connection lost");
                }
            }

            if !emit(&events, ConnectionStatus::Reconnecting).await {
                return;
            }
            match self.reconnect(&shutdown).await {
                Some(next) => {
                    connection = next;
                    if !emit(&events, ConnectionStatus::Connected).await {
                        close_quietly(&mut connection).await;
                        return;
                    }
                }
                None => {
                    emit(&events, ConnectionStatus::Disconnected).await;
                    return;
                }
            }
        }
    }

    async fn pump(
        &self,
        connection: &mut HubConnection,
        events: &mpsc::Sender<HubEvent>,
        shutdown: &CancellationToken,
    ) -> PumpEnd {
        let keep_alive = self.config.keep_alive_interval;
        let mut ping = tokio::time::interval_at(Instant::now() + keep_alive, keep_alive);
        ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut deadline = Instant::now() + self.config.server_timeout;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return PumpEnd::Shutdown,

                _ = ping.tick() => {
                    trace!("sending keep-alive ping");
                    if let Err(e) = connection.send(&HubMessage::Ping).await {
                        return PumpEnd::Lost(e.to_string());
                    }
                }

                _ = tokio::time::sleep_until(deadline) => {
                    return PumpEnd::Lost(format!(
                        "no message from server within {}ms",
                        self.config.server_timeout.as_millis()
                    ));
                }

                message = connection.next_message() => {
                    let message = match message {
                        Ok(Some(message)) => message,
                        Ok(None) => return PumpEnd::Lost("server closed the socket".to_string()),
                        Err(e) => return PumpEnd::Lost(e.to_string()),
                    };
                    deadline = Instant::now() + self.config.server_timeout;

                    match message {
                        HubMessage::Invocation { target, arguments, .. } => {
                            if !self.is_subscribed(&target) {
                                trace!(%target, "no handler for target");
                                continue;
                            }
                            debug!(%target, "invocation received");
                            let event = HubEvent::Invocation { target, arguments };
                            if events.send(event).await.is_err() {
                                return PumpEnd::ReceiverGone;
                            }
                        }
                        HubMessage::Ping => trace!("ping from server"),
                        HubMessage::Close { error, allow_reconnect } => {
                            if let Some(error) = error {
                                warn!(%error, "server closed the connection with an error");
                            }
                            if !allow_reconnect {
                                return PumpEnd::Closed;
                            }
                            return PumpEnd::Lost("server closed the connection".to_string());
                        }
                        HubMessage::Other(kind) => trace!(kind, "ignoring hub message"),
                    }
                }
            }
        }
    }

    /// Try each configured delay once. `None` when all attempts failed or
    /// shutdown was requested.
    async fn reconnect(&self, shutdown: &CancellationToken) -> Option<HubConnection> {
        for (attempt, delay) in self.config.reconnect_delays.iter().enumerate() {
            info!(attempt = attempt + 1, delay_ms = delay.as_millis() as u64, "reconnecting to hub");

            tokio::select! {
                _ = shutdown.cancelled() => return None,
                _ = tokio::time::sleep(*delay) => {}
            }

            tokio::select! {
                _ = shutdown.cancelled() => return None,
                result = HubConnection::connect(&self.config, &self.http) => match result {
                    Ok(connection) => {
                        info!(attempt = attempt + 1, "reconnected to hub");
                        return Some(connection);
                    }
                    Err(e) => warn!(attempt = attempt + 1, "reconnection failed: {}", e),
                },
            }
        }

        error!(
            attempts = self.config.reconnect_delays.len(),
            "giving up on hub reconnection"
        );
        None
    }
}

async fn emit(events: &mpsc::Sender<HubEvent>, status: ConnectionStatus) -> bool {
    debug!(%status, "hub connection status");
    events.send(HubEvent::Status(status)).await.is_ok()
}

async fn close_quietly(connection: &mut HubConnection) {
    if let Err(e) = connection.close().await {
        debug!("Error closing hub connection: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn client() -> HubClient {
        let url = Url::parse("http://127.0.0.1:81/readerHub").unwrap();
        HubClient::new(HubClientConfig::new(url))
            .on("NewAssociation")
            .on("NewPallet")
    }

    #[test]
    fn test_default_config() {
        let config = client().config;
        assert!(!config.skip_negotiation);
        assert_eq!(config.keep_alive_interval, Duration::from_secs(15));
        assert_eq!(config.server_timeout, Duration::from_secs(30));
        assert_eq!(
            config.reconnect_delays,
            vec![
                Duration::ZERO,
                Duration::from_secs(2),
                Duration::from_secs(10),
                Duration::from_secs(30)
            ]
        );
    }

    #[rstest]
    #[case("NewPallet", true)]
    #[case("newpallet", true)]
    #[case("NEWASSOCIATION", true)]
    #[case("SomethingElse", false)]
    #[case("", false)]
    fn test_subscription_matching(#[case] target: &str, #[case] expected: bool) {
        assert_eq!(client().is_subscribed(target), expected);
    }

    #[test]
    fn test_subscribing_twice_is_idempotent() {
        let client = client().on("newPALLET");
        assert_eq!(client.subscriptions.len(), 2);
    }

    #[tokio::test]
    async fn test_connect_failure_reports_disconnected_without_retry() {
        // Nothing listens on port 9 of the loopback interface.
        let url = Url::parse("ws://127.0.0.1:9/readerHub").unwrap();
        let mut config = HubClientConfig::new(url);
        config.skip_negotiation = true;
        let client = HubClient::new(config).on("NewPallet");

        let (tx, mut rx) = mpsc::channel(8);
        client.run(tx, CancellationToken::new()).await;

        assert_eq!(rx.recv().await, Some(HubEvent::Status(ConnectionStatus::Connecting)));
        assert_eq!(rx.recv().await, Some(HubEvent::Status(ConnectionStatus::Disconnected)));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_shutdown_before_connect() {
        let url = Url::parse("ws://10.255.255.1:81/readerHub").unwrap();
        let mut config = HubClientConfig::new(url);
        config.skip_negotiation = true;
        let client = HubClient::new(config);

        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let (tx, mut rx) = mpsc::channel(8);
        client.run(tx, shutdown).await;

        assert_eq!(rx.recv().await, Some(HubEvent::Status(ConnectionStatus::Connecting)));
        assert_eq!(rx.recv().await, Some(HubEvent::Status(ConnectionStatus::Disconnected)));
    }
}
