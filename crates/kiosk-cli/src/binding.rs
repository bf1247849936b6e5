//! Binding between the hub connection and the kiosk actor.
//!
//! [`ConnectionBinding::activate`] opens one hub connection subscribed to the
//! product channels and forwards what it reports as [`Command`]s.
//! [`ConnectionBinding::deactivate`] closes it again.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use kiosk_core::constants::SUBSCRIBED_CHANNELS;
use kiosk_network::{HubClient, HubClientConfig, HubEvent};
use kiosk_protocol::InboundMessage;

use crate::runtime::Command;

const EVENT_BUFFER: usize = 64;

/// A live hub connection feeding the kiosk.
#[derive(Debug)]
pub struct ConnectionBinding {
    shutdown: CancellationToken,
    client: JoinHandle<()>,
    forwarder: JoinHandle<()>,
}

impl ConnectionBinding {
    /// Open the connection and start forwarding to `commands`.
    pub fn activate(config: HubClientConfig, commands: mpsc::Sender<Command>) -> Self {
        let client = SUBSCRIBED_CHANNELS
            .iter()
            .fold(HubClient::new(config), |client, channel| client.on(channel));

        let shutdown = CancellationToken::new();
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);

        let client = tokio::spawn(client.run(events_tx, shutdown.clone()));
        let forwarder = tokio::spawn(forward(events_rx, commands));

        Self {
            shutdown,
            client,
            forwarder,
        }
    }

    /// Close the connection. Failures are logged, never returned.
    pub async fn deactivate(self) {
        self.shutdown.cancel();
        if let Err(e) = self.client.await {
            warn!("Hub client task ended abnormally: {}", e);
        }
        if let Err(e) = self.forwarder.await {
            warn!("Hub forwarder task ended abnormally: {}", e);
        }
    }
}

async fn forward(mut events: mpsc::Receiver<HubEvent>, commands: mpsc::Sender<Command>) {
    while let Some(event) = events.recv().await {
        let Some(command) = translate(event) else {
            continue;
        };
        if commands.send(command).await.is_err() {
            debug!("kiosk stopped, dropping hub events");
            break;
        }
    }
}

/// Turn a hub event into a kiosk command.
///
/// The first invocation argument is the product message; an invocation
/// without arguments carries nothing to reconcile.
pub fn translate(event: HubEvent) -> Option<Command> {
    match event {
        HubEvent::Status(status) => Some(Command::Connection(status)),
        HubEvent::Invocation { target, arguments } => {
            let Some(payload) = arguments.into_iter().next() else {
                debug!(%target, "invocation without payload ignored");
                return None;
            };
            debug!(%target, payload = %payload, "message received");
            Some(Command::Message {
                message: InboundMessage::from_value(payload),
                channel: target,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiosk_core::ConnectionStatus;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_status_becomes_connection_command() {
        let command = translate(HubEvent::Status(ConnectionStatus::Reconnecting));
        assert!(matches!(
            command,
            Some(Command::Connection(ConnectionStatus::Reconnecting))
        ));
    }

    #[test]
    fn test_first_argument_is_the_message() {
        let command = translate(HubEvent::Invocation {
            target: "NewPallet".into(),
            arguments: vec![
                json!({ "success": true, "product": { "epc": "E1" } }),
                json!("ignored"),
            ],
        });

        let Some(Command::Message { channel, message }) = command else {
            panic!("expected a message command");
        };
        assert_eq!(channel, "NewPallet");
        assert!(message.success);
        assert_eq!(message.tag_key(), "E1");
    }

    #[test]
    fn test_invocation_without_arguments_is_dropped() {
        let command = translate(HubEvent::Invocation {
            target: "NewPallet".into(),
            arguments: Vec::new(),
        });
        assert!(command.is_none());
    }

    #[test]
    fn test_non_object_payload_is_unsuccessful() {
        let command = translate(HubEvent::Invocation {
            target: "NewAssociation".into(),
            arguments: vec![json!("E1")],
        });
        let Some(Command::Message { message, .. }) = command else {
            panic!("expected a message command");
        };
        assert!(!message.success);
    }

    #[tokio::test]
    async fn test_failed_connect_reports_disconnected() {
        let mut config = HubClientConfig::new("ws://127.0.0.1:9/readerHub".parse().unwrap());
        config.skip_negotiation = true;
        config.connect_timeout = Duration::from_secs(2);

        let (tx, mut rx) = mpsc::channel(8);
        let binding = ConnectionBinding::activate(config, tx);

        let mut statuses = Vec::new();
        while let Ok(Some(command)) = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
            if let Command::Connection(status) = command {
                statuses.push(status);
                if status == ConnectionStatus::Disconnected {
                    break;
                }
            }
        }
        binding.deactivate().await;

        assert_eq!(
            statuses,
            vec![ConnectionStatus::Connecting, ConnectionStatus::Disconnected]
        );
    }
}
