//! A single live hub connection.
//!
//! [`HubConnection`] covers one WebSocket session: negotiate (optional),
//! upgrade, handshake, then reading and writing hub records. It does not
//! retry; [`HubClient`](crate::HubClient) decides when to open a new one.

use std::time::Duration;

use bytes::BytesMut;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, info, trace, warn};
use url::Url;

use kiosk_protocol::{HandshakeRequest, HandshakeResponse, HubCodec, HubMessage};

use crate::negotiate::{self, Negotiated};
use crate::{HubClientConfig, HubClientError, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// An established hub session.
pub struct HubConnection {
    stream: WsStream,
    codec: HubCodec,
    /// Inbound bytes not yet split into records.
    buffer: BytesMut,
    url: Url,
}

impl HubConnection {
    /// Negotiate (unless skipped), connect and complete the handshake.
    ///
    /// The whole sequence is bounded by `config.connect_timeout`.
    pub async fn connect(config: &HubClientConfig, http: &reqwest::Client) -> Result<Self> {
        let timeout = config.connect_timeout;
        match tokio::time::timeout(timeout, Self::open(config, http)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Hub connection timeout after {}ms", timeout.as_millis());
                Err(HubClientError::ConnectionTimeout(timeout.as_millis() as u64))
            }
        }
    }

    async fn open(config: &HubClientConfig, http: &reqwest::Client) -> Result<Self> {
        let endpoint = if config.skip_negotiation {
            Negotiated {
                url: config.url.clone(),
                token: None,
                access_token: None,
            }
        } else {
            negotiate::negotiate(http, &config.url).await?
        };

        let ws_url = negotiate::websocket_url(&endpoint.url, endpoint.token.as_deref())?;
        info!(url = %endpoint.url, "connecting to hub");

        let mut request = ws_url.as_str().into_client_request()?;
        if let Some(token) = &endpoint.access_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| HubClientError::invalid_url(e.to_string()))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        let (stream, _) = connect_async(request).await?;
        let mut connection = Self {
            stream,
            codec: HubCodec::new(),
            buffer: BytesMut::new(),
            url: endpoint.url,
        };
        connection.handshake().await?;

        info!(url = %connection.url, "hub connection established");
        Ok(connection)
    }

    async fn handshake(&mut self) -> Result<()> {
        let request = HandshakeRequest::json().to_record()?;
        self.send_record(request).await?;

        loop {
            if let Some(record) = self.codec.decode(&mut self.buffer)? {
                HandshakeResponse::parse(&record)?;
                debug!("handshake accepted");
                return Ok(());
            }
            if !self.read_frame().await? {
                return Err(HubClientError::connection_lost(
                    "connection closed during handshake",
                ));
            }
        }
    }

    /// Next hub message, or `None` once the server has closed the socket.
    ///
    /// Records that fail to parse are logged and skipped. Cancel safe: no
    /// data is lost if the future is dropped while waiting for a frame.
    pub async fn next_message(&mut self) -> Result<Option<HubMessage>> {
        loop {
            match self.codec.decode(&mut self.buffer) {
                Ok(Some(record)) => match HubMessage::parse(&record) {
                    Ok(message) => return Ok(Some(message)),
                    Err(error) => {
                        warn!(%error, "skipping unreadable hub record");
                        continue;
                    }
                },
                Ok(None) => {}
                Err(error) => {
                    warn!(%error, "discarding malformed hub data");
                    continue;
                }
            }

            if !self.read_frame().await? {
                return Ok(None);
            }
        }
    }

    /// Send a hub message.
    pub async fn send(&mut self, message: &HubMessage) -> Result<()> {
        let record = message.to_record()?;
        self.send_record(record).await
    }

    /// Close the WebSocket, waiting at most 500ms.
    pub async fn close(&mut self) -> Result<()> {
        let close_timeout = Duration::from_millis(500);
        match tokio::time::timeout(close_timeout, self.stream.close(None)).await {
            Ok(Ok(())) => {
                debug!("hub connection closed");
                Ok(())
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(HubClientError::ConnectionTimeout(
                close_timeout.as_millis() as u64,
            )),
        }
    }

    /// Hub URL this connection was established against (after redirects).
    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn send_record(&mut self, record: String) -> Result<()> {
        let mut frame = BytesMut::new();
        self.codec.encode(record, &mut frame)?;
        let text = String::from_utf8(frame.to_vec())
            .map_err(|_| kiosk_protocol::ProtocolError::InvalidUtf8)?;
        trace!(bytes = text.len(), "sending hub record");
        self.stream.send(Message::text(text)).await?;
        Ok(())
    }

    /// Read one frame into the buffer. Returns `false` when the stream ended.
    async fn read_frame(&mut self) -> Result<bool> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    self.buffer.extend_from_slice(text.as_bytes());
                    return Ok(true);
                }
                Some(Ok(Message::Binary(data))) => {
                    self.buffer.extend_from_slice(&data);
                    return Ok(true);
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "server sent close frame");
                    return Ok(false);
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(false),
            }
        }
    }
}

impl std::fmt::Debug for HubConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubConnection")
            .field("url", &self.url.as_str())
            .field("buffered", &self.buffer.len())
            .finish()
    }
}
