//! Negotiate step and endpoint URL construction.

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::{HubClientError, Result};

const MAX_REDIRECTS: usize = 100;
const WEBSOCKETS_TRANSPORT: &str = "WebSockets";

/// Body returned by the negotiate endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiateResponse {
    #[serde(default)]
    pub connection_id: Option<String>,
    #[serde(default)]
    pub connection_token: Option<String>,
    #[serde(default)]
    pub negotiate_version: Option<u32>,
    /// Redirect target; when set, negotiate again against this URL.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub available_transports: Vec<AvailableTransport>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableTransport {
    pub transport: String,
    #[serde(default)]
    pub transfer_formats: Vec<String>,
}

impl NegotiateResponse {
    /// Token to present on the WebSocket URL.
    ///
    /// Version 1 servers return `connectionToken`; older ones only the id.
    pub fn token(&self) -> Option<&str> {
        self.connection_token
            .as_deref()
            .or(self.connection_id.as_deref())
    }

    fn supports_websockets(&self) -> bool {
        self.available_transports.is_empty()
            || self
                .available_transports
                .iter()
                .any(|t| t.transport.eq_ignore_ascii_case(WEBSOCKETS_TRANSPORT))
    }
}

/// Result of a successful negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Negotiated {
    pub url: Url,
    pub token: Option<String>,
    pub access_token: Option<String>,
}

/// `{hub}/negotiate?negotiateVersion=1`, keeping any existing query.
pub fn negotiate_url(hub: &Url) -> Url {
    let mut url = hub.clone();
    let path = format!("{}/negotiate", hub.path().trim_end_matches('/'));
    url.set_path(&path);
    url.query_pairs_mut().append_pair("negotiateVersion", "1");
    url
}

/// WebSocket endpoint for a hub URL, with the connection token if any.
pub fn websocket_url(hub: &Url, token: Option<&str>) -> Result<Url> {
    let mut url = hub.clone();
    let scheme = match hub.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(HubClientError::invalid_url(format!("unsupported scheme {other}"))),
    };
    url.set_scheme(scheme)
        .map_err(|_| HubClientError::invalid_url(hub.as_str()))?;
    if let Some(token) = token {
        url.query_pairs_mut().append_pair("id", token);
    }
    Ok(url)
}

/// Run negotiate against `hub`, following redirects.
pub(crate) async fn negotiate(http: &reqwest::Client, hub: &Url) -> Result<Negotiated> {
    let mut target = hub.clone();
    let mut access_token: Option<String> = None;

    for _ in 0..MAX_REDIRECTS {
        let endpoint = negotiate_url(&target);
        debug!(%endpoint, "negotiating");

        let mut request = http.post(endpoint);
        if let Some(token) = &access_token {
            request = request.bearer_auth(token);
        }
        let response: NegotiateResponse = request
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(HubClientError::NegotiateRejected(error));
        }

        if let Some(redirect) = &response.url {
            target = Url::parse(redirect).map_err(|e| HubClientError::invalid_url(e.to_string()))?;
            access_token = response.access_token.clone();
            debug!(%target, "negotiate redirected");
            continue;
        }

        if !response.supports_websockets() {
            return Err(HubClientError::NoWebSocketTransport);
        }

        let token = response.token().map(str::to_string);
        if token.is_none() {
            return Err(HubClientError::NegotiateRejected(
                "response carries no connection token".to_string(),
            ));
        }

        return Ok(Negotiated {
            url: target,
            token,
            access_token,
        });
    }

    Err(HubClientError::TooManyRedirects(MAX_REDIRECTS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://172.16.10.31:81/readerHub", "http://172.16.10.31:81/readerHub/negotiate?negotiateVersion=1")]
    #[case("http://host/readerHub/", "http://host/readerHub/negotiate?negotiateVersion=1")]
    #[case("https://host/hub?tenant=a", "https://host/hub/negotiate?tenant=a&negotiateVersion=1")]
    fn test_negotiate_url(#[case] hub: &str, #[case] expected: &str) {
        let url = negotiate_url(&Url::parse(hub).unwrap());
        assert_eq!(url.as_str(), expected);
    }

    #[rstest]
    #[case("http://host:81/readerHub", None, "ws://host:81/readerHub")]
    #[case("https://host/readerHub", Some("abc"), "wss://host/readerHub?id=abc")]
    #[case("ws://host/readerHub", Some("a b"), "ws://host/readerHub?id=a+b")]
    fn test_websocket_url(#[case] hub: &str, #[case] token: Option<&str>, #[case] expected: &str) {
        let url = websocket_url(&Url::parse(hub).unwrap(), token).unwrap();
        assert_eq!(url.as_str(), expected);
    }

    #[test]
    fn test_websocket_url_rejects_other_schemes() {
        let result = websocket_url(&Url::parse("ftp://host/hub").unwrap(), None);
        assert!(matches!(result, Err(HubClientError::InvalidUrl(_))));
    }

    #[test]
    fn test_parse_negotiate_v1() {
        let body = r#"{
            "connectionId": "id-1",
            "connectionToken": "token-1",
            "negotiateVersion": 1,
            "availableTransports": [
                { "transport": "WebSockets", "transferFormats": ["Text", "Binary"] },
                { "transport": "LongPolling", "transferFormats": ["Text"] }
            ]
        }"#;
        let response: NegotiateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.token(), Some("token-1"));
        assert!(response.supports_websockets());
    }

    #[test]
    fn test_parse_negotiate_v0_uses_connection_id() {
        let response: NegotiateResponse =
            serde_json::from_str(r#"{"connectionId":"id-0","availableTransports":[]}"#).unwrap();
        assert_eq!(response.token(), Some("id-0"));
    }

    #[test]
    fn test_long_polling_only_is_unsupported() {
        let response: NegotiateResponse = serde_json::from_str(
            r#"{"connectionToken":"t","availableTransports":[{"transport":"LongPolling"}]}"#,
        )
        .unwrap();
        assert!(!response.supports_websockets());
    }
}
