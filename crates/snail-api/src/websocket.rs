//! WebSocket media transport.
//!
//! Opens the server's live-stream WebSocket and forwards every binary frame
//! into a bounded [`tokio::sync::mpsc`] channel owned by the player. Text
//! frames are control chatter and are skipped. Reconnection is not handled
//! here: the connection controller in `snail-core` decides when to reopen.
//!
//! # Example
//!
//! ```rust,ignore
//! use snail_api::websocket::WsTransport;
//! use snail_api::media::{MediaTransport, TransportLink};
//! use snail_api::transport::TransportConfig;
//!
//! let (tx, mut rx) = tokio::sync::mpsc::channel(64);
//! let transport = WsTransport::new(tx, &TransportConfig::default())?;
//! let mut link = transport.open(&"wss://snail.video/api/stream/foo".parse()?).await?;
//! tokio::spawn(async move { while let Some(chunk) = rx.recv().await { /* feed player */ } });
//! println!("{}", link.closed().await);
//! ```

use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::error::Error;
use crate::media::{CloseReason, MediaTransport, TransportLink};
use crate::transport::TransportConfig;

// ── WsTransport ──────────────────────────────────────────────────────

/// [`MediaTransport`] over the server's live WebSocket endpoint.
pub struct WsTransport {
    sink: mpsc::Sender<Bytes>,
    cookie: Option<String>,
    connect_timeout: Duration,
    connector: Option<Connector>,
}

impl WsTransport {
    /// Media chunks of every link opened by this transport go to `sink`.
    ///
    /// Fails when the configured CA certificate cannot be loaded.
    pub fn new(sink: mpsc::Sender<Bytes>, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            sink,
            cookie: transport.cookie_header().map(String::from),
            connect_timeout: transport.timeout,
            connector: transport.ws_connector()?,
        })
    }
}

impl MediaTransport for WsTransport {
    type Link = WsLink;

    async fn open(&self, url: &Url) -> Result<WsLink, Error> {
        tracing::info!(url = %url, "Connecting to stream WebSocket");

        let uri: tungstenite::http::Uri = url
            .as_str()
            .parse()
            .map_err(|e: tungstenite::http::uri::InvalidUri| Error::WebSocketConnect(e.to_string()))?;

        let mut request = ClientRequestBuilder::new(uri);
        if let Some(ref cookie_val) = self.cookie {
            request = request.with_header("Cookie", cookie_val.as_str());
        }

        let connect = tokio_tungstenite::connect_async_tls_with_config(
            request,
            None,
            false,
            self.connector.clone(),
        );
        let (ws, _response) = tokio::time::timeout(self.connect_timeout, connect)
            .await
            .map_err(|_| Error::Timeout {
                timeout_secs: self.connect_timeout.as_secs(),
            })?
            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

        tracing::info!("Stream WebSocket connected");

        Ok(WsLink {
            ws,
            sink: self.sink.clone(),
        })
    }
}

// ── WsLink ───────────────────────────────────────────────────────────

/// One open stream WebSocket. Dropping it closes the socket.
pub struct WsLink {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    sink: mpsc::Sender<Bytes>,
}

impl TransportLink for WsLink {
    async fn closed(&mut self) -> CloseReason {
        while let Some(frame) = self.ws.next().await {
            match frame {
                Ok(tungstenite::Message::Binary(data)) => {
                    if self.sink.send(data).await.is_err() {
                        return CloseReason::Error("media sink closed".into());
                    }
                }
                Ok(tungstenite::Message::Text(text)) => {
                    tracing::trace!(len = text.len(), "skipping text frame");
                }
                Ok(tungstenite::Message::Close(frame)) => return close_reason(frame),
                Ok(_) => {
                    // Ping/Pong/Frame -- tungstenite answers pings itself
                }
                Err(e) => return CloseReason::Error(e.to_string()),
            }
        }
        tracing::info!("Stream WebSocket ended");
        CloseReason::Ended
    }
}

fn close_reason(frame: Option<CloseFrame>) -> CloseReason {
    match frame {
        Some(cf) => {
            tracing::info!(code = %cf.code, reason = %cf.reason.as_str(), "WebSocket close frame received");
            CloseReason::Remote {
                code: Some(u16::from(cf.code)),
                reason: cf.reason.as_str().to_owned(),
            }
        }
        None => {
            tracing::info!("WebSocket close frame received (no payload)");
            CloseReason::Remote {
                code: None,
                reason: String::new(),
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

    use super::*;

    #[test]
    fn close_frame_maps_code_and_reason() {
        let reason = close_reason(Some(CloseFrame {
            code: CloseCode::Away,
            reason: "stream stopped".into(),
        }));
        assert_eq!(
            reason,
            CloseReason::Remote {
                code: Some(1001),
                reason: "stream stopped".into()
            }
        );
    }

    #[test]
    fn close_without_payload() {
        assert_eq!(
            close_reason(None),
            CloseReason::Remote {
                code: None,
                reason: String::new()
            }
        );
    }

    #[tokio::test]
    async fn refused_connection_is_an_open_error() {
        let (tx, _rx) = mpsc::channel(1);
        let transport = WsTransport::new(
            tx,
            &TransportConfig {
                timeout: Duration::from_secs(2),
                ..TransportConfig::default()
            },
        )
        .unwrap();
        // Port 9 (discard) is essentially never listening on a test host.
        let url = Url::parse("ws://127.0.0.1:9/api/stream/foo").unwrap();
        let result = transport.open(&url).await;
        assert!(matches!(
            result,
            Err(Error::WebSocketConnect(_) | Error::Timeout { .. })
        ));
    }

    #[test]
    fn cookie_comes_from_transport_config() {
        let (tx, _rx) = mpsc::channel(1);
        let config = TransportConfig::default()
            .with_session_cookie(secrecy::SecretString::from("session=xyz"));
        let transport = WsTransport::new(tx, &config).unwrap();
        assert_eq!(transport.cookie.as_deref(), Some("session=xyz"));
    }

    #[test]
    fn insecure_mode_installs_a_connector() {
        let (tx, _rx) = mpsc::channel(1);
        let config = TransportConfig {
            tls: crate::transport::TlsMode::DangerAcceptInvalid,
            ..TransportConfig::default()
        };
        let transport = WsTransport::new(tx, &config).unwrap();
        assert!(transport.connector.is_some());
        assert!(WsTransport::new(mpsc::channel(1).0, &TransportConfig::default()).unwrap().connector.is_none());
    }
}
