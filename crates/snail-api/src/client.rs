// Streaming API HTTP client
//
// Wraps `reqwest::Client` with route-layout-aware URL construction,
// status mapping, and schema validation. Every endpoint returns a
// validated model or an `Error`; turning failures into empty UI states
// is the caller's business.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{AccountInfo, PushSubscription, StreamEntry};
use crate::transport::TransportConfig;

/// Which generation of the server route table to talk to.
///
/// Older deployments expose `/api/stream/...` with a `preview` resource,
/// newer ones `/api/streams/...` with a `snapshot` resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteLayout {
    #[default]
    Stream,
    Streams,
}

impl RouteLayout {
    fn collection(self) -> &'static str {
        match self {
            Self::Stream => "stream",
            Self::Streams => "streams",
        }
    }

    fn preview_resource(self) -> &'static str {
        match self {
            Self::Stream => "preview",
            Self::Streams => "snapshot",
        }
    }
}

/// HTTP client for the streaming service API.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    layout: RouteLayout,
    transport: TransportConfig,
}

impl ApiClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// A cookie jar is added when the config has none, so the login
    /// redirect chain can establish a session.
    pub fn new(base_url: Url, layout: RouteLayout, transport: &TransportConfig) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let http = config.build_client()?;
        Ok(Self {
            http,
            base_url,
            layout,
            transport: config,
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, layout: RouteLayout) -> Self {
        Self {
            http,
            base_url,
            layout,
            transport: TransportConfig::default(),
        }
    }

    /// The server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn layout(&self) -> RouteLayout {
        self.layout
    }

    /// The transport settings this client was built from (shared with the media transport).
    pub fn transport(&self) -> &TransportConfig {
        &self.transport
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/api/{segments...}`, percent-encoding each segment.
    ///
    /// A trailing empty segment yields a trailing slash.
    pub(crate) fn api_url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::Validation {
                entity: "server URL",
                reason: format!("{} cannot be used as a base", self.base_url),
            })?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    /// URL of the raw video resource a listing thumbnail is decoded from.
    pub fn preview_url(&self, name: &str) -> Result<Url, Error> {
        self.api_url(&[self.layout.collection(), name, self.layout.preview_resource()])
    }

    /// WebSocket URL delivering the live media of `name`.
    pub fn transport_url(&self, name: &str) -> Result<Url, Error> {
        let mut url = self.api_url(&["stream", name])?;
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme).map_err(|()| Error::Validation {
            entity: "server URL",
            reason: format!("cannot derive a WebSocket URL from {}", self.base_url),
        })?;
        Ok(url)
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET /api/stream/` -- every known stream, live or not.
    pub async fn list_streams(&self) -> Result<Vec<StreamEntry>, Error> {
        let url = self.api_url(&[self.layout.collection(), ""])?;
        let streams: Vec<StreamEntry> = self.get_json(url).await?;
        for stream in &streams {
            stream.validate()?;
        }
        Ok(streams)
    }

    /// `GET /api/account/` -- `None` when the session is not logged in.
    pub async fn account(&self) -> Result<Option<AccountInfo>, Error> {
        let url = self.api_url(&["account", ""])?;
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            debug!(status = %resp.status(), "account unavailable");
            return Ok(None);
        }
        let account: AccountInfo = parse_body(resp).await?;
        account.validate()?;
        Ok(Some(account))
    }

    /// `POST /api/account/key` -- issue a new stream key, invalidating the old one.
    pub async fn regenerate_stream_key(&self) -> Result<bool, Error> {
        let url = self.api_url(&["account", "key"])?;
        debug!("POST {}", url);
        let resp = self.http.post(url).send().await?;
        Ok(resp.status().is_success())
    }

    /// `GET /api/account/login` -- follow the login redirect chain.
    pub async fn login(&self) -> Result<(), Error> {
        let url = self.api_url(&["account", "login"])?;
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(Error::Unauthenticated {
                message: format!("login returned HTTP {status}"),
            });
        }
        trace!(final_url = %resp.url(), "login redirect chain finished");
        Ok(())
    }

    /// `GET /api/notification/key` -- the server's VAPID public key, decoded.
    pub async fn notification_key(&self) -> Result<Vec<u8>, Error> {
        let url = self.api_url(&["notification", "key"])?;
        debug!("GET {}", url);
        let resp = check_status(self.http.get(url).send().await?).await?;
        let text = resp.text().await?;
        let encoded = text.trim();
        STANDARD
            .decode(encoded)
            .map_err(|e| Error::Deserialization {
                message: format!("notification key is not base64: {e}"),
                body: encoded.to_owned(),
            })
    }

    /// `POST /api/notification/` -- register a push subscription.
    pub async fn register_notification(&self, subscription: &PushSubscription) -> Result<(), Error> {
        subscription.validate()?;
        let url = self.api_url(&["notification", ""])?;
        debug!("POST {}", url);
        check_status(self.http.post(url).json(subscription).send().await?).await?;
        Ok(())
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let resp = check_status(self.http.get(url).send().await?).await?;
        parse_body(resp).await
    }
}

/// Map non-success statuses to errors, passing successful responses through.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(Error::Unauthenticated {
            message: "session expired or missing".into(),
        });
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        let preview: String = body.chars().take(200).collect();
        return Err(Error::Api {
            status: status.as_u16(),
            message: preview,
        });
    }
    Ok(resp)
}

async fn parse_body<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.clone(),
        }
    })
}
