// ── Per-view session ──
//
// One `Session` is built for each view (CLI invocation) and passed around
// explicitly. It owns the API client and a cached account, turns API
// failures into empty states for listing surfaces, and hands out
// controllers wired to the session's pacing config.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{Mutex, broadcast, mpsc};
use tracing::{debug, info, warn};
use url::Url;

use snail_api::models::sort_newest_first;
use snail_api::{
    AccountInfo, ApiClient, MediaTransport, PushSubscription, StreamEntry, TlsMode, TransportConfig,
    WsTransport,
};

use crate::autoplay::MediaHandle;
use crate::config::{SessionConfig, TlsVerification};
use crate::controller::{ConnectionEvent, StreamConnectionController, StreamTarget};
use crate::error::CoreError;
use crate::snapshot::{FrameSnapshotExtractor, FrameSource, Snapshot};

pub struct Session {
    config: SessionConfig,
    api: ApiClient,
    account: Mutex<Option<Arc<AccountInfo>>>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Result<Self, CoreError> {
        let transport = transport_config(&config);
        let api = ApiClient::new(config.url.clone(), config.layout, &transport)?;
        Ok(Self {
            config,
            api,
            account: Mutex::new(None),
        })
    }

    /// Build a session around an existing client (tests, custom transports).
    pub fn with_client(config: SessionConfig, api: ApiClient) -> Self {
        Self {
            config,
            api,
            account: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    // ── Listing ──────────────────────────────────────────────────

    /// All known streams, most recently started first. Empty on failure.
    pub async fn streams(&self) -> Vec<StreamEntry> {
        match self.api.list_streams().await {
            Ok(mut streams) => {
                sort_newest_first(&mut streams);
                streams
            }
            Err(e) => {
                warn!(error = %e, "stream listing unavailable");
                Vec::new()
            }
        }
    }

    /// Look a stream up by name.
    pub async fn stream(&self, name: &str) -> Result<StreamEntry, CoreError> {
        self.streams()
            .await
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| CoreError::StreamNotFound { name: name.to_owned() })
    }

    pub fn preview_url(&self, name: &str) -> Result<Url, CoreError> {
        Ok(self.api.preview_url(name)?)
    }

    /// Thumbnail of `name` scaled into the session's snapshot bounds.
    pub async fn snapshot<S: FrameSource>(&self, extractor: &FrameSnapshotExtractor<S>, name: &str) -> Snapshot {
        match self.api.preview_url(name) {
            Ok(url) => extractor.decode_within(&url, self.config.snapshot).await,
            Err(e) => {
                warn!(stream = name, error = %e, "no preview URL");
                Snapshot::Empty
            }
        }
    }

    // ── Account ──────────────────────────────────────────────────

    /// The logged-in account, fetched once and cached. `None` when not logged in.
    pub async fn account(&self) -> Option<Arc<AccountInfo>> {
        let mut cached = self.account.lock().await;
        if let Some(account) = cached.as_ref() {
            return Some(Arc::clone(account));
        }
        match self.api.account().await {
            Ok(Some(account)) => {
                let account = Arc::new(account);
                *cached = Some(Arc::clone(&account));
                Some(account)
            }
            Ok(None) => {
                debug!("not logged in");
                None
            }
            Err(e) => {
                warn!(error = %e, "account unavailable");
                None
            }
        }
    }

    /// Issue a new stream key. The cached account is dropped on success.
    pub async fn regenerate_stream_key(&self) -> bool {
        match self.api.regenerate_stream_key().await {
            Ok(true) => {
                info!("stream key regenerated");
                self.account.lock().await.take();
                true
            }
            Ok(false) => {
                warn!("stream key regeneration refused");
                false
            }
            Err(e) => {
                warn!(error = %e, "stream key regeneration failed");
                false
            }
        }
    }

    pub async fn login(&self) -> Result<(), CoreError> {
        self.api.login().await?;
        self.account.lock().await.take();
        Ok(())
    }

    // ── Notifications ────────────────────────────────────────────

    /// The server's push public key, raw bytes.
    pub async fn notification_key(&self) -> Result<Vec<u8>, CoreError> {
        Ok(self.api.notification_key().await?)
    }

    pub async fn subscribe_notifications(&self, subscription: &PushSubscription) -> Result<(), CoreError> {
        self.api.register_notification(subscription).await?;
        info!(endpoint = %subscription.endpoint, "push subscription registered");
        Ok(())
    }

    // ── Live viewing ─────────────────────────────────────────────

    /// The attach target for `name`, on this session's server.
    pub fn stream_target(&self, name: &str) -> Result<StreamTarget, CoreError> {
        let url = self.api.transport_url(name)?;
        Ok(StreamTarget::from_url(name, url))
    }

    /// A WebSocket transport forwarding media chunks to `sink`.
    pub fn media_transport(&self, sink: mpsc::Sender<Bytes>) -> Result<WsTransport, CoreError> {
        Ok(WsTransport::new(sink, self.api.transport())?)
    }

    /// A controller paced by this session's connection config.
    pub fn controller<T: MediaTransport, M: MediaHandle>(
        &self,
        transport: T,
        media: M,
    ) -> StreamConnectionController<T, M> {
        StreamConnectionController::new(transport, media, self.config.connection)
    }

    /// Create a controller, subscribe to its events, and attach it to `name`.
    ///
    /// The receiver is subscribed before attaching, so it sees the first
    /// `ConnectStart`.
    pub fn watch<T: MediaTransport, M: MediaHandle>(
        &self,
        name: &str,
        transport: T,
        media: M,
    ) -> Result<(StreamConnectionController<T, M>, broadcast::Receiver<ConnectionEvent>), CoreError> {
        let target = self.stream_target(name)?;
        let controller = self.controller(transport, media);
        let events = controller.subscribe();
        controller.attach(target);
        Ok((controller, events))
    }
}

fn transport_config(config: &SessionConfig) -> TransportConfig {
    let tls = match &config.tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    };
    let transport = TransportConfig {
        tls,
        timeout: config.timeout,
        ..TransportConfig::default()
    };
    match &config.session_cookie {
        Some(cookie) => transport.with_session_cookie(cookie.clone()),
        None => transport,
    }
}
