// snail-api: Async Rust client for the snail.video streaming API and live media transport

pub mod client;
pub mod error;
pub mod media;
pub mod models;
pub mod transport;
pub mod websocket;

pub use client::{ApiClient, RouteLayout};
pub use error::Error;
pub use media::{CloseReason, MediaTransport, TransportLink};
pub use models::{AccountInfo, PushPayload, PushSubscription, StreamEntry, SubscriptionKeys};
pub use transport::{TlsMode, TransportConfig};
pub use websocket::WsTransport;
