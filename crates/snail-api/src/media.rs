//! The live media transport seam.
//!
//! The wire protocol that carries a live stream is opaque here: a transport
//! can be opened (success or failure), and an open link eventually closes.
//! Dropping a link tears it down.

use std::fmt;
use std::future::Future;

use url::Url;

use crate::error::Error;

/// Opens media links to a transport URL.
pub trait MediaTransport: Send + Sync + 'static {
    type Link: TransportLink;

    /// Resolve once the link is established (`Ok`) or refused (`Err`).
    fn open(&self, url: &Url) -> impl Future<Output = Result<Self::Link, Error>> + Send;
}

/// An established media link.
pub trait TransportLink: Send + 'static {
    /// Resolve when the link stops delivering media.
    fn closed(&mut self) -> impl Future<Output = CloseReason> + Send;
}

/// Why an established link stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The remote end sent a close frame.
    Remote { code: Option<u16>, reason: String },
    /// The stream ended without a close frame.
    Ended,
    /// A read error tore the link down.
    Error(String),
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote { code: Some(code), reason } => write!(f, "closed by server ({code}): {reason}"),
            Self::Remote { code: None, .. } => f.write_str("closed by server"),
            Self::Ended => f.write_str("stream ended"),
            Self::Error(e) => write!(f, "transport error: {e}"),
        }
    }
}
