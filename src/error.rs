//! Error type shared by the builder, the transports and the decoders.

use std::sync::Arc;
use std::time::Duration;

/// Everything that can go wrong while building, sending or decoding a request.
///
/// The builder keeps the first configuration or execution failure and hands
/// out clones of it on every later call, so sources that are not `Clone`
/// are held behind an [`Arc`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("invalid url: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("failed to serialize request body: {0}")]
    Serialization(#[source] Arc<serde_json::Error>),

    #[error("no request configured")]
    NoRequest,

    #[error("request failed: {0}")]
    Transport(#[source] Arc<reqwest::Error>),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("request cancelled")]
    Cancelled,

    #[error("failed to read response body: {0}")]
    Read(#[source] Arc<reqwest::Error>),

    #[error("failed to decode response body: {0}")]
    Decode(#[source] Arc<serde_json::Error>),
}

impl Error {
    pub(crate) fn transport(err: reqwest::Error) -> Self {
        Error::Transport(Arc::new(err))
    }

    pub(crate) fn read(err: reqwest::Error) -> Self {
        Error::Read(Arc::new(err))
    }

    pub(crate) fn serialization(err: serde_json::Error) -> Self {
        Error::Serialization(Arc::new(err))
    }

    pub(crate) fn decode(err: serde_json::Error) -> Self {
        Error::Decode(Arc::new(err))
    }

    /// Returns `true` if the send gave up because a deadline elapsed, whether
    /// the builder's own timer or the transport's.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout(_) => true,
            Error::Transport(e) | Error::Read(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Returns `true` for errors raised while configuring the request, before
    /// any I/O was attempted.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Error::UrlParse(_)
                | Error::InvalidHeader(_)
                | Error::Serialization(_)
                | Error::NoRequest
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
