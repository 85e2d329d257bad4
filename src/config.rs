//! Client and per-request options.
//!
//! [`ClientOptions`] describes how the transport is built (or which injected
//! transport to use). [`RequestOptions`] carries knobs that apply to a single
//! request only: a deadline override and a cancellation token.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::fetch::HttpClient;

/// Timeout applied to a send when nothing else is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub struct ClientOptions {
    /// Upper bound on a single send, from dispatch to response headers.
    pub timeout: Duration,
    pub connect_timeout: Option<Duration>,
    pub user_agent: Option<String>,
    transport: Option<Arc<dyn HttpClient>>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: None,
            user_agent: None,
            transport: None,
        }
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("user_agent", &self.user_agent)
            .field("custom_transport", &self.transport.is_some())
            .finish()
    }
}

impl ClientOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Sends requests through `client` instead of a reqwest client built from
    /// these options. `timeout` still bounds every send.
    pub fn with_transport<C: HttpClient + 'static>(self, client: C) -> Self {
        self.with_shared_transport(Arc::new(client))
    }

    pub fn with_shared_transport(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.transport = Some(client);
        self
    }

    /// Drops any injected transport so the default one is built again.
    pub fn clear_transport(&mut self) {
        self.transport = None;
    }

    pub fn transport(&self) -> Option<&Arc<dyn HttpClient>> {
        self.transport.as_ref()
    }
}

/// Options scoped to one request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Overrides [`ClientOptions::timeout`] for this request.
    pub timeout: Option<Duration>,
    /// Aborts the send with [`Error::Cancelled`](crate::Error::Cancelled)
    /// when triggered.
    pub cancel: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn effective_timeout(&self, client: &ClientOptions) -> Duration {
        self.timeout.unwrap_or(client.timeout)
    }
}
