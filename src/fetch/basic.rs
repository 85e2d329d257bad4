use super::client::HttpClient;
use crate::config::ClientOptions;
use crate::error::{Error, Result};
use async_trait::async_trait;

/// The default transport: a plain [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new() -> Self {
        Self(reqwest::Client::new())
    }

    /// Builds a client honouring the timeouts and user agent in `opts`.
    pub fn from_options(opts: &ClientOptions) -> Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(opts.timeout);
        if let Some(connect) = opts.connect_timeout {
            builder = builder.connect_timeout(connect);
        }
        if let Some(ua) = &opts.user_agent {
            builder = builder.user_agent(ua.as_str());
        }
        Ok(Self(builder.build().map_err(Error::transport)?))
    }
}

impl From<reqwest::Client> for BasicClient {
    fn from(client: reqwest::Client) -> Self {
        Self(client)
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.0.execute(req).await
    }
}
