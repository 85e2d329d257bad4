use crate::error::{Error, Result};
use crate::fetch::client::HttpClient;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderName, HeaderValue};

/// An [`HttpClient`] wrapper that injects an API key as an HTTP header.
///
/// The header is set on every request, replacing any value the request
/// already carried under the same name. The value is marked sensitive so it
/// stays out of `Debug` output.
pub struct ApiKey<C> {
    inner: C,
    header_name: HeaderName,
    key: HeaderValue,
}

impl<C> ApiKey<C> {
    /// Sends `key` under `header_name` (e.g. `"X-Api-Key"`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] if either part is not a legal header.
    pub fn new(inner: C, header_name: &str, key: &str) -> Result<Self> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes())
            .map_err(|e| Error::InvalidHeader(format!("{header_name}: {e}")))?;
        let mut key = HeaderValue::from_str(key)
            .map_err(|e| Error::InvalidHeader(format!("{header_name} value: {e}")))?;
        key.set_sensitive(true);
        Ok(Self {
            inner,
            header_name,
            key,
        })
    }

    /// Convenience constructor that uses `Authorization: Bearer <key>`, the
    /// most common pattern for OAuth-style tokens.
    pub fn bearer(inner: C, key: &str) -> Result<Self> {
        Self::new(inner, AUTHORIZATION.as_str(), &format!("Bearer {key}"))
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(self.header_name.clone(), self.key.clone());
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::BasicClient;

    #[test]
    fn test_bearer_formats_authorization() {
        let auth = ApiKey::bearer(BasicClient::new(), "t0ken").unwrap();
        assert_eq!(auth.header_name, AUTHORIZATION);
        assert_eq!(auth.key.to_str().unwrap(), "Bearer t0ken");
        assert!(auth.key.is_sensitive());
    }

    #[test]
    fn test_custom_header_keeps_inner_client() {
        let inner = BasicClient::new();
        let auth = ApiKey::new(inner, "X-Api-Key", "k-1").unwrap();
        assert_eq!(auth.header_name.as_str(), "x-api-key");
        assert_eq!(auth.key.to_str().unwrap(), "k-1");

        // Layers stack: the inner client is still reachable
        let outer = ApiKey::bearer(auth, "t").unwrap();
        assert_eq!(outer.inner().header_name.as_str(), "x-api-key");
    }

    #[test]
    fn test_rejects_bad_header_name() {
        let err = ApiKey::new(BasicClient::new(), "bad header", "k").err().unwrap();
        assert!(matches!(err, Error::InvalidHeader(_)));
    }

    #[test]
    fn test_rejects_bad_header_value() {
        let err = ApiKey::new(BasicClient::new(), "X-Api-Key", "line\nbreak").err().unwrap();
        assert!(matches!(err, Error::InvalidHeader(_)));
    }
}
