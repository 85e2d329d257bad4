//! Metadata of an executed request.

use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::{StatusCode, Url, Version};

/// Status line, headers and final URL of a response, captured when it
/// arrives. The body is read separately by the extraction methods.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub version: Version,
    pub headers: HeaderMap,
    /// URL after any redirects the transport followed.
    pub url: Url,
    pub content_length: Option<u64>,
}

impl ResponseHead {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE)?.to_str().ok()
    }
}

impl From<&reqwest::Response> for ResponseHead {
    fn from(resp: &reqwest::Response) -> Self {
        Self {
            status: resp.status(),
            version: resp.version(),
            headers: resp.headers().clone(),
            url: resp.url().clone(),
            content_length: resp.content_length(),
        }
    }
}
