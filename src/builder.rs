//! The chainable request builder.
//!
//! A [`RequestBuilder`] goes through `configure → send → extract`. Configuration
//! methods take the builder by value and hand it back, so a whole request
//! reads as one chain. The first failure is kept as a sticky error: every
//! later configuration call becomes a no-op and every extraction returns a
//! clone of it.
//!
//! ```no_run
//! # async fn demo() -> fluent_http::Result<()> {
//! use fluent_http::RequestBuilder;
//!
//! let body = RequestBuilder::new()
//!     .get_with_query("https://example.com/search", [("q", "rust")])
//!     .header("Accept", "application/json")
//!     .send()
//!     .await
//!     .json_map()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::config::{ClientOptions, RequestOptions};
use crate::error::{Error, Result};
use crate::fetch::{BasicClient, HttpClient};
use crate::params::{build_url, encode_params};
use crate::parser::{parse_json, parse_map};
use crate::response::ResponseHead;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug)]
struct Pending {
    method: Method,
    url: Url,
    body: Option<Bytes>,
    /// Set by the form and JSON helpers; replaces any caller `Content-Type`.
    content_type: Option<&'static str>,
}

#[derive(Debug, Default)]
enum Exchange {
    #[default]
    Idle,
    /// Response headers are in, body not yet read.
    Received(reqwest::Response),
    /// Body read once and kept for later extractions.
    Consumed(Bytes),
}

/// Accumulates one HTTP request, sends it at most once, and decodes the
/// response.
///
/// A builder is single-use: it holds one request and one response. Build a
/// new one for the next request.
#[derive(Debug, Default)]
pub struct RequestBuilder {
    pending: Option<Pending>,
    headers: HeaderMap,
    client: ClientOptions,
    request: RequestOptions,
    head: Option<ResponseHead>,
    exchange: Exchange,
    /// When the send started and how long the whole exchange may take.
    budget: Option<(Instant, Duration)>,
    executed: bool,
    err: Option<Error>,
}

impl RequestBuilder {
    /// A builder using [`ClientOptions::default`], i.e. a reqwest client
    /// with a [`DEFAULT_TIMEOUT`](crate::DEFAULT_TIMEOUT) deadline.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(client: ClientOptions) -> Self {
        Self {
            client,
            ..Self::default()
        }
    }

    /// GET `url` as is.
    pub fn get(self, url: &str) -> Self {
        self.get_with_query(url, std::iter::empty::<(&str, &str)>())
    }

    /// GET `url` with its query string replaced by `params`. An empty
    /// `params` keeps the URL's own query.
    pub fn get_with_query<I, K, V>(mut self, url: &str, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        if self.err.is_some() {
            return self;
        }
        self.set_target(Method::GET, build_url(url, params), None, None);
        self
    }

    /// POST `body` verbatim. No content type is set.
    pub fn post(mut self, url: &str, body: impl Into<Bytes>) -> Self {
        if self.err.is_some() {
            return self;
        }
        self.set_target(
            Method::POST,
            Url::parse(url).map_err(Error::from),
            Some(body.into()),
            None,
        );
        self
    }

    /// POST `fields` as an `application/x-www-form-urlencoded` body.
    pub fn post_form<I, K, V>(mut self, url: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        if self.err.is_some() {
            return self;
        }
        let body = Bytes::from(encode_params(fields));
        self.set_target(
            Method::POST,
            Url::parse(url).map_err(Error::from),
            Some(body),
            Some(FORM_CONTENT_TYPE),
        );
        self
    }

    /// POST `value` serialized as JSON.
    pub fn post_json<T: Serialize + ?Sized>(mut self, url: &str, value: &T) -> Self {
        if self.err.is_some() {
            return self;
        }
        let body = match serde_json::to_vec(value) {
            Ok(body) => Bytes::from(body),
            Err(e) => {
                self.err = Some(Error::serialization(e));
                return self;
            }
        };
        self.set_target(
            Method::POST,
            Url::parse(url).map_err(Error::from),
            Some(body),
            Some(JSON_CONTENT_TYPE),
        );
        self
    }

    /// Adds a header. Existing values under the same name are kept.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if self.err.is_some() {
            return self;
        }
        if let Err(e) = self.append_header(name.as_ref(), value.as_ref()) {
            self.err = Some(e);
        }
        self
    }

    /// Adds every pair in `headers`, stopping at the first invalid one.
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, value) in headers {
            if self.err.is_some() {
                break;
            }
            if let Err(e) = self.append_header(name.as_ref(), value.as_ref()) {
                self.err = Some(e);
            }
        }
        self
    }

    /// Adds every entry of an already-typed header map.
    pub fn header_map(mut self, headers: &HeaderMap) -> Self {
        if self.err.is_some() {
            return self;
        }
        for (name, value) in headers {
            self.headers.append(name.clone(), value.clone());
        }
        self
    }

    /// Edits the client options in place, e.g. to change the timeout or the
    /// user agent. Has no effect once the request has been sent.
    pub fn configure_client(mut self, f: impl FnOnce(&mut ClientOptions)) -> Self {
        if self.err.is_some() || self.executed {
            return self;
        }
        f(&mut self.client);
        self
    }

    /// Sends through `client` instead of the default reqwest transport.
    pub fn with_client<C: HttpClient + 'static>(self, client: C) -> Self {
        let client: Arc<dyn HttpClient> = Arc::new(client);
        self.configure_client(move |opts| {
            *opts = std::mem::take(opts).with_shared_transport(client);
        })
    }

    pub fn timeout(self, timeout: Duration) -> Self {
        self.configure_client(|opts| opts.timeout = timeout)
    }

    /// Edits the options of this request only.
    pub fn configure_request(mut self, f: impl FnOnce(&mut RequestOptions)) -> Self {
        if self.err.is_some() || self.executed {
            return self;
        }
        f(&mut self.request);
        self
    }

    /// Aborts the send with [`Error::Cancelled`] once `token` fires.
    pub fn cancel_on(self, token: CancellationToken) -> Self {
        self.configure_request(|opts| opts.cancel = Some(token))
    }

    /// Sends the request unless it was already sent or an error is pending.
    ///
    /// Calling `send` again after the first execution is a no-op; it never
    /// re-sends. Failures land in [`error`](Self::error) and are returned by
    /// the extraction methods.
    pub async fn send(mut self) -> Self {
        self.execute().await;
        self
    }

    /// The whole response body. The body is read on the first call and
    /// cached; later calls return the same bytes.
    ///
    /// # Errors
    ///
    /// The sticky error if one is pending, [`Error::Timeout`] if the body
    /// does not arrive within what is left of the timeout, otherwise
    /// [`Error::Read`] if the body could not be read.
    pub async fn bytes(&mut self) -> Result<Bytes> {
        self.execute().await;
        if let Some(e) = &self.err {
            return Err(e.clone());
        }
        if let Exchange::Consumed(body) = &self.exchange {
            return Ok(body.clone());
        }

        // Moving the response out means it is dropped, and its connection
        // released, whether or not the read succeeds.
        let Exchange::Received(resp) = std::mem::take(&mut self.exchange) else {
            return Err(Error::NoRequest);
        };
        let (started, timeout) = self.budget.unwrap_or((Instant::now(), Duration::MAX));
        let remaining = timeout.saturating_sub(started.elapsed());

        let err = match tokio::time::timeout(remaining, resp.bytes()).await {
            Ok(Ok(body)) => {
                debug!(bytes = body.len(), "Response body read");
                self.exchange = Exchange::Consumed(body.clone());
                return Ok(body);
            }
            Ok(Err(e)) if e.is_timeout() => {
                warn!(?timeout, "Transport reported timeout while reading body");
                Error::Timeout(timeout)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Failed to read response body");
                Error::read(e)
            }
            Err(_) => {
                warn!(?timeout, "Timed out reading response body");
                Error::Timeout(timeout)
            }
        };
        self.err = Some(err.clone());
        Err(err)
    }

    /// The body as text. Invalid UTF-8 sequences are replaced.
    pub async fn text(&mut self) -> Result<String> {
        let body = self.bytes().await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// The body parsed as a JSON object.
    ///
    /// # Errors
    ///
    /// [`Error::Decode`] if the body is not a JSON object. Decode failures
    /// are not recorded as the sticky error.
    pub async fn json_map(&mut self) -> Result<Map<String, Value>> {
        parse_map(&self.bytes().await?)
    }

    /// The body parsed as JSON into `T`.
    pub async fn json<T: DeserializeOwned>(&mut self) -> Result<T> {
        parse_json(&self.bytes().await?)
    }

    pub fn error(&self) -> Option<&Error> {
        self.err.as_ref()
    }

    /// Status, headers and final URL, once the request has been sent.
    pub fn response(&self) -> Option<&ResponseHead> {
        self.head.as_ref()
    }

    pub fn is_executed(&self) -> bool {
        self.executed
    }

    fn set_target(
        &mut self,
        method: Method,
        url: Result<Url>,
        body: Option<Bytes>,
        content_type: Option<&'static str>,
    ) {
        let url = match url {
            Ok(url) => url,
            Err(e) => {
                self.err = Some(e);
                return;
            }
        };
        self.pending = Some(Pending {
            method,
            url,
            body,
            content_type,
        });
    }

    fn append_header(&mut self, name: &str, value: &str) -> Result<()> {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::InvalidHeader(format!("{name}: {e}")))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| Error::InvalidHeader(format!("{name} value: {e}")))?;
        self.headers.append(header_name, header_value);
        Ok(())
    }

    async fn execute(&mut self) {
        if self.err.is_some() || self.executed {
            return;
        }
        let Some(pending) = self.pending.take() else {
            self.err = Some(Error::NoRequest);
            return;
        };
        self.executed = true;

        let transport: Arc<dyn HttpClient> = match self.client.transport() {
            Some(transport) => Arc::clone(transport),
            None => match BasicClient::from_options(&self.client) {
                Ok(client) => Arc::new(client),
                Err(e) => {
                    self.err = Some(e);
                    return;
                }
            },
        };
        let timeout = self.request.effective_timeout(&self.client);

        let mut req = reqwest::Request::new(pending.method, pending.url);
        *req.headers_mut() = self.headers.clone();
        if let Some(ct) = pending.content_type {
            req.headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(ct));
        }
        *req.timeout_mut() = Some(timeout);
        if let Some(body) = pending.body {
            *req.body_mut() = Some(body.into());
        }

        self.budget = Some((Instant::now(), timeout));
        match dispatch(transport, req, timeout, self.request.cancel.clone()).await {
            Ok(resp) => {
                self.head = Some(ResponseHead::from(&resp));
                self.exchange = Exchange::Received(resp);
            }
            Err(e) => self.err = Some(e),
        }
    }
}

/// Sends `req` through `transport`, bounded by `timeout` and `cancel`.
#[tracing::instrument(skip_all, fields(method = %req.method(), url = %req.url()))]
async fn dispatch(
    transport: Arc<dyn HttpClient>,
    req: reqwest::Request,
    timeout: Duration,
    cancel: Option<CancellationToken>,
) -> Result<reqwest::Response> {
    debug!(?timeout, "Sending request");
    let start = Instant::now();

    let send = tokio::time::timeout(timeout, transport.execute(req));
    let outcome = match cancel {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => None,
            r = send => Some(r),
        },
        None => Some(send.await),
    };

    let resp = match outcome {
        None => {
            warn!("Request cancelled");
            return Err(Error::Cancelled);
        }
        Some(Err(_)) => {
            warn!(?timeout, "Request timed out");
            return Err(Error::Timeout(timeout));
        }
        Some(Ok(Err(e))) if e.is_timeout() => {
            warn!(?timeout, "Transport reported timeout");
            return Err(Error::Timeout(timeout));
        }
        Some(Ok(Err(e))) => {
            warn!(error = %e, "Request failed");
            return Err(Error::transport(e));
        }
        Some(Ok(Ok(resp))) => resp,
    };

    let elapsed = start.elapsed();
    debug!(
        status = resp.status().as_u16(),
        elapsed_ms = elapsed.as_millis() as u64,
        "Response received"
    );
    Ok(resp)
}
