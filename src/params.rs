//! Query-string and form-body encoding.

use std::collections::BTreeMap;

use url::Url;
use url::form_urlencoded::Serializer;

use crate::error::Result;

/// URL-encodes a key/value collection.
///
/// Later values replace earlier ones for the same key, and keys are emitted
/// in sorted order so the output does not depend on the iteration order of
/// the input (e.g. a `HashMap`).
pub fn encode_params<I, K, V>(params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let merged: BTreeMap<String, String> = params
        .into_iter()
        .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
        .collect();

    let mut out = Serializer::new(String::new());
    for (k, v) in &merged {
        out.append_pair(k, v);
    }
    out.finish()
}

/// Parses `url` and, if `params` is non-empty, replaces its query string with
/// the encoding of `params`. An empty `params` leaves any existing query alone.
///
/// # Errors
///
/// Returns [`Error::UrlParse`](crate::Error::UrlParse) if `url` is malformed.
pub fn build_url<I, K, V>(url: &str, params: I) -> Result<Url>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut u = Url::parse(url)?;
    let query = encode_params(params);
    if !query.is_empty() {
        u.set_query(Some(&query));
    }
    Ok(u)
}
