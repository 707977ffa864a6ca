//! Canonical request construction.
//!
//! ```text
//! POST
//! /api/latest/ReadVms
//!
//! content-type:application/json; charset=utf-8
//! host:api.eu-west-2.outscale.com
//! x-osc-date:20230101T000000Z
//!
//! content-type;host;x-osc-date
//! b32978014bcc7d38cede270bda01fa69d564600e44bd3acb773490c076a2f203
//! ```

use crate::constants::URI_ENCODE_SET;
use http::HeaderName;
use oscsign_core::hash::hex_sha256;
use oscsign_core::{Error, Result};
use percent_encoding::utf8_percent_encode;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

/// CanonicalRequest is the deterministic representation of a request that
/// gets hashed into the string to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    /// Upper-cased HTTP method.
    pub method: String,
    /// Percent-encoded path, `/` when empty.
    pub uri: String,
    /// Sorted, percent-encoded query string; empty when absent.
    pub query: String,
    /// Lower-cased header names with normalized values, sorted by name.
    pub headers: Vec<(String, String)>,
    /// Header names joined by `;`.
    pub signed_headers: String,
    /// Lower-case hex SHA-256 of the payload.
    pub payload_hash: String,
}

impl CanonicalRequest {
    /// Build the canonical request.
    ///
    /// Header order doesn't matter: names are lower-cased and sorted, and
    /// repeated names are merged with `,` in the order they were given.
    pub fn build<I, K, V>(
        method: &str,
        uri: &str,
        query: &str,
        headers: I,
        payload: &[u8],
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self::build_with_payload_hash(method, uri, query, headers, hex_sha256(payload))
    }

    /// Build the canonical request from an already computed payload hash.
    pub fn build_with_payload_hash<I, K, V>(
        method: &str,
        uri: &str,
        query: &str,
        headers: I,
        payload_hash: String,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        if method.is_empty() || !method.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(Error::malformed_input(format!(
                "invalid http method: {method:?}"
            )));
        }

        let headers = canonical_headers(headers)?;
        let signed_headers = headers
            .iter()
            .map(|(k, _)| k.as_str())
            .collect::<Vec<_>>()
            .join(";");

        Ok(Self {
            method: method.to_ascii_uppercase(),
            uri: canonical_uri(uri),
            query: canonical_query(query),
            headers,
            signed_headers,
            payload_hash,
        })
    }

    /// Lower-case hex SHA-256 of the canonical request.
    pub fn hash(&self) -> String {
        hex_sha256(self.to_string().as_bytes())
    }
}

impl Display for CanonicalRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.method)?;
        writeln!(f, "{}", self.uri)?;
        writeln!(f, "{}", self.query)?;
        for (name, value) in &self.headers {
            writeln!(f, "{name}:{value}")?;
        }
        writeln!(f)?;
        writeln!(f, "{}", self.signed_headers)?;
        write!(f, "{}", self.payload_hash)
    }
}

/// Percent-encode every path segment, keeping `/` as separator.
///
/// - Empty path canonicalizes to `/`.
/// - Existing `%XX` escapes are kept as they are.
pub fn canonical_uri(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut s = String::with_capacity(path.len() + 1);
    if !path.starts_with('/') {
        s.push('/');
    }
    for (idx, segment) in path.split('/').enumerate() {
        if idx > 0 {
            s.push('/');
        }
        s.push_str(&encode_component(segment));
    }
    s
}

/// Split the query on `&` and the first `=`, encode key and value
/// independently, sort by key then value.
///
/// Pairs without `=` get an empty value.
pub fn canonical_query(query: &str) -> String {
    let mut pairs = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (encode_component(k), encode_component(v))
        })
        .collect::<Vec<_>>();
    pairs.sort();

    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Lower-case names, trim values and collapse inner whitespace, merge repeated
/// names, sort by name.
pub fn canonical_headers<I, K, V>(headers: I) -> Result<Vec<(String, String)>>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut merged: BTreeMap<String, String> = BTreeMap::new();

    for (name, value) in headers {
        let (name, value) = (name.as_ref().trim(), value.as_ref());

        // HeaderName validates the token and lower-cases it.
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            Error::malformed_input(format!("invalid header name: {name:?}")).with_source(e)
        })?;
        if value.bytes().any(|b| (b < 0x20 && b != b'\t') || b == 0x7f) {
            return Err(Error::malformed_input(format!(
                "header {name} contains control characters"
            )));
        }
        let value = value.split_whitespace().collect::<Vec<_>>().join(" ");

        merged
            .entry(name.as_str().to_string())
            .and_modify(|v| {
                v.push(',');
                v.push_str(&value);
            })
            .or_insert(value);
    }

    Ok(merged.into_iter().collect())
}

fn encode_component(s: &str) -> String {
    let bs = s.as_bytes();
    let mut out = String::with_capacity(s.len());

    let mut start = 0;
    let mut idx = 0;
    while idx < bs.len() {
        if bs[idx] != b'%' {
            idx += 1;
            continue;
        }

        out.extend(utf8_percent_encode(&s[start..idx], &URI_ENCODE_SET));
        let escaped = idx + 2 < bs.len()
            && bs[idx + 1].is_ascii_hexdigit()
            && bs[idx + 2].is_ascii_hexdigit();
        if escaped {
            out.push_str(&s[idx..idx + 3]);
            idx += 3;
        } else {
            out.push_str("%25");
            idx += 1;
        }
        start = idx;
    }
    out.extend(utf8_percent_encode(&s[start..], &URI_ENCODE_SET));

    out
}
