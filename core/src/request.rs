use std::mem;
use std::str::FromStr;

use crate::{Error, Result};
use http::uri::Authority;
use http::uri::PathAndQuery;
use http::uri::Scheme;
use http::HeaderMap;
use http::Method;
use http::Uri;

/// Signing context for request.
///
/// Unlike `http::request::Parts`, the query is kept as the raw string so that
/// canonicalization can decide how to split and encode it.
#[derive(Debug)]
pub struct SigningRequest {
    /// HTTP method.
    pub method: Method,
    /// HTTP scheme.
    pub scheme: Scheme,
    /// HTTP authority.
    pub authority: Authority,
    /// HTTP path, as sent on the wire.
    pub path: String,
    /// Raw HTTP query without the leading `?`; empty when absent.
    pub query: String,
    /// HTTP headers.
    pub headers: HeaderMap,
}

impl SigningRequest {
    /// Build a signing context from http::request::Parts.
    ///
    /// `parts` is left untouched when this returns an error.
    pub fn build(parts: &mut http::request::Parts) -> Result<Self> {
        if parts.uri.authority().is_none() {
            return Err(Error::malformed_input(
                "request without authority is invalid for signing",
            ));
        }

        let uri = mem::take(&mut parts.uri).into_parts();
        let paq = uri
            .path_and_query
            .unwrap_or_else(|| PathAndQuery::from_static("/"));

        Ok(SigningRequest {
            method: parts.method.clone(),
            scheme: uri.scheme.unwrap_or(Scheme::HTTPS),
            authority: uri.authority.ok_or_else(|| {
                Error::malformed_input("request without authority is invalid for signing")
            })?,
            path: paq.path().to_string(),
            query: paq.query().unwrap_or_default().to_string(),

            // Take the headers out of the request to avoid copy.
            // We will return it back when apply the context.
            headers: mem::take(&mut parts.headers),
        })
    }

    /// Apply the signing context back to http::request::Parts.
    pub fn apply(mut self, parts: &mut http::request::Parts) -> Result<()> {
        // Return headers back.
        mem::swap(&mut parts.headers, &mut self.headers);
        parts.method = self.method;
        parts.uri = {
            let mut uri_parts = mem::take(&mut parts.uri).into_parts();
            uri_parts.scheme = Some(self.scheme);
            uri_parts.authority = Some(self.authority);
            uri_parts.path_and_query = {
                let paq = if self.query.is_empty() {
                    self.path
                } else {
                    format!("{}?{}", self.path, self.query)
                };

                Some(PathAndQuery::from_str(&paq)?)
            };
            Uri::from_parts(uri_parts)?
        };

        Ok(())
    }

    /// Collect all headers as `(name, value)` pairs in insertion order.
    ///
    /// Values must be visible ASCII; anything else can't be canonicalized.
    pub fn header_to_vec(&self) -> Result<Vec<(String, String)>> {
        self.headers
            .iter()
            .map(|(k, v)| {
                let v = v.to_str().map_err(|e| {
                    Error::malformed_input(format!("header {k} has a non-ASCII value"))
                        .with_source(e)
                })?;
                Ok((k.as_str().to_string(), v.to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use pretty_assertions::assert_eq;

    fn parts(uri: &str) -> http::request::Parts {
        let mut req = http::Request::new(());
        *req.method_mut() = Method::POST;
        *req.uri_mut() = uri.parse().expect("url must be valid");
        req.headers_mut()
            .insert(http::header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        req.into_parts().0
    }

    #[test]
    fn test_build_and_apply_roundtrip() -> Result<()> {
        let mut p = parts("https://api.eu-west-2.outscale.com/api/latest/ReadVms?b=2&a=1");

        let req = SigningRequest::build(&mut p)?;
        assert_eq!(req.method, Method::POST);
        assert_eq!(req.authority.as_str(), "api.eu-west-2.outscale.com");
        assert_eq!(req.path, "/api/latest/ReadVms");
        assert_eq!(req.query, "b=2&a=1");
        assert_eq!(req.headers[http::header::CONTENT_TYPE], "application/json");
        assert!(p.headers.is_empty());

        req.apply(&mut p)?;
        assert_eq!(
            p.uri.to_string(),
            "https://api.eu-west-2.outscale.com/api/latest/ReadVms?b=2&a=1"
        );
        assert_eq!(p.headers.len(), 1);
        Ok(())
    }

    #[test]
    fn test_build_without_authority() {
        let mut p = parts("/api/latest/ReadVms");
        let err = SigningRequest::build(&mut p).expect_err("authority is required");
        assert_eq!(err.kind(), crate::ErrorKind::MalformedInput);

        assert_eq!(p.uri, "/api/latest/ReadVms");
        assert_eq!(p.headers.len(), 1);
    }

}
