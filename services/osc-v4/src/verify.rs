use crate::canonical::CanonicalRequest;
use crate::key::derive_signing_key;
use crate::sign_request::{authorization, string_to_sign, CredentialScope, RequestDescriptor};
use crate::{Credential, SigningScheme};
use chrono::Duration;
use log::debug;
use oscsign_core::hash::hex_hmac_sha256;
use oscsign_core::time::{format_date, parse_iso8601, DateTime};
use oscsign_core::{Error, Result};
use subtle::ConstantTimeEq;

/// ParsedAuthorization is the `Authorization` header split into its parts.
///
/// ```text
/// OSC4-HMAC-SHA256 Credential=AK/20230101/eu-west-2/api/osc4_request, SignedHeaders=content-type;host;x-osc-date, Signature=...
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAuthorization {
    pub algorithm: String,
    pub access_key_id: String,
    pub date: String,
    pub region: String,
    pub service: String,
    pub terminator: String,
    pub signed_headers: Vec<String>,
    pub signature: String,
}

impl ParsedAuthorization {
    /// Parse an `Authorization` header value.
    pub fn parse(header: &str) -> Result<Self> {
        let (algorithm, rest) = header
            .trim()
            .split_once(' ')
            .ok_or_else(|| Error::malformed_input("authorization has no algorithm"))?;

        let mut credential = None;
        let mut signed_headers = None;
        let mut signature = None;
        for part in rest.split(',') {
            let (k, v) = part
                .trim()
                .split_once('=')
                .ok_or_else(|| Error::malformed_input("authorization part is not key=value"))?;
            let slot = match k {
                "Credential" => &mut credential,
                "SignedHeaders" => &mut signed_headers,
                "Signature" => &mut signature,
                _ => {
                    return Err(Error::malformed_input(format!(
                        "unknown authorization part: {k}"
                    )))
                }
            };
            if slot.replace(v).is_some() {
                return Err(Error::malformed_input(format!(
                    "duplicate authorization part: {k}"
                )));
            }
        }

        let credential =
            credential.ok_or_else(|| Error::malformed_input("authorization has no Credential"))?;
        let signed_headers = signed_headers
            .ok_or_else(|| Error::malformed_input("authorization has no SignedHeaders"))?;
        let signature =
            signature.ok_or_else(|| Error::malformed_input("authorization has no Signature"))?;

        // The access key may not contain `/`, so the scope is always the last
        // four parts.
        let parts: Vec<&str> = credential.split('/').collect();
        let [access_key_id, date, region, service, terminator] = parts.as_slice() else {
            return Err(Error::malformed_input(
                "credential must be access_key/date/region/service/terminator",
            ));
        };
        if access_key_id.is_empty() || signed_headers.is_empty() || signature.is_empty() {
            return Err(Error::malformed_input("authorization has empty parts"));
        }

        Ok(Self {
            algorithm: algorithm.to_string(),
            access_key_id: access_key_id.to_string(),
            date: date.to_string(),
            region: region.to_string(),
            service: service.to_string(),
            terminator: terminator.to_string(),
            signed_headers: signed_headers.split(';').map(str::to_string).collect(),
            signature: signature.to_string(),
        })
    }
}

/// Verifier checks signatures produced by [`crate::RequestSigner`].
///
/// It's meant for test doubles and proxies that need to tell a valid
/// request apart from a tampered one without calling the real API.
#[derive(Debug, Clone)]
pub struct Verifier {
    scheme: SigningScheme,
    max_skew: Option<Duration>,
}

impl Verifier {
    /// Create a verifier for the given scheme.
    pub fn new(scheme: SigningScheme) -> Self {
        Self {
            scheme,
            max_skew: None,
        }
    }

    /// Reject requests whose date is further than `skew` from `now`.
    pub fn with_max_skew(mut self, skew: Duration) -> Self {
        self.max_skew = Some(skew);
        self
    }

    /// Verify a signed request.
    ///
    /// `descriptor.headers` must carry the `authorization` header and every
    /// header it lists; `host` falls back to `descriptor.host`.
    pub fn verify(
        &self,
        descriptor: &RequestDescriptor,
        cred: &Credential,
        now: DateTime,
    ) -> Result<()> {
        cred.check()?;

        let header = find_header(descriptor, "authorization")
            .ok_or_else(|| Error::authentication_failed("request is not signed"))?;
        let auth = ParsedAuthorization::parse(header)?;

        if auth.algorithm != self.scheme.algorithm || auth.terminator != self.scheme.terminator {
            return Err(Error::authentication_failed(format!(
                "unexpected algorithm: {}",
                auth.algorithm
            )));
        }
        if auth.access_key_id != cred.access_key_id {
            return Err(Error::authentication_failed("access key doesn't match"));
        }

        let timestamp = find_header(descriptor, self.scheme.date_header).ok_or_else(|| {
            Error::authentication_failed(format!("missing {} header", self.scheme.date_header))
        })?;
        let signed_at = parse_iso8601(timestamp)?;
        if format_date(signed_at) != auth.date {
            return Err(Error::authentication_failed(
                "credential scope date doesn't match request date",
            ));
        }
        if let Some(skew) = self.max_skew {
            if (now - signed_at).abs() > skew {
                return Err(Error::authentication_failed(format!(
                    "request date {timestamp} is outside the allowed skew"
                )));
            }
        }

        let mut headers = Vec::with_capacity(auth.signed_headers.len());
        for name in &auth.signed_headers {
            match find_header(descriptor, name) {
                Some(value) => headers.push((name.as_str(), value)),
                None if name == "host" => headers.push((name.as_str(), descriptor.host.as_str())),
                None => {
                    return Err(Error::authentication_failed(format!(
                        "signed header {name} is missing"
                    )))
                }
            }
        }

        let creq = CanonicalRequest::build(
            &descriptor.method,
            &descriptor.canonical_uri,
            &descriptor.query,
            headers,
            &descriptor.payload,
        )?;
        // Headers listed twice or out of order would canonicalize differently.
        if creq.signed_headers != auth.signed_headers.join(";") {
            return Err(Error::authentication_failed(
                "signed headers are not canonical",
            ));
        }

        let scope = CredentialScope::new(&self.scheme, &auth.date, &auth.region, &auth.service);
        let sts = string_to_sign(&self.scheme, timestamp, &scope, &creq.hash())?;
        let key = derive_signing_key(
            &self.scheme,
            &cred.secret_key,
            &auth.date,
            &auth.region,
            &auth.service,
        );
        let expected = hex_hmac_sha256(key.as_bytes(), sts.as_bytes());
        debug!("verifying request signed with scope {scope}");

        if !bool::from(expected.as_bytes().ct_eq(auth.signature.as_bytes())) {
            return Err(Error::authentication_failed("signature doesn't match"));
        }

        // Catch any difference in formatting that the parser tolerated.
        let rebuilt = authorization(
            &self.scheme,
            &cred.access_key_id,
            &scope,
            &creq.signed_headers,
            &expected,
        );
        if !bool::from(rebuilt.as_bytes().ct_eq(header.trim().as_bytes())) {
            return Err(Error::authentication_failed("authorization is not canonical"));
        }
        Ok(())
    }
}

fn find_header<'a>(descriptor: &'a RequestDescriptor, name: &str) -> Option<&'a str> {
    descriptor
        .headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
