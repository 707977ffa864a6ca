use crate::canonical::CanonicalRequest;
use crate::constants::{CONTENT_TYPE_JSON, DEFAULT_BASE_URI, DEFAULT_VERSION, SIGNING_METHOD};
use crate::key::derive_signing_key;
use crate::{CallContext, Credential, SigningScheme};
use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_TYPE, HOST};
use http::request::Parts;
use http::{HeaderMap, HeaderName, HeaderValue};
use log::debug;
use oscsign_core::hash::hex_hmac_sha256;
use oscsign_core::time::{format_date, format_iso8601, now, DateTime};
use oscsign_core::utils::Redact;
use oscsign_core::{Error, Result, SignRequest, SigningRequest};
use std::fmt::{self, Display, Formatter, Write};
use std::str::FromStr;

/// RequestDescriptor holds the signable facts of one outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    /// HTTP method, always `POST` for the outscale API.
    pub method: String,
    /// Value of the `host` header.
    pub host: String,
    /// Request path before canonicalization.
    pub canonical_uri: String,
    /// Raw query string; empty for the outscale API.
    pub query: String,
    /// Extra headers to sign, in any order.
    pub headers: Vec<(String, String)>,
    /// Exactly the bytes that will be sent.
    pub payload: Bytes,
}

impl RequestDescriptor {
    /// Create a `POST` descriptor without query or extra headers.
    pub fn new(host: impl Into<String>, uri: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            method: SIGNING_METHOD.to_string(),
            host: host.into(),
            canonical_uri: uri.into(),
            query: String::new(),
            headers: Vec::new(),
            payload: payload.into(),
        }
    }

    /// Set the raw query string.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Append a header to sign.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// CredentialScope binds a signature to a date, a region and a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialScope {
    /// Date stamp: `20230101`
    pub date: String,
    /// Region, e.g. `eu-west-2`
    pub region: String,
    /// Service, e.g. `api`
    pub service: String,
    /// Terminator of the scheme, e.g. `osc4_request`
    pub terminator: &'static str,
}

impl CredentialScope {
    /// Create a new credential scope.
    pub fn new(scheme: &SigningScheme, date: &str, region: &str, service: &str) -> Self {
        Self {
            date: date.to_string(),
            region: region.to_string(),
            service: service.to_string(),
            terminator: scheme.terminator,
        }
    }
}

impl Display for CredentialScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.date, self.region, self.service, self.terminator
        )
    }
}

/// SignatureHeaders are the headers a caller must attach to the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeaders {
    /// Value of the `host` header.
    pub host: String,
    /// Name of the date header, e.g. `x-osc-date`.
    pub date_header: &'static str,
    /// Value of the date header: `20230101T000000Z`
    pub date: String,
    /// Value of the `content-type` header.
    pub content_type: String,
    /// Value of the `authorization` header.
    pub authorization: String,
    /// Signed header names joined by `;`.
    pub signed_headers: String,
    /// Hex encoded signature.
    pub signature: String,
}

impl SignatureHeaders {
    /// Headers as `(name, value)` pairs, names lower-cased.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        [
            ("host", self.host.as_str()),
            (self.date_header, self.date.as_str()),
            ("content-type", self.content_type.as_str()),
            ("authorization", self.authorization.as_str()),
        ]
        .into_iter()
    }

    /// Build a `HeaderMap`, with `authorization` marked sensitive.
    pub fn to_header_map(&self) -> Result<HeaderMap> {
        let mut map = HeaderMap::with_capacity(4);
        self.apply_to(&mut map)?;
        Ok(map)
    }

    /// Insert the headers into `map`, replacing existing values.
    ///
    /// `map` is left untouched when any header is invalid.
    pub fn apply_to(&self, map: &mut HeaderMap) -> Result<()> {
        for (name, value) in self.to_pairs()? {
            map.insert(name, value);
        }
        Ok(())
    }

    fn to_pairs(&self) -> Result<Vec<(HeaderName, HeaderValue)>> {
        self.iter()
            .map(|(name, value)| {
                let name = HeaderName::from_str(name)?;
                let mut value = HeaderValue::from_str(value)?;
                if name == AUTHORIZATION {
                    value.set_sensitive(true);
                }
                Ok((name, value))
            })
            .collect()
    }
}

/// RequestSigner that implements OSC4 (and, with another scheme, SigV4).
///
/// Region, service and version are fixed at construction: build one signer
/// per [`CallContext`] instead of mutating a shared one.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    scheme: SigningScheme,
    call: CallContext,
    base_uri: String,

    time: Option<DateTime>,
}

impl RequestSigner {
    /// Create a new signer for the given call context.
    pub fn new(call: CallContext) -> Self {
        Self {
            scheme: SigningScheme::default(),
            call,
            base_uri: DEFAULT_BASE_URI.to_string(),

            time: None,
        }
    }

    /// Use another signing scheme.
    pub fn with_scheme(mut self, scheme: SigningScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Use another base domain for the endpoint host.
    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = base_uri.into();
        self
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Call context of this signer.
    pub fn call_context(&self) -> &CallContext {
        &self.call
    }

    /// Scheme of this signer.
    pub fn scheme(&self) -> &SigningScheme {
        &self.scheme
    }

    /// Sign a call to `action` carrying `payload`.
    pub fn sign(&self, action: &str, payload: &[u8], cred: &Credential) -> Result<SignatureHeaders> {
        let now = self.time.unwrap_or_else(now);
        self.sign_with_time(action, payload, cred, now)
    }

    /// Sign a call to `action` carrying `payload` at the given instant.
    pub fn sign_with_time(
        &self,
        action: &str,
        payload: &[u8],
        cred: &Credential,
        now: DateTime,
    ) -> Result<SignatureHeaders> {
        cred.check()?;

        let descriptor = RequestDescriptor::new(
            self.call.host(&self.base_uri),
            self.call.path(action)?,
            Bytes::copy_from_slice(payload),
        );
        sign_descriptor(
            &self.scheme,
            &descriptor,
            &self.call.region,
            &self.call.service,
            cred,
            now,
        )
    }
}

impl RequestSigner {
    fn sign_parts(
        &self,
        signed_req: &mut SigningRequest,
        body: &[u8],
        cred: &Credential,
    ) -> Result<()> {
        let headers = signed_req
            .header_to_vec()?
            .into_iter()
            .filter(|(k, _)| k != AUTHORIZATION.as_str())
            .collect();
        let descriptor = RequestDescriptor {
            method: signed_req.method.to_string(),
            host: signed_req.authority.to_string(),
            canonical_uri: signed_req.path.clone(),
            query: signed_req.query.clone(),
            headers,
            payload: Bytes::copy_from_slice(body),
        };

        let now = self.time.unwrap_or_else(now);
        let signature = sign_descriptor(
            &self.scheme,
            &descriptor,
            &self.call.region,
            &self.call.service,
            cred,
            now,
        )?;
        signature.apply_to(&mut signed_req.headers)
    }
}

impl SignRequest for RequestSigner {
    type Credential = Credential;

    fn sign_request(
        &self,
        req: &mut Parts,
        body: &[u8],
        credential: Option<&Self::Credential>,
    ) -> Result<()> {
        let Some(cred) = credential else {
            return Err(Error::missing_credential("no credential to sign with"));
        };
        cred.check()?;

        let mut signed_req = SigningRequest::build(req)?;
        let signed = self.sign_parts(&mut signed_req, body, cred);

        // Apply to the request, signed or not, so a failure leaves it as it was.
        signed_req.apply(req)?;
        signed
    }
}

/// Sign a call to `action` with default base URI and version.
///
/// This is the plain form of [`RequestSigner::sign_with_time`] for callers
/// that hold region and service separately.
pub fn sign(
    scheme: &SigningScheme,
    action: &str,
    payload: &[u8],
    service: &str,
    region: &str,
    cred: &Credential,
    now: DateTime,
) -> Result<SignatureHeaders> {
    RequestSigner::new(CallContext::new(region, service, DEFAULT_VERSION))
        .with_scheme(*scheme)
        .sign_with_time(action, payload, cred, now)
}

/// Sign an arbitrary request descriptor.
///
/// `host` and the date header are always the signer's own. `content-type`
/// defaults to JSON when the descriptor doesn't carry one.
pub fn sign_descriptor(
    scheme: &SigningScheme,
    descriptor: &RequestDescriptor,
    region: &str,
    service: &str,
    cred: &Credential,
    now: DateTime,
) -> Result<SignatureHeaders> {
    cred.check()?;
    if descriptor.host.is_empty() {
        return Err(Error::malformed_input("host must not be empty"));
    }

    // Capture the instant once, both forms come from it.
    let timestamp = format_iso8601(now);
    let date = format_date(now);

    let mut headers = descriptor
        .headers
        .iter()
        .filter(|(k, _)| {
            !k.eq_ignore_ascii_case(HOST.as_str())
                && !k.eq_ignore_ascii_case(scheme.date_header)
                && !k.eq_ignore_ascii_case(AUTHORIZATION.as_str())
        })
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect::<Vec<_>>();
    let content_type = match headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(CONTENT_TYPE.as_str()))
    {
        Some((_, v)) => v.to_string(),
        None => {
            headers.push(("content-type", CONTENT_TYPE_JSON));
            CONTENT_TYPE_JSON.to_string()
        }
    };
    headers.push(("host", descriptor.host.as_str()));
    headers.push((scheme.date_header, timestamp.as_str()));

    let creq = CanonicalRequest::build(
        &descriptor.method,
        &descriptor.canonical_uri,
        &descriptor.query,
        headers,
        &descriptor.payload,
    )?;
    debug!("calculated canonical request: {creq}");

    let scope = CredentialScope::new(scheme, &date, region, service);
    debug!("calculated scope: {scope}");

    let string_to_sign = string_to_sign(scheme, &timestamp, &scope, &creq.hash())?;
    debug!("calculated string to sign: {string_to_sign}");

    let signing_key = derive_signing_key(scheme, &cred.secret_key, &date, region, service);
    let signature = hex_hmac_sha256(signing_key.as_bytes(), string_to_sign.as_bytes());

    debug!(
        "signed request for access key {}",
        Redact::from(&cred.access_key_id)
    );
    Ok(SignatureHeaders {
        host: descriptor.host.clone(),
        date_header: scheme.date_header,
        date: timestamp,
        content_type,
        authorization: authorization(
            scheme,
            &cred.access_key_id,
            &scope,
            &creq.signed_headers,
            &signature,
        ),
        signed_headers: creq.signed_headers,
        signature,
    })
}

/// StringToSign:
///
/// ```text
/// OSC4-HMAC-SHA256
/// 20230101T000000Z
/// 20230101/<region>/<service>/osc4_request
/// <hashed_canonical_request>
/// ```
pub(crate) fn string_to_sign(
    scheme: &SigningScheme,
    timestamp: &str,
    scope: &CredentialScope,
    hashed_canonical_request: &str,
) -> Result<String> {
    let mut f = String::new();
    writeln!(f, "{}", scheme.algorithm)
        .map_err(|e| Error::unexpected(format!("failed to write algorithm: {e}")))?;
    writeln!(f, "{timestamp}")
        .map_err(|e| Error::unexpected(format!("failed to write timestamp: {e}")))?;
    writeln!(f, "{scope}").map_err(|e| Error::unexpected(format!("failed to write scope: {e}")))?;
    write!(f, "{hashed_canonical_request}")
        .map_err(|e| Error::unexpected(format!("failed to write canonical request: {e}")))?;
    Ok(f)
}

pub(crate) fn authorization(
    scheme: &SigningScheme,
    access_key_id: &str,
    scope: &CredentialScope,
    signed_headers: &str,
    signature: &str,
) -> String {
    format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        scheme.algorithm, access_key_id, scope, signed_headers, signature
    )
}
