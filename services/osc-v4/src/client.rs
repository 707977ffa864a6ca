use crate::constants::CONTENT_TYPE_JSON;
use crate::provide_credential::DefaultCredentialProvider;
use crate::{CallContext, Config, Credential, RequestSigner};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::StatusCode;
use log::{debug, warn};
use oscsign_core::{Context, Error, ProvideCredential, Result, Signer};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

/// Client sends signed calls to the outscale API.
///
/// Credentials are loaded and cached by the inner [`Signer`]. Calls against
/// the configured [`CallContext`] use the signer's own [`RequestSigner`];
/// calls against any other context build one for that call only.
#[derive(Debug, Clone)]
pub struct Client {
    signer: Signer<Credential>,
    call: CallContext,
    base_uri: String,
}

impl Client {
    /// Create a client that loads credentials from `config`, then from env.
    ///
    /// Returns `ConfigInvalid` if region, service, version or base URI is
    /// set but empty.
    pub fn new(ctx: Context, config: Config) -> Result<Self> {
        let config = Arc::new(config);
        Self::with_provider(ctx, config.clone(), DefaultCredentialProvider::new(config))
    }

    /// Create a client with a custom credential provider.
    pub fn with_provider(
        ctx: Context,
        config: Arc<Config>,
        provider: impl ProvideCredential<Credential = Credential>,
    ) -> Result<Self> {
        let call = config.call_context()?;
        let base_uri = config.base_uri()?.to_string();
        let builder = RequestSigner::new(call.clone()).with_base_uri(base_uri.as_str());

        Ok(Self {
            signer: Signer::new(ctx, provider, builder),
            call,
            base_uri,
        })
    }

    /// Call context built from the config, used by the typed helpers.
    pub fn call_context(&self) -> &CallContext {
        &self.call
    }

    /// Sign and send `payload` to `action`.
    ///
    /// The payload is sent exactly as it was signed. Any non-2xx response is
    /// an error that carries the status and the body.
    pub async fn call(
        &self,
        call: &CallContext,
        action: &str,
        payload: impl Into<Bytes>,
    ) -> Result<http::Response<Bytes>> {
        let body = payload.into();
        let url = call.endpoint(&self.base_uri, action)?;

        let req = http::Request::post(&url)
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
            .body(())?;
        let (mut parts, _) = req.into_parts();

        if call == &self.call {
            self.signer.sign(&mut parts, &body).await?;
        } else {
            let builder = RequestSigner::new(call.clone()).with_base_uri(self.base_uri.as_str());
            self.signer.sign_with(&builder, &mut parts, &body).await?;
        }

        debug!("sending {action} to {url}");
        let resp = self
            .signer
            .context()
            .http_send(http::Request::from_parts(parts, body))
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = String::from_utf8_lossy(resp.body()).to_string();
        warn!("{action} failed with status {status}");
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Error::authentication_failed(format!("{action} was rejected: {status}"))
            }
            _ => Error::service_error(format!("{action} failed: {status}")),
        }
        .with_response(status, body))
    }

    /// Serialize `input`, call `action` with it and deserialize the response.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        call: &CallContext,
        action: &str,
        input: &impl Serialize,
    ) -> Result<T> {
        let payload = serde_json::to_vec(input).map_err(|e| {
            Error::malformed_input(format!("failed to serialize {action} request")).with_source(e)
        })?;

        let resp = self.call(call, action, payload).await?;
        serde_json::from_slice(resp.body()).map_err(|e| {
            Error::unexpected(format!("failed to parse {action} response")).with_source(e)
        })
    }

    /// List the regions, `ReadRegions`.
    pub async fn read_regions(&self, dry_run: bool) -> Result<Vec<Value>> {
        let resp: ReadRegionsResponse = self
            .call_json(&self.call, "ReadRegions", &json!({ "DryRun": dry_run }))
            .await?;
        Ok(resp.regions)
    }

    /// List the subregions of the configured region, `ReadSubregions`.
    pub async fn read_subregions(&self, dry_run: bool) -> Result<Vec<Value>> {
        let resp: ReadSubregionsResponse = self
            .call_json(&self.call, "ReadSubregions", &json!({ "DryRun": dry_run }))
            .await?;
        Ok(resp.subregions)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ReadRegionsResponse {
    #[serde(default)]
    regions: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ReadSubregionsResponse {
    #[serde(default)]
    subregions: Vec<Value>,
}
