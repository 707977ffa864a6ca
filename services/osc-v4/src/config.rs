use crate::constants::*;
use crate::CallContext;
use oscsign_core::utils::Redact;
use oscsign_core::{Context, Error, Result};
use std::fmt::{Debug, Formatter};

/// Config for outscale services.
///
/// Every field is optional; [`Config::call_context`] and
/// [`Config::base_uri`] fill in the API defaults for unset fields.
#[derive(Clone, Default)]
pub struct Config {
    /// Access key id, `OSC_ACCESS_KEY`
    pub access_key_id: Option<String>,
    /// Secret key, `OSC_SECRET_KEY`
    pub secret_key: Option<String>,
    /// Region, `OSC_REGION`, defaults to `eu-west-2`
    pub region: Option<String>,
    /// Service name used in the credential scope, `OSC_SERVICE`, defaults to `api`
    pub service: Option<String>,
    /// API version in the request path, `OSC_API_VERSION`, defaults to `latest`
    pub version: Option<String>,
    /// Base domain of the endpoint, `OSC_BASE_URI`, defaults to `outscale.com`
    pub base_uri: Option<String>,
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("access_key_id", &Redact::from(&self.access_key_id))
            .field(
                "secret_key",
                &format_args!("{}", if self.secret_key.is_some() { "***" } else { "EMPTY" }),
            )
            .field("region", &self.region)
            .field("service", &self.service)
            .field("version", &self.version)
            .field("base_uri", &self.base_uri)
            .finish()
    }
}

impl Config {
    /// Load config from environment variables.
    pub fn from_env(ctx: &Context) -> Self {
        Self {
            access_key_id: ctx.env_var(OSC_ACCESS_KEY),
            secret_key: ctx.env_var(OSC_SECRET_KEY),
            region: ctx.env_var(OSC_REGION),
            service: ctx.env_var(OSC_SERVICE),
            version: ctx.env_var(OSC_API_VERSION),
            base_uri: ctx.env_var(OSC_BASE_URI),
        }
    }

    /// Fill the fields that are still unset from environment variables.
    ///
    /// Values set explicitly always win over the environment.
    pub fn merge_env(self, ctx: &Context) -> Self {
        let env = Self::from_env(ctx);
        Self {
            access_key_id: self.access_key_id.or(env.access_key_id),
            secret_key: self.secret_key.or(env.secret_key),
            region: self.region.or(env.region),
            service: self.service.or(env.service),
            version: self.version.or(env.version),
            base_uri: self.base_uri.or(env.base_uri),
        }
    }

    /// Build the per-call context from this config, applying defaults.
    ///
    /// A value that is set but empty, like `OSC_REGION=`, is rejected with
    /// `ConfigInvalid` instead of falling back to the default.
    pub fn call_context(&self) -> Result<CallContext> {
        Ok(CallContext::new(
            non_empty("region", &self.region, DEFAULT_REGION)?,
            non_empty("service", &self.service, DEFAULT_SERVICE)?,
            non_empty("version", &self.version, DEFAULT_VERSION)?,
        ))
    }

    /// Base domain of the endpoint, applying the default.
    pub fn base_uri(&self) -> Result<&str> {
        non_empty("base_uri", &self.base_uri, DEFAULT_BASE_URI)
    }
}

fn non_empty<'a>(name: &str, value: &'a Option<String>, default: &'a str) -> Result<&'a str> {
    match value.as_deref() {
        None => Ok(default),
        Some(v) if v.trim().is_empty() => Err(Error::config_invalid(format!(
            "{name} is set but empty"
        ))),
        Some(v) => Ok(v),
    }
}
