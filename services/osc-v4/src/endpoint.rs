use oscsign_core::{Error, Result};

/// CallContext carries everything that scopes one call: region, service and
/// API version.
///
/// It's immutable and passed along with every call, so concurrent calls
/// against different regions or services never observe each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallContext {
    /// Region, e.g. `eu-west-2`.
    pub region: String,
    /// Service name used in the credential scope, e.g. `api`.
    pub service: String,
    /// API version used in the request path, e.g. `latest`.
    pub version: String,
}

impl CallContext {
    /// Create a new call context.
    pub fn new(
        region: impl Into<String>,
        service: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            service: service.into(),
            version: version.into(),
        }
    }

    /// Host of the API endpoint: `api.{region}.{base_uri}`.
    pub fn host(&self, base_uri: &str) -> String {
        format!("api.{}.{}", self.region, base_uri)
    }

    /// Path of an action: `/api/{version}/{action}`.
    pub fn path(&self, action: &str) -> Result<String> {
        check_action(action)?;
        Ok(format!("/api/{}/{}", self.version, action))
    }

    /// Full URL of an action: `https://api.{region}.{base_uri}/api/{version}/{action}`.
    pub fn endpoint(&self, base_uri: &str, action: &str) -> Result<String> {
        Ok(format!("https://{}{}", self.host(base_uri), self.path(action)?))
    }
}

/// Actions are plain names like `ReadVms`; anything that could change the
/// shape of the URL is rejected.
pub(crate) fn check_action(action: &str) -> Result<()> {
    if action.is_empty() {
        return Err(Error::malformed_input("action must not be empty"));
    }
    if let Some(c) = action
        .chars()
        .find(|c| matches!(c, '/' | '?' | '#' | '%') || c.is_whitespace() || c.is_control())
    {
        return Err(Error::malformed_input(format!(
            "action {action:?} contains invalid character {c:?}"
        )));
    }
    Ok(())
}
