use crate::Credential;
use async_trait::async_trait;
use oscsign_core::{Context, ProvideCredential, Result};

/// StaticCredentialProvider provides a fixed access key and secret key.
///
/// `Debug` goes through [`Credential`]'s, so the keys stay redacted.
#[derive(Debug, Clone)]
pub struct StaticCredentialProvider {
    credential: Credential,
}

impl StaticCredentialProvider {
    /// Create a new StaticCredentialProvider with access key id and secret key.
    pub fn new(access_key_id: &str, secret_key: &str) -> Self {
        Self {
            credential: Credential::new(access_key_id, secret_key),
        }
    }
}

#[async_trait]
impl ProvideCredential for StaticCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, _: &Context) -> Result<Option<Self::Credential>> {
        Ok(Some(self.credential.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_credential_provider() -> anyhow::Result<()> {
        let ctx = Context::new();

        let provider = StaticCredentialProvider::new("test_access_key", "test_secret_key");
        let cred = provider
            .provide_credential(&ctx)
            .await?
            .expect("credential must be provided");
        assert_eq!(cred.access_key_id, "test_access_key");
        assert_eq!(cred.secret_key, "test_secret_key");

        assert!(!format!("{provider:?}").contains("test_secret_key"));
        Ok(())
    }
}
