// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use crate::{constants::*, Credential};
use async_trait::async_trait;
use oscsign_core::{Context, ProvideCredential, Result};

/// EnvCredentialProvider loads outscale credentials from environment variables.
///
/// This provider looks for the following environment variables:
/// - `OSC_ACCESS_KEY`: The access key id
/// - `OSC_SECRET_KEY`: The secret key
///
/// Empty values are treated as absent.
#[derive(Debug, Default, Clone)]
pub struct EnvCredentialProvider;

impl EnvCredentialProvider {
    /// Create a new EnvCredentialProvider.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProvideCredential for EnvCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let envs = ctx.env_vars();

        let access_key_id = envs.get(OSC_ACCESS_KEY).filter(|v| !v.is_empty());
        let secret_key = envs.get(OSC_SECRET_KEY).filter(|v| !v.is_empty());

        match (access_key_id, secret_key) {
            (Some(ak), Some(sk)) => Ok(Some(Credential::new(ak.as_str(), sk.as_str()))),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oscsign_core::StaticEnv;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_env_credential_provider() -> anyhow::Result<()> {
        let envs = HashMap::from([
            (OSC_ACCESS_KEY.to_string(), "test_access_key".to_string()),
            (OSC_SECRET_KEY.to_string(), "test_secret_key".to_string()),
        ]);
        let ctx = Context::new().with_env(StaticEnv { envs });

        let provider = EnvCredentialProvider::new();
        let cred = provider
            .provide_credential(&ctx)
            .await?
            .expect("credential must be loaded");
        assert_eq!(cred.access_key_id, "test_access_key");
        assert_eq!(cred.secret_key, "test_secret_key");

        Ok(())
    }

    #[tokio::test]
    async fn test_env_credential_provider_missing_credentials() -> anyhow::Result<()> {
        let ctx = Context::new().with_env(StaticEnv::default());

        let provider = EnvCredentialProvider::new();
        assert!(provider.provide_credential(&ctx).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_env_credential_provider_partial_credentials() -> anyhow::Result<()> {
        for envs in [
            HashMap::from([(OSC_ACCESS_KEY.to_string(), "test_access_key".to_string())]),
            HashMap::from([(OSC_SECRET_KEY.to_string(), "test_secret_key".to_string())]),
            HashMap::from([
                (OSC_ACCESS_KEY.to_string(), "test_access_key".to_string()),
                (OSC_SECRET_KEY.to_string(), String::new()),
            ]),
        ] {
            let ctx = Context::new().with_env(StaticEnv { envs });
            let provider = EnvCredentialProvider::new();
            assert!(provider.provide_credential(&ctx).await?.is_none());
        }

        Ok(())
    }
}
