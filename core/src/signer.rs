use crate::{Context, Error, ProvideCredential, Result, SignRequest, SigningCredential};
use std::sync::{Arc, Mutex};

/// Signer is the main struct used to sign the request.
///
/// It loads the credential through its provider, caches it while it stays
/// valid, and hands it to the request signer. The cached credential is the
/// only shared mutable state; everything that scopes a signature travels with
/// the request signer.
#[derive(Clone, Debug)]
pub struct Signer<C: SigningCredential> {
    ctx: Context,
    loader: Arc<dyn ProvideCredential<Credential = C>>,
    builder: Arc<dyn SignRequest<Credential = C>>,
    credential: Arc<Mutex<Option<C>>>,
}

impl<C: SigningCredential> Signer<C> {
    /// Create a new signer.
    pub fn new(
        ctx: Context,
        loader: impl ProvideCredential<Credential = C>,
        builder: impl SignRequest<Credential = C>,
    ) -> Self {
        Self {
            ctx,

            loader: Arc::new(loader),
            builder: Arc::new(builder),
            credential: Arc::new(Mutex::new(None)),
        }
    }

    /// Context used by this signer.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Load the credential, reusing the cached one while it's valid.
    ///
    /// Returns `MissingCredential` if no provider could supply a valid one.
    pub async fn credential(&self) -> Result<C> {
        let cached = self.credential.lock().expect("lock poisoned").clone();
        if let Some(cred) = cached.filter(|c| c.is_valid()) {
            return Ok(cred);
        }

        let loaded = self.loader.provide_credential(&self.ctx).await?;
        let Some(cred) = loaded.filter(|c| c.is_valid()) else {
            return Err(Error::missing_credential(
                "no valid credential could be loaded",
            ));
        };

        *self.credential.lock().expect("lock poisoned") = Some(cred.clone());
        Ok(cred)
    }

    /// Sign the request with the configured request signer.
    pub async fn sign(&self, req: &mut http::request::Parts, body: &[u8]) -> Result<()> {
        self.sign_with(self.builder.as_ref(), req, body).await
    }

    /// Sign the request with a request signer built for this call only.
    ///
    /// The credential still comes from this signer's provider and cache.
    pub async fn sign_with(
        &self,
        builder: &dyn SignRequest<Credential = C>,
        req: &mut http::request::Parts,
        body: &[u8],
    ) -> Result<()> {
        let cred = self.credential().await?;
        builder.sign_request(req, body, Some(&cred))
    }
}
