use crate::SigningScheme;
use oscsign_core::hash::hmac_sha256;
use std::fmt::{Debug, Formatter};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// SigningKey is the output of the derivation chain.
///
/// It's valid for one UTC day, one region and one service, but it's never
/// cached: every call derives its own and drops it right after signing.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    /// Raw bytes of the key.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Debug for SigningKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningKey(***)")
    }
}

/// Derive the signing key.
///
/// ```text
/// k_date    = HMAC("OSC4" + secret_key, date_stamp)
/// k_region  = HMAC(k_date, region)
/// k_service = HMAC(k_region, service)
/// k_signing = HMAC(k_service, "osc4_request")
/// ```
pub fn derive_signing_key(
    scheme: &SigningScheme,
    secret_key: &str,
    date_stamp: &str,
    region: &str,
    service: &str,
) -> SigningKey {
    let secret = Zeroizing::new(format!("{}{secret_key}", scheme.key_prefix));

    let k_date = Zeroizing::new(hmac_sha256(secret.as_bytes(), date_stamp.as_bytes()));
    let k_region = Zeroizing::new(hmac_sha256(&k_date, region.as_bytes()));
    let k_service = Zeroizing::new(hmac_sha256(&k_region, service.as_bytes()));

    SigningKey(hmac_sha256(&k_service, scheme.terminator.as_bytes()))
}
