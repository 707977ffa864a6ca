use crate::constants::{X_AMZ_DATE, X_OSC_DATE};

/// SigningScheme pins the literals of one version of the signing scheme.
///
/// The algorithm is identical across versions; only these identifiers change,
/// and each of them must match what the server expects byte for byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigningScheme {
    /// Algorithm identifier, first line of the string to sign and first word
    /// of the `Authorization` header.
    pub algorithm: &'static str,
    /// Prefix prepended to the secret key to seed the key derivation.
    pub key_prefix: &'static str,
    /// Last component of the credential scope and last message of the key
    /// derivation chain.
    pub terminator: &'static str,
    /// Lower-cased name of the header carrying the signing timestamp.
    pub date_header: &'static str,
}

impl SigningScheme {
    /// Outscale API signature version 4.
    pub const OSC4: SigningScheme = SigningScheme {
        algorithm: "OSC4-HMAC-SHA256",
        key_prefix: "OSC4",
        terminator: "osc4_request",
        date_header: X_OSC_DATE,
    };

    /// AWS Signature Version 4.
    ///
    /// The outscale scheme is derived from it, so the published SigV4 test
    /// vectors pin the algorithm independently of the outscale literals.
    pub const AWS4: SigningScheme = SigningScheme {
        algorithm: "AWS4-HMAC-SHA256",
        key_prefix: "AWS4",
        terminator: "aws4_request",
        date_header: X_AMZ_DATE,
    };
}

impl Default for SigningScheme {
    fn default() -> Self {
        Self::OSC4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scheme_is_osc4() {
        assert_eq!(SigningScheme::default(), SigningScheme::OSC4);
    }

    #[test]
    fn test_literals_are_consistent() {
        for scheme in [SigningScheme::OSC4, SigningScheme::AWS4] {
            assert!(scheme.algorithm.starts_with(scheme.key_prefix));
            assert_eq!(
                scheme.terminator,
                format!("{}_request", scheme.key_prefix.to_lowercase())
            );
            assert_eq!(scheme.date_header, scheme.date_header.to_lowercase());
        }
    }
}
