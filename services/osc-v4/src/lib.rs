//! Outscale API request signer.
//!
//! Implements the OSC4 signing scheme used by the outscale API: requests are
//! canonicalized, hashed and signed with a key derived from the secret key,
//! the date, the region and the service.
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use oscsign_osc_v4::{CallContext, Credential, RequestSigner};
//!
//! let signer = RequestSigner::new(CallContext::new("eu-west-2", "api", "latest"));
//! let cred = Credential::new("AKIDEXAMPLE", "secret123");
//! let now = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
//!
//! let headers = signer
//!     .sign_with_time("ReadVms", br#"{"DryRun":false}"#, &cred, now)
//!     .unwrap();
//! assert!(headers.authorization.starts_with("OSC4-HMAC-SHA256 Credential=AKIDEXAMPLE/"));
//! ```

mod canonical;
pub use canonical::{canonical_headers, canonical_query, canonical_uri, CanonicalRequest};

mod client;
pub use client::Client;

mod config;
pub use config::Config;

mod credential;
pub use credential::Credential;

mod endpoint;
pub use endpoint::CallContext;

mod key;
pub use key::{derive_signing_key, SigningKey};

mod provide_credential;
pub use provide_credential::*;

mod scheme;
pub use scheme::SigningScheme;

mod sign_request;
pub use sign_request::{
    sign, sign_descriptor, CredentialScope, RequestDescriptor, RequestSigner, SignatureHeaders,
};

mod verify;
pub use verify::{ParsedAuthorization, Verifier};

pub mod constants;
