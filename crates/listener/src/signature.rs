//! Webhook signature verification.
//!
//! ShotGrid signs each delivery with HMAC-SHA1 over the raw request body using
//! the webhook's secret token, and sends the lower-case hex digest in the
//! `X-SG-Signature` header, optionally prefixed with `sha1=`.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use thiserror::Error;
use tracing::{info, warn};

type HmacSha1 = Hmac<Sha1>;

/// Header carrying the signature.
pub const SIGNATURE_HEADER: &str = "X-SG-Signature";

const PREFIX: &str = "sha1=";

/// Why a delivery was rejected.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SignatureError {
    #[error("no signature provided")]
    Missing,
    #[error("signature is not a hex digest")]
    Malformed,
    #[error("signature does not match the request body")]
    Mismatch,
    #[error("secret token cannot be used as an HMAC key")]
    InvalidKey,
}

/// Verifies request bodies against a shared secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    keyed: HmacSha1,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier").finish_non_exhaustive()
    }
}

impl SignatureVerifier {
    /// Creates a verifier for `secret`.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, SignatureError> {
        let keyed =
            HmacSha1::new_from_slice(secret.as_ref()).map_err(|_| SignatureError::InvalidKey)?;
        Ok(Self { keyed })
    }

    fn mac(&self, body: &[u8]) -> HmacSha1 {
        let mut mac = self.keyed.clone();
        mac.update(body);
        mac
    }

    /// Returns the header value ShotGrid would send for `body`.
    pub fn sign(&self, body: &[u8]) -> String {
        format!("{PREFIX}{}", hex::encode(self.mac(body).finalize().into_bytes()))
    }

    /// Checks `header` against the HMAC of `body` in constant time.
    pub fn verify(&self, body: &[u8], header: Option<&str>) -> Result<(), SignatureError> {
        info!("Verifying webhook signature");
        let Some(header) = header else {
            warn!("No signature provided in request");
            return Err(SignatureError::Missing);
        };
        let digest = header.strip_prefix(PREFIX).unwrap_or(header);
        let Ok(expected) = hex::decode(digest.trim()) else {
            warn!("Signature verification failed: not hex");
            return Err(SignatureError::Malformed);
        };

        match self.mac(body).verify_slice(&expected) {
            Ok(()) => {
                info!("Signature verification successful");
                Ok(())
            }
            Err(_) => {
                warn!("Signature verification failed");
                Err(SignatureError::Mismatch)
            }
        }
    }
}
