//! # Payment signature format
//!
//! When a checkout completes, Razorpay calls back with three values: the order id the server
//! created up front, the payment id the gateway assigned, and a signature. The signature is the
//! only proof that the payment actually happened on the gateway, since the other two values are
//! client-controlled and trivially forgeable.
//!
//! ## Scheme
//!
//! ```text
//!     signature = hex( HMAC-SHA256( key_secret, "{order_id}|{payment_id}" ) )
//! ```
//!
//! where `key_secret` is the API secret shared between this server and the gateway. The digest is
//! lowercase hex. Verification decodes the supplied hex and compares it against a freshly computed
//! MAC with the `hmac` crate's constant-time verifier, so a mismatch reveals nothing about how
//! close the attempt was. Any failure (bad hex, wrong length, wrong digest) must be treated as
//! "this payment never happened".

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Error)]
pub enum PaymentSignatureError {
    #[error("Malformed payment signature: {0}")]
    MalformedSignature(String),
    #[error("Payment signature verification failed")]
    VerificationFailed,
}

/// The (order, payment, signature) triple from a gateway checkout callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSignature {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

impl PaymentSignature {
    pub fn new(order_id: &str, payment_id: &str, signature: &str) -> Self {
        Self {
            order_id: order_id.to_string(),
            payment_id: payment_id.to_string(),
            signature: signature.trim().to_lowercase(),
        }
    }

    /// Signs the (order, payment) pair with the given secret. This is what the gateway does on its
    /// side; the server only needs it for tooling and tests.
    pub fn create(order_id: &str, payment_id: &str, secret: &str) -> Self {
        let signature = hmac_sha256_hex(secret, &signature_message(order_id, payment_id));
        Self { order_id: order_id.to_string(), payment_id: payment_id.to_string(), signature }
    }

    pub fn message(&self) -> String {
        signature_message(&self.order_id, &self.payment_id)
    }

    /// Constant-time verification of the signature against the shared secret.
    pub fn verify(&self, secret: &str) -> Result<(), PaymentSignatureError> {
        let supplied = hex::decode(&self.signature)
            .map_err(|e| PaymentSignatureError::MalformedSignature(e.to_string()))?;
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| PaymentSignatureError::MalformedSignature(e.to_string()))?;
        mac.update(self.message().as_bytes());
        mac.verify_slice(&supplied).map_err(|_| PaymentSignatureError::VerificationFailed)
    }
}

pub fn signature_message(order_id: &str, payment_id: &str) -> String {
    format!("{order_id}|{payment_id}")
}

pub fn hmac_sha256_hex(secret: &str, message: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
