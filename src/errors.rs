//! Error types for Tefpay operations.
//!
//! Validation failures are surfaced synchronously, before any caller
//! callback runs. HTTP adapters are expected to catch at the boundary and
//! translate into a 400 response carrying the error message; nothing beyond
//! the message string should leak to the gateway or the payer.

use serde::{Deserialize, Serialize};

/// Comprehensive error type for Tefpay operations.
#[derive(thiserror::Error, Debug)]
pub enum TefpayError {
    /// Notification body missing, not a mapping, or too small to be real.
    #[error("notification payload is missing or malformed")]
    MalformedPayload,

    /// A required notification field is absent or empty.
    #[error("required field missing: {0}")]
    MissingField(String),

    /// Supplied signature does not match the recomputed digest.
    #[error("notification signature mismatch")]
    InvalidSignature,

    /// Transaction type outside the supported whitelist.
    #[error("unsupported transaction type: {0}")]
    UnsupportedTransactionType(String),

    /// Connection-level HTTP failure (DNS, refused, timeout). Gateway
    /// responses with non-success status codes are NOT mapped here; the raw
    /// body is returned to the caller regardless of status.
    #[error("transport error: {0}")]
    Transport(String),

    /// Failure reported by a caller-supplied notification callback,
    /// propagated unchanged through the orchestrator.
    #[error("callback error: {0}")]
    Callback(String),
}

impl From<reqwest::Error> for TefpayError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// A gateway `Ds_Response`-style numeric code paired with its documented
/// meaning, for callers inspecting the XML bodies returned by the
/// server-to-server API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseCode {
    pub code: String,
    pub message: String,
}

impl ResponseCode {
    /// Look up a gateway response code.
    pub fn from_code(code: impl Into<String>) -> Self {
        let code = code.into();
        let message = response_message(&code).to_string();
        Self { code, message }
    }

    /// Code "0" is the only approval code documented by the gateway.
    pub fn is_approved(&self) -> bool {
        self.code == "0"
    }
}

/// Human-readable meaning of a gateway response code.
pub fn response_message(code: &str) -> &'static str {
    match code {
        "0" => "Transacción aprobada",
        "1" => "Transacción denegada",
        _ => "Error desconocido",
    }
}
