//! Webhook callback verification.
//!
//! The gateway's synchronous callback (browser return / webhook) carries a
//! different signature recipe than the asynchronous notification handled in
//! [`crate::notification`]: amount, matching data, authorisation code,
//! transaction type, date, secret key. The two inbound verification paths
//! target different gateway callback shapes and share only the digest
//! primitive; do not mix them.

use serde::{Deserialize, Serialize};

use crate::signature::sign_callback_response;

/// Fields of a gateway callback, under their wire names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackData {
    #[serde(rename = "Ds_Amount")]
    pub amount: String,
    #[serde(rename = "Ds_Merchant_MatchingData")]
    pub matching_data: String,
    #[serde(rename = "Ds_AuthorisationCode")]
    pub authorisation_code: String,
    #[serde(rename = "Ds_Merchant_TransactionType")]
    pub transaction_type: String,
    #[serde(rename = "Ds_Date")]
    pub date: String,
    #[serde(rename = "Ds_Signature")]
    pub signature: String,
}

/// Outcome of [`handle_callback`]. Unlike notification validation this path
/// does not raise; integrations branch on `valid`.
#[derive(Debug, Clone, Serialize)]
pub struct CallbackOutcome {
    pub valid: bool,
    pub data: CallbackData,
    pub error: Option<String>,
}

/// Recompute the callback-response signature and compare it with the one
/// the gateway sent.
pub fn verify_callback_signature(data: &CallbackData, secret_key: &str) -> bool {
    let expected = sign_callback_response(
        &data.amount,
        &data.matching_data,
        &data.authorisation_code,
        &data.transaction_type,
        &data.date,
        secret_key,
    );
    expected == data.signature
}

/// Verify a callback and package the result.
pub fn handle_callback(data: CallbackData, secret_key: &str) -> CallbackOutcome {
    if verify_callback_signature(&data, secret_key) {
        CallbackOutcome {
            valid: true,
            data,
            error: None,
        }
    } else {
        tracing::warn!(
            "callback signature mismatch for matching data {}",
            data.matching_data
        );
        CallbackOutcome {
            valid: false,
            data,
            error: Some("invalid callback signature".to_string()),
        }
    }
}
