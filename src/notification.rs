//! # Inbound Notification Processing
//!
//! The gateway reports transaction and subscription state changes by
//! POSTing a flat field map to the merchant's notify URL. Processing is a
//! fixed pipeline: structural validation, required fields, signature check,
//! transaction-type whitelist, then event classification, and finally the
//! caller-supplied callback with the enriched payload. Every validation
//! failure is raised before the callback runs; callback results and errors
//! propagate verbatim.
//!
//! # Framework adapter contract
//!
//! This module performs no transport I/O. An HTTP adapter is expected to
//! deserialize the request body into a [`NotificationPayload`], call
//! [`handle_notification`], respond 200 with the callback's value
//! serialized as JSON on success, and 400 with `{"error": "<message>"}` on
//! any `Err`. Idempotency and persistence belong to the callback.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::errors::TefpayError;
use crate::signature::sign_notification;
use crate::Result;

/// Raw inbound payload: gateway field names mapped to string values.
pub type NotificationPayload = HashMap<String, String>;

/// Notification fields that must be present and non-empty.
const REQUIRED_FIELDS: [&str; 5] = [
    "Ds_Merchant_Amount",
    "Ds_Merchant_MerchantCode",
    "Ds_Merchant_Order",
    "Ds_Merchant_TransactionType",
    "Ds_Merchant_Signature",
];

/// Transaction types the pipeline accepts. Anything else is rejected even
/// when correctly signed.
const SUPPORTED_TRANSACTION_TYPES: [&str; 4] = ["208", "209", "210", "211"];

/// Transaction type carried by subscription charge notifications.
const SUBSCRIPTION_CHARGE_TYPE: &str = "208";

/// Semantic event derived from a validated notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEvent {
    SubscriptionActivated,
    ChargeAttemptFailed,
}

impl NotificationEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SubscriptionActivated => "subscription_activated",
            Self::ChargeAttemptFailed => "charge_attempt_failed",
        }
    }
}

impl fmt::Display for NotificationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subscription status implied by a classified event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Active,
    Failed,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation options for [`handle_notification`].
#[derive(Debug, Clone, Copy)]
pub struct NotificationOptions<'a> {
    /// Merchant shared secret used to recompute the signature.
    pub secret_key: &'a str,
    /// Signature verification is on unless explicitly disabled.
    pub validate_signature: bool,
}

impl<'a> NotificationOptions<'a> {
    pub fn new(secret_key: &'a str) -> Self {
        Self {
            secret_key,
            validate_signature: true,
        }
    }

    /// Skip the signature check. Intended for replaying captured payloads
    /// in tests and backoffice tooling, not for production endpoints.
    pub fn without_signature_validation(mut self) -> Self {
        self.validate_signature = false;
        self
    }
}

/// A validated notification enriched with the classification outcome.
/// `fields` keeps every original entry untouched.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    #[serde(flatten)]
    pub fields: NotificationPayload,
    pub event: Option<NotificationEvent>,
    pub status: Option<NotificationStatus>,
}

impl Notification {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Validate an inbound payload. Steps run in order and short-circuit:
/// structure, required fields, signature (unless disabled), transaction
/// type whitelist.
pub fn validate_notification(
    payload: &NotificationPayload,
    secret_key: &str,
    validate_signature: bool,
) -> Result<()> {
    if payload.len() < REQUIRED_FIELDS.len() {
        tracing::warn!("rejected notification: {} fields", payload.len());
        return Err(TefpayError::MalformedPayload);
    }
    for field in REQUIRED_FIELDS {
        if payload.get(field).map_or(true, |value| value.is_empty()) {
            tracing::warn!("rejected notification: missing {}", field);
            return Err(TefpayError::MissingField(field.to_string()));
        }
    }
    // Required fields are known present from here on.
    if validate_signature {
        let expected = sign_notification(
            &payload["Ds_Merchant_Amount"],
            &payload["Ds_Merchant_MerchantCode"],
            &payload["Ds_Merchant_Order"],
            secret_key,
        );
        if payload["Ds_Merchant_Signature"] != expected {
            tracing::warn!(
                "rejected notification for order {}: signature mismatch",
                payload["Ds_Merchant_Order"]
            );
            return Err(TefpayError::InvalidSignature);
        }
    }
    let transaction_type = payload["Ds_Merchant_TransactionType"].as_str();
    if !SUPPORTED_TRANSACTION_TYPES.contains(&transaction_type) {
        return Err(TefpayError::UnsupportedTransactionType(
            transaction_type.to_string(),
        ));
    }
    Ok(())
}

/// Map a validated payload to its semantic event/status pair.
///
/// The rule set is intentionally minimal; unknown combinations yield
/// `(None, None)` and the payload still reaches the callback. New
/// transaction-type rules are added here without touching the validator.
pub fn classify_notification(
    payload: &NotificationPayload,
) -> (Option<NotificationEvent>, Option<NotificationStatus>) {
    let transaction_type = payload
        .get("Ds_Merchant_TransactionType")
        .map(String::as_str);
    if transaction_type != Some(SUBSCRIPTION_CHARGE_TYPE) {
        return (None, None);
    }
    let has = |name: &str| payload.get(name).is_some_and(|value| !value.is_empty());
    if has("Ds_Bank") {
        (
            Some(NotificationEvent::SubscriptionActivated),
            Some(NotificationStatus::Active),
        )
    } else if has("Ds_Response") {
        (
            Some(NotificationEvent::ChargeAttemptFailed),
            Some(NotificationStatus::Failed),
        )
    } else {
        (None, None)
    }
}

/// Process an inbound notification: validate, classify, then invoke the
/// caller's callback with the enriched payload.
///
/// The callback is the sole extension point for business logic; its result
/// (or error) is returned unchanged. Validation failures surface before the
/// callback runs.
///
/// # Example
///
/// ```no_run
/// # async fn handler(body: tefpay::NotificationPayload) -> tefpay::Result<()> {
/// use tefpay::{handle_notification, NotificationOptions};
///
/// let outcome = handle_notification(
///     body,
///     NotificationOptions::new("SECRET"),
///     |notification| async move {
///         // persist, call the backend, etc.
///         Ok(notification.event)
///     },
/// )
/// .await?;
/// # let _ = outcome;
/// # Ok(())
/// # }
/// ```
pub async fn handle_notification<F, Fut, T>(
    payload: NotificationPayload,
    options: NotificationOptions<'_>,
    callback: F,
) -> Result<T>
where
    F: FnOnce(Notification) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    validate_notification(&payload, options.secret_key, options.validate_signature)?;
    let (event, status) = classify_notification(&payload);
    tracing::debug!(
        "notification for order {} classified as {:?}",
        payload["Ds_Merchant_Order"],
        event
    );
    callback(Notification {
        fields: payload,
        event,
        status,
    })
    .await
}
