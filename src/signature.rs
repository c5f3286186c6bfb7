//! # Tefpay Signature Engine
//!
//! Every message exchanged with the gateway is authenticated by a SHA-1
//! digest over an ordered, delimiter-free concatenation of plaintext field
//! values with the merchant's shared secret appended. The gateway defines a
//! distinct concatenation order per flow; the recipes below are NOT
//! interchangeable and must match the documented order byte-for-byte.
//!
//! There are no failure modes: any sequence of strings digests to a
//! 40-character lowercase hex string. Supplying an empty or wrong field
//! simply produces a signature the gateway will reject.

use sha1::{Digest, Sha1};

/// Digest an ordered sequence of parts: SHA-1 over the parts concatenated
/// with no separator, returned as lowercase hex (always 40 characters).
pub fn digest(parts: &[&str]) -> String {
    let mut hasher = Sha1::new();
    for part in parts {
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Signature for a hosted payment request (client present).
///
/// Order: amount, merchant code, order, callback URL, secret key.
pub fn sign_payment_request(
    amount: &str,
    merchant_code: &str,
    order: &str,
    callback_url: &str,
    secret_key: &str,
) -> String {
    digest(&[amount, merchant_code, order, callback_url, secret_key])
}

/// Signature the gateway applies to webhook callback responses.
///
/// Order: amount, matching data, authorisation code, transaction type,
/// date, secret key. This protocol is separate from the notification
/// verification below; the two share only [`digest`].
pub fn sign_callback_response(
    amount: &str,
    matching_data: &str,
    auth_code: &str,
    transaction_type: &str,
    date: &str,
    secret_key: &str,
) -> String {
    digest(&[
        amount,
        matching_data,
        auth_code,
        transaction_type,
        date,
        secret_key,
    ])
}

/// Signature for server-to-server subscription management actions.
///
/// Order: account, action code, merchant code, secret key.
pub fn sign_subscription_action(
    account: &str,
    action: &str,
    merchant_code: &str,
    secret_key: &str,
) -> String {
    digest(&[account, action, merchant_code, secret_key])
}

/// Signature embedded in the outbound subscription-creation form.
///
/// Order: trial amount, merchant code, matching data, notify URL, shared
/// key. Distinct from [`sign_subscription_action`], which covers the
/// management API.
pub fn sign_subscription_creation(
    trial_amount: &str,
    merchant_code: &str,
    matching_data: &str,
    notify_url: &str,
    shared_key: &str,
) -> String {
    digest(&[
        trial_amount,
        merchant_code,
        matching_data,
        notify_url,
        shared_key,
    ])
}

/// Signature recomputed when validating an asynchronous notification.
///
/// Order: amount, merchant code, order, secret key. Note this omits the
/// callback URL that [`sign_payment_request`] includes at build time.
pub fn sign_notification(
    amount: &str,
    merchant_code: &str,
    order: &str,
    secret_key: &str,
) -> String {
    digest(&[amount, merchant_code, order, secret_key])
}

/// Signature for a server-to-server refund.
///
/// Order: amount, merchant code, matching data, endpoint URL, secret key.
pub fn sign_refund(
    amount: &str,
    merchant_code: &str,
    matching_data: &str,
    url: &str,
    secret_key: &str,
) -> String {
    digest(&[amount, merchant_code, matching_data, url, secret_key])
}
