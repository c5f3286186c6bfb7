//! Tefpay client library.
//!
//! Integrates a merchant backend with the Tefpay hosted payment gateway.
//! The crate stays stateless: every operation is a pure function of its
//! parameters (plus one HTTP round trip in the management client), and all
//! durable state belongs to the caller's notification callback.
//!
//! # Features
//!
//! - **Outbound forms**: signed hidden-field sets for hosted one-time
//!   payments and subscription creation ([`payment`]).
//! - **Inbound notifications**: validation, event classification and an
//!   async callback orchestrator ([`notification`]).
//! - **Webhook callbacks**: the gateway's second, distinct inbound
//!   verification protocol ([`webhook`]).
//! - **Subscription management**: signed server-to-server lifecycle and
//!   refund calls returning the gateway's raw XML ([`remote`]).
//!
//! # Example
//!
//! ```
//! use tefpay::{build_hosted_payment_form, HostedPaymentParams};
//!
//! let form = build_hosted_payment_form(&HostedPaymentParams {
//!     amount: "1000".into(),
//!     merchant_code: "123456".into(),
//!     order: "ORD001".into(),
//!     callback_url: "https://shop.example/notify".into(),
//!     url_ok: "https://shop.example/ok".into(),
//!     url_ko: "https://shop.example/ko".into(),
//!     secret_key: "SECRET".into(),
//!     payment_gateway_url: "https://gateway.example/pay".into(),
//!     ..Default::default()
//! });
//! assert_eq!(form.fields.get("Ds_Merchant_Currency"), Some("978"));
//! let html = form.to_html();
//! assert!(html.contains("Ds_Merchant_Signature"));
//! ```

use serde::{Deserialize, Serialize};

pub mod errors;
pub mod fields;
pub mod notification;
pub mod payment;
pub mod remote;
pub mod signature;
pub mod webhook;

pub use errors::{response_message, ResponseCode, TefpayError};
pub use fields::FieldSet;
pub use notification::{
    classify_notification, handle_notification, validate_notification, Notification,
    NotificationEvent, NotificationOptions, NotificationPayload, NotificationStatus,
};
pub use payment::{
    build_hosted_payment_form, build_subscription_form, generate_matching_data, sanitize_email,
    terminal_for_locale, HostedPaymentForm, HostedPaymentParams, IframeEmbed, SubscriptionForm,
    SubscriptionFormParams,
};
pub use remote::{
    ManageParams, RefundParams, ServerToServerParams, SubscriptionAction, SubscriptionClient,
    UpdateParams,
};
pub use webhook::{handle_callback, verify_callback_signature, CallbackData, CallbackOutcome};

/// Common result alias for Tefpay operations.
pub type Result<T> = std::result::Result<T, TefpayError>;

/// Gateway environment a merchant account is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    Integration,
}

/// Immutable merchant configuration, passed by reference into operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TefpayConfig {
    pub merchant_code: String,
    pub secret_key: String,
    pub environment: Environment,
}

impl TefpayConfig {
    /// Create a configuration for the given environment.
    pub fn new(
        merchant_code: impl Into<String>,
        secret_key: impl Into<String>,
        environment: Environment,
    ) -> Self {
        Self {
            merchant_code: merchant_code.into(),
            secret_key: secret_key.into(),
            environment,
        }
    }

    /// Integration-environment configuration, the default for new accounts.
    pub fn integration(merchant_code: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self::new(merchant_code, secret_key, Environment::Integration)
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}
