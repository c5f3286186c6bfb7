//! # Remote Subscription Management
//!
//! Server-to-server calls against the gateway's management API:
//! subscription lifecycle actions (create, suspend, reactivate, cancel,
//! update) and refunds. Requests are signed, urlencoded POSTs; the gateway
//! answers with XML this layer deliberately does not parse.
//!
//! Failure semantics: the raw response body is returned for any HTTP status
//! (the gateway encodes success and failure inside the XML itself). Only
//! connection-level failures (DNS, refused, timeout) surface as
//! [`TefpayError::Transport`]. No retries.

use std::time::Duration;

use crate::errors::TefpayError;
use crate::fields::FieldSet;
use crate::signature::{sign_refund, sign_subscription_action};
use crate::Result;

/// Default request timeout; the gateway documents no SLA.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Transaction type code for server-to-server refunds.
const REFUND_TRANSACTION_TYPE: &str = "4";

/// Subscription lifecycle action codes defined by the management API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionAction {
    Create,
    Suspend,
    Reactivate,
    Cancel,
    Update,
}

impl SubscriptionAction {
    /// Wire code sent as `Ds_Merchant_Subscription_Action`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Create => "C",
            Self::Suspend => "S",
            Self::Reactivate => "R",
            Self::Cancel => "B",
            Self::Update => "X",
        }
    }
}

/// Parameters for a subscription management call.
#[derive(Debug, Clone)]
pub struct ManageParams {
    /// Subscription account; for subscriptions created through the form
    /// builder this is the matching data, byte-for-byte.
    pub account: String,
    pub action: SubscriptionAction,
    pub merchant_code: String,
    pub secret_key: String,
    /// Absolute management API endpoint.
    pub url: String,
    pub extra: Vec<(String, String)>,
}

/// Parameters for an update (`X`) call.
#[derive(Debug, Clone, Default)]
pub struct UpdateParams {
    pub account: String,
    pub merchant_code: String,
    pub secret_key: String,
    pub url: String,
    pub charge_amount: Option<String>,
    pub charge_date: Option<String>,
    pub email: Option<String>,
}

/// Parameters for a generic server-to-server transaction.
#[derive(Debug, Clone, Default)]
pub struct ServerToServerParams {
    pub transaction_type: String,
    pub matching_data: String,
    pub date: String,
    pub pan_mask: String,
    pub merchant_code: String,
    pub amount: String,
    /// Precomputed `Ds_Merchant_MerchantSignature`.
    pub signature: String,
    pub url: String,
    pub extra: Vec<(String, String)>,
}

/// Parameters for a refund of a previous transaction.
#[derive(Debug, Clone, Default)]
pub struct RefundParams {
    pub matching_data: String,
    pub date: String,
    pub pan_mask: String,
    pub merchant_code: String,
    pub amount: String,
    pub secret_key: String,
    pub url: String,
}

/// HTTP client for the gateway's server-to-server API.
pub struct SubscriptionClient {
    http: reqwest::Client,
}

impl SubscriptionClient {
    /// Create a client with the default timeout.
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| TefpayError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http })
    }

    /// Wrap a preconfigured `reqwest::Client` (custom timeout, proxy, ...).
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Perform a subscription management action and return the raw XML
    /// response body.
    pub async fn manage(&self, params: &ManageParams) -> Result<String> {
        let fields = manage_fields(params);
        self.post_form(&params.url, &fields).await
    }

    /// Register a subscription account (`C`).
    pub async fn create(
        &self,
        account: &str,
        merchant_code: &str,
        secret_key: &str,
        url: &str,
    ) -> Result<String> {
        self.manage(&lifecycle_params(
            SubscriptionAction::Create,
            account,
            merchant_code,
            secret_key,
            url,
        ))
        .await
    }

    /// Suspend charging without cancelling (`S`).
    pub async fn suspend(
        &self,
        account: &str,
        merchant_code: &str,
        secret_key: &str,
        url: &str,
    ) -> Result<String> {
        self.manage(&lifecycle_params(
            SubscriptionAction::Suspend,
            account,
            merchant_code,
            secret_key,
            url,
        ))
        .await
    }

    /// Resume a suspended subscription (`R`).
    pub async fn reactivate(
        &self,
        account: &str,
        merchant_code: &str,
        secret_key: &str,
        url: &str,
    ) -> Result<String> {
        self.manage(&lifecycle_params(
            SubscriptionAction::Reactivate,
            account,
            merchant_code,
            secret_key,
            url,
        ))
        .await
    }

    /// Cancel definitively (`B`).
    pub async fn cancel(
        &self,
        account: &str,
        merchant_code: &str,
        secret_key: &str,
        url: &str,
    ) -> Result<String> {
        self.manage(&lifecycle_params(
            SubscriptionAction::Cancel,
            account,
            merchant_code,
            secret_key,
            url,
        ))
        .await
    }

    /// Update charge amount, next charge date and/or notification email
    /// (`X`). Unset fields travel as empty strings, which the gateway
    /// treats as "leave unchanged".
    pub async fn update(&self, params: &UpdateParams) -> Result<String> {
        self.manage(&ManageParams {
            account: params.account.clone(),
            action: SubscriptionAction::Update,
            merchant_code: params.merchant_code.clone(),
            secret_key: params.secret_key.clone(),
            url: params.url.clone(),
            extra: vec![
                (
                    "Ds_Merchant_Subscription_ChargeAmount".to_string(),
                    params.charge_amount.clone().unwrap_or_default(),
                ),
                (
                    "Ds_Merchant_Subscription_ChargeDate".to_string(),
                    params.charge_date.clone().unwrap_or_default(),
                ),
                (
                    "Ds_Merchant_Subscription_Email".to_string(),
                    params.email.clone().unwrap_or_default(),
                ),
            ],
        })
        .await
    }

    /// Post a generic server-to-server transaction (recurring charge,
    /// confirmation, refund) with a caller-supplied signature.
    pub async fn server_to_server(&self, params: &ServerToServerParams) -> Result<String> {
        let fields = server_to_server_fields(params);
        self.post_form(&params.url, &fields).await
    }

    /// Refund a previous transaction: computes the refund signature and
    /// posts transaction type `"4"`.
    pub async fn refund(&self, params: &RefundParams) -> Result<String> {
        let signature = sign_refund(
            &params.amount,
            &params.merchant_code,
            &params.matching_data,
            &params.url,
            &params.secret_key,
        );
        self.server_to_server(&ServerToServerParams {
            transaction_type: REFUND_TRANSACTION_TYPE.to_string(),
            matching_data: params.matching_data.clone(),
            date: params.date.clone(),
            pan_mask: params.pan_mask.clone(),
            merchant_code: params.merchant_code.clone(),
            amount: params.amount.clone(),
            signature,
            url: params.url.clone(),
            extra: Vec::new(),
        })
        .await
    }

    /// POST urlencoded fields and hand back the body text whatever the
    /// status code; the XML inside encodes the actual outcome.
    async fn post_form(&self, url: &str, fields: &FieldSet) -> Result<String> {
        tracing::debug!("posting {} fields to {}", fields.len(), url);
        let response = self
            .http
            .post(url)
            .form(fields.as_pairs())
            .send()
            .await
            .map_err(TefpayError::from)?;
        let status = response.status();
        let body = response.text().await.map_err(TefpayError::from)?;
        if !status.is_success() {
            tracing::warn!("gateway answered {} ({} byte body)", status, body.len());
        }
        Ok(body)
    }
}

fn lifecycle_params(
    action: SubscriptionAction,
    account: &str,
    merchant_code: &str,
    secret_key: &str,
    url: &str,
) -> ManageParams {
    ManageParams {
        account: account.to_string(),
        action,
        merchant_code: merchant_code.to_string(),
        secret_key: secret_key.to_string(),
        url: url.to_string(),
        extra: Vec::new(),
    }
}

fn manage_fields(params: &ManageParams) -> FieldSet {
    let signature = sign_subscription_action(
        &params.account,
        params.action.code(),
        &params.merchant_code,
        &params.secret_key,
    );
    // Extras that collide with a base field replace its value instead of
    // producing a duplicate urlencoded key.
    let defaults: Vec<(&str, String)> = vec![
        ("Ds_Merchant_Subscription_Account", params.account.clone()),
        (
            "Ds_Merchant_Subscription_Action",
            params.action.code().to_string(),
        ),
        ("Ds_Merchant_MerchantCode", params.merchant_code.clone()),
        ("Ds_Signature", signature),
    ];
    FieldSet::from_defaults(&defaults, &params.extra)
}

fn server_to_server_fields(params: &ServerToServerParams) -> FieldSet {
    let defaults: Vec<(&str, String)> = vec![
        (
            "Ds_Merchant_TransactionType",
            params.transaction_type.clone(),
        ),
        ("Ds_Merchant_MatchingData", params.matching_data.clone()),
        ("Ds_Date", params.date.clone()),
        ("Ds_Merchant_PanMask", params.pan_mask.clone()),
        ("Ds_Merchant_MerchantCode", params.merchant_code.clone()),
        ("Ds_Merchant_Amount", params.amount.clone()),
        ("Ds_Merchant_MerchantSignature", params.signature.clone()),
    ];
    FieldSet::from_defaults(&defaults, &params.extra)
}
