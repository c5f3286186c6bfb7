//! # Outbound Form Builders
//!
//! The gateway accepts transactions as browser form POSTs of hidden
//! `Ds_Merchant_*` fields. This module assembles those field sets for the
//! two outbound flows:
//!
//! - **Hosted one-time payment** — a self-submitting form targeting the
//!   payment page ([`build_hosted_payment_form`]).
//! - **Subscription creation** — a form plus the gateway's iframe loader
//!   script ([`build_subscription_form`]).
//!
//! Both are pure functions of their parameters: they compute the flow's
//! signature, resolve defaults against caller overrides (an explicit empty
//! string wins over the default; only an absent value falls back) and
//! return the fields in the canonical order. No network I/O happens here.

use chrono::Utc;
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

use crate::fields::FieldSet;
use crate::signature::{sign_payment_request, sign_subscription_creation};

/// Matching data length mandated by the gateway.
const MATCHING_DATA_LEN: usize = 21;

/// DOM ids the gateway's iframe script expects to find.
const SUBSCRIPTION_FORM_ID: &str = "tefpayData";
const SUBSCRIPTION_CONTAINER_ID: &str = "tefpayBox";

/// Parameters for a hosted one-time payment form.
///
/// Optional fields override the documented defaults; `Some(String::new())`
/// is a real override, `None` falls back. `extra` carries pass-through
/// pairs keyed by canonical `Ds_` names, which may also override any
/// default.
#[derive(Debug, Clone, Default)]
pub struct HostedPaymentParams {
    pub amount: String,
    pub merchant_code: String,
    pub order: String,
    pub callback_url: String,
    pub url_ok: String,
    pub url_ko: String,
    pub secret_key: String,
    pub payment_gateway_url: String,
    /// ISO 4217 numeric code, default "978" (EUR).
    pub currency: Option<String>,
    /// Default "201" (hosted payment).
    pub transaction_type: Option<String>,
    /// Default "00000001".
    pub terminal: Option<String>,
    pub additional_data: Option<String>,
    pub matching_data: Option<String>,
    pub template_number: Option<String>,
    pub merchant_template: Option<String>,
    pub merchant_data: Option<String>,
    /// Default "es".
    pub locale: Option<String>,
    /// Defaults to the computed payment-request signature.
    pub merchant_signature: Option<String>,
    pub extra: Vec<(String, String)>,
}

/// A hosted payment form ready for rendering: the gateway action URL plus
/// the ordered hidden fields.
#[derive(Debug, Clone, Serialize)]
pub struct HostedPaymentForm {
    pub action_url: String,
    pub fields: FieldSet,
}

impl HostedPaymentForm {
    /// Render as a self-submitting HTML POST form. Attribute values are
    /// HTML-escaped; the noscript submit covers script-disabled browsers.
    pub fn to_html(&self) -> String {
        let inputs: Vec<String> = self
            .fields
            .iter()
            .map(|(name, value)| {
                format!(
                    r#"<input type="hidden" name="{}" value="{}" />"#,
                    escape_attr(name),
                    escape_attr(value)
                )
            })
            .collect();
        format!(
            "<form id=\"tefpay-payment-form\" action=\"{}\" method=\"POST\">\n{}\n<noscript><input type=\"submit\" value=\"Pagar\" /></noscript>\n</form>\n<script>document.getElementById('tefpay-payment-form').submit();</script>",
            escape_attr(&self.action_url),
            inputs.join("\n")
        )
    }
}

/// Build the hidden-field set for a hosted one-time payment.
///
/// Signs with the payment-request recipe (amount, merchant code, order,
/// callback URL, secret key) and assembles the canonical field order.
pub fn build_hosted_payment_form(params: &HostedPaymentParams) -> HostedPaymentForm {
    let signature = sign_payment_request(
        &params.amount,
        &params.merchant_code,
        &params.order,
        &params.callback_url,
        &params.secret_key,
    );
    let defaults: Vec<(&str, String)> = vec![
        ("Ds_Merchant_Amount", params.amount.clone()),
        ("Ds_Merchant_Currency", or_default(&params.currency, "978")),
        ("Ds_Merchant_MerchantCode", params.merchant_code.clone()),
        ("Ds_Merchant_Order", params.order.clone()),
        (
            "Ds_Merchant_TransactionType",
            or_default(&params.transaction_type, "201"),
        ),
        ("Ds_Merchant_Url", params.callback_url.clone()),
        ("Ds_Merchant_UrlOK", params.url_ok.clone()),
        ("Ds_Merchant_UrlKO", params.url_ko.clone()),
        ("Ds_Merchant_Signature", signature.clone()),
        (
            "Ds_Merchant_Terminal",
            or_default(&params.terminal, "00000001"),
        ),
        (
            "Ds_Merchant_AdditionalData",
            or_default(&params.additional_data, ""),
        ),
        (
            "Ds_Merchant_MatchingData",
            or_default(&params.matching_data, ""),
        ),
        (
            "Ds_Merchant_TemplateNumber",
            or_default(&params.template_number, ""),
        ),
        (
            "Ds_Merchant_MerchantCodeTemplate",
            or_default(&params.merchant_template, ""),
        ),
        (
            "Ds_Merchant_MerchantData",
            or_default(&params.merchant_data, ""),
        ),
        ("Ds_Merchant_Lang", or_default(&params.locale, "es")),
        (
            "Ds_Merchant_MerchantSignature",
            params.merchant_signature.clone().unwrap_or(signature),
        ),
    ];
    HostedPaymentForm {
        action_url: params.payment_gateway_url.clone(),
        fields: FieldSet::from_defaults(&defaults, &params.extra),
    }
}

/// Parameters for a subscription-creation form.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionFormParams {
    pub merchant_code: String,
    pub merchant_shared_key: String,
    pub merchant_template: String,
    pub payment_gateway_url: String,
    pub iframe_script_url: String,
    pub iframe_configure_url: String,
    /// First charge, in gateway minor units.
    pub trial_amount: String,
    /// Recurring charge, in gateway minor units.
    pub subscription_amount: String,
    pub notify_url: String,
    pub url_ok: String,
    pub url_ko: String,
    /// Also selects the terminal unless `terminal` is supplied.
    pub locale: String,
    pub user_name: String,
    pub user_email: String,
    /// Default "07".
    pub template_number: Option<String>,
    /// Default "1".
    pub additional_data: Option<String>,
    pub terminal: Option<String>,
    pub terminal_auth: Option<String>,
    /// Correlation id; generated from the current timestamp when absent.
    pub matching_data: Option<String>,
    /// Defaults to the matching data.
    pub subscription_account: Option<String>,
    pub subscription_description: Option<String>,
    pub payment_description: Option<String>,
    pub extra: Vec<(String, String)>,
}

/// Description of the iframe embed the subscription form relies on. The
/// URLs and element ids are referenced only; script loading is up to the
/// rendering context.
#[derive(Debug, Clone, Serialize)]
pub struct IframeEmbed {
    pub script_url: String,
    pub configure_url: String,
    pub form_id: &'static str,
    pub container_id: &'static str,
}

/// A subscription-creation form: ordered hidden fields plus the iframe
/// embed description.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionForm {
    pub fields: FieldSet,
    pub iframe: IframeEmbed,
}

impl SubscriptionForm {
    /// Value of `Ds_Merchant_MatchingData`, the correlation id that must be
    /// reused verbatim in later server-to-server calls.
    pub fn matching_data(&self) -> &str {
        self.fields.get("Ds_Merchant_MatchingData").unwrap_or("")
    }

    /// Render the form, the iframe container div and the loader script.
    pub fn to_html(&self) -> String {
        let inputs: Vec<String> = self
            .fields
            .iter()
            .map(|(name, value)| {
                format!(
                    "<input type='hidden' name='{}' value='{}' />",
                    escape_attr(name),
                    escape_attr(value)
                )
            })
            .collect();
        [
            format!(
                "<form id='{}' role='form' autoComplete='true'>",
                self.iframe.form_id
            ),
            inputs.join("\n"),
            format!("<div id='{}'></div>", self.iframe.container_id),
            "</form>".to_string(),
            format!(
                "<script src='{}' async onload=\"if(window.TefpayIframe && TefpayIframe.init()){{TefpayIframe.configure('{}', '100%');TefpayIframe.load();}}\"></script>",
                escape_attr(&self.iframe.script_url),
                escape_attr(&self.iframe.configure_url)
            ),
        ]
        .join("\n")
    }
}

/// Build the hidden-field set for creating a subscription.
///
/// Derives the matching data when absent, signs with the
/// subscription-creation recipe, resolves the terminal from the locale and
/// sanitizes the client email (the gateway rejects non-ASCII there).
pub fn build_subscription_form(params: &SubscriptionFormParams) -> SubscriptionForm {
    let matching_data = params
        .matching_data
        .clone()
        .unwrap_or_else(generate_matching_data);
    let signature = sign_subscription_creation(
        &params.trial_amount,
        &params.merchant_code,
        &matching_data,
        &params.notify_url,
        &params.merchant_shared_key,
    );
    let terminal = params
        .terminal
        .clone()
        .unwrap_or_else(|| terminal_for_locale(&params.locale).to_string());
    let terminal_auth = params.terminal_auth.clone().unwrap_or_else(|| terminal.clone());
    let payment_description = params
        .payment_description
        .clone()
        .unwrap_or_else(|| format!("NUEVO PAGO EN - /{} ", params.locale));
    let subscription_description = params
        .subscription_description
        .clone()
        .unwrap_or_else(|| format!("NUEVA SUSCRIPCION EN - /{} ", params.locale));
    let account = params
        .subscription_account
        .clone()
        .unwrap_or_else(|| matching_data.clone());

    let defaults: Vec<(&str, String)> = vec![
        ("Ds_Merchant_TransactionType", "6".to_string()),
        ("Ds_Merchant_Subscription_ProcessingMethod", "201".to_string()),
        ("Ds_Merchant_Subscription_Action", "C".to_string()),
        ("Ds_Merchant_Currency", "978".to_string()),
        ("Ds_Merchant_Amount", params.trial_amount.clone()),
        (
            "Ds_Merchant_Subscription_ChargeAmount",
            params.subscription_amount.clone(),
        ),
        ("Ds_Merchant_Subscription_RelFirstCharge", "02D".to_string()),
        ("Ds_Merchant_Subscription_PeriodType", "M".to_string()),
        ("Ds_Merchant_Subscription_PeriodInterval", "1".to_string()),
        ("Ds_Merchant_Terminal", terminal),
        ("Ds_Merchant_TerminalAuth", terminal_auth),
        ("Ds_Merchant_Subscription_Iteration", "0".to_string()),
        ("Ds_Merchant_Url", params.notify_url.clone()),
        ("Ds_Merchant_UrlOK", params.url_ok.clone()),
        ("Ds_Merchant_UrlKO", params.url_ko.clone()),
        ("Ds_Merchant_MerchantCode", params.merchant_code.clone()),
        (
            "Ds_Merchant_MerchantCodeTemplate",
            params.merchant_template.clone(),
        ),
        (
            "Ds_Merchant_TemplateNumber",
            or_default(&params.template_number, "07"),
        ),
        (
            "Ds_Merchant_AdditionalData",
            or_default(&params.additional_data, "1"),
        ),
        ("Ds_Merchant_MatchingData", matching_data),
        ("Ds_Merchant_MerchantSignature", signature),
        ("Ds_Merchant_Subscription_Account", account),
        (
            "Ds_Merchant_Subscription_ClientName",
            params.user_name.clone(),
        ),
        (
            "Ds_Merchant_Subscription_ClientEmail",
            sanitize_email(&params.user_email),
        ),
        (
            "Ds_Merchant_Subscription_Description",
            subscription_description,
        ),
        ("Ds_Merchant_Description", payment_description),
        (
            "Ds_Merchant_Subscription_NotifyCostumerByEmail",
            "0".to_string(),
        ),
        ("Ds_Merchant_Lang", params.locale.clone()),
        ("Ds_Merchant_Subscription_Enable", "1".to_string()),
    ];
    SubscriptionForm {
        fields: FieldSet::from_defaults(&defaults, &params.extra),
        iframe: IframeEmbed {
            script_url: params.iframe_script_url.clone(),
            configure_url: params.iframe_configure_url.clone(),
            form_id: SUBSCRIPTION_FORM_ID,
            container_id: SUBSCRIPTION_CONTAINER_ID,
        },
    }
}

/// Generate a timestamp-derived matching data value: UTC timestamp digits
/// (`YYYYMMDDHHMMSSmmm`) right-padded with zeros to 21 characters.
pub fn generate_matching_data() -> String {
    let digits = Utc::now().format("%Y%m%d%H%M%S%3f").to_string();
    format!("{:0<width$}", digits, width = MATCHING_DATA_LEN)
}

/// Terminal assigned to each storefront locale. Unmapped locales fall back
/// to the Spanish terminal.
pub fn terminal_for_locale(locale: &str) -> &'static str {
    match locale {
        "es" => "00000001",
        "it" => "00000002",
        "fr" => "00000003",
        "sv" => "00000004",
        "de" => "00000005",
        _ => "00000001",
    }
}

/// Strip the client email down to the ASCII subset the gateway accepts:
/// NFD-decomposes the input, drops combining marks, maps the Spanish/Latin
/// accented set to unaccented equivalents and removes all whitespace.
/// Idempotent on already-clean input.
pub fn sanitize_email(raw: &str) -> String {
    raw.nfd()
        .filter_map(|c| match c {
            '\u{0300}'..='\u{036f}' => None,
            c if c.is_whitespace() => None,
            'Á' | 'À' => Some('A'),
            'É' | 'È' => Some('E'),
            'Í' | 'Ì' => Some('I'),
            'Ó' | 'Ò' => Some('O'),
            'Ú' | 'Ù' | 'Ü' => Some('U'),
            'Ñ' => Some('N'),
            'á' | 'à' => Some('a'),
            'é' | 'è' => Some('e'),
            'í' | 'ì' => Some('i'),
            'ó' | 'ò' => Some('o'),
            'ú' | 'ù' | 'ü' => Some('u'),
            'ñ' => Some('n'),
            other => Some(other),
        })
        .collect()
}

fn or_default(value: &Option<String>, default: &str) -> String {
    value.clone().unwrap_or_else(|| default.to_string())
}

fn escape_attr(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
