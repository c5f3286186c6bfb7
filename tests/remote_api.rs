//! Wire-level tests of the subscription management client against a mock
//! gateway.

use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tefpay::signature::digest;
use tefpay::{
    build_subscription_form, RefundParams, SubscriptionClient, SubscriptionFormParams,
    UpdateParams,
};

const XML_OK: &str = "<tefpay><result>OK</result></tefpay>";

/// Mount a gateway mock that only matches POSTs whose urlencoded body
/// contains every expected substring.
async fn mock_gateway(expected_body_parts: Vec<String>) -> MockServer {
    let server = MockServer::start().await;
    let mut mock = Mock::given(method("POST"))
        .and(path("/api"))
        .and(header("content-type", "application/x-www-form-urlencoded"));
    for part in expected_body_parts {
        mock = mock.and(body_string_contains(part));
    }
    mock.respond_with(ResponseTemplate::new(200).set_body_string(XML_OK))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn suspend_posts_signed_action() {
    let expected_signature = digest(&["SUBS001", "S", "123456", "CLAVE"]);
    let server = mock_gateway(vec![
        "Ds_Merchant_Subscription_Account=SUBS001".to_string(),
        "Ds_Merchant_Subscription_Action=S".to_string(),
        "Ds_Merchant_MerchantCode=123456".to_string(),
        format!("Ds_Signature={expected_signature}"),
    ])
    .await;

    let client = SubscriptionClient::new().unwrap();
    let body = client
        .suspend("SUBS001", "123456", "CLAVE", &format!("{}/api", server.uri()))
        .await
        .unwrap();
    assert_eq!(body, XML_OK);
}

#[tokio::test]
async fn lifecycle_actions_use_their_codes() {
    for (action_code, call) in [("C", 0), ("R", 1), ("B", 2)] {
        let server = mock_gateway(vec![format!(
            "Ds_Merchant_Subscription_Action={action_code}"
        )])
        .await;
        let client = SubscriptionClient::new().unwrap();
        let url = format!("{}/api", server.uri());
        let body = match call {
            0 => client.create("ACC", "123456", "CLAVE", &url).await,
            1 => client.reactivate("ACC", "123456", "CLAVE", &url).await,
            _ => client.cancel("ACC", "123456", "CLAVE", &url).await,
        }
        .unwrap();
        assert_eq!(body, XML_OK);
    }
}

#[tokio::test]
async fn update_carries_charge_overrides() {
    let server = mock_gateway(vec![
        "Ds_Merchant_Subscription_Action=X".to_string(),
        "Ds_Merchant_Subscription_ChargeAmount=5000".to_string(),
        "Ds_Merchant_Subscription_ChargeDate=20260901".to_string(),
        // Unset email travels as an empty value.
        "Ds_Merchant_Subscription_Email=".to_string(),
    ])
    .await;

    let client = SubscriptionClient::new().unwrap();
    let body = client
        .update(&UpdateParams {
            account: "SUBS001".to_string(),
            merchant_code: "123456".to_string(),
            secret_key: "CLAVE".to_string(),
            url: format!("{}/api", server.uri()),
            charge_amount: Some("5000".to_string()),
            charge_date: Some("20260901".to_string()),
            email: None,
        })
        .await
        .unwrap();
    assert_eq!(body, XML_OK);
}

#[tokio::test]
async fn refund_posts_type_four_with_refund_signature() {
    let server = MockServer::start().await;
    let url = format!("{}/api", server.uri());
    let expected_signature = digest(&["1000", "123456", "MATCH0000000000000000", url.as_str(), "CLAVE"]);
    Mock::given(method("POST"))
        .and(path("/api"))
        .and(body_string_contains("Ds_Merchant_TransactionType=4"))
        .and(body_string_contains("Ds_Merchant_MatchingData=MATCH0000000000000000"))
        .and(body_string_contains("Ds_Merchant_Amount=1000"))
        .and(body_string_contains(format!(
            "Ds_Merchant_MerchantSignature={expected_signature}"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_string(XML_OK))
        .mount(&server)
        .await;

    let client = SubscriptionClient::new().unwrap();
    let body = client
        .refund(&RefundParams {
            matching_data: "MATCH0000000000000000".to_string(),
            date: "20250917".to_string(),
            pan_mask: "454881XXXXXX0004".to_string(),
            merchant_code: "123456".to_string(),
            amount: "1000".to_string(),
            secret_key: "CLAVE".to_string(),
            url,
        })
        .await
        .unwrap();
    assert_eq!(body, XML_OK);
}

#[tokio::test]
async fn matching_data_is_stable_across_form_and_refund() {
    // The correlation id minted at form-build time must reach the gateway
    // byte-for-byte in later server-to-server calls.
    let form = build_subscription_form(&SubscriptionFormParams {
        merchant_code: "123456".to_string(),
        merchant_shared_key: "CLAVE".to_string(),
        merchant_template: "TPL".to_string(),
        payment_gateway_url: "https://gateway.example/pay".to_string(),
        iframe_script_url: "https://gateway.example/iframe.js".to_string(),
        iframe_configure_url: "https://gateway.example/configure".to_string(),
        trial_amount: "1000".to_string(),
        subscription_amount: "5000".to_string(),
        notify_url: "https://shop.example/notify".to_string(),
        url_ok: "https://shop.example/ok".to_string(),
        url_ko: "https://shop.example/ko".to_string(),
        locale: "es".to_string(),
        user_name: "Juan".to_string(),
        user_email: "juan@example.com".to_string(),
        ..Default::default()
    });
    let matching_data = form.matching_data().to_string();
    assert_eq!(matching_data.len(), 21);

    let server = mock_gateway(vec![format!(
        "Ds_Merchant_MatchingData={matching_data}"
    )])
    .await;

    let client = SubscriptionClient::new().unwrap();
    let body = client
        .refund(&RefundParams {
            matching_data,
            date: "20250917".to_string(),
            pan_mask: "454881XXXXXX0004".to_string(),
            merchant_code: "123456".to_string(),
            amount: "1000".to_string(),
            secret_key: "CLAVE".to_string(),
            url: format!("{}/api", server.uri()),
        })
        .await
        .unwrap();
    assert_eq!(body, XML_OK);
}

#[tokio::test]
async fn gateway_error_status_still_returns_raw_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_string("<tefpay><error>internal</error></tefpay>"),
        )
        .mount(&server)
        .await;

    let client = SubscriptionClient::new().unwrap();
    let body = client
        .cancel("ACC", "123456", "CLAVE", &format!("{}/api", server.uri()))
        .await
        .unwrap();
    assert_eq!(body, "<tefpay><error>internal</error></tefpay>");
}

#[tokio::test]
async fn connection_failure_surfaces_as_transport_error() {
    // Nothing listens on this port.
    let client = SubscriptionClient::new().unwrap();
    let err = client
        .cancel("ACC", "123456", "CLAVE", "http://127.0.0.1:1/api")
        .await
        .unwrap_err();
    assert!(matches!(err, tefpay::TefpayError::Transport(_)));
}
