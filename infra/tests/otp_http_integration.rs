//! End-to-end flows through the HTTP gateway against a mock provider

use mockito::{Matcher, Server};
use std::sync::Arc;

use pv_core::domain::entities::{OtpRecord, RateLimitRecord};
use pv_core::repositories::InMemoryRecordStore;
use pv_core::{CodeGenerator, Purpose};
use pv_infra::bootstrap::{build_dispatcher, Dispatcher, DynOtpStore, DynRateLimitStore};
use pv_infra::sms::create_sms_gateway;
use pv_shared::config::{AppConfig, SmsConfig, SmsProvider};
use pv_shared::ErrorCode;

const PHONE: &str = "+905551234567";

struct FixedCode(&'static str);

impl CodeGenerator for FixedCode {
    fn generate(&self) -> String {
        self.0.to_string()
    }
}

fn app_config(server: &Server) -> AppConfig {
    let mut config = AppConfig::production();
    config.otp.server_secret = "integration-test-secret".to_string();
    config.sms = SmsConfig {
        provider: SmsProvider::Http,
        endpoint: format!("{}/Accounts/{{account}}/Messages.json", server.url()),
        account_id: "AC123".to_string(),
        auth_token: "token".to_string(),
        from_number: "+15550000000".to_string(),
    };
    config
}

fn dispatcher(config: &AppConfig, code: &'static str) -> Dispatcher {
    let sms = create_sms_gateway(
        &config.sms,
        std::time::Duration::from_secs(config.otp.sms_timeout_seconds),
    )
    .unwrap();
    let otp_store: Arc<DynOtpStore> = Arc::new(InMemoryRecordStore::<OtpRecord>::new());
    let rate_store: Arc<DynRateLimitStore> =
        Arc::new(InMemoryRecordStore::<RateLimitRecord>::new());
    build_dispatcher(config, sms, otp_store, rate_store)
        .unwrap()
        .with_code_generator(Arc::new(FixedCode(code)))
}

#[tokio::test]
async fn test_send_and_verify_through_provider() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/Accounts/AC123/Messages.json")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("To".into(), PHONE.into()),
            Matcher::Regex("Body=.*482913".into()),
        ]))
        .with_status(201)
        .with_body(r#"{"sid": "SM42"}"#)
        .expect(1)
        .create_async()
        .await;

    let config = app_config(&server);
    let dispatcher = dispatcher(&config, "482913");

    let sent = dispatcher.send(PHONE, Purpose::Login).await;
    assert!(sent.ok, "{:?}", sent.message);
    let data = sent.data.unwrap();
    assert_eq!(data.message_id, "SM42");
    assert_eq!(data.ttl_seconds, 600);
    mock.assert_async().await;

    let verified = dispatcher.verify(PHONE, "482913", Purpose::Login).await;
    assert!(verified.ok);
    let data = verified.data.unwrap();
    assert_eq!(data.phone_number.as_str(), PHONE);
    assert!(data.uid.as_str().starts_with("uid_"));

    // Single use
    let again = dispatcher.verify(PHONE, "482913", Purpose::Login).await;
    assert_eq!(again.code, Some(ErrorCode::OtpNotFound));
}

#[tokio::test]
async fn test_provider_failure_does_not_charge_quota() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/Accounts/AC123/Messages.json")
        .with_status(500)
        .create_async()
        .await;

    let config = app_config(&server);
    let dispatcher = dispatcher(&config, "111111");

    let response = dispatcher.send(PHONE, Purpose::Register).await;
    assert_eq!(response.code, Some(ErrorCode::SmsSendFailed));

    let status = dispatcher.rate_limit_status(PHONE).await.unwrap();
    assert_eq!(status.minute.count, 0);
    assert!(status.can_send());
    assert!(dispatcher
        .pending_status(PHONE, Purpose::Register)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_second_send_in_same_minute_is_rate_limited() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/Accounts/AC123/Messages.json")
        .with_status(201)
        .with_body(r#"{"sid": "SM1"}"#)
        .expect(1)
        .create_async()
        .await;

    let config = app_config(&server);
    let dispatcher = dispatcher(&config, "222222");

    assert!(dispatcher.send(PHONE, Purpose::Login).await.ok);
    let second = dispatcher.send(PHONE, Purpose::Login).await;
    assert_eq!(second.code, Some(ErrorCode::RateLimitMinute));
    assert!(second.retry_at.is_some());

    // The provider was only called once
    mock.assert_async().await;
}
