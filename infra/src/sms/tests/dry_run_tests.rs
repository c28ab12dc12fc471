//! Tests for the dry-run gateway

use pv_core::errors::DomainError;
use pv_core::SmsGateway;

use crate::sms::DryRunSmsGateway;

#[tokio::test]
async fn test_dry_run_send_success() {
    let gateway = DryRunSmsGateway::new();
    let message_id = gateway
        .send_sms("905551234567", "Your verification code is 123456")
        .await
        .unwrap();

    assert!(message_id.starts_with("dry-run-"));
    assert_eq!(gateway.message_count(), 1);
    assert_eq!(gateway.provider_name(), "dry-run");
}

#[tokio::test]
async fn test_dry_run_message_ids_are_unique() {
    let gateway = DryRunSmsGateway::new();
    let first = gateway.send_sms("905551234567", "a").await.unwrap();
    let second = gateway.send_sms("905551234567", "b").await.unwrap();
    assert_ne!(first, second);
}

#[tokio::test]
async fn test_dry_run_simulated_failure() {
    let gateway = DryRunSmsGateway::failing();
    let result = gateway.send_sms("905551234567", "Test").await;

    assert!(matches!(result, Err(DomainError::Internal { .. })));
    assert_eq!(gateway.message_count(), 0);
}

#[tokio::test]
async fn test_dry_run_counter() {
    let gateway = DryRunSmsGateway::new();
    let clone = gateway.clone();

    for i in 1..=3 {
        clone.send_sms("15550001111", &format!("Message {}", i)).await.unwrap();
        assert_eq!(gateway.message_count(), i);
    }

    gateway.reset_counter();
    assert_eq!(clone.message_count(), 0);
}
