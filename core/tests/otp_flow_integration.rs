//! Integration tests for the OTP send / verify flow

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    use pv_core::domain::entities::{OtpKey, OtpRecord, RateLimitRecord};
    use pv_core::domain::value_objects::{PhoneNumber, Purpose};
    use pv_core::errors::{DomainResult, OtpError};
    use pv_core::repositories::{InMemoryRecordStore, RecordStore};
    use pv_core::services::otp::{derive_uid, derive_uid_raw, ManualClock, OtpDispatcher, SmsGateway};
    use pv_shared::{ErrorCode, OtpConfig, RateLimitConfig};

    const PHONE: &str = "+905551234567";

    // Records messages so tests can read the delivered code
    #[derive(Default)]
    struct RecordingGateway {
        messages: Mutex<Vec<String>>,
    }

    impl RecordingGateway {
        fn last_code(&self) -> String {
            let messages = self.messages.lock().unwrap();
            let message = messages.last().expect("no message sent");
            message
                .split(|c: char| !c.is_ascii_digit())
                .find(|part| part.len() == 6)
                .expect("no code in message")
                .to_string()
        }
    }

    #[async_trait]
    impl SmsGateway for RecordingGateway {
        async fn send_sms(&self, _phone_digits: &str, message: &str) -> DomainResult<String> {
            let mut messages = self.messages.lock().unwrap();
            messages.push(message.to_string());
            Ok(format!("SM{:032}", messages.len()))
        }

        fn provider_name(&self) -> &str {
            "recording"
        }
    }

    type Dispatcher = OtpDispatcher<
        RecordingGateway,
        InMemoryRecordStore<OtpRecord>,
        InMemoryRecordStore<RateLimitRecord>,
    >;

    struct Env {
        dispatcher: Dispatcher,
        gateway: Arc<RecordingGateway>,
        otp_store: Arc<InMemoryRecordStore<OtpRecord>>,
        clock: Arc<ManualClock>,
    }

    fn env(config: OtpConfig) -> Env {
        let gateway = Arc::new(RecordingGateway::default());
        let otp_store = Arc::new(InMemoryRecordStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 5, 4, 8, 30, 0).unwrap(),
        ));
        let dispatcher = OtpDispatcher::new(
            Arc::clone(&gateway),
            Arc::clone(&otp_store),
            Arc::new(InMemoryRecordStore::new()),
            config,
            RateLimitConfig::default(),
        )
        .unwrap()
        .with_clock(clock.clone());

        Env {
            dispatcher,
            gateway,
            otp_store,
            clock,
        }
    }

    fn composite_key(phone: &str, purpose: Purpose) -> String {
        let phone = PhoneNumber::parse(phone).unwrap();
        OtpKey::composite(&derive_uid(&phone), &phone, purpose).to_string()
    }

    #[tokio::test]
    async fn test_dry_run_send_persists_hashed_code() {
        let mut config = OtpConfig::with_secret("integration-secret");
        config.dry_run = true;
        let env = env(config);

        let response = env.dispatcher.send(PHONE, Purpose::Login).await;
        assert!(response.ok);
        let data = response.into_data().unwrap();
        assert_eq!(data.ttl_seconds, 600);
        assert!(data.message_id.starts_with("dry-run-"));

        let stored = env
            .otp_store
            .get(&composite_key(PHONE, Purpose::Login))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.value.hash.len(), 64);
        assert_eq!(stored.value.attempts, 0);
        assert_eq!(stored.value.expires_at, data.expires_at);
    }

    #[tokio::test]
    async fn test_full_round_trip_with_gateway() {
        let env = env(OtpConfig::with_secret("integration-secret"));
        env.dispatcher.try_send(PHONE, Purpose::Register).await.unwrap();

        let code = env.gateway.last_code();
        let stored = env
            .otp_store
            .get(&composite_key(PHONE, Purpose::Register))
            .await
            .unwrap()
            .unwrap();
        assert!(!stored.value.hash.contains(&code));

        let response = env.dispatcher.verify(PHONE, &code, Purpose::Register).await;
        assert!(response.ok);

        let response = env.dispatcher.verify(PHONE, &code, Purpose::Register).await;
        assert_eq!(response.code, Some(ErrorCode::OtpNotFound));
    }

    #[tokio::test]
    async fn test_five_wrong_codes_lock_the_record() {
        let env = env(OtpConfig::with_secret("integration-secret"));
        env.dispatcher.try_send(PHONE, Purpose::Login).await.unwrap();
        let code = env.gateway.last_code();
        let wrong = if code == "999999" { "100000" } else { "999999" };

        let mut remaining = Vec::new();
        for _ in 0..4 {
            let response = env.dispatcher.verify(PHONE, wrong, Purpose::Login).await;
            assert_eq!(response.code, Some(ErrorCode::InvalidOtp));
            remaining.push(response.remaining_attempts.unwrap());
        }
        assert_eq!(remaining, vec![4, 3, 2, 1]);

        let response = env.dispatcher.verify(PHONE, wrong, Purpose::Login).await;
        assert_eq!(response.code, Some(ErrorCode::MaxAttemptsExceeded));
        assert!(response.retry_at.is_some());

        let response = env.dispatcher.verify(PHONE, &code, Purpose::Login).await;
        assert_eq!(response.code, Some(ErrorCode::OtpLocked));
        assert_eq!(response.remaining_seconds, Some(300));

        env.clock.advance(Duration::seconds(301));
        let response = env.dispatcher.verify(PHONE, &code, Purpose::Login).await;
        assert!(response.ok);
    }

    #[tokio::test]
    async fn test_rate_limit_windows() {
        let env = env(OtpConfig::with_secret("integration-secret"));
        env.dispatcher.try_send(PHONE, Purpose::Login).await.unwrap();

        env.clock.advance(Duration::seconds(59));
        let err = env.dispatcher.try_send(PHONE, Purpose::Login).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::RateLimitMinute);

        // Minute resets, hour ceiling (3) still applies
        env.clock.advance(Duration::seconds(2));
        env.dispatcher.try_send(PHONE, Purpose::Login).await.unwrap();
        env.clock.advance(Duration::seconds(61));
        env.dispatcher.try_send(PHONE, Purpose::Login).await.unwrap();
        env.clock.advance(Duration::seconds(61));
        let err = env.dispatcher.try_send(PHONE, Purpose::Login).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::RateLimitHour);

        // Another phone is unaffected
        env.dispatcher
            .try_send("+14155552671", Purpose::Login)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_expiry_boundary() {
        let env = env(OtpConfig::with_secret("integration-secret"));
        env.dispatcher.try_send(PHONE, Purpose::Login).await.unwrap();
        let code = env.gateway.last_code();

        env.clock.advance(Duration::seconds(600));
        assert!(env.dispatcher.pending_status(PHONE, Purpose::Login).await.unwrap().is_some());

        env.clock.advance(Duration::milliseconds(1));
        match env.dispatcher.try_verify(PHONE, &code, Purpose::Login).await {
            Err(OtpError::Expired) => {}
            other => panic!("expected expiry, got {:?}", other),
        }
        assert!(env.otp_store.is_empty().await);
    }

    #[test]
    fn test_derived_uid_stable_and_distinct() {
        let first = derive_uid_raw("+905551234567").unwrap();
        assert_eq!(first, derive_uid_raw("+90 555 123 4567").unwrap());
        assert!(first.as_str().starts_with("uid_"));

        let uids: HashSet<String> = (0..5000u64)
            .map(|n| derive_uid_raw(&format!("+1415{:07}", n)).unwrap().to_string())
            .collect();
        assert_eq!(uids.len(), 5000);
    }
}
