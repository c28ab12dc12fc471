use chrono::Duration;

use crate::domain::entities::OtpRecord;
use crate::domain::value_objects::{PhoneNumber, Purpose};
use crate::services::otp::{LockoutPolicy, VerifyDecision};

use super::mocks::start_time;

fn policy() -> LockoutPolicy {
    LockoutPolicy::new(5, Duration::minutes(5))
}

fn pending() -> OtpRecord {
    OtpRecord::new(
        PhoneNumber::parse("+905551234567").unwrap(),
        Purpose::Login,
        "hash".to_string(),
        "msg".to_string(),
        start_time(),
        Duration::seconds(600),
    )
}

#[test]
fn test_correct_code_accepted() {
    let decision = policy().evaluate(&pending(), start_time(), true);
    assert_eq!(decision, VerifyDecision::Accepted);
}

#[test]
fn test_wrong_codes_count_down_then_lock() {
    let policy = policy();
    let mut record = pending();
    let now = start_time() + Duration::seconds(30);

    for expected_remaining in [4, 3, 2, 1] {
        match policy.evaluate(&record, now, false) {
            VerifyDecision::Rejected {
                record: next,
                remaining_attempts,
            } => {
                assert_eq!(remaining_attempts, expected_remaining);
                assert!(!next.locked);
                record = next;
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    match policy.evaluate(&record, now, false) {
        VerifyDecision::LockedOut {
            record,
            locked_until,
        } => {
            assert_eq!(record.attempts, 5);
            assert!(record.locked);
            assert_eq!(locked_until, now + Duration::minutes(5));
            assert_eq!(record.locked_until, Some(locked_until));
        }
        other => panic!("expected lockout, got {:?}", other),
    }
}

#[test]
fn test_attempts_never_exceed_max_before_lock() {
    let policy = policy();
    let mut record = pending();
    let now = start_time();

    loop {
        match policy.evaluate(&record, now, false) {
            VerifyDecision::Rejected { record: next, .. } => {
                assert!(next.attempts < policy.max_attempts());
                record = next;
            }
            VerifyDecision::LockedOut { record: next, .. } => {
                assert_eq!(next.attempts, policy.max_attempts());
                break;
            }
            other => panic!("unexpected decision {:?}", other),
        }
    }
}

#[test]
fn test_lock_boundary() {
    let policy = policy();
    let mut record = pending();
    record.attempts = 5;
    let locked_until = start_time() + Duration::minutes(5);
    record.lock(locked_until);

    // Just before and exactly at locked_until: still locked, correct code or not
    let just_before = locked_until - Duration::milliseconds(1);
    assert_eq!(
        policy.evaluate(&record, just_before, true),
        VerifyDecision::Locked {
            locked_until,
            remaining_seconds: 1,
        }
    );
    assert!(matches!(
        policy.evaluate(&record, locked_until, true),
        VerifyDecision::Locked { .. }
    ));

    // Just after: unlocked, attempts restart at 1
    let just_after = locked_until + Duration::milliseconds(1);
    match policy.evaluate(&record, just_after, false) {
        VerifyDecision::Rejected {
            record,
            remaining_attempts,
        } => {
            assert_eq!(record.attempts, 1);
            assert!(!record.locked);
            assert_eq!(record.locked_until, None);
            assert_eq!(remaining_attempts, 4);
        }
        other => panic!("expected rejection after unlock, got {:?}", other),
    }
    assert_eq!(
        policy.evaluate(&record, just_after, true),
        VerifyDecision::Accepted
    );
}

#[test]
fn test_remaining_lock_seconds_round_up() {
    let policy = policy();
    let mut record = pending();
    let locked_until = start_time() + Duration::minutes(5);
    record.lock(locked_until);

    let now = locked_until - Duration::milliseconds(90_500);
    match policy.evaluate(&record, now, false) {
        VerifyDecision::Locked {
            remaining_seconds, ..
        } => assert_eq!(remaining_seconds, 91),
        other => panic!("expected lock, got {:?}", other),
    }
}

#[test]
fn test_expiry_boundary() {
    let policy = policy();
    let record = pending();

    let just_before = record.expires_at - Duration::milliseconds(1);
    assert_eq!(policy.evaluate(&record, just_before, true), VerifyDecision::Accepted);
    assert!(matches!(
        policy.evaluate(&record, record.expires_at, false),
        VerifyDecision::Rejected { .. }
    ));

    let just_after = record.expires_at + Duration::milliseconds(1);
    assert_eq!(policy.evaluate(&record, just_after, true), VerifyDecision::Expired);
}

#[test]
fn test_expiry_checked_before_lock() {
    let policy = policy();
    let mut record = pending();
    record.lock(record.expires_at + Duration::minutes(5));

    let after_expiry = record.expires_at + Duration::seconds(1);
    assert_eq!(policy.evaluate(&record, after_expiry, false), VerifyDecision::Expired);
}

#[test]
fn test_evaluate_does_not_mutate_input() {
    let record = pending();
    let _ = policy().evaluate(&record, start_time(), false);
    assert_eq!(record.attempts, 0);
}
