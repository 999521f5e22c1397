//! Worker-side usage specs
//!
//! Model a queue consumer guarding throttled work: derive the semaphore
//! key from the resource and its limit, hold a slot only while working,
//! and re-enqueue instead of blocking a worker when the resource is full.

use crate::prelude::*;
use gate_core::{scoped_key, RedispatchPolicy, RetryDecision};

/// Acquire, run the work, and always release — success or failure.
async fn run_guarded<F>(sem: &mut SpecSemaphore, work: F) -> Result<(), String>
where
    F: FnOnce() -> Result<(), String>,
{
    if !sem.acquire(Duration::from_millis(200)).await {
        return Err("no slot within budget".to_string());
    }
    let outcome = work();
    sem.release().await;
    outcome
}

#[test]
fn scoped_key_embeds_the_limit() {
    assert_eq!(scoped_key("deploy", 3), "deploy:3");
    // Same resource with a different limit is a different semaphore
    assert_ne!(scoped_key("deploy", 3), scoped_key("deploy", 5));
}

#[tokio::test]
async fn slot_is_released_after_successful_work() {
    for kind in KINDS {
        let (factory, _, _) = fixture(kind);
        let key = scoped_key("deploy", 1);
        let mut sem = factory.create(&key, 1, TTL).unwrap();

        assert!(run_guarded(&mut sem, || Ok(())).await.is_ok(), "{kind}");
        assert_eq!(sem.current_count().await, 0, "{kind}: slot returned");
    }
}

#[tokio::test]
async fn slot_is_released_when_work_fails() {
    for kind in KINDS {
        let (factory, _, _) = fixture(kind);
        let key = scoped_key("deploy", 1);
        let mut sem = factory.create(&key, 1, TTL).unwrap();

        let result = run_guarded(&mut sem, || Err("boom".to_string())).await;
        assert_eq!(result, Err("boom".to_string()), "{kind}");
        assert_eq!(sem.current_count().await, 0, "{kind}: slot returned");
    }
}

#[test]
fn redispatch_delays_follow_the_schedule() {
    let policy = RedispatchPolicy::default();

    assert_eq!(
        policy.decide(1),
        RetryDecision::Redispatch {
            next_attempt: 2,
            delay: Duration::from_secs(2)
        }
    );
    assert_eq!(
        policy.decide(2),
        RetryDecision::Redispatch {
            next_attempt: 3,
            delay: Duration::from_secs(5)
        }
    );
    assert_eq!(
        policy.decide(3),
        RetryDecision::Redispatch {
            next_attempt: 4,
            delay: Duration::from_secs(10)
        }
    );
    // Past the schedule the fallback applies
    assert_eq!(
        policy.decide(4),
        RetryDecision::Redispatch {
            next_attempt: 5,
            delay: Duration::from_secs(2)
        }
    );
}

#[test]
fn redispatch_gives_up_at_the_attempt_cap() {
    let policy = RedispatchPolicy::default();
    assert_eq!(policy.decide(9), RetryDecision::GiveUp);
    assert_eq!(policy.decide(10), RetryDecision::GiveUp);
}

#[tokio::test]
async fn full_resource_redispatches_until_a_slot_frees() {
    let (factory, _, _) = fixture(BackendKind::SortedSet);
    let key = scoped_key("deploy", 1);
    let mut holder = factory.create(&key, 1, TTL).unwrap();
    assert!(holder.try_acquire().await);

    let policy = RedispatchPolicy::default();
    let mut consumer = factory.create(&key, 1, TTL).unwrap();
    let mut attempt = 1;
    let mut delays = Vec::new();

    // Simulated queue loop: each dispatch makes one non-blocking attempt,
    // then asks the policy what to do. The holder finishes during the
    // third wait.
    let acquired = loop {
        if consumer.try_acquire().await {
            break true;
        }
        match policy.decide(attempt) {
            RetryDecision::Redispatch { next_attempt, delay } => {
                delays.push(delay);
                attempt = next_attempt;
                if attempt == 4 {
                    assert!(holder.release().await);
                }
            }
            RetryDecision::GiveUp => break false,
        }
    };

    assert!(acquired);
    assert_eq!(attempt, 4);
    assert_eq!(
        delays,
        vec![
            Duration::from_secs(2),
            Duration::from_secs(5),
            Duration::from_secs(10)
        ]
    );
}

#[tokio::test]
async fn exhausted_redispatches_report_terminal_failure() {
    let (factory, _, _) = fixture(BackendKind::SortedSet);
    let key = scoped_key("deploy", 1);
    let mut holder = factory.create(&key, 1, TTL).unwrap();
    assert!(holder.try_acquire().await);

    let policy = RedispatchPolicy::default();
    let mut consumer = factory.create(&key, 1, TTL).unwrap();
    let mut attempt = 1;
    let mut redispatches = 0;

    let acquired = loop {
        if consumer.try_acquire().await {
            break true;
        }
        match policy.decide(attempt) {
            RetryDecision::Redispatch { next_attempt, .. } => {
                redispatches += 1;
                attempt = next_attempt;
            }
            RetryDecision::GiveUp => break false,
        }
    };

    assert!(!acquired);
    assert_eq!(redispatches, 8, "attempts 1 through 8 redispatch, 9 gives up");
    assert!(holder.is_acquired_by_me().await, "holder was never evicted");
}
