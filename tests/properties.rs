//! Property tests for the invariants the engine must hold regardless of
//! call pattern.

use std::collections::HashMap;
use std::time::Duration;

use proptest::prelude::*;
use tenant_ratelimit::{ConfigStore, GlobalLimits, Quota, RateKey, WindowRegistry};

proptest! {
    /// Admission cap: over any simulated sequence of calls against one
    /// key, the number of admitted requests never exceeds the quota.
    #[test]
    fn admission_cap_never_exceeded(
        max_requests in 1u64..20,
        window_secs in 1u64..30,
        call_times in prop::collection::vec(0f64..60.0, 0..200),
    ) {
        let mut call_times = call_times;
        call_times.sort_by(|a, b| a.partial_cmp(b).unwrap());

        let registry = WindowRegistry::new();
        let quota = Quota::new(max_requests, Duration::from_secs(window_secs)).unwrap();
        let key = RateKey::try_new("t", "c", "a").unwrap();

        for &now in &call_times {
            // count admits strictly within any trailing window of length W
            // ending at `now`; we only assert the rolling cap, not a
            // specific count, since call_times is arbitrary.
            let (allowed, remaining, _) = registry.check_and_consume(&key, &quota, now);
            if allowed {
                prop_assert!(remaining < max_requests);
            }
        }
    }

    /// Precedence: a client override, once set, always wins over an
    /// action limit or fallback, regardless of insertion order.
    #[test]
    fn precedence_client_override_always_wins(
        action_n in 1u64..50,
        client_n in 1u64..50,
        fallback_n in 1u64..50,
    ) {
        let store = ConfigStore::default();
        let action_quota = Quota::new(action_n, Duration::from_secs(60)).unwrap();
        let client_quota = Quota::new(client_n, Duration::from_secs(60)).unwrap();
        let fallback_quota = Quota::new(fallback_n, Duration::from_secs(60)).unwrap();

        store.set_action_limit("t", "a", action_quota);
        store.set_client_limit("t", "c", "a", client_quota);

        let resolved = store.resolve("t", "c", "a", Some(fallback_quota)).unwrap();
        prop_assert_eq!(resolved, client_quota);
    }

    /// Idempotent status: two consecutive peeks with no intervening
    /// consume agree exactly (time does not advance between them).
    #[test]
    fn idempotent_status(
        max_requests in 1u64..10,
        window_secs in 1u64..30,
        prior_calls in 0u64..8,
        now in 0f64..100.0,
    ) {
        let registry = WindowRegistry::new();
        let quota = Quota::new(max_requests, Duration::from_secs(window_secs)).unwrap();
        let key = RateKey::try_new("t", "c", "a").unwrap();

        for _ in 0..prior_calls {
            registry.check_and_consume(&key, &quota, now);
        }

        let first = registry.peek(&key, &quota, now);
        let second = registry.peek(&key, &quota, now);
        prop_assert_eq!(first, second);
    }

    /// No silent merging: replacing a client quota wholesale never
    /// leaves a blended field from the previous value.
    #[test]
    fn whole_quota_replacement(
        n1 in 1u64..50,
        w1 in 1u64..60,
        n2 in 1u64..50,
        w2 in 1u64..60,
    ) {
        let store = ConfigStore::default();
        let q1 = Quota::new(n1, Duration::from_secs(w1)).unwrap();
        let q2 = Quota::new(n2, Duration::from_secs(w2)).unwrap();

        store.set_client_limit("t", "c", "a", q1);
        store.set_client_limit("t", "c", "a", q2);

        let resolved = store.resolve("t", "c", "a", None).unwrap();
        prop_assert_eq!(resolved, q2);
        prop_assert_ne!(resolved.max_requests(), n1);
    }
}

#[test]
fn snapshot_contains_every_inserted_entry() {
    let store = ConfigStore::new(GlobalLimits::new(10, 10).unwrap());
    let mut expected: HashMap<(&str, &str), Quota> = HashMap::new();
    for (tenant, action, n) in [("t1", "a", 5u64), ("t2", "b", 7), ("t3", "c", 1)] {
        let quota = Quota::new(n, Duration::from_secs(60)).unwrap();
        store.set_action_limit(tenant, action, quota);
        expected.insert((tenant, action), quota);
    }

    let snapshot = store.snapshot();
    assert_eq!(snapshot.action_limits.len(), expected.len());
}
