//! Basic facade usage: global defaults, an action override, and a
//! client-specific override, all resolved through one entry point.
//!
//! Run with:
//! ```
//! cargo run --example facade_demo
//! ```

use std::time::Duration;

use tenant_ratelimit::{GlobalLimits, Quota, RateLimiter};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let limiter = RateLimiter::new(GlobalLimits::new(64, 32).unwrap());

    limiter
        .config()
        .set_action_limit("acme", "send_message", Quota::new(10, Duration::from_secs(60)).unwrap());
    limiter.config().set_client_limit(
        "acme",
        "free-tier-user",
        "send_message",
        Quota::new(2, Duration::from_secs(60)).unwrap(),
    );

    println!("=== Tenant Rate Limiter Demo ===\n");

    for i in 1..=3 {
        let verdict = limiter
            .check_and_consume("acme", "free-tier-user", "send_message", None)
            .await
            .unwrap();
        println!("free-tier-user request {i}: {verdict:?}");
    }

    for i in 1..=3 {
        let verdict = limiter
            .check_and_consume("acme", "paid-user", "send_message", None)
            .await
            .unwrap();
        println!("paid-user request {i}: {verdict:?}");
    }

    let (remaining, reset_at) = limiter
        .status("acme", "free-tier-user", "send_message", None)
        .unwrap();
    println!("\nfree-tier-user status: remaining={remaining}, reset_at={reset_at:.3}");

    limiter.shutdown();
}
