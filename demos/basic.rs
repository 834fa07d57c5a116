//! Basic usage example for the nanolimit crate.

use core::time::Duration;
use nanolimit::TokenBucket;
use std::thread;

fn main() {
    println!("=== Token Bucket Example ===\n");

    // Example 1: Simple consumption
    simple_example();

    println!("{}", "\n".to_owned() + "=".repeat(50).as_str() + "\n");

    // Example 2: Batch consumption
    batch_example();

    println!("{}", "\n".to_owned() + "=".repeat(50).as_str() + "\n");

    // Example 3: Replenishment over time
    replenishment_example();

    println!("{}", "\n".to_owned() + "=".repeat(50).as_str() + "\n");

    // Example 4: Changing the rate mid-flight
    rate_update_example();
}

fn simple_example() {
    println!("1. Simple Consumption:");

    // 10 tokens per second; the bucket starts with one second's worth.
    let bucket = TokenBucket::new(10);
    println!("   Created bucket at 10 tokens/second");

    let mut admitted = 0;
    let mut rejected = 0;

    for i in 1..=15 {
        if bucket.try_consume(1) {
            admitted += 1;
            println!("   Request {} - ✅ Admitted", i);
        } else {
            rejected += 1;
            println!("   Request {} - ❌ Rate limited", i);
        }
    }

    println!("   Results: {} admitted, {} rate limited", admitted, rejected);
}

fn batch_example() {
    println!("2. Batch Consumption:");

    let bucket = TokenBucket::new(50);
    println!("   Available tokens: {}", bucket.available_tokens());

    if bucket.try_consume(10) {
        println!("   ✅ Consumed 10 tokens at once");
    }
    println!("   Remaining tokens: {}", bucket.available_tokens());

    // All-or-nothing: an oversized batch takes nothing.
    if !bucket.try_consume(50) {
        println!(
            "   ❌ Cannot consume 50 tokens (only {} available)",
            bucket.available_tokens()
        );
    }

    let metrics = bucket.metrics();
    println!("   {}", metrics);
}

fn replenishment_example() {
    println!("3. Replenishment Over Time:");

    let bucket = TokenBucket::new(5);
    println!("   Configuration: 5 tokens/second");

    for i in 1..=5 {
        if bucket.try_consume(1) {
            println!("   Token {} consumed", i);
        }
    }

    if !bucket.try_consume(1) {
        println!("   ❌ Bucket drained, nothing available immediately");
    }

    println!("   Waiting 1 second...");
    thread::sleep(Duration::from_secs(1));

    println!("   Available after waiting: {}", bucket.available_tokens());
    if bucket.try_consume(5) {
        println!("   ✅ Full second's worth admitted again");
    }
}

fn rate_update_example() {
    println!("4. Rate Update Mid-Flight:");

    let bucket = TokenBucket::new(100);
    bucket.try_consume(100);
    println!("   Drained a 100/second bucket");

    bucket.set_rate(500);
    println!("   Rate raised to 500 tokens/second");

    thread::sleep(Duration::from_secs(1));

    if bucket.try_consume(500) {
        println!("   ✅ Bucket replenished at the new rate");
    }

    let metrics = bucket.metrics();
    println!("   Total admitted: {}", metrics.total_admitted);
    println!("   Total rejected: {}", metrics.total_rejected);
}
