use nanolimit::{monotonic_ns, SharedTokenBucket, TokenBucket, MAX_RATE};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_no_overrun_single_threaded() {
    let rate = 2000u64;
    let bucket = TokenBucket::new(rate);

    let start = Instant::now();
    let run = Duration::from_millis(500);
    let mut admitted = 0u64;

    while start.elapsed() < run {
        if bucket.try_consume(1) {
            admitted += 1;
        }
    }

    let elapsed_secs = start.elapsed().as_secs_f64();
    // Initial full bucket plus regeneration over the run, with slack for
    // the final in-flight request.
    let budget = rate as f64 + rate as f64 * elapsed_secs + 1.0;
    assert!(
        (admitted as f64) <= budget,
        "admitted {admitted}, budget {budget}"
    );
    // A tight loop should also have claimed nearly all of it.
    assert!(admitted as f64 >= budget * 0.8, "admitted only {admitted}");
}

#[test]
fn test_zero_consume_is_observably_free() {
    let bucket = TokenBucket::new(500);

    for _ in 0..1000 {
        assert!(bucket.try_consume(0));
    }

    // A thousand zero-token calls later, the full burst still fits.
    assert!(bucket.try_consume(500));
    assert!(!bucket.try_consume(1));
}

#[test]
fn test_idle_replenishment() {
    let rate = 300u64;
    let bucket = TokenBucket::new(rate);
    assert!(bucket.try_consume(rate));

    thread::sleep(Duration::from_millis(1100));

    // One second's worth fits; one token more never does.
    assert!(!bucket.try_consume(rate + 1));
    assert!(bucket.try_consume(rate));
}

#[test]
fn test_rate_update_after_exhaustion() {
    let bucket = TokenBucket::new(100);
    assert!(bucket.try_consume(100));
    assert!(!bucket.try_consume(1));

    bucket.set_rate(300);
    thread::sleep(Duration::from_millis(1100));

    assert!(!bucket.try_consume(301));
    assert!(bucket.try_consume(300));
    assert!(!bucket.try_consume(1));
}

#[test]
fn test_concurrent_admission_bound() {
    let rate = 20_000u64;
    let bucket: SharedTokenBucket = Arc::new(TokenBucket::new(rate));
    let run = Duration::from_secs(1);

    let mut handles = vec![];
    for _ in 0..8 {
        let bucket = bucket.clone();
        handles.push(thread::spawn(move || {
            let mut admitted = 0u64;
            let mut rejected = 0u64;
            let start = Instant::now();
            while start.elapsed() < run {
                if bucket.try_consume(1) {
                    admitted += 1;
                } else {
                    rejected += 1;
                }
            }
            (admitted, rejected)
        }));
    }

    let results: Vec<(u64, u64)> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let total_admitted: u64 = results.iter().map(|(a, _)| a).sum();
    let total_rejected: u64 = results.iter().map(|(_, r)| r).sum();

    println!("concurrent run - admitted: {total_admitted}, rejected: {total_rejected}");

    // Spinning 8 threads against 20k/s must reject heavily.
    assert!(total_rejected > 0);

    // Initial burst + one second of regeneration, with scheduling slack.
    let budget = rate * 2 + rate / 2;
    assert!(
        total_admitted <= budget,
        "admitted {total_admitted}, budget {budget}"
    );
    assert!(total_admitted >= rate, "admitted only {total_admitted}");

    // Counter consistency across all threads.
    let metrics = bucket.metrics();
    assert_eq!(metrics.total_admitted, total_admitted);
    assert_eq!(metrics.total_rejected, total_rejected);
}

#[test]
fn test_horizon_monotonic_under_contention() {
    let bucket: SharedTokenBucket = Arc::new(TokenBucket::new(MAX_RATE));

    let consumers: Vec<_> = (0..6)
        .map(|_| {
            let bucket = bucket.clone();
            thread::spawn(move || {
                for _ in 0..20_000 {
                    bucket.try_consume(100);
                }
            })
        })
        .collect();

    let mut last = 0u64;
    for _ in 0..100_000 {
        let horizon = bucket.debt_horizon_ns();
        assert!(horizon >= last, "debt horizon went backwards");
        assert!(horizon <= monotonic_ns());
        last = horizon;
    }

    for handle in consumers {
        handle.join().unwrap();
    }
}

#[test]
fn test_mixed_batch_sizes_under_contention() {
    let rate = 1_000_000u64;
    let bucket: SharedTokenBucket = Arc::new(TokenBucket::new(rate));
    let run = Duration::from_millis(300);

    let mut handles = vec![];
    for batch in [1u64, 7, 50, 400] {
        let bucket = bucket.clone();
        handles.push(thread::spawn(move || {
            let mut admitted_tokens = 0u64;
            let start = Instant::now();
            while start.elapsed() < run {
                if bucket.try_consume(batch) {
                    admitted_tokens += batch;
                }
            }
            admitted_tokens
        }));
    }

    let total: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();
    let budget = rate + rate / 2;
    assert!(total <= budget, "admitted {total} tokens, budget {budget}");

    let metrics = bucket.metrics();
    assert_eq!(metrics.total_admitted, total);
}

#[test]
fn test_rate_churn_during_traffic() {
    let bucket: SharedTokenBucket = Arc::new(TokenBucket::new(10_000));

    let updater = {
        let bucket = bucket.clone();
        thread::spawn(move || {
            for i in 0..500u64 {
                bucket.set_rate(1_000 + (i % 20) * 1_000);
                thread::sleep(Duration::from_micros(100));
            }
        })
    };

    let consumers: Vec<_> = (0..4)
        .map(|_| {
            let bucket = bucket.clone();
            thread::spawn(move || {
                let mut last = 0u64;
                for _ in 0..20_000 {
                    bucket.try_consume(1);
                    let horizon = bucket.debt_horizon_ns();
                    assert!(horizon >= last);
                    last = horizon;
                }
            })
        })
        .collect();

    updater.join().unwrap();
    for handle in consumers {
        handle.join().unwrap();
    }

    // Whatever interleaving happened, the bucket must end coherent.
    assert!(bucket.debt_horizon_ns() <= monotonic_ns());
    assert!((1_000..=20_000).contains(&bucket.rate()));
}
