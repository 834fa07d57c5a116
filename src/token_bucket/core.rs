//! # Core Token Bucket Implementation
//!
//! This module implements the lock-free token bucket that the whole crate
//! exists for. Unlike a classic bucket there is no stored token count and no
//! periodic refill step: the only shared state is a single atomic nanosecond
//! timestamp, the **debt horizon**, and capacity is computed on demand from
//! the gap between that horizon and the current clock reading.
//!
//! ## The virtual-time model
//!
//! ```text
//!     time ───────────────────────────────────────────────►
//!
//!        idle_floor          debt horizon            now
//!            │                    │                   │
//!     ───────┼────────────────────┼───────────────────┼────
//!            │◄─── committed ────►│◄─── available ───►│
//!            │     (paid off      │    (now - horizon │
//!            │      by `now`)     │     worth of      │
//!            │                    │     tokens)       │
//!
//!     idle_floor = now - full_bucket_span
//!            caps credit at one second of idle accumulation
//! ```
//!
//! Consuming `n` tokens advances the horizon by `n * time_per_token`. If the
//! advanced horizon would pass `now`, the bucket lacks capacity and the
//! request is rejected without touching shared state. An idle bucket's
//! horizon is clamped up to `idle_floor` so that credit never accumulates
//! beyond one second's worth of tokens.
//!
//! ## Lock-free design
//!
//! The horizon is updated through an optimistic compare-and-swap loop:
//!
//! ```text
//!     Thread A ──┐
//!                ├──► read horizon ──► compute candidate ──► CAS
//!     Thread B ──┤                                            │
//!                │              lost the race? ◄──────────────┘
//!     Thread C ──┘              recompute from the fresh value
//! ```
//!
//! Every retry recomputes from a strictly fresher value, so some thread
//! always makes progress even though no individual thread is guaranteed to
//! win. The loop is unbounded: giving up early would turn contention into a
//! spurious "rate exceeded" answer, and `false` here means exactly one
//! thing — admitting the request now would exceed the configured rate.

use super::{
    clock::{cpu_relax, monotonic_ns, CacheAligned},
    config::{validate_rate, NANOS_PER_SEC},
    metrics::TokenBucketMetrics,
};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Number of CAS retries after which simple pauses escalate to
/// exponential backoff.
const CAS_BACKOFF_THRESHOLD: u32 = 4;

/// Number of CAS retries after which sustained contention is logged.
///
/// Purely diagnostic. The retry loop never gives up; crossing this
/// threshold only emits a warning so operators can spot hot buckets.
const CAS_CONTENTION_WARN_THRESHOLD: u32 = 64;

/// Lock-free token bucket rate limiter.
///
/// Bounds the aggregate rate at which concurrent callers consume abstract
/// tokens to a configured tokens-per-second value. All state lives in two
/// atomics — the debt horizon and the rate — so the bucket can be shared
/// across any number of threads by reference or through
/// [`SharedTokenBucket`](crate::SharedTokenBucket) without locks.
///
/// The type is deliberately not `Clone`: the horizon's address identity is
/// what concurrent operations synchronize on, and duplicating it would fork
/// the bucket's state. Share it, don't copy it.
///
/// ## Semantics
///
/// - [`try_consume`](Self::try_consume) never blocks. It returns `true` when
///   the tokens were reserved and `false` when admitting the request now
///   would exceed the configured rate; the caller decides whether to drop,
///   queue, or retry.
/// - A bucket starts full and accumulates at most one second of idle
///   credit, so a burst of up to `rate` tokens is always admissible after
///   sufficient idle time.
/// - [`set_rate`](Self::set_rate) takes effect immediately for subsequent
///   calls; consumes already in flight may complete with the previous rate.
///
/// ## Example
///
/// ```rust
/// use nanolimit::TokenBucket;
/// use std::sync::Arc;
/// use std::thread;
///
/// let bucket = Arc::new(TokenBucket::new(1000));
///
/// let mut handles = vec![];
/// for _ in 0..4 {
///     let bucket = bucket.clone();
///     handles.push(thread::spawn(move || {
///         if bucket.try_consume(10) {
///             // admitted: do 10 units of work
///         }
///     }));
/// }
/// for handle in handles {
///     handle.join().unwrap();
/// }
/// ```
#[repr(C)]
pub struct TokenBucket {
    // Hot path: every consuming thread CASes this field. Cache-aligned so
    // the colder fields below never share its line.
    /// Debt horizon in epoch-anchored nanoseconds. The earliest instant at
    /// which all previously committed tokens are conceptually regenerated.
    debt_ns: CacheAligned<AtomicU64>,

    /// Configured rate in tokens per second. Relaxed load/store keeps rate
    /// updates race-free against in-flight consumes without tying them to
    /// the horizon protocol.
    rate: AtomicU64,

    // Observability counters, off the CAS-protected state.
    /// Total tokens successfully admitted.
    total_admitted: AtomicU64,

    /// Total consume calls rejected for lack of capacity.
    total_rejected: AtomicU64,
}

impl TokenBucket {
    /// Creates a new token bucket generating `rate` tokens per second.
    ///
    /// The bucket starts full: an immediate burst of up to `rate` tokens
    /// is admitted before sustained limiting kicks in.
    ///
    /// # Panics
    ///
    /// Panics if `rate` is 0 or exceeds [`MAX_RATE`](crate::MAX_RATE).
    /// Use [`try_new`](Self::try_new) to handle invalid rates as errors.
    ///
    /// # Example
    ///
    /// ```rust
    /// use nanolimit::TokenBucket;
    ///
    /// // 500 tokens per second
    /// let bucket = TokenBucket::new(500);
    /// assert!(bucket.try_consume(1));
    /// ```
    pub fn new(rate: u64) -> Self {
        Self::try_new(rate).expect("Invalid token bucket rate")
    }

    /// Creates a new token bucket, returning an error for an invalid rate.
    ///
    /// # Errors
    ///
    /// Returns an error message if `rate` is 0 or exceeds
    /// [`MAX_RATE`](crate::MAX_RATE).
    ///
    /// # Example
    ///
    /// ```rust
    /// use nanolimit::TokenBucket;
    ///
    /// assert!(TokenBucket::try_new(100).is_ok());
    /// assert!(TokenBucket::try_new(0).is_err());
    /// ```
    pub fn try_new(rate: u64) -> Result<Self, &'static str> {
        validate_rate(rate)?;

        // Horizon starts at 0, far below any epoch-anchored `now`, so the
        // idle-floor clamp treats the bucket as full from the first call.
        Ok(Self {
            debt_ns: CacheAligned::new(AtomicU64::new(0)),
            rate: AtomicU64::new(rate),
            total_admitted: AtomicU64::new(0),
            total_rejected: AtomicU64::new(0),
        })
    }

    /// Replaces the configured rate.
    ///
    /// Takes effect for subsequent [`try_consume`](Self::try_consume) calls
    /// without interrupting ones already in flight, which may complete using
    /// the previous rate. The store is atomic, so a torn value is never
    /// observed.
    ///
    /// # Panics
    ///
    /// Panics if `rate` is invalid. Use
    /// [`try_set_rate`](Self::try_set_rate) for the fallible version.
    ///
    /// # Example
    ///
    /// ```rust
    /// use nanolimit::TokenBucket;
    ///
    /// let bucket = TokenBucket::new(100);
    /// bucket.set_rate(250);
    /// assert_eq!(bucket.rate(), 250);
    /// ```
    pub fn set_rate(&self, rate: u64) {
        self.try_set_rate(rate).expect("Invalid token bucket rate");
    }

    /// Replaces the configured rate, returning an error for an invalid one.
    ///
    /// # Errors
    ///
    /// Returns an error message if `rate` is 0 or exceeds
    /// [`MAX_RATE`](crate::MAX_RATE); the previous rate stays in effect.
    pub fn try_set_rate(&self, rate: u64) -> Result<(), &'static str> {
        validate_rate(rate)?;

        let previous = self.rate.swap(rate, Ordering::Relaxed);
        if previous != rate {
            debug!(previous, rate, "token bucket rate changed");
        }
        Ok(())
    }

    /// Attempts to reserve `tokens` units of capacity.
    ///
    /// All-or-nothing and non-blocking: either the full amount is admitted
    /// and the debt horizon advances, or nothing changes and `false` comes
    /// back immediately. `false` means exactly "admitting this now would
    /// exceed the configured rate, try again later".
    ///
    /// Requesting 0 tokens always succeeds without touching any state.
    /// Requesting more than one second's worth (`tokens > rate`) can never
    /// succeed, since credit is capped at one second of idle accumulation.
    ///
    /// ## How it works
    ///
    /// ```text
    ///     try_consume(n):
    ///
    ///     now ──► snapshot rate ──► time_needed = n * (1s / rate)
    ///                                    │
    ///           ┌────────── CAS loop ────▼──────────┐
    ///           │ effective = max(horizon, idle_floor)
    ///           │ candidate = effective + time_needed
    ///           │ candidate > now ? ── yes ──► ❌ false
    ///           │        │ no
    ///           │        ▼
    ///           │ CAS(horizon, candidate) ── lost ──► retry
    ///           └────────│───────────────────────────┘
    ///                    ▼
    ///                ✅ true
    ///     ```
    ///
    /// # Returns
    ///
    /// - `true` if all `tokens` were reserved
    /// - `false` if the rate limit would be exceeded (nothing reserved)
    ///
    /// # Example
    ///
    /// ```rust
    /// use nanolimit::TokenBucket;
    ///
    /// let bucket = TokenBucket::new(100);
    ///
    /// assert!(bucket.try_consume(100)); // initial burst
    /// assert!(!bucket.try_consume(1)); // drained, rejected immediately
    /// assert!(bucket.try_consume(0)); // zero is always free
    /// ```
    #[inline]
    pub fn try_consume(&self, tokens: u64) -> bool {
        // Degenerate case: admitted unconditionally, observably stateless.
        if tokens == 0 {
            return true;
        }

        let now = monotonic_ns();
        let rate = self.rate.load(Ordering::Relaxed);

        // Validated rate is in [1, 1e9], so the division is safe and the
        // per-token interval is at least 1ns.
        let time_per_token = NANOS_PER_SEC / rate;
        // Recomputed from the rounded division rather than taken as exactly
        // one second, so the span and per-token cost stay consistent.
        let full_bucket_span = rate * time_per_token;
        let time_needed = tokens.saturating_mul(time_per_token);
        let idle_floor = now.saturating_sub(full_bucket_span);

        let mut observed = self.debt_ns.0.load(Ordering::Relaxed);
        let mut retries: u32 = 0;

        loop {
            // A long-idle bucket is treated as exactly full, never fuller.
            let effective = observed.max(idle_floor);

            let candidate = effective.saturating_add(time_needed);
            if candidate > now {
                self.total_rejected.fetch_add(1, Ordering::Relaxed);
                return false;
            }

            match self.debt_ns.0.compare_exchange_weak(
                observed,
                candidate,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    self.total_admitted.fetch_add(tokens, Ordering::Relaxed);
                    return true;
                }
                Err(actual) => {
                    observed = actual;
                    retries += 1;

                    if retries == CAS_CONTENTION_WARN_THRESHOLD {
                        warn!(retries, "token bucket under heavy CAS contention");
                    }

                    if retries > CAS_BACKOFF_THRESHOLD {
                        // Exponential backoff: 2, 4, 8, 16 pauses, capped.
                        for _ in 0..(1u32 << (retries - CAS_BACKOFF_THRESHOLD).min(4)) {
                            cpu_relax();
                        }
                    } else {
                        cpu_relax();
                    }
                }
            }
        }
    }

    /// Returns the currently configured rate in tokens per second.
    #[inline]
    pub fn rate(&self) -> u64 {
        self.rate.load(Ordering::Relaxed)
    }

    /// Returns the number of tokens currently available, derived from the
    /// gap between the debt horizon and the clock.
    ///
    /// Purely computed; calling it never changes bucket state. The value is
    /// a snapshot and may be stale by the time it is acted on.
    ///
    /// # Example
    ///
    /// ```rust
    /// use nanolimit::TokenBucket;
    ///
    /// let bucket = TokenBucket::new(100);
    /// assert_eq!(bucket.available_tokens(), 100);
    ///
    /// bucket.try_consume(40);
    /// assert!(bucket.available_tokens() <= 60);
    /// ```
    pub fn available_tokens(&self) -> u64 {
        let now = monotonic_ns();
        let rate = self.rate.load(Ordering::Relaxed);

        let time_per_token = NANOS_PER_SEC / rate;
        let full_bucket_span = rate * time_per_token;
        let idle_floor = now.saturating_sub(full_bucket_span);

        let effective = self.debt_ns.0.load(Ordering::Relaxed).max(idle_floor);
        (now.saturating_sub(effective) / time_per_token).min(rate)
    }

    /// Returns the raw debt horizon in epoch-anchored nanoseconds.
    ///
    /// The horizon is monotonically non-decreasing across the bucket's
    /// lifetime; consumers of this accessor (primarily tests and
    /// diagnostics) can rely on successive snapshots never going backwards.
    #[inline]
    pub fn debt_horizon_ns(&self) -> u64 {
        self.debt_ns.0.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of the bucket's counters and derived state.
    ///
    /// # Example
    ///
    /// ```rust
    /// use nanolimit::TokenBucket;
    ///
    /// let bucket = TokenBucket::new(10);
    /// bucket.try_consume(10);
    /// bucket.try_consume(5);
    ///
    /// let metrics = bucket.metrics();
    /// assert_eq!(metrics.total_admitted, 10);
    /// assert_eq!(metrics.total_rejected, 1);
    /// ```
    pub fn metrics(&self) -> TokenBucketMetrics {
        TokenBucketMetrics {
            total_admitted: self.total_admitted.load(Ordering::Relaxed),
            total_rejected: self.total_rejected.load(Ordering::Relaxed),
            rate: self.rate(),
            available_tokens: self.available_tokens(),
            debt_horizon_ns: self.debt_horizon_ns(),
        }
    }
}

impl std::fmt::Debug for TokenBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenBucket")
            .field("rate", &self.rate())
            .field("debt_horizon_ns", &self.debt_horizon_ns())
            .field("available_tokens", &self.available_tokens())
            .finish()
    }
}
