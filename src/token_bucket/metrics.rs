//! Counter snapshots for observing token bucket behavior.
//!
//! The bucket keeps two relaxed atomic counters off its CAS-protected
//! state — tokens admitted and calls rejected — and this module packages
//! them, together with the live rate and fill level, into a plain snapshot
//! struct for logging, dashboards, and tests.

use std::fmt;

/// Point-in-time snapshot of a token bucket's counters and derived state.
///
/// Produced by [`TokenBucket::metrics`](crate::TokenBucket::metrics). The
/// fields are sampled individually with relaxed ordering, so under heavy
/// concurrency the snapshot is approximate rather than a single coherent
/// instant — fine for the monitoring it exists for.
///
/// # Example
///
/// ```rust
/// use nanolimit::TokenBucket;
///
/// let bucket = TokenBucket::new(100);
/// bucket.try_consume(80);
/// bucket.try_consume(80); // rejected
///
/// let metrics = bucket.metrics();
/// assert_eq!(metrics.total_admitted, 80);
/// assert_eq!(metrics.total_rejected, 1);
/// println!("{metrics}");
/// ```
#[derive(Debug, Clone)]
pub struct TokenBucketMetrics {
    /// Total tokens admitted over the bucket's lifetime.
    pub total_admitted: u64,

    /// Total consume calls rejected for lack of capacity.
    ///
    /// Counts calls, not tokens: one failed `try_consume(50)` adds 1.
    pub total_rejected: u64,

    /// Rate configured at snapshot time, in tokens per second.
    pub rate: u64,

    /// Tokens available at snapshot time, derived from the debt horizon.
    pub available_tokens: u64,

    /// Raw debt horizon at snapshot time, in epoch-anchored nanoseconds.
    pub debt_horizon_ns: u64,
}

impl TokenBucketMetrics {
    /// Fraction of consume calls that were admitted, in `0.0..=1.0`.
    ///
    /// Admissions are counted in tokens and rejections in calls, so this
    /// treats each admitted batch as one call-equivalent only when
    /// comparing against rejections of any size; it is a coarse health
    /// signal, not an exact ratio.
    #[inline]
    pub fn success_rate(&self) -> f64 {
        let total = self.total_admitted + self.total_rejected;
        if total == 0 {
            // No traffic yet.
            1.0
        } else {
            self.total_admitted as f64 / total as f64
        }
    }

    /// Inverse of [`success_rate`](Self::success_rate).
    #[inline]
    pub fn rejection_rate(&self) -> f64 {
        1.0 - self.success_rate()
    }

    /// Fraction of the one-second credit currently available, in
    /// `0.0..=1.0`.
    #[inline]
    pub fn fill_ratio(&self) -> f64 {
        if self.rate == 0 {
            0.0
        } else {
            (self.available_tokens as f64 / self.rate as f64).min(1.0)
        }
    }
}

impl fmt::Display for TokenBucketMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TokenBucket: {}/{} tokens available ({:.1}% full), \
             {} admitted, {} rejected ({:.2}% success)",
            self.available_tokens,
            self.rate,
            self.fill_ratio() * 100.0,
            self.total_admitted,
            self.total_rejected,
            self.success_rate() * 100.0,
        )
    }
}
