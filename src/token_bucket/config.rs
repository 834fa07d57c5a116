//! # Rate Configuration and Validation
//!
//! The token bucket has exactly one tunable: the number of tokens generated
//! per second. This module defines its valid range and the validation applied
//! whenever the rate is set.
//!
//! ## The rate bound
//!
//! ```text
//!     time_per_token = 1_000_000_000 ns / rate
//!
//!     rate = 1              → 1 token per second
//!     rate = 1_000_000_000  → 1 token per nanosecond (MAX_RATE)
//!     rate = 0              → division by zero (rejected)
//!     rate > MAX_RATE       → time_per_token rounds to 0, every request
//!                             would be free (rejected)
//! ```
//!
//! Past `MAX_RATE` the integer division collapses to zero and the bucket
//! would stop limiting anything, so validation fails loudly instead of
//! letting that arithmetic through.

/// Nanoseconds in one second, the time base for all virtual-time arithmetic.
pub const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Maximum configurable rate in tokens per second.
///
/// At this rate a single token regenerates every nanosecond, the finest
/// granularity the clock can express. Higher values are rejected by
/// [`validate_rate`].
pub const MAX_RATE: u64 = 1_000_000_000;

/// Validates a tokens-per-second rate.
///
/// Called on construction and on every rate update, so an invalid rate can
/// never reach the consumption arithmetic.
///
/// # Errors
///
/// Returns an error message if:
/// - `rate` is 0 (would divide by zero deriving the per-token interval)
/// - `rate` exceeds [`MAX_RATE`] (per-token interval would round to zero)
///
/// # Example
///
/// ```rust
/// use nanolimit::{validate_rate, MAX_RATE};
///
/// assert!(validate_rate(100).is_ok());
/// assert!(validate_rate(0).is_err());
/// assert!(validate_rate(MAX_RATE + 1).is_err());
/// ```
pub fn validate_rate(rate: u64) -> Result<(), &'static str> {
    if rate == 0 {
        return Err("rate must be greater than 0");
    }
    if rate > MAX_RATE {
        return Err("rate must not exceed 1_000_000_000 tokens per second");
    }
    Ok(())
}
