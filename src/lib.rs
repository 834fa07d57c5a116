//! # Nanolimit - Lock-Free Virtual-Time Token Bucket
//!
//! A single concurrency primitive: a rate limiter that bounds the aggregate
//! rate at which many independent callers consume an abstract resource
//! ("tokens") to a configurable number of units per second. It is meant to
//! be embedded inside larger systems — network servers, schedulers, job
//! runners — as a building block: it owns no I/O, no configuration loading,
//! and no lifecycle beyond its own in-memory state.
//!
//! ## No token counter, no refill step
//!
//! Most token buckets store a count and top it up periodically. This one
//! stores a single atomic timestamp instead — the **debt horizon**, the
//! earliest instant at which every token committed so far is conceptually
//! regenerated — and derives the fill level on demand from the gap between
//! that horizon and the clock:
//!
//! ```text
//!     Classic bucket:                 Virtual-time bucket:
//!
//!     tokens: 37  ◄── refill timer    debt horizon: t₀  ◄── nothing
//!        │            must run             │
//!        ▼                                 ▼
//!     acquire = decrement             consume(n) = advance horizon by
//!                                     n × (1s / rate), reject if it
//!                                     would pass `now`
//! ```
//!
//! Consuming is a classic optimistic compare-and-swap loop: read the
//! horizon, clamp it up to the idle floor (an idle bucket is at most one
//! second's worth of tokens full), add the time this request costs, and
//! swap — retrying from the fresh value when another thread wins the race.
//! The loop is lock-free: system-wide progress is guaranteed even though no
//! individual caller is.
//!
//! ## Quick start
//!
//! ```rust
//! use nanolimit::TokenBucket;
//!
//! // 100 tokens per second; the bucket starts full.
//! let bucket = TokenBucket::new(100);
//!
//! if bucket.try_consume(1) {
//!     // admitted - do the work
//! } else {
//!     // rate limited - drop, queue, or retry later
//! }
//!
//! // The rate can be changed at any time, mid-traffic.
//! bucket.set_rate(250);
//! ```
//!
//! ## Semantics at a glance
//!
//! | Call | Behavior |
//! |------|----------|
//! | `try_consume(0)` | Always `true`, no state change |
//! | `try_consume(n)` | All-or-nothing, never blocks |
//! | `try_consume(n > rate)` | Always `false` (credit caps at 1s worth) |
//! | `set_rate(r)` | Immediate for new calls; in-flight ones may use the old rate |
//!
//! `false` means exactly one thing: admitting the request *now* would
//! exceed the configured rate. What to do about it — reject, queue, delay,
//! drop — is the embedding system's policy, not this crate's.
//!
//! ## Thread safety
//!
//! [`TokenBucket`] is `Sync`; share it by reference or via
//! [`SharedTokenBucket`] (`Arc`). It is deliberately not `Clone` — the
//! atomic state's address identity is what concurrent callers synchronize
//! on, so the bucket must not be duplicated while operations are in flight.
//!
//! There are no fairness guarantees among contending callers: under
//! sustained contention any individual caller's retry may lose arbitrarily
//! often, though each retry observes a strictly fresher horizon.
//!
//! ## Safety
//!
//! This crate uses `unsafe` only for the x86_64 PAUSE instruction in the
//! spin-loop hint.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    missing_debug_implementations
)]
#![forbid(unsafe_op_in_unsafe_fn)]

// Internal module
mod token_bucket;

// Public re-exports
pub use token_bucket::{
    cpu_relax, monotonic_ns, validate_rate, TokenBucket, TokenBucketMetrics, MAX_RATE,
    NANOS_PER_SEC,
};

/// A token bucket wrapped in `Arc` for convenient thread-safe sharing.
///
/// # Example
/// ```rust
/// use nanolimit::{SharedTokenBucket, TokenBucket};
/// use std::sync::Arc;
///
/// let bucket: SharedTokenBucket = Arc::new(TokenBucket::new(100));
///
/// let clone = bucket.clone();
/// std::thread::spawn(move || {
///     clone.try_consume(1);
/// });
/// ```
pub type SharedTokenBucket = std::sync::Arc<TokenBucket>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Minimum supported Rust version.
///
/// This crate requires at least Rust 1.70.0 for `OnceLock` and stable
/// 64-bit atomics.
pub const MSRV: &str = "1.70.0";

/// Prelude module for convenient imports.
///
/// ```rust
/// use nanolimit::prelude::*;
///
/// let bucket = TokenBucket::new(100);
/// assert!(bucket.try_consume(1));
/// ```
pub mod prelude {
    //! Common imports for typical rate limiting use cases.

    pub use crate::{SharedTokenBucket, TokenBucket, TokenBucketMetrics, MAX_RATE};
}
