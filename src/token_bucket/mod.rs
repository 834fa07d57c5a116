//! # Token Bucket Module
//!
//! Internal implementation of the virtual-time token bucket, organized into
//! submodules by responsibility.
//!
//! ## Module Structure
//!
//! ```text
//!     token_bucket/
//!     ├── mod.rs          (You are here - module organization)
//!     ├── config.rs       (Rate bounds and validation)
//!     ├── core.rs         (The lock-free debt-horizon algorithm)
//!     ├── metrics.rs      (Counter snapshots)
//!     └── clock.rs        (Monotonic clock, spin hints, cache alignment)
//! ```
//!
//! ## How the pieces fit
//!
//! ```text
//!     try_consume(n)
//!          │
//!          ▼
//!     ┌─────────┐
//!     │  core   │ ◄── CAS retry loop over the debt horizon
//!     └────┬────┘
//!          ├────────────► config  (rate validated before it gets here)
//!          └────────────► clock   (monotonic_ns, cpu_relax)
//! ```
//!
//! - **config**: the one tunable (tokens/sec), its bounds, its validation
//! - **core**: the whole algorithm — everything else is support code
//! - **metrics**: admitted/rejected counters packaged for observability
//! - **clock**: epoch-anchored monotonic nanoseconds and CPU spin hints

mod clock;
mod config;
mod core;
mod metrics;

// Re-export public types for external use

/// Rate bounds and validation
pub use config::{validate_rate, MAX_RATE, NANOS_PER_SEC};

/// The lock-free token bucket itself
pub use self::core::TokenBucket;

/// Counter snapshots for observability
pub use metrics::TokenBucketMetrics;

/// Clock and CPU utilities the bucket is built on
pub use clock::{cpu_relax, monotonic_ns};
