//! # Clock and CPU Utilities
//!
//! Timing and platform helpers that back the token bucket's virtual-time
//! arithmetic. The bucket never stores a token count; everything is derived
//! from nanosecond timestamps, so the clock here is the foundation the whole
//! algorithm rests on.
//!
//! ## Why an epoch-anchored monotonic clock?
//!
//! ```text
//!     Wall clock (SystemTime):        Monotonic clock (Instant):
//!     ├─ Meaningful absolute value    ├─ Never jumps backwards
//!     └─ Can jump (NTP, manual set)   └─ No meaningful absolute value
//!
//!     monotonic_ns() = wall-clock base captured once at first use,
//!                      advanced by a monotonic Instant from then on.
//! ```
//!
//! The debt horizon starts at zero, so `now` must be large enough that a
//! fresh bucket sits far past its idle floor and behaves as full. Anchoring
//! at the UNIX epoch gives that for free while keeping every subsequent
//! reading monotonic.

use std::sync::OnceLock;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Cache line size for x86_64 processors (Intel/AMD).
#[cfg(target_arch = "x86_64")]
pub(crate) const CACHE_LINE_SIZE: usize = 64;

/// Cache line size for ARM64 processors, which commonly prefetch in
/// 128-byte pairs.
#[cfg(target_arch = "aarch64")]
pub(crate) const CACHE_LINE_SIZE: usize = 128;

/// Default cache line size assumed on other architectures.
#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
pub(crate) const CACHE_LINE_SIZE: usize = 64;

// Captured once on first use: (monotonic start, wall-clock ns at that start).
static CLOCK_BASE: OnceLock<(Instant, u64)> = OnceLock::new();

/// Returns the current monotonic time in nanoseconds, anchored at the
/// UNIX epoch.
///
/// The wall-clock epoch offset is sampled exactly once per process; after
/// that the reading advances with `Instant`, so it never moves backwards
/// even if the system clock is adjusted.
///
/// # Example
///
/// ```rust
/// use nanolimit::monotonic_ns;
///
/// let a = monotonic_ns();
/// let b = monotonic_ns();
/// assert!(b >= a);
/// ```
#[inline(always)]
pub fn monotonic_ns() -> u64 {
    let (start, base_ns) = CLOCK_BASE.get_or_init(|| {
        let epoch_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;
        (Instant::now(), epoch_ns)
    });
    base_ns.saturating_add(start.elapsed().as_nanos() as u64)
}

/// CPU-specific relaxation hint for spin loops.
///
/// Used between compare-and-swap retries to reduce power draw and give
/// sibling hyperthreads a chance to run.
///
/// - **x86_64**: PAUSE instruction (when SSE is available)
/// - **ARM64 and others**: standard spin loop hint (YIELD on ARM)
#[inline(always)]
pub fn cpu_relax() {
    #[cfg(target_arch = "x86_64")]
    {
        #[cfg(any(target_feature = "sse2", target_feature = "sse"))]
        unsafe {
            std::arch::x86_64::_mm_pause();
        }
        #[cfg(not(any(target_feature = "sse2", target_feature = "sse")))]
        {
            std::hint::spin_loop();
        }
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        std::hint::spin_loop();
    }
}

/// Cache-aligned wrapper keeping the hot atomic on its own cache line.
///
/// The debt horizon is hammered by every consuming thread; sharing its
/// cache line with colder fields would cause false sharing and needless
/// invalidation traffic between cores.
#[cfg(target_arch = "aarch64")]
#[repr(C, align(128))]
pub(crate) struct CacheAligned<T>(pub T);
#[cfg(not(target_arch = "aarch64"))]
#[repr(C, align(64))]
pub(crate) struct CacheAligned<T>(pub T);

impl<T> CacheAligned<T> {
    /// Creates a new cache-aligned value.
    #[inline(always)]
    pub const fn new(value: T) -> Self {
        Self(value)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for CacheAligned<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// The repr(align) literal above must track the per-arch constant.
const _: () = assert!(std::mem::align_of::<CacheAligned<u64>>() == CACHE_LINE_SIZE);
