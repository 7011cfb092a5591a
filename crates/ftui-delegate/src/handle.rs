#![forbid(unsafe_code)]

//! Delegate handles and the process-wide handle allocator.
//!
//! Every binding gets a [`DelegateHandle`] the moment it is constructed. The
//! handle is what callers keep around to remove one specific listener later.
//!
//! # Invariants
//!
//! 1. Generated handles are never zero; zero is [`DelegateHandle::INVALID`].
//! 2. Each call to [`DelegateHandle::generate`] returns a value strictly
//!    greater than every value returned before it in this process.
//! 3. Values are never recycled.
//!
//! Handle values are meaningless across process restarts and must not be
//! persisted.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Next value handed out by [`DelegateHandle::generate`].
///
/// Relaxed ordering is enough: only uniqueness matters, nobody synchronizes
/// on the counter.
static NEXT_DELEGATE_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for one registered binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DelegateHandle(u64);

impl DelegateHandle {
    /// The unbound sentinel. Never returned by [`generate`](Self::generate).
    pub const INVALID: Self = Self(0);

    /// Allocate a fresh, process-unique handle.
    ///
    /// Safe to call from any thread without external locking.
    #[must_use]
    pub fn generate() -> Self {
        Self(NEXT_DELEGATE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Whether this handle refers to a binding (is not the sentinel).
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }

    /// Reset this copy of the handle to [`INVALID`](Self::INVALID).
    ///
    /// Useful for a caller that stores a handle and wants to mark it as
    /// spent after removing the binding.
    #[inline]
    pub fn reset(&mut self) {
        self.0 = 0;
    }

    /// Raw numeric value, for diagnostics only.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DelegateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "#{}", self.0)
        } else {
            f.write_str("#invalid")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn default_is_invalid() {
        let handle = DelegateHandle::default();
        assert_eq!(handle, DelegateHandle::INVALID);
        assert!(!handle.is_valid());
    }

    #[test]
    fn generated_handles_are_valid_and_increasing() {
        let a = DelegateHandle::generate();
        let b = DelegateHandle::generate();
        assert!(a.is_valid());
        assert!(b.is_valid());
        assert!(b > a);
    }

    #[test]
    fn reset_clears_local_copy() {
        let original = DelegateHandle::generate();
        let mut copy = original;
        copy.reset();
        assert!(!copy.is_valid());
        assert!(original.is_valid());
    }

    #[test]
    fn display_format() {
        assert_eq!(DelegateHandle::INVALID.to_string(), "#invalid");
        let handle = DelegateHandle::generate();
        assert_eq!(handle.to_string(), format!("#{}", handle.as_u64()));
    }

    #[test]
    fn concurrent_generation_is_unique() {
        let workers: Vec<_> = (0..8)
            .map(|_| {
                thread::spawn(|| {
                    (0..1_000)
                        .map(|_| DelegateHandle::generate())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for worker in workers {
            for handle in worker.join().expect("worker thread panicked") {
                assert!(handle.is_valid());
                assert!(seen.insert(handle), "duplicate handle {handle}");
            }
        }
        assert_eq!(seen.len(), 8_000);
    }
}
