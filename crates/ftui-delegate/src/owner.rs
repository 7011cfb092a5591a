#![forbid(unsafe_code)]

//! Listener-owner identity used for bulk removal.

use std::fmt;

/// Address-sized key identifying the receiver of a raw binding.
///
/// Only ever compared, never dereferenced. Two distinct zero-sized
/// receivers may share an address and therefore an `OwnerId`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerId(usize);

impl OwnerId {
    /// Identity of `receiver`, taken from its address.
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized>(receiver: &T) -> Self {
        Self(std::ptr::from_ref(receiver).cast::<()>().addr())
    }
}

impl fmt::Debug for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OwnerId({:#x})", self.0)
    }
}
