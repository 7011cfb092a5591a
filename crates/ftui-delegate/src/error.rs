#![forbid(unsafe_code)]

//! Errors reported by the non-panicking execution paths.

use crate::handle::DelegateHandle;
use crate::instance::BindingKind;

/// Why a delegate did not run.
///
/// Returned by [`Delegate::try_execute`](crate::Delegate::try_execute) and
/// [`DelegateInstance::try_execute`](crate::DelegateInstance::try_execute).
/// Neither case is a bug: a weak receiver going away is the normal end of a
/// weak binding's life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegateError {
    /// The slot holds no binding.
    Unbound,
    /// A binding is present but can no longer run (weak receiver dropped).
    Expired {
        /// Handle of the binding that could not run.
        handle: DelegateHandle,
        /// Variant of that binding. Only weak bindings expire today.
        kind: BindingKind,
    },
}

impl std::fmt::Display for DelegateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unbound => write!(f, "delegate is not bound"),
            Self::Expired { handle, kind } => {
                write!(f, "{kind:?} delegate {handle} is no longer safe to execute")
            }
        }
    }
}

impl std::error::Error for DelegateError {}
