#![forbid(unsafe_code)]

//! Binding instances: one bound listener plus the knowledge of how to check
//! and invoke it.
//!
//! # Design
//!
//! A [`DelegateInstance`] pairs a [`DelegateHandle`] with a closed set of
//! binding variants:
//!
//! | Variant | Holds | Safe to execute when |
//! |---------|-------|----------------------|
//! | Static  | `fn(A) -> R` | always (fn pointers are never null) |
//! | Raw     | `&'a T` or `&'a RefCell<T>` + method | always (the borrow outlives the delegate) |
//! | Weak    | `Weak<T>` or `Weak<RefCell<T>>` + method | the receiver is still alive |
//! | Closure | `Box<dyn Fn(A) -> R + 'a>` | always |
//!
//! The registry treats all four the same way for storage, iteration and
//! pruning. Only the weak variant ever reports itself unsafe on its own.
//!
//! # Failure Modes
//!
//! - **Dropped weak receiver**: [`execute`](DelegateInstance::execute)
//!   panics; [`execute_if_safe`](DelegateInstance::execute_if_safe) returns
//!   `R::default()`; [`try_execute`](DelegateInstance::try_execute) returns
//!   [`DelegateError::Expired`].
//! - **Re-entrant mutable receiver**: a `*_mut` binding takes
//!   `RefCell::borrow_mut` for the duration of the call. If the method
//!   (directly or through a nested broadcast) reaches the same receiver
//!   again, the second borrow panics.
//! - **Raw receiver lifetime**: the registry never tracks the receiver at
//!   runtime. The `'a` borrow is what keeps it alive; code that needs to
//!   drop a receiver while the delegate lives on must use a weak binding.

use std::cell::RefCell;
use std::fmt;
use std::rc::Weak;

use crate::error::DelegateError;
use crate::handle::DelegateHandle;
use crate::owner::OwnerId;

/// Fieldless tag for the variant held by a [`DelegateInstance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// Free function, no receiver.
    Static,
    /// Method on a borrowed receiver.
    Raw,
    /// Method on a weakly referenced receiver.
    Weak,
    /// Arbitrary closure.
    Closure,
}

/// Method call against a receiver the delegate borrows.
trait RawTarget<A, R> {
    fn call(&self, args: A) -> R;
    fn owner(&self) -> OwnerId;
}

/// Method call against a receiver the delegate can only observe.
trait WeakTarget<A, R> {
    fn is_alive(&self) -> bool;
    /// `None` when the receiver is gone.
    fn call(&self, args: A) -> Option<R>;
}

struct RawMethod<'a, T: ?Sized, A, R> {
    receiver: &'a T,
    method: fn(&T, A) -> R,
}

impl<T: ?Sized, A, R> RawTarget<A, R> for RawMethod<'_, T, A, R> {
    fn call(&self, args: A) -> R {
        (self.method)(self.receiver, args)
    }

    fn owner(&self) -> OwnerId {
        OwnerId::of(self.receiver)
    }
}

struct RawMethodMut<'a, T, A, R> {
    receiver: &'a RefCell<T>,
    method: fn(&mut T, A) -> R,
}

impl<T, A, R> RawTarget<A, R> for RawMethodMut<'_, T, A, R> {
    fn call(&self, args: A) -> R {
        let mut receiver = self.receiver.borrow_mut();
        (self.method)(&mut *receiver, args)
    }

    fn owner(&self) -> OwnerId {
        OwnerId::of(self.receiver)
    }
}

struct WeakMethod<T: ?Sized, A, R> {
    receiver: Weak<T>,
    method: fn(&T, A) -> R,
}

impl<T: ?Sized, A, R> WeakTarget<A, R> for WeakMethod<T, A, R> {
    fn is_alive(&self) -> bool {
        self.receiver.strong_count() > 0
    }

    fn call(&self, args: A) -> Option<R> {
        // The strong reference lives only for this call.
        let receiver = self.receiver.upgrade()?;
        Some((self.method)(&*receiver, args))
    }
}

struct WeakMethodMut<T, A, R> {
    receiver: Weak<RefCell<T>>,
    method: fn(&mut T, A) -> R,
}

impl<T, A, R> WeakTarget<A, R> for WeakMethodMut<T, A, R> {
    fn is_alive(&self) -> bool {
        self.receiver.strong_count() > 0
    }

    fn call(&self, args: A) -> Option<R> {
        let receiver = self.receiver.upgrade()?;
        let mut receiver = receiver.borrow_mut();
        Some((self.method)(&mut *receiver, args))
    }
}

enum Binding<'a, A, R> {
    Static(fn(A) -> R),
    Raw(Box<dyn RawTarget<A, R> + 'a>),
    Weak(Box<dyn WeakTarget<A, R> + 'a>),
    Closure(Box<dyn Fn(A) -> R + 'a>),
}

/// One bound listener with its handle.
///
/// The handle is allocated at construction and never changes.
pub struct DelegateInstance<'a, A, R = ()> {
    handle: DelegateHandle,
    binding: Binding<'a, A, R>,
}

impl<'a, A: 'a, R: 'a> DelegateInstance<'a, A, R> {
    fn with_binding(binding: Binding<'a, A, R>) -> Self {
        Self {
            handle: DelegateHandle::generate(),
            binding,
        }
    }

    /// Bind a free function.
    #[must_use]
    pub fn from_static(func: fn(A) -> R) -> Self {
        Self::with_binding(Binding::Static(func))
    }

    /// Bind a `&self` method on a borrowed receiver.
    #[must_use]
    pub fn from_raw<T: ?Sized + 'a>(receiver: &'a T, method: fn(&T, A) -> R) -> Self {
        Self::with_binding(Binding::Raw(Box::new(RawMethod { receiver, method })))
    }

    /// Bind a `&mut self` method on a borrowed receiver held in a `RefCell`.
    #[must_use]
    pub fn from_raw_mut<T: 'a>(receiver: &'a RefCell<T>, method: fn(&mut T, A) -> R) -> Self {
        Self::with_binding(Binding::Raw(Box::new(RawMethodMut { receiver, method })))
    }

    /// Bind a `&self` method on a weakly referenced receiver.
    #[must_use]
    pub fn from_weak<T: ?Sized + 'a>(receiver: Weak<T>, method: fn(&T, A) -> R) -> Self {
        Self::with_binding(Binding::Weak(Box::new(WeakMethod { receiver, method })))
    }

    /// Bind a `&mut self` method on a weakly referenced `RefCell` receiver.
    #[must_use]
    pub fn from_weak_mut<T: 'a>(receiver: Weak<RefCell<T>>, method: fn(&mut T, A) -> R) -> Self {
        Self::with_binding(Binding::Weak(Box::new(WeakMethodMut { receiver, method })))
    }

    /// Bind an arbitrary closure.
    #[must_use]
    pub fn from_closure(func: impl Fn(A) -> R + 'a) -> Self {
        Self::with_binding(Binding::Closure(Box::new(func)))
    }
}

impl<A, R> DelegateInstance<'_, A, R> {
    /// Handle allocated when this instance was built.
    #[inline]
    #[must_use]
    pub fn handle(&self) -> DelegateHandle {
        self.handle
    }

    /// Which variant this instance holds.
    #[must_use]
    pub fn kind(&self) -> BindingKind {
        match self.binding {
            Binding::Static(_) => BindingKind::Static,
            Binding::Raw(_) => BindingKind::Raw,
            Binding::Weak(_) => BindingKind::Weak,
            Binding::Closure(_) => BindingKind::Closure,
        }
    }

    /// Receiver identity for raw bindings; `None` for every other variant.
    #[must_use]
    pub fn owner(&self) -> Option<OwnerId> {
        match &self.binding {
            Binding::Raw(target) => Some(target.owner()),
            Binding::Static(_) | Binding::Weak(_) | Binding::Closure(_) => None,
        }
    }

    /// Whether [`execute`](Self::execute) may be called right now.
    #[must_use]
    pub fn is_safe_to_execute(&self) -> bool {
        match &self.binding {
            Binding::Static(_) | Binding::Raw(_) | Binding::Closure(_) => true,
            Binding::Weak(target) => target.is_alive(),
        }
    }

    /// Whether a registry holding this instance may drop it.
    #[inline]
    #[must_use]
    pub fn is_compactable(&self) -> bool {
        !self.is_safe_to_execute()
    }

    /// Invoke the listener, reporting why nothing ran instead of panicking.
    pub fn try_execute(&self, args: A) -> Result<R, DelegateError> {
        match &self.binding {
            Binding::Static(func) => Ok(func(args)),
            Binding::Raw(target) => Ok(target.call(args)),
            Binding::Weak(target) => target.call(args).ok_or(DelegateError::Expired {
                handle: self.handle,
                kind: BindingKind::Weak,
            }),
            Binding::Closure(func) => Ok(func(args)),
        }
    }

    /// Invoke the listener.
    ///
    /// # Panics
    ///
    /// Panics if the instance is not safe to execute. Check
    /// [`is_safe_to_execute`](Self::is_safe_to_execute) first, or use
    /// [`execute_if_safe`](Self::execute_if_safe).
    pub fn execute(&self, args: A) -> R {
        match self.try_execute(args) {
            Ok(output) => output,
            Err(err) => panic!("execute on an unsafe delegate instance: {err}"),
        }
    }

    /// Invoke the listener if it is safe, otherwise return `R::default()`.
    pub fn execute_if_safe(&self, args: A) -> R
    where
        R: Default,
    {
        self.try_execute(args).unwrap_or_default()
    }
}

impl<A, R> fmt::Debug for DelegateInstance<'_, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateInstance")
            .field("handle", &self.handle)
            .field("kind", &self.kind())
            .field("safe", &self.is_safe_to_execute())
            .finish()
    }
}
