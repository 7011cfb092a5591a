#![forbid(unsafe_code)]

//! Single-listener delegate slot.
//!
//! A [`Delegate`] holds at most one [`DelegateInstance`]. Every `bind_*`
//! call replaces whatever was there before. Cloning a delegate shares the
//! same instance, which is how a multicast snapshot co-references the live
//! bindings without copying them.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::DelegateError;
use crate::handle::DelegateHandle;
use crate::instance::{BindingKind, DelegateInstance};
use crate::owner::OwnerId;

/// A slot for one bound listener of signature `A -> R`.
pub struct Delegate<'a, A, R = ()> {
    instance: Option<Rc<DelegateInstance<'a, A, R>>>,
}

// Manual Clone: shares the same Rc, no `A: Clone` / `R: Clone` bound.
impl<A, R> Clone for Delegate<'_, A, R> {
    fn clone(&self) -> Self {
        Self {
            instance: self.instance.clone(),
        }
    }
}

impl<A, R> Default for Delegate<'_, A, R> {
    fn default() -> Self {
        Self { instance: None }
    }
}

impl<'a, A: 'a, R: 'a> Delegate<'a, A, R> {
    /// An unbound slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn bind(&mut self, instance: DelegateInstance<'a, A, R>) {
        self.instance = Some(Rc::new(instance));
    }

    /// Bind a free function, replacing any previous binding.
    pub fn bind_static(&mut self, func: fn(A) -> R) {
        self.bind(DelegateInstance::from_static(func));
    }

    /// Bind a `&self` method on a borrowed receiver.
    pub fn bind_raw<T: ?Sized + 'a>(&mut self, receiver: &'a T, method: fn(&T, A) -> R) {
        self.bind(DelegateInstance::from_raw(receiver, method));
    }

    /// Bind a `&mut self` method on a borrowed `RefCell` receiver.
    pub fn bind_raw_mut<T: 'a>(&mut self, receiver: &'a RefCell<T>, method: fn(&mut T, A) -> R) {
        self.bind(DelegateInstance::from_raw_mut(receiver, method));
    }

    /// Bind a `&self` method on a weakly referenced receiver.
    pub fn bind_weak<T: ?Sized + 'a>(&mut self, receiver: Weak<T>, method: fn(&T, A) -> R) {
        self.bind(DelegateInstance::from_weak(receiver, method));
    }

    /// Bind a `&mut self` method on a weakly referenced `RefCell` receiver.
    pub fn bind_weak_mut<T: 'a>(
        &mut self,
        receiver: Weak<RefCell<T>>,
        method: fn(&mut T, A) -> R,
    ) {
        self.bind(DelegateInstance::from_weak_mut(receiver, method));
    }

    /// Bind a closure.
    pub fn bind_lambda(&mut self, func: impl Fn(A) -> R + 'a) {
        self.bind(DelegateInstance::from_closure(func));
    }
}

impl<A, R> Delegate<'_, A, R> {
    /// True iff an instance is held and it is safe to execute.
    #[inline]
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.instance
            .as_ref()
            .is_some_and(|instance| instance.is_safe_to_execute())
    }

    /// Drop the held instance, if any. Clones taken earlier keep theirs.
    pub fn unbind(&mut self) {
        self.instance = None;
    }

    /// Handle of the held instance, or [`DelegateHandle::INVALID`].
    #[must_use]
    pub fn handle(&self) -> DelegateHandle {
        self.instance
            .as_ref()
            .map_or(DelegateHandle::INVALID, |instance| instance.handle())
    }

    /// Variant of the held instance.
    #[must_use]
    pub fn kind(&self) -> Option<BindingKind> {
        self.instance.as_ref().map(|instance| instance.kind())
    }

    /// Receiver identity of the held instance (raw bindings only).
    #[must_use]
    pub fn owner(&self) -> Option<OwnerId> {
        self.instance.as_ref().and_then(|instance| instance.owner())
    }

    /// Invoke the bound listener, reporting why nothing ran.
    pub fn try_execute(&self, args: A) -> Result<R, DelegateError> {
        match &self.instance {
            Some(instance) => instance.try_execute(args),
            None => Err(DelegateError::Unbound),
        }
    }

    /// Invoke the bound listener.
    ///
    /// # Panics
    ///
    /// Panics if the slot is not bound (see [`is_bound`](Self::is_bound)).
    pub fn execute(&self, args: A) -> R {
        assert!(
            self.is_bound(),
            "execute on an unbound delegate (handle {})",
            self.handle()
        );
        match self.try_execute(args) {
            Ok(output) => output,
            Err(err) => panic!("delegate failed to execute: {err}"),
        }
    }

    /// Invoke the bound listener, or return `R::default()` when unbound.
    pub fn execute_if_bound(&self, args: A) -> R
    where
        R: Default,
    {
        self.try_execute(args).unwrap_or_default()
    }
}

impl<A, R> fmt::Debug for Delegate<'_, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delegate")
            .field("handle", &self.handle())
            .field("kind", &self.kind())
            .field("bound", &self.is_bound())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn add_one(x: u32) -> u32 {
        x + 1
    }

    fn times_ten(x: u32) -> u32 {
        x * 10
    }

    struct Label {
        text: &'static str,
    }

    impl Label {
        fn len_plus(&self, extra: usize) -> usize {
            self.text.len() + extra
        }
    }

    #[test]
    fn new_is_unbound() {
        let d: Delegate<'_, u32, u32> = Delegate::new();
        assert!(!d.is_bound());
        assert_eq!(d.handle(), DelegateHandle::INVALID);
        assert_eq!(d.kind(), None);
        assert_eq!(d.execute_if_bound(5), 0);
        assert_eq!(d.try_execute(5), Err(DelegateError::Unbound));
    }

    #[test]
    fn bind_static_and_execute() {
        let mut d = Delegate::new();
        d.bind_static(add_one);
        assert!(d.is_bound());
        assert!(d.handle().is_valid());
        assert_eq!(d.execute(1), 2);
        assert_eq!(d.execute_if_bound(2), 3);
    }

    #[test]
    fn rebinding_replaces_instance_and_handle() {
        let mut d = Delegate::new();
        d.bind_static(add_one);
        let first = d.handle();

        d.bind_static(times_ten);
        assert_ne!(d.handle(), first);
        assert_eq!(d.execute(3), 30);
    }

    #[test]
    fn unbind_clears() {
        let mut d = Delegate::new();
        d.bind_lambda(|x: u32| x);
        d.unbind();
        assert!(!d.is_bound());
        assert_eq!(d.handle(), DelegateHandle::INVALID);
    }

    #[test]
    #[should_panic(expected = "unbound delegate")]
    fn execute_unbound_panics() {
        let d: Delegate<'_, u32, u32> = Delegate::new();
        d.execute(1);
    }

    #[test]
    fn raw_binding_reports_owner() {
        let label = Label { text: "hud" };
        let mut d = Delegate::new();
        d.bind_raw(&label, Label::len_plus);
        assert_eq!(d.owner(), Some(OwnerId::of(&label)));
        assert_eq!(d.execute(2), 5);
    }

    #[test]
    fn weak_binding_unbinds_itself_when_receiver_drops() {
        let label = Rc::new(Label { text: "log" });
        let mut d = Delegate::new();
        d.bind_weak(Rc::downgrade(&label), Label::len_plus);
        assert!(d.is_bound());
        assert_eq!(d.owner(), None);

        drop(label);
        assert!(!d.is_bound());
        // Still holds the instance, so the handle survives until unbind.
        assert!(d.handle().is_valid());
        assert_eq!(d.execute_if_bound(1), 0);
        assert!(matches!(
            d.try_execute(1),
            Err(DelegateError::Expired {
                kind: BindingKind::Weak,
                ..
            })
        ));
    }

    #[test]
    fn clone_shares_instance() {
        let hits = Rc::new(Cell::new(0u32));
        let hits_clone = Rc::clone(&hits);
        let mut d = Delegate::new();
        d.bind_lambda(move |()| hits_clone.set(hits_clone.get() + 1));

        let mut copy = d.clone();
        assert_eq!(copy.handle(), d.handle());
        copy.execute(());
        d.execute(());
        assert_eq!(hits.get(), 2);

        // Unbinding the copy leaves the original alone.
        copy.unbind();
        assert!(d.is_bound());
    }

    #[test]
    fn raw_mut_and_weak_mut() {
        let total = RefCell::new(0i32);
        let mut d = Delegate::new();
        d.bind_raw_mut(&total, |t: &mut i32, x: i32| *t += x);
        d.execute(4);
        d.execute(-1);
        assert_eq!(*total.borrow(), 3);

        let shared = Rc::new(RefCell::new(0i32));
        let mut w = Delegate::new();
        w.bind_weak_mut(Rc::downgrade(&shared), |t: &mut i32, x: i32| *t += x);
        w.execute(7);
        assert_eq!(*shared.borrow(), 7);
    }

    #[test]
    fn debug_format() {
        let mut d = Delegate::new();
        d.bind_static(add_one);
        let dbg = format!("{d:?}");
        assert!(dbg.contains("Delegate"));
        assert!(dbg.contains("bound: true"));
    }
}
