#![forbid(unsafe_code)]

//! Multi-listener delegate with snapshot dispatch and lazy pruning.
//!
//! # Design
//!
//! [`MulticastDelegate`] keeps an ordered list of `(handle, slot, owner)`
//! entries behind a `RefCell`. Every operation takes `&self`, so a listener
//! that can reach the registry may add or remove listeners while a
//! broadcast is running.
//!
//! ```text
//! broadcast(args)
//!   1. entries empty?        ──► return
//!   2. snapshot = entries.clone()     (Rc clones of the same instances)
//!   3. for entry in snapshot ──► entry.try_execute(args.clone())
//!                                     listeners may mutate `entries`
//!   4. sweep: drop entries whose slot is no longer bound
//! ```
//!
//! # Invariants
//!
//! 1. Handles among live entries are unique.
//! 2. Listeners run in insertion order.
//! 3. Every entry live when a broadcast starts runs exactly once in it, even
//!    if it is removed part-way through.
//! 4. Entries added during a broadcast first run in the next broadcast.
//! 5. Unsafe entries are only removed by the post-broadcast sweep; nothing
//!    polls liveness between broadcasts.
//! 6. No `RefCell` borrow is held while listener code runs or while removed
//!    entries are dropped.
//!
//! # Reaching the registry from a listener
//!
//! A listener stored inside the registry cannot borrow the registry itself
//! (that would be a self-borrow the drop checker rejects). Own the registry
//! through an `Rc` and capture a `Weak` to it instead:
//!
//! ```
//! use std::rc::Rc;
//! use ftui_delegate::MulticastDelegate;
//!
//! let registry: Rc<MulticastDelegate<'static, u32>> = Rc::new(MulticastDelegate::new());
//! let weak = Rc::downgrade(&registry);
//! registry.add_lambda(move |_| {
//!     if let Some(registry) = weak.upgrade() {
//!         registry.add_lambda(|_| {});
//!     }
//! });
//! registry.broadcast(1);
//! assert_eq!(registry.len(), 2);
//! ```
//!
//! # Failure Modes
//!
//! - **Panicking listener**: the panic unwinds out of `broadcast`; later
//!   listeners in the snapshot do not run and the sweep is skipped. The
//!   registry itself stays consistent and the next broadcast sweeps.
//! - **Re-entrant broadcast**: allowed. The nested call takes its own
//!   snapshot.

use std::cell::RefCell;
use std::fmt;
use std::rc::Weak;

use tracing::{debug, debug_span, trace};

use crate::config::MulticastConfig;
use crate::delegate::Delegate;
use crate::handle::DelegateHandle;
use crate::owner::OwnerId;

struct Entry<'a, A, R> {
    handle: DelegateHandle,
    delegate: Delegate<'a, A, R>,
    owner: Option<OwnerId>,
}

// Manual Clone: the snapshot shares instances, it never needs `A: Clone`.
impl<A, R> Clone for Entry<'_, A, R> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle,
            delegate: self.delegate.clone(),
            owner: self.owner,
        }
    }
}

/// Ordered set of listeners for signature `A -> R`, fired together by
/// [`broadcast`](Self::broadcast).
///
/// `R` defaults to `()`. Listener results are discarded by `broadcast`.
pub struct MulticastDelegate<'a, A, R = ()> {
    entries: RefCell<Vec<Entry<'a, A, R>>>,
    config: MulticastConfig,
}

impl<A, R> Default for MulticastDelegate<'_, A, R> {
    fn default() -> Self {
        Self::with_config(MulticastConfig::default())
    }
}

impl<A, R> MulticastDelegate<'_, A, R> {
    /// An empty registry with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty registry with `config`.
    #[must_use]
    pub fn with_config(config: MulticastConfig) -> Self {
        Self {
            entries: RefCell::new(Vec::with_capacity(config.initial_capacity)),
            config,
        }
    }

    /// Configuration this registry was built with.
    #[must_use]
    pub fn config(&self) -> &MulticastConfig {
        &self.config
    }
}

impl<'a, A: 'a, R: 'a> MulticastDelegate<'a, A, R> {
    fn add_internal(&self, delegate: Delegate<'a, A, R>, owner: Option<OwnerId>) -> DelegateHandle {
        let mut handle = delegate.handle();
        if !handle.is_valid() {
            // Every instance allocates a handle when built, so this only
            // guards against a slot that was never bound.
            handle = DelegateHandle::generate();
        }
        trace!(registry = self.config.name, %handle, ?owner, "listener added");
        self.entries.borrow_mut().push(Entry {
            handle,
            delegate,
            owner,
        });
        handle
    }

    /// Register a free function.
    pub fn add_static(&self, func: fn(A) -> R) -> DelegateHandle {
        let mut delegate = Delegate::new();
        delegate.bind_static(func);
        self.add_internal(delegate, None)
    }

    /// Register a `&self` method on a borrowed receiver.
    ///
    /// The receiver's address becomes the entry's owner identity, so
    /// [`remove_all_for`](Self::remove_all_for) with the same receiver
    /// removes it.
    pub fn add_raw<T: ?Sized + 'a>(
        &self,
        receiver: &'a T,
        method: fn(&T, A) -> R,
    ) -> DelegateHandle {
        let mut delegate = Delegate::new();
        delegate.bind_raw(receiver, method);
        let owner = delegate.owner();
        self.add_internal(delegate, owner)
    }

    /// Register a `&mut self` method on a borrowed `RefCell` receiver.
    ///
    /// The owner identity is the address of the `RefCell`.
    pub fn add_raw_mut<T: 'a>(
        &self,
        receiver: &'a RefCell<T>,
        method: fn(&mut T, A) -> R,
    ) -> DelegateHandle {
        let mut delegate = Delegate::new();
        delegate.bind_raw_mut(receiver, method);
        let owner = delegate.owner();
        self.add_internal(delegate, owner)
    }

    /// Register a `&self` method on a weakly referenced receiver.
    ///
    /// Once the receiver is dropped the listener is skipped and pruned after
    /// the next broadcast. Weak bindings carry no owner identity.
    pub fn add_weak<T: ?Sized + 'a>(
        &self,
        receiver: Weak<T>,
        method: fn(&T, A) -> R,
    ) -> DelegateHandle {
        let mut delegate = Delegate::new();
        delegate.bind_weak(receiver, method);
        self.add_internal(delegate, None)
    }

    /// Register a `&mut self` method on a weakly referenced `RefCell`
    /// receiver.
    pub fn add_weak_mut<T: 'a>(
        &self,
        receiver: Weak<RefCell<T>>,
        method: fn(&mut T, A) -> R,
    ) -> DelegateHandle {
        let mut delegate = Delegate::new();
        delegate.bind_weak_mut(receiver, method);
        self.add_internal(delegate, None)
    }

    /// Register a closure.
    pub fn add_lambda(&self, func: impl Fn(A) -> R + 'a) -> DelegateHandle {
        let mut delegate = Delegate::new();
        delegate.bind_lambda(func);
        self.add_internal(delegate, None)
    }
}

impl<'a, A, R> MulticastDelegate<'a, A, R> {
    /// Remove entries matching `pred`, keeping the order of the rest.
    ///
    /// The removed entries are returned so the caller drops them after the
    /// borrow is released; a listener's captures may touch the registry
    /// from their `Drop`.
    fn extract_where(&self, pred: impl Fn(&Entry<'a, A, R>) -> bool) -> Vec<Entry<'a, A, R>> {
        let mut entries = self.entries.borrow_mut();
        if !entries.iter().any(&pred) {
            return Vec::new();
        }
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut *entries)
            .into_iter()
            .partition(|entry| pred(entry));
        *entries = kept;
        removed
    }

    /// Remove the listener registered under `handle`.
    ///
    /// Unknown or invalid handles are ignored. Returns whether an entry was
    /// removed.
    pub fn remove(&self, handle: DelegateHandle) -> bool {
        let removed = {
            let mut entries = self.entries.borrow_mut();
            let index = entries.iter().position(|entry| entry.handle == handle);
            index.map(|index| entries.remove(index))
        };
        if removed.is_some() {
            trace!(registry = self.config.name, %handle, "listener removed");
        }
        removed.is_some()
    }

    /// Remove every listener whose owner identity equals `owner`.
    ///
    /// `None` removes nothing: it never selects the ownerless entries.
    /// Returns the number of entries removed.
    pub fn remove_all(&self, owner: Option<OwnerId>) -> usize {
        let Some(owner) = owner else {
            return 0;
        };
        let removed = self.extract_where(|entry| entry.owner == Some(owner));
        if !removed.is_empty() {
            trace!(
                registry = self.config.name,
                ?owner,
                removed = removed.len(),
                "listeners removed by owner"
            );
        }
        removed.len()
    }

    /// Remove every raw listener bound to `receiver`.
    pub fn remove_all_for<T: ?Sized>(&self, receiver: &T) -> usize {
        self.remove_all(Some(OwnerId::of(receiver)))
    }

    /// Remove all listeners.
    pub fn clear(&self) {
        let removed = std::mem::take(&mut *self.entries.borrow_mut());
        drop(removed);
    }

    /// True iff at least one entry is registered.
    ///
    /// Entries are not checked individually; a dead weak binding still
    /// counts until the next broadcast prunes it.
    #[inline]
    #[must_use]
    pub fn is_bound(&self) -> bool {
        !self.entries.borrow().is_empty()
    }

    /// Number of registered entries, including dead ones not yet pruned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether no entries are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Whether an entry with `handle` is registered.
    #[must_use]
    pub fn contains(&self, handle: DelegateHandle) -> bool {
        self.entries.borrow().iter().any(|entry| entry.handle == handle)
    }

    /// Handles of all entries in invocation order.
    #[must_use]
    pub fn handles(&self) -> Vec<DelegateHandle> {
        self.entries.borrow().iter().map(|entry| entry.handle).collect()
    }

    /// Invoke every listener registered at call time, in order, with a
    /// clone of `args`, then prune listeners that are no longer bound.
    pub fn broadcast(&self, args: A)
    where
        A: Clone,
    {
        let snapshot = {
            let entries = self.entries.borrow();
            if entries.is_empty() {
                return;
            }
            entries.clone()
        };

        {
            let _span = debug_span!(
                "delegate.broadcast",
                registry = self.config.name,
                listeners = snapshot.len()
            )
            .entered();
            for entry in &snapshot {
                if let Err(err) = entry.delegate.try_execute(args.clone()) {
                    trace!(
                        registry = self.config.name,
                        handle = %entry.handle,
                        %err,
                        "listener skipped"
                    );
                }
            }
        }
        drop(snapshot);

        let pruned = self.extract_where(|entry| !entry.delegate.is_bound());
        if !pruned.is_empty() {
            debug!(
                registry = self.config.name,
                pruned = pruned.len(),
                remaining = self.len(),
                "pruned dead listeners"
            );
        }
    }
}

impl<A, R> fmt::Debug for MulticastDelegate<'_, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MulticastDelegate")
            .field("name", &self.config.name)
            .field("listeners", &self.handles())
            .finish()
    }
}
