#![forbid(unsafe_code)]

//! Typed delegates for FrankenTUI: single-listener slots and multi-listener
//! registries with handle-based removal.
//!
//! # Role in FrankenTUI
//! `ftui-delegate` is the in-process event dispatch layer. An event source
//! (a model, a widget, an entity) owns a [`MulticastDelegate`] and calls
//! [`broadcast`](MulticastDelegate::broadcast); interested parties register
//! listeners and keep the returned [`DelegateHandle`] to unregister later.
//!
//! # Binding kinds
//! - **Static**: a free function, `fn(A) -> R`.
//! - **Raw**: a method on a borrowed receiver. The receiver's address is the
//!   listener's owner identity, used by
//!   [`remove_all_for`](MulticastDelegate::remove_all_for).
//! - **Weak**: a method on an `Rc`-owned receiver held through `Weak`.
//!   Skipped once the receiver is gone and pruned after the next broadcast.
//! - **Closure**: any `Fn(A) -> R`.
//!
//! # Signatures
//! A listener signature is an argument type `A` and a result type `R`
//! (default `()`). Multi-argument signatures use a tuple:
//!
//! ```
//! use ftui_delegate::MulticastDelegate;
//!
//! struct Hud;
//! impl Hud {
//!     fn on_health(&self, (max, current, delta): (i32, i32, i32)) {
//!         assert!(current <= max);
//!         let _ = delta;
//!     }
//! }
//!
//! let hud = Hud;
//! let on_health_changed = MulticastDelegate::new();
//! let handle = on_health_changed.add_raw(&hud, Hud::on_health);
//! on_health_changed.broadcast((100, 50, -50));
//! on_health_changed.remove(handle);
//! assert!(!on_health_changed.is_bound());
//! ```
//!
//! # Threading
//! Only [`DelegateHandle::generate`] is thread-safe. Delegates are built on
//! `Rc` and `RefCell` and are neither `Send` nor `Sync`.

pub mod config;
pub mod delegate;
pub mod error;
pub mod handle;
pub mod instance;
pub mod multicast;
pub mod owner;

pub use config::MulticastConfig;
pub use delegate::Delegate;
pub use error::DelegateError;
pub use handle::DelegateHandle;
pub use instance::{BindingKind, DelegateInstance};
pub use multicast::MulticastDelegate;
pub use owner::OwnerId;
