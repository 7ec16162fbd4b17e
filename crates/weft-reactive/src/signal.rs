#![forbid(unsafe_code)]

//! Publish/subscribe channel with scope-managed and fire-once subscriptions.
//!
//! [`Signal<T>`] holds an ordered handler list and dispatches a payload to a
//! snapshot of it. Three registration modes:
//!
//! - *unmanaged* — [`subscribe`](Signal::subscribe) returns a
//!   [`SignalBinding`] the caller must detach explicitly; dropping the
//!   binding does **not** detach.
//! - *scoped* — [`subscribe_for_scope`](Signal::subscribe_for_scope)
//!   detaches exactly once when the [`Scope`] disposes.
//! - *fire-once* — [`subscribe_once`](Signal::subscribe_once) self-detaches
//!   after its first invocation.
//!
//! # Invariants
//!
//! 1. Handlers are invoked in registration order.
//! 2. `fire` dispatches to a snapshot: handlers added or detached by a
//!    handler mid-dispatch do not affect the in-flight dispatch.
//! 3. Detach is idempotent; a scoped handler is detached exactly once.
//!
//! # Failure Modes
//!
//! - **Panicking handler**: the panic unwinds out of `fire`
//!   (abort-and-propagate, applied uniformly). The snapshot was collected
//!   and all interior borrows released before any handler ran, so the
//!   handler list is intact and the next `fire` reaches every surviving
//!   handler.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::scope::Scope;

type Handler<T> = Rc<dyn Fn(&T)>;

struct SignalInner<T: 'static> {
    next_id: u64,
    handlers: Vec<(u64, Handler<T>)>,
}

/// An ordered publish/subscribe channel carrying payloads of type `T`.
///
/// Cloning a `Signal` creates a new handle to the **same** handler list.
pub struct Signal<T: 'static> {
    inner: Rc<RefCell<SignalInner<T>>>,
}

impl<T: 'static> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("handler_count", &self.inner.borrow().handlers.len())
            .finish()
    }
}

impl<T: 'static> Signal<T> {
    /// Create a signal with no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SignalInner {
                next_id: 0,
                handlers: Vec::new(),
            })),
        }
    }

    /// Subscribe without lifetime management.
    ///
    /// The handler stays registered until the returned binding's
    /// [`detach`](SignalBinding::detach) is called. Dropping the binding
    /// does not detach.
    pub fn subscribe(&self, handler: impl Fn(&T) + 'static) -> SignalBinding {
        let id = self.register(Rc::new(handler));
        self.binding_for(id)
    }

    /// Subscribe bound to `scope`: the handler detaches exactly once when
    /// the scope disposes.
    ///
    /// Subscribing against an already-disposed scope detaches immediately,
    /// so the handler never fires.
    pub fn subscribe_for_scope(&self, handler: impl Fn(&T) + 'static, scope: &Scope) {
        let binding = self.subscribe(handler);
        scope.add_cleanup(move || binding.detach());
    }

    /// Subscribe a handler that self-detaches after its first invocation.
    ///
    /// The returned binding can still be used to detach early, before any
    /// fire happens.
    pub fn subscribe_once(&self, handler: impl FnOnce(&T) + 'static) -> SignalBinding {
        let slot = Rc::new(RefCell::new(Some(handler)));
        let self_binding: Rc<RefCell<Option<SignalBinding>>> = Rc::new(RefCell::new(None));

        let slot_in_handler = Rc::clone(&slot);
        let binding_in_handler = Rc::clone(&self_binding);
        let binding = self.subscribe(move |payload| {
            if let Some(handler) = slot_in_handler.borrow_mut().take() {
                handler(payload);
            }
            if let Some(binding) = binding_in_handler.borrow_mut().take() {
                binding.detach();
            }
        });

        *self_binding.borrow_mut() = Some(binding.clone());
        binding
    }

    /// Fire the signal, invoking a snapshot of the current handlers in
    /// registration order.
    ///
    /// The snapshot is collected and the handler-list borrow released before
    /// any handler runs, so handlers may freely subscribe or detach (on this
    /// signal or others) as a side effect of being invoked.
    pub fn fire(&self, payload: &T) {
        let snapshot: Vec<Handler<T>> = self
            .inner
            .borrow()
            .handlers
            .iter()
            .map(|(_, handler)| Rc::clone(handler))
            .collect();
        trace!(handlers = snapshot.len(), "signal fired");
        for handler in snapshot {
            handler(payload);
        }
    }

    /// Number of currently registered handlers. Debug accessor.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.inner.borrow().handlers.len()
    }

    fn register(&self, handler: Handler<T>) -> u64 {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.handlers.push((id, handler));
        id
    }

    fn binding_for(&self, id: u64) -> SignalBinding {
        let weak: Weak<RefCell<SignalInner<T>>> = Rc::downgrade(&self.inner);
        SignalBinding::from_fn(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().handlers.retain(|(hid, _)| *hid != id);
            }
        })
    }
}

/// Detach handle for a single registration.
///
/// Detaching is idempotent; clones share the same one-shot detach action,
/// so detaching through any clone detaches them all. Dropping a binding
/// does **not** detach — unmanaged registrations outlive their handles by
/// design (use [`Signal::subscribe_for_scope`] for automatic teardown).
pub struct SignalBinding {
    detach: Rc<RefCell<Option<Box<dyn FnOnce()>>>>,
}

impl Clone for SignalBinding {
    fn clone(&self) -> Self {
        Self {
            detach: Rc::clone(&self.detach),
        }
    }
}

impl std::fmt::Debug for SignalBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalBinding")
            .field("detached", &self.is_detached())
            .finish()
    }
}

impl SignalBinding {
    pub(crate) fn from_fn(detach: impl FnOnce() + 'static) -> Self {
        Self {
            detach: Rc::new(RefCell::new(Some(Box::new(detach)))),
        }
    }

    /// Detach the registration. Later calls are no-ops.
    pub fn detach(&self) {
        if let Some(detach) = self.detach.borrow_mut().take() {
            detach();
        }
    }

    /// Whether [`detach`](Self::detach) has already run.
    #[must_use]
    pub fn is_detached(&self) -> bool {
        self.detach.borrow().is_none()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
