#![forbid(unsafe_code)]

//! Disposable lifetime handles for subscriptions and other wired-up state.
//!
//! A [`Scope`] answers the question "how long does this stay wired up?". It
//! owns an ordered list of cleanup actions and a write-once disposed flag.
//! Everything else in this crate expresses teardown through scopes: a scoped
//! signal subscription registers its detach as a cleanup, a sequence grants
//! each element a membership scope, a path binding hangs its whole
//! subscription chain off one.
//!
//! `Scope` is a cheap handle (`Rc` interior); clones share the same cleanup
//! list and flag.
//!
//! # Invariants
//!
//! 1. Each cleanup action runs exactly once, even when `dispose()` is
//!    re-entered from inside a cleanup action.
//! 2. Cleanup actions run in registration order.
//! 3. `dispose()` is idempotent and synchronous: when it returns, every
//!    cleanup registered before the call has run.
//! 4. `add_cleanup` on a disposed scope runs the action immediately rather
//!    than deferring it, so nothing registered during teardown is dropped.
//!
//! # Failure Modes
//!
//! - **Panicking cleanup**: the panic unwinds out of `dispose()`. The
//!   disposed flag is already set and the cleanup list already detached, so
//!   the scope stays disposed; cleanups after the panicking one do not run.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

struct ScopeInner {
    disposed: bool,
    cleanups: Vec<Box<dyn FnOnce()>>,
}

/// A disposable handle bounding the lifetime of registrations and resources.
///
/// Cloning a `Scope` creates a new handle to the **same** scope — disposing
/// through any handle disposes all of them.
pub struct Scope {
    inner: Rc<RefCell<ScopeInner>>,
}

impl Clone for Scope {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Scope {}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Scope")
            .field("disposed", &inner.disposed)
            .field("cleanup_count", &inner.cleanups.len())
            .finish()
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    /// Shared process-lifetime scope handed out by [`Scope::unbounded`].
    static UNBOUNDED: Scope = Scope::new();
}

impl Scope {
    /// Create a new, undisposed scope with no cleanup actions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(ScopeInner {
                disposed: false,
                cleanups: Vec::new(),
            })),
        }
    }

    /// The shared unbounded scope: never disposed for the process lifetime.
    ///
    /// Used by subscribers that want no automatic teardown. All calls on the
    /// same thread return handles to one shared instance, so cleanups
    /// registered against it are simply retained forever.
    #[must_use]
    pub fn unbounded() -> Self {
        UNBOUNDED.with(Self::clone)
    }

    /// Whether this scope has been disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.borrow().disposed
    }

    /// Number of cleanup actions currently pending. Debug accessor.
    #[must_use]
    pub fn cleanup_count(&self) -> usize {
        self.inner.borrow().cleanups.len()
    }

    /// Register a cleanup action to run at disposal.
    ///
    /// If the scope is already disposed, the action runs immediately instead
    /// of being deferred — resources acquired concurrently with teardown are
    /// released rather than silently leaked.
    pub fn add_cleanup(&self, action: impl FnOnce() + 'static) {
        if self.inner.borrow().disposed {
            action();
            return;
        }
        self.inner.borrow_mut().cleanups.push(Box::new(action));
    }

    /// Dispose the scope, running every registered cleanup in registration
    /// order. Idempotent: second and later calls return without effect.
    ///
    /// The disposed flag is set and the cleanup list detached *before* any
    /// action runs, so a cleanup that re-enters `dispose()` is a no-op and a
    /// cleanup that calls [`add_cleanup`](Self::add_cleanup) runs the new
    /// action immediately.
    pub fn dispose(&self) {
        let cleanups = {
            let mut inner = self.inner.borrow_mut();
            if inner.disposed {
                return;
            }
            inner.disposed = true;
            std::mem::take(&mut inner.cleanups)
        };
        trace!(cleanups = cleanups.len(), "scope disposed");
        for cleanup in cleanups {
            cleanup();
        }
    }

    /// Create a child scope that is disposed when this scope is disposed.
    ///
    /// The child can also be disposed independently ahead of the parent, in
    /// which case the parent's later disposal is a no-op for it. Calling
    /// `child()` on an already-disposed scope returns a scope that is
    /// disposed immediately.
    #[must_use]
    pub fn child(&self) -> Scope {
        let child = Scope::new();
        let handle = child.clone();
        self.add_cleanup(move || handle.dispose());
        child
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
