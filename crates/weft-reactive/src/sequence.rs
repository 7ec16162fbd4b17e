#![forbid(unsafe_code)]

//! Observable ordered container with per-element membership scopes.
//!
//! [`Sequence<T>`] is the backing store for collection-driven views (grid
//! rows, list items): every mutation fires `added`/`removed` signals
//! synchronously for its net effect, and each contained element owns a
//! membership [`Scope`] spanning exactly its current stay in the container.
//! A view row hangs its subscriptions off that scope and is torn down the
//! instant the element leaves.
//!
//! # Invariants
//!
//! 1. Net-effect signaling: `set(index, new)` fires removed(old) then
//!    added(new); `clear()` fires one removed per element, front to back.
//! 2. A membership scope is created on add and force-disposed on removal
//!    (before the removed signal fires) and on container teardown.
//! 3. An element removed and re-added gets a *fresh* scope, independent of
//!    the one granted on first membership.
//! 4. [`synchronize_for_scope`](Sequence::synchronize_for_scope): replay
//!    `on_added` per present element in order, then exactly one
//!    `on_changed` (even for an empty replay); afterwards each single
//!    mutation fires its hook then exactly one `on_changed`.
//!
//! # Failure Modes
//!
//! - **Absent-item membership lookup**: returns [`MembershipError`] rather
//!   than a silent no-op scope, so caller logic bugs surface.
//! - **Duplicate elements** (equal under `PartialEq`): index-free
//!   operations (`remove`, `membership_scope`) act on the first match.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use crate::scope::Scope;
use crate::signal::Signal;

/// Error from [`Sequence::membership_scope`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipError {
    /// The requested item is not currently contained in the sequence.
    AbsentItem,
}

impl std::fmt::Display for MembershipError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AbsentItem => write!(f, "item is not a member of the sequence"),
        }
    }
}

impl std::error::Error for MembershipError {}

struct SequenceInner<T> {
    /// Element paired with the scope spanning its current membership.
    items: Vec<(T, Scope)>,
}

impl<T> Drop for SequenceInner<T> {
    fn drop(&mut self) {
        // Container teardown: membership ends for everything still present.
        for (_, scope) in self.items.drain(..) {
            scope.dispose();
        }
    }
}

/// An ordered, index-addressable container with observable mutation.
///
/// Cloning a `Sequence` creates a new handle to the **same** contents and
/// signals.
pub struct Sequence<T: 'static> {
    inner: Rc<RefCell<SequenceInner<T>>>,
    added: Signal<T>,
    removed: Signal<T>,
}

impl<T: 'static> Clone for Sequence<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            added: self.added.clone(),
            removed: self.removed.clone(),
        }
    }
}

impl<T> Default for Sequence<T>
where
    T: Clone + PartialEq + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> std::fmt::Debug for Sequence<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequence")
            .field("len", &self.inner.borrow().items.len())
            .finish()
    }
}

impl<T> Sequence<T>
where
    T: Clone + PartialEq + 'static,
{
    /// Create an empty sequence.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SequenceInner { items: Vec::new() })),
            added: Signal::new(),
            removed: Signal::new(),
        }
    }

    /// Append an item, granting it a fresh membership scope, then fire
    /// `added`.
    pub fn push(&self, item: T) {
        self.inner
            .borrow_mut()
            .items
            .push((item.clone(), Scope::new()));
        self.added.fire(&item);
    }

    /// Insert an item at `index`, granting it a fresh membership scope,
    /// then fire `added`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len()`.
    pub fn insert(&self, index: usize, item: T) {
        self.inner
            .borrow_mut()
            .items
            .insert(index, (item.clone(), Scope::new()));
        self.added.fire(&item);
    }

    /// Remove the first element equal to `item`. Returns whether anything
    /// was removed.
    pub fn remove(&self, item: &T) -> bool {
        let position = self
            .inner
            .borrow()
            .items
            .iter()
            .position(|(contained, _)| contained == item);
        match position {
            Some(index) => {
                self.remove_at(index);
                true
            }
            None => false,
        }
    }

    /// Remove and return the element at `index`. Its membership scope is
    /// disposed, then `removed` fires.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn remove_at(&self, index: usize) -> T {
        let (item, scope) = self.inner.borrow_mut().items.remove(index);
        scope.dispose();
        self.removed.fire(&item);
        item
    }

    /// Replace the element at `index`. Net effect: removed(old) with its
    /// scope disposed, then added(new) with a fresh scope.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn set(&self, index: usize, item: T) {
        let (old, old_scope) = {
            let mut inner = self.inner.borrow_mut();
            std::mem::replace(&mut inner.items[index], (item.clone(), Scope::new()))
        };
        old_scope.dispose();
        self.removed.fire(&old);
        self.added.fire(&item);
    }

    /// Remove every element, front to back: each membership scope is
    /// disposed and `removed` fired per element.
    pub fn clear(&self) {
        let drained: Vec<(T, Scope)> = self.inner.borrow_mut().items.drain(..).collect();
        trace!(removed = drained.len(), "sequence cleared");
        for (item, scope) in drained {
            scope.dispose();
            self.removed.fire(&item);
        }
    }

    /// The element at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.inner
            .borrow()
            .items
            .get(index)
            .map(|(item, _)| item.clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().items.is_empty()
    }

    /// Whether any contained element equals `item`.
    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.inner
            .borrow()
            .items
            .iter()
            .any(|(contained, _)| contained == item)
    }

    /// Snapshot of the current elements, in order.
    #[must_use]
    pub fn items(&self) -> Vec<T> {
        self.inner
            .borrow()
            .items
            .iter()
            .map(|(item, _)| item.clone())
            .collect()
    }

    /// The scope spanning `item`'s current membership (first match for
    /// duplicates).
    ///
    /// # Errors
    ///
    /// [`MembershipError::AbsentItem`] if no contained element equals
    /// `item`.
    pub fn membership_scope(&self, item: &T) -> Result<Scope, MembershipError> {
        self.inner
            .borrow()
            .items
            .iter()
            .find(|(contained, _)| contained == item)
            .map(|(_, scope)| scope.clone())
            .ok_or(MembershipError::AbsentItem)
    }

    /// The signal firing once per added element.
    #[must_use]
    pub fn added(&self) -> Signal<T> {
        self.added.clone()
    }

    /// The signal firing once per removed element.
    #[must_use]
    pub fn removed(&self) -> Signal<T> {
        self.removed.clone()
    }

    /// Materialize-and-maintain subscription.
    ///
    /// Contract:
    /// 1. At registration, `on_added` replays once per present element, in
    ///    order (a replay, not a mutation).
    /// 2. After the replay, `on_changed` fires exactly once — even when the
    ///    replay was empty.
    /// 3. Each later individual addition fires `on_added` then one
    ///    `on_changed`; each removal fires `on_removed` then one
    ///    `on_changed`.
    /// 4. Disposing `scope` detaches all three hooks.
    ///
    /// The batched `on_changed` during replay lets consumers build their
    /// initial view in one pass, then treat `on_changed` as "a redraw is
    /// due" per discrete later change. Registering against an
    /// already-disposed scope does nothing, replay included.
    pub fn synchronize_for_scope(
        &self,
        on_added: impl Fn(&T) + 'static,
        on_removed: impl Fn(&T) + 'static,
        on_changed: impl Fn() + 'static,
        scope: &Scope,
    ) {
        if scope.is_disposed() {
            return;
        }
        let on_added = Rc::new(on_added);
        let on_changed = Rc::new(on_changed);

        for item in self.items() {
            on_added(&item);
        }
        on_changed();

        {
            let on_added = Rc::clone(&on_added);
            let on_changed = Rc::clone(&on_changed);
            self.added.subscribe_for_scope(
                move |item| {
                    on_added(item);
                    on_changed();
                },
                scope,
            );
        }
        {
            let on_changed = Rc::clone(&on_changed);
            self.removed.subscribe_for_scope(
                move |item| {
                    on_removed(item);
                    on_changed();
                },
                scope,
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
