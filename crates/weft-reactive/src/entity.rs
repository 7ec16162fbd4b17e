#![forbid(unsafe_code)]

//! Observable property bag: field reads/writes as change notifications.
//!
//! An [`Entity`] stores name-keyed [`Value`]s and lazily creates one
//! [`Signal`] per property name, plus a wildcard channel under the reserved
//! name [`Entity::WILDCARD`] that fires on any property mutation. This is
//! the contract every stateful object in the framework exposes — UI
//! controls bind to it, destructible game state publishes through it, and
//! the path binder walks graphs of it.
//!
//! # Invariants
//!
//! 1. Reading an unset property yields `Value::Null`, never an error.
//! 2. Writing a value equal to the stored one stores the new representation
//!    but fires nothing (default; use [`set_always`](Entity::set_always) to
//!    suppress the suppression).
//! 3. One signal per property name: all subscribers for a name share one
//!    ordered channel.
//! 4. Every fired mutation reaches the per-property signal first, then the
//!    wildcard signal.
//! 5. Subscribe variants never fire at registration; synchronize variants
//!    fire exactly once immediately, with current state.
//!
//! # Failure Modes
//!
//! - **Equal-but-different representations** (e.g. strings comparing equal
//!   under a case-insensitive `PartialEq` wrapper): the newly supplied
//!   representation survives the store even when notification is
//!   suppressed.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use crate::scope::Scope;
use crate::signal::{Signal, SignalBinding};
use crate::value::Value;

/// Notification payload for property mutations.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyChange {
    /// The mutated property's name (the literal name, even for wildcard
    /// subscribers).
    pub name: String,
    /// The value now stored under `name`.
    pub value: Value,
}

struct EntityInner {
    values: HashMap<String, Value>,
    /// Lazily-created signal per property name; the wildcard channel lives
    /// under [`Entity::WILDCARD`].
    signals: HashMap<String, Signal<PropertyChange>>,
}

/// An observable property bag.
///
/// Cloning an `Entity` creates a new handle to the **same** property store;
/// equality between handles is identity of that store.
pub struct Entity {
    inner: Rc<RefCell<EntityInner>>,
}

impl Clone for Entity {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Entity")
            .field("properties", &inner.values.len())
            .field("signals", &inner.signals.len())
            .finish()
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity {
    /// Reserved name subscribing to changes of *any* property.
    pub const WILDCARD: &'static str = "*";

    /// Create an empty entity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(EntityInner {
                values: HashMap::new(),
                signals: HashMap::new(),
            })),
        }
    }

    /// Read a property. Unset names yield [`Value::Null`].
    #[must_use]
    pub fn get(&self, name: &str) -> Value {
        self.inner
            .borrow()
            .values
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Write a property, notifying subscribers when the value changed.
    ///
    /// Equal-value suppression applies: if the new value compares equal to
    /// the stored one, the new representation is stored but no signal
    /// fires.
    pub fn set(&self, name: &str, value: impl Into<Value>) {
        self.write(name, value.into(), true);
    }

    /// Write a property, notifying subscribers even when the new value
    /// compares equal to the stored one.
    pub fn set_always(&self, name: &str, value: impl Into<Value>) {
        self.write(name, value.into(), false);
    }

    /// Fire a change notification for `name` without a backing write,
    /// carrying the currently stored value. For derived properties whose
    /// backing state lives elsewhere.
    pub fn fire_property_changed(&self, name: &str) {
        let value = self.get(name);
        self.notify(name, value);
    }

    /// Subscribe to future changes of `name`, bound to `scope`.
    ///
    /// Never fires at registration. `name` may be [`Entity::WILDCARD`].
    pub fn subscribe_for_property(
        &self,
        name: &str,
        handler: impl Fn(&PropertyChange) + 'static,
        scope: &Scope,
    ) {
        self.signal_for(name).subscribe_for_scope(handler, scope);
    }

    /// Subscribe to future changes of `name` without lifetime management;
    /// the caller must detach the returned binding explicitly.
    pub fn subscribe_unmanaged_for_property(
        &self,
        name: &str,
        handler: impl Fn(&PropertyChange) + 'static,
    ) -> SignalBinding {
        self.signal_for(name).subscribe(handler)
    }

    /// Subscribe to future changes of `name` and additionally invoke
    /// `handler` once immediately with current state.
    ///
    /// For a concrete name the immediate invocation carries the stored
    /// value. For [`Entity::WILDCARD`] there is no single current value; the
    /// immediate invocation carries `Value::Null` under the wildcard name
    /// and means "initial sweep due". Registering against an
    /// already-disposed scope does nothing, immediate invocation included.
    pub fn synchronize_for_property(
        &self,
        name: &str,
        handler: impl Fn(&PropertyChange) + 'static,
        scope: &Scope,
    ) {
        if scope.is_disposed() {
            return;
        }
        let initial = PropertyChange {
            name: name.to_string(),
            value: if name == Self::WILDCARD {
                Value::Null
            } else {
                self.get(name)
            },
        };
        handler(&initial);
        self.subscribe_for_property(name, handler, scope);
    }

    /// Names of all properties that have been written. Debug accessor.
    #[must_use]
    pub fn property_names(&self) -> Vec<String> {
        self.inner.borrow().values.keys().cloned().collect()
    }

    fn write(&self, name: &str, value: Value, suppress_equal: bool) {
        let fire = {
            let mut inner = self.inner.borrow_mut();
            let equal = match inner.values.get(name) {
                Some(stored) => *stored == value,
                None => value.is_null(),
            };
            // The new representation always survives the store.
            inner.values.insert(name.to_string(), value.clone());
            !(suppress_equal && equal)
        };
        if fire {
            self.notify(name, value);
        } else {
            debug!(property = name, "equal-value write suppressed");
        }
    }

    /// Fire the per-property signal, then the wildcard signal. Only signals
    /// that already exist fire; nothing is allocated on the notify path.
    fn notify(&self, name: &str, value: Value) {
        let change = PropertyChange {
            name: name.to_string(),
            value,
        };
        let (named, wildcard) = {
            let inner = self.inner.borrow();
            let named = inner.signals.get(name).cloned();
            let wildcard = if name == Self::WILDCARD {
                None
            } else {
                inner.signals.get(Self::WILDCARD).cloned()
            };
            (named, wildcard)
        };
        if let Some(signal) = named {
            signal.fire(&change);
        }
        if let Some(signal) = wildcard {
            signal.fire(&change);
        }
    }

    fn signal_for(&self, name: &str) -> Signal<PropertyChange> {
        self.inner
            .borrow_mut()
            .signals
            .entry(name.to_string())
            .or_default()
            .clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
