#![forbid(unsafe_code)]

//! # weft-reactive
//!
//! Reactive state propagation core for the WeftTUI terminal application
//! framework.
//!
//! Every higher layer — control binding, collection-backed views, physics
//! state, markup binding — is built on five primitives, leaves first:
//!
//! - [`Scope`] — a disposable handle bounding how long something stays
//!   wired up. Disposal is idempotent, synchronous, and re-entrancy safe.
//! - [`Signal`] — an ordered publish/subscribe channel with unmanaged,
//!   scope-managed, and fire-once subscription modes, dispatching to a
//!   snapshot of its handlers.
//! - [`Entity`] — an observable property bag: name-keyed [`Value`]s, one
//!   lazily-created signal per property, a wildcard channel, and
//!   equal-value suppression.
//! - [`Sequence`] — an observable ordered container firing added/removed
//!   per net effect and granting each element a membership-duration scope.
//! - [`bind_path`] — keeps a handler wired through a dotted chain of
//!   property names (`"A.B.C"`) across a graph of entities, rewiring as
//!   intermediate links change.
//!
//! # Concurrency model
//!
//! Single logical thread, no hidden queuing: `fire`, `set`, sequence
//! mutation, and path rebinds run synchronously to completion on the
//! caller's stack. Nothing here is `Send` or `Sync`; interior sharing is
//! `Rc`/`RefCell`. Cancellation is expressed entirely through [`Scope`]
//! disposal — when `dispose()` returns, no future notification reaches the
//! scope's handlers.
//!
//! # Handler failure policy
//!
//! Abort-and-propagate, uniformly: a panicking handler unwinds out of the
//! dispatching call. Snapshots are collected and interior borrows released
//! before handlers run, so an unwind never corrupts a handler list and
//! later dispatches reach every surviving handler.

pub mod entity;
pub mod path;
pub mod scope;
pub mod sequence;
pub mod signal;
pub mod value;

pub use entity::{Entity, PropertyChange};
pub use path::{PathError, bind_path, bind_path_unmanaged};
pub use scope::Scope;
pub use sequence::{MembershipError, Sequence};
pub use signal::{Signal, SignalBinding};
pub use value::Value;
