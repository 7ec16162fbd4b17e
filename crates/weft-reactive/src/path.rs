#![forbid(unsafe_code)]

//! Dotted-path binding across a graph of entities.
//!
//! [`bind_path`] keeps a handler wired to `root.A.B.C` while the links of
//! the chain are replaced out from under it: each non-null intermediate
//! entity carries one property subscription named for the next segment, and
//! a change at segment *i* tears down every subscription strictly to its
//! right, re-resolves from the newly-read value, re-subscribes, and
//! delivers the recomputed terminal value. Declarative markup binds
//! view-model paths to control properties through exactly this mechanism.
//!
//! # Invariants
//!
//! 1. A null (or scalar) intermediate link is not an error: onward segments
//!    resolve to `Null`, the defined "no value yet" state.
//! 2. The handler fires once per segment change, with the terminal value
//!    recomputed after the rebuild — no equal-value suppression at the
//!    binder level.
//! 3. The handler never fires at bind time.
//! 4. Detaching (or disposing the owning scope) tears down every
//!    currently-held segment subscription before returning; zero
//!    invocations afterwards.
//!
//! # Failure Modes
//!
//! - **Malformed path** (`""`, `"A..B"`, trailing dot): rejected at bind
//!   time with [`PathError`]; nothing is subscribed.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::entity::Entity;
use crate::scope::Scope;
use crate::signal::SignalBinding;
use crate::value::Value;

/// Error from binding a malformed path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The path string was empty.
    EmptyPath,
    /// A segment between dots was empty, e.g. `"A..B"`.
    EmptySegment {
        /// Zero-based index of the offending segment.
        index: usize,
    },
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPath => write!(f, "path expression is empty"),
            Self::EmptySegment { index } => {
                write!(f, "path segment {index} is empty")
            }
        }
    }
}

impl std::error::Error for PathError {}

struct PathState {
    root: Entity,
    segments: Vec<String>,
    /// Per-segment property subscription: `bindings[i]` lives on the entity
    /// resolved at depth `i`, watching `segments[i]`. `None` past the first
    /// null link.
    bindings: Vec<Option<SignalBinding>>,
    handler: Rc<dyn Fn(&Value)>,
    detached: bool,
}

/// Bind `handler` to the dotted `path` rooted at `root`, torn down when
/// `scope` disposes.
///
/// # Errors
///
/// [`PathError`] if the path expression is malformed.
pub fn bind_path(
    root: &Entity,
    path: &str,
    handler: impl Fn(&Value) + 'static,
    scope: &Scope,
) -> Result<(), PathError> {
    let binding = bind_path_unmanaged(root, path, handler)?;
    scope.add_cleanup(move || binding.detach());
    Ok(())
}

/// Bind `handler` to the dotted `path` rooted at `root` without lifetime
/// management. The returned binding must be detached explicitly; detach is
/// idempotent and synchronous.
///
/// # Errors
///
/// [`PathError`] if the path expression is malformed.
pub fn bind_path_unmanaged(
    root: &Entity,
    path: &str,
    handler: impl Fn(&Value) + 'static,
) -> Result<SignalBinding, PathError> {
    let segments = parse_path(path)?;
    let segment_count = segments.len();

    let state = Rc::new(RefCell::new(PathState {
        root: root.clone(),
        segments,
        bindings: (0..segment_count).map(|_| None).collect(),
        handler: Rc::new(handler),
        detached: false,
    }));

    wire_from(&state, 0);

    let detach_state = Rc::clone(&state);
    Ok(SignalBinding::from_fn(move || {
        let bindings = {
            let mut st = detach_state.borrow_mut();
            st.detached = true;
            st.bindings
                .iter_mut()
                .filter_map(Option::take)
                .collect::<Vec<_>>()
        };
        for binding in bindings {
            binding.detach();
        }
    }))
}

fn parse_path(path: &str) -> Result<Vec<String>, PathError> {
    if path.is_empty() {
        return Err(PathError::EmptyPath);
    }
    let segments: Vec<String> = path.split('.').map(str::to_string).collect();
    for (index, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            return Err(PathError::EmptySegment { index });
        }
    }
    Ok(segments)
}

/// Walk the chain from the root and (re-)subscribe every reachable segment
/// at depth >= `from`. Segments left of `from` keep their subscriptions.
fn wire_from(state: &Rc<RefCell<PathState>>, from: usize) {
    let (root, segments) = {
        let st = state.borrow();
        (st.root.clone(), st.segments.clone())
    };

    let mut entity = Some(root);
    for (depth, segment) in segments.iter().enumerate() {
        let Some(current) = entity else {
            break; // null link: nothing onward to watch
        };
        if depth >= from {
            let rebuild_state = Rc::clone(state);
            let next = depth + 1;
            let binding = current.subscribe_unmanaged_for_property(segment, move |_| {
                on_segment_changed(&rebuild_state, next);
            });
            state.borrow_mut().bindings[depth] = Some(binding);
        }
        entity = current.get(segment).as_entity().cloned();
    }
}

/// A segment's watched property changed: tear down everything strictly to
/// its right, rebuild from the newly-read chain, then deliver the
/// recomputed terminal value.
fn on_segment_changed(state: &Rc<RefCell<PathState>>, from: usize) {
    let torn_down = {
        let mut st = state.borrow_mut();
        if st.detached {
            return;
        }
        st.bindings[from..]
            .iter_mut()
            .filter_map(Option::take)
            .collect::<Vec<_>>()
    };
    for binding in torn_down {
        binding.detach();
    }

    wire_from(state, from);

    let (root, segments, handler) = {
        let st = state.borrow();
        (st.root.clone(), st.segments.clone(), Rc::clone(&st.handler))
    };
    let value = terminal_value(&root, &segments);
    debug!(segment = from - 1, "path segment changed, rebound");
    handler(&value);
}

/// Resolve the chain to its terminal value. A null or scalar link makes
/// every remaining segment resolve to `Null`.
fn terminal_value(root: &Entity, segments: &[String]) -> Value {
    let mut entity = Some(root.clone());
    let mut value = Value::Null;
    for segment in segments {
        match entity {
            Some(current) => {
                value = current.get(segment);
                entity = value.as_entity().cloned();
            }
            None => {
                value = Value::Null;
            }
        }
    }
    value
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn record(values: &Rc<RefCell<Vec<Value>>>) -> impl Fn(&Value) + 'static {
        let values = Rc::clone(values);
        move |value| values.borrow_mut().push(value.clone())
    }

    #[test]
    fn malformed_paths_are_rejected() {
        let root = Entity::new();
        assert_eq!(
            bind_path_unmanaged(&root, "", |_| {}).err(),
            Some(PathError::EmptyPath)
        );
        assert_eq!(
            bind_path_unmanaged(&root, "A..B", |_| {}).err(),
            Some(PathError::EmptySegment { index: 1 })
        );
        assert_eq!(
            bind_path_unmanaged(&root, "A.", |_| {}).err(),
            Some(PathError::EmptySegment { index: 1 })
        );
    }

    #[test]
    fn bind_does_not_fire_at_registration() {
        let root = Entity::new();
        root.set("name", "x");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _binding = bind_path_unmanaged(&root, "name", record(&seen)).expect("valid path");
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn single_segment_tracks_property() {
        let root = Entity::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let binding = bind_path_unmanaged(&root, "name", record(&seen)).expect("valid path");

        root.set("name", "a");
        root.set("name", "b");
        assert_eq!(
            *seen.borrow(),
            vec![Value::Str("a".into()), Value::Str("b".into())]
        );

        binding.detach();
        root.set("name", "c");
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn null_intermediate_link_resolves_to_null() {
        let root = Entity::new();
        let a = Entity::new();
        root.set("A", a); // A.B is unset: B null, C unreachable
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _binding = bind_path_unmanaged(&root, "A.B.C", record(&seen)).expect("valid path");

        // Replacing A still just yields null terminals, without error.
        root.set("A", Entity::new());
        assert_eq!(*seen.borrow(), vec![Value::Null]);
    }

    #[test]
    fn handler_fires_for_intermediate_then_terminal_assignment() {
        let root = Entity::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _binding = bind_path_unmanaged(&root, "A.B", record(&seen)).expect("valid path");

        let a = Entity::new();
        root.set("A", a.clone()); // B still null
        a.set("B", 5);
        assert_eq!(*seen.borrow(), vec![Value::Null, Value::Int(5)]);
    }

    #[test]
    fn scalar_intermediate_behaves_like_null() {
        let root = Entity::new();
        root.set("A", 3);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _binding = bind_path_unmanaged(&root, "A.B", record(&seen)).expect("valid path");

        root.set("A", 4); // scalar again: no onward properties
        assert_eq!(*seen.borrow(), vec![Value::Null]);
    }

    #[test]
    fn stale_subtree_subscriptions_are_torn_down() {
        let root = Entity::new();
        let old = Entity::new();
        root.set("A", old.clone());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _binding = bind_path_unmanaged(&root, "A.B", record(&seen)).expect("valid path");

        root.set("A", Entity::new()); // fires once, null terminal
        let fired_before = seen.borrow().len();

        // Mutating the detached old subtree must not reach the handler.
        old.set("B", 99);
        assert_eq!(seen.borrow().len(), fired_before);
    }

    #[test]
    fn scoped_binding_tears_down_on_disposal() {
        let root = Entity::new();
        let a = Entity::new();
        root.set("A", a.clone());
        let scope = Scope::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        bind_path(&root, "A.B", record(&seen), &scope).expect("valid path");

        a.set("B", 1);
        assert_eq!(seen.borrow().len(), 1);

        scope.dispose();
        a.set("B", 2);
        root.set("A", Entity::new());
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn wholesale_replacement_rewires_to_new_subtree() {
        let root = Entity::new();
        let first = Entity::new();
        first.set("B", 1);
        root.set("A", first);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _binding = bind_path_unmanaged(&root, "A.B", record(&seen)).expect("valid path");

        let second = Entity::new();
        second.set("B", 2);
        root.set("A", second.clone());
        assert_eq!(*seen.borrow(), vec![Value::Int(2)]);

        second.set("B", 3);
        assert_eq!(*seen.borrow(), vec![Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn sibling_property_changes_do_not_fire() {
        let root = Entity::new();
        let a = Entity::new();
        root.set("A", a.clone());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _binding = bind_path_unmanaged(&root, "A.B", record(&seen)).expect("valid path");

        a.set("unrelated", 1);
        root.set("other", 2);
        assert!(seen.borrow().is_empty());
    }
}
