//! Observable reducer-driven state container.
//!
//! A [`Store`] holds a single state value that changes only through named
//! actions dispatched against a fixed [`ActionTable`]. Every successful
//! dispatch replaces the state and synchronously notifies subscribers in
//! registration order before `dispatch` returns. Unknown actions are a
//! logged no-op.
//!
//! The model is single-threaded: listeners run on the dispatching call
//! stack, may dispatch again (nested full passes, no queuing), and may
//! subscribe or unsubscribe mid-pass.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use tracing::warn;

use crate::types::Value;

/// Pure state-transition function: `(current state, payload) -> next state`.
///
/// Reducers must not mutate the previous state in place and must not touch
/// the store that invokes them; they return a fresh top-level value.
pub type Reducer<S> = Rc<dyn Fn(&S, Option<&Value>) -> S>;

type Listener<S> = Rc<dyn Fn(&S)>;

/// Named reducer table, fixed for the lifetime of the store it is given to.
///
/// # Examples
///
/// ```
/// use statekit_core::{ActionTable, Store, Value};
///
/// let actions = ActionTable::new()
///     .with_action("add", |state: &i64, payload: Option<&Value>| {
///         state + payload.and_then(Value::as_int).unwrap_or(1)
///     });
/// let store = Store::new(0, actions);
/// store.dispatch("add", Some(&Value::Int(5)));
/// assert_eq!(store.get_state(), 5);
/// ```
pub struct ActionTable<S> {
    reducers: BTreeMap<String, Reducer<S>>,
}

impl<S: 'static> ActionTable<S> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reducers: BTreeMap::new(),
        }
    }

    /// Adds a named reducer, replacing any previous reducer of that name.
    #[must_use]
    pub fn with_action(
        mut self,
        name: impl Into<String>,
        reducer: impl Fn(&S, Option<&Value>) -> S + 'static,
    ) -> Self {
        self.reducers.insert(name.into(), Rc::new(reducer));
        self
    }

    /// Reports whether an action of that name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.reducers.contains_key(name)
    }

    /// Number of registered actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.reducers.len()
    }

    /// Whether the table has no actions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reducers.is_empty()
    }
}

impl<S: 'static> Default for ActionTable<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Registered listeners in insertion order, each under a stable id.
struct Subscribers<S> {
    entries: Vec<(u64, Listener<S>)>,
    next_id: u64,
}

impl<S> Subscribers<S> {
    fn contains(&self, id: u64) -> bool {
        self.entries.iter().any(|(entry_id, _)| *entry_id == id)
    }
}

/// Handle for removing one registered listener.
///
/// Holds a weak reference to the store's listener list, so unsubscribing
/// after the store is gone is a no-op rather than an error. Dropping the
/// handle without calling [`unsubscribe`](Self::unsubscribe) leaves the
/// listener registered.
pub struct Subscription<S> {
    id: u64,
    subscribers: Weak<RefCell<Subscribers<S>>>,
}

impl<S> Subscription<S> {
    /// Removes exactly the listener this handle was returned for.
    ///
    /// Safe to call during a notification pass: the listener is skipped for
    /// the remainder of that pass.
    pub fn unsubscribe(self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            subscribers
                .borrow_mut()
                .entries
                .retain(|(entry_id, _)| *entry_id != self.id);
        }
    }
}

/// Observable state container.
///
/// # Examples
///
/// ```
/// use statekit_core::{deep, ActionTable, Store, Value};
///
/// let store = Store::new(
///     Value::map([("count", Value::Int(0))]),
///     ActionTable::new().with_action("increment", |state: &Value, _| {
///         let next = deep::clone(state);
///         let count = next.get("count").and_then(|c| c.as_int()).unwrap_or(0);
///         next.insert("count", Value::Int(count + 1));
///         next
///     }),
/// );
///
/// store.dispatch("increment", None);
/// assert_eq!(store.get_state().get("count").and_then(|c| c.as_int()), Some(1));
/// ```
pub struct Store<S> {
    actions: ActionTable<S>,
    initial: S,
    state: RefCell<S>,
    subscribers: Rc<RefCell<Subscribers<S>>>,
}

impl<S: Clone + 'static> Store<S> {
    /// Creates a store with its initial state and its (henceforth fixed)
    /// action table.
    #[must_use]
    pub fn new(initial: S, actions: ActionTable<S>) -> Self {
        Self {
            actions,
            state: RefCell::new(initial.clone()),
            initial,
            subscribers: Rc::new(RefCell::new(Subscribers {
                entries: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Returns the current state: the value produced by the most recent
    /// successful dispatch (or reset), or the initial value.
    #[must_use]
    pub fn get_state(&self) -> S {
        self.state.borrow().clone()
    }

    /// Dispatches a named action.
    ///
    /// When `action` is registered, its reducer computes the next state from
    /// the current state and `payload`, the state is replaced, and every
    /// registered subscriber is invoked synchronously with the new state
    /// before this method returns; the return value is `true`. An unknown
    /// action logs a diagnostic and changes nothing: no state mutation, no
    /// notifications, return value `false`.
    ///
    /// A panic in the reducer propagates to the caller with the state
    /// unchanged.
    pub fn dispatch(&self, action: &str, payload: Option<&Value>) -> bool {
        let Some(reducer) = self.actions.reducers.get(action) else {
            warn!(action, "unknown action dispatched");
            return false;
        };
        // No store borrow is held while the reducer runs.
        let current = self.get_state();
        let next = reducer(&current, payload);
        *self.state.borrow_mut() = next.clone();
        self.notify(&next);
        true
    }

    /// Restores the initial state and runs a full notification pass, as if
    /// a dispatch had produced the initial value.
    pub fn reset(&self) {
        let initial = self.initial.clone();
        *self.state.borrow_mut() = initial.clone();
        self.notify(&initial);
    }

    /// Registers a listener, invoked after every state change in
    /// registration order. Listeners registered during a notification pass
    /// are first invoked on the next pass.
    pub fn subscribe(&self, listener: impl Fn(&S) + 'static) -> Subscription<S> {
        let mut subscribers = self.subscribers.borrow_mut();
        let id = subscribers.next_id;
        subscribers.next_id += 1;
        subscribers.entries.push((id, Rc::new(listener)));
        Subscription {
            id,
            subscribers: Rc::downgrade(&self.subscribers),
        }
    }

    /// Number of currently registered listeners.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().entries.len()
    }

    /// One notification pass over a snapshot of the listener list.
    ///
    /// Listeners run without any store borrow held, so they may dispatch,
    /// subscribe, or unsubscribe. A listener unsubscribed mid-pass is
    /// skipped via the liveness re-check.
    fn notify(&self, state: &S) {
        let snapshot: Vec<(u64, Listener<S>)> = self.subscribers.borrow().entries.clone();
        for (id, listener) in snapshot {
            if self.subscribers.borrow().contains(id) {
                listener(state);
            }
        }
    }
}
