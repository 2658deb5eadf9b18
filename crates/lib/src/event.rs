//! Change events and the listener registry shared by both containers.
//!
//! Every container holds an [`Emitter`] and exposes it through the
//! [`Observable`] trait. Listeners are registered for one or more
//! [`EventKind`]s and receive each matching [`Event`] synchronously, in
//! registration order. Registration returns a [`SubscriptionId`] which is the
//! only thing needed to remove the listener again.
//!
//! # Event paths
//!
//! An event's path is relative to the container whose listeners receive it.
//! When a map re-emits an event raised by one of its children it prefixes the
//! path with the child's key, so a listener on the root always sees paths
//! from the root. The paths inside a `deleted` list are relative to the
//! event's own path; [`Event::deleted_paths`] joins them.

use std::{
    cell::RefCell,
    fmt,
    ops::BitOr,
    rc::Rc,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::{
    Value,
    path::{Key, Path, PathBuf},
};

/// The kind of mutation an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Add,
    Delete,
    Clear,
}

impl EventKind {
    /// Returns the lowercase name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Add => "add",
            EventKind::Delete => "delete",
            EventKind::Clear => "clear",
        }
    }

    fn bit(self) -> u8 {
        match self {
            EventKind::Add => 0b001,
            EventKind::Delete => 0b010,
            EventKind::Clear => 0b100,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of event kinds a listener is interested in.
///
/// ```
/// # use nestmap::event::{EventKind, EventKinds};
/// let kinds = EventKind::Add | EventKind::Delete;
/// assert!(kinds.contains(EventKind::Delete));
/// assert!(!kinds.contains(EventKind::Clear));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventKinds(u8);

impl EventKinds {
    pub const NONE: EventKinds = EventKinds(0);
    pub const ALL: EventKinds = EventKinds(0b111);

    /// Returns true if `kind` is part of this set.
    pub fn contains(self, kind: EventKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Returns true if no kind is part of this set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl Default for EventKinds {
    fn default() -> Self {
        EventKinds::ALL
    }
}

impl From<EventKind> for EventKinds {
    fn from(kind: EventKind) -> Self {
        EventKinds(kind.bit())
    }
}

impl<const N: usize> From<[EventKind; N]> for EventKinds {
    fn from(kinds: [EventKind; N]) -> Self {
        kinds
            .into_iter()
            .fold(EventKinds::NONE, |acc, kind| acc | kind)
    }
}

impl BitOr<EventKind> for EventKinds {
    type Output = EventKinds;

    fn bitor(self, rhs: EventKind) -> EventKinds {
        EventKinds(self.0 | rhs.bit())
    }
}

impl BitOr for EventKinds {
    type Output = EventKinds;

    fn bitor(self, rhs: EventKinds) -> EventKinds {
        EventKinds(self.0 | rhs.0)
    }
}

impl BitOr for EventKind {
    type Output = EventKinds;

    fn bitor(self, rhs: EventKind) -> EventKinds {
        EventKinds::from(self) | rhs
    }
}

/// A leaf value together with its path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Entry {
    pub path: PathBuf,
    pub value: Value,
}

impl Entry {
    pub fn new(path: impl Into<PathBuf>, value: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
        }
    }
}

/// What an add event inserted.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", content = "content", rename_all = "lowercase")]
pub enum Added {
    /// A single leaf value went into a set
    Value(Value),
    /// A whole set was attached; holds a snapshot of its values
    Set(Vec<Value>),
    /// A whole map was attached; holds a snapshot of its leaf entries,
    /// relative to the event path
    Map(Vec<Entry>),
}

impl Added {
    /// Number of leaf values this addition contributed.
    pub fn leaf_count(&self) -> usize {
        match self {
            Added::Value(_) => 1,
            Added::Set(values) => values.len(),
            Added::Map(entries) => entries.len(),
        }
    }
}

/// A change notification.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    /// Something was added at `path`.
    Add { path: PathBuf, value: Added },
    /// Something was removed at `path`. `value` is set when a single leaf was
    /// deleted from a set; it is `None` when a whole container was removed.
    Delete {
        path: PathBuf,
        value: Option<Value>,
        deleted: Vec<Entry>,
    },
    /// The container at `path` was emptied.
    Clear { path: PathBuf, deleted: Vec<Entry> },
}

impl Event {
    /// Returns the kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Add { .. } => EventKind::Add,
            Event::Delete { .. } => EventKind::Delete,
            Event::Clear { .. } => EventKind::Clear,
        }
    }

    /// Returns the path of the affected location.
    pub fn path(&self) -> &Path {
        match self {
            Event::Add { path, .. } | Event::Delete { path, .. } | Event::Clear { path, .. } => {
                path
            }
        }
    }

    /// Returns what an add event inserted.
    pub fn added(&self) -> Option<&Added> {
        match self {
            Event::Add { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Returns the single leaf value an event is about, if any.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Event::Add {
                value: Added::Value(value),
                ..
            } => Some(value),
            Event::Delete { value, .. } => value.as_ref(),
            _ => None,
        }
    }

    /// Returns the removed entries, relative to [`Event::path`].
    pub fn deleted(&self) -> &[Entry] {
        match self {
            Event::Delete { deleted, .. } | Event::Clear { deleted, .. } => deleted,
            Event::Add { .. } => &[],
        }
    }

    /// Returns the removed entries with paths relative to the receiving
    /// container.
    pub fn deleted_paths(&self) -> impl Iterator<Item = (PathBuf, &Value)> {
        let base = self.path();
        self.deleted()
            .iter()
            .map(move |entry| (base.join(&entry.path), &entry.value))
    }

    /// Change in leaf count this event describes.
    pub(crate) fn size_delta(&self) -> isize {
        match self {
            Event::Add { value, .. } => value.leaf_count() as isize,
            Event::Delete { deleted, .. } | Event::Clear { deleted, .. } => {
                -(deleted.len() as isize)
            }
        }
    }

    /// Re-addresses this event one level up, under `key`.
    pub(crate) fn rebase(self, key: &Key) -> Self {
        match self {
            Event::Add { path, value } => Event::Add {
                path: path.prepend(key.clone()),
                value,
            },
            Event::Delete {
                path,
                value,
                deleted,
            } => Event::Delete {
                path: path.prepend(key.clone()),
                value,
                deleted,
            },
            Event::Clear { path, deleted } => Event::Clear {
                path: path.prepend(key.clone()),
                deleted,
            },
        }
    }
}

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

/// Handle returned by [`Emitter::subscribe`], used to remove the listener.
///
/// Ids are unique for the whole process, so passing an id to the wrong
/// emitter never removes someone else's listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

struct Listener {
    id: SubscriptionId,
    kinds: EventKinds,
    handler: Rc<dyn Fn(&Event)>,
}

/// A listener registry that delivers events synchronously.
#[derive(Default)]
pub struct Emitter {
    listeners: RefCell<Vec<Listener>>,
}

impl Emitter {
    /// Creates an emitter without listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for the given kinds.
    pub fn subscribe(
        &self,
        kinds: impl Into<EventKinds>,
        handler: impl Fn(&Event) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed));
        self.listeners.borrow_mut().push(Listener {
            id,
            kinds: kinds.into(),
            handler: Rc::new(handler),
        });
        id
    }

    /// Removes a listener. Returns false if `id` is not registered here.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|listener| listener.id != id);
        listeners.len() != before
    }

    /// Returns the number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Delivers `event` to every listener registered for its kind.
    ///
    /// The listener list is captured before the first call, so listeners
    /// added or removed from within a handler take effect with the next
    /// event.
    pub fn fire(&self, event: &Event) {
        let kind = event.kind();
        let handlers: Vec<Rc<dyn Fn(&Event)>> = self
            .listeners
            .borrow()
            .iter()
            .filter(|listener| listener.kinds.contains(kind))
            .map(|listener| Rc::clone(&listener.handler))
            .collect();

        tracing::trace!(
            kind = kind.as_str(),
            path = %event.path(),
            listeners = handlers.len(),
            "Firing event"
        );

        for handler in handlers {
            handler(event);
        }
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Capability of types that emit change events through an [`Emitter`].
pub trait Observable {
    /// Returns the emitter events are delivered through.
    fn emitter(&self) -> &Emitter;

    /// Registers `handler` for the given kinds of events.
    fn subscribe(
        &self,
        kinds: impl Into<EventKinds>,
        handler: impl Fn(&Event) + 'static,
    ) -> SubscriptionId {
        self.emitter().subscribe(kinds, handler)
    }

    /// Removes a listener registered with [`Observable::subscribe`].
    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.emitter().unsubscribe(id)
    }
}
