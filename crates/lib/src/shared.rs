//! Shared ownership of a map with re-entrant mutation.
//!
//! Listeners run while the tree is in the middle of a mutation, so a plain
//! [`NestedMap`] cannot be touched from inside one of its own listeners.
//! [`SharedMap`] makes that possible with a fixed ordering contract:
//!
//! - A mutation requested while another one is delivering events is queued
//!   and reported as [`Applied::Queued`].
//! - The queue is drained in request order once the running cascade has
//!   finished, so every listener sees all events of one mutation before any
//!   event of a mutation requested from inside it.
//! - Queued mutations that fail are logged and kept for
//!   [`SharedMap::take_deferred_errors`].
//! - Reads during a cascade fail with [`ContainerError::Busy`].
//!
//! Listeners that capture a `SharedMap` keep the whole tree alive; capture a
//! [`WeakSharedMap`] instead.

use std::{
    cell::RefCell,
    collections::VecDeque,
    fmt,
    rc::{Rc, Weak},
};

use tracing::{debug, trace, warn};

use crate::{
    Error, NestedMap, Result, Value,
    errors::ContainerError,
    event::{Event, EventKinds, Observable, SubscriptionId},
    map::{MapOptions, Node},
    path::PathBuf,
};

/// How a mutation requested through a [`SharedMap`] was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied<T> {
    /// The mutation ran immediately and produced `T`.
    Now(T),
    /// Another mutation was delivering events; this one runs after it.
    Queued,
}

impl<T> Applied<T> {
    /// Returns true if the mutation was deferred.
    pub fn is_queued(&self) -> bool {
        matches!(self, Applied::Queued)
    }

    /// Returns the immediate result, if there is one.
    pub fn now(self) -> Option<T> {
        match self {
            Applied::Now(value) => Some(value),
            Applied::Queued => None,
        }
    }
}

type Deferred = Box<dyn FnOnce(&mut NestedMap) -> Result<()>>;

struct Pending {
    op: &'static str,
    path: PathBuf,
    apply: Deferred,
}

struct Inner {
    map: RefCell<NestedMap>,
    pending: RefCell<VecDeque<Pending>>,
    deferred_errors: RefCell<Vec<Error>>,
}

/// A reference-counted [`NestedMap`] that tolerates mutation from listeners.
///
/// ```
/// use nestmap::{SharedMap, MapOptions, event::EventKinds, path};
///
/// let shared = SharedMap::new(MapOptions::default());
/// let weak = shared.downgrade();
/// // Mirror every add under "in" into "out".
/// shared.subscribe(EventKinds::ALL, move |event| {
///     if event.path().head().is_ok_and(|key| key.as_text() == Some("in")) {
///         if let (Some(map), Some(value)) = (weak.upgrade(), event.value()) {
///             let queued = map.add(path!["out"], value).unwrap();
///             assert!(queued.is_queued());
///         }
///     }
/// })?;
///
/// shared.add(path!["in"], 1)?;
/// assert_eq!(shared.size()?, 2);
/// # Ok::<(), nestmap::Error>(())
/// ```
#[derive(Clone)]
pub struct SharedMap {
    inner: Rc<Inner>,
}

/// A non-owning handle to a [`SharedMap`].
#[derive(Clone)]
pub struct WeakSharedMap {
    inner: Weak<Inner>,
}

impl WeakSharedMap {
    /// Returns the map if it is still alive.
    pub fn upgrade(&self) -> Option<SharedMap> {
        self.inner.upgrade().map(|inner| SharedMap { inner })
    }
}

impl SharedMap {
    /// Creates an empty shared map.
    pub fn new(options: MapOptions) -> Self {
        NestedMap::with_options(options).into()
    }

    /// Returns a handle that does not keep the map alive.
    pub fn downgrade(&self) -> WeakSharedMap {
        WeakSharedMap {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Runs `f` against the current tree.
    ///
    /// # Errors
    /// Returns [`ContainerError::Busy`] while a mutation is delivering
    /// events.
    pub fn read<R>(&self, f: impl FnOnce(&NestedMap) -> R) -> Result<R> {
        let result = {
            let map = self
                .inner
                .map
                .try_borrow()
                .map_err(|_| ContainerError::Busy)?;
            f(&map)
        };
        // `f` may have requested mutations while holding the tree
        self.drain();
        Ok(result)
    }

    /// Returns the number of leaf values in the tree.
    pub fn size(&self) -> Result<usize> {
        self.read(NestedMap::size)
    }

    /// Registers a listener on the root.
    pub fn subscribe(
        &self,
        kinds: impl Into<EventKinds>,
        handler: impl Fn(&Event) + 'static,
    ) -> Result<SubscriptionId> {
        let kinds = kinds.into();
        self.read(move |map| map.subscribe(kinds, handler))
    }

    /// Removes a root listener.
    pub fn unsubscribe(&self, id: SubscriptionId) -> Result<bool> {
        self.read(|map| map.unsubscribe(id))
    }

    /// See [`NestedMap::add`].
    pub fn add(&self, path: impl Into<PathBuf>, value: impl Into<Node>) -> Result<Applied<()>> {
        let path = path.into();
        let node = value.into();
        self.submit("add", path.clone(), move |map| map.add(path, node))
    }

    /// See [`NestedMap::set`].
    pub fn set(&self, path: impl Into<PathBuf>, value: impl Into<Node>) -> Result<Applied<()>> {
        let path = path.into();
        let node = value.into();
        self.submit("set", path.clone(), move |map| map.set(path, node))
    }

    /// See [`NestedMap::delete`].
    pub fn delete(&self, path: impl Into<PathBuf>) -> Result<Applied<bool>> {
        let path = path.into();
        self.submit("delete", path.clone(), move |map| Ok(map.delete(path)))
    }

    /// See [`NestedMap::delete_value`].
    pub fn delete_value(
        &self,
        path: impl Into<PathBuf>,
        value: impl Into<Value>,
    ) -> Result<Applied<bool>> {
        let path = path.into();
        let value = value.into();
        self.submit("delete_value", path.clone(), move |map| {
            Ok(map.delete_value(path, &value))
        })
    }

    /// See [`NestedMap::clear`].
    pub fn clear(&self, path: impl Into<PathBuf>) -> Result<Applied<bool>> {
        let path = path.into();
        self.submit("clear", path.clone(), move |map| Ok(map.clear(path)))
    }

    /// See [`NestedMap::update_with_literal`].
    pub fn update_with_literal(
        &self,
        new_value: impl Into<Node>,
        path: impl Into<PathBuf>,
        old_value: Option<Value>,
    ) -> Result<Applied<bool>> {
        let path = path.into();
        let node = new_value.into();
        self.submit("update", path.clone(), move |map| {
            map.update_with_literal(node, path, old_value.as_ref())
        })
    }

    /// See [`NestedMap::purge_empty_containers`].
    pub fn purge_empty_containers(&self) -> Result<Applied<usize>> {
        self.submit("purge", PathBuf::new(), |map| {
            Ok(map.purge_empty_containers())
        })
    }

    /// Returns the number of mutations waiting for the running cascade.
    pub fn pending_count(&self) -> usize {
        self.inner.pending.borrow().len()
    }

    /// Takes the errors of queued mutations that failed when they ran.
    pub fn take_deferred_errors(&self) -> Vec<Error> {
        std::mem::take(&mut *self.inner.deferred_errors.borrow_mut())
    }

    fn submit<T: 'static>(
        &self,
        op: &'static str,
        path: PathBuf,
        apply: impl FnOnce(&mut NestedMap) -> Result<T> + 'static,
    ) -> Result<Applied<T>> {
        let result = match self.inner.map.try_borrow_mut() {
            Ok(mut map) => apply(&mut map),
            Err(_) => {
                debug!(op, path = %path, "Queueing mutation behind running cascade");
                self.inner.pending.borrow_mut().push_back(Pending {
                    op,
                    path,
                    apply: Box::new(move |map| apply(map).map(|_| ())),
                });
                return Ok(Applied::Queued);
            }
        };
        self.drain();
        result.map(Applied::Now)
    }

    fn drain(&self) {
        loop {
            let Ok(mut map) = self.inner.map.try_borrow_mut() else {
                // The outermost holder drains when it lets go
                return;
            };
            let Some(pending) = self.inner.pending.borrow_mut().pop_front() else {
                return;
            };

            trace!(op = pending.op, path = %pending.path, "Applying queued mutation");
            if let Err(err) = (pending.apply)(&mut map) {
                warn!(
                    op = pending.op,
                    path = %pending.path,
                    error = %err,
                    "Queued mutation failed"
                );
                self.inner.deferred_errors.borrow_mut().push(err);
            }
        }
    }
}

impl From<NestedMap> for SharedMap {
    fn from(map: NestedMap) -> Self {
        Self {
            inner: Rc::new(Inner {
                map: RefCell::new(map),
                pending: RefCell::new(VecDeque::new()),
                deferred_errors: RefCell::new(Vec::new()),
            }),
        }
    }
}

impl fmt::Debug for SharedMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("SharedMap");
        match self.inner.map.try_borrow() {
            Ok(map) => debug.field("map", &*map),
            Err(_) => debug.field("map", &"<busy>"),
        };
        debug
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}
