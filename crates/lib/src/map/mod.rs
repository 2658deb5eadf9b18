//! The recursive map container.
//!
//! A [`NestedMap`] maps each [`Key`] to exactly one child: a [`NestedSet`]
//! holding leaf values, or another `NestedMap` holding a subtree. Values are
//! addressed by [`Path`]; a path that is fully consumed locates a set,
//! anything longer walks through maps, creating them on demand.
//!
//! # Bubbling
//!
//! Mutations recurse down to the container that actually changes. That
//! container fires its own event and hands it back to its parent, which
//!
//! 1. adjusts its `size` by the leaf delta the event describes,
//! 2. prefixes the event path with the child's key,
//! 3. fires the re-addressed event to its own listeners, and
//! 4. with auto-purge enabled, removes the child if a deletion left it empty,
//!    firing a container delete of its own.
//!
//! The same happens at every ancestor, so a listener on the root observes
//! every change in the tree as one flat stream with paths from the root, and
//! each level's `size` is already updated when its listeners run. Listeners on
//! a deeper container run before those on its ancestors.
//!
//! Children are owned exclusively by their map. A child's listeners are
//! dropped together with the child when it is removed, cleared or purged.
//!
//! # Usage
//!
//! ```
//! use nestmap::{NestedMap, Observable, Value, event::EventKinds, path};
//! use std::{cell::RefCell, rc::Rc};
//!
//! let mut map = NestedMap::new();
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&seen);
//! map.subscribe(EventKinds::ALL, move |event| sink.borrow_mut().push(event.path().to_string()));
//!
//! map.add(path!["view", "filters"], "open")?;
//! map.add(path!["view", "filters"], "mine")?;
//! map.add(path!["view", "page"], 2)?;
//!
//! assert_eq!(map.size(), 3);
//! assert!(map.has_value(path!["view", "filters"], &Value::from("mine")));
//! assert_eq!(*seen.borrow(), vec!["view.filters", "view.filters", "view.page"]);
//! # Ok::<(), nestmap::Error>(())
//! ```

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::{
    NestedSet, Result, Value,
    errors::{ContainerError, ContainerKind},
    event::{Added, Emitter, Entry, Event, EventKind, Observable},
    path::{Key, Path, PathBuf},
};

pub mod iter;

pub use iter::{Entries, Leaves, NodeRef, Resolve};

/// Behaviour switches for a [`NestedMap`].
///
/// Maps created on demand inherit the options of the map that creates them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapOptions {
    /// Remove a child as soon as a deletion inside it leaves it empty.
    pub auto_purge_empty_containers: bool,
}

impl MapOptions {
    /// Creates the default options (auto-purge disabled).
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables auto-purging of emptied containers.
    pub fn auto_purge_empty_containers(mut self, enabled: bool) -> Self {
        self.auto_purge_empty_containers = enabled;
        self
    }
}

/// A direct child of a map.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Child {
    Set(NestedSet),
    Map(NestedMap),
}

impl Child {
    fn size(&self) -> usize {
        match self {
            Child::Set(set) => set.size(),
            Child::Map(map) => map.size(),
        }
    }

    fn kind(&self) -> ContainerKind {
        match self {
            Child::Set(_) => ContainerKind::Set,
            Child::Map(_) => ContainerKind::Map,
        }
    }

    fn as_container(&self) -> ContainerRef<'_> {
        match self {
            Child::Set(set) => ContainerRef::Set(set),
            Child::Map(map) => ContainerRef::Map(map),
        }
    }

    /// Leaf entries relative to the child.
    fn snapshot(&self) -> Vec<Entry> {
        match self {
            Child::Set(set) => set.snapshot_entries(),
            Child::Map(map) => map.snapshot(),
        }
    }
}

/// Anything that can be added to a map: a leaf value or a whole container.
#[derive(Debug)]
pub enum Node {
    Value(Value),
    Set(NestedSet),
    Map(NestedMap),
}

impl Node {
    /// Returns what kind of node this is.
    pub fn kind(&self) -> ContainerKind {
        match self {
            Node::Value(_) => ContainerKind::Value,
            Node::Set(_) => ContainerKind::Set,
            Node::Map(_) => ContainerKind::Map,
        }
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        Node::Value(value)
    }
}

impl From<&Value> for Node {
    fn from(value: &Value) -> Self {
        Node::Value(value.clone())
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Value(b.into())
    }
}

impl From<i64> for Node {
    fn from(n: i64) -> Self {
        Node::Value(n.into())
    }
}

impl From<f64> for Node {
    fn from(n: f64) -> Self {
        Node::Value(n.into())
    }
}

impl From<i32> for Node {
    fn from(n: i32) -> Self {
        Node::Value(n.into())
    }
}

impl From<u32> for Node {
    fn from(n: u32) -> Self {
        Node::Value(n.into())
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Value(s.into())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Value(s.into())
    }
}

impl From<NestedSet> for Node {
    fn from(set: NestedSet) -> Self {
        Node::Set(set)
    }
}

impl From<NestedMap> for Node {
    fn from(map: NestedMap) -> Self {
        Node::Map(map)
    }
}

/// A borrowed container found by [`NestedMap::get`].
#[derive(Debug, Clone, Copy)]
pub enum ContainerRef<'a> {
    Set(&'a NestedSet),
    Map(&'a NestedMap),
}

impl<'a> ContainerRef<'a> {
    /// Returns the number of leaf values inside the container.
    pub fn size(&self) -> usize {
        match self {
            ContainerRef::Set(set) => set.size(),
            ContainerRef::Map(map) => map.size(),
        }
    }

    /// Returns what kind of container this is.
    pub fn kind(&self) -> ContainerKind {
        match self {
            ContainerRef::Set(_) => ContainerKind::Set,
            ContainerRef::Map(_) => ContainerKind::Map,
        }
    }

    pub fn as_set(&self) -> Option<&'a NestedSet> {
        match self {
            ContainerRef::Set(set) => Some(set),
            ContainerRef::Map(_) => None,
        }
    }

    pub fn as_map(&self) -> Option<&'a NestedMap> {
        match self {
            ContainerRef::Map(map) => Some(map),
            ContainerRef::Set(_) => None,
        }
    }
}

fn mismatch(key: &Key, expected: ContainerKind, found: ContainerKind) -> ContainerError {
    ContainerError::TypeMismatch {
        path: PathBuf::from(key.clone()),
        expected,
        found,
    }
}

fn json_type_name(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// A nested, path-addressable container of sets and maps.
#[derive(Debug, Default)]
pub struct NestedMap {
    size: usize,
    options: MapOptions,
    children: IndexMap<Key, Child>,
    emitter: Emitter,
}

impl NestedMap {
    /// Creates an empty map with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty map with the given options.
    pub fn with_options(options: MapOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Creates a map by adding each `(path, value)` pair in order.
    ///
    /// # Errors
    /// Fails on the first pair [`NestedMap::add`] rejects.
    pub fn from_entries<I, P, N>(entries: I, options: MapOptions) -> Result<Self>
    where
        I: IntoIterator<Item = (P, N)>,
        P: Into<PathBuf>,
        N: Into<Node>,
    {
        let mut map = Self::with_options(options);
        for (path, value) in entries {
            map.add(path, value)?;
        }
        Ok(map)
    }

    /// Converts a JSON object into a map.
    ///
    /// Nested objects become maps, arrays become sets and scalars become
    /// single-value sets. Every map created inherits `options`.
    ///
    /// ```
    /// # use nestmap::{NestedMap, MapOptions, path};
    /// let map = NestedMap::from_json(
    ///     &serde_json::json!({"a": {"b": [1, 2], "c": 3}}),
    ///     MapOptions::default(),
    /// )?;
    /// assert_eq!(map.size(), 3);
    /// assert!(map.get_set(path!["a", "b"]).is_some());
    /// # Ok::<(), nestmap::Error>(())
    /// ```
    ///
    /// # Errors
    /// Returns [`ContainerError::NotAnObject`] if `json` (or the value
    /// being converted) is not an object, and
    /// [`ContainerError::InvalidValue`] for non-scalar array members,
    /// floats and out-of-range integers.
    pub fn from_json(json: &serde_json::Value, options: MapOptions) -> Result<Self> {
        let serde_json::Value::Object(object) = json else {
            return Err(ContainerError::NotAnObject {
                found: json_type_name(json).to_string(),
            }
            .into());
        };

        let mut map = Self::with_options(options);
        for (key, value) in object {
            let node = match value {
                serde_json::Value::Array(_) => Node::Set(NestedSet::from_json(value)?),
                serde_json::Value::Object(_) => Node::Map(Self::from_json(value, options)?),
                scalar => Node::Value(Value::try_from(scalar)?),
            };
            map.add(key.as_str(), node)?;
        }
        Ok(map)
    }

    /// Returns the options this map was created with.
    pub fn options(&self) -> MapOptions {
        self.options
    }

    /// Returns the total number of leaf values in the tree below this map.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns true if no leaf value is reachable from this map.
    ///
    /// A map can be empty and still hold empty child containers.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the number of direct children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Adds `value` at `path`.
    ///
    /// A leaf value goes into the set at `path`, creating it (and any missing
    /// maps on the way) if needed. A [`NestedSet`] or [`NestedMap`] is
    /// attached as a whole and must land on a vacant key. Adding at the empty
    /// path does nothing.
    ///
    /// # Errors
    /// Returns [`ContainerError::TypeMismatch`] if the path runs through a
    /// set, ends on a map, or tries to put a container where a set already
    /// lives. Nothing is changed and no event is fired in that case.
    pub fn add(&mut self, path: impl Into<PathBuf>, value: impl Into<Node>) -> Result<()> {
        let path = path.into();
        let Some((key, rest)) = path.split_first() else {
            trace!("Ignoring add at the empty path");
            return Ok(());
        };

        match self.add_at(key, rest, value.into()) {
            Ok(_) => Ok(()),
            Err(err) => {
                debug!(path = %path, error = %err, "Rejected add");
                Err(err.into())
            }
        }
    }

    fn add_at(&mut self, key: &Key, rest: &Path, node: Node) -> Result<Vec<Event>, ContainerError> {
        match rest.split_first() {
            None => self.add_here(key, node),
            Some((next, rest)) => self.add_deeper(key, next, rest, node),
        }
    }

    fn add_here(&mut self, key: &Key, node: Node) -> Result<Vec<Event>, ContainerError> {
        match self.children.get_mut(key) {
            Some(Child::Set(set)) => match node {
                Node::Value(value) => {
                    let events = set.insert(value).into_iter().collect();
                    Ok(self.absorb(key, events))
                }
                other => Err(mismatch(key, ContainerKind::Value, other.kind())),
            },
            Some(Child::Map(_)) => Err(mismatch(key, ContainerKind::Set, ContainerKind::Map)),
            None => Ok(self.add_new(key, node)),
        }
    }

    fn add_new(&mut self, key: &Key, node: Node) -> Vec<Event> {
        match node {
            Node::Value(value) => {
                let mut set = NestedSet::new();
                let events = set.insert(value).into_iter().collect();
                self.children.insert(key.clone(), Child::Set(set));
                self.absorb(key, events)
            }
            Node::Set(set) => {
                let added = Added::Set(set.snapshot());
                self.children.insert(key.clone(), Child::Set(set));
                vec![self.emit(Event::Add {
                    path: PathBuf::from(key.clone()),
                    value: added,
                })]
            }
            Node::Map(map) => {
                let added = Added::Map(map.snapshot());
                self.children.insert(key.clone(), Child::Map(map));
                vec![self.emit(Event::Add {
                    path: PathBuf::from(key.clone()),
                    value: added,
                })]
            }
        }
    }

    fn add_deeper(
        &mut self,
        key: &Key,
        next: &Key,
        rest: &Path,
        node: Node,
    ) -> Result<Vec<Event>, ContainerError> {
        match self.children.get_mut(key) {
            Some(Child::Map(map)) => {
                let events = map
                    .add_at(next, rest, node)
                    .map_err(|err| err.within(key))?;
                Ok(self.absorb(key, events))
            }
            Some(Child::Set(_)) => Err(mismatch(key, ContainerKind::Map, ContainerKind::Set)),
            None => {
                // Fill the new map before attaching it so a failure leaves no trace
                let mut map = NestedMap::with_options(self.options);
                let events = map
                    .add_at(next, rest, node)
                    .map_err(|err| err.within(key))?;
                self.children.insert(key.clone(), Child::Map(map));
                Ok(self.absorb(key, events))
            }
        }
    }

    /// Validates an add without performing it. With `replace`, whatever
    /// lives at the final segment is assumed to be removed first.
    fn check_add(&self, path: &Path, node: &Node, replace: bool) -> Result<(), ContainerError> {
        let Some((key, rest)) = path.split_first() else {
            return Ok(());
        };
        let Some(child) = self.children.get(key) else {
            return Ok(());
        };

        match (child, rest.is_empty()) {
            (_, true) if replace => Ok(()),
            (Child::Set(_), true) => match node {
                Node::Value(_) => Ok(()),
                other => Err(mismatch(key, ContainerKind::Value, other.kind())),
            },
            (Child::Map(_), true) => Err(mismatch(key, ContainerKind::Set, ContainerKind::Map)),
            (Child::Map(map), false) => map
                .check_add(rest, node, replace)
                .map_err(|err| err.within(key)),
            (Child::Set(_), false) => Err(mismatch(key, ContainerKind::Map, ContainerKind::Set)),
        }
    }

    /// Returns the container at `path`. The empty path returns this map.
    ///
    /// Paths that would have to pass through a set return `None`.
    pub fn get(&self, path: impl Into<PathBuf>) -> Option<ContainerRef<'_>> {
        self.get_at(&path.into())
    }

    fn get_at(&self, path: &Path) -> Option<ContainerRef<'_>> {
        let Some((key, rest)) = path.split_first() else {
            return Some(ContainerRef::Map(self));
        };

        match (self.children.get(key)?, rest.is_empty()) {
            (child, true) => Some(child.as_container()),
            (Child::Map(map), false) => map.get_at(rest),
            (Child::Set(_), false) => None,
        }
    }

    /// Returns the set at `path`, if that is what lives there.
    pub fn get_set(&self, path: impl Into<PathBuf>) -> Option<&NestedSet> {
        self.get(path).and_then(|container| container.as_set())
    }

    /// Returns the map at `path`, if that is what lives there.
    pub fn get_map(&self, path: impl Into<PathBuf>) -> Option<&NestedMap> {
        self.get(path).and_then(|container| container.as_map())
    }

    /// Returns true if `path` leads to a container.
    pub fn has(&self, path: impl Into<PathBuf>) -> bool {
        self.get(path).is_some()
    }

    /// Returns true if the set at `path` contains `value`.
    pub fn has_value(&self, path: impl Into<PathBuf>, value: &Value) -> bool {
        self.get_set(path).is_some_and(|set| set.has(value))
    }

    /// Removes the whole container at `path`.
    ///
    /// Fires a single delete event listing every leaf that was inside.
    /// Returns whether something was removed; the empty path removes nothing.
    pub fn delete(&mut self, path: impl Into<PathBuf>) -> bool {
        !self.delete_at(&path.into(), None).is_empty()
    }

    /// Removes `value` from the set at `path`.
    ///
    /// Returns whether something was removed.
    pub fn delete_value(&mut self, path: impl Into<PathBuf>, value: &Value) -> bool {
        !self.delete_at(&path.into(), Some(value)).is_empty()
    }

    fn delete_at(&mut self, path: &Path, value: Option<&Value>) -> Vec<Event> {
        let Some((key, rest)) = path.split_first() else {
            return Vec::new();
        };

        if !rest.is_empty() {
            return match self.children.get_mut(key) {
                Some(Child::Map(map)) => {
                    let events = map.delete_at(rest, value);
                    self.absorb(key, events)
                }
                _ => Vec::new(),
            };
        }

        match value {
            None => self.remove_child(key).into_iter().collect(),
            Some(value) => match self.children.get_mut(key) {
                Some(Child::Set(set)) => {
                    let events = set.remove(value).into_iter().collect();
                    self.absorb(key, events)
                }
                _ => Vec::new(),
            },
        }
    }

    /// Empties the container at `path`; the empty path clears this map.
    ///
    /// Clearing this map detaches every child, including empty ones, and
    /// fires one clear event listing all previous leaf entries if there were
    /// any. Returns whether anything was removed.
    pub fn clear(&mut self, path: impl Into<PathBuf>) -> bool {
        !self.clear_at(&path.into()).is_empty()
    }

    fn clear_at(&mut self, path: &Path) -> Vec<Event> {
        let Some((key, rest)) = path.split_first() else {
            return self.clear_here().into_iter().collect();
        };

        let events = match self.children.get_mut(key) {
            Some(Child::Map(map)) => map.clear_at(rest),
            Some(Child::Set(set)) if rest.is_empty() => set.take_all().into_iter().collect(),
            _ => return Vec::new(),
        };
        self.absorb(key, events)
    }

    fn clear_here(&mut self) -> Option<Event> {
        let deleted = self.snapshot();
        let detached = std::mem::take(&mut self.children);
        trace!(
            children = detached.len(),
            leaves = deleted.len(),
            "Clearing map"
        );

        if deleted.is_empty() {
            self.size = 0;
            return None;
        }
        Some(self.emit(Event::Clear {
            path: PathBuf::new(),
            deleted,
        }))
    }

    /// Removes every descendant container holding no leaf values.
    ///
    /// Returns the number of containers removed. Each removal fires its own
    /// delete event with an empty `deleted` list.
    pub fn purge_empty_containers(&mut self) -> usize {
        let (_, purged) = self.purge();
        if purged > 0 {
            debug!(purged, "Purged empty containers");
        }
        purged
    }

    fn purge(&mut self) -> (Vec<Event>, usize) {
        let keys: Vec<Key> = self.children.keys().cloned().collect();
        let mut events = Vec::new();
        let mut purged = 0;

        for key in keys {
            let empty = match self.children.get(&key) {
                Some(child) => child.size() == 0,
                None => continue,
            };
            if empty {
                events.extend(self.remove_child(&key));
                purged += 1;
            } else if let Some(Child::Map(map)) = self.children.get_mut(&key) {
                let (nested, count) = map.purge();
                purged += count;
                events.extend(self.absorb(&key, nested));
            }
        }
        (events, purged)
    }

    /// Replaces whatever lives at `path` with `value`.
    ///
    /// # Errors
    /// Fails, without deleting anything, if `value` could not be added after
    /// the deletion.
    pub fn set(&mut self, path: impl Into<PathBuf>, value: impl Into<Node>) -> Result<()> {
        let path = path.into();
        let node = value.into();
        self.check_add(&path, &node, true)?;

        self.delete(&path);
        self.add(&path, node)
    }

    /// Replaces `old_value` in the set at `path` with `new_value`; without
    /// `old_value` the whole container at `path` is replaced.
    ///
    /// Does nothing and returns `Ok(false)` if there was nothing to delete.
    ///
    /// # Errors
    /// Fails, without deleting anything, if `new_value` could not be added
    /// after the deletion.
    pub fn update_with_literal(
        &mut self,
        new_value: impl Into<Node>,
        path: impl Into<PathBuf>,
        old_value: Option<&Value>,
    ) -> Result<bool> {
        let path = path.into();
        let present = match old_value {
            Some(old) => self.has_value(&path, old),
            None => !path.is_empty() && self.has(&path),
        };
        if !present {
            return Ok(false);
        }

        let node = new_value.into();
        self.check_add(&path, &node, old_value.is_none())?;

        let deleted = match old_value {
            Some(old) => self.delete_value(&path, old),
            None => self.delete(&path),
        };
        if deleted {
            self.add(&path, node)?;
        }
        Ok(deleted)
    }

    /// Replaces `value` in the set at `path` with `f(value)`.
    pub fn update_with_function<F, N>(
        &mut self,
        f: F,
        path: impl Into<PathBuf>,
        value: impl Into<Value>,
    ) -> Result<bool>
    where
        F: FnOnce(&Value) -> N,
        N: Into<Node>,
    {
        let value = value.into();
        let new_value = f(&value);
        self.update_with_literal(new_value, path, Some(&value))
    }

    /// Copies every leaf entry, with paths relative to this map.
    pub(crate) fn snapshot(&self) -> Vec<Entry> {
        self.leaves()
            .map(|(path, value)| Entry {
                path,
                value: value.clone(),
            })
            .collect()
    }

    /// Re-emits events raised by the child under `key` as this map's own.
    fn absorb(&mut self, key: &Key, events: Vec<Event>) -> Vec<Event> {
        if events.is_empty() {
            return events;
        }

        let mut deleted_any = false;
        let mut out = Vec::with_capacity(events.len() + 1);
        for event in events {
            deleted_any |= event.kind() == EventKind::Delete;
            out.push(self.emit(event.rebase(key)));
        }

        let emptied = self
            .children
            .get(key)
            .is_some_and(|child| child.size() == 0);
        if deleted_any && emptied && self.options.auto_purge_empty_containers {
            debug!(key = %key, "Pruning emptied container");
            out.extend(self.remove_child(key));
        }
        out
    }

    /// Detaches the child under `key` and fires the container delete.
    fn remove_child(&mut self, key: &Key) -> Option<Event> {
        let child = self.children.shift_remove(key)?;
        Some(self.emit(Event::Delete {
            path: PathBuf::from(key.clone()),
            value: None,
            deleted: child.snapshot(),
        }))
    }

    /// Applies the size change of an event and delivers it to listeners.
    fn emit(&mut self, event: Event) -> Event {
        self.size = self.size.saturating_add_signed(event.size_delta());
        self.emitter.fire(&event);
        event
    }
}

impl Observable for NestedMap {
    fn emitter(&self) -> &Emitter {
        &self.emitter
    }
}

impl PartialEq for NestedMap {
    /// Maps are equal when they hold the same structure and values; options
    /// and listeners are ignored.
    fn eq(&self, other: &Self) -> bool {
        self.children == other.children
    }
}

impl Eq for NestedMap {}

impl<'a> IntoIterator for &'a NestedMap {
    type Item = (PathBuf, &'a Value);
    type IntoIter = Leaves<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.leaves()
    }
}
