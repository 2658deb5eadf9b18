//! The leaf-level set container.
//!
//! A [`NestedSet`] holds unique [`Value`]s at one location of the tree and
//! reports its own mutations. Events raised by a set carry the empty path;
//! the owning map re-addresses them under the set's key.

use indexmap::IndexSet;

use crate::{
    Value,
    errors::ContainerError,
    event::{Added, Emitter, Entry, Event, Observable},
    path::PathBuf,
};

/// An unordered collection of unique leaf values.
///
/// Iteration follows insertion order, but callers should not rely on any
/// particular order.
///
/// ```
/// # use nestmap::{NestedSet, Value};
/// let mut set = NestedSet::new();
/// assert!(set.add("a"));
/// assert!(!set.add("a")); // already present, no event
/// assert_eq!(set.size(), 1);
/// assert!(set.has(&Value::from("a")));
/// ```
#[derive(Debug, Default)]
pub struct NestedSet {
    values: IndexSet<Value>,
    emitter: Emitter,
}

impl NestedSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set from a JSON array of scalars.
    ///
    /// # Errors
    /// Returns [`ContainerError::InvalidValue`] if `json` is not an array or
    /// one of its members is not a scalar.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, ContainerError> {
        let serde_json::Value::Array(items) = json else {
            return Err(ContainerError::InvalidValue {
                reason: format!("expected a JSON array, found {json}"),
            });
        };
        items.iter().map(Value::try_from).collect()
    }

    /// Returns the number of values.
    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the set holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Inserts `value`. Returns false, without emitting anything, if it was
    /// already present.
    pub fn add(&mut self, value: impl Into<Value>) -> bool {
        self.insert(value.into()).is_some()
    }

    /// Removes `value`. Returns whether something was removed.
    pub fn delete(&mut self, value: &Value) -> bool {
        self.remove(value).is_some()
    }

    /// Tests membership.
    pub fn has(&self, value: &Value) -> bool {
        self.values.contains(value)
    }

    /// Removes every value. Returns false, without emitting anything, if the
    /// set was already empty.
    pub fn clear(&mut self) -> bool {
        self.take_all().is_some()
    }

    /// Returns an iterator over the current values.
    pub fn values(&self) -> indexmap::set::Iter<'_, Value> {
        self.values.iter()
    }

    /// Copies the current values.
    pub(crate) fn snapshot(&self) -> Vec<Value> {
        self.values.iter().cloned().collect()
    }

    /// Copies the current values as entries relative to this set.
    pub(crate) fn snapshot_entries(&self) -> Vec<Entry> {
        self.values
            .iter()
            .map(|value| Entry::new(PathBuf::new(), value.clone()))
            .collect()
    }

    pub(crate) fn insert(&mut self, value: Value) -> Option<Event> {
        if !self.values.insert(value.clone()) {
            return None;
        }
        let event = Event::Add {
            path: PathBuf::new(),
            value: Added::Value(value),
        };
        self.emitter.fire(&event);
        Some(event)
    }

    pub(crate) fn remove(&mut self, value: &Value) -> Option<Event> {
        let removed = self.values.shift_take(value)?;
        let event = Event::Delete {
            path: PathBuf::new(),
            value: Some(removed.clone()),
            deleted: vec![Entry::new(PathBuf::new(), removed)],
        };
        self.emitter.fire(&event);
        Some(event)
    }

    pub(crate) fn take_all(&mut self) -> Option<Event> {
        if self.values.is_empty() {
            return None;
        }
        let deleted = std::mem::take(&mut self.values)
            .into_iter()
            .map(|value| Entry::new(PathBuf::new(), value))
            .collect();
        let event = Event::Clear {
            path: PathBuf::new(),
            deleted,
        };
        self.emitter.fire(&event);
        Some(event)
    }
}

impl Observable for NestedSet {
    fn emitter(&self) -> &Emitter {
        &self.emitter
    }
}

impl PartialEq for NestedSet {
    /// Sets are equal when they hold the same values; listeners are ignored.
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl Eq for NestedSet {}

impl<V: Into<Value>> FromIterator<V> for NestedSet {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(Into::into).collect(),
            emitter: Emitter::new(),
        }
    }
}

impl<'a> IntoIterator for &'a NestedSet {
    type Item = &'a Value;
    type IntoIter = indexmap::set::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values()
    }
}
