//! Lazy traversal of a [`NestedMap`].
//!
//! [`Entries`] walks the tree depth-first. Each step either yields a node or
//! descends into a child, depending on which container kinds are resolved.
//! Every traversal starts fresh from the map it was created on.

use crate::{
    NestedMap, NestedSet, Value,
    map::Child,
    path::{Key, PathBuf},
};

/// Which container kinds a traversal descends into.
///
/// A resolved container is replaced by its contents; an unresolved one is
/// yielded whole. `paths` never resolves sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolve {
    pub maps: bool,
    pub sets: bool,
}

impl Resolve {
    /// Descend into everything, yielding only leaf values.
    pub const ALL: Resolve = Resolve {
        maps: true,
        sets: true,
    };

    /// Yield direct children only.
    pub const NONE: Resolve = Resolve {
        maps: false,
        sets: false,
    };

    pub fn new(maps: bool, sets: bool) -> Self {
        Self { maps, sets }
    }
}

impl Default for Resolve {
    fn default() -> Self {
        Self::ALL
    }
}

/// A borrowed node produced by a traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRef<'a> {
    Value(&'a Value),
    Set(&'a NestedSet),
    Map(&'a NestedMap),
}

impl<'a> NodeRef<'a> {
    pub fn as_value(&self) -> Option<&'a Value> {
        match self {
            NodeRef::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&'a NestedSet> {
        match self {
            NodeRef::Set(set) => Some(set),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&'a NestedMap> {
        match self {
            NodeRef::Map(map) => Some(map),
            _ => None,
        }
    }
}

enum Frame<'a> {
    Map {
        prefix: PathBuf,
        children: indexmap::map::Iter<'a, Key, Child>,
    },
    Set {
        path: PathBuf,
        values: indexmap::set::Iter<'a, Value>,
    },
}

/// Depth-first iterator over `(path, node)` pairs.
///
/// Paths are relative to the map the traversal started from.
pub struct Entries<'a> {
    stack: Vec<Frame<'a>>,
    resolve: Resolve,
}

impl<'a> Entries<'a> {
    pub(crate) fn new(map: &'a NestedMap, resolve: Resolve) -> Self {
        Self {
            stack: vec![Frame::Map {
                prefix: PathBuf::new(),
                children: map.children.iter(),
            }],
            resolve,
        }
    }
}

impl<'a> Iterator for Entries<'a> {
    type Item = (PathBuf, NodeRef<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            let (path, child) = match frame {
                Frame::Set { path, values } => match values.next() {
                    Some(value) => return Some((path.clone(), NodeRef::Value(value))),
                    None => {
                        self.stack.pop();
                        continue;
                    }
                },
                Frame::Map { prefix, children } => match children.next() {
                    Some((key, child)) => (prefix.append(key), child),
                    None => {
                        self.stack.pop();
                        continue;
                    }
                },
            };

            match child {
                Child::Set(set) if self.resolve.sets => self.stack.push(Frame::Set {
                    path,
                    values: set.values(),
                }),
                Child::Map(map) if self.resolve.maps => self.stack.push(Frame::Map {
                    prefix: path,
                    children: map.children.iter(),
                }),
                Child::Set(set) => return Some((path, NodeRef::Set(set))),
                Child::Map(map) => return Some((path, NodeRef::Map(map))),
            }
        }
    }
}

/// Iterator over every leaf value with its full path.
pub struct Leaves<'a>(Entries<'a>);

impl<'a> Iterator for Leaves<'a> {
    type Item = (PathBuf, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        self.0
            .by_ref()
            .find_map(|(path, node)| node.as_value().map(|value| (path, value)))
    }
}

impl NestedMap {
    /// Traverses the tree, resolving the container kinds selected by
    /// `resolve`.
    ///
    /// ```
    /// # use nestmap::{NestedMap, Resolve, path};
    /// let mut map = NestedMap::new();
    /// map.add(path!["a", "b"], 1)?;
    /// map.add(path!["a", "b"], 2)?;
    /// map.add(path!["c"], 3)?;
    ///
    /// assert_eq!(map.entries(Resolve::ALL).count(), 3);
    /// // `a` as a whole plus the values of `c`
    /// assert_eq!(map.entries(Resolve::new(false, true)).count(), 2);
    /// # Ok::<(), nestmap::Error>(())
    /// ```
    pub fn entries(&self, resolve: Resolve) -> Entries<'_> {
        Entries::new(self, resolve)
    }

    /// Same traversal as [`NestedMap::entries`], without the paths.
    pub fn values(&self, resolve: Resolve) -> impl Iterator<Item = NodeRef<'_>> {
        self.entries(resolve).map(|(_, node)| node)
    }

    /// Paths of every set, or of every direct child without `resolve_maps`.
    pub fn paths(&self, resolve_maps: bool) -> impl Iterator<Item = PathBuf> + '_ {
        self.entries(Resolve::new(resolve_maps, false))
            .map(|(path, _)| path)
    }

    /// Keys of the direct children.
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.children.keys()
    }

    /// Every leaf value with its full path.
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves(self.entries(Resolve::ALL))
    }
}
