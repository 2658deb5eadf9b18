//! Path types for addressing locations inside a container tree.
//!
//! A path is an ordered sequence of [`Key`] segments. The Path/PathBuf types
//! follow the same borrowed/owned pattern as std::path::Path/PathBuf, so the
//! recursive container code can walk a path by slicing it instead of
//! allocating a new one per level.
//!
//! # Core Types
//!
//! - [`Key`] - A single path segment (text or integer)
//! - [`Path`] - An unsized borrowed path type (always behind a reference)
//! - [`PathBuf`] - An owned path type that can be constructed and extended
//!
//! # Usage
//!
//! ```rust
//! use nestmap::path::{Key, PathBuf};
//! use nestmap::path;
//!
//! // A bare key is a one-segment path
//! let single = PathBuf::from("user");
//! assert_eq!(single, path!["user"]);
//!
//! // Mixed text and integer segments
//! let path = path!["users", 3, "name"];
//! assert_eq!(path.head().unwrap(), &Key::from("users"));
//! assert_eq!(path.tail(), &*path![3, "name"]);
//!
//! // Dotted strings are split into text segments
//! let parsed: PathBuf = "user.profile.name".parse().unwrap();
//! assert_eq!(parsed.len(), 3);
//! ```

use std::{borrow::Borrow, convert::Infallible, fmt, ops::Deref, str::FromStr};

use thiserror::Error;

/// Error type for path construction and decomposition failures.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// An operation required at least one segment.
    #[error("path is empty")]
    Empty,

    /// Input could not be interpreted as a path segment.
    #[error("invalid path segment '{segment}': {reason}")]
    InvalidSegment { segment: String, reason: String },
}

impl PathError {
    /// Check if this error was caused by an empty path
    pub fn is_empty_path(&self) -> bool {
        matches!(self, PathError::Empty)
    }

    /// Check if this error was caused by unusable path input
    pub fn is_invalid_segment(&self) -> bool {
        matches!(self, PathError::InvalidSegment { .. })
    }
}

/// A single segment of a path.
///
/// Keys compare by value: `Key::Text("1")` and `Key::Int(1)` are different
/// keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(untagged)]
pub enum Key {
    /// A textual key
    Text(String),
    /// An integer key, e.g. an array index
    Int(i64),
}

impl Key {
    /// Returns the text of this key if it is textual.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Key::Text(text) => Some(text),
            Key::Int(_) => None,
        }
    }

    /// Returns the integer of this key if it is numeric.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Key::Int(n) => Some(*n),
            Key::Text(_) => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Text(text) => write!(f, "{text}"),
            Key::Int(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Text(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Text(s)
    }
}

impl From<&String> for Key {
    fn from(s: &String) -> Self {
        Key::Text(s.clone())
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Int(n)
    }
}

impl From<i32> for Key {
    fn from(n: i32) -> Self {
        Key::Int(n.into())
    }
}

impl From<u32> for Key {
    fn from(n: u32) -> Self {
        Key::Int(n.into())
    }
}

impl TryFrom<&serde_json::Value> for Key {
    type Error = PathError;

    fn try_from(value: &serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::String(s) => Ok(Key::Text(s.clone())),
            serde_json::Value::Number(n) => {
                n.as_i64()
                    .map(Key::Int)
                    .ok_or_else(|| PathError::InvalidSegment {
                        segment: n.to_string(),
                        reason: "numeric keys must be 64-bit integers".to_string(),
                    })
            }
            other => Err(PathError::InvalidSegment {
                segment: other.to_string(),
                reason: "keys must be strings or integers".to_string(),
            }),
        }
    }
}

/// A borrowed path.
///
/// `Path` is the borrowed counterpart to [`PathBuf`], similar to how `[T]`
/// relates to `Vec<T>`. [`Path::tail`] is a reslice, so recursing down a path
/// never allocates.
///
/// This type is unsized and must always be used behind a reference.
#[derive(Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Path {
    inner: [Key],
}

/// An owned path.
///
/// Every path-like input accepted by the containers converts into a
/// `PathBuf`: a bare key, an array or `Vec` of keys, or an existing path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(transparent)]
pub struct PathBuf {
    inner: Vec<Key>,
}

impl Path {
    /// Views a slice of keys as a path.
    pub fn from_keys(keys: &[Key]) -> &Path {
        // SAFETY: Path is repr(transparent) over [Key]
        unsafe { &*(keys as *const [Key] as *const Path) }
    }

    /// Returns the empty path.
    pub fn empty() -> &'static Path {
        Path::from_keys(&[])
    }

    /// Returns the number of segments in the path.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the segments as a slice.
    pub fn keys(&self) -> &[Key] {
        &self.inner
    }

    /// Returns an iterator over the segments.
    pub fn iter(&self) -> std::slice::Iter<'_, Key> {
        self.inner.iter()
    }

    /// Returns the first segment.
    ///
    /// # Errors
    /// Returns [`PathError::Empty`] if the path has no segments.
    pub fn head(&self) -> Result<&Key, PathError> {
        self.inner.first().ok_or(PathError::Empty)
    }

    /// Returns the path without its first segment.
    ///
    /// The tail of the empty path is the empty path.
    pub fn tail(&self) -> &Path {
        match self.split_first() {
            Some((_, rest)) => rest,
            None => self,
        }
    }

    /// Splits the path into its first segment and the remaining path.
    pub fn split_first(&self) -> Option<(&Key, &Path)> {
        self.inner
            .split_first()
            .map(|(head, rest)| (head, Path::from_keys(rest)))
    }

    /// Returns the last segment, or `None` if empty.
    pub fn last(&self) -> Option<&Key> {
        self.inner.last()
    }

    /// Returns a new path with `key` inserted before all existing segments.
    pub fn prepend(&self, key: impl Into<Key>) -> PathBuf {
        let mut inner = Vec::with_capacity(self.inner.len() + 1);
        inner.push(key.into());
        inner.extend_from_slice(&self.inner);
        PathBuf { inner }
    }

    /// Returns a new path with `key` added after all existing segments.
    pub fn append(&self, key: impl Into<Key>) -> PathBuf {
        let mut inner = Vec::with_capacity(self.inner.len() + 1);
        inner.extend_from_slice(&self.inner);
        inner.push(key.into());
        PathBuf { inner }
    }

    /// Returns a new path consisting of this path followed by `other`.
    pub fn join(&self, other: impl AsRef<Path>) -> PathBuf {
        let other = other.as_ref();
        let mut inner = Vec::with_capacity(self.inner.len() + other.len());
        inner.extend_from_slice(&self.inner);
        inner.extend_from_slice(&other.inner);
        PathBuf { inner }
    }

    /// Converts this `Path` to an owned `PathBuf`.
    pub fn to_path_buf(&self) -> PathBuf {
        PathBuf {
            inner: self.inner.to_vec(),
        }
    }
}

impl PathBuf {
    /// Creates a new empty path.
    pub fn new() -> Self {
        Self { inner: Vec::new() }
    }

    /// Adds a segment to the end of this path.
    ///
    /// ```rust
    /// # use nestmap::path::PathBuf;
    /// let path = PathBuf::new().push("user").push(7);
    /// assert_eq!(path.to_string(), "user.7");
    /// ```
    pub fn push(mut self, key: impl Into<Key>) -> Self {
        self.inner.push(key.into());
        self
    }

    /// Consumes the path and returns its segments.
    pub fn into_keys(self) -> Vec<Key> {
        self.inner
    }

    /// Creates a PathBuf by splitting a dotted string into text segments.
    ///
    /// Empty components are dropped, so `".a..b."` is `a.b` and `"..."` is
    /// the empty path.
    pub fn normalize(dotted: &str) -> Self {
        dotted
            .split('.')
            .filter(|component| !component.is_empty())
            .map(Key::from)
            .collect()
    }
}

/// Normalizes any path-like input into a canonical [`PathBuf`].
///
/// Idempotent on an existing path.
pub fn to_path(input: impl Into<PathBuf>) -> PathBuf {
    input.into()
}

impl Deref for PathBuf {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        Path::from_keys(&self.inner)
    }
}

impl AsRef<Path> for PathBuf {
    fn as_ref(&self) -> &Path {
        self
    }
}

impl AsRef<Path> for Path {
    fn as_ref(&self) -> &Path {
        self
    }
}

impl Borrow<Path> for PathBuf {
    fn borrow(&self) -> &Path {
        self
    }
}

impl ToOwned for Path {
    type Owned = PathBuf;

    fn to_owned(&self) -> PathBuf {
        self.to_path_buf()
    }
}

impl PartialEq<PathBuf> for Path {
    fn eq(&self, other: &PathBuf) -> bool {
        self.inner == other.inner[..]
    }
}

impl PartialEq<Path> for PathBuf {
    fn eq(&self, other: &Path) -> bool {
        self.inner[..] == other.inner
    }
}

impl PartialEq<PathBuf> for &Path {
    fn eq(&self, other: &PathBuf) -> bool {
        self.inner == other.inner[..]
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Key;
    type IntoIter = std::slice::Iter<'a, Key>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Key> for PathBuf {
    fn from_iter<I: IntoIterator<Item = Key>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

impl FromStr for PathBuf {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::normalize(s))
    }
}

impl From<&str> for PathBuf {
    fn from(key: &str) -> Self {
        Self {
            inner: vec![Key::from(key)],
        }
    }
}

impl From<String> for PathBuf {
    fn from(key: String) -> Self {
        Self {
            inner: vec![Key::from(key)],
        }
    }
}

impl From<i64> for PathBuf {
    fn from(key: i64) -> Self {
        Self {
            inner: vec![Key::from(key)],
        }
    }
}

impl From<i32> for PathBuf {
    fn from(key: i32) -> Self {
        Self {
            inner: vec![Key::from(key)],
        }
    }
}

impl From<Key> for PathBuf {
    fn from(key: Key) -> Self {
        Self { inner: vec![key] }
    }
}

impl From<&Path> for PathBuf {
    fn from(path: &Path) -> Self {
        path.to_path_buf()
    }
}

impl From<&PathBuf> for PathBuf {
    fn from(path: &PathBuf) -> Self {
        path.clone()
    }
}

impl From<&[Key]> for PathBuf {
    fn from(keys: &[Key]) -> Self {
        Self {
            inner: keys.to_vec(),
        }
    }
}

impl<K: Into<Key>> From<Vec<K>> for PathBuf {
    fn from(keys: Vec<K>) -> Self {
        keys.into_iter().map(Into::into).collect()
    }
}

impl<K: Into<Key>, const N: usize> From<[K; N]> for PathBuf {
    fn from(keys: [K; N]) -> Self {
        keys.into_iter().map(Into::into).collect()
    }
}

impl TryFrom<&serde_json::Value> for PathBuf {
    type Error = PathError;

    /// Accepts a string or integer (one segment) or an array of those.
    fn try_from(value: &serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Array(items) => items.iter().map(Key::try_from).collect(),
            other => Key::try_from(other).map(PathBuf::from),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inner.is_empty() {
            return write!(f, "(empty path)");
        }
        for (i, key) in self.inner.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

impl fmt::Display for PathBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}

/// Constructs a [`PathBuf`] from a list of segments.
///
/// Each argument may be anything that converts into a [`Key`].
///
/// ```rust
/// # use nestmap::path;
/// let empty = path![];
/// assert!(empty.is_empty());
///
/// let base = "user";
/// let path = path![base, "addresses", 0];
/// assert_eq!(path.to_string(), "user.addresses.0");
/// ```
#[macro_export]
macro_rules! path {
    () => {
        $crate::path::PathBuf::new()
    };

    ($($segment:expr),+ $(,)?) => {
        <$crate::path::PathBuf as ::std::iter::FromIterator<$crate::path::Key>>::from_iter([
            $($crate::path::Key::from($segment)),+
        ])
    };
}
