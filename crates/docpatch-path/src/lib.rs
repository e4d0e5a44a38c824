//! Document position paths.
//!
//! A [`PathAddress`] locates a node in a hierarchical document by descending
//! one zero-based child index per component from the document root. Paths
//! compare lexicographically over their index sequences, which coincides
//! with document order (a parent sorts before its descendants, which sort
//! before the parent's following siblings).
//!
//! # Example
//!
//! ```
//! use docpatch_path::PathAddress;
//!
//! // Parse a path string into a address
//! let path = PathAddress::parse("/0/2/5").unwrap();
//! assert_eq!(path.as_slice(), &[0, 2, 5]);
//!
//! // Format it back
//! assert_eq!(path.to_string(), "/0/2/5");
//!
//! // Document order
//! let parent = PathAddress::parse("/0/2").unwrap();
//! assert!(parent < path);
//! assert!(parent.is_ancestor_of(&path));
//! ```

use serde_json::Value;
use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────

/// Error produced when converting external data into a [`PathAddress`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PathError {
    /// The wire value was not a JSON array.
    #[error("PATH_NOT_AN_ARRAY")]
    NotAnArray,
    /// A component was not a non-negative integer.
    #[error("PATH_COMPONENT_INVALID: {0}")]
    InvalidComponent(String),
}

// ── PathAddress ───────────────────────────────────────────────────────────

/// An immutable ordered sequence of non-negative child indexes.
///
/// The derived `Ord` is lexicographic over the index sequence, i.e.
/// document order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PathAddress(Vec<usize>);

impl PathAddress {
    /// The root path (empty component sequence).
    pub fn root() -> Self {
        PathAddress(Vec::new())
    }

    pub fn new(components: Vec<usize>) -> Self {
        PathAddress(components)
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True for the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<usize> {
        self.0.get(i).copied()
    }

    /// The final component, if any.
    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// Splits into (parent path, final component). `None` for the root.
    ///
    /// ```
    /// use docpatch_path::PathAddress;
    ///
    /// let path = PathAddress::new(vec![1, 4]);
    /// let (parent, idx) = path.split_last().unwrap();
    /// assert_eq!(parent, PathAddress::new(vec![1]));
    /// assert_eq!(idx, 4);
    /// assert_eq!(PathAddress::root().split_last(), None);
    /// ```
    pub fn split_last(&self) -> Option<(PathAddress, usize)> {
        let (&last, parent) = self.0.split_last()?;
        Some((PathAddress(parent.to_vec()), last))
    }

    /// The parent path. `None` for the root.
    pub fn parent(&self) -> Option<PathAddress> {
        self.split_last().map(|(p, _)| p)
    }

    /// Extends the path by one child index.
    pub fn child(&self, idx: usize) -> PathAddress {
        let mut components = self.0.clone();
        components.push(idx);
        PathAddress(components)
    }

    /// Replaces the final component. `None` for the root.
    pub fn sibling(&self, idx: usize) -> Option<PathAddress> {
        let mut components = self.0.clone();
        *components.last_mut()? = idx;
        Some(PathAddress(components))
    }

    /// True if `self` begins with every component of `prefix`
    /// (including the case `self == prefix`).
    pub fn starts_with(&self, prefix: &PathAddress) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }

    /// True if `self` is a proper prefix of `other`.
    ///
    /// ```
    /// use docpatch_path::PathAddress;
    ///
    /// let a = PathAddress::new(vec![0]);
    /// let b = PathAddress::new(vec![0, 3]);
    /// assert!(a.is_ancestor_of(&b));
    /// assert!(!b.is_ancestor_of(&a));
    /// assert!(!a.is_ancestor_of(&a));
    /// ```
    pub fn is_ancestor_of(&self, other: &PathAddress) -> bool {
        other.0.len() > self.0.len() && other.starts_with(self)
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    // ── String form ───────────────────────────────────────────────────────

    /// Parse a path string (`"/0/2/5"`). `""` and `"/"` are the root.
    pub fn parse(s: &str) -> Result<PathAddress, PathError> {
        if s.is_empty() || s == "/" {
            return Ok(PathAddress::root());
        }
        let body = s.strip_prefix('/').unwrap_or(s);
        let components = body
            .split('/')
            .map(|c| {
                c.parse::<usize>()
                    .map_err(|_| PathError::InvalidComponent(c.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PathAddress(components))
    }

    // ── Wire form ─────────────────────────────────────────────────────────

    /// Convert a wire value (JSON array of non-negative integers) into a path.
    ///
    /// ```
    /// use docpatch_path::PathAddress;
    ///
    /// let v = serde_json::json!([0, 2, 5]);
    /// assert_eq!(PathAddress::from_value(&v).unwrap().as_slice(), &[0, 2, 5]);
    /// assert!(PathAddress::from_value(&serde_json::json!([0, -1])).is_err());
    /// assert!(PathAddress::from_value(&serde_json::json!("0/1")).is_err());
    /// ```
    pub fn from_value(v: &Value) -> Result<PathAddress, PathError> {
        let arr = v.as_array().ok_or(PathError::NotAnArray)?;
        let components = arr
            .iter()
            .map(|c| {
                c.as_u64()
                    .map(|n| n as usize)
                    .ok_or_else(|| PathError::InvalidComponent(c.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PathAddress(components))
    }

    /// Convert to the wire form (JSON array of integers).
    pub fn to_value(&self) -> Value {
        Value::Array(self.0.iter().map(|&i| Value::from(i as u64)).collect())
    }
}

impl std::fmt::Display for PathAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for c in &self.0 {
            write!(f, "/{c}")?;
        }
        Ok(())
    }
}

impl From<Vec<usize>> for PathAddress {
    fn from(components: Vec<usize>) -> Self {
        PathAddress(components)
    }
}

impl FromIterator<usize> for PathAddress {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        PathAddress(iter.into_iter().collect())
    }
}

impl std::ops::Index<usize> for PathAddress {
    type Output = usize;

    fn index(&self, i: usize) -> &usize {
        &self.0[i]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_and_format() {
        assert_eq!(PathAddress::parse("").unwrap(), PathAddress::root());
        assert_eq!(PathAddress::parse("/").unwrap(), PathAddress::root());
        let p = PathAddress::parse("/0/12/3").unwrap();
        assert_eq!(p.as_slice(), &[0, 12, 3]);
        assert_eq!(p.to_string(), "/0/12/3");
        assert_eq!(PathAddress::root().to_string(), "/");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(
            PathAddress::parse("/a/1"),
            Err(PathError::InvalidComponent("a".to_string()))
        );
        assert!(PathAddress::parse("/-1").is_err());
    }

    #[test]
    fn wire_roundtrip() {
        let p = PathAddress::new(vec![3, 0, 7]);
        assert_eq!(PathAddress::from_value(&p.to_value()).unwrap(), p);
    }

    #[test]
    fn wire_rejects_fractions() {
        assert!(PathAddress::from_value(&json!([0, 1.5])).is_err());
    }

    #[test]
    fn document_order() {
        let parent = PathAddress::new(vec![0, 2]);
        let child = PathAddress::new(vec![0, 2, 0]);
        let next = PathAddress::new(vec![0, 3]);
        assert!(parent < child);
        assert!(child < next);
        assert!(parent < next);
    }

    #[test]
    fn relations() {
        let a = PathAddress::new(vec![1]);
        let b = PathAddress::new(vec![1, 0, 4]);
        assert!(b.starts_with(&a));
        assert!(a.starts_with(&a));
        assert!(a.is_ancestor_of(&b));
        assert!(!a.is_ancestor_of(&a));
        assert!(PathAddress::root().is_ancestor_of(&a));
    }

    #[test]
    fn split_and_rebuild() {
        let p = PathAddress::new(vec![2, 5]);
        let (parent, idx) = p.split_last().unwrap();
        assert_eq!(parent.child(idx), p);
        assert_eq!(p.sibling(6).unwrap().as_slice(), &[2, 6]);
        assert_eq!(PathAddress::root().sibling(1), None);
    }
}
