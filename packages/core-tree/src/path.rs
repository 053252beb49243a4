//! Dot-notation node paths.
//!
//! A [`NodePath`] is the coordinate of one node inside a structure: an ordered,
//! non-empty list of child indices rendered as `"0"`, `"2.1"`, `"0.2.1"`.
//! Paths are only meaningful relative to one structure snapshot.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Token callers use to address the top-level children of an object root.
///
/// It is resolved by the front door before any path is parsed and is never a
/// valid [`NodePath`].
pub const ROOT_TOKEN: &str = "root";

/// Errors related to node path parsing and validation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The path string (or segment list) was empty.
    #[error("invalid path: path must not be empty")]
    Empty,

    /// Two dots in a row, or a leading/trailing dot.
    #[error("invalid path '{path}': empty segment at position {position}")]
    EmptySegment { path: String, position: usize },

    /// A segment is not a canonical non-negative decimal integer.
    #[error("invalid path '{path}': segment '{segment}' at position {position} {message}")]
    InvalidSegment {
        path: String,
        segment: String,
        position: usize,
        message: String,
    },

    /// The `"root"` sentinel reached the codec instead of being resolved by the caller.
    #[error("invalid path: 'root' is a target sentinel, not a node path")]
    RootSentinel,

    /// The path has more segments than any guarded structure can contain.
    #[error("invalid path '{path}': {len} segments exceeds the maximum of {max}")]
    TooDeep { path: String, len: usize, max: usize },
}

/// A validated node path.
///
/// For an array root, segment 0 indexes the root array; for an object root it
/// indexes the root's `children`. Every later segment indexes the `children`
/// of the node reached so far.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodePath {
    segments: Vec<usize>,
}

impl NodePath {
    /// Parse a dotted path string.
    ///
    /// # Path Syntax
    ///
    /// - Segments are separated by `.`
    /// - Each segment is a decimal integer without sign or leading zeros
    /// - Empty segments are rejected (no normalization of `..` or trailing dots)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nodetree_core::NodePath;
    ///
    /// let path = NodePath::parse("0.2.1").unwrap();
    /// assert_eq!(path.segments(), &[0, 2, 1]);
    /// assert_eq!(path.to_string(), "0.2.1");
    ///
    /// assert!(NodePath::parse("root").is_err());
    /// assert!(NodePath::parse("1..2").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, PathError> {
        if s.is_empty() {
            return Err(PathError::Empty);
        }
        if s == ROOT_TOKEN {
            return Err(PathError::RootSentinel);
        }

        let segments = s
            .split('.')
            .enumerate()
            .map(|(position, segment)| Self::parse_segment(s, segment, position))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(NodePath { segments })
    }

    /// Parse a path, rejecting paths with more than `max_segments` segments.
    pub fn parse_bounded(s: &str, max_segments: usize) -> Result<Self, PathError> {
        let path = Self::parse(s)?;
        if path.len() > max_segments {
            return Err(PathError::TooDeep {
                path: s.to_string(),
                len: path.len(),
                max: max_segments,
            });
        }
        Ok(path)
    }

    fn parse_segment(path: &str, segment: &str, position: usize) -> Result<usize, PathError> {
        if segment.is_empty() {
            return Err(PathError::EmptySegment {
                path: path.to_string(),
                position,
            });
        }

        let invalid = |message: &str| PathError::InvalidSegment {
            path: path.to_string(),
            segment: segment.to_string(),
            position,
            message: message.to_string(),
        };

        if !segment.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("is not a non-negative integer"));
        }
        if segment.len() > 1 && segment.starts_with('0') {
            return Err(invalid("has a leading zero"));
        }

        segment
            .parse::<usize>()
            .map_err(|_| invalid("is out of range"))
    }

    /// Create a path from raw segments.
    pub fn from_segments(segments: Vec<usize>) -> Result<Self, PathError> {
        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        Ok(NodePath { segments })
    }

    /// Path of the `index`-th top-level node.
    pub fn top(index: usize) -> Self {
        NodePath {
            segments: vec![index],
        }
    }

    pub fn segments(&self) -> &[usize] {
        &self.segments
    }

    /// Number of segments. Always at least 1.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the path has no segments; false for every parsed path.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The index of the node inside its containing array.
    pub fn last(&self) -> usize {
        self.segments[self.segments.len() - 1]
    }

    /// Path of the containing node, or `None` for a top-level node.
    #[must_use]
    pub fn parent(&self) -> Option<NodePath> {
        if self.segments.len() <= 1 {
            return None;
        }
        Some(NodePath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Path of the `index`-th child of this node.
    #[must_use]
    pub fn child(&self, index: usize) -> NodePath {
        let mut segments = self.segments.clone();
        segments.push(index);
        NodePath { segments }
    }

    /// Path of the node at `index` within the same container as this one.
    #[must_use]
    pub fn sibling(&self, index: usize) -> NodePath {
        let mut segments = self.segments.clone();
        let last = segments.len() - 1;
        segments[last] = index;
        NodePath { segments }
    }

    /// Copy of this path with the segment at `position` replaced by `index`.
    #[must_use]
    pub fn with_segment(&self, position: usize, index: usize) -> NodePath {
        let mut segments = self.segments.clone();
        if let Some(segment) = segments.get_mut(position) {
            *segment = index;
        }
        NodePath { segments }
    }

    /// Build the path of slot `index` inside the container `parent` addresses.
    ///
    /// `None` means the top-level container.
    pub fn in_container(parent: Option<&NodePath>, index: usize) -> NodePath {
        match parent {
            Some(parent) => parent.child(index),
            None => NodePath::top(index),
        }
    }

    /// Check if this path starts with all of `prefix`'s segments.
    pub fn has_prefix(&self, prefix: &NodePath) -> bool {
        prefix.segments.len() <= self.segments.len()
            && prefix.segments[..] == self.segments[..prefix.segments.len()]
    }

    /// Check if this path addresses a node strictly inside `ancestor`'s subtree.
    pub fn is_descendant_of(&self, ancestor: &NodePath) -> bool {
        self.segments.len() > ancestor.segments.len() && self.has_prefix(ancestor)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.segments {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for NodePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::ops::Index<usize> for NodePath {
    type Output = usize;

    fn index(&self, i: usize) -> &Self::Output {
        &self.segments[i]
    }
}

impl Serialize for NodePath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodePath {
    fn deserialize<D>(deserializer: D) -> Result<NodePath, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        NodePath::parse(&s).map_err(D::Error::custom)
    }
}

/// Macro for creating node paths from literals.
///
/// # Example
///
/// ```rust
/// use nodetree_core::node_path;
///
/// let p = node_path!("1.0.3");
/// assert_eq!(p.len(), 3);
/// ```
#[macro_export]
macro_rules! node_path {
    ($s:expr) => {
        $crate::NodePath::parse($s).expect("invalid node path literal")
    };
}
