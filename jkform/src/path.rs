//! Location segments addressing a value inside form data.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One step into a data value: an object property or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Array index.
    Index(usize),
    /// Object property name.
    Key(String),
}

impl PathSegment {
    /// Key used for this segment in the id and error trees.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Numeric index, if the segment is an index or a key made of digits.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathSegment::Index(i) => Some(*i),
            PathSegment::Key(k) => k.parse().ok(),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(i) => write!(f, "{i}"),
            PathSegment::Key(k) => f.write_str(k),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(value: &str) -> Self {
        PathSegment::Key(value.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(value: String) -> Self {
        PathSegment::Key(value)
    }
}

impl From<usize> for PathSegment {
    fn from(value: usize) -> Self {
        PathSegment::Index(value)
    }
}

/// Split a JSON pointer (`/a/0/b`) into location segments.
///
/// Segments made only of ASCII digits become [`PathSegment::Index`].
pub fn parse_pointer(pointer: &str) -> Vec<PathSegment> {
    let stripped = pointer.strip_prefix('#').unwrap_or(pointer);
    stripped
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            let unescaped = unescape(s);
            if !unescaped.is_empty() && unescaped.bytes().all(|b| b.is_ascii_digit()) {
                match unescaped.parse() {
                    Ok(i) => PathSegment::Index(i),
                    Err(_) => PathSegment::Key(unescaped),
                }
            } else {
                PathSegment::Key(unescaped)
            }
        })
        .collect()
}

/// Undo JSON pointer escaping (`~1` is `/`, `~0` is `~`).
pub(crate) fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}
