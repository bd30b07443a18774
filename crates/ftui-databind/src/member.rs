#![forbid(unsafe_code)]

//! Dotted member references such as `"Two.Three.MockItem.Text"`.
//!
//! A [`MemberPath`] splits the full member into the navigation [`path`]
//! (everything before the last dot) and the terminal [`field`]. Parsing never
//! fails: a missing or empty member yields an empty path and field, which is
//! the "no binding" state of an inert binding.
//!
//! [`path`]: MemberPath::path
//! [`field`]: MemberPath::field

use std::fmt;

use smallvec::SmallVec;

/// Parsed, immutable member reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct MemberPath {
    full: String,
    split: Option<usize>,
}

impl MemberPath {
    /// Parse a member reference. Surrounding whitespace is ignored.
    #[must_use]
    pub fn parse(member: &str) -> Self {
        let full = member.trim().to_string();
        let split = full.rfind('.');
        Self { full, split }
    }

    /// The member exactly as given (trimmed).
    #[must_use]
    pub fn full(&self) -> &str {
        &self.full
    }

    /// Everything before the last segment; empty for single-segment members.
    #[must_use]
    pub fn path(&self) -> &str {
        self.split.map_or("", |dot| &self.full[..dot])
    }

    /// The last segment.
    #[must_use]
    pub fn field(&self) -> &str {
        self.split.map_or(self.full.as_str(), |dot| &self.full[dot + 1..])
    }

    /// Whether no member was given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.full.is_empty()
    }

    /// All segments of the full member, in order. Empty for an empty member.
    #[must_use]
    pub fn segments(&self) -> SmallVec<[&str; 4]> {
        split_segments(&self.full)
    }
}

impl From<&str> for MemberPath {
    fn from(member: &str) -> Self {
        Self::parse(member)
    }
}

impl From<Option<&str>> for MemberPath {
    fn from(member: Option<&str>) -> Self {
        member.map(Self::parse).unwrap_or_default()
    }
}

impl fmt::Display for MemberPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

/// Split a dotted member into trimmed segments.
pub(crate) fn split_segments(member: &str) -> SmallVec<[&str; 4]> {
    if member.trim().is_empty() {
        return SmallVec::new();
    }
    member.split('.').map(str::trim).collect()
}

/// Canonical form used for lookups: trimmed and ASCII-lowercased, with
/// whitespace around dots removed.
pub(crate) fn normalize(member: &str) -> String {
    split_segments(member)
        .iter()
        .map(|segment| segment.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn splits_path_and_field() {
        let m = MemberPath::parse("Two.Three.MockItem.Text");
        assert_eq!(m.path(), "Two.Three.MockItem");
        assert_eq!(m.field(), "Text");
        assert_eq!(m.full(), "Two.Three.MockItem.Text");
        assert_eq!(m.segments().as_slice(), ["Two", "Three", "MockItem", "Text"]);
    }

    #[test]
    fn single_segment_has_empty_path() {
        let m = MemberPath::parse("Text");
        assert_eq!(m.path(), "");
        assert_eq!(m.field(), "Text");
    }

    #[test]
    fn none_is_empty() {
        let m = MemberPath::from(None);
        assert!(m.is_empty());
        assert_eq!(m.path(), "");
        assert_eq!(m.field(), "");
        assert!(m.segments().is_empty());
    }

    #[test]
    fn normalize_is_case_and_space_insensitive() {
        assert_eq!(normalize(" Orders . Lines "), "orders.lines");
        assert_eq!(normalize(""), "");
    }

    proptest! {
        #[test]
        fn three_segment_members_split_at_last_dot(
            a in "[A-Za-z_][A-Za-z0-9_]{0,8}",
            b in "[A-Za-z_][A-Za-z0-9_]{0,8}",
            c in "[A-Za-z_][A-Za-z0-9_]{0,8}",
        ) {
            let m = MemberPath::parse(&format!("{a}.{b}.{c}"));
            prop_assert_eq!(m.path(), format!("{a}.{b}"));
            prop_assert_eq!(m.field(), c.as_str());
        }

        #[test]
        fn parsing_never_panics(s in ".*") {
            let m = MemberPath::parse(&s);
            let rejoined = if m.full().contains('.') {
                format!("{}.{}", m.path(), m.field())
            } else {
                m.field().to_string()
            };
            prop_assert_eq!(rejoined, m.full());
        }
    }
}
