#![forbid(unsafe_code)]

//! Error type shared by every binding operation.
//!
//! Structural problems (a member path that does not resolve, a control
//! property that does not exist) surface as invalid-argument errors that
//! carry the offending parameter name, so callers can tell a bad
//! `dataMember` apart from a bad `propertyName`.

use std::fmt;

use crate::value::ValueKind;

/// Parameter name reported for member-path failures.
pub const PARAM_DATA_MEMBER: &str = "dataMember";
/// Parameter name reported for unknown control-side properties.
pub const PARAM_PROPERTY_NAME: &str = "propertyName";
/// Parameter name reported for out-of-range indices.
pub const PARAM_INDEX: &str = "index";
/// Parameter name reported for out-of-range positions.
pub const PARAM_VALUE: &str = "value";

/// Errors from binding, resolution, navigation, and conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingError {
    /// A member path segment does not resolve against the live object graph.
    InvalidMember {
        param: &'static str,
        member: String,
        segment: String,
    },
    /// The hosting component has no bindable property with this name.
    InvalidProperty {
        param: &'static str,
        property: String,
    },
    /// A binding for this control-side property already exists.
    DuplicateBinding { property: String },
    /// An index or position lies outside the valid range.
    OutOfRange {
        param: &'static str,
        value: isize,
        count: usize,
    },
    /// A value could not be rendered with the requested format string.
    Format { value: String, format: String },
    /// Text could not be parsed into the data-side kind.
    Parse { text: String, target: ValueKind },
    /// A value of the wrong kind was handed to an accessor.
    TypeMismatch { expected: ValueKind, found: ValueKind },
    /// The data-side property has no setter.
    ReadOnly { property: String },
    /// The list manager has no current row to read from or write to.
    NoCurrentItem,
    /// The data source does not support the requested operation.
    Unsupported { operation: &'static str },
}

impl BindingError {
    pub(crate) fn invalid_member(member: &str, segment: &str) -> Self {
        Self::InvalidMember {
            param: PARAM_DATA_MEMBER,
            member: member.to_string(),
            segment: segment.to_string(),
        }
    }

    /// Report a member failure against `full` instead of the relative member
    /// a nested lookup saw. Other errors pass through.
    pub(crate) fn within_member(self, full: &str) -> Self {
        match self {
            Self::InvalidMember { param, segment, .. } => Self::InvalidMember {
                param,
                member: full.to_string(),
                segment,
            },
            other => other,
        }
    }

    /// Name of the argument this error blames, for invalid-argument and
    /// out-of-range conditions.
    #[must_use]
    pub fn param_name(&self) -> Option<&'static str> {
        match self {
            Self::InvalidMember { param, .. }
            | Self::InvalidProperty { param, .. }
            | Self::OutOfRange { param, .. } => Some(param),
            _ => None,
        }
    }

    /// Whether this error is an invalid-argument condition.
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::InvalidMember { .. } | Self::InvalidProperty { .. } | Self::DuplicateBinding { .. }
        )
    }
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMember {
                param,
                member,
                segment,
            } => write!(
                f,
                "cannot bind to the property or column '{segment}' of member '{member}' \
                 (parameter '{param}')"
            ),
            Self::InvalidProperty { param, property } => write!(
                f,
                "cannot bind to the property '{property}' on the target component \
                 (parameter '{param}')"
            ),
            Self::DuplicateBinding { property } => write!(
                f,
                "two bindings in the collection would bind to the same property '{property}'"
            ),
            Self::OutOfRange {
                param,
                value,
                count,
            } => write!(
                f,
                "{value} is out of range for a list of {count} items (parameter '{param}')"
            ),
            Self::Format { value, format } => {
                write!(f, "cannot format '{value}' with format string '{format}'")
            }
            Self::Parse { text, target } => write!(f, "cannot parse '{text}' as {target}"),
            Self::TypeMismatch { expected, found } => {
                write!(f, "expected a {expected} value, found {found}")
            }
            Self::ReadOnly { property } => write!(f, "property '{property}' is read-only"),
            Self::NoCurrentItem => write!(f, "the list has no current item"),
            Self::Unsupported { operation } => {
                write!(f, "the data source does not support {operation}")
            }
        }
    }
}

impl std::error::Error for BindingError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_member_names_data_member_param() {
        let err = BindingError::invalid_member("Two.Nope.Text", "Nope");
        assert_eq!(err.param_name(), Some("dataMember"));
        assert!(err.is_invalid_argument());
        let msg = err.to_string();
        assert!(msg.contains("Nope"));
        assert!(msg.contains("Two.Nope.Text"));
    }

    #[test]
    fn out_of_range_reports_param() {
        let err = BindingError::OutOfRange {
            param: PARAM_INDEX,
            value: 7,
            count: 3,
        };
        assert_eq!(err.param_name(), Some("index"));
        assert!(!err.is_invalid_argument());
        assert!(err.to_string().contains("7"));
    }

    #[test]
    fn parse_error_mentions_target_kind() {
        let err = BindingError::Parse {
            text: "abc".into(),
            target: ValueKind::Int,
        };
        assert_eq!(err.to_string(), "cannot parse 'abc' as integer");
        assert_eq!(err.param_name(), None);
    }
}
