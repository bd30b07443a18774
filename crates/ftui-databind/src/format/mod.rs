#![forbid(unsafe_code)]

//! Display formatting and parsing of bound values.
//!
//! Bindings with formatting enabled render data-side values through
//! [`format_value`] and read edited text back through [`parse_value`], both
//! under a [`FormatInfo`] describing the culture's number conventions.
//!
//! ```
//! use ftui_databind::format::{FormatInfo, format_value};
//! use ftui_databind::Value;
//!
//! let inv = FormatInfo::invariant();
//! assert_eq!(format_value(&Value::Int(666), "p", &inv).unwrap(), "66,600.00 %");
//! let us = FormatInfo::for_culture("en-US");
//! assert_eq!(format_value(&Value::Float(1234.5), "C", &us).unwrap(), "$1,234.50");
//! ```
//!
//! # Failure Modes
//!
//! - Unknown standard specifier (`"Q"`), or an integer-only specifier (`D`,
//!   `X`) applied to a fractional number: [`BindingError::Format`].
//! - Text that does not parse into the requested kind: [`BindingError::Parse`].

mod culture;
mod number;

pub use culture::{CultureContext, CultureOverride, FormatInfo, detect_system_culture};

use crate::error::BindingError;
use crate::value::{Value, ValueKind};

use self::number::Number;

/// Render `value` for display. Numbers honor `format`; text passes through;
/// null values render empty; everything else uses its default
/// stringification.
///
/// # Errors
///
/// [`BindingError::Format`] when `format` cannot be applied to the number.
pub fn format_value(value: &Value, format: &str, info: &FormatInfo) -> Result<String, BindingError> {
    match Number::from_value(value) {
        Some(n) => number::format_number(n, format, info),
        None => Ok(value.to_string()),
    }
}

/// Parse display text into a value of `kind`, undoing the decoration
/// `format` added (grouping, currency, percent).
///
/// # Errors
///
/// [`BindingError::Parse`] when the text does not parse.
pub fn parse_value(
    text: &str,
    kind: ValueKind,
    format: &str,
    info: &FormatInfo,
) -> Result<Value, BindingError> {
    number::parse_number(text, kind, format, info)
}
