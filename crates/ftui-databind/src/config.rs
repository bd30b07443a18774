#![forbid(unsafe_code)]

//! Binding construction options.
//!
//! [`BindingOptions`] carries every optional parameter of a
//! [`Binding`](crate::Binding) and is built fluently from its defaults:
//!
//! ```
//! use ftui_databind::{BindingOptions, ControlUpdateMode, Value};
//!
//! let options = BindingOptions::default()
//!     .formatting_enabled(true)
//!     .format_string("N2")
//!     .null_value(Value::from("(none)"))
//!     .control_update_mode(ControlUpdateMode::Never);
//! assert!(options.formatting_enabled);
//! ```
//!
//! [`BindingDefaults`] is the plain-data subset that can be shared across a
//! form. With the `binding-config` feature it is serializable and loads from
//! TOML.

use crate::binding::{ControlUpdateMode, DataSourceUpdateMode};
use crate::format::FormatInfo;
use crate::value::Value;

/// Optional parameters of a binding.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingOptions {
    pub formatting_enabled: bool,
    pub control_update_mode: ControlUpdateMode,
    pub data_source_update_mode: DataSourceUpdateMode,
    /// Shown on the control when the data side holds
    /// `data_source_null_value`.
    pub null_value: Value,
    /// Stored on the data side when the control holds `null_value`.
    pub data_source_null_value: Value,
    pub format_string: String,
    /// Culture conventions; `None` follows the active culture.
    pub format_info: Option<FormatInfo>,
}

impl Default for BindingOptions {
    fn default() -> Self {
        Self {
            formatting_enabled: false,
            control_update_mode: ControlUpdateMode::default(),
            data_source_update_mode: DataSourceUpdateMode::default(),
            null_value: Value::Null,
            data_source_null_value: Value::DbNull,
            format_string: String::new(),
            format_info: None,
        }
    }
}

impl BindingOptions {
    #[must_use]
    pub fn formatting_enabled(mut self, enabled: bool) -> Self {
        self.formatting_enabled = enabled;
        self
    }

    #[must_use]
    pub fn control_update_mode(mut self, mode: ControlUpdateMode) -> Self {
        self.control_update_mode = mode;
        self
    }

    #[must_use]
    pub fn data_source_update_mode(mut self, mode: DataSourceUpdateMode) -> Self {
        self.data_source_update_mode = mode;
        self
    }

    #[must_use]
    pub fn null_value(mut self, value: impl Into<Value>) -> Self {
        self.null_value = value.into();
        self
    }

    #[must_use]
    pub fn data_source_null_value(mut self, value: impl Into<Value>) -> Self {
        self.data_source_null_value = value.into();
        self
    }

    #[must_use]
    pub fn format_string(mut self, format: impl Into<String>) -> Self {
        self.format_string = format.into();
        self
    }

    #[must_use]
    pub fn format_info(mut self, info: FormatInfo) -> Self {
        self.format_info = Some(info);
        self
    }
}

/// Form-wide binding defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "binding-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct BindingDefaults {
    pub formatting_enabled: bool,
    pub control_update_mode: ControlUpdateMode,
    pub data_source_update_mode: DataSourceUpdateMode,
    pub format_string: String,
    /// Culture tag such as `"de-DE"`; unset follows the active culture.
    pub culture: Option<String>,
}

impl BindingDefaults {
    /// Options seeded from these defaults.
    #[must_use]
    pub fn to_options(&self) -> BindingOptions {
        BindingOptions {
            formatting_enabled: self.formatting_enabled,
            control_update_mode: self.control_update_mode,
            data_source_update_mode: self.data_source_update_mode,
            format_string: self.format_string.clone(),
            format_info: self.culture.as_deref().map(FormatInfo::for_culture),
            ..BindingOptions::default()
        }
    }

    /// Parse defaults from a TOML document. Missing keys keep their
    /// defaults.
    ///
    /// ```toml
    /// formatting_enabled = true
    /// format_string = "C"
    /// data_source_update_mode = "on_property_changed"
    /// culture = "en-GB"
    /// ```
    ///
    /// # Errors
    ///
    /// Returns the TOML error for malformed documents or unknown mode names.
    #[cfg(feature = "binding-config")]
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Serialize to TOML.
    ///
    /// # Errors
    ///
    /// Returns the TOML error if serialization fails.
    #[cfg(feature = "binding-config")]
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }
}

impl From<&BindingDefaults> for BindingOptions {
    fn from(defaults: &BindingDefaults) -> Self {
        defaults.to_options()
    }
}
