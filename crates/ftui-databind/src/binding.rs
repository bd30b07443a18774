#![forbid(unsafe_code)]

//! One control property coupled to one data member.
//!
//! A [`Binding`] names a property of its hosting [`Component`], a data
//! source, and a dotted data member. Once the host has a
//! [`BindingContext`], the binding obtains the [`BindingManager`] for the
//! member's path and keeps the control property and the member's field in
//! sync:
//!
//! - **Data → control** ([`read_value`](Binding::read_value)): on every
//!   `current_changed` of the manager and every change of the bound field,
//!   unless [`ControlUpdateMode::Never`].
//! - **Control → data** ([`write_value`](Binding::write_value)): on every
//!   control property change with [`DataSourceUpdateMode::OnPropertyChanged`],
//!   on host validation with [`DataSourceUpdateMode::OnValidation`], never
//!   automatically with [`DataSourceUpdateMode::Never`].
//!
//! Reads substitute `null_value` for `data_source_null_value`, run the format
//! hook, then format (or convert) to the control property's kind. Writes
//! run the inverse.
//!
//! # Invariants
//!
//! 1. A value pushed by one direction never echoes back through the other
//!    (re-entrancy guard).
//! 2. `is_binding()` implies a live host, a resolved manager, and a manager
//!    that is binding.
//! 3. Detaching drops every subscription the binding made; the manager
//!    itself stays alive in its context.
//!
//! # Failure Modes
//!
//! - Explicit reads and writes return conversion errors to the caller and
//!   report them through [`binding_complete`](Binding::binding_complete).
//! - Automatic reads and writes cannot return errors; they report through
//!   `binding_complete` and log at `warn`.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, debug_span, trace, warn};

use crate::component::{Component, ControlProperty, WeakComponent};
use crate::config::BindingOptions;
use crate::context::BindingContext;
use crate::error::{BindingError, PARAM_PROPERTY_NAME};
use crate::format::{FormatInfo, format_value, parse_value};
use crate::manager::{BindingManager, DataSource};
use crate::member::MemberPath;
use crate::observable::{Notifier, Subscription};
use crate::resolver::{ChangeCallback, PathResolver};
use crate::value::{Value, ValueKind};

/// When the control property is refreshed from the data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "binding-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ControlUpdateMode {
    /// Whenever the bound value or the current item changes.
    #[default]
    OnPropertyChanged,
    /// Only on explicit [`Binding::read_value`].
    Never,
}

/// When the data source is updated from the control property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "binding-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum DataSourceUpdateMode {
    /// When the hosting component validates.
    #[default]
    OnValidation,
    /// On every change of the control property.
    OnPropertyChanged,
    /// Only on explicit [`Binding::write_value`].
    Never,
}

/// Value handed to format and parse hooks. A hook that leaves `value` of
/// the `desired` kind replaces the default conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertEvent {
    pub value: Value,
    pub desired: ValueKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingCompleteState {
    Success,
    DataError,
}

/// Direction of the transfer a [`BindingCompleteEvent`] reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingCompleteContext {
    ControlUpdate,
    DataSourceUpdate,
}

/// Outcome of one read or write.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingCompleteEvent {
    pub state: BindingCompleteState,
    pub context: BindingCompleteContext,
    pub error: Option<BindingError>,
}

type ConvertHandler = Rc<dyn Fn(&mut ConvertEvent)>;

struct BindingInner {
    property_name: Option<String>,
    data_source: Option<DataSource>,
    member: MemberPath,
    options: RefCell<BindingOptions>,
    host: RefCell<Option<WeakComponent>>,
    manager: RefCell<Option<BindingManager>>,
    field: RefCell<PathResolver>,
    links: RefCell<Vec<Subscription>>,
    syncing: Cell<bool>,
    on_format: RefCell<Option<ConvertHandler>>,
    on_parse: RefCell<Option<ConvertHandler>>,
    binding_complete: Notifier<BindingCompleteEvent>,
    field_changed: ChangeCallback,
    weak_self: Weak<BindingInner>,
}

/// Shared handle to a binding; clones refer to the same binding.
#[derive(Clone)]
pub struct Binding {
    inner: Rc<BindingInner>,
}

impl Binding {
    /// Bind control property `property` to `member` of `source`.
    #[must_use]
    pub fn new(property: &str, source: impl Into<DataSource>, member: &str) -> Self {
        Self::from_parts(
            Some(property),
            Some(source.into()),
            Some(member),
            BindingOptions::default(),
        )
    }

    #[must_use]
    pub fn with_options(
        property: &str,
        source: impl Into<DataSource>,
        member: &str,
        options: BindingOptions,
    ) -> Self {
        Self::from_parts(Some(property), Some(source.into()), Some(member), options)
    }

    /// Fully general constructor. Every part may be absent; a binding
    /// without a property or source is inert and never fails.
    #[must_use]
    pub fn from_parts(
        property: Option<&str>,
        source: Option<DataSource>,
        member: Option<&str>,
        options: BindingOptions,
    ) -> Self {
        let member = MemberPath::from(member);
        let field = PathResolver::new(member.field());
        let inner = Rc::new_cyclic(|weak: &Weak<BindingInner>| {
            let field_weak = weak.clone();
            let field_changed: ChangeCallback = Rc::new(move || {
                if let Some(inner) = field_weak.upgrade() {
                    inner.data_changed();
                }
            });
            BindingInner {
                property_name: property.map(str::to_string),
                data_source: source,
                member,
                options: RefCell::new(options),
                host: RefCell::new(None),
                manager: RefCell::new(None),
                field: RefCell::new(field),
                links: RefCell::new(Vec::new()),
                syncing: Cell::new(false),
                on_format: RefCell::new(None),
                on_parse: RefCell::new(None),
                binding_complete: Notifier::new(),
                field_changed,
                weak_self: weak.clone(),
            }
        });
        Self { inner }
    }

    /// Whether two handles refer to the same binding.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    // -- definition -----------------------------------------------------------

    #[must_use]
    pub fn property_name(&self) -> Option<&str> {
        self.inner.property_name.as_deref()
    }

    #[must_use]
    pub fn data_source(&self) -> Option<&DataSource> {
        self.inner.data_source.as_ref()
    }

    /// The data member as given.
    #[must_use]
    pub fn data_member(&self) -> &str {
        self.inner.member.full()
    }

    /// The data member split into navigation path and field.
    #[must_use]
    pub fn member_info(&self) -> &MemberPath {
        &self.inner.member
    }

    // -- options --------------------------------------------------------------

    /// Snapshot of the current options.
    #[must_use]
    pub fn options(&self) -> BindingOptions {
        self.inner.options.borrow().clone()
    }

    #[must_use]
    pub fn formatting_enabled(&self) -> bool {
        self.inner.options.borrow().formatting_enabled
    }

    #[must_use]
    pub fn format_string(&self) -> String {
        self.inner.options.borrow().format_string.clone()
    }

    #[must_use]
    pub fn format_info(&self) -> Option<FormatInfo> {
        self.inner.options.borrow().format_info.clone()
    }

    #[must_use]
    pub fn null_value(&self) -> Value {
        self.inner.options.borrow().null_value.clone()
    }

    #[must_use]
    pub fn data_source_null_value(&self) -> Value {
        self.inner.options.borrow().data_source_null_value.clone()
    }

    #[must_use]
    pub fn control_update_mode(&self) -> ControlUpdateMode {
        self.inner.options.borrow().control_update_mode
    }

    #[must_use]
    pub fn data_source_update_mode(&self) -> DataSourceUpdateMode {
        self.inner.options.borrow().data_source_update_mode
    }

    pub fn set_formatting_enabled(&self, enabled: bool) {
        self.inner.options.borrow_mut().formatting_enabled = enabled;
        self.inner.refresh_display();
    }

    /// Set the format string; `None` resets it to empty.
    pub fn set_format_string(&self, format: Option<&str>) {
        self.inner.options.borrow_mut().format_string = format.unwrap_or_default().to_string();
        self.inner.refresh_display();
    }

    pub fn set_format_info(&self, info: Option<FormatInfo>) {
        self.inner.options.borrow_mut().format_info = info;
        self.inner.refresh_display();
    }

    pub fn set_null_value(&self, value: impl Into<Value>) {
        self.inner.options.borrow_mut().null_value = value.into();
        self.inner.refresh_display();
    }

    pub fn set_data_source_null_value(&self, value: impl Into<Value>) {
        self.inner.options.borrow_mut().data_source_null_value = value.into();
        self.inner.refresh_display();
    }

    pub fn set_control_update_mode(&self, mode: ControlUpdateMode) {
        self.inner.options.borrow_mut().control_update_mode = mode;
    }

    pub fn set_data_source_update_mode(&self, mode: DataSourceUpdateMode) {
        self.inner.options.borrow_mut().data_source_update_mode = mode;
    }

    // -- hooks ----------------------------------------------------------------

    /// Install the format hook, run on every read before default formatting.
    pub fn on_format(&self, handler: impl Fn(&mut ConvertEvent) + 'static) {
        *self.inner.on_format.borrow_mut() = Some(Rc::new(handler));
    }

    /// Install the parse hook, run on every write before default parsing.
    pub fn on_parse(&self, handler: impl Fn(&mut ConvertEvent) + 'static) {
        *self.inner.on_parse.borrow_mut() = Some(Rc::new(handler));
    }

    /// Fired after every read and write, successful or not.
    #[must_use]
    pub fn binding_complete(&self) -> &Notifier<BindingCompleteEvent> {
        &self.inner.binding_complete
    }

    // -- state ----------------------------------------------------------------

    /// Hosting component, while it is alive.
    #[must_use]
    pub fn host(&self) -> Option<Component> {
        self.inner.host.borrow().as_ref().and_then(WeakComponent::upgrade)
    }

    /// Manager resolved for the member's path, once bound.
    #[must_use]
    pub fn manager(&self) -> Option<BindingManager> {
        self.inner.manager.borrow().clone()
    }

    /// Whether values flow: a live host, a resolved manager, and a manager
    /// that is binding.
    #[must_use]
    pub fn is_binding(&self) -> bool {
        self.host().is_some()
            && self
                .inner
                .manager
                .borrow()
                .as_ref()
                .is_some_and(BindingManager::is_binding)
    }

    // -- transfer -------------------------------------------------------------

    /// Push the data-side value to the control property. No-op while
    /// unbound.
    ///
    /// # Errors
    ///
    /// Lookup and formatting errors.
    pub fn read_value(&self) -> Result<(), BindingError> {
        self.inner.read()
    }

    /// Push the control property to the data side. No-op while unbound.
    ///
    /// # Errors
    ///
    /// Parsing, conversion and write errors.
    pub fn write_value(&self) -> Result<(), BindingError> {
        self.inner.write()
    }

    // -- lifecycle (driven by collections and components) --------------------

    pub(crate) fn set_host(&self, host: Option<&Component>) {
        self.inner.release();
        *self.inner.host.borrow_mut() = host.map(Component::downgrade);
    }

    /// Resolve against `context` and start syncing.
    pub(crate) fn attach(
        &self,
        host: &Component,
        context: &BindingContext,
    ) -> Result<(), BindingError> {
        self.inner.attach(host, context)
    }

    /// Stop syncing and forget the host.
    pub(crate) fn detach(&self) {
        self.inner.release();
        self.inner.host.borrow_mut().take();
    }

    /// Write for validation-driven updates, then commit the row edit.
    pub(crate) fn commit_on_validation(&self) -> Result<(), BindingError> {
        if self.data_source_update_mode() != DataSourceUpdateMode::OnValidation {
            return Ok(());
        }
        let Some(manager) = self.manager() else {
            return Ok(());
        };
        self.inner.write()?;
        manager.end_edit();
        Ok(())
    }
}

impl Default for Binding {
    /// An inert binding with no property, source or member.
    fn default() -> Self {
        Self::from_parts(None, None, None, BindingOptions::default())
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("property", &self.inner.property_name)
            .field("member", &self.inner.member.full())
            .field("bound", &self.inner.manager.borrow().is_some())
            .finish()
    }
}

impl BindingInner {
    fn property_label(&self) -> &str {
        self.property_name.as_deref().unwrap_or_default()
    }

    fn control_property(&self, host: &Component) -> Result<Option<ControlProperty>, BindingError> {
        let Some(name) = self.property_name.as_deref() else {
            return Ok(None);
        };
        host.property(name)
            .map(Some)
            .ok_or_else(|| BindingError::InvalidProperty {
                param: PARAM_PROPERTY_NAME,
                property: name.to_string(),
            })
    }

    /// Manager and control property, when fully bound.
    fn bound(&self) -> Result<Option<(BindingManager, ControlProperty)>, BindingError> {
        let Some(manager) = self.manager.borrow().clone() else {
            return Ok(None);
        };
        let Some(host) = self.host.borrow().as_ref().and_then(WeakComponent::upgrade) else {
            return Ok(None);
        };
        Ok(self.control_property(&host)?.map(|property| (manager, property)))
    }

    fn complete(&self, context: BindingCompleteContext, error: Option<BindingError>) {
        let state = if error.is_some() {
            BindingCompleteState::DataError
        } else {
            BindingCompleteState::Success
        };
        self.binding_complete.notify(&BindingCompleteEvent {
            state,
            context,
            error,
        });
    }

    fn format_info(&self) -> FormatInfo {
        self.options
            .borrow()
            .format_info
            .clone()
            .unwrap_or_else(FormatInfo::current)
    }

    fn check_field(&self, manager: &BindingManager) -> Result<(), BindingError> {
        let field = self.member.field();
        if field.is_empty() {
            return Ok(());
        }
        let missing = || BindingError::invalid_member(self.member.full(), field);
        match manager.item_descriptor() {
            Some(descriptor) => descriptor.find(field).map(drop).ok_or_else(missing),
            None if manager.current().is_null() => Ok(()),
            None => Err(missing()),
        }
    }

    fn attach(&self, host: &Component, context: &BindingContext) -> Result<(), BindingError> {
        self.release();
        let property = self.control_property(host)?;
        *self.host.borrow_mut() = Some(host.downgrade());
        let Some(source) = self.data_source.as_ref() else {
            return Ok(());
        };

        let manager = context
            .get_member(source, self.member.path())
            .and_then(|manager| self.check_field(&manager).map(|()| manager))
            .map_err(|err| err.within_member(self.member.full()))?;

        let mut links = Vec::with_capacity(2);
        let weak = self.weak_self.clone();
        links.push(manager.current_changed().subscribe(move |()| {
            if let Some(inner) = weak.upgrade() {
                inner.current_changed();
            }
        }));
        if let Some(property) = &property {
            let weak = self.weak_self.clone();
            links.push(property.subscribe(move |_| {
                if let Some(inner) = weak.upgrade() {
                    inner.control_changed();
                }
            }));
        }
        *self.links.borrow_mut() = links;
        *self.manager.borrow_mut() = Some(manager.clone());
        self.resubscribe_field(&manager);

        debug!(
            property = self.property_label(),
            member = self.member.full(),
            manager = manager.id().id(),
            "binding attached"
        );

        if self.options.borrow().control_update_mode != ControlUpdateMode::Never {
            self.read_logged();
        }
        Ok(())
    }

    fn release(&self) {
        self.links.borrow_mut().clear();
        self.field.borrow_mut().release();
        if let Some(manager) = self.manager.borrow_mut().take() {
            debug!(
                property = self.property_label(),
                manager = manager.id().id(),
                "binding detached"
            );
        }
    }

    fn resubscribe_field(&self, manager: &BindingManager) {
        let current = manager.current();
        let resolved = self
            .field
            .borrow_mut()
            .resolve(&current, &self.field_changed);
        if let Err(err) = resolved {
            warn!(
                property = self.property_label(),
                member = self.member.full(),
                error = %err,
                "bound field no longer resolves on the current item"
            );
        }
    }

    // -- automatic triggers -------------------------------------------------

    fn current_changed(&self) {
        let Some(manager) = self.manager.borrow().clone() else {
            return;
        };
        self.resubscribe_field(&manager);
        if self.options.borrow().control_update_mode != ControlUpdateMode::Never
            && manager.is_binding()
        {
            self.read_logged();
        }
    }

    fn data_changed(&self) {
        if self.syncing.get() || self.options.borrow().control_update_mode == ControlUpdateMode::Never {
            return;
        }
        let is_binding = self
            .manager
            .borrow()
            .as_ref()
            .is_some_and(BindingManager::is_binding);
        if is_binding {
            self.read_logged();
        }
    }

    fn control_changed(&self) {
        if self.syncing.get()
            || self.options.borrow().data_source_update_mode != DataSourceUpdateMode::OnPropertyChanged
        {
            return;
        }
        if let Err(err) = self.write() {
            warn!(
                property = self.property_label(),
                member = self.member.full(),
                error = %err,
                "automatic data source update failed"
            );
        }
    }

    fn read_logged(&self) {
        if let Err(err) = self.read() {
            warn!(
                property = self.property_label(),
                member = self.member.full(),
                error = %err,
                "automatic control update failed"
            );
        }
    }

    /// Re-read after a display option changed.
    fn refresh_display(&self) {
        if self.manager.borrow().is_some()
            && self.options.borrow().control_update_mode != ControlUpdateMode::Never
        {
            self.read_logged();
        }
    }

    // -- pipelines ------------------------------------------------------------

    fn read(&self) -> Result<(), BindingError> {
        let Some((manager, property)) = self.bound()? else {
            return Ok(());
        };
        let _span = debug_span!("binding_read", property = self.property_label()).entered();
        let result = manager
            .get_value(self.member.field())
            .and_then(|raw| self.format(raw, property.kind()));
        match result {
            Ok(shown) => {
                trace!(value = ?shown, "control updated");
                let was_syncing = self.syncing.replace(true);
                property.set(shown);
                self.syncing.set(was_syncing);
                self.complete(BindingCompleteContext::ControlUpdate, None);
                Ok(())
            }
            Err(err) => {
                self.complete(BindingCompleteContext::ControlUpdate, Some(err.clone()));
                Err(err)
            }
        }
    }

    fn write(&self) -> Result<(), BindingError> {
        let Some((manager, property)) = self.bound()? else {
            return Ok(());
        };
        let field = self.member.field();
        if field.is_empty() {
            return Ok(());
        }
        let _span = debug_span!("binding_write", property = self.property_label()).entered();
        let target = manager
            .item_descriptor()
            .and_then(|descriptor| descriptor.find(field).map(|accessor| accessor.kind()))
            .unwrap_or_default();
        let result = self.parse(property.get(), target).and_then(|value| {
            trace!(value = ?value, "data source updated");
            let was_syncing = self.syncing.replace(true);
            let written = manager.set_value(field, value);
            self.syncing.set(was_syncing);
            written
        });
        match result {
            Ok(()) => {
                self.complete(BindingCompleteContext::DataSourceUpdate, None);
                Ok(())
            }
            Err(err) => {
                self.complete(BindingCompleteContext::DataSourceUpdate, Some(err.clone()));
                Err(err)
            }
        }
    }

    /// Data side to control side.
    fn format(&self, raw: Value, target: ValueKind) -> Result<Value, BindingError> {
        let options = self.options.borrow().clone();
        if raw.is_null() || raw == options.data_source_null_value {
            return Ok(options.null_value);
        }
        let desired = if options.formatting_enabled && target == ValueKind::Any {
            ValueKind::Text
        } else {
            target
        };
        let mut event = ConvertEvent {
            value: raw,
            desired,
        };
        let handler = self.on_format.borrow().clone();
        if let Some(handler) = handler {
            handler(&mut event);
        }
        if desired == ValueKind::Any || event.value.kind() == desired {
            return Ok(event.value);
        }
        if options.formatting_enabled && desired == ValueKind::Text {
            let info = options.format_info.unwrap_or_else(FormatInfo::current);
            return format_value(&event.value, &options.format_string, &info).map(Value::Text);
        }
        event.value.convert_to(desired)
    }

    /// Control side to data side.
    fn parse(&self, value: Value, target: ValueKind) -> Result<Value, BindingError> {
        let options = self.options.borrow().clone();
        let empty_text = options.formatting_enabled
            && options.null_value.is_null()
            && value.as_str().is_some_and(|s| s.trim().is_empty());
        if value.is_null() || value == options.null_value || empty_text {
            return Ok(options.data_source_null_value);
        }
        let mut event = ConvertEvent {
            value,
            desired: target,
        };
        let handler = self.on_parse.borrow().clone();
        if let Some(handler) = handler {
            handler(&mut event);
        }
        if target == ValueKind::Any || event.value.kind() == target {
            return Ok(event.value);
        }
        if options.formatting_enabled
            && let Value::Text(text) = &event.value
        {
            let info = self.format_info();
            return parse_value(text, target, &options.format_string, &info);
        }
        event.value.convert_to(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Schema;

    fn setup(options: BindingOptions) -> (Component, Rc<crate::record::Record>, Binding) {
        let schema = Schema::builder("Item")
            .column("Amount", ValueKind::Int)
            .column("Note", ValueKind::Text)
            .build();
        let row = schema
            .record([("Amount", Value::Int(666)), ("Note", Value::from("hi"))])
            .unwrap();
        let host = Component::new("host");
        host.add_property("Text", ValueKind::Text, Value::from(""));
        host.set_binding_context(Some(BindingContext::new())).unwrap();
        let binding = Binding::with_options("Text", DataSource::object(row.clone()), "Amount", options);
        host.bindings().add(binding.clone()).unwrap();
        (host, row, binding)
    }

    #[test]
    fn inert_binding_has_no_parts() {
        let binding = Binding::default();
        assert_eq!(binding.property_name(), None);
        assert!(binding.data_source().is_none());
        assert_eq!(binding.data_member(), "");
        assert!(!binding.is_binding());
        assert_eq!(binding.read_value(), Ok(()));
        assert_eq!(binding.write_value(), Ok(()));
    }

    #[test]
    fn format_string_resets_to_empty() {
        let binding = Binding::default();
        binding.set_format_string(Some("C"));
        assert_eq!(binding.format_string(), "C");
        binding.set_format_string(None);
        assert_eq!(binding.format_string(), "");
    }

    #[test]
    fn formatting_toggle_changes_display() {
        let options = BindingOptions::default()
            .formatting_enabled(true)
            .format_string("p")
            .format_info(FormatInfo::invariant());
        let (host, _row, binding) = setup(options);
        assert_eq!(host.get("Text"), Some(Value::from("66,600.00 %")));
        binding.set_formatting_enabled(false);
        assert_eq!(host.get("Text"), Some(Value::from("666")));
    }

    #[test]
    fn format_hook_can_take_over() {
        let (host, _row, binding) = setup(BindingOptions::default());
        binding.on_format(|event| {
            if let Some(n) = event.value.as_int() {
                event.value = Value::from(format!("#{n}"));
            }
        });
        binding.read_value().unwrap();
        assert_eq!(host.get("Text"), Some(Value::from("#666")));
    }

    #[test]
    fn parse_errors_surface_and_report() {
        let options = BindingOptions::default()
            .data_source_update_mode(DataSourceUpdateMode::Never);
        let (host, row, binding) = setup(options);
        let errors = Rc::new(Cell::new(0));
        let e = Rc::clone(&errors);
        let _sub = binding.binding_complete().subscribe(move |event| {
            if event.state == BindingCompleteState::DataError {
                e.set(e.get() + 1);
            }
        });
        host.set("Text", Value::from("lots")).unwrap();
        let err = binding.write_value().unwrap_err();
        assert!(matches!(err, BindingError::Parse { .. }));
        assert_eq!(errors.get(), 1);
        assert_eq!(row.get("Amount"), Some(Value::Int(666)));
    }

    #[test]
    fn on_property_changed_writes_through() {
        let options = BindingOptions::default()
            .data_source_update_mode(DataSourceUpdateMode::OnPropertyChanged);
        let (host, row, _binding) = setup(options);
        host.set("Text", Value::from("12")).unwrap();
        assert_eq!(row.get("Amount"), Some(Value::Int(12)));
    }

    #[test]
    fn detached_binding_stops_following() {
        let (host, row, binding) = setup(BindingOptions::default());
        assert!(binding.is_binding());
        assert!(host.bindings().remove(&binding));
        assert!(!binding.is_binding());
        row.set("Amount", 1).unwrap();
        assert_eq!(host.get("Text"), Some(Value::from("666")));
    }
}
