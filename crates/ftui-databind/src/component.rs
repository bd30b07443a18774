#![forbid(unsafe_code)]

//! Hosting surface for bindings: a tree of named components with bindable
//! properties.
//!
//! A [`Component`] owns a set of [`ControlProperty`] values, a
//! [`BindingCollection`], and optionally its own [`BindingContext`].
//! Components without their own context use the nearest ancestor's.
//!
//! ```
//! use ftui_databind::{BindingContext, Component, Value, ValueKind};
//!
//! let form = Component::new("form");
//! let field = Component::new("field").with_property("Text", ValueKind::Text, Value::from(""));
//! form.add_child(&field).unwrap();
//!
//! let ctx = BindingContext::new();
//! form.set_binding_context(Some(ctx.clone())).unwrap();
//! assert!(BindingContext::ptr_eq(&field.binding_context().unwrap(), &ctx));
//! ```
//!
//! # Invariants
//!
//! 1. The effective context of a component is its own, else its nearest
//!    ancestor's, else none.
//! 2. Whenever the effective context of a component changes, its bindings
//!    are re-attached against the new context (or parked when there is
//!    none) and `binding_context_changed` fires on it.
//! 3. A component has at most one parent; re-parenting detaches it from the
//!    previous one.
//!
//! # Failure Modes
//!
//! - Context changes and re-parenting continue past bindings that fail to
//!   attach and return the first error; failing bindings stay parked.
//! - Adding an ancestor as a child is ignored and logged.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use crate::collection::BindingCollection;
use crate::context::BindingContext;
use crate::error::{BindingError, PARAM_PROPERTY_NAME};
use crate::observable::{Notifier, Observable, Subscription};
use crate::value::{Value, ValueKind};

// ---------------------------------------------------------------------------
// ControlProperty
// ---------------------------------------------------------------------------

struct PropertyInner {
    name: String,
    kind: ValueKind,
    value: Observable<Value>,
}

/// One bindable property of a component.
///
/// `kind` is the type the control displays; bindings convert data-side
/// values into it.
#[derive(Clone)]
pub struct ControlProperty {
    inner: Rc<PropertyInner>,
}

impl ControlProperty {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ValueKind, initial: Value) -> Self {
        Self {
            inner: Rc::new(PropertyInner {
                name: name.into(),
                kind,
                value: Observable::new(initial),
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[must_use]
    pub fn kind(&self) -> ValueKind {
        self.inner.kind
    }

    #[must_use]
    pub fn get(&self) -> Value {
        self.inner.value.get()
    }

    /// Store a value. Returns whether it changed.
    pub fn set(&self, value: Value) -> bool {
        self.inner.value.set(value)
    }

    /// Property-changed hook.
    pub fn subscribe(&self, callback: impl Fn(&Value) + 'static) -> Subscription {
        self.inner.value.subscribe(callback)
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.value.version()
    }
}

impl fmt::Debug for ControlProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlProperty")
            .field("name", &self.inner.name)
            .field("kind", &self.inner.kind)
            .field("value", &self.inner.value.get())
            .finish()
    }
}

/// Argument of the `validating` event. Any subscriber may cancel.
#[derive(Debug, Default)]
pub struct ValidatingEvent {
    cancel: Cell<bool>,
}

impl ValidatingEvent {
    pub fn cancel(&self) {
        self.cancel.set(true);
    }

    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.cancel.get()
    }
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

pub(crate) struct ComponentInner {
    name: String,
    parent: RefCell<Weak<ComponentInner>>,
    children: RefCell<Vec<Component>>,
    properties: RefCell<Vec<ControlProperty>>,
    own_context: RefCell<Option<BindingContext>>,
    bindings: BindingCollection,
    binding_context_changed: Notifier,
    validating: Notifier<ValidatingEvent>,
    validated: Notifier,
}

/// Shared handle to a component; clones refer to the same node.
#[derive(Clone)]
pub struct Component {
    inner: Rc<ComponentInner>,
}

/// Non-owning component handle.
#[derive(Clone)]
pub(crate) struct WeakComponent(Weak<ComponentInner>);

impl WeakComponent {
    pub(crate) fn upgrade(&self) -> Option<Component> {
        self.0.upgrade().map(|inner| Component { inner })
    }
}

impl Component {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let inner = Rc::new_cyclic(|weak: &Weak<ComponentInner>| ComponentInner {
            name: name.into(),
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
            properties: RefCell::new(Vec::new()),
            own_context: RefCell::new(None),
            bindings: BindingCollection::new(WeakComponent(weak.clone())),
            binding_context_changed: Notifier::new(),
            validating: Notifier::new(),
            validated: Notifier::new(),
        });
        Self { inner }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    pub(crate) fn downgrade(&self) -> WeakComponent {
        WeakComponent(Rc::downgrade(&self.inner))
    }

    // -- properties -----------------------------------------------------------

    /// Define a bindable property, replacing any property of the same name
    /// (case-insensitive).
    pub fn add_property(&self, name: &str, kind: ValueKind, initial: Value) -> ControlProperty {
        let property = ControlProperty::new(name, kind, initial);
        let mut properties = self.inner.properties.borrow_mut();
        properties.retain(|p| !p.name().eq_ignore_ascii_case(name));
        properties.push(property.clone());
        property
    }

    /// Builder form of [`add_property`](Self::add_property).
    #[must_use]
    pub fn with_property(self, name: &str, kind: ValueKind, initial: Value) -> Self {
        self.add_property(name, kind, initial);
        self
    }

    /// Property by name, case-insensitive.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<ControlProperty> {
        self.inner
            .properties
            .borrow()
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    #[must_use]
    pub fn property_names(&self) -> Vec<String> {
        self.inner
            .properties
            .borrow()
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.property(name).map(|p| p.get())
    }

    /// Set a property as the control would, firing its change hook.
    ///
    /// # Errors
    ///
    /// [`BindingError::InvalidProperty`] for unknown names.
    pub fn set(&self, name: &str, value: Value) -> Result<(), BindingError> {
        let property = self.property(name).ok_or_else(|| BindingError::InvalidProperty {
            param: PARAM_PROPERTY_NAME,
            property: name.to_string(),
        })?;
        property.set(value);
        Ok(())
    }

    // -- bindings and context -------------------------------------------------

    #[must_use]
    pub fn bindings(&self) -> &BindingCollection {
        &self.inner.bindings
    }

    /// Own context, else the nearest ancestor's.
    #[must_use]
    pub fn binding_context(&self) -> Option<BindingContext> {
        if let Some(ctx) = self.inner.own_context.borrow().as_ref() {
            return Some(ctx.clone());
        }
        self.parent().and_then(|parent| parent.binding_context())
    }

    /// Whether the component owns its context rather than inheriting one.
    #[must_use]
    pub fn owns_binding_context(&self) -> bool {
        self.inner.own_context.borrow().is_some()
    }

    /// Set (or clear) the component's own context. Every component in the
    /// subtree whose effective context changes is rebound.
    ///
    /// # Errors
    ///
    /// The first binding that fails to attach.
    pub fn set_binding_context(&self, context: Option<BindingContext>) -> Result<(), BindingError> {
        let before = self.binding_context();
        *self.inner.own_context.borrow_mut() = context;
        if same_context(before.as_ref(), self.binding_context().as_ref()) {
            return Ok(());
        }
        self.context_changed()
    }

    /// Fired when the effective context changes.
    #[must_use]
    pub fn binding_context_changed(&self) -> &Notifier {
        &self.inner.binding_context_changed
    }

    /// Rebind this component and every descendant that inherits from it.
    fn context_changed(&self) -> Result<(), BindingError> {
        let context = self.binding_context();
        debug!(
            component = self.name(),
            bound = context.is_some(),
            "binding context changed"
        );
        let mut first_error = self.inner.bindings.rebind(self, context.as_ref()).err();
        self.inner.binding_context_changed.emit();
        for child in self.children() {
            if child.owns_binding_context() {
                continue;
            }
            if let Err(err) = child.context_changed() {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    // -- tree -----------------------------------------------------------------

    #[must_use]
    pub fn parent(&self) -> Option<Component> {
        self.inner.parent.borrow().upgrade().map(|inner| Component { inner })
    }

    /// Snapshot of the children.
    #[must_use]
    pub fn children(&self) -> Vec<Component> {
        self.inner.children.borrow().clone()
    }

    fn is_ancestor_or_self(&self, other: &Component) -> bool {
        let mut node = Some(self.clone());
        while let Some(current) = node {
            if Component::ptr_eq(&current, other) {
                return true;
            }
            node = current.parent();
        }
        false
    }

    /// Attach `child`, re-parenting it if needed. A child that inherits its
    /// context is rebound against this component's.
    ///
    /// # Errors
    ///
    /// The first binding in the child's subtree that fails to attach.
    pub fn add_child(&self, child: &Component) -> Result<(), BindingError> {
        if self.is_ancestor_or_self(child) {
            warn!(
                parent = self.name(),
                child = child.name(),
                "adding an ancestor as a child is ignored"
            );
            return Ok(());
        }
        let before = child.binding_context();
        if let Some(old) = child.parent() {
            old.unlink_child(child);
        }
        *child.inner.parent.borrow_mut() = Rc::downgrade(&self.inner);
        self.inner.children.borrow_mut().push(child.clone());
        if same_context(before.as_ref(), child.binding_context().as_ref()) {
            return Ok(());
        }
        child.context_changed()
    }

    /// Detach `child`. Returns whether it was a child of this component.
    pub fn remove_child(&self, child: &Component) -> bool {
        let before = child.binding_context();
        if !self.unlink_child(child) {
            return false;
        }
        if !same_context(before.as_ref(), child.binding_context().as_ref())
            && let Err(err) = child.context_changed()
        {
            warn!(child = child.name(), error = %err, "rebinding removed child failed");
        }
        true
    }

    fn unlink_child(&self, child: &Component) -> bool {
        let mut children = self.inner.children.borrow_mut();
        let Some(index) = children.iter().position(|c| Component::ptr_eq(c, child)) else {
            return false;
        };
        children.remove(index);
        *child.inner.parent.borrow_mut() = Weak::new();
        true
    }

    // -- validation -----------------------------------------------------------

    /// Cancelable pre-validation event.
    #[must_use]
    pub fn validating(&self) -> &Notifier<ValidatingEvent> {
        &self.inner.validating
    }

    /// Fired after a validation that was not canceled and wrote cleanly.
    #[must_use]
    pub fn validated(&self) -> &Notifier {
        &self.inner.validated
    }

    /// Run validation: `validating` (cancelable), then every
    /// validation-driven binding writes and commits, then `validated`.
    /// Returns `Ok(false)` when a subscriber canceled.
    ///
    /// # Errors
    ///
    /// The first write that fails. Remaining bindings still write.
    pub fn validate(&self) -> Result<bool, BindingError> {
        let event = ValidatingEvent::default();
        self.inner.validating.notify(&event);
        if event.is_canceled() {
            debug!(component = self.name(), "validation canceled");
            return Ok(false);
        }
        let mut first_error = None;
        for binding in self.inner.bindings.iter() {
            if let Err(err) = binding.commit_on_validation() {
                first_error.get_or_insert(err);
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }
        self.inner.validated.emit();
        Ok(true)
    }

    /// Validate this component and its subtree, depth first.
    ///
    /// # Errors
    ///
    /// The first write that fails; validation stops there.
    pub fn validate_tree(&self) -> Result<bool, BindingError> {
        let mut valid = self.validate()?;
        for child in self.children() {
            valid &= child.validate_tree()?;
        }
        Ok(valid)
    }
}

fn same_context(a: Option<&BindingContext>, b: Option<&BindingContext>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => BindingContext::ptr_eq(a, b),
        _ => false,
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.inner.name)
            .field("properties", &self.inner.properties.borrow().len())
            .field("children", &self.inner.children.borrow().len())
            .field("bindings", &self.inner.bindings.len())
            .field("owns_context", &self.owns_binding_context())
            .finish()
    }
}
