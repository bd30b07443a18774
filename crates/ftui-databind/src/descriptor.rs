#![forbid(unsafe_code)]

//! Named property access without reflection.
//!
//! Every bindable type publishes a [`TypeDescriptor`]: an ordered set of
//! [`PropertyAccessor`]s looked up by name. An accessor reads and writes one
//! property and, when the type advertises it, registers observers on that
//! property's change [`Notifier`]. Observability is declared explicitly with
//! [`DescriptorBuilder::notify`]; nothing is inferred from naming patterns.
//!
//! Descriptors for concrete types are built once per thread and cached by
//! [`TypeDescriptor::of`].
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use ftui_databind::descriptor::{Describe, TypeDescriptor};
//! use ftui_databind::{Notifier, Value, ValueKind, impl_data_object};
//!
//! #[derive(Default)]
//! struct Item {
//!     text: RefCell<String>,
//!     text_changed: Notifier,
//! }
//!
//! impl Describe for Item {
//!     fn describe() -> TypeDescriptor {
//!         TypeDescriptor::builder::<Item>("Item")
//!             .property("Text", ValueKind::Text, |item| Value::from(item.text.borrow().clone()))
//!             .setter(|item, value| {
//!                 *item.text.borrow_mut() = value.to_string();
//!                 item.text_changed.emit();
//!                 Ok(())
//!             })
//!             .notify(|item| &item.text_changed)
//!             .build()
//!     }
//! }
//! impl_data_object!(Item);
//!
//! let item = Rc::new(Item::default());
//! let text = TypeDescriptor::of::<Item>().find("text").cloned().unwrap();
//! text.set(item.as_ref(), Value::from("hello")).unwrap();
//! assert_eq!(text.get(item.as_ref()), Value::from("hello"));
//! ```

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;

use crate::error::BindingError;
use crate::observable::{Notifier, Subscription};
use crate::value::{Value, ValueKind};

/// Shared handle to a bindable object.
pub type ObjectRef = Rc<dyn DataObject>;

/// A value that exposes named properties through a [`TypeDescriptor`].
///
/// The `begin_edit`/`end_edit`/`cancel_edit` hooks form the editable-object
/// capability list managers drive while a row is being edited. They default
/// to no-ops.
pub trait DataObject: Any {
    /// Property descriptors for this object.
    fn descriptor(&self) -> Rc<TypeDescriptor>;

    /// Upcast for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Start an edit transaction on this object.
    fn begin_edit(&self) {}

    /// Commit the edit transaction.
    fn end_edit(&self) {}

    /// Roll back to the state captured by `begin_edit`.
    fn cancel_edit(&self) {}
}

/// Static descriptor construction for a concrete type, cached by
/// [`TypeDescriptor::of`].
pub trait Describe: 'static {
    fn describe() -> TypeDescriptor;
}

/// Implements [`DataObject`] for a type that implements [`Describe`].
#[macro_export]
macro_rules! impl_data_object {
    ($ty:ty) => {
        impl $crate::descriptor::DataObject for $ty {
            fn descriptor(&self) -> ::std::rc::Rc<$crate::descriptor::TypeDescriptor> {
                $crate::descriptor::TypeDescriptor::of::<Self>()
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }
    };
}

/// Reads, writes, and observes one named property.
pub trait PropertyAccessor {
    fn name(&self) -> &str;

    /// Declared kind; values handed to [`set`](Self::set) are converted to it.
    fn kind(&self) -> ValueKind;

    fn is_read_only(&self) -> bool;

    fn get(&self, owner: &dyn DataObject) -> Value;

    /// # Errors
    ///
    /// [`BindingError::ReadOnly`] when the property has no setter, or any
    /// error the setter reports.
    fn set(&self, owner: &dyn DataObject, value: Value) -> Result<(), BindingError>;

    fn supports_change_notification(&self) -> bool;

    /// Observe changes of this property on `owner`. `None` when the property
    /// is not observable.
    fn subscribe(&self, owner: &dyn DataObject, callback: Rc<dyn Fn()>) -> Option<Subscription>;
}

/// Ordered, name-addressable set of property accessors for one type.
pub struct TypeDescriptor {
    type_name: String,
    properties: Vec<Rc<dyn PropertyAccessor>>,
}

thread_local! {
    static REGISTRY: RefCell<AHashMap<TypeId, Rc<TypeDescriptor>>> =
        RefCell::new(AHashMap::new());
}

impl TypeDescriptor {
    /// Start building a descriptor for `T` from typed closures.
    #[must_use]
    pub fn builder<T: 'static>(type_name: impl Into<String>) -> DescriptorBuilder<T> {
        DescriptorBuilder {
            type_name: type_name.into(),
            properties: Vec::new(),
            pending: None,
        }
    }

    /// Assemble a descriptor from ready-made accessors.
    #[must_use]
    pub fn from_accessors(
        type_name: impl Into<String>,
        properties: Vec<Rc<dyn PropertyAccessor>>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            properties,
        }
    }

    /// The cached descriptor for `T`, built on first use.
    #[must_use]
    pub fn of<T: Describe>() -> Rc<TypeDescriptor> {
        let id = TypeId::of::<T>();
        if let Some(found) = REGISTRY.with(|r| r.borrow().get(&id).cloned()) {
            return found;
        }
        let built = Rc::new(T::describe());
        REGISTRY.with(|r| {
            Rc::clone(r.borrow_mut().entry(id).or_insert(built))
        })
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Look up a property by name; exact matches win over case-insensitive ones.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Rc<dyn PropertyAccessor>> {
        self.properties
            .iter()
            .find(|p| p.name() == name)
            .or_else(|| {
                self.properties
                    .iter()
                    .find(|p| p.name().eq_ignore_ascii_case(name))
            })
    }

    pub fn properties(&self) -> impl Iterator<Item = &Rc<dyn PropertyAccessor>> {
        self.properties.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type_name", &self.type_name)
            .field(
                "properties",
                &self.properties.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

type Getter<T> = Box<dyn Fn(&T) -> Value>;
type Setter<T> = Box<dyn Fn(&T, Value) -> Result<(), BindingError>>;

struct FieldAccessor<T> {
    name: String,
    kind: ValueKind,
    getter: Getter<T>,
    setter: Option<Setter<T>>,
    notifier: Option<fn(&T) -> &Notifier>,
}

impl<T: 'static> PropertyAccessor for FieldAccessor<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ValueKind {
        self.kind
    }

    fn is_read_only(&self) -> bool {
        self.setter.is_none()
    }

    fn get(&self, owner: &dyn DataObject) -> Value {
        owner
            .as_any()
            .downcast_ref::<T>()
            .map_or(Value::Null, |owner| (self.getter)(owner))
    }

    fn set(&self, owner: &dyn DataObject, value: Value) -> Result<(), BindingError> {
        let setter = self.setter.as_ref().ok_or_else(|| BindingError::ReadOnly {
            property: self.name.clone(),
        })?;
        let owner = owner
            .as_any()
            .downcast_ref::<T>()
            .ok_or(BindingError::TypeMismatch {
                expected: ValueKind::Object,
                found: ValueKind::Object,
            })?;
        setter(owner, value.convert_to(self.kind)?)
    }

    fn supports_change_notification(&self) -> bool {
        self.notifier.is_some()
    }

    fn subscribe(&self, owner: &dyn DataObject, callback: Rc<dyn Fn()>) -> Option<Subscription> {
        let notifier = self.notifier?;
        let owner = owner.as_any().downcast_ref::<T>()?;
        Some(notifier(owner).subscribe(move |()| callback()))
    }
}

/// Builder returned by [`TypeDescriptor::builder`].
///
/// `setter` and `notify` apply to the most recently declared property.
pub struct DescriptorBuilder<T> {
    type_name: String,
    properties: Vec<Rc<dyn PropertyAccessor>>,
    pending: Option<FieldAccessor<T>>,
}

impl<T: 'static> DescriptorBuilder<T> {
    /// Declare a property with its getter. Read-only until a setter is added.
    #[must_use]
    pub fn property(
        mut self,
        name: impl Into<String>,
        kind: ValueKind,
        getter: impl Fn(&T) -> Value + 'static,
    ) -> Self {
        self.flush();
        self.pending = Some(FieldAccessor {
            name: name.into(),
            kind,
            getter: Box::new(getter),
            setter: None,
            notifier: None,
        });
        self
    }

    /// Make the last declared property writable. The setter receives the
    /// value already converted to the declared kind.
    #[must_use]
    pub fn setter(
        mut self,
        setter: impl Fn(&T, Value) -> Result<(), BindingError> + 'static,
    ) -> Self {
        if let Some(pending) = self.pending.as_mut() {
            pending.setter = Some(Box::new(setter));
        }
        self
    }

    /// Advertise the change notifier of the last declared property.
    #[must_use]
    pub fn notify(mut self, notifier: fn(&T) -> &Notifier) -> Self {
        if let Some(pending) = self.pending.as_mut() {
            pending.notifier = Some(notifier);
        }
        self
    }

    #[must_use]
    pub fn build(mut self) -> TypeDescriptor {
        self.flush();
        TypeDescriptor {
            type_name: self.type_name,
            properties: self.properties,
        }
    }

    fn flush(&mut self) {
        if let Some(done) = self.pending.take() {
            self.properties.push(Rc::new(done));
        }
    }
}
