#![forbid(unsafe_code)]

//! Data binding for FrankenTUI components.
//!
//! This crate keeps a component property in sync with a property reached
//! through a dotted path on a data object or list:
//! - [`MemberPath`] and [`PathResolver`] parse and walk `"Orders.Lines.Qty"`
//!   style members, subscribing to every hop
//! - [`BindingManager`] tracks the current item of a source (and the
//!   position within a list), with suspend/resume batching and row edits
//! - [`BindingContext`] shares one manager per `(source, member)` across a
//!   component tree
//! - [`Binding`] moves values between a [`ControlProperty`] and the data
//!   side, formatting and parsing with [`FormatInfo`]
//! - [`Component`] and [`BindingCollection`] host bindings
//!
//! ```
//! use ftui_databind::{BindingContext, Component, Schema, Value, ValueKind};
//!
//! let schema = Schema::builder("Person").column("Name", ValueKind::Text).build();
//! let people = schema.new_table();
//! people.push(schema.record([("Name", Value::from("Ada"))]).unwrap());
//! people.push(schema.record([("Name", Value::from("Grace"))]).unwrap());
//! let people = std::rc::Rc::new(people);
//!
//! let form = Component::new("form").with_property("Text", ValueKind::Text, Value::Null);
//! form.set_binding_context(Some(BindingContext::new())).unwrap();
//! let binding = form
//!     .bindings()
//!     .bind("Text", ftui_databind::DataSource::list(people), "Name")
//!     .unwrap();
//! assert_eq!(form.get("Text"), Some(Value::from("Ada")));
//!
//! binding.manager().unwrap().set_position(1);
//! assert_eq!(form.get("Text"), Some(Value::from("Grace")));
//! ```

pub mod binding;
pub mod collection;
pub mod component;
pub mod config;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod format;
pub mod list;
pub mod manager;
pub mod member;
pub mod observable;
pub mod record;
pub mod resolver;
pub mod value;

pub use binding::{
    Binding, BindingCompleteContext, BindingCompleteEvent, BindingCompleteState,
    ControlUpdateMode, ConvertEvent, DataSourceUpdateMode,
};
pub use collection::{BindingCollection, CollectionChange};
pub use component::{Component, ControlProperty, ValidatingEvent};
pub use config::{BindingDefaults, BindingOptions};
pub use context::BindingContext;
pub use descriptor::{DataObject, Describe, ObjectRef, PropertyAccessor, TypeDescriptor};
pub use error::BindingError;
pub use format::{CultureContext, FormatInfo};
pub use list::{BindingList, DataList, ListChange, ListRef};
pub use manager::{BindingManager, DataSource, ManagerId, ManagerKind};
pub use member::MemberPath;
pub use observable::{Notifier, Observable, Subscription};
pub use record::{Record, Schema};
pub use resolver::PathResolver;
pub use value::{Value, ValueKind};
