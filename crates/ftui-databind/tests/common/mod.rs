//! Shared fixtures for the binding integration tests.
//!
//! - `One -> Two -> Three -> MockItem`: a three-hop object chain where every
//!   hop is observable
//! - `Customer -> Orders`: a master list whose rows own detail lists
//! - `people()`: a record table with a row factory

#![allow(dead_code)]
#![forbid(unsafe_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ftui_databind::descriptor::{Describe, TypeDescriptor};
use ftui_databind::{BindingList, Notifier, Schema, Value, ValueKind, impl_data_object};

// =============================================================================
// Three-deep object chain
// =============================================================================

#[derive(Default)]
pub struct MockItem {
    text: RefCell<String>,
    text_changed: Notifier,
    value: Cell<i64>,
    value_changed: Notifier,
}

impl MockItem {
    pub fn new(text: &str, value: i64) -> Rc<Self> {
        Rc::new(Self {
            text: RefCell::new(text.to_string()),
            value: Cell::new(value),
            ..Self::default()
        })
    }

    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }

    pub fn set_text(&self, text: &str) {
        *self.text.borrow_mut() = text.to_string();
        self.text_changed.emit();
    }

    pub fn value(&self) -> i64 {
        self.value.get()
    }

    pub fn set_value(&self, value: i64) {
        self.value.set(value);
        self.value_changed.emit();
    }

    pub fn text_subscribers(&self) -> usize {
        self.text_changed.subscriber_count()
    }
}

impl Describe for MockItem {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::builder::<MockItem>("MockItem")
            .property("Text", ValueKind::Text, |m| Value::from(m.text()))
            .setter(|m, v| {
                m.set_text(v.as_str().unwrap_or_default());
                Ok(())
            })
            .notify(|m| &m.text_changed)
            .property("Value", ValueKind::Int, |m| Value::Int(m.value()))
            .setter(|m, v| {
                m.set_value(v.as_int().unwrap_or_default());
                Ok(())
            })
            .notify(|m| &m.value_changed)
            .build()
    }
}
impl_data_object!(MockItem);

/// Declares a fixture holding one optional, observable child object.
macro_rules! holder {
    ($name:ident, $field:ident, $setter:ident, $child:ty, $prop:literal) => {
        #[derive(Default)]
        pub struct $name {
            $field: RefCell<Option<Rc<$child>>>,
            changed: Notifier,
        }

        impl $name {
            pub fn new(child: Option<Rc<$child>>) -> Rc<Self> {
                Rc::new(Self {
                    $field: RefCell::new(child),
                    changed: Notifier::new(),
                })
            }

            pub fn $field(&self) -> Option<Rc<$child>> {
                self.$field.borrow().clone()
            }

            pub fn $setter(&self, child: Option<Rc<$child>>) {
                *self.$field.borrow_mut() = child;
                self.changed.emit();
            }

            pub fn subscribers(&self) -> usize {
                self.changed.subscriber_count()
            }
        }

        impl Describe for $name {
            fn describe() -> TypeDescriptor {
                TypeDescriptor::builder::<$name>(stringify!($name))
                    .property($prop, ValueKind::Object, |o| {
                        o.$field.borrow().clone().map_or(Value::Null, Value::object)
                    })
                    .notify(|o| &o.changed)
                    .build()
            }
        }
        impl_data_object!($name);
    };
}

holder!(Three, mock_item, set_mock_item, MockItem, "MockItem");
holder!(Two, three, set_three, Three, "Three");
holder!(One, two, set_two, Two, "Two");

/// `One.Two.Three.MockItem` with the given leaf.
pub fn chain(leaf: &Rc<MockItem>) -> Rc<One> {
    One::new(Some(Two::new(Some(Three::new(Some(Rc::clone(leaf)))))))
}

// =============================================================================
// Master / detail
// =============================================================================

#[derive(Default)]
pub struct Order {
    item: RefCell<String>,
    qty: Cell<i64>,
    qty_changed: Notifier,
}

impl Order {
    pub fn new(item: &str, qty: i64) -> Rc<Self> {
        Rc::new(Self {
            item: RefCell::new(item.to_string()),
            qty: Cell::new(qty),
            qty_changed: Notifier::new(),
        })
    }

    pub fn qty(&self) -> i64 {
        self.qty.get()
    }
}

impl Describe for Order {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::builder::<Order>("Order")
            .property("Item", ValueKind::Text, |o| Value::from(o.item.borrow().clone()))
            .property("Qty", ValueKind::Int, |o| Value::Int(o.qty.get()))
            .setter(|o, v| {
                o.qty.set(v.as_int().unwrap_or_default());
                o.qty_changed.emit();
                Ok(())
            })
            .notify(|o| &o.qty_changed)
            .build()
    }
}
impl_data_object!(Order);

pub struct Customer {
    name: RefCell<String>,
    orders: Rc<BindingList<Order>>,
}

impl Customer {
    pub fn new(name: &str, orders: impl IntoIterator<Item = Rc<Order>>) -> Rc<Self> {
        Rc::new(Self {
            name: RefCell::new(name.to_string()),
            orders: Rc::new(
                BindingList::from_items(orders).with_item_descriptor(TypeDescriptor::of::<Order>()),
            ),
        })
    }

    pub fn orders(&self) -> Rc<BindingList<Order>> {
        Rc::clone(&self.orders)
    }
}

impl Describe for Customer {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::builder::<Customer>("Customer")
            .property("Name", ValueKind::Text, |c| Value::from(c.name.borrow().clone()))
            .property("Orders", ValueKind::List, |c| Value::list(Rc::clone(&c.orders)))
            .build()
    }
}
impl_data_object!(Customer);

/// Ann (apple x1, pear x2), Bob (fig x5), Cy (no orders).
pub fn customers() -> Rc<BindingList<Customer>> {
    Rc::new(BindingList::from_items([
        Customer::new("Ann", [Order::new("apple", 1), Order::new("pear", 2)]),
        Customer::new("Bob", [Order::new("fig", 5)]),
        Customer::new("Cy", Vec::<Rc<Order>>::new()),
    ]))
}

// =============================================================================
// Record table
// =============================================================================

pub fn person_schema() -> Schema {
    Schema::builder("Person")
        .column("Name", ValueKind::Text)
        .column("Age", ValueKind::Int)
        .column("Salary", ValueKind::Float)
        .read_only_column("Id", ValueKind::Int)
        .build()
}

/// Ada (36), Grace (45), Linus (28).
pub fn people() -> Rc<BindingList<ftui_databind::Record>> {
    let schema = person_schema();
    let table = schema.new_table();
    for (id, (name, age)) in [("Ada", 36), ("Grace", 45), ("Linus", 28)].into_iter().enumerate() {
        let row = schema
            .record([
                ("Name", Value::from(name)),
                ("Age", Value::Int(age)),
                ("Salary", Value::Float(1000.0)),
            ])
            .expect("fixture row");
        row.set("Id", Value::Int(id as i64)).expect("fixture id");
        table.push(row);
    }
    Rc::new(table)
}
