#![forbid(unsafe_code)]

//! Table-like rows with typed columns.
//!
//! A [`Schema`] names the columns; every [`Record`] built from it stores one
//! observable cell per column, so each column supports change notification.
//! Records implement the editable-object capability: `begin_edit` snapshots
//! the row, `cancel_edit` restores the snapshot, `end_edit` drops it.
//!
//! A column of kind [`ValueKind::List`] holding a child list models a
//! master/detail relation.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::descriptor::{DataObject, PropertyAccessor, TypeDescriptor};
use crate::error::BindingError;
use crate::list::BindingList;
use crate::observable::{Observable, Subscription};
use crate::value::{Value, ValueKind};

#[derive(Debug, Clone)]
struct Column {
    name: String,
    kind: ValueKind,
    read_only: bool,
    default: Value,
}

struct SchemaInner {
    columns: Vec<Column>,
    descriptor: Rc<TypeDescriptor>,
}

/// Column layout shared by a family of [`Record`]s.
#[derive(Clone)]
pub struct Schema {
    inner: Rc<SchemaInner>,
}

impl Schema {
    #[must_use]
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Descriptor exposing one property per column.
    #[must_use]
    pub fn descriptor(&self) -> Rc<TypeDescriptor> {
        Rc::clone(&self.inner.descriptor)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.inner.descriptor.type_name()
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.inner.columns.len()
    }

    /// Position of a column, matched case-insensitively.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.inner
            .columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// New record with every column at its default.
    #[must_use]
    pub fn new_record(&self) -> Rc<Record> {
        Rc::new(Record {
            schema: self.clone(),
            cells: self
                .inner
                .columns
                .iter()
                .map(|c| Observable::new(c.default.clone()))
                .collect(),
            snapshot: RefCell::new(None),
        })
    }

    /// New record filled from `(column, value)` pairs; other columns keep
    /// their defaults.
    ///
    /// # Errors
    ///
    /// Fails on unknown columns or values that do not convert.
    pub fn record<'a>(
        &self,
        values: impl IntoIterator<Item = (&'a str, Value)>,
    ) -> Result<Rc<Record>, BindingError> {
        let record = self.new_record();
        for (column, value) in values {
            record.set(column, value)?;
        }
        Ok(record)
    }

    /// Empty table of this schema whose `add_new` appends default rows.
    #[must_use]
    pub fn new_table(&self) -> BindingList<Record> {
        let schema = self.clone();
        BindingList::new()
            .with_item_descriptor(self.descriptor())
            .with_factory(move || schema.new_record())
    }

    fn column(&self, index: usize) -> &Column {
        &self.inner.columns[index]
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name())
            .field(
                "columns",
                &self.inner.columns.iter().map(|c| &c.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Builder returned by [`Schema::builder`].
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    columns: Vec<Column>,
}

impl SchemaBuilder {
    /// Writable column defaulting to `DbNull`.
    #[must_use]
    pub fn column(self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.push(name.into(), kind, false, Value::DbNull)
    }

    /// Writable column with an explicit default.
    #[must_use]
    pub fn column_with_default(
        self,
        name: impl Into<String>,
        kind: ValueKind,
        default: impl Into<Value>,
    ) -> Self {
        self.push(name.into(), kind, false, default.into())
    }

    /// Column that bindings can read but not write.
    #[must_use]
    pub fn read_only_column(self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.push(name.into(), kind, true, Value::DbNull)
    }

    #[must_use]
    pub fn build(self) -> Schema {
        let accessors: Vec<Rc<dyn PropertyAccessor>> = self
            .columns
            .iter()
            .enumerate()
            .map(|(index, c)| {
                Rc::new(ColumnAccessor {
                    index,
                    name: c.name.clone(),
                    kind: c.kind,
                    read_only: c.read_only,
                }) as Rc<dyn PropertyAccessor>
            })
            .collect();
        Schema {
            inner: Rc::new(SchemaInner {
                columns: self.columns,
                descriptor: Rc::new(TypeDescriptor::from_accessors(self.name, accessors)),
            }),
        }
    }

    fn push(mut self, name: String, kind: ValueKind, read_only: bool, default: Value) -> Self {
        self.columns.push(Column {
            name,
            kind,
            read_only,
            default,
        });
        self
    }
}

/// One row of a [`Schema`].
pub struct Record {
    schema: Schema,
    cells: Vec<Observable<Value>>,
    snapshot: RefCell<Option<Vec<Value>>>,
}

impl Record {
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Value of a column, or `None` for unknown columns.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<Value> {
        self.schema
            .column_index(column)
            .map(|index| self.cells[index].get())
    }

    /// Set a column, converting to its kind. Read-only columns may be set
    /// directly; only bindings are refused.
    ///
    /// # Errors
    ///
    /// [`BindingError::InvalidMember`] for unknown columns, conversion errors
    /// otherwise.
    pub fn set(&self, column: &str, value: impl Into<Value>) -> Result<(), BindingError> {
        let index = self
            .schema
            .column_index(column)
            .ok_or_else(|| BindingError::invalid_member(column, column))?;
        self.set_at(index, value.into())
    }

    fn set_at(&self, index: usize, value: Value) -> Result<(), BindingError> {
        let value = value.convert_to(self.schema.column(index).kind)?;
        self.cells[index].set(value);
        Ok(())
    }

    /// Whether an edit transaction is open.
    #[must_use]
    pub fn is_editing(&self) -> bool {
        self.snapshot.borrow().is_some()
    }
}

impl DataObject for Record {
    fn descriptor(&self) -> Rc<TypeDescriptor> {
        self.schema.descriptor()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn begin_edit(&self) {
        let mut snapshot = self.snapshot.borrow_mut();
        if snapshot.is_none() {
            *snapshot = Some(self.cells.iter().map(Observable::get).collect());
        }
    }

    fn end_edit(&self) {
        self.snapshot.borrow_mut().take();
    }

    fn cancel_edit(&self) {
        let saved = self.snapshot.borrow_mut().take();
        if let Some(saved) = saved {
            for (cell, value) in self.cells.iter().zip(saved) {
                cell.set(value);
            }
        }
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (column, cell) in self.schema.inner.columns.iter().zip(&self.cells) {
            map.entry(&column.name, &cell.get());
        }
        map.finish()
    }
}

struct ColumnAccessor {
    index: usize,
    name: String,
    kind: ValueKind,
    read_only: bool,
}

impl ColumnAccessor {
    fn record<'a>(&self, owner: &'a dyn DataObject) -> Option<&'a Record> {
        owner
            .as_any()
            .downcast_ref::<Record>()
            .filter(|r| self.index < r.cells.len())
    }
}

impl PropertyAccessor for ColumnAccessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ValueKind {
        self.kind
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn get(&self, owner: &dyn DataObject) -> Value {
        self.record(owner)
            .map_or(Value::Null, |r| r.cells[self.index].get())
    }

    fn set(&self, owner: &dyn DataObject, value: Value) -> Result<(), BindingError> {
        if self.read_only {
            return Err(BindingError::ReadOnly {
                property: self.name.clone(),
            });
        }
        let record = self.record(owner).ok_or(BindingError::TypeMismatch {
            expected: ValueKind::Object,
            found: ValueKind::Object,
        })?;
        record.set_at(self.index, value)
    }

    fn supports_change_notification(&self) -> bool {
        true
    }

    fn subscribe(&self, owner: &dyn DataObject, callback: Rc<dyn Fn()>) -> Option<Subscription> {
        let record = self.record(owner)?;
        Some(record.cells[self.index].subscribe(move |_| callback()))
    }
}
