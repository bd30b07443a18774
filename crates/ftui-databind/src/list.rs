#![forbid(unsafe_code)]

//! List-like data sources.
//!
//! [`DataList`] is the capability a list manager binds to: indexed rows, an
//! optional item descriptor, a [`ListChange`] notifier, and optional
//! add/remove support with pending-new-row bookkeeping. [`BindingList`] is
//! the stock implementation over shared [`DataObject`] rows.
//!
//! # Invariants
//!
//! 1. Every structural mutation of a `BindingList` fires exactly one
//!    [`ListChange`] after the mutation is applied.
//! 2. At most one row is pending (added by `add_new` but neither committed
//!    nor cancelled); starting another `add_new` commits the previous one.
//! 3. Pending-row indices follow insertions and removals before them.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::descriptor::{DataObject, TypeDescriptor};
use crate::error::{BindingError, PARAM_INDEX};
use crate::observable::Notifier;
use crate::value::Value;

/// Shared handle to a list data source.
pub type ListRef = Rc<dyn DataList>;

/// Structural or item-level change reported by a [`DataList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListChange {
    /// The whole list changed; observers must re-read everything.
    Reset,
    ItemAdded(usize),
    ItemDeleted(usize),
    /// A property of the row at this index changed.
    ItemChanged(usize),
}

/// Indexed rows a list manager can navigate.
pub trait DataList {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row at `index`, if in range.
    fn get(&self, index: usize) -> Option<Value>;

    /// Descriptor of the row type, used to validate members on empty lists.
    fn item_descriptor(&self) -> Option<Rc<TypeDescriptor>> {
        None
    }

    /// Change notifier; lists without one are treated as static.
    fn list_changed(&self) -> Option<&Notifier<ListChange>> {
        None
    }

    fn allow_new(&self) -> bool {
        false
    }

    /// Append a blank row and return its index. The row stays pending until
    /// [`end_new`](Self::end_new) or [`cancel_new`](Self::cancel_new).
    ///
    /// # Errors
    ///
    /// [`BindingError::Unsupported`] when the list cannot create rows.
    fn add_new(&self) -> Result<usize, BindingError> {
        Err(BindingError::Unsupported {
            operation: "adding new items",
        })
    }

    /// Commit the pending row at `index`.
    fn end_new(&self, _index: usize) {}

    /// Discard the pending row at `index`.
    fn cancel_new(&self, _index: usize) {}

    fn allow_remove(&self) -> bool {
        false
    }

    /// # Errors
    ///
    /// [`BindingError::Unsupported`] or [`BindingError::OutOfRange`].
    fn remove_at(&self, _index: usize) -> Result<(), BindingError> {
        Err(BindingError::Unsupported {
            operation: "removing items",
        })
    }

    fn as_any(&self) -> &dyn Any;
}

type Factory<T> = Box<dyn Fn() -> Rc<T>>;

/// Observable list of shared rows.
pub struct BindingList<T: DataObject> {
    items: RefCell<Vec<Rc<T>>>,
    descriptor: Option<Rc<TypeDescriptor>>,
    factory: Option<Factory<T>>,
    pending_new: Cell<Option<usize>>,
    allow_remove: Cell<bool>,
    changed: Notifier<ListChange>,
}

impl<T: DataObject> BindingList<T> {
    /// Empty list. The item descriptor is taken from the first row.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: RefCell::new(Vec::new()),
            descriptor: None,
            factory: None,
            pending_new: Cell::new(None),
            allow_remove: Cell::new(true),
            changed: Notifier::new(),
        }
    }

    /// List pre-filled with `items`.
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = Rc<T>>) -> Self {
        let list = Self::new();
        list.items.borrow_mut().extend(items);
        list
    }

    /// Declare the row descriptor, so empty lists still validate members.
    #[must_use]
    pub fn with_item_descriptor(mut self, descriptor: Rc<TypeDescriptor>) -> Self {
        self.descriptor = Some(descriptor);
        self
    }

    /// Enable `add_new` with a row factory.
    #[must_use]
    pub fn with_factory(mut self, factory: impl Fn() -> Rc<T> + 'static) -> Self {
        self.factory = Some(Box::new(factory));
        self
    }

    /// Enable or disable `remove_at` through binding managers.
    pub fn set_allow_remove(&self, allow: bool) {
        self.allow_remove.set(allow);
    }

    /// Shared row at `index`.
    #[must_use]
    pub fn item(&self, index: usize) -> Option<Rc<T>> {
        self.items.borrow().get(index).cloned()
    }

    /// Snapshot of all rows.
    #[must_use]
    pub fn items(&self) -> Vec<Rc<T>> {
        self.items.borrow().clone()
    }

    pub fn push(&self, item: Rc<T>) {
        let index = {
            let mut items = self.items.borrow_mut();
            items.push(item);
            items.len() - 1
        };
        self.changed.notify(&ListChange::ItemAdded(index));
    }

    /// Insert at `index` (clamped to the end).
    pub fn insert(&self, index: usize, item: Rc<T>) {
        let index = {
            let mut items = self.items.borrow_mut();
            let index = index.min(items.len());
            items.insert(index, item);
            index
        };
        if let Some(pending) = self.pending_new.get()
            && pending >= index
        {
            self.pending_new.set(Some(pending + 1));
        }
        self.changed.notify(&ListChange::ItemAdded(index));
    }

    /// Remove and return the row at `index`.
    ///
    /// # Errors
    ///
    /// [`BindingError::OutOfRange`] when `index` is past the end.
    pub fn remove(&self, index: usize) -> Result<Rc<T>, BindingError> {
        let removed = {
            let mut items = self.items.borrow_mut();
            if index >= items.len() {
                return Err(out_of_range(index, items.len()));
            }
            items.remove(index)
        };
        match self.pending_new.get() {
            Some(pending) if pending == index => self.pending_new.set(None),
            Some(pending) if pending > index => self.pending_new.set(Some(pending - 1)),
            _ => {}
        }
        self.changed.notify(&ListChange::ItemDeleted(index));
        Ok(removed)
    }

    /// Replace every row and fire a single reset.
    pub fn reset(&self, items: impl IntoIterator<Item = Rc<T>>) {
        {
            let mut current = self.items.borrow_mut();
            current.clear();
            current.extend(items);
        }
        self.pending_new.set(None);
        self.changed.notify(&ListChange::Reset);
    }

    /// Report that a property of the row at `index` changed.
    pub fn notify_item_changed(&self, index: usize) {
        if index < self.items.borrow().len() {
            self.changed.notify(&ListChange::ItemChanged(index));
        }
    }

    /// Index of the row added by `add_new` and not yet committed.
    #[must_use]
    pub fn pending_new(&self) -> Option<usize> {
        self.pending_new.get()
    }

    /// Change notifier, also reachable through [`DataList::list_changed`].
    #[must_use]
    pub fn changed(&self) -> &Notifier<ListChange> {
        &self.changed
    }
}

impl<T: DataObject> Default for BindingList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DataObject> DataList for BindingList<T> {
    fn len(&self) -> usize {
        self.items.borrow().len()
    }

    fn get(&self, index: usize) -> Option<Value> {
        self.item(index).map(|row| Value::Object(row))
    }

    fn item_descriptor(&self) -> Option<Rc<TypeDescriptor>> {
        self.descriptor
            .clone()
            .or_else(|| self.items.borrow().first().map(|row| row.descriptor()))
    }

    fn list_changed(&self) -> Option<&Notifier<ListChange>> {
        Some(&self.changed)
    }

    fn allow_new(&self) -> bool {
        self.factory.is_some()
    }

    fn add_new(&self) -> Result<usize, BindingError> {
        let factory = self.factory.as_ref().ok_or(BindingError::Unsupported {
            operation: "adding new items",
        })?;
        if let Some(previous) = self.pending_new.take() {
            self.end_new(previous);
        }
        let row = factory();
        self.push(row);
        let index = self.len() - 1;
        self.pending_new.set(Some(index));
        Ok(index)
    }

    fn end_new(&self, index: usize) {
        if self.pending_new.get() == Some(index) {
            self.pending_new.set(None);
        }
    }

    fn cancel_new(&self, index: usize) {
        if self.pending_new.get() == Some(index) {
            self.pending_new.set(None);
            // Index came from our own bookkeeping, so it is in range.
            let _ = self.remove(index);
        }
    }

    fn allow_remove(&self) -> bool {
        self.allow_remove.get()
    }

    fn remove_at(&self, index: usize) -> Result<(), BindingError> {
        if !self.allow_remove.get() {
            return Err(BindingError::Unsupported {
                operation: "removing items",
            });
        }
        self.remove(index).map(drop)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<T: DataObject> fmt::Debug for BindingList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingList")
            .field("len", &self.items.borrow().len())
            .field("pending_new", &self.pending_new.get())
            .finish()
    }
}

pub(crate) fn out_of_range(index: usize, count: usize) -> BindingError {
    BindingError::OutOfRange {
        param: PARAM_INDEX,
        value: isize::try_from(index).unwrap_or(isize::MAX),
        count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Describe, TypeDescriptor};
    use crate::value::ValueKind;

    #[derive(Debug)]
    struct Row(i64);

    impl Describe for Row {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::builder::<Row>("Row")
                .property("Id", ValueKind::Int, |r| Value::Int(r.0))
                .build()
        }
    }
    crate::impl_data_object!(Row);

    fn record_changes(list: &BindingList<Row>) -> (Rc<RefCell<Vec<ListChange>>>, crate::Subscription) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = Rc::clone(&log);
        let sub = list.changed().subscribe(move |c| l.borrow_mut().push(*c));
        (log, sub)
    }

    #[test]
    fn mutations_fire_one_change_each() {
        let list = BindingList::from_items([Rc::new(Row(1)), Rc::new(Row(2))]);
        let (log, _sub) = record_changes(&list);
        list.push(Rc::new(Row(3)));
        list.insert(0, Rc::new(Row(0)));
        list.remove(1).unwrap();
        list.reset([Rc::new(Row(9))]);
        assert_eq!(
            *log.borrow(),
            vec![
                ListChange::ItemAdded(2),
                ListChange::ItemAdded(0),
                ListChange::ItemDeleted(1),
                ListChange::Reset,
            ]
        );
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn remove_out_of_range_names_index() {
        let list: BindingList<Row> = BindingList::new();
        let err = list.remove(0).unwrap_err();
        assert_eq!(err.param_name(), Some("index"));
    }

    #[test]
    fn add_new_requires_factory() {
        let list: BindingList<Row> = BindingList::new();
        assert!(!list.allow_new());
        assert!(matches!(list.add_new(), Err(BindingError::Unsupported { .. })));
    }

    #[test]
    fn cancel_new_removes_pending_row() {
        let list = BindingList::new().with_factory(|| Rc::new(Row(0)));
        list.push(Rc::new(Row(1)));
        let index = list.add_new().unwrap();
        assert_eq!(index, 1);
        assert_eq!(list.pending_new(), Some(1));
        list.cancel_new(index);
        assert_eq!(list.len(), 1);
        assert_eq!(list.pending_new(), None);
    }

    #[test]
    fn pending_index_tracks_inserts() {
        let list = BindingList::new().with_factory(|| Rc::new(Row(0)));
        let index = list.add_new().unwrap();
        list.insert(0, Rc::new(Row(5)));
        assert_eq!(list.pending_new(), Some(index + 1));
        list.end_new(index + 1);
        assert_eq!(list.pending_new(), None);
    }

    #[test]
    fn item_descriptor_falls_back_to_first_row() {
        let empty: BindingList<Row> = BindingList::new();
        assert!(empty.item_descriptor().is_none());
        let declared = BindingList::<Row>::new().with_item_descriptor(TypeDescriptor::of::<Row>());
        assert!(declared.item_descriptor().is_some());
        let filled = BindingList::from_items([Rc::new(Row(1))]);
        assert_eq!(filled.item_descriptor().unwrap().type_name(), "Row");
    }
}
