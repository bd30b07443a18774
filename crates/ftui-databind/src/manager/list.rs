#![forbid(unsafe_code)]

//! Position tracking and row edits for list managers.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, trace};

use crate::descriptor::{ObjectRef, TypeDescriptor};
use crate::error::{BindingError, PARAM_VALUE};
use crate::list::{ListChange, ListRef, out_of_range};
use crate::observable::Subscription;
use crate::value::Value;

use super::ManagerInner;

fn to_isize(n: usize) -> isize {
    isize::try_from(n).unwrap_or(isize::MAX)
}

/// Clamp a requested position into `[0, count - 1]`, or `-1` when empty.
pub(super) fn clamp_position(position: isize, count: usize) -> isize {
    if count == 0 {
        -1
    } else {
        position.clamp(0, to_isize(count) - 1)
    }
}

pub(super) struct ListState {
    list: RefCell<Option<ListRef>>,
    position: Cell<isize>,
    /// Row added by `add_new` and not yet committed.
    pending_new: Cell<Option<usize>>,
    /// Whether `begin_edit` was called on the current row.
    editing: Cell<bool>,
    list_link: RefCell<Option<Subscription>>,
}

impl ListState {
    pub(super) fn new() -> Self {
        Self {
            list: RefCell::new(None),
            position: Cell::new(-1),
            pending_new: Cell::new(None),
            editing: Cell::new(false),
            list_link: RefCell::new(None),
        }
    }

    fn list(&self) -> Option<ListRef> {
        self.list.borrow().clone()
    }

    pub(super) fn count(&self) -> usize {
        self.list.borrow().as_ref().map_or(0, |list| list.len())
    }

    pub(super) fn position(&self) -> isize {
        self.position.get()
    }

    pub(super) fn current(&self) -> Value {
        let position = self.position.get();
        if position < 0 {
            return Value::Null;
        }
        self.list
            .borrow()
            .as_ref()
            .and_then(|list| list.get(position.unsigned_abs()))
            .unwrap_or(Value::Null)
    }

    pub(super) fn item_descriptor(&self) -> Option<Rc<TypeDescriptor>> {
        let declared = self.list.borrow().as_ref().and_then(|list| list.item_descriptor());
        declared.or_else(|| self.current().as_object().map(|row| row.descriptor()))
    }

    pub(super) fn check_position(&self, position: isize) -> Result<(), BindingError> {
        let count = self.count();
        if position < -1 || position >= to_isize(count) {
            return Err(BindingError::OutOfRange {
                param: PARAM_VALUE,
                value: position,
                count,
            });
        }
        Ok(())
    }

    pub(super) fn begin_row_edit(&self, row: &ObjectRef) {
        if !self.editing.replace(true) {
            row.begin_edit();
        }
    }

    fn current_row(&self) -> Option<ObjectRef> {
        match self.current() {
            Value::Object(row) => Some(row),
            _ => None,
        }
    }
}

impl ManagerInner {
    /// Adopt `value` as the bound list. Returns whether the list identity
    /// changed; a new list starts at its first row.
    pub(super) fn attach_list(&self, state: &ListState, value: &Value) -> bool {
        let next = value.as_list().cloned();
        let same = match (state.list.borrow().as_ref(), next.as_ref()) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if same {
            return false;
        }

        let link = next.as_ref().and_then(|list| {
            let weak = self.weak_self.clone();
            list.list_changed().map(|changed| {
                changed.subscribe(move |change| {
                    if let Some(inner) = weak.upgrade() {
                        inner.list_changed(*change);
                    }
                })
            })
        });
        *state.list_link.borrow_mut() = link;
        *state.list.borrow_mut() = next;
        state.pending_new.set(None);
        state.editing.set(false);
        state.position.set(clamp_position(0, state.count()));
        true
    }

    /// Re-bind after the anchor or chain changed and fire one
    /// `current_changed`.
    pub(super) fn rebind_list(&self, state: &ListState, value: &Value) {
        let before = state.position.get();
        if !self.attach_list(state, value) {
            state.position.set(clamp_position(before, state.count()));
        }
        if state.position.get() != before {
            self.raise_position_changed();
        }
        self.raise_current_changed();
    }

    /// Re-clamp after the list may have changed behind our back.
    pub(super) fn reclamp(&self, state: &ListState) {
        let position = state.position.get();
        let clamped = clamp_position(position.max(0), state.count());
        if clamped != position {
            state.position.set(clamped);
            self.deferred_position.set(true);
        }
    }

    pub(super) fn move_to(&self, state: &ListState, requested: isize) {
        let next = clamp_position(requested, state.count());
        if next == state.position.get() {
            return;
        }
        self.commit_row(state);
        state.position.set(next);
        trace!(manager = self.id.id(), position = next, "position changed");
        self.raise_position_changed();
        self.raise_current_changed();
    }

    pub(super) fn commit_row(&self, state: &ListState) {
        if let Some(index) = state.pending_new.take()
            && let Some(list) = state.list()
        {
            list.end_new(index);
            trace!(manager = self.id.id(), index, "new row committed");
        }
        if state.editing.replace(false)
            && let Some(row) = state.current_row()
        {
            row.end_edit();
        }
    }

    pub(super) fn cancel_row(&self, state: &ListState) {
        if state.editing.replace(false)
            && let Some(row) = state.current_row()
        {
            row.cancel_edit();
        }
        if let Some(index) = state.pending_new.take()
            && let Some(list) = state.list()
        {
            trace!(manager = self.id.id(), index, "new row cancelled");
            // The removal notifies us and re-clamps the position.
            list.cancel_new(index);
            return;
        }
        self.raise_current_changed();
    }

    pub(super) fn add_row(&self, state: &ListState) -> Result<usize, BindingError> {
        let list = state
            .list()
            .filter(|list| list.allow_new())
            .ok_or(BindingError::Unsupported {
                operation: "adding new items",
            })?;
        self.commit_row(state);
        let index = list.add_new()?;
        let target = to_isize(index);
        if state.position.get() != target {
            state.position.set(target);
            self.raise_position_changed();
            self.raise_current_changed();
        }
        state.pending_new.set(Some(index));
        debug!(manager = self.id.id(), index, "new row added");
        Ok(index)
    }

    pub(super) fn remove_row(&self, state: &ListState, index: usize) -> Result<(), BindingError> {
        let count = state.count();
        let list = state.list().ok_or_else(|| out_of_range(index, count))?;
        if index >= count {
            return Err(out_of_range(index, count));
        }
        if to_isize(index) == state.position.get()
            && state.editing.replace(false)
            && let Some(row) = state.current_row()
        {
            row.cancel_edit();
        }
        if state.pending_new.get() == Some(index) {
            state.pending_new.set(None);
            list.cancel_new(index);
            return Ok(());
        }
        list.remove_at(index)
    }

    fn list_changed(&self, change: ListChange) {
        let super::ManagerState::List(state) = &self.state else {
            return;
        };
        let count = state.count();
        let position = state.position.get();
        match change {
            ListChange::Reset => {
                state.pending_new.set(None);
                state.editing.set(false);
                let next = clamp_position(position.max(0), count);
                state.position.set(next);
                debug!(manager = self.id.id(), count, position = next, "list reset");
                if next != position {
                    self.raise_position_changed();
                }
                self.raise_current_changed();
            }
            ListChange::ItemAdded(index) => {
                if let Some(pending) = state.pending_new.get()
                    && index <= pending
                {
                    state.pending_new.set(Some(pending + 1));
                }
                if position < 0 {
                    state.position.set(clamp_position(0, count));
                    self.raise_position_changed();
                    self.raise_current_changed();
                } else if to_isize(index) <= position {
                    state.position.set(position + 1);
                    self.raise_position_changed();
                }
            }
            ListChange::ItemDeleted(index) => {
                match state.pending_new.get() {
                    Some(pending) if pending == index => state.pending_new.set(None),
                    Some(pending) if pending > index => state.pending_new.set(Some(pending - 1)),
                    _ => {}
                }
                let index = to_isize(index);
                if index < position {
                    state.position.set(position - 1);
                    self.raise_position_changed();
                } else if index == position {
                    state.editing.set(false);
                    let next = clamp_position(position, count);
                    state.position.set(next);
                    if next != position {
                        self.raise_position_changed();
                    }
                    self.raise_current_changed();
                }
            }
            ListChange::ItemChanged(index) => {
                if to_isize(index) == position {
                    self.raise_current_changed();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_list_clamps_to_minus_one() {
        assert_eq!(clamp_position(5, 0), -1);
        assert_eq!(clamp_position(-1, 0), -1);
    }

    #[test]
    fn non_empty_list_never_reports_minus_one() {
        assert_eq!(clamp_position(-1, 3), 0);
        assert_eq!(clamp_position(9, 3), 2);
        assert_eq!(clamp_position(1, 3), 1);
    }

    #[test]
    fn unbound_state_has_no_current_row() {
        let state = ListState::new();
        assert_eq!(state.count(), 0);
        assert_eq!(state.position(), -1);
        assert_eq!(state.current(), Value::Null);
        assert!(state.check_position(-1).is_ok());
        let err = state.check_position(0).unwrap_err();
        assert_eq!(err.param_name(), Some("value"));
    }

    proptest! {
        #[test]
        fn clamped_position_is_always_valid(position in -50isize..50, count in 0usize..20) {
            let clamped = clamp_position(position, count);
            if count == 0 {
                prop_assert_eq!(clamped, -1);
            } else {
                prop_assert!(clamped >= 0 && clamped < count as isize);
            }
        }
    }
}
