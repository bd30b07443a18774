#![forbid(unsafe_code)]

//! Per-component ordered set of bindings.
//!
//! Adding a binding validates it right away when the host already has a
//! [`BindingContext`](crate::BindingContext); otherwise the binding is
//! parked and validated when a context arrives (see
//! [`Component::set_binding_context`]).
//!
//! # Invariants
//!
//! 1. No two bindings bind the same control property (case-insensitive).
//! 2. A binding lives in at most one collection; adding it elsewhere moves
//!    it.
//! 3. A binding that fails validation on `add` is not added.

use std::cell::RefCell;
use std::fmt;

use tracing::{debug, warn};

use crate::binding::Binding;
use crate::component::{Component, WeakComponent};
use crate::context::BindingContext;
use crate::error::BindingError;
use crate::manager::DataSource;
use crate::observable::Notifier;

/// Change reported by [`BindingCollection::collection_changed`].
#[derive(Debug, Clone)]
pub enum CollectionChange {
    Added(Binding),
    Removed(Binding),
    Cleared,
}

pub struct BindingCollection {
    host: WeakComponent,
    items: RefCell<Vec<Binding>>,
    changed: Notifier<CollectionChange>,
}

impl BindingCollection {
    pub(crate) fn new(host: WeakComponent) -> Self {
        Self {
            host,
            items: RefCell::new(Vec::new()),
            changed: Notifier::new(),
        }
    }

    /// Add a binding, attaching it when the host has a context.
    ///
    /// # Errors
    ///
    /// [`BindingError::DuplicateBinding`] when the property is already
    /// bound, [`BindingError::InvalidProperty`] or
    /// [`BindingError::InvalidMember`] when the binding does not resolve.
    pub fn add(&self, binding: Binding) -> Result<(), BindingError> {
        if let Some(existing) = self.find_conflict(&binding) {
            return Err(BindingError::DuplicateBinding {
                property: existing.property_name().unwrap_or_default().to_string(),
            });
        }
        let Some(host) = self.host.upgrade() else {
            return Ok(());
        };
        let previous = binding.host().filter(|p| !Component::ptr_eq(p, &host));
        match host.binding_context() {
            Some(context) => {
                if let Err(err) = binding.attach(&host, &context) {
                    match &previous {
                        Some(previous) => previous.bindings().restore(previous, &binding),
                        None => binding.detach(),
                    }
                    return Err(err);
                }
            }
            None => binding.set_host(Some(&host)),
        }
        if let Some(previous) = previous {
            previous.bindings().unlink(&binding);
        }
        debug!(
            component = host.name(),
            property = binding.property_name().unwrap_or_default(),
            "binding added"
        );
        self.items.borrow_mut().push(binding.clone());
        self.changed.notify(&CollectionChange::Added(binding));
        Ok(())
    }

    /// Create and add a binding of `property` to `member` of `source`.
    ///
    /// # Errors
    ///
    /// As [`add`](Self::add).
    pub fn bind(
        &self,
        property: &str,
        source: impl Into<DataSource>,
        member: &str,
    ) -> Result<Binding, BindingError> {
        let binding = Binding::new(property, source, member);
        self.add(binding.clone())?;
        Ok(binding)
    }

    fn find_conflict(&self, binding: &Binding) -> Option<Binding> {
        let items = self.items.borrow();
        items
            .iter()
            .find(|existing| {
                Binding::ptr_eq(existing, binding)
                    || matches!(
                        (existing.property_name(), binding.property_name()),
                        (Some(a), Some(b)) if a.eq_ignore_ascii_case(b)
                    )
            })
            .cloned()
    }

    /// Remove a binding by identity, dropping its subscriptions. The
    /// manager it used stays in its context.
    pub fn remove(&self, binding: &Binding) -> bool {
        let index = self
            .items
            .borrow()
            .iter()
            .position(|b| Binding::ptr_eq(b, binding));
        index.and_then(|index| self.remove_at(index)).is_some()
    }

    /// Drop `binding` from the list without detaching it; it has already
    /// moved to another host.
    fn unlink(&self, binding: &Binding) {
        let removed = {
            let mut items = self.items.borrow_mut();
            let index = items.iter().position(|b| Binding::ptr_eq(b, binding));
            index.map(|index| items.remove(index))
        };
        if let Some(removed) = removed {
            self.changed.notify(&CollectionChange::Removed(removed));
        }
    }

    /// Put a binding whose move elsewhere failed back on `host`.
    fn restore(&self, host: &Component, binding: &Binding) {
        let Some(context) = host.binding_context() else {
            binding.set_host(Some(host));
            return;
        };
        if let Err(err) = binding.attach(host, &context) {
            warn!(
                component = host.name(),
                property = binding.property_name().unwrap_or_default(),
                error = %err,
                "binding failed to reattach"
            );
            binding.set_host(Some(host));
        }
    }

    /// Remove the binding at `index`, returning it.
    pub fn remove_at(&self, index: usize) -> Option<Binding> {
        let removed = {
            let mut items = self.items.borrow_mut();
            (index < items.len()).then(|| items.remove(index))
        }?;
        removed.detach();
        self.changed.notify(&CollectionChange::Removed(removed.clone()));
        Some(removed)
    }

    pub fn clear(&self) {
        let removed = std::mem::take(&mut *self.items.borrow_mut());
        if removed.is_empty() {
            return;
        }
        for binding in &removed {
            binding.detach();
        }
        self.changed.notify(&CollectionChange::Cleared);
    }

    /// Binding of a control property, case-insensitive.
    #[must_use]
    pub fn get(&self, property: &str) -> Option<Binding> {
        self.items
            .borrow()
            .iter()
            .find(|b| b.property_name().is_some_and(|p| p.eq_ignore_ascii_case(property)))
            .cloned()
    }

    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<Binding> {
        self.items.borrow().get(index).cloned()
    }

    #[must_use]
    pub fn contains(&self, binding: &Binding) -> bool {
        self.items.borrow().iter().any(|b| Binding::ptr_eq(b, binding))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Snapshot of the bindings in insertion order.
    #[must_use]
    pub fn iter(&self) -> std::vec::IntoIter<Binding> {
        self.items.borrow().clone().into_iter()
    }

    #[must_use]
    pub fn collection_changed(&self) -> &Notifier<CollectionChange> {
        &self.changed
    }

    /// Re-attach every binding after the host's context changed.
    pub(crate) fn rebind(
        &self,
        host: &Component,
        context: Option<&BindingContext>,
    ) -> Result<(), BindingError> {
        let mut first_error = None;
        for binding in self.iter() {
            let Some(context) = context else {
                binding.set_host(Some(host));
                continue;
            };
            if let Err(err) = binding.attach(host, context) {
                warn!(
                    component = host.name(),
                    property = binding.property_name().unwrap_or_default(),
                    error = %err,
                    "binding failed to attach"
                );
                binding.set_host(Some(host));
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for BindingCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.borrow().iter()).finish()
    }
}
