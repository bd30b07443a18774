#![forbid(unsafe_code)]

//! Scoped cache of binding managers.
//!
//! A [`BindingContext`] maps `(data source, member)` to exactly one
//! [`BindingManager`] for as long as the context lives, so every binding in
//! a form that names the same source and member shares position, suspension
//! and edit state. Members compare after trimming and ASCII-lowercasing.
//!
//! Managers for dotted members are built from the manager of their prefix:
//! `get_member(src, "Orders.Lines")` first obtains `"Orders"` and then asks it
//! for the relation `"Lines"`. Object hops extend a single resolver chain;
//! hops out of a list manager create a child that follows the list's current
//! row.
//!
//! Contexts are cheap handles; clones share one cache. A component tree
//! passes a context down explicitly, see [`Component`](crate::Component).

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;
use tracing::trace;

use crate::error::BindingError;
use crate::manager::{BindingManager, DataSource};
use crate::member::{MemberPath, normalize};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ContextKey {
    source: usize,
    is_list: bool,
    member: String,
}

impl ContextKey {
    fn new(source: &DataSource, member: &str) -> Self {
        Self {
            source: source.identity(),
            is_list: source.is_list(),
            member: normalize(member),
        }
    }
}

#[derive(Default)]
struct ContextInner {
    managers: RefCell<AHashMap<ContextKey, BindingManager>>,
}

/// Shared `(source, member) -> manager` cache.
#[derive(Clone, Default)]
pub struct BindingContext {
    inner: Rc<ContextInner>,
}

impl BindingContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Manager for the whole data source.
    #[must_use]
    pub fn get(&self, source: &DataSource) -> BindingManager {
        let key = ContextKey::new(source, "");
        if let Some(manager) = self.lookup(&key) {
            return manager;
        }
        let manager = BindingManager::for_source(source);
        self.insert(key, manager.clone());
        manager
    }

    /// Manager for `member` of `source`. An empty member is the same as
    /// [`get`](Self::get).
    ///
    /// # Errors
    ///
    /// [`BindingError::InvalidMember`] naming the first segment that does not
    /// resolve and the whole member.
    pub fn get_member(
        &self,
        source: &DataSource,
        member: &str,
    ) -> Result<BindingManager, BindingError> {
        let key = ContextKey::new(source, member);
        if key.member.is_empty() {
            return Ok(self.get(source));
        }
        if let Some(manager) = self.lookup(&key) {
            return Ok(manager);
        }

        let path = MemberPath::parse(member);
        let parent = self
            .get_member(source, path.path())
            .map_err(|err| err.within_member(path.full()))?;
        let manager = parent
            .related(path.field())
            .map_err(|err| err.within_member(path.full()))?;
        self.insert(key, manager.clone());
        Ok(manager)
    }

    /// Whether a manager for this key has been created.
    #[must_use]
    pub fn contains(&self, source: &DataSource, member: &str) -> bool {
        self.inner
            .managers
            .borrow()
            .contains_key(&ContextKey::new(source, member))
    }

    /// Number of cached managers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.managers.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether two handles share one cache.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    fn lookup(&self, key: &ContextKey) -> Option<BindingManager> {
        self.inner.managers.borrow().get(key).cloned()
    }

    fn insert(&self, key: ContextKey, manager: BindingManager) {
        trace!(
            manager = manager.id().id(),
            member = %key.member,
            "binding context entry added"
        );
        self.inner.managers.borrow_mut().insert(key, manager);
    }
}

impl fmt::Debug for BindingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingContext")
            .field("managers", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::ListRef;
    use crate::manager::ManagerKind;
    use crate::record::Schema;
    use crate::value::{Value, ValueKind};

    fn customers() -> (Schema, ListRef) {
        let schema = Schema::builder("Customer")
            .column("Name", ValueKind::Text)
            .build();
        let table = schema.new_table();
        table.push(schema.record([("Name", Value::from("Ann"))]).unwrap());
        (schema, Rc::new(table))
    }

    #[test]
    fn same_key_same_instance() {
        let (_, table) = customers();
        let source = DataSource::List(table);
        let context = BindingContext::new();
        let a = context.get(&source);
        let b = context.get_member(&source, "  ").unwrap();
        assert!(BindingManager::ptr_eq(&a, &b));
        assert_eq!(a.kind(), ManagerKind::List);
        assert_eq!(context.len(), 1);
    }

    #[test]
    fn member_keys_ignore_case() {
        let (schema, _) = customers();
        let row = schema.record([("Name", Value::from("Bo"))]).unwrap();
        let source = DataSource::Object(row);
        let context = BindingContext::new();
        let a = context.get_member(&source, "Name").unwrap();
        let b = context.get_member(&source, " name ").unwrap();
        assert!(BindingManager::ptr_eq(&a, &b));
        assert_eq!(a.kind(), ManagerKind::Property);
        assert!(context.contains(&source, "NAME"));
    }

    #[test]
    fn distinct_sources_get_distinct_managers() {
        let (_, first) = customers();
        let (_, second) = customers();
        let context = BindingContext::new();
        let a = context.get(&DataSource::List(first));
        let b = context.get(&DataSource::List(second));
        assert!(!BindingManager::ptr_eq(&a, &b));
    }

    #[test]
    fn bad_member_is_reported_whole() {
        let (_, table) = customers();
        let context = BindingContext::new();
        let err = context
            .get_member(&DataSource::List(table), "Name.Nope")
            .unwrap_err();
        assert_eq!(err.param_name(), Some("dataMember"));
        assert!(err.to_string().contains("Name.Nope"));
    }
}
