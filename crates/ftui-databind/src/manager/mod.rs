#![forbid(unsafe_code)]

//! Binding managers: the shared mediator between bindings and one data source.
//!
//! A [`BindingManager`] owns the live [`PathResolver`] chain from its anchor
//! (a data source, or the current row of a parent list manager) to its
//! terminal value, and tells bindings when that value changes through
//! [`current_changed`](BindingManager::current_changed). It comes in two
//! kinds, chosen from the resolved value when the manager is created:
//!
//! - **Property** managers wrap one object. They have no position, count is
//!   always 1, and [`is_binding`](BindingManager::is_binding) is always true.
//! - **List** managers wrap a [`DataList`](crate::list::DataList), track a
//!   current position, drive row edit transactions, and report
//!   `is_binding() == false` while suspended.
//!
//! Both kinds batch change propagation under
//! [`suspend_binding`](BindingManager::suspend_binding) /
//! [`resume_binding`](BindingManager::resume_binding).
//!
//! # Invariants
//!
//! 1. A list manager's position is `-1` iff its list is empty, otherwise in
//!    `[0, count - 1]`.
//! 2. While the suspension depth is non-zero no `current_changed` is
//!    delivered; the resume that brings the depth back to zero delivers
//!    exactly one.
//! 3. A related (child) manager re-resolves whenever its parent's current
//!    value changes; its position resets when its list identity changes.
//! 4. Managers never hold a `RefCell` borrow while notifying, so callbacks
//!    may re-enter any manager method.
//!
//! # Failure Modes
//!
//! - Re-resolution failure inside a change callback (the object graph changed
//!   shape under a live chain): logged at `warn` and the terminal value is
//!   treated as null.
//! - `resume_binding` without a matching suspend: logged and ignored.

mod list;
mod property;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashMap;
use tracing::{debug, warn};

use crate::descriptor::{DataObject, ObjectRef, TypeDescriptor};
use crate::error::BindingError;
use crate::list::{DataList, ListRef};
use crate::member::{normalize, split_segments};
use crate::observable::{Notifier, Subscription};
use crate::resolver::{ChangeCallback, PathResolver};
use crate::value::{Value, ValueKind};

use self::list::ListState;
use self::property::PropertyState;

static MANAGER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier of a binding manager, used in log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ManagerId(u64);

impl ManagerId {
    fn new() -> Self {
        Self(MANAGER_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// The two manager variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerKind {
    /// Single object, no position.
    Property,
    /// List-like source with a current position.
    List,
}

// ---------------------------------------------------------------------------
// DataSource
// ---------------------------------------------------------------------------

/// A root data source handed to a binding or context.
///
/// Equality is identity: two sources are equal when they wrap the same
/// allocation.
#[derive(Clone)]
pub enum DataSource {
    Object(ObjectRef),
    List(ListRef),
}

impl DataSource {
    pub fn object<T: DataObject>(object: Rc<T>) -> Self {
        Self::Object(object)
    }

    pub fn list<T: DataList + 'static>(list: Rc<T>) -> Self {
        Self::List(list)
    }

    /// Source for an object or list value; `None` for scalars and nulls.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(object) => Some(Self::Object(Rc::clone(object))),
            Value::List(list) => Some(Self::List(Rc::clone(list))),
            _ => None,
        }
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Object(object) => Value::Object(Rc::clone(object)),
            Self::List(list) => Value::List(Rc::clone(list)),
        }
    }

    #[must_use]
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Address of the wrapped allocation.
    pub(crate) fn identity(&self) -> usize {
        match self {
            Self::Object(object) => Rc::as_ptr(object).cast::<()>() as usize,
            Self::List(list) => Rc::as_ptr(list).cast::<()>() as usize,
        }
    }
}

impl PartialEq for DataSource {
    fn eq(&self, other: &Self) -> bool {
        self.is_list() == other.is_list() && self.identity() == other.identity()
    }
}

impl Eq for DataSource {}

impl From<ObjectRef> for DataSource {
    fn from(object: ObjectRef) -> Self {
        Self::Object(object)
    }
}

impl From<ListRef> for DataSource {
    fn from(list: ListRef) -> Self {
        Self::List(list)
    }
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object(object) => write!(f, "DataSource::Object({})", object.descriptor().type_name()),
            Self::List(list) => write!(f, "DataSource::List(len = {})", list.len()),
        }
    }
}

// ---------------------------------------------------------------------------
// Manager internals
// ---------------------------------------------------------------------------

/// Where a manager's chain starts.
#[derive(Clone)]
enum Anchor {
    Source(Value),
    /// The current value of a parent manager.
    Parent(BindingManager),
}

impl Anchor {
    fn root(&self) -> Value {
        match self {
            Self::Source(value) => value.clone(),
            Self::Parent(parent) => parent.current(),
        }
    }
}

enum ManagerState {
    Property(PropertyState),
    List(ListState),
}

pub(crate) struct ManagerInner {
    id: ManagerId,
    anchor: Anchor,
    resolver: RefCell<PathResolver>,
    state: ManagerState,
    suspended: Cell<u32>,
    deferred_position: Cell<bool>,
    current_changed: Notifier,
    position_changed: Notifier,
    children: RefCell<AHashMap<String, Weak<ManagerInner>>>,
    on_change: ChangeCallback,
    parent_link: RefCell<Option<Subscription>>,
    weak_self: Weak<ManagerInner>,
}

impl ManagerInner {
    /// Re-walk the chain, resubscribing along the way.
    fn resolve_terminal(&self) -> Value {
        let root = self.anchor.root();
        let resolved = self.resolver.borrow_mut().resolve(&root, &self.on_change);
        resolved.unwrap_or_else(|err| {
            warn!(
                manager = self.id.id(),
                error = %err,
                "re-resolution failed; treating value as null"
            );
            Value::Null
        })
    }

    /// Something upstream changed: the anchor's current value or a link of
    /// the chain.
    fn source_changed(&self) {
        let value = self.resolve_terminal();
        match &self.state {
            ManagerState::Property(state) => {
                state.replace(value);
                self.raise_current_changed();
            }
            ManagerState::List(state) => self.rebind_list(state, &value),
        }
    }

    fn raise_current_changed(&self) {
        if self.suspended.get() == 0 {
            self.current_changed.emit();
        }
    }

    fn raise_position_changed(&self) {
        if self.suspended.get() == 0 {
            self.position_changed.emit();
        } else {
            self.deferred_position.set(true);
        }
    }

    fn current(&self) -> Value {
        match &self.state {
            ManagerState::Property(state) => state.current(),
            ManagerState::List(state) => state.current(),
        }
    }
}

// ---------------------------------------------------------------------------
// BindingManager
// ---------------------------------------------------------------------------

/// Shared handle to a property or list manager.
///
/// Clones share one manager; use [`ptr_eq`](Self::ptr_eq) for identity.
#[derive(Clone)]
pub struct BindingManager {
    inner: Rc<ManagerInner>,
}

impl BindingManager {
    /// Manager for a whole data source.
    #[must_use]
    pub fn for_source(source: &DataSource) -> Self {
        Self::build(
            Anchor::Source(source.to_value()),
            PathResolver::new(""),
            source.is_list(),
        )
    }

    /// Manager for `member` resolved against `source`, without context
    /// caching. Intermediate list hops create related managers.
    ///
    /// # Errors
    ///
    /// [`BindingError::InvalidMember`] when a segment does not resolve.
    pub fn for_member(source: &DataSource, member: &str) -> Result<Self, BindingError> {
        split_segments(member)
            .iter()
            .try_fold(Self::for_source(source), |manager, segment| {
                manager.related(segment)
            })
            .map_err(|err| err.within_member(member.trim()))
    }

    /// Probe the chain, then build a manager whose kind follows the resolved
    /// value. `declared` is the terminal property's declared kind, when known.
    fn create(
        anchor: Anchor,
        resolver: PathResolver,
        declared: Option<ValueKind>,
    ) -> Result<Self, BindingError> {
        let probed = resolver.probe(&anchor.root())?;
        let is_list = match probed {
            Value::List(_) => true,
            ref value if value.is_null() => declared == Some(ValueKind::List),
            _ => false,
        };
        Ok(Self::build(anchor, resolver, is_list))
    }

    fn build(anchor: Anchor, resolver: PathResolver, is_list: bool) -> Self {
        let state = if is_list {
            ManagerState::List(ListState::new())
        } else {
            ManagerState::Property(PropertyState::new())
        };
        let inner = Rc::new_cyclic(|weak: &Weak<ManagerInner>| {
            let chain_weak = weak.clone();
            let on_change: ChangeCallback = Rc::new(move || {
                if let Some(inner) = chain_weak.upgrade() {
                    inner.source_changed();
                }
            });
            ManagerInner {
                id: ManagerId::new(),
                anchor,
                resolver: RefCell::new(resolver),
                state,
                suspended: Cell::new(0),
                deferred_position: Cell::new(false),
                current_changed: Notifier::new(),
                position_changed: Notifier::new(),
                children: RefCell::new(AHashMap::new()),
                on_change,
                parent_link: RefCell::new(None),
                weak_self: weak.clone(),
            }
        });

        let value = inner.resolve_terminal();
        match &inner.state {
            ManagerState::Property(state) => state.replace(value),
            ManagerState::List(state) => {
                inner.attach_list(state, &value);
            }
        }

        if let Anchor::Parent(parent) = &inner.anchor {
            let weak = Rc::downgrade(&inner);
            let link = parent.current_changed().subscribe(move |()| {
                if let Some(inner) = weak.upgrade() {
                    inner.source_changed();
                }
            });
            *inner.parent_link.borrow_mut() = Some(link);
        }

        let manager = Self { inner };
        debug!(
            manager = manager.id().id(),
            kind = ?manager.kind(),
            member = %manager.inner.resolver.borrow().member(),
            related = manager.parent().is_some(),
            "binding manager created"
        );
        manager
    }

    #[must_use]
    pub fn id(&self) -> ManagerId {
        self.inner.id
    }

    #[must_use]
    pub fn kind(&self) -> ManagerKind {
        match self.inner.state {
            ManagerState::Property(_) => ManagerKind::Property,
            ManagerState::List(_) => ManagerKind::List,
        }
    }

    #[must_use]
    pub fn is_list(&self) -> bool {
        self.kind() == ManagerKind::List
    }

    /// Whether two handles refer to the same manager.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    /// Member walked from the anchor, relative to the parent for related
    /// managers.
    #[must_use]
    pub fn member(&self) -> String {
        self.inner.resolver.borrow().member().to_string()
    }

    /// The list manager this manager is scoped to, if it is related.
    #[must_use]
    pub fn parent(&self) -> Option<BindingManager> {
        match &self.inner.anchor {
            Anchor::Parent(parent) => Some(parent.clone()),
            Anchor::Source(_) => None,
        }
    }

    /// Whether bindings on this manager currently push values.
    ///
    /// Always true for property managers; false for list managers while
    /// suspended.
    #[must_use]
    pub fn is_binding(&self) -> bool {
        match self.inner.state {
            ManagerState::Property(_) => true,
            ManagerState::List(_) => self.inner.suspended.get() == 0,
        }
    }

    /// The object for property managers, the row at the current position for
    /// list managers (`Value::Null` when there is none).
    #[must_use]
    pub fn current(&self) -> Value {
        self.inner.current()
    }

    /// Row count for list managers, 1 for property managers.
    #[must_use]
    pub fn count(&self) -> usize {
        match &self.inner.state {
            ManagerState::Property(_) => 1,
            ManagerState::List(state) => state.count(),
        }
    }

    /// Current position; always 0 for property managers.
    #[must_use]
    pub fn position(&self) -> isize {
        match &self.inner.state {
            ManagerState::Property(_) => 0,
            ManagerState::List(state) => state.position(),
        }
    }

    /// Move to `position`, clamped to the valid range. Commits the edit in
    /// progress first. No-op for property managers.
    pub fn set_position(&self, position: isize) {
        if let ManagerState::List(state) = &self.inner.state {
            self.inner.move_to(state, position);
        }
    }

    /// Move to `position`, rejecting values outside `[-1, count - 1]`.
    ///
    /// # Errors
    ///
    /// [`BindingError::OutOfRange`] naming parameter `value`.
    pub fn seek(&self, position: isize) -> Result<(), BindingError> {
        match &self.inner.state {
            ManagerState::Property(_) => Ok(()),
            ManagerState::List(state) => {
                state.check_position(position)?;
                self.inner.move_to(state, position);
                Ok(())
            }
        }
    }

    /// Fired when the current value changes: a new row, a new object, or a
    /// forced refresh.
    #[must_use]
    pub fn current_changed(&self) -> &Notifier {
        &self.inner.current_changed
    }

    /// Fired when the position of a list manager changes.
    #[must_use]
    pub fn position_changed(&self) -> &Notifier {
        &self.inner.position_changed
    }

    /// Descriptor of the rows (list) or of the current object (property).
    #[must_use]
    pub fn item_descriptor(&self) -> Option<Rc<TypeDescriptor>> {
        match &self.inner.state {
            ManagerState::Property(state) => state.descriptor(),
            ManagerState::List(state) => state.item_descriptor(),
        }
    }

    // -- suspension ---------------------------------------------------------

    /// Enter a suspension level.
    pub fn suspend_binding(&self) {
        let depth = self.inner.suspended.get() + 1;
        self.inner.suspended.set(depth);
        debug!(manager = self.id().id(), depth, "binding suspended");
    }

    /// Leave a suspension level. The resume that completes the batch delivers
    /// one `current_changed`.
    pub fn resume_binding(&self) {
        let depth = self.inner.suspended.get();
        if depth == 0 {
            warn!(
                manager = self.id().id(),
                "resume_binding without matching suspend_binding ignored"
            );
            return;
        }
        self.inner.suspended.set(depth - 1);
        if depth > 1 {
            debug!(manager = self.id().id(), depth = depth - 1, "binding resume nested");
            return;
        }
        debug!(manager = self.id().id(), "binding resumed");
        if let ManagerState::List(state) = &self.inner.state {
            self.inner.reclamp(state);
        }
        if self.inner.deferred_position.take() {
            self.inner.position_changed.emit();
        }
        self.inner.current_changed.emit();
    }

    /// Current suspension depth.
    #[must_use]
    pub fn suspend_depth(&self) -> u32 {
        self.inner.suspended.get()
    }

    // -- edits ----------------------------------------------------------------

    /// Commit the edit in progress.
    pub fn end_edit(&self) {
        match &self.inner.state {
            ManagerState::Property(state) => state.end_edit(),
            ManagerState::List(state) => self.inner.commit_row(state),
        }
    }

    /// Discard the edit in progress and have bindings re-read.
    pub fn cancel_edit(&self) {
        match &self.inner.state {
            ManagerState::Property(state) => {
                state.cancel_edit();
                self.inner.raise_current_changed();
            }
            ManagerState::List(state) => self.inner.cancel_row(state),
        }
    }

    /// Append a new pending row and move to it.
    ///
    /// # Errors
    ///
    /// [`BindingError::Unsupported`] for property managers and lists that
    /// cannot create rows.
    pub fn add_new(&self) -> Result<usize, BindingError> {
        match &self.inner.state {
            ManagerState::Property(_) => Err(BindingError::Unsupported {
                operation: "adding new items",
            }),
            ManagerState::List(state) => self.inner.add_row(state),
        }
    }

    /// Remove the row at `index`.
    ///
    /// # Errors
    ///
    /// [`BindingError::OutOfRange`] naming parameter `index`, or
    /// [`BindingError::Unsupported`].
    pub fn remove_at(&self, index: usize) -> Result<(), BindingError> {
        match &self.inner.state {
            ManagerState::Property(_) => Err(BindingError::Unsupported {
                operation: "removing items",
            }),
            ManagerState::List(state) => self.inner.remove_row(state, index),
        }
    }

    /// Re-resolve from the anchor and fire `current_changed` once.
    pub fn refresh(&self) {
        debug!(manager = self.id().id(), "binding manager refreshed");
        self.inner.source_changed();
    }

    // -- values ---------------------------------------------------------------

    /// Read `field` of the current value; an empty field reads the current
    /// value itself. A missing current value reads as `Value::Null`.
    ///
    /// # Errors
    ///
    /// [`BindingError::InvalidMember`] when the current object has no such
    /// property.
    pub fn get_value(&self, field: &str) -> Result<Value, BindingError> {
        let current = self.current();
        if field.trim().is_empty() {
            return Ok(current);
        }
        match &current {
            Value::Object(object) => {
                let descriptor = object.descriptor();
                let accessor = descriptor
                    .find(field.trim())
                    .ok_or_else(|| BindingError::invalid_member(field, field))?;
                Ok(accessor.get(object.as_ref()))
            }
            value if value.is_null() => Ok(Value::Null),
            _ => Err(BindingError::invalid_member(field, field)),
        }
    }

    /// Write `field` of the current value. For list rows the first write
    /// opens the row's edit transaction.
    ///
    /// # Errors
    ///
    /// [`BindingError::NoCurrentItem`] without a current object, otherwise
    /// lookup, read-only and conversion errors.
    pub fn set_value(&self, field: &str, value: Value) -> Result<(), BindingError> {
        let current = self.current();
        let Value::Object(object) = &current else {
            return Err(BindingError::NoCurrentItem);
        };
        let descriptor = object.descriptor();
        let accessor = descriptor
            .find(field.trim())
            .ok_or_else(|| BindingError::invalid_member(field, field))?;
        if accessor.is_read_only() {
            return Err(BindingError::ReadOnly {
                property: accessor.name().to_string(),
            });
        }
        if let ManagerState::List(state) = &self.inner.state {
            state.begin_row_edit(object);
        }
        accessor.set(object.as_ref(), value)
    }

    /// Manager for the relation `name` of the current value, created on
    /// first use and cached weakly.
    ///
    /// A property manager extends its own chain by one hop. A list manager
    /// creates a child anchored on its current row, so the child follows the
    /// parent's position (master/detail).
    ///
    /// # Errors
    ///
    /// [`BindingError::InvalidMember`] when `name` is not a property of the
    /// current value (or of the row type, for empty lists).
    pub fn related(&self, name: &str) -> Result<BindingManager, BindingError> {
        let name = name.trim();
        let key = normalize(name);
        let cached = self.inner.children.borrow().get(&key).and_then(Weak::upgrade);
        if let Some(inner) = cached {
            return Ok(Self { inner });
        }

        let child = match &self.inner.state {
            ManagerState::Property(_) => {
                let segments = self
                    .inner
                    .resolver
                    .borrow()
                    .segments()
                    .iter()
                    .cloned()
                    .chain(std::iter::once(name.to_string()))
                    .collect::<Vec<_>>();
                let resolver = PathResolver::from_segments(segments);
                Self::create(self.inner.anchor.clone(), resolver, None)?
            }
            ManagerState::List(_) => {
                let declared = match self.item_descriptor() {
                    Some(descriptor) => Some(
                        descriptor
                            .find(name)
                            .ok_or_else(|| BindingError::invalid_member(name, name))?
                            .kind(),
                    ),
                    None => None,
                };
                let resolver = PathResolver::from_segments([name.to_string()]);
                Self::create(Anchor::Parent(self.clone()), resolver, declared)?
            }
        };
        let mut children = self.inner.children.borrow_mut();
        children.retain(|_, weak| weak.strong_count() > 0);
        children.insert(key, Rc::downgrade(&child.inner));
        drop(children);
        Ok(child)
    }

    /// Number of live chain subscriptions held by this manager.
    #[must_use]
    pub fn chain_subscription_count(&self) -> usize {
        self.inner.resolver.borrow().subscription_count()
    }
}

impl fmt::Debug for BindingManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingManager")
            .field("id", &self.inner.id.id())
            .field("kind", &self.kind())
            .field("member", &self.inner.resolver.borrow().member())
            .field("position", &self.position())
            .field("count", &self.count())
            .field("suspended", &self.inner.suspended.get())
            .finish()
    }
}
