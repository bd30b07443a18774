#![forbid(unsafe_code)]

//! Live resolution of multi-hop property chains.
//!
//! A [`PathResolver`] walks `root.A.B.C` one named property at a time and, for
//! every hop whose property is observable, subscribes to that property's
//! change notifier on the object that owns it. A change anywhere along the
//! chain (the leaf value, or the identity of any intermediate object) invokes
//! the change callback, whose owner re-resolves to pick up the new chain.
//!
//! # Invariants
//!
//! 1. Re-resolving or releasing drops every subscription of the previous
//!    chain before new ones are made.
//! 2. A missing property fails fast with [`BindingError::InvalidMember`]
//!    naming the segment and the whole member.
//! 3. A null intermediate value is not an error: resolution stops there and
//!    the terminal value is `Value::Null`. Hops already walked stay
//!    subscribed, so filling in the missing link re-triggers resolution.

use std::fmt;
use std::rc::Rc;

use crate::descriptor::ObjectRef;
use crate::error::BindingError;
use crate::member::split_segments;
use crate::observable::Subscription;
use crate::value::Value;

/// Callback invoked when any link of a resolved chain changes.
pub type ChangeCallback = Rc<dyn Fn()>;

/// Resolves a fixed member chain against changing roots.
pub struct PathResolver {
    member: String,
    segments: Vec<String>,
    chain: Vec<Subscription>,
    owner: Option<ObjectRef>,
}

impl PathResolver {
    /// Resolver for a dotted member; an empty member resolves to the root.
    #[must_use]
    pub fn new(member: &str) -> Self {
        Self::from_segments(split_segments(member).iter().map(|s| (*s).to_string()))
    }

    /// Resolver for pre-split segments.
    #[must_use]
    pub fn from_segments(segments: impl IntoIterator<Item = String>) -> Self {
        let segments: Vec<String> = segments.into_iter().collect();
        Self {
            member: segments.join("."),
            segments,
            chain: Vec::new(),
            owner: None,
        }
    }

    #[must_use]
    pub fn member(&self) -> &str {
        &self.member
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Resolve against `root`, subscribing `on_change` along the chain.
    /// Any previous chain subscriptions are released first.
    ///
    /// # Errors
    ///
    /// [`BindingError::InvalidMember`] when a segment names no property.
    pub fn resolve(&mut self, root: &Value, on_change: &ChangeCallback) -> Result<Value, BindingError> {
        self.release();
        let mut chain = Vec::new();
        let walked = self.walk(root, Some((on_change, &mut chain)));
        self.chain = chain;
        let (value, owner) = walked?;
        self.owner = owner;
        Ok(value)
    }

    /// Resolve without subscribing, leaving current subscriptions untouched.
    ///
    /// # Errors
    ///
    /// Same as [`resolve`](Self::resolve).
    pub fn probe(&self, root: &Value) -> Result<Value, BindingError> {
        self.walk(root, None).map(|(value, _)| value)
    }

    /// Drop all chain subscriptions.
    pub fn release(&mut self) {
        self.chain.clear();
        self.owner = None;
    }

    /// Object owning the terminal property after the last resolve, if the
    /// chain was walked to the end.
    #[must_use]
    pub fn owner(&self) -> Option<&ObjectRef> {
        self.owner.as_ref()
    }

    /// Number of live chain subscriptions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.chain.len()
    }

    fn walk(
        &self,
        root: &Value,
        mut subscribe: Option<(&ChangeCallback, &mut Vec<Subscription>)>,
    ) -> Result<(Value, Option<ObjectRef>), BindingError> {
        let mut current = root.clone();
        let mut owner = None;
        for segment in &self.segments {
            let object: ObjectRef = match &current {
                Value::Object(object) => Rc::clone(object),
                v if v.is_null() => return Ok((Value::Null, None)),
                _ => return Err(BindingError::invalid_member(&self.member, segment)),
            };
            let descriptor = object.descriptor();
            let accessor = descriptor
                .find(segment)
                .ok_or_else(|| BindingError::invalid_member(&self.member, segment))?;
            if let Some((callback, chain)) = subscribe.as_mut()
                && let Some(sub) = accessor.subscribe(object.as_ref(), Rc::clone(callback))
            {
                chain.push(sub);
            }
            current = accessor.get(object.as_ref());
            owner = Some(object);
        }
        Ok((current, owner))
    }
}

impl fmt::Debug for PathResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathResolver")
            .field("member", &self.member)
            .field("subscriptions", &self.chain.len())
            .finish()
    }
}
