#![forbid(unsafe_code)]

//! State of a property manager: the single resolved object.

use std::cell::RefCell;
use std::rc::Rc;

use crate::descriptor::TypeDescriptor;
use crate::value::Value;

pub(super) struct PropertyState {
    current: RefCell<Value>,
}

impl PropertyState {
    pub(super) fn new() -> Self {
        Self {
            current: RefCell::new(Value::Null),
        }
    }

    pub(super) fn replace(&self, value: Value) {
        *self.current.borrow_mut() = value;
    }

    pub(super) fn current(&self) -> Value {
        self.current.borrow().clone()
    }

    pub(super) fn descriptor(&self) -> Option<Rc<TypeDescriptor>> {
        self.current
            .borrow()
            .as_object()
            .map(|object| object.descriptor())
    }

    pub(super) fn end_edit(&self) {
        if let Value::Object(object) = self.current() {
            object.end_edit();
        }
    }

    pub(super) fn cancel_edit(&self) {
        if let Value::Object(object) = self.current() {
            object.cancel_edit();
        }
    }
}
