//! Attribute lookup protocol (`obj.name`).
//!
//! Resolution order for instances:
//! 1. Data descriptors found on the class MRO
//! 2. The instance's own attributes
//! 3. Non-data descriptors and plain class attributes
//!
//! For classes the MRO is searched and descriptors are retrieved with no
//! instance.

use crate::error::{RuntimeError, RuntimeResult};
use crate::object::class::ClassRef;
use crate::object::instance::PyInstance;
use crate::object::{ObjectRef, PyObject};
use crate::value::Value;

/// Look up `name` on `value`.
pub fn getattr(value: &Value, name: &str) -> RuntimeResult<Value> {
    let Some(obj) = value.as_object() else {
        return Err(RuntimeError::attribute(value.type_name(), name));
    };

    if let Some(class) = value.as_class() {
        return class_getattr(&class, name);
    }

    if let Some(instance) = value.downcast_ref::<PyInstance>() {
        return instance_getattr(value, instance, name);
    }

    obj.getattr(name)
        .ok_or_else(|| RuntimeError::attribute(obj.type_name(), name))
}

/// Look up `name` on a class, retrieving descriptors with no instance.
pub fn class_getattr(class: &ClassRef, name: &str) -> RuntimeResult<Value> {
    match class.lookup(name) {
        Some(attr) => retrieve(attr, None, class),
        None => match name {
            "__name__" | "__qualname__" => Ok(Value::str(class.name())),
            _ => Err(RuntimeError::attribute(class.name(), name)),
        },
    }
}

fn instance_getattr(value: &Value, instance: &PyInstance, name: &str) -> RuntimeResult<Value> {
    let class = instance.class();
    let class_attr = class.lookup(name);

    if let Some(attr) = class_attr.as_ref().and_then(Value::as_object) {
        if attr.as_descriptor().is_some_and(|d| d.is_data_descriptor()) {
            return descriptor_get(attr, Some(value), class);
        }
    }

    if let Some(own) = instance.getattr(name) {
        return Ok(own);
    }

    match class_attr {
        Some(attr) => retrieve(attr, Some(value), class),
        None => Err(RuntimeError::attribute(class.name(), name)),
    }
}

/// Retrieve a class-level attribute through the descriptor protocol.
fn retrieve(attr: Value, instance: Option<&Value>, class: &ClassRef) -> RuntimeResult<Value> {
    match attr.as_object() {
        Some(obj) if obj.as_descriptor().is_some() => descriptor_get(obj, instance, class),
        _ => Ok(attr),
    }
}

#[inline]
fn descriptor_get(
    obj: &ObjectRef,
    instance: Option<&Value>,
    class: &ClassRef,
) -> RuntimeResult<Value> {
    match obj.as_descriptor() {
        Some(descriptor) => descriptor.descr_get(obj, instance, class),
        None => Ok(Value::Object(obj.clone())),
    }
}
