//! Instances of user-defined classes.

use crate::object::PyObject;
use crate::object::class::ClassRef;
use crate::value::Value;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// An instance of a [`PyClassObject`](crate::object::class::PyClassObject).
///
/// Holds a strong reference to its class and a private attribute dict.
#[derive(Debug)]
pub struct PyInstance {
    /// The instance's class.
    class: ClassRef,
    /// Instance attributes (`__dict__`).
    dict: RwLock<FxHashMap<Arc<str>, Value>>,
}

impl PyInstance {
    /// Create an empty instance of `class`.
    pub fn new(class: &ClassRef) -> Self {
        Self {
            class: class.clone(),
            dict: RwLock::new(FxHashMap::default()),
        }
    }

    /// Get the instance's class.
    #[inline]
    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    /// Set an instance attribute.
    pub fn set_attr(&self, name: &str, value: Value) {
        self.dict.write().insert(Arc::from(name), value);
    }

    /// Delete an instance attribute.
    pub fn del_attr(&self, name: &str) -> Option<Value> {
        self.dict.write().remove(name)
    }
}

impl PyObject for PyInstance {
    fn type_name(&self) -> &str {
        self.class.name()
    }

    fn getattr(&self, name: &str) -> Option<Value> {
        self.dict.read().get(name).cloned()
    }

    fn dir(&self) -> Vec<Arc<str>> {
        self.dict.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::class::PyClassObject;

    #[test]
    fn test_instance_attributes() {
        let class = PyClassObject::new_simple("Point");
        let point = PyInstance::new(&class);
        point.set_attr("x", Value::int(1));

        assert_eq!(point.type_name(), "Point");
        assert_eq!(point.getattr("x"), Some(Value::int(1)));
        assert!(point.getattr("y").is_none());
        assert_eq!(point.dir().len(), 1);

        assert_eq!(point.del_attr("x"), Some(Value::int(1)));
        assert!(point.getattr("x").is_none());
    }

    #[test]
    fn test_instance_keeps_class_alive() {
        let class = PyClassObject::new_simple("Point");
        let weak = Arc::downgrade(&class);
        let point = PyInstance::new(&class);
        drop(class);
        assert!(weak.upgrade().is_some());
        assert_eq!(point.class().name(), "Point");
    }
}
