//! Builtin descriptor types: `classmethod`, `staticmethod` and `property`.
//!
//! Each wraps a single callable and re-exposes it under the attribute name
//! Python uses (`__func__` or `fget`), so probing code can find it.

use crate::error::RuntimeResult;
use crate::object::class::ClassRef;
use crate::object::{DeclaredBinding, Descriptor, ObjectRef, PyObject};
use crate::types::function::BoundMethodObject;
use crate::value::Value;
use std::sync::Arc;

// =============================================================================
// classmethod
// =============================================================================

/// Binds the wrapped callable to the owning class.
#[derive(Debug)]
pub struct ClassMethod {
    func: Value,
}

impl ClassMethod {
    /// Wrap a callable.
    pub fn new(func: Value) -> Self {
        Self { func }
    }

    /// The wrapped callable (`__func__`).
    #[inline]
    pub fn func(&self) -> &Value {
        &self.func
    }
}

impl PyObject for ClassMethod {
    fn type_name(&self) -> &str {
        "classmethod"
    }

    fn getattr(&self, name: &str) -> Option<Value> {
        (name == "__func__").then(|| self.func.clone())
    }

    fn dir(&self) -> Vec<Arc<str>> {
        vec![Arc::from("__func__")]
    }

    fn as_descriptor(&self) -> Option<&dyn Descriptor> {
        Some(self)
    }
}

impl Descriptor for ClassMethod {
    fn descr_get(
        &self,
        _this: &ObjectRef,
        _instance: Option<&Value>,
        owner: &ClassRef,
    ) -> RuntimeResult<Value> {
        Ok(Value::object(BoundMethodObject::new(
            self.func.clone(),
            Value::class(owner),
        )))
    }

    fn rebuild(&self, inner: Value) -> Option<ObjectRef> {
        Some(Arc::new(ClassMethod::new(inner)))
    }

    fn binding(&self, _has_instance: bool) -> Option<DeclaredBinding> {
        Some(DeclaredBinding::Owner)
    }
}

// =============================================================================
// staticmethod
// =============================================================================

/// Returns the wrapped callable unchanged.
#[derive(Debug)]
pub struct StaticMethod {
    func: Value,
}

impl StaticMethod {
    /// Wrap a callable.
    pub fn new(func: Value) -> Self {
        Self { func }
    }

    /// The wrapped callable (`__func__`).
    #[inline]
    pub fn func(&self) -> &Value {
        &self.func
    }
}

impl PyObject for StaticMethod {
    fn type_name(&self) -> &str {
        "staticmethod"
    }

    fn getattr(&self, name: &str) -> Option<Value> {
        (name == "__func__").then(|| self.func.clone())
    }

    fn dir(&self) -> Vec<Arc<str>> {
        vec![Arc::from("__func__")]
    }

    // staticmethod objects are callable themselves.
    fn is_callable(&self) -> bool {
        self.func.is_callable()
    }

    fn call(&self, args: &[Value]) -> RuntimeResult<Value> {
        self.func.call(args)
    }

    fn as_descriptor(&self) -> Option<&dyn Descriptor> {
        Some(self)
    }
}

impl Descriptor for StaticMethod {
    fn descr_get(
        &self,
        _this: &ObjectRef,
        _instance: Option<&Value>,
        _owner: &ClassRef,
    ) -> RuntimeResult<Value> {
        Ok(self.func.clone())
    }

    fn rebuild(&self, inner: Value) -> Option<ObjectRef> {
        Some(Arc::new(StaticMethod::new(inner)))
    }

    fn binding(&self, _has_instance: bool) -> Option<DeclaredBinding> {
        Some(DeclaredBinding::Unbound)
    }
}

// =============================================================================
// property
// =============================================================================

/// Read-only computed attribute.
///
/// Retrieval through an instance calls the getter with the instance;
/// retrieval through the class returns the property itself.
#[derive(Debug)]
pub struct Property {
    fget: Value,
}

impl Property {
    /// Wrap a getter.
    pub fn new(fget: Value) -> Self {
        Self { fget }
    }

    /// The getter (`fget`).
    #[inline]
    pub fn fget(&self) -> &Value {
        &self.fget
    }
}

impl PyObject for Property {
    fn type_name(&self) -> &str {
        "property"
    }

    fn getattr(&self, name: &str) -> Option<Value> {
        (name == "fget").then(|| self.fget.clone())
    }

    fn dir(&self) -> Vec<Arc<str>> {
        vec![Arc::from("fget")]
    }

    fn as_descriptor(&self) -> Option<&dyn Descriptor> {
        Some(self)
    }
}

impl Descriptor for Property {
    fn descr_get(
        &self,
        this: &ObjectRef,
        instance: Option<&Value>,
        _owner: &ClassRef,
    ) -> RuntimeResult<Value> {
        match instance {
            Some(instance) => self.fget.call(std::slice::from_ref(instance)),
            None => Ok(Value::Object(this.clone())),
        }
    }

    fn is_data_descriptor(&self) -> bool {
        true
    }

    fn rebuild(&self, inner: Value) -> Option<ObjectRef> {
        Some(Arc::new(Property::new(inner)))
    }

    fn binding(&self, has_instance: bool) -> Option<DeclaredBinding> {
        Some(if has_instance {
            DeclaredBinding::Instance
        } else {
            DeclaredBinding::Unbound
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::class::PyClassObject;
    use crate::object::instance::PyInstance;
    use crate::types::function::FunctionObject;

    fn echo() -> Value {
        FunctionObject::new("echo", &["x"], |args| Ok(args[0].clone())).into_value()
    }

    fn get(obj: &Value, instance: Option<&Value>, owner: &ClassRef) -> Value {
        let handle = obj.as_object().unwrap();
        handle
            .as_descriptor()
            .unwrap()
            .descr_get(handle, instance, owner)
            .unwrap()
    }

    #[test]
    fn test_classmethod_binding() {
        let class = PyClassObject::new_simple("C");
        let cm = Value::object(ClassMethod::new(echo()));
        let bound = get(&cm, None, &class);
        assert!(bound.call(&[]).unwrap().is(&Value::class(&class)));
        assert_eq!(cm.downcast_ref::<ClassMethod>().unwrap().binding(true), Some(DeclaredBinding::Owner));
    }

    #[test]
    fn test_staticmethod_is_callable() {
        let sm = StaticMethod::new(echo());
        assert!(sm.is_callable());
        assert_eq!(sm.call(&[Value::int(9)]).unwrap(), Value::int(9));
    }

    #[test]
    fn test_property_retrieval() {
        let class = PyClassObject::new_simple("C");
        let prop = Value::object(Property::new(echo()));
        let instance = Value::object(PyInstance::new(&class));

        assert!(get(&prop, Some(&instance), &class).is(&instance));
        assert!(get(&prop, None, &class).is(&prop));
    }

    #[test]
    fn test_rebuild_exposes_inner() {
        let inner = Value::int(77);
        for original in [
            Value::object(ClassMethod::new(echo())),
            Value::object(StaticMethod::new(echo())),
            Value::object(Property::new(echo())),
        ] {
            let descriptor = original.as_object().unwrap().as_descriptor().unwrap();
            let rebuilt = descriptor.rebuild(inner.clone()).unwrap();
            let found = rebuilt
                .dir()
                .into_iter()
                .filter_map(|name| rebuilt.getattr(&name))
                .any(|value| value.is(&inner));
            assert!(found);
        }
    }
}
