//! Core object protocol.
//!
//! Every heap object implements [`PyObject`]. Objects that intercept their
//! own retrieval from a class or instance additionally implement
//! [`Descriptor`] and expose it through [`PyObject::as_descriptor`].

pub mod attribute;
pub mod class;
pub mod instance;

use crate::error::{RuntimeError, RuntimeResult};
use crate::object::class::{ClassRef, PyClassObject};
use crate::value::Value;
use std::any::Any;
use std::sync::Arc;

/// Shared reference to a heap object.
pub type ObjectRef = Arc<dyn PyObject>;

// =============================================================================
// Downcasting Support
// =============================================================================

/// Upcast helpers so trait objects can be downcast to their concrete type.
///
/// Call these through `&dyn PyObject` (e.g. `(**obj).as_any()`), never on the
/// `Arc` itself, or the blanket impl answers for the `Arc`.
pub trait AsAny: Any + Send + Sync {
    /// Borrow as `Any`.
    fn as_any(&self) -> &dyn Any;

    /// Convert a shared handle into `Arc<dyn Any>`.
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

// =============================================================================
// Object Trait
// =============================================================================

/// Trait for all heap objects.
///
/// Only `type_name` is mandatory; the remaining hooks default to an object
/// with no attributes that cannot be called and is not a descriptor.
pub trait PyObject: AsAny {
    /// Name of the object's type, as reported in errors.
    fn type_name(&self) -> &str;

    /// Look up an attribute stored on the object itself.
    ///
    /// This is the object's own storage only; class-level lookup and the
    /// descriptor protocol live in [`attribute::getattr`].
    fn getattr(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Names of the attributes stored on the object itself.
    fn dir(&self) -> Vec<Arc<str>> {
        Vec::new()
    }

    /// Check whether the object supports the call protocol.
    fn is_callable(&self) -> bool {
        false
    }

    /// Call the object with positional arguments.
    fn call(&self, _args: &[Value]) -> RuntimeResult<Value> {
        Err(RuntimeError::not_callable(self.type_name()))
    }

    /// Descriptor protocol, if the object implements it.
    fn as_descriptor(&self) -> Option<&dyn Descriptor> {
        None
    }
}

/// Identity of an object's concrete type.
#[inline]
pub fn concrete_type_id(obj: &dyn PyObject) -> std::any::TypeId {
    obj.as_any().type_id()
}

// =============================================================================
// Descriptor Protocol
// =============================================================================

/// How a descriptor binds when retrieved, declared by the descriptor itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclaredBinding {
    /// No implicit first argument; the owning type hosts per-owner state.
    Unbound,
    /// The instance becomes the implicit first argument and the owner.
    Instance,
    /// The owning type becomes the implicit first argument and the owner.
    Owner,
}

/// Objects whose retrieval from a class or instance yields something else.
///
/// `this` is the shared handle of the descriptor itself, so a retrieval can
/// hand the descriptor back unchanged.
pub trait Descriptor {
    /// Retrieve through the descriptor (`__get__`).
    fn descr_get(
        &self,
        this: &ObjectRef,
        instance: Option<&Value>,
        owner: &ClassRef,
    ) -> RuntimeResult<Value>;

    /// Data descriptors take precedence over instance attributes.
    fn is_data_descriptor(&self) -> bool {
        false
    }

    /// Called once when the descriptor is installed on a class (`__set_name__`).
    fn set_name(&self, _owner: &PyClassObject, _name: &str) {}

    /// Build a fresh descriptor of the same type around another callable.
    ///
    /// Returns `None` for descriptors that cannot be reconstructed this way.
    fn rebuild(&self, _inner: Value) -> Option<ObjectRef> {
        None
    }

    /// Binding behavior declared by the descriptor type, if it declares one.
    fn binding(&self, _has_instance: bool) -> Option<DeclaredBinding> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::instance::PyInstance;

    struct Opaque;

    impl PyObject for Opaque {
        fn type_name(&self) -> &str {
            "opaque"
        }
    }

    #[test]
    fn test_default_object_hooks() {
        let value = Value::object(Opaque);
        let obj = value.as_object().unwrap();
        assert!(!obj.is_callable());
        assert!(obj.getattr("anything").is_none());
        assert!(obj.dir().is_empty());
        assert!(obj.as_descriptor().is_none());
        assert!(matches!(obj.call(&[]), Err(RuntimeError::NotCallable { .. })));
    }

    #[test]
    fn test_concrete_type_id() {
        let class = PyClassObject::new_simple("Thing");
        let a = Value::object(Opaque);
        let b = Value::object(PyInstance::new(&class));
        let id_a = concrete_type_id(&**a.as_object().unwrap());
        let id_b = concrete_type_id(&**b.as_object().unwrap());
        assert_eq!(id_a, std::any::TypeId::of::<Opaque>());
        assert_ne!(id_a, id_b);
    }

    #[test]
    fn test_downcast_through_value() {
        let value = Value::object(Opaque);
        assert!(value.downcast_ref::<Opaque>().is_some());
        assert!(value.downcast::<Opaque>().is_some());
        assert!(value.downcast_ref::<PyInstance>().is_none());
    }
}
