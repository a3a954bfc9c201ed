//! Runtime values.
//!
//! Immediates (`None`, bools, ints, strings) are stored inline. Everything
//! else is a shared heap object behind `Arc<dyn PyObject>`, compared by
//! identity the way Python's `is` operator does.

use crate::error::{RuntimeError, RuntimeResult};
use crate::object::attribute;
use crate::object::class::{ClassRef, PyClassObject};
use crate::object::{ObjectRef, PyObject};
use std::fmt;
use std::sync::{Arc, Weak};

// =============================================================================
// Value
// =============================================================================

/// A runtime value.
#[derive(Clone, Default)]
pub enum Value {
    /// The `None` singleton.
    #[default]
    None,
    /// A boolean.
    Bool(bool),
    /// A small integer.
    Int(i64),
    /// An immutable string.
    Str(Arc<str>),
    /// A heap object.
    Object(ObjectRef),
}

impl Value {
    /// The `None` value.
    #[inline]
    pub const fn none() -> Self {
        Value::None
    }

    /// An integer value.
    #[inline]
    pub const fn int(value: i64) -> Self {
        Value::Int(value)
    }

    /// A string value.
    #[inline]
    pub fn str(value: &str) -> Self {
        Value::Str(Arc::from(value))
    }

    /// Move an object onto the heap and wrap it.
    #[inline]
    pub fn object<T: PyObject>(object: T) -> Self {
        Value::Object(Arc::new(object))
    }

    /// Wrap a shared class object.
    #[inline]
    pub fn class(class: &ClassRef) -> Self {
        let object: ObjectRef = class.clone();
        Value::Object(object)
    }

    /// Check for `None`.
    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Get the integer payload.
    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the string payload.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the heap object, if any.
    #[inline]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Borrow the heap object as a concrete type.
    pub fn downcast_ref<T: PyObject>(&self) -> Option<&T> {
        let obj: &dyn PyObject = &**self.as_object()?;
        obj.as_any().downcast_ref::<T>()
    }

    /// Get a shared handle to the heap object as a concrete type.
    pub fn downcast<T: PyObject>(&self) -> Option<Arc<T>> {
        let obj = self.as_object()?.clone();
        obj.into_any_arc().downcast::<T>().ok()
    }

    /// Get the class object this value refers to, if it is one.
    #[inline]
    pub fn as_class(&self) -> Option<ClassRef> {
        self.downcast::<PyClassObject>()
    }

    /// Identity comparison (`a is b`).
    pub fn is(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => object_address(a) == object_address(b),
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Address of the heap object, used as an identity key.
    #[inline]
    pub fn identity(&self) -> Option<usize> {
        self.as_object().map(object_address)
    }

    /// Name of the value's type.
    pub fn type_name(&self) -> &str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Str(_) => "str",
            Value::Object(obj) => obj.type_name(),
        }
    }

    /// Check whether the value supports the call protocol.
    #[inline]
    pub fn is_callable(&self) -> bool {
        self.as_object().is_some_and(|obj| obj.is_callable())
    }

    /// Call the value with positional arguments.
    pub fn call(&self, args: &[Value]) -> RuntimeResult<Value> {
        match self {
            Value::Object(obj) => obj.call(args),
            other => Err(RuntimeError::not_callable(other.type_name())),
        }
    }

    /// Full attribute lookup (`value.name`), honoring descriptors.
    #[inline]
    pub fn getattr(&self, name: &str) -> RuntimeResult<Value> {
        attribute::getattr(self, name)
    }

    /// Create a weak reference that does not keep heap objects alive.
    pub fn downgrade(&self) -> WeakValue {
        match self {
            Value::Object(obj) => WeakValue::Object(Arc::downgrade(obj)),
            other => WeakValue::Immediate(other.clone()),
        }
    }
}

/// Thin address of a heap object.
#[inline]
pub fn object_address(obj: &ObjectRef) -> usize {
    Arc::as_ptr(obj) as *const () as usize
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => a == b,
            _ => self.is(other),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Value::Int(i) => write!(f, "{}", i),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Object(obj) => {
                write!(f, "<{} object at {:#x}>", obj.type_name(), object_address(obj))
            }
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::str(value)
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Value::Object(value)
    }
}

// =============================================================================
// Weak Value
// =============================================================================

/// A value that refers to heap objects without owning them.
///
/// Immediates carry no lifetime and are kept as-is.
#[derive(Clone)]
pub enum WeakValue {
    /// Immediate value.
    Immediate(Value),
    /// Weak reference to a heap object.
    Object(Weak<dyn PyObject>),
}

impl WeakValue {
    /// Get the value back, or `None` if the object has been released.
    pub fn upgrade(&self) -> Option<Value> {
        match self {
            WeakValue::Immediate(value) => Some(value.clone()),
            WeakValue::Object(weak) => weak.upgrade().map(Value::Object),
        }
    }

    /// Check whether the referent is still alive.
    #[inline]
    pub fn is_alive(&self) -> bool {
        match self {
            WeakValue::Immediate(_) => true,
            WeakValue::Object(weak) => weak.strong_count() > 0,
        }
    }
}

impl fmt::Debug for WeakValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(value) => write!(f, "WeakValue({:?})", value),
            None => write!(f, "WeakValue(<released>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::class::PyClassObject;
    use crate::object::instance::PyInstance;

    #[test]
    fn test_identity_of_immediates() {
        assert!(Value::none().is(&Value::None));
        assert!(Value::int(3).is(&Value::int(3)));
        assert!(!Value::int(3).is(&Value::int(4)));
        assert!(!Value::int(1).is(&Value::Bool(true)));
    }

    #[test]
    fn test_string_equality_is_by_content() {
        let a = Value::str("abc");
        let b = Value::str("abc");
        assert_eq!(a, b);
        assert!(!a.is(&b));
    }

    #[test]
    fn test_object_identity() {
        let class = PyClassObject::new_simple("Point");
        let a = Value::object(PyInstance::new(&class));
        let b = Value::object(PyInstance::new(&class));
        assert!(a.is(&a.clone()));
        assert!(!a.is(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_class_value_roundtrip() {
        let class = PyClassObject::new_simple("Point");
        let value = Value::class(&class);
        let back = value.as_class().unwrap();
        assert!(Arc::ptr_eq(&back, &class));
        assert_eq!(value.type_name(), "type");
    }

    #[test]
    fn test_weak_value_release() {
        let class = PyClassObject::new_simple("Point");
        let value = Value::object(PyInstance::new(&class));
        let weak = value.downgrade();
        assert!(weak.is_alive());
        assert!(weak.upgrade().unwrap().is(&value));

        drop(value);
        assert!(!weak.is_alive());
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_immediates_are_not_callable() {
        let err = Value::int(1).call(&[]).unwrap_err();
        assert!(matches!(err, RuntimeError::NotCallable { .. }));
    }
}
