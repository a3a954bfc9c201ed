//! Python object model for Prism's wiring layer.
//!
//! This crate provides:
//! - Runtime values with identity semantics (`Value`, `WeakValue`)
//! - The object protocol (`PyObject`) and descriptor protocol (`Descriptor`)
//! - Class objects with C3 MRO and instances
//! - Function, bound method, `classmethod`, `staticmethod` and `property` objects
//! - Attribute lookup honoring descriptors
//! - Parameter introspection

pub mod error;
pub mod object;
pub mod signature;
pub mod types;
pub mod value;

// Re-export commonly used items
pub use error::{RuntimeError, RuntimeResult};
pub use object::class::{ClassRef, PyClassObject};
pub use object::instance::PyInstance;
pub use object::{AsAny, DeclaredBinding, Descriptor, ObjectRef, PyObject, concrete_type_id};
pub use signature::{Parameter, ParameterKind, Signature, signature};
pub use types::descriptor::{ClassMethod, Property, StaticMethod};
pub use types::function::{BoundMethodObject, FunctionObject, NativeFn, expect_args};
pub use value::{Value, WeakValue, object_address};
