//! Function and bound method objects.
//!
//! Functions carry a native body plus the introspection metadata the
//! wiring layer relies on: `__name__`, `__qualname__`, `__doc__` and the
//! declared parameter list.

use crate::error::{RuntimeError, RuntimeResult};
use crate::object::class::ClassRef;
use crate::object::{DeclaredBinding, Descriptor, ObjectRef, PyObject};
use crate::signature::Signature;
use crate::value::Value;
use smallvec::SmallVec;
use std::sync::Arc;

/// Native function body.
pub type NativeFn = Arc<dyn Fn(&[Value]) -> RuntimeResult<Value> + Send + Sync>;

// =============================================================================
// Function Object
// =============================================================================

/// Function object.
///
/// Retrieving a function through an instance produces a
/// [`BoundMethodObject`]; retrieving it through a class returns the
/// function itself.
pub struct FunctionObject {
    /// Function name.
    pub name: Arc<str>,
    /// Dotted path from the module scope, e.g. `Outer.method`.
    pub qualname: Arc<str>,
    /// Docstring.
    pub doc: Option<Arc<str>>,
    /// Declared parameters.
    pub signature: Signature,
    /// Native body.
    body: NativeFn,
}

impl FunctionObject {
    /// Create a new function.
    ///
    /// `name` is the last dotted segment of `qualname`. `params` use Python
    /// spelling: `*args`, `**kwargs`, and the bare `*` and `/` markers.
    pub fn new<F>(qualname: &str, params: &[&str], body: F) -> Self
    where
        F: Fn(&[Value]) -> RuntimeResult<Value> + Send + Sync + 'static,
    {
        let name = qualname.rsplit('.').next().unwrap_or(qualname);
        Self {
            name: Arc::from(name),
            qualname: Arc::from(qualname),
            doc: None,
            signature: Signature::parse(params),
            body: Arc::new(body),
        }
    }

    /// Attach a docstring.
    pub fn with_doc(mut self, doc: &str) -> Self {
        self.doc = Some(Arc::from(doc));
        self
    }

    /// Move the function onto the heap.
    #[inline]
    pub fn into_value(self) -> Value {
        Value::object(self)
    }

    /// Invoke the body.
    #[inline]
    pub fn invoke(&self, args: &[Value]) -> RuntimeResult<Value> {
        (self.body)(args)
    }
}

impl std::fmt::Debug for FunctionObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionObject")
            .field("qualname", &self.qualname)
            .field("signature", &self.signature)
            .finish()
    }
}

impl PyObject for FunctionObject {
    fn type_name(&self) -> &str {
        "function"
    }

    fn getattr(&self, name: &str) -> Option<Value> {
        match name {
            "__name__" => Some(Value::Str(self.name.clone())),
            "__qualname__" => Some(Value::Str(self.qualname.clone())),
            "__doc__" => Some(self.doc.clone().map_or(Value::None, Value::Str)),
            _ => None,
        }
    }

    fn dir(&self) -> Vec<Arc<str>> {
        ["__doc__", "__name__", "__qualname__"]
            .into_iter()
            .map(Arc::from)
            .collect()
    }

    fn is_callable(&self) -> bool {
        true
    }

    fn call(&self, args: &[Value]) -> RuntimeResult<Value> {
        self.invoke(args)
    }

    fn as_descriptor(&self) -> Option<&dyn Descriptor> {
        Some(self)
    }
}

impl Descriptor for FunctionObject {
    fn descr_get(
        &self,
        this: &ObjectRef,
        instance: Option<&Value>,
        _owner: &ClassRef,
    ) -> RuntimeResult<Value> {
        let func = Value::Object(this.clone());
        Ok(match instance {
            Some(instance) => Value::object(BoundMethodObject::new(func, instance.clone())),
            None => func,
        })
    }

    fn binding(&self, has_instance: bool) -> Option<DeclaredBinding> {
        Some(if has_instance {
            DeclaredBinding::Instance
        } else {
            DeclaredBinding::Unbound
        })
    }
}

// =============================================================================
// Bound Method Object
// =============================================================================

/// A callable with its first argument already bound.
#[derive(Debug)]
pub struct BoundMethodObject {
    /// The underlying callable.
    pub func: Value,
    /// The bound first argument (`__self__`).
    pub instance: Value,
}

impl BoundMethodObject {
    /// Create a new bound method.
    pub fn new(func: Value, instance: Value) -> Self {
        Self { func, instance }
    }
}

impl PyObject for BoundMethodObject {
    fn type_name(&self) -> &str {
        "method"
    }

    fn getattr(&self, name: &str) -> Option<Value> {
        match name {
            "__func__" => Some(self.func.clone()),
            "__self__" => Some(self.instance.clone()),
            _ => self.func.as_object()?.getattr(name),
        }
    }

    fn dir(&self) -> Vec<Arc<str>> {
        let mut names: Vec<Arc<str>> = vec![Arc::from("__func__"), Arc::from("__self__")];
        if let Some(func) = self.func.as_object() {
            names.extend(func.dir());
        }
        names
    }

    fn is_callable(&self) -> bool {
        true
    }

    fn call(&self, args: &[Value]) -> RuntimeResult<Value> {
        let mut full: SmallVec<[Value; 4]> = SmallVec::with_capacity(args.len() + 1);
        full.push(self.instance.clone());
        full.extend(args.iter().cloned());
        self.func.call(&full)
    }

    fn as_descriptor(&self) -> Option<&dyn Descriptor> {
        Some(self)
    }
}

impl Descriptor for BoundMethodObject {
    /// Bound methods are already bound; retrieval hands back the same object.
    fn descr_get(
        &self,
        this: &ObjectRef,
        _instance: Option<&Value>,
        _owner: &ClassRef,
    ) -> RuntimeResult<Value> {
        Ok(Value::Object(this.clone()))
    }
}

/// Check the argument count of a native body.
pub fn expect_args(name: &str, args: &[Value], expected: usize) -> RuntimeResult<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(RuntimeError::TypeError(format!(
            "{}() takes {} positional argument{} but {} were given",
            name,
            expected,
            if expected == 1 { "" } else { "s" },
            args.len()
        )))
    }
}
