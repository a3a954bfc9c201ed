//! Probe objects used to inspect accessors by experiment.
//!
//! - The *reagent* is a throwaway class and instance an accessor is
//!   retrieved against; whatever comes back is compared to them by identity.
//! - An *indicator* is a fresh unique object an accessor is rebuilt around,
//!   to find which attribute stores the wrapped callable.
//! - The *marker* is a function returning its own first argument, so a bound
//!   marker reveals what it was bound to when called.

use prism_runtime::{ClassRef, FunctionObject, PyClassObject, PyInstance, PyObject, Value};
use std::sync::OnceLock;

/// A unique object with no behavior.
#[derive(Debug)]
pub struct Indicator;

impl PyObject for Indicator {
    fn type_name(&self) -> &str {
        "indicator"
    }
}

/// Create a fresh indicator; every call returns a distinct identity.
pub fn indicator() -> Value {
    Value::object(Indicator)
}

struct Reagent {
    class: ClassRef,
    instance: Value,
}

static REAGENT: OnceLock<Reagent> = OnceLock::new();
static MARKER: OnceLock<Value> = OnceLock::new();

fn reagent() -> &'static Reagent {
    REAGENT.get_or_init(|| {
        let class = PyClassObject::new_simple("_Reagent");
        let instance = Value::object(PyInstance::new(&class));
        Reagent { class, instance }
    })
}

/// The reagent class.
#[inline]
pub fn reagent_class() -> &'static ClassRef {
    &reagent().class
}

/// The reagent instance (an instance of [`reagent_class`]).
#[inline]
pub fn reagent_instance() -> &'static Value {
    &reagent().instance
}

/// The marker function `_f(owner) -> owner`.
pub fn marker() -> &'static Value {
    MARKER.get_or_init(|| {
        FunctionObject::new("_f", &["owner"], |args| {
            Ok(args.first().cloned().unwrap_or(Value::None))
        })
        .into_value()
    })
}
