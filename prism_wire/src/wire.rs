//! Wires: the per-owner endpoints handed out by ropes.
//!
//! A [`WireCore`] remembers which accessor it wraps and how it was bound. It
//! holds the owner and binding weakly, so a wire cached in the side table
//! never keeps its owner alive; the final invocable is resolved from the
//! accessor on each use.
//!
//! User types implement [`Wire`] around a core and attach their own state
//! (a cache store, a counter, ...). The object model sees them as
//! [`WireObject`].

use crate::binding::Binding;
use crate::callable::Callable;
use crate::error::{ConfigurationError, WireError, WireResult};
use prism_runtime::{
    ClassMethod, ClassRef, ObjectRef, PyClassObject, PyObject, RuntimeError, RuntimeResult,
    StaticMethod, Value, WeakValue, expect_args,
};
use smallvec::SmallVec;
use std::ops::Deref;
use std::sync::{Arc, Weak};

// =============================================================================
// Wire Trait
// =============================================================================

/// User-defined wire behavior.
///
/// # Example
///
/// ```ignore
/// struct Counted {
///     core: WireCore,
///     calls: AtomicUsize,
/// }
///
/// impl Wire for Counted {
///     type Args = ();
///     const CALLABLE: bool = true;
///
///     fn new(core: WireCore, _args: &()) -> WireResult<Self> {
///         Ok(Self { core, calls: AtomicUsize::new(0) })
///     }
///
///     fn core(&self) -> &WireCore {
///         &self.core
///     }
///
///     fn call(&self, args: &[Value]) -> RuntimeResult<Value> {
///         self.calls.fetch_add(1, Ordering::Relaxed);
///         self.core.invoke(args)
///     }
/// }
/// ```
pub trait Wire: Send + Sync + Sized + 'static {
    /// Arguments threaded from the rope to every wire.
    type Args: Send + Sync + 'static;

    /// Whether the wire defines a call operator. Ropes over bare functions
    /// become callable only when it does.
    const CALLABLE: bool = false;

    /// Build a wire around a freshly bound core.
    fn new(core: WireCore, args: &Self::Args) -> WireResult<Self>;

    /// The core this wire was built from.
    fn core(&self) -> &WireCore;

    /// Call operator. Only reachable when [`Wire::CALLABLE`] is set.
    fn call(&self, args: &[Value]) -> RuntimeResult<Value> {
        self.core().invoke(args)
    }

    /// Attribute lookup on the wire.
    fn getattr(&self, name: &str) -> Option<Value> {
        self.core().getattr(name)
    }
}

// =============================================================================
// Wire Core
// =============================================================================

/// Introspection metadata copied from the wrapped callable.
#[derive(Debug, Clone, Default)]
pub struct WireMetadata {
    /// `__name__`.
    pub name: Option<Arc<str>>,
    /// `__qualname__`.
    pub qualname: Option<Arc<str>>,
    /// `__doc__`.
    pub doc: Option<Arc<str>>,
}

impl WireMetadata {
    /// Copy the metadata of a classified callable.
    pub fn of(callable: &Callable) -> Self {
        Self {
            name: callable.name(),
            qualname: callable.qualname(),
            doc: callable.doc(),
        }
    }

    /// Look up a metadata attribute.
    pub fn getattr(&self, name: &str) -> Option<Value> {
        let field = match name {
            "__name__" => &self.name,
            "__qualname__" => &self.qualname,
            "__doc__" => return Some(self.doc.clone().map_or(Value::None, Value::Str)),
            _ => return None,
        };
        field.clone().map(Value::Str)
    }
}

/// Weak `(instance?, type)` pair a wire was retrieved with.
struct WeakBinding {
    instance: Option<WeakValue>,
    class: Weak<PyClassObject>,
}

/// State shared by every wire: the accessor, its binding and its owner.
pub struct WireCore {
    callable: Arc<Callable>,
    owner: Option<WeakValue>,
    binding: Option<WeakBinding>,
    bound: Option<WeakValue>,
    metadata: Option<WireMetadata>,
}

impl WireCore {
    /// Core for a bare function or bound method: no owner, no binding.
    pub(crate) fn unbound(callable: Arc<Callable>, wraps: bool) -> WireResult<Self> {
        Self::validated(Self {
            metadata: wraps.then(|| WireMetadata::of(&callable)),
            callable,
            owner: None,
            binding: None,
            bound: None,
        })
    }

    /// Core for a member retrieved through `(instance?, class)`.
    ///
    /// The accessor is later retrieved against the same `(instance?, class)`
    /// pair. The instance is dropped from that pair only when it cannot
    /// affect the result: builtin classmethods and staticmethods, and
    /// bindings whose first argument is already the owner. A wire cached on a type that
    /// does keep its retrieval instance becomes stale once that instance is
    /// released; see [`WireCore::is_stale`].
    pub(crate) fn bound(
        callable: Arc<Callable>,
        owner: &Value,
        binding: &Binding,
        instance: Option<&Value>,
        class: &ClassRef,
        wraps: bool,
    ) -> WireResult<Self> {
        let keeps_instance = |instance: &&Value| {
            instance.is(owner) || Self::retrieval_uses_instance(&callable, owner, binding)
        };
        Self::validated(Self {
            binding: Some(WeakBinding {
                instance: instance.filter(keeps_instance).map(Value::downgrade),
                class: Arc::downgrade(class),
            }),
            metadata: wraps.then(|| WireMetadata::of(&callable)),
            callable,
            owner: Some(owner.downgrade()),
            bound: binding.bound.as_ref().map(Value::downgrade),
        })
    }

    fn retrieval_uses_instance(callable: &Callable, owner: &Value, binding: &Binding) -> bool {
        // Only the builtin wrappers are known to ignore the instance.
        let accessor = callable.wrapped_object();
        let ignores_instance = accessor.downcast_ref::<ClassMethod>().is_some()
            || accessor.downcast_ref::<StaticMethod>().is_some();
        let bound_to_owner = binding.bound.as_ref().is_some_and(|bound| bound.is(owner));
        !ignores_instance && !bound_to_owner
    }

    fn validated(core: Self) -> WireResult<Self> {
        let func = core.func()?;
        if !func.is_callable() {
            return Err(ConfigurationError::UncallableBinding {
                accessor: core.callable.wrapped_object().type_name().to_owned(),
                type_name: func.type_name().to_owned(),
            }
            .into());
        }
        Ok(core)
    }

    fn released(&self) -> WireError {
        WireError::OwnerReleased {
            member: self
                .callable
                .qualname()
                .map_or_else(|| "<anonymous>".to_owned(), |name| name.to_string()),
        }
    }

    /// Resolve the final invocable.
    ///
    /// Without a binding this is the wrapped object itself. With one it is
    /// the accessor retrieved against the recorded `(instance?, type)`; for
    /// property-like accessors it is a getter that performs that retrieval
    /// when called.
    ///
    /// The retrieval is repeated on every call, since holding its result
    /// would keep the owner alive. Descriptors that build a fresh bound
    /// method per retrieval therefore yield a new object each time.
    pub fn func(&self) -> WireResult<Value> {
        let Some(binding) = &self.binding else {
            return Ok(self.callable.wrapped_object().clone());
        };
        let class = binding.class.upgrade().ok_or_else(|| self.released())?;
        let instance = match &binding.instance {
            Some(weak) => Some(weak.upgrade().ok_or_else(|| self.released())?),
            None => None,
        };

        let wrapped = self.callable.wrapped_object();
        let Some(accessor) = wrapped.as_object() else {
            return Ok(wrapped.clone());
        };
        if accessor.as_descriptor().is_none() {
            return Ok(wrapped.clone());
        }

        if self.callable.is_property() {
            return Ok(Value::object(PropertyGetter {
                accessor: accessor.clone(),
                instance,
                class,
            }));
        }
        descriptor_get(accessor, instance.as_ref(), &class)
    }

    /// Call the final invocable.
    pub fn invoke(&self, args: &[Value]) -> RuntimeResult<Value> {
        self.func()?.call(args)
    }

    /// Force a property-like wire: call the final invocable with no arguments.
    pub fn on_property(&self) -> RuntimeResult<Value> {
        self.invoke(&[])
    }

    /// The bound first argument, as a cache-key component.
    pub fn bound_objects(&self) -> SmallVec<[Value; 1]> {
        self.bound.iter().filter_map(WeakValue::upgrade).collect()
    }

    /// Whether the wire was retrieved through an instance other than its
    /// owner and that instance has since been released.
    pub fn is_stale(&self) -> bool {
        self.binding
            .as_ref()
            .and_then(|binding| binding.instance.as_ref())
            .is_some_and(|instance| !instance.is_alive())
    }

    /// The owner this wire is cached under, while it is alive.
    pub fn owner(&self) -> Option<Value> {
        self.owner.as_ref().and_then(WeakValue::upgrade)
    }

    /// The instance the wire was retrieved through, while it is alive.
    pub fn instance(&self) -> Option<Value> {
        self.binding
            .as_ref()?
            .instance
            .as_ref()
            .and_then(WeakValue::upgrade)
    }

    /// The type the wire was retrieved through, while it is alive.
    pub fn class(&self) -> Option<ClassRef> {
        self.binding.as_ref()?.class.upgrade()
    }

    /// The classified accessor.
    #[inline]
    pub fn callable(&self) -> &Callable {
        &self.callable
    }

    /// Copied metadata, when the rope preserves it.
    #[inline]
    pub fn metadata(&self) -> Option<&WireMetadata> {
        self.metadata.as_ref()
    }

    /// Default attribute lookup: `__func__`, `__wrapped__` and copied
    /// metadata.
    ///
    /// `__func__` is resolved per access through [`WireCore::func`], so it
    /// compares equal in behavior but is not identity-stable for bound
    /// members.
    pub fn getattr(&self, name: &str) -> Option<Value> {
        match name {
            "__func__" => self.func().ok(),
            "__wrapped__" => self
                .metadata
                .as_ref()
                .map(|_| self.callable.wrapped_callable().clone()),
            _ => self.metadata.as_ref()?.getattr(name),
        }
    }
}

impl std::fmt::Debug for WireCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WireCore")
            .field("callable", &self.callable)
            .field("bound", &self.binding.is_some())
            .field("metadata", &self.metadata)
            .finish()
    }
}

fn descriptor_get(
    accessor: &ObjectRef,
    instance: Option<&Value>,
    class: &ClassRef,
) -> WireResult<Value> {
    match accessor.as_descriptor() {
        Some(descriptor) => Ok(descriptor.descr_get(accessor, instance, class)?),
        None => Ok(Value::Object(accessor.clone())),
    }
}

/// Property getter bound to one retrieval.
struct PropertyGetter {
    accessor: ObjectRef,
    instance: Option<Value>,
    class: ClassRef,
}

impl PyObject for PropertyGetter {
    fn type_name(&self) -> &str {
        "property_getter"
    }

    fn is_callable(&self) -> bool {
        true
    }

    fn call(&self, args: &[Value]) -> RuntimeResult<Value> {
        expect_args("__get__", args, 0)?;
        descriptor_get(&self.accessor, self.instance.as_ref(), &self.class)
            .map_err(RuntimeError::from)
    }
}

// =============================================================================
// Wire Object
// =============================================================================

/// A user wire exposed to the object model.
pub struct WireObject<W> {
    wire: W,
}

impl<W: Wire> WireObject<W> {
    pub(crate) fn new(wire: W) -> Self {
        Self { wire }
    }

    /// The user wire.
    #[inline]
    pub fn wire(&self) -> &W {
        &self.wire
    }

    /// Borrow the user wire behind a value, if it holds one of type `W`.
    pub fn from_value(value: &Value) -> Option<&W> {
        value.downcast_ref::<WireObject<W>>().map(WireObject::wire)
    }
}

impl<W> Deref for WireObject<W> {
    type Target = W;

    fn deref(&self) -> &W {
        &self.wire
    }
}

impl<W: Wire> PyObject for WireObject<W> {
    fn type_name(&self) -> &str {
        "wire"
    }

    fn getattr(&self, name: &str) -> Option<Value> {
        self.wire.getattr(name)
    }

    fn dir(&self) -> Vec<Arc<str>> {
        let mut names = vec![Arc::from("__func__")];
        if self.wire.core().metadata().is_some() {
            names.extend(
                ["__doc__", "__name__", "__qualname__", "__wrapped__"]
                    .into_iter()
                    .map(Arc::from),
            );
        }
        names
    }

    fn is_callable(&self) -> bool {
        W::CALLABLE
    }

    fn call(&self, args: &[Value]) -> RuntimeResult<Value> {
        if W::CALLABLE {
            self.wire.call(args)
        } else {
            Err(RuntimeError::not_callable(self.type_name()))
        }
    }
}
