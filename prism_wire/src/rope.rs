//! Ropes: the accessors installed in place of wrapped members.
//!
//! [`WireRope`] is the decorator. It classifies what it is given once and
//! builds a [`Rope`] with one of four fixed strategies:
//!
//! | Kind               | Accessors                                      | Retrieval yields     |
//! |--------------------|------------------------------------------------|----------------------|
//! | `Member`           | instance / class / static methods, descriptors | the owner's wire     |
//! | `Property`         | properties and property-like descriptors       | the forced value     |
//! | `Function`         | bare functions, bound methods                  | the rope             |
//! | `CallableFunction` | same, when the wire defines a call operator    | the rope (callable)  |
//!
//! Member and property wires are built lazily, once per owner, and cached
//! in a side table shared by every rope of the same [`WireRope`].

use crate::binding::BindingRegistry;
use crate::callable::{AccessorKind, Callable};
use crate::config::RopeConfig;
use crate::error::{WireError, WireResult};
use crate::table::{WireSlot, WireTable};
use crate::wire::{Wire, WireCore, WireMetadata, WireObject};
use once_cell::sync::OnceCell;
use prism_runtime::{
    ClassRef, Descriptor, ObjectRef, PyClassObject, PyObject, RuntimeError, RuntimeResult, Value,
};
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, trace};

// =============================================================================
// Rope Kind
// =============================================================================

/// Replacement strategy of a rope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RopeKind {
    /// Per-owner wire returned on retrieval.
    Member,
    /// Per-owner wire forced on retrieval.
    Property,
    /// Single wire; the rope forwards attributes to it.
    Function,
    /// Single wire; the rope also forwards calls to it.
    CallableFunction,
}

impl RopeKind {
    /// Select the strategy for an accessor kind.
    pub fn select(kind: AccessorKind, wire_callable: bool) -> Self {
        match kind {
            AccessorKind::BareFunction | AccessorKind::BoundMethod => {
                if wire_callable {
                    RopeKind::CallableFunction
                } else {
                    RopeKind::Function
                }
            }
            AccessorKind::Property => RopeKind::Property,
            AccessorKind::InstanceMethod
            | AccessorKind::ClassMethod
            | AccessorKind::StaticMethod
            | AccessorKind::CustomBound => RopeKind::Member,
        }
    }

    /// Whether wires are cached per owner.
    #[inline]
    pub fn is_owned(self) -> bool {
        matches!(self, RopeKind::Member | RopeKind::Property)
    }
}

// =============================================================================
// Rope State
// =============================================================================

/// Extra state carried by every rope of a [`WireRope`].
///
/// Attributes returned by [`RopeState::getattr`] take precedence over the
/// rope's own and over those forwarded to a function wire.
pub trait RopeState: Default + Send + Sync + 'static {
    /// Attributes defined by the state.
    fn getattr(&self, _name: &str) -> Option<Value> {
        None
    }
}

impl RopeState for () {}

// =============================================================================
// Wire Rope
// =============================================================================

struct RopeShared<W: Wire> {
    registry: Arc<BindingRegistry>,
    config: RopeConfig,
    args: W::Args,
    table: WireTable<Arc<WireObject<W>>>,
    next_rope_id: AtomicUsize,
}

/// Decorator producing ropes for wire type `W`.
///
/// # Example
///
/// ```ignore
/// let registry = Arc::new(BindingRegistry::new());
/// let cached = WireRope::<Memo>::with_config(registry, RopeConfig::preserving(), ());
///
/// class.define("lookup", cached.wrap(lookup_function)?);
/// ```
pub struct WireRope<W: Wire, S: RopeState = ()> {
    shared: Arc<RopeShared<W>>,
    _state: PhantomData<fn() -> S>,
}

impl<W: Wire, S: RopeState> WireRope<W, S> {
    /// Create a decorator with default configuration.
    pub fn new(registry: Arc<BindingRegistry>, args: W::Args) -> Self {
        Self::with_config(registry, RopeConfig::default(), args)
    }

    /// Create a decorator with custom configuration.
    pub fn with_config(registry: Arc<BindingRegistry>, config: RopeConfig, args: W::Args) -> Self {
        let table = WireTable::new(config.sweep_threshold);
        Self {
            shared: Arc::new(RopeShared {
                registry,
                config,
                args,
                table,
                next_rope_id: AtomicUsize::new(0),
            }),
            _state: PhantomData,
        }
    }

    /// Wrap an accessor and return the rope as a value ready to install.
    pub fn wrap(&self, accessor: Value) -> WireResult<Value> {
        let rope: ObjectRef = self.wrap_rope(accessor)?;
        Ok(Value::Object(rope))
    }

    /// Wrap an accessor and return the typed rope.
    pub fn wrap_rope(&self, accessor: Value) -> WireResult<Arc<Rope<W, S>>> {
        let callable = Arc::new(Callable::new(accessor)?);
        let kind = RopeKind::select(callable.kind(), W::CALLABLE);

        let function_wire = if kind.is_owned() {
            None
        } else {
            let core = WireCore::unbound(callable.clone(), self.shared.config.wraps)?;
            Some(Arc::new(WireObject::new(W::new(core, &self.shared.args)?)))
        };

        debug!(
            name = callable.name().as_deref().unwrap_or("<anonymous>"),
            accessor = callable.kind().name(),
            rope = ?kind,
            "wrapped accessor"
        );
        Ok(Arc::new(Rope {
            id: self.shared.next_rope_id.fetch_add(1, Ordering::Relaxed),
            callable,
            kind,
            shared: self.shared.clone(),
            state: S::default(),
            wire_name: OnceCell::new(),
            function_wire,
        }))
    }

    /// The binding registry.
    #[inline]
    pub fn registry(&self) -> &BindingRegistry {
        &self.shared.registry
    }

    /// The configuration.
    #[inline]
    pub fn config(&self) -> &RopeConfig {
        &self.shared.config
    }

    /// Arguments threaded to every wire.
    #[inline]
    pub fn args(&self) -> &W::Args {
        &self.shared.args
    }

    /// The side table holding member and property wires.
    #[inline]
    pub fn table(&self) -> &WireTable<Arc<WireObject<W>>> {
        &self.shared.table
    }

    /// Drop every wire cached for `owner`. Returns the number removed.
    pub fn evict(&self, owner: &Value) -> usize {
        self.shared.table.evict(owner)
    }

    /// Drop the wires of released owners. Returns how many owners were dropped.
    pub fn purge(&self) -> usize {
        self.shared.table.purge()
    }
}

impl<W: Wire, S: RopeState> Clone for WireRope<W, S> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            _state: PhantomData,
        }
    }
}

impl<W: Wire, S: RopeState> std::fmt::Debug for WireRope<W, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WireRope")
            .field("config", &self.shared.config)
            .field("table", &self.shared.table)
            .finish()
    }
}

// =============================================================================
// Rope
// =============================================================================

/// Accessor installed in place of a wrapped member.
pub struct Rope<W: Wire, S: RopeState = ()> {
    /// Unique among the ropes of one `WireRope`; part of every slot key.
    id: usize,
    callable: Arc<Callable>,
    kind: RopeKind,
    shared: Arc<RopeShared<W>>,
    state: S,
    /// `__wire|<Type>|<member>`, set when installed on a class.
    wire_name: OnceCell<Arc<str>>,
    /// The single wire of function ropes.
    function_wire: Option<Arc<WireObject<W>>>,
}

impl<W: Wire, S: RopeState> Rope<W, S> {
    /// The classified accessor.
    #[inline]
    pub fn callable(&self) -> &Callable {
        &self.callable
    }

    /// The strategy.
    #[inline]
    pub fn kind(&self) -> RopeKind {
        self.kind
    }

    /// The rope state.
    #[inline]
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Slot name assigned on installation.
    #[inline]
    pub fn wire_name(&self) -> Option<&str> {
        self.wire_name.get().map(|name| &**name)
    }

    /// The single wire of function ropes.
    pub fn function_wire(&self) -> Option<&W> {
        self.function_wire.as_deref().map(WireObject::wire)
    }

    fn slot_name(&self, owner: &Value, class: &ClassRef) -> Arc<str> {
        if let Some(name) = self.wire_name.get() {
            return name.clone();
        }
        let member = self.callable.name();
        let member = member.as_deref().unwrap_or("<anonymous>");
        if owner.is(&Value::class(class)) {
            Arc::from(format!("__wire_{}_{}", member, class.name()))
        } else {
            Arc::from(format!("__wire_{}", member))
        }
    }

    /// Look up or build the wire for a retrieval through `(instance?, class)`.
    ///
    /// Function ropes return their single wire.
    pub fn wire_for(
        &self,
        instance: Option<&Value>,
        class: &ClassRef,
    ) -> WireResult<Arc<WireObject<W>>> {
        if let Some(wire) = &self.function_wire {
            return Ok(wire.clone());
        }

        let accessor = self.callable.wrapped_object();
        let binding = self.shared.registry.bind(accessor, instance, class)?;
        let owner = binding.owner_or(instance, class);
        let slot = WireSlot::new(self.id, self.slot_name(&owner, class));

        let build = || -> WireResult<Arc<WireObject<W>>> {
            trace!(slot = slot.name(), owner = owner.type_name(), "building wire");
            let core = WireCore::bound(
                self.callable.clone(),
                &owner,
                &binding,
                instance,
                class,
                self.shared.config.wraps,
            )?;
            Ok(Arc::new(WireObject::new(W::new(core, &self.shared.args)?)))
        };

        let wire = self.shared.table.get_or_try_init(&owner, &slot, &build)?;
        if !wire.core().is_stale() {
            return Ok(wire);
        }
        debug!(slot = slot.name(), "rebinding wire whose instance was released");
        self.shared
            .table
            .evict_slot_if(&owner, &slot, |wire| wire.core().is_stale());
        self.shared.table.get_or_try_init(&owner, &slot, &build)
    }

    /// Retrieve through `(instance?, class)`.
    ///
    /// Member ropes return the wire, property ropes the forced value and
    /// function ropes themselves.
    pub fn get(&self, this: &ObjectRef, instance: Option<&Value>, class: &ClassRef) -> WireResult<Value> {
        match self.kind {
            RopeKind::Member => {
                let wire: ObjectRef = self.wire_for(instance, class)?;
                Ok(Value::Object(wire))
            }
            RopeKind::Property => {
                let wire = self.wire_for(instance, class)?;
                wire.core().on_property().map_err(WireError::from)
            }
            RopeKind::Function | RopeKind::CallableFunction => Ok(Value::Object(this.clone())),
        }
    }

    fn own_attr(&self, name: &str) -> Option<Value> {
        if !self.shared.config.wraps {
            return None;
        }
        match name {
            "__wrapped__" => Some(self.callable.wrapped_callable().clone()),
            _ => WireMetadata::of(&self.callable).getattr(name),
        }
    }
}

impl<W: Wire, S: RopeState> PyObject for Rope<W, S> {
    fn type_name(&self) -> &str {
        "rope"
    }

    fn getattr(&self, name: &str) -> Option<Value> {
        self.state
            .getattr(name)
            .or_else(|| self.own_attr(name))
            .or_else(|| self.function_wire.as_ref()?.getattr(name))
    }

    fn dir(&self) -> Vec<Arc<str>> {
        let mut names = Vec::new();
        if self.shared.config.wraps {
            names.extend(
                ["__doc__", "__name__", "__qualname__", "__wrapped__"]
                    .into_iter()
                    .map(Arc::from),
            );
        }
        if let Some(wire) = &self.function_wire {
            names.extend(wire.dir());
        }
        names.sort();
        names.dedup();
        names
    }

    fn is_callable(&self) -> bool {
        self.kind == RopeKind::CallableFunction
    }

    fn call(&self, args: &[Value]) -> RuntimeResult<Value> {
        match (&self.function_wire, self.kind) {
            (Some(wire), RopeKind::CallableFunction) => wire.call(args),
            _ => Err(RuntimeError::not_callable(self.type_name())),
        }
    }

    fn as_descriptor(&self) -> Option<&dyn Descriptor> {
        if self.kind.is_owned() { Some(self) } else { None }
    }
}

impl<W: Wire, S: RopeState> Descriptor for Rope<W, S> {
    fn descr_get(
        &self,
        this: &ObjectRef,
        instance: Option<&Value>,
        owner: &ClassRef,
    ) -> RuntimeResult<Value> {
        Ok(self.get(this, instance, owner)?)
    }

    fn set_name(&self, owner: &PyClassObject, name: &str) {
        let wire_name: Arc<str> = Arc::from(format!("__wire|{}|{}", owner.name(), name));
        if self.wire_name.set(wire_name).is_err() {
            debug!(
                owner = owner.name(),
                name,
                "rope already installed; keeping its first slot name"
            );
        }
    }
}

impl<W: Wire, S: RopeState> std::fmt::Debug for Rope<W, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rope")
            .field("kind", &self.kind)
            .field("callable", &self.callable)
            .field("wire_name", &self.wire_name.get())
            .finish()
    }
}
