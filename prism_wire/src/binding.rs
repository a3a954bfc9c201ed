//! Binding rules.
//!
//! A [`BindingRule`] maps an accessor retrieval `(accessor, instance?, type)`
//! to a [`Binding`]: the owner a wire is cached under and the implicit first
//! argument. The rule is a property of the accessor's *type*, so the
//! [`BindingRegistry`] resolves it once per `(type, has_instance)` and reuses
//! it.
//!
//! Resolution order:
//! 1. An override registered for the exact accessor type.
//! 2. The binding the accessor declares through [`Descriptor::binding`].
//! 3. A previously detected rule.
//! 4. Detection by experiment (unless disabled by [`BindingConfig`]).

use crate::callable::AccessorType;
use crate::config::BindingConfig;
use crate::error::{ConfigurationError, WireResult};
use crate::probe;
use dashmap::DashMap;
use parking_lot::RwLock;
use prism_runtime::{
    ClassRef, DeclaredBinding, Descriptor, FunctionObject, ObjectRef, PyObject, Value,
    concrete_type_id,
};
use rustc_hash::FxHashMap;
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

// =============================================================================
// Binding
// =============================================================================

/// Outcome of applying a rule to one retrieval.
#[derive(Debug, Clone, Default)]
pub struct Binding {
    /// Object the wire is cached under. `None` falls back to the instance,
    /// then the type.
    pub owner: Option<Value>,
    /// Implicit first argument, if any.
    pub bound: Option<Value>,
}

impl Binding {
    /// The effective owner for a retrieval.
    pub fn owner_or(&self, instance: Option<&Value>, class: &ClassRef) -> Value {
        match (&self.owner, instance) {
            (Some(owner), _) => owner.clone(),
            (None, Some(instance)) => instance.clone(),
            (None, None) => Value::class(class),
        }
    }
}

/// Custom binder function.
pub type Binder = Arc<dyn Fn(&Value, Option<&Value>, &ClassRef) -> Binding + Send + Sync>;

/// Which reagent a delegated rule resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DelegateTarget {
    /// The retrieved callable produced the instance.
    Instance,
    /// The retrieved callable produced the type.
    Type,
}

// =============================================================================
// Binding Rule
// =============================================================================

/// How an accessor type binds.
#[derive(Clone)]
pub enum BindingRule {
    /// No implicit argument; wires are cached on the type.
    NameOnly,
    /// The instance is both owner and first argument.
    InstanceBound,
    /// The type is both owner and first argument.
    TypeBound,
    /// Retrieval yields a callable that in turn produces the owner.
    Delegated(DelegateTarget),
    /// Explicitly registered binder.
    Custom(Binder),
}

impl BindingRule {
    /// Apply the rule to one retrieval.
    pub fn apply(&self, accessor: &Value, instance: Option<&Value>, class: &ClassRef) -> Binding {
        match self {
            BindingRule::NameOnly => Binding {
                owner: Some(Value::class(class)),
                bound: None,
            },
            BindingRule::InstanceBound | BindingRule::Delegated(DelegateTarget::Instance) => {
                Binding {
                    owner: instance.cloned(),
                    bound: instance.cloned(),
                }
            }
            BindingRule::TypeBound | BindingRule::Delegated(DelegateTarget::Type) => {
                let class = Value::class(class);
                Binding {
                    owner: Some(class.clone()),
                    bound: Some(class),
                }
            }
            BindingRule::Custom(binder) => binder(accessor, instance, class),
        }
    }

    /// Short name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            BindingRule::NameOnly => "name-only",
            BindingRule::InstanceBound => "instance-bound",
            BindingRule::TypeBound => "type-bound",
            BindingRule::Delegated(DelegateTarget::Instance) => "delegated instance-bound",
            BindingRule::Delegated(DelegateTarget::Type) => "delegated type-bound",
            BindingRule::Custom(_) => "custom",
        }
    }
}

impl From<DeclaredBinding> for BindingRule {
    fn from(declared: DeclaredBinding) -> Self {
        match declared {
            DeclaredBinding::Unbound => BindingRule::NameOnly,
            DeclaredBinding::Instance => BindingRule::InstanceBound,
            DeclaredBinding::Owner => BindingRule::TypeBound,
        }
    }
}

impl PartialEq for BindingRule {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (BindingRule::NameOnly, BindingRule::NameOnly)
            | (BindingRule::InstanceBound, BindingRule::InstanceBound)
            | (BindingRule::TypeBound, BindingRule::TypeBound) => true,
            (BindingRule::Delegated(a), BindingRule::Delegated(b)) => a == b,
            (BindingRule::Custom(a), BindingRule::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for BindingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingRule::Delegated(target) => f.debug_tuple("Delegated").field(target).finish(),
            other => f.write_str(match other {
                BindingRule::NameOnly => "NameOnly",
                BindingRule::InstanceBound => "InstanceBound",
                BindingRule::TypeBound => "TypeBound",
                _ => "Custom",
            }),
        }
    }
}

// =============================================================================
// Binding Registry
// =============================================================================

/// Resolves and memoizes binding rules per accessor type.
///
/// Created by the application and shared by the ropes built from it. Safe
/// to use from many threads; concurrent first resolutions of the same type
/// may detect redundantly but always agree.
pub struct BindingRegistry {
    /// Rules registered by the application, keyed by exact type.
    overrides: RwLock<FxHashMap<TypeId, BindingRule>>,
    /// Detected rules per `(type, has_instance)`.
    detected: DashMap<(TypeId, bool), BindingRule>,
    /// Configuration.
    config: BindingConfig,
    /// Number of detections performed.
    detections: AtomicU64,
}

impl BindingRegistry {
    /// Create a registry with default configuration.
    pub fn new() -> Self {
        Self::with_config(BindingConfig::default())
    }

    /// Create a registry with custom configuration.
    pub fn with_config(config: BindingConfig) -> Self {
        Self {
            overrides: RwLock::new(FxHashMap::default()),
            detected: DashMap::new(),
            config,
            detections: AtomicU64::new(0),
        }
    }

    /// Get the configuration.
    #[inline]
    pub fn config(&self) -> &BindingConfig {
        &self.config
    }

    /// Register a rule for accessor type `T`, bypassing detection.
    pub fn register<T: PyObject>(&self, rule: BindingRule) {
        self.register_type(&AccessorType::of_type::<T>(), rule);
    }

    /// Register a rule for an accessor type.
    pub fn register_type(&self, accessor: &AccessorType, rule: BindingRule) {
        debug!(accessor = accessor.name(), rule = rule.name(), "registered binding rule");
        self.overrides.write().insert(accessor.id(), rule);
    }

    /// Register a binder function for accessor type `T`.
    pub fn register_binder<T, F>(&self, binder: F)
    where
        T: PyObject,
        F: Fn(&Value, Option<&Value>, &ClassRef) -> Binding + Send + Sync + 'static,
    {
        self.register::<T>(BindingRule::Custom(Arc::new(binder)));
    }

    /// Remove the override for an accessor type.
    pub fn unregister_type(&self, accessor: &AccessorType) -> Option<BindingRule> {
        self.overrides.write().remove(&accessor.id())
    }

    /// Number of detections performed so far.
    #[inline]
    pub fn detections(&self) -> u64 {
        self.detections.load(Ordering::Relaxed)
    }

    /// Resolve the rule for `accessor` retrieved with or without an instance.
    pub fn rule_for(&self, accessor: &Value, has_instance: bool) -> WireResult<BindingRule> {
        let obj = accessor
            .as_object()
            .ok_or_else(|| ConfigurationError::NotCallable {
                type_name: accessor.type_name().to_owned(),
            })?;
        let type_id = concrete_type_id(&**obj);

        if let Some(rule) = self.overrides.read().get(&type_id) {
            return Ok(rule.clone());
        }

        let Some(descriptor) = obj.as_descriptor() else {
            return Ok(BindingRule::NameOnly);
        };
        if let Some(declared) = descriptor.binding(has_instance) {
            return Ok(declared.into());
        }

        let key = (type_id, has_instance);
        if let Some(rule) = self.detected.get(&key) {
            return Ok(rule.clone());
        }

        if !self.config.auto_detect {
            return Err(ConfigurationError::UndetectableBinding {
                accessor: obj.type_name().to_owned(),
            }
            .into());
        }

        let rule = Self::detect(obj, descriptor, has_instance)?;
        self.detections.fetch_add(1, Ordering::Relaxed);
        debug!(
            accessor = obj.type_name(),
            has_instance,
            rule = rule.name(),
            "detected binding rule"
        );
        Ok(self.detected.entry(key).or_insert(rule).clone())
    }

    /// Resolve the rule and apply it.
    pub fn bind(
        &self,
        accessor: &Value,
        instance: Option<&Value>,
        class: &ClassRef,
    ) -> WireResult<Binding> {
        let rule = self.rule_for(accessor, instance.is_some())?;
        Ok(rule.apply(accessor, instance, class))
    }

    /// Rebuild the accessor around the marker, retrieve it against the
    /// reagent and classify what comes back.
    fn detect(
        obj: &ObjectRef,
        descriptor: &dyn Descriptor,
        has_instance: bool,
    ) -> WireResult<BindingRule> {
        let undetectable = || ConfigurationError::UndetectableBinding {
            accessor: obj.type_name().to_owned(),
        };
        let shadow = descriptor
            .rebuild(probe::marker().clone())
            .ok_or_else(undetectable)?;
        let shadow_descriptor = shadow.as_descriptor().ok_or_else(undetectable)?;

        let instance = has_instance.then(probe::reagent_instance);
        let class = probe::reagent_class();
        let class_value = Value::class(class);
        let reagent = |value: &Value| {
            if instance.is_some_and(|instance| value.is(instance)) {
                Some(DelegateTarget::Instance)
            } else if value.is(&class_value) {
                Some(DelegateTarget::Type)
            } else {
                None
            }
        };

        let method = shadow_descriptor.descr_get(&shadow, instance, class)?;
        if method.downcast_ref::<FunctionObject>().is_some() {
            return Ok(BindingRule::NameOnly);
        }
        match reagent(&method) {
            Some(DelegateTarget::Instance) => return Ok(BindingRule::InstanceBound),
            Some(DelegateTarget::Type) => return Ok(BindingRule::TypeBound),
            None => {}
        }
        if method.is_callable() {
            let produced = method.call(&[]).ok();
            return produced
                .as_ref()
                .and_then(reagent)
                .map(BindingRule::Delegated)
                .ok_or_else(|| undetectable().into());
        }
        if method.is(&Value::Object(shadow.clone())) {
            return Ok(BindingRule::NameOnly);
        }
        Err(undetectable().into())
    }
}

impl Default for BindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BindingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingRegistry")
            .field("overrides", &self.overrides.read().len())
            .field("detected", &self.detected.len())
            .field("config", &self.config)
            .finish()
    }
}
