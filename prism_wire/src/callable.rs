//! Accessor classification.
//!
//! [`Callable`] inspects the value handed to a decorator once and records
//! what kind of accessor it is. Detection runs in a fixed order and the
//! first match wins:
//!
//! 1. **Bound method**: retrieving the accessor against a probe instance
//!    yields an object of the accessor's own type.
//! 2. **Descriptor**: any other descriptor (plain functions excluded) is
//!    rebuilt around an indicator to find the attribute storing the wrapped
//!    callable.
//! 3. **Property**: a rebuilt descriptor retrieved against the reagent hands
//!    back the reagent itself.
//! 4. **Heuristics**: qualified names tell bare functions from class
//!    members; first parameter names `self` / `cls` tell member methods from
//!    class methods.
//!
//! The outcome is a closed [`AccessorKind`] plus a set of [`CallableFlags`],
//! both fixed at construction.

use crate::error::{ConfigurationError, WireResult};
use crate::probe;
use bitflags::bitflags;
use once_cell::sync::OnceCell;
use prism_runtime::{
    ClassMethod, Descriptor, FunctionObject, ObjectRef, Parameter, Property, PyObject, Signature,
    StaticMethod, Value, concrete_type_id, signature,
};
use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::debug;

// =============================================================================
// Accessor Kind
// =============================================================================

/// Binding shape of a wrapped accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessorKind {
    /// Module-level or nested function; no owner to key on.
    BareFunction,
    /// Method already bound to its receiver.
    BoundMethod,
    /// Plain function defined in a class body.
    InstanceMethod,
    /// `classmethod` or a descriptor wrapping a `cls` function.
    ClassMethod,
    /// `staticmethod`.
    StaticMethod,
    /// `property` or a descriptor behaving like one.
    Property,
    /// Any other descriptor; its binding is resolved per access.
    CustomBound,
}

impl AccessorKind {
    /// Short lowercase name for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            AccessorKind::BareFunction => "bare function",
            AccessorKind::BoundMethod => "bound method",
            AccessorKind::InstanceMethod => "instance method",
            AccessorKind::ClassMethod => "class method",
            AccessorKind::StaticMethod => "static method",
            AccessorKind::Property => "property",
            AccessorKind::CustomBound => "custom descriptor",
        }
    }

    /// Whether wires for this kind are cached per owner.
    #[inline]
    pub fn needs_owner(self) -> bool {
        !matches!(self, AccessorKind::BareFunction | AccessorKind::BoundMethod)
    }
}

bitflags! {
    /// Classification facts about a wrapped accessor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CallableFlags: u16 {
        /// The accessor is a plain function object.
        const FUNCTION_TYPE = 1 << 0;
        /// The accessor is a builtin `property`.
        const BUILTIN_PROPERTY = 1 << 1;
        /// The accessor is already bound.
        const BOUND_METHOD = 1 << 2;
        /// The accessor implements the descriptor protocol (functions and
        /// bound methods excluded).
        const DESCRIPTOR = 1 << 3;
        /// Retrieval through an instance yields a value, not a callable.
        const PROPERTY = 1 << 4;
        /// Defined outside any class body.
        const BARE_FUNCTION = 1 << 5;
        /// Takes the instance as first argument.
        const MEMBER = 1 << 6;
        /// Member that is neither bound nor property-like.
        const MEMBER_METHOD = 1 << 7;
        /// Takes the owning class as first argument.
        const CLASS_METHOD = 1 << 8;
    }
}

// =============================================================================
// Accessor Type
// =============================================================================

/// Exact concrete type of an accessor, used as a registry key.
///
/// Equality and hashing use the type identity only; the name is carried for
/// diagnostics.
#[derive(Clone)]
pub struct AccessorType {
    id: TypeId,
    name: Arc<str>,
}

impl AccessorType {
    /// Type of a live accessor object.
    pub fn of(obj: &dyn PyObject) -> Self {
        Self {
            id: concrete_type_id(obj),
            name: Arc::from(obj.type_name()),
        }
    }

    /// Type of a statically known accessor.
    pub fn of_type<T: PyObject>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: Arc::from(std::any::type_name::<T>()),
        }
    }

    /// Type identity.
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Type name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for AccessorType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AccessorType {}

impl Hash for AccessorType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for AccessorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessorType({})", self.name)
    }
}

// =============================================================================
// Descriptor Probing
// =============================================================================

/// What probing learned about a descriptor accessor.
#[derive(Debug, Clone)]
pub struct DescriptorInfo {
    accessor_type: AccessorType,
    function_attr: Arc<str>,
}

impl DescriptorInfo {
    /// Rebuild the accessor around an indicator and find the attribute
    /// that holds it.
    fn detect(obj: &ObjectRef, descriptor: &dyn Descriptor) -> WireResult<Self> {
        let accessor_type = AccessorType::of(&**obj);
        let indicator = probe::indicator();
        let shadow = descriptor.rebuild(indicator.clone()).ok_or_else(|| {
            ConfigurationError::UnprobeableAccessor {
                accessor: accessor_type.name().to_owned(),
            }
        })?;

        let function_attr = shadow
            .dir()
            .into_iter()
            .find(|name| shadow.getattr(name).is_some_and(|attr| attr.is(&indicator)))
            .ok_or_else(|| ConfigurationError::MissingFunctionAttribute {
                accessor: accessor_type.name().to_owned(),
            })?;

        Ok(Self {
            accessor_type,
            function_attr,
        })
    }

    /// Retrieve the accessor type rebuilt around the marker against the
    /// reagent; a property hands back the reagent itself.
    fn detect_property(descriptor: &dyn Descriptor) -> WireResult<bool> {
        let Some(shadow) = descriptor.rebuild(probe::marker().clone()) else {
            return Ok(false);
        };
        let Some(shadow_descriptor) = shadow.as_descriptor() else {
            return Ok(false);
        };

        let instance = probe::reagent_instance();
        let class = probe::reagent_class();
        let retrieved = shadow_descriptor.descr_get(&shadow, Some(instance), class)?;
        Ok(retrieved.is(instance) || retrieved.is(&Value::class(class)))
    }

    /// The accessor's concrete type.
    #[inline]
    pub fn accessor_type(&self) -> &AccessorType {
        &self.accessor_type
    }

    /// Name of the attribute holding the wrapped callable.
    #[inline]
    pub fn function_attr(&self) -> &str {
        &self.function_attr
    }
}

/// Retrieve the accessor against the reagent and compare result types.
fn detect_bound_method(obj: &ObjectRef, descriptor: &dyn Descriptor) -> WireResult<bool> {
    let retrieved = descriptor.descr_get(
        obj,
        Some(probe::reagent_instance()),
        probe::reagent_class(),
    )?;
    Ok(retrieved
        .as_object()
        .is_some_and(|new_bound| concrete_type_id(&**new_bound) == concrete_type_id(&**obj)))
}

// =============================================================================
// Callable
// =============================================================================

/// A wrapped accessor together with its classification.
///
/// Built once at decoration time; the classification is immutable
/// afterwards. The parameter list is introspected lazily and cached.
pub struct Callable {
    /// The value handed to the decorator.
    wrapped_object: Value,
    /// The raw callable the accessor delegates to.
    wrapped_callable: Value,
    /// Probing results, for descriptor accessors.
    descriptor: Option<DescriptorInfo>,
    /// Classification facts.
    flags: CallableFlags,
    /// Closed classification.
    kind: AccessorKind,
    /// Declared parameters of `wrapped_callable`.
    signature: OnceCell<Option<Signature>>,
}

impl Callable {
    /// Classify `wrapped_object`.
    ///
    /// Fails with a configuration error for values that are neither callable
    /// nor descriptors, and for descriptors whose wrapped callable cannot be
    /// located.
    pub fn new(wrapped_object: Value) -> WireResult<Self> {
        let not_wireable = || ConfigurationError::NotCallable {
            type_name: wrapped_object.type_name().to_owned(),
        };
        let obj = wrapped_object.as_object().cloned().ok_or_else(not_wireable)?;
        let descriptor = obj.as_descriptor();
        if descriptor.is_none() && !obj.is_callable() {
            return Err(not_wireable().into());
        }

        let mut flags = CallableFlags::empty();
        if wrapped_object.downcast_ref::<FunctionObject>().is_some() {
            flags |= CallableFlags::FUNCTION_TYPE;
        }
        if wrapped_object.downcast_ref::<Property>().is_some() {
            flags |= CallableFlags::BUILTIN_PROPERTY;
        }

        if let Some(descriptor) = descriptor {
            let plain = flags.intersects(CallableFlags::FUNCTION_TYPE | CallableFlags::BUILTIN_PROPERTY);
            if !plain && detect_bound_method(&obj, descriptor)? {
                flags |= CallableFlags::BOUND_METHOD;
            }
        }

        let mut info = None;
        let mut wrapped_callable = wrapped_object.clone();
        if let Some(descriptor) = descriptor {
            if !flags.intersects(CallableFlags::FUNCTION_TYPE | CallableFlags::BOUND_METHOD) {
                flags |= CallableFlags::DESCRIPTOR;
                let detected = DescriptorInfo::detect(&obj, descriptor)?;
                wrapped_callable = obj.getattr(detected.function_attr()).ok_or_else(|| {
                    ConfigurationError::MissingFunctionAttribute {
                        accessor: detected.accessor_type().name().to_owned(),
                    }
                })?;
                info = Some(detected);
            }
        }

        if flags.contains(CallableFlags::BUILTIN_PROPERTY) {
            flags |= CallableFlags::PROPERTY;
        } else if let Some(descriptor) = descriptor.filter(|_| info.is_some()) {
            if DescriptorInfo::detect_property(descriptor)? {
                flags |= CallableFlags::PROPERTY;
            }
        }

        let mut callable = Self {
            wrapped_object,
            wrapped_callable,
            descriptor: info,
            flags,
            kind: AccessorKind::BareFunction,
            signature: OnceCell::new(),
        };
        callable.flags |= callable.classify_members(descriptor.is_none());
        callable.kind = callable.classify_kind();

        debug!(
            accessor = callable.wrapped_object.type_name(),
            name = callable.name().as_deref().unwrap_or("<anonymous>"),
            kind = callable.kind.name(),
            "classified accessor"
        );
        Ok(callable)
    }

    /// Name and first-parameter heuristics.
    fn classify_members(&self, plain_callable: bool) -> CallableFlags {
        let mut flags = CallableFlags::empty();
        let is_descriptor = self.flags.contains(CallableFlags::DESCRIPTOR);
        let first = self.first_parameter().map(|p| p.name.clone());
        let first_is = |expected: &str| first.as_deref() == Some(expected);

        // Callable objects outside the descriptor protocol never bind.
        let bare = plain_callable || self.has_bare_qualname();
        if bare {
            flags |= CallableFlags::BARE_FUNCTION;
        }

        let member = !bare && (!is_descriptor || first_is("self"));
        if member {
            flags |= CallableFlags::MEMBER;
        }
        if member && !self.flags.intersects(CallableFlags::BOUND_METHOD | CallableFlags::PROPERTY) {
            flags |= CallableFlags::MEMBER_METHOD;
        }

        let classmethod = self.wrapped_object.downcast_ref::<ClassMethod>().is_some()
            || (!bare && is_descriptor && first_is("cls"));
        if classmethod {
            flags |= CallableFlags::CLASS_METHOD;
        }
        flags
    }

    /// A qualified name whose last `<locals>.` segment equals the plain name.
    fn has_bare_qualname(&self) -> bool {
        match (self.qualname(), self.name()) {
            (Some(qualname), Some(name)) => {
                qualname.rsplit("<locals>.").next() == Some(&*name)
            }
            _ => true,
        }
    }

    fn classify_kind(&self) -> AccessorKind {
        let flags = self.flags;
        if flags.contains(CallableFlags::BOUND_METHOD) {
            AccessorKind::BoundMethod
        } else if flags.contains(CallableFlags::BARE_FUNCTION) {
            AccessorKind::BareFunction
        } else if flags.contains(CallableFlags::PROPERTY) {
            AccessorKind::Property
        } else if flags.contains(CallableFlags::CLASS_METHOD) {
            AccessorKind::ClassMethod
        } else if !flags.contains(CallableFlags::DESCRIPTOR) {
            AccessorKind::InstanceMethod
        } else if self.wrapped_object.downcast_ref::<StaticMethod>().is_some() {
            AccessorKind::StaticMethod
        } else {
            AccessorKind::CustomBound
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The value handed to the decorator.
    #[inline]
    pub fn wrapped_object(&self) -> &Value {
        &self.wrapped_object
    }

    /// The raw callable the accessor delegates to.
    #[inline]
    pub fn wrapped_callable(&self) -> &Value {
        &self.wrapped_callable
    }

    /// Probing results for descriptor accessors.
    #[inline]
    pub fn descriptor(&self) -> Option<&DescriptorInfo> {
        self.descriptor.as_ref()
    }

    /// Classification facts.
    #[inline]
    pub fn flags(&self) -> CallableFlags {
        self.flags
    }

    /// Closed classification.
    #[inline]
    pub fn kind(&self) -> AccessorKind {
        self.kind
    }

    /// Declared parameters of the wrapped callable.
    pub fn signature(&self) -> Option<&Signature> {
        self.signature
            .get_or_init(|| signature(&self.wrapped_callable))
            .as_ref()
    }

    /// Declared parameters, empty when the callable exposes no signature.
    pub fn parameters(&self) -> &[Parameter] {
        self.signature().map(Signature::parameters).unwrap_or(&[])
    }

    /// The first declared parameter.
    #[inline]
    pub fn first_parameter(&self) -> Option<&Parameter> {
        self.parameters().first()
    }

    /// `__name__` of the wrapped callable.
    pub fn name(&self) -> Option<Arc<str>> {
        self.callable_str_attr("__name__")
    }

    /// `__qualname__` of the wrapped callable.
    pub fn qualname(&self) -> Option<Arc<str>> {
        self.callable_str_attr("__qualname__")
    }

    /// `__doc__` of the wrapped callable.
    pub fn doc(&self) -> Option<Arc<str>> {
        self.callable_str_attr("__doc__")
    }

    fn callable_str_attr(&self, name: &str) -> Option<Arc<str>> {
        match self.wrapped_callable.as_object()?.getattr(name)? {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    // =========================================================================
    // Flags
    // =========================================================================

    /// The accessor is a plain function object.
    #[inline]
    pub fn is_function_type(&self) -> bool {
        self.flags.contains(CallableFlags::FUNCTION_TYPE)
    }

    /// The accessor is already bound.
    #[inline]
    pub fn is_boundmethod(&self) -> bool {
        self.flags.contains(CallableFlags::BOUND_METHOD)
    }

    /// The accessor implements the descriptor protocol.
    #[inline]
    pub fn is_descriptor(&self) -> bool {
        self.flags.contains(CallableFlags::DESCRIPTOR)
    }

    /// The accessor is a builtin `property`.
    #[inline]
    pub fn is_builtin_property(&self) -> bool {
        self.flags.contains(CallableFlags::BUILTIN_PROPERTY)
    }

    /// Retrieval through an instance yields a value.
    #[inline]
    pub fn is_property(&self) -> bool {
        self.flags.contains(CallableFlags::PROPERTY)
    }

    /// Defined outside any class body.
    #[inline]
    pub fn is_barefunction(&self) -> bool {
        self.flags.contains(CallableFlags::BARE_FUNCTION)
    }

    /// Takes the instance as first argument.
    ///
    /// Partially based on the first parameter name; may be wrong for
    /// unconventional spellings.
    #[inline]
    pub fn is_member(&self) -> bool {
        self.flags.contains(CallableFlags::MEMBER)
    }

    /// Member that is neither bound nor property-like.
    #[inline]
    pub fn is_membermethod(&self) -> bool {
        self.flags.contains(CallableFlags::MEMBER_METHOD)
    }

    /// Takes the owning class as first argument.
    ///
    /// Partially based on the first parameter name; may be wrong for
    /// unconventional spellings.
    #[inline]
    pub fn is_classmethod(&self) -> bool {
        self.flags.contains(CallableFlags::CLASS_METHOD)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("wrapped_object", &self.wrapped_object)
            .field("kind", &self.kind)
            .field("flags", &self.flags)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WireError;
    use prism_runtime::{BoundMethodObject, ClassRef, RuntimeResult};

    fn function(qualname: &str, params: &[&str]) -> Value {
        FunctionObject::new(qualname, params, |args| {
            Ok(args.first().cloned().unwrap_or(Value::None))
        })
        .into_value()
    }

    /// Descriptor that stores its callable under `function` and binds like a
    /// plain function.
    #[derive(Debug)]
    struct Traced {
        function: Value,
    }

    impl PyObject for Traced {
        fn type_name(&self) -> &str {
            "Traced"
        }

        fn getattr(&self, name: &str) -> Option<Value> {
            (name == "function").then(|| self.function.clone())
        }

        fn dir(&self) -> Vec<Arc<str>> {
            vec![Arc::from("function")]
        }

        fn as_descriptor(&self) -> Option<&dyn Descriptor> {
            Some(self)
        }
    }

    impl Descriptor for Traced {
        fn descr_get(
            &self,
            this: &ObjectRef,
            instance: Option<&Value>,
            _owner: &ClassRef,
        ) -> RuntimeResult<Value> {
            Ok(match instance {
                Some(instance) => {
                    Value::object(BoundMethodObject::new(self.function.clone(), instance.clone()))
                }
                None => Value::Object(this.clone()),
            })
        }

        fn rebuild(&self, inner: Value) -> Option<ObjectRef> {
            Some(Arc::new(Traced { function: inner }))
        }
    }

    /// Descriptor that hides its callable from `dir`.
    #[derive(Debug)]
    struct Secretive {
        hidden: Value,
    }

    impl PyObject for Secretive {
        fn type_name(&self) -> &str {
            "Secretive"
        }

        fn as_descriptor(&self) -> Option<&dyn Descriptor> {
            Some(self)
        }
    }

    impl Descriptor for Secretive {
        fn descr_get(
            &self,
            _this: &ObjectRef,
            _instance: Option<&Value>,
            _owner: &ClassRef,
        ) -> RuntimeResult<Value> {
            Ok(self.hidden.clone())
        }

        fn rebuild(&self, inner: Value) -> Option<ObjectRef> {
            Some(Arc::new(Secretive { hidden: inner }))
        }
    }

    /// Property-like descriptor outside the builtin `property` type.
    #[derive(Debug)]
    struct Lazy {
        fget: Value,
    }

    impl PyObject for Lazy {
        fn type_name(&self) -> &str {
            "Lazy"
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

    impl Descriptor for Lazy {
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

        fn rebuild(&self, inner: Value) -> Option<ObjectRef> {
            Some(Arc::new(Lazy { fget: inner }))
        }
    }

    #[test]
    fn test_bare_function() {
        let callable = Callable::new(function("add", &["a", "b"])).unwrap();
        assert_eq!(callable.kind(), AccessorKind::BareFunction);
        assert!(callable.is_function_type());
        assert!(callable.is_barefunction());
        assert!(!callable.is_member());
        assert!(!callable.is_classmethod());
        assert!(!callable.is_descriptor());
        assert!(callable.wrapped_callable().is(callable.wrapped_object()));
    }

    #[test]
    fn test_nested_function_is_bare() {
        let callable = Callable::new(function("outer.<locals>.inner", &["x"])).unwrap();
        assert!(callable.is_barefunction());
    }

    #[test]
    fn test_instance_method() {
        let callable = Callable::new(function("C.method", &["self", "x"])).unwrap();
        assert_eq!(callable.kind(), AccessorKind::InstanceMethod);
        assert!(callable.is_member());
        assert!(callable.is_membermethod());
        assert!(!callable.is_classmethod());
        assert_eq!(&*callable.first_parameter().unwrap().name, "self");
    }

    #[test]
    fn test_classmethod() {
        let cm = Value::object(ClassMethod::new(function("C.make", &["cls"])));
        let callable = Callable::new(cm).unwrap();
        assert_eq!(callable.kind(), AccessorKind::ClassMethod);
        assert!(callable.is_descriptor());
        assert!(callable.is_classmethod());
        assert!(!callable.is_member());
        assert_eq!(callable.descriptor().unwrap().function_attr(), "__func__");
        assert_eq!(callable.name().as_deref(), Some("make"));
    }

    #[test]
    fn test_staticmethod_is_neither_class_bound_nor_member() {
        let sm = Value::object(StaticMethod::new(function("C.helper", &["x", "y"])));
        let callable = Callable::new(sm).unwrap();
        assert_eq!(callable.kind(), AccessorKind::StaticMethod);
        assert!(!callable.is_classmethod());
        assert!(!callable.is_member());
        assert!(!callable.is_membermethod());
        assert!(!callable.is_property());
    }

    #[test]
    fn test_builtin_property() {
        let prop = Value::object(Property::new(function("C.size", &["self"])));
        let callable = Callable::new(prop).unwrap();
        assert_eq!(callable.kind(), AccessorKind::Property);
        assert!(callable.is_builtin_property());
        assert!(callable.is_property());
        assert!(callable.is_member());
        assert!(!callable.is_membermethod());
        assert_eq!(callable.descriptor().unwrap().function_attr(), "fget");
    }

    #[test]
    fn test_bound_method() {
        let class = prism_runtime::PyClassObject::new_simple("C");
        let instance = Value::object(prism_runtime::PyInstance::new(&class));
        let bound = Value::object(BoundMethodObject::new(
            function("C.method", &["self"]),
            instance,
        ));
        let callable = Callable::new(bound).unwrap();
        assert_eq!(callable.kind(), AccessorKind::BoundMethod);
        assert!(callable.is_boundmethod());
        assert!(!callable.is_descriptor());
        assert!(!callable.is_membermethod());
    }

    #[test]
    fn test_custom_descriptor() {
        let traced = Value::object(Traced {
            function: function("C.work", &["self"]),
        });
        let callable = Callable::new(traced).unwrap();
        assert_eq!(callable.kind(), AccessorKind::CustomBound);
        assert!(callable.is_descriptor());
        assert!(callable.is_membermethod());
        assert_eq!(callable.descriptor().unwrap().function_attr(), "function");
        assert_eq!(callable.descriptor().unwrap().accessor_type().name(), "Traced");
    }

    #[test]
    fn test_custom_property_like_descriptor() {
        let lazy = Value::object(Lazy {
            fget: function("C.size", &["self"]),
        });
        let callable = Callable::new(lazy).unwrap();
        assert_eq!(callable.kind(), AccessorKind::Property);
        assert!(callable.is_property());
        assert!(!callable.is_builtin_property());
        assert!(!callable.is_boundmethod());
        assert_eq!(callable.descriptor().unwrap().function_attr(), "fget");
        assert_eq!(callable.name().as_deref(), Some("size"));
    }

    #[test]
    fn test_custom_descriptor_with_cls_is_classmethod() {
        let traced = Value::object(Traced {
            function: function("C.build", &["cls"]),
        });
        let callable = Callable::new(traced).unwrap();
        assert_eq!(callable.kind(), AccessorKind::ClassMethod);
    }

    #[test]
    fn test_malformed_descriptor_is_rejected() {
        let secretive = Value::object(Secretive {
            hidden: function("C.work", &["self"]),
        });
        let err = Callable::new(secretive).unwrap_err();
        assert!(matches!(
            err,
            WireError::Configuration(ConfigurationError::MissingFunctionAttribute { .. })
        ));
    }

    #[test]
    fn test_non_callable_is_rejected() {
        let err = Callable::new(Value::int(3)).unwrap_err();
        assert!(matches!(
            err,
            WireError::Configuration(ConfigurationError::NotCallable { .. })
        ));
    }

    #[test]
    fn test_accessor_type_identity() {
        let a = Value::object(ClassMethod::new(function("C.a", &["cls"])));
        let b = Value::object(ClassMethod::new(function("C.b", &["cls"])));
        let ta = AccessorType::of(&**a.as_object().unwrap());
        let tb = AccessorType::of(&**b.as_object().unwrap());
        assert_eq!(ta, tb);
        assert_eq!(ta, AccessorType::of_type::<ClassMethod>());
        assert_ne!(ta, AccessorType::of_type::<StaticMethod>());
    }
}
