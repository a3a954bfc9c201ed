//! Wiring errors.
//!
//! Every failure the wiring layer raises on its own is a
//! [`ConfigurationError`]: a malformed accessor, an accessor whose binding
//! cannot be determined, or a binding that yields nothing callable. They
//! surface at decoration time or on first access and are never retried; the
//! fix is on the caller's side (correct the accessor or register a rule).

use prism_runtime::RuntimeError;
use thiserror::Error;

/// Misconfigured accessor or binding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// Probing a rebuilt accessor found no attribute holding the wrapped callable.
    #[error(
        "accessor '{accessor}' doesn't hold the given function as an attribute; \
         is it a correct descriptor?"
    )]
    MissingFunctionAttribute { accessor: String },

    /// The accessor cannot be rebuilt around a probe value.
    #[error("accessor '{accessor}' cannot be rebuilt around a probe value")]
    UnprobeableAccessor { accessor: String },

    /// No binding rule is declared or registered and detection failed or is disabled.
    #[error(
        "failed to auto-detect the binding rule of accessor '{accessor}'; \
         register one with BindingRegistry::register"
    )]
    UndetectableBinding { accessor: String },

    /// The value to wrap is neither callable nor a descriptor.
    #[error("'{type_name}' object cannot be wired: it is neither callable nor a descriptor")]
    NotCallable { type_name: String },

    /// The accessor retrieved against its owner produced a non-callable.
    #[error("accessor '{accessor}' bound to its owner produced a non-callable '{type_name}'")]
    UncallableBinding { accessor: String, type_name: String },

    /// The resolved owner cannot host wires.
    #[error("'{type_name}' value cannot own wires")]
    InvalidOwner { type_name: String },
}

/// Errors raised by the wiring layer.
#[derive(Debug, Clone, Error)]
pub enum WireError {
    /// Misconfigured accessor or binding.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Error raised by the object protocol or by user code.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// The owner a wire was bound to no longer exists.
    #[error("owner of wired member '{member}' has been released")]
    OwnerReleased { member: String },
}

impl WireError {
    /// Check for a configuration error.
    #[inline]
    pub fn is_configuration(&self) -> bool {
        matches!(self, WireError::Configuration(_))
    }
}

impl From<WireError> for RuntimeError {
    fn from(error: WireError) -> Self {
        match error {
            WireError::Runtime(inner) => inner,
            other => RuntimeError::external(other),
        }
    }
}

/// Result type for wiring operations.
pub type WireResult<T> = Result<T, WireError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_messages_name_the_accessor() {
        let err = ConfigurationError::UndetectableBinding {
            accessor: "weird".to_owned(),
        };
        assert!(err.to_string().contains("'weird'"));
        assert!(err.to_string().contains("BindingRegistry::register"));
    }

    #[test]
    fn test_runtime_errors_unwrap_on_conversion() {
        let original = RuntimeError::not_callable("int");
        let wire: WireError = original.into();
        let back: RuntimeError = wire.into();
        assert!(matches!(back, RuntimeError::NotCallable { .. }));
    }

    #[test]
    fn test_configuration_errors_travel_as_external() {
        let wire: WireError = ConfigurationError::InvalidOwner {
            type_name: "int".to_owned(),
        }
        .into();
        assert!(wire.is_configuration());
        let runtime: RuntimeError = wire.into();
        assert!(matches!(runtime, RuntimeError::External(_)));
        assert!(runtime.to_string().contains("cannot own wires"));
    }
}
