//! Runtime errors raised by the object protocol.

use std::sync::Arc;
use thiserror::Error;

/// Errors raised while calling, binding or looking up attributes on objects.
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    /// Object does not support the call protocol.
    #[error("'{type_name}' object is not callable")]
    NotCallable { type_name: String },

    /// Attribute lookup failed.
    #[error("'{type_name}' object has no attribute '{name}'")]
    AttributeError { type_name: String, name: String },

    /// Wrong argument count or argument type.
    #[error("TypeError: {0}")]
    TypeError(String),

    /// C3 linearization failed for the given bases.
    #[error("cannot create a consistent method resolution order (MRO) for bases {bases}")]
    MroConflict { bases: String },

    /// Error raised by a layer built on top of the runtime.
    #[error(transparent)]
    External(Arc<dyn std::error::Error + Send + Sync>),
}

impl RuntimeError {
    /// Wrap an error from a higher layer so it can travel through the object protocol.
    pub fn external<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::External(Arc::new(error))
    }

    /// Build an `AttributeError`.
    pub fn attribute(type_name: &str, name: &str) -> Self {
        Self::AttributeError {
            type_name: type_name.to_owned(),
            name: name.to_owned(),
        }
    }

    /// Build a `NotCallable` error.
    pub fn not_callable(type_name: &str) -> Self {
        Self::NotCallable {
            type_name: type_name.to_owned(),
        }
    }
}

/// Result type for object protocol operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
