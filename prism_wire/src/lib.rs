//! Universal per-owner wiring of callable class members.
//!
//! A [`WireRope`] wraps a function, method, `classmethod`, `staticmethod`,
//! `property` or any custom descriptor and installs a [`Rope`] in its place.
//! Retrieving the rope hands out one cached [`Wire`] per owner, whatever the
//! accessor's binding shape, so decorators such as memoizers can attach
//! per-instance or per-class state without caring how the member binds.
//!
//! This crate provides:
//! - Accessor classification ([`Callable`], [`AccessorKind`])
//! - Binding rules with per-type memoization ([`BindingRegistry`])
//! - The four rope strategies ([`RopeKind`])
//! - Wires and their shared core ([`Wire`], [`WireCore`])
//! - A weak owner side table ([`WireTable`])

pub mod binding;
pub mod callable;
pub mod config;
pub mod error;
pub mod probe;
pub mod rope;
pub mod table;
pub mod wire;

// Re-export commonly used items
pub use binding::{Binder, Binding, BindingRegistry, BindingRule, DelegateTarget};
pub use callable::{AccessorKind, AccessorType, Callable, CallableFlags, DescriptorInfo};
pub use config::{BindingConfig, RopeConfig};
pub use error::{ConfigurationError, WireError, WireResult};
pub use rope::{Rope, RopeKind, RopeState, WireRope};
pub use table::{WireSlot, WireTable};
pub use wire::{Wire, WireCore, WireMetadata, WireObject};
