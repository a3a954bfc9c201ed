//! Wiring configuration.
//!
//! Plain structs with `Default` and a few named presets.

/// Configuration for a [`WireRope`](crate::rope::WireRope).
///
/// # Example
///
/// ```ignore
/// use prism_wire::RopeConfig;
///
/// // Copy names and docstrings onto ropes and wires
/// let config = RopeConfig {
///     wraps: true,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RopeConfig {
    /// Copy `__name__`, `__qualname__` and `__doc__` from the wrapped
    /// callable onto each rope and wire.
    ///
    /// Default: false
    pub wraps: bool,

    /// Number of tracked owners at which the wire table first sweeps
    /// entries whose owner has been released.
    ///
    /// The threshold doubles relative to the surviving owner count after
    /// every sweep.
    ///
    /// Default: 64
    pub sweep_threshold: usize,
}

impl Default for RopeConfig {
    fn default() -> Self {
        Self {
            wraps: false,
            sweep_threshold: 64,
        }
    }
}

impl RopeConfig {
    /// Configuration that preserves the wrapped callable's metadata.
    pub fn preserving() -> Self {
        Self {
            wraps: true,
            ..Default::default()
        }
    }
}

/// Configuration for a [`BindingRegistry`](crate::binding::BindingRegistry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingConfig {
    /// Probe accessors that neither declare a binding nor have a registered
    /// rule. When disabled such accessors fail with a configuration error.
    ///
    /// Default: true
    pub auto_detect: bool,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self { auto_detect: true }
    }
}

impl BindingConfig {
    /// Only declared or registered rules are accepted.
    pub fn strict() -> Self {
        Self { auto_detect: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let rope = RopeConfig::default();
        assert!(!rope.wraps);
        assert_eq!(rope.sweep_threshold, 64);
        assert!(BindingConfig::default().auto_detect);
    }

    #[test]
    fn test_presets() {
        assert!(RopeConfig::preserving().wraps);
        assert!(!BindingConfig::strict().auto_detect);
    }
}
