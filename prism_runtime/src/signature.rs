//! Parameter introspection.
//!
//! [`signature`] reports the declared inputs of a callable value as an
//! ordered list of `(name, kind)` pairs.

use crate::types::function::{BoundMethodObject, FunctionObject};
use crate::value::Value;
use smallvec::SmallVec;
use std::sync::Arc;

/// How an argument is bound to a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    /// Declared before a `/` marker.
    PositionalOnly,
    /// Ordinary parameter.
    PositionalOrKeyword,
    /// `*args`.
    VarPositional,
    /// Declared after `*` or `*args`.
    KeywordOnly,
    /// `**kwargs`.
    VarKeyword,
}

/// A declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name, without `*` prefixes.
    pub name: Arc<str>,
    /// Binding kind.
    pub kind: ParameterKind,
}

/// Ordered parameter list of a callable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    params: SmallVec<[Parameter; 4]>,
}

impl Signature {
    /// Parse Python-style parameter spellings.
    ///
    /// `"*args"` and `"**kwargs"` declare variadics, a bare `"*"` makes the
    /// following parameters keyword-only and a `"/"` makes the preceding
    /// ones positional-only.
    pub fn parse(names: &[&str]) -> Self {
        let mut params: SmallVec<[Parameter; 4]> = SmallVec::new();
        let mut keyword_only = false;

        for raw in names {
            let raw = raw.trim();
            if raw == "/" {
                for param in params.iter_mut() {
                    param.kind = ParameterKind::PositionalOnly;
                }
                continue;
            }
            if raw == "*" {
                keyword_only = true;
                continue;
            }

            let (name, kind) = if let Some(name) = raw.strip_prefix("**") {
                (name, ParameterKind::VarKeyword)
            } else if let Some(name) = raw.strip_prefix('*') {
                keyword_only = true;
                (name, ParameterKind::VarPositional)
            } else if keyword_only {
                (raw, ParameterKind::KeywordOnly)
            } else {
                (raw, ParameterKind::PositionalOrKeyword)
            };

            params.push(Parameter {
                name: Arc::from(name),
                kind,
            });
        }

        Self { params }
    }

    /// All parameters in declaration order.
    #[inline]
    pub fn parameters(&self) -> &[Parameter] {
        &self.params
    }

    /// The first declared parameter.
    #[inline]
    pub fn first(&self) -> Option<&Parameter> {
        self.params.first()
    }

    /// Number of declared parameters.
    #[inline]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check for an empty parameter list.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Signature with the leading positional parameter removed.
    pub fn without_first(&self) -> Self {
        let mut params = self.params.clone();
        if params.first().is_some_and(|p| {
            matches!(
                p.kind,
                ParameterKind::PositionalOnly | ParameterKind::PositionalOrKeyword
            )
        }) {
            params.remove(0);
        }
        Self { params }
    }
}

/// Introspect the declared parameters of a callable value.
///
/// Bound methods report their function's parameters minus the bound one.
/// Returns `None` for values that expose no signature.
pub fn signature(value: &Value) -> Option<Signature> {
    if let Some(func) = value.downcast_ref::<FunctionObject>() {
        return Some(func.signature.clone());
    }
    if let Some(method) = value.downcast_ref::<BoundMethodObject>() {
        return signature(&method.func).map(|sig| sig.without_first());
    }
    None
}
