//! Class object implementation.
//!
//! A `PyClassObject` represents a user-defined class. It contains:
//! - The class name
//! - Base classes
//! - Method Resolution Order (MRO)
//! - Class attributes (methods, descriptors, class variables)
//!
//! # Architecture
//!
//! ```text
//! PyClassObject
//! ├── name: Arc<str>
//! ├── bases: SmallVec<ClassRef; 2>
//! ├── mro: SmallVec<ClassRef; 8> (ancestors only, self is implicit)
//! └── dict: ClassDict (class attributes)
//! ```
//!
//! The MRO stores ancestors only so a class never holds a strong reference
//! to itself.

use crate::error::{RuntimeError, RuntimeResult};
use crate::object::PyObject;
use crate::value::Value;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::sync::Arc;

/// Shared reference to a class object.
pub type ClassRef = Arc<PyClassObject>;

/// Stack-allocated storage for base classes.
/// Most classes have 1-2 base classes.
pub type Bases = SmallVec<[ClassRef; 2]>;

/// Cached ancestor list, in resolution order.
pub type Mro = SmallVec<[ClassRef; 8]>;

// =============================================================================
// Class Dictionary
// =============================================================================

/// Class attribute dictionary (methods, class variables).
///
/// Values are shared objects (methods, descriptors, etc.).
#[derive(Debug, Default)]
pub struct ClassDict {
    /// The underlying dictionary.
    attrs: RwLock<FxHashMap<Arc<str>, Value>>,
}

impl ClassDict {
    /// Create a new empty class dict.
    pub fn new() -> Self {
        Self {
            attrs: RwLock::new(FxHashMap::default()),
        }
    }

    /// Get an attribute.
    #[inline]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.attrs.read().get(name).cloned()
    }

    /// Set an attribute, returning the previous value.
    #[inline]
    pub fn set(&self, name: Arc<str>, value: Value) -> Option<Value> {
        self.attrs.write().insert(name, value)
    }

    /// Delete an attribute.
    #[inline]
    pub fn delete(&self, name: &str) -> Option<Value> {
        self.attrs.write().remove(name)
    }

    /// Check if attribute exists.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.attrs.read().contains_key(name)
    }

    /// Get all attribute names.
    pub fn keys(&self) -> Vec<Arc<str>> {
        self.attrs.read().keys().cloned().collect()
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.attrs.read().len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.attrs.read().is_empty()
    }
}

// =============================================================================
// Class Object
// =============================================================================

/// Class object - represents a user-defined class.
///
/// # Thread Safety
///
/// The class dictionary uses RwLock for safe concurrent access.
/// MRO and bases are immutable after construction.
#[derive(Debug)]
pub struct PyClassObject {
    /// Class name.
    name: Arc<str>,

    /// Direct base classes (in declaration order).
    bases: Bases,

    /// Ancestors in resolution order, excluding this class.
    mro: Mro,

    /// Class attributes.
    dict: ClassDict,
}

impl PyClassObject {
    /// Create a new class with the given name and bases.
    ///
    /// Fails if the bases admit no consistent C3 linearization.
    pub fn new(name: &str, bases: &[ClassRef]) -> RuntimeResult<ClassRef> {
        let mro = compute_c3_mro(bases)?;
        Ok(Arc::new(Self {
            name: Arc::from(name),
            bases: bases.iter().cloned().collect(),
            mro,
            dict: ClassDict::new(),
        }))
    }

    /// Create a class with no explicit bases.
    pub fn new_simple(name: &str) -> ClassRef {
        Arc::new(Self {
            name: Arc::from(name),
            bases: SmallVec::new(),
            mro: SmallVec::new(),
            dict: ClassDict::new(),
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the class name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the base classes.
    #[inline]
    pub fn bases(&self) -> &[ClassRef] {
        &self.bases
    }

    /// Get the ancestors in resolution order (this class excluded).
    #[inline]
    pub fn ancestors(&self) -> &[ClassRef] {
        &self.mro
    }

    /// Iterate the full MRO, starting with this class.
    pub fn mro_iter(&self) -> impl Iterator<Item = &PyClassObject> {
        std::iter::once(self).chain(self.mro.iter().map(|class| &**class))
    }

    /// Check whether `other` is this class or one of its ancestors.
    pub fn is_subclass_of(&self, other: &PyClassObject) -> bool {
        self.mro_iter().any(|class| std::ptr::eq(class, other))
    }

    // =========================================================================
    // Attribute Access
    // =========================================================================

    /// Get an attribute from this class's own dict.
    #[inline]
    pub fn get_attr(&self, name: &str) -> Option<Value> {
        self.dict.get(name)
    }

    /// Set a class attribute.
    #[inline]
    pub fn set_attr(&self, name: &str, value: Value) {
        self.dict.set(Arc::from(name), value);
    }

    /// Install a class attribute and notify descriptors of their name.
    ///
    /// This is the equivalent of an assignment in a class body: a
    /// descriptor learns the class and attribute name it was bound to.
    pub fn define(&self, name: &str, value: Value) {
        if let Some(descriptor) = value.as_object().and_then(|obj| obj.as_descriptor()) {
            descriptor.set_name(self, name);
        }
        self.set_attr(name, value);
    }

    /// Delete a class attribute.
    #[inline]
    pub fn del_attr(&self, name: &str) -> Option<Value> {
        self.dict.delete(name)
    }

    /// Check if this class's own dict has an attribute.
    #[inline]
    pub fn has_attr(&self, name: &str) -> bool {
        self.dict.contains(name)
    }

    /// Look up an attribute by walking the MRO.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.mro_iter().find_map(|class| class.dict.get(name))
    }
}

impl PyObject for PyClassObject {
    fn type_name(&self) -> &str {
        "type"
    }

    fn getattr(&self, name: &str) -> Option<Value> {
        match name {
            "__name__" | "__qualname__" => Some(Value::Str(self.name.clone())),
            _ => self.dict.get(name),
        }
    }

    fn dir(&self) -> Vec<Arc<str>> {
        self.dict.keys()
    }
}

// =============================================================================
// C3 Linearization
// =============================================================================

/// Compute the ancestor list of a class with the given bases.
fn compute_c3_mro(bases: &[ClassRef]) -> RuntimeResult<Mro> {
    let mut sequences: Vec<Vec<ClassRef>> = bases
        .iter()
        .map(|base| {
            let mut seq = Vec::with_capacity(base.mro.len() + 1);
            seq.push(base.clone());
            seq.extend(base.mro.iter().cloned());
            seq
        })
        .collect();
    sequences.push(bases.to_vec());

    let mut mro = Mro::new();
    loop {
        sequences.retain(|seq| !seq.is_empty());
        if sequences.is_empty() {
            return Ok(mro);
        }

        // A head is eligible when it appears in no tail.
        let head = sequences
            .iter()
            .map(|seq| &seq[0])
            .find(|candidate| {
                !sequences
                    .iter()
                    .any(|seq| seq[1..].iter().any(|class| Arc::ptr_eq(class, candidate)))
            })
            .cloned();

        let Some(head) = head else {
            let names: Vec<&str> = bases.iter().map(|base| base.name()).collect();
            return Err(RuntimeError::MroConflict {
                bases: names.join(", "),
            });
        };

        for seq in sequences.iter_mut() {
            if Arc::ptr_eq(&seq[0], &head) {
                seq.remove(0);
            }
        }
        mro.push(head);
    }
}
