//! Wrapped configuration values.
//!
//! A [`WrappedValue`] pairs a value with its [`Provenance`]. Everything that
//! reads the value (equality, hashing, ordering, indexing, arithmetic,
//! display, serialization) ignores the provenance, so application code can
//! treat a wrapped tree as plain configuration data while tools can still ask
//! each node where it came from.

use crate::provenance::Provenance;
use crate::scalar::Scalar;
use crate::step::ProvenanceStep;
use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Div, Index, Mul, Sub};

/// The shape of a wrapped value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
    /// Insertion-ordered, unique string keys.
    Mapping(IndexMap<String, WrappedValue>),

    /// Ordered items. Always replaced as a whole when merged.
    Sequence(Vec<WrappedValue>),

    /// String, integer, float, boolean or null.
    Scalar(Scalar),
}

/// A configuration value with its provenance.
///
/// Containers own their children and have a provenance of their own, distinct
/// from their entries'.
#[derive(Debug, Clone)]
pub struct WrappedValue {
    kind: ValueKind,
    provenance: Provenance,
}

impl WrappedValue {
    pub fn new(kind: ValueKind, provenance: Provenance) -> Self {
        Self { kind, provenance }
    }

    pub fn scalar(value: impl Into<Scalar>, provenance: Provenance) -> Self {
        Self::new(ValueKind::Scalar(value.into()), provenance)
    }

    pub fn sequence(items: Vec<WrappedValue>, provenance: Provenance) -> Self {
        Self::new(ValueKind::Sequence(items), provenance)
    }

    pub fn mapping(entries: IndexMap<String, WrappedValue>, provenance: Provenance) -> Self {
        Self::new(ValueKind::Mapping(entries), provenance)
    }

    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    /// Mutable access to the history. [`Provenance`] only allows appending.
    pub fn provenance_mut(&mut self) -> &mut Provenance {
        &mut self.provenance
    }

    /// Reassign this node to a scalar and record `step` in its history.
    ///
    /// Works on any node: a container reassigned this way becomes a leaf.
    pub fn assign(&mut self, value: impl Into<Scalar>, step: ProvenanceStep) {
        self.kind = ValueKind::Scalar(value.into());
        self.provenance.append(step);
    }

    pub(crate) fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    /// Name of the value's kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            ValueKind::Mapping(_) => "mapping",
            ValueKind::Sequence(_) => "sequence",
            ValueKind::Scalar(scalar) => scalar.kind_name(),
        }
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self.kind, ValueKind::Mapping(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self.kind, ValueKind::Sequence(_))
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.kind, ValueKind::Scalar(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(&self.kind, ValueKind::Scalar(Scalar::Null))
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match &self.kind {
            ValueKind::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Scalar::as_str)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_scalar().and_then(Scalar::as_i64)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_scalar().and_then(Scalar::as_f64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_scalar().and_then(Scalar::as_bool)
    }

    pub fn as_sequence(&self) -> Option<&[WrappedValue]> {
        match &self.kind {
            ValueKind::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&IndexMap<String, WrappedValue>> {
        match &self.kind {
            ValueKind::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a mapping entry.
    pub fn get(&self, key: &str) -> Option<&WrappedValue> {
        self.as_mapping()?.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut WrappedValue> {
        match &mut self.kind {
            ValueKind::Mapping(entries) => entries.get_mut(key),
            _ => None,
        }
    }

    /// Look up a sequence item.
    pub fn get_index(&self, index: usize) -> Option<&WrappedValue> {
        self.as_sequence()?.get(index)
    }

    pub fn get_index_mut(&mut self, index: usize) -> Option<&mut WrappedValue> {
        match &mut self.kind {
            ValueKind::Sequence(items) => items.get_mut(index),
            _ => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of entries or items; scalars have length 0, except strings,
    /// which report their length in bytes like `str::len`.
    pub fn len(&self) -> usize {
        match &self.kind {
            ValueKind::Mapping(entries) => entries.len(),
            ValueKind::Sequence(items) => items.len(),
            ValueKind::Scalar(Scalar::String(s)) => s.len(),
            ValueKind::Scalar(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mapping keys in insertion order; empty for non-mappings.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.as_mapping()
            .into_iter()
            .flat_map(|entries| entries.keys().map(String::as_str))
    }

    /// Mapping entries in insertion order; empty for non-mappings.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &WrappedValue)> {
        self.as_mapping()
            .into_iter()
            .flat_map(|entries| entries.iter().map(|(k, v)| (k.as_str(), v)))
    }

    /// Sequence items in order; empty for non-sequences.
    pub fn iter(&self) -> impl Iterator<Item = &WrappedValue> {
        self.as_sequence().into_iter().flatten()
    }
}

impl PartialEq for WrappedValue {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Eq for WrappedValue {}

/// Scalars and sequences hash exactly like their native counterparts;
/// mappings hash independently of entry order, matching their equality.
impl Hash for WrappedValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.kind {
            ValueKind::Scalar(scalar) => scalar.hash(state),
            ValueKind::Sequence(items) => items.hash(state),
            ValueKind::Mapping(entries) => {
                let combined = entries.iter().fold(0u64, |acc, entry| {
                    let mut hasher = DefaultHasher::new();
                    entry.hash(&mut hasher);
                    acc.wrapping_add(hasher.finish())
                });
                entries.len().hash(state);
                combined.hash(state);
            }
        }
    }
}

/// Scalars compare by value, sequences lexicographically; mappings and
/// mixed kinds are unordered.
impl PartialOrd for WrappedValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (&self.kind, &other.kind) {
            (ValueKind::Scalar(a), ValueKind::Scalar(b)) => Some(a.cmp(b)),
            (ValueKind::Sequence(a), ValueKind::Sequence(b)) => a.partial_cmp(b),
            (ValueKind::Mapping(a), ValueKind::Mapping(b)) if a == b => Some(Ordering::Equal),
            _ => None,
        }
    }
}

macro_rules! impl_native_cmp {
    ($($native:ty),*) => {
        $(
            impl PartialEq<$native> for WrappedValue {
                fn eq(&self, other: &$native) -> bool {
                    self.as_scalar().is_some_and(|scalar| scalar == other)
                }
            }

            impl PartialEq<WrappedValue> for $native {
                fn eq(&self, other: &WrappedValue) -> bool {
                    other == self
                }
            }

            impl PartialOrd<$native> for WrappedValue {
                fn partial_cmp(&self, other: &$native) -> Option<Ordering> {
                    self.as_scalar()?.partial_cmp(other)
                }
            }
        )*
    };
}

impl_native_cmp!(str, &str, i64, f64);

impl PartialEq<String> for WrappedValue {
    fn eq(&self, other: &String) -> bool {
        self.as_scalar().is_some_and(|scalar| scalar == other)
    }
}

impl PartialEq<WrappedValue> for String {
    fn eq(&self, other: &WrappedValue) -> bool {
        other == self
    }
}

impl PartialEq<bool> for WrappedValue {
    fn eq(&self, other: &bool) -> bool {
        self.as_scalar().is_some_and(|scalar| scalar == other)
    }
}

impl PartialEq<WrappedValue> for bool {
    fn eq(&self, other: &WrappedValue) -> bool {
        other == self
    }
}

impl PartialEq<Scalar> for WrappedValue {
    fn eq(&self, other: &Scalar) -> bool {
        self.as_scalar() == Some(other)
    }
}

macro_rules! impl_wrapped_arith {
    ($trait:ident, $method:ident) => {
        impl<Rhs> $trait<Rhs> for &WrappedValue
        where
            for<'s> &'s Scalar: $trait<Rhs, Output = Option<Scalar>>,
        {
            type Output = Option<Scalar>;

            fn $method(self, rhs: Rhs) -> Option<Scalar> {
                self.as_scalar()?.$method(rhs)
            }
        }

        impl<Rhs> $trait<Rhs> for WrappedValue
        where
            for<'s> &'s Scalar: $trait<Rhs, Output = Option<Scalar>>,
        {
            type Output = Option<Scalar>;

            fn $method(self, rhs: Rhs) -> Option<Scalar> {
                (&self).$method(rhs)
            }
        }
    };
}

impl_wrapped_arith!(Add, add);
impl_wrapped_arith!(Sub, sub);
impl_wrapped_arith!(Mul, mul);
impl_wrapped_arith!(Div, div);

/// Panics if the value is not a mapping or the key is missing, like
/// `HashMap`'s `Index`.
impl Index<&str> for WrappedValue {
    type Output = WrappedValue;

    fn index(&self, key: &str) -> &WrappedValue {
        match self.get(key) {
            Some(value) => value,
            None => panic!("no entry `{}` in {}", key, self.kind_name()),
        }
    }
}

/// Panics if the value is not a sequence or the index is out of bounds.
impl Index<usize> for WrappedValue {
    type Output = WrappedValue;

    fn index(&self, index: usize) -> &WrappedValue {
        match self.get_index(index) {
            Some(value) => value,
            None => panic!("no item {} in {} of length {}", index, self.kind_name(), self.len()),
        }
    }
}

/// Scalars display as their native text; containers use YAML flow style.
impl fmt::Display for WrappedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ValueKind::Scalar(scalar) => write!(f, "{}", scalar),
            ValueKind::Sequence(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            ValueKind::Mapping(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Serializes the plain value only; provenance is not part of the output.
impl Serialize for WrappedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.kind {
            ValueKind::Scalar(scalar) => scalar.serialize(serializer),
            ValueKind::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            ValueKind::Mapping(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}
