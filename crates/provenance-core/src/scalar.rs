//! Leaf values that behave like their native counterparts.
//!
//! [`Scalar`] is the tagged union behind every leaf of a wrapped tree. Its
//! trait implementations are chosen so that a scalar is indistinguishable
//! from the native value it holds: a `String` scalar hashes exactly like a
//! `str`, compares equal to `"x"`, and displays as the bare text; an
//! `Integer` scalar adds like an `i64`.

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A configuration leaf value.
#[derive(Debug, Clone)]
pub enum Scalar {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

/// Numeric view used by ordering and arithmetic.
#[derive(Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

impl Scalar {
    /// Name of the variant, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Boolean(_) => "boolean",
            Scalar::Integer(_) => "integer",
            Scalar::Float(_) => "float",
            Scalar::String(_) => "string",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Floats, and integers widened to floats.
    pub fn as_f64(&self) -> Option<f64> {
        self.number().map(Number::as_f64)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    fn number(&self) -> Option<Number> {
        match self {
            Scalar::Integer(i) => Some(Number::Int(*i)),
            Scalar::Float(f) => Some(Number::Float(*f)),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Scalar::Null => 0,
            Scalar::Boolean(_) => 1,
            Scalar::Integer(_) | Scalar::Float(_) => 2,
            Scalar::String(_) => 3,
        }
    }
}

/// Float identity for `Eq`, `Hash` and `Ord`: the IEEE total order with
/// `-0.0` folded into `0.0`, so zeros compare equal as they do natively and
/// NaN stays equal to itself.
fn float_key(f: f64) -> f64 {
    if f == 0.0 { 0.0 } else { f }
}

fn float_cmp(a: f64, b: f64) -> Ordering {
    float_key(a).total_cmp(&float_key(b))
}

// Equality stays within a variant.
impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Null, Scalar::Null) => true,
            (Scalar::Boolean(a), Scalar::Boolean(b)) => a == b,
            (Scalar::Integer(a), Scalar::Integer(b)) => a == b,
            (Scalar::Float(a), Scalar::Float(b)) => float_cmp(*a, *b) == Ordering::Equal,
            (Scalar::String(a), Scalar::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Scalar {}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Scalar::Null => ().hash(state),
            Scalar::Boolean(b) => b.hash(state),
            Scalar::Integer(i) => i.hash(state),
            Scalar::Float(f) => float_key(*f).to_bits().hash(state),
            Scalar::String(s) => s.hash(state),
        }
    }
}

/// `Null < Boolean < numbers < String`; integers and floats interleave by
/// numeric value, with the integer first on a tie.
impl Ord for Scalar {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Scalar::Boolean(a), Scalar::Boolean(b)) => a.cmp(b),
            (Scalar::Integer(a), Scalar::Integer(b)) => a.cmp(b),
            (Scalar::Float(a), Scalar::Float(b)) => float_cmp(*a, *b),
            (Scalar::Integer(a), Scalar::Float(b)) => {
                float_cmp(*a as f64, *b).then(Ordering::Less)
            }
            (Scalar::Float(a), Scalar::Integer(b)) => {
                float_cmp(*a, *b as f64).then(Ordering::Greater)
            }
            (Scalar::String(a), Scalar::String(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Scalar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "null"),
            Scalar::Boolean(b) => write!(f, "{}", b),
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::String(s) => write!(f, "{}", s),
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Null => serializer.serialize_unit(),
            Scalar::Boolean(b) => serializer.serialize_bool(*b),
            Scalar::Integer(i) => serializer.serialize_i64(*i),
            Scalar::Float(f) => serializer.serialize_f64(*f),
            Scalar::String(s) => serializer.serialize_str(s),
        }
    }
}

impl From<()> for Scalar {
    fn from(_: ()) -> Self {
        Scalar::Null
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Boolean(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Integer(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Integer(value.into())
    }
}

impl From<u32> for Scalar {
    fn from(value: u32) -> Self {
        Scalar::Integer(value.into())
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map_or(Scalar::Null, Into::into)
    }
}

// Comparisons against native values.

impl PartialEq<str> for Scalar {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for Scalar {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl PartialEq<String> for Scalar {
    fn eq(&self, other: &String) -> bool {
        self.as_str() == Some(other.as_str())
    }
}

impl PartialEq<i64> for Scalar {
    fn eq(&self, other: &i64) -> bool {
        self.as_i64() == Some(*other)
    }
}

impl PartialEq<f64> for Scalar {
    fn eq(&self, other: &f64) -> bool {
        matches!(self, Scalar::Float(f) if f == other)
    }
}

impl PartialEq<bool> for Scalar {
    fn eq(&self, other: &bool) -> bool {
        self.as_bool() == Some(*other)
    }
}

macro_rules! impl_reverse_eq {
    ($($native:ty),*) => {
        $(
            impl PartialEq<Scalar> for $native {
                fn eq(&self, other: &Scalar) -> bool {
                    other == self
                }
            }
        )*
    };
}

impl_reverse_eq!(str, &str, String, i64, f64, bool);

impl PartialOrd<i64> for Scalar {
    fn partial_cmp(&self, other: &i64) -> Option<Ordering> {
        match self.number()? {
            Number::Int(i) => i.partial_cmp(other),
            Number::Float(f) => f.partial_cmp(&(*other as f64)),
        }
    }
}

impl PartialOrd<f64> for Scalar {
    fn partial_cmp(&self, other: &f64) -> Option<Ordering> {
        self.as_f64()?.partial_cmp(other)
    }
}

impl PartialOrd<str> for Scalar {
    fn partial_cmp(&self, other: &str) -> Option<Ordering> {
        Some(self.as_str()?.cmp(other))
    }
}

impl PartialOrd<&str> for Scalar {
    fn partial_cmp(&self, other: &&str) -> Option<Ordering> {
        Some(self.as_str()?.cmp(*other))
    }
}

// Arithmetic follows the checked-arithmetic convention: `None` when an
// operand is not numeric, on integer overflow, or on integer division by zero.

fn arith(
    lhs: &Scalar,
    rhs: &Scalar,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Option<Scalar> {
    match (lhs.number()?, rhs.number()?) {
        (Number::Int(a), Number::Int(b)) => int_op(a, b).map(Scalar::Integer),
        (a, b) => Some(Scalar::Float(float_op(a.as_f64(), b.as_f64()))),
    }
}

macro_rules! impl_arith {
    ($trait:ident, $method:ident, $checked:ident, $op:tt) => {
        impl $trait<&Scalar> for &Scalar {
            type Output = Option<Scalar>;

            fn $method(self, rhs: &Scalar) -> Option<Scalar> {
                arith(self, rhs, i64::$checked, |a, b| a $op b)
            }
        }

        impl $trait<Scalar> for Scalar {
            type Output = Option<Scalar>;

            fn $method(self, rhs: Scalar) -> Option<Scalar> {
                (&self).$method(&rhs)
            }
        }

        impl $trait<i64> for &Scalar {
            type Output = Option<Scalar>;

            fn $method(self, rhs: i64) -> Option<Scalar> {
                self.$method(&Scalar::Integer(rhs))
            }
        }

        impl $trait<i64> for Scalar {
            type Output = Option<Scalar>;

            fn $method(self, rhs: i64) -> Option<Scalar> {
                (&self).$method(&Scalar::Integer(rhs))
            }
        }

        impl $trait<f64> for &Scalar {
            type Output = Option<Scalar>;

            fn $method(self, rhs: f64) -> Option<Scalar> {
                self.$method(&Scalar::Float(rhs))
            }
        }

        impl $trait<f64> for Scalar {
            type Output = Option<Scalar>;

            fn $method(self, rhs: f64) -> Option<Scalar> {
                (&self).$method(&Scalar::Float(rhs))
            }
        }
    };
}

impl_arith!(Add, add, checked_add, +);
impl_arith!(Sub, sub, checked_sub, -);
impl_arith!(Mul, mul, checked_mul, *);
impl_arith!(Div, div, checked_div, /);

impl Neg for &Scalar {
    type Output = Option<Scalar>;

    fn neg(self) -> Option<Scalar> {
        match self.number()? {
            Number::Int(i) => i.checked_neg().map(Scalar::Integer),
            Number::Float(f) => Some(Scalar::Float(-f)),
        }
    }
}

impl Neg for Scalar {
    type Output = Option<Scalar>;

    fn neg(self) -> Option<Scalar> {
        -&self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::RandomState;
    use std::hash::BuildHasher;

    #[test]
    fn test_equality_with_natives() {
        assert_eq!(Scalar::from("x"), "x");
        assert_eq!("x", Scalar::from("x"));
        assert_eq!(Scalar::from("x"), String::from("x"));
        assert_eq!(Scalar::from(5), 5i64);
        assert_eq!(Scalar::from(2.5), 2.5);
        assert_eq!(Scalar::from(true), true);
        assert_ne!(Scalar::from("5"), 5i64);
    }

    #[test]
    fn test_variants_do_not_cross_compare() {
        assert_ne!(Scalar::Integer(1), Scalar::Float(1.0));
        assert_ne!(Scalar::Null, Scalar::from(false));
        assert_ne!(Scalar::from("1"), Scalar::Integer(1));
    }

    #[test]
    fn test_hash_matches_native() {
        let state = RandomState::new();
        assert_eq!(state.hash_one(Scalar::from("x")), state.hash_one("x"));
        assert_eq!(state.hash_one(Scalar::from(42)), state.hash_one(42i64));
        assert_eq!(state.hash_one(Scalar::from(true)), state.hash_one(true));
    }

    #[test]
    fn test_float_eq_is_reflexive() {
        let nan = Scalar::Float(f64::NAN);
        assert_eq!(nan, nan.clone());
    }

    #[test]
    fn test_signed_zeros_are_equal() {
        let zero = Scalar::Float(0.0);
        let negative = Scalar::Float(-0.0);
        assert_eq!(zero, negative);
        assert_eq!(negative, 0.0);
        assert_eq!(zero.cmp(&negative), Ordering::Equal);
        assert_eq!(Scalar::Integer(0).cmp(&negative), Ordering::Less);

        let state = RandomState::new();
        assert_eq!(state.hash_one(&zero), state.hash_one(&negative));
    }

    #[test]
    fn test_ordering() {
        let mut values = vec![
            Scalar::from("b"),
            Scalar::from(2.5),
            Scalar::from(true),
            Scalar::Null,
            Scalar::from(3),
            Scalar::from("a"),
            Scalar::from(2),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                Scalar::Null,
                Scalar::from(true),
                Scalar::from(2),
                Scalar::from(2.5),
                Scalar::from(3),
                Scalar::from("a"),
                Scalar::from("b"),
            ]
        );
        assert!(Scalar::from(1) < Scalar::from(1.0));
        assert!(Scalar::from(5) > 4i64);
        assert!(Scalar::from("abc") < "abd");
        assert_eq!(Scalar::from("abc").partial_cmp(&5i64), None);
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(Scalar::from(5) + 1, Some(Scalar::from(6)));
        assert_eq!((Scalar::from(5) + 1).unwrap(), 6i64);
        assert_eq!(Scalar::from(5) - 7, Some(Scalar::from(-2)));
        assert_eq!(Scalar::from(3) * 2.5, Some(Scalar::from(7.5)));
        assert_eq!(Scalar::from(7) / 2, Some(Scalar::from(3)));
        assert_eq!(Scalar::from(7.0) / 2, Some(Scalar::from(3.5)));
        assert_eq!(-Scalar::from(4), Some(Scalar::from(-4)));
    }

    #[test]
    fn test_checked_arithmetic_failures() {
        assert_eq!(Scalar::from("a") + 1, None);
        assert_eq!(Scalar::from(true) + 1, None);
        assert_eq!(Scalar::from(i64::MAX) + 1, None);
        assert_eq!(Scalar::from(1) / 0, None);
        assert_eq!(-Scalar::Null, None);
    }

    #[test]
    fn test_display_matches_native() {
        assert_eq!(Scalar::from("hello").to_string(), "hello");
        assert_eq!(Scalar::from(42).to_string(), 42.to_string());
        assert_eq!(Scalar::from(1.5).to_string(), 1.5.to_string());
        assert_eq!(Scalar::from(false).to_string(), "false");
        assert_eq!(Scalar::Null.to_string(), "null");
    }

    #[test]
    fn test_serialize_transparent() {
        assert_eq!(serde_json::to_value(Scalar::from("x")).unwrap(), serde_json::json!("x"));
        assert_eq!(serde_json::to_value(Scalar::from(3)).unwrap(), serde_json::json!(3));
        assert_eq!(serde_json::to_value(Scalar::Null).unwrap(), serde_json::Value::Null);
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Scalar::from(None::<i64>), Scalar::Null);
        assert_eq!(Scalar::from(Some("x")), "x");
    }
}
