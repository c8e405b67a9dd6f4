//! Typed result value handed to the result-encoding boundary.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

/// A value read out of a tree, typed exactly as it was declared.
///
/// Covers the closed set of element types a leaf may carry:
/// - Scalars: Int, Float, Double
/// - Arrays (rank 1): IntArray, FloatArray, DoubleArray
/// - Short: the geometry-type code of a passive-structure element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    Int(i32),
    Float(f32),
    Double(f64),
    IntArray(Vec<i32>),
    FloatArray(Vec<f32>),
    DoubleArray(Vec<f64>),
    Short(i16),
}

// ============================================================================
// Type checking
// ============================================================================

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) | Value::IntArray(_) => "int",
            Value::Float(_) | Value::FloatArray(_) => "float",
            Value::Double(_) | Value::DoubleArray(_) => "double",
            Value::Short(_) => "short",
        }
    }

    /// 0 for scalars, 1 for arrays.
    pub fn rank(&self) -> usize {
        if self.is_array() { 1 } else { 0 }
    }

    /// Dimension sizes: empty for scalars, `[len]` for arrays.
    pub fn shape(&self) -> SmallVec<[usize; 1]> {
        match self {
            Value::IntArray(v) => smallvec![v.len()],
            Value::FloatArray(v) => smallvec![v.len()],
            Value::DoubleArray(v) => smallvec![v.len()],
            _ => SmallVec::new(),
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::IntArray(_) | Value::FloatArray(_) | Value::DoubleArray(_))
    }

    /// Attempt to read a scalar as f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(f64::from(*i)),
            Value::Float(f) => Some(f64::from(*f)),
            Value::Double(d) => Some(*d),
            Value::Short(s) => Some(f64::from(*s)),
            _ => None,
        }
    }

    /// Attempt to read the geometry-type code
    pub fn as_short(&self) -> Option<i16> {
        match self {
            Value::Short(s) => Some(*s),
            _ => None,
        }
    }
}

// ============================================================================
// Conversions (From impls)
// ============================================================================

impl From<i32> for Value { fn from(v: i32) -> Self { Value::Int(v) } }
impl From<f32> for Value { fn from(v: f32) -> Self { Value::Float(v) } }
impl From<f64> for Value { fn from(v: f64) -> Self { Value::Double(v) } }
impl From<i16> for Value { fn from(v: i16) -> Self { Value::Short(v) } }
impl From<Vec<i32>> for Value { fn from(v: Vec<i32>) -> Self { Value::IntArray(v) } }
impl From<Vec<f32>> for Value { fn from(v: Vec<f32>) -> Self { Value::FloatArray(v) } }
impl From<Vec<f64>> for Value { fn from(v: Vec<f64>) -> Self { Value::DoubleArray(v) } }

// ============================================================================
// Display
// ============================================================================

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    write!(f, "[")?;
    for (i, v) in items.iter().enumerate() {
        if i > 0 { write!(f, ", ")?; }
        write!(f, "{v}")?;
    }
    write!(f, "]")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Short(s) => write!(f, "{s}"),
            Value::IntArray(l) => write_list(f, l),
            Value::FloatArray(l) => write_list(f, l),
            Value::DoubleArray(l) => write_list(f, l),
        }
    }
}
