//! Leaf extraction — typed reads of atomic attributes.
//!
//! Extraction borrows straight out of the tree: a [`Leaf`] is a view over
//! the attribute's storage, and only [`Leaf::to_value`] copies.

use tracing::debug;

use crate::model::{AtomicData, ElementType, TreeNode, Value};
use crate::{Error, Result};

/// Borrowed view of one attribute's data, typed as declared.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Leaf<'t> {
    IntScalar(i32),
    FloatScalar(f32),
    DoubleScalar(f64),
    Int(&'t [i32]),
    Float(&'t [f32]),
    Double(&'t [f64]),
}

impl<'t> Leaf<'t> {
    pub fn element_type(&self) -> ElementType {
        match self {
            Leaf::IntScalar(_) | Leaf::Int(_) => ElementType::Int,
            Leaf::FloatScalar(_) | Leaf::Float(_) => ElementType::Float,
            Leaf::DoubleScalar(_) | Leaf::Double(_) => ElementType::Double,
        }
    }

    pub fn rank(&self) -> usize {
        match self {
            Leaf::IntScalar(_) | Leaf::FloatScalar(_) | Leaf::DoubleScalar(_) => 0,
            _ => 1,
        }
    }

    /// Number of elements: 1 for scalars.
    pub fn len(&self) -> usize {
        match self {
            Leaf::Int(v) => v.len(),
            Leaf::Float(v) => v.len(),
            Leaf::Double(v) => v.len(),
            _ => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Owned copy, typed exactly as read.
    pub fn to_value(&self) -> Value {
        match *self {
            Leaf::IntScalar(v) => Value::Int(v),
            Leaf::FloatScalar(v) => Value::Float(v),
            Leaf::DoubleScalar(v) => Value::Double(v),
            Leaf::Int(v) => Value::IntArray(v.to_vec()),
            Leaf::Float(v) => Value::FloatArray(v.to_vec()),
            Leaf::Double(v) => Value::DoubleArray(v.to_vec()),
        }
    }

    /// The element at `index` as a scalar of the declared type.
    ///
    /// A scalar answers only index 0.
    pub fn element(&self, index: usize) -> Result<Value> {
        let out_of_range = || Error::IndexOutOfRange { index, len: self.len() };
        match *self {
            Leaf::IntScalar(v) if index == 0 => Ok(Value::Int(v)),
            Leaf::FloatScalar(v) if index == 0 => Ok(Value::Float(v)),
            Leaf::DoubleScalar(v) if index == 0 => Ok(Value::Double(v)),
            Leaf::Int(v) => v.get(index).map(|&x| Value::Int(x)).ok_or_else(out_of_range),
            Leaf::Float(v) => v.get(index).map(|&x| Value::Float(x)).ok_or_else(out_of_range),
            Leaf::Double(v) => v.get(index).map(|&x| Value::Double(x)).ok_or_else(out_of_range),
            _ => Err(out_of_range()),
        }
    }

    /// The element at `index` widened to f64, for arithmetic.
    pub fn element_f64(&self, index: usize) -> Result<f64> {
        let value = self.element(index)?;
        value.as_f64().ok_or_else(|| Error::UnsupportedType(value.type_name().to_owned()))
    }
}

/// Read the attribute named `leaf` from `node`.
///
/// Only `int`, `float` and `double` are readable; any other declared type
/// fails with [`Error::UnsupportedType`] before data is touched.
pub fn extract<'t>(node: TreeNode<'t>, leaf: &str) -> Result<Leaf<'t>> {
    let atomic = node.atomic(leaf).ok_or_else(|| {
        debug!(node = node.name(), leaf, "attribute not found");
        Error::AttributeNotFound(leaf.to_owned())
    })?;

    let out = match atomic.data() {
        AtomicData::IntScalar(v) => Leaf::IntScalar(*v),
        AtomicData::FloatScalar(v) => Leaf::FloatScalar(*v),
        AtomicData::DoubleScalar(v) => Leaf::DoubleScalar(*v),
        AtomicData::Int(v) => Leaf::Int(v),
        AtomicData::Float(v) => Leaf::Float(v),
        AtomicData::Double(v) => Leaf::Double(v),
        AtomicData::Opaque { type_name, .. } => {
            debug!(leaf, type_name = type_name.as_str(), "unrecognised data type");
            return Err(Error::UnsupportedType(type_name.clone()));
        }
    };

    debug!(leaf, ty = %out.element_type(), rank = out.rank(), len = out.len(), "extracted leaf");
    Ok(out)
}
