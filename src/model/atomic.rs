//! Atomic (leaf) attributes carried on tree nodes.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

use crate::{Error, Result};

/// Declared element type of an atomic attribute.
///
/// `Other` keeps whatever type name the upstream declared; extraction
/// refuses it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ElementType {
    Int,
    Float,
    Double,
    Other(String),
}

impl ElementType {
    pub fn parse(name: &str) -> Self {
        match name {
            "int" => ElementType::Int,
            "float" => ElementType::Float,
            "double" => ElementType::Double,
            other => ElementType::Other(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ElementType::Int => "int",
            ElementType::Float => "float",
            ElementType::Double => "double",
            ElementType::Other(name) => name,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, ElementType::Other(_))
    }
}

impl From<String> for ElementType {
    fn from(name: String) -> Self { ElementType::parse(&name) }
}

impl From<ElementType> for String {
    fn from(ty: ElementType) -> Self { ty.as_str().to_owned() }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage behind an atomic attribute.
///
/// Rank and shape are implied by the variant, so a scalar can never carry
/// a shape and an array's shape is always its length.
#[derive(Debug, Clone, PartialEq)]
pub enum AtomicData {
    IntScalar(i32),
    FloatScalar(f32),
    DoubleScalar(f64),
    Int(Vec<i32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    /// An element type outside the supported set. Only its declaration is kept.
    Opaque { type_name: String, len: Option<usize> },
}

impl AtomicData {
    pub fn element_type(&self) -> ElementType {
        match self {
            AtomicData::IntScalar(_) | AtomicData::Int(_) => ElementType::Int,
            AtomicData::FloatScalar(_) | AtomicData::Float(_) => ElementType::Float,
            AtomicData::DoubleScalar(_) | AtomicData::Double(_) => ElementType::Double,
            AtomicData::Opaque { type_name, .. } => ElementType::parse(type_name),
        }
    }

    pub fn rank(&self) -> usize {
        match self {
            AtomicData::IntScalar(_) | AtomicData::FloatScalar(_) | AtomicData::DoubleScalar(_) => 0,
            AtomicData::Int(_) | AtomicData::Float(_) | AtomicData::Double(_) => 1,
            AtomicData::Opaque { len, .. } => usize::from(len.is_some()),
        }
    }

    pub fn shape(&self) -> SmallVec<[usize; 1]> {
        match self {
            AtomicData::Int(v) => smallvec![v.len()],
            AtomicData::Float(v) => smallvec![v.len()],
            AtomicData::Double(v) => smallvec![v.len()],
            AtomicData::Opaque { len: Some(n), .. } => smallvec![*n],
            _ => SmallVec::new(),
        }
    }
}

impl From<i32> for AtomicData { fn from(v: i32) -> Self { AtomicData::IntScalar(v) } }
impl From<f32> for AtomicData { fn from(v: f32) -> Self { AtomicData::FloatScalar(v) } }
impl From<f64> for AtomicData { fn from(v: f64) -> Self { AtomicData::DoubleScalar(v) } }
impl From<Vec<i32>> for AtomicData { fn from(v: Vec<i32>) -> Self { AtomicData::Int(v) } }
impl From<Vec<f32>> for AtomicData { fn from(v: Vec<f32>) -> Self { AtomicData::Float(v) } }
impl From<Vec<f64>> for AtomicData { fn from(v: Vec<f64>) -> Self { AtomicData::Double(v) } }

/// Descriptor tuple `(name, element_type, rank, shape)` of one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomicDescriptor<'a> {
    pub name: &'a str,
    pub element_type: ElementType,
    pub rank: usize,
    pub shape: SmallVec<[usize; 1]>,
}

/// A named leaf attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAtomic", into = "RawAtomic")]
pub struct Atomic {
    name: String,
    data: AtomicData,
}

impl Atomic {
    pub fn new(name: impl Into<String>, data: impl Into<AtomicData>) -> Self {
        Self { name: name.into(), data: data.into() }
    }

    /// An attribute of an unsupported element type. `len` is `Some` for arrays.
    pub fn opaque(name: impl Into<String>, type_name: impl Into<String>, len: Option<usize>) -> Self {
        Self {
            name: name.into(),
            data: AtomicData::Opaque { type_name: type_name.into(), len },
        }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn data(&self) -> &AtomicData { &self.data }

    pub fn descriptor(&self) -> AtomicDescriptor<'_> {
        AtomicDescriptor {
            name: &self.name,
            element_type: self.data.element_type(),
            rank: self.data.rank(),
            shape: self.data.shape(),
        }
    }
}

// ============================================================================
// JSON form
// ============================================================================

/// Wire form: `{"name": .., "type": "float", "data": 1.5 | [..]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawAtomic {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    data: serde_json::Value,
}

fn shape_error(name: &str, detail: impl fmt::Display) -> Error {
    Error::UpstreamShapeMismatch(format!("attribute '{name}': {detail}"))
}

fn json_i32(name: &str, v: &serde_json::Value) -> Result<i32> {
    v.as_i64()
        .and_then(|i| i32::try_from(i).ok())
        .ok_or_else(|| shape_error(name, format!("{v} is not an int")))
}

fn json_f64(name: &str, v: &serde_json::Value) -> Result<f64> {
    v.as_f64().ok_or_else(|| shape_error(name, format!("{v} is not a number")))
}

fn json_list<T>(
    name: &str,
    items: &[serde_json::Value],
    conv: impl Fn(&str, &serde_json::Value) -> Result<T>,
) -> Result<Vec<T>> {
    items.iter().map(|v| conv(name, v)).collect()
}

impl TryFrom<RawAtomic> for Atomic {
    type Error = Error;

    fn try_from(raw: RawAtomic) -> Result<Self> {
        use serde_json::Value as Json;

        let name = raw.name;
        let data = match (ElementType::parse(&raw.type_name), &raw.data) {
            (ElementType::Other(type_name), Json::Array(items)) => {
                AtomicData::Opaque { type_name, len: Some(items.len()) }
            }
            (ElementType::Other(type_name), _) => AtomicData::Opaque { type_name, len: None },
            (ElementType::Int, Json::Array(items)) => AtomicData::Int(json_list(&name, items, json_i32)?),
            (ElementType::Float, Json::Array(items)) => AtomicData::Float(
                json_list(&name, items, json_f64)?.into_iter().map(|v| v as f32).collect(),
            ),
            (ElementType::Double, Json::Array(items)) => AtomicData::Double(json_list(&name, items, json_f64)?),
            (ElementType::Int, v) => AtomicData::IntScalar(json_i32(&name, v)?),
            (ElementType::Float, v) => AtomicData::FloatScalar(json_f64(&name, v)? as f32),
            (ElementType::Double, v) => AtomicData::DoubleScalar(json_f64(&name, v)?),
        };
        Ok(Self { name, data })
    }
}

impl From<Atomic> for RawAtomic {
    fn from(atomic: Atomic) -> Self {
        use serde_json::{Value as Json, json};

        let type_name = atomic.data.element_type().to_string();
        let data = match atomic.data {
            AtomicData::IntScalar(v) => json!(v),
            AtomicData::FloatScalar(v) => json!(v),
            AtomicData::DoubleScalar(v) => json!(v),
            AtomicData::Int(v) => json!(v),
            AtomicData::Float(v) => json!(v),
            AtomicData::Double(v) => json!(v),
            AtomicData::Opaque { len: Some(n), .. } => Json::Array(vec![Json::Null; n]),
            AtomicData::Opaque { len: None, .. } => Json::Null,
        };
        RawAtomic { name: atomic.name, type_name, data }
    }
}
