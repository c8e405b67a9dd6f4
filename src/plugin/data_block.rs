//! DataBlock — the typed result buffer handed back to the host.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::model::Value;

/// Payload of a [`DataBlock`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReturnData {
    /// Calls with nothing to return (`init`, `reset`).
    Empty,
    Value(Value),
    Text(String),
}

/// Result of one plugin call: data plus its rank, dimensions and a
/// human-readable description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataBlock {
    pub rank: usize,
    pub dims: SmallVec<[usize; 1]>,
    pub data: ReturnData,
    pub description: String,
}

impl DataBlock {
    pub fn empty() -> Self {
        Self { rank: 0, dims: SmallVec::new(), data: ReturnData::Empty, description: String::new() }
    }

    /// Scalars get rank 0 and no dims; arrays rank 1 and `[len]`.
    pub fn from_value(value: Value, description: impl Into<String>) -> Self {
        Self {
            rank: value.rank(),
            dims: value.shape(),
            data: ReturnData::Value(value),
            description: description.into(),
        }
    }

    /// Text is a rank-1 character array.
    pub fn text(text: impl Into<String>, description: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            rank: 1,
            dims: smallvec::smallvec![text.len()],
            data: ReturnData::Text(text),
            description: description.into(),
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match &self.data {
            ReturnData::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            ReturnData::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.data, ReturnData::Empty)
    }
}
