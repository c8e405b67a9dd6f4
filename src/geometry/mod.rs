//! # Passive-Structure Geometry
//!
//! Decodes one element of a passive-structure record (coil or plate
//! cross-section) into the shape parameters a caller asks for.
//!
//! Each record stores six float arrays indexed by element:
//!
//! | Attribute | Meaning |
//! |-----------|---------|
//! | `centreR`, `centreZ` | centre of the element |
//! | `dR`, `dZ` | full extents along R and Z |
//! | `shapeAngle1`, `shapeAngle2` | tilt angles in degrees |
//!
//! An element whose two tilt angles are both exactly zero is an
//! axis-aligned rectangle and its fields pass through unchanged. Anything
//! else is an oblique quadrilateral, and the fields are re-expressed as a
//! lower-left corner, rotated edge lengths, and angles in radians.

use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::extract::extract;
use crate::model::{TreeNode, Value};
use crate::{Error, Result};

pub const CENTRE_R: &str = "centreR";
pub const CENTRE_Z: &str = "centreZ";
pub const D_R: &str = "dR";
pub const D_Z: &str = "dZ";
pub const SHAPE_ANGLE_1: &str = "shapeAngle1";
pub const SHAPE_ANGLE_2: &str = "shapeAngle2";
pub const GEOMETRY_TYPE: &str = "geometry_type";

/// A field a caller may request from a passive-structure element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ShapeField {
    CentreR,
    CentreZ,
    DR,
    DZ,
    ShapeAngle1,
    ShapeAngle2,
    /// Meta-field: the rectangle/oblique code.
    GeometryType,
    Unknown(String),
}

impl ShapeField {
    /// Exact, case-sensitive match on the field name.
    pub fn parse(name: &str) -> Self {
        match name {
            CENTRE_R => ShapeField::CentreR,
            CENTRE_Z => ShapeField::CentreZ,
            D_R => ShapeField::DR,
            D_Z => ShapeField::DZ,
            SHAPE_ANGLE_1 => ShapeField::ShapeAngle1,
            SHAPE_ANGLE_2 => ShapeField::ShapeAngle2,
            GEOMETRY_TYPE => ShapeField::GeometryType,
            other => ShapeField::Unknown(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ShapeField::CentreR => CENTRE_R,
            ShapeField::CentreZ => CENTRE_Z,
            ShapeField::DR => D_R,
            ShapeField::DZ => D_Z,
            ShapeField::ShapeAngle1 => SHAPE_ANGLE_1,
            ShapeField::ShapeAngle2 => SHAPE_ANGLE_2,
            ShapeField::GeometryType => GEOMETRY_TYPE,
            ShapeField::Unknown(name) => name,
        }
    }

    /// Fields that pass through for rectangles.
    pub fn is_rectangle_field(&self) -> bool {
        matches!(self, ShapeField::CentreR | ShapeField::CentreZ | ShapeField::DR | ShapeField::DZ)
    }

    /// Fields that are transformed for oblique elements.
    pub fn is_oblique_field(&self) -> bool {
        self.is_rectangle_field() || matches!(self, ShapeField::ShapeAngle1 | ShapeField::ShapeAngle2)
    }

    /// Stored attributes, besides the two angles, read by this field's
    /// oblique formula.
    pub fn oblique_inputs(&self) -> &'static [&'static str] {
        match self {
            ShapeField::CentreR => &[CENTRE_R, D_R, D_Z],
            ShapeField::CentreZ => &[CENTRE_Z, D_R, D_Z],
            ShapeField::DR => &[D_R],
            ShapeField::DZ => &[D_Z],
            _ => &[],
        }
    }
}

impl fmt::Display for ShapeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rectangle/oblique classification of one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    Rectangle,
    Oblique,
}

impl GeometryKind {
    /// Both angles exactly zero means rectangle. No tolerance.
    pub fn from_angles(angle1: f64, angle2: f64) -> Self {
        if angle1 == 0.0 && angle2 == 0.0 {
            GeometryKind::Rectangle
        } else {
            GeometryKind::Oblique
        }
    }

    /// Code returned for a `geometry_type` request.
    pub fn code(self) -> i16 {
        match self {
            GeometryKind::Rectangle => 2,
            GeometryKind::Oblique => 3,
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryKind::Rectangle => write!(f, "rectangle"),
            GeometryKind::Oblique => write!(f, "oblique"),
        }
    }
}

/// Stored encoding of one element: centre, extents, tilt angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementGeometry {
    pub centre_r: f64,
    pub centre_z: f64,
    pub d_r: f64,
    pub d_z: f64,
    pub angle1: f64,
    pub angle2: f64,
}

impl ElementGeometry {
    /// Read element `index` of all six attributes.
    pub fn read(node: TreeNode<'_>, index: usize) -> Result<Self> {
        let at = |name: &str| -> Result<f64> { extract(node, name)?.element_f64(index) };
        let (angle1, angle2) = read_angles(node, index)?;
        Ok(Self {
            centre_r: at(CENTRE_R)?,
            centre_z: at(CENTRE_Z)?,
            d_r: at(D_R)?,
            d_z: at(D_Z)?,
            angle1,
            angle2,
        })
    }

    /// Read only what the oblique formula for `field` needs, given the
    /// angles already read. Attributes it does not use stay zero.
    pub fn read_for(
        node: TreeNode<'_>,
        index: usize,
        field: &ShapeField,
        (angle1, angle2): (f64, f64),
    ) -> Result<Self> {
        let mut g = Self { angle1, angle2, ..Self::default() };
        for &name in field.oblique_inputs() {
            let value = extract(node, name)?.element_f64(index)?;
            match name {
                CENTRE_R => g.centre_r = value,
                CENTRE_Z => g.centre_z = value,
                D_R => g.d_r = value,
                _ => g.d_z = value,
            }
        }
        Ok(g)
    }

    pub fn kind(&self) -> GeometryKind {
        GeometryKind::from_angles(self.angle1, self.angle2)
    }
}

fn deg2rad(degrees: f64) -> f64 {
    degrees * PI / 180.0
}

/// Corner/edge-length value of `field` for an oblique element.
///
/// `None` for fields with no oblique meaning.
// centreZ subtracts dR/2 and dZ divides by sin(shapeAngle2). Keep both as they are.
pub fn oblique_transform(g: &ElementGeometry, field: &ShapeField) -> Option<f64> {
    let a1 = deg2rad(g.angle1);
    let a2 = deg2rad(g.angle2);
    let value = match field {
        ShapeField::CentreR => g.centre_r - g.d_r / 2.0 - (g.d_z / 2.0) * (1.0 / a2.tan()),
        ShapeField::CentreZ => g.centre_z - g.d_r / 2.0 - (g.d_z / 2.0) * a1.tan(),
        ShapeField::DR => g.d_r / a1.cos(),
        ShapeField::DZ => g.d_z / a2.sin(),
        ShapeField::ShapeAngle1 => a1,
        ShapeField::ShapeAngle2 => deg2rad(g.angle2 - 90.0),
        ShapeField::GeometryType | ShapeField::Unknown(_) => return None,
    };
    Some(value)
}

/// Read both tilt angles at `index`.
///
/// An angle attribute that cannot be read fails with
/// [`Error::MissingAngleData`]; classification never falls back to a default.
fn read_angles(node: TreeNode<'_>, index: usize) -> Result<(f64, f64)> {
    let angle = |name: &str| -> Result<f64> {
        let leaf = extract(node, name).map_err(|e| {
            warn!(node = node.name(), angle = name, error = %e, "tilt angle unreadable");
            Error::MissingAngleData(name.to_owned())
        })?;
        leaf.element_f64(index)
    };
    Ok((angle(SHAPE_ANGLE_1)?, angle(SHAPE_ANGLE_2)?))
}

/// Classify element `index` as rectangle or oblique.
pub fn classify(node: TreeNode<'_>, index: usize) -> Result<GeometryKind> {
    let (angle1, angle2) = read_angles(node, index)?;
    Ok(GeometryKind::from_angles(angle1, angle2))
}

/// Decode `field` of element `index` on a passive-structure node.
///
/// `geometry_type` yields [`Value::Short`] with the classification code.
/// Rectangle fields are the stored values unchanged; oblique fields are
/// computed and returned as `float`.
pub fn decode(node: TreeNode<'_>, index: usize, field: &str) -> Result<Value> {
    let field = ShapeField::parse(field);
    let angles = read_angles(node, index)?;
    let kind = GeometryKind::from_angles(angles.0, angles.1);
    debug!(node = node.name(), index, %field, %kind, "classified element");

    if field == ShapeField::GeometryType {
        return Ok(Value::Short(kind.code()));
    }

    let unsupported = || Error::FieldNotSupportedInMode { field: field.to_string(), mode: kind };
    match kind {
        GeometryKind::Rectangle => {
            if !field.is_rectangle_field() {
                return Err(unsupported());
            }
            extract(node, field.as_str())?.element(index)
        }
        GeometryKind::Oblique => {
            if !field.is_oblique_field() {
                return Err(unsupported());
            }
            let geometry = ElementGeometry::read_for(node, index, &field, angles)?;
            let value = oblique_transform(&geometry, &field).ok_or_else(unsupported)?;
            Ok(Value::Float(value as f32))
        }
    }
}
