//! Read-only snapshots exposed to clients.
//!
//! Field names in this module form the wire contract between the world and
//! every client, so they follow the names clients already consume rather than
//! Rust conventions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Color, GripperId, ObjectId, Shape};

/// Public attributes of a single object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectView {
    /// Type name registered in the configuration.
    #[serde(rename = "type")]
    pub kind: String,
    /// Horizontal position of the top-left corner, in blocks.
    pub x: f32,
    /// Vertical position of the top-left corner, in blocks.
    pub y: f32,
    /// Width in blocks, equal to the shape's side length.
    pub width: u32,
    /// Height in blocks, equal to the shape's side length.
    pub height: u32,
    /// Accumulated rotation in degrees, one of 0, 90, 180 or 270.
    pub rotation: u16,
    /// Whether the object is currently reflected.
    pub mirrored: bool,
    /// Display color.
    pub color: Color,
    /// Current block layout after rotation and reflection.
    pub block_matrix: Shape,
    /// Whether some gripper currently holds the object.
    pub gripped: bool,
}

/// Public attributes of a single gripper.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GripperView {
    /// Horizontal position, in blocks.
    pub x: f32,
    /// Vertical position, in blocks.
    pub y: f32,
    /// Display color.
    pub color: Color,
    /// The held object keyed by its identifier, or `None` when empty-handed.
    pub gripped: Option<BTreeMap<ObjectId, ObjectView>>,
}

impl GripperView {
    /// Identifier and attributes of the held object, if any.
    #[must_use]
    pub fn held_object(&self) -> Option<(&ObjectId, &ObjectView)> {
        self.gripped.as_ref().and_then(|held| held.iter().next())
    }
}

/// Complete public snapshot of the world.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldView {
    /// Every gripper keyed by identifier, with held objects inlined.
    pub grippers: BTreeMap<GripperId, GripperView>,
    /// Every object keyed by identifier.
    pub objs: BTreeMap<ObjectId, ObjectView>,
}
