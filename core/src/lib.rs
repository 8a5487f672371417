#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the gripper world engine.
//!
//! This crate defines the vocabulary that connects transport adapters and the
//! authoritative world. Adapters load a [`Configuration`], submit [`Command`]
//! values describing desired mutations, and the world either applies them and
//! reports an [`Event`] or rejects them with an [`ActionError`]. Everything a
//! client may observe is expressed through the serializable [`WorldView`].

mod config;
mod shape;
mod view;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use config::{ConfigError, ConfigFile, ConfigView, Configuration};
pub use shape::{InvalidShapeError, QuarterTurns, Shape};
pub use view::{GripperView, ObjectView, WorldView};

/// Type name carried by every gripper. Object types may not use it.
pub const GRIPPER_TYPE: &str = "gripper";

/// Identifier of an object within the world's object namespace.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Creates a new object identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Retrieves the textual form of the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a gripper within the world's gripper namespace.
///
/// Gripper and object identifiers live in separate key spaces, so the same
/// text may name both an object and a gripper without ambiguity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GripperId(String);

impl GripperId {
    /// Creates a new gripper identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Retrieves the textual form of the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GripperId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display color of an entity, either a CSS color name or an HTML color code.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    /// Creates a color from its textual form.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Retrieves the textual form of the color.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::new("blue")
    }
}

/// Manipulations a configuration can enable or disable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Translating grippers and objects.
    Move,
    /// Turning objects by quarter turns.
    Rotate,
    /// Reflecting objects across the horizontal axis.
    Mirror,
    /// Picking objects up and letting go of them.
    Grip,
}

impl ActionKind {
    /// Lowercase name used in configuration documents.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Rotate => "rotate",
            Self::Mirror => "mirror",
            Self::Grip => "grip",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Axis-aligned rectangle in grid units with a top-left origin.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl Bounds {
    /// Creates a rectangle from its top-left corner and size.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Left edge, equal to the x coordinate.
    #[must_use]
    pub const fn left(&self) -> f32 {
        self.x
    }

    /// Right edge, `x + width`.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Top edge, equal to the y coordinate.
    #[must_use]
    pub const fn top(&self) -> f32 {
        self.y
    }

    /// Bottom edge, `y + height`.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Center point as `(x, y)`.
    #[must_use]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Same rectangle shifted by the provided delta.
    #[must_use]
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Same rectangle with its origin rounded to the nearest whole cell.
    #[must_use]
    pub fn snapped(&self) -> Self {
        Self::new(self.x.round(), self.y.round(), self.width, self.height)
    }

    /// Reports whether the interiors of two rectangles overlap.
    ///
    /// Rectangles that merely share an edge do not intersect.
    #[must_use]
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    /// Reports whether the rectangle lies entirely inside `outer`.
    #[must_use]
    pub fn contained_in(&self, outer: &Bounds) -> bool {
        self.left() >= outer.left()
            && self.top() >= outer.top()
            && self.right() <= outer.right()
            && self.bottom() <= outer.bottom()
    }
}

/// Reasons a move may be refused while overlap prevention is enabled.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum PlacementError {
    /// The moved footprint would extend beyond the grid.
    #[error("footprint would leave the grid")]
    OutOfBounds,
    /// The moved footprint would intersect another object.
    #[error("footprint would overlap object '{by}'")]
    Occupied {
        /// Object whose footprint blocks the move.
        by: ObjectId,
    },
}

/// Conflicting ownership discovered while attempting a grip.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Error)]
pub enum GripConflict {
    /// The requested object is already held by a gripper.
    #[error("object '{object}' is already held by gripper '{holder}'")]
    ObjectHeld {
        /// Object that was requested.
        object: ObjectId,
        /// Gripper currently holding it.
        holder: GripperId,
    },
    /// The gripper is already holding another object.
    #[error("gripper '{gripper}' already holds object '{holding}'")]
    GripperOccupied {
        /// Gripper that attempted the grip.
        gripper: GripperId,
        /// Object it is currently holding.
        holding: ObjectId,
    },
}

/// Recoverable failures reported by gameplay mutations.
///
/// When a mutation fails the world is guaranteed to be unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ActionError {
    /// No gripper is registered under the identifier.
    #[error("gripper '{0}' is not registered")]
    GripperNotFound(GripperId),
    /// No object is registered under the identifier.
    #[error("object '{0}' is not registered")]
    ObjectNotFound(ObjectId),
    /// The configuration disables the requested action.
    #[error("action '{0}' is disabled by the configuration")]
    ActionNotAllowed(ActionKind),
    /// The move would overlap another object or leave the grid.
    #[error("move rejected: {0}")]
    Overlap(PlacementError),
    /// The grip would give an object two holders or a gripper two objects.
    #[error("grip rejected: {0}")]
    AlreadyGripped(GripConflict),
    /// The gripper holds nothing to let go of.
    #[error("gripper '{0}' is not holding an object")]
    NothingGripped(GripperId),
}

/// Failures reported while populating a world with entities.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SceneError {
    /// An object with the identifier already exists.
    #[error("object '{0}' is already registered")]
    DuplicateObject(ObjectId),
    /// A gripper with the identifier already exists.
    #[error("gripper '{0}' is already registered")]
    DuplicateGripper(GripperId),
    /// The object's type is absent from the configuration's type table.
    #[error("object '{object}' uses unknown type '{type_name}'")]
    UnknownType {
        /// Object that was being inserted.
        object: ObjectId,
        /// Type name that could not be resolved.
        type_name: String,
    },
}

/// Description of an object to insert during scene setup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewObject {
    /// Type name registered in the configuration.
    #[serde(rename = "type")]
    pub kind: String,
    /// Horizontal position of the top-left corner, in blocks.
    pub x: f32,
    /// Vertical position of the top-left corner, in blocks.
    pub y: f32,
    /// Display color.
    #[serde(default)]
    pub color: Color,
    /// Initial rotation in degrees, rounded to the nearest quarter turn.
    #[serde(default)]
    pub rotation: f32,
    /// Whether the base shape starts reflected.
    #[serde(default)]
    pub mirrored: bool,
}

/// Description of a gripper to insert during scene setup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewGripper {
    /// Horizontal position, in blocks.
    pub x: f32,
    /// Vertical position, in blocks.
    pub y: f32,
    /// Display color.
    #[serde(default)]
    pub color: Color,
}

/// Commands that express all client-driven world mutations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    /// Translates an object by the provided delta.
    MoveObject {
        /// Object to move.
        object: ObjectId,
        /// Horizontal delta in blocks.
        dx: f32,
        /// Vertical delta in blocks.
        dy: f32,
    },
    /// Translates a gripper, and anything it holds, by the provided delta.
    MoveGripper {
        /// Gripper to move.
        gripper: GripperId,
        /// Horizontal delta in blocks.
        dx: f32,
        /// Vertical delta in blocks.
        dy: f32,
    },
    /// Rotates an object clockwise.
    RotateObject {
        /// Object to rotate.
        object: ObjectId,
        /// Angle in degrees, rounded to the nearest quarter turn.
        delta_degrees: f32,
        /// Client-computed rotated shape to store verbatim.
        #[serde(default)]
        shape: Option<Shape>,
    },
    /// Reflects an object across the horizontal axis.
    MirrorObject {
        /// Object to reflect.
        object: ObjectId,
        /// Client-computed reflected shape to store verbatim.
        #[serde(default)]
        shape: Option<Shape>,
    },
    /// Attaches an object to a gripper.
    Grip {
        /// Gripper that grips.
        gripper: GripperId,
        /// Object to attach.
        object: ObjectId,
    },
    /// Detaches the gripper's object without touching its position.
    Ungrip {
        /// Gripper that lets go.
        gripper: GripperId,
    },
    /// Detaches the gripper's object and applies the snap-to-grid policy.
    Release {
        /// Gripper that lets go.
        gripper: GripperId,
    },
}

impl Command {
    /// Action kind the configuration must enable for the command to run.
    ///
    /// Letting go of an object is always permitted, so [`Command::Ungrip`] and
    /// [`Command::Release`] report `None`.
    #[must_use]
    pub const fn required_action(&self) -> Option<ActionKind> {
        match self {
            Self::MoveObject { .. } | Self::MoveGripper { .. } => Some(ActionKind::Move),
            Self::RotateObject { .. } => Some(ActionKind::Rotate),
            Self::MirrorObject { .. } => Some(ActionKind::Mirror),
            Self::Grip { .. } => Some(ActionKind::Grip),
            Self::Ungrip { .. } | Self::Release { .. } => None,
        }
    }
}

/// Events reported by the world after a command was applied.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// An object changed position.
    ObjectMoved {
        /// Object that moved.
        object: ObjectId,
        /// Public state after the move.
        view: ObjectView,
    },
    /// A gripper changed position, carrying its held object along.
    GripperMoved {
        /// Gripper that moved.
        gripper: GripperId,
        /// Public state after the move, including any held object.
        view: GripperView,
    },
    /// An object's rotation changed.
    ObjectRotated {
        /// Object that rotated.
        object: ObjectId,
        /// Public state after the rotation.
        view: ObjectView,
    },
    /// An object's mirror flag toggled.
    ObjectMirrored {
        /// Object that was reflected.
        object: ObjectId,
        /// Public state after the reflection.
        view: ObjectView,
    },
    /// A gripper attached an object.
    Gripped {
        /// Gripper that now holds the object.
        gripper: GripperId,
        /// Object that is now held.
        object: ObjectId,
    },
    /// A gripper let go of an object.
    Ungripped {
        /// Gripper that let go.
        gripper: GripperId,
        /// Object that is free again.
        object: ObjectId,
        /// Public state of the freed object, after any snapping.
        view: ObjectView,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_expose_edges_and_center() {
        let bounds = Bounds::new(1.0, 2.0, 3.0, 3.0);
        assert_eq!(bounds.left(), 1.0);
        assert_eq!(bounds.right(), 4.0);
        assert_eq!(bounds.top(), 2.0);
        assert_eq!(bounds.bottom(), 5.0);
        assert_eq!(bounds.center(), (2.5, 3.5));
    }

    #[test]
    fn touching_bounds_do_not_intersect() {
        let left = Bounds::new(0.0, 0.0, 2.0, 2.0);
        let right = Bounds::new(2.0, 0.0, 2.0, 2.0);
        assert!(!left.intersects(&right));
        assert!(left.intersects(&right.translated(-0.5, 1.5)));
    }

    #[test]
    fn containment_includes_edges() {
        let grid = Bounds::new(0.0, 0.0, 10.0, 10.0);
        assert!(Bounds::new(8.0, 8.0, 2.0, 2.0).contained_in(&grid));
        assert!(!Bounds::new(8.5, 8.0, 2.0, 2.0).contained_in(&grid));
        assert!(!Bounds::new(-0.5, 0.0, 2.0, 2.0).contained_in(&grid));
    }

    #[test]
    fn snapping_rounds_origin_only() {
        let snapped = Bounds::new(1.4, 2.6, 3.0, 3.0).snapped();
        assert_eq!(snapped, Bounds::new(1.0, 3.0, 3.0, 3.0));
    }

    #[test]
    fn commands_decode_from_tagged_json() {
        let command: Command = serde_json::from_str(
            r#"{"action": "rotate_object", "object": "3", "delta_degrees": -90}"#,
        )
        .expect("decode");
        assert_eq!(
            command,
            Command::RotateObject {
                object: ObjectId::new("3"),
                delta_degrees: -90.0,
                shape: None,
            }
        );
        assert_eq!(command.required_action(), Some(ActionKind::Rotate));
    }

    #[test]
    fn letting_go_needs_no_permission() {
        let gripper = GripperId::new("g");
        assert_eq!(Command::Ungrip { gripper: gripper.clone() }.required_action(), None);
        assert_eq!(Command::Release { gripper }.required_action(), None);
    }

    #[test]
    fn errors_render_identifiers() {
        let error = ActionError::Overlap(PlacementError::Occupied {
            by: ObjectId::new("7"),
        });
        assert_eq!(error.to_string(), "move rejected: footprint would overlap object '7'");
    }
}
