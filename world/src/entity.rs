//! Authoritative entity records stored inside the world.

use golmi_core::{Bounds, Color, ObjectId, ObjectView, QuarterTurns, Shape};

/// Placement and appearance shared by objects and grippers.
#[derive(Clone, Debug)]
pub(crate) struct Entity {
    x: f32,
    y: f32,
    shape: Shape,
    rotation: QuarterTurns,
    mirrored: bool,
    color: Color,
}

impl Entity {
    /// Creates an unrotated, unreflected entity.
    pub(crate) fn new(x: f32, y: f32, shape: Shape, color: Color) -> Self {
        Self {
            x,
            y,
            shape,
            rotation: QuarterTurns::ZERO,
            mirrored: false,
            color,
        }
    }

    pub(crate) const fn x(&self) -> f32 {
        self.x
    }

    pub(crate) const fn y(&self) -> f32 {
        self.y
    }

    pub(crate) fn color(&self) -> &Color {
        &self.color
    }

    /// Width and height in blocks. Both always equal the shape's side length.
    pub(crate) fn side(&self) -> u32 {
        u32::try_from(self.shape.side()).unwrap_or(u32::MAX)
    }

    /// Footprint used for bounds and overlap checks.
    pub(crate) fn bounds(&self) -> Bounds {
        let side = self.side() as f32;
        Bounds::new(self.x, self.y, side, side)
    }

    pub(crate) fn translate(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }

    pub(crate) fn place_at(&mut self, bounds: &Bounds) {
        self.x = bounds.left();
        self.y = bounds.top();
    }

    /// Applies a rotation, storing `precomputed` verbatim when supplied.
    pub(crate) fn rotate(&mut self, turns: QuarterTurns, precomputed: Option<Shape>) {
        self.shape = precomputed.unwrap_or_else(|| self.shape.rotate_quarter_turns(turns));
        self.rotation = self.rotation.then(turns);
    }

    /// Toggles the mirror flag, storing `precomputed` verbatim when supplied.
    pub(crate) fn mirror(&mut self, precomputed: Option<Shape>) {
        self.shape = precomputed.unwrap_or_else(|| self.shape.mirror());
        self.mirrored = !self.mirrored;
    }
}

/// Block-shaped object that grippers can pick up.
#[derive(Clone, Debug)]
pub(crate) struct Object {
    pub(crate) kind: String,
    pub(crate) entity: Entity,
    /// True iff some gripper's `held_object` names this object.
    pub(crate) held: bool,
}

impl Object {
    pub(crate) fn view(&self) -> ObjectView {
        let side = self.entity.side();
        ObjectView {
            kind: self.kind.clone(),
            x: self.entity.x,
            y: self.entity.y,
            width: side,
            height: side,
            rotation: self.entity.rotation.degrees(),
            mirrored: self.entity.mirrored,
            color: self.entity.color.clone(),
            block_matrix: self.entity.shape.clone(),
            gripped: self.held,
        }
    }
}

/// Client-controlled avatar with a fixed 1×1 footprint.
#[derive(Clone, Debug)]
pub(crate) struct Gripper {
    pub(crate) entity: Entity,
    pub(crate) held_object: Option<ObjectId>,
}

impl Gripper {
    pub(crate) fn new(x: f32, y: f32, color: Color) -> Self {
        Self {
            entity: Entity::new(x, y, Shape::unit(), color),
            held_object: None,
        }
    }
}
