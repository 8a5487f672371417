#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for the gripper world.
//!
//! The [`World`] owns every object and gripper. Each mutation validates
//! against the active [`Configuration`] before writing anything, so a rejected
//! mutation always leaves the world exactly as it was.

mod entity;
mod shared;

use std::collections::BTreeMap;

use golmi_core::{
    ActionError, ActionKind, Bounds, Command, Configuration, Event, GripConflict, GripperId,
    GripperView, NewGripper, NewObject, ObjectId, ObjectView, PlacementError, QuarterTurns,
    SceneError, Shape, WorldView,
};
use tracing::{debug, info};

use entity::{Entity, Gripper, Object};

pub use shared::SharedWorld;

/// Represents the authoritative world state.
#[derive(Clone, Debug, Default)]
pub struct World {
    objects: BTreeMap<ObjectId, Object>,
    grippers: BTreeMap<GripperId, Gripper>,
}

impl World {
    /// Creates an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an object built from its type's base shape.
    ///
    /// The base shape is rotated by `spec.rotation` and then reflected when
    /// `spec.mirrored` is set.
    pub fn add_object(
        &mut self,
        id: ObjectId,
        spec: NewObject,
        config: &Configuration,
    ) -> Result<ObjectView, SceneError> {
        if self.objects.contains_key(&id) {
            return Err(SceneError::DuplicateObject(id));
        }
        let Some(base) = config.shape_for(&spec.kind) else {
            return Err(SceneError::UnknownType {
                object: id,
                type_name: spec.kind,
            });
        };

        let mut entity = Entity::new(spec.x, spec.y, base.clone(), spec.color);
        entity.rotate(QuarterTurns::from_degrees(spec.rotation), None);
        if spec.mirrored {
            entity.mirror(None);
        }

        let object = Object {
            kind: spec.kind,
            entity,
            held: false,
        };
        let view = object.view();
        debug!(object = %id, kind = %object.kind, "object_added");
        let _ = self.objects.insert(id, object);
        Ok(view)
    }

    /// Inserts an empty-handed gripper.
    pub fn add_gripper(
        &mut self,
        id: GripperId,
        spec: NewGripper,
    ) -> Result<GripperView, SceneError> {
        if self.grippers.contains_key(&id) {
            return Err(SceneError::DuplicateGripper(id));
        }
        let gripper = Gripper::new(spec.x, spec.y, spec.color);
        let view = self.gripper_view(&gripper);
        debug!(gripper = %id, "gripper_added");
        let _ = self.grippers.insert(id, gripper);
        Ok(view)
    }

    /// Removes a gripper, freeing whatever it held.
    ///
    /// Returns the identifier of the object that was dropped, if any.
    pub fn remove_gripper(&mut self, id: &GripperId) -> Result<Option<ObjectId>, ActionError> {
        let gripper = self
            .grippers
            .remove(id)
            .ok_or_else(|| ActionError::GripperNotFound(id.clone()))?;
        if let Some(object_id) = &gripper.held_object {
            if let Some(object) = self.objects.get_mut(object_id) {
                object.held = false;
            }
        }
        debug!(gripper = %id, "gripper_removed");
        Ok(gripper.held_object)
    }

    /// Administrative reset that removes every object and gripper.
    pub fn reset(&mut self) {
        info!(
            objects = self.objects.len(),
            grippers = self.grippers.len(),
            "world_reset"
        );
        self.objects.clear();
        self.grippers.clear();
    }

    /// Translates a free object by the raw delta.
    ///
    /// A held object only moves with its gripper. With overlap prevention
    /// enabled the moved footprint must stay inside the grid and must not
    /// intersect any other object that is not held.
    pub fn move_object(
        &mut self,
        id: &ObjectId,
        dx: f32,
        dy: f32,
        config: &Configuration,
    ) -> Result<ObjectView, ActionError> {
        let object = self.object_record(id)?;
        if let Some(holder) = self.holder_of(id) {
            return Err(ActionError::AlreadyGripped(GripConflict::ObjectHeld {
                object: id.clone(),
                holder: holder.clone(),
            }));
        }
        let candidate = object.entity.bounds().translated(dx, dy);
        if config.prevent_overlap() {
            self.check_object_placement(id, &candidate, config)
                .map_err(ActionError::Overlap)?;
        }

        let object = self.object_record_mut(id)?;
        object.entity.translate(dx, dy);
        debug!(object = %id, dx, dy, "object_moved");
        Ok(object.view())
    }

    /// Translates a gripper and the object it holds by the same delta.
    ///
    /// Both moves are validated before either is applied, so they succeed or
    /// fail together.
    pub fn move_gripper(
        &mut self,
        id: &GripperId,
        dx: f32,
        dy: f32,
        config: &Configuration,
    ) -> Result<GripperView, ActionError> {
        let gripper = self.gripper_record(id)?;
        let held = gripper.held_object.clone();
        if config.prevent_overlap() {
            let candidate = gripper.entity.bounds().translated(dx, dy);
            if !candidate.contained_in(&config.grid_bounds()) {
                return Err(ActionError::Overlap(PlacementError::OutOfBounds));
            }
            if let Some(object_id) = &held {
                let object = self.object_record(object_id)?;
                let candidate = object.entity.bounds().translated(dx, dy);
                self.check_object_placement(object_id, &candidate, config)
                    .map_err(ActionError::Overlap)?;
            }
        } else if let Some(object_id) = &held {
            let _ = self.object_record(object_id)?;
        }

        if let Some(object_id) = &held {
            self.object_record_mut(object_id)?.entity.translate(dx, dy);
        }
        let gripper = self.gripper_record_mut(id)?;
        gripper.entity.translate(dx, dy);
        debug!(gripper = %id, dx, dy, carrying = held.is_some(), "gripper_moved");

        let gripper = self.gripper_record(id)?;
        Ok(self.gripper_view(gripper))
    }

    /// Rotates an object clockwise by `delta_degrees`.
    ///
    /// The delta is rounded to the nearest quarter turn; a delta that rounds
    /// to zero succeeds without changing anything. A `precomputed` shape is
    /// stored as-is instead of rotating the current one.
    pub fn rotate_object(
        &mut self,
        id: &ObjectId,
        delta_degrees: f32,
        precomputed: Option<Shape>,
        config: &Configuration,
    ) -> Result<ObjectView, ActionError> {
        let _ = self.object_record(id)?;
        config.ensure_allowed(ActionKind::Rotate)?;

        let object = self.object_record_mut(id)?;
        let turns = QuarterTurns::from_degrees(delta_degrees);
        if turns.is_zero() {
            return Ok(object.view());
        }
        object.entity.rotate(turns, precomputed);
        debug!(object = %id, degrees = turns.degrees(), "object_rotated");
        Ok(object.view())
    }

    /// Reflects an object across the horizontal axis.
    pub fn mirror_object(
        &mut self,
        id: &ObjectId,
        precomputed: Option<Shape>,
        config: &Configuration,
    ) -> Result<ObjectView, ActionError> {
        let _ = self.object_record(id)?;
        config.ensure_allowed(ActionKind::Mirror)?;

        let object = self.object_record_mut(id)?;
        object.entity.mirror(precomputed);
        debug!(object = %id, "object_mirrored");
        Ok(object.view())
    }

    /// Attaches an object to a gripper without moving either of them.
    pub fn grip(
        &mut self,
        gripper_id: &GripperId,
        object_id: &ObjectId,
    ) -> Result<GripperView, ActionError> {
        let gripper = self.gripper_record(gripper_id)?;
        let _ = self.object_record(object_id)?;
        if let Some(holder) = self.holder_of(object_id) {
            return Err(ActionError::AlreadyGripped(GripConflict::ObjectHeld {
                object: object_id.clone(),
                holder: holder.clone(),
            }));
        }
        if let Some(holding) = &gripper.held_object {
            return Err(ActionError::AlreadyGripped(GripConflict::GripperOccupied {
                gripper: gripper_id.clone(),
                holding: holding.clone(),
            }));
        }

        self.object_record_mut(object_id)?.held = true;
        self.gripper_record_mut(gripper_id)?.held_object = Some(object_id.clone());
        debug!(gripper = %gripper_id, object = %object_id, "object_gripped");

        let gripper = self.gripper_record(gripper_id)?;
        Ok(self.gripper_view(gripper))
    }

    /// Detaches the gripper's object, leaving its position untouched.
    ///
    /// Returns the identifier of the object that was let go.
    pub fn ungrip(&mut self, gripper_id: &GripperId) -> Result<ObjectId, ActionError> {
        let gripper = self.gripper_record_mut(gripper_id)?;
        let object_id = gripper
            .held_object
            .take()
            .ok_or_else(|| ActionError::NothingGripped(gripper_id.clone()))?;
        if let Some(object) = self.objects.get_mut(&object_id) {
            object.held = false;
        }
        debug!(gripper = %gripper_id, object = %object_id, "object_ungripped");
        Ok(object_id)
    }

    /// Detaches the gripper's object and applies the snap-to-grid policy.
    ///
    /// With snapping enabled the freed object is moved to the nearest whole
    /// cell, unless that cell would violate the overlap rules, in which case
    /// it keeps its current position.
    pub fn release(
        &mut self,
        gripper_id: &GripperId,
        config: &Configuration,
    ) -> Result<(ObjectId, ObjectView), ActionError> {
        let object_id = self.ungrip(gripper_id)?;
        let object = self.object_record(&object_id)?;
        if config.snap_to_grid() {
            let snapped = object.entity.bounds().snapped();
            let admissible = !config.prevent_overlap()
                || self
                    .check_object_placement(&object_id, &snapped, config)
                    .is_ok();
            if admissible {
                self.object_record_mut(&object_id)?.entity.place_at(&snapped);
                debug!(object = %object_id, x = snapped.left(), y = snapped.top(), "object_snapped");
            } else {
                debug!(object = %object_id, "snap_skipped");
            }
        }

        let view = self.object_record(&object_id)?.view();
        Ok((object_id, view))
    }

    /// Captures the complete public snapshot of the world.
    #[must_use]
    pub fn to_public_view(&self) -> WorldView {
        WorldView {
            grippers: self
                .grippers
                .iter()
                .map(|(id, gripper)| (id.clone(), self.gripper_view(gripper)))
                .collect(),
            objs: self
                .objects
                .iter()
                .map(|(id, object)| (id.clone(), object.view()))
                .collect(),
        }
    }

    fn object_record(&self, id: &ObjectId) -> Result<&Object, ActionError> {
        self.objects
            .get(id)
            .ok_or_else(|| ActionError::ObjectNotFound(id.clone()))
    }

    fn object_record_mut(&mut self, id: &ObjectId) -> Result<&mut Object, ActionError> {
        self.objects
            .get_mut(id)
            .ok_or_else(|| ActionError::ObjectNotFound(id.clone()))
    }

    fn gripper_record(&self, id: &GripperId) -> Result<&Gripper, ActionError> {
        self.grippers
            .get(id)
            .ok_or_else(|| ActionError::GripperNotFound(id.clone()))
    }

    fn gripper_record_mut(&mut self, id: &GripperId) -> Result<&mut Gripper, ActionError> {
        self.grippers
            .get_mut(id)
            .ok_or_else(|| ActionError::GripperNotFound(id.clone()))
    }

    fn holder_of(&self, object_id: &ObjectId) -> Option<&GripperId> {
        self.grippers
            .iter()
            .find(|(_, gripper)| gripper.held_object.as_ref() == Some(object_id))
            .map(|(id, _)| id)
    }

    /// Checks a candidate footprint for `moving` against the grid and every
    /// other object that is not currently held.
    fn check_object_placement(
        &self,
        moving: &ObjectId,
        candidate: &Bounds,
        config: &Configuration,
    ) -> Result<(), PlacementError> {
        if !candidate.contained_in(&config.grid_bounds()) {
            return Err(PlacementError::OutOfBounds);
        }
        let blocker = self.objects.iter().find(|(id, object)| {
            *id != moving && !object.held && object.entity.bounds().intersects(candidate)
        });
        match blocker {
            Some((id, _)) => Err(PlacementError::Occupied { by: id.clone() }),
            None => Ok(()),
        }
    }

    fn gripper_view(&self, gripper: &Gripper) -> GripperView {
        let gripped = gripper.held_object.as_ref().and_then(|object_id| {
            self.objects
                .get(object_id)
                .map(|object| BTreeMap::from([(object_id.clone(), object.view())]))
        });
        GripperView {
            x: gripper.entity.x(),
            y: gripper.entity.y(),
            color: gripper.entity.color().clone(),
            gripped,
        }
    }
}

/// Applies a client command after checking that the configuration allows it.
///
/// This is the admission-controlled entry point used by transport adapters.
/// Rejected commands are reported to the caller and leave the world unchanged.
pub fn apply(
    world: &mut World,
    config: &Configuration,
    command: Command,
) -> Result<Event, ActionError> {
    if let Some(kind) = command.required_action() {
        config.ensure_allowed(kind).map_err(|error| {
            debug!(action = %kind, "command_not_allowed");
            error
        })?;
    }

    let outcome = match command {
        Command::MoveObject { object, dx, dy } => world
            .move_object(&object, dx, dy, config)
            .map(|view| Event::ObjectMoved { object, view }),
        Command::MoveGripper { gripper, dx, dy } => world
            .move_gripper(&gripper, dx, dy, config)
            .map(|view| Event::GripperMoved { gripper, view }),
        Command::RotateObject {
            object,
            delta_degrees,
            shape,
        } => world
            .rotate_object(&object, delta_degrees, shape, config)
            .map(|view| Event::ObjectRotated { object, view }),
        Command::MirrorObject { object, shape } => world
            .mirror_object(&object, shape, config)
            .map(|view| Event::ObjectMirrored { object, view }),
        Command::Grip { gripper, object } => world
            .grip(&gripper, &object)
            .map(|_| Event::Gripped { gripper, object }),
        Command::Ungrip { gripper } => world.ungrip(&gripper).and_then(|object| {
            let view = query::object(world, &object)
                .ok_or_else(|| ActionError::ObjectNotFound(object.clone()))?;
            Ok(Event::Ungripped {
                gripper,
                object,
                view,
            })
        }),
        Command::Release { gripper } => world
            .release(&gripper, config)
            .map(|(object, view)| Event::Ungripped {
                gripper,
                object,
                view,
            }),
    };

    if let Err(error) = &outcome {
        debug!(%error, "command_rejected");
    }
    outcome
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use golmi_core::{Bounds, GripperId, GripperView, ObjectId, ObjectView};

    use super::World;

    /// Identifiers of every object in sorted order.
    pub fn object_ids(world: &World) -> impl Iterator<Item = &ObjectId> {
        world.objects.keys()
    }

    /// Identifiers of every gripper in sorted order.
    pub fn gripper_ids(world: &World) -> impl Iterator<Item = &GripperId> {
        world.grippers.keys()
    }

    /// Public attributes of an object, if registered.
    #[must_use]
    pub fn object(world: &World, id: &ObjectId) -> Option<ObjectView> {
        world.objects.get(id).map(|object| object.view())
    }

    /// Public attributes of a gripper, if registered.
    #[must_use]
    pub fn gripper(world: &World, id: &GripperId) -> Option<GripperView> {
        world
            .grippers
            .get(id)
            .map(|gripper| world.gripper_view(gripper))
    }

    /// Footprint of an object, exposing its edges and center.
    #[must_use]
    pub fn object_bounds(world: &World, id: &ObjectId) -> Option<Bounds> {
        world.objects.get(id).map(|object| object.entity.bounds())
    }

    /// Footprint of a gripper, exposing its edges and center.
    #[must_use]
    pub fn gripper_bounds(world: &World, id: &GripperId) -> Option<Bounds> {
        world.grippers.get(id).map(|gripper| gripper.entity.bounds())
    }

    /// Position of a gripper as `(x, y)`, if registered.
    #[must_use]
    pub fn gripper_position(world: &World, id: &GripperId) -> Option<(f32, f32)> {
        world
            .grippers
            .get(id)
            .map(|gripper| (gripper.entity.x(), gripper.entity.y()))
    }

    /// Identifier of the object a gripper holds, if any.
    #[must_use]
    pub fn held_object<'world>(world: &'world World, id: &GripperId) -> Option<&'world ObjectId> {
        world
            .grippers
            .get(id)
            .and_then(|gripper| gripper.held_object.as_ref())
    }
}
