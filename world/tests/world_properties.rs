use std::collections::BTreeMap;

use golmi_core::{
    ActionError, ActionKind, Color, Command, ConfigFile, Configuration, GripConflict, GripperId,
    NewGripper, NewObject, ObjectId, PlacementError,
};
use golmi_world::{apply, query, World};

fn configuration() -> Configuration {
    Configuration::try_from(ConfigFile {
        width: 10,
        height: 10,
        prevent_overlap: true,
        actions: vec![
            ActionKind::Move,
            ActionKind::Rotate,
            ActionKind::Mirror,
            ActionKind::Grip,
        ],
        type_config: BTreeMap::from([
            ("square".to_owned(), vec![vec![1, 1], vec![1, 1]]),
            ("corner".to_owned(), vec![vec![1, 0], vec![1, 1]]),
        ]),
        ..ConfigFile::default()
    })
    .expect("valid configuration")
}

fn spawn_object(world: &mut World, config: &Configuration, id: &str, kind: &str, x: f32, y: f32) {
    let _ = world
        .add_object(
            ObjectId::new(id),
            NewObject {
                kind: kind.to_owned(),
                x,
                y,
                color: Color::default(),
                rotation: 0.0,
                mirrored: false,
            },
            config,
        )
        .expect("object inserted");
}

fn spawn_gripper(world: &mut World, id: &str, x: f32, y: f32) {
    let _ = world
        .add_gripper(
            GripperId::new(id),
            NewGripper {
                x,
                y,
                color: Color::new("green"),
            },
        )
        .expect("gripper inserted");
}

#[test]
fn grip_then_ungrip_restores_free_state() {
    let config = configuration();
    let mut world = World::new();
    spawn_object(&mut world, &config, "o", "corner", 3.0, 3.0);
    spawn_gripper(&mut world, "g", 0.0, 0.0);
    let gripper = GripperId::new("g");
    let object = ObjectId::new("o");
    let before = query::object(&world, &object).expect("object");

    let view = world.grip(&gripper, &object).expect("grip succeeds");
    assert_eq!(view.held_object().map(|(id, _)| id), Some(&object));
    assert!(query::object(&world, &object).expect("object").gripped);
    assert_eq!((view.x, view.y), (0.0, 0.0), "grip does not move the gripper");

    assert_eq!(world.ungrip(&gripper), Ok(object.clone()));
    assert_eq!(query::held_object(&world, &gripper), None);
    assert_eq!(
        query::object(&world, &object).expect("object"),
        before,
        "position, rotation and shape survive a grip round trip"
    );
}

#[test]
fn an_object_has_at_most_one_holder() {
    let config = configuration();
    let mut world = World::new();
    spawn_object(&mut world, &config, "o", "square", 3.0, 3.0);
    spawn_gripper(&mut world, "g1", 0.0, 0.0);
    spawn_gripper(&mut world, "g2", 1.0, 0.0);
    let object = ObjectId::new("o");

    let _ = world
        .grip(&GripperId::new("g1"), &object)
        .expect("first grip succeeds");
    assert_eq!(
        world.grip(&GripperId::new("g2"), &object),
        Err(ActionError::AlreadyGripped(GripConflict::ObjectHeld {
            object: object.clone(),
            holder: GripperId::new("g1"),
        }))
    );
    assert_eq!(query::held_object(&world, &GripperId::new("g2")), None);
}

#[test]
fn a_gripper_holds_at_most_one_object() {
    let config = configuration();
    let mut world = World::new();
    spawn_object(&mut world, &config, "o1", "square", 0.0, 0.0);
    spawn_object(&mut world, &config, "o2", "square", 5.0, 5.0);
    spawn_gripper(&mut world, "g", 0.0, 0.0);
    let gripper = GripperId::new("g");

    let _ = world
        .grip(&gripper, &ObjectId::new("o1"))
        .expect("first grip succeeds");
    assert_eq!(
        world.grip(&gripper, &ObjectId::new("o2")),
        Err(ActionError::AlreadyGripped(GripConflict::GripperOccupied {
            gripper: gripper.clone(),
            holding: ObjectId::new("o1"),
        }))
    );
    assert!(!query::object(&world, &ObjectId::new("o2")).expect("o2").gripped);
}

#[test]
fn unknown_identifiers_and_empty_hands_are_reported() {
    let config = configuration();
    let mut world = World::new();
    spawn_object(&mut world, &config, "o", "square", 0.0, 0.0);
    spawn_gripper(&mut world, "g", 0.0, 0.0);

    assert_eq!(
        world.grip(&GripperId::new("nobody"), &ObjectId::new("o")),
        Err(ActionError::GripperNotFound(GripperId::new("nobody")))
    );
    assert_eq!(
        world.grip(&GripperId::new("g"), &ObjectId::new("nothing")),
        Err(ActionError::ObjectNotFound(ObjectId::new("nothing")))
    );
    assert_eq!(
        world.ungrip(&GripperId::new("g")),
        Err(ActionError::NothingGripped(GripperId::new("g")))
    );
    assert_eq!(
        world.move_object(&ObjectId::new("nothing"), 1.0, 0.0, &config),
        Err(ActionError::ObjectNotFound(ObjectId::new("nothing")))
    );
    assert_eq!(
        world.move_gripper(&GripperId::new("nobody"), 1.0, 0.0, &config),
        Err(ActionError::GripperNotFound(GripperId::new("nobody")))
    );
}

#[test]
fn overlapping_move_is_rejected_without_side_effects() {
    let config = configuration();
    let mut world = World::new();
    spawn_object(&mut world, &config, "left", "square", 0.0, 0.0);
    spawn_object(&mut world, &config, "right", "square", 4.0, 0.0);
    let before = world.to_public_view();

    assert_eq!(
        world.move_object(&ObjectId::new("right"), -2.5, 0.0, &config),
        Err(ActionError::Overlap(PlacementError::Occupied {
            by: ObjectId::new("left"),
        }))
    );
    assert_eq!(world.to_public_view(), before);

    let view = world
        .move_object(&ObjectId::new("right"), -2.0, 0.0, &config)
        .expect("touching edges are allowed");
    assert_eq!(view.x, 2.0);
}

#[test]
fn leaving_the_grid_is_rejected_without_side_effects() {
    let config = configuration();
    let mut world = World::new();
    spawn_object(&mut world, &config, "o", "square", 8.0, 0.0);
    let object = ObjectId::new("o");

    for (dx, dy) in [(0.5, 0.0), (0.0, -0.5), (-8.5, 0.0), (0.0, 8.5)] {
        assert_eq!(
            world.move_object(&object, dx, dy, &config),
            Err(ActionError::Overlap(PlacementError::OutOfBounds)),
            "delta ({dx}, {dy}) must be rejected"
        );
        let bounds = query::object_bounds(&world, &object).expect("bounds");
        assert_eq!((bounds.left(), bounds.top()), (8.0, 0.0));
    }

    let view = world
        .move_object(&object, 0.0, 8.0, &config)
        .expect("bottom edge may touch the grid edge");
    assert_eq!((view.x, view.y), (8.0, 8.0));
}

#[test]
fn holding_gripper_moves_with_its_object() {
    let config = configuration();
    let mut world = World::new();
    spawn_object(&mut world, &config, "o", "square", 5.0, 5.0);
    spawn_gripper(&mut world, "g", 0.0, 0.0);
    let gripper = GripperId::new("g");
    let object = ObjectId::new("o");
    let _ = world.grip(&gripper, &object).expect("grip");

    let view = world
        .move_gripper(&gripper, 1.0, 1.0, &config)
        .expect("composite move");
    assert_eq!((view.x, view.y), (1.0, 1.0));
    let held = query::object(&world, &object).expect("object");
    assert_eq!((held.x, held.y), (6.0, 6.0));
}

#[test]
fn held_object_only_moves_with_its_gripper() {
    let config = configuration();
    let mut world = World::new();
    spawn_object(&mut world, &config, "o", "square", 5.0, 5.0);
    spawn_gripper(&mut world, "g", 5.0, 5.0);
    let gripper = GripperId::new("g");
    let object = ObjectId::new("o");
    let _ = world.grip(&gripper, &object).expect("grip");
    let before = world.to_public_view();

    assert_eq!(
        apply(
            &mut world,
            &config,
            Command::MoveObject {
                object: object.clone(),
                dx: 3.0,
                dy: 0.0,
            },
        ),
        Err(ActionError::AlreadyGripped(GripConflict::ObjectHeld {
            object: object.clone(),
            holder: gripper.clone(),
        }))
    );
    assert_eq!(world.to_public_view(), before);
    assert_eq!(query::gripper_position(&world, &gripper), Some((5.0, 5.0)));

    let _ = world.ungrip(&gripper).expect("ungrip");
    let view = world
        .move_object(&object, 3.0, 0.0, &config)
        .expect("a free object moves on its own");
    assert_eq!(view.x, 8.0);
}

#[test]
fn composite_move_fails_as_a_whole() {
    let config = configuration();
    let mut world = World::new();
    spawn_object(&mut world, &config, "o", "square", 7.0, 5.0);
    spawn_object(&mut world, &config, "wall", "square", 5.0, 0.0);
    spawn_gripper(&mut world, "g", 3.0, 5.0);
    let gripper = GripperId::new("g");
    let _ = world.grip(&gripper, &ObjectId::new("o")).expect("grip");
    let before = world.to_public_view();

    assert_eq!(
        world.move_gripper(&gripper, 2.0, 0.0, &config),
        Err(ActionError::Overlap(PlacementError::OutOfBounds)),
        "held object would cross the right edge"
    );
    assert_eq!(world.to_public_view(), before);

    assert_eq!(
        world.move_gripper(&gripper, 0.0, -6.0, &config),
        Err(ActionError::Overlap(PlacementError::OutOfBounds)),
        "gripper would cross the top edge"
    );
    assert_eq!(world.to_public_view(), before);

    assert_eq!(
        world.move_gripper(&gripper, -0.5, -4.0, &config),
        Err(ActionError::Overlap(PlacementError::Occupied {
            by: ObjectId::new("wall"),
        })),
        "held object would land on another object"
    );
    assert_eq!(world.to_public_view(), before);
}

#[test]
fn empty_handed_gripper_hovers_over_objects() {
    let config = configuration();
    let mut world = World::new();
    spawn_object(&mut world, &config, "o", "square", 1.0, 1.0);
    spawn_gripper(&mut world, "g", 0.0, 0.0);

    let view = world
        .move_gripper(&GripperId::new("g"), 1.5, 1.5, &config)
        .expect("grippers do not collide with objects");
    assert_eq!((view.x, view.y), (1.5, 1.5));
    assert!(view.gripped.is_none());
}

#[test]
fn public_view_matches_wire_contract() {
    let config = configuration();
    let mut world = World::new();
    spawn_object(&mut world, &config, "0", "corner", 2.0, 3.0);
    spawn_gripper(&mut world, "alice", 2.0, 3.0);
    spawn_gripper(&mut world, "bob", 9.0, 9.0);
    let _ = world
        .grip(&GripperId::new("alice"), &ObjectId::new("0"))
        .expect("grip");

    let json = serde_json::to_value(world.to_public_view()).expect("serialize");
    let object = serde_json::json!({
        "type": "corner",
        "x": 2.0,
        "y": 3.0,
        "width": 2,
        "height": 2,
        "rotation": 0,
        "mirrored": false,
        "color": "blue",
        "block_matrix": [[1, 0], [1, 1]],
        "gripped": true
    });
    assert_eq!(
        json,
        serde_json::json!({
            "grippers": {
                "alice": {"x": 2.0, "y": 3.0, "color": "green", "gripped": {"0": object.clone()}},
                "bob": {"x": 9.0, "y": 9.0, "color": "green", "gripped": null}
            },
            "objs": {"0": object}
        })
    );
}
