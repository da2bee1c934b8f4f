//! Scene graph scenarios: propagation, reparenting and the spatial index

use std::f32::consts::FRAC_PI_2;
use std::sync::{Arc, Mutex};

use approx::assert_relative_eq;
use scene_engine::foundation::math::{Mat4, Quat, Sqt, Vec3};
use scene_engine::render::device::MeshHandle;
use scene_engine::render::Mesh;
use scene_engine::scene::{EntityDesc, EntityId, ImportedEntity, ImportedScene, Scene, SceneError};
use scene_engine::spatial::AxisAlignedBox;

fn unit_mesh() -> Arc<Mesh> {
    Arc::new(Mesh::new(
        "unit",
        MeshHandle(1),
        AxisAlignedBox::from_center_extents(Vec3::zeros(), Vec3::repeat(0.5)),
    ))
}

fn global_translation(scene: &Scene, id: EntityId) -> Vec3 {
    scene.get(id).unwrap().global_position()
}

/// Every entity's global transform equals its parent's global times its local
fn assert_hierarchy_consistent(scene: &Scene) {
    for (_, entity) in scene.iter() {
        let parent_global = entity
            .parent()
            .map_or_else(Mat4::identity, |parent| *scene.get(parent).unwrap().global_transform());
        let expected = parent_global * entity.local_transform().to_matrix();
        assert_relative_eq!(*entity.global_transform(), expected, epsilon = 1e-5);
    }
}

#[test]
fn test_child_follows_moved_root() {
    let mut scene = Scene::default();
    let root = scene.spawn(EntityDesc::new("R")).unwrap();
    let child = scene
        .spawn(EntityDesc::new("C").with_parent(root).with_translation(Vec3::new(1.0, 0.0, 0.0)))
        .unwrap();

    scene.set_translation(root, Vec3::new(5.0, 0.0, 0.0)).unwrap();
    assert_relative_eq!(global_translation(&scene, child), Vec3::new(6.0, 0.0, 0.0), epsilon = 1e-6);
    assert_hierarchy_consistent(&scene);
}

#[test]
fn test_reparent_uses_new_parent_global() {
    let mut scene = Scene::default();
    let a = scene
        .spawn(EntityDesc::new("A").with_translation(Vec3::new(-4.0, 0.0, 0.0)))
        .unwrap();
    let b = scene
        .spawn(EntityDesc::new("B").with_transform(Sqt::new(
            Vec3::repeat(2.0),
            Quat::from_euler_angles(0.0, FRAC_PI_2, 0.0),
            Vec3::new(0.0, 3.0, 0.0),
        )))
        .unwrap();
    let c = scene
        .spawn(EntityDesc::new("C").with_parent(a).with_translation(Vec3::new(1.0, 0.0, 0.0)))
        .unwrap();
    assert_relative_eq!(global_translation(&scene, c), Vec3::new(-3.0, 0.0, 0.0), epsilon = 1e-6);

    scene.add_child(b, c).unwrap();

    let expected = scene.get(b).unwrap().global_transform() * scene.get(c).unwrap().local_transform().to_matrix();
    assert_relative_eq!(*scene.get(c).unwrap().global_transform(), expected, epsilon = 1e-5);
    assert_eq!(scene.parent(c), Some(b));
    assert!(scene.children(a).is_empty());
    assert_eq!(scene.children(b), &[c]);
}

#[test]
fn test_propagation_is_idempotent() {
    let mut scene = Scene::default();
    let root = scene
        .spawn(EntityDesc::new("root").with_transform(Sqt::from_yaw_pitch_roll(0.3, 0.2, 0.1)).with_mesh(unit_mesh()))
        .unwrap();
    let mid = scene
        .spawn(EntityDesc::new("mid").with_parent(root).with_translation(Vec3::new(0.0, 1.5, 0.0)).with_mesh(unit_mesh()))
        .unwrap();
    let leaf = scene
        .spawn(EntityDesc::new("leaf").with_parent(mid).with_translation(Vec3::new(2.0, 0.0, -1.0)).with_mesh(unit_mesh()))
        .unwrap();

    scene.propagate(root).unwrap();
    let first: Vec<_> = [root, mid, leaf]
        .iter()
        .map(|&id| {
            let entity = scene.get(id).unwrap();
            (*entity.global_transform(), *entity.global_bounding_box())
        })
        .collect();

    scene.propagate(root).unwrap();
    let second: Vec<_> = [root, mid, leaf]
        .iter()
        .map(|&id| {
            let entity = scene.get(id).unwrap();
            (*entity.global_transform(), *entity.global_bounding_box())
        })
        .collect();

    assert_eq!(first, second);
    assert_hierarchy_consistent(&scene);
}

#[test]
fn test_remove_child_of_wrong_parent_is_rejected() {
    let mut scene = Scene::default();
    let a = scene.spawn(EntityDesc::new("a")).unwrap();
    let b = scene.spawn(EntityDesc::new("b")).unwrap();
    let c = scene.spawn(EntityDesc::new("c").with_parent(a)).unwrap();

    let error = scene.remove_child(b, c).unwrap_err();
    assert_eq!(error, SceneError::NotAChild { parent: b, child: c });
    assert!(error.to_string().starts_with("Entity was not a child"));
    assert_eq!(scene.parent(c), Some(a));
}

#[test]
fn test_cycles_are_rejected() {
    let mut scene = Scene::default();
    let a = scene.spawn(EntityDesc::new("a")).unwrap();
    let b = scene.spawn(EntityDesc::new("b").with_parent(a)).unwrap();
    let c = scene.spawn(EntityDesc::new("c").with_parent(b)).unwrap();

    assert_eq!(scene.add_child(c, a), Err(SceneError::WouldCreateCycle { parent: c, child: a }));
    assert_eq!(scene.add_child(a, a), Err(SceneError::WouldCreateCycle { parent: a, child: a }));
    assert_eq!(scene.roots(), vec![a]);
    assert_hierarchy_consistent(&scene);
}

#[test]
fn test_destroy_orphans_children_in_place() {
    let mut scene = Scene::default();
    let parent = scene
        .spawn(EntityDesc::new("parent").with_translation(Vec3::new(10.0, 0.0, 0.0)).indexed(true))
        .unwrap();
    let child = scene
        .spawn(
            EntityDesc::new("child")
                .with_parent(parent)
                .with_translation(Vec3::new(1.0, 0.0, 0.0))
                .with_mesh(unit_mesh())
                .indexed(true),
        )
        .unwrap();

    let died = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&died);
    scene.on_about_to_die(move |id, name| sink.lock().unwrap().push((id, name.to_string())));

    scene.destroy(parent).unwrap();

    assert_eq!(*died.lock().unwrap(), vec![(parent, "parent".to_string())]);
    assert!(!scene.contains(parent));
    assert!(!scene.octree().contains(parent));
    assert!(scene.get(child).unwrap().is_root());
    assert_relative_eq!(global_translation(&scene, child), Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-6);
    assert_eq!(scene.get(parent).unwrap_err(), SceneError::EntityNotFound(parent));

    let around_origin = AxisAlignedBox::from_center_extents(Vec3::new(1.0, 0.0, 0.0), Vec3::repeat(1.0));
    assert_eq!(scene.query(&around_origin), vec![child]);
}

#[test]
fn test_indexed_subtree_moves_in_octree() {
    let mut scene = Scene::default();
    let root = scene.spawn(EntityDesc::new("root").with_mesh(unit_mesh()).indexed(true)).unwrap();
    let child = scene
        .spawn(
            EntityDesc::new("child")
                .with_parent(root)
                .with_translation(Vec3::new(0.0, 0.0, 2.0))
                .with_mesh(unit_mesh())
                .indexed(true),
        )
        .unwrap();

    scene.set_translation(root, Vec3::new(200.0, 200.0, 200.0)).unwrap();

    let far = AxisAlignedBox::from_center_extents(Vec3::new(200.0, 200.0, 201.0), Vec3::repeat(5.0));
    let mut found = scene.query(&far);
    found.sort();
    let mut expected = vec![root, child];
    expected.sort();
    assert_eq!(found, expected);

    let near_origin = AxisAlignedBox::from_center_extents(Vec3::zeros(), Vec3::repeat(5.0));
    assert!(scene.query(&near_origin).is_empty());
    assert_eq!(scene.octree().count(), 2);
}

#[test]
fn test_reparented_child_moves_to_new_octant() {
    let mut scene = Scene::default();
    let west = scene
        .spawn(EntityDesc::new("west").with_translation(Vec3::new(-300.0, -300.0, -300.0)))
        .unwrap();
    let east = scene
        .spawn(EntityDesc::new("east").with_translation(Vec3::new(300.0, 300.0, 300.0)))
        .unwrap();
    let child = scene
        .spawn(
            EntityDesc::new("child")
                .with_parent(west)
                .with_translation(Vec3::new(1.0, 0.0, 0.0))
                .with_mesh(unit_mesh())
                .indexed(true),
        )
        .unwrap();

    let old_area = AxisAlignedBox::from_center_extents(Vec3::new(-299.0, -300.0, -300.0), Vec3::repeat(2.0));
    let new_area = AxisAlignedBox::from_center_extents(Vec3::new(301.0, 300.0, 300.0), Vec3::repeat(2.0));
    assert_eq!(scene.query(&old_area), vec![child]);
    assert!(scene.query(&new_area).is_empty());

    scene.add_child(east, child).unwrap();

    assert_eq!(scene.query(&new_area), vec![child]);
    assert!(scene.query(&old_area).is_empty());
    assert_eq!(scene.octree().count(), 1);
    assert_hierarchy_consistent(&scene);
}

#[test]
fn test_foreach_indexed_visits_only_indexed_entities() {
    let mut scene = Scene::default();
    let a = scene
        .spawn(EntityDesc::new("a").with_translation(Vec3::new(10.0, 0.0, 0.0)).with_mesh(unit_mesh()).indexed(true))
        .unwrap();
    let b = scene
        .spawn(EntityDesc::new("b").with_translation(Vec3::new(-50.0, 20.0, 5.0)).with_mesh(unit_mesh()).indexed(true))
        .unwrap();
    scene.spawn(EntityDesc::new("hidden").with_mesh(unit_mesh())).unwrap();

    let mut visited = Vec::new();
    scene.foreach_indexed(|id, entity| visited.push((id, entity.name.clone())));
    visited.sort();
    let mut expected = vec![(a, "a".to_string()), (b, "b".to_string())];
    expected.sort();
    assert_eq!(visited, expected);

    scene.unindex(a).unwrap();
    let mut remaining = Vec::new();
    scene.foreach_indexed(|id, _| remaining.push(id));
    assert_eq!(remaining, vec![b]);
}

type Mutator = fn(&mut Scene, EntityId) -> Result<(), SceneError>;

#[test]
fn test_every_transform_mutator_notifies() {
    let mutators: [(&str, Mutator); 20] = [
        ("set_scale", |s, id| s.set_scale(id, Vec3::repeat(2.0))),
        ("multiply_scale", |s, id| s.multiply_scale(id, Vec3::repeat(0.5))),
        ("set_translation", |s, id| s.set_translation(id, Vec3::new(1.0, 2.0, 3.0))),
        ("set_translation_x", |s, id| s.set_translation_x(id, 4.0)),
        ("set_translation_y", |s, id| s.set_translation_y(id, 5.0)),
        ("set_translation_z", |s, id| s.set_translation_z(id, 6.0)),
        ("add_translation", |s, id| s.add_translation(id, Vec3::x())),
        ("set_rotation", |s, id| s.set_rotation(id, Quat::from_euler_angles(0.0, FRAC_PI_2, 0.0))),
        ("post_multiply_rotation", |s, id| s.post_multiply_rotation(id, Quat::from_euler_angles(0.1, 0.0, 0.0))),
        ("pre_multiply_rotation", |s, id| s.pre_multiply_rotation(id, Quat::from_euler_angles(0.0, 0.0, 0.1))),
        ("set_local_transform", |s, id| s.set_local_transform(id, Sqt::identity())),
        ("post_add_local_transform", |s, id| s.post_add_local_transform(id, Sqt::from_translation(Vec3::y()))),
        ("pre_add_local_transform", |s, id| s.pre_add_local_transform(id, Sqt::from_translation(Vec3::z()))),
        ("move_forward", |s, id| s.move_forward(id, 1.0)),
        ("move_backward", |s, id| s.move_backward(id, 1.0)),
        ("move_right", |s, id| s.move_right(id, 1.0)),
        ("move_left", |s, id| s.move_left(id, 1.0)),
        ("move_up", |s, id| s.move_up(id, 1.0)),
        ("move_down", |s, id| s.move_down(id, 1.0)),
        ("unset_parent", |s, id| s.unset_parent(id)),
    ];

    for (name, mutate) in mutators {
        let mut scene = Scene::default();
        let parent = scene.spawn(EntityDesc::new("parent")).unwrap();
        let id = scene.spawn(EntityDesc::new("target").with_parent(parent)).unwrap();
        let notified = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&notified);
        scene.on_transform_changed(move |changed, global| sink.lock().unwrap().push((changed, *global)));

        mutate(&mut scene, id).unwrap();

        let notified = notified.lock().unwrap();
        assert_eq!(notified.len(), 1, "{name} should notify once");
        assert_eq!(notified[0].0, id, "{name} notified the wrong entity");
        assert_relative_eq!(notified[0].1, *scene.get(id).unwrap().global_transform(), epsilon = 1e-6);
    }
}

#[test]
fn test_import_builds_hierarchy_and_index() {
    let mut imported = ImportedScene {
        meshes: vec![unit_mesh()],
        ..ImportedScene::default()
    };
    let mut root = ImportedEntity::new("world");
    root.children = vec![1, 2];
    let mut ground = ImportedEntity::new("ground");
    ground.mesh = Some(0);
    ground.local_transform = Sqt::from_translation(Vec3::new(0.0, -1.0, 0.0));
    let mut pivot = ImportedEntity::new("pivot");
    pivot.local_transform = Sqt::from_translation(Vec3::new(3.0, 0.0, 0.0));
    pivot.children = vec![3];
    let mut moon = ImportedEntity::new("moon");
    moon.mesh = Some(0);
    moon.local_transform = Sqt::from_translation(Vec3::new(0.0, 0.0, 2.0));
    imported.entities = vec![root, ground, pivot, moon];

    let (scene, handles) = Scene::from_import(&Default::default(), &imported).unwrap();

    assert_eq!(scene.len(), 4);
    assert_eq!(handles.root, handles.entities[0]);
    assert_eq!(scene.children(handles.root), &[handles.entities[1], handles.entities[2]]);
    assert_eq!(scene.find_by_name("moon"), Some(handles.entities[3]));
    assert_relative_eq!(global_translation(&scene, handles.entities[3]), Vec3::new(3.0, 0.0, 2.0), epsilon = 1e-6);
    assert_eq!(scene.octree().count(), 4);
    assert!(Arc::ptr_eq(
        scene.get(handles.entities[1]).unwrap().mesh().unwrap(),
        scene.get(handles.entities[3]).unwrap().mesh().unwrap()
    ));
    assert_hierarchy_consistent(&scene);
}
