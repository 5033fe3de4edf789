//! Scheduler scenarios: motion, classification and timed disarm

use super::{record_hits, record_updates, wall_scene};
use crate::engine::HitboxEngine;
use crate::foundation::math::{Quat, Transform, Vec3};
use crate::hitbox::{DetectionMode, Point};
use crate::scene::{ObjectId, RayFilter, StaticScene};
use approx::assert_relative_eq;

#[test]
fn test_stationary_rigid_offset_reports_update_without_hit() {
    let mut scene = StaticScene::new();
    let rotation = Quat::from_axis_angle(&Vec3::z_axis(), std::f32::consts::FRAC_PI_2);
    let body = scene.add_body(
        "Blade",
        None,
        Transform::from_position_rotation(Vec3::new(1.0, 2.0, 3.0), rotation),
    );
    let mut engine = HitboxEngine::default();
    let id = engine.create_hitbox(body, &scene);
    engine
        .hitbox_mut(id)
        .unwrap()
        .add_offset_points(body, &[Vec3::new(0.0, 1.0, 0.0)], None);
    let hits = record_hits(&mut engine, id);
    let updates = record_updates(&mut engine, id);
    engine.arm(id, None).unwrap();

    engine.tick(0.0, &scene);

    assert!(hits.borrow().is_empty());
    let updates = updates.borrow();
    assert_eq!(updates.len(), 1);
    // (0, 1, 0) rotated a quarter turn about Z is (-1, 0, 0)
    assert_relative_eq!(updates[0].position, Vec3::new(0.0, 2.0, 3.0), epsilon = 1.0e-5);
}

fn tracked_marker_through_wall(mode: DetectionMode, with_actor: bool) -> (Vec<crate::hitbox::HitEvent>, ObjectId, Option<ObjectId>) {
    let (mut scene, model, wall) = wall_scene();
    let actor = with_actor.then(|| scene.attach_actor(model));
    let sword = scene.add_group("Sword", None);
    let tip = scene.add_marker("Tip", Some(sword), Vec3::zeros());

    let mut engine = HitboxEngine::default();
    let id = engine.create_hitbox(sword, &scene);
    let hitbox = engine.hitbox_mut(id).unwrap();
    hitbox.detection_mode = mode;
    hitbox.add_point(Point::tracked_marker(tip, Some("tip".to_string())));
    let hits = record_hits(&mut engine, id);
    engine.arm(id, None).unwrap();

    engine.tick(0.0, &scene);
    scene.set_marker_position(tip, Vec3::new(0.0, 0.0, 5.0));
    let report = engine.tick(1.0 / 60.0, &scene);
    assert_eq!(report.rays_cast, 1);

    let recorded = hits.borrow().clone();
    (recorded, wall, actor)
}

#[test]
fn test_tracked_marker_crossing_wall_object_mode() {
    let (hits, wall, _) = tracked_marker_through_wall(DetectionMode::Object, false);

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].surface, wall);
    assert_eq!(hits[0].actor, None);
    assert_eq!(hits[0].group.as_deref(), Some("tip"));
    assert_relative_eq!(hits[0].hit.point, Vec3::new(0.0, 0.0, 2.0), epsilon = 1.0e-5);
    assert_relative_eq!(hits[0].hit.distance, 2.0, epsilon = 1.0e-5);
}

#[test]
fn test_entity_mode_drops_hit_without_actor() {
    let (hits, _, _) = tracked_marker_through_wall(DetectionMode::Entity, false);

    assert!(hits.is_empty());
}

#[test]
fn test_entity_mode_reports_actor() {
    let (hits, wall, actor) = tracked_marker_through_wall(DetectionMode::Entity, true);

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].surface, wall);
    assert_eq!(hits[0].actor, actor);
}

#[test]
fn test_skeletal_joint_swing_strikes_wall() {
    let (mut scene, _, wall) = wall_scene();
    let root = scene.add_body("Rig", None, Transform::identity());
    let hand = scene.add_joint("Hand", Some(root), Transform::identity());
    let mut engine = HitboxEngine::default();
    let id = engine.create_hitbox(root, &scene);
    engine
        .hitbox_mut(id)
        .unwrap()
        .add_joint_points(hand, &[Vec3::new(0.0, 0.0, 0.5)], Some("fist"));
    let hits = record_hits(&mut engine, id);
    engine.arm(id, None).unwrap();

    engine.tick(0.0, &scene);
    // Only the joint moves; the rig root stays at the origin
    scene.set_transform(hand, Transform::from_position(Vec3::new(0.0, 0.0, 4.0)));
    let report = engine.tick(1.0 / 60.0, &scene);

    assert_eq!(report.rays_cast, 1);
    let hits = hits.borrow();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].surface, wall);
    assert_eq!(hits[0].group.as_deref(), Some("fist"));
    assert_relative_eq!(hits[0].hit.point, Vec3::new(0.0, 0.0, 2.0), epsilon = 1.0e-5);
    assert_relative_eq!(hits[0].hit.distance, 1.5, epsilon = 1.0e-5);

    let swing = engine
        .debug_rays()
        .visible_rays()
        .map(|(_, ray)| ray)
        .find(|ray| ray.length > 0.0)
        .unwrap();
    assert_relative_eq!(swing.length, 4.0, epsilon = 1.0e-5);
    assert_relative_eq!(swing.transform.position, Vec3::new(0.0, 0.0, 0.5), epsilon = 1.0e-5);
    assert_relative_eq!(swing.transform.forward(), Vec3::z(), epsilon = 1.0e-5);
}

#[test]
fn test_timed_arm_disarms_at_deadline() {
    let mut scene = StaticScene::new();
    let tip = scene.add_marker("Tip", None, Vec3::zeros());
    let mut engine = HitboxEngine::default();
    let id = engine.create_hitbox(tip, &scene);
    let point = engine
        .hitbox_mut(id)
        .unwrap()
        .add_point(Point::tracked_marker(tip, None));

    engine.tick(10.0, &scene);
    engine.arm_at(id, Some(2.0), 10.0).unwrap();

    for now in [10.5, 11.5] {
        engine.tick(now, &scene);
        assert!(engine.hitbox(id).unwrap().is_armed(), "disarmed early at {now}");
    }

    engine.tick(12.0, &scene);
    let hitbox = engine.hitbox(id).unwrap();
    assert!(!hitbox.is_armed());
    assert_eq!(hitbox.deadline(), None);

    engine.tick(12.5, &scene);
    assert_eq!(engine.hitbox(id).unwrap().point(point).unwrap().last_position(), None);
}

#[test]
fn test_arm_before_first_tick_counts_from_that_tick() {
    let mut scene = StaticScene::new();
    let tip = scene.add_marker("Tip", None, Vec3::zeros());
    let mut engine = HitboxEngine::default();
    let id = engine.create_hitbox(tip, &scene);
    engine.hitbox_mut(id).unwrap().add_point(Point::tracked_marker(tip, None));

    // Fresh engine: its last tick time is 0 but the host clock starts at 100
    engine.arm(id, Some(2.0)).unwrap();
    assert_eq!(engine.hitbox(id).unwrap().deadline(), None);

    for now in [100.0, 100.5, 101.5] {
        engine.tick(now, &scene);
        assert!(engine.hitbox(id).unwrap().is_armed(), "disarmed early at {now}");
    }
    assert_eq!(engine.hitbox(id).unwrap().deadline(), Some(102.0));

    engine.tick(102.0, &scene);
    assert_eq!(engine.now(), 102.0);
    assert!(!engine.hitbox(id).unwrap().is_armed());
}

#[test]
fn test_linked_markers_debounce_per_arming() {
    let (mut scene, _, wall) = wall_scene();
    let blade = scene.add_group("Blade", None);
    let base = scene.add_marker("Base", Some(blade), Vec3::zeros());
    let tip = scene.add_marker("Tip", Some(blade), Vec3::new(0.0, 0.0, 5.0));
    let mut engine = HitboxEngine::default();
    let id = engine.create_hitbox(blade, &scene);
    engine.hitbox_mut(id).unwrap().link_markers(base, tip, Some("edge"));
    let hits = record_hits(&mut engine, id);
    engine.arm(id, None).unwrap();

    for tick in 0..3 {
        engine.tick(f64::from(tick) / 60.0, &scene);
    }
    assert_eq!(hits.borrow().len(), 1);

    engine.arm(id, None).unwrap();
    engine.tick(0.1, &scene);
    assert_eq!(hits.borrow().len(), 2);
    assert!(hits.borrow().iter().all(|event| event.surface == wall));
}

#[test]
fn test_bypass_mode_reports_every_tick() {
    let (mut scene, _, _) = wall_scene();
    let base = scene.add_marker("Base", None, Vec3::zeros());
    let tip = scene.add_marker("Tip", None, Vec3::new(0.0, 0.0, 5.0));
    let mut engine = HitboxEngine::default();
    let id = engine.create_hitbox(base, &scene);
    let hitbox = engine.hitbox_mut(id).unwrap();
    hitbox.detection_mode = DetectionMode::Bypass;
    hitbox.link_markers(base, tip, None);
    let hits = record_hits(&mut engine, id);
    engine.arm(id, None).unwrap();

    let total: usize = (0..3)
        .map(|tick| engine.tick(f64::from(tick) / 60.0, &scene).hits)
        .sum();

    assert_eq!(total, 3);
    assert_eq!(hits.borrow().len(), 3);
}

#[test]
fn test_filter_is_passed_to_scene() {
    let (mut scene, model, _) = wall_scene();
    let base = scene.add_marker("Base", None, Vec3::zeros());
    let tip = scene.add_marker("Tip", None, Vec3::new(0.0, 0.0, 5.0));
    let mut engine = HitboxEngine::default();
    let id = engine.create_hitbox(base, &scene);
    let hitbox = engine.hitbox_mut(id).unwrap();
    hitbox.filter = RayFilter::excluding([model]);
    hitbox.link_markers(base, tip, None);
    let hits = record_hits(&mut engine, id);
    engine.arm(id, None).unwrap();

    let report = engine.tick(0.0, &scene);

    assert_eq!(report.rays_cast, 1);
    assert!(hits.borrow().is_empty());
}

#[test]
fn test_unresolvable_point_does_not_stop_tick() {
    let mut scene = StaticScene::new();
    let good = scene.add_marker("Good", None, Vec3::zeros());
    let gone = scene.add_marker("Gone", None, Vec3::zeros());
    let mut engine = HitboxEngine::default();
    let first = engine.create_hitbox(gone, &scene);
    engine.hitbox_mut(first).unwrap().add_point(Point::tracked_marker(gone, None));
    engine.hitbox_mut(first).unwrap().add_point(Point::tracked_marker(good, None));
    let second = engine.create_hitbox(good, &scene);
    engine.hitbox_mut(second).unwrap().add_point(Point::tracked_marker(good, None));
    let first_updates = record_updates(&mut engine, first);
    let second_updates = record_updates(&mut engine, second);
    engine.arm(first, None).unwrap();
    engine.arm(second, None).unwrap();
    scene.remove(gone);

    let report = engine.tick(0.0, &scene);

    assert_eq!(report.skipped_points, 1);
    assert_eq!(report.rays_cast, 2);
    assert_eq!(first_updates.borrow().len(), 1);
    assert_eq!(second_updates.borrow().len(), 1);
    // The broken point stays until the caller removes it
    assert_eq!(engine.hitbox(first).unwrap().point_count(), 2);
}
