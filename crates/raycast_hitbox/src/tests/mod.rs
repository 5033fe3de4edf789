//! End-to-end tests driving the engine over a [`StaticScene`]

mod scenarios;

use crate::engine::HitboxEngine;
use crate::foundation::collections::HitboxId;
use crate::foundation::math::Vec3;
use crate::hitbox::{HitEvent, UpdateEvent};
use crate::physics::{CollisionLayers, Plane};
use crate::scene::{ColliderShape, ObjectId, StaticScene};
use std::cell::RefCell;
use std::rc::Rc;

pub(crate) type Recorded<T> = Rc<RefCell<Vec<T>>>;

/// Collect every hit fired by `hitbox`
pub(crate) fn record_hits(engine: &mut HitboxEngine, hitbox: HitboxId) -> Recorded<HitEvent> {
    let hits = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&hits);
    engine
        .hitbox_mut(hitbox)
        .unwrap()
        .on_hit
        .connect(move |event, _| sink.borrow_mut().push(event.clone()));
    hits
}

/// Collect every update fired by `hitbox`
pub(crate) fn record_updates(engine: &mut HitboxEngine, hitbox: HitboxId) -> Recorded<UpdateEvent> {
    let updates = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&updates);
    engine
        .hitbox_mut(hitbox)
        .unwrap()
        .on_update
        .connect(move |event, _| sink.borrow_mut().push(*event));
    updates
}

/// Scene with a model holding a wall plane at z = 2 facing +Z.
///
/// Returns `(scene, model, wall)`.
pub(crate) fn wall_scene() -> (StaticScene, ObjectId, ObjectId) {
    let mut scene = StaticScene::new();
    let model = scene.add_group("Dummy", None);
    scene.mark_entity(model);
    let wall = scene.add_collider(
        "Wall",
        Some(model),
        ColliderShape::Plane(Plane::new(Vec3::new(0.0, 0.0, 2.0), Vec3::z())),
        CollisionLayers::ENVIRONMENT,
    );
    (scene, model, wall)
}
