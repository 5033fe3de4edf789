//! Sword swing demo: a headless run of the hitbox engine
//!
//! A sword sweeps around the origin through a ring of training dummies and a
//! wall. The blade carries fixed offset points, a linked edge marker pair and
//! a `DmgPoint` marker picked up by recalibration.
//!
//! Usage: `sword_swing [config.toml|config.ron]`

use rand::Rng;
use raycast_hitbox::prelude::*;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use thiserror::Error;

const SWING_SPEED: f32 = 6.0; // Radians per second around Y
const SWING_DURATION: f64 = 1.5; // Seconds each swing stays armed
const SWING_INTERVAL: u64 = 120; // Frames between swings
const DUMMY_COUNT: usize = 4;
const DUMMY_RING_RADIUS: f32 = 2.0;
const TOTAL_FRAMES: u64 = 600;

#[derive(Error, Debug)]
enum DemoError {
    #[error("failed to load config: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Scene objects the driver animates every frame
struct Sword {
    body: ObjectId,
    edge_base: ObjectId,
    edge_tip: ObjectId,
    dmg_point: ObjectId,
    angle: f32,
}

impl Sword {
    fn spawn(scene: &mut StaticScene) -> Self {
        let body = scene.add_body("Sword", None, Transform::identity());
        let edge_base = scene.add_marker("EdgeBase", Some(body), Vec3::zeros());
        let edge_tip = scene.add_marker("EdgeTip", Some(body), Vec3::zeros());
        let dmg_point = scene.add_marker("DmgPoint", Some(body), Vec3::zeros());
        scene.set_group(dmg_point, "pommel");

        let mut sword = Self {
            body,
            edge_base,
            edge_tip,
            dmg_point,
            angle: 0.0,
        };
        sword.sync(scene);
        sword
    }

    fn swing(&mut self, scene: &mut StaticScene, dt: f32) {
        self.angle = (self.angle + SWING_SPEED * dt) % std::f32::consts::TAU;
        self.sync(scene);
    }

    /// Move the body and re-place the markers from its transform
    fn sync(&self, scene: &mut StaticScene) {
        let rotation = Quat::from_axis_angle(&Vec3::y_axis(), self.angle);
        let transform = Transform::from_position_rotation(Vec3::new(0.0, 1.0, 0.0), rotation);
        scene.set_transform(self.body, transform);
        scene.set_marker_position(self.edge_base, transform.transform_point(Vec3::new(0.0, 0.0, -1.0)));
        scene.set_marker_position(self.edge_tip, transform.transform_point(Vec3::new(0.0, 0.0, -3.0)));
        scene.set_marker_position(self.dmg_point, transform.transform_point(Vec3::new(0.0, 0.0, 0.5)));
    }
}

fn load_config() -> Result<EngineConfig, DemoError> {
    match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading engine config from {path}");
            Ok(EngineConfig::load_from_file(&path)?)
        }
        None => Ok(EngineConfig::default().with_hitbox_defaults(HitboxSettings {
            detection_mode: DetectionMode::Entity,
            debug_log: true,
            ..HitboxSettings::default()
        })),
    }
}

fn build_scene(rng: &mut impl Rng) -> (StaticScene, Vec<ObjectId>) {
    let mut scene = StaticScene::new();

    let arena = scene.add_group("Arena", None);
    scene.add_collider(
        "NorthWall",
        Some(arena),
        ColliderShape::Plane(Plane::new(Vec3::new(0.0, 0.0, -2.5), Vec3::z())),
        CollisionLayers::ENVIRONMENT,
    );

    let mut actors = Vec::with_capacity(DUMMY_COUNT);
    for i in 0..DUMMY_COUNT {
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let height = rng.gen_range(0.8..1.2);
        let center = Vec3::new(angle.sin() * DUMMY_RING_RADIUS, height, -angle.cos() * DUMMY_RING_RADIUS);

        let dummy = scene.add_group(&format!("Dummy{i}"), None);
        scene.add_collider(
            "Torso",
            Some(dummy),
            ColliderShape::Sphere(BoundingSphere::new(center, 0.4)),
            CollisionLayers::ENEMY,
        );
        actors.push(scene.attach_actor(dummy));
        log::info!("Spawned dummy {i} at {center:?}");
    }

    (scene, actors)
}

fn run() -> Result<(), DemoError> {
    let config = load_config()?;
    let mut engine = HitboxEngine::new(config)?;
    let mut rng = rand::thread_rng();
    let (mut scene, actors) = build_scene(&mut rng);
    let mut sword = Sword::spawn(&mut scene);

    let hitbox_id = engine.create_hitbox(sword.body, &scene);
    let hitbox = engine.hitbox_mut(hitbox_id)?;
    hitbox.filter = RayFilter::excluding([sword.body]);
    hitbox.add_offset_points(
        sword.body,
        &[Vec3::new(0.0, 0.0, -1.5), Vec3::new(0.0, 0.0, -2.5)],
        Some("blade"),
    );
    hitbox.link_markers(sword.edge_base, sword.edge_tip, Some("edge"));
    log::info!("Sword hitbox has {} points", hitbox.point_count());

    let struck = Rc::new(RefCell::new(HashSet::new()));
    let sink = Rc::clone(&struck);
    let remaining = actors.len();
    hitbox.on_hit.connect(move |event, commands| {
        let group = event.group.as_deref().unwrap_or("-");
        match event.actor {
            Some(actor) => {
                let mut struck = sink.borrow_mut();
                struck.insert(actor);
                log::info!("[{group}] struck actor {actor} ({}/{remaining})", struck.len());
                if struck.len() == remaining {
                    log::info!("Every dummy struck, retiring the sword");
                    commands.destroy(event.hitbox);
                }
            }
            None => log::info!("[{group}] struck {}", event.surface),
        }
    });

    let mut clock = FrameClock::new(engine.config().tick_rate);
    let dt = clock.tick_duration() as f32;
    let mut tick_time = Stopwatch::new();
    let mut totals = TickReport::default();

    while clock.frame_count() < TOTAL_FRAMES {
        if clock.frame_count() % SWING_INTERVAL == 0 && engine.find_hitbox(sword.body).is_some() {
            engine.arm(hitbox_id, Some(SWING_DURATION))?;
        }

        sword.swing(&mut scene, dt);
        let now = clock.step();

        tick_time.start();
        let report = engine.tick(now, &scene);
        tick_time.stop();

        totals.rays_cast += report.rays_cast;
        totals.hits += report.hits;
        totals.skipped_points += report.skipped_points;
        totals.reclaimed_hitboxes += report.reclaimed_hitboxes;
        totals.expired_debug_rays += report.expired_debug_rays;
    }

    let pool = engine.debug_rays();
    log::info!(
        "{} frames: {} rays, {} hits, {} skipped, {} reclaimed, {:.3}ms ticking",
        clock.frame_count(),
        totals.rays_cast,
        totals.hits,
        totals.skipped_points,
        totals.reclaimed_hitboxes,
        tick_time.elapsed_millis()
    );
    log::info!(
        "Debug rays: {} allocated, {} in use, {} in reserve, {} expired",
        pool.total_count(),
        pool.in_use_count(),
        pool.reserve_count(),
        totals.expired_debug_rays
    );
    log::info!("Actors struck: {}/{}", struck.borrow().len(), actors.len());
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    raycast_hitbox::foundation::logging::init_with_default("info");

    log::info!("Starting sword swing demo");

    match run() {
        Ok(()) => {
            log::info!("Sword swing demo completed successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Sword swing demo failed: {e}");
            Err(e.into())
        }
    }
}
