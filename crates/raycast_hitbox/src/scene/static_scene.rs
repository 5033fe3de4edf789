//! In-memory scene used by tests and the demo
//!
//! A flat object table with parent links. Bodies and joints carry a
//! transform, markers a world position, colliders a world-space shape.
//! Everything is mutated directly between ticks by the driver.

use super::{FilterType, MarkerInfo, ObjectId, RayFilter, RayHit, SceneQuery};
use crate::foundation::math::{Transform, Vec3};
use crate::physics::{BoundingSphere, CollisionLayers, Intersection, Plane, Ray, Triangle};
use std::collections::{HashMap, HashSet};

/// World-space collision geometry
#[derive(Debug, Clone, Copy)]
pub enum ColliderShape {
    /// Sphere collider
    Sphere(BoundingSphere),
    /// Infinite plane
    Plane(Plane),
    /// Single triangle
    Triangle(Triangle),
}

impl ColliderShape {
    fn intersect_ray(&self, ray: &Ray) -> Option<Intersection> {
        match self {
            Self::Sphere(sphere) => sphere.intersect_ray(ray),
            Self::Plane(plane) => plane.intersect_ray(ray),
            Self::Triangle(triangle) => triangle.intersect_ray(ray),
        }
    }
}

#[derive(Debug, Clone)]
enum ObjectKind {
    Group,
    Body(Transform),
    Joint(Transform),
    Marker(Vec3),
    Collider {
        shape: ColliderShape,
        layer: CollisionLayers,
    },
}

#[derive(Debug, Clone)]
struct SceneObject {
    name: String,
    parent: Option<ObjectId>,
    group: Option<String>,
    kind: ObjectKind,
}

/// Simple scene graph implementing [`SceneQuery`]
#[derive(Debug, Default)]
pub struct StaticScene {
    next_id: u64,
    objects: HashMap<ObjectId, SceneObject>,
    entities: HashSet<ObjectId>,
    actors: HashMap<ObjectId, ObjectId>,
}

impl StaticScene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Parents must already exist, so parent links never form a cycle
    fn insert(&mut self, name: &str, parent: Option<ObjectId>, kind: ObjectKind) -> ObjectId {
        let parent = parent.filter(|parent| {
            let exists = self.objects.contains_key(parent);
            if !exists {
                log::warn!("Ignoring unknown parent {parent} for '{name}'");
            }
            exists
        });
        self.next_id += 1;
        let id = ObjectId(self.next_id);
        self.objects.insert(
            id,
            SceneObject {
                name: name.to_string(),
                parent,
                group: None,
                kind,
            },
        );
        id
    }

    /// Add an object with no geometry (a folder or model root)
    pub fn add_group(&mut self, name: &str, parent: Option<ObjectId>) -> ObjectId {
        self.insert(name, parent, ObjectKind::Group)
    }

    /// Add a rigid body with a world transform
    pub fn add_body(&mut self, name: &str, parent: Option<ObjectId>, transform: Transform) -> ObjectId {
        self.insert(name, parent, ObjectKind::Body(transform))
    }

    /// Add a skeletal joint with a world transform
    pub fn add_joint(&mut self, name: &str, parent: Option<ObjectId>, transform: Transform) -> ObjectId {
        self.insert(name, parent, ObjectKind::Joint(transform))
    }

    /// Add a marker at a world position
    pub fn add_marker(&mut self, name: &str, parent: Option<ObjectId>, position: Vec3) -> ObjectId {
        self.insert(name, parent, ObjectKind::Marker(position))
    }

    /// Add a collider on a layer
    pub fn add_collider(
        &mut self,
        name: &str,
        parent: Option<ObjectId>,
        shape: ColliderShape,
        layer: CollisionLayers,
    ) -> ObjectId {
        self.insert(name, parent, ObjectKind::Collider { shape, layer })
    }

    /// Flag an object as a higher-level entity (a model)
    pub fn mark_entity(&mut self, object: ObjectId) {
        self.entities.insert(object);
    }

    /// Give an entity an actor sub-component and return its id
    pub fn attach_actor(&mut self, entity: ObjectId) -> ObjectId {
        self.mark_entity(entity);
        let actor = self.add_group("Actor", Some(entity));
        self.actors.insert(entity, actor);
        actor
    }

    /// Set the hit-group label on an object
    pub fn set_group(&mut self, object: ObjectId, group: impl Into<String>) {
        if let Some(entry) = self.objects.get_mut(&object) {
            entry.group = Some(group.into());
        }
    }

    /// Move a rigid body or skeletal joint
    pub fn set_transform(&mut self, object: ObjectId, transform: Transform) {
        if let Some(entry) = self.objects.get_mut(&object) {
            match &mut entry.kind {
                ObjectKind::Body(current) | ObjectKind::Joint(current) => *current = transform,
                _ => log::warn!("set_transform on {object} which is not a body or joint"),
            }
        }
    }

    /// Move a marker
    pub fn set_marker_position(&mut self, marker: ObjectId, position: Vec3) {
        if let Some(entry) = self.objects.get_mut(&marker) {
            match &mut entry.kind {
                ObjectKind::Marker(current) => *current = position,
                _ => log::warn!("set_marker_position on {marker} which is not a marker"),
            }
        }
    }

    /// Remove a single object (children keep a dangling parent link)
    pub fn remove(&mut self, object: ObjectId) -> bool {
        self.entities.remove(&object);
        self.actors.remove(&object);
        self.objects.remove(&object).is_some()
    }

    /// Check whether an object still exists
    pub fn contains(&self, object: ObjectId) -> bool {
        self.objects.contains_key(&object)
    }

    fn ancestors(&self, object: ObjectId) -> impl Iterator<Item = ObjectId> + '_ {
        std::iter::successors(self.objects.get(&object).and_then(|o| o.parent), move |id| {
            self.objects.get(id).and_then(|o| o.parent)
        })
    }

    fn is_self_or_descendant_of(&self, object: ObjectId, root: ObjectId) -> bool {
        object == root || self.ancestors(object).any(|ancestor| ancestor == root)
    }

    fn passes_filter(&self, object: ObjectId, layer: CollisionLayers, filter: &RayFilter) -> bool {
        if !CollisionLayers::accepts(filter.mask, layer) {
            return false;
        }
        let listed = filter
            .instances
            .iter()
            .any(|&instance| self.is_self_or_descendant_of(object, instance));
        match filter.filter_type {
            FilterType::Exclude => !listed,
            FilterType::Include => listed,
        }
    }
}

impl SceneQuery for StaticScene {
    fn cast_ray(&self, origin: Vec3, direction: Vec3, filter: &RayFilter) -> Option<RayHit> {
        let ray = Ray::segment(origin, direction)?;

        self.objects
            .iter()
            .filter_map(|(&id, object)| match &object.kind {
                ObjectKind::Collider { shape, layer } if self.passes_filter(id, *layer, filter) => {
                    shape.intersect_ray(&ray).map(|hit| (id, hit))
                }
                _ => None,
            })
            // Ties broken by id so results do not depend on hash order
            .min_by(|(a_id, a), (b_id, b)| {
                a.distance
                    .partial_cmp(&b.distance)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a_id.cmp(b_id))
            })
            .map(|(surface, hit)| RayHit {
                surface,
                distance: hit.distance,
                point: hit.point,
                normal: hit.normal,
            })
    }

    fn body_transform(&self, body: ObjectId) -> Option<Transform> {
        match self.objects.get(&body)?.kind {
            ObjectKind::Body(transform) => Some(transform),
            _ => None,
        }
    }

    fn joint_transform(&self, joint: ObjectId) -> Option<Transform> {
        match self.objects.get(&joint)?.kind {
            ObjectKind::Joint(transform) => Some(transform),
            _ => None,
        }
    }

    fn marker_position(&self, marker: ObjectId) -> Option<Vec3> {
        match self.objects.get(&marker)?.kind {
            ObjectKind::Marker(position) => Some(position),
            _ => None,
        }
    }

    fn owning_entity(&self, surface: ObjectId) -> Option<ObjectId> {
        self.ancestors(surface).find(|ancestor| self.entities.contains(ancestor))
    }

    fn actor_of(&self, entity: ObjectId) -> Option<ObjectId> {
        self.actors.get(&entity).copied()
    }

    fn find_markers(&self, root: ObjectId, name: &str) -> Vec<MarkerInfo> {
        let mut markers: Vec<MarkerInfo> = self
            .objects
            .iter()
            .filter(|(&id, object)| {
                matches!(object.kind, ObjectKind::Marker(_))
                    && object.name == name
                    && id != root
                    && self.is_self_or_descendant_of(id, root)
            })
            .map(|(&id, object)| MarkerInfo {
                marker: id,
                group: object.group.clone(),
            })
            .collect();
        markers.sort_by_key(|info| info.marker);
        markers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn wall_scene() -> (StaticScene, ObjectId, ObjectId) {
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

    #[test]
    fn test_cast_ray_reports_nearest_surface() {
        let (mut scene, _, wall) = wall_scene();
        let near = scene.add_collider(
            "Ball",
            None,
            ColliderShape::Sphere(BoundingSphere::new(Vec3::new(0.0, 0.0, 1.0), 0.5)),
            CollisionLayers::ENEMY,
        );

        let hit = scene
            .cast_ray(Vec3::zeros(), Vec3::new(0.0, 0.0, 5.0), &RayFilter::default())
            .unwrap();
        assert_eq!(hit.surface, near);
        assert_relative_eq!(hit.distance, 0.5, epsilon = 1.0e-5);

        let filtered = scene
            .cast_ray(Vec3::zeros(), Vec3::new(0.0, 0.0, 5.0), &RayFilter::excluding([near]))
            .unwrap();
        assert_eq!(filtered.surface, wall);
    }

    #[test]
    fn test_exclude_filter_covers_descendants() {
        let (scene, model, _) = wall_scene();

        let hit = scene.cast_ray(Vec3::zeros(), Vec3::new(0.0, 0.0, 5.0), &RayFilter::excluding([model]));

        assert!(hit.is_none());
    }

    #[test]
    fn test_layer_mask_filters_colliders() {
        let (scene, _, _) = wall_scene();
        let filter = RayFilter::default().with_mask(CollisionLayers::ENEMY);

        assert!(scene.cast_ray(Vec3::zeros(), Vec3::new(0.0, 0.0, 5.0), &filter).is_none());
    }

    #[test]
    fn test_owning_entity_and_actor_lookup() {
        let (mut scene, model, wall) = wall_scene();
        assert_eq!(scene.owning_entity(wall), Some(model));
        assert_eq!(scene.actor_of(model), None);

        let actor = scene.attach_actor(model);
        assert_eq!(scene.actor_of(model), Some(actor));
    }

    #[test]
    fn test_unknown_parent_is_dropped() {
        let mut scene = StaticScene::new();
        scene.mark_entity(ObjectId(1));

        // The first id handed out is 1, so this would otherwise parent itself
        let orphan = scene.add_collider(
            "Orphan",
            Some(ObjectId(1)),
            ColliderShape::Plane(Plane::new(Vec3::zeros(), Vec3::y())),
            CollisionLayers::ENVIRONMENT,
        );
        let ahead = scene.add_marker("Ahead", Some(ObjectId(5)), Vec3::zeros());

        assert_eq!(orphan, ObjectId(1));
        assert_eq!(scene.owning_entity(orphan), None);
        assert_eq!(scene.owning_entity(ahead), None);
        assert!(scene.find_markers(orphan, "Ahead").is_empty());
    }

    #[test]
    fn test_find_markers_matches_name_under_root() {
        let mut scene = StaticScene::new();
        let sword = scene.add_body("Sword", None, Transform::identity());
        let tip = scene.add_marker("DmgPoint", Some(sword), Vec3::new(0.0, 2.0, 0.0));
        scene.set_group(tip, "blade");
        scene.add_marker("Grip", Some(sword), Vec3::zeros());
        scene.add_marker("DmgPoint", None, Vec3::zeros());

        let markers = scene.find_markers(sword, "DmgPoint");

        assert_eq!(
            markers,
            vec![MarkerInfo {
                marker: tip,
                group: Some("blade".to_string()),
            }]
        );
    }
}
