//! Geometric primitives with ray intersection tests
//!
//! All tests take a [`Ray`] limited to a finite segment: a hit farther than
//! `max_distance` is not a hit. Casting across the motion delta between two
//! frames only cares about geometry inside that delta.

use crate::foundation::math::{Vec3, DEGENERATE_LENGTH_SQUARED};

/// A finite ray for segment casting
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// The origin point of the ray in world space
    pub origin: Vec3,
    /// Normalized direction of the ray
    pub direction: Vec3,
    /// Length of the segment being cast
    pub max_distance: f32,
}

impl Ray {
    /// Build a ray from an origin and an unnormalized delta.
    ///
    /// Returns `None` for a zero-length delta: such a segment cannot hit anything.
    pub fn segment(origin: Vec3, delta: Vec3) -> Option<Self> {
        let length_squared = delta.magnitude_squared();
        if length_squared < DEGENERATE_LENGTH_SQUARED {
            return None;
        }
        let max_distance = length_squared.sqrt();
        Some(Self {
            origin,
            direction: delta / max_distance,
            max_distance,
        })
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    fn within(&self, t: f32) -> bool {
        (0.0..=self.max_distance).contains(&t)
    }
}

/// Intersection of a ray with a primitive: distance, point and surface normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// Distance from the ray origin
    pub distance: f32,
    /// Point of intersection in world space
    pub point: Vec3,
    /// Surface normal at the intersection, facing the ray
    pub normal: Vec3,
}

/// A bounding sphere
#[derive(Debug, Clone, Copy)]
pub struct BoundingSphere {
    /// The center position of the sphere in world space
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Test ray intersection with this sphere
    pub fn intersect_ray(&self, ray: &Ray) -> Option<Intersection> {
        // Solve |origin + t*direction - center|^2 = radius^2 with |direction| = 1
        let oc = ray.origin - self.center;
        let b = oc.dot(&ray.direction);
        let c = oc.dot(&oc) - self.radius * self.radius;

        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrt_discriminant = discriminant.sqrt();
        let t1 = -b - sqrt_discriminant;
        let t2 = -b + sqrt_discriminant;

        // Closest non-negative root; an origin inside the sphere hits the far wall
        let t = if t1 >= 0.0 { t1 } else { t2 };
        if !ray.within(t) {
            return None;
        }

        let point = ray.point_at(t);
        Some(Intersection {
            distance: t,
            point,
            normal: (point - self.center).normalize(),
        })
    }
}

/// An infinite plane given by a point on it and its normal
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    /// Any point on the plane
    pub point: Vec3,
    /// Unit normal
    pub normal: Vec3,
}

impl Plane {
    /// Create a plane, normalizing the given normal
    pub fn new(point: Vec3, normal: Vec3) -> Self {
        Self {
            point,
            normal: normal.normalize(),
        }
    }

    /// Test ray intersection with this plane (either side)
    pub fn intersect_ray(&self, ray: &Ray) -> Option<Intersection> {
        let denom = self.normal.dot(&ray.direction);
        if denom.abs() < 1.0e-6 {
            return None; // Parallel
        }

        let t = (self.point - ray.origin).dot(&self.normal) / denom;
        if !ray.within(t) {
            return None;
        }

        let normal = if denom > 0.0 { -self.normal } else { self.normal };
        Some(Intersection {
            distance: t,
            point: ray.point_at(t),
            normal,
        })
    }
}

/// A triangle in world space
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    /// First vertex
    pub v0: Vec3,
    /// Second vertex
    pub v1: Vec3,
    /// Third vertex
    pub v2: Vec3,
}

impl Triangle {
    /// Creates a new triangle
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self { v0, v1, v2 }
    }

    /// Calculates the normal of the triangle (right-hand rule)
    pub fn normal(&self) -> Vec3 {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;
        edge1.cross(&edge2).normalize()
    }

    /// Möller-Trumbore ray-triangle intersection
    ///
    /// See: "Fast, Minimum Storage Ray/Triangle Intersection" by Möller & Trumbore
    pub fn intersect_ray(&self, ray: &Ray) -> Option<Intersection> {
        const EPSILON: f32 = 0.000_001;

        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;

        let h = ray.direction.cross(&edge2);
        let a = edge1.dot(&h);

        // Ray parallel to triangle?
        if a.abs() < EPSILON {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin - self.v0;
        let u = f * s.dot(&h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&edge1);
        let v = f * ray.direction.dot(&q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(&q);
        if !ray.within(t) {
            return None;
        }

        let normal = self.normal();
        let normal = if normal.dot(&ray.direction) > 0.0 { -normal } else { normal };
        Some(Intersection {
            distance: t,
            point: ray.point_at(t),
            normal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_length_segment_is_rejected() {
        assert!(Ray::segment(Vec3::x(), Vec3::zeros()).is_none());
    }

    #[test]
    fn test_sphere_hit_within_segment() {
        let sphere = BoundingSphere::new(Vec3::new(0.0, 0.0, 5.0), 1.0);
        let ray = Ray::segment(Vec3::zeros(), Vec3::new(0.0, 0.0, 10.0)).unwrap();

        let hit = sphere.intersect_ray(&ray).unwrap();

        assert_relative_eq!(hit.distance, 4.0, epsilon = 1.0e-5);
        assert_relative_eq!(hit.normal, -Vec3::z(), epsilon = 1.0e-5);
    }

    #[test]
    fn test_sphere_beyond_segment_is_missed() {
        let sphere = BoundingSphere::new(Vec3::new(0.0, 0.0, 5.0), 1.0);
        let ray = Ray::segment(Vec3::zeros(), Vec3::new(0.0, 0.0, 3.0)).unwrap();

        assert!(sphere.intersect_ray(&ray).is_none());
    }

    #[test]
    fn test_plane_hit_normal_faces_ray() {
        let plane = Plane::new(Vec3::new(0.0, 0.0, 2.0), Vec3::z());
        let ray = Ray::segment(Vec3::zeros(), Vec3::new(0.0, 0.0, 5.0)).unwrap();

        let hit = plane.intersect_ray(&ray).unwrap();

        assert_relative_eq!(hit.point, Vec3::new(0.0, 0.0, 2.0), epsilon = 1.0e-5);
        assert_relative_eq!(hit.normal, -Vec3::z(), epsilon = 1.0e-5);
    }

    #[test]
    fn test_plane_parallel_ray_misses() {
        let plane = Plane::new(Vec3::zeros(), Vec3::y());
        let ray = Ray::segment(Vec3::new(0.0, 1.0, 0.0), Vec3::x()).unwrap();

        assert!(plane.intersect_ray(&ray).is_none());
    }

    #[test]
    fn test_triangle_hit_and_miss() {
        let triangle = Triangle::new(
            Vec3::new(-1.0, -1.0, 3.0),
            Vec3::new(1.0, -1.0, 3.0),
            Vec3::new(0.0, 1.0, 3.0),
        );
        let through = Ray::segment(Vec3::zeros(), Vec3::new(0.0, 0.0, 4.0)).unwrap();
        let beside = Ray::segment(Vec3::new(5.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 4.0)).unwrap();

        let hit = triangle.intersect_ray(&through).unwrap();
        assert_relative_eq!(hit.distance, 3.0, epsilon = 1.0e-5);
        assert!(triangle.intersect_ray(&beside).is_none());
    }
}
