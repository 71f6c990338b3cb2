//! Minimal collision world: spheres and AABBs on layer bits, queried with
//! capsules and spheres.

use glam::Vec3;
use ogre_core::player::PlayerId;
use smallvec::SmallVec;

pub type ColliderId = u32;

/// Hits returned by a single overlap query.
pub type OverlapHits = SmallVec<[ColliderId; 8]>;

pub mod layers {
    pub const PLAYER: u32 = 1 << 0;
    pub const FLOOR: u32 = 1 << 1;
    pub const PROP: u32 = 1 << 2;
    pub const ALL: u32 = u32::MAX;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Sphere { center: Vec3, radius: f32 },
    Aabb { min: Vec3, max: Vec3 },
}

impl Shape {
    pub fn aabb_from_center(center: Vec3, half_extents: Vec3) -> Self {
        let half = half_extents.abs();
        Shape::Aabb {
            min: center - half,
            max: center + half,
        }
    }

    /// Distance from `p` to the shape surface, zero when inside.
    fn distance_to_point(&self, p: Vec3) -> f32 {
        match *self {
            Shape::Sphere { center, radius } => (p.distance(center) - radius).max(0.0),
            Shape::Aabb { min, max } => (p.clamp(min, max) - p).length(),
        }
    }

    fn translated(&self, delta: Vec3) -> Self {
        match *self {
            Shape::Sphere { center, radius } => Shape::Sphere {
                center: center + delta,
                radius,
            },
            Shape::Aabb { min, max } => Shape::Aabb {
                min: min + delta,
                max: max + delta,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Collider {
    pub id: ColliderId,
    pub shape: Shape,
    pub layer: u32,
    /// Player this collider belongs to, if it is a player body.
    pub owner: Option<PlayerId>,
}

/// Read-only physics queries abilities run against the world.
pub trait PhysicsQuery {
    /// Colliders on `mask` within `radius` of the segment `a..b`.
    fn overlap_capsule(&self, a: Vec3, b: Vec3, radius: f32, mask: u32) -> OverlapHits;

    /// Colliders on `mask` within `radius` of `center`.
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: u32) -> OverlapHits;

    fn collider_owner(&self, id: ColliderId) -> Option<PlayerId>;
}

/// Closest point to `p` on the segment `a..b`.
#[inline]
pub fn closest_point_on_segment(a: Vec3, b: Vec3, p: Vec3) -> Vec3 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 <= 1e-12 {
        return a;
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    a + ab * t
}

/// Shortest distance between segment `a..b` and `shape`.
pub fn segment_shape_distance(a: Vec3, b: Vec3, shape: &Shape) -> f32 {
    match *shape {
        Shape::Sphere { center, radius } => {
            let closest = closest_point_on_segment(a, b, center);
            (closest.distance(center) - radius).max(0.0)
        },
        Shape::Aabb { .. } => {
            // Point-to-box distance is convex along the segment, so a ternary
            // search over t converges to the minimum.
            let mut lo = 0.0f32;
            let mut hi = 1.0f32;
            for _ in 0..48 {
                let m1 = lo + (hi - lo) / 3.0;
                let m2 = hi - (hi - lo) / 3.0;
                let d1 = shape.distance_to_point(a.lerp(b, m1));
                let d2 = shape.distance_to_point(a.lerp(b, m2));
                if d1 <= d2 {
                    hi = m2;
                } else {
                    lo = m1;
                }
            }
            shape.distance_to_point(a.lerp(b, (lo + hi) * 0.5))
        },
    }
}

/// Colliders kept in insertion order so query results are deterministic.
#[derive(Debug, Default)]
pub struct CollisionWorld {
    colliders: Vec<Collider>,
    next_id: ColliderId,
}

impl CollisionWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, shape: Shape, layer: u32, owner: Option<PlayerId>) -> ColliderId {
        self.next_id = self.next_id.wrapping_add(1);
        let id = self.next_id;
        self.colliders.push(Collider {
            id,
            shape,
            layer,
            owner,
        });
        id
    }

    pub fn remove(&mut self, id: ColliderId) -> Option<Collider> {
        let idx = self.colliders.iter().position(|c| c.id == id)?;
        Some(self.colliders.remove(idx))
    }

    pub fn get(&self, id: ColliderId) -> Option<&Collider> {
        self.colliders.iter().find(|c| c.id == id)
    }

    /// Move a collider so its shape is centered on `center`.
    pub fn move_to(&mut self, id: ColliderId, center: Vec3) -> bool {
        let Some(collider) = self.colliders.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        let current = match collider.shape {
            Shape::Sphere { center, .. } => center,
            Shape::Aabb { min, max } => (min + max) * 0.5,
        };
        collider.shape = collider.shape.translated(center - current);
        true
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    fn on_layer(&self, mask: u32) -> impl Iterator<Item = &Collider> {
        self.colliders.iter().filter(move |c| c.layer & mask != 0)
    }
}

impl PhysicsQuery for CollisionWorld {
    fn overlap_capsule(&self, a: Vec3, b: Vec3, radius: f32, mask: u32) -> OverlapHits {
        self.on_layer(mask)
            .filter(|c| segment_shape_distance(a, b, &c.shape) <= radius)
            .map(|c| c.id)
            .collect()
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: u32) -> OverlapHits {
        self.on_layer(mask)
            .filter(|c| c.shape.distance_to_point(center) <= radius)
            .map(|c| c.id)
            .collect()
    }

    fn collider_owner(&self, id: ColliderId) -> Option<PlayerId> {
        self.get(id).and_then(|c| c.owner)
    }
}
