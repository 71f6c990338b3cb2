//! Frame-windowed melee hit detection.
//!
//! A [`HitboxAction`] describes one swing: the frames it is live for and a
//! chain of owner-local points. Points are consumed in pairs, each pair swept
//! as a capsule; a trailing unpaired point is queried as a sphere.

use std::collections::HashSet;

use glam::Vec3;
use ogre_core::pose::Pose;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::collision::{ColliderId, PhysicsQuery, layers};

/// Animation frames per second used to convert elapsed time to frames.
pub const FRAMES_PER_SECOND: f32 = 60.0;

/// Frame index reached after `elapsed` seconds.
pub fn frame_at(elapsed: f32) -> u32 {
    (elapsed.max(0.0) * FRAMES_PER_SECOND).floor() as u32
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitboxAction {
    pub name: String,
    pub start_frame: u32,
    pub end_frame: u32,
    /// Points in the owner's local frame (x right, y up, z forward).
    pub local_points: Vec<Vec3>,
    pub radius: f32,
    #[serde(default = "default_layer_mask")]
    pub layer_mask: u32,
}

fn default_layer_mask() -> u32 {
    layers::PLAYER
}

impl HitboxAction {
    pub fn contains_frame(&self, frame: u32) -> bool {
        frame >= self.start_frame && frame <= self.end_frame
    }

    pub fn world_points(&self, pose: &Pose) -> SmallVec<[Vec3; 8]> {
        self.local_points
            .iter()
            .map(|p| pose.transform_point(*p))
            .collect()
    }
}

/// The actions making up one attack.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HitboxTimeline {
    pub actions: Vec<HitboxAction>,
}

impl HitboxTimeline {
    /// Last frame any action is live on.
    pub fn end_frame(&self) -> u32 {
        self.actions.iter().map(|a| a.end_frame).max().unwrap_or(0)
    }
}

/// Runs one [`HitboxAction`] for a single activation.
#[derive(Debug, Clone)]
pub struct MeleeHitboxExecutor {
    start_frame: u32,
    end_frame: u32,
    radius: f32,
    layer_mask: u32,
    already_hit: HashSet<ColliderId>,
    finished: bool,
}

impl MeleeHitboxExecutor {
    pub fn new(start_frame: u32, end_frame: u32, radius: f32, layer_mask: u32) -> Self {
        Self {
            start_frame,
            end_frame,
            radius,
            layer_mask,
            already_hit: HashSet::new(),
            finished: false,
        }
    }

    pub fn from_action(action: &HitboxAction) -> Self {
        Self::new(
            action.start_frame,
            action.end_frame,
            action.radius,
            action.layer_mask,
        )
    }

    /// Query the world at `frame` with world-space `points`.
    ///
    /// `on_hit` is called once per collider over the whole activation.
    /// Returns the number of new hits this tick.
    pub fn tick<F>(
        &mut self,
        frame: u32,
        points: &[Vec3],
        physics: &dyn PhysicsQuery,
        mut on_hit: F,
    ) -> usize
    where
        F: FnMut(ColliderId),
    {
        if frame > self.end_frame {
            self.finished = true;
        }
        if self.finished || frame < self.start_frame {
            return 0;
        }

        let mut new_hits = 0;
        for chunk in points.chunks(2) {
            let found = match *chunk {
                [a, b] => physics.overlap_capsule(a, b, self.radius, self.layer_mask),
                [p] => physics.overlap_sphere(p, self.radius, self.layer_mask),
                _ => continue,
            };
            for id in found {
                if self.already_hit.insert(id) {
                    new_hits += 1;
                    on_hit(id);
                }
            }
        }
        new_hits
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn hit_count(&self) -> usize {
        self.already_hit.len()
    }

    /// Forget hits and rearm for another activation.
    pub fn reset(&mut self) {
        self.already_hit.clear();
        self.finished = false;
    }
}

/// Drives every action of a [`HitboxTimeline`] from the owner's pose.
#[derive(Debug, Clone)]
pub struct HitboxManager {
    timeline: HitboxTimeline,
    executors: Vec<MeleeHitboxExecutor>,
}

impl HitboxManager {
    pub fn new(timeline: HitboxTimeline) -> Self {
        let executors = timeline
            .actions
            .iter()
            .map(MeleeHitboxExecutor::from_action)
            .collect();
        Self {
            timeline,
            executors,
        }
    }

    /// Tick all actions at `frame`; `on_hit` receives the action name and collider.
    pub fn tick<F>(&mut self, frame: u32, pose: &Pose, physics: &dyn PhysicsQuery, mut on_hit: F)
    where
        F: FnMut(&str, ColliderId),
    {
        for (action, executor) in self.timeline.actions.iter().zip(self.executors.iter_mut()) {
            let points = action.world_points(pose);
            executor.tick(frame, &points, physics, |id| on_hit(&action.name, id));
        }
    }

    pub fn is_finished(&self) -> bool {
        self.executors.iter().all(MeleeHitboxExecutor::is_finished)
    }

    pub fn end_frame(&self) -> u32 {
        self.timeline.end_frame()
    }

    pub fn reset(&mut self) {
        for executor in &mut self.executors {
            executor.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{CollisionWorld, Shape};

    fn world_with_sphere(center: Vec3, radius: f32) -> (CollisionWorld, ColliderId) {
        let mut world = CollisionWorld::new();
        let id = world.insert(Shape::Sphere { center, radius }, layers::PLAYER, Some(9));
        (world, id)
    }

    #[test]
    fn midpoint_collider_hit_inside_window() {
        let (world, id) = world_with_sphere(Vec3::new(1.0, 0.0, 0.0), 0.1);
        let mut exec = MeleeHitboxExecutor::new(5, 10, 0.2, layers::PLAYER);
        let points = [Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)];
        let mut hits = Vec::new();
        exec.tick(7, &points, &world, |c| hits.push(c));
        assert_eq!(hits, vec![id]);
    }

    #[test]
    fn no_hit_outside_window() {
        let (world, _) = world_with_sphere(Vec3::new(1.0, 0.0, 0.0), 0.1);
        let points = [Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)];

        let mut early = MeleeHitboxExecutor::new(5, 10, 0.2, layers::PLAYER);
        assert_eq!(early.tick(4, &points, &world, |_| {}), 0);
        assert!(!early.is_finished());

        let mut late = MeleeHitboxExecutor::new(5, 10, 0.2, layers::PLAYER);
        assert_eq!(late.tick(11, &points, &world, |_| {}), 0);
        assert!(late.is_finished());
    }

    #[test]
    fn collinear_points_hit_each_collider_once() {
        let mut world = CollisionWorld::new();
        let a = world.insert(
            Shape::Sphere {
                center: Vec3::new(1.0, 0.0, 0.0),
                radius: 0.3,
            },
            layers::PLAYER,
            None,
        );
        let b = world.insert(
            Shape::Sphere {
                center: Vec3::new(4.0, 0.0, 0.0),
                radius: 0.3,
            },
            layers::PLAYER,
            None,
        );
        // Both colliders overlap on every frame of the window.
        let points: Vec<Vec3> = (0..6).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect();
        let mut exec = MeleeHitboxExecutor::new(0, 20, 0.2, layers::PLAYER);
        let mut hits = Vec::new();
        for frame in 0..=20 {
            exec.tick(frame, &points, &world, |c| hits.push(c));
        }
        hits.sort_unstable();
        assert_eq!(hits, vec![a, b]);
        assert_eq!(exec.hit_count(), 2);
    }

    #[test]
    fn gap_between_pairs_is_not_swept() {
        // Pairs are (0,1), (2,3), (4,5): nothing covers 1..2.
        let (world, _) = world_with_sphere(Vec3::new(1.5, 0.0, 0.0), 0.1);
        let points: Vec<Vec3> = (0..6).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect();
        let mut exec = MeleeHitboxExecutor::new(0, 1, 0.2, layers::PLAYER);
        assert_eq!(exec.tick(0, &points, &world, |_| {}), 0);
    }

    #[test]
    fn trailing_point_queries_sphere() {
        let (world, id) = world_with_sphere(Vec3::new(0.0, 0.0, 5.0), 0.1);
        let points = [
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, 5.05),
        ];
        let mut exec = MeleeHitboxExecutor::new(0, 1, 0.1, layers::PLAYER);
        let mut hits = Vec::new();
        exec.tick(0, &points, &world, |c| hits.push(c));
        assert_eq!(hits, vec![id]);
    }

    #[test]
    fn reset_rearms_activation() {
        let (world, _) = world_with_sphere(Vec3::new(1.0, 0.0, 0.0), 0.1);
        let points = [Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)];
        let mut exec = MeleeHitboxExecutor::new(0, 2, 0.2, layers::PLAYER);
        assert_eq!(exec.tick(1, &points, &world, |_| {}), 1);
        assert_eq!(exec.tick(2, &points, &world, |_| {}), 0);
        exec.tick(3, &points, &world, |_| {});
        assert!(exec.is_finished());
        exec.reset();
        assert_eq!(exec.tick(1, &points, &world, |_| {}), 1);
    }

    #[test]
    fn manager_uses_owner_pose() {
        // Target one unit in front of an owner facing +X.
        let (world, id) = world_with_sphere(Vec3::new(11.0, 1.0, 0.0), 0.3);
        let timeline = HitboxTimeline {
            actions: vec![HitboxAction {
                name: "swing".into(),
                start_frame: 0,
                end_frame: 3,
                local_points: vec![Vec3::new(-0.5, 1.0, 1.0), Vec3::new(0.5, 1.0, 1.0)],
                radius: 0.1,
                layer_mask: layers::PLAYER,
            }],
        };
        let pose = Pose {
            position: Vec3::new(10.0, 0.0, 0.0),
            yaw: std::f32::consts::FRAC_PI_2,
        };
        let mut manager = HitboxManager::new(timeline);
        let mut hits = Vec::new();
        manager.tick(1, &pose, &world, |name, c| hits.push((name.to_string(), c)));
        assert_eq!(hits, vec![("swing".to_string(), id)]);
        assert!(!manager.is_finished());
        manager.tick(4, &pose, &world, |_, _| {});
        assert!(manager.is_finished());
    }

    #[test]
    fn frame_at_converts_seconds() {
        assert_eq!(frame_at(0.0), 0);
        assert_eq!(frame_at(0.5), 30);
        assert_eq!(frame_at(-1.0), 0);
    }
}
