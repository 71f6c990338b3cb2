use glam::Vec3;
use serde::{Deserialize, Serialize};

/// World-space placement of a player or spawned object.
///
/// `yaw` is in radians around +Y; yaw 0 faces +Z.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub yaw: f32,
}

impl Pose {
    pub fn new(position: Vec3, yaw: f32) -> Self {
        Self { position, yaw }
    }

    /// Unit vector the pose is facing, in the XZ plane.
    pub fn forward(&self) -> Vec3 {
        Vec3::new(self.yaw.sin(), 0.0, self.yaw.cos())
    }

    /// Unit vector to the right of `forward`, in the XZ plane.
    pub fn right(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, -self.yaw.sin())
    }

    /// Transform a point from pose-local space (x right, y up, z forward)
    /// into world space.
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.right() * local.x + Vec3::Y * local.y + self.forward() * local.z
    }
}
