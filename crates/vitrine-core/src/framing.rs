//! Camera framing for a freshly loaded model

use glam::Vec3;

use crate::config::CameraConfig;

/// Where the camera should sit and what it should look at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
    /// Distance between position and target
    pub distance: f32,
}

/// Distance at which `max_dimension` fills the vertical field of view,
/// scaled by the framing multiplier.
pub fn framing_distance(max_dimension: f32, config: &CameraConfig) -> f32 {
    let half_fov = (config.fov_degrees.to_radians() * 0.5).tan();
    let fit = max_dimension / (2.0 * half_fov);
    (fit * config.framing_multiplier).max(config.min_distance)
}

/// Pose for a model of the given size that has already been floor-aligned
/// (horizontal center on the Y axis, lowest point at y = 0).
pub fn frame_floor_aligned(size: Vec3, config: &CameraConfig) -> CameraPose {
    let distance = framing_distance(size.max_element(), config);
    let target = Vec3::new(0.0, size.y * 0.5, 0.0);
    let direction = Vec3::from_array(config.view_direction).normalize_or(Vec3::ONE.normalize());
    CameraPose {
        position: target + direction * distance,
        target,
        distance,
    }
}

/// Far plane distance as a multiple of the framed distance. Leaves room
/// for the far side of the model and for zooming out to twice the pose.
const FAR_FACTOR: f32 = 4.0;

/// Near and far clip distances for a camera pose
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRange {
    pub near: f32,
    pub far: f32,
}

impl ClipRange {
    /// Furthest orbit distance that keeps the target inside the far plane
    pub fn max_orbit_distance(&self) -> f32 {
        self.far * 0.5
    }
}

/// Clip planes for `pose`, never tighter than the configured ones. When the
/// far plane grows, the near plane grows with it so depth precision holds.
pub fn clip_range(pose: &CameraPose, config: &CameraConfig) -> ClipRange {
    let far = pose.distance * FAR_FACTOR;
    if far <= config.far || config.far <= 0.0 {
        return ClipRange {
            near: config.near,
            far: config.far.max(far),
        };
    }
    ClipRange {
        near: config.near.max(far * (config.near / config.far)),
        far,
    }
}
