//! Spatial types and the spotlight query seam
//!
//! The narrator never owns geometry. Beacons carry an opaque
//! [`SpatialHandle`] issued by the placement subsystem, and a
//! [`SpatialFilter`] answers cone queries with those handles in hit order.

pub mod cone;

pub use cone::{Collider, ConeFilter};

use std::ops::{Add, Mul, Sub};
use std::sync::atomic::{AtomicU64, Ordering};

/// Point or direction in world space (metres)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const FORWARD: Vec3 = Vec3::new(0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction, or `None` for a zero vector
    pub fn normalized(self) -> Option<Vec3> {
        let len = self.length();
        if len <= f32::EPSILON {
            None
        } else {
            Some(self * (1.0 / len))
        }
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Viewer head pose: where the user stands and where they look
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub forward: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: Vec3::FORWARD,
        }
    }
}

/// Opaque key for a collider owned by the placement subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpatialHandle(u64);

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

impl SpatialHandle {
    /// Allocate a fresh process-unique handle
    pub fn next() -> Self {
        SpatialHandle(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }
}

/// Cone-shaped volume centred on the viewer's gaze
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConeQuery {
    pub origin: Vec3,
    pub direction: Vec3,
    /// Radius of the swept sphere around the gaze ray
    pub radius: f32,
    /// Maximum distance along the gaze
    pub depth: f32,
    /// Maximum angle (degrees) between gaze and a hit
    pub angle_deg: f32,
}

impl ConeQuery {
    pub fn from_pose(pose: Pose, radius: f32, depth: f32, angle_deg: f32) -> Self {
        Self {
            origin: pose.position,
            direction: pose.forward,
            radius,
            depth,
            angle_deg,
        }
    }
}

/// Spatial query used by spotlight passes
pub trait SpatialFilter: Send + Sync {
    /// Handles intersecting the cone, nearest first. Empty when nothing is hit.
    fn cone_query(&self, query: &ConeQuery) -> Vec<SpatialHandle>;
}

/// Source of the current viewer pose
pub trait PoseSource: Send + Sync {
    fn viewer_pose(&self) -> Pose;
}

/// Pose that only changes when told to
pub struct StaticPose {
    pose: parking_lot::Mutex<Pose>,
}

impl StaticPose {
    pub fn new(pose: Pose) -> Self {
        Self {
            pose: parking_lot::Mutex::new(pose),
        }
    }

    pub fn set(&self, pose: Pose) {
        *self.pose.lock() = pose;
    }
}

impl Default for StaticPose {
    fn default() -> Self {
        Self::new(Pose::default())
    }
}

impl PoseSource for StaticPose {
    fn viewer_pose(&self) -> Pose {
        *self.pose.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_math() {
        let a = Vec3::new(1.0, 2.0, 2.0);
        assert_eq!(a.length(), 3.0);
        assert_eq!(a.dot(Vec3::FORWARD), 2.0);
        assert_eq!(a - a, Vec3::ZERO);
        assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 4.0));
    }

    #[test]
    fn test_normalize_zero() {
        assert!(Vec3::ZERO.normalized().is_none());
        let n = Vec3::new(0.0, 0.0, 5.0).normalized().unwrap();
        assert_eq!(n, Vec3::FORWARD);
    }

    #[test]
    fn test_handles_are_unique() {
        let a = SpatialHandle::next();
        let b = SpatialHandle::next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_static_pose() {
        let source = StaticPose::default();
        assert_eq!(source.viewer_pose(), Pose::default());

        let moved = Pose {
            position: Vec3::new(1.0, 0.0, 0.0),
            forward: Vec3::new(1.0, 0.0, 0.0),
        };
        source.set(moved);
        assert_eq!(source.viewer_pose(), moved);
    }
}
