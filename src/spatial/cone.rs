//! Geometric cone filter
//!
//! Stands in for the engine's physics cone cast: a sphere of `radius` is
//! swept along the gaze for `depth` metres and hits are kept only when they
//! lie within `angle_deg` of the gaze direction.

use super::{ConeQuery, SpatialFilter, SpatialHandle, Vec3};
use log::trace;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Spherical collider registered by the placement subsystem
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub center: Vec3,
    pub radius: f32,
}

impl Collider {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
        }
    }
}

/// World of colliders answering cone queries
///
/// Holds every collider in the scene, beacon or not. Callers resolve the
/// returned handles against their own tables.
pub struct ConeFilter {
    colliders: RwLock<BTreeMap<SpatialHandle, Collider>>,
}

impl ConeFilter {
    pub fn new() -> Self {
        Self {
            colliders: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register a collider and return its handle
    pub fn add(&self, collider: Collider) -> SpatialHandle {
        let handle = SpatialHandle::next();
        self.colliders.write().insert(handle, collider);
        handle
    }

    /// Register a collider under an existing handle
    pub fn insert(&self, handle: SpatialHandle, collider: Collider) {
        self.colliders.write().insert(handle, collider);
    }

    pub fn remove(&self, handle: SpatialHandle) -> Option<Collider> {
        self.colliders.write().remove(&handle)
    }

    pub fn clear(&self) {
        self.colliders.write().clear();
    }

    pub fn len(&self) -> usize {
        self.colliders.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.read().is_empty()
    }

    /// Distance along the gaze if `collider` is inside the cone
    fn hit_distance(query: &ConeQuery, dir: Vec3, collider: &Collider) -> Option<f32> {
        let to_center = collider.center - query.origin;
        let along = to_center.dot(dir);
        if along < -collider.radius || along > query.depth + collider.radius {
            return None;
        }

        let perpendicular = (to_center - dir * along).length();
        if perpendicular > query.radius + collider.radius {
            return None;
        }

        // Viewer standing inside the collider always sees it
        let distance = to_center.length();
        if distance > collider.radius {
            let cos = (along / distance).clamp(-1.0, 1.0);
            if cos.acos().to_degrees() > query.angle_deg {
                return None;
            }
        }

        Some(along)
    }
}

impl Default for ConeFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialFilter for ConeFilter {
    fn cone_query(&self, query: &ConeQuery) -> Vec<SpatialHandle> {
        let Some(dir) = query.direction.normalized() else {
            return Vec::new();
        };

        let colliders = self.colliders.read();
        let mut hits: Vec<(f32, SpatialHandle)> = colliders
            .iter()
            .filter_map(|(handle, collider)| {
                Self::hit_distance(query, dir, collider).map(|d| (d, *handle))
            })
            .collect();

        hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        trace!("Cone query hit {} of {} colliders", hits.len(), colliders.len());

        hits.into_iter().map(|(_, handle)| handle).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spotlight() -> ConeQuery {
        ConeQuery {
            origin: Vec3::ZERO,
            direction: Vec3::FORWARD,
            radius: 1.0,
            depth: 20.0,
            angle_deg: 120.0,
        }
    }

    #[test]
    fn test_hits_in_front_nearest_first() {
        let filter = ConeFilter::new();
        let far = filter.add(Collider::new(Vec3::new(0.0, 0.0, 10.0), 0.1));
        let near = filter.add(Collider::new(Vec3::new(0.5, 0.0, 2.0), 0.1));

        assert_eq!(filter.cone_query(&spotlight()), vec![near, far]);
    }

    #[test]
    fn test_misses_behind_beside_and_beyond() {
        let filter = ConeFilter::new();
        filter.add(Collider::new(Vec3::new(0.0, 0.0, -3.0), 0.1));
        filter.add(Collider::new(Vec3::new(5.0, 0.0, 3.0), 0.1));
        filter.add(Collider::new(Vec3::new(0.0, 0.0, 25.0), 0.1));

        assert!(filter.cone_query(&spotlight()).is_empty());
    }

    #[test]
    fn test_collider_radius_extends_reach() {
        let filter = ConeFilter::new();
        let wide = filter.add(Collider::new(Vec3::new(1.8, 0.0, 4.0), 1.0));
        assert_eq!(filter.cone_query(&spotlight()), vec![wide]);
    }

    #[test]
    fn test_narrow_angle_rejects_off_axis() {
        let filter = ConeFilter::new();
        filter.add(Collider::new(Vec3::new(0.9, 0.0, 0.5), 0.0));

        let mut query = spotlight();
        assert_eq!(filter.cone_query(&query).len(), 1);
        query.angle_deg = 10.0;
        assert!(filter.cone_query(&query).is_empty());
    }

    #[test]
    fn test_zero_direction_is_empty() {
        let filter = ConeFilter::new();
        filter.add(Collider::new(Vec3::new(0.0, 0.0, 1.0), 0.5));
        let mut query = spotlight();
        query.direction = Vec3::ZERO;
        assert!(filter.cone_query(&query).is_empty());
    }

    #[test]
    fn test_remove_and_clear() {
        let filter = ConeFilter::new();
        let a = filter.add(Collider::new(Vec3::new(0.0, 0.0, 1.0), 0.1));
        filter.add(Collider::new(Vec3::new(0.0, 0.0, 2.0), 0.1));
        assert_eq!(filter.len(), 2);

        assert!(filter.remove(a).is_some());
        assert_eq!(filter.len(), 1);
        filter.clear();
        assert!(filter.is_empty());
    }
}
