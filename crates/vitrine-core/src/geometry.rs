//! Axis-aligned bounding boxes

use glam::{Affine3A, Vec3};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box with the given center and full size
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Smallest box containing every point; `None` for an empty iterator
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vec3>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self::new(first, first);
        for p in iter {
            bounds.min = bounds.min.min(p);
            bounds.max = bounds.max.max(p);
        }
        Some(bounds)
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Largest extent along any axis
    pub fn max_dimension(&self) -> f32 {
        self.size().max_element()
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn translated(&self, offset: Vec3) -> Aabb {
        Aabb {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Bounds of this box after an affine transform (all eight corners)
    pub fn transformed(&self, transform: &Affine3A) -> Aabb {
        let corners = (0..8).map(|i| {
            Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        });
        // Eight corners always yield a box
        Aabb::from_points(corners.map(|c| transform.transform_point3(c)))
            .unwrap_or(*self)
    }

    /// Translation that moves the box so its horizontal center sits on the
    /// vertical axis and its lowest point rests on y = 0.
    pub fn floor_alignment_offset(&self) -> Vec3 {
        let center = self.center();
        Vec3::new(-center.x, -self.min.y, -center.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn test_size_and_center() {
        let b = Aabb::from_center_size(Vec3::splat(10.0), Vec3::new(2.0, 4.0, 2.0));
        assert_eq!(b.size(), Vec3::new(2.0, 4.0, 2.0));
        assert_eq!(b.center(), Vec3::splat(10.0));
        assert_eq!(b.max_dimension(), 4.0);
    }

    #[test]
    fn test_floor_alignment() {
        let b = Aabb::from_center_size(Vec3::splat(10.0), Vec3::new(2.0, 4.0, 2.0));
        let aligned = b.translated(b.floor_alignment_offset());
        assert_eq!(aligned.min.y, 0.0);
        assert_eq!(aligned.center().x, 0.0);
        assert_eq!(aligned.center().z, 0.0);
        assert_eq!(aligned.max.y, 4.0);
    }

    #[test]
    fn test_from_points() {
        assert!(Aabb::from_points(std::iter::empty()).is_none());
        let b = Aabb::from_points([
            Vec3::new(1.0, -2.0, 0.0),
            Vec3::new(-1.0, 3.0, 5.0),
        ])
        .unwrap();
        assert_eq!(b.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(b.max, Vec3::new(1.0, 3.0, 5.0));
    }

    #[test]
    fn test_transformed_rotation() {
        let b = Aabb::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        let rot = Affine3A::from_quat(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        let r = b.transformed(&rot);
        let size = r.size();
        assert!((size.x - 1.0).abs() < 1e-5);
        assert!((size.z - 2.0).abs() < 1e-5);
    }
}
