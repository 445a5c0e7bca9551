use glam::Vec3;

/// Axis-aligned bounding box in world space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box enclosing a set of points. Returns a degenerate box at the
    /// origin for an empty slice.
    pub fn from_points(points: &[Vec3]) -> Self {
        let mut iter = points.iter();
        let Some(&first) = iter.next() else {
            return Self::new(Vec3::ZERO, Vec3::ZERO);
        };
        let mut min = first;
        let mut max = first;
        for &p in iter {
            min = min.min(p);
            max = max.max(p);
        }
        Self { min, max }
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Box after per-axis scale about the origin followed by translation.
    /// Scale components may be negative, so corners are re-sorted.
    pub fn transformed(&self, position: Vec3, scale: Vec3) -> Aabb {
        let a = self.min * scale + position;
        let b = self.max * scale + position;
        Aabb {
            min: a.min(b),
            max: a.max(b),
        }
    }
}
