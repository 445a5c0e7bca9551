use glam::Vec3;

use super::Aabb;

/// World-space ray. Direction is expected to be normalized so returned
/// distances are comparable across hits.
#[derive(Copy, Clone, Debug)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self {
            origin,
            dir: dir.normalize(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }
}

/// Slab-method ray/box test. Returns the distance to the entry point, or
/// the exit point when the ray starts inside the box; `None` on a miss or
/// when the box is entirely behind the origin.
pub fn ray_aabb_distance(ray: &Ray, aabb: &Aabb) -> Option<f32> {
    const EPSILON: f32 = 1e-8;

    // Near-zero direction components are clamped before inversion so the
    // slab arithmetic stays finite.
    let inv = |d: f32| {
        if d.abs() < EPSILON {
            1.0 / EPSILON.copysign(d)
        } else {
            1.0 / d
        }
    };
    let inv_dir = Vec3::new(inv(ray.dir.x), inv(ray.dir.y), inv(ray.dir.z));

    let t_min = (aabb.min - ray.origin) * inv_dir;
    let t_max = (aabb.max - ray.origin) * inv_dir;

    let t1 = t_min.min(t_max);
    let t2 = t_min.max(t_max);

    let t_near = t1.x.max(t1.y).max(t1.z);
    let t_far = t2.x.min(t2.y).min(t2.z);

    if t_near > t_far || t_far < 0.0 {
        return None;
    }

    if t_near < 0.0 {
        // Origin inside the box; a grazing exit at ~0 counts as a miss.
        if t_far > 1e-3 {
            Some(t_far)
        } else {
            None
        }
    } else {
        Some(t_near)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_from_outside_returns_entry_distance() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let aabb = Aabb::new(Vec3::new(5.0, -1.0, -1.0), Vec3::new(10.0, 1.0, 1.0));
        let t = ray_aabb_distance(&ray, &aabb).expect("ray should hit");
        assert!((t - 5.0).abs() < 0.01);
    }

    #[test]
    fn miss_returns_none() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let aabb = Aabb::new(Vec3::new(5.0, 2.0, 2.0), Vec3::new(10.0, 3.0, 3.0));
        assert!(ray_aabb_distance(&ray, &aabb).is_none());
    }

    #[test]
    fn origin_inside_returns_exit_distance() {
        let ray = Ray::new(Vec3::new(5.0, 0.0, 0.0), Vec3::X);
        let aabb = Aabb::new(Vec3::new(0.0, -1.0, -1.0), Vec3::new(10.0, 1.0, 1.0));
        let t = ray_aabb_distance(&ray, &aabb).expect("exit hit");
        assert!((t - 5.0).abs() < 0.01);
    }

    #[test]
    fn box_behind_origin_is_a_miss() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let aabb = Aabb::new(Vec3::new(-10.0, -1.0, -1.0), Vec3::new(-5.0, 1.0, 1.0));
        assert!(ray_aabb_distance(&ray, &aabb).is_none());
    }

    #[test]
    fn axis_aligned_flat_box_is_hittable() {
        // A zero-thickness quad, the shape of a television screen.
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let aabb = Aabb::new(Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 0.0));
        let t = ray_aabb_distance(&ray, &aabb).expect("flat box hit");
        assert!((t - 5.0).abs() < 0.01);
    }
}
