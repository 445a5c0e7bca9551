mod aabb;
mod ray;

pub use aabb::Aabb;
pub use ray::{ray_aabb_distance, Ray};
