use glam::Vec3;

use crate::camera::OrbitCamera;
use crate::math::{ray_aabb_distance, Aabb, Ray};
use crate::picking::ndc_from_pixels;
use crate::scene::{visit_meshes, NodeHandle};

/// CPU ray caster: one camera ray per pixel against the scene's mesh
/// bounds, nearest hit shaded flat (or texture-sampled for surfaces with
/// an image bound, which is how the animated frames become visible).
pub struct Renderer {
    pub width: u32,
    pub height: u32,
    pub background: [u8; 3],
}

const LIGHT_DIR: Vec3 = Vec3::new(0.4, 0.8, 0.45);

impl Renderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            background: [0xbb, 0xbb, 0xbb],
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
    }

    /// Render the scene to a tightly packed RGBA8 buffer, top row first.
    pub fn render(&self, camera: &OrbitCamera, root: &NodeHandle) -> Vec<u8> {
        let mut meshes: Vec<(Aabb, NodeHandle)> = Vec::new();
        visit_meshes(root, &mut |node, bounds| {
            meshes.push((bounds, node.clone()));
        });

        let aspect = self.width as f32 / self.height as f32;
        let light = LIGHT_DIR.normalize();
        let mut pixels = Vec::with_capacity((self.width * self.height * 4) as usize);

        for py in 0..self.height {
            for px in 0..self.width {
                let (ndc_x, ndc_y) = ndc_from_pixels(
                    px as f32 + 0.5,
                    py as f32 + 0.5,
                    self.width as f32,
                    self.height as f32,
                );
                let ray = camera.ray_from_ndc(ndc_x, ndc_y, aspect);
                let rgb = self.shade(&ray, &meshes, light);
                pixels.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
            }
        }
        pixels
    }

    fn shade(&self, ray: &Ray, meshes: &[(Aabb, NodeHandle)], light: Vec3) -> [u8; 3] {
        let mut nearest: Option<(f32, &Aabb, &NodeHandle)> = None;
        for (bounds, node) in meshes {
            if let Some(t) = ray_aabb_distance(ray, bounds) {
                if nearest.map_or(true, |(best, _, _)| t < best) {
                    nearest = Some((t, bounds, node));
                }
            }
        }
        let Some((t, bounds, node)) = nearest else {
            return self.background;
        };

        let (normal, u, v) = face_uv(bounds, ray.at(t));
        let node = node.borrow();
        let material = &node.mesh.as_ref().unwrap().material;

        if let Some(map) = &material.map {
            // Image-bound surfaces render unlit, like a lit screen.
            let [r, g, b, _] = map.sample_nearest(u, v);
            return [r, g, b];
        }

        // Two-sided flat shading with a little ambient.
        let mut n = normal;
        if n.dot(ray.dir) > 0.0 {
            n = -n;
        }
        let intensity = 0.3 + 0.7 * n.dot(light).max(0.0);
        let c = material.base_color;
        [
            (c[0] * intensity * 255.0) as u8,
            (c[1] * intensity * 255.0) as u8,
            (c[2] * intensity * 255.0) as u8,
        ]
    }
}

/// Which face of the box the point sits on, plus texture coordinates on
/// that face (u right, v down, matching image row order).
fn face_uv(aabb: &Aabb, p: Vec3) -> (Vec3, f32, f32) {
    let extent = (aabb.max - aabb.min).max(Vec3::splat(1e-6));
    let rel = ((p - aabb.min) / extent).clamp(Vec3::ZERO, Vec3::ONE);

    // Distance to the nearest face along each axis, in world units.
    let face_dist = Vec3::new(
        rel.x.min(1.0 - rel.x) * extent.x,
        rel.y.min(1.0 - rel.y) * extent.y,
        rel.z.min(1.0 - rel.z) * extent.z,
    );

    if face_dist.x <= face_dist.y && face_dist.x <= face_dist.z {
        let sign = if rel.x < 0.5 { -1.0 } else { 1.0 };
        (Vec3::X * sign, rel.z, 1.0 - rel.y)
    } else if face_dist.y <= face_dist.z {
        let sign = if rel.y < 0.5 { -1.0 } else { 1.0 };
        (Vec3::Y * sign, rel.x, rel.z)
    } else {
        let sign = if rel.z < 0.5 { -1.0 } else { 1.0 };
        (Vec3::Z * sign, rel.x, 1.0 - rel.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Material, Mesh, Node};
    use crate::texture::ImageResource;

    fn colored_box(name: &str, min: Vec3, max: Vec3, color: [f32; 3]) -> NodeHandle {
        Node::with_mesh(
            name,
            Mesh {
                bounds: Aabb::new(min, max),
                material: Material::colored(color),
            },
        )
    }

    fn pixel(pixels: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * width + x) * 4) as usize;
        [pixels[i], pixels[i + 1], pixels[i + 2], pixels[i + 3]]
    }

    #[test]
    fn empty_scene_is_background() {
        let renderer = Renderer::new(4, 4);
        let camera = OrbitCamera::new(Vec3::ZERO, 10.0);
        let pixels = renderer.render(&camera, &Node::new("root"));
        assert_eq!(pixels.len(), 4 * 4 * 4);
        assert_eq!(pixel(&pixels, 4, 2, 2), [0xbb, 0xbb, 0xbb, 255]);
    }

    #[test]
    fn centered_box_covers_the_center_pixel() {
        let renderer = Renderer::new(9, 9);
        let camera = OrbitCamera::from_position_target(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        let root = Node::new("root");
        root.borrow_mut().children.push(colored_box(
            "cube",
            Vec3::splat(-1.0),
            Vec3::ONE,
            [1.0, 0.0, 0.0],
        ));

        let pixels = renderer.render(&camera, &root);
        let center = pixel(&pixels, 9, 4, 4);
        assert!(center[0] > 0, "center should show the red box");
        assert_eq!(center[1], 0);
        // A corner ray misses the unit box from 10 units out at 45 deg fov.
        assert_eq!(pixel(&pixels, 9, 0, 0), [0xbb, 0xbb, 0xbb, 255]);
    }

    #[test]
    fn image_bound_surface_samples_the_image_unlit() {
        let renderer = Renderer::new(5, 5);
        let camera = OrbitCamera::from_position_target(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        let root = Node::new("root");
        let screen = colored_box(
            "screen",
            Vec3::new(-2.0, -2.0, 0.0),
            Vec3::new(2.0, 2.0, 0.0),
            [0.0, 0.0, 0.0],
        );
        {
            let mut node = screen.borrow_mut();
            let previous = node
                .mesh
                .as_mut()
                .unwrap()
                .material
                .attach_map(ImageResource::solid(2, 2, [12, 34, 56, 255]));
            assert!(previous.is_none());
        }
        root.borrow_mut().children.push(screen);

        let pixels = renderer.render(&camera, &root);
        assert_eq!(pixel(&pixels, 5, 2, 2), [12, 34, 56, 255]);
    }

    #[test]
    fn face_uv_flat_quad_maps_top_left_to_origin() {
        // Screen-like quad in the xy plane, viewed from +z.
        let aabb = Aabb::new(Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 0.0));
        let (normal, u, v) = face_uv(&aabb, Vec3::new(-1.0, 1.0, 0.0));
        assert!(normal.abs_diff_eq(Vec3::Z, 1e-4) || normal.abs_diff_eq(Vec3::NEG_Z, 1e-4));
        assert!(u.abs() < 1e-4, "left edge maps to u=0, got {u}");
        assert!(v.abs() < 1e-4, "top edge maps to v=0, got {v}");
    }
}
