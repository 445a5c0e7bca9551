use std::rc::Rc;

use crate::camera::OrbitCamera;
use crate::math::ray_aabb_distance;
use crate::scene::{visit_meshes, NodeHandle, NodeRef};

/// A pickable surface and the callback its click fires.
pub struct ToggleRegistration {
    pub target: NodeRef,
    pub on_hit: Box<dyn Fn()>,
}

/// Routes pointer events to registered toggle targets: device pixel to
/// NDC, NDC to camera ray, ray against the scene, nearest registered hit
/// wins. One router instance per scene; registrations live and die with
/// it, never with a global listener.
#[derive(Default)]
pub struct PickRouter {
    registrations: Vec<ToggleRegistration>,
}

/// Device pixels to normalized device coordinates. Y flips because
/// device coordinates grow downward and NDC grows upward.
pub fn ndc_from_pixels(x: f32, y: f32, viewport_w: f32, viewport_h: f32) -> (f32, f32) {
    ((x / viewport_w) * 2.0 - 1.0, -(y / viewport_h) * 2.0 + 1.0)
}

impl PickRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, target: NodeRef, on_hit: impl Fn() + 'static) {
        self.registrations.push(ToggleRegistration {
            target,
            on_hit: Box::new(on_hit),
        });
    }

    pub fn registration_count(&self) -> usize {
        self.registrations.len()
    }

    /// Handle one click. Walks ray hits nearest-first and fires the first
    /// registered target's callback, then stops: never more than one
    /// toggle per event, even with colinear targets. Returns whether a
    /// toggle fired; a miss is a no-op, not an error.
    pub fn handle_pointer_event(
        &self,
        x: f32,
        y: f32,
        viewport_w: f32,
        viewport_h: f32,
        camera: &OrbitCamera,
        pickable_root: &NodeHandle,
    ) -> bool {
        let (ndc_x, ndc_y) = ndc_from_pixels(x, y, viewport_w, viewport_h);
        let ray = camera.ray_from_ndc(ndc_x, ndc_y, viewport_w / viewport_h);

        let mut hits: Vec<(f32, NodeHandle)> = Vec::new();
        visit_meshes(pickable_root, &mut |node, bounds| {
            if let Some(t) = ray_aabb_distance(&ray, &bounds) {
                hits.push((t, node.clone()));
            }
        });
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));

        for (_, node) in &hits {
            for registration in &self.registrations {
                let Some(target) = registration.target.upgrade() else {
                    continue;
                };
                if Rc::ptr_eq(&target, node) {
                    (registration.on_hit)();
                    return true;
                }
            }
        }
        false
    }
}
