use glam::Vec3;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

use crate::math::Ray;

pub const ORBIT_SPEED: f32 = 0.005;
pub const DOLLY_STEP: f32 = 0.1;
// Keep pitch off the poles so the view basis never degenerates.
const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Orbit camera: a position on a sphere around `target`, driven by mouse
/// drag (orbit) and wheel (dolly). Also the ray source for pick tests.
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
    /// Vertical field of view, radians.
    pub fov_y: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    dragging: bool,
    last_cursor: Option<(f32, f32)>,
}

impl OrbitCamera {
    pub fn new(target: Vec3, distance: f32) -> Self {
        Self {
            target,
            distance,
            yaw: 0.0,
            pitch: 0.0,
            fov_y: 45f32.to_radians(),
            min_distance: 1.0,
            max_distance: 1e6,
            dragging: false,
            last_cursor: None,
        }
    }

    /// Place the camera at `position` looking at `target`, deriving the
    /// orbit parameters from the offset between them.
    pub fn from_position_target(position: Vec3, target: Vec3) -> Self {
        let offset = position - target;
        let distance = offset.length().max(1e-3);
        let yaw = offset.x.atan2(offset.z);
        let pitch = (offset.y / distance).clamp(-1.0, 1.0).asin();
        let mut camera = Self::new(target, distance);
        camera.yaw = yaw;
        camera.pitch = pitch;
        camera
    }

    pub fn position(&self) -> Vec3 {
        let offset = Vec3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.cos(),
        ) * self.distance;
        self.target + offset
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position()).normalize()
    }

    fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let forward = self.forward();
        let right = forward.cross(Vec3::Y).normalize();
        let up = right.cross(forward);
        (forward, right, up)
    }

    /// Ray through a point given in normalized device coordinates
    /// (x right, y up, both in [-1, 1]).
    pub fn ray_from_ndc(&self, ndc_x: f32, ndc_y: f32, aspect: f32) -> Ray {
        let (forward, right, up) = self.basis();
        let tan_half = (self.fov_y * 0.5).tan();
        let dir = forward + right * (ndc_x * tan_half * aspect) + up * (ndc_y * tan_half);
        Ray::new(self.position(), dir)
    }

    /// Re-aim at a new target, keeping the current orbit angles and
    /// distance. Used after a model is recentered on its bounds.
    pub fn retarget(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn dolly(&mut self, steps: f32) {
        self.distance = (self.distance * (1.0 - steps * DOLLY_STEP))
            .clamp(self.min_distance, self.max_distance);
    }

    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * ORBIT_SPEED;
        self.pitch = (self.pitch + dy * ORBIT_SPEED).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Feed winit events; returns true while a drag is consuming cursor
    /// movement (so a release after dragging is not treated as a click).
    pub fn process_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = *state == ElementState::Pressed;
            }
            WindowEvent::CursorMoved { position, .. } => {
                let pos = (position.x as f32, position.y as f32);
                if self.dragging {
                    if let Some((lx, ly)) = self.last_cursor {
                        self.orbit(pos.0 - lx, pos.1 - ly);
                    }
                }
                self.last_cursor = Some(pos);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 60.0,
                };
                self.dolly(steps);
            }
            _ => {}
        }
        self.dragging
    }

    pub fn cursor(&self) -> Option<(f32, f32)> {
        self.last_cursor
    }
}
