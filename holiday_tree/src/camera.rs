//! Orbit camera around the tree.
//!
//! Spherical coordinates (yaw, elevation, distance) around the world origin.
//! The scene group hangs at [`SCENE_OFFSET`], so the tree spans roughly
//! y ∈ [-5, 5.5] in world space and the camera looks at its middle.

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::{Mat4, Vec2, Vec3, Vec4};

/// Where the scene group sits in the world.
pub const SCENE_OFFSET: Vec3 = Vec3::new(0.0, -5.0, 0.0);

pub const START_POSITION: Vec3 = Vec3::new(0.0, 6.0, 22.0);
pub const FOV_Y_DEG: f32 = 35.0;
pub const MIN_DISTANCE: f32 = 5.0;
pub const MAX_DISTANCE: f32 = 50.0;
/// One revolution every 240 s.
pub const AUTO_ROTATE: f32 = TAU / 240.0;

const NEAR: f32 = 0.1;
const FAR: f32 = 1000.0;
/// Radians per dragged pixel.
const DRAG_SPEED: f32 = 0.005;
/// Distance factor per scroll notch.
const ZOOM_STEP: f32 = 0.9;
/// Keeps the camera off the poles, where the up vector degenerates.
const MAX_ELEVATION: f32 = FRAC_PI_2 - 0.01;

/// A point projected onto the screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    /// Pixel coordinates, origin top-left.
    pub screen: Vec2,
    /// Distance along the view axis.
    pub depth:  f32,
    /// Pixels per world unit at this depth.
    pub pixels_per_unit: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    yaw:       f32,
    elevation: f32,
    distance:  f32,
    target:    Vec3,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::looking_from(START_POSITION)
    }
}

impl OrbitCamera {
    /// Camera at `position` looking at the world origin.
    pub fn looking_from(position: Vec3) -> Self {
        let distance = position.length().clamp(MIN_DISTANCE, MAX_DISTANCE);
        let horizontal = Vec2::new(position.x, position.z).length();
        OrbitCamera {
            yaw:       position.x.atan2(position.z),
            elevation: position.y.atan2(horizontal).clamp(-MAX_ELEVATION, MAX_ELEVATION),
            distance,
            target:    Vec3::ZERO,
        }
    }

    pub fn yaw(&self) -> f32       { self.yaw }
    pub fn elevation(&self) -> f32 { self.elevation }
    pub fn distance(&self) -> f32  { self.distance }

    /// World-space eye position.
    pub fn position(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (se, ce) = self.elevation.sin_cos();
        self.target + self.distance * Vec3::new(ce * sy, se, ce * cy)
    }

    /// Eye position in the scene group's frame.
    pub fn scene_position(&self) -> Vec3 {
        self.position() - SCENE_OFFSET
    }

    /// Auto-rotation runs only while the tree is assembled.
    pub fn tick(&mut self, dt: f32, auto_rotate: bool) {
        if auto_rotate && dt.is_finite() && dt > 0.0 {
            self.yaw = (self.yaw + AUTO_ROTATE * dt) % TAU;
        }
    }

    /// Orbit by a mouse drag, in pixels.
    pub fn drag(&mut self, delta: Vec2) {
        self.yaw = (self.yaw - delta.x * DRAG_SPEED) % TAU;
        self.elevation = (self.elevation + delta.y * DRAG_SPEED).clamp(-MAX_ELEVATION, MAX_ELEVATION);
    }

    /// Positive `notches` move closer.
    pub fn zoom(&mut self, notches: f32) {
        if notches.is_finite() {
            self.distance = (self.distance * ZOOM_STEP.powf(notches)).clamp(MIN_DISTANCE, MAX_DISTANCE);
        }
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        let proj = Mat4::perspective_rh(FOV_Y_DEG.to_radians(), aspect.max(1e-3), NEAR, FAR);
        let view = Mat4::look_at_rh(self.position(), self.target, Vec3::Y);
        proj * view
    }

    /// Project a world point onto a `width`×`height` viewport.  `None` behind
    /// the eye.
    pub fn project(&self, view_proj: &Mat4, world: Vec3, width: usize, height: usize) -> Option<Projected> {
        let clip = *view_proj * Vec4::new(world.x, world.y, world.z, 1.0);
        if clip.w <= NEAR {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let (w, h) = (width as f32, height as f32);
        let focal = 0.5 * h / (0.5 * FOV_Y_DEG.to_radians()).tan();
        Some(Projected {
            screen: Vec2::new((ndc.x + 1.0) * 0.5 * w, (1.0 - ndc.y) * 0.5 * h),
            depth:  clip.w,
            pixels_per_unit: focal / clip.w,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_configured_position() {
        let cam = OrbitCamera::default();
        assert!(cam.position().distance(START_POSITION) < 1e-4);
        assert!(cam.scene_position().distance(Vec3::new(0.0, 11.0, 22.0)) < 1e-4);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut cam = OrbitCamera::default();
        cam.zoom(100.0);
        assert_eq!(cam.distance(), MIN_DISTANCE);
        cam.zoom(-100.0);
        assert_eq!(cam.distance(), MAX_DISTANCE);
    }

    #[test]
    fn auto_rotate_only_when_asked() {
        let mut cam = OrbitCamera::default();
        cam.tick(10.0, false);
        assert_eq!(cam.yaw(), 0.0);
        cam.tick(60.0, true);
        assert!((cam.yaw() - TAU / 4.0).abs() < 1e-4);
        // Distance and elevation untouched.
        assert!((cam.position().y - START_POSITION.y).abs() < 1e-3);
    }

    #[test]
    fn drag_never_reaches_the_pole() {
        let mut cam = OrbitCamera::default();
        cam.drag(Vec2::new(0.0, 1.0e6));
        assert!(cam.elevation() < FRAC_PI_2);
        assert!(cam.position().is_finite());
    }

    #[test]
    fn target_projects_to_screen_centre() {
        let cam = OrbitCamera::default();
        let vp = cam.view_projection(4.0 / 3.0);
        let p = cam.project(&vp, Vec3::ZERO, 800, 600).unwrap();
        assert!(p.screen.distance(Vec2::new(400.0, 300.0)) < 0.5);
        assert!((p.depth - START_POSITION.length()).abs() < 1e-2);
    }

    #[test]
    fn points_behind_the_eye_are_culled() {
        let cam = OrbitCamera::default();
        let vp = cam.view_projection(1.0);
        assert!(cam.project(&vp, START_POSITION * 2.0, 100, 100).is_none());
    }
}
