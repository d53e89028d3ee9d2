//! Photo orientation.
//!
//! From straight above, photos that face radially outward read well and
//! camera-facing ones collapse edge-on into a pile; from the side it is the
//! other way round.  The look-at point is therefore blended between the two
//! by how far the camera sits above the tree, with no discontinuity at any
//! angle.  The photo's up vector is always world up.

use glam::{Mat3, Quat, Vec3};

/// `(1 − |cos φ|)^1.5` where φ is the angle between the camera direction
/// (from the tree centre) and the vertical axis.
///
/// 0 looking straight down, 1 looking level with the horizon.
pub fn blend_factor(camera_dir: Vec3) -> f32 {
    let dir = camera_dir.normalize_or_zero();
    if dir == Vec3::ZERO {
        return 1.0;
    }
    let cos_polar = dir.dot(Vec3::Y).clamp(-1.0, 1.0);
    (1.0 - cos_polar.abs()).powf(1.5)
}

/// Same factor expressed through the camera's elevation above the horizon.
pub fn blend_from_elevation(elevation: f32) -> f32 {
    (1.0 - elevation.sin().abs().min(1.0)).powf(1.5)
}

/// Point a photo at `position` should look at.
///
/// The radial candidate lies horizontally outward from the tree axis
/// (at `center_y`); the camera candidate is the camera dropped to the photo's
/// own height so the photo never tilts.
pub fn look_target(position: Vec3, camera: Vec3, center_y: f32, blend: f32) -> Vec3 {
    let radial = Vec3::new(position.x, center_y, position.z) + position;
    let level_camera = Vec3::new(camera.x, position.y, camera.z);
    radial.lerp(level_camera, blend.clamp(0.0, 1.0))
}

/// Rotation turning local +Z toward `target`, keeping +Y as close to world up
/// as possible.  Degenerate directions (target on top of `from`, or straight
/// above/below it) fall back to a yaw-only or identity rotation.
pub fn look_rotation(from: Vec3, target: Vec3) -> Quat {
    let forward = (target - from).normalize_or_zero();
    if forward == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let right = Vec3::Y.cross(forward);
    if right.length_squared() < 1e-8 {
        return Quat::IDENTITY;
    }
    let right = right.normalize();
    let up = forward.cross(right);
    Quat::from_mat3(&Mat3::from_cols(right, up, forward))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn overhead_camera_blends_to_zero() {
        assert!(blend_factor(Vec3::new(0.0, 30.0, 0.0)).abs() < 1e-6);
        assert!(blend_from_elevation(FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn level_camera_blends_to_one() {
        assert!((blend_factor(Vec3::new(0.0, 0.0, 22.0)) - 1.0).abs() < 1e-6);
        assert!((blend_from_elevation(0.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn both_forms_agree() {
        for deg in [5.0_f32, 20.0, 45.0, 70.0, 85.0] {
            let e = deg.to_radians();
            let dir = Vec3::new(0.0, e.sin(), e.cos());
            assert!((blend_factor(dir) - blend_from_elevation(e)).abs() < 1e-5);
        }
    }

    #[test]
    fn blend_is_monotone_in_elevation() {
        let mut prev = blend_from_elevation(0.0);
        for step in 1..=90 {
            let b = blend_from_elevation((step as f32).to_radians());
            assert!(b <= prev + 1e-6);
            prev = b;
        }
    }

    #[test]
    fn radial_target_points_outward() {
        let p = Vec3::new(3.0, 2.0, 0.0);
        let t = look_target(p, Vec3::new(0.0, 0.0, 20.0), 0.0, 0.0);
        assert_eq!(t, Vec3::new(6.0, 2.0, 0.0));
    }

    #[test]
    fn camera_target_stays_level() {
        let p = Vec3::new(3.0, 2.0, 0.0);
        let t = look_target(p, Vec3::new(0.0, 9.0, 20.0), 0.0, 1.0);
        assert_eq!(t, Vec3::new(0.0, 2.0, 20.0));
    }

    #[test]
    fn rotation_faces_target_and_stays_upright() {
        let from = Vec3::new(1.0, 2.0, 0.0);
        let to = Vec3::new(4.0, 2.0, 4.0);
        let q = look_rotation(from, to);
        let fwd = q * Vec3::Z;
        assert!(fwd.distance((to - from).normalize()) < 1e-5);
        let up = q * Vec3::Y;
        assert!(up.distance(Vec3::Y) < 1e-5);
    }

    #[test]
    fn degenerate_rotation_is_identity() {
        assert_eq!(look_rotation(Vec3::ONE, Vec3::ONE), Quat::IDENTITY);
        assert_eq!(look_rotation(Vec3::ZERO, Vec3::Y), Quat::IDENTITY);
    }
}
