//! Particle classes and the render-backend seam.
//!
//! Each class has a fixed parameter table; the driver looks the table up
//! once per class per frame and runs that class's update over all of its
//! particles.

use std::f32::consts::{PI, TAU};

use glam::{Quat, Vec3};

use crate::scene::Mode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticleClass {
    Leaf,
    Glint,
    OrbitTrail,
    BackgroundStar,
    PhotoCard,
}

/// Interpolation and scale parameters for one class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassParams {
    /// Per-frame lerp factor while heading for the tree layout.
    pub tree_lerp:     f32,
    /// Per-frame lerp factor while heading for the explode layout.
    pub explode_lerp:  f32,
    /// Scale multiplier in tree mode.
    pub tree_scale:    f32,
    /// Scale multiplier in explode mode.
    pub explode_scale: f32,
}

impl ClassParams {
    pub fn lerp(&self, mode: Mode) -> f32 {
        if mode.is_tree() { self.tree_lerp } else { self.explode_lerp }
    }

    pub fn scale(&self, mode: Mode) -> f32 {
        if mode.is_tree() { self.tree_scale } else { self.explode_scale }
    }
}

impl ParticleClass {
    pub const ALL: [ParticleClass; 5] = [
        Self::Leaf,
        Self::Glint,
        Self::OrbitTrail,
        Self::BackgroundStar,
        Self::PhotoCard,
    ];

    /// Explosion is softer than regathering; glints are tree-only ornaments.
    pub fn params(self) -> ClassParams {
        match self {
            Self::Leaf => ClassParams { tree_lerp: 0.08, explode_lerp: 0.04, tree_scale: 1.0, explode_scale: 1.5 },
            Self::Glint => ClassParams { tree_lerp: 0.08, explode_lerp: 0.04, tree_scale: 1.0, explode_scale: 0.0 },
            Self::OrbitTrail => ClassParams { tree_lerp: 0.04, explode_lerp: 0.04, tree_scale: 1.0, explode_scale: 1.8 },
            Self::BackgroundStar => ClassParams { tree_lerp: 1.0, explode_lerp: 1.0, tree_scale: 1.0, explode_scale: 1.0 },
            Self::PhotoCard => ClassParams { tree_lerp: 0.08, explode_lerp: 0.08, tree_scale: 1.4, explode_scale: 2.2 },
        }
    }
}

/// Mutable per-particle state, owned by whoever animates the class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleState {
    pub position: Vec3,
    pub scale:    f32,
}

impl ParticleState {
    pub fn at(position: Vec3) -> Self {
        ParticleState { position, scale: 0.0 }
    }
}

/// One exponential-decay step: move the fraction `f` of the remaining gap.
pub fn approach(current: Vec3, target: Vec3, f: f32) -> Vec3 {
    current + (target - current) * f
}

pub fn approach_scalar(current: f32, target: f32, f: f32) -> f32 {
    current + (target - current) * f
}

/// The same angle expressed in (−π, π].
pub fn wrap_angle(angle: f32) -> f32 {
    PI - (PI - angle).rem_euclid(TAU)
}

/// Pose of a photo card handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhotoPose {
    pub position:    Vec3,
    pub scale:       f32,
    pub orientation: Quat,
    /// Colour multiplier: 1 normally, lower when another photo has focus.
    pub brightness:  f32,
    pub focused:     bool,
}

/// Receives the committed per-frame state.  Positions are in scene space
/// (group rotations already applied).
pub trait InstanceSink {
    fn set_instance(&mut self, class: ParticleClass, index: usize, position: Vec3, scale: f32);

    fn set_photo(&mut self, index: usize, pose: &PhotoPose);
}
