//! Per-frame animation driver.
//!
//! Once per rendered frame the driver walks every particle class, eases each
//! particle toward the layout the current mode selects, and commits the
//! result to an [`InstanceSink`].  The frame rate is not assumed: time-based
//! terms (twinkle, orbit phase, scene yaw) advance by the real `dt`.

use glam::{Quat, Vec3};

use crate::field::{Field, Targets};
use crate::particle::{
    approach, approach_scalar, wrap_angle, ClassParams, InstanceSink, ParticleClass, ParticleState,
};
use crate::scene::Mode;
use crate::theme::{ColorTheme, Tint, LEAF_TINT_LERP, STAR_TINT_LERP};

/// Scene yaw speed in tree mode (rad/s).
pub const SCENE_SPIN: f32 = 0.15;
/// Per-frame decay of the scene yaw while exploded.
pub const SCENE_SETTLE: f32 = 0.05;
/// Orbit ribbon phase speed (rad/s).
pub const ORBIT_SPIN: f32 = 0.5;

// ════════════════════════════════════════════════════════════════════════════
// Star topper
// ════════════════════════════════════════════════════════════════════════════

pub const STAR_TREE_Y: f32 = 10.7;
pub const STAR_EXPLODE_Y: f32 = 45.0;
pub const STAR_SCALE: f32 = 0.095;
const STAR_MOVE_LERP: f32 = 0.07;
const STAR_SCALE_LERP: f32 = 0.12;
const STAR_SPIN: f32 = 2.2;

/// The star on top of the tree.  It flies away and shrinks to nothing when
/// the tree explodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarTopper {
    pub height: f32,
    pub scale:  f32,
    pub spin:   f32,
    pub tint:   Tint,
}

impl StarTopper {
    fn new(theme: ColorTheme) -> Self {
        StarTopper {
            height: STAR_TREE_Y,
            scale:  STAR_SCALE,
            spin:   0.0,
            tint:   Tint::new(theme.star_palette(), STAR_TINT_LERP),
        }
    }

    fn tick(&mut self, mode: Mode, theme: ColorTheme, time: f32) {
        let (y, s) = if mode.is_tree() { (STAR_TREE_Y, STAR_SCALE) } else { (STAR_EXPLODE_Y, 0.0) };
        self.height = approach_scalar(self.height, y, STAR_MOVE_LERP);
        self.scale = approach_scalar(self.scale, s, STAR_SCALE_LERP);
        self.spin = time * STAR_SPIN;
        self.tint.ease_toward(theme.star_palette());
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(0.0, self.height, 0.0)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AnimationDriver
// ════════════════════════════════════════════════════════════════════════════

pub struct AnimationDriver {
    field:     Field,
    leaves:    Vec<ParticleState>,
    glints:    Vec<ParticleState>,
    orbit:     Vec<ParticleState>,
    stars:     Vec<ParticleState>,
    time:      f32,
    scene_yaw: f32,
    leaf_tint: Tint,
    topper:    StarTopper,
}

/// Every particle starts on its tree target so the first frame already shows
/// a tree.
fn initial_states(targets: &Targets) -> Vec<ParticleState> {
    targets.tree.iter().copied().map(ParticleState::at).collect()
}

impl AnimationDriver {
    pub fn new(field: Field, theme: ColorTheme) -> Self {
        AnimationDriver {
            leaves:    initial_states(&field.leaves),
            glints:    initial_states(&field.glints),
            orbit:     initial_states(&field.orbit),
            stars:     initial_states(&field.stars),
            field,
            time:      0.0,
            scene_yaw: 0.0,
            leaf_tint: Tint::new(theme.leaf_palette(), LEAF_TINT_LERP),
            topper:    StarTopper::new(theme),
        }
    }

    pub fn field(&self) -> &Field           { &self.field }
    pub fn elapsed(&self) -> f32            { self.time }
    pub fn scene_yaw(&self) -> f32          { self.scene_yaw }
    pub fn leaf_tint(&self) -> &Tint        { &self.leaf_tint }
    pub fn topper(&self) -> &StarTopper     { &self.topper }

    /// Current (pre-rotation) state of one class.
    pub fn states(&self, class: ParticleClass) -> &[ParticleState] {
        match class {
            ParticleClass::Leaf => &self.leaves,
            ParticleClass::Glint => &self.glints,
            ParticleClass::OrbitTrail => &self.orbit,
            ParticleClass::BackgroundStar => &self.stars,
            ParticleClass::PhotoCard => &[],
        }
    }

    /// Advance one frame.  Negative or non-finite `dt` counts as zero.
    pub fn tick<S: InstanceSink + ?Sized>(
        &mut self,
        mode: Mode,
        theme: ColorTheme,
        dt: f32,
        sink: &mut S,
    ) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.time += dt;

        if mode.is_tree() {
            self.scene_yaw = (self.scene_yaw + dt * SCENE_SPIN) % std::f32::consts::TAU;
        } else {
            self.scene_yaw = approach_scalar(wrap_angle(self.scene_yaw), 0.0, SCENE_SETTLE);
        }
        let yaw = Quat::from_rotation_y(self.scene_yaw);

        self.leaf_tint.ease_toward(theme.leaf_palette());
        self.topper.tick(mode, theme, self.time);

        for class in ParticleClass::ALL {
            let params = class.params();
            match class {
                ParticleClass::Leaf => self.step_leaves(params, mode, yaw, sink),
                ParticleClass::Glint => self.step_glints(params, mode, yaw, sink),
                ParticleClass::OrbitTrail => self.step_orbit(params, mode, yaw, sink),
                ParticleClass::BackgroundStar => self.step_stars(yaw, sink),
                // Photos are driven by the gallery, which needs the camera.
                ParticleClass::PhotoCard => {}
            }
        }
    }

    fn step_leaves<S: InstanceSink + ?Sized>(
        &mut self,
        params: ClassParams,
        mode: Mode,
        yaw: Quat,
        sink: &mut S,
    ) {
        let f = params.lerp(mode);
        let targets = &self.field.leaves;
        let pick = if mode.is_tree() { &targets.tree } else { &targets.explode };
        for (i, (state, target)) in self.leaves.iter_mut().zip(pick).enumerate() {
            let jitter = self.field.leaf_jitter.get(i).copied().unwrap_or(0.5);
            let size = (0.008 + jitter * 0.01) * params.scale(mode);
            state.position = approach(state.position, *target, f);
            state.scale = approach_scalar(state.scale, size, f);
            sink.set_instance(ParticleClass::Leaf, i, yaw * state.position, state.scale);
        }
    }

    fn step_glints<S: InstanceSink + ?Sized>(
        &mut self,
        params: ClassParams,
        mode: Mode,
        yaw: Quat,
        sink: &mut S,
    ) {
        let f = params.lerp(mode);
        let targets = &self.field.glints;
        let pick = if mode.is_tree() { &targets.tree } else { &targets.explode };
        for (i, (state, target)) in self.glints.iter_mut().zip(pick).enumerate() {
            let breathe = 0.006 + (self.time * 5.0 + i as f32).sin() * 0.006;
            state.position = approach(state.position, *target, f);
            state.scale = approach_scalar(state.scale, breathe * params.scale(mode), f);
            sink.set_instance(ParticleClass::Glint, i, yaw * state.position, state.scale);
        }
    }

    /// The ribbon's tree target moves every frame with the orbit phase.
    fn step_orbit<S: InstanceSink + ?Sized>(
        &mut self,
        params: ClassParams,
        mode: Mode,
        yaw: Quat,
        sink: &mut S,
    ) {
        let f = params.lerp(mode);
        let phase = self.time * ORBIT_SPIN;
        let seeds = &self.field.orbit_seeds;
        let bursts = &self.field.orbit.explode;
        for (i, state) in self.orbit.iter_mut().enumerate() {
            let (Some(seed), Some(burst)) = (seeds.get(i), bursts.get(i)) else {
                continue;
            };
            let target = if mode.is_tree() { seed.tree_position(phase) } else { *burst };
            let shimmer = 0.012 + (self.time * 4.0 + seed.twinkle).sin() * 0.005;
            state.position = approach(state.position, target, f);
            state.scale = approach_scalar(state.scale, shimmer * params.scale(mode), f);
            sink.set_instance(ParticleClass::OrbitTrail, i, yaw * state.position, state.scale);
        }
    }

    fn step_stars<S: InstanceSink + ?Sized>(&mut self, yaw: Quat, sink: &mut S) {
        for (i, (state, home)) in self.stars.iter_mut().zip(&self.field.stars.tree).enumerate() {
            state.position = *home;
            state.scale = 0.04 + (self.time * 0.3 + i as f32).sin() * 0.04;
            sink.set_instance(ParticleClass::BackgroundStar, i, yaw * state.position, state.scale);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{generate, FieldConfig};
    use crate::particle::PhotoPose;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[derive(Default)]
    struct Recorder {
        hits: Vec<(ParticleClass, usize, Vec3, f32)>,
    }

    impl Recorder {
        fn count(&self, class: ParticleClass) -> usize {
            self.hits.iter().filter(|h| h.0 == class).count()
        }
    }

    impl InstanceSink for Recorder {
        fn set_instance(&mut self, class: ParticleClass, index: usize, position: Vec3, scale: f32) {
            self.hits.push((class, index, position, scale));
        }
        fn set_photo(&mut self, _: usize, _: &PhotoPose) {}
    }

    fn driver() -> AnimationDriver {
        let mut rng = StdRng::seed_from_u64(42);
        let cfg = FieldConfig { leaves: 200, glints: 40, orbit: 60, stars: 20 };
        AnimationDriver::new(generate(&cfg, &mut rng), ColorTheme::Pink)
    }

    #[test]
    fn every_particle_is_committed() {
        let mut d = driver();
        let mut rec = Recorder::default();
        d.tick(Mode::Tree, ColorTheme::Pink, 1.0 / 60.0, &mut rec);
        assert_eq!(rec.count(ParticleClass::Leaf), 200);
        assert_eq!(rec.count(ParticleClass::Glint), 40);
        assert_eq!(rec.count(ParticleClass::OrbitTrail), 60);
        assert_eq!(rec.count(ParticleClass::BackgroundStar), 20);
    }

    #[test]
    fn leaves_step_exactly_one_lerp_toward_explode() {
        let mut d = driver();
        let start: Vec<Vec3> = d.states(ParticleClass::Leaf).iter().map(|s| s.position).collect();
        d.tick(Mode::Explode, ColorTheme::Pink, 0.016, &mut Recorder::default());
        let f = ParticleClass::Leaf.params().explode_lerp;
        for (i, s) in d.states(ParticleClass::Leaf).iter().enumerate() {
            let target = d.field().leaves.explode[i];
            let expected = start[i].distance(target) * (1.0 - f);
            assert!((s.position.distance(target) - expected).abs() < 1e-3);
        }
    }

    #[test]
    fn explosion_is_continuous_across_mode_flip() {
        let mut d = driver();
        let mut rec = Recorder::default();
        for _ in 0..10 {
            d.tick(Mode::Explode, ColorTheme::Pink, 0.016, &mut rec);
        }
        let mid: Vec<Vec3> = d.states(ParticleClass::Leaf).iter().map(|s| s.position).collect();
        d.tick(Mode::Tree, ColorTheme::Pink, 0.016, &mut rec);
        let f = ParticleClass::Leaf.params().tree_lerp;
        for (i, s) in d.states(ParticleClass::Leaf).iter().enumerate() {
            let target = d.field().leaves.tree[i];
            // Only a fraction of the gap is covered in the flip frame.
            assert!(s.position.distance(mid[i]) <= mid[i].distance(target) * f + 1e-4);
        }
    }

    #[test]
    fn glints_shrink_away_when_exploded() {
        let mut d = driver();
        let mut rec = Recorder::default();
        for _ in 0..400 {
            d.tick(Mode::Explode, ColorTheme::Pink, 0.016, &mut rec);
        }
        assert!(d.states(ParticleClass::Glint).iter().all(|s| s.scale.abs() < 1e-4));
    }

    #[test]
    fn orbit_streaks_out_with_its_leaf() {
        let mut d = driver();
        let mut rec = Recorder::default();
        for _ in 0..600 {
            d.tick(Mode::Explode, ColorTheme::Pink, 0.016, &mut rec);
        }
        let leaves = &d.field().leaves.explode;
        for (i, s) in d.states(ParticleClass::OrbitTrail).iter().enumerate() {
            let want = leaves[i % leaves.len()] * crate::field::ORBIT_STREAK;
            assert!(s.position.distance(want) < 0.05);
        }
    }

    #[test]
    fn orbit_tree_target_advances_with_time() {
        let mut d = driver();
        let mut rec = Recorder::default();
        for _ in 0..200 {
            d.tick(Mode::Tree, ColorTheme::Pink, 0.05, &mut rec);
        }
        let a = d.states(ParticleClass::OrbitTrail)[10].position;
        for _ in 0..20 {
            d.tick(Mode::Tree, ColorTheme::Pink, 0.05, &mut rec);
        }
        let b = d.states(ParticleClass::OrbitTrail)[10].position;
        assert!(a.distance(b) > 0.01);
    }

    #[test]
    fn scene_yaw_spins_in_tree_and_settles_when_exploded() {
        let mut d = driver();
        let mut rec = Recorder::default();
        d.tick(Mode::Tree, ColorTheme::Pink, 1.0, &mut rec);
        assert!((d.scene_yaw() - SCENE_SPIN).abs() < 1e-6);
        for _ in 0..300 {
            d.tick(Mode::Explode, ColorTheme::Pink, 0.016, &mut rec);
        }
        assert!(d.scene_yaw().abs() < 1e-4);
    }

    #[test]
    fn scene_yaw_settles_through_the_nearest_turn() {
        let mut d = driver();
        let mut rec = Recorder::default();
        d.tick(Mode::Tree, ColorTheme::Pink, 6.0 / SCENE_SPIN, &mut rec);
        assert!((d.scene_yaw() - 6.0).abs() < 1e-3);
        d.tick(Mode::Explode, ColorTheme::Pink, 0.016, &mut rec);
        let yaw = d.scene_yaw();
        assert!(yaw < 0.0 && yaw > 6.0 - std::f32::consts::TAU, "yaw {yaw}");
    }

    #[test]
    fn bad_dt_does_not_move_time() {
        let mut d = driver();
        d.tick(Mode::Tree, ColorTheme::Pink, f32::NAN, &mut Recorder::default());
        d.tick(Mode::Tree, ColorTheme::Pink, -3.0, &mut Recorder::default());
        assert_eq!(d.elapsed(), 0.0);
    }

    #[test]
    fn mismatched_tables_are_skipped() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut field = generate(&FieldConfig { leaves: 10, glints: 0, orbit: 10, stars: 0 }, &mut rng);
        field.leaves.explode.truncate(6);
        field.orbit_seeds.truncate(4);
        let mut d = AnimationDriver::new(field, ColorTheme::Pink);
        let mut rec = Recorder::default();
        d.tick(Mode::Explode, ColorTheme::Pink, 0.016, &mut rec);
        assert_eq!(rec.count(ParticleClass::Leaf), 6);
        assert_eq!(rec.count(ParticleClass::OrbitTrail), 4);
    }

    #[test]
    fn star_topper_flies_off_and_returns() {
        let mut d = driver();
        let mut rec = Recorder::default();
        for _ in 0..300 {
            d.tick(Mode::Explode, ColorTheme::Gold, 0.016, &mut rec);
        }
        assert!((d.topper().height - STAR_EXPLODE_Y).abs() < 0.1);
        assert!(d.topper().scale < 1e-4);
        for _ in 0..300 {
            d.tick(Mode::Tree, ColorTheme::Gold, 0.016, &mut rec);
        }
        assert!((d.topper().height - STAR_TREE_Y).abs() < 0.1);
    }

    #[test]
    fn leaf_tint_follows_theme() {
        let mut d = driver();
        let mut rec = Recorder::default();
        for _ in 0..400 {
            d.tick(Mode::Tree, ColorTheme::Blue, 0.016, &mut rec);
        }
        let want = ColorTheme::Blue.leaf_palette().base;
        assert!(d.leaf_tint().current.base.distance(want) < 1e-3);
    }
}
