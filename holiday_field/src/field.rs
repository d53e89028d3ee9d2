//! Particle field generation.
//!
//! Every particle gets two fixed targets when the field is built: where it
//! sits in the tree and where it flies to when the tree explodes.  Nothing
//! here is simulated; the driver only interpolates between these targets.
//!
//! ```text
//!            apex (h = H)              explode shell
//!              /\                      .  ·  ·  .
//!             /  \                  ·      r ∈ [18, 43]
//!            / ·· \  ← orbit       ·        ·       ·
//!           / ···· \   ribbon        ·  ·  ·  ·
//!          /________\
//!         radius = (1 − h/H)·R·u^p
//! ```

use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;
use serde::Deserialize;
use tracing::warn;

// ════════════════════════════════════════════════════════════════════════════
// Shape parameters
// ════════════════════════════════════════════════════════════════════════════

/// Cone sampling parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConeShape {
    /// Height of the full cone; the radius falls to zero here.
    pub height:     f32,
    /// Highest point actually sampled (≤ `height`).
    pub max_height: f32,
    pub radius:     f32,
    /// Exponent < 1 pushes points toward the surface.
    pub power:      f32,
}

impl ConeShape {
    /// Largest radius a point at height `h` may have.
    pub fn radius_bound(&self, h: f32) -> f32 {
        ((1.0 - h / self.height) * self.radius).max(0.0)
    }
}

pub const LEAF_CONE: ConeShape = ConeShape { height: 10.0, max_height: 10.0, radius: 4.0, power: 0.6 };
pub const GLINT_CONE: ConeShape = ConeShape { height: 10.0, max_height: 9.8, radius: 3.8, power: 0.35 };

/// Spherical shell sampling parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShellShape {
    pub inner:  f32,
    pub spread: f32,
}

pub const EXPLODE_SHELL: ShellShape = ShellShape { inner: 18.0, spread: 25.0 };
pub const STAR_SHELL: ShellShape = ShellShape { inner: 150.0, spread: 50.0 };

/// Orbit ribbon: three full turns around the tree.
pub const ORBIT_WINDING: f32 = 3.0 * TAU;
pub const ORBIT_HEIGHT: f32 = 10.5;
/// Orbit trails streak past their leaf by this factor when exploding.
pub const ORBIT_STREAK: f32 = 1.2;

// ════════════════════════════════════════════════════════════════════════════
// FieldConfig
// ════════════════════════════════════════════════════════════════════════════

/// Particle counts per class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub leaves: usize,
    pub glints: usize,
    pub orbit:  usize,
    pub stars:  usize,
}

/// Upper bound on any one class.  Larger requests are cut down to this.
pub const MAX_PER_CLASS: usize = 100_000;

impl Default for FieldConfig {
    fn default() -> Self {
        FieldConfig { leaves: 10_000, glints: 1_200, orbit: 3_000, stars: 600 }
    }
}

impl FieldConfig {
    /// Every count limited to [`MAX_PER_CLASS`], with a warning per class cut.
    pub fn clamped(&self) -> Self {
        let clamp = |class: &str, n: usize| {
            if n > MAX_PER_CLASS {
                warn!(class, requested = n, max = MAX_PER_CLASS, "particle count clamped");
            }
            n.min(MAX_PER_CLASS)
        };
        FieldConfig {
            leaves: clamp("leaves", self.leaves),
            glints: clamp("glints", self.glints),
            orbit:  clamp("orbit", self.orbit),
            stars:  clamp("stars", self.stars),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Layout tables
// ════════════════════════════════════════════════════════════════════════════

/// Paired targets for one particle class.  `tree[i]` and `explode[i]` belong
/// to the same particle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Targets {
    pub tree:    Vec<Vec3>,
    pub explode: Vec<Vec3>,
}

impl Targets {
    pub fn len(&self) -> usize {
        self.tree.len().min(self.explode.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-particle constants of the orbit ribbon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitSeed {
    /// Normalised position along the spiral.
    pub t:        f32,
    pub drift:    f32,
    /// Clearance outside the foliage.
    pub gap:      f32,
    /// Phase for the size shimmer.
    pub twinkle:  f32,
    pub offset_y: f32,
}

impl OrbitSeed {
    /// Spiral position for a given rotation phase (radians).
    pub fn tree_position(&self, phase: f32) -> Vec3 {
        let h = self.t * ORBIT_HEIGHT;
        let radius = (1.0 - h / LEAF_CONE.height) * LEAF_CONE.radius + self.gap;
        let angle = self.t * ORBIT_WINDING + phase + self.drift;
        Vec3::new(angle.cos() * radius, h - 0.5 + self.offset_y, angle.sin() * radius)
    }
}

/// The complete precomputed field.
#[derive(Debug, Clone, Default)]
pub struct Field {
    pub leaves:      Targets,
    /// Random 0–1 per leaf, scales its size.
    pub leaf_jitter: Vec<f32>,
    pub glints:      Targets,
    pub orbit:       Targets,
    pub orbit_seeds: Vec<OrbitSeed>,
    /// Static; `tree` and `explode` are the same point.
    pub stars:       Targets,
}

// ════════════════════════════════════════════════════════════════════════════
// Samplers
// ════════════════════════════════════════════════════════════════════════════

/// Uniform height, outward-biased radius, uniform azimuth.
pub fn cone_point<R: Rng + ?Sized>(shape: &ConeShape, rng: &mut R) -> Vec3 {
    let h = rng.gen::<f32>() * shape.max_height;
    let radius = shape.radius_bound(h) * rng.gen::<f32>().powf(shape.power);
    let angle = rng.gen::<f32>() * TAU;
    Vec3::new(angle.cos() * radius, h, angle.sin() * radius)
}

/// Uniform over a spherical shell.  The polar angle comes from `acos` of a
/// uniform variable so the poles are not oversampled.
pub fn shell_point<R: Rng + ?Sized>(shell: &ShellShape, rng: &mut R) -> Vec3 {
    let theta = rng.gen::<f32>() * TAU;
    let phi = (2.0 * rng.gen::<f32>() - 1.0).clamp(-1.0, 1.0).acos();
    let r = shell.inner + rng.gen::<f32>() * shell.spread;
    Vec3::new(
        r * phi.sin() * theta.cos(),
        r * phi.sin() * theta.sin(),
        r * phi.cos(),
    )
}

fn orbit_seed<R: Rng + ?Sized>(i: usize, count: usize, rng: &mut R) -> OrbitSeed {
    OrbitSeed {
        t:        i as f32 / count as f32,
        drift:    (rng.gen::<f32>() - 0.5) * 0.25,
        gap:      1.8 + rng.gen::<f32>() * 0.5,
        twinkle:  rng.gen::<f32>() * TAU,
        offset_y: (rng.gen::<f32>() - 0.5) * 0.15,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// generate
// ════════════════════════════════════════════════════════════════════════════

/// Build every class's targets.
///
/// Orbit particle `i` explodes along leaf `i % leaves`.  With no leaves at all
/// each orbit particle gets its own shell point instead.  Counts above
/// [`MAX_PER_CLASS`] are clamped.
pub fn generate<R: Rng + ?Sized>(config: &FieldConfig, rng: &mut R) -> Field {
    let config = config.clamped();
    let mut leaves = Targets::default();
    let mut leaf_jitter = Vec::with_capacity(config.leaves);
    for _ in 0..config.leaves {
        leaves.tree.push(cone_point(&LEAF_CONE, rng));
        leaf_jitter.push(rng.gen::<f32>());
        leaves.explode.push(shell_point(&EXPLODE_SHELL, rng));
    }

    let mut glints = Targets::default();
    for _ in 0..config.glints {
        glints.tree.push(cone_point(&GLINT_CONE, rng));
        glints.explode.push(shell_point(&EXPLODE_SHELL, rng));
    }

    let mut orbit = Targets::default();
    let mut orbit_seeds = Vec::with_capacity(config.orbit);
    for i in 0..config.orbit {
        let seed = orbit_seed(i, config.orbit, rng);
        orbit.tree.push(seed.tree_position(0.0));
        let burst = if leaves.explode.is_empty() {
            shell_point(&EXPLODE_SHELL, rng)
        } else {
            leaves.explode[i % leaves.explode.len()]
        };
        orbit.explode.push(burst * ORBIT_STREAK);
        orbit_seeds.push(seed);
    }

    let mut stars = Targets::default();
    for _ in 0..config.stars {
        let p = shell_point(&STAR_SHELL, rng);
        stars.tree.push(p);
        stars.explode.push(p);
    }

    Field { leaves, leaf_jitter, glints, orbit, orbit_seeds, stars }
}

/// Horizontal distance from the tree axis.
pub fn axial_radius(p: Vec3) -> f32 {
    (p.x * p.x + p.z * p.z).sqrt()
}

/// Angle around the tree axis in [0, 2π).
pub fn azimuth(p: Vec3) -> f32 {
    p.z.atan2(p.x).rem_euclid(TAU)
}
