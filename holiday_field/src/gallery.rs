//! Photo gallery: layout, focus and per-frame poses.
//!
//! Photos hang on the tree along a golden-angle spiral and, on explosion,
//! spread into a heart facing the viewer.  Any change to the photo list
//! rebuilds the layout table from scratch; existing cards keep their current
//! position so nothing jumps.

use std::f32::consts::PI;
use std::fmt;

use glam::{Quat, Vec3};
use tracing::{info, warn};

use crate::orient::{blend_factor, look_rotation, look_target};
use crate::particle::{approach, approach_scalar, wrap_angle, InstanceSink, ParticleClass, PhotoPose};
use crate::scene::Mode;

/// Upper bound on gallery size; anything beyond is dropped.
pub const MAX_PHOTOS: usize = 256;

/// ≈137.5°, π(3 − √5).
pub const GOLDEN_ANGLE: f32 = 2.399_963_2;

/// Inspection pose for the focused photo.
pub const FOCUS_POSITION: Vec3 = Vec3::new(0.0, 6.0, 16.0);
pub const FOCUS_SCALE: f32 = 4.5;
/// Scale of the other photos while one has focus.
pub const BACKGROUND_SCALE: f32 = 0.5;
/// Colour multiplier toward grey for unfocused photos.
pub const DIMMED: f32 = 0.5;

/// Gallery yaw added per frame while idling in tree mode.
const GROUP_SPIN: f32 = 0.001;
const GROUP_SETTLE: f32 = 0.05;

// ════════════════════════════════════════════════════════════════════════════
// Layout
// ════════════════════════════════════════════════════════════════════════════

/// Targets for one photo slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhotoSlot {
    pub tree:    Vec3,
    pub explode: Vec3,
}

impl PhotoSlot {
    pub fn target(&self, mode: Mode) -> Vec3 {
        if mode.is_tree() { self.tree } else { self.explode }
    }
}

/// Heart curve at parameter θ, unscaled (x ∈ [−16, 16]).
pub fn heart_point(theta: f32) -> (f32, f32) {
    let s = theta.sin();
    let x = 16.0 * s * s * s;
    let y = 13.0 * theta.cos()
        - 5.0 * (2.0 * theta).cos()
        - 2.0 * (3.0 * theta).cos()
        - (4.0 * theta).cos();
    (x, y)
}

/// Deterministic slots for `count` photos.
pub fn photo_layout(count: usize) -> Vec<PhotoSlot> {
    let n = count.max(1) as f32;
    (0..count)
        .map(|i| {
            let fi = i as f32;
            let theta = fi * GOLDEN_ANGLE;

            // Spiral down the cone, widening toward the base.
            let t = fi / n;
            let y = 6.5 - t * 12.0;
            let radius = 1.5 + (1.0 - (y + 5.5) / 12.0) * 4.5;
            let tree = Vec3::new(theta.cos() * radius, y, theta.sin() * radius);

            // Heart, filled from the middle outward, three depth bands.
            let spread = 0.6 + 0.4 * ((fi + 1.0) / n).sqrt();
            let (hx, hy) = heart_point(theta);
            let scale = 0.85;
            let band = (i % 3) as f32 * 0.5;
            let explode = Vec3::new(hx * spread * scale, hy * spread * scale + 3.5, 14.0 - band);

            PhotoSlot { tree, explode }
        })
        .collect()
}

// ════════════════════════════════════════════════════════════════════════════
// PhotoHandle / PhotoEntry
// ════════════════════════════════════════════════════════════════════════════

/// Opaque reference to an image owned outside the scene.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhotoHandle(String);

impl PhotoHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        PhotoHandle(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhotoHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PhotoHandle {
    fn from(s: &str) -> Self {
        PhotoHandle::new(s)
    }
}

impl From<String> for PhotoHandle {
    fn from(s: String) -> Self {
        PhotoHandle(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhotoEntry {
    pub handle:      PhotoHandle,
    pub position:    Vec3,
    pub scale:       f32,
    pub orientation: Quat,
}

impl PhotoEntry {
    fn new(handle: PhotoHandle) -> Self {
        PhotoEntry { handle, position: Vec3::ZERO, scale: 0.0, orientation: Quat::IDENTITY }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PhotoGallery
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default)]
pub struct PhotoGallery {
    entries:   Vec<PhotoEntry>,
    layout:    Vec<PhotoSlot>,
    focus:     Option<usize>,
    group_yaw: f32,
}

impl PhotoGallery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize         { self.entries.len() }
    pub fn is_empty(&self) -> bool     { self.entries.is_empty() }
    pub fn entries(&self) -> &[PhotoEntry] { &self.entries }
    pub fn layout(&self) -> &[PhotoSlot]   { &self.layout }
    pub fn focused(&self) -> Option<usize> { self.focus }
    pub fn group_yaw(&self) -> f32     { self.group_yaw }

    pub fn is_focused(&self, index: usize) -> bool {
        self.focus == Some(index)
    }

    /// Swap in a new photo list.  Cards that survive (same index) keep their
    /// animated state; focus is dropped.
    pub fn replace<I, H>(&mut self, handles: I)
    where
        I: IntoIterator<Item = H>,
        H: Into<PhotoHandle>,
    {
        let entries = handles
            .into_iter()
            .enumerate()
            .map(|(i, handle)| match self.entries.get(i) {
                Some(old) => PhotoEntry { handle: handle.into(), ..old.clone() },
                None => PhotoEntry::new(handle.into()),
            })
            .collect();
        self.entries = entries;
        self.focus = None;
        self.relayout();
    }

    /// Add photos after the existing ones.
    pub fn append<I, H>(&mut self, handles: I)
    where
        I: IntoIterator<Item = H>,
        H: Into<PhotoHandle>,
    {
        self.entries.extend(handles.into_iter().map(|h| PhotoEntry::new(h.into())));
        self.relayout();
    }

    fn relayout(&mut self) {
        if self.entries.len() > MAX_PHOTOS {
            warn!(
                requested = self.entries.len(),
                kept = MAX_PHOTOS,
                "photo list over capacity, dropping the tail"
            );
            self.entries.truncate(MAX_PHOTOS);
        }
        if self.focus.is_some_and(|i| i >= self.entries.len()) {
            self.focus = None;
        }
        self.layout = photo_layout(self.entries.len());
        info!(photos = self.entries.len(), "photo layout rebuilt");
    }

    /// A photo was clicked.  Clicking the focused photo releases it; any
    /// other photo takes focus.  Returns the new focus.
    pub fn click(&mut self, index: usize) -> Option<usize> {
        if index >= self.entries.len() {
            return self.focus;
        }
        self.focus = if self.focus == Some(index) { None } else { Some(index) };
        self.focus
    }

    /// A click that hit no photo.
    pub fn miss(&mut self) {
        self.focus = None;
    }

    /// Advance every card one frame and commit its pose.
    ///
    /// `camera` is in scene space.  Entries without a layout slot are skipped.
    pub fn tick<S: InstanceSink + ?Sized>(&mut self, mode: Mode, camera: Vec3, sink: &mut S) {
        let params = ParticleClass::PhotoCard.params();
        let has_focus = self.focus.is_some();
        let explode = !mode.is_tree();

        if mode.is_tree() && !has_focus {
            self.group_yaw = (self.group_yaw + GROUP_SPIN) % (2.0 * PI);
        } else {
            self.group_yaw = approach_scalar(wrap_angle(self.group_yaw), 0.0, GROUP_SETTLE);
        }
        let group = Quat::from_rotation_y(self.group_yaw);
        let blend = blend_factor(camera);

        for (i, (entry, slot)) in self.entries.iter_mut().zip(&self.layout).enumerate() {
            let focused = self.focus == Some(i);
            let (target, target_scale) = if focused {
                (FOCUS_POSITION, FOCUS_SCALE)
            } else if has_focus {
                (slot.target(mode), BACKGROUND_SCALE)
            } else {
                (slot.target(mode), params.scale(mode))
            };

            entry.position = approach(entry.position, target, params.lerp(mode));
            entry.scale = approach_scalar(entry.scale, target_scale, params.lerp(mode));

            let world = group * entry.position;
            let look_at = if explode || focused {
                camera
            } else {
                look_target(world, camera, 0.0, blend)
            };
            entry.orientation = look_rotation(world, look_at);

            let pose = PhotoPose {
                position:    world,
                scale:       entry.scale,
                orientation: entry.orientation,
                brightness:  if has_focus && !focused { DIMMED } else { 1.0 },
                focused,
            };
            sink.set_photo(i, &pose);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::azimuth;

    #[derive(Default)]
    struct Poses(Vec<(usize, PhotoPose)>);

    impl InstanceSink for Poses {
        fn set_instance(&mut self, _: ParticleClass, _: usize, _: Vec3, _: f32) {}
        fn set_photo(&mut self, index: usize, pose: &PhotoPose) {
            self.0.push((index, *pose));
        }
    }

    fn gallery(n: usize) -> PhotoGallery {
        let mut g = PhotoGallery::new();
        g.replace((0..n).map(|i| format!("photo_{i}.jpg")));
        g
    }

    #[test]
    fn golden_angle_matches_definition() {
        let exact = PI * (3.0 - 5.0_f32.sqrt());
        assert!((GOLDEN_ANGLE - exact).abs() < 1e-5);
    }

    #[test]
    fn layout_has_one_slot_per_photo() {
        for n in [0, 1, 2, 7, 40] {
            assert_eq!(photo_layout(n).len(), n);
        }
    }

    #[test]
    fn tree_slots_never_share_an_angle() {
        let slots = photo_layout(64);
        let mut angles: Vec<f32> = slots.iter().map(|s| azimuth(s.tree)).collect();
        angles.sort_by(f32::total_cmp);
        for w in angles.windows(2) {
            assert!(w[1] - w[0] > 1e-3);
        }
    }

    #[test]
    fn explode_slots_use_three_depth_bands() {
        let slots = photo_layout(9);
        let zs: Vec<f32> = slots.iter().map(|s| s.explode.z).collect();
        assert_eq!(&zs[..3], &[14.0, 13.5, 13.0]);
        assert_eq!(zs[3], 14.0);
    }

    #[test]
    fn heart_curve_top_and_tip() {
        let (x0, y0) = heart_point(0.0);
        assert!(x0.abs() < 1e-6);
        assert!((y0 - 5.0).abs() < 1e-5);
        let (xp, yp) = heart_point(PI);
        assert!(xp.abs() < 1e-4);
        assert!((yp + 17.0).abs() < 1e-4);
    }

    #[test]
    fn focus_is_exclusive() {
        let mut g = gallery(5);
        assert_eq!(g.click(1), Some(1));
        assert_eq!(g.click(3), Some(3));
        assert!(!g.is_focused(1));
        assert!(g.is_focused(3));
        assert_eq!(g.click(3), None);
    }

    #[test]
    fn miss_clears_focus() {
        let mut g = gallery(3);
        g.click(2);
        g.miss();
        assert_eq!(g.focused(), None);
    }

    #[test]
    fn click_out_of_range_is_ignored() {
        let mut g = gallery(2);
        g.click(0);
        assert_eq!(g.click(9), Some(0));
    }

    #[test]
    fn replace_keeps_surviving_cards_and_drops_focus() {
        let mut g = gallery(3);
        let mut sink = Poses::default();
        for _ in 0..30 {
            g.tick(Mode::Tree, Vec3::new(0.0, 6.0, 22.0), &mut sink);
        }
        let before = g.entries()[1].position;
        g.click(1);
        g.replace(["a", "b"]);
        assert_eq!(g.len(), 2);
        assert_eq!(g.layout().len(), 2);
        assert_eq!(g.entries()[1].position, before);
        assert_eq!(g.entries()[1].handle.as_str(), "b");
        assert_eq!(g.focused(), None);
    }

    #[test]
    fn append_extends_layout() {
        let mut g = gallery(2);
        g.append(["x.png"]);
        assert_eq!(g.len(), 3);
        assert_eq!(g.layout(), photo_layout(3).as_slice());
    }

    #[test]
    fn capacity_is_enforced() {
        let g = gallery(MAX_PHOTOS + 10);
        assert_eq!(g.len(), MAX_PHOTOS);
        assert_eq!(g.layout().len(), MAX_PHOTOS);
    }

    #[test]
    fn focused_photo_moves_to_inspection_pose() {
        let mut g = gallery(4);
        g.click(2);
        let mut sink = Poses::default();
        for _ in 0..200 {
            sink.0.clear();
            g.tick(Mode::Explode, Vec3::new(0.0, 6.0, 22.0), &mut sink);
        }
        let (_, focused) = sink.0.iter().find(|(i, _)| *i == 2).copied().unwrap();
        assert!(focused.focused);
        assert!(focused.position.distance(FOCUS_POSITION) < 1e-2);
        assert!((focused.scale - FOCUS_SCALE).abs() < 1e-2);
        for (i, pose) in &sink.0 {
            if *i != 2 {
                assert_eq!(pose.brightness, DIMMED);
                assert!((pose.scale - BACKGROUND_SCALE).abs() < 1e-2);
            }
        }
    }

    #[test]
    fn exploded_photos_face_camera() {
        let mut g = gallery(3);
        let camera = Vec3::new(0.0, 6.0, 22.0);
        let mut sink = Poses::default();
        g.tick(Mode::Explode, camera, &mut sink);
        for (_, pose) in &sink.0 {
            let fwd = pose.orientation * Vec3::Z;
            let want = (camera - pose.position).normalize();
            assert!(fwd.distance(want) < 1e-3 || pose.position.distance(camera) < 1e-3);
        }
    }

    #[test]
    fn tree_photos_stay_upright() {
        let mut g = gallery(6);
        let mut sink = Poses::default();
        for _ in 0..40 {
            sink.0.clear();
            g.tick(Mode::Tree, Vec3::new(5.0, 15.0, 18.0), &mut sink);
        }
        for (_, pose) in &sink.0 {
            let up = pose.orientation * Vec3::Y;
            assert!(up.distance(Vec3::Y) < 1e-3);
        }
    }

    #[test]
    fn group_spins_only_in_idle_tree_mode() {
        let mut g = gallery(2);
        let mut sink = Poses::default();
        g.tick(Mode::Tree, Vec3::Z * 20.0, &mut sink);
        assert!(g.group_yaw() > 0.0);
        let spun = g.group_yaw();
        g.tick(Mode::Explode, Vec3::Z * 20.0, &mut sink);
        assert!(g.group_yaw() < spun);
    }

    #[test]
    fn group_settles_forward_after_most_of_a_turn() {
        let mut g = gallery(1);
        let mut sink = Poses::default();
        while g.group_yaw() < 6.0 {
            g.tick(Mode::Tree, Vec3::Z * 20.0, &mut sink);
        }
        g.tick(Mode::Explode, Vec3::Z * 20.0, &mut sink);
        let yaw = g.group_yaw();
        assert!(yaw < 0.0 && yaw > -0.3, "yaw {yaw}");
    }
}
