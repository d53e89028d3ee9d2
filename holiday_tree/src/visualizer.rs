//! Software-rendered view of the tree using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                         ✦                                │
//! │                        ·:·            ·        ·         │
//! │        ·              ·:·:·     [photo]                  │
//! │                      ·:·:·:·                   ·         │
//! │              [photo] ·:·:·:·:·    ○ ← hand cursor        │
//! │                     ·:·:·:·:·:·                          │
//! ├──────────────────────────────────────────────────────────┤
//! │ status bar / key legend                                  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! [`Canvas`] is the window-independent half: it receives the animation
//! driver's committed instances through [`InstanceSink`], projects them and
//! rasterises into an ARGB buffer.  [`Visualizer`] owns the window, turns
//! keyboard and mouse into a [`FrameInput`] and presents the canvas.

use std::collections::hash_map::DefaultHasher;
use std::f32::consts::TAU;
use std::hash::{Hash, Hasher};
use std::sync::mpsc::Sender;
use std::time::Duration;

use glam::{Mat4, Vec2, Vec3};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use holiday_field::driver::StarTopper;
use holiday_field::theme::{to_argb, Palette};
use holiday_field::{InstanceSink, ParticleClass, PhotoHandle, PhotoPose, StatusSnapshot};

use crate::camera::{OrbitCamera, Projected, SCENE_OFFSET};
use crate::config::WindowConfig;
use crate::gesture::SimInput;

// ════════════════════════════════════════════════════════════════════════════
// Constants
// ════════════════════════════════════════════════════════════════════════════

const BG_COLOR:      u32 = 0xFF05_0510;
const STATUS_BG:     u32 = 0xFF10_1028;
const STATUS_H:      usize = 34;
const TEXT_COLOR:    u32 = 0xFFEE_EEEE;
const LEGEND_COLOR:  u32 = 0xFF88_8888;
const GLINT_COLOR:   u32 = 0xFFFF_F4C0;
const SKY_COLOR:     u32 = 0xFF9A_A8D8;
const FRAME_COLOR:   u32 = 0xFFF5_F0E6;
const FOCUS_COLOR:   u32 = 0xFFFF_D700;
const CURSOR_IDLE:   u32 = 0xFFFF_FFFF;
const CURSOR_PINCH:  u32 = 0xFF40_FF80;

/// World radius of a particle of scale 1.
const SPLAT_SIZE: f32 = 4.0;
/// World radius of the star topper at scale 1.
const TOPPER_SIZE: f32 = 12.0;
/// Half extents of a photo card at scale 1 (portrait, like a print).
const CARD_HALF: Vec2 = Vec2::new(0.5, 0.6);
/// Fraction of the card the picture occupies inside its frame.
const CARD_INSET: f32 = 0.86;
/// Pixels the mouse may wander between press and release and still click.
const CLICK_SLOP: f32 = 4.0;
/// Text is drawn with each font bit as a `GLYPH_PX`² block.
const GLYPH_PX: usize = 2;

// ════════════════════════════════════════════════════════════════════════════
// Colour helpers
// ════════════════════════════════════════════════════════════════════════════

/// HSV (h in degrees, s and v in 0–1) to opaque ARGB.
pub fn hsv_to_argb(h: f32, s: f32, v: f32) -> u32 {
    let h = h.rem_euclid(360.0) / 60.0;
    let chroma = v * s;
    let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
    let rgb = match h as u32 {
        0 => Vec3::new(chroma, x, 0.0),
        1 => Vec3::new(x, chroma, 0.0),
        2 => Vec3::new(0.0, chroma, x),
        3 => Vec3::new(0.0, x, chroma),
        4 => Vec3::new(x, 0.0, chroma),
        _ => Vec3::new(chroma, 0.0, x),
    };
    to_argb(rgb + Vec3::splat(v - chroma))
}

/// Stable placeholder colour for a photo handle.
pub fn handle_color(handle: &PhotoHandle) -> u32 {
    let mut h = DefaultHasher::new();
    handle.as_str().hash(&mut h);
    let hue = (h.finish() % 360) as f32;
    hsv_to_argb(hue, 0.45, 0.85)
}

fn channels(c: u32) -> [u32; 3] {
    [(c >> 16) & 0xFF, (c >> 8) & 0xFF, c & 0xFF]
}

fn pack([r, g, b]: [u32; 3]) -> u32 {
    0xFF00_0000 | (r.min(255) << 16) | (g.min(255) << 8) | b.min(255)
}

/// Multiply every channel by `k` (0–1).
fn dim(c: u32, k: f32) -> u32 {
    let k = k.clamp(0.0, 1.0);
    pack(channels(c).map(|v| (v as f32 * k) as u32))
}

/// Saturating additive blend, for glowing particles.
fn add(a: u32, b: u32) -> u32 {
    let (a, b) = (channels(a), channels(b));
    pack([a[0] + b[0], a[1] + b[1], a[2] + b[2]])
}

// ════════════════════════════════════════════════════════════════════════════
// FramePalette
// ════════════════════════════════════════════════════════════════════════════

/// Per-frame colours, taken from the driver's current tints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePalette {
    pub leaf:   u32,
    pub orbit:  u32,
    pub topper: u32,
}

impl FramePalette {
    pub fn new(leaf: &Palette, topper: &Palette) -> Self {
        FramePalette {
            leaf:   to_argb(leaf.base),
            orbit:  to_argb(leaf.emissive),
            topper: to_argb(topper.base.lerp(topper.emissive, 0.5)),
        }
    }

    fn class_color(&self, class: ParticleClass) -> u32 {
        match class {
            ParticleClass::Leaf => self.leaf,
            ParticleClass::Glint => GLINT_COLOR,
            ParticleClass::OrbitTrail => self.orbit,
            ParticleClass::BackgroundStar => SKY_COLOR,
            ParticleClass::PhotoCard => FRAME_COLOR,
        }
    }
}

impl Default for FramePalette {
    fn default() -> Self {
        FramePalette { leaf: 0xFFFF_D1DC, orbit: 0xFFFF_B2D0, topper: 0xFFFF_FFFF }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Canvas
// ════════════════════════════════════════════════════════════════════════════

/// A photo card as drawn last frame, kept for picking.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PhotoQuad {
    index:   usize,
    corners: [Vec2; 4],
    depth:   f32,
}

/// True when `p` lies inside the convex quad (either winding).
fn inside_quad(corners: &[Vec2; 4], p: Vec2) -> bool {
    let mut sign = 0.0f32;
    for i in 0..4 {
        let a = corners[i];
        let b = corners[(i + 1) % 4];
        let cross = (b - a).perp_dot(p - a);
        if cross == 0.0 {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

pub struct Canvas {
    width:        usize,
    height:       usize,
    buf:          Vec<u32>,
    camera:       OrbitCamera,
    view_proj:    Mat4,
    palette:      FramePalette,
    photo_colors: Vec<u32>,
    photos:       Vec<(usize, PhotoPose)>,
    photo_quads:  Vec<PhotoQuad>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        let camera = OrbitCamera::default();
        Canvas {
            width,
            height,
            buf:          vec![BG_COLOR; width * height],
            view_proj:    camera.view_projection(width as f32 / Self::scene_height(height) as f32),
            camera,
            palette:      FramePalette::default(),
            photo_colors: Vec::new(),
            photos:       Vec::new(),
            photo_quads:  Vec::new(),
        }
    }

    fn scene_height(height: usize) -> usize {
        height.saturating_sub(STATUS_H).max(1)
    }

    pub fn width(&self) -> usize  { self.width }
    pub fn height(&self) -> usize { self.height }
    pub fn pixels(&self) -> &[u32] { &self.buf }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.buf[y * self.width + x])
    }

    /// Placeholder colours for the gallery's cards, by index.
    pub fn set_photo_colors(&mut self, colors: &[u32]) {
        self.photo_colors.clear();
        self.photo_colors.extend_from_slice(colors);
    }

    /// Clear and set up projection for a new frame.
    pub fn begin(&mut self, camera: &OrbitCamera, palette: FramePalette) {
        self.buf.fill(BG_COLOR);
        self.camera = *camera;
        self.view_proj = camera.view_projection(self.width as f32 / Self::scene_height(self.height) as f32);
        self.palette = palette;
        self.photos.clear();
    }

    fn project(&self, scene_point: Vec3) -> Option<Projected> {
        self.camera
            .project(&self.view_proj, scene_point + SCENE_OFFSET, self.width, Self::scene_height(self.height))
    }

    // ── Primitives ────────────────────────────────────────────────────────

    fn plot(&mut self, x: i32, y: i32, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < Self::scene_height(self.height) {
            self.buf[y as usize * self.width + x as usize] = color;
        }
    }

    fn glow(&mut self, x: i32, y: i32, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < Self::scene_height(self.height) {
            let i = y as usize * self.width + x as usize;
            self.buf[i] = add(self.buf[i], color);
        }
    }

    /// Soft round dot with linear falloff.
    fn splat(&mut self, center: Vec2, radius: f32, color: u32) {
        if radius < 0.75 {
            self.glow(center.x as i32, center.y as i32, dim(color, radius.max(0.35)));
            return;
        }
        let r = radius.ceil() as i32;
        let (cx, cy) = (center.x as i32, center.y as i32);
        for dy in -r..=r {
            for dx in -r..=r {
                let d = Vec2::new(dx as f32, dy as f32).length();
                if d <= radius {
                    self.glow(cx + dx, cy + dy, dim(color, 1.0 - d / radius));
                }
            }
        }
    }

    fn line(&mut self, a: Vec2, b: Vec2, color: u32) {
        let steps = a.distance(b).ceil().max(1.0) as i32;
        for s in 0..=steps {
            let p = a.lerp(b, s as f32 / steps as f32);
            self.glow(p.x as i32, p.y as i32, color);
        }
    }

    fn fill_quad(&mut self, corners: &[Vec2; 4], color: u32) {
        let min = corners.iter().copied().fold(Vec2::splat(f32::MAX), Vec2::min).floor();
        let max = corners.iter().copied().fold(Vec2::splat(f32::MIN), Vec2::max).ceil();
        let bottom = Self::scene_height(self.height) as f32;
        let (x0, x1) = (min.x.max(0.0) as i32, max.x.min(self.width as f32) as i32);
        let (y0, y1) = (min.y.max(0.0) as i32, max.y.min(bottom) as i32);
        for y in y0..y1 {
            for x in x0..x1 {
                if inside_quad(corners, Vec2::new(x as f32 + 0.5, y as f32 + 0.5)) {
                    self.plot(x, y, color);
                }
            }
        }
    }

    fn ring(&mut self, center: Vec2, radius: f32, color: u32) {
        let steps = (radius * TAU).ceil().max(8.0) as usize;
        for s in 0..steps {
            let a = s as f32 / steps as f32 * TAU;
            let p = center + radius * Vec2::new(a.cos(), a.sin());
            self.plot(p.x as i32, p.y as i32, color);
        }
    }

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(self.height) {
            let start = row * self.width;
            for px in &mut self.buf[start + x.min(self.width)..start + (x + w).min(self.width)] {
                *px = color;
            }
        }
    }

    fn draw_text(&mut self, text: &str, x: usize, y: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let bits = glyph(ch);
            for row in 0..5 {
                let row_bits = (bits >> (3 * (4 - row))) & 0b111;
                for col in 0..3 {
                    if row_bits & (0b100 >> col) != 0 {
                        self.fill_rect(cx + col * GLYPH_PX, y + row * GLYPH_PX, GLYPH_PX, GLYPH_PX, color);
                    }
                }
            }
            cx += 4 * GLYPH_PX;
            if cx + 4 * GLYPH_PX > self.width {
                break;
            }
        }
    }

    // ── Scene pieces ──────────────────────────────────────────────────────

    /// Five spinning spokes at the top of the tree.
    pub fn draw_topper(&mut self, topper: &StarTopper) {
        let Some(p) = self.project(topper.position()) else { return };
        let radius = topper.scale * TOPPER_SIZE * p.pixels_per_unit;
        if radius < 0.5 {
            return;
        }
        let color = self.palette.topper;
        for k in 0..5 {
            let a = topper.spin + k as f32 * TAU / 5.0;
            let tip = p.screen + radius * Vec2::new(a.sin(), -a.cos());
            self.line(p.screen, tip, color);
        }
        self.splat(p.screen, radius * 0.35, color);
    }

    /// Rasterise the photos collected this frame, far to near.
    pub fn finish_photos(&mut self) {
        let photos = std::mem::take(&mut self.photos);
        let mut quads: Vec<(PhotoQuad, PhotoPose)> = photos
            .iter()
            .filter_map(|(index, pose)| self.photo_quad(*index, pose).map(|q| (q, *pose)))
            .collect();
        quads.sort_by(|a, b| b.0.depth.total_cmp(&a.0.depth));

        for (quad, pose) in &quads {
            let frame = if pose.focused { FOCUS_COLOR } else { FRAME_COLOR };
            self.fill_quad(&quad.corners, dim(frame, pose.brightness));

            let centre = quad.corners.iter().copied().sum::<Vec2>() / 4.0;
            let inner = quad.corners.map(|c| centre + (c - centre) * CARD_INSET);
            let picture = self.photo_colors.get(quad.index).copied().unwrap_or(FRAME_COLOR);
            self.fill_quad(&inner, dim(picture, pose.brightness));
        }
        self.photo_quads = quads.into_iter().map(|(q, _)| q).collect();
        self.photos = photos;
    }

    fn photo_quad(&self, index: usize, pose: &PhotoPose) -> Option<PhotoQuad> {
        let half = CARD_HALF * pose.scale;
        let offsets = [
            Vec2::new(-half.x, -half.y),
            Vec2::new(half.x, -half.y),
            Vec2::new(half.x, half.y),
            Vec2::new(-half.x, half.y),
        ];
        let mut corners = [Vec2::ZERO; 4];
        let mut depth = 0.0;
        for (corner, off) in corners.iter_mut().zip(offsets) {
            let world = pose.position + pose.orientation * Vec3::new(off.x, off.y, 0.0);
            let p = self.project(world)?;
            *corner = p.screen;
            depth += p.depth * 0.25;
        }
        Some(PhotoQuad { index, corners, depth })
    }

    /// Nearest photo under a screen point in the last drawn frame.
    pub fn pick_photo(&self, point: Vec2) -> Option<usize> {
        self.photo_quads
            .iter()
            .filter(|q| inside_quad(&q.corners, point))
            .min_by(|a, b| a.depth.total_cmp(&b.depth))
            .map(|q| q.index)
    }

    pub fn draw_status(&mut self, status: &StatusSnapshot, photos: usize, focused: Option<usize>) {
        let scene_h = Self::scene_height(self.height);

        let g = status.gesture;
        if status.gesture_enabled && g.is_active {
            let at = g.cursor * Vec2::new(self.width as f32, scene_h as f32);
            let color = if g.is_pinching { CURSOR_PINCH } else { CURSOR_IDLE };
            self.ring(at, 10.0, color);
            self.ring(at, 3.0, color);
        }

        self.fill_rect(0, scene_h, self.width, self.height - scene_h.min(self.height), STATUS_BG);
        let hand = if !status.gesture_enabled {
            "GESTURE: OFF".to_string()
        } else if g.is_active {
            format!(
                "GESTURE: ON  HAND: YES  PINCH: {}  FINGERS: {}",
                if g.is_pinching { "YES" } else { "NO" },
                g.finger_count,
            )
        } else {
            "GESTURE: ON  HAND: NO".to_string()
        };
        let focus = focused.map_or("-".to_string(), |i| (i + 1).to_string());
        let line = format!(
            "MODE: {}  THEME: {}  {}  PHOTOS: {}  FOCUS: {}",
            status.mode.name(),
            status.theme.name(),
            hand,
            photos,
            focus,
        );
        self.draw_text(&line, 8, scene_h + 4, TEXT_COLOR);
        self.draw_text(
            "SPACE=MODE  T=THEME  G=GESTURE  H=HAND  P=PINCH  CLICK=PHOTO  DRAG=ORBIT  Q=QUIT",
            8,
            scene_h + 20,
            LEGEND_COLOR,
        );
    }
}

impl InstanceSink for Canvas {
    fn set_instance(&mut self, class: ParticleClass, _index: usize, position: Vec3, scale: f32) {
        if scale.is_nan() || scale <= 0.0 {
            return;
        }
        let Some(p) = self.project(position) else { return };
        let color = self.palette.class_color(class);
        self.splat(p.screen, scale * SPLAT_SIZE * p.pixels_per_unit, color);
    }

    fn set_photo(&mut self, index: usize, pose: &PhotoPose) {
        self.photos.push((index, *pose));
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer: the window
// ════════════════════════════════════════════════════════════════════════════

/// Everything the frame loop needs from one round of window input.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    pub quit:           bool,
    pub toggle_mode:    bool,
    pub cycle_theme:    bool,
    pub toggle_gesture: bool,
    /// Screen point of a completed click (press and release without a drag).
    pub click:          Option<Vec2>,
    /// Accumulated drag this frame, in pixels.
    pub drag:           Vec2,
    /// Scroll notches; positive zooms in.
    pub zoom:           f32,
}

#[derive(Debug, Default)]
struct MouseTracker {
    pressed_at: Option<Vec2>,
    last:       Vec2,
    dragging:   bool,
}

impl MouseTracker {
    /// Feed one sample; returns (drag delta, completed click).
    fn update(&mut self, pos: Vec2, down: bool) -> (Vec2, Option<Vec2>) {
        match (self.pressed_at, down) {
            (None, true) => {
                self.pressed_at = Some(pos);
                self.last = pos;
                self.dragging = false;
                (Vec2::ZERO, None)
            }
            (Some(start), true) => {
                if pos.distance(start) > CLICK_SLOP {
                    self.dragging = true;
                }
                let delta = if self.dragging { pos - self.last } else { Vec2::ZERO };
                self.last = pos;
                (delta, None)
            }
            (Some(_), false) => {
                self.pressed_at = None;
                let click = (!self.dragging).then_some(pos);
                self.dragging = false;
                (Vec2::ZERO, click)
            }
            (None, false) => (Vec2::ZERO, None),
        }
    }
}

pub struct Visualizer {
    window: Window,
    canvas: Canvas,
    sim_tx: Sender<SimInput>,
    mouse:  MouseTracker,
}

impl Visualizer {
    pub fn new(size: WindowConfig, sim_tx: Sender<SimInput>) -> Result<Self, minifb::Error> {
        let mut window = Window::new(
            "Holiday Tree",
            size.width,
            size.height,
            WindowOptions { resize: false, ..WindowOptions::default() },
        )?;
        window.limit_update_rate(Some(Duration::from_millis(16)));

        Ok(Visualizer {
            window,
            canvas: Canvas::new(size.width, size.height),
            sim_tx,
            mouse: MouseTracker::default(),
        })
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    /// Read keyboard and mouse, and forward the simulated hand to the
    /// gesture thread.
    pub fn poll_input(&mut self) -> FrameInput {
        let mut input = FrameInput::default();
        if !self.window.is_open() {
            input.quit = true;
            return input;
        }

        let pressed = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);
        input.quit = pressed(Key::Q) || pressed(Key::Escape);
        input.toggle_mode = pressed(Key::Space);
        input.cycle_theme = pressed(Key::T);
        input.toggle_gesture = pressed(Key::G);

        let pos = self
            .window
            .get_mouse_pos(MouseMode::Clamp)
            .map_or(self.mouse.last, |(x, y)| Vec2::new(x, y));
        let (drag, click) = self.mouse.update(pos, self.window.get_mouse_down(MouseButton::Left));
        input.drag = drag;
        input.click = click;
        if let Some((_, dy)) = self.window.get_scroll_wheel() {
            input.zoom = dy.signum();
        }

        let size = Vec2::new(self.canvas.width as f32, Canvas::scene_height(self.canvas.height) as f32);
        let sim = SimInput {
            present: self.window.is_key_down(Key::H),
            pinch:   self.window.is_key_down(Key::P),
            cursor:  (pos / size).clamp(Vec2::ZERO, Vec2::ONE),
        };
        let _ = self.sim_tx.send(sim);

        input
    }

    pub fn present(&mut self) -> Result<(), minifb::Error> {
        self.window
            .update_with_buffer(self.canvas.pixels(), self.canvas.width, self.canvas.height)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// 3×5 bitmap font: one octal digit per row, top row first.
// ────────────────────────────────────────────────────────────────────────────

const GLYPHS: &[(char, u16)] = &[
    ('0', 0o75557), ('1', 0o26227), ('2', 0o71747), ('3', 0o71717), ('4', 0o55711), ('5', 0o74717),
    ('6', 0o74757), ('7', 0o71111), ('8', 0o75757), ('9', 0o75717), ('A', 0o75755), ('B', 0o65656),
    ('C', 0o74447), ('D', 0o65556), ('E', 0o74747), ('F', 0o74744), ('G', 0o74557), ('H', 0o55755),
    ('I', 0o72227), ('J', 0o11157), ('K', 0o55655), ('L', 0o44447), ('M', 0o57555), ('N', 0o75555),
    ('O', 0o75557), ('P', 0o75744), ('Q', 0o75571), ('R', 0o65655), ('S', 0o74717), ('T', 0o72222),
    ('U', 0o55557), ('V', 0o55522), ('W', 0o55575), ('X', 0o55255), ('Y', 0o55722), ('Z', 0o71247),
    ('/', 0o11244), ('-', 0o00700), ('.', 0o00002), (',', 0o00024), (':', 0o02020), ('=', 0o07070),
    ('+', 0o02720), ('(', 0o24442), (')', 0o21112), ('|', 0o22222), ('[', 0o64446), (']', 0o31113),
    (' ', 0o00000),
];

fn glyph(c: char) -> u16 {
    let c = c.to_ascii_uppercase();
    GLYPHS
        .iter()
        .find(|(g, _)| *g == c)
        .map_or(0o00200, |(_, bits)| *bits)
}
