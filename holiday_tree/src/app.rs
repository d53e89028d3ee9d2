//! Top-level application state.
//!
//! `AppState` owns the scene state machine, the particle animation driver,
//! the photo gallery and the camera.  Each frame it takes window input and
//! the newest gesture snapshot, advances the animation and paints a
//! [`Canvas`].

use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Instant;

use glam::Vec2;
use rand::Rng;
use tracing::{info, warn};

use holiday_field::{
    generate, AnimationDriver, GestureFrame, InstanceSink, PhotoGallery, SceneState,
};

use crate::camera::OrbitCamera;
use crate::config::AppConfig;
use crate::error::{AppError, GestureError};
use crate::gesture::{spawn_gesture_source, GestureHandle, SimInput};
use crate::visualizer::{handle_color, Canvas, FramePalette, FrameInput, Visualizer};

/// Longest frame step fed to the animation, so a stalled window does not
/// fast-forward the scene.
const MAX_FRAME_DT: f32 = 0.1;

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    scene:        SceneState,
    driver:       AnimationDriver,
    gallery:      PhotoGallery,
    camera:       OrbitCamera,
    photo_colors: Vec<u32>,
    /// False once the tracker reported it cannot run.
    tracking_ok:  bool,
}

impl AppState {
    pub fn new<R: Rng + ?Sized>(cfg: &AppConfig, rng: &mut R) -> Self {
        let field = generate(&cfg.field, rng);
        info!(
            leaves = field.leaves.len(),
            glints = field.glints.len(),
            orbit = field.orbit.len(),
            stars = field.stars.len(),
            "particle field generated"
        );
        let mut app = AppState {
            scene:        SceneState::new(cfg.theme, cfg.gesture),
            driver:       AnimationDriver::new(field, cfg.theme),
            gallery:      PhotoGallery::new(),
            camera:       OrbitCamera::default(),
            photo_colors: Vec::new(),
            tracking_ok:  true,
        };
        app.replace_photos(&cfg.photos);
        app
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn scene(&self) -> &SceneState          { &self.scene }
    pub fn driver(&self) -> &AnimationDriver    { &self.driver }
    pub fn gallery(&self) -> &PhotoGallery      { &self.gallery }
    pub fn camera(&self) -> &OrbitCamera        { &self.camera }
    pub fn photo_colors(&self) -> &[u32]        { &self.photo_colors }

    // ── Photos ────────────────────────────────────────────────────────────

    pub fn replace_photos(&mut self, photos: &[String]) {
        warn_missing(photos);
        self.gallery.replace(photos.iter().cloned());
        self.refresh_photo_colors();
    }

    pub fn append_photos(&mut self, photos: &[String]) {
        warn_missing(photos);
        self.gallery.append(photos.iter().cloned());
        self.refresh_photo_colors();
    }

    fn refresh_photo_colors(&mut self) {
        self.photo_colors = self.gallery.entries().iter().map(|e| handle_color(&e.handle)).collect();
    }

    // ── Input ─────────────────────────────────────────────────────────────

    /// Apply one frame of window input.  `pick` resolves a click position to
    /// the photo under it.
    pub fn handle_input<F>(&mut self, input: &FrameInput, pick: F)
    where
        F: FnOnce(Vec2) -> Option<usize>,
    {
        if input.toggle_mode {
            let mode = self.scene.toggle_mode();
            info!(mode = mode.name(), "mode toggled");
        }
        if input.cycle_theme {
            let theme = self.scene.cycle_theme();
            info!(theme = theme.name(), "theme changed");
        }
        if input.toggle_gesture {
            self.toggle_gesture();
        }
        if let Some(at) = input.click {
            match pick(at) {
                Some(i) => {
                    let focus = self.gallery.click(i);
                    info!(photo = i, focused = focus.is_some(), "photo clicked");
                }
                None => self.gallery.miss(),
            }
        }
        if input.drag != Vec2::ZERO {
            self.camera.drag(input.drag);
        }
        if input.zoom != 0.0 {
            self.camera.zoom(input.zoom);
        }
    }

    fn toggle_gesture(&mut self) {
        let enable = !self.scene.gesture_enabled();
        if enable && !self.tracking_ok {
            warn!("hand tracking is unavailable; gesture mode stays off");
            return;
        }
        self.scene.set_gesture_enabled(enable);
        info!(enabled = enable, "gesture mode");
    }

    // ── Gestures ──────────────────────────────────────────────────────────

    pub fn apply_gesture(&mut self, frame: GestureFrame) {
        if let Some(mode) = self.scene.apply_gesture(frame) {
            info!(mode = mode.name(), pinching = frame.is_pinching, "gesture switched mode");
        }
    }

    /// The tracker could not start.  Reported once; the scene carries on
    /// under manual control.
    pub fn gesture_unavailable(&mut self, err: &GestureError) {
        warn!(error = %err, "hand tracking unavailable, continuing without gestures");
        self.tracking_ok = false;
        self.scene.set_gesture_enabled(false);
    }

    // ── Per-frame ─────────────────────────────────────────────────────────

    /// Advance camera, particles and photos by `dt` seconds.
    pub fn tick<S: InstanceSink + ?Sized>(&mut self, dt: f32, sink: &mut S) {
        let mode = self.scene.mode();
        self.camera.tick(dt, mode.is_tree());
        self.driver.tick(mode, self.scene.theme(), dt, sink);
        self.gallery.tick(mode, self.camera.scene_position(), sink);
    }

    /// Advance one frame and paint it.
    pub fn render(&mut self, dt: f32, canvas: &mut Canvas) {
        let palette = FramePalette::new(&self.driver.leaf_tint().current, &self.driver.topper().tint.current);
        canvas.begin(&self.camera, palette);
        canvas.set_photo_colors(&self.photo_colors);
        self.tick(dt, canvas);
        canvas.draw_topper(self.driver.topper());
        canvas.finish_photos();
        canvas.draw_status(&self.scene.status(), self.gallery.len(), self.gallery.focused());
    }
}

fn warn_missing(photos: &[String]) {
    for photo in photos.iter().filter(|p| !Path::new(p.as_str()).exists()) {
        warn!(photo = %photo, "photo file not found, showing a blank card");
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run(): the main application loop
// ════════════════════════════════════════════════════════════════════════════

#[cfg(not(feature = "leap"))]
fn start_tracking(sim: Receiver<SimInput>) -> GestureHandle {
    info!("hand tracking: keyboard/mouse simulation (hold H for a hand, hold P to pinch)");
    spawn_gesture_source(move || crate::gesture::SimLandmarkSource::new(sim))
}

#[cfg(feature = "leap")]
fn start_tracking(_sim: Receiver<SimInput>) -> GestureHandle {
    info!("hand tracking: LeapMotion");
    spawn_gesture_source(crate::gesture::LeapLandmarkSource::new)
}

/// Read photo paths, one per line, on a background thread.  Blank lines are
/// skipped and the thread ends with the input.
pub fn spawn_photo_reader<R: BufRead + Send + 'static>(reader: R) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name("photo-input".into())
        .spawn(move || {
            for line in reader.lines() {
                let Ok(line) = line else { break };
                let path = line.trim();
                if path.is_empty() {
                    continue;
                }
                if tx.send(path.to_string()).is_err() {
                    break;
                }
            }
        });
    if spawned.is_err() {
        warn!("could not start the photo input thread");
    }
    rx
}

/// Open the window, start hand tracking and run until the window closes.
pub fn run(cfg: AppConfig) -> Result<(), AppError> {
    let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();
    let mut vis = Visualizer::new(cfg.window, sim_tx)?;
    let tracking = start_tracking(sim_rx);
    let added_photos = spawn_photo_reader(BufReader::new(io::stdin()));

    let mut app = AppState::new(&cfg, &mut rand::thread_rng());
    let mut last = Instant::now();

    while vis.is_open() {
        let input = vis.poll_input();
        if input.quit {
            break;
        }
        app.handle_input(&input, |at| vis.canvas().pick_photo(at));

        let poll = tracking.poll();
        if let Some(err) = poll.failure {
            app.gesture_unavailable(&err);
        }
        if let Some(frame) = poll.latest {
            app.apply_gesture(frame);
        }

        let added: Vec<String> = added_photos.try_iter().collect();
        if !added.is_empty() {
            info!(count = added.len(), "appending photos from stdin");
            app.append_photos(&added);
        }

        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32().min(MAX_FRAME_DT);
        last = now;

        app.render(dt, vis.canvas_mut());
        vis.present()?;
    }

    tracking.stop();
    info!("window closed");
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use holiday_field::{ColorTheme, FieldConfig, Mode, ParticleClass, PhotoPose};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small_config() -> AppConfig {
        AppConfig {
            field:  FieldConfig { leaves: 40, glints: 10, orbit: 20, stars: 5 },
            photos: (0..6).map(|i| format!("/nonexistent/photo_{i}.jpg")).collect(),
            ..AppConfig::default()
        }
    }

    fn make_app() -> AppState {
        AppState::new(&small_config(), &mut StdRng::seed_from_u64(7))
    }

    fn hand(pinching: bool) -> GestureFrame {
        GestureFrame { is_active: true, cursor: Vec2::splat(0.5), is_pinching: pinching, finger_count: 5 }
    }

    fn press(f: impl FnOnce(&mut FrameInput)) -> FrameInput {
        let mut input = FrameInput::default();
        f(&mut input);
        input
    }

    #[derive(Default)]
    struct Counter {
        instances: usize,
        photos:    usize,
    }

    impl InstanceSink for Counter {
        fn set_instance(&mut self, _: ParticleClass, _: usize, _: Vec3, _: f32) {
            self.instances += 1;
        }
        fn set_photo(&mut self, _: usize, _: &PhotoPose) {
            self.photos += 1;
        }
    }

    #[test]
    fn starts_as_a_tree_with_all_photos() {
        let app = make_app();
        assert_eq!(app.scene().mode(), Mode::Tree);
        assert_eq!(app.gallery().len(), 6);
        assert_eq!(app.photo_colors().len(), 6);
    }

    #[test]
    fn space_toggles_mode() {
        let mut app = make_app();
        app.handle_input(&press(|i| i.toggle_mode = true), |_| None);
        assert_eq!(app.scene().mode(), Mode::Explode);
        app.handle_input(&press(|i| i.toggle_mode = true), |_| None);
        assert_eq!(app.scene().mode(), Mode::Tree);
    }

    #[test]
    fn theme_key_cycles() {
        let mut app = make_app();
        app.handle_input(&press(|i| i.cycle_theme = true), |_| None);
        assert_eq!(app.scene().theme(), ColorTheme::Gold);
    }

    #[test]
    fn open_hand_explodes_and_pinch_gathers() {
        let mut app = make_app();
        app.apply_gesture(hand(false));
        assert_eq!(app.scene().mode(), Mode::Explode);
        app.apply_gesture(hand(true));
        assert_eq!(app.scene().mode(), Mode::Tree);
    }

    #[test]
    fn gestures_ignored_once_disabled() {
        let mut app = make_app();
        app.handle_input(&press(|i| i.toggle_gesture = true), |_| None);
        assert!(!app.scene().gesture_enabled());
        app.apply_gesture(hand(false));
        assert_eq!(app.scene().mode(), Mode::Tree);
    }

    #[test]
    fn tracker_failure_keeps_gestures_off() {
        let mut app = make_app();
        app.gesture_unavailable(&GestureError::DeviceUnavailable("no camera".into()));
        assert!(!app.scene().gesture_enabled());
        app.handle_input(&press(|i| i.toggle_gesture = true), |_| None);
        assert!(!app.scene().gesture_enabled());
        // Manual control still works.
        app.handle_input(&press(|i| i.toggle_mode = true), |_| None);
        assert_eq!(app.scene().mode(), Mode::Explode);
    }

    #[test]
    fn clicks_focus_release_and_miss() {
        let mut app = make_app();
        let click = press(|i| i.click = Some(Vec2::new(10.0, 10.0)));

        app.handle_input(&click, |_| Some(2));
        assert_eq!(app.gallery().focused(), Some(2));
        app.handle_input(&click, |_| Some(2));
        assert_eq!(app.gallery().focused(), None);

        app.handle_input(&click, |_| Some(4));
        app.handle_input(&click, |_| None);
        assert_eq!(app.gallery().focused(), None);
    }

    #[test]
    fn pick_is_only_consulted_on_click() {
        let mut app = make_app();
        app.handle_input(&FrameInput::default(), |_| panic!("no click this frame"));
    }

    #[test]
    fn tick_commits_every_instance() {
        let mut app = make_app();
        let mut sink = Counter::default();
        app.tick(1.0 / 60.0, &mut sink);
        assert_eq!(sink.instances, 40 + 10 + 20 + 5);
        assert_eq!(sink.photos, 6);
    }

    #[test]
    fn append_extends_the_gallery() {
        let mut app = make_app();
        app.append_photos(&["/nonexistent/extra.jpg".to_string()]);
        assert_eq!(app.gallery().len(), 7);
        assert_eq!(app.photo_colors().len(), 7);
        app.replace_photos(&[]);
        assert!(app.gallery().is_empty());
    }

    #[test]
    fn photo_reader_skips_blank_lines() {
        let rx = spawn_photo_reader(io::Cursor::new("a.jpg\n\n  b.png \n"));
        let paths: Vec<String> = rx.iter().collect();
        assert_eq!(paths, ["a.jpg", "b.png"]);
    }

    #[test]
    fn render_paints_a_frame() {
        let mut app = make_app();
        let mut canvas = Canvas::new(160, 120);
        app.render(1.0 / 60.0, &mut canvas);
        let first = canvas.pixels()[0];
        assert!(canvas.pixels().iter().any(|&p| p != first));
    }
}
