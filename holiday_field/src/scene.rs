//! Scene mode controller.
//!
//! [`SceneState`] is the one place the tree/explode mode and the colour theme
//! live.  Everything that animates reads it; only the entry points below
//! change it.

use tracing::debug;

use crate::hand::GestureFrame;
use crate::theme::ColorTheme;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Gathered into the cone.
    #[default]
    Tree,
    /// Dispersed into the shell and the photo heart.
    Explode,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Mode::Tree => Mode::Explode,
            Mode::Explode => Mode::Tree,
        }
    }

    pub fn is_tree(self) -> bool {
        self == Mode::Tree
    }

    pub fn name(self) -> &'static str {
        match self {
            Mode::Tree => "TREE",
            Mode::Explode => "EXPLODE",
        }
    }
}

/// What a status indicator needs to show.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusSnapshot {
    pub mode:            Mode,
    pub theme:           ColorTheme,
    pub gesture_enabled: bool,
    pub gesture:         GestureFrame,
}

#[derive(Debug, Clone)]
pub struct SceneState {
    mode:            Mode,
    theme:           ColorTheme,
    gesture_enabled: bool,
    last_gesture:    GestureFrame,
}

impl Default for SceneState {
    fn default() -> Self {
        Self::new(ColorTheme::default(), true)
    }
}

impl SceneState {
    pub fn new(theme: ColorTheme, gesture_enabled: bool) -> Self {
        SceneState {
            mode: Mode::Tree,
            theme,
            gesture_enabled,
            last_gesture: GestureFrame::inactive(),
        }
    }

    pub fn mode(&self) -> Mode                { self.mode }
    pub fn theme(&self) -> ColorTheme         { self.theme }
    pub fn gesture_enabled(&self) -> bool     { self.gesture_enabled }
    pub fn last_gesture(&self) -> GestureFrame { self.last_gesture }

    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            mode:            self.mode,
            theme:           self.theme,
            gesture_enabled: self.gesture_enabled,
            gesture:         self.last_gesture,
        }
    }

    /// Manual one-shot flip.
    pub fn toggle_mode(&mut self) -> Mode {
        self.mode = self.mode.toggled();
        debug!(mode = self.mode.name(), "manual toggle");
        self.mode
    }

    pub fn cycle_theme(&mut self) -> ColorTheme {
        self.theme = self.theme.next();
        self.theme
    }

    /// Turning gesture control off also forgets the last hand so the status
    /// indicator stops showing it.
    pub fn set_gesture_enabled(&mut self, enabled: bool) {
        self.gesture_enabled = enabled;
        if !enabled {
            self.last_gesture = GestureFrame::inactive();
        }
    }

    /// Apply the newest stabilised gesture.
    ///
    /// While gesture control is on and a hand is in view, pinching selects the
    /// tree and an open hand selects the explosion, every frame.  Returns the
    /// new mode only when it actually changed.
    pub fn apply_gesture(&mut self, frame: GestureFrame) -> Option<Mode> {
        if !self.gesture_enabled {
            return None;
        }
        self.last_gesture = frame;
        if !frame.is_active {
            return None;
        }
        let wanted = if frame.is_pinching { Mode::Tree } else { Mode::Explode };
        if wanted == self.mode {
            return None;
        }
        self.mode = wanted;
        debug!(mode = wanted.name(), fingers = frame.finger_count, "gesture transition");
        Some(wanted)
    }
}
