//! Application configuration.
//!
//! Defaults come from [`AppConfig::default`]; an optional TOML file overrides
//! them and command-line flags override the file.
//!
//! ```toml
//! gesture = true
//! theme   = "gold"
//! photos  = ["us_2022.jpg", "snow.png"]
//!
//! [field]
//! leaves = 6000
//! orbit  = 2000
//!
//! [window]
//! width  = 960
//! height = 720
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use holiday_field::{ColorTheme, FieldConfig};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width:  usize,
    pub height: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig { width: 960, height: 720 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub field:   FieldConfig,
    /// Start with hand-gesture control on.
    pub gesture: bool,
    pub theme:   ColorTheme,
    /// Photo handles in display order.
    pub photos:  Vec<String>,
    pub window:  WindowConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            field:   FieldConfig::default(),
            gesture: true,
            theme:   ColorTheme::Pink,
            photos:  Vec::new(),
            window:  WindowConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_toml(path: &Path, text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_toml(path, &text)
    }

    /// A lighter field for slow machines.
    pub fn quick() -> Self {
        AppConfig {
            field: FieldConfig { leaves: 3_000, glints: 400, orbit: 1_000, stars: 300 },
            ..AppConfig::default()
        }
    }

    /// Layer command-line values over whatever the file gave.
    pub fn apply(&mut self, overrides: &Overrides) {
        if overrides.quick {
            self.field = AppConfig::quick().field;
        }
        if let Some(leaves) = overrides.leaves {
            self.field.leaves = leaves;
        }
        if let Some(theme) = overrides.theme {
            self.theme = theme;
        }
        if overrides.no_gesture {
            self.gesture = false;
        }
        if !overrides.photos.is_empty() {
            self.photos = overrides.photos.clone();
        }
    }
}

/// Values given on the command line.  Unset fields leave the config alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub photos:     Vec<String>,
    pub no_gesture: bool,
    pub leaves:     Option<usize>,
    pub theme:      Option<ColorTheme>,
    pub quick:      bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = AppConfig::from_toml(Path::new("t.toml"), "").unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn partial_file_overrides_only_named_keys() {
        let text = r#"
            theme = "blue"
            photos = ["a.jpg", "b.jpg"]
            [field]
            leaves = 123
        "#;
        let cfg = AppConfig::from_toml(Path::new("t.toml"), text).unwrap();
        assert_eq!(cfg.theme, ColorTheme::Blue);
        assert_eq!(cfg.photos.len(), 2);
        assert_eq!(cfg.field.leaves, 123);
        assert_eq!(cfg.field.orbit, FieldConfig::default().orbit);
        assert!(cfg.gesture);
    }

    #[test]
    fn bad_theme_is_a_parse_error() {
        let err = AppConfig::from_toml(Path::new("t.toml"), "theme = \"teal\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn overrides_win_over_file() {
        let mut cfg = AppConfig::from_toml(Path::new("t.toml"), "photos = [\"a.jpg\"]\ntheme = \"gold\"").unwrap();
        cfg.apply(&Overrides {
            photos:     vec!["b.jpg".into(), "c.jpg".into()],
            no_gesture: true,
            leaves:     Some(42),
            theme:      None,
            quick:      true,
        });
        assert_eq!(cfg.photos, vec!["b.jpg".to_string(), "c.jpg".to_string()]);
        assert!(!cfg.gesture);
        assert_eq!(cfg.theme, ColorTheme::Gold);
        // --leaves beats --quick.
        assert_eq!(cfg.field.leaves, 42);
        assert_eq!(cfg.field.orbit, AppConfig::quick().field.orbit);
    }

    #[test]
    fn empty_overrides_change_nothing() {
        let mut cfg = AppConfig::default();
        cfg.apply(&Overrides::default());
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = AppConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
