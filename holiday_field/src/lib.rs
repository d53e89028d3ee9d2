//! # holiday_field
//!
//! The animated core of the holiday tree: a particle tree that explodes into
//! a shell of sparks and a heart of photos, and gathers back again.
//!
//! ## Particle classes
//!
//! | Class | Tree layout | Explode layout | Lerp (tree / explode) |
//! |---|---|---|---|
//! | Leaf | outward-biased cone | spherical shell r ∈ [18, 43] | 0.08 / 0.04 |
//! | Glint | tighter cone | shell, scaled to zero | 0.08 / 0.04 |
//! | OrbitTrail | rotating 3-turn spiral | its leaf's burst × 1.2 | 0.04 / 0.04 |
//! | BackgroundStar | static far shell | same | n/a |
//! | PhotoCard | golden-angle spiral | heart curve | 0.08 / 0.08 |
//!
//! ## Pipeline
//!
//! ```text
//! landmarks ─▶ GestureStabilizer ─▶ GestureFrame ─▶ SceneState (mode)
//!                                                        │
//!              field::generate ─▶ Field ─▶ AnimationDriver ─▶ InstanceSink
//!              photo list ─▶ PhotoGallery (layout, focus, orientation) ─┘
//! ```

pub mod hand;
pub mod theme;
pub mod scene;
pub mod particle;
pub mod field;
pub mod orient;
pub mod gallery;
pub mod driver;

pub use driver::AnimationDriver;
pub use field::{generate, Field, FieldConfig};
pub use gallery::{PhotoGallery, PhotoHandle};
pub use hand::{GestureFrame, GestureStabilizer, HandLandmark, HandLandmarks};
pub use particle::{InstanceSink, ParticleClass, PhotoPose};
pub use scene::{Mode, SceneState, StatusSnapshot};
pub use theme::ColorTheme;
