//! # holiday_tree
//!
//! Interactive front end for [`holiday_field`]: a window showing the particle
//! tree, driven by hand gestures, keyboard and mouse.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Action |
//! |---|---|
//! | Pinch (thumb and index tips together) | Gather into the tree |
//! | Open hand | Explode into the spark shell and photo heart |
//! | No hand in view | Nothing; the scene keeps its mode |
//!
//! Pinch uses hysteresis: it is acquired below 0.12 and released above 0.25
//! (normalised image units), so a hand resting near one threshold does not
//! flicker between modes.
//!
//! ## Feature flags
//!
//! * (default): **Simulation**: the keyboard and mouse synthesise a hand.
//! * `leap`: **Hardware**: a LeapMotion controller via LeapC.
//!
//! ### Keys
//!
//! | Key | Action |
//! |---|---|
//! | `Space` | Toggle tree / explode |
//! | `T` | Next colour theme |
//! | `G` | Gesture control on / off |
//! | `H` (hold) | Simulated hand in view, cursor follows the mouse |
//! | `P` (hold) | Simulated pinch |
//! | Click | Focus a photo, click again to release, click empty space to clear |
//! | Drag / scroll | Orbit / zoom the camera |
//! | `Q` / `Esc` | Quit |
//!
//! Photo paths written to stdin, one per line, are appended to the gallery
//! while the window is open.

pub mod config;
pub mod error;
pub mod gesture;
pub mod camera;
pub mod visualizer;
pub mod app;
