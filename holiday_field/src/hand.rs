//! Hand-landmark debouncing.
//!
//! A detection backend delivers, per camera frame, either nothing (no hand)
//! or 21 landmark points in normalised image coordinates (`x`, `y` ∈ [0,1],
//! `y` growing downward).  [`GestureStabilizer`] turns that noisy stream into
//! a [`GestureFrame`]: a debounced pinch flag, a cursor and a finger count.
//!
//! The only state carried between frames is the last stable pinch flag.

use glam::Vec2;

/// Landmarks per hand (MediaPipe hand model).
pub const LANDMARK_COUNT: usize = 21;

/// Pinch is acquired when thumb–index distance drops below this.
pub const PINCH_ACQUIRE: f32 = 0.12;
/// Pinch is released only once the distance exceeds this.
pub const PINCH_RELEASE: f32 = 0.25;
/// Horizontal thumb displacement (fraction of frame width) that counts as extended.
pub const THUMB_SPREAD: f32 = 0.05;

// ════════════════════════════════════════════════════════════════════════════
// HandLandmark: MediaPipe indexing
// ════════════════════════════════════════════════════════════════════════════

/// The 21 hand landmarks, in detector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandLandmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

impl HandLandmark {
    pub fn index(self) -> usize {
        self as usize
    }

    /// (tip, knuckle) pairs for the four non-thumb fingers.
    pub fn finger_pairs() -> [(HandLandmark, HandLandmark); 4] {
        [
            (Self::IndexTip, Self::IndexPip),
            (Self::MiddleTip, Self::MiddlePip),
            (Self::RingTip, Self::RingPip),
            (Self::PinkyTip, Self::PinkyPip),
        ]
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandLandmarks: one detected hand
// ════════════════════════════════════════════════════════════════════════════

/// One hand's landmark set for a single camera frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandLandmarks {
    points: [Vec2; LANDMARK_COUNT],
}

impl HandLandmarks {
    pub fn new(points: [Vec2; LANDMARK_COUNT]) -> Self {
        HandLandmarks { points }
    }

    /// Build from a detector slice; `None` if it carries fewer than 21 points.
    pub fn from_slice(points: &[Vec2]) -> Option<Self> {
        let points: [Vec2; LANDMARK_COUNT] = points.get(..LANDMARK_COUNT)?.try_into().ok()?;
        Some(HandLandmarks { points })
    }

    pub fn get(&self, landmark: HandLandmark) -> Vec2 {
        self.points[landmark.index()]
    }

    pub fn set(&mut self, landmark: HandLandmark, point: Vec2) {
        self.points[landmark.index()] = point;
    }

    /// Thumb-tip to index-tip distance.
    pub fn pinch_distance(&self) -> f32 {
        self.get(HandLandmark::ThumbTip)
            .distance(self.get(HandLandmark::IndexTip))
    }

    /// Extended fingers, 0–5.
    ///
    /// A finger is extended when its tip sits above its PIP knuckle on screen.
    /// The thumb is judged by horizontal spread from its MCP joint instead.
    pub fn finger_count(&self) -> u8 {
        let mut fingers = HandLandmark::finger_pairs()
            .iter()
            .filter(|(tip, knuckle)| self.get(*tip).y < self.get(*knuckle).y)
            .count() as u8;
        let thumb_dx = self.get(HandLandmark::ThumbTip).x - self.get(HandLandmark::ThumbMcp).x;
        if thumb_dx.abs() > THUMB_SPREAD {
            fingers += 1;
        }
        fingers
    }

    /// Cursor from the middle-finger MCP, mirrored horizontally to match a
    /// selfie-view camera.
    pub fn cursor(&self) -> Vec2 {
        let anchor = self.get(HandLandmark::MiddleMcp);
        Vec2::new(1.0 - anchor.x, anchor.y)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureFrame: the stabilised per-frame signal
// ════════════════════════════════════════════════════════════════════════════

/// Stabilised gesture state for one camera frame.
///
/// Small and `Copy`: the detection thread hands it over whole.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureFrame {
    pub is_active:    bool,
    /// Normalised, mirrored cursor (0–1 on both axes).
    pub cursor:       Vec2,
    pub is_pinching:  bool,
    pub finger_count: u8,
}

impl GestureFrame {
    /// The frame emitted when no hand is in view.
    pub fn inactive() -> Self {
        GestureFrame {
            is_active:    false,
            cursor:       Vec2::splat(0.5),
            is_pinching:  false,
            finger_count: 0,
        }
    }
}

impl Default for GestureFrame {
    fn default() -> Self {
        Self::inactive()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PinchHysteresis
// ════════════════════════════════════════════════════════════════════════════

/// Dual-threshold pinch latch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchHysteresis {
    pinching: bool,
    acquire:  f32,
    release:  f32,
}

impl Default for PinchHysteresis {
    fn default() -> Self {
        Self::new(PINCH_ACQUIRE, PINCH_RELEASE)
    }
}

impl PinchHysteresis {
    /// `acquire` must not exceed `release`; the two are swapped if they do.
    pub fn new(acquire: f32, release: f32) -> Self {
        let (acquire, release) = if acquire <= release { (acquire, release) } else { (release, acquire) };
        PinchHysteresis { pinching: false, acquire, release }
    }

    pub fn is_pinching(&self) -> bool {
        self.pinching
    }

    /// Feed one distance sample and return the stable state.
    /// NaN samples fail both comparisons and leave the state unchanged.
    pub fn update(&mut self, distance: f32) -> bool {
        if self.pinching {
            if distance > self.release {
                self.pinching = false;
            }
        } else if distance < self.acquire {
            self.pinching = true;
        }
        self.pinching
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureStabilizer
// ════════════════════════════════════════════════════════════════════════════

/// Turns raw per-frame detections into [`GestureFrame`]s.
#[derive(Debug, Clone, Default)]
pub struct GestureStabilizer {
    pinch: PinchHysteresis,
}

impl GestureStabilizer {
    pub fn new(pinch: PinchHysteresis) -> Self {
        GestureStabilizer { pinch }
    }

    /// Last stable pinch flag (survives frames without a hand).
    pub fn last_pinch_state(&self) -> bool {
        self.pinch.is_pinching()
    }

    pub fn process(&mut self, hand: Option<&HandLandmarks>) -> GestureFrame {
        let Some(hand) = hand else {
            return GestureFrame::inactive();
        };
        GestureFrame {
            is_active:    true,
            cursor:       hand.cursor(),
            is_pinching:  self.pinch.update(hand.pinch_distance()),
            finger_count: hand.finger_count(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    /// Open hand, all fingers curled, thumb tucked; pinch gap set explicitly.
    fn hand_with_gap(gap: f32) -> HandLandmarks {
        let mut points = [Vec2::new(0.5, 0.6); LANDMARK_COUNT];
        for (tip, knuckle) in HandLandmark::finger_pairs() {
            points[knuckle.index()] = Vec2::new(0.5, 0.5);
            points[tip.index()] = Vec2::new(0.5, 0.55);
        }
        points[HandLandmark::ThumbMcp.index()] = Vec2::new(0.5, 0.6);
        points[HandLandmark::ThumbTip.index()] = Vec2::new(0.5, 0.55);
        points[HandLandmark::IndexTip.index()] = Vec2::new(0.5, 0.55 + gap);
        HandLandmarks::new(points)
    }

    #[test]
    fn hysteresis_documented_sequence() {
        let mut h = PinchHysteresis::default();
        let states: Vec<bool> = [0.30, 0.20, 0.10, 0.20, 0.30]
            .iter()
            .map(|&d| h.update(d))
            .collect();
        assert_eq!(states, vec![false, false, true, true, false]);
    }

    #[test]
    fn hysteresis_changes_only_at_thresholds() {
        let mut h = PinchHysteresis::default();
        // Jitter between the thresholds never acquires.
        for d in [0.13, 0.24, 0.121, 0.249, 0.2] {
            assert!(!h.update(d));
        }
        assert!(h.update(0.119));
        // Jitter between the thresholds never releases.
        for d in [0.13, 0.24, 0.25, 0.2, 0.12] {
            assert!(h.update(d));
        }
        assert!(!h.update(0.251));
    }

    #[test]
    fn hysteresis_ignores_nan() {
        let mut h = PinchHysteresis::default();
        h.update(0.05);
        assert!(h.update(f32::NAN));
    }

    #[test]
    fn swapped_thresholds_are_normalised() {
        let mut h = PinchHysteresis::new(0.3, 0.1);
        assert!(!h.update(0.2));
        assert!(h.update(0.05));
    }

    #[test]
    fn missing_hand_keeps_pinch_state() {
        let mut s = GestureStabilizer::default();
        let f = s.process(Some(&hand_with_gap(0.05)));
        assert!(f.is_active && f.is_pinching);

        let gap = s.process(None);
        assert!(!gap.is_active);
        assert!(s.last_pinch_state());

        // Back in view mid-range: still pinching thanks to the retained state.
        let f = s.process(Some(&hand_with_gap(0.2)));
        assert!(f.is_pinching);
    }

    #[test]
    fn curled_hand_counts_zero() {
        assert_eq!(hand_with_gap(0.05).finger_count(), 0);
    }

    #[test]
    fn finger_count_counts_each_finger() {
        let mut hand = hand_with_gap(0.05);
        hand.set(HandLandmark::IndexTip, Vec2::new(0.5, 0.3));
        hand.set(HandLandmark::MiddleTip, Vec2::new(0.5, 0.3));
        assert_eq!(hand.finger_count(), 2);
        hand.set(HandLandmark::ThumbTip, Vec2::new(0.6, 0.55));
        assert_eq!(hand.finger_count(), 3);
    }

    #[test]
    fn cursor_is_mirrored() {
        let mut hand = hand_with_gap(0.05);
        hand.set(HandLandmark::MiddleMcp, Vec2::new(0.2, 0.7));
        let c = hand.cursor();
        assert!((c.x - 0.8).abs() < 1e-6);
        assert!((c.y - 0.7).abs() < 1e-6);
    }

    #[test]
    fn from_slice_rejects_short_input() {
        assert!(HandLandmarks::from_slice(&[Vec2::ZERO; 20]).is_none());
        assert!(HandLandmarks::from_slice(&[Vec2::ZERO; 21]).is_some());
    }
}
