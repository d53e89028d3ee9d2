//! Hand tracking from LeapMotion hardware or from keyboard/mouse simulation.
//!
//! A [`LandmarkSource`] produces raw 21-point hand landmarks.  It runs on its
//! own detection thread together with a [`GestureStabilizer`]; the thread
//! publishes each stabilised [`GestureFrame`] over a channel and the frame
//! loop keeps only the newest one.  Neither loop ever waits for the other.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use glam::Vec2;
use tracing::{debug, warn};

use holiday_field::hand::{HandLandmark, LANDMARK_COUNT};
use holiday_field::{GestureFrame, GestureStabilizer, HandLandmarks};

use crate::error::GestureError;

// ════════════════════════════════════════════════════════════════════════════
// Capture / LandmarkSource
// ════════════════════════════════════════════════════════════════════════════

/// Result of waiting for one camera frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Capture {
    Hand(HandLandmarks),
    /// A frame arrived but held no hand.
    NoHand,
    /// No new frame yet; the loop checks for shutdown and waits again.
    Idle,
}

/// Anything that can deliver hand landmarks frame by frame.
///
/// Sources are built on the detection thread itself, so device handles that
/// cannot cross threads are fine here.
pub trait LandmarkSource {
    /// Acquire the capture device.  Called once, on the detection thread.
    fn open(&mut self) -> Result<(), GestureError>;

    /// Wait (briefly) for the next frame.
    fn next_capture(&mut self) -> Result<Capture, GestureError>;

    /// Release the capture device.  Must be safe to call after a failed `open`.
    fn close(&mut self);
}

/// Message from the detection thread.
#[derive(Debug)]
pub enum GestureMessage {
    Frame(GestureFrame),
    /// Setup failed; the thread has exited and will not retry.
    Unavailable(GestureError),
}

// ════════════════════════════════════════════════════════════════════════════
// GestureHandle: owning end of the detection thread
// ════════════════════════════════════════════════════════════════════════════

/// Newest information drained from the detection thread.
#[derive(Debug, Default)]
pub struct GesturePoll {
    pub latest:  Option<GestureFrame>,
    pub failure: Option<GestureError>,
}

/// Dropping the handle stops the detection thread and waits for it to
/// release its device.
pub struct GestureHandle {
    rx:     Receiver<GestureMessage>,
    stop:   Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl GestureHandle {
    /// Drain everything queued and keep the newest frame.
    pub fn poll(&self) -> GesturePoll {
        let mut poll = GesturePoll::default();
        loop {
            match self.rx.try_recv() {
                Ok(GestureMessage::Frame(f)) => poll.latest = Some(f),
                Ok(GestureMessage::Unavailable(e)) => poll.failure = Some(e),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        poll
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(t) = self.thread.take() {
            if t.join().is_err() {
                warn!("gesture thread panicked");
            }
        }
    }
}

impl Drop for GestureHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Build a landmark source with `make` on a new detection thread and run it
/// there until the handle is dropped.
pub fn spawn_gesture_source<S, F>(make: F) -> GestureHandle
where
    S: LandmarkSource,
    F: FnOnce() -> S + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    let thread = thread::Builder::new()
        .name("gesture".into())
        .spawn(move || detection_loop(make(), tx, flag))
        .ok();
    if thread.is_none() {
        warn!("could not start the gesture thread");
    }
    GestureHandle { rx, stop, thread }
}

/// Releases the source however the loop exits.
struct DeviceGuard<S: LandmarkSource>(S);

impl<S: LandmarkSource> Drop for DeviceGuard<S> {
    fn drop(&mut self) {
        self.0.close();
    }
}

fn detection_loop<S: LandmarkSource>(source: S, tx: Sender<GestureMessage>, stop: Arc<AtomicBool>) {
    let mut device = DeviceGuard(source);
    if let Err(e) = device.0.open() {
        let _ = tx.send(GestureMessage::Unavailable(e));
        return;
    }

    let mut stabilizer = GestureStabilizer::default();
    while !stop.load(Ordering::Relaxed) {
        let frame = match device.0.next_capture() {
            Ok(Capture::Hand(hand)) => stabilizer.process(Some(&hand)),
            Ok(Capture::NoHand) => stabilizer.process(None),
            Ok(Capture::Idle) => continue,
            Err(e) => {
                debug!(error = %e, "gesture source ended");
                return;
            }
        };
        if tx.send(GestureMessage::Frame(frame)).is_err() {
            return;
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Synthetic hands
// ════════════════════════════════════════════════════════════════════════════

/// Build a plausible open hand whose middle-finger MCP lands on `cursor`
/// (already mirrored, as the stabiliser reports it) and whose thumb and
/// index tips are `pinch_gap` apart.  `fingers` of the five are extended.
pub fn synthetic_hand(cursor: Vec2, pinch_gap: f32, fingers: u8) -> HandLandmarks {
    let anchor = Vec2::new(1.0 - cursor.x, cursor.y);
    let mut points = [anchor; LANDMARK_COUNT];
    let mut hand_set = |lm: HandLandmark, offset: Vec2| points[lm.index()] = anchor + offset;

    hand_set(HandLandmark::Wrist, Vec2::new(0.0, 0.15));
    let columns = [
        (HandLandmark::IndexMcp, HandLandmark::IndexPip, HandLandmark::IndexDip, HandLandmark::IndexTip, -0.04),
        (HandLandmark::MiddleMcp, HandLandmark::MiddlePip, HandLandmark::MiddleDip, HandLandmark::MiddleTip, 0.0),
        (HandLandmark::RingMcp, HandLandmark::RingPip, HandLandmark::RingDip, HandLandmark::RingTip, 0.035),
        (HandLandmark::PinkyMcp, HandLandmark::PinkyPip, HandLandmark::PinkyDip, HandLandmark::PinkyTip, 0.065),
    ];
    for (n, (mcp, pip, dip, tip, dx)) in columns.into_iter().enumerate() {
        let extended = (n as u8) < fingers.min(4);
        hand_set(mcp, Vec2::new(dx, 0.0));
        hand_set(pip, Vec2::new(dx, -0.05));
        if extended {
            hand_set(dip, Vec2::new(dx, -0.08));
            hand_set(tip, Vec2::new(dx, -0.11));
        } else {
            hand_set(dip, Vec2::new(dx, -0.02));
            hand_set(tip, Vec2::new(dx, 0.01));
        }
    }

    // Thumb tip sits exactly `pinch_gap` below the index tip; an extended
    // thumb has its MCP swung out sideways.
    let thumb_tip = points[HandLandmark::IndexTip.index()] + Vec2::new(0.0, pinch_gap);
    let swing = if fingers >= 5 { 0.08 } else { 0.0 };
    points[HandLandmark::ThumbTip.index()] = thumb_tip;
    points[HandLandmark::ThumbIp.index()] = thumb_tip + Vec2::new(swing * 0.5, 0.025);
    points[HandLandmark::ThumbMcp.index()] = thumb_tip + Vec2::new(swing, 0.05);
    points[HandLandmark::ThumbCmc.index()] = thumb_tip + Vec2::new(swing, 0.09);

    HandLandmarks::new(points)
}

// ════════════════════════════════════════════════════════════════════════════
// SimLandmarkSource: keyboard/mouse simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw simulation input sent by the visualizer window every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimInput {
    /// Hand "in view" (H held).
    pub present: bool,
    /// Pinch requested (P held).
    pub pinch:   bool,
    /// Mouse position, normalised 0–1.
    pub cursor:  Vec2,
}

/// Pinch gap an open simulated hand relaxes to.
pub const SIM_OPEN_GAP: f32 = 0.35;
/// Pinch gap a closed simulated hand tightens to.
pub const SIM_CLOSED_GAP: f32 = 0.04;
/// Gap change per simulated frame, so the signal sweeps through the
/// hysteresis band instead of jumping over it.
pub const SIM_GAP_STEP: f32 = 0.03;

/// Landmark source synthesised from [`SimInput`].  The gap between thumb and
/// index eases toward open/closed so both hysteresis thresholds get crossed
/// gradually, like a real hand.
pub struct SimLandmarkSource {
    rx:  Receiver<SimInput>,
    gap: f32,
}

impl SimLandmarkSource {
    pub fn new(rx: Receiver<SimInput>) -> Self {
        SimLandmarkSource { rx, gap: SIM_OPEN_GAP }
    }

    pub fn gap(&self) -> f32 {
        self.gap
    }

    fn step(&mut self, input: SimInput) -> Capture {
        if !input.present {
            return Capture::NoHand;
        }
        let target = if input.pinch { SIM_CLOSED_GAP } else { SIM_OPEN_GAP };
        let delta = (target - self.gap).clamp(-SIM_GAP_STEP, SIM_GAP_STEP);
        self.gap += delta;
        let fingers = if self.gap > 0.2 { 5 } else { 1 };
        Capture::Hand(synthetic_hand(input.cursor, self.gap, fingers))
    }
}

impl LandmarkSource for SimLandmarkSource {
    fn open(&mut self) -> Result<(), GestureError> {
        Ok(())
    }

    fn next_capture(&mut self) -> Result<Capture, GestureError> {
        match self.rx.recv_timeout(Duration::from_millis(50)) {
            Ok(input) => Ok(self.step(input)),
            Err(RecvTimeoutError::Timeout) => Ok(Capture::Idle),
            Err(RecvTimeoutError::Disconnected) => Err(GestureError::Disconnected),
        }
    }

    fn close(&mut self) {}
}

// ════════════════════════════════════════════════════════════════════════════
// LeapLandmarkSource: real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Landmark source backed by a LeapMotion controller.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
///
/// LeapMotion reports joints in millimetres above the device.  They are
/// projected onto a virtual camera image looking down at the hand from the
/// user's side: x across the interaction box, y inverted height.  The first
/// tracked hand is used.
#[cfg(feature = "leap")]
pub struct LeapLandmarkSource {
    connection: Option<leaprs::Connection>,
}

#[cfg(feature = "leap")]
impl LeapLandmarkSource {
    /// Half-width of the tracked box (mm).
    const HALF_WIDTH: f32 = 200.0;
    const FLOOR:      f32 = 80.0;
    const CEILING:    f32 = 480.0;

    pub fn new() -> Self {
        LeapLandmarkSource { connection: None }
    }

    fn project(x: f32, y: f32) -> Vec2 {
        let u = (x + Self::HALF_WIDTH) / (2.0 * Self::HALF_WIDTH);
        let v = 1.0 - (y - Self::FLOOR) / (Self::CEILING - Self::FLOOR);
        Vec2::new(u.clamp(0.0, 1.0), v.clamp(0.0, 1.0))
    }
}

#[cfg(feature = "leap")]
impl Default for LeapLandmarkSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "leap")]
impl LandmarkSource for LeapLandmarkSource {
    fn open(&mut self) -> Result<(), GestureError> {
        use leaprs::{Connection, ConnectionConfig};
        let mut connection = Connection::create(ConnectionConfig::default())
            .map_err(|e| GestureError::DeviceUnavailable(format!("{e:?}")))?;
        connection
            .open()
            .map_err(|e| GestureError::DeviceUnavailable(format!("{e:?}")))?;
        self.connection = Some(connection);
        Ok(())
    }

    fn next_capture(&mut self) -> Result<Capture, GestureError> {
        use leaprs::EventRef;
        let connection = self.connection.as_mut().ok_or(GestureError::Disconnected)?;
        let msg = match connection.poll(100) {
            Ok(m) => m,
            Err(_) => return Ok(Capture::Idle),
        };
        let EventRef::Tracking(frame) = msg.event() else {
            return Ok(Capture::Idle);
        };
        let hands = frame.hands();
        let Some(hand) = hands.first() else {
            return Ok(Capture::NoHand);
        };
        let palm = hand.palm();
        let [px, py, _] = palm.position().array();
        let mut points = Vec::with_capacity(LANDMARK_COUNT);
        points.push(Self::project(px, py));
        for digit in hand.digits() {
            let (proximal, intermediate, distal) = (digit.proximal(), digit.intermediate(), digit.distal());
            for [x, y, _] in [
                proximal.prev_joint().array(),
                intermediate.prev_joint().array(),
                distal.prev_joint().array(),
                distal.next_joint().array(),
            ] {
                points.push(Self::project(x, y));
            }
        }
        Ok(HandLandmarks::from_slice(&points).map_or(Capture::NoHand, Capture::Hand))
    }

    fn close(&mut self) {
        self.connection = None;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
