use std::time::{Duration, Instant};

/// Monotonic time source in seconds.
pub trait FrameClock {
    fn now(&mut self) -> f64;
}

/// Wall clock, optionally paced to a target frame rate.
#[derive(Debug)]
pub struct SystemClock {
    start: Instant,
    pacer: Option<(Instant, Duration)>,
}

impl SystemClock {
    pub fn new() -> Self { Self { start: Instant::now(), pacer: None } }

    /// Sleeps inside `now` until a full frame at `hz` has elapsed since the last call.
    pub fn paced(hz: f32) -> Self {
        let pacer = (hz > 0.0 && hz.is_finite()).then(|| (Instant::now(), Duration::from_secs_f32(1.0 / hz)));
        Self { start: Instant::now(), pacer }
    }
}

impl Default for SystemClock {
    fn default() -> Self { Self::new() }
}

impl FrameClock for SystemClock {
    fn now(&mut self) -> f64 {
        if let Some((ref mut last, frame)) = self.pacer {
            let now = Instant::now();
            let next = *last + frame;
            if now < next { std::thread::sleep(next - now); }
            *last = Instant::now();
        }
        self.start.elapsed().as_secs_f64()
    }
}

/// Advances by a fixed amount on every read. Headless runs and tests.
#[derive(Clone, Debug)]
pub struct SimulatedClock {
    t: f64,
    frame: f64,
}

impl SimulatedClock {
    pub fn new(frame_seconds: f64) -> Self { Self { t: 0.0, frame: frame_seconds.max(0.0) } }
}

impl FrameClock for SimulatedClock {
    fn now(&mut self) -> f64 {
        let t = self.t;
        self.t += self.frame;
        t
    }
}

/// Time only moves when told to.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    t: f64,
}

impl ManualClock {
    pub fn new() -> Self { Self::default() }
    pub fn advance(&mut self, seconds: f64) { self.t += seconds; }
    /// Any value is accepted, including one in the past.
    pub fn set(&mut self, t: f64) { self.t = t; }
}

impl FrameClock for ManualClock {
    fn now(&mut self) -> f64 { self.t }
}
