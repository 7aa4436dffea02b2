use std::time::Instant;

/// Wall-clock frame timing
pub struct FrameClock {
    start: Instant,
    last: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self { start: now, last: now }
    }

    /// Seconds since the previous tick.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = (now - self.last).as_secs_f32();
        self.last = now;
        dt
    }

    pub fn elapsed(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Frames-per-second averaged over a fixed interval
pub struct FpsCounter {
    interval: f32,
    frames: u32,
    elapsed: f32,
    fps: Option<f32>,
}

impl FpsCounter {
    pub fn new(interval: f32) -> Self {
        Self { interval, frames: 0, elapsed: 0.0, fps: None }
    }

    /// Counts one frame; returns the new rate when the interval has passed.
    pub fn record(&mut self, dt: f32) -> Option<f32> {
        self.frames += 1;
        self.elapsed += dt;
        if self.elapsed > self.interval {
            let fps = self.frames as f32 / self.elapsed;
            self.fps = Some(fps);
            self.frames = 0;
            self.elapsed = 0.0;
            return Some(fps);
        }
        None
    }

    pub fn fps(&self) -> Option<f32> {
        self.fps
    }

    /// "%.2f fps" text; "?? fps" until the first interval completes.
    pub fn label(&self) -> String {
        match self.fps {
            Some(fps) => format!("{fps:.2} fps"),
            None => "?? fps".to_string(),
        }
    }
}
