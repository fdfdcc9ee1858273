/// Rolling frames-per-second estimate over a window of roughly three seconds.
///
/// Once the window is full, each tick shrinks the accumulated span by one average frame instead
/// of counting another frame, so the estimate follows recent frame times.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FpsCounter {
    window: f32,
    span: f32,
    previous: Option<f32>,
    frames: u32,
}

impl FpsCounter {
    pub const DEFAULT_WINDOW: f32 = 3.0;

    pub fn new() -> Self {
        Self::with_window(Self::DEFAULT_WINDOW)
    }

    pub fn with_window(window: f32) -> Self {
        Self {
            window,
            span: 0.0,
            previous: None,
            frames: 0,
        }
    }

    /// Records a frame at `now` seconds and returns the current estimate.
    ///
    /// The first tick returns 0.
    ///
    /// ```
    /// use laser_anchor::FpsCounter;
    /// let mut fps = FpsCounter::new();
    /// assert_eq!(fps.tick(10.0), 0.0);
    /// assert_eq!(fps.tick(10.5), 2.0);
    /// assert_eq!(fps.tick(11.0), 2.0);
    /// ```
    pub fn tick(&mut self, now: f32) -> f32 {
        let previous = match self.previous.replace(now) {
            Some(previous) => previous,
            None => return 0.0,
        };
        if self.span > self.window && self.frames > 0 {
            self.span *= (self.frames as f32 - 1.0) / self.frames as f32;
        } else {
            self.frames += 1;
        }
        self.span += now - previous;
        if self.span > 0.0 {
            self.frames as f32 / self.span
        } else {
            0.0
        }
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}
