/// The number of frames after which the frame counter wraps back to 1.
///
/// This is 11!, which is divisible by every integer from 1 through 12, so
/// periodic effects can be driven by `count % period` for any of those
/// periods (and their products up to 11!) without a visible seam on wrap.
pub const FRAME_PERIOD: u32 = 39_916_800;

/// A snapshot of the frame counter, handed to graphics while a frame is
/// drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    /// The frame number, in `1..=FRAME_PERIOD`. Zero before the first frame.
    pub count: u32,
    /// `count` as a float, for graphics that interpolate.
    pub count_f: f64,
}

impl Frame {
    /// Where this frame falls within a repeating cycle of `period` frames, in
    /// `0.0..1.0`.
    ///
    /// ## Panics
    ///
    /// Panics if `period` is zero.
    #[must_use]
    pub fn phase(&self, period: u32) -> f64 {
        assert!(period > 0, "period must be non-zero");
        let period = f64::from(period);
        (self.count_f % period) / period
    }

    /// Returns true every `period` frames.
    #[must_use]
    pub fn every(&self, period: u32) -> bool {
        period != 0 && self.count % period == 0
    }
}

/// Counts frames, wrapping at [`FRAME_PERIOD`].
#[derive(Clone, Debug)]
pub struct FrameCounter {
    count: u32,
    count_f: f64,
}

impl Default for FrameCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCounter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            count: 0,
            count_f: 0.0,
        }
    }

    /// Starts counting as though `count` frames had already elapsed. Values
    /// past the period are reduced into it.
    #[must_use]
    pub fn starting_at(count: u32) -> Self {
        let count = match count {
            0 => 0,
            n => (n - 1) % FRAME_PERIOD + 1,
        };

        Self {
            count,
            count_f: f64::from(count),
        }
    }

    /// Moves to the next frame and returns it.
    pub fn advance(&mut self) -> Frame {
        self.count = if self.count >= FRAME_PERIOD {
            1
        } else {
            self.count + 1
        };
        self.count_f = f64::from(self.count);
        self.current()
    }

    #[must_use]
    pub fn current(&self) -> Frame {
        Frame {
            count: self.count,
            count_f: self.count_f,
        }
    }
}
