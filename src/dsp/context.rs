//! Audio context: the sample clock every node schedules against.

/// Frames rendered per block. Matches the WebAudio render quantum.
pub const RENDER_QUANTUM: usize = 128;

/// Owns the sample rate and the running frame counter.
///
/// Nodes never advance the clock themselves; the host renders a block
/// starting at `current_time()` and then calls `advance`.
#[derive(Debug, Clone)]
pub struct AudioContext {
    sample_rate: f64,
    frames: u64,
}

impl AudioContext {
    pub fn new(sample_rate: f64) -> Self {
        AudioContext {
            sample_rate,
            frames: 0,
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Time in seconds of the first frame of the next block.
    pub fn current_time(&self) -> f64 {
        self.frames as f64 / self.sample_rate
    }

    /// Time in seconds of the frame `offset` samples into the next block.
    pub fn time_at(&self, offset: usize) -> f64 {
        (self.frames + offset as u64) as f64 / self.sample_rate
    }

    pub fn advance(&mut self, frames: usize) {
        self.frames += frames as u64;
    }
}
