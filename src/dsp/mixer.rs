//! Mixer: the destination bus voices render into.

/// A summing bus that accumulates voices for one block, then writes the
/// block out with master gain and soft clipping.
#[derive(Debug, Clone)]
pub struct Mixer {
    pub master_gain: f64,
    buffer: Vec<f64>,
}

impl Mixer {
    pub fn new(master_gain: f64) -> Self {
        Mixer {
            master_gain,
            buffer: Vec::new(),
        }
    }

    /// Prepare a zeroed bus of `num_samples` and hand it out for summing.
    pub fn begin_block(&mut self, num_samples: usize) -> &mut [f64] {
        self.buffer.clear();
        self.buffer.resize(num_samples, 0.0);
        &mut self.buffer
    }

    /// Write the mixed block into `out`, with master gain and soft clipping
    /// applied. `out` and the bus are matched up to the shorter length.
    pub fn write_output(&self, out: &mut [f32]) {
        for (o, &s) in out.iter_mut().zip(&self.buffer) {
            *o = soft_clip(s * self.master_gain) as f32;
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// Soft clipper using tanh to prevent harsh digital clipping.
fn soft_clip(x: f64) -> f64 {
    x.tanh()
}
