//! Mixer: the summing bus graphs are connected into.

/// A summing bus that accumulates one block of audio from many graphs.
///
/// Unlike a master stage there is no gain or clipping here: concurrently
/// playing graphs superpose exactly, and only the WAV encoder clamps.
#[derive(Debug, Clone, Default)]
pub struct Mixer {
    buffer: Vec<f64>,
}

impl Mixer {
    pub fn new() -> Self {
        Mixer { buffer: Vec::new() }
    }

    /// Prepare a buffer of `num_samples` filled with zeros.
    pub fn clear(&mut self, num_samples: usize) {
        self.buffer.clear();
        self.buffer.resize(num_samples, 0.0);
    }

    /// Add a sample at the given index.
    pub fn add(&mut self, index: usize, sample: f64) {
        if let Some(slot) = self.buffer.get_mut(index) {
            *slot += sample;
        }
    }

    /// The summed block.
    pub fn output(&self) -> &[f64] {
        &self.buffer
    }
}
