//! Visualizer: an oscilloscope trace of the live output.
//!
//! The [`Analyser`] is a tap on the live destination that keeps the most
//! recent window of samples. A [`Visualizer`] pulls byte frames from it and
//! turns them into polylines; [`Visualizer::frames`] is an endless source the
//! host drains once per animation frame.

use std::cell::RefCell;
use std::rc::Rc;

/// Window length of the analyser, in samples.
pub const FFT_SIZE: usize = 2048;

/// Ring buffer of the most recent [`FFT_SIZE`] output samples.
#[derive(Debug, Clone)]
pub struct Analyser {
    ring: Vec<f32>,
    /// Next write position; also the oldest sample once the ring is full.
    head: usize,
}

impl Default for Analyser {
    fn default() -> Self {
        Analyser {
            ring: vec![0.0; FFT_SIZE],
            head: 0,
        }
    }
}

impl Analyser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes a time-domain frame holds.
    pub fn frequency_bin_count(&self) -> usize {
        FFT_SIZE / 2
    }

    pub fn push(&mut self, sample: f32) {
        self.ring[self.head] = sample;
        self.head = (self.head + 1) % FFT_SIZE;
    }

    /// Fill `out` with byte-scaled samples (128 = silence) from the start of
    /// the current window, oldest first. Extra output bytes are left as-is.
    pub fn get_byte_time_domain_data(&self, out: &mut [u8]) {
        for (i, slot) in out.iter_mut().take(FFT_SIZE).enumerate() {
            let sample = self.ring[(self.head + i) % FFT_SIZE];
            *slot = sample_to_byte(sample);
        }
    }
}

fn sample_to_byte(sample: f32) -> u8 {
    let scaled = (128.0 * (1.0 + sample as f64)).floor();
    if scaled.is_nan() {
        128
    } else {
        scaled.clamp(0.0, 255.0) as u8
    }
}

/// The analyser shared between the live context and visualizers.
pub type SharedAnalyser = Rc<RefCell<Analyser>>;

// ── Scope ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// One redraw of the scope: clear to background, stroke `points` in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: f32,
    pub height: f32,
    pub points: Vec<Point>,
}

/// Trace byte samples as a vertical oscilloscope: the sample value moves the
/// line horizontally (128 lands at mid-width) and successive samples step
/// down the surface.
pub fn trace(data: &[u8], width: f32, height: f32) -> Vec<Point> {
    if data.is_empty() {
        return Vec::new();
    }
    let slice_height = height / data.len() as f32;
    data.iter()
        .enumerate()
        .map(|(i, &b)| Point {
            x: b as f32 / 128.0 * (width / 2.0),
            y: i as f32 * slice_height,
        })
        .collect()
}

/// Pulls analyser frames and traces them onto a surface of a given size.
pub struct Visualizer {
    analyser: SharedAnalyser,
    width: f32,
    height: f32,
    data: Vec<u8>,
}

impl Visualizer {
    pub fn new(analyser: SharedAnalyser, width: f32, height: f32) -> Self {
        let bins = analyser.borrow().frequency_bin_count();
        Visualizer {
            analyser,
            width,
            height,
            data: vec![128; bins],
        }
    }

    /// The host surface follows its container; call when it changes.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    /// Read the latest analyser state and trace it.
    pub fn next_frame(&mut self) -> Frame {
        self.analyser
            .borrow()
            .get_byte_time_domain_data(&mut self.data);
        Frame {
            width: self.width,
            height: self.height,
            points: trace(&self.data, self.width, self.height),
        }
    }

    /// An endless frame source. Each item reflects only the most recent
    /// analyser state, so a slow consumer simply skips audio.
    pub fn frames(&mut self) -> Frames<'_> {
        Frames { visualizer: self }
    }
}

/// Iterator returned by [`Visualizer::frames`]. Never yields `None`.
pub struct Frames<'a> {
    visualizer: &'a mut Visualizer,
}

impl Iterator for Frames<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        Some(self.visualizer.next_frame())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}
