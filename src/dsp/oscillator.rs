//! Anti-aliased oscillators using PolyBLEP.

use std::f64::consts::PI;

use serde::Serialize;

/// Supported waveform shapes, in slider index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Sawtooth,
        Waveform::Triangle,
    ];

    /// Map a slider index (0–3) to a waveform. Non-integral values round to
    /// the nearest index; anything outside the range yields `None`.
    pub fn from_index(index: f64) -> Option<Waveform> {
        if !index.is_finite() {
            return None;
        }
        let rounded = index.round();
        if !(0.0..=3.0).contains(&rounded) {
            return None;
        }
        Some(Self::ALL[rounded as usize])
    }
}

/// A band-limited oscillator with anti-aliasing (PolyBLEP).
///
/// `frequency` and `detune` are read on every sample, so callers drive them
/// from automation between calls to [`Oscillator::next_sample`].
#[derive(Debug, Clone)]
pub struct Oscillator {
    pub waveform: Waveform,
    pub frequency: f64,
    pub detune: f64, // in cents
    phase: f64,
    sample_rate: f64,
}

impl Oscillator {
    pub fn new(waveform: Waveform, sample_rate: f64) -> Self {
        Oscillator {
            waveform,
            frequency: 440.0,
            detune: 0.0,
            phase: 0.0,
            sample_rate,
        }
    }

    /// Effective frequency accounting for detune (in cents), limited to
    /// ±Nyquist.
    fn effective_freq(&self) -> f64 {
        let nyquist = self.sample_rate / 2.0;
        let freq = self.frequency * (2.0_f64).powf(self.detune / 1200.0);
        if freq.is_nan() {
            0.0
        } else {
            freq.clamp(-nyquist, nyquist)
        }
    }

    /// Phase increment per sample. Negative when the frequency is negative.
    fn phase_inc(&self) -> f64 {
        self.effective_freq() / self.sample_rate
    }

    /// Generate the next sample.
    pub fn next_sample(&mut self) -> f64 {
        let inc = self.phase_inc();
        let dt = inc.abs();
        let sample = match self.waveform {
            Waveform::Sine => self.sine(),
            Waveform::Sawtooth => self.sawtooth(dt),
            Waveform::Square => self.square(dt),
            Waveform::Triangle => self.triangle(),
        };

        self.phase = (self.phase + inc).rem_euclid(1.0);
        // rem_euclid rounds tiny negatives up to exactly 1.0
        if self.phase >= 1.0 {
            self.phase = 0.0;
        }

        sample
    }

    fn sine(&self) -> f64 {
        (2.0 * PI * self.phase).sin()
    }

    /// Naive sawtooth: rises from -1 to +1, then drops.
    /// PolyBLEP corrects the discontinuity at the wrap.
    fn sawtooth(&self, dt: f64) -> f64 {
        let naive = 2.0 * self.phase - 1.0;
        naive - poly_blep(self.phase, dt)
    }

    /// Square wave with PolyBLEP at both edges.
    fn square(&self, dt: f64) -> f64 {
        let mut value = if self.phase < 0.5 { 1.0 } else { -1.0 };
        value += poly_blep(self.phase, dt);
        value -= poly_blep((self.phase + 0.5) % 1.0, dt);
        value
    }

    /// Piecewise linear: -1→+1 over the first half cycle, +1→-1 over the second.
    fn triangle(&self) -> f64 {
        if self.phase < 0.5 {
            4.0 * self.phase - 1.0
        } else {
            3.0 - 4.0 * self.phase
        }
    }
}

/// PolyBLEP (Polynomial Band-Limited Step) anti-aliasing correction.
///
/// `t` is the phase [0, 1), `dt` is the phase increment per sample.
/// Returns a correction value to subtract from the naive waveform
/// at discontinuities.
fn poly_blep(t: f64, dt: f64) -> f64 {
    if dt <= 0.0 {
        0.0
    } else if t < dt {
        // Just after the discontinuity
        let t = t / dt;
        2.0 * t - t * t - 1.0
    } else if t > 1.0 - dt {
        // Just before the next discontinuity
        let t = (t - 1.0) / dt;
        t * t + 2.0 * t + 1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waveform_from_index() {
        assert_eq!(Waveform::from_index(0.0), Some(Waveform::Sine));
        assert_eq!(Waveform::from_index(1.0), Some(Waveform::Square));
        assert_eq!(Waveform::from_index(2.0), Some(Waveform::Sawtooth));
        assert_eq!(Waveform::from_index(3.0), Some(Waveform::Triangle));
        assert_eq!(Waveform::from_index(2.6), Some(Waveform::Triangle));
        assert_eq!(Waveform::from_index(4.0), None);
        assert_eq!(Waveform::from_index(-1.0), None);
        assert_eq!(Waveform::from_index(f64::NAN), None);
    }

    #[test]
    fn sine_zero_at_start() {
        let mut osc = Oscillator::new(Waveform::Sine, 44100.0);
        osc.frequency = 440.0;
        let sample = osc.next_sample();
        assert!(sample.abs() < 1e-10, "Sine should start near 0, got {sample}");
    }

    #[test]
    fn sine_range() {
        let mut osc = Oscillator::new(Waveform::Sine, 44100.0);
        osc.frequency = 440.0;
        for _ in 0..44100 {
            let s = osc.next_sample();
            assert!((-1.0..=1.0).contains(&s), "Sine out of range: {s}");
        }
    }

    #[test]
    fn sawtooth_and_square_range() {
        for waveform in [Waveform::Sawtooth, Waveform::Square] {
            let mut osc = Oscillator::new(waveform, 44100.0);
            osc.frequency = 440.0;
            for _ in 0..44100 {
                let s = osc.next_sample();
                assert!((-1.5..=1.5).contains(&s), "{waveform:?} out of range: {s}");
            }
        }
    }

    #[test]
    fn triangle_range() {
        let mut osc = Oscillator::new(Waveform::Triangle, 44100.0);
        osc.frequency = 440.0;
        for _ in 0..44100 {
            let s = osc.next_sample();
            assert!((-1.0..=1.0).contains(&s), "Triangle out of range: {s}");
        }
    }

    #[test]
    fn detune_shifts_frequency() {
        let mut osc1 = Oscillator::new(Waveform::Sine, 44100.0);
        osc1.frequency = 440.0;
        osc1.detune = 0.0;

        let mut osc2 = Oscillator::new(Waveform::Sine, 44100.0);
        osc2.frequency = 440.0;
        osc2.detune = 1200.0; // +1 octave

        let inc1 = osc1.phase_inc();
        let inc2 = osc2.phase_inc();
        assert!(
            (inc2 - 2.0 * inc1).abs() < 1e-10,
            "1200 cents detune should double frequency"
        );
    }

    #[test]
    fn negative_frequency_runs_backwards() {
        let mut osc = Oscillator::new(Waveform::Sawtooth, 44100.0);
        osc.frequency = -1000.0;
        for _ in 0..44100 {
            let s = osc.next_sample();
            assert!(s.is_finite());
            assert!((0.0..1.0).contains(&osc.phase), "phase escaped: {}", osc.phase);
        }
    }

    #[test]
    fn frequency_limited_to_nyquist() {
        let mut osc = Oscillator::new(Waveform::Sine, 44100.0);
        osc.frequency = 1.0e9;
        assert_eq!(osc.effective_freq(), 22050.0);
        osc.frequency = f64::NAN;
        assert_eq!(osc.effective_freq(), 0.0);
    }
}
