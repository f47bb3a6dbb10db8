//! Synthesis graph builder: turns a parameter snapshot into a tree of
//! oscillators, gain envelopes and modulation routing.
//!
//! The graph is a plain description: every node carries its own envelopes
//! and start/stop times against an absolute clock. Renderers (live or
//! offline) instantiate it and pull samples; the builder itself allocates no
//! audio state.
//!
//! Routing is fixed:
//!
//! ```text
//! modulator ──► mod_depth ──► voice[i].detune (cents)
//! voice[0..n] ──► master ──► output
//! ```

use serde::Serialize;

use crate::error::GraphError;
use crate::params::ParameterSnapshot;

use super::envelope::Envelope;
use super::oscillator::Waveform;

/// Floor of the master gain decay. Exponential ramps cannot reach zero.
pub const MASTER_FLOOR: f64 = 0.0001;
/// Floor of the modulation depth decay.
pub const MOD_FLOOR: f64 = 0.001;
/// Every oscillator keeps running this long after the master decay ends.
pub const STOP_TAIL_SECONDS: f64 = 1.0;
pub const MAX_VOICES: usize = 8;

// ── Derived parameters ──────────────────────────────────────

/// Physical quantities derived from the normalized slider values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedParams {
    /// Centre frequency, 20–2020 Hz.
    pub pitch_hz: f64,
    /// Master decay time, 0.01–3.01 s. Never zero.
    pub decay_seconds: f64,
    /// Signed pitch sweep amount, ±2000 Hz.
    pub pitch_env_hz: f64,
    /// Spacing between adjacent voices in Hz.
    pub detune_hz: f64,
    pub mod_rate_hz: f64,
    /// Peak modulation depth, applied to the voices' detune input in cents.
    pub pitch_mod_depth: f64,
}

impl DerivedParams {
    pub fn from_snapshot(snapshot: &ParameterSnapshot) -> Self {
        DerivedParams {
            pitch_hz: snapshot.pitch * 2000.0 + 20.0,
            decay_seconds: decay_seconds(snapshot),
            pitch_env_hz: (snapshot.pitch_env - 0.5) * 4000.0,
            detune_hz: snapshot.detune * 100.0,
            mod_rate_hz: snapshot.mod_rate * 50.0,
            pitch_mod_depth: snapshot.pitch_mod * 1000.0,
        }
    }
}

/// Master decay time for a snapshot. Offline renders size their buffer from it.
pub fn decay_seconds(snapshot: &ParameterSnapshot) -> f64 {
    snapshot.decay * 3.0 + 0.01
}

// ── Nodes ───────────────────────────────────────────────────

/// A gain stage whose gain follows an envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GainNode {
    pub gain: Envelope,
}

/// A scheduled oscillator. Silent outside `[start, stop)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OscillatorNode {
    pub waveform: Waveform,
    pub frequency: Envelope,
    pub start: f64,
    pub stop: f64,
}

impl OscillatorNode {
    pub fn is_playing_at(&self, t: f64) -> bool {
        t >= self.start && t < self.stop
    }
}

/// One playback instance. Write-once: built, handed to a renderer, dropped
/// once `stop_time` has passed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthGraph {
    pub start_time: f64,
    /// Time at which every oscillator in the graph has stopped.
    pub stop_time: f64,
    /// Output node: amplitude envelope over the summed voices.
    pub master: GainNode,
    pub modulator: OscillatorNode,
    /// Modulation depth envelope between the modulator and the voices.
    pub mod_depth: GainNode,
    pub voices: Vec<OscillatorNode>,
}

impl SynthGraph {
    /// The node renderers connect downstream.
    pub fn output(&self) -> &GainNode {
        &self.master
    }

    /// Total node count: master, modulator, modulation gain and voices.
    pub fn node_count(&self) -> usize {
        3 + self.voices.len()
    }
}

// ── Builder ─────────────────────────────────────────────────

/// Symmetric detune offsets for `voices` voices spaced `detune_hz` apart.
/// The offsets always sum to zero.
pub fn detune_offsets(voices: usize, detune_hz: f64) -> Vec<f64> {
    let center = (voices as f64 - 1.0) / 2.0;
    (0..voices).map(|i| (i as f64 - center) * detune_hz).collect()
}

/// Resolve the raw `voices` value to a usable count.
///
/// Rounds to the nearest integer, rejects anything below one and clamps
/// anything above [`MAX_VOICES`].
pub fn voice_count(raw: f64) -> Result<usize, GraphError> {
    let rounded = raw.round();
    if !(rounded >= 1.0) {
        return Err(GraphError::InvalidVoiceCount { voices: raw });
    }
    if rounded > MAX_VOICES as f64 {
        log::warn!("voice count {raw} exceeds {MAX_VOICES}, clamping");
        return Ok(MAX_VOICES);
    }
    Ok(rounded as usize)
}

fn waveform_or_sine(index: f64, param: &str) -> Waveform {
    Waveform::from_index(index).unwrap_or_else(|| {
        log::warn!("{param} index {index} is not a waveform, using sine");
        Waveform::Sine
    })
}

/// Build the synthesis graph for `snapshot`, scheduled to begin at
/// `start_time` on the renderer's clock.
pub fn build(snapshot: &ParameterSnapshot, start_time: f64) -> Result<SynthGraph, GraphError> {
    let voices = voice_count(snapshot.voices)?;
    let p = DerivedParams::from_snapshot(snapshot);
    let stop_time = start_time + p.decay_seconds + STOP_TAIL_SECONDS;

    // 1. Master amplitude envelope.
    let mut master = GainNode {
        gain: Envelope::new(1.0),
    };
    master
        .gain
        .set_value_at(snapshot.volume, start_time)
        .exponential_ramp_to(MASTER_FLOOR, start_time + p.decay_seconds);

    // 2. Modulation source and depth.
    let modulator = OscillatorNode {
        waveform: waveform_or_sine(snapshot.mod_shape, "modShape"),
        frequency: Envelope::new(p.mod_rate_hz),
        start: start_time,
        stop: stop_time,
    };
    let mut mod_depth = GainNode {
        gain: Envelope::new(1.0),
    };
    let mod_peak = start_time + snapshot.mod_attack;
    mod_depth
        .gain
        .set_value_at(0.0, start_time)
        .linear_ramp_to(p.pitch_mod_depth, mod_peak)
        .exponential_ramp_to(MOD_FLOOR, mod_peak + snapshot.mod_decay);

    // 3. Detuned voices.
    let waveform = waveform_or_sine(snapshot.mode, "mode");
    let sweep_peak = start_time + snapshot.pitch_attack;
    let voices = detune_offsets(voices, p.detune_hz)
        .into_iter()
        .map(|offset| {
            let base = p.pitch_hz + offset;
            let mut frequency = Envelope::new(base);
            frequency.set_value_at(base, start_time);
            if p.pitch_env_hz != 0.0 {
                frequency
                    .linear_ramp_to(base + p.pitch_env_hz, sweep_peak)
                    .exponential_ramp_to(base, sweep_peak + snapshot.pitch_decay);
            }
            OscillatorNode {
                waveform,
                frequency,
                start: start_time,
                stop: stop_time,
            }
        })
        .collect::<Vec<_>>();

    log::debug!(
        "built graph at t={start_time:.3}: {} voice(s) at {:.1} Hz, decay {:.2}s",
        voices.len(),
        p.pitch_hz,
        p.decay_seconds
    );

    Ok(SynthGraph {
        start_time,
        stop_time,
        master,
        modulator,
        mod_depth,
        voices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::envelope::Curve;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn punchy() -> ParameterSnapshot {
        ParameterSnapshot {
            volume: 1.0,
            mode: 0.0,
            pitch: 0.0,
            decay: 0.0,
            voices: 1.0,
            detune: 0.0,
            pitch_env: 0.5,
            pitch_attack: 0.0,
            pitch_decay: 0.1,
            pitch_mod: 0.0,
            mod_shape: 0.0,
            mod_rate: 0.1,
            mod_attack: 0.0,
            mod_decay: 0.5,
        }
    }

    #[test]
    fn derived_params_ranges() {
        let mut s = ParameterSnapshot::default();
        s.pitch = 0.0;
        s.decay = 0.0;
        s.pitch_env = 0.0;
        let low = DerivedParams::from_snapshot(&s);
        assert_eq!(low.pitch_hz, 20.0);
        assert_eq!(low.decay_seconds, 0.01);
        assert_eq!(low.pitch_env_hz, -2000.0);

        s.pitch = 1.0;
        s.decay = 1.0;
        s.pitch_env = 1.0;
        s.detune = 1.0;
        s.mod_rate = 1.0;
        s.pitch_mod = 1.0;
        let high = DerivedParams::from_snapshot(&s);
        assert_eq!(high.pitch_hz, 2020.0);
        assert!(close(high.decay_seconds, 3.01));
        assert_eq!(high.pitch_env_hz, 2000.0);
        assert_eq!(high.detune_hz, 100.0);
        assert_eq!(high.mod_rate_hz, 50.0);
        assert_eq!(high.pitch_mod_depth, 1000.0);
    }

    #[test]
    fn master_gain_decays_to_floor() {
        let graph = build(&punchy(), 0.0).unwrap();
        let gain = &graph.output().gain;
        assert_eq!(gain.value_at(0.0), 1.0);
        assert!(close(gain.value_at(0.005), 0.01), "midpoint should be geometric");
        assert!(close(gain.value_at(0.01), MASTER_FLOOR));
        assert!(close(gain.value_at(0.5), MASTER_FLOOR));
        assert_eq!(gain.breakpoints()[1].curve, Curve::Exponential);
        assert_eq!(gain.end_time(), Some(0.01));
    }

    #[test]
    fn detune_offsets_are_symmetric() {
        for voices in 1..=8 {
            let offsets = detune_offsets(voices, 37.0);
            assert_eq!(offsets.len(), voices);
            let sum: f64 = offsets.iter().sum();
            assert!(sum.abs() < 1e-9, "{voices} voices sum to {sum}");
            for i in 0..voices {
                assert!(close(offsets[i], -offsets[voices - 1 - i]));
            }
        }
        assert_eq!(detune_offsets(1, 50.0), vec![0.0]);
        assert_eq!(detune_offsets(2, 10.0), vec![-5.0, 5.0]);
        assert_eq!(detune_offsets(3, 10.0), vec![-10.0, 0.0, 10.0]);
    }

    #[test]
    fn flat_pitch_env_schedules_no_sweep() {
        let mut s = punchy();
        s.voices = 4.0;
        s.detune = 0.2;
        let graph = build(&s, 0.0).unwrap();
        for voice in &graph.voices {
            assert_eq!(voice.frequency.breakpoints().len(), 1);
            assert_eq!(voice.frequency.breakpoints()[0].curve, Curve::Step);
        }
    }

    #[test]
    fn pitch_sweep_rises_then_returns() {
        let mut s = punchy();
        s.pitch = 0.5; // 1020 Hz
        s.pitch_env = 0.75; // +1000 Hz
        s.pitch_attack = 0.1;
        s.pitch_decay = 0.2;
        let graph = build(&s, 2.0).unwrap();
        let freq = &graph.voices[0].frequency;
        let points = freq.breakpoints();
        assert_eq!(points.len(), 3);
        assert_eq!(points[1].curve, Curve::Linear);
        assert_eq!(points[2].curve, Curve::Exponential);
        assert_eq!(freq.value_at(2.0), 1020.0);
        assert!(close(freq.value_at(2.1), 2020.0));
        assert!(close(freq.value_at(2.3), 1020.0));
        assert!(freq.value_at(2.2) < 2020.0 && freq.value_at(2.2) > 1020.0);
    }

    #[test]
    fn voices_spread_around_pitch() {
        let mut s = punchy();
        s.pitch = 0.5;
        s.voices = 3.0;
        s.detune = 0.1; // 10 Hz apart
        let graph = build(&s, 0.0).unwrap();
        let bases: Vec<f64> = graph
            .voices
            .iter()
            .map(|v| v.frequency.value_at(0.0))
            .collect();
        assert_eq!(bases, vec![1010.0, 1020.0, 1030.0]);
    }

    #[test]
    fn modulation_depth_envelope() {
        let mut s = punchy();
        s.pitch_mod = 0.4; // 400 cents
        s.mod_attack = 0.2;
        s.mod_decay = 0.3;
        let graph = build(&s, 1.0).unwrap();
        let depth = &graph.mod_depth.gain;
        assert_eq!(depth.value_at(1.0), 0.0);
        assert!(close(depth.value_at(1.1), 200.0));
        assert!(close(depth.value_at(1.2), 400.0));
        assert!(close(depth.value_at(1.5), MOD_FLOOR));
        assert!(close(graph.modulator.frequency.value_at(1.0), 5.0));
    }

    #[test]
    fn every_oscillator_stops_after_tail() {
        let mut s = ParameterSnapshot::default();
        s.voices = 5.0;
        let graph = build(&s, 3.0).unwrap();
        let expected = 3.0 + decay_seconds(&s) + STOP_TAIL_SECONDS;
        assert_eq!(graph.stop_time, expected);
        assert_eq!(graph.modulator.start, 3.0);
        assert_eq!(graph.modulator.stop, expected);
        for v in &graph.voices {
            assert_eq!(v.start, 3.0);
            assert_eq!(v.stop, expected);
            assert!(!v.is_playing_at(2.99));
            assert!(v.is_playing_at(3.0));
            assert!(!v.is_playing_at(expected));
        }
        assert_eq!(graph.node_count(), 8);
    }

    #[test]
    fn voice_count_guards() {
        let mut s = ParameterSnapshot::default();
        s.voices = 0.0;
        assert_eq!(
            build(&s, 0.0).unwrap_err(),
            GraphError::InvalidVoiceCount { voices: 0.0 }
        );
        s.voices = -3.0;
        assert!(build(&s, 0.0).is_err());
        s.voices = f64::NAN;
        assert!(build(&s, 0.0).is_err());
        s.voices = 12.0;
        assert_eq!(build(&s, 0.0).unwrap().voices.len(), MAX_VOICES);
        s.voices = 2.4;
        assert_eq!(build(&s, 0.0).unwrap().voices.len(), 2);
    }

    #[test]
    fn bad_waveform_index_falls_back_to_sine() {
        let mut s = ParameterSnapshot::default();
        s.mode = 7.0;
        s.mod_shape = -2.0;
        let graph = build(&s, 0.0).unwrap();
        assert_eq!(graph.voices[0].waveform, Waveform::Sine);
        assert_eq!(graph.modulator.waveform, Waveform::Sine);

        s.mode = 2.0;
        s.mod_shape = 3.0;
        let graph = build(&s, 0.0).unwrap();
        assert_eq!(graph.voices[0].waveform, Waveform::Sawtooth);
        assert_eq!(graph.modulator.waveform, Waveform::Triangle);
    }

    #[test]
    fn build_is_deterministic() {
        let s = ParameterSnapshot::default();
        assert_eq!(build(&s, 0.5).unwrap(), build(&s, 0.5).unwrap());
    }
}
