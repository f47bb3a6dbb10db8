//! Parameter model: the fixed slider schema and the snapshot of current values.
//!
//! Every synthesis call takes a [`ParameterSnapshot`] by reference; there is no
//! ambient parameter state anywhere in the crate.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Schema ──────────────────────────────────────────────────

/// One tunable dimension: a named, bounded, steppable number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterSpec {
    /// Stable identifier, also the JSON key in snapshots.
    pub id: &'static str,
    /// Human-readable slider label.
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    /// Slider step. A step of 1 marks an integer parameter.
    pub step: f64,
    pub default: f64,
}

/// The fourteen parameters, in display order.
pub const PARAMETERS: [ParameterSpec; 14] = [
    spec("volume", "Volume", 0.0, 1.0, 0.01, 0.5),
    spec("mode", "Mode", 0.0, 3.0, 1.0, 0.0),
    spec("pitch", "Pitch", 0.0, 1.0, 0.01, 0.22),
    spec("decay", "Decay", 0.0, 1.0, 0.01, 0.5),
    spec("voices", "Voices", 1.0, 8.0, 1.0, 1.0),
    spec("detune", "Detune", 0.0, 1.0, 0.01, 0.0),
    spec("pitchEnv", "Pitch Env", 0.0, 1.0, 0.01, 0.5),
    spec("pitchAttack", "Pitch Attack", 0.0, 1.0, 0.01, 0.0),
    spec("pitchDecay", "Pitch Decay", 0.0, 1.0, 0.01, 0.1),
    spec("pitchMod", "Pitch Mod", 0.0, 1.0, 0.01, 0.0),
    spec("modShape", "Mod Shape", 0.0, 3.0, 1.0, 0.0),
    spec("modRate", "Mod Rate", 0.0, 1.0, 0.01, 0.1),
    spec("modAttack", "Mod Attack", 0.0, 1.0, 0.01, 0.0),
    spec("modDecay", "Mod Decay", 0.0, 1.0, 0.01, 0.5),
];

const fn spec(
    id: &'static str,
    label: &'static str,
    min: f64,
    max: f64,
    step: f64,
    default: f64,
) -> ParameterSpec {
    ParameterSpec {
        id,
        label,
        min,
        max,
        step,
        default,
    }
}

impl ParameterSpec {
    /// Look up a parameter spec by id.
    pub fn find(id: &str) -> Option<&'static ParameterSpec> {
        PARAMETERS.iter().find(|s| s.id == id)
    }

    /// Whether the slider only takes whole numbers.
    pub fn is_integer(&self) -> bool {
        self.step == 1.0
    }

    /// Draw a uniformly random value in `[min, max]`, rounded to two
    /// decimals (whole numbers for integer parameters).
    pub fn random_value<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let raw = rng.gen_range(0.0..1.0) * (self.max - self.min) + self.min;
        let rounded = (raw * 100.0).round() / 100.0;
        if self.is_integer() {
            rounded.round()
        } else {
            rounded
        }
    }
}

// ── Snapshot ────────────────────────────────────────────────

/// A complete set of parameter values, the sole input to synthesis.
///
/// Deserialization fills any missing id with its default, so a snapshot is
/// always fully populated. Values are raw slider positions; the graph builder
/// derives frequencies and times from them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParameterSnapshot {
    pub volume: f64,
    /// Voice waveform index (0 sine, 1 square, 2 sawtooth, 3 triangle).
    pub mode: f64,
    pub pitch: f64,
    pub decay: f64,
    pub voices: f64,
    pub detune: f64,
    pub pitch_env: f64,
    /// Pitch sweep attack time in seconds.
    pub pitch_attack: f64,
    /// Pitch sweep decay time in seconds.
    pub pitch_decay: f64,
    pub pitch_mod: f64,
    /// Modulation waveform index.
    pub mod_shape: f64,
    pub mod_rate: f64,
    /// Modulation depth attack time in seconds.
    pub mod_attack: f64,
    /// Modulation depth decay time in seconds.
    pub mod_decay: f64,
}

impl Default for ParameterSnapshot {
    fn default() -> Self {
        let mut snapshot = ParameterSnapshot {
            volume: 0.0,
            mode: 0.0,
            pitch: 0.0,
            decay: 0.0,
            voices: 0.0,
            detune: 0.0,
            pitch_env: 0.0,
            pitch_attack: 0.0,
            pitch_decay: 0.0,
            pitch_mod: 0.0,
            mod_shape: 0.0,
            mod_rate: 0.0,
            mod_attack: 0.0,
            mod_decay: 0.0,
        };
        for spec in &PARAMETERS {
            snapshot.set(spec.id, spec.default);
        }
        snapshot
    }
}

impl ParameterSnapshot {
    /// Read a value by parameter id.
    pub fn get(&self, id: &str) -> Option<f64> {
        let value = match id {
            "volume" => self.volume,
            "mode" => self.mode,
            "pitch" => self.pitch,
            "decay" => self.decay,
            "voices" => self.voices,
            "detune" => self.detune,
            "pitchEnv" => self.pitch_env,
            "pitchAttack" => self.pitch_attack,
            "pitchDecay" => self.pitch_decay,
            "pitchMod" => self.pitch_mod,
            "modShape" => self.mod_shape,
            "modRate" => self.mod_rate,
            "modAttack" => self.mod_attack,
            "modDecay" => self.mod_decay,
            _ => return None,
        };
        Some(value)
    }

    /// Set a value by parameter id. Returns `false` for unknown ids.
    ///
    /// Values are not clamped to the slider range.
    pub fn set(&mut self, id: &str, value: f64) -> bool {
        let slot = match id {
            "volume" => &mut self.volume,
            "mode" => &mut self.mode,
            "pitch" => &mut self.pitch,
            "decay" => &mut self.decay,
            "voices" => &mut self.voices,
            "detune" => &mut self.detune,
            "pitchEnv" => &mut self.pitch_env,
            "pitchAttack" => &mut self.pitch_attack,
            "pitchDecay" => &mut self.pitch_decay,
            "pitchMod" => &mut self.pitch_mod,
            "modShape" => &mut self.mod_shape,
            "modRate" => &mut self.mod_rate,
            "modAttack" => &mut self.mod_attack,
            "modDecay" => &mut self.mod_decay,
            _ => return false,
        };
        *slot = value;
        true
    }

    /// Overlay the known numeric entries of a JSON object onto this snapshot.
    ///
    /// Unknown keys and non-numeric values are skipped. Numeric strings are
    /// accepted since slider values round-trip through text inputs. Returns
    /// how many entries were applied.
    pub fn merge_json(&mut self, entries: &Map<String, Value>) -> usize {
        let mut applied = 0;
        for (key, value) in entries {
            let number = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            if let Some(v) = number {
                if self.set(key, v) {
                    applied += 1;
                }
            }
        }
        applied
    }

    /// A fresh snapshot with every parameter randomized.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut snapshot = ParameterSnapshot::default();
        for spec in &PARAMETERS {
            snapshot.set(spec.id, spec.random_value(rng));
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn defaults_match_schema() {
        let snapshot = ParameterSnapshot::default();
        for spec in &PARAMETERS {
            assert_eq!(snapshot.get(spec.id), Some(spec.default), "{}", spec.id);
        }
        assert_eq!(snapshot.pitch, 0.22);
        assert_eq!(snapshot.voices, 1.0);
    }

    #[test]
    fn every_spec_has_a_slot() {
        let mut snapshot = ParameterSnapshot::default();
        for (i, spec) in PARAMETERS.iter().enumerate() {
            assert!(snapshot.set(spec.id, 100.0 + i as f64));
        }
        for (i, spec) in PARAMETERS.iter().enumerate() {
            assert_eq!(snapshot.get(spec.id), Some(100.0 + i as f64));
        }
    }

    #[test]
    fn unknown_id_is_rejected() {
        let mut snapshot = ParameterSnapshot::default();
        assert!(!snapshot.set("cutoff", 1.0));
        assert_eq!(snapshot.get("cutoff"), None);
        assert_eq!(snapshot, ParameterSnapshot::default());
    }

    #[test]
    fn serializes_camel_case_ids() {
        let json = serde_json::to_value(ParameterSnapshot::default()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 14);
        for spec in &PARAMETERS {
            assert!(obj.contains_key(spec.id), "missing key {}", spec.id);
        }
    }

    #[test]
    fn missing_ids_fall_back_to_defaults() {
        let snapshot: ParameterSnapshot =
            serde_json::from_str(r#"{"pitch": 0.9, "voices": 4}"#).unwrap();
        assert_eq!(snapshot.pitch, 0.9);
        assert_eq!(snapshot.voices, 4.0);
        assert_eq!(snapshot.decay, 0.5);
        assert_eq!(snapshot.mod_decay, 0.5);
    }

    #[test]
    fn merge_json_applies_known_keys_only() {
        let mut snapshot = ParameterSnapshot::default();
        let map: Map<String, Value> =
            serde_json::from_str(r#"{"volume": 0.9, "decay": "0.25", "bogus": 3, "mode": null}"#)
                .unwrap();
        let applied = snapshot.merge_json(&map);
        assert_eq!(applied, 2);
        assert_eq!(snapshot.volume, 0.9);
        assert_eq!(snapshot.decay, 0.25);
        assert_eq!(snapshot.mode, 0.0);
    }

    #[test]
    fn random_values_respect_bounds_and_steps() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let snapshot = ParameterSnapshot::random(&mut rng);
            for spec in &PARAMETERS {
                let v = snapshot.get(spec.id).unwrap();
                assert!(v >= spec.min && v <= spec.max, "{} = {v}", spec.id);
                if spec.is_integer() {
                    assert_eq!(v.fract(), 0.0, "{} should be whole, got {v}", spec.id);
                } else {
                    let cents = v * 100.0;
                    assert!((cents - cents.round()).abs() < 1e-6, "{} not 2dp: {v}", spec.id);
                }
            }
        }
    }

    #[test]
    fn random_is_reproducible_with_seed() {
        let a = ParameterSnapshot::random(&mut StdRng::seed_from_u64(42));
        let b = ParameterSnapshot::random(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
