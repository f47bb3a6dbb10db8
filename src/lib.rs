pub mod codec;
pub mod dsp;
pub mod error;
pub mod params;
pub mod store;
pub mod visualizer;

use crate::dsp::live::LiveContext;
use crate::params::{PARAMETERS, ParameterSnapshot};
use crate::visualizer::Visualizer;
use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the sfxia-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: route `log` output to the browser console and report
/// panics there. Safe to call more than once.
#[wasm_bindgen]
pub fn init_logging() {
    #[cfg(target_arch = "wasm32")]
    {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Debug);
    }
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&format!("{e}")))
}

fn snapshot_from_js(value: JsValue) -> Result<ParameterSnapshot, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: the slider schema, in display order.
#[wasm_bindgen]
pub fn parameter_specs() -> Result<JsValue, JsValue> {
    to_js(&PARAMETERS)
}

/// WASM-exposed: a snapshot holding every default value.
#[wasm_bindgen]
pub fn default_snapshot() -> Result<JsValue, JsValue> {
    to_js(&ParameterSnapshot::default())
}

/// WASM-exposed: a snapshot with every parameter randomized.
#[wasm_bindgen]
pub fn randomize_snapshot() -> Result<JsValue, JsValue> {
    to_js(&ParameterSnapshot::random(&mut rand::thread_rng()))
}

/// WASM-exposed: encode a snapshot object as a share token.
#[wasm_bindgen]
pub fn encode_snapshot(snapshot: JsValue) -> Result<String, JsValue> {
    Ok(codec::encode(&snapshot_from_js(snapshot)?))
}

/// WASM-exposed: decode a share token. Returns `undefined` for malformed
/// text so the UI can ignore it without a try/catch.
#[wasm_bindgen]
pub fn decode_snapshot(token: &str) -> Result<JsValue, JsValue> {
    match codec::decode(token) {
        Ok(snapshot) => to_js(&snapshot),
        Err(e) => {
            log::debug!("decode_snapshot ignored input: {e}");
            Ok(JsValue::UNDEFINED)
        }
    }
}

/// WASM-exposed: the synthesis graph a snapshot produces (nodes, envelope
/// breakpoints, start/stop times), for inspection in the UI.
#[wasm_bindgen]
pub fn describe_graph(snapshot: JsValue) -> Result<JsValue, JsValue> {
    let snapshot = snapshot_from_js(snapshot)?;
    let graph =
        dsp::graph::build(&snapshot, 0.0).map_err(|e| JsValue::from_str(&format!("{e}")))?;
    to_js(&graph)
}

/// WASM-exposed: render a snapshot offline to the bytes of `sfx.wav`
/// (mono, 44.1 kHz, 16-bit PCM).
#[wasm_bindgen]
pub fn render_sfx_wav(snapshot: JsValue) -> Result<Vec<u8>, JsValue> {
    let snapshot = snapshot_from_js(snapshot)?;
    dsp::renderer::render_wav(&snapshot).map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: MIME type for a `Blob` holding rendered WAV bytes.
#[wasm_bindgen]
pub fn wav_mime_type() -> String {
    dsp::wav::WAV_MIME.to_string()
}

/// WASM-exposed: file name offered when downloading an export.
#[wasm_bindgen]
pub fn export_file_name() -> String {
    dsp::renderer::EXPORT_FILE_NAME.to_string()
}

/// WASM-exposed: render a snapshot offline to mono f32 samples.
#[wasm_bindgen]
pub fn render_sfx_samples(snapshot: JsValue) -> Result<Vec<f32>, JsValue> {
    let snapshot = snapshot_from_js(snapshot)?;
    let buffer = dsp::renderer::render_offline(&snapshot, &Default::default())
        .map_err(|e| JsValue::from_str(&format!("{e}")))?;
    Ok(buffer.channel_data(0).map(<[f32]>::to_vec).unwrap_or_default())
}

/// WASM-exposed: the live synthesizer driven from an AudioWorklet, with an
/// oscilloscope tap for the UI.
#[wasm_bindgen]
pub struct SfxEngine {
    context: LiveContext,
    scope: Visualizer,
}

#[wasm_bindgen]
impl SfxEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: f64) -> SfxEngine {
        let context = LiveContext::new(sample_rate);
        let scope = Visualizer::new(context.analyser(), 0.0, 0.0);
        SfxEngine { context, scope }
    }

    /// Start a new sound now. Earlier sounds keep playing.
    pub fn play(&mut self, snapshot: JsValue) -> Result<f64, JsValue> {
        let snapshot = snapshot_from_js(snapshot)?;
        self.context
            .play(&snapshot)
            .map_err(|e| JsValue::from_str(&format!("{e}")))
    }

    /// Fill one output block.
    pub fn process(&mut self, out: &mut [f32]) {
        self.context.process(out);
    }

    /// Trace the latest output as flat `[x0, y0, x1, y1, …]` coordinates.
    pub fn scope_trace(&mut self, width: f32, height: f32) -> Vec<f32> {
        self.scope.resize(width, height);
        self.scope
            .next_frame()
            .points
            .iter()
            .flat_map(|p| [p.x, p.y])
            .collect()
    }

    pub fn current_time(&self) -> f64 {
        self.context.current_time()
    }

    pub fn live_node_count(&self) -> usize {
        self.context.live_node_count()
    }
}
