//! Renderer: runs synthesis graphs into sample buffers.
//!
//! [`ActiveGraph`] is the per-playback runtime (oscillator phases) shared by
//! both the live context and the offline context. The offline path renders a
//! snapshot to a fixed-length buffer and, from there, to WAV bytes.

use crate::error::GraphError;
use crate::params::ParameterSnapshot;

use super::graph::{self, SynthGraph};
use super::mixer::Mixer;
use super::oscillator::Oscillator;
use super::wav;

/// Sample rate of exported audio.
pub const SAMPLE_RATE: u32 = 44100;
/// Silence appended after the master decay in exported audio.
pub const RENDER_TAIL_SECONDS: f64 = 0.1;
/// Longest offline render accepted; longer requests are truncated.
pub const MAX_RENDER_SECONDS: f64 = 60.0;
/// File name offered for exported audio.
pub const EXPORT_FILE_NAME: &str = "sfx.wav";

pub(crate) const BLOCK_SIZE: usize = 128;

// ── Runtime graph ───────────────────────────────────────────

/// A graph connected to a context: the description plus oscillator state.
#[derive(Debug, Clone)]
pub struct ActiveGraph {
    graph: SynthGraph,
    modulator: Oscillator,
    voices: Vec<Oscillator>,
}

impl ActiveGraph {
    pub fn new(graph: SynthGraph, sample_rate: f64) -> Self {
        let modulator = Oscillator::new(graph.modulator.waveform, sample_rate);
        let voices = graph
            .voices
            .iter()
            .map(|v| Oscillator::new(v.waveform, sample_rate))
            .collect();
        ActiveGraph {
            graph,
            modulator,
            voices,
        }
    }

    /// Compute the graph output at context time `t`. Must be called once per
    /// frame in increasing time order.
    pub fn next_sample(&mut self, t: f64) -> f64 {
        let g = &self.graph;

        let modulation = if g.modulator.is_playing_at(t) {
            self.modulator.frequency = g.modulator.frequency.value_at(t);
            self.modulator.next_sample() * g.mod_depth.gain.value_at(t)
        } else {
            0.0
        };

        let mut sum = 0.0;
        for (node, osc) in g.voices.iter().zip(self.voices.iter_mut()) {
            if node.is_playing_at(t) {
                osc.frequency = node.frequency.value_at(t);
                osc.detune = modulation;
                sum += osc.next_sample();
            }
        }

        sum * g.master.gain.value_at(t)
    }

    /// True once every oscillator has passed its stop time.
    pub fn is_finished_at(&self, t: f64) -> bool {
        t >= self.graph.stop_time
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }
}

/// Mix `graphs` into `mixer` for one block of `len` frames starting at
/// `start_frame`.
pub(crate) fn mix_block(
    graphs: &mut [ActiveGraph],
    mixer: &mut Mixer,
    start_frame: u64,
    len: usize,
    sample_rate: f64,
) {
    mixer.clear(len);
    for graph in graphs.iter_mut() {
        for i in 0..len {
            let t = (start_frame + i as u64) as f64 / sample_rate;
            mixer.add(i, graph.next_sample(t));
        }
    }
}

// ── Rendered buffer ─────────────────────────────────────────

/// The immutable result of an offline render: planar `f32` channels.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl RenderedBuffer {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn number_of_channels(&self) -> usize {
        self.channels.len()
    }

    /// Frames per channel.
    pub fn length(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn duration(&self) -> f64 {
        self.length() as f64 / self.sample_rate as f64
    }

    pub fn channel_data(&self, channel: usize) -> Option<&[f32]> {
        self.channels.get(channel).map(Vec::as_slice)
    }

    /// Encode as 16-bit PCM WAV.
    pub fn to_wav(&self) -> Vec<u8> {
        wav::encode_wav(&self.channels, self.sample_rate)
    }
}

// ── Offline context ─────────────────────────────────────────

/// Settings for exported audio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderConfig {
    pub sample_rate: u32,
    pub channels: usize,
    /// Seconds rendered past the end of the master decay.
    pub tail_seconds: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            sample_rate: SAMPLE_RATE,
            channels: 1,
            tail_seconds: RENDER_TAIL_SECONDS,
        }
    }
}

/// Number of frames needed to hold `seconds` of audio: `ceil(seconds * sr)`.
///
/// Requests past [`MAX_RENDER_SECONDS`] are truncated with a warning.
pub fn frames_for(seconds: f64, sample_rate: u32) -> usize {
    if seconds.is_nan() || seconds <= 0.0 {
        return 0;
    }
    let seconds = if seconds > MAX_RENDER_SECONDS {
        log::warn!(
            "render of {seconds:.2}s exceeds the {MAX_RENDER_SECONDS}s limit, truncating"
        );
        MAX_RENDER_SECONDS
    } else {
        seconds
    };
    (seconds * sample_rate as f64).ceil() as usize
}

/// A fixed-length, faster-than-real-time rendering context.
pub struct OfflineContext {
    sample_rate: u32,
    channels: usize,
    length: usize,
    graphs: Vec<ActiveGraph>,
}

impl OfflineContext {
    pub fn new(channels: usize, length: usize, sample_rate: u32) -> Self {
        OfflineContext {
            sample_rate,
            channels: channels.max(1),
            length,
            graphs: Vec::new(),
        }
    }

    /// Connect a graph's output to the context destination.
    pub fn connect(&mut self, graph: SynthGraph) {
        self.graphs
            .push(ActiveGraph::new(graph, self.sample_rate as f64));
    }

    /// Render every frame. The mono mix is copied to each output channel.
    pub fn start_rendering(mut self) -> RenderedBuffer {
        let sr = self.sample_rate as f64;
        let mut mixer = Mixer::new();
        let mut mono = Vec::with_capacity(self.length);

        let mut block_start = 0;
        while block_start < self.length {
            let block_end = (block_start + BLOCK_SIZE).min(self.length);
            mix_block(
                &mut self.graphs,
                &mut mixer,
                block_start as u64,
                block_end - block_start,
                sr,
            );
            mono.extend(mixer.output().iter().map(|&s| s as f32));
            block_start = block_end;
        }

        RenderedBuffer {
            sample_rate: self.sample_rate,
            channels: vec![mono; self.channels],
        }
    }
}

/// Render `snapshot` offline: build its graph at time zero in a context sized
/// to the master decay plus the configured tail.
pub fn render_offline(
    snapshot: &ParameterSnapshot,
    config: &RenderConfig,
) -> Result<RenderedBuffer, GraphError> {
    let seconds = graph::decay_seconds(snapshot) + config.tail_seconds;
    let length = frames_for(seconds, config.sample_rate);
    let synth = graph::build(snapshot, 0.0)?;

    log::debug!(
        "offline render: {length} frames x {} ch @ {} Hz",
        config.channels,
        config.sample_rate
    );

    let mut ctx = OfflineContext::new(config.channels, length, config.sample_rate);
    ctx.connect(synth);
    Ok(ctx.start_rendering())
}

/// Render `snapshot` with the export settings and encode it as WAV bytes.
pub fn render_wav(snapshot: &ParameterSnapshot) -> Result<Vec<u8>, GraphError> {
    Ok(render_offline(snapshot, &RenderConfig::default())?.to_wav())
}
