//! Live context: real-time playback of any number of overlapping graphs.
//!
//! The host pulls audio block by block (an AudioWorklet or a native output
//! callback). Each `play` builds an independent graph at the current clock
//! time; graphs superpose on a shared bus that also feeds the analyser tap.
//! A graph is dropped as soon as its stop time has elapsed, so the number of
//! live nodes returns to zero after every sound has finished.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::GraphError;
use crate::params::ParameterSnapshot;
use crate::visualizer::{Analyser, SharedAnalyser};

use super::graph::{self, SynthGraph};
use super::mixer::Mixer;
use super::renderer::{ActiveGraph, BLOCK_SIZE, mix_block};

pub struct LiveContext {
    sample_rate: f64,
    /// Frames rendered so far; the context clock.
    frame: u64,
    graphs: Vec<ActiveGraph>,
    bus: Mixer,
    analyser: SharedAnalyser,
}

impl LiveContext {
    pub fn new(sample_rate: f64) -> Self {
        LiveContext {
            sample_rate,
            frame: 0,
            graphs: Vec::new(),
            bus: Mixer::new(),
            analyser: Rc::new(RefCell::new(Analyser::new())),
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Context clock in seconds.
    pub fn current_time(&self) -> f64 {
        self.frame as f64 / self.sample_rate
    }

    /// Build a graph for `snapshot` starting now and connect it.
    /// Returns the graph's start time. Earlier graphs keep playing.
    pub fn play(&mut self, snapshot: &ParameterSnapshot) -> Result<f64, GraphError> {
        let start = self.current_time();
        let synth = graph::build(snapshot, start)?;
        self.connect(synth);
        Ok(start)
    }

    /// Connect an already built graph to the destination.
    pub fn connect(&mut self, synth: SynthGraph) {
        log::debug!(
            "live: connect graph [{:.3}s, {:.3}s), {} active",
            synth.start_time,
            synth.stop_time,
            self.graphs.len() + 1
        );
        self.graphs.push(ActiveGraph::new(synth, self.sample_rate));
    }

    /// Render the next `out.len()` frames into `out` and advance the clock.
    pub fn process(&mut self, out: &mut [f32]) {
        let mut analyser = self.analyser.borrow_mut();
        for chunk in out.chunks_mut(BLOCK_SIZE) {
            mix_block(
                &mut self.graphs,
                &mut self.bus,
                self.frame,
                chunk.len(),
                self.sample_rate,
            );
            for (slot, &s) in chunk.iter_mut().zip(self.bus.output()) {
                *slot = s as f32;
                analyser.push(*slot);
            }
            self.frame += chunk.len() as u64;

            let now = self.frame as f64 / self.sample_rate;
            self.graphs.retain(|g| !g.is_finished_at(now));
        }
    }

    /// Graphs still holding resources.
    pub fn active_graphs(&self) -> usize {
        self.graphs.len()
    }

    /// Nodes still held across every active graph.
    pub fn live_node_count(&self) -> usize {
        self.graphs.iter().map(ActiveGraph::node_count).sum()
    }

    /// The analyser tap on the destination, for visualizers.
    pub fn analyser(&self) -> SharedAnalyser {
        Rc::clone(&self.analyser)
    }
}
