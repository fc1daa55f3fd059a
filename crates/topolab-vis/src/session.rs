//! The editing session: one topology, its traffic and its captures.
//!
//! `Session` is the single writer of the topology. Every successful edit
//! discards the traffic and captures of the previous emulation run, since
//! they no longer describe the network on the canvas. Renderer commands
//! produced along the way collect in an outbox that the owner drains.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use topolab_decoder::Layer;
use topolab_topology::{DeviceKind, EdgeId, Job, Node, NodeId, Point, Topology, TopologySnapshot};

use crate::backend::EmulationResult;
use crate::capture::{CaptureFrame, CaptureRef, CaptureViewer};
use crate::error::{Error, Result};
use crate::events::RenderCommand;
use crate::forms::{apply_form, form_for, Form};
use crate::playback::{Playback, PlaybackConfig, PlaybackSpeed, PlaybackStatus};

/// Handed out when a run starts; returned with its outcome.
#[derive(Debug, Clone)]
pub struct EmulationTicket {
    /// Topology the run was started on
    pub snapshot: TopologySnapshot,
    generation: u64,
}

/// Session state for the control surface.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub revision: u64,
    pub busy: bool,
    pub notice: Option<String>,
    pub playback: PlaybackStatus,
    pub captures: Vec<String>,
    pub playbacks_finished: u64,
}

pub struct Session {
    topology: Topology,
    playback: Playback,
    captures: CaptureViewer,
    capture_refs: Vec<CaptureRef>,
    busy: bool,
    notice: Option<String>,
    /// Bumped whenever traffic is invalidated
    generation: u64,
    finished: Arc<AtomicU64>,
    outbox: Vec<RenderCommand>,
}

impl Session {
    /// Start with an empty topology.
    pub fn new(config: PlaybackConfig) -> Self {
        Self::with_topology(Topology::new(), config)
    }

    /// Start editing an existing topology.
    pub fn with_topology(topology: Topology, config: PlaybackConfig) -> Self {
        let finished = Arc::new(AtomicU64::new(0));
        let mut playback = Playback::new(config);
        let counter = finished.clone();
        playback.on_finished(move || {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        Self {
            topology,
            playback,
            captures: CaptureViewer::new(),
            capture_refs: Vec::new(),
            busy: false,
            notice: None,
            generation: 0,
            finished,
            outbox: Vec::new(),
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    pub fn captures(&self) -> &CaptureViewer {
        &self.captures
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            revision: self.topology.revision(),
            busy: self.busy,
            notice: self.notice.clone(),
            playback: PlaybackStatus::from(&self.playback),
            captures: self.capture_refs.iter().map(|c| c.interface.clone()).collect(),
            playbacks_finished: self.finished.load(Ordering::Relaxed),
        }
    }

    fn invalidate_traffic(&mut self) {
        self.generation += 1;
        let removed = self.playback.unload();
        self.outbox.extend(removed);
        self.captures.clear();
        self.capture_refs.clear();
    }

    // -- topology edits --

    /// Replace the whole topology.
    pub fn replace_topology(&mut self, snapshot: TopologySnapshot) -> Result<()> {
        self.topology = Topology::from_snapshot(snapshot)?;
        self.invalidate_traffic();
        tracing::info!(nodes = self.topology.nodes().len(), "topology replaced");
        Ok(())
    }

    pub fn add_node(&mut self, kind: DeviceKind, label: &str, position: Point) -> NodeId {
        let id = self.topology.add_node(kind, label, position);
        self.invalidate_traffic();
        id
    }

    /// Drag a device. Traffic survives moves.
    pub fn move_node(&mut self, id: &NodeId, position: Point) -> Result<()> {
        self.topology.set_position(id, position)?;
        Ok(())
    }

    pub fn remove_node(&mut self, id: &NodeId) -> Result<Node> {
        let node = self.topology.remove_node(id)?;
        self.invalidate_traffic();
        Ok(node)
    }

    pub fn add_edge(&mut self, source: &NodeId, target: &NodeId) -> Result<EdgeId> {
        let id = self.topology.add_edge(source, target)?;
        self.invalidate_traffic();
        Ok(id)
    }

    pub fn remove_edge(&mut self, id: &EdgeId) -> Result<()> {
        self.topology.remove_edge(id)?;
        self.invalidate_traffic();
        Ok(())
    }

    pub fn set_impairment(&mut self, id: &EdgeId, loss: f64, duplicate: f64) -> Result<()> {
        self.topology.set_impairment(id, loss, duplicate)?;
        self.invalidate_traffic();
        Ok(())
    }

    pub fn add_job(&mut self, job: Job) -> Result<()> {
        self.topology.add_job(job)?;
        self.invalidate_traffic();
        Ok(())
    }

    pub fn remove_job(&mut self, id: &str) -> bool {
        let removed = self.topology.remove_job(id);
        if removed {
            self.invalidate_traffic();
        }
        removed
    }

    /// Run a protocol edit against one device.
    ///
    /// A rejected edit leaves both the device and the current traffic alone.
    pub fn configure<T>(
        &mut self,
        node: &NodeId,
        edit: impl FnOnce(&mut Node) -> topolab_protocols::Result<T>,
    ) -> Result<T> {
        let target = self.topology.require_node_mut(node)?;
        let out = edit(target)?;
        self.invalidate_traffic();
        Ok(out)
    }

    pub fn form(&self, node: &NodeId) -> Result<Form> {
        self.topology
            .node(node)
            .map(form_for)
            .ok_or_else(|| topolab_topology::Error::NodeNotFound(node.to_string()).into())
    }

    pub fn submit_form(&mut self, node: &NodeId, values: &BTreeMap<String, String>) -> Result<()> {
        apply_form(self.topology.require_node_mut(node)?, values)?;
        self.invalidate_traffic();
        Ok(())
    }

    // -- emulation --

    /// Mark a run as in flight.
    pub fn begin_emulation(&mut self) -> Result<EmulationTicket> {
        if self.busy {
            return Err(Error::Busy);
        }
        self.busy = true;
        self.notice = None;
        Ok(EmulationTicket {
            snapshot: self.topology.snapshot(),
            generation: self.generation,
        })
    }

    /// Record the outcome of a run. Returns whether its traffic was loaded.
    ///
    /// Results of a run whose topology was edited in the meantime are dropped.
    pub fn finish_emulation(
        &mut self,
        ticket: EmulationTicket,
        outcome: Result<EmulationResult>,
    ) -> bool {
        self.busy = false;
        match outcome {
            Err(err) => {
                self.report_failure("emulation", &err);
                false
            }
            Ok(_) if ticket.generation != self.generation => {
                tracing::info!("topology changed during the run; result discarded");
                false
            }
            Ok(result) => {
                let removed = self.playback.load(result.steps);
                self.outbox.extend(removed);
                self.captures.clear();
                self.capture_refs = result.captures;
                true
            }
        }
    }

    /// Surface a backend failure as a notice.
    pub fn report_failure(&mut self, what: &str, err: &Error) {
        tracing::warn!(error = %err, "{what} failed");
        self.notice = Some(format!("{what} failed: {err}"));
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    // -- playback --

    pub fn play(&mut self) {
        let out = self.playback.play(&self.topology);
        self.outbox.extend(out);
    }

    pub fn pause(&mut self) {
        self.playback.pause();
    }

    pub fn stop(&mut self) {
        let out = self.playback.stop();
        self.outbox.extend(out);
    }

    pub fn seek(&mut self, step: usize) {
        let out = self.playback.seek(step);
        self.outbox.extend(out);
    }

    pub fn set_speed(&mut self, speed: PlaybackSpeed) {
        self.playback.set_speed(speed);
    }

    /// Advance playback by `elapsed` wall time.
    pub fn tick(&mut self, elapsed: Duration) {
        let out = self.playback.tick(&self.topology, elapsed);
        self.outbox.extend(out);
    }

    /// Take every renderer command produced since the last call.
    pub fn drain_commands(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut self.outbox)
    }

    // -- captures --

    pub fn capture_refs(&self) -> &[CaptureRef] {
        &self.capture_refs
    }

    pub fn capture_ref(&self, interface: &str) -> Result<CaptureRef> {
        self.capture_refs
            .iter()
            .find(|c| c.interface == interface)
            .cloned()
            .ok_or_else(|| Error::CaptureNotFound(interface.to_string()))
    }

    pub fn load_capture(&mut self, interface: &str, frames: Vec<CaptureFrame>) {
        tracing::debug!(interface, frames = frames.len(), "capture loaded");
        self.captures.load(interface, frames);
    }

    pub fn select_frame(&mut self, index: usize) -> Result<Vec<Layer>> {
        Ok(self.captures.select(index)?.to_vec())
    }
}
