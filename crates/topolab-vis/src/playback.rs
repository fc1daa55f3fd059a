//! Step-synchronized traffic playback.
//!
//! Playback walks a list of [`TrafficStep`]s. Every packet of a step becomes
//! a marker [`Motion`] along its link. The next step is scheduled only once
//! every marker of the current step has landed, so steps never overlap.
//! Packets that share a link within one step are staggered so they do not
//! sit on top of each other.
//!
//! Time is external: the owner calls [`Playback::tick`] with the elapsed wall
//! time and forwards the returned [`RenderCommand`]s to the renderer.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use topolab_topology::{EdgeId, Topology};

use crate::events::{RenderCommand, TrafficStep};
use crate::motion::{Motion, Phase};

/// Playback speed multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackSpeed {
    /// 0.25x speed
    QuarterSpeed,
    /// 0.5x speed
    HalfSpeed,
    /// Normal speed (1x)
    #[default]
    Normal,
    /// 2x speed
    Double,
    /// 4x speed
    Quadruple,
}

impl PlaybackSpeed {
    /// Get the speed multiplier.
    pub fn multiplier(&self) -> f64 {
        match self {
            PlaybackSpeed::QuarterSpeed => 0.25,
            PlaybackSpeed::HalfSpeed => 0.5,
            PlaybackSpeed::Normal => 1.0,
            PlaybackSpeed::Double => 2.0,
            PlaybackSpeed::Quadruple => 4.0,
        }
    }
}

/// Current state of playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// Nothing loaded
    Idle,
    /// Steps loaded, not started
    Loaded,
    /// Markers are moving
    Playing,
    /// Markers are frozen in place
    Paused,
    /// Stopped or ran to the end; cursor is back at the first step
    Stopped,
}

/// Timing of marker motions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Hidden move to the link start (not applied to step 0)
    pub approach: Duration,
    /// Visible travel along the link
    pub transit: Duration,
    /// Extra approach delay per earlier packet on the same link
    pub stagger: Duration,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            approach: Duration::from_millis(200),
            transit: Duration::from_millis(1000),
            stagger: Duration::from_millis(300),
        }
    }
}

type FinishedHook = Box<dyn FnMut() + Send + Sync>;

/// Playback controller for a traffic capture.
pub struct Playback {
    config: PlaybackConfig,
    steps: Vec<TrafficStep>,
    cursor: usize,
    state: PlaybackState,
    speed: PlaybackSpeed,
    motions: Vec<Motion>,
    next_marker: u64,
    on_finished: Option<FinishedHook>,
}

impl Playback {
    /// Create an idle playback controller.
    pub fn new(config: PlaybackConfig) -> Self {
        Self {
            config,
            steps: Vec::new(),
            cursor: 0,
            state: PlaybackState::Idle,
            speed: PlaybackSpeed::Normal,
            motions: Vec::new(),
            next_marker: 0,
            on_finished: None,
        }
    }

    /// Run `hook` every time playback reaches the end of the last step.
    pub fn on_finished(&mut self, hook: impl FnMut() + Send + Sync + 'static) {
        self.on_finished = Some(Box::new(hook));
    }

    /// Get the current step index.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Get the number of loaded steps.
    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    /// Get the current playback state.
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Get the current playback speed.
    pub fn speed(&self) -> PlaybackSpeed {
        self.speed
    }

    /// Number of markers of the current step that have not landed.
    pub fn in_flight(&self) -> usize {
        self.motions.len()
    }

    /// Markers currently on the canvas.
    pub fn motions(&self) -> &[Motion] {
        &self.motions
    }

    /// Calculate progress as a fraction of steps completed (0.0 - 1.0).
    pub fn progress(&self) -> f64 {
        if self.steps.is_empty() {
            0.0
        } else {
            self.cursor as f64 / self.steps.len() as f64
        }
    }

    /// Replace the capture. Playback is left Loaded at step 0.
    pub fn load(&mut self, steps: Vec<TrafficStep>) -> Vec<RenderCommand> {
        let out = self.clear_motions();
        tracing::info!(steps = steps.len(), "traffic loaded");
        self.steps = steps;
        self.cursor = 0;
        self.state = PlaybackState::Loaded;
        out
    }

    /// Drop the capture entirely.
    pub fn unload(&mut self) -> Vec<RenderCommand> {
        let out = self.clear_motions();
        if !self.steps.is_empty() {
            tracing::info!("traffic discarded");
        }
        self.steps.clear();
        self.cursor = 0;
        self.state = PlaybackState::Idle;
        out
    }

    /// Start or resume playback.
    ///
    /// Resumes in place when paused, does nothing when already playing or
    /// when nothing is loaded, and otherwise starts the step at the cursor.
    pub fn play(&mut self, topology: &Topology) -> Vec<RenderCommand> {
        let mut out = Vec::new();
        match self.state {
            PlaybackState::Idle | PlaybackState::Playing => {}
            PlaybackState::Paused => self.state = PlaybackState::Playing,
            PlaybackState::Loaded | PlaybackState::Stopped => {
                self.state = PlaybackState::Playing;
                self.start_step(topology, &mut out);
            }
        }
        out
    }

    /// Freeze every marker where it is.
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    /// Discard all markers and return to the first step.
    pub fn stop(&mut self) -> Vec<RenderCommand> {
        let out = self.clear_motions();
        self.cursor = 0;
        if self.state != PlaybackState::Idle {
            self.state = PlaybackState::Stopped;
        }
        out
    }

    /// Make the next [`play`](Self::play) begin at `step`.
    pub fn seek(&mut self, step: usize) -> Vec<RenderCommand> {
        let out = self.clear_motions();
        if self.state != PlaybackState::Idle {
            self.cursor = step.min(self.steps.len().saturating_sub(1));
            self.state = PlaybackState::Loaded;
        }
        out
    }

    /// Set playback speed.
    pub fn set_speed(&mut self, speed: PlaybackSpeed) {
        self.speed = speed;
    }

    /// Let `elapsed` wall time pass.
    pub fn tick(&mut self, topology: &Topology, elapsed: Duration) -> Vec<RenderCommand> {
        let mut out = Vec::new();
        if self.state != PlaybackState::Playing {
            return out;
        }

        let dt = elapsed.mul_f64(self.speed.multiplier());
        for motion in &mut self.motions {
            let (before, after) = motion.advance(dt);
            if before == Phase::Approach && after != Phase::Approach {
                out.push(RenderCommand::Show {
                    marker: motion.marker,
                });
            }
            if after != Phase::Approach {
                out.push(RenderCommand::Move {
                    marker: motion.marker,
                    at: motion.position(),
                });
            }
            if after == Phase::Landed {
                out.push(RenderCommand::Remove {
                    marker: motion.marker,
                });
            }
        }
        self.motions.retain(|m| !m.landed());

        if self.motions.is_empty() {
            self.cursor += 1;
            self.start_step(topology, &mut out);
        }
        out
    }

    /// Schedule the step at the cursor, skipping steps with nothing to show.
    fn start_step(&mut self, topology: &Topology, out: &mut Vec<RenderCommand>) {
        while self.cursor < self.steps.len() {
            let step = self.cursor;
            let mut per_link: HashMap<&EdgeId, u32> = HashMap::new();
            let approach = if step == 0 {
                Duration::ZERO
            } else {
                self.config.approach
            };

            for packet in self.steps[step].packets() {
                let Some(edge) = topology.edge(&packet.path) else {
                    tracing::warn!(packet = %packet.id, edge = %packet.path, "packet on unknown link");
                    continue;
                };
                let Some((from, to)) = topology.edge_endpoints(&edge.id) else {
                    tracing::warn!(packet = %packet.id, edge = %edge.id, "link endpoint missing");
                    continue;
                };
                let (start, end) = if packet.source == edge.source {
                    (from, to)
                } else {
                    (to, from)
                };

                let earlier = per_link.entry(&edge.id).or_insert(0);
                let delay = approach + self.config.stagger * *earlier;
                *earlier += 1;

                let marker = self.next_marker;
                self.next_marker += 1;
                out.push(RenderCommand::Spawn {
                    marker,
                    packet: packet.id.clone(),
                    label: packet.label.clone(),
                    at: start,
                });
                self.motions
                    .push(Motion::new(marker, start, end, delay, self.config.transit));
            }

            if !self.motions.is_empty() {
                tracing::debug!(step, packets = self.motions.len(), "step started");
                out.push(RenderCommand::StepStarted {
                    step,
                    packets: self.motions.len(),
                });
                return;
            }
            tracing::debug!(step, "skipping empty step");
            self.cursor += 1;
        }
        self.finish(out);
    }

    fn finish(&mut self, out: &mut Vec<RenderCommand>) {
        tracing::info!(steps = self.steps.len(), "playback finished");
        out.extend(self.clear_motions());
        out.push(RenderCommand::Finished);
        self.cursor = 0;
        self.state = PlaybackState::Stopped;
        if let Some(hook) = self.on_finished.as_mut() {
            hook();
        }
    }

    fn clear_motions(&mut self) -> Vec<RenderCommand> {
        self.motions
            .drain(..)
            .map(|m| RenderCommand::Remove { marker: m.marker })
            .collect()
    }
}

/// Playback status for sending to frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackStatus {
    pub step: usize,
    pub total_steps: usize,
    pub state: PlaybackState,
    pub speed: PlaybackSpeed,
    pub in_flight: usize,
    pub progress: f64,
}

impl From<&Playback> for PlaybackStatus {
    fn from(playback: &Playback) -> Self {
        Self {
            step: playback.cursor,
            total_steps: playback.total_steps(),
            state: playback.state,
            speed: playback.speed,
            in_flight: playback.in_flight(),
            progress: playback.progress(),
        }
    }
}
