//! Topolab Control Surface
//!
//! Drives an emulated network from the outside: edits the topology, submits
//! emulation runs to the backend and replays the resulting traffic as marker
//! motions for a graph renderer.
//!
//! # Architecture
//!
//! - **Session**: Owns the topology, the loaded traffic and the capture viewer
//! - **Playback**: Step-synchronized marker scheduling along links
//! - **Backend**: Submit, poll and fetch captures over HTTP
//! - **WebSocket**: Streams renderer commands to the frontend
//! - **REST API**: Topology, protocol settings, emulation, captures, playback
//!
//! # Usage
//!
//! ```ignore
//! let config = VisConfig::from_env()?;
//! let backend = Arc::new(HttpBackend::new(&config.backend_url));
//! VisServer::new(config, backend).serve().await?;
//! ```

mod backend;
mod capture;
mod config;
mod error;
mod events;
mod forms;
mod motion;
mod playback;
mod server;
mod session;

pub use backend::{
    run_emulation, EmulationBackend, EmulationResult, HttpBackend, PollStatus, SimulationId,
};
pub use capture::{CaptureFrame, CaptureRef, CaptureViewer};
pub use config::VisConfig;
pub use error::{Error, Result};
pub use events::{parse_steps, PacketEvent, RenderCommand, TrafficStep};
pub use forms::{apply_form, form_for, FieldKind, Form, FormField, SelectOption};
pub use motion::{Motion, Phase};
pub use playback::{Playback, PlaybackConfig, PlaybackSpeed, PlaybackState, PlaybackStatus};
pub use server::{run_and_record, AppState, VisServer};
pub use session::{EmulationTicket, Session, SessionStatus};
