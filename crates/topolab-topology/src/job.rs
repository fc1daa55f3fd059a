//! Emulation jobs bound to hosts.

use crate::ids::NodeId;

/// A task the emulator runs on a host during an emulation run.
///
/// `kind` is the backend's numeric job code (ping, HTTP server, ...); `args`
/// are passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Job {
    pub id: String,
    pub kind: u32,
    pub host: NodeId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub args: Vec<String>,
}
