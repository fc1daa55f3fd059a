//! Links between devices.

use crate::ids::{EdgeId, NodeId};

/// A link between two devices.
///
/// `source` and `target` record the direction the link was drawn in. Traffic
/// may flow either way; the playback scheduler orients packets against them.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub loss_percentage: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub duplicate_percentage: f64,
}

impl Edge {
    /// Create a lossless link.
    pub fn new(id: EdgeId, source: NodeId, target: NodeId) -> Self {
        Self {
            id,
            source,
            target,
            loss_percentage: 0.0,
            duplicate_percentage: 0.0,
        }
    }

    /// Whether this edge touches the node.
    pub fn touches(&self, node: &NodeId) -> bool {
        &self.source == node || &self.target == node
    }
}
