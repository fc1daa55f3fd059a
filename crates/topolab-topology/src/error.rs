//! Error types for topolab-topology.

use thiserror::Error;

/// Result type for topology operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while editing a topology.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Referenced node does not exist.
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// Referenced edge does not exist.
    #[error("edge not found: {0}")]
    EdgeNotFound(String),

    /// Referenced interface does not exist on the device.
    #[error("interface {interface} not found on {node}")]
    InterfaceNotFound { node: String, interface: String },

    /// A node with this id is already present.
    #[error("duplicate node id: {0}")]
    DuplicateNode(String),

    /// An edge with this id is already present.
    #[error("duplicate edge id: {0}")]
    DuplicateEdge(String),

    /// Links must join two distinct devices.
    #[error("cannot link {0} to itself")]
    SelfLoop(String),

    /// The device configuration variant does not match the device kind.
    #[error("{kind} device cannot take {config} configuration")]
    ConfigMismatch {
        kind: &'static str,
        config: &'static str,
    },

    /// An enumerated wire value was out of range.
    #[error("invalid {field} value: {value}")]
    InvalidCode { field: &'static str, value: u8 },
}
