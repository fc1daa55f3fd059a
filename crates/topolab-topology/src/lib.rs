//! Topolab Topology
//!
//! The in-memory model of an emulated network: devices placed on a canvas,
//! links between them, per-interface addressing and protocol roles, and the
//! jobs the emulator runs on hosts.
//!
//! # Invariants
//!
//! - Every device has exactly one interface per link touching it.
//! - Port names are allocated per device, lowest free index first.
//! - Deleting a device deletes its links and frees the peers' interfaces.
//!
//! # Ownership
//!
//! A [`Topology`] is a plain value. The component that owns it hands out
//! `&Topology` to readers (renderer, playback) and `&mut Topology` to editors
//! (configuration models). There is no interior mutability.

mod device;
mod edge;
mod error;
mod graph;
mod ids;
mod job;
mod node;
mod point;

pub use device::{
    DeviceConfig, DeviceKind, HostConfig, HubConfig, MstInstance, RouterConfig, ServerConfig,
    StaticRoute, StpMode, SwitchConfig,
};
pub use edge::Edge;
pub use error::{Error, Result};
pub use graph::{Topology, TopologySnapshot};
pub use ids::{EdgeId, InterfaceId, NodeId};
pub use job::Job;
pub use node::{Interface, Node, VlanMode, VlanTag, VxlanRole};
pub use point::Point;

/// Lowest valid VLAN id.
pub const VLAN_MIN: u16 = 1;

/// Highest valid VLAN id.
pub const VLAN_MAX: u16 = 4094;

/// Lowest valid VXLAN network identifier.
pub const VNI_MIN: u32 = 1;

/// Highest valid VXLAN network identifier.
pub const VNI_MAX: u32 = 16_777_214;

// VNIs are 24-bit
const _: () = assert!(VNI_MAX < (1 << 24));
