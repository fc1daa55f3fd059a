//! Devices and their interfaces.

use std::net::Ipv4Addr;

use crate::device::{DeviceConfig, DeviceKind};
use crate::error::{Error, Result};
use crate::ids::{EdgeId, InterfaceId, NodeId};
use crate::point::Point;

/// Switchport mode of an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "u8", try_from = "u8")
)]
pub enum VlanMode {
    /// One untagged VLAN
    Access,
    /// Several tagged VLANs
    Trunk,
}

impl From<VlanMode> for u8 {
    fn from(mode: VlanMode) -> Self {
        match mode {
            VlanMode::Access => 0,
            VlanMode::Trunk => 1,
        }
    }
}

impl TryFrom<u8> for VlanMode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(VlanMode::Access),
            1 => Ok(VlanMode::Trunk),
            value => Err(Error::InvalidCode {
                field: "type_connection",
                value,
            }),
        }
    }
}

/// VLAN assignment of an interface: one id under Access, a list under Trunk.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(untagged))]
pub enum VlanTag {
    Single(u16),
    List(Vec<u16>),
}

impl VlanTag {
    /// All VLAN ids carried by this tag.
    pub fn ids(&self) -> Vec<u16> {
        match self {
            VlanTag::Single(id) => vec![*id],
            VlanTag::List(ids) => ids.clone(),
        }
    }
}

/// VXLAN role of a router interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "u8", try_from = "u8")
)]
pub enum VxlanRole {
    /// Interface faces a VXLAN client segment with one VNI
    Client,
    /// Interface terminates tunnels towards remote VTEPs
    NetworkTunnel,
}

impl From<VxlanRole> for u8 {
    fn from(role: VxlanRole) -> Self {
        match role {
            VxlanRole::Client => 0,
            VxlanRole::NetworkTunnel => 1,
        }
    }
}

impl TryFrom<u8> for VxlanRole {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(VxlanRole::Client),
            1 => Ok(VxlanRole::NetworkTunnel),
            value => Err(Error::InvalidCode {
                field: "vxlan_connection_type",
                value,
            }),
        }
    }
}

/// One attachment point of a device, bound to exactly one edge.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interface {
    pub id: InterfaceId,
    pub name: String,
    pub connect: EdgeId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub ip: Option<Ipv4Addr>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub netmask: Option<Ipv4Addr>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub vlan: Option<VlanTag>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub type_connection: Option<VlanMode>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub vxlan_vni: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub vxlan_connection_type: Option<VxlanRole>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub vxlan_vni_to_target_ip: Option<Vec<(u32, Ipv4Addr)>>,
}

impl Interface {
    /// Create an unconfigured interface bound to `connect`.
    pub fn new(id: InterfaceId, name: impl Into<String>, connect: EdgeId) -> Self {
        Self {
            id,
            name: name.into(),
            connect,
            ip: None,
            netmask: None,
            vlan: None,
            type_connection: None,
            vxlan_vni: None,
            vxlan_connection_type: None,
            vxlan_vni_to_target_ip: None,
        }
    }

    /// Whether both a VLAN assignment and a switchport mode are present.
    pub fn is_vlan_configured(&self) -> bool {
        self.vlan.is_some() && self.type_connection.is_some()
    }

    /// Drop the VLAN assignment.
    pub fn clear_vlan(&mut self) {
        self.vlan = None;
        self.type_connection = None;
    }

    /// Drop every VXLAN field.
    pub fn clear_vxlan(&mut self) {
        self.vxlan_vni = None;
        self.vxlan_connection_type = None;
        self.vxlan_vni_to_target_ip = None;
    }

    /// Tunnel entries, empty when none are configured.
    pub fn tunnel_entries(&self) -> &[(u32, Ipv4Addr)] {
        self.vxlan_vni_to_target_ip.as_deref().unwrap_or(&[])
    }
}

/// A device placed on the canvas.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub position: Point,
    pub config: DeviceConfig,
    #[cfg_attr(feature = "serde", serde(default))]
    pub interfaces: Vec<Interface>,
}

impl Node {
    /// Create a device with the default configuration for its kind.
    pub fn new(id: NodeId, kind: DeviceKind, label: impl Into<String>, position: Point) -> Self {
        Self {
            id,
            label: label.into(),
            position,
            config: DeviceConfig::default_for(kind),
            interfaces: Vec::new(),
        }
    }

    /// Kind of this device.
    pub fn kind(&self) -> DeviceKind {
        self.config.kind()
    }

    /// Look up an interface by id.
    pub fn interface(&self, id: &InterfaceId) -> Option<&Interface> {
        self.interfaces.iter().find(|i| &i.id == id)
    }

    /// Look up an interface by id for mutation.
    pub fn interface_mut(&mut self, id: &InterfaceId) -> Option<&mut Interface> {
        self.interfaces.iter_mut().find(|i| &i.id == id)
    }

    /// Interface attached to the given edge.
    pub fn interface_on(&self, edge: &EdgeId) -> Option<&Interface> {
        self.interfaces.iter().find(|i| &i.connect == edge)
    }

    /// Interface by id, or an error naming this device.
    pub fn require_interface_mut(&mut self, id: &InterfaceId) -> Result<&mut Interface> {
        let node = self.id.to_string();
        self.interface_mut(id).ok_or_else(|| Error::InterfaceNotFound {
            node,
            interface: id.to_string(),
        })
    }
}
