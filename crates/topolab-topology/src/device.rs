//! Device kinds and their typed configuration.
//!
//! Every device carries exactly one configuration variant matching its kind.
//! Protocol state that only makes sense on one kind of device (spanning tree
//! on switches, static routes on routers) lives in that kind's struct.

use std::net::Ipv4Addr;

use crate::error::{Error, Result};

/// Kind of a device placed on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeviceKind {
    /// End host
    #[cfg_attr(feature = "serde", serde(rename = "host"))]
    Host,
    /// Layer 3 router
    #[cfg_attr(feature = "serde", serde(rename = "router"))]
    Router,
    /// Server host
    #[cfg_attr(feature = "serde", serde(rename = "server"))]
    Server,
    /// Layer 1 hub
    #[cfg_attr(feature = "serde", serde(rename = "l1_hub"))]
    Hub,
    /// Layer 2 switch
    #[cfg_attr(feature = "serde", serde(rename = "l2_switch"))]
    Switch,
}

impl DeviceKind {
    /// Wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::Host => "host",
            DeviceKind::Router => "router",
            DeviceKind::Server => "server",
            DeviceKind::Hub => "l1_hub",
            DeviceKind::Switch => "l2_switch",
        }
    }

    /// Prefix used for node ids of this kind.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            DeviceKind::Host => "host",
            DeviceKind::Router => "router",
            DeviceKind::Server => "server",
            DeviceKind::Hub => "hub",
            DeviceKind::Switch => "l2sw",
        }
    }

    /// Prefix used for port names on this kind.
    pub fn port_prefix(&self) -> &'static str {
        match self {
            DeviceKind::Hub => "port",
            _ => "eth",
        }
    }

    /// Whether interfaces on this device carry IP addresses.
    pub fn is_layer3(&self) -> bool {
        matches!(self, DeviceKind::Host | DeviceKind::Router | DeviceKind::Server)
    }
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Spanning tree protocol mode of a switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "u8", try_from = "u8")
)]
pub enum StpMode {
    /// Spanning tree disabled
    #[default]
    Disabled,
    /// IEEE 802.1D
    Stp,
    /// IEEE 802.1w
    Rstp,
    /// IEEE 802.1s
    Mstp,
}

impl From<StpMode> for u8 {
    fn from(mode: StpMode) -> Self {
        match mode {
            StpMode::Disabled => 0,
            StpMode::Stp => 1,
            StpMode::Rstp => 2,
            StpMode::Mstp => 3,
        }
    }
}

impl TryFrom<u8> for StpMode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(StpMode::Disabled),
            1 => Ok(StpMode::Stp),
            2 => Ok(StpMode::Rstp),
            3 => Ok(StpMode::Mstp),
            value => Err(Error::InvalidCode { field: "stp", value }),
        }
    }
}

/// One Multiple Spanning Tree instance of a switch.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MstInstance {
    /// Instance number; 0 is the CIST
    pub instance_id: u8,
    /// VLANs mapped to this instance, ascending and unique
    pub vlans: Vec<u16>,
    /// Bridge priority, a multiple of 4096
    pub priority: u16,
}

impl MstInstance {
    /// Id of the Common and Internal Spanning Tree instance.
    pub const CIST_ID: u8 = 0;

    /// Default bridge priority.
    pub const DEFAULT_PRIORITY: u16 = 32768;

    /// The CIST with no VLANs and default priority.
    pub fn cist() -> Self {
        Self {
            instance_id: Self::CIST_ID,
            vlans: Vec::new(),
            priority: Self::DEFAULT_PRIORITY,
        }
    }

    /// Whether this is the CIST.
    pub fn is_cist(&self) -> bool {
        self.instance_id == Self::CIST_ID
    }
}

/// A static route on a router.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StaticRoute {
    pub destination: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub gateway: Ipv4Addr,
}

/// Host settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HostConfig {
    #[cfg_attr(feature = "serde", serde(default))]
    pub default_gateway: Option<Ipv4Addr>,
}

/// Server settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServerConfig {
    #[cfg_attr(feature = "serde", serde(default))]
    pub default_gateway: Option<Ipv4Addr>,
}

/// Router settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouterConfig {
    #[cfg_attr(feature = "serde", serde(default))]
    pub routes: Vec<StaticRoute>,
}

/// Hub settings. Hubs have nothing to configure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HubConfig {}

/// Switch settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SwitchConfig {
    #[cfg_attr(feature = "serde", serde(default))]
    pub stp: StpMode,
    #[cfg_attr(feature = "serde", serde(default))]
    pub mst_region: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub mst_revision: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub mst_instances: Option<Vec<MstInstance>>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub vlan_enabled: bool,
}

/// Per-kind device configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeviceConfig {
    #[cfg_attr(feature = "serde", serde(rename = "host"))]
    Host(HostConfig),
    #[cfg_attr(feature = "serde", serde(rename = "router"))]
    Router(RouterConfig),
    #[cfg_attr(feature = "serde", serde(rename = "server"))]
    Server(ServerConfig),
    #[cfg_attr(feature = "serde", serde(rename = "l1_hub"))]
    Hub(HubConfig),
    #[cfg_attr(feature = "serde", serde(rename = "l2_switch"))]
    Switch(SwitchConfig),
}

impl DeviceConfig {
    /// Default configuration for a device kind.
    pub fn default_for(kind: DeviceKind) -> Self {
        match kind {
            DeviceKind::Host => DeviceConfig::Host(HostConfig::default()),
            DeviceKind::Router => DeviceConfig::Router(RouterConfig::default()),
            DeviceKind::Server => DeviceConfig::Server(ServerConfig::default()),
            DeviceKind::Hub => DeviceConfig::Hub(HubConfig::default()),
            DeviceKind::Switch => DeviceConfig::Switch(SwitchConfig::default()),
        }
    }

    /// Device kind this configuration belongs to.
    pub fn kind(&self) -> DeviceKind {
        match self {
            DeviceConfig::Host(_) => DeviceKind::Host,
            DeviceConfig::Router(_) => DeviceKind::Router,
            DeviceConfig::Server(_) => DeviceKind::Server,
            DeviceConfig::Hub(_) => DeviceKind::Hub,
            DeviceConfig::Switch(_) => DeviceKind::Switch,
        }
    }

    /// Switch settings, if this is a switch.
    pub fn as_switch(&self) -> Option<&SwitchConfig> {
        match self {
            DeviceConfig::Switch(cfg) => Some(cfg),
            _ => None,
        }
    }

    /// Default gateway for hosts and servers.
    pub fn default_gateway(&self) -> Option<Ipv4Addr> {
        match self {
            DeviceConfig::Host(cfg) => cfg.default_gateway,
            DeviceConfig::Server(cfg) => cfg.default_gateway,
            _ => None,
        }
    }
}
