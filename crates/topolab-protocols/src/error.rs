//! Rejection reasons for topolab-protocols.

use thiserror::Error;

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, Rejection>;

/// Why a configuration change was refused. The device is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Missing device or interface.
    #[error(transparent)]
    Topology(#[from] topolab_topology::Error),

    /// The operation needs a switch.
    #[error("{0} is not a switch")]
    NotSwitch(String),

    /// The operation needs a router.
    #[error("{0} is not a router")]
    NotRouter(String),

    /// VLAN text that is not an integer.
    #[error("invalid VLAN id: {0:?}")]
    InvalidVlan(String),

    /// VLAN id outside 1-4094.
    #[error("VLAN id {0} is out of range (1-4094)")]
    VlanOutOfRange(i64),

    /// Trunk with no VLANs.
    #[error("trunk needs at least one VLAN id")]
    EmptyTrunk,

    /// VNI text that is not an integer.
    #[error("invalid VNI: {0:?}")]
    InvalidVni(String),

    /// VNI outside 1-16777214.
    #[error("VNI {0} is out of range (1-16777214)")]
    VniOutOfRange(i64),

    /// Remote address that is not dotted IPv4.
    #[error("invalid IPv4 address: {0:?}")]
    InvalidIp(String),

    /// The interface is taken by the other VXLAN role.
    #[error("interface already used as network endpoint")]
    EndpointInUse,

    /// Client requested on an interface that already has a VXLAN role.
    #[error("interface already configured")]
    AlreadyConfigured,

    /// The (VNI, remote) pair exists somewhere on the device.
    #[error("tunnel entry VNI {vni} to {remote} already exists on this device")]
    DuplicateTunnel { vni: u32, remote: std::net::Ipv4Addr },

    /// Interface is not a VXLAN client.
    #[error("interface is not a VXLAN client")]
    NotClient,

    /// No such tunnel entry on the interface.
    #[error("no tunnel entry VNI {vni} to {remote} on this interface")]
    TunnelEntryNotFound { vni: u32, remote: std::net::Ipv4Addr },

    /// Instance operations need MSTP mode.
    #[error("switch is not running MSTP")]
    NotMstp,

    /// Instance 0 is permanent.
    #[error("the CIST (instance 0) cannot be removed")]
    CistPermanent,

    /// No instance with this id.
    #[error("MST instance {0} not found")]
    InstanceNotFound(u8),

    /// Instance ids are exhausted.
    #[error("at most {0} MST instances are supported")]
    InstanceLimit(u8),

    /// Bridge priority not in 0-61440 or not a multiple of 4096.
    #[error("bridge priority {0} must be 0-61440 in steps of 4096")]
    InvalidPriority(u32),

    /// Empty MST region name.
    #[error("MST region name cannot be empty")]
    EmptyRegion,
}
