//! Topolab Protocols - Link-Layer Configuration Models
//!
//! Validated edits of the protocol settings stored on topology devices:
//!
//! - [`vlan`]: access/trunk assignment of switch ports
//! - [`vxlan`]: client and network-tunnel roles of router interfaces
//! - [`stp`]: spanning tree mode and MST instances of switches
//!
//! Every operation takes the device it edits as `&mut Node`. An operation
//! either applies completely or returns a [`Rejection`] and leaves the device
//! as it was.
//!
//! # Example
//!
//! ```
//! use topolab_protocols::{vlan, Rejection};
//! use topolab_topology::{DeviceKind, Point, Topology, VlanMode};
//!
//! let mut topo = Topology::new();
//! let sw = topo.add_node(DeviceKind::Switch, "core", Point::ORIGIN);
//! let host = topo.add_node(DeviceKind::Host, "pc", Point::new(100.0, 0.0));
//! topo.add_edge(&sw, &host).unwrap();
//!
//! let node = topo.node_mut(&sw).unwrap();
//! let port = node.interfaces[0].id.clone();
//! vlan::set_interface_vlan(node, &port, VlanMode::Trunk, "10, 20").unwrap();
//! assert!(vlan::is_configured(node));
//!
//! let err = vlan::set_interface_vlan(node, &port, VlanMode::Access, "4095").unwrap_err();
//! assert_eq!(err, Rejection::VlanOutOfRange(4095));
//! ```

mod error;
pub mod stp;
pub mod vlan;
pub mod vxlan;

pub use error::{Rejection, Result};
pub use vxlan::{ClientRow, TunnelRow, VxlanView};

use topolab_topology::{DeviceConfig, Node, RouterConfig, SwitchConfig};

/// Switch settings of `node`, or a rejection naming it.
pub(crate) fn switch_config(node: &Node) -> Result<&SwitchConfig> {
    match &node.config {
        DeviceConfig::Switch(cfg) => Ok(cfg),
        _ => Err(Rejection::NotSwitch(node.id.to_string())),
    }
}

/// Mutable switch settings of `node`, or a rejection naming it.
pub(crate) fn switch_config_mut(node: &mut Node) -> Result<&mut SwitchConfig> {
    match &mut node.config {
        DeviceConfig::Switch(cfg) => Ok(cfg),
        _ => Err(Rejection::NotSwitch(node.id.to_string())),
    }
}

/// Router settings of `node`, or a rejection naming it.
pub(crate) fn router_config(node: &Node) -> Result<&RouterConfig> {
    match &node.config {
        DeviceConfig::Router(cfg) => Ok(cfg),
        _ => Err(Rejection::NotRouter(node.id.to_string())),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use topolab_topology::DeviceKind;

    #[test]
    fn kind_checks_name_the_device() {
        let (mut topo, id) = fixture::device(DeviceKind::Host, 0);
        let node = topo.node_mut(&id).unwrap();
        assert_eq!(
            switch_config_mut(node).unwrap_err(),
            Rejection::NotSwitch(id.to_string())
        );
        assert_eq!(
            router_config(node).unwrap_err(),
            Rejection::NotRouter(id.to_string())
        );
    }
}
