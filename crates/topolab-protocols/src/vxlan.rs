//! VXLAN roles of router interfaces.
//!
//! An interface is untouched, a client (one VNI) or a network tunnel (a list
//! of unique VNI/remote pairs), never two at once. Removing the last tunnel
//! entry keeps the tunnel role with an empty list.

use std::net::Ipv4Addr;

use serde::Serialize;
use topolab_topology::{Interface, InterfaceId, Node, VxlanRole, VNI_MAX, VNI_MIN};

use crate::{router_config, Rejection, Result};

/// Parse VNI form input.
pub fn parse_vni(input: &str) -> Result<u32> {
    let trimmed = input.trim();
    let value: i64 = trimmed
        .parse()
        .map_err(|_| Rejection::InvalidVni(trimmed.to_string()))?;
    if value < i64::from(VNI_MIN) || value > i64::from(VNI_MAX) {
        return Err(Rejection::VniOutOfRange(value));
    }
    Ok(value as u32)
}

/// Parse a dotted IPv4 remote address.
pub fn parse_remote(input: &str) -> Result<Ipv4Addr> {
    let trimmed = input.trim();
    trimmed
        .parse()
        .map_err(|_| Rejection::InvalidIp(trimmed.to_string()))
}

fn interface<'a>(node: &'a Node, iface: &InterfaceId) -> Result<&'a Interface> {
    node.interface(iface).ok_or_else(|| {
        topolab_topology::Error::InterfaceNotFound {
            node: node.id.to_string(),
            interface: iface.to_string(),
        }
        .into()
    })
}

/// Make `iface` a client of `vni`.
pub fn add_client(node: &mut Node, iface: &InterfaceId, vni: &str) -> Result<()> {
    router_config(node)?;
    let vni = parse_vni(vni)?;
    match interface(node, iface)?.vxlan_connection_type {
        Some(VxlanRole::NetworkTunnel) => return Err(Rejection::EndpointInUse),
        Some(VxlanRole::Client) => return Err(Rejection::AlreadyConfigured),
        None => {}
    }

    let interface = node.require_interface_mut(iface)?;
    interface.vxlan_connection_type = Some(VxlanRole::Client);
    interface.vxlan_vni = Some(vni);
    interface.vxlan_vni_to_target_ip = None;
    tracing::debug!(interface = %iface, vni, "vxlan client added");
    Ok(())
}

/// Add a tunnel entry towards `remote` for `vni` on `iface`.
pub fn add_tunnel(node: &mut Node, iface: &InterfaceId, vni: &str, remote: &str) -> Result<()> {
    router_config(node)?;
    let vni = parse_vni(vni)?;
    let remote = parse_remote(remote)?;
    if interface(node, iface)?.vxlan_connection_type == Some(VxlanRole::Client) {
        return Err(Rejection::EndpointInUse);
    }
    let duplicate = node
        .interfaces
        .iter()
        .flat_map(|i| i.tunnel_entries())
        .any(|&entry| entry == (vni, remote));
    if duplicate {
        return Err(Rejection::DuplicateTunnel { vni, remote });
    }

    let interface = node.require_interface_mut(iface)?;
    interface.vxlan_connection_type = Some(VxlanRole::NetworkTunnel);
    interface.vxlan_vni = None;
    interface
        .vxlan_vni_to_target_ip
        .get_or_insert_with(Vec::new)
        .push((vni, remote));
    tracing::debug!(interface = %iface, vni, %remote, "vxlan tunnel entry added");
    Ok(())
}

/// Drop the client role of `iface`.
pub fn remove_client(node: &mut Node, iface: &InterfaceId) -> Result<()> {
    router_config(node)?;
    let interface = node.require_interface_mut(iface)?;
    if interface.vxlan_connection_type != Some(VxlanRole::Client) {
        return Err(Rejection::NotClient);
    }
    interface.clear_vxlan();
    Ok(())
}

/// Remove one tunnel entry of `iface`.
pub fn remove_tunnel_entry(
    node: &mut Node,
    iface: &InterfaceId,
    vni: u32,
    remote: Ipv4Addr,
) -> Result<()> {
    router_config(node)?;
    let interface = node.require_interface_mut(iface)?;
    let entries = interface
        .vxlan_vni_to_target_ip
        .as_mut()
        .ok_or(Rejection::TunnelEntryNotFound { vni, remote })?;
    let index = entries
        .iter()
        .position(|&entry| entry == (vni, remote))
        .ok_or(Rejection::TunnelEntryNotFound { vni, remote })?;
    entries.remove(index);
    Ok(())
}

/// One client interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientRow {
    pub interface: InterfaceId,
    pub name: String,
    pub vni: u32,
}

/// One tunnel entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TunnelRow {
    pub interface: InterfaceId,
    pub name: String,
    pub vni: u32,
    pub remote: Ipv4Addr,
}

/// VXLAN state of a router as the configuration dialog shows it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VxlanView {
    /// Any interface has a role
    pub configured: bool,
    /// Interfaces that may become clients
    pub client_candidates: Vec<InterfaceId>,
    /// Interfaces that may take tunnel entries
    pub tunnel_candidates: Vec<InterfaceId>,
    pub clients: Vec<ClientRow>,
    pub tunnels: Vec<TunnelRow>,
}

impl VxlanView {
    /// Derive the view of a router.
    pub fn of(node: &Node) -> Result<Self> {
        router_config(node)?;
        let mut view = Self::default();
        for interface in &node.interfaces {
            match interface.vxlan_connection_type {
                None => {
                    view.client_candidates.push(interface.id.clone());
                    view.tunnel_candidates.push(interface.id.clone());
                }
                Some(VxlanRole::Client) => {
                    view.configured = true;
                    if let Some(vni) = interface.vxlan_vni {
                        view.clients.push(ClientRow {
                            interface: interface.id.clone(),
                            name: interface.name.clone(),
                            vni,
                        });
                    }
                }
                Some(VxlanRole::NetworkTunnel) => {
                    view.configured = true;
                    view.tunnel_candidates.push(interface.id.clone());
                    view.tunnels
                        .extend(interface.tunnel_entries().iter().map(|&(vni, remote)| TunnelRow {
                            interface: interface.id.clone(),
                            name: interface.name.clone(),
                            vni,
                            remote,
                        }));
                }
            }
        }
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{device, port};
    use topolab_topology::DeviceKind;

    fn ip(s: &str) -> Ipv4Addr {
        s.parse().unwrap()
    }

    #[test]
    fn client_then_tunnel_is_rejected() {
        let (mut topo, id) = device(DeviceKind::Router, 2);
        let node = topo.node_mut(&id).unwrap();
        let p = port(node, 0);

        add_client(node, &p, "100").unwrap();
        assert_eq!(node.interfaces[0].vxlan_vni, Some(100));
        assert_eq!(node.interfaces[0].vxlan_connection_type, Some(VxlanRole::Client));

        let before = node.clone();
        let err = add_tunnel(node, &p, "200", "10.0.0.1").unwrap_err();
        assert_eq!(err, Rejection::EndpointInUse);
        assert_eq!(err.to_string(), "interface already used as network endpoint");
        assert_eq!(*node, before);
    }

    #[test]
    fn tunnel_then_client_is_rejected() {
        let (mut topo, id) = device(DeviceKind::Router, 1);
        let node = topo.node_mut(&id).unwrap();
        let p = port(node, 0);

        add_tunnel(node, &p, "200", "10.0.0.1").unwrap();
        assert_eq!(add_client(node, &p, "100"), Err(Rejection::EndpointInUse));
        assert_eq!(
            add_client(node, &p, "100").unwrap_err().to_string(),
            "interface already used as network endpoint"
        );
    }

    #[test]
    fn second_client_is_already_configured() {
        let (mut topo, id) = device(DeviceKind::Router, 1);
        let node = topo.node_mut(&id).unwrap();
        let p = port(node, 0);
        add_client(node, &p, "100").unwrap();
        assert_eq!(add_client(node, &p, "101"), Err(Rejection::AlreadyConfigured));
        assert_eq!(node.interfaces[0].vxlan_vni, Some(100));
    }

    #[test]
    fn duplicate_pair_rejected_across_interfaces() {
        let (mut topo, id) = device(DeviceKind::Router, 2);
        let node = topo.node_mut(&id).unwrap();
        let (a, b) = (port(node, 0), port(node, 1));

        add_tunnel(node, &a, "200", "10.0.0.1").unwrap();
        assert_eq!(
            add_tunnel(node, &a, "200", "10.0.0.1"),
            Err(Rejection::DuplicateTunnel { vni: 200, remote: ip("10.0.0.1") })
        );
        assert_eq!(
            add_tunnel(node, &b, "200", "10.0.0.1"),
            Err(Rejection::DuplicateTunnel { vni: 200, remote: ip("10.0.0.1") })
        );

        add_tunnel(node, &a, "200", "10.0.0.2").unwrap();
        add_tunnel(node, &b, "201", "10.0.0.1").unwrap();
        assert_eq!(node.interfaces[0].tunnel_entries().len(), 2);
        assert_eq!(node.interfaces[1].tunnel_entries(), &[(201, ip("10.0.0.1"))]);
    }

    #[test]
    fn input_validation() {
        let (mut topo, id) = device(DeviceKind::Router, 1);
        let node = topo.node_mut(&id).unwrap();
        let p = port(node, 0);

        assert_eq!(add_client(node, &p, "0"), Err(Rejection::VniOutOfRange(0)));
        assert_eq!(
            add_client(node, &p, "16777215"),
            Err(Rejection::VniOutOfRange(16_777_215))
        );
        assert_eq!(add_client(node, &p, "x"), Err(Rejection::InvalidVni("x".into())));
        assert_eq!(
            add_tunnel(node, &p, "5", "10.0.0"),
            Err(Rejection::InvalidIp("10.0.0".into()))
        );
        assert_eq!(
            add_tunnel(node, &p, "5", "300.0.0.1"),
            Err(Rejection::InvalidIp("300.0.0.1".into()))
        );
        add_client(node, &p, "16777214").unwrap();
    }

    #[test]
    fn removing_last_entry_keeps_tunnel_role() {
        let (mut topo, id) = device(DeviceKind::Router, 1);
        let node = topo.node_mut(&id).unwrap();
        let p = port(node, 0);

        add_tunnel(node, &p, "7", "192.0.2.9").unwrap();
        remove_tunnel_entry(node, &p, 7, ip("192.0.2.9")).unwrap();
        let iface = &node.interfaces[0];
        assert_eq!(iface.vxlan_connection_type, Some(VxlanRole::NetworkTunnel));
        assert_eq!(iface.vxlan_vni_to_target_ip, Some(vec![]));

        assert_eq!(
            remove_tunnel_entry(node, &p, 7, ip("192.0.2.9")),
            Err(Rejection::TunnelEntryNotFound { vni: 7, remote: ip("192.0.2.9") })
        );
    }

    #[test]
    fn remove_client_clears_role() {
        let (mut topo, id) = device(DeviceKind::Router, 1);
        let node = topo.node_mut(&id).unwrap();
        let p = port(node, 0);

        assert_eq!(remove_client(node, &p), Err(Rejection::NotClient));
        add_client(node, &p, "9").unwrap();
        remove_client(node, &p).unwrap();
        assert_eq!(node.interfaces[0].vxlan_connection_type, None);
        assert_eq!(node.interfaces[0].vxlan_vni, None);
        add_tunnel(node, &p, "9", "10.1.1.1").unwrap();
    }

    #[test]
    fn switches_have_no_vxlan() {
        let (mut topo, id) = device(DeviceKind::Switch, 1);
        let node = topo.node_mut(&id).unwrap();
        let p = port(node, 0);
        assert_eq!(add_client(node, &p, "1"), Err(Rejection::NotRouter(id.to_string())));
        assert!(VxlanView::of(node).is_err());
    }

    #[test]
    fn view_partitions_interfaces() {
        let (mut topo, id) = device(DeviceKind::Router, 3);
        let node = topo.node_mut(&id).unwrap();
        let (a, b, c) = (port(node, 0), port(node, 1), port(node, 2));

        let empty = VxlanView::of(node).unwrap();
        assert!(!empty.configured);
        assert_eq!(empty.client_candidates.len(), 3);

        add_client(node, &a, "10").unwrap();
        add_tunnel(node, &b, "10", "10.0.0.2").unwrap();
        let view = VxlanView::of(node).unwrap();
        assert!(view.configured);
        assert_eq!(view.client_candidates, vec![c.clone()]);
        assert_eq!(view.tunnel_candidates, vec![b.clone(), c]);
        assert_eq!(view.clients[0].vni, 10);
        assert_eq!(view.tunnels[0].remote, ip("10.0.0.2"));

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["tunnels"][0]["interface"], b.as_str());
    }
}
