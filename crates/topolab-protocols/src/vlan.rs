//! VLAN assignment of switch ports.
//!
//! An Access port carries one VLAN id, a Trunk port a list. Ids must lie in
//! 1-4094. A port counts as configured only when both the id(s) and the mode
//! are set.

use topolab_topology::{InterfaceId, Node, VlanMode, VlanTag, VLAN_MAX, VLAN_MIN};

use crate::{switch_config, switch_config_mut, Rejection, Result};

fn parse_vlan_id(token: &str) -> Result<u16> {
    let value: i64 = token
        .parse()
        .map_err(|_| Rejection::InvalidVlan(token.to_string()))?;
    if value < i64::from(VLAN_MIN) || value > i64::from(VLAN_MAX) {
        return Err(Rejection::VlanOutOfRange(value));
    }
    Ok(value as u16)
}

/// Parse form input for `mode`.
///
/// Access takes a single integer. Trunk takes integers separated by commas
/// or whitespace; the result is ascending and unique.
pub fn parse_vlan_input(mode: VlanMode, input: &str) -> Result<VlanTag> {
    match mode {
        VlanMode::Access => parse_vlan_id(input.trim()).map(VlanTag::Single),
        VlanMode::Trunk => {
            let mut ids = input
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|t| !t.is_empty())
                .map(parse_vlan_id)
                .collect::<Result<Vec<_>>>()?;
            if ids.is_empty() {
                return Err(Rejection::EmptyTrunk);
            }
            ids.sort_unstable();
            ids.dedup();
            Ok(VlanTag::List(ids))
        }
    }
}

/// Assign `mode` and the VLAN id(s) in `input` to a switch port.
pub fn set_interface_vlan(
    node: &mut Node,
    iface: &InterfaceId,
    mode: VlanMode,
    input: &str,
) -> Result<()> {
    switch_config(node)?;
    let tag = parse_vlan_input(mode, input)?;
    let interface = node.require_interface_mut(iface)?;
    tracing::debug!(interface = %iface, ?mode, vlans = ?tag.ids(), "vlan assigned");
    interface.vlan = Some(tag);
    interface.type_connection = Some(mode);
    Ok(())
}

/// Remove one port's VLAN assignment.
pub fn clear_interface_vlan(node: &mut Node, iface: &InterfaceId) -> Result<()> {
    switch_config(node)?;
    node.require_interface_mut(iface)?.clear_vlan();
    Ok(())
}

/// Whether any port of the device has a complete VLAN assignment.
pub fn is_configured(node: &Node) -> bool {
    node.interfaces.iter().any(|i| i.is_vlan_configured())
}

/// Clear the VLAN assignment of every port.
pub fn reset(node: &mut Node) {
    for interface in &mut node.interfaces {
        interface.clear_vlan();
    }
}

/// Toggle the switch-level VLAN feature. Turning it off clears every port.
pub fn set_vlan_enabled(node: &mut Node, enabled: bool) -> Result<()> {
    let cfg = switch_config_mut(node)?;
    let was_enabled = std::mem::replace(&mut cfg.vlan_enabled, enabled);
    if was_enabled && !enabled {
        reset(node);
    }
    tracing::debug!(node = %node.id, enabled, "vlan feature toggled");
    Ok(())
}
