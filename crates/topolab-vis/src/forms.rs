//! Device settings forms.
//!
//! [`form_for`] describes the editable fields of a device from its
//! [`DeviceConfig`] variant; [`apply_form`] writes submitted values back.
//! Submission is all-or-nothing: values are applied to a copy of the device,
//! which replaces the original only when every value was accepted. Values
//! equal to what the form currently shows are left alone.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use topolab_protocols::{stp, vlan};
use topolab_topology::{DeviceConfig, DeviceKind, Node, NodeId, StaticRoute, StpMode};

use crate::error::{Error, Result};

/// Input widget of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Ipv4,
    Number { min: i64, max: i64 },
    Select { options: Vec<SelectOption> },
    Checkbox,
}

/// One choice of a select field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// One editable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    /// Current value, empty when unset
    pub value: String,
}

impl FormField {
    fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        kind: FieldKind,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            value: value.into(),
        }
    }
}

/// Editable fields of one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    pub node: NodeId,
    pub kind: DeviceKind,
    pub fields: Vec<FormField>,
}

const STP_MODES: [(StpMode, &str); 4] = [
    (StpMode::Disabled, "Disabled"),
    (StpMode::Stp, "STP"),
    (StpMode::Rstp, "RSTP"),
    (StpMode::Mstp, "MSTP"),
];

fn text(value: Option<impl ToString>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Describe the editable fields of `node`.
pub fn form_for(node: &Node) -> Form {
    let mut fields = vec![FormField::new("label", "Name", FieldKind::Text, node.label.clone())];

    match &node.config {
        DeviceConfig::Host(_) | DeviceConfig::Server(_) => fields.push(FormField::new(
            "default_gateway",
            "Default gateway",
            FieldKind::Ipv4,
            text(node.config.default_gateway()),
        )),
        DeviceConfig::Switch(cfg) => {
            let options = STP_MODES
                .iter()
                .map(|(mode, label)| SelectOption {
                    value: u8::from(*mode).to_string(),
                    label: (*label).to_string(),
                })
                .collect();
            fields.push(FormField::new(
                "stp",
                "Spanning tree",
                FieldKind::Select { options },
                u8::from(cfg.stp).to_string(),
            ));
            fields.push(FormField::new(
                "vlan_enabled",
                "VLAN",
                FieldKind::Checkbox,
                cfg.vlan_enabled.to_string(),
            ));
            if cfg.stp == StpMode::Mstp {
                fields.push(FormField::new(
                    "mst_region",
                    "MST region",
                    FieldKind::Text,
                    text(cfg.mst_region.as_ref()),
                ));
                fields.push(FormField::new(
                    "mst_revision",
                    "MST revision",
                    FieldKind::Number { min: 0, max: 65535 },
                    text(cfg.mst_revision),
                ));
            }
        }
        DeviceConfig::Router(cfg) => fields.push(FormField::new(
            "routes",
            "Static routes",
            FieldKind::Text,
            format_routes(&cfg.routes),
        )),
        DeviceConfig::Hub(_) => {}
    }

    if node.kind().is_layer3() {
        for iface in &node.interfaces {
            fields.push(FormField::new(
                format!("{}.ip", iface.id),
                format!("{} IP address", iface.name),
                FieldKind::Ipv4,
                text(iface.ip),
            ));
            fields.push(FormField::new(
                format!("{}.netmask", iface.id),
                format!("{} netmask", iface.name),
                FieldKind::Ipv4,
                text(iface.netmask),
            ));
        }
    }

    Form {
        node: node.id.clone(),
        kind: node.kind(),
        fields,
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> Error {
    Error::InvalidField {
        field: field.to_string(),
        reason: reason.into(),
    }
}

/// Empty input clears the address.
fn optional_ip(field: &str, value: &str) -> Result<Option<Ipv4Addr>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| invalid(field, format!("'{value}' is not an IPv4 address")))
}

/// Routes as `destination/netmask via gateway`, separated by `;`.
fn format_routes(routes: &[StaticRoute]) -> String {
    routes
        .iter()
        .map(|r| format!("{}/{} via {}", r.destination, r.netmask, r.gateway))
        .collect::<Vec<_>>()
        .join("; ")
}

fn parse_routes(field: &str, value: &str) -> Result<Vec<StaticRoute>> {
    let address = |text: &str| -> Result<Ipv4Addr> {
        text.trim()
            .parse()
            .map_err(|_| invalid(field, format!("'{}' is not an IPv4 address", text.trim())))
    };
    value
        .split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (network, gateway) = entry
                .split_once(" via ")
                .ok_or_else(|| invalid(field, format!("'{entry}' is not 'network/mask via gateway'")))?;
            let (destination, netmask) = network
                .split_once('/')
                .ok_or_else(|| invalid(field, format!("'{network}' has no netmask")))?;
            Ok(StaticRoute {
                destination: address(destination)?,
                netmask: address(netmask)?,
                gateway: address(gateway)?,
            })
        })
        .collect()
}

fn apply_field(node: &mut Node, field: &str, value: &str) -> Result<()> {
    match field {
        "label" => {
            let label = value.trim();
            if label.is_empty() {
                return Err(invalid(field, "must not be empty"));
            }
            node.label = label.to_string();
        }
        "default_gateway" => {
            let gateway = optional_ip(field, value)?;
            match &mut node.config {
                DeviceConfig::Host(cfg) => cfg.default_gateway = gateway,
                DeviceConfig::Server(cfg) => cfg.default_gateway = gateway,
                _ => return Err(invalid(field, "not editable on this device")),
            }
        }
        "stp" => {
            let code: u8 = value
                .trim()
                .parse()
                .map_err(|_| invalid(field, format!("'{value}' is not a mode")))?;
            let mode = StpMode::try_from(code)?;
            stp::set_mode(node, mode)?;
        }
        "vlan_enabled" => {
            let enabled = match value.trim() {
                "true" | "on" | "1" => true,
                "false" | "off" | "0" | "" => false,
                other => return Err(invalid(field, format!("'{other}' is not a switch state"))),
            };
            vlan::set_vlan_enabled(node, enabled)?;
        }
        "routes" => {
            let routes = parse_routes(field, value)?;
            match &mut node.config {
                DeviceConfig::Router(cfg) => cfg.routes = routes,
                _ => return Err(invalid(field, "not editable on this device")),
            }
        }
        // Region and revision are applied together below.
        "mst_region" | "mst_revision" => {}
        other => {
            let (iface, attr) = other
                .rsplit_once('.')
                .ok_or_else(|| invalid(other, "unknown field"))?;
            let ip = optional_ip(other, value)?;
            let iface = node
                .interfaces
                .iter_mut()
                .find(|i| i.id.as_str() == iface)
                .ok_or_else(|| invalid(other, "unknown interface"))?;
            match attr {
                "ip" => iface.ip = ip,
                "netmask" => iface.netmask = ip,
                _ => return Err(invalid(other, "unknown field")),
            }
        }
    }
    Ok(())
}

/// Region and revision from the changed values, falling back to what the
/// switch already has.
fn apply_region(draft: &mut Node, changed: &BTreeMap<&str, &str>) -> Result<()> {
    let (region, revision) = (changed.get("mst_region"), changed.get("mst_revision"));
    if region.is_none() && revision.is_none() {
        return Ok(());
    }
    let current = draft.config.as_switch();
    let name = match region {
        Some(name) => name.to_string(),
        None => current
            .and_then(|cfg| cfg.mst_region.clone())
            .ok_or_else(|| invalid("mst_revision", "set an MST region first"))?,
    };
    let revision = match revision.map(|r| r.trim()) {
        Some("") => 0,
        Some(r) => r
            .parse()
            .map_err(|_| invalid("mst_revision", format!("'{r}' is not a revision number")))?,
        None => current.and_then(|cfg| cfg.mst_revision).unwrap_or(0),
    };
    stp::set_region(draft, &name, revision)?;
    Ok(())
}

/// Apply submitted form values to `node`.
///
/// Fields not present in `values`, or submitted with the value the form
/// shows, keep their current setting. On error the device is left untouched.
pub fn apply_form(node: &mut Node, values: &BTreeMap<String, String>) -> Result<()> {
    let shown: BTreeMap<String, String> = form_for(node)
        .fields
        .into_iter()
        .map(|f| (f.name, f.value))
        .collect();
    let changed: BTreeMap<&str, &str> = values
        .iter()
        .filter(|(field, value)| shown.get(*field) != Some(*value))
        .map(|(field, value)| (field.as_str(), value.as_str()))
        .collect();

    let mut draft = node.clone();

    // Mode first so that MSTP-only fields find the switch in MSTP.
    if let Some(value) = changed.get("stp") {
        apply_field(&mut draft, "stp", value)?;
    }
    for (field, value) in changed.iter().filter(|(f, _)| **f != "stp") {
        apply_field(&mut draft, field, value)?;
    }
    apply_region(&mut draft, &changed)?;

    tracing::debug!(node = %node.id, changed = changed.len(), "form applied");
    *node = draft;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use topolab_protocols::Rejection;
    use topolab_topology::{Point, Topology};

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn names(form: &Form) -> Vec<&str> {
        form.fields.iter().map(|f| f.name.as_str()).collect()
    }

    fn linked(kind: DeviceKind) -> (Topology, NodeId) {
        let mut topo = Topology::new();
        let dut = topo.add_node(kind, "dut", Point::ORIGIN);
        let peer = topo.add_node(DeviceKind::Hub, "hub", Point::new(50.0, 0.0));
        topo.add_edge(&dut, &peer).unwrap();
        (topo, dut)
    }

    #[test]
    fn host_form_lists_gateway_and_addresses() {
        let (topo, host) = linked(DeviceKind::Host);
        let form = form_for(topo.node(&host).unwrap());
        let iface = &topo.node(&host).unwrap().interfaces[0].id;
        assert_eq!(form.kind, DeviceKind::Host);
        assert_eq!(
            names(&form),
            vec![
                "label".to_string(),
                "default_gateway".to_string(),
                format!("{iface}.ip"),
                format!("{iface}.netmask"),
            ]
        );
    }

    #[test]
    fn switch_form_grows_mst_fields() {
        let (mut topo, sw) = linked(DeviceKind::Switch);
        assert_eq!(names(&form_for(topo.node(&sw).unwrap())), vec!["label", "stp", "vlan_enabled"]);

        stp::set_mode(topo.node_mut(&sw).unwrap(), StpMode::Mstp).unwrap();
        let form = form_for(topo.node(&sw).unwrap());
        assert_eq!(
            names(&form),
            vec!["label", "stp", "vlan_enabled", "mst_region", "mst_revision"]
        );
        assert_eq!(form.fields[1].value, "3");
    }

    #[test]
    fn hub_has_only_a_name() {
        let (topo, _) = linked(DeviceKind::Switch);
        let hub = topo.nodes().iter().find(|n| n.kind() == DeviceKind::Hub).unwrap();
        assert_eq!(names(&form_for(hub)), vec!["label"]);
    }

    #[test]
    fn apply_host_values() {
        let (mut topo, host) = linked(DeviceKind::Host);
        let iface = topo.node(&host).unwrap().interfaces[0].id.to_string();
        let (ip, mask) = (format!("{iface}.ip"), format!("{iface}.netmask"));
        let node = topo.node_mut(&host).unwrap();

        apply_form(
            node,
            &values(&[
                ("label", " web "),
                ("default_gateway", "10.0.0.1"),
                (ip.as_str(), "10.0.0.10"),
                (mask.as_str(), "255.255.255.0"),
            ]),
        )
        .unwrap();

        assert_eq!(node.label, "web");
        assert_eq!(node.config.default_gateway(), Some(Ipv4Addr::new(10, 0, 0, 1)));
        assert_eq!(node.interfaces[0].ip, Some(Ipv4Addr::new(10, 0, 0, 10)));

        apply_form(node, &values(&[("default_gateway", "")])).unwrap();
        assert_eq!(node.config.default_gateway(), None);
    }

    #[test]
    fn rejected_value_leaves_device_untouched() {
        let (mut topo, host) = linked(DeviceKind::Host);
        let node = topo.node_mut(&host).unwrap();
        let before = node.clone();

        let err = apply_form(
            node,
            &values(&[("label", "renamed"), ("default_gateway", "10.0.0.300")]),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidField { ref field, .. } if field == "default_gateway"));
        assert_eq!(*node, before);
    }

    #[test]
    fn mstp_region_applied_after_mode() {
        let (mut topo, sw) = linked(DeviceKind::Switch);
        let node = topo.node_mut(&sw).unwrap();

        apply_form(
            node,
            &values(&[("mst_region", "campus"), ("mst_revision", "7"), ("stp", "3")]),
        )
        .unwrap();

        let cfg = node.config.as_switch().unwrap();
        assert_eq!(cfg.stp, StpMode::Mstp);
        assert_eq!(cfg.mst_region.as_deref(), Some("campus"));
        assert_eq!(cfg.mst_revision, Some(7));
    }

    #[test]
    fn region_outside_mstp_is_rejected() {
        let (mut topo, sw) = linked(DeviceKind::Switch);
        let err = apply_form(topo.node_mut(&sw).unwrap(), &values(&[("mst_region", "campus")]))
            .unwrap_err();
        assert!(matches!(err, Error::Rejected(Rejection::NotMstp)));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let (mut topo, host) = linked(DeviceKind::Host);
        let node = topo.node_mut(&host).unwrap();
        assert!(apply_form(node, &values(&[("colour", "red")])).is_err());
        assert!(apply_form(node, &values(&[("nope_eth9.ip", "10.0.0.1")])).is_err());
        assert!(apply_form(node, &values(&[("stp", "9")])).is_err());
    }

    /// Values exactly as the form shows them, with `edits` applied on top.
    fn resubmit(node: &Node, edits: &[(&str, &str)]) -> BTreeMap<String, String> {
        let mut submitted: BTreeMap<String, String> = form_for(node)
            .fields
            .into_iter()
            .map(|f| (f.name, f.value))
            .collect();
        submitted.extend(edits.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        submitted
    }

    #[test]
    fn unchanged_switch_form_keeps_port_vlans() {
        let (mut topo, sw) = linked(DeviceKind::Switch);
        let node = topo.node_mut(&sw).unwrap();
        let port = node.interfaces[0].id.clone();
        vlan::set_interface_vlan(node, &port, topolab_topology::VlanMode::Access, "10").unwrap();
        assert!(!node.config.as_switch().unwrap().vlan_enabled);

        let submitted = resubmit(node, &[("label", "core")]);
        apply_form(node, &submitted).unwrap();

        assert_eq!(node.label, "core");
        assert!(vlan::is_configured(node));
    }

    #[test]
    fn fresh_mstp_switch_form_round_trips() {
        let (mut topo, sw) = linked(DeviceKind::Switch);
        let node = topo.node_mut(&sw).unwrap();
        stp::set_mode(node, StpMode::Mstp).unwrap();

        let submitted = resubmit(node, &[("label", "dist")]);
        apply_form(node, &submitted).unwrap();
        assert_eq!(node.label, "dist");
        assert_eq!(node.config.as_switch().unwrap().mst_region, None);

        let err = apply_form(node, &resubmit(node, &[("mst_revision", "4")])).unwrap_err();
        assert!(matches!(err, Error::InvalidField { ref field, .. } if field == "mst_revision"));
    }

    #[test]
    fn revision_alone_updates_existing_region() {
        let (mut topo, sw) = linked(DeviceKind::Switch);
        let node = topo.node_mut(&sw).unwrap();
        stp::set_mode(node, StpMode::Mstp).unwrap();
        stp::set_region(node, "campus", 1).unwrap();

        apply_form(node, &values(&[("mst_revision", "9")])).unwrap();
        let cfg = node.config.as_switch().unwrap();
        assert_eq!(cfg.mst_region.as_deref(), Some("campus"));
        assert_eq!(cfg.mst_revision, Some(9));
    }

    #[test]
    fn leaving_mstp_ignores_shown_region() {
        let (mut topo, sw) = linked(DeviceKind::Switch);
        let node = topo.node_mut(&sw).unwrap();
        stp::set_mode(node, StpMode::Mstp).unwrap();
        stp::set_region(node, "campus", 2).unwrap();

        apply_form(node, &resubmit(node, &[("stp", "2")])).unwrap();
        let cfg = node.config.as_switch().unwrap();
        assert_eq!(cfg.stp, StpMode::Rstp);
        assert_eq!(cfg.mst_region, None);
    }

    #[test]
    fn router_static_routes() {
        let (mut topo, router) = linked(DeviceKind::Router);
        let node = topo.node_mut(&router).unwrap();
        assert_eq!(form_for(node).fields[1].name, "routes");

        apply_form(
            node,
            &values(&[("routes", "10.1.0.0/255.255.0.0 via 10.0.0.1; 0.0.0.0/0.0.0.0 via 10.0.0.254;")]),
        )
        .unwrap();
        let DeviceConfig::Router(cfg) = &node.config else {
            panic!("router expected");
        };
        assert_eq!(cfg.routes.len(), 2);
        assert_eq!(cfg.routes[0].gateway, Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(
            form_for(node).fields[1].value,
            "10.1.0.0/255.255.0.0 via 10.0.0.1; 0.0.0.0/0.0.0.0 via 10.0.0.254"
        );

        let before = node.clone();
        assert!(apply_form(node, &values(&[("routes", "10.2.0.0 via 10.0.0.1")])).is_err());
        assert!(apply_form(node, &values(&[("routes", "10.2.0.0/255.0.0.0 to 10.0.0.1")])).is_err());
        assert_eq!(*node, before);

        apply_form(node, &values(&[("routes", "")])).unwrap();
        assert_eq!(form_for(node).fields[1].value, "");
    }
}
