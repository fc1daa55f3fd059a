//! Spanning tree mode and MST instances of a switch.
//!
//! Mode changes away from MSTP drop the region, revision and instances.
//! Entering MSTP creates the CIST when no instance exists. Instance ids stay
//! contiguous: removing one renumbers the rest to `1..=N`.

use std::collections::BTreeSet;

use topolab_topology::{MstInstance, Node, StpMode, SwitchConfig, VLAN_MAX, VLAN_MIN};

use crate::{switch_config, switch_config_mut, Rejection, Result};

/// Highest MST instance id.
pub const MAX_INSTANCE_ID: u8 = 64;

/// Highest bridge priority.
pub const MAX_PRIORITY: u32 = 61440;

/// Bridge priority granularity.
pub const PRIORITY_STEP: u32 = 4096;

fn require_mstp(cfg: &SwitchConfig) -> Result<()> {
    if cfg.stp != StpMode::Mstp {
        return Err(Rejection::NotMstp);
    }
    Ok(())
}

fn instance_mut(cfg: &mut SwitchConfig, id: u8) -> Result<&mut MstInstance> {
    require_mstp(cfg)?;
    cfg.mst_instances
        .iter_mut()
        .flatten()
        .find(|i| i.instance_id == id)
        .ok_or(Rejection::InstanceNotFound(id))
}

/// Current spanning tree mode.
pub fn mode(node: &Node) -> Result<StpMode> {
    Ok(switch_config(node)?.stp)
}

/// MST instances, empty outside MSTP.
pub fn instances(node: &Node) -> Result<&[MstInstance]> {
    Ok(switch_config(node)?.mst_instances.as_deref().unwrap_or(&[]))
}

/// Select the spanning tree mode.
pub fn set_mode(node: &mut Node, mode: StpMode) -> Result<()> {
    let cfg = switch_config_mut(node)?;
    cfg.stp = mode;
    if mode == StpMode::Mstp {
        let instances = cfg.mst_instances.get_or_insert_with(Vec::new);
        if instances.is_empty() {
            instances.push(MstInstance::cist());
        }
    } else {
        cfg.mst_region = None;
        cfg.mst_revision = None;
        cfg.mst_instances = None;
    }
    tracing::debug!(node = %node.id, ?mode, "stp mode set");
    Ok(())
}

/// Append an instance with the next id. Returns that id.
pub fn add_instance(node: &mut Node) -> Result<u8> {
    let cfg = switch_config_mut(node)?;
    require_mstp(cfg)?;
    let instances = cfg
        .mst_instances
        .get_or_insert_with(|| vec![MstInstance::cist()]);
    let last = instances.iter().map(|i| i.instance_id).max().unwrap_or(0);
    if last >= MAX_INSTANCE_ID {
        return Err(Rejection::InstanceLimit(MAX_INSTANCE_ID));
    }
    let id = last + 1;
    instances.push(MstInstance {
        instance_id: id,
        vlans: Vec::new(),
        priority: MstInstance::DEFAULT_PRIORITY,
    });
    Ok(id)
}

/// Remove a non-CIST instance and renumber the remaining ones.
pub fn remove_instance(node: &mut Node, id: u8) -> Result<()> {
    if id == MstInstance::CIST_ID {
        return Err(Rejection::CistPermanent);
    }
    let cfg = switch_config_mut(node)?;
    require_mstp(cfg)?;
    let instances = cfg
        .mst_instances
        .as_mut()
        .ok_or(Rejection::InstanceNotFound(id))?;
    let index = instances
        .iter()
        .position(|i| i.instance_id == id)
        .ok_or(Rejection::InstanceNotFound(id))?;
    instances.remove(index);

    let mut next = 1;
    for instance in instances.iter_mut().filter(|i| !i.is_cist()) {
        instance.instance_id = next;
        next += 1;
    }
    Ok(())
}

/// Parse VLAN range text such as `"1, 10, 20-30"`.
///
/// Tokens that are not an integer or an ascending `a-b` range are skipped, as
/// are ids outside 1-4094. The result is ascending and unique.
pub fn parse_vlan_ranges(text: &str) -> Vec<u16> {
    let valid = |v: u32| (u32::from(VLAN_MIN)..=u32::from(VLAN_MAX)).contains(&v);
    let mut set = BTreeSet::new();

    for token in text.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match token.split_once('-') {
            Some((lo, hi)) => {
                let (Ok(lo), Ok(hi)) = (lo.trim().parse::<u32>(), hi.trim().parse::<u32>()) else {
                    continue;
                };
                if lo > hi {
                    continue;
                }
                let lo = lo.max(u32::from(VLAN_MIN));
                let hi = hi.min(u32::from(VLAN_MAX));
                set.extend((lo..=hi).map(|v| v as u16));
            }
            None => {
                if let Ok(v) = token.parse::<u32>() {
                    if valid(v) {
                        set.insert(v as u16);
                    }
                }
            }
        }
    }
    set.into_iter().collect()
}

/// Replace an instance's VLAN set from range text.
pub fn set_instance_vlans(node: &mut Node, id: u8, text: &str) -> Result<()> {
    let vlans = parse_vlan_ranges(text);
    instance_mut(switch_config_mut(node)?, id)?.vlans = vlans;
    Ok(())
}

/// Set an instance's bridge priority.
pub fn set_instance_priority(node: &mut Node, id: u8, priority: u32) -> Result<()> {
    if priority > MAX_PRIORITY || priority % PRIORITY_STEP != 0 {
        return Err(Rejection::InvalidPriority(priority));
    }
    instance_mut(switch_config_mut(node)?, id)?.priority = priority as u16;
    Ok(())
}

/// Set the MST region name and revision.
pub fn set_region(node: &mut Node, name: &str, revision: u32) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Rejection::EmptyRegion);
    }
    let cfg = switch_config_mut(node)?;
    require_mstp(cfg)?;
    cfg.mst_region = Some(name.to_string());
    cfg.mst_revision = Some(revision);
    Ok(())
}
