//! The topology context: devices, links, jobs and the invariants tying them.
//!
//! A `Topology` is owned by one coordinating component and passed by reference
//! to whatever needs to read or edit it. Every structural edit keeps the
//! interface invariant: each device has exactly one interface per link that
//! touches it, and each interface names the link it is bound to.

use std::collections::HashSet;

use crate::device::DeviceKind;
use crate::edge::Edge;
use crate::error::{Error, Result};
use crate::ids::{EdgeId, InterfaceId, NodeId};
use crate::job::Job;
use crate::node::{Interface, Node};
use crate::point::Point;

/// Persisted form of a topology: `[nodes, edges, jobs]`.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TopologySnapshot(pub Vec<Node>, pub Vec<Edge>, pub Vec<Job>);

/// Devices and links of one emulation project.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    jobs: Vec<Job>,
    next_id: u64,
    revision: u64,
}

impl Topology {
    /// Create an empty topology.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a topology from its persisted form.
    ///
    /// Edges and jobs must reference existing devices. Interfaces bound to a
    /// link that does not touch their device are dropped, as are extra
    /// interfaces on the same link. Devices missing an interface for one of
    /// their links get one allocated.
    pub fn from_snapshot(snapshot: TopologySnapshot) -> Result<Self> {
        let TopologySnapshot(nodes, edges, jobs) = snapshot;
        let mut topology = Self::new();

        for node in nodes {
            topology.insert_node(node)?;
        }

        for edge in edges {
            if topology.edge(&edge.id).is_some() {
                return Err(Error::DuplicateEdge(edge.id.to_string()));
            }
            if edge.source == edge.target {
                return Err(Error::SelfLoop(edge.source.to_string()));
            }
            for end in [&edge.source, &edge.target] {
                if topology.node(end).is_none() {
                    return Err(Error::NodeNotFound(end.to_string()));
                }
            }
            topology.bump_ids(edge.id.as_str());
            topology.edges.push(edge);
        }

        let edges = &topology.edges;
        for node in &mut topology.nodes {
            let before = node.interfaces.len();
            let mut bound = HashSet::new();
            node.interfaces.retain(|i| {
                edges.iter().any(|e| e.id == i.connect && e.touches(&node.id))
                    && bound.insert(i.connect.clone())
            });
            let dropped = before - node.interfaces.len();
            if dropped > 0 {
                tracing::warn!(node = %node.id, dropped, "dropping interfaces without a link");
            }
        }

        let missing: Vec<(NodeId, EdgeId)> = topology
            .edges
            .iter()
            .flat_map(|e| [(e.source.clone(), e.id.clone()), (e.target.clone(), e.id.clone())])
            .filter(|(end, edge)| {
                topology
                    .node(end)
                    .is_some_and(|n| n.interface_on(edge).is_none())
            })
            .collect();
        for (end, edge) in missing {
            tracing::warn!(node = %end, %edge, "allocating missing interface");
            topology.allocate_interface(&end, &edge)?;
        }

        for job in &jobs {
            if topology.node(&job.host).is_none() {
                return Err(Error::NodeNotFound(job.host.to_string()));
            }
        }
        topology.jobs = jobs;
        topology.revision = 0;
        Ok(topology)
    }

    /// Persisted form of this topology.
    pub fn snapshot(&self) -> TopologySnapshot {
        TopologySnapshot(self.nodes.clone(), self.edges.clone(), self.jobs.clone())
    }

    /// Counter bumped by every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// All devices, in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All links, in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// All jobs.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Look up a device.
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Look up a device for mutation. Counts as a topology change.
    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        let node = self.nodes.iter_mut().find(|n| &n.id == id)?;
        self.revision += 1;
        Some(node)
    }

    /// Look up a device for mutation, failing when absent.
    pub fn require_node_mut(&mut self, id: &NodeId) -> Result<&mut Node> {
        self.node_mut(id)
            .ok_or_else(|| Error::NodeNotFound(id.to_string()))
    }

    /// Look up a link.
    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|e| &e.id == id)
    }

    /// Canvas positions of a link's drawn source and target.
    pub fn edge_endpoints(&self, id: &EdgeId) -> Option<(Point, Point)> {
        let edge = self.edge(id)?;
        let source = self.node(&edge.source)?.position;
        let target = self.node(&edge.target)?.position;
        Some((source, target))
    }

    /// Links touching a device.
    pub fn edges_of<'a>(&'a self, node: &'a NodeId) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.touches(node))
    }

    /// Place a new device with a generated id.
    pub fn add_node(&mut self, kind: DeviceKind, label: impl Into<String>, position: Point) -> NodeId {
        let id = NodeId::new(format!("{}_{}", kind.id_prefix(), self.fresh_id()));
        self.nodes.push(Node::new(id.clone(), kind, label, position));
        self.revision += 1;
        tracing::debug!(node = %id, %kind, "node added");
        id
    }

    /// Insert a fully built device, keeping its id.
    pub fn insert_node(&mut self, node: Node) -> Result<()> {
        if self.node(&node.id).is_some() {
            return Err(Error::DuplicateNode(node.id.to_string()));
        }
        self.bump_ids(node.id.as_str());
        self.nodes.push(node);
        self.revision += 1;
        Ok(())
    }

    /// Move a device on the canvas.
    pub fn set_position(&mut self, id: &NodeId, position: Point) -> Result<()> {
        self.require_node_mut(id)?.position = position;
        Ok(())
    }

    /// Connect two devices, allocating one interface on each.
    pub fn add_edge(&mut self, source: &NodeId, target: &NodeId) -> Result<EdgeId> {
        if source == target {
            return Err(Error::SelfLoop(source.to_string()));
        }
        for end in [source, target] {
            if self.node(end).is_none() {
                return Err(Error::NodeNotFound(end.to_string()));
            }
        }

        let id = EdgeId::new(format!("edge_{}", self.fresh_id()));
        self.allocate_interface(source, &id)?;
        self.allocate_interface(target, &id)?;
        self.edges.push(Edge::new(id.clone(), source.clone(), target.clone()));
        self.revision += 1;
        tracing::debug!(edge = %id, %source, %target, "edge added");
        Ok(id)
    }

    /// Set link impairments in percent.
    pub fn set_impairment(&mut self, id: &EdgeId, loss: f64, duplicate: f64) -> Result<()> {
        let edge = self
            .edges
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or_else(|| Error::EdgeNotFound(id.to_string()))?;
        edge.loss_percentage = loss.clamp(0.0, 100.0);
        edge.duplicate_percentage = duplicate.clamp(0.0, 100.0);
        self.revision += 1;
        Ok(())
    }

    /// Remove a link and the interfaces bound to it.
    pub fn remove_edge(&mut self, id: &EdgeId) -> Result<Edge> {
        let index = self
            .edges
            .iter()
            .position(|e| &e.id == id)
            .ok_or_else(|| Error::EdgeNotFound(id.to_string()))?;
        let edge = self.edges.remove(index);

        for end in [&edge.source, &edge.target] {
            match self.nodes.iter_mut().find(|n| &n.id == end) {
                Some(node) => node.interfaces.retain(|i| i.connect != edge.id),
                None => tracing::warn!(node = %end, edge = %edge.id, "edge endpoint missing"),
            }
        }

        self.revision += 1;
        Ok(edge)
    }

    /// Remove a device, its links, the peers' interfaces for those links, and
    /// the jobs bound to it.
    pub fn remove_node(&mut self, id: &NodeId) -> Result<Node> {
        let index = self
            .nodes
            .iter()
            .position(|n| &n.id == id)
            .ok_or_else(|| Error::NodeNotFound(id.to_string()))?;

        let touching: Vec<EdgeId> = self.edges_of(id).map(|e| e.id.clone()).collect();
        for edge in &touching {
            self.remove_edge(edge)?;
        }

        self.jobs.retain(|j| &j.host != id);
        let node = self.nodes.remove(index);
        self.revision += 1;
        tracing::debug!(node = %id, edges = touching.len(), "node removed");
        Ok(node)
    }

    /// Attach a job to a host.
    pub fn add_job(&mut self, job: Job) -> Result<()> {
        if self.node(&job.host).is_none() {
            return Err(Error::NodeNotFound(job.host.to_string()));
        }
        self.jobs.push(job);
        self.revision += 1;
        Ok(())
    }

    /// Drop a job by id. Returns whether anything was removed.
    pub fn remove_job(&mut self, id: &str) -> bool {
        let before = self.jobs.len();
        self.jobs.retain(|j| j.id != id);
        let removed = self.jobs.len() != before;
        if removed {
            self.revision += 1;
        }
        removed
    }

    /// Bind a new interface on `node` to `edge` using the lowest free port.
    fn allocate_interface(&mut self, node: &NodeId, edge: &EdgeId) -> Result<InterfaceId> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| &n.id == node)
            .ok_or_else(|| Error::NodeNotFound(node.to_string()))?;

        let prefix = node.kind().port_prefix();
        let used: HashSet<u32> = node
            .interfaces
            .iter()
            .filter_map(|i| i.name.strip_prefix(prefix)?.parse().ok())
            .collect();
        let port = (0u32..).find(|p| !used.contains(p)).unwrap_or_default();

        let name = format!("{prefix}{port}");
        let id = InterfaceId::new(format!("{}_{}", node.id, name));
        node.interfaces.push(Interface::new(id.clone(), name, edge.clone()));
        Ok(id)
    }

    fn fresh_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Keep generated ids clear of numeric suffixes already in use.
    fn bump_ids(&mut self, id: &str) {
        if let Some(n) = id.rsplit('_').next().and_then(|s| s.parse::<u64>().ok()) {
            self.next_id = self.next_id.max(n);
        }
    }
}
