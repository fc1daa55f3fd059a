//! Traffic steps from an emulation run, and the commands playback sends to
//! the renderer.

use serde::{Deserialize, Serialize};
use topolab_topology::{EdgeId, NodeId, Point};

/// One packet crossing one link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketEvent {
    pub id: String,
    /// Link the packet travels on
    pub path: EdgeId,
    /// Logical sender; decides the direction of travel
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default)]
    pub label: String,
}

/// Packets that are in flight at the same time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrafficStep(pub Vec<PacketEvent>);

impl TrafficStep {
    /// Packets of this step.
    pub fn packets(&self) -> &[PacketEvent] {
        &self.0
    }

    /// Whether the step carries no packets.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parse the JSON-encoded step list returned by a finished run.
pub fn parse_steps(json: &str) -> serde_json::Result<Vec<TrafficStep>> {
    serde_json::from_str(json)
}

/// Instructions for the graph renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderCommand {
    /// Create a hidden marker at `at`
    Spawn {
        marker: u64,
        packet: String,
        label: String,
        at: Point,
    },
    /// Reveal a marker
    Show { marker: u64 },
    /// Move a marker
    Move { marker: u64, at: Point },
    /// Delete a marker
    Remove { marker: u64 },
    /// Packets of a step are now scheduled
    StepStarted { step: usize, packets: usize },
    /// The last step completed
    Finished,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backend_step_list() {
        let json = r#"[
            [{"id": "p1", "path": "edge_3", "source": "host_1", "target": "l2sw_2", "label": "ARP"}],
            [],
            [{"id": "p2", "path": "edge_3", "source": "l2sw_2", "target": "host_1"}]
        ]"#;
        let steps = parse_steps(json).unwrap();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].packets()[0].path, EdgeId::new("edge_3"));
        assert_eq!(steps[0].packets()[0].label, "ARP");
        assert!(steps[1].is_empty());
        assert_eq!(steps[2].packets()[0].label, "");
    }

    #[test]
    fn malformed_step_list_is_an_error() {
        assert!(parse_steps("[[{\"id\": 1}]]").is_err());
        assert!(parse_steps("processing").is_err());
    }

    #[test]
    fn commands_are_tagged() {
        let json = serde_json::to_value(RenderCommand::Move {
            marker: 7,
            at: Point::new(1.0, 2.0),
        })
        .unwrap();
        assert_eq!(json["type"], "move");
        assert_eq!(json["marker"], 7);
        assert_eq!(json["at"]["x"], 1.0);

        let json = serde_json::to_value(RenderCommand::StepStarted { step: 2, packets: 3 }).unwrap();
        assert_eq!(json["type"], "step_started");
        assert_eq!(json["packets"], 3);
    }
}
