use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::serde_lenient;

/// Node identifiers the dashboard always offers, even before the backend has
/// reported anything.
pub const DEFAULT_NODE_IDS: [&str; 5] = ["node0", "node1", "node2", "node3", "node4"];

/// Operational phase of the sensor network's escalation pipeline.
#[derive(
    Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd, Serialize, Deserialize,
)]
#[serde(from = "u8", into = "u8")]
pub enum Stage {
    /// Baseline ground sensing.
    #[default]
    Stage1,
    /// Aerostat deployment.
    Stage2,
    /// Drone deployment.
    Stage3,
}

impl Stage {
    /// Wire representation.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Stage1 => 1,
            Self::Stage2 => 2,
            Self::Stage3 => 3,
        }
    }

    /// Decode the wire representation; unknown values collapse to baseline.
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            2 => Self::Stage2,
            3 => Self::Stage3,
            _ => Self::Stage1,
        }
    }
}

impl From<u8> for Stage {
    fn from(value: u8) -> Self {
        Self::from_u8(value)
    }
}

impl From<Stage> for u8 {
    fn from(value: Stage) -> Self {
        value.as_u8()
    }
}

/// One sensor node's latest reading. Immutable once received; the whole
/// table is replaced on each refresh.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct NodeSnapshot {
    /// Identifier echoed by some producers inside the snapshot body.
    #[serde(default)]
    pub node_id: Option<String>,
    /// Degrees Celsius.
    #[serde(default, deserialize_with = "serde_lenient::option_f64")]
    pub temperature: Option<f64>,
    /// Hectopascals.
    #[serde(default, deserialize_with = "serde_lenient::option_f64")]
    pub pressure: Option<f64>,
    /// Relative humidity percentage.
    #[serde(default, deserialize_with = "serde_lenient::option_f64")]
    pub humidity: Option<f64>,
    /// Accumulated rainfall, millimetres.
    #[serde(default, deserialize_with = "serde_lenient::option_f64")]
    pub rainfall_mm: Option<f64>,
    /// Kilometres per hour.
    #[serde(default, deserialize_with = "serde_lenient::option_f64")]
    pub wind_speed: Option<f64>,
    /// Escalation stage the node reports itself in.
    #[serde(default, deserialize_with = "serde_lenient::option_stage")]
    pub stage: Option<Stage>,
    /// Free-form alert level string ("NORMAL" in the quiet case).
    #[serde(default)]
    pub alert: Option<String>,
    /// Pre-computed per-node risk score, 0-100.
    #[serde(default, deserialize_with = "serde_lenient::option_f64")]
    pub risk: Option<f64>,
    /// Producer-side timestamp of the snapshot.
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Mapping from node identifier to its latest snapshot. `BTreeMap` keeps the
/// key order stable for display.
pub type HardwareTable = BTreeMap<String, NodeSnapshot>;

/// Every identifier present in the table plus the guaranteed defaults,
/// deduplicated and sorted.
#[must_use]
pub fn known_nodes(table: &HardwareTable) -> Vec<String> {
    let mut ids: BTreeSet<String> = table.keys().cloned().collect();
    for id in DEFAULT_NODE_IDS {
        ids.insert(id.to_string());
    }
    ids.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_tolerates_mixed_wire_types() {
        let snapshot: NodeSnapshot = serde_json::from_value(serde_json::json!({
            "temperature": "27.4",
            "pressure": 1008.2,
            "humidity": null,
            "stage": 2,
            "risk": "bad",
            "alert": "NORMAL"
        }))
        .unwrap();

        assert_eq!(snapshot.temperature, Some(27.4));
        assert_eq!(snapshot.pressure, Some(1008.2));
        assert_eq!(snapshot.humidity, None);
        assert_eq!(snapshot.stage, Some(Stage::Stage2));
        assert_eq!(snapshot.risk, None);
        assert_eq!(snapshot.wind_speed, None);
    }

    #[test]
    fn unknown_stage_collapses_to_baseline() {
        assert_eq!(Stage::from_u8(0), Stage::Stage1);
        assert_eq!(Stage::from_u8(7), Stage::Stage1);
    }

    #[test]
    fn known_nodes_unions_defaults_and_sorts() {
        let mut table = HardwareTable::new();
        table.insert("node7".to_string(), NodeSnapshot::default());
        table.insert("node0".to_string(), NodeSnapshot::default());

        let nodes = known_nodes(&table);
        assert_eq!(
            nodes,
            vec!["node0", "node1", "node2", "node3", "node4", "node7"]
        );
    }

    #[test]
    fn known_nodes_of_empty_table_is_the_default_set() {
        assert_eq!(known_nodes(&HardwareTable::new()), DEFAULT_NODE_IDS);
    }
}
