use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::serde_lenient;

/// One record produced by the prediction pipeline.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct PredictionRecord {
    /// Producer timestamp.
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Node the prediction applies to.
    #[serde(default)]
    pub node_id: Option<String>,
    /// Escalation stage the model ran against.
    #[serde(default)]
    pub stage_used: Option<u8>,
    /// Risk score, 0-100. Kept loosely typed; producers emit numbers and
    /// numeric strings interchangeably.
    #[serde(default)]
    pub risk_score: Option<Value>,
    /// Producer-side label (informational only, the tier is re-derived).
    #[serde(default)]
    pub risk_level: Option<String>,
}

impl PredictionRecord {
    /// The record's score, if it parses as a number.
    #[must_use]
    pub fn score(&self) -> Option<f64> {
        self.risk_score.as_ref().and_then(serde_lenient::as_f64)
    }
}

/// One entry of the prediction batch: a single record, or a block of
/// per-sensor records whose scores are averaged.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PredictionEntry {
    /// A block of per-sensor records.
    Block(Vec<PredictionRecord>),
    /// A lone record.
    Single(PredictionRecord),
}

impl PredictionEntry {
    /// Resolve the entry to one score. Blocks average the members whose
    /// scores parse as numbers, ignoring the rest; `None` when nothing
    /// parses.
    #[must_use]
    pub fn score(&self) -> Option<f64> {
        match self {
            Self::Block(records) => {
                let scores: Vec<f64> =
                    records.iter().filter_map(PredictionRecord::score).collect();
                if scores.is_empty() {
                    None
                } else {
                    #[allow(clippy::cast_precision_loss)]
                    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
                    Some(mean)
                }
            }
            Self::Single(record) => record.score(),
        }
    }
}

/// Ordered sequence of prediction entries; only the most recent entry is
/// consumed per refresh cycle.
pub type PredictionBatch = Vec<PredictionEntry>;
