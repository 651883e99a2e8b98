use serde::{Deserialize, Serialize};

/// Named subsystem a deploy command targets.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployTarget {
    /// Stage-2 tethered aerostat.
    Aerostat,
    /// Stage-3 drone squadron.
    Drone,
}

impl DeployTarget {
    /// Wire name of the subsystem.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aerostat => "aerostat",
            Self::Drone => "drone",
        }
    }
}

/// Direction of a deploy command.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployAction {
    /// Bring the subsystem up.
    Deploy,
    /// Stand it down.
    Reset,
}

/// Body of `POST deploy`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DeployRequest {
    /// Subsystem to act on.
    pub what: DeployTarget,
    /// Direction.
    pub action: DeployAction,
    /// Originator tag logged by the backend.
    pub by: String,
}

/// Body of `POST manual_stage`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ManualStageRequest {
    /// Subsystem the override applies to.
    pub what: String,
    /// Target state ("deploying", "idle", ...).
    pub state: String,
    /// Originator tag.
    pub by: String,
}

/// Response of the backend health probe.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StatusInfo {
    /// Backend self-reported health.
    #[serde(default)]
    pub ok: bool,
    /// Backend clock at probe time.
    #[serde(default)]
    pub time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deploy_request_matches_wire_shape() {
        let body = serde_json::to_value(DeployRequest {
            what: DeployTarget::Aerostat,
            action: DeployAction::Deploy,
            by: "dashboard".to_string(),
        })
        .unwrap();

        assert_eq!(
            body,
            serde_json::json!({"what": "aerostat", "action": "deploy", "by": "dashboard"})
        );
    }
}
