use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One remote-sensing observation exactly as the backend serves it, before
/// the aggregator applies display defaults. Producers mix numbers and
/// strings per field, so everything stays loosely typed here.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RawSatelliteRow {
    /// Latitude, decimal degrees.
    #[serde(default)]
    pub lat: Option<Value>,
    /// Longitude, decimal degrees.
    #[serde(default)]
    pub lon: Option<Value>,
    /// Cloud-top temperature, degrees Celsius.
    #[serde(default)]
    pub ctt: Option<Value>,
    /// Overshooting-top index.
    #[serde(default, rename = "otIndex")]
    pub ot_index: Option<Value>,
    /// Moisture flux into the storm system.
    #[serde(default, rename = "moistureFlux")]
    pub moisture_flux: Option<Value>,
    /// Convective instability index.
    #[serde(default)]
    pub cii: Option<Value>,
    /// Categorical risk label (Low/Moderate/Extreme).
    #[serde(default, rename = "riskLevel")]
    pub risk_level: Option<String>,
    /// Observation timestamp.
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_numeric_and_string_fields_alike() {
        let row: RawSatelliteRow = serde_json::from_value(serde_json::json!({
            "lat": "18.72",
            "lon": 74.08,
            "ctt": -62.4,
            "otIndex": "1.85",
            "riskLevel": "Extreme",
            "timestamp": "14:30"
        }))
        .unwrap();

        assert_eq!(row.lat, Some(Value::from("18.72")));
        assert_eq!(row.lon, Some(Value::from(74.08)));
        assert_eq!(row.risk_level.as_deref(), Some("Extreme"));
        assert!(row.moisture_flux.is_none());
    }
}
