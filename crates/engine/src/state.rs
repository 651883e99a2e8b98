//! The externally visible view-state snapshot.
//!
//! `ViewState` is the sole unit handed to the presentation layer. It is
//! re-created on every refresh; the previous snapshot is the fallback source
//! for anything the new payload leaves out.

use cloudburst_sources::{HardwareTable, RawSatelliteRow, Stage, known_nodes, serde_lenient};
use serde::Serialize;
use serde_json::Value;

use crate::history::{Histories, HistoryView};
use crate::risk::RiskTier;

/// Maximum satellite rows retained for display.
pub const MAX_SATELLITE_ROWS: usize = 15;

/// Categorical risk label of a satellite observation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum SatelliteRisk {
    /// Quiet cell.
    Low,
    /// Developing cell.
    Moderate,
    /// Active convective core.
    Extreme,
}

impl SatelliteRisk {
    fn from_label(label: &str) -> Self {
        match label {
            "Extreme" => Self::Extreme,
            "Moderate" => Self::Moderate,
            _ => Self::Low,
        }
    }
}

/// One normalized remote-sensing observation, display-ready.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SatelliteRow {
    /// Latitude, decimal degrees.
    pub lat: String,
    /// Longitude, decimal degrees.
    pub lon: String,
    /// Cloud-top temperature, degrees Celsius.
    pub ctt: String,
    /// Overshooting-top index.
    pub ot_index: String,
    /// Moisture flux.
    pub moisture_flux: String,
    /// Convective instability index.
    pub cii: String,
    /// Categorical risk label.
    pub risk_level: SatelliteRisk,
    /// Observation time, HH:MM.
    pub timestamp: String,
}

impl SatelliteRow {
    /// Normalize a raw row, coercing missing fields to the documented
    /// display defaults.
    pub(crate) fn from_raw(raw: &RawSatelliteRow, now_hhmm: &str) -> Self {
        let field = |value: &Option<Value>, default: &str| {
            value
                .as_ref()
                .and_then(serde_lenient::as_display_string)
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            lat: field(&raw.lat, "18.5"),
            lon: field(&raw.lon, "74.0"),
            ctt: field(&raw.ctt, "-10"),
            ot_index: field(&raw.ot_index, "0.5"),
            moisture_flux: field(&raw.moisture_flux, "10"),
            cii: field(&raw.cii, "10"),
            risk_level: raw
                .risk_level
                .as_deref()
                .map_or(SatelliteRisk::Low, SatelliteRisk::from_label),
            timestamp: raw
                .timestamp
                .clone()
                .unwrap_or_else(|| now_hhmm.to_string()),
        }
    }
}

/// Weather fields of the selected node after field-level fallback.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WeatherView {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity percentage.
    pub humidity: f64,
    /// Hectopascals.
    pub pressure: f64,
    /// Kilometres per hour.
    pub wind_speed: f64,
    /// Millimetres over the last hour.
    pub rainfall_mm: f64,
    /// Escalation stage of the node.
    pub stage: Stage,
    /// Free-form alert level.
    pub alert: String,
}

impl Default for WeatherView {
    /// The dashboard's quiet-weather placeholders, shown until real data
    /// arrives.
    fn default() -> Self {
        Self {
            temperature: 28.0,
            humidity: 65.0,
            pressure: 1012.0,
            wind_speed: 12.0,
            rainfall_mm: 0.0,
            stage: Stage::Stage1,
            alert: "NORMAL".to_string(),
        }
    }
}

/// The externally visible snapshot handed to the presentation layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ViewState {
    /// Node whose weather fields are displayed.
    pub selected_node: String,
    /// Every node id ever worth offering, sorted.
    pub known_nodes: Vec<String>,
    /// Merged weather fields of the selected node.
    pub weather: WeatherView,
    /// Cloudburst probability percentage, capped at 99.
    pub prediction_pct: f64,
    /// Tier derived from `prediction_pct`.
    pub risk_tier: RiskTier,
    /// Mean of the per-node risk scores, 2 decimal places.
    pub global_risk: f64,
    /// Most recent satellite observations, newest first, at most 15.
    pub satellite: Vec<SatelliteRow>,
    /// Rolling metric history for the trend chart.
    pub history: HistoryView,
    /// Aerostat deployment flag (optimistic).
    pub stage2_active: bool,
    /// Drone deployment flag (optimistic).
    pub stage3_active: bool,
    /// Whether the push stream is currently up.
    pub connected: bool,
    /// Whether a refresh cycle is in flight.
    pub analyzing: bool,
}

impl ViewState {
    /// Pre-data snapshot: placeholder weather, seeded history, the default
    /// node set, and the dashboard's starting risk figures.
    pub(crate) fn initial(selected_node: String, histories: &Histories) -> Self {
        Self {
            selected_node,
            known_nodes: known_nodes(&HardwareTable::new()),
            weather: WeatherView::default(),
            prediction_pct: 42.0,
            risk_tier: RiskTier::Moderate,
            global_risk: 38.5,
            satellite: Vec::new(),
            history: histories.view(),
            stage2_active: true,
            stage3_active: false,
            connected: false,
            analyzing: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn missing_satellite_fields_take_documented_defaults() {
        let row = SatelliteRow::from_raw(&RawSatelliteRow::default(), "14:30");

        assert_eq!(row.lat, "18.5");
        assert_eq!(row.lon, "74.0");
        assert_eq!(row.ctt, "-10");
        assert_eq!(row.ot_index, "0.5");
        assert_eq!(row.moisture_flux, "10");
        assert_eq!(row.cii, "10");
        assert_eq!(row.risk_level, SatelliteRisk::Low);
        assert_eq!(row.timestamp, "14:30");
    }

    #[test]
    fn numeric_satellite_fields_keep_their_wire_precision() {
        let raw: RawSatelliteRow = serde_json::from_value(serde_json::json!({
            "lat": 18.72,
            "lon": "74.08",
            "ctt": -62.4,
            "riskLevel": "Extreme",
            "timestamp": "14:30"
        }))
        .unwrap();

        let row = SatelliteRow::from_raw(&raw, "00:00");
        assert_eq!(row.lat, "18.72");
        assert_eq!(row.lon, "74.08");
        assert_eq!(row.ctt, "-62.4");
        assert_eq!(row.risk_level, SatelliteRisk::Extreme);
    }

    #[test]
    fn unknown_risk_labels_read_as_low() {
        assert_eq!(SatelliteRisk::from_label("whatever"), SatelliteRisk::Low);
    }

    #[test]
    fn initial_state_is_internally_consistent() {
        let histories = Histories::seeded(Utc::now());
        let view = ViewState::initial("node0".to_string(), &histories);

        // The starting tier matches the starting percentage under the
        // classification rule.
        assert_eq!(crate::risk::classify(view.prediction_pct), view.risk_tier);
        assert_eq!(view.known_nodes.len(), 5);
        assert!(!view.analyzing);
    }
}
