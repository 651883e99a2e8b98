//! Merge pipeline: three source payloads in, one consistent view state out.
//!
//! Invariants: a field absent from the incoming payload keeps the previous
//! snapshot's value; partial results are never produced (callers only invoke
//! this once all three reads have settled); merging a payload that only
//! updates one concern leaves the others untouched.

use chrono::{DateTime, Utc};
use cloudburst_sources::{HardwareTable, PredictionBatch, PredictionEntry, RawSatelliteRow,
    known_nodes};

use crate::history::{Histories, hhmm};
use crate::risk;
use crate::state::{MAX_SATELLITE_ROWS, SatelliteRow, ViewState, WeatherView};

/// The settled results of one refresh cycle's reads.
pub(crate) struct CycleInputs {
    pub hardware: HardwareTable,
    pub predictions: PredictionBatch,
    pub live_rows: Vec<RawSatelliteRow>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Produce the next view state from the previous one and freshly fetched
/// payloads. Histories are advanced as part of the same step.
pub(crate) fn merge_cycle(
    prev: &ViewState,
    inputs: CycleInputs,
    histories: &mut Histories,
    now: DateTime<Utc>,
) -> ViewState {
    let CycleInputs {
        hardware,
        predictions,
        live_rows,
    } = inputs;

    let node = hardware.get(&prev.selected_node);

    // Field-level fallback: each missing field keeps its previous value,
    // never the whole object.
    let weather = node.map_or_else(
        || prev.weather.clone(),
        |snapshot| WeatherView {
            temperature: snapshot.temperature.unwrap_or(prev.weather.temperature),
            humidity: snapshot.humidity.unwrap_or(prev.weather.humidity),
            pressure: snapshot.pressure.unwrap_or(prev.weather.pressure),
            wind_speed: snapshot.wind_speed.unwrap_or(prev.weather.wind_speed),
            rainfall_mm: snapshot.rainfall_mm.unwrap_or(prev.weather.rainfall_mm),
            stage: snapshot.stage.unwrap_or(prev.weather.stage),
            alert: snapshot
                .alert
                .clone()
                .unwrap_or_else(|| prev.weather.alert.clone()),
        },
    );

    // Only the most recent batch entry counts; an entry that resolves to no
    // score leaves the prior prediction and tier alone.
    let (prediction_pct, risk_tier) = predictions
        .last()
        .and_then(PredictionEntry::score)
        .map_or((prev.prediction_pct, prev.risk_tier), |score| {
            let clamped = risk::clamp_score(score);
            (clamped, risk::classify(clamped))
        });

    let timestamp = hhmm(now);

    // An empty incoming sequence keeps the rows already on display.
    let satellite = if live_rows.is_empty() {
        prev.satellite.clone()
    } else {
        live_rows
            .iter()
            .take(MAX_SATELLITE_ROWS)
            .map(|raw| SatelliteRow::from_raw(raw, &timestamp))
            .collect()
    };

    // Nodes without a usable risk value sit out of both numerator and
    // denominator.
    let risks: Vec<f64> = hardware.values().filter_map(|snapshot| snapshot.risk).collect();
    #[allow(clippy::cast_precision_loss)]
    let global_risk = if risks.is_empty() {
        prev.global_risk
    } else {
        round2(risks.iter().sum::<f64>() / risks.len() as f64)
    };

    histories.append(
        node.and_then(|s| s.pressure),
        node.and_then(|s| s.humidity),
        node.and_then(|s| s.wind_speed),
        &timestamp,
    );

    ViewState {
        selected_node: prev.selected_node.clone(),
        known_nodes: known_nodes(&hardware),
        weather,
        prediction_pct,
        risk_tier,
        global_risk,
        satellite,
        history: histories.view(),
        stage2_active: prev.stage2_active,
        stage3_active: prev.stage3_active,
        connected: prev.connected,
        analyzing: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HISTORY_LEN;
    use crate::risk::RiskTier;
    use serde_json::json;

    fn table(value: serde_json::Value) -> HardwareTable {
        serde_json::from_value(value).unwrap()
    }

    fn batch(value: serde_json::Value) -> PredictionBatch {
        serde_json::from_value(value).unwrap()
    }

    fn rows(value: serde_json::Value) -> Vec<RawSatelliteRow> {
        serde_json::from_value(value).unwrap()
    }

    fn fixture() -> (ViewState, Histories) {
        let histories = Histories::seeded(Utc::now());
        let view = ViewState::initial("node0".to_string(), &histories);
        (view, histories)
    }

    fn merge(
        prev: &ViewState,
        histories: &mut Histories,
        hardware: HardwareTable,
        predictions: PredictionBatch,
        live_rows: Vec<RawSatelliteRow>,
    ) -> ViewState {
        merge_cycle(
            prev,
            CycleInputs {
                hardware,
                predictions,
                live_rows,
            },
            histories,
            Utc::now(),
        )
    }

    #[test]
    fn absent_weather_fields_fall_back_per_field() {
        let (prev, mut histories) = fixture();
        // prev weather: temperature 28, humidity 65, pressure 1012.
        let next = merge(
            &prev,
            &mut histories,
            table(json!({"node0": {"temperature": 31, "humidity": 70}})),
            Vec::new(),
            Vec::new(),
        );

        assert_eq!(next.weather.temperature, 31.0);
        assert_eq!(next.weather.humidity, 70.0);
        assert_eq!(next.weather.pressure, 1012.0);
    }

    #[test]
    fn missing_selected_node_keeps_previous_weather_whole() {
        let (prev, mut histories) = fixture();
        let next = merge(
            &prev,
            &mut histories,
            table(json!({"node3": {"temperature": 19}})),
            Vec::new(),
            Vec::new(),
        );

        assert_eq!(next.weather, prev.weather);
    }

    #[test]
    fn block_predictions_average_and_classify() {
        let (prev, mut histories) = fixture();
        let next = merge(
            &prev,
            &mut histories,
            HardwareTable::new(),
            batch(json!([[{"risk_score": 80}, {"risk_score": "x"}]])),
            Vec::new(),
        );

        assert_eq!(next.prediction_pct, 80.0);
        assert_eq!(next.risk_tier, RiskTier::High);
    }

    #[test]
    fn prediction_is_clamped_to_ninety_nine() {
        let (prev, mut histories) = fixture();
        let next = merge(
            &prev,
            &mut histories,
            HardwareTable::new(),
            batch(json!([{"risk_score": 250}])),
            Vec::new(),
        );

        assert_eq!(next.prediction_pct, 99.0);
        assert_eq!(next.risk_tier, RiskTier::High);
    }

    #[test]
    fn unparseable_prediction_entry_retains_prior_figures() {
        let (prev, mut histories) = fixture();
        let next = merge(
            &prev,
            &mut histories,
            HardwareTable::new(),
            batch(json!([[{"risk_score": "x"}]])),
            Vec::new(),
        );

        assert_eq!(next.prediction_pct, prev.prediction_pct);
        assert_eq!(next.risk_tier, prev.risk_tier);
    }

    #[test]
    fn global_risk_excludes_non_numeric_entries() {
        let (prev, mut histories) = fixture();
        let next = merge(
            &prev,
            &mut histories,
            table(json!({
                "a": {"risk": "30"},
                "b": {"risk": "bad"},
                "c": {"risk": "50"}
            })),
            Vec::new(),
            Vec::new(),
        );

        assert_eq!(next.global_risk, 40.00);
    }

    #[test]
    fn global_risk_rounds_to_two_decimals() {
        let (prev, mut histories) = fixture();
        let next = merge(
            &prev,
            &mut histories,
            table(json!({
                "a": {"risk": 10},
                "b": {"risk": 10},
                "c": {"risk": 11}
            })),
            Vec::new(),
            Vec::new(),
        );

        assert_eq!(next.global_risk, 10.33);
    }

    #[test]
    fn no_usable_risk_retains_previous_global_risk() {
        let (prev, mut histories) = fixture();
        let next = merge(
            &prev,
            &mut histories,
            table(json!({"a": {"risk": "bad"}})),
            Vec::new(),
            Vec::new(),
        );

        assert_eq!(next.global_risk, prev.global_risk);
    }

    #[test]
    fn satellite_rows_truncate_to_fifteen() {
        let (prev, mut histories) = fixture();
        let raw: Vec<serde_json::Value> =
            (0..20).map(|i| json!({"lat": format!("18.{i}")})).collect();
        let next = merge(
            &prev,
            &mut histories,
            HardwareTable::new(),
            Vec::new(),
            rows(serde_json::Value::Array(raw)),
        );

        assert_eq!(next.satellite.len(), MAX_SATELLITE_ROWS);
        assert_eq!(next.satellite[0].lat, "18.0");
        // Missing fields took the documented defaults.
        assert_eq!(next.satellite[0].lon, "74.0");
    }

    #[test]
    fn hardware_only_payload_does_not_disturb_satellite_rows() {
        let (prev, mut histories) = fixture();
        let with_rows = merge(
            &prev,
            &mut histories,
            HardwareTable::new(),
            Vec::new(),
            rows(json!([{"lat": "18.72", "riskLevel": "Extreme"}])),
        );
        assert_eq!(with_rows.satellite.len(), 1);

        // Next cycle updates hardware only; the rows stay.
        let next = merge(
            &with_rows,
            &mut histories,
            table(json!({"node0": {"temperature": 25}})),
            Vec::new(),
            Vec::new(),
        );

        assert_eq!(next.satellite, with_rows.satellite);
        assert_eq!(next.weather.temperature, 25.0);
    }

    #[test]
    fn history_length_is_invariant_across_cycles() {
        let (mut prev, mut histories) = fixture();
        for i in 0..50 {
            prev = merge(
                &prev,
                &mut histories,
                table(json!({"node0": {"pressure": 1000 + i}})),
                Vec::new(),
                Vec::new(),
            );
            assert_eq!(prev.history.pressure.values.len(), HISTORY_LEN);
            assert_eq!(prev.history.pressure.timestamps.len(), HISTORY_LEN);
        }
        assert_eq!(*prev.history.pressure.values.last().unwrap(), 1049.0);
    }

    #[test]
    fn known_nodes_union_observed_and_defaults() {
        let (prev, mut histories) = fixture();
        let next = merge(
            &prev,
            &mut histories,
            table(json!({"node9": {"temperature": 20}})),
            Vec::new(),
            Vec::new(),
        );

        assert_eq!(
            next.known_nodes,
            vec!["node0", "node1", "node2", "node3", "node4", "node9"]
        );
    }
}
