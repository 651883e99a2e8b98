//! Fixed-length rolling history for the trend chart.
//!
//! Each metric keeps a value sequence and a parallel timestamp sequence;
//! the two always update together and never change length. Before any real
//! telemetry arrives the ring holds a synthetic baseline so the chart has
//! something to draw; the live-sample counter stays at zero until real data
//! replaces it.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Samples retained per metric.
pub const HISTORY_LEN: usize = 20;

/// Spacing of the synthetic seed timestamps, walking back from now.
const SEED_SPACING_SECS: i64 = 30;

/// Display form of a sample time.
pub(crate) fn hhmm(time: DateTime<Utc>) -> String {
    time.format("%H:%M").to_string()
}

/// Snapshot of one metric's history, oldest first.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistorySeries {
    /// Sample values.
    pub values: Vec<f64>,
    /// Display timestamps, index-aligned with `values`.
    pub timestamps: Vec<String>,
}

pub(crate) struct HistoryRing {
    values: VecDeque<f64>,
    timestamps: VecDeque<String>,
    live_samples: usize,
}

impl HistoryRing {
    /// Ring pre-filled with a flat baseline.
    pub(crate) fn seeded(baseline: f64, now: DateTime<Utc>) -> Self {
        let mut values = VecDeque::with_capacity(HISTORY_LEN);
        let mut timestamps = VecDeque::with_capacity(HISTORY_LEN);
        for i in 0..HISTORY_LEN {
            let back = (HISTORY_LEN - 1 - i) as i64 * SEED_SPACING_SECS;
            values.push_back(baseline);
            timestamps.push_back(hhmm(now - Duration::seconds(back)));
        }
        Self {
            values,
            timestamps,
            live_samples: 0,
        }
    }

    /// Append a sample and its timestamp, dropping the oldest pair in the
    /// same step. An absent value repeats the most recent one.
    pub(crate) fn append(&mut self, value: Option<f64>, timestamp: String) {
        let value = value.unwrap_or_else(|| self.last());
        self.values.push_back(value);
        self.values.pop_front();
        self.timestamps.push_back(timestamp);
        self.timestamps.pop_front();
        self.live_samples += 1;
    }

    pub(crate) fn last(&self) -> f64 {
        self.values.back().copied().unwrap_or_default()
    }

    /// Number of appends since initialization; zero means the ring still
    /// holds only synthetic bootstrap content.
    pub(crate) const fn live_samples(&self) -> usize {
        self.live_samples
    }

    pub(crate) fn series(&self) -> HistorySeries {
        HistorySeries {
            values: self.values.iter().copied().collect(),
            timestamps: self.timestamps.iter().cloned().collect(),
        }
    }
}

/// The three metric rings the dashboard charts.
pub(crate) struct Histories {
    pressure: HistoryRing,
    humidity: HistoryRing,
    wind: HistoryRing,
}

/// Rolling history snapshots handed to the presentation layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistoryView {
    /// Pressure series, hPa.
    pub pressure: HistorySeries,
    /// Humidity series, percent.
    pub humidity: HistorySeries,
    /// Wind speed series, km/h.
    pub wind: HistorySeries,
}

impl Histories {
    /// Baselines match the dashboard's quiet-weather defaults.
    pub(crate) fn seeded(now: DateTime<Utc>) -> Self {
        Self {
            pressure: HistoryRing::seeded(1012.0, now),
            humidity: HistoryRing::seeded(65.0, now),
            wind: HistoryRing::seeded(12.0, now),
        }
    }

    pub(crate) fn append(
        &mut self,
        pressure: Option<f64>,
        humidity: Option<f64>,
        wind: Option<f64>,
        timestamp: &str,
    ) {
        self.pressure.append(pressure, timestamp.to_string());
        self.humidity.append(humidity, timestamp.to_string());
        self.wind.append(wind, timestamp.to_string());
    }

    pub(crate) fn view(&self) -> HistoryView {
        HistoryView {
            pressure: self.pressure.series(),
            humidity: self.humidity.series(),
            wind: self.wind.series(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_ring_is_full_but_holds_no_live_data() {
        let ring = HistoryRing::seeded(1012.0, Utc::now());
        let series = ring.series();

        assert_eq!(series.values.len(), HISTORY_LEN);
        assert_eq!(series.timestamps.len(), HISTORY_LEN);
        assert!(series.values.iter().all(|v| (*v - 1012.0).abs() < f64::EPSILON));
        assert_eq!(ring.live_samples(), 0);
    }

    #[test]
    fn length_is_invariant_under_appends() {
        let mut ring = HistoryRing::seeded(60.0, Utc::now());
        for i in 0..100 {
            ring.append(Some(f64::from(i)), format!("00:{:02}", i % 60));
            let series = ring.series();
            assert_eq!(series.values.len(), HISTORY_LEN);
            assert_eq!(series.timestamps.len(), HISTORY_LEN);
        }
        assert_eq!(ring.live_samples(), 100);
        assert_eq!(ring.last(), 99.0);
    }

    #[test]
    fn values_and_timestamps_move_together() {
        let mut ring = HistoryRing::seeded(10.0, Utc::now());
        ring.append(Some(42.0), "09:15".to_string());

        let series = ring.series();
        assert_eq!(*series.values.last().unwrap(), 42.0);
        assert_eq!(series.timestamps.last().unwrap(), "09:15");
        // Oldest pair fell off as one unit.
        assert_eq!(series.values.len(), series.timestamps.len());
    }

    #[test]
    fn absent_sample_repeats_the_most_recent_value() {
        let mut ring = HistoryRing::seeded(10.0, Utc::now());
        ring.append(Some(42.0), "09:15".to_string());
        ring.append(None, "09:16".to_string());

        assert_eq!(ring.last(), 42.0);
        assert_eq!(ring.live_samples(), 2);
    }
}
