//! Risk tier classification.
//!
//! A pure function of the current score; the previous tier never feeds back
//! into the decision.

use serde::Serialize;

/// Prediction percentages are displayed capped at this value.
pub const MAX_PREDICTION_PCT: f64 = 99.0;

/// Discrete risk classification derived from a continuous score.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    /// Score at or below 35.
    Low,
    /// Score above 35, at or below 60.
    Moderate,
    /// Score above 60.
    High,
}

/// Cap a raw score to the displayable range.
#[must_use]
pub fn clamp_score(score: f64) -> f64 {
    score.min(MAX_PREDICTION_PCT)
}

/// Classify a score into its tier.
#[must_use]
pub fn classify(score: f64) -> RiskTier {
    if score > 60.0 {
        RiskTier::High
    } else if score > 35.0 {
        RiskTier::Moderate
    } else {
        RiskTier::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_boundaries() {
        assert_eq!(classify(0.0), RiskTier::Low);
        assert_eq!(classify(35.0), RiskTier::Low);
        assert_eq!(classify(35.1), RiskTier::Moderate);
        assert_eq!(classify(60.0), RiskTier::Moderate);
        assert_eq!(classify(60.1), RiskTier::High);
        assert_eq!(classify(99.0), RiskTier::High);
    }

    #[test]
    fn clamp_caps_at_ninety_nine() {
        assert_eq!(clamp_score(150.0), 99.0);
        assert_eq!(clamp_score(99.0), 99.0);
        assert_eq!(clamp_score(42.0), 42.0);
    }

    #[test]
    fn classification_is_a_function_of_the_score_alone() {
        for score in 0..=200 {
            let score = f64::from(score);
            let clamped = clamp_score(score);
            assert!((0.0..=MAX_PREDICTION_PCT).contains(&clamped));

            let expected = if clamped > 60.0 {
                RiskTier::High
            } else if clamped > 35.0 {
                RiskTier::Moderate
            } else {
                RiskTier::Low
            };
            // Same input, same answer, every time.
            assert_eq!(classify(clamped), expected);
            assert_eq!(classify(clamped), classify(clamped));
        }
    }
}
