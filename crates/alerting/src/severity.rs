//! Severity scoring over category-specific report payloads.

use database::DisasterType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Severity classification of a single report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Normal,
    High,
}

/// Haze air-quality codes map ordinally onto severity.
const HAZE_SEVERITY: [Severity; 5] = [
    Severity::Low,
    Severity::Low,
    Severity::Normal,
    Severity::High,
    Severity::High,
];

/// Classify a report's severity from its category-specific payload.
///
/// Pure function; a payload missing the expected fields (or carrying
/// the wrong shapes) classifies as `Low` rather than failing, so a bad
/// payload can never block a volume-based alert.
pub fn classify(disaster_type: DisasterType, report_data: &Value) -> Severity {
    match disaster_type {
        // An observed eruption or active fire is always actionable.
        DisasterType::Volcano | DisasterType::Fire => Severity::High,

        DisasterType::Flood => match report_data.get("flood_depth").and_then(Value::as_i64) {
            Some(depth) if depth > 150 => Severity::High,
            _ => Severity::Low,
        },

        DisasterType::Earthquake => {
            match report_data.get("report_type").and_then(Value::as_str) {
                // A road report with zero passable access routes.
                Some("road") => match report_data.get("accessibility_failures").and_then(Value::as_i64) {
                    Some(0) => Severity::High,
                    _ => Severity::Low,
                },
                Some("structure") => {
                    match report_data.get("structure_failures").and_then(Value::as_i64) {
                        Some(failures) if failures >= 2 => Severity::High,
                        _ => Severity::Low,
                    }
                }
                _ => Severity::Low,
            }
        }

        DisasterType::Haze => report_data
            .get("air_quality")
            .and_then(Value::as_u64)
            .and_then(|code| HAZE_SEVERITY.get(code as usize).copied())
            .unwrap_or(Severity::Low),

        DisasterType::Wind => match report_data.get("impact").and_then(Value::as_i64) {
            Some(2) => Severity::High,
            _ => Severity::Low,
        },

        DisasterType::Typhoon => Severity::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flood_depth_threshold() {
        assert_eq!(classify(DisasterType::Flood, &json!({"flood_depth": 151})), Severity::High);
        assert_eq!(classify(DisasterType::Flood, &json!({"flood_depth": 150})), Severity::Low);
        assert_eq!(classify(DisasterType::Flood, &json!({"flood_depth": 50})), Severity::Low);
    }

    #[test]
    fn test_earthquake_road_and_structure() {
        let road_blocked = json!({"report_type": "road", "accessibility_failures": 0});
        let road_open = json!({"report_type": "road", "accessibility_failures": 3});
        assert_eq!(classify(DisasterType::Earthquake, &road_blocked), Severity::High);
        assert_eq!(classify(DisasterType::Earthquake, &road_open), Severity::Low);

        let collapsed = json!({"report_type": "structure", "structure_failures": 2});
        let cracked = json!({"report_type": "structure", "structure_failures": 1});
        assert_eq!(classify(DisasterType::Earthquake, &collapsed), Severity::High);
        assert_eq!(classify(DisasterType::Earthquake, &cracked), Severity::Low);
    }

    #[test]
    fn test_haze_ordinal_mapping() {
        let expected = [Severity::Low, Severity::Low, Severity::Normal, Severity::High, Severity::High];
        for (code, severity) in expected.iter().enumerate() {
            assert_eq!(classify(DisasterType::Haze, &json!({"air_quality": code})), *severity);
        }
        // Out-of-range code falls back
        assert_eq!(classify(DisasterType::Haze, &json!({"air_quality": 9})), Severity::Low);
    }

    #[test]
    fn test_wind_impact() {
        assert_eq!(classify(DisasterType::Wind, &json!({"impact": 2})), Severity::High);
        assert_eq!(classify(DisasterType::Wind, &json!({"impact": 1})), Severity::Low);
    }

    #[test]
    fn test_volcano_and_fire_always_high() {
        assert_eq!(classify(DisasterType::Volcano, &json!({})), Severity::High);
        assert_eq!(classify(DisasterType::Fire, &json!(null)), Severity::High);
    }

    #[test]
    fn test_malformed_payload_falls_back_to_low() {
        assert_eq!(classify(DisasterType::Flood, &json!(null)), Severity::Low);
        assert_eq!(classify(DisasterType::Flood, &json!({"flood_depth": "deep"})), Severity::Low);
        assert_eq!(classify(DisasterType::Earthquake, &json!({"report_type": 7})), Severity::Low);
        assert_eq!(classify(DisasterType::Wind, &json!({})), Severity::Low);
    }
}
