//! Region/category aggregation over a windowed report snapshot.

use chrono::{DateTime, Utc};
use database::{ActiveReport, DisasterType};
use serde::Serialize;

use crate::severity::{classify, Severity};

/// Aggregated report count for one (region, disaster category) group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionCount {
    pub region_code: String,
    pub disaster_type: DisasterType,
    /// Number of qualifying reports in the group's window.
    pub count: u32,
    /// First non-empty city seen for the group.
    pub city: String,
    /// Most recent contributing report.
    pub latest_report_id: i64,
    /// Severity of the most recent contributing report.
    pub latest_severity: Severity,
}

impl RegionCount {
    /// Whether the group justifies alerting at the given threshold.
    ///
    /// A high-severity latest report substitutes for volume: the group
    /// is eligible even below the raw count threshold.
    pub fn meets_threshold(&self, threshold: u32) -> bool {
        self.count >= threshold || self.latest_severity == Severity::High
    }
}

struct Group {
    region_code: String,
    disaster_type: DisasterType,
    count: u32,
    city: String,
    latest_report_id: i64,
    latest_created_at: DateTime<Utc>,
    latest_data: serde_json::Value,
}

/// Group a report snapshot by (region, disaster category).
///
/// Pure function over an immutable snapshot. Training reports never
/// contribute. Group order follows first appearance in the snapshot.
pub fn aggregate_reports(reports: &[ActiveReport]) -> Vec<RegionCount> {
    let mut groups: Vec<Group> = Vec::new();

    for report in reports {
        if report.is_training {
            continue;
        }

        let existing = groups.iter_mut().find(|g| {
            g.region_code == report.region_code && g.disaster_type == report.disaster_type
        });

        match existing {
            Some(group) => {
                group.count += 1;
                if group.city.is_empty() {
                    if let Some(city) = &report.city {
                        group.city = city.clone();
                    }
                }
                if report.created_at >= group.latest_created_at {
                    group.latest_report_id = report.id;
                    group.latest_created_at = report.created_at;
                    group.latest_data = report.report_data.clone();
                }
            }
            None => groups.push(Group {
                region_code: report.region_code.clone(),
                disaster_type: report.disaster_type,
                count: 1,
                city: report.city.clone().unwrap_or_default(),
                latest_report_id: report.id,
                latest_created_at: report.created_at,
                latest_data: report.report_data.clone(),
            }),
        }
    }

    groups
        .into_iter()
        .map(|g| RegionCount {
            latest_severity: classify(g.disaster_type, &g.latest_data),
            region_code: g.region_code,
            disaster_type: g.disaster_type,
            count: g.count,
            city: g.city,
            latest_report_id: g.latest_report_id,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn report(
        id: i64,
        region: &str,
        disaster_type: DisasterType,
        data: serde_json::Value,
        age_mins: i64,
        training: bool,
    ) -> ActiveReport {
        ActiveReport {
            id,
            created_at: Utc::now() - Duration::minutes(age_mins),
            disaster_type,
            is_training: training,
            region_code: region.to_string(),
            city: Some("Jakarta".to_string()),
            report_data: data,
        }
    }

    #[test]
    fn test_groups_by_region_and_category() {
        let reports = vec![
            report(1, "R1", DisasterType::Flood, json!({"flood_depth": 50}), 30, false),
            report(2, "R1", DisasterType::Flood, json!({"flood_depth": 50}), 20, false),
            report(3, "R1", DisasterType::Haze, json!({"air_quality": 1}), 15, false),
            report(4, "R2", DisasterType::Flood, json!({"flood_depth": 50}), 10, false),
        ];

        let counts = aggregate_reports(&reports);
        assert_eq!(counts.len(), 3);
        assert_eq!(counts[0].count, 2);
        assert_eq!(counts[0].region_code, "R1");
        assert_eq!(counts[0].disaster_type, DisasterType::Flood);
        assert_eq!(counts[1].count, 1);
        assert_eq!(counts[2].count, 1);
    }

    #[test]
    fn test_training_reports_never_aggregate() {
        let reports = vec![
            report(1, "R1", DisasterType::Flood, json!({"flood_depth": 50}), 30, true),
            report(2, "R1", DisasterType::Flood, json!({"flood_depth": 50}), 20, false),
        ];

        let counts = aggregate_reports(&reports);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].count, 1);
        assert_eq!(counts[0].latest_report_id, 2);
    }

    #[test]
    fn test_latest_report_drives_severity() {
        // Older report was severe, the most recent one is not.
        let reports = vec![
            report(1, "R1", DisasterType::Flood, json!({"flood_depth": 200}), 30, false),
            report(2, "R1", DisasterType::Flood, json!({"flood_depth": 40}), 5, false),
        ];
        let counts = aggregate_reports(&reports);
        assert_eq!(counts[0].latest_report_id, 2);
        assert_eq!(counts[0].latest_severity, Severity::Low);

        // And the reverse: latest severe report marks the group high.
        let reports = vec![
            report(1, "R1", DisasterType::Flood, json!({"flood_depth": 40}), 30, false),
            report(2, "R1", DisasterType::Flood, json!({"flood_depth": 200}), 5, false),
        ];
        let counts = aggregate_reports(&reports);
        assert_eq!(counts[0].latest_severity, Severity::High);
    }

    #[test]
    fn test_threshold_law() {
        let low = |id, age| report(id, "R1", DisasterType::Flood, json!({"flood_depth": 50}), age, false);

        // threshold-1 low reports: no eligibility
        let counts = aggregate_reports(&[low(1, 30), low(2, 20)]);
        assert!(!counts[0].meets_threshold(3));

        // one more report reaches the threshold
        let counts = aggregate_reports(&[low(1, 30), low(2, 20), low(3, 10)]);
        assert!(counts[0].meets_threshold(3));

        // a single high-severity report is eligible regardless of count
        let volcano = report(1, "R2", DisasterType::Volcano, json!({}), 5, false);
        let counts = aggregate_reports(&[volcano]);
        assert_eq!(counts[0].count, 1);
        assert!(counts[0].meets_threshold(3));
    }

    #[test]
    fn test_city_taken_from_first_report_that_has_one() {
        let mut first = report(1, "R1", DisasterType::Flood, json!({}), 30, false);
        first.city = None;
        let second = report(2, "R1", DisasterType::Flood, json!({}), 20, false);

        let counts = aggregate_reports(&[first, second]);
        assert_eq!(counts[0].city, "Jakarta");
    }
}
