//! Matching aggregated region counts against subscriber region sets.

use std::collections::HashSet;

use database::RegionSubscription;

use crate::aggregate::RegionCount;

/// One (subscriber, region) pair eligible for an alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMatch {
    pub user_id: String,
    pub language_code: String,
    pub network: String,
    pub region_code: String,
}

/// Find every (subscriber, region) pair whose subscribed region has a
/// group meeting the alert threshold.
///
/// Pure function. A subscriber registered for several eligible regions
/// yields one pair per region; pairs are deduplicated in-memory so a
/// single pass can never double-dispatch to the same pair.
pub fn find_eligible_subscribers(
    counts: &[RegionCount],
    subscriptions: &[RegionSubscription],
    threshold: u32,
) -> Vec<AlertMatch> {
    let eligible_regions: HashSet<&str> = counts
        .iter()
        .filter(|c| c.meets_threshold(threshold))
        .map(|c| c.region_code.as_str())
        .collect();

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut matches = Vec::new();

    for subscription in subscriptions {
        for region_code in &subscription.region_codes {
            if !eligible_regions.contains(region_code.as_str()) {
                continue;
            }
            if seen.insert((subscription.user_id.clone(), region_code.clone())) {
                matches.push(AlertMatch {
                    user_id: subscription.user_id.clone(),
                    language_code: subscription.language_code.clone(),
                    network: subscription.network.clone(),
                    region_code: region_code.clone(),
                });
            }
        }
    }

    matches
}
