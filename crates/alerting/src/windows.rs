//! Per-category rolling aggregation windows.

use chrono::{DateTime, Duration, Utc};
use database::WindowCutoffs;

/// How far back each disaster category's reports count toward a
/// region's aggregate. Each window is independently tunable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportWindows {
    pub flood: Duration,
    pub earthquake: Duration,
    pub wind: Duration,
    pub haze: Duration,
    pub volcano: Duration,
    pub fire: Duration,
    pub typhoon: Duration,
}

impl Default for ReportWindows {
    fn default() -> Self {
        Self {
            flood: Duration::hours(6),
            earthquake: Duration::hours(2),
            wind: Duration::hours(6),
            haze: Duration::hours(6),
            volcano: Duration::hours(12),
            fire: Duration::hours(6),
            typhoon: Duration::hours(6),
        }
    }
}

impl ReportWindows {
    /// Cutoff timestamps for the windowed report query, relative to `now`.
    pub fn cutoffs(&self, now: DateTime<Utc>) -> WindowCutoffs {
        WindowCutoffs {
            flood: now - self.flood,
            earthquake: now - self.earthquake,
            wind: now - self.wind,
            haze: now - self.haze,
            volcano: now - self.volcano,
            fire: now - self.fire,
            typhoon: now - self.typhoon,
        }
    }
}
