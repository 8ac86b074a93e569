//! Database models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Disaster categories a report can carry.
///
/// Stored as lowercase TEXT; each category has its own rolling
/// aggregation window (see `report::WindowCutoffs`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum DisasterType {
    Flood,
    Earthquake,
    Wind,
    Haze,
    Volcano,
    Fire,
    Typhoon,
}

impl DisasterType {
    /// All categories, in the order the windowed report query binds them.
    pub const ALL: [DisasterType; 7] = [
        DisasterType::Flood,
        DisasterType::Earthquake,
        DisasterType::Wind,
        DisasterType::Haze,
        DisasterType::Volcano,
        DisasterType::Fire,
        DisasterType::Typhoon,
    ];

    /// Lowercase name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            DisasterType::Flood => "flood",
            DisasterType::Earthquake => "earthquake",
            DisasterType::Wind => "wind",
            DisasterType::Haze => "haze",
            DisasterType::Volcano => "volcano",
            DisasterType::Fire => "fire",
            DisasterType::Typhoon => "typhoon",
        }
    }
}

impl std::fmt::Display for DisasterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A report card: one slot per user conversation, awaiting one report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Card {
    /// Opaque card identifier (UUID v4, generated at insert).
    pub card_id: String,
    /// Submitting user identifier (phone number or web session id).
    pub username: String,
    /// Delivery channel ("whatsapp", "telegram", ... or the "website" sentinel).
    pub network: String,
    /// Preferred language code.
    pub language: String,
    /// Whether a report has been received for this card.
    pub received: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// The disaster observation attached to a card once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Report {
    /// Auto-incrementing report identifier.
    pub id: i64,
    /// Owning card.
    pub card_id: String,
    /// Observation timestamp.
    pub created_at: DateTime<Utc>,
    /// Disaster category.
    pub disaster_type: DisasterType,
    /// Training reports never aggregate or alert.
    pub is_training: bool,
    /// Region the report falls in.
    pub region_code: String,
    /// City name, if known.
    pub city: Option<String>,
    /// Category-specific payload used for severity scoring.
    pub report_data: serde_json::Value,
    /// Free-text description.
    pub text: Option<String>,
    /// Image URL, null until patched.
    pub image_url: Option<String>,
    /// Report latitude.
    pub latitude: f64,
    /// Report longitude.
    pub longitude: f64,
    /// Partner attribution code, if any.
    pub partner_code: Option<String>,
    /// Report status (always written as "Confirmed").
    pub status: String,
}

/// A card together with its report, if one has been received.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardRecord {
    #[serde(flatten)]
    pub card: Card,
    pub report: Option<Report>,
}

/// Slim report row used by the aggregation pass.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ActiveReport {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub disaster_type: DisasterType,
    pub is_training: bool,
    pub region_code: String,
    pub city: Option<String>,
    pub report_data: serde_json::Value,
}

/// A user's standing registration for region-scoped alerts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSubscription {
    pub user_id: String,
    pub language_code: String,
    /// Delivery channel for alerts.
    pub network: String,
    /// Regions the user is registered for.
    pub region_codes: Vec<String>,
}

/// A dedup record: one alert sent to a user for a region on a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SubscriptionLogEntry {
    pub user_id: String,
    pub region_code: String,
    pub network: String,
    /// Calendar day the alert went out.
    pub sent_on: NaiveDate,
    pub sent_at: DateTime<Utc>,
}

/// A card lifecycle audit event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AuditLogEntry {
    pub id: i64,
    pub card_id: String,
    pub event_type: String,
    pub created_at: DateTime<Utc>,
}
