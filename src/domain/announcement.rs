use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};

/// A company-scoped notice, either general or maintenance-typed.
///
/// `announcement_type` and `company_id` are fixed at creation; everything
/// else moves through the publication lifecycle driven by `status`.
///
/// Serialize-only: announcements are never decoded from JSON as a whole.
/// The database path rebuilds them column by column, with the metadata
/// union picked via [`AnnouncementMetadata::from_json`].
#[derive(Debug, Clone, Serialize)]
pub struct Announcement {
    pub id: Uuid,
    pub company_id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub announcement_type: AnnouncementType,
    pub status: PublicationStatus,
    pub metadata: AnnouncementMetadata,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AnnouncementType {
    General,
    Maintenance,
}

impl AnnouncementType {
    pub fn parse(s: &str) -> Option<AnnouncementType> {
        match s {
            "GENERAL" => Some(AnnouncementType::General),
            "MAINTENANCE" => Some(AnnouncementType::Maintenance),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnnouncementType::General => "GENERAL",
            AnnouncementType::Maintenance => "MAINTENANCE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PublicationStatus {
    Draft,
    Scheduled,
    Published,
    Archived,
}

impl PublicationStatus {
    pub fn parse(s: &str) -> Option<PublicationStatus> {
        match s {
            "DRAFT" => Some(PublicationStatus::Draft),
            "SCHEDULED" => Some(PublicationStatus::Scheduled),
            "PUBLISHED" => Some(PublicationStatus::Published),
            "ARCHIVED" => Some(PublicationStatus::Archived),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PublicationStatus::Draft => "DRAFT",
            PublicationStatus::Scheduled => "SCHEDULED",
            PublicationStatus::Published => "PUBLISHED",
            PublicationStatus::Archived => "ARCHIVED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

impl Urgency {
    pub fn parse(s: &str) -> Option<Urgency> {
        match s {
            "LOW" => Some(Urgency::Low),
            "MEDIUM" => Some(Urgency::Medium),
            "HIGH" => Some(Urgency::High),
            "CRITICAL" => Some(Urgency::Critical),
            _ => None,
        }
    }
}

/// Type-dependent announcement fields.
///
/// The legal keys differ per announcement type, so this is a proper union
/// rather than a loose map: the maintenance variant carries the planned
/// window and the write-once actual start/end markers.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum AnnouncementMetadata {
    General(GeneralMetadata),
    Maintenance(MaintenanceMetadata),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralMetadata {
    pub urgency: Urgency,
    #[serde(default)]
    pub affected_services: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MaintenanceMetadata {
    pub urgency: Urgency,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub is_emergency: bool,
    #[serde(default)]
    pub affected_services: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actual_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actual_end: Option<DateTime<Utc>>,
}

impl AnnouncementMetadata {
    /// Deserializes the metadata column, picking the variant from the
    /// announcement's type column.
    pub fn from_json(announcement_type: AnnouncementType, json: &str) -> Result<Self> {
        match announcement_type {
            AnnouncementType::General => serde_json::from_str::<GeneralMetadata>(json)
                .map(AnnouncementMetadata::General)
                .map_err(|e| AppError::Database(format!("Invalid general metadata: {}", e))),
            AnnouncementType::Maintenance => serde_json::from_str::<MaintenanceMetadata>(json)
                .map(AnnouncementMetadata::Maintenance)
                .map_err(|e| AppError::Database(format!("Invalid maintenance metadata: {}", e))),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| AppError::Internal(e.to_string()))
    }

    pub fn scheduled_for(&self) -> Option<DateTime<Utc>> {
        match self {
            AnnouncementMetadata::General(m) => m.scheduled_for,
            AnnouncementMetadata::Maintenance(m) => m.scheduled_for,
        }
    }

    pub fn set_scheduled_for(&mut self, scheduled_for: Option<DateTime<Utc>>) {
        match self {
            AnnouncementMetadata::General(m) => m.scheduled_for = scheduled_for,
            AnnouncementMetadata::Maintenance(m) => m.scheduled_for = scheduled_for,
        }
    }

    pub fn as_maintenance(&self) -> Option<&MaintenanceMetadata> {
        match self {
            AnnouncementMetadata::Maintenance(m) => Some(m),
            AnnouncementMetadata::General(_) => None,
        }
    }

    pub fn as_maintenance_mut(&mut self) -> Option<&mut MaintenanceMetadata> {
        match self {
            AnnouncementMetadata::Maintenance(m) => Some(m),
            AnnouncementMetadata::General(_) => None,
        }
    }
}

/// What to do with a freshly created announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CreateAction {
    #[default]
    Draft,
    Publish,
    Schedule,
}

/// Creation command. Required fields are `Option` so that missing input
/// surfaces as a field-level validation error instead of a decode failure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateAnnouncementRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub announcement_type: Option<AnnouncementType>,
    pub urgency: Option<String>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
    pub is_emergency: Option<bool>,
    pub affected_services: Option<Vec<String>>,
    pub scheduled_for: Option<DateTime<Utc>>,
    #[serde(default)]
    pub action: CreateAction,
    pub reason: Option<String>,
}

/// Partial update: absent fields keep their stored values. Type and
/// company are never updatable and have no slot here.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateAnnouncementRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub urgency: Option<String>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
    pub is_emergency: Option<bool>,
    pub affected_services: Option<Vec<String>>,
    pub reason: Option<String>,
}

/// Filters for the list endpoint.
#[derive(Debug, Clone, Default)]
pub struct AnnouncementFilter {
    pub company_id: Option<Uuid>,
    pub status: Option<PublicationStatus>,
    pub announcement_type: Option<AnnouncementType>,
    pub limit: i64,
    pub offset: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn announcement_serializes_with_flattened_metadata() {
        let now = Utc::now();
        let announcement = Announcement {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            title: "Service update".to_string(),
            content: "New dashboard.".to_string(),
            announcement_type: AnnouncementType::General,
            status: PublicationStatus::Draft,
            metadata: AnnouncementMetadata::General(GeneralMetadata {
                urgency: Urgency::Medium,
                affected_services: vec!["api".to_string()],
                scheduled_for: None,
            }),
            published_at: None,
            created_at: now,
            updated_at: now,
        };

        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&announcement).unwrap()).unwrap();
        assert_eq!(json["status"], "DRAFT");
        assert_eq!(json["announcement_type"], "GENERAL");
        assert_eq!(json["metadata"]["urgency"], "MEDIUM");
    }

    #[test]
    fn metadata_variant_follows_the_type_column() {
        let now = Utc::now();
        let maintenance = AnnouncementMetadata::Maintenance(MaintenanceMetadata {
            urgency: Urgency::High,
            scheduled_start: now,
            scheduled_end: now + chrono::Duration::hours(2),
            is_emergency: false,
            affected_services: Vec::new(),
            scheduled_for: None,
            actual_start: None,
            actual_end: None,
        });

        let json = maintenance.to_json().unwrap();
        let decoded =
            AnnouncementMetadata::from_json(AnnouncementType::Maintenance, &json).unwrap();
        assert_eq!(decoded, maintenance);

        // The type column is authoritative: the same payload decoded as
        // GENERAL yields the general variant, never a guessed one.
        let general = AnnouncementMetadata::from_json(AnnouncementType::General, &json).unwrap();
        assert!(matches!(general, AnnouncementMetadata::General(_)));
    }
}
