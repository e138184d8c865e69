//! Notification event pushed over the event stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind of a stream event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// First frame of every stream.
    Connected,
    /// An analysis job was accepted.
    JobQueued,
    /// An analysis job finished successfully.
    AnalysisComplete,
    /// An analysis job failed.
    AnalysisFailed,
    /// A job was cancelled by its owner or an admin.
    JobCancelled,
    /// An admin ran a bulk action.
    BulkAction,
    /// Operator broadcast.
    System,
    /// Any type this build does not know about.
    #[serde(other)]
    Unknown,
}

impl EventType {
    /// Return the type as its wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::JobQueued => "job_queued",
            Self::AnalysisComplete => "analysis_complete",
            Self::AnalysisFailed => "analysis_failed",
            Self::JobCancelled => "job_cancelled",
            Self::BulkAction => "bulk_action",
            Self::System => "system",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who may receive an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    /// Only the user in `userId`.
    User,
    /// Every admin session.
    Admins,
    /// Every session.
    Everyone,
}

/// A notification event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamEvent {
    /// Event identifier.
    pub id: Uuid,
    /// Event kind.
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Short title.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Target user for [`Audience::User`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    /// Delivery scope.
    pub audience: Audience,
    /// Structured details (job id, counts, ...).
    #[serde(default)]
    pub data: serde_json::Value,
    /// When the event was created.
    pub timestamp: DateTime<Utc>,
}

impl StreamEvent {
    fn build(
        event_type: EventType,
        audience: Audience,
        user_id: Option<Uuid>,
        title: impl Into<String>,
        message: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            title: title.into(),
            message: message.into(),
            user_id,
            audience,
            data,
            timestamp: Utc::now(),
        }
    }

    /// An event for one user.
    pub fn for_user(
        user_id: Uuid,
        event_type: EventType,
        title: impl Into<String>,
        message: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self::build(event_type, Audience::User, Some(user_id), title, message, data)
    }

    /// An event for every admin.
    pub fn for_admins(
        event_type: EventType,
        title: impl Into<String>,
        message: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self::build(event_type, Audience::Admins, None, title, message, data)
    }

    /// An event for everyone.
    pub fn broadcast(
        event_type: EventType,
        title: impl Into<String>,
        message: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self::build(event_type, Audience::Everyone, None, title, message, data)
    }

    /// The greeting frame sent when a stream opens.
    pub fn connected(user_id: Uuid) -> Self {
        Self::for_user(
            user_id,
            EventType::Connected,
            "Connected",
            "Notification stream established",
            serde_json::Value::Null,
        )
    }

    /// Check whether a session for `user_id` should receive this event.
    pub fn is_visible_to(&self, user_id: Uuid, is_admin: bool) -> bool {
        match self.audience {
            Audience::User => self.user_id == Some(user_id),
            Audience::Admins => is_admin,
            Audience::Everyone => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_visibility() {
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        let personal = StreamEvent::for_user(
            owner,
            EventType::AnalysisComplete,
            "Done",
            "Analysis finished",
            json!({}),
        );
        assert!(personal.is_visible_to(owner, false));
        assert!(!personal.is_visible_to(other, true));

        let admin = StreamEvent::for_admins(EventType::BulkAction, "Bulk", "3 jobs", json!({}));
        assert!(admin.is_visible_to(other, true));
        assert!(!admin.is_visible_to(other, false));

        let all = StreamEvent::broadcast(EventType::System, "Hi", "Maintenance", json!({}));
        assert!(all.is_visible_to(other, false));
    }

    #[test]
    fn test_unknown_type_deserializes() {
        let raw = json!({
            "id": Uuid::new_v4(),
            "type": "quota_warning",
            "title": "t",
            "message": "m",
            "audience": "everyone",
            "timestamp": Utc::now(),
        });
        let event: StreamEvent = serde_json::from_value(raw).unwrap();
        assert_eq!(event.event_type, EventType::Unknown);
        assert_eq!(event.data, serde_json::Value::Null);
    }

    #[test]
    fn test_wire_shape() {
        let event = StreamEvent::connected(Uuid::nil());
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "connected");
        assert_eq!(value["audience"], "user");
        assert!(value.get("userId").is_some());
    }
}
