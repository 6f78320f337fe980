//! Meeting data model shared by the store, the provider client and the HTTP layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use validator::Validate;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("meeting descriptor is not valid JSON: {0}")]
    Malformed(String),

    #[error("meeting descriptor has no Meeting.MeetingId")]
    MissingMeetingId,
}

/// Provider meeting object, kept as the serialized JSON the provider returned.
///
/// The only field read back out of it is the provider-assigned meeting id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingDescriptor(String);

#[derive(Deserialize)]
struct DescriptorEnvelope {
    #[serde(rename = "Meeting")]
    meeting: Option<DescriptorMeeting>,
}

#[derive(Deserialize)]
struct DescriptorMeeting {
    #[serde(rename = "MeetingId")]
    meeting_id: Option<String>,
}

impl MeetingDescriptor {
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extract `Meeting.MeetingId`.
    pub fn meeting_id(&self) -> Result<String, DescriptorError> {
        let envelope: DescriptorEnvelope = serde_json::from_str(&self.0)
            .map_err(|e| DescriptorError::Malformed(e.to_string()))?;

        envelope
            .meeting
            .and_then(|m| m.meeting_id)
            .filter(|id| !id.is_empty())
            .ok_or(DescriptorError::MissingMeetingId)
    }
}

impl Serialize for MeetingDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value: serde_json::Value =
            serde_json::from_str(&self.0).map_err(serde::ser::Error::custom)?;
        value.serialize(serializer)
    }
}

/// One stored meeting, keyed by title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingRecord {
    pub title: String,
    pub descriptor: MeetingDescriptor,
    pub expires_at: DateTime<Utc>,
}

impl MeetingRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Provider-issued credential for a single attendee. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttendeeCredential {
    pub attendee: Attendee,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Attendee {
    pub external_user_id: String,
    pub attendee_id: String,
    pub join_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<AttendeeCapabilities>,
}

/// Per-media send/receive grants, e.g. `SendReceive`, `Receive`, `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttendeeCapabilities {
    pub audio: String,
    pub video: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct JoinInfo {
    pub meeting: MeetingDescriptor,
    pub attendee: AttendeeCredential,
}

#[derive(Debug, Clone, Serialize)]
pub struct JoinResponse {
    #[serde(rename = "JoinInfo")]
    pub join_info: JoinInfo,
}

impl From<JoinInfo> for JoinResponse {
    fn from(join_info: JoinInfo) -> Self {
        Self { join_info }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct JoinRequest {
    #[serde(default)]
    #[validate(required, length(min = 1))]
    pub title: Option<String>,

    #[serde(default)]
    #[validate(required, length(min = 1))]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct LeaveRequest {
    #[serde(default)]
    #[validate(required, length(min = 1))]
    pub title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meeting_id_is_read_from_descriptor() {
        let descriptor = MeetingDescriptor::from_raw(
            r#"{"Meeting":{"MeetingId":"m-123","ExternalMeetingId":"standup"}}"#,
        );
        assert_eq!(descriptor.meeting_id().unwrap(), "m-123");
    }

    #[test]
    fn meeting_id_missing_or_malformed() {
        let missing = MeetingDescriptor::from_raw(r#"{"Meeting":{}}"#);
        assert_eq!(missing.meeting_id(), Err(DescriptorError::MissingMeetingId));

        let empty = MeetingDescriptor::from_raw(r#"{}"#);
        assert_eq!(empty.meeting_id(), Err(DescriptorError::MissingMeetingId));

        let garbage = MeetingDescriptor::from_raw("not json");
        assert!(matches!(
            garbage.meeting_id(),
            Err(DescriptorError::Malformed(_))
        ));
    }

    #[test]
    fn join_response_shape() {
        let info = JoinInfo {
            meeting: MeetingDescriptor::from_raw(r#"{"Meeting":{"MeetingId":"m-1"}}"#),
            attendee: AttendeeCredential {
                attendee: Attendee {
                    external_user_id: "abcd1234#alice".to_string(),
                    attendee_id: "a-1".to_string(),
                    join_token: "token".to_string(),
                    capabilities: None,
                },
            },
        };

        let value = serde_json::to_value(JoinResponse::from(info)).unwrap();
        assert!(value["JoinInfo"]["Attendee"]["Attendee"]
            .get("Capabilities")
            .is_none());
        assert_eq!(value["JoinInfo"]["Meeting"]["Meeting"]["MeetingId"], "m-1");
        assert_eq!(
            value["JoinInfo"]["Attendee"]["Attendee"]["ExternalUserId"],
            "abcd1234#alice"
        );
        assert_eq!(value["JoinInfo"]["Attendee"]["Attendee"]["JoinToken"], "token");
    }

    #[test]
    fn join_request_requires_both_fields() {
        let ok: JoinRequest = serde_json::from_str(r#"{"title":"t","name":"n"}"#).unwrap();
        assert!(ok.validate().is_ok());

        let missing_name: JoinRequest = serde_json::from_str(r#"{"title":"t"}"#).unwrap();
        assert!(missing_name.validate().is_err());

        let empty_title: JoinRequest =
            serde_json::from_str(r#"{"title":"","name":"n"}"#).unwrap();
        assert!(empty_title.validate().is_err());

        let null_title: JoinRequest =
            serde_json::from_str(r#"{"title":null,"name":"n"}"#).unwrap();
        assert!(null_title.validate().is_err());
    }

    #[test]
    fn record_expiry_is_inclusive() {
        let now = Utc::now();
        let record = MeetingRecord {
            title: "t".to_string(),
            descriptor: MeetingDescriptor::from_raw("{}"),
            expires_at: now,
        };
        assert!(record.is_expired(now));
        assert!(!record.is_expired(now - chrono::Duration::seconds(1)));
    }

    #[test]
    fn attendee_capabilities_are_serialized_when_present() {
        let attendee = Attendee {
            external_user_id: "abcd1234#alice".to_string(),
            attendee_id: "a-1".to_string(),
            join_token: "token".to_string(),
            capabilities: Some(AttendeeCapabilities {
                audio: "SendReceive".to_string(),
                video: "Receive".to_string(),
                content: "None".to_string(),
            }),
        };

        let value = serde_json::to_value(&attendee).unwrap();
        assert_eq!(
            value["Capabilities"],
            serde_json::json!({"Audio": "SendReceive", "Video": "Receive", "Content": "None"})
        );
    }
}
