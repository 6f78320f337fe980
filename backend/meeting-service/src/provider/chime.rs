//! Amazon Chime SDK Meetings client.

use async_trait::async_trait;
use aws_sdk_chimesdkmeetings::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_chimesdkmeetings::types::{
    Attendee as SdkAttendee, MediaPlacement, Meeting as SdkMeeting, MeetingFeaturesConfiguration,
};
use aws_sdk_chimesdkmeetings::Client;
use serde::Serialize;
use tracing::debug;

use super::{MeetingProvider, ProviderError};
use crate::models::{Attendee, AttendeeCapabilities, AttendeeCredential, MeetingDescriptor};

#[derive(Clone)]
pub struct ChimeMeetingProvider {
    client: Client,
    media_region: String,
}

impl ChimeMeetingProvider {
    pub fn new(client: Client, media_region: impl Into<String>) -> Self {
        Self {
            client,
            media_region: media_region.into(),
        }
    }
}

// Wire shape of the stored descriptor: {"Meeting": {...}}, PascalCase keys.
// Every member of the SDK's Meeting is carried so clients get the full response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CreateMeetingBody {
    meeting: MeetingBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct MeetingBody {
    meeting_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    meeting_host_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    external_meeting_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    media_region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    media_placement: Option<MediaPlacementBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meeting_features: Option<MeetingFeaturesBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    primary_meeting_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tenant_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meeting_arn: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct MediaPlacementBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    audio_host_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio_fallback_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    signaling_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    turn_control_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    screen_data_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    screen_viewing_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    screen_sharing_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    event_ingestion_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct MeetingFeaturesBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    audio: Option<AudioFeaturesBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    video: Option<ResolutionFeaturesBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<ResolutionFeaturesBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attendee: Option<AttendeeFeaturesBody>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct AudioFeaturesBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    echo_reduction: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ResolutionFeaturesBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_resolution: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct AttendeeFeaturesBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_count: Option<i32>,
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_string)
}

fn media_placement_body(placement: &MediaPlacement) -> MediaPlacementBody {
    MediaPlacementBody {
        audio_host_url: placement.audio_host_url.clone(),
        audio_fallback_url: placement.audio_fallback_url.clone(),
        signaling_url: placement.signaling_url.clone(),
        turn_control_url: placement.turn_control_url.clone(),
        screen_data_url: placement.screen_data_url.clone(),
        screen_viewing_url: placement.screen_viewing_url.clone(),
        screen_sharing_url: placement.screen_sharing_url.clone(),
        event_ingestion_url: placement.event_ingestion_url.clone(),
    }
}

fn meeting_features_body(features: &MeetingFeaturesConfiguration) -> MeetingFeaturesBody {
    MeetingFeaturesBody {
        audio: features.audio.as_ref().map(|audio| AudioFeaturesBody {
            echo_reduction: audio.echo_reduction.as_ref().map(|s| s.as_str().to_string()),
        }),
        video: features.video.as_ref().map(|video| ResolutionFeaturesBody {
            max_resolution: video.max_resolution.as_ref().map(|r| r.as_str().to_string()),
        }),
        content: features.content.as_ref().map(|content| ResolutionFeaturesBody {
            max_resolution: content.max_resolution.as_ref().map(|r| r.as_str().to_string()),
        }),
        attendee: features.attendee.as_ref().map(|attendee| AttendeeFeaturesBody {
            max_count: attendee.max_count,
        }),
    }
}

fn meeting_body(meeting: &SdkMeeting) -> Result<MeetingBody, ProviderError> {
    let meeting_id = meeting
        .meeting_id()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ProviderError::InvalidResponse("meeting has no MeetingId".to_string()))?;

    Ok(MeetingBody {
        meeting_id: meeting_id.to_string(),
        meeting_host_id: owned(meeting.meeting_host_id()),
        external_meeting_id: owned(meeting.external_meeting_id()),
        media_region: owned(meeting.media_region()),
        media_placement: meeting.media_placement.as_ref().map(media_placement_body),
        meeting_features: meeting.meeting_features.as_ref().map(meeting_features_body),
        primary_meeting_id: owned(meeting.primary_meeting_id()),
        tenant_ids: meeting.tenant_ids.clone(),
        meeting_arn: owned(meeting.meeting_arn()),
    })
}

fn descriptor_from_body(body: MeetingBody) -> Result<MeetingDescriptor, ProviderError> {
    let raw = serde_json::to_string(&CreateMeetingBody { meeting: body })
        .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
    Ok(MeetingDescriptor::from_raw(raw))
}

fn credential_from_attendee(attendee: &SdkAttendee) -> Result<AttendeeCredential, ProviderError> {
    let field = |value: Option<&str>, name: &str| {
        value
            .map(str::to_string)
            .ok_or_else(|| ProviderError::InvalidResponse(format!("attendee has no {name}")))
    };

    Ok(AttendeeCredential {
        attendee: Attendee {
            external_user_id: field(attendee.external_user_id(), "ExternalUserId")?,
            attendee_id: field(attendee.attendee_id(), "AttendeeId")?,
            join_token: field(attendee.join_token(), "JoinToken")?,
            capabilities: attendee.capabilities.as_ref().map(|caps| AttendeeCapabilities {
                audio: caps.audio.as_str().to_string(),
                video: caps.video.as_str().to_string(),
                content: caps.content.as_str().to_string(),
            }),
        },
    })
}

/// Map an SDK failure onto the provider error taxonomy.
fn classify<E, R>(operation: &str, err: SdkError<E, R>) -> ProviderError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = format!("{operation}: {}", DisplayErrorContext(&err));

    match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => {
            return ProviderError::Unavailable(message)
        }
        _ => {}
    }

    match err.as_service_error().and_then(|e| e.code()) {
        Some("NotFoundException") => ProviderError::NotFound(message),
        Some(
            "ThrottledClientException"
            | "ServiceUnavailableException"
            | "ServiceFailureException"
            | "LimitExceededException",
        ) => ProviderError::Unavailable(message),
        _ => ProviderError::Rejected(message),
    }
}

#[async_trait]
impl MeetingProvider for ChimeMeetingProvider {
    async fn create_meeting(
        &self,
        idempotency_token: &str,
        external_meeting_id: &str,
    ) -> Result<MeetingDescriptor, ProviderError> {
        let output = self
            .client
            .create_meeting()
            .client_request_token(idempotency_token)
            .external_meeting_id(external_meeting_id)
            .media_region(&self.media_region)
            .send()
            .await
            .map_err(|e| classify("CreateMeeting", e))?;

        let meeting = output.meeting().ok_or_else(|| {
            ProviderError::InvalidResponse("CreateMeeting returned no meeting".to_string())
        })?;

        let body = meeting_body(meeting)?;
        debug!(meeting_id = %body.meeting_id, media_region = ?body.media_region, "chime meeting created");
        descriptor_from_body(body)
    }

    async fn create_attendee(
        &self,
        meeting_id: &str,
        external_user_id: &str,
    ) -> Result<AttendeeCredential, ProviderError> {
        let output = self
            .client
            .create_attendee()
            .meeting_id(meeting_id)
            .external_user_id(external_user_id)
            .send()
            .await
            .map_err(|e| classify("CreateAttendee", e))?;

        let attendee = output.attendee().ok_or_else(|| {
            ProviderError::InvalidResponse("CreateAttendee returned no attendee".to_string())
        })?;

        credential_from_attendee(attendee)
    }

    async fn delete_meeting(&self, meeting_id: &str) -> Result<(), ProviderError> {
        self.client
            .delete_meeting()
            .meeting_id(meeting_id)
            .send()
            .await
            .map_err(|e| classify("DeleteMeeting", e))?;

        Ok(())
    }
}
