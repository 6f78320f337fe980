//! Conferencing provider boundary.
//!
//! Pass-through capability over the managed conferencing service. No retry or
//! circuit breaking is layered here; callers bound each call with a timeout.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{AttendeeCredential, MeetingDescriptor};

pub mod chime;

pub use chime::ChimeMeetingProvider;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider resource not found: {0}")]
    NotFound(String),

    #[error("provider rejected request: {0}")]
    Rejected(String),

    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("provider returned an unusable response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait MeetingProvider: Send + Sync {
    async fn create_meeting(
        &self,
        idempotency_token: &str,
        external_meeting_id: &str,
    ) -> Result<MeetingDescriptor, ProviderError>;

    async fn create_attendee(
        &self,
        meeting_id: &str,
        external_user_id: &str,
    ) -> Result<AttendeeCredential, ProviderError>;

    /// Ends the meeting for every attendee.
    async fn delete_meeting(&self, meeting_id: &str) -> Result<(), ProviderError>;
}
