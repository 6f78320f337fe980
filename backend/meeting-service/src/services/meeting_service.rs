//! Join/leave orchestration over the meeting store and the conferencing provider.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::{JoinInfo, JoinRequest, LeaveRequest, MeetingDescriptor};
use crate::provider::{MeetingProvider, ProviderError};
use crate::store::{MeetingStore, StoreError};
use crate::timeout::with_timeout;

/// Provider limit for external meeting and user ids, in characters.
pub const EXTERNAL_ID_MAX_CHARS: usize = 64;

pub const JOIN_PARAMS_MESSAGE: &str = "Need parameters: title, name, region";
pub const LEAVE_PARAMS_MESSAGE: &str = "Need parameters: title";

const ATTENDEE_PREFIX_CHARS: usize = 8;

#[derive(Debug, Clone, Copy)]
pub struct ServiceTimeouts {
    pub store: Duration,
    pub provider: Duration,
}

impl Default for ServiceTimeouts {
    fn default() -> Self {
        Self {
            store: Duration::from_millis(3_000),
            provider: Duration::from_millis(10_000),
        }
    }
}

/// Longest prefix of `value` with at most `max` characters.
pub fn truncate_chars(value: &str, max: usize) -> &str {
    match value.char_indices().nth(max) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

/// `<8 random hex chars>#<name>`, cut to the provider limit.
pub fn external_user_id(name: &str) -> String {
    let random = Uuid::new_v4().simple().to_string();
    let prefix = truncate_chars(&random, ATTENDEE_PREFIX_CHARS);
    let composed = format!("{prefix}#{name}");
    truncate_chars(&composed, EXTERNAL_ID_MAX_CHARS).to_string()
}

pub struct MeetingService {
    store: Arc<dyn MeetingStore>,
    provider: Arc<dyn MeetingProvider>,
    timeouts: ServiceTimeouts,
}

impl MeetingService {
    pub fn new(
        store: Arc<dyn MeetingStore>,
        provider: Arc<dyn MeetingProvider>,
        timeouts: ServiceTimeouts,
    ) -> Self {
        Self {
            store,
            provider,
            timeouts,
        }
    }

    /// Resolve (or create) the meeting for the title and mint an attendee for it.
    #[instrument(skip(self, request), fields(title = tracing::field::Empty))]
    pub async fn join(&self, request: JoinRequest) -> Result<JoinInfo> {
        let invalid = || AppError::Validation(JOIN_PARAMS_MESSAGE.to_string());
        request.validate().map_err(|_| invalid())?;
        let (Some(title), Some(name)) = (request.title, request.name) else {
            return Err(invalid());
        };
        tracing::Span::current().record("title", title.as_str());

        let meeting = self.resolve_meeting(&title).await?;
        let meeting_id = meeting.meeting_id()?;

        let user_id = external_user_id(&name);
        let attendee = with_timeout(
            "create_attendee",
            self.timeouts.provider,
            self.provider.create_attendee(&meeting_id, &user_id),
        )
        .await?;

        info!(
            meeting_id = %meeting_id,
            attendee_id = %attendee.attendee.attendee_id,
            "attendee joined"
        );

        Ok(JoinInfo { meeting, attendee })
    }

    /// End the meeting for the title and drop its record.
    #[instrument(skip(self, request), fields(title = tracing::field::Empty))]
    pub async fn leave(&self, request: LeaveRequest) -> Result<()> {
        let invalid = || AppError::Validation(LEAVE_PARAMS_MESSAGE.to_string());
        request.validate().map_err(|_| invalid())?;
        let Some(title) = request.title else {
            return Err(invalid());
        };
        tracing::Span::current().record("title", title.as_str());

        let record = with_timeout("store_get", self.timeouts.store, self.store.get(&title))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("meeting {title}")))?;
        let meeting_id = record.descriptor.meeting_id()?;

        let deleted = with_timeout(
            "delete_meeting",
            self.timeouts.provider,
            self.provider.delete_meeting(&meeting_id),
        )
        .await;

        match deleted {
            Ok(()) => {
                self.forget(&title).await;
                info!(meeting_id = %meeting_id, "meeting ended");
                Ok(())
            }
            Err(AppError::Provider(ProviderError::NotFound(detail))) => {
                warn!(meeting_id = %meeting_id, %detail, "meeting already ended; dropping stale record");
                self.forget(&title).await;
                Err(AppError::NotFound(format!("meeting {title} has already ended")))
            }
            Err(err) => Err(err),
        }
    }

    async fn resolve_meeting(&self, title: &str) -> Result<MeetingDescriptor> {
        if let Some(record) =
            with_timeout("store_get", self.timeouts.store, self.store.get(title)).await?
        {
            debug!(expires_at = %record.expires_at, "reusing stored meeting");
            return Ok(record.descriptor);
        }

        let token = Uuid::new_v4().to_string();
        let external_id = truncate_chars(title, EXTERNAL_ID_MAX_CHARS);
        let created = with_timeout(
            "create_meeting",
            self.timeouts.provider,
            self.provider.create_meeting(&token, external_id),
        )
        .await
        .inspect_err(|err| {
            if matches!(err, AppError::Timeout { .. }) {
                // Chime ends a meeting on its own once it sits without attendees.
                warn!(idempotency_token = %token, "create_meeting timed out; meeting may exist provider-side");
            }
        })?;

        let stored = with_timeout(
            "store_put",
            self.timeouts.store,
            self.store.put(title, &created),
        )
        .await;

        match stored {
            Ok(record) => {
                info!(expires_at = %record.expires_at, "meeting created");
                Ok(record.descriptor)
            }
            Err(AppError::Store(StoreError::AlreadyExists(_))) => {
                warn!("concurrent join created this meeting first; adopting stored record");
                self.discard(&created).await;
                with_timeout("store_get", self.timeouts.store, self.store.get(title))
                    .await?
                    .map(|record| record.descriptor)
                    .ok_or_else(|| {
                        AppError::Store(StoreError::Backend(format!(
                            "record for {title} vanished after a conflicting write"
                        )))
                    })
            }
            Err(err @ AppError::Timeout { .. }) => {
                self.settle_unacknowledged_write(title, created, err).await
            }
            Err(err) => {
                self.discard(&created).await;
                Err(err)
            }
        }
    }

    /// A timed-out put may still have landed. Only discard our meeting when the
    /// store provably points elsewhere.
    async fn settle_unacknowledged_write(
        &self,
        title: &str,
        created: MeetingDescriptor,
        timed_out: AppError,
    ) -> Result<MeetingDescriptor> {
        let ours = created.meeting_id()?;

        let current =
            match with_timeout("store_get", self.timeouts.store, self.store.get(title)).await {
                Ok(current) => current,
                Err(err) => {
                    warn!(meeting_id = %ours, error = %err, "cannot confirm meeting record; keeping meeting");
                    return Err(timed_out);
                }
            };

        match current {
            Some(record) if record.descriptor.meeting_id().ok().as_deref() == Some(ours.as_str()) => {
                info!(expires_at = %record.expires_at, "meeting record confirmed after slow write");
                Ok(record.descriptor)
            }
            Some(record) => {
                warn!("concurrent join stored another meeting; adopting stored record");
                self.discard(&created).await;
                Ok(record.descriptor)
            }
            None => {
                warn!(meeting_id = %ours, "meeting record not confirmed; keeping meeting");
                Err(timed_out)
            }
        }
    }

    /// Best-effort removal of a provider meeting that never made it into the store.
    async fn discard(&self, descriptor: &MeetingDescriptor) {
        let meeting_id = match descriptor.meeting_id() {
            Ok(id) => id,
            Err(err) => {
                warn!(error = %err, "cannot discard orphaned meeting");
                return;
            }
        };

        if let Err(err) = with_timeout(
            "delete_meeting",
            self.timeouts.provider,
            self.provider.delete_meeting(&meeting_id),
        )
        .await
        {
            warn!(meeting_id = %meeting_id, error = %err, "failed to discard orphaned meeting");
        }
    }

    // Record removal after the provider call is advisory; TTL expiry covers failures.
    async fn forget(&self, title: &str) {
        if let Err(err) =
            with_timeout("store_delete", self.timeouts.store, self.store.delete(title)).await
        {
            warn!(error = %err, "failed to delete meeting record");
        }
    }
}
