#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::web;
use async_trait::async_trait;
use meeting_service::models::{
    Attendee, AttendeeCapabilities, AttendeeCredential, MeetingDescriptor, MeetingRecord,
};
use meeting_service::provider::{MeetingProvider, ProviderError};
use meeting_service::services::{MeetingService, ServiceTimeouts};
use meeting_service::store::{MeetingStore, MemoryMeetingStore, StoreError};
use meeting_service::AppState;

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    NotFound,
    Rejected,
    Unavailable,
}

impl Failure {
    fn into_error(self, operation: &str) -> ProviderError {
        let detail = format!("{operation}: injected failure");
        match self {
            Failure::NotFound => ProviderError::NotFound(detail),
            Failure::Rejected => ProviderError::Rejected(detail),
            Failure::Unavailable => ProviderError::Unavailable(detail),
        }
    }
}

#[derive(Debug, Default)]
pub struct Calls {
    /// (idempotency token, external meeting id)
    pub created: Vec<(String, String)>,
    /// (meeting id, external user id)
    pub attendees: Vec<(String, String)>,
    pub deleted: Vec<String>,
}

/// In-process stand-in for the conferencing provider that records every call.
#[derive(Default)]
pub struct RecordingProvider {
    calls: Mutex<Calls>,
    sequence: AtomicUsize,
    delay: Option<Duration>,
    create_failure: Option<Failure>,
    delete_failure: Option<Failure>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing_create(mut self, failure: Failure) -> Self {
        self.create_failure = Some(failure);
        self
    }

    pub fn failing_delete(mut self, failure: Failure) -> Self {
        self.delete_failure = Some(failure);
        self
    }

    pub fn created(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().created.clone()
    }

    pub fn attendees(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().attendees.clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.calls.lock().unwrap().deleted.clone()
    }

    fn next(&self) -> usize {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

pub fn descriptor(meeting_id: &str, external_id: &str) -> MeetingDescriptor {
    MeetingDescriptor::from_raw(
        serde_json::json!({
            "Meeting": {
                "MeetingId": meeting_id,
                "ExternalMeetingId": external_id,
                "MediaRegion": "us-east-1",
                "MediaPlacement": {
                    "AudioHostUrl": format!("{meeting_id}.audio.example:3478"),
                    "SignalingUrl": format!("wss://signal.example/control/{meeting_id}"),
                }
            }
        })
        .to_string(),
    )
}

#[async_trait]
impl MeetingProvider for RecordingProvider {
    async fn create_meeting(
        &self,
        idempotency_token: &str,
        external_meeting_id: &str,
    ) -> Result<MeetingDescriptor, ProviderError> {
        self.pause().await;
        if let Some(failure) = self.create_failure {
            return Err(failure.into_error("CreateMeeting"));
        }

        let meeting_id = format!("meeting-{}", self.next());
        self.calls.lock().unwrap().created.push((
            idempotency_token.to_string(),
            external_meeting_id.to_string(),
        ));
        Ok(descriptor(&meeting_id, external_meeting_id))
    }

    async fn create_attendee(
        &self,
        meeting_id: &str,
        external_user_id: &str,
    ) -> Result<AttendeeCredential, ProviderError> {
        self.pause().await;
        let n = self.next();
        let mut calls = self.calls.lock().unwrap();
        if calls.deleted.iter().any(|id| id == meeting_id) {
            return Err(ProviderError::NotFound(format!("meeting {meeting_id}")));
        }

        calls
            .attendees
            .push((meeting_id.to_string(), external_user_id.to_string()));
        Ok(AttendeeCredential {
            attendee: Attendee {
                external_user_id: external_user_id.to_string(),
                attendee_id: format!("attendee-{n}"),
                join_token: format!("token-{n}"),
                capabilities: Some(AttendeeCapabilities {
                    audio: "SendReceive".to_string(),
                    video: "SendReceive".to_string(),
                    content: "SendReceive".to_string(),
                }),
            },
        })
    }

    async fn delete_meeting(&self, meeting_id: &str) -> Result<(), ProviderError> {
        self.pause().await;
        if let Some(failure) = self.delete_failure {
            return Err(failure.into_error("DeleteMeeting"));
        }

        self.calls
            .lock()
            .unwrap()
            .deleted
            .push(meeting_id.to_string());
        Ok(())
    }
}

/// Store whose first `stale_reads` lookups miss, as if another join wrote
/// the record between this join's read and its write.
pub struct RacingStore {
    inner: MemoryMeetingStore,
    stale_reads: AtomicUsize,
}

impl RacingStore {
    pub fn new(inner: MemoryMeetingStore, stale_reads: usize) -> Self {
        Self {
            inner,
            stale_reads: AtomicUsize::new(stale_reads),
        }
    }
}

#[async_trait]
impl MeetingStore for RacingStore {
    async fn get(&self, title: &str) -> Result<Option<MeetingRecord>, StoreError> {
        let stale = self
            .stale_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if stale {
            return Ok(None);
        }
        self.inner.get(title).await
    }

    async fn put(
        &self,
        title: &str,
        descriptor: &MeetingDescriptor,
    ) -> Result<MeetingRecord, StoreError> {
        self.inner.put(title, descriptor).await
    }

    async fn delete(&self, title: &str) -> Result<(), StoreError> {
        self.inner.delete(title).await
    }
}

/// Store that accepts reads but refuses writes.
#[derive(Default)]
pub struct ReadOnlyStore {
    inner: MemoryMeetingStore,
}

#[async_trait]
impl MeetingStore for ReadOnlyStore {
    async fn get(&self, title: &str) -> Result<Option<MeetingRecord>, StoreError> {
        self.inner.get(title).await
    }

    async fn put(
        &self,
        _title: &str,
        _descriptor: &MeetingDescriptor,
    ) -> Result<MeetingRecord, StoreError> {
        Err(StoreError::Backend("table is read-only".to_string()))
    }

    async fn delete(&self, _title: &str) -> Result<(), StoreError> {
        Err(StoreError::Backend("table is read-only".to_string()))
    }
}

/// Store whose writes either land before a slow acknowledgement or stall
/// without landing, as a backend call can when it outlives its deadline.
pub struct SlowWriteStore {
    inner: MemoryMeetingStore,
    delay: Duration,
    lands: bool,
}

impl SlowWriteStore {
    pub fn landing(delay: Duration) -> Self {
        Self {
            inner: MemoryMeetingStore::default(),
            delay,
            lands: true,
        }
    }

    pub fn stalling(delay: Duration) -> Self {
        Self {
            inner: MemoryMeetingStore::default(),
            delay,
            lands: false,
        }
    }
}

#[async_trait]
impl MeetingStore for SlowWriteStore {
    async fn get(&self, title: &str) -> Result<Option<MeetingRecord>, StoreError> {
        self.inner.get(title).await
    }

    async fn put(
        &self,
        title: &str,
        descriptor: &MeetingDescriptor,
    ) -> Result<MeetingRecord, StoreError> {
        if !self.lands {
            tokio::time::sleep(self.delay).await;
            return self.inner.put(title, descriptor).await;
        }

        let record = self.inner.put(title, descriptor).await?;
        tokio::time::sleep(self.delay).await;
        Ok(record)
    }

    async fn delete(&self, title: &str) -> Result<(), StoreError> {
        self.inner.delete(title).await
    }
}

pub fn app_state(
    store: Arc<dyn MeetingStore>,
    provider: Arc<dyn MeetingProvider>,
) -> web::Data<AppState> {
    app_state_with_timeouts(store, provider, ServiceTimeouts::default())
}

pub fn app_state_with_timeouts(
    store: Arc<dyn MeetingStore>,
    provider: Arc<dyn MeetingProvider>,
    timeouts: ServiceTimeouts,
) -> web::Data<AppState> {
    web::Data::new(AppState::new(MeetingService::new(store, provider, timeouts)))
}
