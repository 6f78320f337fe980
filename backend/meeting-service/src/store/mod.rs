//! Meeting record persistence.
//!
//! One record per meeting title. Records carry an expiration timestamp set at
//! write time; expired records read as absent and may be overwritten.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{MeetingDescriptor, MeetingRecord};

pub mod dynamo;
pub mod memory;

pub use dynamo::DynamoMeetingStore;
pub use memory::MemoryMeetingStore;

/// Default retention window for meeting records.
pub const DEFAULT_RETENTION_SECS: u32 = 60 * 60 * 24;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a live meeting record already exists for {0}")]
    AlreadyExists(String),

    #[error("meeting record for {title} is corrupt: {reason}")]
    Corrupt { title: String, reason: String },

    #[error("meeting store error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait MeetingStore: Send + Sync {
    /// Fetch the live record for `title`, if any.
    async fn get(&self, title: &str) -> Result<Option<MeetingRecord>, StoreError>;

    /// Create the record for `title`, expiring one retention window from now.
    ///
    /// Fails with [`StoreError::AlreadyExists`] when a live record is present.
    async fn put(
        &self,
        title: &str,
        descriptor: &MeetingDescriptor,
    ) -> Result<MeetingRecord, StoreError>;

    /// Remove the record for `title`. Removing an absent record succeeds.
    async fn delete(&self, title: &str) -> Result<(), StoreError>;
}
