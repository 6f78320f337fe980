use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{MeetingStore, StoreError};
use crate::models::{MeetingDescriptor, MeetingRecord};

/// Process-local store for development and tests.
///
/// Same contract as the DynamoDB store, including lazy expiry.
pub struct MemoryMeetingStore {
    records: DashMap<String, MeetingRecord>,
    retention: Duration,
}

impl MemoryMeetingStore {
    pub fn new(retention: Duration) -> Self {
        Self {
            records: DashMap::new(),
            retention,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for MemoryMeetingStore {
    fn default() -> Self {
        Self::new(Duration::seconds(i64::from(super::DEFAULT_RETENTION_SECS)))
    }
}

#[async_trait]
impl MeetingStore for MemoryMeetingStore {
    async fn get(&self, title: &str) -> Result<Option<MeetingRecord>, StoreError> {
        let now = Utc::now();
        // Clone out before remove_if; holding the read guard would deadlock the shard.
        let record = self.records.get(title).map(|r| r.value().clone());

        match record {
            Some(record) if record.is_expired(now) => {
                self.records.remove_if(title, |_, r| r.is_expired(now));
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn put(
        &self,
        title: &str,
        descriptor: &MeetingDescriptor,
    ) -> Result<MeetingRecord, StoreError> {
        let now = Utc::now();
        let record = MeetingRecord {
            title: title.to_string(),
            descriptor: descriptor.clone(),
            expires_at: now + self.retention,
        };

        match self.records.entry(title.to_string()) {
            Entry::Occupied(entry) if !entry.get().is_expired(now) => {
                Err(StoreError::AlreadyExists(title.to_string()))
            }
            Entry::Occupied(mut entry) => {
                entry.insert(record.clone());
                Ok(record)
            }
            Entry::Vacant(entry) => {
                entry.insert(record.clone());
                Ok(record)
            }
        }
    }

    async fn delete(&self, title: &str) -> Result<(), StoreError> {
        self.records.remove(title);
        Ok(())
    }
}
