//! DynamoDB-backed meeting store.
//!
//! Item layout: `Title` (S, partition key), `Data` (S, serialized descriptor),
//! `TTL` (N, epoch seconds, configured as the table's TTL attribute).
//! DynamoDB sweeps expired items lazily, so reads and conditional writes
//! compare against `TTL` themselves.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::{MeetingStore, StoreError};
use crate::models::{MeetingDescriptor, MeetingRecord};

const TITLE_ATTR: &str = "Title";
const DATA_ATTR: &str = "Data";
const TTL_ATTR: &str = "TTL";

#[derive(Clone)]
pub struct DynamoMeetingStore {
    client: Client,
    table_name: String,
    retention: Duration,
}

impl DynamoMeetingStore {
    pub fn new(client: Client, table_name: impl Into<String>, retention: Duration) -> Self {
        Self {
            client,
            table_name: table_name.into(),
            retention,
        }
    }
}

fn record_from_item(
    title: &str,
    item: &HashMap<String, AttributeValue>,
) -> Result<MeetingRecord, StoreError> {
    let corrupt = |reason: &str| StoreError::Corrupt {
        title: title.to_string(),
        reason: reason.to_string(),
    };

    let data = item
        .get(DATA_ATTR)
        .and_then(|v| v.as_s().ok())
        .ok_or_else(|| corrupt("missing string attribute Data"))?;

    let expires_at = item
        .get(TTL_ATTR)
        .and_then(|v| v.as_n().ok())
        .and_then(|n| n.parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| corrupt("missing numeric attribute TTL"))?;

    Ok(MeetingRecord {
        title: title.to_string(),
        descriptor: MeetingDescriptor::from_raw(data.clone()),
        expires_at,
    })
}

#[async_trait]
impl MeetingStore for DynamoMeetingStore {
    async fn get(&self, title: &str) -> Result<Option<MeetingRecord>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(TITLE_ATTR, AttributeValue::S(title.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| StoreError::Backend(DisplayErrorContext(&e).to_string()))?;

        let Some(item) = output.item() else {
            return Ok(None);
        };

        let record = record_from_item(title, item)?;
        if record.is_expired(Utc::now()) {
            debug!(title = %title, expires_at = %record.expires_at, "ignoring expired meeting record");
            return Ok(None);
        }

        Ok(Some(record))
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

        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .item(TITLE_ATTR, AttributeValue::S(title.to_string()))
            .item(DATA_ATTR, AttributeValue::S(descriptor.as_str().to_string()))
            .item(
                TTL_ATTR,
                AttributeValue::N(record.expires_at.timestamp().to_string()),
            )
            .condition_expression("attribute_not_exists(#title) OR #ttl <= :now")
            .expression_attribute_names("#title", TITLE_ATTR)
            .expression_attribute_names("#ttl", TTL_ATTR)
            .expression_attribute_values(":now", AttributeValue::N(now.timestamp().to_string()))
            .send()
            .await;

        match result {
            Ok(_) => Ok(record),
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_conditional_check_failed_exception() {
                    Err(StoreError::AlreadyExists(title.to_string()))
                } else {
                    Err(StoreError::Backend(
                        DisplayErrorContext(&service_err).to_string(),
                    ))
                }
            }
        }
    }

    async fn delete(&self, title: &str) -> Result<(), StoreError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key(TITLE_ATTR, AttributeValue::S(title.to_string()))
            .send()
            .await
            .map_err(|e| StoreError::Backend(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }
}
