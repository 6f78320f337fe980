//! HTTP handlers for meeting-service
//!
//! Thin adapters: decode the JSON body, hand the typed request to
//! [`MeetingService`](crate::services::MeetingService), encode the result.

use actix_web::http::header::ContentType;
use actix_web::{web, HttpResponse};
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};
use crate::models::{DescriptorError, JoinRequest, JoinResponse, LeaveRequest};
use crate::state::AppState;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/join", web::post().to(join))
        .route("/leave", web::post().to(leave));
}

/// An absent body is treated as `{}`.
fn parse_body<T>(body: &[u8]) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))
}

/// POST /join
pub async fn join(state: web::Data<AppState>, body: web::Bytes) -> Result<HttpResponse> {
    let request: JoinRequest = parse_body(&body)?;
    let info = state.meetings.join(request).await?;

    let payload = serde_json::to_string_pretty(&JoinResponse::from(info))
        .map_err(|e| AppError::Descriptor(DescriptorError::Malformed(e.to_string())))?;

    Ok(HttpResponse::Ok()
        .content_type(ContentType::json())
        .body(payload))
}

/// POST /leave
pub async fn leave(state: web::Data<AppState>, body: web::Bytes) -> Result<HttpResponse> {
    let request: LeaveRequest = parse_body(&body)?;
    state.meetings.leave(request).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({})))
}
