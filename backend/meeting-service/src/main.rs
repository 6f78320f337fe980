/// Meeting Service - HTTP Server
///
/// Signaling backend for video meetings: `/join` and `/leave` over a
/// DynamoDB meeting table and Amazon Chime SDK Meetings.
use actix_web::{web, App, HttpServer};
use aws_config::BehaviorVersion;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

use meeting_service::config::{Config, StoreBackend};
use meeting_service::error::AppError;
use meeting_service::provider::{ChimeMeetingProvider, MeetingProvider};
use meeting_service::services::MeetingService;
use meeting_service::store::{DynamoMeetingStore, MeetingStore, MemoryMeetingStore};
use meeting_service::{handlers, logging, AppState};

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    logging::init_tracing();

    let config = Config::from_env()?;

    tracing::info!("Starting meeting-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let aws = aws_config::load_defaults(BehaviorVersion::latest()).await;

    let store: Arc<dyn MeetingStore> = match &config.store.backend {
        StoreBackend::DynamoDb { table_name } => {
            tracing::info!(table = %table_name, "using DynamoDB meeting store");
            Arc::new(DynamoMeetingStore::new(
                aws_sdk_dynamodb::Client::new(&aws),
                table_name.clone(),
                config.store.retention(),
            ))
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory meeting store; records are lost on restart");
            Arc::new(MemoryMeetingStore::new(config.store.retention()))
        }
    };

    tracing::info!(media_region = %config.provider.media_region, "using Chime SDK meetings");
    let provider: Arc<dyn MeetingProvider> = Arc::new(ChimeMeetingProvider::new(
        aws_sdk_chimesdkmeetings::Client::new(&aws),
        config.provider.media_region.clone(),
    ));

    let state = web::Data::new(AppState::new(MeetingService::new(
        store,
        provider,
        config.timeouts(),
    )));

    let bind_addr = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!(%bind_addr, "starting HTTP server");

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(state.clone())
            .route("/health", web::get().to(|| async { "OK" }))
            .configure(handlers::configure_routes)
    })
    .bind(&bind_addr)
    .map_err(|e| AppError::StartServer(format!("bind {bind_addr}: {e}")))?
    .run()
    .await
    .map_err(|e| AppError::StartServer(format!("HTTP server: {e}")))
}
