//! services/api/src/bin/api.rs

use chat_api_lib::{
    adapters::{DbAdapter, FileStorageAdapter, GeminiChatAdapter},
    config::Config,
    error::ApiError,
    web::{self, rest::ApiDoc, state::AppState},
};
use chat_core::{gateway::ChatGateway, ports::KeyValueStorage};
use axum::{
    http::{header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE}, HeaderValue, Method},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Choose the Durable Storage ---
    let storage: Arc<dyn KeyValueStorage> = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let db_adapter = DbAdapter::new(db_pool);
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(db_adapter)
        }
        None => {
            info!("No DATABASE_URL set; storing chats under {:?}", config.storage_dir);
            Arc::new(FileStorageAdapter::new(config.storage_dir.clone()))
        }
    };

    // --- 3. Initialize the Model Provider & Gateway ---
    let provider = Arc::new(GeminiChatAdapter::connect(
        config.require_api_key()?,
        &config.provider_base_url,
        config.chat_model.clone(),
    ));
    let mut gateway = ChatGateway::new(provider);
    if let Some(timeout) = config.provider_timeout {
        gateway = gateway.with_timeout(timeout);
    }
    info!("Using chat model {}", config.chat_model);

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(storage, Arc::new(gateway)));

    // --- 5. Create the Web Router ---
    let allowed_origin = config.allowed_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid ALLOWED_ORIGIN '{}': {}", config.allowed_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(web::router(app_state, cors))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
