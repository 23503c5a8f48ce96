use std::sync::Arc;

use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use serde_json::Value;
use textstore::api::{AppState, handler};
use textstore::core::config::AppConfig;
use textstore::repository::MongoTextRepository;
use textstore::repository::mongo::connect;
use textstore::telemetry::{LogSpanProcessor, TracerProvider};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Error> {
    textstore::setup_logging();

    let config = AppConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        Error::from(e)
    })?;

    let client = connect(&config.mongodb_uri).await.map_err(|e| {
        error!("MongoDB connection failed: {}", e);
        Error::from(e)
    })?;

    let guard = TracerProvider::builder(config.service_name.clone())
        .with_processor(Arc::new(LogSpanProcessor))
        .build()
        .into_guard();
    let tracer = guard.provider().tracer(&config.service_name);

    let repo = MongoTextRepository::from_client(
        &client,
        &config.mongodb_database,
        &config.mongodb_collection,
    );
    let state = Arc::new(AppState::new(Arc::new(repo), tracer, &config));

    info!(
        service = %config.service_name,
        database = %config.mongodb_database,
        collection = %config.mongodb_collection,
        "Starting text store API"
    );

    let result = run(service_fn(move |event: LambdaEvent<Value>| {
        let state = Arc::clone(&state);
        async move { handler(&state, event).await }
    }))
    .await;

    drop(guard);
    client.shutdown().await;
    result
}
