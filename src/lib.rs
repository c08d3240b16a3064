pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod state;
pub mod background;

use crate::config::Config;
use crate::infra::factory::bootstrap_state;
use api::router::create_router;
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};
use crate::background::start_notification_dispatcher;
use crate::config::{LogConfig, LogFormat, LogRotation};

const LOG_FILE_PREFIX: &str = "rsvp-service.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn console_layer(format: LogFormat) -> BoxedLayer {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let layer = tracing_subscriber::fmt::layer().with_target(false);
    match format {
        LogFormat::Pretty => layer.pretty().with_filter(filter).boxed(),
        LogFormat::Compact => layer.compact().with_filter(filter).boxed(),
        LogFormat::Json => layer.json().with_target(true).with_filter(filter).boxed(),
    }
}

/// Console logging plus an optional rolling JSON file. The guard must outlive the server.
pub fn init_logging(settings: &LogConfig) -> Option<WorkerGuard> {
    let mut layers: Vec<BoxedLayer> = vec![console_layer(settings.console_format)];

    let guard = settings.file_dir.as_ref().map(|dir| {
        let rotation = match settings.file_rotation {
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Never => Rotation::NEVER,
        };
        let (writer, guard) = tracing_appender::non_blocking(RollingFileAppender::new(rotation, dir, LOG_FILE_PREFIX));
        let filter = EnvFilter::try_new(&settings.file_filter).unwrap_or_else(|_| EnvFilter::new("info"));
        layers.push(
            tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_writer(writer)
                .with_filter(filter)
                .boxed(),
        );
        guard
    });

    tracing_subscriber::registry().with(layers).init();

    match &settings.file_dir {
        Some(dir) => info!(format = ?settings.console_format, dir = %dir, "Logging initialized"),
        None => info!(format = ?settings.console_format, "Logging initialized without a file sink"),
    }
    guard
}

pub async fn run() {
    dotenvy::dotenv().ok();
    let _guard = init_logging(&LogConfig::from_env());

    let config = Config::from_env();
    let state = bootstrap_state(&config).await;
    let state_arc = Arc::new(state);

    let worker_state = state_arc.clone();
    tokio::spawn(async move {
        start_notification_dispatcher(worker_state).await;
    });

    let app = create_router(state_arc);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .expect("Failed to bind listener");

    info!("Server running on port {} ({})", config.port, config.app_env);
    axum::serve(listener, app).await.expect("Server error");
}
