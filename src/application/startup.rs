use std::{future::Future, sync::Arc};

use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use crate::{
    application::{
        config::{Args, RuntimeConfig},
        state::Context,
    },
    bus::{AmqpBus, TopicBus},
    domain::error::DomainError,
    interfaces::http,
    registration,
};

pub async fn run(args: Args) -> Result<(), DomainError> {
    let config = RuntimeConfig::from_args(args)?;
    init_logging(&config.log_filter, config.json_logs)?;

    let listener = TcpListener::bind(("0.0.0.0", config.app_port))
        .await
        .map_err(|error| DomainError::Unavailable(format!("failed to bind listener: {error}")))?;

    let bus: Arc<dyn TopicBus> = Arc::new(AmqpBus::connect(&config.rabbitmq_url).await?);
    run_with_listener(listener, config, bus, shutdown_signal()).await
}

pub async fn run_with_listener(
    listener: TcpListener,
    config: RuntimeConfig,
    bus: Arc<dyn TopicBus>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), DomainError> {
    info!(
        app_port = config.app_port,
        web_hook_path = %config.web_hook_path,
        "starting telehook-core"
    );

    bus.declare_topology().await?;
    let ctx = Arc::new(Context::new(config, bus));

    let consumer_ctx = ctx.clone();
    let consumer_task = tokio::spawn(async move {
        if let Err(error) = registration::run(consumer_ctx).await {
            error!(%error, "registration consumer exited");
        }
    });

    let serve_result = http::serve(listener, ctx, shutdown).await;

    consumer_task.abort();
    if let Err(error) = consumer_task.await {
        if !error.is_cancelled() {
            warn!(%error, "registration consumer task ended abnormally");
        }
    }

    serve_result
}

fn init_logging(filter: &str, json_logs: bool) -> Result<(), DomainError> {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(env_filter).with_target(false);

    if json_logs {
        builder.json().try_init().map_err(|error| {
            DomainError::Unavailable(format!("failed to initialize logger: {error}"))
        })?;
    } else {
        builder.compact().try_init().map_err(|error| {
            DomainError::Unavailable(format!("failed to initialize logger: {error}"))
        })?;
    }

    Ok(())
}

/// Resolves on SIGINT or SIGTERM, whichever arrives first — spec.md §5
/// requires both to trigger the same graceful-shutdown path.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                warn!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received");
}
