use std::{future::Future, net::SocketAddr, time::Duration};

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{application::state::SharedContext, domain::error::DomainError, interfaces::telegram};

/// Graceful-shutdown drain deadline, per spec.md §5: in-flight requests get
/// this long to finish once the shutdown signal fires, after which new
/// connections are already rejected and the listener is torn down anyway.
const SHUTDOWN_DRAIN: Duration = Duration::from_secs(5);

pub fn build_router(ctx: SharedContext) -> Router {
    let webhook_route = format!("{}/{{webhook_id}}", ctx.config.web_hook_path);
    Router::new()
        .route("/healthz", get(healthz_handler))
        .route(&webhook_route, post(telegram::webhook_handler))
        .with_state(ctx)
}

pub async fn serve(
    listener: TcpListener,
    ctx: SharedContext,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), DomainError> {
    let local_addr = listener.local_addr().map_err(|error| {
        DomainError::Unavailable(format!("failed to read listener address: {error}"))
    })?;

    info!(
        "telehook-core listening on http://{}:{}, webhook_path={}",
        local_addr.ip(),
        local_addr.port(),
        ctx.config.web_hook_path,
    );

    let app = build_router(ctx).into_make_service_with_connect_info::<SocketAddr>();

    let (signalled_tx, mut signalled_rx) = tokio::sync::watch::channel(false);
    let graceful = async move {
        shutdown.await;
        let _ = signalled_tx.send(true);
    };

    let served = axum::serve(listener, app).with_graceful_shutdown(graceful);
    let drain_deadline = async move {
        let _ = signalled_rx.changed().await;
        tokio::time::sleep(SHUTDOWN_DRAIN).await;
    };

    tokio::select! {
        result = served => result.map_err(|error| DomainError::Unavailable(format!("server runtime error: {error}"))),
        () = drain_deadline => {
            warn!("graceful shutdown drain deadline exceeded, forcing stop");
            Ok(())
        }
    }
}

async fn healthz_handler() -> &'static str {
    "ok"
}
