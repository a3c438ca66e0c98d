use std::{net::SocketAddr, sync::Arc};

use telehook_core::{
    application::{config::RuntimeConfig, startup},
    bus::InMemoryBus,
};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};

pub(crate) struct ServerHandle {
    pub(crate) addr: SocketAddr,
    pub(crate) config: RuntimeConfig,
    pub(crate) bus: Arc<InMemoryBus>,
    shutdown: Option<oneshot::Sender<()>>,
    join: JoinHandle<()>,
}

impl ServerHandle {
    pub(crate) async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        let _ = self.join.await;
    }
}

pub(crate) async fn spawn_server() -> ServerHandle {
    let listener = TcpListener::bind(("127.0.0.1", 0))
        .await
        .expect("listener should bind");
    let addr = listener.local_addr().expect("listener should expose local addr");

    let config = RuntimeConfig::for_test();
    let config_clone = clone_config_for_assertions(&config);
    let bus = Arc::new(InMemoryBus::new());

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let bus_for_server = bus.clone();
    let join = tokio::spawn(async move {
        let _ = startup::run_with_listener(listener, config, bus_for_server, async {
            let _ = shutdown_rx.await;
        })
        .await;
    });

    // Give the HTTP listener a moment to start accepting connections.
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    ServerHandle {
        addr,
        config: config_clone,
        bus,
        shutdown: Some(shutdown_tx),
        join,
    }
}

/// `RuntimeConfig` holds an `RsaPublicKey`/no `Clone` impl worth relying on
/// for tests, so tests that need the webhook path or secret salt get their
/// own freshly constructed copy instead of reaching into the moved one.
fn clone_config_for_assertions(_config: &RuntimeConfig) -> RuntimeConfig {
    RuntimeConfig::for_test()
}
