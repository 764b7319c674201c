//! TCP listener and accept loop.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::connection::handle_client_connection;
use crate::key_value_store::KeyValueStore;
use crate::state::State;

pub struct Server {
    config: Arc<ServerConfig>,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Server {
            config: Arc::new(config),
        }
    }

    /// Binds `0.0.0.0:<port>` and serves until the process is terminated.
    /// A bind failure is the only fatal error.
    pub async fn run(&self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(("0.0.0.0", self.config.port))
            .await
            .with_context(|| format!("failed to bind port {}", self.config.port))?;

        info!(port = self.config.port, "listening");

        self.serve(listener).await
    }

    /// Accept loop over an already-bound listener. Split from [`Server::run`]
    /// so tests can bind an ephemeral port themselves.
    pub async fn serve(&self, listener: TcpListener) -> anyhow::Result<()> {
        let store = Arc::new(Mutex::new(KeyValueStore::new()));
        let state = Arc::new(Mutex::new(State::new()));

        loop {
            match listener.accept().await {
                Ok((stream, client_address)) => {
                    let config = Arc::clone(&self.config);
                    let store = Arc::clone(&store);
                    let state = Arc::clone(&state);

                    tokio::spawn(async move {
                        handle_client_connection(
                            stream,
                            config,
                            client_address.to_string(),
                            store,
                            state,
                        )
                        .await;
                    });
                }
                Err(error) => {
                    warn!(%error, "failed to accept connection");
                }
            }
        }
    }
}
