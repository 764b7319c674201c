//! Shared helpers for integration tests: an in-process environment wired
//! the same way a connection task is, plus reply builders.

#![allow(dead_code)]

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::Instant;

use tidekv::commands::{TransactionState, dispatch_command};
use tidekv::config::ServerConfig;
use tidekv::key_value_store::KeyValueStore;
use tidekv::resp::RespValue;
use tidekv::state::State;

pub struct TestEnv {
    pub config: Arc<ServerConfig>,
    pub store: Arc<Mutex<KeyValueStore>>,
    pub state: Arc<Mutex<State>>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            config: Arc::new(ServerConfig {
                port: 6379,
                started_at: Instant::now(),
            }),
            store: Arc::new(Mutex::new(KeyValueStore::new())),
            state: Arc::new(Mutex::new(State::new())),
        }
    }

    pub fn clone_handles(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            store: Arc::clone(&self.store),
            state: Arc::clone(&self.state),
        }
    }

    /// Runs one command as `client` outside any transaction and returns the
    /// encoded reply.
    pub async fn run(&self, client: &str, parts: &[&str]) -> String {
        let mut transaction = TransactionState::new();
        self.run_in(&mut transaction, client, parts).await
    }

    /// Runs one command against a connection-owned transaction state.
    pub async fn run_in(
        &self,
        transaction: &mut TransactionState,
        client: &str,
        parts: &[&str],
    ) -> String {
        dispatch_command(
            command_frame(parts),
            transaction,
            client,
            &self.config,
            &self.store,
            &self.state,
        )
        .await
        .encode()
    }
}

pub fn command_frame(parts: &[&str]) -> RespValue {
    RespValue::Array(
        parts
            .iter()
            .map(|part| RespValue::BulkString(part.to_string()))
            .collect(),
    )
}

pub fn simple(value: &str) -> String {
    format!("+{}\r\n", value)
}

pub fn error(message: &str) -> String {
    format!("-{}\r\n", message)
}

pub fn integer(value: i64) -> String {
    format!(":{}\r\n", value)
}

pub fn bulk(value: &str) -> String {
    format!("${}\r\n{}\r\n", value.len(), value)
}

pub fn null_bulk() -> String {
    "$-1\r\n".to_string()
}

pub fn null_array() -> String {
    "*-1\r\n".to_string()
}

pub fn array_of_bulks(items: &[&str]) -> String {
    let mut encoded = format!("*{}\r\n", items.len());
    for item in items {
        encoded.push_str(&bulk(item));
    }
    encoded
}
