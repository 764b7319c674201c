//! An in-memory data server speaking RESP v2 over TCP.
//!
//! Supported functionality:
//!
//! - String operations with per-key expiry (GET, SET, INCR)
//! - List operations (LPUSH, RPUSH, LPOP, LRANGE, LLEN) and blocking BLPOP
//! - Stream operations (XADD, XRANGE, XREAD) with blocking XREAD BLOCK
//! - Per-connection transactions (MULTI, EXEC, DISCARD)
//! - Server commands (PING, ECHO, TYPE, INFO)
//!
//! One tokio task serves each connection; the keyspace lives behind a single
//! mutex, and blocked readers are woken through a per-key wait registry.

pub mod commands;
pub mod config;
pub mod connection;
pub mod key_value_store;
pub mod resp;
pub mod server;
pub mod state;
pub mod stream;
