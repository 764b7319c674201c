//! XREAD: multi-stream read with optional blocking.
//!
//! Offsets are exclusive lower bounds. `$` resolves once, at subscribe time,
//! to the stream's last ID as seen under the first store lock, so entries
//! added while the caller is blocked are exactly the ones it receives.
//! Waiters re-register under the store lock on a spurious wake, mirroring
//! the BLPOP loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::time::Instant;

use crate::commands::command_error::CommandError;
use crate::commands::stream_utils::entries_to_resp;
use crate::key_value_store::KeyValueStore;
use crate::resp::RespValue;
use crate::state::{State, Waiter};
use crate::stream::{StreamId, parse_read_offset};

pub struct XreadArguments {
    count: Option<usize>,
    block_ms: Option<u64>,
    keys: Vec<String>,
    raw_ids: Vec<String>,
}

impl XreadArguments {
    /// `XREAD [COUNT n] [BLOCK ms] STREAMS key [key ...] id [id ...]`.
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.is_empty() {
            return Err(CommandError::wrong_arity("xread"));
        }

        let mut count = None;
        let mut block_ms = None;
        let mut index = 0;

        loop {
            let Some(token) = arguments.get(index) else {
                return Err(CommandError::SyntaxError);
            };

            match token.to_uppercase().as_str() {
                "COUNT" => {
                    let raw = arguments.get(index + 1).ok_or(CommandError::SyntaxError)?;
                    count = Some(raw.parse::<usize>().map_err(|_| CommandError::NotAnInteger)?);
                    index += 2;
                }
                "BLOCK" => {
                    let raw = arguments.get(index + 1).ok_or(CommandError::SyntaxError)?;
                    block_ms = Some(
                        raw.parse::<u64>()
                            .map_err(|_| CommandError::TimeoutNotInteger)?,
                    );
                    index += 2;
                }
                "STREAMS" => {
                    index += 1;
                    break;
                }
                _ => return Err(CommandError::SyntaxError),
            }
        }

        let rest = &arguments[index..];

        if rest.is_empty() || rest.len() % 2 != 0 {
            return Err(CommandError::UnbalancedXread);
        }

        let half = rest.len() / 2;

        Ok(Self {
            count,
            block_ms,
            keys: rest[..half].to_vec(),
            raw_ids: rest[half..].to_vec(),
        })
    }
}

pub async fn xread(
    client_address: &str,
    store: &Arc<Mutex<KeyValueStore>>,
    state: &Arc<Mutex<State>>,
    arguments: Vec<String>,
    block_permitted: bool,
) -> Result<RespValue, CommandError> {
    let xread_arguments = XreadArguments::parse(arguments)?;

    let blocking = block_permitted && xread_arguments.block_ms.is_some();
    let deadline = xread_arguments
        .block_ms
        .filter(|ms| blocking && *ms > 0)
        .map(|ms| Instant::now() + Duration::from_millis(ms));

    let (sender, mut receiver) = mpsc::channel(1);

    // First pass: resolve offsets and try an immediate read. On a miss the
    // waiters are registered before the store lock is released.
    let offsets;
    {
        let mut store_guard = store.lock().await;
        offsets = resolve_offsets(
            &mut store_guard,
            &xread_arguments.keys,
            &xread_arguments.raw_ids,
        )?;

        let results = read_streams(&mut store_guard, &offsets, xread_arguments.count)?;

        if !results.is_empty() {
            return Ok(RespValue::Array(results));
        }

        if blocking {
            let mut state_guard = state.lock().await;
            register_waiters(&mut state_guard, &xread_arguments.keys, client_address, &sender);
        }
    }

    if !blocking {
        return Ok(RespValue::NullArray);
    }

    loop {
        let woken = wait_for_signal(&mut receiver, deadline).await;
        remove_waiters(state, &xread_arguments.keys, client_address).await;

        if !woken {
            return Ok(RespValue::NullArray);
        }

        let mut store_guard = store.lock().await;
        let results = read_streams(&mut store_guard, &offsets, xread_arguments.count)?;

        if !results.is_empty() {
            return Ok(RespValue::Array(results));
        }

        // Spurious wake: back to sleep, re-registered under the store lock.
        let mut state_guard = state.lock().await;
        register_waiters(&mut state_guard, &xread_arguments.keys, client_address, &sender);
    }
}

/// Resolves each raw ID, turning `$` into the stream's current last ID
/// (`0-0` for a missing key, so the first entry ever added matches).
fn resolve_offsets(
    store_guard: &mut KeyValueStore,
    keys: &[String],
    raw_ids: &[String],
) -> Result<Vec<(String, StreamId)>, CommandError> {
    let mut offsets = Vec::with_capacity(keys.len());

    for (key, raw_id) in keys.iter().zip(raw_ids) {
        let offset = if raw_id == "$" {
            store_guard.last_stream_id(key)?
        } else {
            parse_read_offset(raw_id)?
        };

        offsets.push((key.clone(), offset));
    }

    Ok(offsets)
}

fn read_streams(
    store_guard: &mut KeyValueStore,
    offsets: &[(String, StreamId)],
    count: Option<usize>,
) -> Result<Vec<RespValue>, CommandError> {
    let mut results = Vec::new();

    for (key, offset) in offsets {
        let Some(stream) = store_guard.stream(key)? else {
            continue;
        };

        let entries = stream.entries_after(*offset, count);

        if !entries.is_empty() {
            results.push(RespValue::Array(vec![
                RespValue::BulkString(key.clone()),
                entries_to_resp(entries),
            ]));
        }
    }

    Ok(results)
}

fn register_waiters(
    state_guard: &mut State,
    keys: &[String],
    client_address: &str,
    sender: &mpsc::Sender<()>,
) {
    for key in keys {
        state_guard.add_stream_waiter(
            key.clone(),
            Waiter {
                client_address: client_address.to_string(),
                sender: sender.clone(),
            },
        );
    }
}

async fn remove_waiters(state: &Arc<Mutex<State>>, keys: &[String], client_address: &str) {
    let mut state_guard = state.lock().await;

    for key in keys {
        state_guard.remove_stream_waiter(key, client_address);
    }
}

async fn wait_for_signal(receiver: &mut mpsc::Receiver<()>, deadline: Option<Instant>) -> bool {
    match deadline {
        None => receiver.recv().await.is_some(),
        Some(deadline) => match tokio::time::timeout_at(deadline, receiver.recv()).await {
            Ok(signal) => signal.is_some(),
            Err(_) => false,
        },
    }
}
