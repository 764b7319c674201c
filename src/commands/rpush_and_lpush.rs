//! RPUSH and LPUSH.
//!
//! Both push through the same path; LPUSH prepends each value individually,
//! so the last argument ends up at the head. Pushing wakes blocked `BLPOP`
//! callers while the store lock is still held, one waiter per pushed
//! element, so no other mutator can slip between the push and the signal.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::commands::command_error::CommandError;
use crate::key_value_store::KeyValueStore;
use crate::resp::RespValue;
use crate::state::State;

pub fn validate(arguments: &[String], prepend: bool) -> Option<CommandError> {
    if arguments.len() < 2 {
        let name = if prepend { "lpush" } else { "rpush" };
        return Some(CommandError::wrong_arity(name));
    }
    None
}

pub async fn rpush(
    store: &Arc<Mutex<KeyValueStore>>,
    state: &Arc<Mutex<State>>,
    arguments: Vec<String>,
) -> Result<RespValue, CommandError> {
    push(store, state, arguments, false).await
}

pub async fn lpush(
    store: &Arc<Mutex<KeyValueStore>>,
    state: &Arc<Mutex<State>>,
    arguments: Vec<String>,
) -> Result<RespValue, CommandError> {
    push(store, state, arguments, true).await
}

async fn push(
    store: &Arc<Mutex<KeyValueStore>>,
    state: &Arc<Mutex<State>>,
    arguments: Vec<String>,
    prepend: bool,
) -> Result<RespValue, CommandError> {
    if let Some(error) = validate(&arguments, prepend) {
        return Err(error);
    }

    let key = &arguments[0];
    let values = &arguments[1..];

    let mut store_guard = store.lock().await;
    let new_length = store_guard.push(key, values, prepend)?;

    // Signal while the store lock is held: one waiter per pushed element.
    let mut state_guard = state.lock().await;
    state_guard.notify_list_waiters(key, values.len());

    Ok(RespValue::Integer(new_length as i64))
}
