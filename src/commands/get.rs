use std::sync::Arc;

use tokio::sync::Mutex;

use crate::commands::command_error::CommandError;
use crate::key_value_store::KeyValueStore;
use crate::resp::RespValue;

pub fn validate(arguments: &[String]) -> Option<CommandError> {
    if arguments.len() != 1 {
        return Some(CommandError::wrong_arity("get"));
    }
    None
}

pub async fn get(
    store: &Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<RespValue, CommandError> {
    if let Some(error) = validate(&arguments) {
        return Err(error);
    }

    let mut store_guard = store.lock().await;

    match store_guard.get(&arguments[0])? {
        Some(value) => Ok(RespValue::BulkString(value.to_string())),
        None => Ok(RespValue::NullBulkString),
    }
}
