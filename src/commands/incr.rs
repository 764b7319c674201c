use std::sync::Arc;

use tokio::sync::Mutex;

use crate::commands::command_error::CommandError;
use crate::key_value_store::KeyValueStore;
use crate::resp::RespValue;

pub fn validate(arguments: &[String]) -> Option<CommandError> {
    if arguments.len() != 1 {
        return Some(CommandError::wrong_arity("incr"));
    }
    None
}

pub async fn incr(
    store: &Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<RespValue, CommandError> {
    if let Some(error) = validate(&arguments) {
        return Err(error);
    }

    let mut store_guard = store.lock().await;
    let incremented = store_guard.incr(&arguments[0])?;

    Ok(RespValue::Integer(incremented))
}
