use std::sync::Arc;

use tokio::sync::Mutex;

use crate::commands::command_error::CommandError;
use crate::key_value_store::KeyValueStore;
use crate::resp::RespValue;

pub struct LrangeArguments {
    key: String,
    start: i64,
    end: i64,
}

impl LrangeArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 3 {
            return Err(CommandError::wrong_arity("lrange"));
        }

        let start = arguments[1]
            .parse::<i64>()
            .map_err(|_| CommandError::NotAnInteger)?;
        let end = arguments[2]
            .parse::<i64>()
            .map_err(|_| CommandError::NotAnInteger)?;

        Ok(Self {
            key: arguments.into_iter().next().unwrap_or_default(),
            start,
            end,
        })
    }
}

pub async fn lrange(
    store: &Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<RespValue, CommandError> {
    let lrange_arguments = LrangeArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;
    let range = store_guard.list_range(
        &lrange_arguments.key,
        lrange_arguments.start,
        lrange_arguments.end,
    )?;

    Ok(RespValue::Array(
        range.into_iter().map(RespValue::BulkString).collect(),
    ))
}
