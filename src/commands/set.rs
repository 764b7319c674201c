use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::commands::command_error::CommandError;
use crate::key_value_store::KeyValueStore;
use crate::resp::RespValue;

pub struct SetArguments {
    key: String,
    value: String,
    expiration: Option<Instant>,
}

impl SetArguments {
    /// `SET key value [EX seconds | PX milliseconds]`. The expire time must
    /// be a positive integer; the deadline is computed at parse time.
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 2 {
            return Err(CommandError::wrong_arity("set"));
        }

        let expiration = match arguments.len() {
            2 => None,
            4 => {
                let option = arguments[2].to_uppercase();

                if option != "EX" && option != "PX" {
                    return Err(CommandError::SyntaxError);
                }

                let amount = arguments[3]
                    .parse::<i64>()
                    .map_err(|_| CommandError::NotAnInteger)?;

                if amount <= 0 {
                    return Err(CommandError::InvalidExpireTime);
                }

                let ttl = if option == "EX" {
                    Duration::from_secs(amount as u64)
                } else {
                    Duration::from_millis(amount as u64)
                };

                Some(Instant::now() + ttl)
            }
            _ => return Err(CommandError::SyntaxError),
        };

        let mut arguments = arguments.into_iter();

        Ok(Self {
            key: arguments.next().unwrap_or_default(),
            value: arguments.next().unwrap_or_default(),
            expiration,
        })
    }
}

pub async fn set(
    store: &Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<RespValue, CommandError> {
    let set_arguments = SetArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;
    store_guard.set(
        set_arguments.key,
        set_arguments.value,
        set_arguments.expiration,
    );

    Ok(RespValue::SimpleString("OK".to_string()))
}
