use std::sync::Arc;

use tokio::sync::Mutex;

use crate::commands::command_error::CommandError;
use crate::key_value_store::KeyValueStore;
use crate::resp::RespValue;

pub struct LpopArguments {
    key: String,
    count: Option<usize>,
}

impl LpopArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.is_empty() || arguments.len() > 2 {
            return Err(CommandError::wrong_arity("lpop"));
        }

        let count = match arguments.get(1) {
            None => None,
            Some(raw) => Some(raw.parse::<usize>().map_err(|_| CommandError::NotAnInteger)?),
        };

        Ok(Self {
            key: arguments.into_iter().next().unwrap_or_default(),
            count,
        })
    }
}

/// Without a count the reply is a bulk string (or null bulk); with a count
/// it is an array, empty when nothing could be popped.
pub async fn lpop(
    store: &Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<RespValue, CommandError> {
    let lpop_arguments = LpopArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;

    match lpop_arguments.count {
        None => match store_guard.pop_front(&lpop_arguments.key)? {
            Some(value) => Ok(RespValue::BulkString(value)),
            None => Ok(RespValue::NullBulkString),
        },
        Some(count) => {
            let popped = store_guard.pop_front_count(&lpop_arguments.key, count)?;

            Ok(RespValue::Array(
                popped.into_iter().map(RespValue::BulkString).collect(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    async fn seed(store: &Arc<Mutex<KeyValueStore>>, key: &str, values: &[&str]) {
        let values: Vec<String> = values.iter().map(|s| s.to_string()).collect();
        store.lock().await.push(key, &values, false).unwrap();
    }

    #[tokio::test]
    async fn test_lpop_single() {
        let store = Arc::new(Mutex::new(KeyValueStore::new()));
        seed(&store, "q", &["a", "b"]).await;

        assert_eq!(
            lpop(&store, args(&["q"])).await,
            Ok(RespValue::BulkString("a".to_string()))
        );
        assert_eq!(
            lpop(&store, args(&["missing"])).await,
            Ok(RespValue::NullBulkString)
        );
    }

    #[tokio::test]
    async fn test_lpop_with_count() {
        let store = Arc::new(Mutex::new(KeyValueStore::new()));
        seed(&store, "q", &["a", "b", "c"]).await;

        assert_eq!(
            lpop(&store, args(&["q", "2"])).await,
            Ok(RespValue::Array(vec![
                RespValue::BulkString("a".to_string()),
                RespValue::BulkString("b".to_string()),
            ]))
        );

        // Popping more than remains drains the list.
        assert_eq!(
            lpop(&store, args(&["q", "10"])).await,
            Ok(RespValue::Array(vec![RespValue::BulkString(
                "c".to_string()
            )]))
        );

        // Missing key with a count is an empty array.
        assert_eq!(
            lpop(&store, args(&["q", "1"])).await,
            Ok(RespValue::Array(vec![]))
        );
    }

    #[tokio::test]
    async fn test_lpop_argument_errors() {
        let store = Arc::new(Mutex::new(KeyValueStore::new()));

        assert_eq!(
            lpop(&store, args(&[])).await,
            Err(CommandError::wrong_arity("lpop"))
        );
        assert_eq!(
            lpop(&store, args(&["q", "1", "2"])).await,
            Err(CommandError::wrong_arity("lpop"))
        );
        assert_eq!(
            lpop(&store, args(&["q", "abc"])).await,
            Err(CommandError::NotAnInteger)
        );
        assert_eq!(
            lpop(&store, args(&["q", "-1"])).await,
            Err(CommandError::NotAnInteger)
        );
    }
}
