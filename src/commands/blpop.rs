//! BLPOP: blocking multi-key head pop.
//!
//! The caller scans its keys in argument order under the store lock and pops
//! from the first non-empty list. On a miss it registers itself on every key
//! before the store lock is released, so a concurrent push can never fall
//! into the gap between scan and registration. A wakeup is only a hint:
//! the woken task reacquires the store lock and rescans, and whoever pops
//! first under that lock wins the element. Losers re-register and go back
//! to sleep until their deadline.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::time::Instant;

use crate::commands::command_error::CommandError;
use crate::key_value_store::KeyValueStore;
use crate::resp::RespValue;
use crate::state::{State, Waiter};

pub struct BlpopArguments {
    keys: Vec<String>,
    timeout_secs: f64,
}

impl BlpopArguments {
    /// `BLPOP key [key ...] timeout`. The timeout is seconds, fractional
    /// allowed, 0 meaning block forever.
    pub fn parse(mut arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 2 {
            return Err(CommandError::wrong_arity("blpop"));
        }

        let raw_timeout = arguments.pop().unwrap_or_default();
        let timeout_secs = raw_timeout
            .parse::<f64>()
            .map_err(|_| CommandError::TimeoutNotFloat)?;

        if !timeout_secs.is_finite() || timeout_secs < 0.0 {
            return Err(CommandError::TimeoutNotFloat);
        }

        Ok(Self {
            keys: arguments,
            timeout_secs,
        })
    }
}

pub async fn blpop(
    client_address: &str,
    store: &Arc<Mutex<KeyValueStore>>,
    state: &Arc<Mutex<State>>,
    arguments: Vec<String>,
    block_permitted: bool,
) -> Result<RespValue, CommandError> {
    let blpop_arguments = BlpopArguments::parse(arguments)?;

    let deadline = if blpop_arguments.timeout_secs > 0.0 {
        Some(Instant::now() + Duration::from_secs_f64(blpop_arguments.timeout_secs))
    } else {
        None
    };

    let (sender, mut receiver) = mpsc::channel(1);

    loop {
        let popped = scan_and_register(
            client_address,
            store,
            state,
            &blpop_arguments.keys,
            &sender,
            block_permitted,
        )
        .await?;

        if let Some((key, value)) = popped {
            return Ok(RespValue::Array(vec![
                RespValue::BulkString(key),
                RespValue::BulkString(value),
            ]));
        }

        if !block_permitted {
            return Ok(RespValue::NullArray);
        }

        let woken = wait_for_signal(&mut receiver, deadline).await;
        remove_waiters(state, &blpop_arguments.keys, client_address).await;

        if !woken {
            return Ok(RespValue::NullArray);
        }
    }
}

/// One pass under the store lock: pop from the first non-empty key, or
/// register the caller on every key while the lock is still held.
async fn scan_and_register(
    client_address: &str,
    store: &Arc<Mutex<KeyValueStore>>,
    state: &Arc<Mutex<State>>,
    keys: &[String],
    sender: &mpsc::Sender<()>,
    register_on_miss: bool,
) -> Result<Option<(String, String)>, CommandError> {
    let mut store_guard = store.lock().await;

    for key in keys {
        if let Some(value) = store_guard.pop_front(key)? {
            return Ok(Some((key.clone(), value)));
        }
    }

    if register_on_miss {
        let mut state_guard = state.lock().await;

        for key in keys {
            state_guard.add_list_waiter(
                key.clone(),
                Waiter {
                    client_address: client_address.to_string(),
                    sender: sender.clone(),
                },
            );
        }
    }

    Ok(None)
}

async fn remove_waiters(state: &Arc<Mutex<State>>, keys: &[String], client_address: &str) {
    let mut state_guard = state.lock().await;

    for key in keys {
        state_guard.remove_list_waiter(key, client_address);
    }
}

/// Waits for a wakeup or the deadline. `None` deadline blocks forever.
/// Returns false on timeout.
async fn wait_for_signal(receiver: &mut mpsc::Receiver<()>, deadline: Option<Instant>) -> bool {
    match deadline {
        None => receiver.recv().await.is_some(),
        Some(deadline) => match tokio::time::timeout_at(deadline, receiver.recv()).await {
            Ok(signal) => signal.is_some(),
            Err(_) => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse() {
        assert!(BlpopArguments::parse(args(&["q", "0"])).is_ok());
        assert!(BlpopArguments::parse(args(&["a", "b", "c", "1.5"])).is_ok());

        let test_cases = vec![
            (vec!["q"], CommandError::wrong_arity("blpop")),
            (vec![], CommandError::wrong_arity("blpop")),
            (vec!["q", "abc"], CommandError::TimeoutNotFloat),
            (vec!["q", "-1"], CommandError::TimeoutNotFloat),
            (vec!["q", "inf"], CommandError::TimeoutNotFloat),
            (vec!["q", "nan"], CommandError::TimeoutNotFloat),
        ];

        for (input, expected) in test_cases {
            assert_eq!(
                BlpopArguments::parse(args(&input)).err(),
                Some(expected),
                "parsing {:?}",
                input
            );
        }
    }

    #[test]
    fn test_parse_keeps_key_order() {
        let parsed = BlpopArguments::parse(args(&["first", "second", "0.5"])).unwrap();
        assert_eq!(parsed.keys, vec!["first".to_string(), "second".to_string()]);
        assert_eq!(parsed.timeout_secs, 0.5);
    }

    #[tokio::test]
    async fn test_immediate_pop_skips_registration() {
        let store = Arc::new(Mutex::new(KeyValueStore::new()));
        let state = Arc::new(Mutex::new(State::new()));

        {
            let mut store_guard = store.lock().await;
            store_guard.push("q", &["hello".to_string()], false).unwrap();
        }

        let result = blpop("127.0.0.1:1", &store, &state, args(&["q", "0"]), true).await;

        assert_eq!(
            result,
            Ok(RespValue::Array(vec![
                RespValue::BulkString("q".to_string()),
                RespValue::BulkString("hello".to_string()),
            ]))
        );
        assert_eq!(state.lock().await.list_waiter_count("q"), 0);
    }

    #[tokio::test]
    async fn test_scan_order_prefers_earlier_key() {
        let store = Arc::new(Mutex::new(KeyValueStore::new()));
        let state = Arc::new(Mutex::new(State::new()));

        {
            let mut store_guard = store.lock().await;
            store_guard.push("a", &["from-a".to_string()], false).unwrap();
            store_guard.push("b", &["from-b".to_string()], false).unwrap();
        }

        let result = blpop("127.0.0.1:1", &store, &state, args(&["a", "b", "0"]), true).await;

        assert_eq!(
            result,
            Ok(RespValue::Array(vec![
                RespValue::BulkString("a".to_string()),
                RespValue::BulkString("from-a".to_string()),
            ]))
        );
    }

    #[tokio::test]
    async fn test_timeout_returns_null_array() {
        let store = Arc::new(Mutex::new(KeyValueStore::new()));
        let state = Arc::new(Mutex::new(State::new()));

        let result = blpop("127.0.0.1:1", &store, &state, args(&["q", "0.05"]), true).await;

        assert_eq!(result, Ok(RespValue::NullArray));
        assert_eq!(state.lock().await.list_waiter_count("q"), 0);
    }

    #[tokio::test]
    async fn test_blocking_disabled_returns_immediately() {
        let store = Arc::new(Mutex::new(KeyValueStore::new()));
        let state = Arc::new(Mutex::new(State::new()));

        // Inside EXEC a BLPOP on an empty key must not suspend.
        let result = blpop("127.0.0.1:1", &store, &state, args(&["q", "0"]), false).await;

        assert_eq!(result, Ok(RespValue::NullArray));
        assert_eq!(state.lock().await.list_waiter_count("q"), 0);
    }

    #[tokio::test]
    async fn test_wrong_type_key_errors() {
        let store = Arc::new(Mutex::new(KeyValueStore::new()));
        let state = Arc::new(Mutex::new(State::new()));

        {
            let mut store_guard = store.lock().await;
            store_guard.set("s".to_string(), "v".to_string(), None);
        }

        let result = blpop("127.0.0.1:1", &store, &state, args(&["s", "0"]), true).await;
        assert!(result.is_err());
    }
}
