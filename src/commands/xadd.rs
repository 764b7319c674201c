use std::sync::Arc;

use jiff::Timestamp;
use tokio::sync::Mutex;

use crate::commands::command_error::CommandError;
use crate::key_value_store::KeyValueStore;
use crate::resp::RespValue;
use crate::state::State;
use crate::stream::{EntryFields, IdSpec};

pub struct XaddArguments {
    key: String,
    id_spec: IdSpec,
    fields: EntryFields,
}

impl XaddArguments {
    /// `XADD key id field value [field value ...]`.
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 4 || arguments[2..].len() % 2 != 0 {
            return Err(CommandError::wrong_arity("xadd"));
        }

        let id_spec = IdSpec::parse(&arguments[1])?;

        let fields = arguments[2..]
            .chunks(2)
            .map(|chunk| (chunk[0].clone(), chunk[1].clone()))
            .collect::<EntryFields>();

        Ok(Self {
            key: arguments.into_iter().next().unwrap_or_default(),
            id_spec,
            fields,
        })
    }
}

/// Appends an entry and wakes every XREAD waiter on the key while the store
/// lock is still held.
pub async fn xadd(
    store: &Arc<Mutex<KeyValueStore>>,
    state: &Arc<Mutex<State>>,
    arguments: Vec<String>,
) -> Result<RespValue, CommandError> {
    let xadd_arguments = XaddArguments::parse(arguments)?;
    let now_ms = now_unix_ms();

    let mut store_guard = store.lock().await;
    let id = store_guard.stream_add(
        &xadd_arguments.key,
        xadd_arguments.id_spec,
        now_ms,
        xadd_arguments.fields,
    )?;

    let mut state_guard = state.lock().await;
    state_guard.notify_stream_waiters(&xadd_arguments.key);

    Ok(RespValue::BulkString(id.to_string()))
}

fn now_unix_ms() -> u64 {
    Timestamp::now().as_millisecond().max(0) as u64
}
