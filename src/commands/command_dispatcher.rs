//! Transaction state machine and top-level dispatch.
//!
//! Each connection owns a [`TransactionState`]; nothing here is shared.
//! MULTI switches the connection into queueing mode, where commands are
//! name/arity-checked and stored instead of run. A failed check marks the
//! transaction dirty and EXEC then aborts the whole block. EXEC replays the
//! queue sequentially, capturing one structured reply per command (errors
//! included) into a single array; the store lock is taken per command, not
//! across the block.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::commands::command_error::CommandError;
use crate::commands::command_handler::Command;
use crate::config::ServerConfig;
use crate::key_value_store::KeyValueStore;
use crate::resp::RespValue;
use crate::state::State;

#[derive(Debug, Default)]
pub struct TransactionState {
    in_multi: bool,
    queue: Vec<Command>,
    dirty: bool,
}

impl TransactionState {
    pub fn new() -> Self {
        TransactionState::default()
    }

    pub fn is_queueing(&self) -> bool {
        self.in_multi
    }

    fn reset(&mut self) {
        self.in_multi = false;
        self.queue.clear();
        self.dirty = false;
    }
}

/// Routes one parsed frame through the transaction state machine and returns
/// the reply to write. Command failures become error frames here; only I/O
/// decides the connection's fate.
pub async fn dispatch_command(
    frame: RespValue,
    transaction: &mut TransactionState,
    client_address: &str,
    config: &Arc<ServerConfig>,
    store: &Arc<Mutex<KeyValueStore>>,
    state: &Arc<Mutex<State>>,
) -> RespValue {
    let command = match Command::from_resp(frame) {
        Ok(command) => command,
        Err(error) => {
            if transaction.in_multi {
                transaction.dirty = true;
            }
            return error.as_resp();
        }
    };

    match command.name.as_str() {
        "MULTI" => {
            if !command.arguments.is_empty() {
                return CommandError::wrong_arity("multi").as_resp();
            }
            if transaction.in_multi {
                return CommandError::NestedMulti.as_resp();
            }

            transaction.in_multi = true;
            transaction.queue.clear();
            transaction.dirty = false;

            RespValue::SimpleString("OK".to_string())
        }
        "EXEC" => {
            if !command.arguments.is_empty() {
                return CommandError::wrong_arity("exec").as_resp();
            }
            if !transaction.in_multi {
                return CommandError::ExecWithoutMulti.as_resp();
            }

            let dirty = transaction.dirty;
            let queued = std::mem::take(&mut transaction.queue);
            transaction.reset();

            if dirty {
                return CommandError::ExecAborted.as_resp();
            }

            let mut replies = Vec::with_capacity(queued.len());

            for queued_command in &queued {
                let reply = queued_command
                    .execute(client_address, config, store, state, false)
                    .await
                    .unwrap_or_else(|error| error.as_resp());
                replies.push(reply);
            }

            RespValue::Array(replies)
        }
        "DISCARD" => {
            if !command.arguments.is_empty() {
                return CommandError::wrong_arity("discard").as_resp();
            }
            if !transaction.in_multi {
                return CommandError::DiscardWithoutMulti.as_resp();
            }

            transaction.reset();

            RespValue::SimpleString("OK".to_string())
        }
        _ if transaction.in_multi => match command.validate() {
            Some(error) => {
                transaction.dirty = true;
                error.as_resp()
            }
            None => {
                transaction.queue.push(command);
                RespValue::SimpleString("QUEUED".to_string())
            }
        },
        _ => command
            .execute(client_address, config, store, state, true)
            .await
            .unwrap_or_else(|error| error.as_resp()),
    }
}
