//! Parsed commands and dispatch.
//!
//! A [`Command`] is the uppercased name plus its arguments, pulled out of a
//! RESP array of bulk strings. Dispatch is a match on the name; every
//! handler returns a structured [`RespValue`] so a reply can either go to
//! the socket directly or be captured as one element of an EXEC reply
//! array.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::commands::{
    blpop::{self, BlpopArguments},
    command_error::CommandError,
    echo, get, incr, info, llen,
    lpop::{self, LpopArguments},
    lrange::{self, LrangeArguments},
    ping, rpush_and_lpush,
    set::{self, SetArguments},
    type_command,
    xadd::{self, XaddArguments},
    xrange::{self, XrangeArguments},
    xread::{self, XreadArguments},
};
use crate::config::ServerConfig;
use crate::key_value_store::KeyValueStore;
use crate::resp::RespValue;
use crate::state::State;

/// A client request: uppercased command name and its arguments in order.
#[derive(Debug, PartialEq, Clone)]
pub struct Command {
    pub name: String,
    pub arguments: Vec<String>,
}

impl Command {
    /// Extracts a command from a parsed RESP frame. Requests must be arrays
    /// of bulk strings with at least the command name.
    pub fn from_resp(input: RespValue) -> Result<Self, CommandError> {
        let RespValue::Array(elements) = input else {
            return Err(CommandError::UnknownCommand);
        };

        let mut parts = Vec::with_capacity(elements.len());

        for element in elements {
            match element {
                RespValue::BulkString(part) => parts.push(part),
                _ => return Err(CommandError::UnknownCommand),
            }
        }

        let mut parts = parts.into_iter();

        let Some(name) = parts.next() else {
            return Err(CommandError::UnknownCommand);
        };

        Ok(Self {
            name: name.to_uppercase(),
            arguments: parts.collect(),
        })
    }

    /// Checks name and arity without executing, used while queueing inside
    /// MULTI. Returns the error the command would fail with.
    pub fn validate(&self) -> Option<CommandError> {
        match self.name.as_str() {
            "PING" => ping::validate(&self.arguments),
            "ECHO" => echo::validate(&self.arguments),
            "GET" => get::validate(&self.arguments),
            "SET" => SetArguments::parse(self.arguments.clone()).err(),
            "INCR" => incr::validate(&self.arguments),
            "TYPE" => type_command::validate(&self.arguments),
            "RPUSH" => rpush_and_lpush::validate(&self.arguments, false),
            "LPUSH" => rpush_and_lpush::validate(&self.arguments, true),
            "LPOP" => LpopArguments::parse(self.arguments.clone()).err(),
            "LRANGE" => LrangeArguments::parse(self.arguments.clone()).err(),
            "LLEN" => llen::validate(&self.arguments),
            "BLPOP" => BlpopArguments::parse(self.arguments.clone()).err(),
            "XADD" => XaddArguments::parse(self.arguments.clone()).err(),
            "XRANGE" => XrangeArguments::parse(self.arguments.clone()).err(),
            "XREAD" => XreadArguments::parse(self.arguments.clone()).err(),
            "INFO" => info::validate(&self.arguments),
            _ => Some(CommandError::UnknownCommand),
        }
    }

    /// Runs the command against the store.
    ///
    /// `block_permitted` is false during EXEC replay, where BLPOP and
    /// XREAD BLOCK degrade to their non-blocking forms. MULTI, EXEC and
    /// DISCARD never reach this point; the dispatcher owns them.
    pub async fn execute(
        &self,
        client_address: &str,
        config: &Arc<ServerConfig>,
        store: &Arc<Mutex<KeyValueStore>>,
        state: &Arc<Mutex<State>>,
        block_permitted: bool,
    ) -> Result<RespValue, CommandError> {
        match self.name.as_str() {
            "PING" => ping::ping(self.arguments.clone()),
            "ECHO" => echo::echo(self.arguments.clone()),
            "GET" => get::get(store, self.arguments.clone()).await,
            "SET" => set::set(store, self.arguments.clone()).await,
            "INCR" => incr::incr(store, self.arguments.clone()).await,
            "TYPE" => type_command::type_command(store, self.arguments.clone()).await,
            "RPUSH" => rpush_and_lpush::rpush(store, state, self.arguments.clone()).await,
            "LPUSH" => rpush_and_lpush::lpush(store, state, self.arguments.clone()).await,
            "LPOP" => lpop::lpop(store, self.arguments.clone()).await,
            "LRANGE" => lrange::lrange(store, self.arguments.clone()).await,
            "LLEN" => llen::llen(store, self.arguments.clone()).await,
            "BLPOP" => {
                blpop::blpop(
                    client_address,
                    store,
                    state,
                    self.arguments.clone(),
                    block_permitted,
                )
                .await
            }
            "XADD" => xadd::xadd(store, state, self.arguments.clone()).await,
            "XRANGE" => xrange::xrange(store, self.arguments.clone()).await,
            "XREAD" => {
                xread::xread(
                    client_address,
                    store,
                    state,
                    self.arguments.clone(),
                    block_permitted,
                )
                .await
            }
            "INFO" => info::info(config, self.arguments.clone()),
            _ => Err(CommandError::UnknownCommand),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(parts: &[&str]) -> RespValue {
        RespValue::Array(
            parts
                .iter()
                .map(|part| RespValue::BulkString(part.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_from_resp() {
        let command = Command::from_resp(frame(&["get", "foo"])).unwrap();
        assert_eq!(command.name, "GET");
        assert_eq!(command.arguments, vec!["foo".to_string()]);

        let test_cases = vec![
            RespValue::SimpleString("PING".to_string()),
            RespValue::Array(vec![]),
            RespValue::Array(vec![RespValue::Integer(1)]),
            RespValue::NullArray,
        ];

        for input in test_cases {
            assert_eq!(
                Command::from_resp(input.clone()),
                Err(CommandError::UnknownCommand),
                "parsing {:?}",
                input
            );
        }
    }

    #[test]
    fn test_validate() {
        let test_cases = vec![
            (frame(&["PING"]), None),
            (frame(&["GET", "k"]), None),
            (frame(&["GET"]), Some(CommandError::wrong_arity("get"))),
            (frame(&["SET", "k"]), Some(CommandError::wrong_arity("set"))),
            (frame(&["BLPOP", "k", "zero"]), Some(CommandError::TimeoutNotFloat)),
            (frame(&["NOSUCH"]), Some(CommandError::UnknownCommand)),
        ];

        for (input, expected) in test_cases {
            let command = Command::from_resp(input).unwrap();
            assert_eq!(command.validate(), expected, "validating {}", command.name);
        }
    }
}
