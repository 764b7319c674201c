//! Command-level errors.
//!
//! The `Display` text of each variant is the exact wire message; encoding an
//! error reply is `RespValue::Error(error.to_string())`.

use thiserror::Error;

use crate::key_value_store::StoreError;
use crate::resp::RespValue;
use crate::stream::StreamError;

#[derive(Error, Debug, PartialEq, Clone)]
pub enum CommandError {
    #[error("ERR unknown command")]
    UnknownCommand,
    #[error("ERR syntax error")]
    SyntaxError,
    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongNumberOfArguments(String),
    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,
    #[error("ERR invalid expire time in set")]
    InvalidExpireTime,
    #[error("ERR timeout is not a float or out of range")]
    TimeoutNotFloat,
    #[error("ERR timeout is not an integer or out of range")]
    TimeoutNotInteger,
    #[error(
        "ERR Unbalanced XREAD list of streams: for each stream key an ID or '$' must be specified."
    )]
    UnbalancedXread,
    #[error("ERR EXEC without MULTI")]
    ExecWithoutMulti,
    #[error("ERR DISCARD without MULTI")]
    DiscardWithoutMulti,
    #[error("ERR MULTI calls can not be nested")]
    NestedMulti,
    #[error("EXECABORT Transaction discarded because of previous errors.")]
    ExecAborted,
    #[error("ERR {0}")]
    Stream(#[from] StreamError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CommandError {
    /// Shorthand for the arity error, which takes the lowercase command name.
    pub fn wrong_arity(command: &str) -> Self {
        CommandError::WrongNumberOfArguments(command.to_string())
    }

    pub fn as_resp(&self) -> RespValue {
        RespValue::Error(self.to_string())
    }
}
