use crate::commands::command_error::CommandError;
use crate::resp::RespValue;

pub fn validate(arguments: &[String]) -> Option<CommandError> {
    if arguments.len() != 1 {
        return Some(CommandError::wrong_arity("echo"));
    }
    None
}

pub fn echo(arguments: Vec<String>) -> Result<RespValue, CommandError> {
    if let Some(error) = validate(&arguments) {
        return Err(error);
    }

    let message = arguments.into_iter().next().unwrap_or_default();

    Ok(RespValue::BulkString(message))
}
