use crate::commands::command_error::CommandError;
use crate::resp::RespValue;

pub fn validate(arguments: &[String]) -> Option<CommandError> {
    if arguments.len() > 1 {
        return Some(CommandError::wrong_arity("ping"));
    }
    None
}

pub fn ping(arguments: Vec<String>) -> Result<RespValue, CommandError> {
    if let Some(error) = validate(&arguments) {
        return Err(error);
    }

    match arguments.into_iter().next() {
        None => Ok(RespValue::SimpleString("PONG".to_string())),
        Some(message) => Ok(RespValue::SimpleString(message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping() {
        assert_eq!(
            ping(vec![]),
            Ok(RespValue::SimpleString("PONG".to_string()))
        );
        assert_eq!(
            ping(vec!["hello".to_string()]),
            Ok(RespValue::SimpleString("hello".to_string()))
        );
        assert_eq!(
            ping(vec!["a".to_string(), "b".to_string()]),
            Err(CommandError::wrong_arity("ping"))
        );
    }
}
