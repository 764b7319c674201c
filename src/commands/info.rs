use std::sync::Arc;

use crate::commands::command_error::CommandError;
use crate::config::ServerConfig;
use crate::resp::RespValue;

enum InfoSection {
    Default,
    Server,
    Replication,
    Unknown,
}

struct InfoArguments {
    section: InfoSection,
}

impl InfoArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() > 1 {
            return Err(CommandError::wrong_arity("info"));
        }

        let section = match arguments.first() {
            None => InfoSection::Default,
            Some(section) => match section.to_lowercase().as_str() {
                "server" => InfoSection::Server,
                "replication" => InfoSection::Replication,
                _ => InfoSection::Unknown,
            },
        };

        Ok(InfoArguments { section })
    }
}

pub fn validate(arguments: &[String]) -> Option<CommandError> {
    InfoArguments::parse(arguments.to_vec()).err()
}

/// Replies with `key:value` lines as a bulk string. An unknown section name
/// yields an empty bulk string.
pub fn info(config: &Arc<ServerConfig>, arguments: Vec<String>) -> Result<RespValue, CommandError> {
    let info_arguments = InfoArguments::parse(arguments)?;

    let body = match info_arguments.section {
        InfoSection::Server => server_lines(config),
        InfoSection::Replication => replication_lines(),
        InfoSection::Default => format!("{}{}", server_lines(config), replication_lines()),
        InfoSection::Unknown => String::new(),
    };

    Ok(RespValue::BulkString(body))
}

fn server_lines(config: &Arc<ServerConfig>) -> String {
    format!(
        "tcp_port:{}\r\nuptime_in_seconds:{}\r\n",
        config.port,
        config.uptime_in_seconds()
    )
}

fn replication_lines() -> String {
    "role:master\r\n".to_string()
}
