//! Command-line flags and server configuration.

use thiserror::Error;
use tokio::time::Instant;

#[derive(Error, Debug, PartialEq, Clone)]
pub enum CliError {
    #[error("Invalid command line flag")]
    InvalidCommandLineFlag,
    #[error("Invalid port flag value")]
    InvalidPortFlagValue,
}

/// Immutable per-process configuration, shared with every connection task.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// The TCP port the server listens on.
    pub port: u16,
    /// Process start time, reported as uptime by INFO.
    pub started_at: Instant,
}

impl ServerConfig {
    /// Parses command-line arguments (the first entry is the program name).
    ///
    /// Supported flags:
    ///
    /// * `--port <port>` - port to listen on (default: 6379)
    pub fn from_args<I: IntoIterator<Item = String>>(command_line_args: I) -> Result<Self, CliError> {
        let mut iter = command_line_args.into_iter().skip(1);
        let mut port: Option<u16> = None;

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--port" => {
                    let Some(port_str) = iter.next() else {
                        return Err(CliError::InvalidCommandLineFlag);
                    };

                    port = Some(validate_port_flag(&port_str)?);
                }
                _ => return Err(CliError::InvalidCommandLineFlag),
            }
        }

        Ok(ServerConfig {
            port: port.unwrap_or(6379),
            started_at: Instant::now(),
        })
    }

    pub fn uptime_in_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

fn validate_port_flag(port: &str) -> Result<u16, CliError> {
    let port_number = port
        .parse::<u16>()
        .map_err(|_| CliError::InvalidPortFlagValue)?;

    if port_number == 0 {
        return Err(CliError::InvalidPortFlagValue);
    }

    Ok(port_number)
}
