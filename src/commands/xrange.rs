use std::sync::Arc;

use tokio::sync::Mutex;

use crate::commands::command_error::CommandError;
use crate::commands::stream_utils::entries_to_resp;
use crate::key_value_store::KeyValueStore;
use crate::resp::RespValue;
use crate::stream::{StreamId, parse_range_end, parse_range_start};

pub struct XrangeArguments {
    key: String,
    start: StreamId,
    end: StreamId,
    count: Option<usize>,
}

impl XrangeArguments {
    /// `XRANGE key start end [COUNT n]` with `-`/`+` as open bounds.
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 3 && arguments.len() != 5 {
            return Err(CommandError::wrong_arity("xrange"));
        }

        let start = parse_range_start(&arguments[1])?;
        let end = parse_range_end(&arguments[2])?;

        let count = if arguments.len() == 5 {
            if !arguments[3].eq_ignore_ascii_case("count") {
                return Err(CommandError::SyntaxError);
            }

            Some(
                arguments[4]
                    .parse::<usize>()
                    .map_err(|_| CommandError::NotAnInteger)?,
            )
        } else {
            None
        };

        Ok(Self {
            key: arguments.into_iter().next().unwrap_or_default(),
            start,
            end,
            count,
        })
    }
}

pub async fn xrange(
    store: &Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<RespValue, CommandError> {
    let xrange_arguments = XrangeArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;

    let Some(stream) = store_guard.stream(&xrange_arguments.key)? else {
        return Ok(RespValue::Array(vec![]));
    };

    let entries = stream.range(
        xrange_arguments.start,
        xrange_arguments.end,
        xrange_arguments.count,
    );

    Ok(entries_to_resp(entries))
}
