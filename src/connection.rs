//! Per-connection read loop.
//!
//! Requests on a connection are strictly serialized: the next frame is not
//! parsed until the current reply has been written in full. Partial frames
//! accumulate in the connection's buffer across reads; leftover bytes after
//! a frame stay in the buffer, so pipelined requests are handled one at a
//! time in arrival order.

use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedReadHalf;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::commands::{TransactionState, dispatch_command};
use crate::config::ServerConfig;
use crate::key_value_store::KeyValueStore;
use crate::resp::{RespError, RespValue};
use crate::state::State;

enum ReadOutcome {
    Frame(RespValue),
    /// Clean EOF, or an I/O error; either way the connection is done.
    Closed,
    /// The buffered bytes are not a valid frame. The buffer has been
    /// discarded and the connection stays open.
    Malformed,
}

pub async fn handle_client_connection(
    stream: TcpStream,
    config: Arc<ServerConfig>,
    client_address: String,
    store: Arc<Mutex<KeyValueStore>>,
    state: Arc<Mutex<State>>,
) {
    let (mut reader, mut writer) = stream.into_split();
    let mut buffer = BytesMut::with_capacity(4096);
    let mut transaction = TransactionState::new();

    debug!(client = %client_address, "client connected");

    loop {
        let frame = match read_frame(&mut reader, &mut buffer).await {
            ReadOutcome::Frame(frame) => frame,
            ReadOutcome::Closed => break,
            ReadOutcome::Malformed => {
                let reply = RespValue::Error("ERR unknown command".to_string());
                if writer.write_all(reply.encode().as_bytes()).await.is_err() {
                    break;
                }
                continue;
            }
        };

        let response = dispatch_command(
            frame,
            &mut transaction,
            &client_address,
            &config,
            &store,
            &state,
        )
        .await;

        if let Err(error) = writer.write_all(response.encode().as_bytes()).await {
            warn!(client = %client_address, %error, "failed to write reply");
            break;
        }
    }

    // Queued transaction state and any registered waiters die with the task:
    // the waiter's receiver is dropped and notification skips it.
    debug!(client = %client_address, "client disconnected");
}

async fn read_frame(reader: &mut OwnedReadHalf, buffer: &mut BytesMut) -> ReadOutcome {
    loop {
        match RespValue::parse(buffer) {
            Ok(frame) => return ReadOutcome::Frame(frame),
            Err(RespError::Incomplete) => (),
            Err(error) => {
                debug!(%error, "discarding malformed frame");
                buffer.clear();
                return ReadOutcome::Malformed;
            }
        }

        match reader.read_buf(buffer).await {
            Ok(0) => return ReadOutcome::Closed,
            Ok(_) => (),
            Err(error) => {
                debug!(%error, "read failed");
                return ReadOutcome::Closed;
            }
        }
    }
}
