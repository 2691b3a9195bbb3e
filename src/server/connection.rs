//! Per-connection handler.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time;
use tracing::{info, warn};

use crate::error::{ProtocolError, Result};
use crate::protocol::{Protocol, Reply};
use crate::shutdown::Shutdown;

/// Longest request line accepted, newline included. A client that sends
/// more without a newline gets an error reply and is disconnected.
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Runs one client session from connect to disconnect.
pub(super) async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    protocol: Protocol,
    shutdown: Shutdown,
    read_timeout: Duration,
) {
    info!(%peer, "Client connected");

    if let Err(err) = serve_lines(stream, &protocol, &shutdown, read_timeout).await {
        warn!(%peer, error = %err, "Connection closed on I/O error");
    }

    info!(%peer, "Client disconnected");
}

/// Reads one line at a time and writes back each reply.
///
/// Ends on EOF, `quit`, an overlong line, a read or write failure, or
/// shutdown. Shutdown is only observed between reads, so an idle client
/// holds the session open for at most `read_timeout` after it is triggered.
async fn serve_lines(
    stream: TcpStream,
    protocol: &Protocol,
    shutdown: &Shutdown,
    read_timeout: Duration,
) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();

    while !shutdown.is_triggered() {
        // read_until is cancel safe: a partial line stays in `line`
        let remaining = MAX_LINE_LEN.saturating_sub(line.len()) as u64;
        let mut limited = (&mut reader).take(remaining);
        match time::timeout(read_timeout, limited.read_until(b'\n', &mut line)).await {
            Err(_elapsed) => continue,
            Ok(Ok(0)) => break,
            Ok(Ok(_)) if line.ends_with(b"\n") => {}
            Ok(Ok(_)) if line.len() >= MAX_LINE_LEN => {
                let reply = format!("{}\n", ProtocolError::LineTooLong(MAX_LINE_LEN));
                writer.write_all(reply.as_bytes()).await?;
                break;
            }
            // EOF in the middle of a line
            Ok(Ok(_)) => break,
            Ok(Err(err)) => return Err(err.into()),
        }

        let outcome = protocol.exec(&String::from_utf8_lossy(&line)).await;
        line.clear();

        let reply = match &outcome {
            Ok(reply) => reply.text().map(str::to_owned),
            Err(err) => Some(err.to_string()),
        };

        if let Some(mut reply) = reply {
            reply.push('\n');
            writer.write_all(reply.as_bytes()).await?;
        }

        if matches!(outcome, Ok(Reply::Quit)) {
            break;
        }
    }

    Ok(())
}
