// Typed failures for the socket transport
use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Every variant is fatal to the connection: the caller should drop the
/// transport and reconnect.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{source} (connecting to {host}:{port})")]
    Connection {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// The write path stalled: the last `tries` attempts all wrote zero bytes.
    #[error("failed to write data after {tries} tries")]
    Write { tries: usize },

    #[error("read failed: {0}")]
    Read(#[from] io::Error),

    /// A line read timed out with nothing left to read anywhere; the
    /// server is unreachable rather than slow.
    #[error("socket connection lost")]
    ConnectionLost,

    #[error("socket closed by server")]
    ClosedByPeer,
}
