// socket: guaranteed write / exact read / line read over one blocking connection
pub mod error;
pub mod history;

pub use error::{Error, Result};
pub use history::WriteHistory;

use beanstalk_stream::{StreamOps, TcpStreamOps};
use std::env;
use std::time::Duration;
use tracing::{debug, trace, warn};

// Default timeout for a blocking read on the socket
const SOCKET_TIMEOUT_MS: u64 = 1_000;

// Number of retries for attempted writes which return zero length
const WRITE_RETRIES: usize = 8;

// Environment variables for configuration
// BEANSTALK_SOCKET_TIMEOUT_MS: default armed read/write timeout (default: 1000)
// BEANSTALK_WRITE_RETRIES: consecutive zero-byte writes tolerated (default: 8)

fn socket_timeout() -> Duration {
    let ms = env::var("BEANSTALK_SOCKET_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(SOCKET_TIMEOUT_MS);
    Duration::from_millis(ms)
}

fn write_retries() -> usize {
    env::var("BEANSTALK_WRITE_RETRIES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(WRITE_RETRIES)
}

/// One blocking connection to a beanstalkd-style line protocol server.
/// The stream handle is owned exclusively here and only touched through
/// these methods; callers issue operations in request/response lock-step.
pub struct Socket<S: StreamOps = TcpStreamOps> {
    stream: S,
    write_retries: usize,
}

impl Socket<TcpStreamOps> {
    /// Open a connection to host:port and arm its read/write timeout:
    /// the connect timeout if a nonzero one was given, the default
    /// socket timeout otherwise.
    pub fn connect(host: &str, port: u16, connect_timeout: Option<Duration>) -> Result<Self> {
        let timeout = connect_timeout.unwrap_or(Duration::ZERO);

        let mut stream =
            TcpStreamOps::open(host, port, timeout).map_err(|source| Error::Connection {
                host: host.to_string(),
                port,
                source,
            })?;

        let armed = if timeout.is_zero() {
            socket_timeout()
        } else {
            timeout
        };
        stream.set_timeout(armed).map_err(|source| Error::Connection {
            host: host.to_string(),
            port,
            source,
        })?;

        debug!(host, port, armed_ms = armed.as_millis() as u64, "connected");
        Ok(Socket::with_stream(stream))
    }
}

impl<S: StreamOps> Socket<S> {
    /// Wrap an already-established stream. Tests inject a scripted
    /// implementation here; `connect` is the production path.
    pub fn with_stream(stream: S) -> Self {
        Socket {
            stream,
            write_retries: write_retries(),
        }
    }

    /// Transmit the whole buffer, tolerating partial writes from the
    /// underlying stream. Fails once the last `write_retries` attempts
    /// in a row wrote nothing.
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        let mut history = WriteHistory::new(self.write_retries);
        let mut written = 0;

        while written < data.len() {
            let count = match self.stream.write(&data[written..]) {
                Ok(count) => count,
                Err(e) => {
                    // a failed attempt counts the same as a zero-length one
                    trace!(error = %e, "write attempt failed");
                    0
                }
            };

            history.log(count);
            if history.is_full_with_no_writes() {
                warn!(tries = self.write_retries, "socket stalled, giving up");
                return Err(Error::Write {
                    tries: self.write_retries,
                });
            }

            written += count;
        }

        Ok(())
    }

    /// Read exactly `length` bytes, assembled from as many underlying
    /// reads as it takes. Returns short only when the peer closes the
    /// stream first; short-at-EOF is not an error at this layer.
    pub fn read(&mut self, length: usize) -> Result<Vec<u8>> {
        let mut parts = Vec::with_capacity(length);

        while parts.len() < length && !self.stream.eof() {
            let mut chunk = vec![0u8; length - parts.len()];
            let count = self.stream.read(&mut chunk)?;
            parts.extend_from_slice(&chunk[..count]);
        }

        Ok(parts)
    }

    /// Read the next line, trimmed of trailing CR/LF and blanks,
    /// distinguishing a slow-but-alive server from a gone one.
    pub fn read_line(&mut self, max_length: Option<usize>) -> Result<String> {
        loop {
            let line = self.stream.read_line(max_length)?;

            if line.is_none() {
                let meta = self.stream.meta();
                // timed out with nothing buffered anywhere: the server
                // is unreachable, not merely slow
                if meta.timed_out && meta.unread_bytes == 0 {
                    warn!("line read timed out with no pending bytes");
                    return Err(Error::ConnectionLost);
                }
            }

            // checked every pass, even when a line came back
            if self.stream.eof() {
                warn!("end of stream during line read");
                return Err(Error::ClosedByPeer);
            }

            if let Some(line) = line {
                return Ok(line.trim_end_matches([' ', '\t', '\r', '\n']).to_string());
            }

            trace!("line read timed out with bytes pending, retrying");
        }
    }

    /// Tear the transport down, handing the underlying stream back.
    pub fn into_stream(self) -> S {
        self.stream
    }
}
