// Stream abstraction - swappable blocking I/O primitives for the socket layer
use std::io::Result;
use std::time::Duration;

/// Read-side metadata, refreshed by every read/line primitive call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamMeta {
    pub timed_out: bool,
    pub unread_bytes: usize,
}

pub trait StreamOps: Send {
    /// Arm the read/write timeout bounding every later blocking call.
    fn set_timeout(&mut self, timeout: Duration) -> Result<()>;

    /// One write attempt. A timed-out attempt reports Ok(0), not an error.
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// One read attempt for up to buf.len() bytes, serving buffered bytes
    /// first. Ok(0) means timeout or end-of-stream; eof() and meta() tell
    /// the two apart.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Next newline-terminated line, terminator included. Ok(None) is the
    /// no-data sentinel: a timeout before a full line arrived, or
    /// end-of-stream with nothing buffered. With max_length = n, at most
    /// n - 1 bytes come back even without a newline. Bytes of an
    /// incomplete line stay buffered and count as unread.
    fn read_line(&mut self, max_length: Option<usize>) -> Result<Option<String>>;

    /// True once an underlying read observed end-of-stream. Latches even
    /// when the observing call still returned data.
    fn eof(&self) -> bool;

    fn meta(&self) -> StreamMeta;
}
