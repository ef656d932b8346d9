// mock: scripted StreamOps implementation for exercising socket logic
// without a network
use beanstalk_stream::{StreamMeta, StreamOps};
use std::collections::VecDeque;
use std::io;
use std::time::Duration;

enum ReadStep {
    Chunk(Vec<u8>),
    TimedOut,
    Eof,
    Fail(io::ErrorKind),
}

enum LineStep {
    Line(String),
    NoData { timed_out: bool, unread_bytes: usize },
    Eof,
    Fail(io::ErrorKind),
}

enum WriteStep {
    Accept(usize),
    Fail(io::ErrorKind),
}

/// Replays scripted primitive results in order. An exhausted read or
/// line script behaves as end-of-stream; writes are accepted whole
/// unless per-call steps were queued.
#[derive(Default)]
pub struct ScriptedStream {
    reads: VecDeque<ReadStep>,
    lines: VecDeque<LineStep>,
    writes: VecDeque<WriteStep>,
    written: Vec<u8>,
    timeout: Option<Duration>,
    timed_out: bool,
    unread_bytes: usize,
    eof: bool,
}

impl ScriptedStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for `read` to return, split across calls if the
    /// caller's buffer is smaller than the chunk.
    pub fn push_read(&mut self, bytes: &[u8]) {
        self.reads.push_back(ReadStep::Chunk(bytes.to_vec()));
    }

    pub fn push_read_timeout(&mut self) {
        self.reads.push_back(ReadStep::TimedOut);
    }

    pub fn push_read_eof(&mut self) {
        self.reads.push_back(ReadStep::Eof);
    }

    pub fn push_read_error(&mut self, kind: io::ErrorKind) {
        self.reads.push_back(ReadStep::Fail(kind));
    }

    /// Queue a successful line for one `read_line` call, terminator
    /// included.
    pub fn push_line(&mut self, line: &str) {
        self.lines.push_back(LineStep::Line(line.to_string()));
    }

    /// Queue the no-data sentinel along with the metadata the caller
    /// will observe afterwards.
    pub fn push_no_data(&mut self, timed_out: bool, unread_bytes: usize) {
        self.lines.push_back(LineStep::NoData {
            timed_out,
            unread_bytes,
        });
    }

    pub fn push_line_eof(&mut self) {
        self.lines.push_back(LineStep::Eof);
    }

    pub fn push_line_error(&mut self, kind: io::ErrorKind) {
        self.lines.push_back(LineStep::Fail(kind));
    }

    /// Cap how many bytes the next write attempt accepts; 0 scripts a
    /// stalled attempt.
    pub fn push_write_accept(&mut self, count: usize) {
        self.writes.push_back(WriteStep::Accept(count));
    }

    pub fn push_write_error(&mut self, kind: io::ErrorKind) {
        self.writes.push_back(WriteStep::Fail(kind));
    }

    /// Mark the stream as already at end-of-stream.
    pub fn set_eof(&mut self) {
        self.eof = true;
    }

    /// Every byte the stream accepted, in write order.
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// The timeout armed via set_timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl StreamOps for ScriptedStream {
    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.timeout = Some(timeout);
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let count = match self.writes.pop_front() {
            Some(WriteStep::Accept(cap)) => cap.min(data.len()),
            Some(WriteStep::Fail(kind)) => {
                return Err(io::Error::new(kind, "scripted write failure"))
            }
            None => data.len(),
        };
        self.written.extend_from_slice(&data[..count]);
        Ok(count)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.reads.pop_front() {
            Some(ReadStep::Chunk(mut bytes)) => {
                let count = bytes.len().min(buf.len());
                buf[..count].copy_from_slice(&bytes[..count]);
                if count < bytes.len() {
                    // remainder stays scripted for the next call
                    self.reads.push_front(ReadStep::Chunk(bytes.split_off(count)));
                }
                self.timed_out = false;
                Ok(count)
            }
            Some(ReadStep::TimedOut) => {
                self.timed_out = true;
                Ok(0)
            }
            Some(ReadStep::Eof) | None => {
                self.eof = true;
                Ok(0)
            }
            Some(ReadStep::Fail(kind)) => Err(io::Error::new(kind, "scripted read failure")),
        }
    }

    fn read_line(&mut self, _max_length: Option<usize>) -> io::Result<Option<String>> {
        match self.lines.pop_front() {
            Some(LineStep::Line(line)) => {
                self.timed_out = false;
                Ok(Some(line))
            }
            Some(LineStep::NoData {
                timed_out,
                unread_bytes,
            }) => {
                self.timed_out = timed_out;
                self.unread_bytes = unread_bytes;
                Ok(None)
            }
            Some(LineStep::Eof) | None => {
                self.eof = true;
                Ok(None)
            }
            Some(LineStep::Fail(kind)) => Err(io::Error::new(kind, "scripted line failure")),
        }
    }

    fn eof(&self) -> bool {
        self.eof
    }

    fn meta(&self) -> StreamMeta {
        StreamMeta {
            timed_out: self.timed_out,
            unread_bytes: self.unread_bytes,
        }
    }
}
