// TCP-backed stream primitives
use crate::traits::{StreamMeta, StreamOps};
use std::collections::VecDeque;
use std::io::{self, Read, Result, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::os::unix::io::AsRawFd;
use std::time::Duration;

const READ_CHUNK: usize = 512;

pub struct TcpStreamOps {
    stream: TcpStream,
    // Bytes pulled off the socket but not yet handed to the caller,
    // shared between read() and read_line() like a stdio buffer
    pending: VecDeque<u8>,
    eof: bool,
    timed_out: bool,
}

impl TcpStreamOps {
    /// Open a blocking connection to host:port. A zero connect timeout
    /// falls back to the OS default connect behavior; the read/write
    /// timeout is armed separately via set_timeout.
    pub fn open(host: &str, port: u16, connect_timeout: Duration) -> Result<Self> {
        let mut last_err = None;
        let mut connected = None;

        for addr in (host, port).to_socket_addrs()? {
            let attempt = if connect_timeout.is_zero() {
                TcpStream::connect(addr)
            } else {
                TcpStream::connect_timeout(&addr, connect_timeout)
            };
            match attempt {
                Ok(stream) => {
                    connected = Some(stream);
                    break;
                }
                Err(e) => last_err = Some(e),
            }
        }

        let stream = match connected {
            Some(stream) => stream,
            None => {
                return Err(last_err.unwrap_or_else(|| {
                    io::Error::new(io::ErrorKind::AddrNotAvailable, "no addresses resolved")
                }))
            }
        };

        // Lock-step request/response traffic, Nagle only adds latency
        stream.set_nodelay(true)?;

        Ok(TcpStreamOps {
            stream,
            pending: VecDeque::new(),
            eof: false,
            timed_out: false,
        })
    }

    // Bytes sitting in the kernel receive queue, not yet pulled into pending
    fn kernel_unread(&self) -> usize {
        let mut avail: libc::c_int = 0;
        let rc = unsafe { libc::ioctl(self.stream.as_raw_fd(), libc::FIONREAD as _, &mut avail) };
        if rc == 0 && avail > 0 {
            avail as usize
        } else {
            0
        }
    }

    fn drain_pending(&mut self, buf: &mut [u8]) -> usize {
        let count = buf.len().min(self.pending.len());
        for (slot, byte) in buf[..count].iter_mut().zip(self.pending.drain(..count)) {
            *slot = byte;
        }
        count
    }

    // One socket read into pending; updates the eof/timed-out flags.
    // Ok(0) means either timeout or end-of-stream.
    fn fill_pending(&mut self) -> Result<usize> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            return match self.stream.read(&mut chunk) {
                Ok(0) => {
                    self.eof = true;
                    self.timed_out = false;
                    Ok(0)
                }
                Ok(count) => {
                    self.timed_out = false;
                    self.pending.extend(&chunk[..count]);
                    Ok(count)
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(ref e) if timeout_kind(e) => {
                    self.timed_out = true;
                    Ok(0)
                }
                Err(e) => Err(e),
            };
        }
    }

    // A complete line out of pending, or max_length - 1 bytes fgets-style
    fn take_line(&mut self, max_length: Option<usize>) -> Option<String> {
        let newline = self.pending.iter().position(|&b| b == b'\n');
        let take = match (newline, max_length) {
            (Some(pos), Some(max)) => (pos + 1).min(max.saturating_sub(1)),
            (Some(pos), None) => pos + 1,
            (None, Some(max)) if self.pending.len() >= max.saturating_sub(1) => {
                max.saturating_sub(1)
            }
            (None, _) => return None,
        };
        let bytes: Vec<u8> = self.pending.drain(..take).collect();
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl StreamOps for TcpStreamOps {
    fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.stream.set_read_timeout(Some(timeout))?;
        self.stream.set_write_timeout(Some(timeout))
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        match self.stream.write(data) {
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => Ok(0),
            Err(ref e) if timeout_kind(e) => Ok(0),
            other => other,
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if !self.pending.is_empty() {
            return Ok(self.drain_pending(buf));
        }
        if self.eof {
            return Ok(0);
        }
        self.fill_pending()?;
        Ok(self.drain_pending(buf))
    }

    fn read_line(&mut self, max_length: Option<usize>) -> Result<Option<String>> {
        loop {
            if let Some(line) = self.take_line(max_length) {
                return Ok(Some(line));
            }
            if self.eof {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                // half line left behind by the closing peer
                let tail: Vec<u8> = self.pending.drain(..).collect();
                return Ok(Some(String::from_utf8_lossy(&tail).into_owned()));
            }
            if self.fill_pending()? == 0 && !self.eof {
                // timed out before a full line arrived
                return Ok(None);
            }
        }
    }

    fn eof(&self) -> bool {
        self.eof
    }

    fn meta(&self) -> StreamMeta {
        StreamMeta {
            timed_out: self.timed_out,
            unread_bytes: self.pending.len() + self.kernel_unread(),
        }
    }
}

fn timeout_kind(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}
