//! Connection Handling
//!
//! A connection is any byte stream whose blocking reads and writes can be
//! bounded by a timeout.

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::time::{Duration, Instant};

/// A stream the client can talk to cgminer over
pub trait Connection: Read + Write + Send {
    /// Bound the next blocking reads; `None` blocks indefinitely
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;

    /// Bound the next blocking writes; `None` blocks indefinitely
    fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;
}

impl Connection for TcpStream {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        TcpStream::set_read_timeout(self, timeout)
    }

    fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        TcpStream::set_write_timeout(self, timeout)
    }
}

/// Connection with a fixed absolute deadline
///
/// Socket timeouts are relative, so the remaining time is re-applied before
/// every read and write. The deadline itself never moves; once it passes,
/// every operation fails with `TimedOut`. A timeout too large to represent
/// as an instant leaves the stream without a deadline.
pub struct DeadlineStream<C> {
    inner: C,
    deadline: Option<Instant>,
}

impl<C: Connection> DeadlineStream<C> {
    /// Wrap `inner`, expiring at `deadline`
    pub fn new(inner: C, deadline: Instant) -> Self {
        Self {
            inner,
            deadline: Some(deadline),
        }
    }

    /// Wrap `inner`, expiring `timeout` from now
    pub fn with_timeout(inner: C, timeout: Duration) -> Self {
        Self {
            inner,
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// `None` when the timeout overflowed and the stream never expires
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn get_ref(&self) -> &C {
        &self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }

    /// Time left before the deadline, `None` when there is no deadline
    fn remaining(&self) -> io::Result<Option<Duration>> {
        let Some(deadline) = self.deadline else {
            return Ok(None);
        };
        let left = deadline.saturating_duration_since(Instant::now());
        if left.is_zero() {
            Err(deadline_exceeded())
        } else {
            Ok(Some(left))
        }
    }

    fn expired(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Report socket timeouts that ran into the deadline as `TimedOut`
    fn normalize(&self, err: io::Error) -> io::Error {
        let timed_out = matches!(
            err.kind(),
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
        );
        if timed_out && self.expired() {
            deadline_exceeded()
        } else {
            err
        }
    }
}

fn deadline_exceeded() -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, "deadline exceeded")
}

impl<C: Connection> Read for DeadlineStream<C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(left) = self.remaining()? {
            self.inner.set_read_timeout(Some(left))?;
        }
        self.inner.read(buf).map_err(|e| self.normalize(e))
    }
}

impl<C: Connection> Write for DeadlineStream<C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(left) = self.remaining()? {
            self.inner.set_write_timeout(Some(left))?;
        }
        self.inner.write(buf).map_err(|e| self.normalize(e))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.remaining()?;
        self.inner.flush().map_err(|e| self.normalize(e))
    }
}
