//! Response framing
//!
//! cgminer ends every response with a single NUL byte instead of a
//! length header, in both wire formats.

use std::io::{self, BufRead};

use bytes::{Bytes, BytesMut};

use crate::error::{CgminerError, Result};

/// Byte terminating every response
pub const TERMINATOR: u8 = 0x00;

/// Read one response payload, excluding the terminator
///
/// Scans the reader's buffer for the terminator and consumes nothing past
/// it. The buffer grows as needed, so response size is unbounded. If the
/// stream ends or the deadline passes first, the bytes read so far are
/// dropped and the I/O cause is returned as [`CgminerError::Read`].
pub fn read_framed<R: BufRead + ?Sized>(reader: &mut R) -> Result<Bytes> {
    let mut payload = BytesMut::new();

    loop {
        let available = match reader.fill_buf() {
            Ok(buf) => buf,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CgminerError::Read(e)),
        };

        if available.is_empty() {
            return Err(CgminerError::Read(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "connection closed after {} bytes without a terminator",
                    payload.len()
                ),
            )));
        }

        match available.iter().position(|&b| b == TERMINATOR) {
            Some(end) => {
                payload.extend_from_slice(&available[..end]);
                reader.consume(end + 1);
                tracing::trace!("Read framed response of {} bytes", payload.len());
                return Ok(payload.freeze());
            }
            None => {
                let len = available.len();
                payload.extend_from_slice(available);
                reader.consume(len);
            }
        }
    }
}
