//! Deadline-bounded reads shared by the stream transports
//!
//! Both helpers give the whole call one timeout budget. When the budget runs
//! out they return whatever arrived so far; a short or empty buffer is how a
//! silent meter shows up to the caller.

use std::io::ErrorKind;
use std::time::Duration;

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::{timeout_at, Instant};
use tracing::{trace, warn};

use crate::error::{Error, Result};

/// Read until `terminator` (inclusive) or until the timeout expires
pub async fn read_until<R>(reader: &mut R, terminator: u8, timeout: Duration) -> Result<BytesMut>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let deadline = Instant::now() + timeout;
    let mut buf = BytesMut::with_capacity(64);

    loop {
        let byte = match timeout_at(deadline, reader.read_u8()).await {
            Ok(result) => read_result(result)?,
            Err(_) => {
                warn!(
                    "Read timeout after {:?} waiting for 0x{:02X} ({} bytes received)",
                    timeout,
                    terminator,
                    buf.len()
                );
                break;
            }
        };

        buf.put_u8(byte);
        if byte == terminator {
            break;
        }
    }

    trace!("Received {} bytes: {:02X?}", buf.len(), &buf[..buf.len().min(32)]);
    Ok(buf)
}

/// Read up to `len` bytes, stopping early when the timeout expires
pub async fn read_up_to<R>(reader: &mut R, len: usize, timeout: Duration) -> Result<BytesMut>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let deadline = Instant::now() + timeout;
    let mut buf = BytesMut::with_capacity(len);

    while buf.len() < len {
        match timeout_at(deadline, reader.read_u8()).await {
            Ok(result) => buf.put_u8(read_result(result)?),
            Err(_) => {
                warn!("Read timeout after {:?} ({}/{} bytes received)", timeout, buf.len(), len);
                break;
            }
        }
    }

    trace!("Received {} bytes: {:02X?}", buf.len(), &buf[..]);
    Ok(buf)
}

fn read_result(result: std::io::Result<u8>) -> Result<u8> {
    result.map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => Error::ConnectionClosed,
        _ => Error::Io(e),
    })
}
