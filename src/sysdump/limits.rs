//! Size-bounded output sinks

use crate::error::{Result, SysdumpError};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::AsyncWrite;

pub const KB: u64 = 1024;
pub const MB: u64 = 1024 * KB;

/// In-memory sink that refuses to grow past `limit` bytes
#[derive(Debug)]
pub struct LimitedBuffer {
    buf: Vec<u8>,
    limit: u64,
    exceeded: bool,
}

impl LimitedBuffer {
    pub fn new(limit: u64) -> Self {
        Self {
            buf: Vec::new(),
            limit,
            exceeded: false,
        }
    }

    pub fn exceeded(&self) -> bool {
        self.exceeded
    }

    /// The collected bytes, or `LimitExceeded` if anything was dropped
    pub fn into_inner(self) -> Result<Vec<u8>> {
        if self.exceeded {
            return Err(SysdumpError::LimitExceeded { limit: self.limit });
        }
        Ok(self.buf)
    }
}

impl AsyncWrite for LimitedBuffer {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if this.buf.len() as u64 + data.len() as u64 > this.limit {
            this.exceeded = true;
            return Poll::Ready(Err(io::Error::other(format!(
                "output exceeded the limit of {} bytes",
                this.limit
            ))));
        }
        this.buf.extend_from_slice(data);
        Poll::Ready(Ok(data.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
