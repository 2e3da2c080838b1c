use std::time::Duration;

use futures_util::FutureExt;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, warn};

const READ_CHUNK: usize = 512;

/// Byte source over a live response that only yields what the transport
/// already holds.
///
/// With a zero grace period a read that would block ends the stream, so a
/// response arriving in bursts separated by gaps is cut at the first gap.
/// A non-zero grace waits at most that long for the next burst instead.
#[derive(Debug)]
pub struct PolledSource<R> {
    reader: R,
    buf: Box<[u8]>,
    pos: usize,
    filled: usize,
    grace: Duration,
    drained: bool,
}

impl<R: AsyncRead + Unpin> PolledSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: vec![0; READ_CHUNK].into_boxed_slice(),
            pos: 0,
            filled: 0,
            grace: Duration::ZERO,
            drained: false,
        }
    }

    #[must_use]
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.drained
    }

    pub async fn next_byte(&mut self) -> Option<u8> {
        if self.pos == self.filled && !self.refill().await {
            return None;
        }
        let byte = self.buf[self.pos];
        self.pos += 1;
        Some(byte)
    }

    async fn refill(&mut self) -> bool {
        if self.drained {
            return false;
        }
        let read = if self.grace.is_zero() {
            // Unconstrained so the runtime's cooperative budget cannot fake a gap.
            tokio::task::unconstrained(self.reader.read(&mut self.buf)).now_or_never()
        } else {
            tokio::time::timeout(self.grace, self.reader.read(&mut self.buf))
                .await
                .ok()
        };
        match read {
            Some(Ok(0)) => {
                debug!("Response stream closed by peer");
                self.finish()
            }
            Some(Ok(n)) => {
                self.pos = 0;
                self.filled = n;
                true
            }
            Some(Err(e)) => {
                warn!("Response read failed: {e}");
                self.finish()
            }
            None => {
                debug!("No response bytes immediately available, treating stream as drained");
                self.finish()
            }
        }
    }

    fn finish(&mut self) -> bool {
        self.drained = true;
        self.pos = 0;
        self.filled = 0;
        false
    }
}

pub async fn drain<R: AsyncRead + Unpin>(source: &mut PolledSource<R>) -> usize {
    let mut discarded = 0;
    while source.next_byte().await.is_some() {
        discarded += 1;
    }
    discarded
}
