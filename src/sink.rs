use std::{io, time::Duration};

use tokio::io::{AsyncWrite, AsyncWriteExt};

pub const LINE_ENDING: &str = "\r\n";

/// Byte-at-a-time writer that sleeps `delay` before every byte so a slow
/// consumer on the other end of the channel never overruns.
#[derive(Debug)]
pub struct PacedSink<W> {
    writer: W,
    delay: Duration,
}

impl<W: AsyncWrite + Unpin> PacedSink<W> {
    pub fn new(writer: W, delay: Duration) -> Self {
        Self { writer, delay }
    }

    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// # Errors
    /// Write failures on the underlying channel.
    pub async fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        if self.delay.is_zero() {
            return self.writer.write_all(&[byte]).await;
        }
        tokio::time::sleep(self.delay).await;
        self.writer.write_all(&[byte]).await?;
        self.writer.flush().await
    }

    /// # Errors
    /// Write failures on the underlying channel.
    pub async fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        for &byte in bytes {
            self.write_byte(byte).await?;
        }
        Ok(())
    }

    /// # Errors
    /// Write failures on the underlying channel.
    pub async fn print(&mut self, text: &str) -> io::Result<()> {
        self.write_bytes(text.as_bytes()).await
    }

    /// # Errors
    /// Write failures on the underlying channel.
    pub async fn println(&mut self, text: &str) -> io::Result<()> {
        self.print(text).await?;
        self.print(LINE_ENDING).await
    }

    /// # Errors
    /// Write failures on the underlying channel.
    pub async fn flush(&mut self) -> io::Result<()> {
        self.writer.flush().await
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
