use std::{io, time::Duration};

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::codec::Decoder;
use tracing::debug;

pub const MAX_LINE_LENGTH: usize = 4096;

// Lines end at CR or LF, so CRLF yields an extra empty line that callers skip.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandCodec;

impl CommandCodec {
    fn take(src: &mut BytesMut, len: usize) -> String {
        let line = src.split_to(len);
        String::from_utf8_lossy(&line).into_owned()
    }
}

impl Decoder for CommandCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, io::Error> {
        let window = src.len().min(MAX_LINE_LENGTH + 1);
        if let Some(end) = memchr::memchr2(b'\r', b'\n', &src[..window]) {
            let line = Self::take(src, end);
            src.advance(1);
            return Ok(Some(line));
        }
        if src.len() >= MAX_LINE_LENGTH {
            debug!("Command line exceeded {MAX_LINE_LENGTH} bytes, splitting");
            return Ok(Some(Self::take(src, MAX_LINE_LENGTH)));
        }
        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>, io::Error> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if src.is_empty() {
            return Ok(None);
        }
        let len = src.len();
        Ok(Some(Self::take(src, len)))
    }
}

/// Reads command lines the way a serial read-until-terminator with a timeout
/// does: when the channel goes quiet for `timeout` with a partial line
/// buffered, that partial line is returned as if it were complete.
#[derive(Debug)]
pub struct LineReader<R> {
    reader: R,
    buffer: BytesMut,
    codec: CommandCodec,
    timeout: Duration,
    eof: bool,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(reader: R, timeout: Duration) -> Self {
        Self {
            reader,
            buffer: BytesMut::with_capacity(MAX_LINE_LENGTH),
            codec: CommandCodec,
            timeout,
            eof: false,
        }
    }

    /// # Errors
    /// Read failures on the command channel.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        loop {
            if let Some(line) = self.codec.decode(&mut self.buffer)? {
                return Ok(Some(line));
            }
            if self.eof {
                return self.codec.decode_eof(&mut self.buffer);
            }
            match tokio::time::timeout(self.timeout, self.reader.read_buf(&mut self.buffer)).await
            {
                Ok(Ok(0)) => self.eof = true,
                Ok(Err(e)) => return Err(e),
                Err(_) if !self.buffer.is_empty() => {
                    debug!("Line timeout with partial input, taking it as a line");
                    return self.codec.decode_eof(&mut self.buffer);
                }
                Ok(Ok(_)) | Err(_) => {}
            }
        }
    }
}
