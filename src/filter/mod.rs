pub mod boundary;
pub mod source;
pub mod structured;

use std::fmt;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

pub use self::{
    boundary::{HeaderBoundary, Phase},
    source::PolledSource,
};
use crate::{error::RelayError, sink::PacedSink};

pub const CHAT_CAPTURE_LIMIT: usize = 2400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Passthrough,
    Silent,
    HeaderOnly,
    BodyOnly,
    Json,
    ChatCompletion,
    ChunkedSenders,
}

impl FilterKind {
    pub const ALL: [Self; 7] = [
        Self::Passthrough,
        Self::Silent,
        Self::HeaderOnly,
        Self::BodyOnly,
        Self::Json,
        Self::ChatCompletion,
        Self::ChunkedSenders,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Passthrough => "NONE",
            Self::Silent => "SILENT-FILTER",
            Self::HeaderOnly => "HEADER-FILTER",
            Self::BodyOnly => "BODY-FILTER",
            Self::Json => "JSON-FILTER",
            Self::ChatCompletion => "OPENAI-FILTER",
            Self::ChunkedSenders => "MATRIX-FILTER",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

// Unknown names are accepted when set and only rejected once a send needs them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterSelection {
    Known(FilterKind),
    Unknown(String),
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self::Known(FilterKind::Passthrough)
    }
}

impl FilterSelection {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        FilterKind::from_name(name).map_or_else(|| Self::Unknown(name.to_string()), Self::Known)
    }

    /// # Errors
    /// `UnknownFilter` when the stored name matches no variant.
    pub fn resolve(&self) -> Result<FilterKind, RelayError> {
        match self {
            Self::Known(kind) => Ok(*kind),
            Self::Unknown(name) => Err(RelayError::UnknownFilter(name.clone())),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Known(kind) => kind.name(),
            Self::Unknown(name) => name,
        }
    }
}

impl fmt::Display for FilterSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Default)]
pub struct JsonScanner {
    started: bool,
    limit: Option<usize>,
    captured: usize,
}

impl JsonScanner {
    #[must_use]
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            started: false,
            limit,
            captured: 0,
        }
    }

    // Everything before the first `{` is treated as status line and headers.
    pub fn accept(&mut self, byte: u8) -> bool {
        if self.is_full() {
            return false;
        }
        if !self.started {
            if byte != b'{' {
                return false;
            }
            self.started = true;
        }
        self.captured += 1;
        true
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.limit.is_some_and(|limit| self.captured >= limit)
    }
}

/// Streams the response held by `source` through `kind` into `sink`.
///
/// # Errors
/// Only sink write failures; the response side never errors, it just ends.
pub async fn run<R, W>(
    kind: FilterKind,
    source: &mut PolledSource<R>,
    sink: &mut PacedSink<W>,
) -> Result<(), RelayError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    debug!("Running response filter {}", kind.name());
    match kind {
        FilterKind::Passthrough => {
            while let Some(byte) = source.next_byte().await {
                sink.write_byte(byte).await?;
            }
        }
        FilterKind::Silent => {
            let discarded = source::drain(source).await;
            debug!("Silently discarded {discarded} response bytes");
        }
        FilterKind::HeaderOnly => {
            let mut boundary = HeaderBoundary::new();
            while let Some(byte) = source.next_byte().await {
                if boundary.in_headers() {
                    sink.write_byte(byte).await?;
                    boundary.push(byte);
                }
            }
        }
        FilterKind::BodyOnly => {
            let mut boundary = HeaderBoundary::new();
            while let Some(byte) = source.next_byte().await {
                if boundary.in_headers() {
                    boundary.push(byte);
                } else {
                    sink.write_byte(byte).await?;
                }
            }
        }
        FilterKind::Json => {
            let mut scanner = JsonScanner::new(None);
            while let Some(byte) = source.next_byte().await {
                if scanner.accept(byte) {
                    sink.write_byte(byte).await?;
                }
            }
        }
        FilterKind::ChatCompletion => {
            let captured = capture_json(source, Some(CHAT_CAPTURE_LIMIT)).await;
            sink.print(&structured::extract_chat_content(&captured)).await?;
        }
        FilterKind::ChunkedSenders => {
            let captured = capture_json(source, None).await;
            for line in structured::extract_chunk_lines(&captured) {
                sink.println(&line).await?;
            }
        }
    }
    Ok(())
}

pub async fn capture_json<R: AsyncRead + Unpin>(
    source: &mut PolledSource<R>,
    limit: Option<usize>,
) -> Vec<u8> {
    let mut scanner = JsonScanner::new(limit);
    let mut captured = Vec::new();
    while !scanner.is_full() {
        let Some(byte) = source.next_byte().await else {
            break;
        };
        if scanner.accept(byte) {
            captured.push(byte);
        }
    }
    debug!("Captured {} JSON bytes", captured.len());
    captured
}
