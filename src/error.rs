use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("METHOD/URL MISSING")]
    MissingMethodOrUrl,
    #[error("URL MUST START WITH https:// or http://")]
    UnsupportedScheme,
    #[error("INVALID PORT: {0}")]
    InvalidPort(String),
    #[error("UNKNOWN-FILTER")]
    UnknownFilter(String),
    #[error("CONNECT")]
    Connect(#[source] io::Error),
    #[error("SEND")]
    Send(#[source] io::Error),
    #[error("HEADER LIMIT: {0}")]
    HeaderLimit(usize),
    #[error("MALFORMED HEADER")]
    MalformedHeader,
    #[error("UNKNOWN COMMAND: {0}")]
    UnknownCommand(String),
    #[error("KEY NOT FOUND: {0}")]
    KeyNotFound(String),
    #[error("CONFIG FULL")]
    ConfigFull,
    #[error("CONFIG SAVE: {0}")]
    ConfigSave(#[source] io::Error),
    #[error("TLS: {0}")]
    Tls(#[from] rustls::Error),
    #[error("JSON: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("IO: {0}")]
    Io(#[from] io::Error),
}

impl RelayError {
    #[must_use]
    pub fn diagnostic(&self) -> String {
        format!(">ERROR:{self}")
    }

    // Only a broken output channel ends the session; everything else is reported on it.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
