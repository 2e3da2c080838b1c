use std::fmt;

use crate::{error::RelayError, filter::FilterSelection};

pub const HEADER_CAPACITY: usize = 8;
pub const CONTEXT_PLACEHOLDER: &str = "@CTX@";
pub const CONTENT_PLACEHOLDER: &str = "@CNT@";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    #[default]
    None,
    Get,
    Put,
    Post,
}

impl Method {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
        }
    }

    #[must_use]
    pub fn sends_body(self) -> bool {
        matches!(self, Self::Put | Self::Post)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub key: String,
    pub value: String,
}

impl Header {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct HeaderList(Vec<Header>);

impl HeaderList {
    /// # Errors
    /// `HeaderLimit` once `HEADER_CAPACITY` headers are stored; the list is unchanged.
    pub fn push(&mut self, header: Header) -> Result<(), RelayError> {
        if self.0.len() >= HEADER_CAPACITY {
            return Err(RelayError::HeaderLimit(HEADER_CAPACITY));
        }
        self.0.push(header);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Default, Clone)]
pub struct RequestState {
    pub method: Method,
    pub url: String,
    pub headers: HeaderList,
    pub body: String,
    pub context: String,
    pub content: String,
    pub filter: FilterSelection,
}

impl RequestState {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.method != Method::None && !self.url.is_empty()
    }

    #[must_use]
    pub fn render_body(&self, body: &str) -> String {
        if body.is_empty() {
            return String::new();
        }
        body.replace(CONTEXT_PLACEHOLDER, &self.context)
            .replace(CONTENT_PLACEHOLDER, &self.content)
    }

    #[must_use]
    pub fn describe(&self) -> Vec<String> {
        let mut lines = vec![
            ">REQUEST".to_string(),
            format!("METHOD: {}", self.method),
            format!("URL: {}", self.url),
        ];
        lines.extend(
            self.headers
                .iter()
                .map(|header| format!("HEADER: {}: {}", header.key, header.value)),
        );
        lines.push(format!("BODY: {}", self.body));
        lines.push(format!("CONTEXT: {}", self.context));
        lines.push(format!("CONTENT: {}", self.content));
        lines.push(format!("FILTER: {}", self.filter));
        lines
    }
}
