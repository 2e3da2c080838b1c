const TERMINATOR: u32 = u32::from_be_bytes(*b"\r\n\r\n");

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    #[default]
    InHeaders,
    InBody,
}

/// Trailing four-byte window over a response; flips to `InBody` the moment
/// the window holds CRLFCRLF and never flips back.
#[derive(Debug, Default)]
pub struct HeaderBoundary {
    window: u32,
    phase: Phase,
}

impl HeaderBoundary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn in_headers(&self) -> bool {
        self.phase == Phase::InHeaders
    }

    pub fn push(&mut self, byte: u8) -> Phase {
        if self.phase == Phase::InHeaders {
            self.window = (self.window << 8) | u32::from(byte);
            if self.window == TERMINATOR {
                self.phase = Phase::InBody;
            }
        }
        self.phase
    }
}
