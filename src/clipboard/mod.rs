use std::io::{self, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::debug;

/// Best-effort plain-text copy. Failures are not reported beyond the return value.
pub trait Clipboard {
    fn copy(&mut self, text: &str) -> bool;
}

/// Writes an OSC 52 escape sequence; terminals that support it put the text
/// on the system clipboard, others ignore it.
pub struct Osc52<W: Write> {
    out: W,
}

impl Osc52<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> Osc52<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Clipboard for Osc52<W> {
    fn copy(&mut self, text: &str) -> bool {
        let seq = format!("\x1b]52;c;{}\x07", STANDARD.encode(text));
        let ok = self.out.write_all(seq.as_bytes()).and_then(|_| self.out.flush()).is_ok();
        debug!(bytes = text.len(), ok, "clipboard copy");
        ok
    }
}

/// Used when clipboard writes are turned off.
pub struct Disabled;

impl Clipboard for Disabled {
    fn copy(&mut self, _text: &str) -> bool {
        false
    }
}
