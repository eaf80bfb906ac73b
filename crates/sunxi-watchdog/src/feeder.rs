//! Timeout refreshes read from a text feed.
//!
//! The feed is a stream of integers separated by whitespace. Each integer
//! replaces the countdown (clamped to the start-up limit) and the sentinel
//! `-1` requests a clean disable. Numbers follow C `%i` conventions: an
//! optional sign, then `0x` hex, leading-zero octal or decimal digits.
//! Tokens that are not numbers are dropped without touching the countdown.

use crate::timeout::{Counter, TimeoutState};
use std::io::BufRead;
use std::num::IntErrorKind;
use std::sync::Arc;

/// Longest token the feeder buffers.
pub const MAX_TOKEN_BYTES: usize = 4096;

/// Parse one refresh token.
///
/// Magnitudes too large for `i64` saturate, which the clamp then maps onto the
/// nearest bound.
#[must_use]
pub fn parse_refresh(token: &str) -> Option<i64> {
    let (negative, unsigned) = match token.as_bytes().first() {
        Some(b'-') => (true, token.get(1..)?),
        Some(b'+') => (false, token.get(1..)?),
        Some(_) => (false, token),
        None => return None,
    };

    let (radix, digits) = if let Some(hex) = unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        (16, hex)
    } else if unsigned.len() > 1 && unsigned.starts_with('0') {
        (8, unsigned.get(1..)?)
    } else {
        (10, unsigned)
    };

    if digits.is_empty() || !digits.bytes().all(|b| char::from(b).is_digit(radix)) {
        return None;
    }

    let magnitude = match u64::from_str_radix(digits, radix) {
        Ok(value) => value,
        Err(err) if *err.kind() == IntErrorKind::PosOverflow => u64::MAX,
        Err(_) => return None,
    };

    let signed = if negative {
        -i128::from(magnitude)
    } else {
        i128::from(magnitude)
    };
    Some(i64::try_from(signed).unwrap_or(if negative { i64::MIN } else { i64::MAX }))
}

/// Counts of what the feeder did with its input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedSummary {
    /// Tokens that updated the countdown.
    pub applied: u64,
    /// Tokens dropped as malformed.
    pub ignored: u64,
}

/// Applies refreshes from a feed to the shared countdown.
///
/// The feeder never touches the device; the kick loop picks up each refresh
/// on its next cycle.
#[derive(Debug, Clone)]
pub struct InputFeeder {
    state: Arc<TimeoutState>,
}

impl InputFeeder {
    /// Feed `state`.
    #[must_use]
    pub fn new(state: Arc<TimeoutState>) -> Self {
        Self { state }
    }

    /// Apply a single token. Returns the stored counter, or `None` if the
    /// token was not a number.
    pub fn apply(&self, token: &str) -> Option<Counter> {
        let Some(raw) = parse_refresh(token) else {
            tracing::debug!(token, "Ignoring malformed refresh");
            return None;
        };
        let counter = self.state.set(raw);
        tracing::debug!(raw, counter = %counter, "Timeout refreshed");
        Some(counter)
    }

    /// Read `reader` until end of input, blocking between values.
    ///
    /// Tokens are applied as soon as the whitespace that ends them arrives.
    /// At most [`MAX_TOKEN_BYTES`] of a token are buffered; longer tokens are
    /// dropped as malformed. A read error ends the feed like end of input
    /// does; the countdown then keeps running on its last value.
    pub fn run<R: BufRead>(&self, mut reader: R) -> FeedSummary {
        let mut summary = FeedSummary::default();
        let mut token = PendingToken::default();
        loop {
            let chunk = match reader.fill_buf() {
                Ok(chunk) => chunk,
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    tracing::warn!(error = %err, "Refresh feed failed");
                    return summary;
                }
            };

            if chunk.is_empty() {
                self.flush(&mut token, &mut summary);
                tracing::info!(
                    applied = summary.applied,
                    ignored = summary.ignored,
                    "Refresh feed closed"
                );
                return summary;
            }

            let consumed = chunk.len();
            for &byte in chunk {
                if is_separator(byte) {
                    self.flush(&mut token, &mut summary);
                } else {
                    token.push(byte);
                }
            }
            reader.consume(consumed);
        }
    }

    fn flush(&self, token: &mut PendingToken, summary: &mut FeedSummary) {
        let applied = match token.take() {
            None => return,
            Some(Ok(text)) => self.apply(&text).is_some(),
            Some(Err(len)) => {
                tracing::debug!(len, "Ignoring oversized refresh");
                false
            }
        };
        if applied {
            summary.applied = summary.applied.saturating_add(1);
        } else {
            summary.ignored = summary.ignored.saturating_add(1);
        }
    }
}

/// C `isspace` in the default locale.
fn is_separator(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

/// Bytes of the token being read.
#[derive(Debug, Default)]
struct PendingToken {
    bytes: Vec<u8>,
    len: usize,
}

impl PendingToken {
    fn push(&mut self, byte: u8) {
        if self.bytes.len() < MAX_TOKEN_BYTES {
            self.bytes.push(byte);
        }
        self.len = self.len.saturating_add(1);
    }

    /// The finished token, or its length when it overflowed the buffer.
    fn take(&mut self) -> Option<Result<String, usize>> {
        let len = std::mem::take(&mut self.len);
        let bytes = std::mem::take(&mut self.bytes);
        match len {
            0 => None,
            len if len > MAX_TOKEN_BYTES => Some(Err(len)),
            _ => Some(Ok(String::from_utf8_lossy(&bytes).into_owned())),
        }
    }
}
