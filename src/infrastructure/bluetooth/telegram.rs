//! Telegram framing
//!
//! One outbound frame for the NXT brick. The brick expects a two byte
//! length prefix in front of every Bluetooth telegram; the high byte is
//! always zero here, so it doubles as the (unused) sequence byte.
//!
//! ```text
//! [0]  : body length (frame length - 2)
//! [1]  : 0x00
//! [2]  : command type (0x80 = direct command, no reply)
//! [3..]: opcode + payload
//! ```

use crate::infrastructure::bluetooth::error::TelegramError;

/// Direct command, no response expected
pub const DIRECT_COMMAND_NO_REPLY: u8 = 0x80;

/// Largest body the single length byte is allowed to describe
pub const MAX_BODY_LEN: usize = 253;

const HEADER_LEN: usize = 2;

/// Append-only, length-prefixed command frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Telegram {
    bytes: Vec<u8>,
}

impl Telegram {
    /// Empty direct command: `01 00 80`
    pub fn new() -> Self {
        Self {
            bytes: vec![0x01, 0x00, DIRECT_COMMAND_NO_REPLY],
        }
    }

    /// Append a single byte, keeping the length prefix in sync
    pub fn append(&mut self, byte: u8) -> Result<(), TelegramError> {
        self.ensure_room(1)?;
        self.bytes.push(byte);
        self.sync_length();
        Ok(())
    }

    /// Append several bytes in order
    ///
    /// Either every byte fits and is appended, or the telegram is left
    /// untouched.
    pub fn append_many(&mut self, bytes: &[u8]) -> Result<(), TelegramError> {
        self.ensure_room(bytes.len())?;
        for &byte in bytes {
            self.bytes.push(byte);
            self.sync_length();
        }
        Ok(())
    }

    /// Frame ready for transmission
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of bytes after the header (what the length byte reports)
    pub fn body_len(&self) -> usize {
        self.bytes.len() - HEADER_LEN
    }

    fn ensure_room(&self, extra: usize) -> Result<(), TelegramError> {
        let requested = self.body_len() + extra;
        if requested > MAX_BODY_LEN {
            return Err(TelegramError::TooLong {
                requested,
                max: MAX_BODY_LEN,
            });
        }
        Ok(())
    }

    fn sync_length(&mut self) {
        // ensure_room keeps the body within u8 range
        self.bytes[0] = self.body_len() as u8;
    }
}

impl Default for Telegram {
    fn default() -> Self {
        Self::new()
    }
}
