//! MIDI message model
//!
//! Immutable value types for channel-voice and system-exclusive messages,
//! plus raw-byte parsing, encoding, and value conversions.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors produced when building a message from raw bytes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageError {
    #[error("empty MIDI message")]
    Empty,
    #[error("status byte 0x{0:02X} is not a channel-voice status")]
    BadStatus(u8),
    #[error("message too short for status 0x{0:02X}: got {1} bytes")]
    Truncated(u8, usize),
    #[error("system-exclusive data must start with F0 and end with F7")]
    UnframedSysEx,
}

/// Number of meaningful bytes for a channel-voice status byte.
///
/// Program Change (0xC0) and Channel Pressure (0xD0) carry a single data
/// byte; every other channel-voice message carries two.
pub fn byte_count(status: u8) -> usize {
    match status & 0xF0 {
        0xC0 | 0xD0 => 2,
        _ => 3,
    }
}

/// A channel-voice message: status byte plus up to two data bytes, tagged
/// with the port it belongs to.
///
/// For two-byte message kinds `data2` is carried as 0 and is not meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub port: u8,
    pub status: u8,
    pub data1: u8,
    pub data2: u8,
}

impl ChannelMessage {
    /// Create a three-byte channel message.
    pub fn new(port: u8, status: u8, data1: u8, data2: u8) -> Self {
        Self { port, status, data1, data2 }
    }

    /// Create a message without an explicit `data2` (defaults to 0; the
    /// outbound render path derives it from control state).
    pub fn short(port: u8, status: u8, data1: u8) -> Self {
        Self { port, status, data1, data2: 0 }
    }

    /// Parse a channel-voice message from raw wire bytes.
    pub fn from_raw(port: u8, data: &[u8]) -> Result<Self, MessageError> {
        let status = *data.first().ok_or(MessageError::Empty)?;
        if !(0x80..0xF0).contains(&status) {
            return Err(MessageError::BadStatus(status));
        }
        let needed = byte_count(status);
        if data.len() < needed {
            return Err(MessageError::Truncated(status, data.len()));
        }
        let data1 = data[1] & 0x7F;
        let data2 = if needed == 3 { data[2] & 0x7F } else { 0 };
        Ok(Self { port, status, data1, data2 })
    }

    /// Number of meaningful bytes (2 or 3) for this message's status.
    pub fn byte_count(&self) -> usize {
        byte_count(self.status)
    }

    /// Meaningful byte at `index` (0 = status), if present.
    pub fn byte(&self, index: usize) -> Option<u8> {
        match index {
            0 => Some(self.status),
            1 => Some(self.data1),
            2 if self.byte_count() == 3 => Some(self.data2),
            _ => None,
        }
    }

    /// MIDI channel (0-15) encoded in the status byte.
    pub fn channel(&self) -> u8 {
        self.status & 0x0F
    }

    /// Encode to wire bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        if self.byte_count() == 3 {
            vec![self.status, self.data1, self.data2]
        } else {
            vec![self.status, self.data1]
        }
    }
}

impl fmt::Display for ChannelMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.byte_count() == 3 {
            write!(
                f,
                "p{} {:02X}{:02X}{:02X}",
                self.port, self.status, self.data1, self.data2
            )
        } else {
            write!(f, "p{} {:02X}{:02X}", self.port, self.status, self.data1)
        }
    }
}

/// A system-exclusive message: the full framed byte string (F0 .. F7).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SysExMessage {
    pub port: u8,
    pub data: Vec<u8>,
    /// Urgent messages bypass any transport-level batching.
    pub urgent: bool,
}

impl SysExMessage {
    /// Create from framed bytes (must start with F0 and end with F7).
    pub fn new(port: u8, data: Vec<u8>) -> Result<Self, MessageError> {
        if data.first() != Some(&0xF0) || data.last() != Some(&0xF7) {
            return Err(MessageError::UnframedSysEx);
        }
        Ok(Self { port, data, urgent: false })
    }

    /// Create from a hex string such as `"F0 00 20 32 F7"` (whitespace and
    /// case insensitive).
    pub fn from_hex(port: u8, hex_str: &str) -> Result<Self, MessageError> {
        let compact: String = hex_str.chars().filter(|c| !c.is_whitespace()).collect();
        let data = hex::decode(&compact).map_err(|_| MessageError::UnframedSysEx)?;
        Self::new(port, data)
    }

    /// Mark the message as urgent.
    pub fn urgent(mut self) -> Self {
        self.urgent = true;
        self
    }

    /// Canonical uppercase hex rendering of the byte string.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(&self.data)
    }
}

impl fmt::Display for SysExMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{} SysEx {} bytes", self.port, self.data.len())
    }
}

/// A message on the transport boundary, in either direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Message {
    Channel(ChannelMessage),
    SysEx(SysExMessage),
}

impl Message {
    /// Port the message belongs to.
    pub fn port(&self) -> u8 {
        match self {
            Message::Channel(m) => m.port,
            Message::SysEx(m) => m.port,
        }
    }

    /// Encode to wire bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Message::Channel(m) => m.to_bytes(),
            Message::SysEx(m) => m.data.clone(),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Channel(m) => m.fmt(f),
            Message::SysEx(m) => m.fmt(f),
        }
    }
}

impl From<ChannelMessage> for Message {
    fn from(m: ChannelMessage) -> Self {
        Message::Channel(m)
    }
}

impl From<SysExMessage> for Message {
    fn from(m: SysExMessage) -> Self {
        Message::SysEx(m)
    }
}

/// MIDI value conversion utilities
pub mod convert {
    /// Convert a 7-bit value (0-127) to a normalized 0.0-1.0 float.
    pub fn to_normalized(value: u8) -> f64 {
        f64::from(value.min(127)) / 127.0
    }

    /// Convert a normalized 0.0-1.0 float to a 7-bit value (0-127).
    pub fn from_normalized(value: f64) -> u8 {
        (value.clamp(0.0, 1.0) * 127.0).round() as u8
    }
}

/// Format bytes as spaced uppercase hex for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_note_on() {
        let msg = ChannelMessage::from_raw(0, &[0x90, 60, 100]).unwrap();
        assert_eq!(msg, ChannelMessage::new(0, 0x90, 60, 100));
        assert_eq!(msg.byte_count(), 3);
        assert_eq!(msg.channel(), 0);
    }

    #[test]
    fn test_from_raw_program_change_is_two_bytes() {
        let msg = ChannelMessage::from_raw(1, &[0xC2, 5]).unwrap();
        assert_eq!(msg.byte_count(), 2);
        assert_eq!(msg.byte(2), None);
        assert_eq!(msg.to_bytes(), vec![0xC2, 5]);
    }

    #[test]
    fn test_from_raw_rejects_system_status() {
        assert_eq!(
            ChannelMessage::from_raw(0, &[0xF8]),
            Err(MessageError::BadStatus(0xF8))
        );
        assert_eq!(
            ChannelMessage::from_raw(0, &[0x3C, 0x40]),
            Err(MessageError::BadStatus(0x3C))
        );
    }

    #[test]
    fn test_from_raw_truncated() {
        assert_eq!(
            ChannelMessage::from_raw(0, &[0xB0, 0x10]),
            Err(MessageError::Truncated(0xB0, 2))
        );
    }

    #[test]
    fn test_sysex_framing() {
        let ok = SysExMessage::new(0, vec![0xF0, 0x7E, 0x06, 0x01, 0xF7]);
        assert!(ok.is_ok());

        let bad = SysExMessage::new(0, vec![0x7E, 0x06, 0x01]);
        assert_eq!(bad, Err(MessageError::UnframedSysEx));
    }

    #[test]
    fn test_sysex_from_hex_round_trip() {
        let msg = SysExMessage::from_hex(2, "f0 00 20 32 41 f7").unwrap();
        assert_eq!(msg.to_hex(), "F000203241F7");
        assert_eq!(msg.port, 2);
        assert!(!msg.urgent);
        assert!(msg.clone().urgent().urgent);
    }

    #[test]
    fn test_normalized_conversions() {
        assert_eq!(convert::from_normalized(0.0), 0);
        assert_eq!(convert::from_normalized(1.0), 127);
        assert_eq!(convert::from_normalized(convert::to_normalized(64)), 64);
    }

    #[test]
    fn test_format_hex() {
        assert_eq!(format_hex(&[0xB0, 0x6C, 0x7F]), "B0 6C 7F");
    }
}
