//! Address patterns for matching inbound hardware messages
//!
//! A pattern is a human-authored hex string in which every character is one
//! nibble and `?` stands for "any nibble": `"B06C??"` matches any message
//! with status `0xB0` and data1 `0x6C`. Patterns are compiled once at
//! control construction and are immutable afterwards; a malformed pattern is
//! a construction-time failure, never a match-time one.

use crate::midi::{byte_count, ChannelMessage, Message, SysExMessage};
use std::fmt;
use thiserror::Error;

/// Errors raised when compiling or parsing a pattern string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern length must be 4 or 6 hex characters, got {0}")]
    BadLength(usize),
    #[error("invalid pattern character '{1}' at position {0} (expected 0-9, A-F or ?)")]
    InvalidChar(usize, char),
    #[error("cannot parse a concrete message from a pattern with wildcards")]
    NotConcrete,
    #[error("sysex pattern must be framed hex (F0 .. F7) without wildcards")]
    BadSysEx,
}

/// One nibble of a compiled pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Nibble {
    Literal(u8),
    Wildcard,
}

impl Nibble {
    fn matches(self, value: u8) -> bool {
        match self {
            Nibble::Literal(n) => n == value,
            Nibble::Wildcard => true,
        }
    }
}

fn split(byte: u8) -> (u8, u8) {
    (byte >> 4, byte & 0x0F)
}

/// A compiled channel-message pattern: 2 or 3 byte positions, each made of
/// two nibbles that are either literal hex digits or wildcards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePattern {
    nibbles: Vec<Nibble>,
    text: String,
}

impl MessagePattern {
    /// Compile a pattern string. Fails on any length other than 4 or 6
    /// characters (odd lengths included) and on characters outside
    /// `[0-9A-Fa-f?]`.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        if pattern.len() != 4 && pattern.len() != 6 {
            return Err(PatternError::BadLength(pattern.len()));
        }
        let mut nibbles = Vec::with_capacity(pattern.len());
        for (i, c) in pattern.chars().enumerate() {
            let nibble = match c {
                '?' => Nibble::Wildcard,
                _ => match c.to_digit(16) {
                    Some(d) => Nibble::Literal(d as u8),
                    None => return Err(PatternError::InvalidChar(i, c)),
                },
            };
            nibbles.push(nibble);
        }
        Ok(Self {
            nibbles,
            text: pattern.to_uppercase(),
        })
    }

    /// The canonical (uppercase) pattern text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of byte positions covered by this pattern (2 or 3).
    pub fn len_bytes(&self) -> usize {
        self.nibbles.len() / 2
    }

    /// Whether the byte position has no wildcard nibbles.
    pub fn is_concrete_byte(&self, index: usize) -> bool {
        self.nibbles[index * 2] != Nibble::Wildcard
            && self.nibbles[index * 2 + 1] != Nibble::Wildcard
    }

    /// Test a message against the pattern.
    ///
    /// Every byte position present in the pattern is checked nibble-wise;
    /// wildcard nibbles always match. A message with fewer meaningful bytes
    /// than the pattern never matches; extra message bytes are ignored.
    pub fn matches(&self, message: &ChannelMessage) -> bool {
        if message.byte_count() < self.len_bytes() {
            return false;
        }
        for index in 0..self.len_bytes() {
            // byte() cannot be None here given the count check above
            let Some(byte) = message.byte(index) else {
                return false;
            };
            let (hi, lo) = split(byte);
            if !self.nibbles[index * 2].matches(hi) || !self.nibbles[index * 2 + 1].matches(lo) {
                return false;
            }
        }
        true
    }

    /// Which meaningful byte carries the control value: data2 for 3-byte
    /// patterns, data1 for 2-byte ones.
    pub fn value_byte_index(&self) -> usize {
        self.len_bytes() - 1
    }

    /// Build a concrete outbound message from the pattern and a state value.
    ///
    /// Literal nibbles are copied; each wildcard nibble takes the
    /// corresponding nibble of the value byte at its position.
    pub fn realize(&self, port: u8, value: u8) -> ChannelMessage {
        let (value_hi, value_lo) = split(value);
        let mut bytes = [0u8; 3];
        for index in 0..self.len_bytes() {
            let hi = match self.nibbles[index * 2] {
                Nibble::Literal(n) => n,
                Nibble::Wildcard => value_hi,
            };
            let lo = match self.nibbles[index * 2 + 1] {
                Nibble::Literal(n) => n,
                Nibble::Wildcard => value_lo,
            };
            bytes[index] = (hi << 4) | lo;
        }
        if self.len_bytes() == 3 {
            ChannelMessage::new(port, bytes[0], bytes[1], bytes[2])
        } else {
            ChannelMessage::short(port, bytes[0], bytes[1])
        }
    }

    /// Render a concrete message into canonical uppercase pattern form
    /// (4 or 6 hex characters by meaningful byte count, no wildcards).
    pub fn of(message: &ChannelMessage) -> String {
        if message.byte_count() == 3 {
            format!(
                "{:02X}{:02X}{:02X}",
                message.status, message.data1, message.data2
            )
        } else {
            format!("{:02X}{:02X}", message.status, message.data1)
        }
    }

    /// Parse a fully concrete pattern string back into a message.
    ///
    /// Inverse of [`MessagePattern::of`]: `parse_message(of(m), p) == m` for
    /// every concrete message `m` on port `p`.
    pub fn parse_message(pattern: &str, port: u8) -> Result<ChannelMessage, PatternError> {
        let compiled = Self::compile(pattern)?;
        if compiled.nibbles.contains(&Nibble::Wildcard) {
            return Err(PatternError::NotConcrete);
        }
        // All nibbles literal, so realize() ignores the value argument.
        let message = compiled.realize(port, 0);
        if byte_count(message.status) != compiled.len_bytes() {
            return Err(PatternError::BadLength(pattern.len()));
        }
        Ok(message)
    }
}

impl fmt::Display for MessagePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A system-exclusive pattern, matched by full byte equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysExPattern {
    data: Vec<u8>,
}

impl SysExPattern {
    /// Compile from an even-length framed hex string (no wildcards).
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let data = hex::decode(pattern).map_err(|_| PatternError::BadSysEx)?;
        if data.first() != Some(&0xF0) || data.last() != Some(&0xF7) {
            return Err(PatternError::BadSysEx);
        }
        Ok(Self { data })
    }

    /// Full hex equality against the message byte string.
    pub fn matches(&self, message: &SysExMessage) -> bool {
        self.data == message.data
    }
}

/// A compiled pattern of either kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    Channel(MessagePattern),
    SysEx(SysExPattern),
}

impl Pattern {
    /// Compile a pattern string: 4/6-character strings become channel
    /// patterns, longer even-length framed hex strings become sysex
    /// patterns.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        if pattern.len() == 4 || pattern.len() == 6 {
            Ok(Pattern::Channel(MessagePattern::compile(pattern)?))
        } else {
            Ok(Pattern::SysEx(SysExPattern::compile(pattern)?))
        }
    }

    /// Test a transport message against the pattern.
    pub fn matches(&self, message: &Message) -> bool {
        match (self, message) {
            (Pattern::Channel(p), Message::Channel(m)) => p.matches(m),
            (Pattern::SysEx(p), Message::SysEx(m)) => p.matches(m),
            _ => false,
        }
    }

    /// The channel pattern, if this is one.
    pub fn as_channel(&self) -> Option<&MessagePattern> {
        match self {
            Pattern::Channel(p) => Some(p),
            Pattern::SysEx(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_compile_rejects_bad_length() {
        assert_eq!(
            MessagePattern::compile("B06").unwrap_err(),
            PatternError::BadLength(3)
        );
        assert_eq!(
            MessagePattern::compile("B06C7").unwrap_err(),
            PatternError::BadLength(5)
        );
        assert_eq!(
            MessagePattern::compile("").unwrap_err(),
            PatternError::BadLength(0)
        );
    }

    #[test]
    fn test_compile_rejects_bad_chars() {
        assert_eq!(
            MessagePattern::compile("B0G?").unwrap_err(),
            PatternError::InvalidChar(2, 'G')
        );
        assert_eq!(
            MessagePattern::compile("b06c 7").unwrap_err(),
            PatternError::InvalidChar(4, ' ')
        );
    }

    #[test]
    fn test_wildcard_matching() {
        let pattern = MessagePattern::compile("B06C??").unwrap();

        assert!(pattern.matches(&ChannelMessage::new(0, 0xB0, 0x6C, 0x00)));
        assert!(pattern.matches(&ChannelMessage::new(0, 0xB0, 0x6C, 0x7F)));
        assert!(!pattern.matches(&ChannelMessage::new(0, 0xB0, 0x6D, 0x00)));
        assert!(!pattern.matches(&ChannelMessage::new(0, 0xB1, 0x6C, 0x00)));
    }

    #[test]
    fn test_short_message_never_matches_longer_pattern() {
        let pattern = MessagePattern::compile("C0??7F").unwrap();
        // Program change carries two meaningful bytes; a 3-byte pattern
        // can never match it.
        let msg = ChannelMessage::from_raw(0, &[0xC0, 0x05]).unwrap();
        assert!(!pattern.matches(&msg));
    }

    #[test]
    fn test_two_byte_pattern_ignores_extra_bytes() {
        let pattern = MessagePattern::compile("903C").unwrap();
        assert!(pattern.matches(&ChannelMessage::new(0, 0x90, 0x3C, 0x00)));
        assert!(pattern.matches(&ChannelMessage::new(0, 0x90, 0x3C, 0x64)));
    }

    #[test]
    fn test_lowercase_accepted_canonical_uppercase() {
        let pattern = MessagePattern::compile("b06c??").unwrap();
        assert_eq!(pattern.text(), "B06C??");
        assert!(pattern.matches(&ChannelMessage::new(0, 0xB0, 0x6C, 0x40)));
    }

    #[test]
    fn test_half_wildcard_byte() {
        // A byte position is concrete only when neither nibble is a
        // wildcard.
        let pattern = MessagePattern::compile("9?3C40").unwrap();
        assert!(!pattern.is_concrete_byte(0));
        assert!(pattern.is_concrete_byte(1));
        assert!(pattern.matches(&ChannelMessage::new(0, 0x90, 0x3C, 0x40)));
        assert!(pattern.matches(&ChannelMessage::new(0, 0x9F, 0x3C, 0x40)));
        assert!(!pattern.matches(&ChannelMessage::new(0, 0x80, 0x3C, 0x40)));
    }

    #[test]
    fn test_realize_fills_wildcards_from_value() {
        let pattern = MessagePattern::compile("B06C??").unwrap();
        assert_eq!(
            pattern.realize(1, 0x7F),
            ChannelMessage::new(1, 0xB0, 0x6C, 0x7F)
        );

        let concrete = MessagePattern::compile("903C40").unwrap();
        assert_eq!(
            concrete.realize(0, 0x12),
            ChannelMessage::new(0, 0x90, 0x3C, 0x40)
        );
    }

    #[test]
    fn test_round_trip_examples() {
        let m = ChannelMessage::new(3, 0xB0, 0x6C, 0x5A);
        assert_eq!(MessagePattern::of(&m), "B06C5A");
        assert_eq!(MessagePattern::parse_message("B06C5A", 3).unwrap(), m);

        let short = ChannelMessage::from_raw(0, &[0xC1, 0x09]).unwrap();
        assert_eq!(MessagePattern::of(&short), "C109");
        assert_eq!(MessagePattern::parse_message("C109", 0).unwrap(), short);
    }

    #[test]
    fn test_parse_message_rejects_wildcards() {
        assert_eq!(
            MessagePattern::parse_message("B06C??", 0).unwrap_err(),
            PatternError::NotConcrete
        );
    }

    #[test]
    fn test_sysex_pattern_equality() {
        let pattern = SysExPattern::compile("F07E060100F7").unwrap();
        let hit = SysExMessage::from_hex(0, "F0 7E 06 01 00 F7").unwrap();
        let miss = SysExMessage::from_hex(0, "F0 7E 06 02 00 F7").unwrap();

        assert!(pattern.matches(&hit));
        assert!(!pattern.matches(&miss));
    }

    #[test]
    fn test_pattern_compile_dispatches_on_length() {
        assert!(matches!(
            Pattern::compile("B06C??").unwrap(),
            Pattern::Channel(_)
        ));
        assert!(matches!(
            Pattern::compile("F07E060100F7").unwrap(),
            Pattern::SysEx(_)
        ));
        assert!(Pattern::compile("F07E?").is_err());
    }

    proptest! {
        // Round-trip law: parse(of(m)) == m for any concrete message.
        #[test]
        fn prop_round_trip(status in 0x80u8..0xF0, data1 in 0u8..=0x7F, data2 in 0u8..=0x7F, port in 0u8..=8) {
            let m = if byte_count(status) == 3 {
                ChannelMessage::new(port, status, data1, data2)
            } else {
                ChannelMessage::short(port, status, data1)
            };
            let rendered = MessagePattern::of(&m);
            prop_assert_eq!(MessagePattern::parse_message(&rendered, port).unwrap(), m);
        }

        // A pattern rendered from a message always matches that message.
        #[test]
        fn prop_of_matches_self(status in 0x80u8..0xF0, data1 in 0u8..=0x7F, data2 in 0u8..=0x7F) {
            let m = if byte_count(status) == 3 {
                ChannelMessage::new(0, status, data1, data2)
            } else {
                ChannelMessage::short(0, status, data1)
            };
            let pattern = MessagePattern::compile(&MessagePattern::of(&m)).unwrap();
            prop_assert!(pattern.matches(&m));
        }
    }
}
