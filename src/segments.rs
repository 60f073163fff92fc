//! Per-mode segment encoders and character classification.
//!
//! Each encoder accumulates the symbol characters of one segment and knows
//! the marginal bit cost of appending one more character, so the builder
//! can charge capacity before committing. The emitted payload is produced
//! on demand by [`SegmentEncoder::to_bytes`].

use crate::bits::BitSequence;
use crate::charset::{self, ByteCharset};
use crate::types::EncodingMode;

static ALPHANUMERIC_CHARSET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

pub(crate) fn is_numeric(c: char) -> bool {
    c.is_ascii_digit()
}

pub(crate) fn is_alphanumeric(c: char) -> bool {
    ALPHANUMERIC_CHARSET.contains(c)
}

pub(crate) fn is_kanji(c: char) -> bool {
    charset::kanji_bytes(c).is_some()
}

/// Picks the most compact mode accepting `c`: Numeric > Alphanumeric >
/// Kanji > Byte. Returns `None` when no mode can represent the character.
pub(crate) fn best_mode(c: char, byte_charset: ByteCharset) -> Option<EncodingMode> {
    if is_numeric(c) {
        Some(EncodingMode::Numeric)
    } else if is_alphanumeric(c) {
        Some(EncodingMode::Alphanumeric)
    } else if is_kanji(c) {
        Some(EncodingMode::Kanji)
    } else if byte_charset.encoded_len(c).is_some() {
        Some(EncodingMode::Byte)
    } else {
        None
    }
}

/// Whether `mode` accepts `c`. The current segment keeps a character it
/// accepts even when a fresh classification would pick a more compact mode.
pub(crate) fn mode_accepts(mode: EncodingMode, c: char, byte_charset: ByteCharset) -> bool {
    match mode {
        EncodingMode::Numeric => is_numeric(c),
        EncodingMode::Alphanumeric => is_alphanumeric(c),
        EncodingMode::Kanji => is_kanji(c),
        EncodingMode::Byte => byte_charset.encoded_len(c).is_some(),
    }
}

/// One in-progress segment: the mode plus the accumulated symbol characters.
pub(crate) enum SegmentEncoder {
    Numeric(NumericEncoder),
    Alphanumeric(AlphanumericEncoder),
    Byte(ByteEncoder),
    Kanji(KanjiEncoder),
}

impl SegmentEncoder {
    pub fn new(mode: EncodingMode, byte_charset: ByteCharset) -> Self {
        match mode {
            EncodingMode::Numeric => SegmentEncoder::Numeric(NumericEncoder::default()),
            EncodingMode::Alphanumeric => {
                SegmentEncoder::Alphanumeric(AlphanumericEncoder::default())
            }
            EncodingMode::Byte => SegmentEncoder::Byte(ByteEncoder::new(byte_charset)),
            EncodingMode::Kanji => SegmentEncoder::Kanji(KanjiEncoder::default()),
        }
    }

    pub fn mode(&self) -> EncodingMode {
        match self {
            SegmentEncoder::Numeric(_) => EncodingMode::Numeric,
            SegmentEncoder::Alphanumeric(_) => EncodingMode::Alphanumeric,
            SegmentEncoder::Byte(_) => EncodingMode::Byte,
            SegmentEncoder::Kanji(_) => EncodingMode::Kanji,
        }
    }

    /// Marginal bit cost of appending `c`, or `None` when the character is
    /// not representable (byte mode with an unencodable character).
    pub fn bit_length(&self, c: char) -> Option<usize> {
        match self {
            SegmentEncoder::Numeric(e) => Some(if e.char_count % 3 == 0 { 4 } else { 3 }),
            SegmentEncoder::Alphanumeric(e) => Some(if e.char_count % 2 == 0 { 6 } else { 5 }),
            SegmentEncoder::Byte(e) => e.charset.encoded_len(c).map(|n| 8 * n),
            SegmentEncoder::Kanji(_) => Some(13),
        }
    }

    /// Appends `c`, returning the bytes it contributes to the structured
    /// append parity. Returns `None` (without mutating) when the character
    /// cannot be represented.
    pub fn append(&mut self, c: char) -> Option<Vec<u8>> {
        match self {
            SegmentEncoder::Numeric(e) => e.append(c),
            SegmentEncoder::Alphanumeric(e) => e.append(c),
            SegmentEncoder::Byte(e) => e.append(c),
            SegmentEncoder::Kanji(e) => e.append(c),
        }
    }

    /// The value written to the character count indicator. For byte mode
    /// this counts bytes, not characters.
    pub fn char_count(&self) -> usize {
        match self {
            SegmentEncoder::Numeric(e) => e.char_count,
            SegmentEncoder::Alphanumeric(e) => e.char_count,
            SegmentEncoder::Byte(e) => e.bytes.len(),
            SegmentEncoder::Kanji(e) => e.char_count,
        }
    }

    /// Total payload bits emitted by this segment.
    pub fn bit_count(&self) -> usize {
        match self {
            SegmentEncoder::Numeric(e) => e.bit_count,
            SegmentEncoder::Alphanumeric(e) => e.bit_count,
            SegmentEncoder::Byte(e) => 8 * e.bytes.len(),
            SegmentEncoder::Kanji(e) => e.bit_count,
        }
    }

    /// The payload rendered as bytes; a trailing partial byte keeps its
    /// bits top-aligned.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            SegmentEncoder::Numeric(e) => e.to_bytes(),
            SegmentEncoder::Alphanumeric(e) => e.to_bytes(),
            SegmentEncoder::Byte(e) => e.bytes.clone(),
            SegmentEncoder::Kanji(e) => e.to_bytes(),
        }
    }
}

/// Digits packed in groups of three into 10-bit values; a trailing group
/// of two costs 7 bits, a single digit 4.
#[derive(Default)]
pub(crate) struct NumericEncoder {
    groups: Vec<u32>,
    char_count: usize,
    bit_count: usize,
}

impl NumericEncoder {
    fn append(&mut self, c: char) -> Option<Vec<u8>> {
        let digit = c.to_digit(10)?;
        if self.char_count % 3 == 0 {
            self.groups.push(digit);
            self.bit_count += 4;
        } else {
            let last = self.groups.last_mut().unwrap();
            *last = *last * 10 + digit;
            self.bit_count += 3;
        }
        self.char_count += 1;
        Some(vec![c as u8])
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut bs = BitSequence::new();
        if let Some((&last, rest)) = self.groups.split_last() {
            for &group in rest {
                bs.append_bits(group, 10);
            }
            let last_len = match self.char_count % 3 {
                0 => 10,
                1 => 4,
                _ => 7,
            };
            bs.append_bits(last, last_len);
        }
        bs.to_bytes()
    }
}

/// Characters of the 45-symbol set packed in pairs into 11-bit values; a
/// trailing single character costs 6 bits.
#[derive(Default)]
pub(crate) struct AlphanumericEncoder {
    pairs: Vec<u32>,
    char_count: usize,
    bit_count: usize,
}

impl AlphanumericEncoder {
    fn append(&mut self, c: char) -> Option<Vec<u8>> {
        let value = ALPHANUMERIC_CHARSET.find(c)? as u32;
        if self.char_count % 2 == 0 {
            self.pairs.push(value);
            self.bit_count += 6;
        } else {
            let last = self.pairs.last_mut().unwrap();
            *last = *last * 45 + value;
            self.bit_count += 5;
        }
        self.char_count += 1;
        Some(vec![c as u8])
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut bs = BitSequence::new();
        if let Some((&last, rest)) = self.pairs.split_last() {
            for &pair in rest {
                bs.append_bits(pair, 11);
            }
            let last_len = if self.char_count % 2 == 0 { 11 } else { 6 };
            bs.append_bits(last, last_len);
        }
        bs.to_bytes()
    }
}

/// Characters encoded through the configured byte-mode character set,
/// eight bits per produced byte.
pub(crate) struct ByteEncoder {
    charset: ByteCharset,
    bytes: Vec<u8>,
}

impl ByteEncoder {
    fn new(charset: ByteCharset) -> Self {
        Self {
            charset,
            bytes: Vec::new(),
        }
    }

    fn append(&mut self, c: char) -> Option<Vec<u8>> {
        let encoded = self.charset.encode_char(c)?;
        self.bytes.extend_from_slice(&encoded);
        Some(encoded)
    }
}

/// Shift-JIS double-byte characters mapped to 13-bit values.
#[derive(Default)]
pub(crate) struct KanjiEncoder {
    values: Vec<u32>,
    char_count: usize,
    bit_count: usize,
}

impl KanjiEncoder {
    fn append(&mut self, c: char) -> Option<Vec<u8>> {
        let [hi, lo] = charset::kanji_bytes(c)?;
        self.values.push(charset::kanji_value(hi, lo));
        self.char_count += 1;
        self.bit_count += 13;
        Some(vec![hi, lo])
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut bs = BitSequence::new();
        for &value in &self.values {
            bs.append_bits(value, 13);
        }
        bs.to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn append_str(enc: &mut SegmentEncoder, s: &str) {
        for c in s.chars() {
            enc.append(c).expect("test characters must be representable");
        }
    }

    #[test]
    fn numeric_standard_example() {
        let mut enc = SegmentEncoder::new(EncodingMode::Numeric, ByteCharset::latin1());
        append_str(&mut enc, "01234567");
        assert_eq!(enc.char_count(), 8);
        assert_eq!(enc.bit_count(), 27);
        // 0000001100 0101011001 1000011, top-aligned into bytes.
        assert_eq!(enc.to_bytes(), vec![0x03, 0x15, 0x98, 0x60]);
    }

    #[test]
    fn numeric_marginal_costs() {
        let mut enc = SegmentEncoder::new(EncodingMode::Numeric, ByteCharset::latin1());
        assert_eq!(enc.bit_length('1'), Some(4));
        enc.append('1').unwrap();
        assert_eq!(enc.bit_length('2'), Some(3));
        enc.append('2').unwrap();
        assert_eq!(enc.bit_length('3'), Some(3));
        enc.append('3').unwrap();
        assert_eq!(enc.bit_length('4'), Some(4));
    }

    #[test]
    fn alphanumeric_hello_world() {
        let mut enc = SegmentEncoder::new(EncodingMode::Alphanumeric, ByteCharset::latin1());
        append_str(&mut enc, "HELLO WORLD");
        assert_eq!(enc.char_count(), 11);
        // 6 pairs and a trailing single: 5 * 11 + 6.
        assert_eq!(enc.bit_count(), 61);
        // First pair: H=17, E=14 -> 17*45+14 = 779.
        let bytes = enc.to_bytes();
        assert_eq!(bytes[0], (779u16 >> 3) as u8);
    }

    #[test]
    fn byte_mode_counts_bytes_not_chars() {
        let mut enc =
            SegmentEncoder::new(EncodingMode::Byte, ByteCharset::for_label("UTF-8").unwrap());
        enc.append('é').unwrap();
        assert_eq!(enc.char_count(), 2);
        assert_eq!(enc.bit_count(), 16);
        assert_eq!(enc.to_bytes(), vec![0xC3, 0xA9]);
    }

    #[test]
    fn byte_mode_rejects_unencodable() {
        let mut enc = SegmentEncoder::new(EncodingMode::Byte, ByteCharset::latin1());
        assert_eq!(enc.bit_length('\u{1F600}'), None);
        assert!(enc.append('\u{1F600}').is_none());
        assert_eq!(enc.bit_count(), 0);
    }

    #[test]
    fn kanji_two_chars() {
        let mut enc = SegmentEncoder::new(EncodingMode::Kanji, ByteCharset::latin1());
        let parity = enc.append('日').unwrap();
        assert_eq!(parity, vec![0x93, 0xFA]);
        enc.append('本').unwrap();
        assert_eq!(enc.char_count(), 2);
        assert_eq!(enc.bit_count(), 26);
    }

    #[test]
    fn greedy_classification_order() {
        let latin1 = ByteCharset::latin1();
        assert_eq!(best_mode('7', latin1), Some(EncodingMode::Numeric));
        assert_eq!(best_mode('K', latin1), Some(EncodingMode::Alphanumeric));
        assert_eq!(best_mode('日', latin1), Some(EncodingMode::Kanji));
        assert_eq!(best_mode('a', latin1), Some(EncodingMode::Byte));
        assert_eq!(best_mode('\u{1F600}', latin1), None);
    }

    #[test]
    fn current_mode_keeps_acceptable_chars() {
        let latin1 = ByteCharset::latin1();
        // A digit stays in an alphanumeric or byte segment.
        assert!(mode_accepts(EncodingMode::Alphanumeric, '7', latin1));
        assert!(mode_accepts(EncodingMode::Byte, '7', latin1));
        assert!(!mode_accepts(EncodingMode::Numeric, 'A', latin1));
        assert!(!mode_accepts(EncodingMode::Kanji, 'A', latin1));
    }
}
