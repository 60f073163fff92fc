//! Core value types: symbol version, error correction level, encoding mode,
//! and the capacity tables they index.

/// A QR code version (1–40).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Version(u8);

impl Version {
    /// The minimum version number supported in the QR Code Model 2 standard.
    pub const MIN: Version = Version(1);

    /// The maximum version number supported in the QR Code Model 2 standard.
    pub const MAX: Version = Version(40);

    /// Creates a version object from the given number.
    ///
    /// # Panics
    ///
    /// Panics if the number is outside the range [1, 40].
    pub const fn new(ver: u8) -> Self {
        assert!(
            Version::MIN.value() <= ver && ver <= Version::MAX.value(),
            "Version number out of range"
        );
        Self(ver)
    }

    /// Returns the value, which is in the range [1, 40].
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Returns the number of modules per side, `17 + 4 * version`.
    pub const fn side_len(self) -> usize {
        17 + 4 * (self.0 as usize)
    }

    /// Returns the total number of codewords (data plus error correction)
    /// that fit in a symbol of this version.
    pub fn num_total_codewords(self) -> usize {
        let ver = usize::from(self.0);
        let mut bits: usize = (16 * ver + 128) * ver + 64;
        if ver >= 2 {
            let numalign: usize = ver / 7 + 2;
            bits -= (25 * numalign - 10) * numalign - 55;
            if ver >= 7 {
                bits -= 36;
            }
        }
        bits / 8
    }

    /// Returns the number of data codewords available at this version and
    /// error correction level.
    pub fn num_data_codewords(self, ecl: ErrorCorrectionLevel) -> usize {
        self.num_total_codewords() - ecl.ec_codewords_per_block(self) * ecl.num_ec_blocks(self)
    }
}

/// Error correction level for a QR code.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum ErrorCorrectionLevel {
    /// Level L, tolerates ~7% erroneous codewords.
    Low,
    /// Level M, tolerates ~15% erroneous codewords.
    Medium,
    /// Level Q, tolerates ~25% erroneous codewords.
    Quartile,
    /// Level H, tolerates ~30% erroneous codewords.
    High,
}

impl ErrorCorrectionLevel {
    /// Returns an unsigned 2-bit integer (in the range 0 to 3).
    pub(crate) fn ordinal(self) -> usize {
        use ErrorCorrectionLevel::*;
        match self {
            Low => 0,
            Medium => 1,
            Quartile => 2,
            High => 3,
        }
    }

    /// Returns the 2-bit indicator used in the format information.
    pub(crate) fn format_bits(self) -> u8 {
        use ErrorCorrectionLevel::*;
        match self {
            Low => 1,
            Medium => 0,
            Quartile => 3,
            High => 2,
        }
    }

    /// Returns the number of error correction codewords in each block.
    pub(crate) fn ec_codewords_per_block(self, ver: Version) -> usize {
        ECC_CODEWORDS_PER_BLOCK[self.ordinal()][usize::from(ver.value())] as usize
    }

    /// Returns the number of Reed-Solomon blocks the codewords are split into.
    pub(crate) fn num_ec_blocks(self, ver: Version) -> usize {
        NUM_ERROR_CORRECTION_BLOCKS[self.ordinal()][usize::from(ver.value())] as usize
    }
}

impl Default for ErrorCorrectionLevel {
    fn default() -> Self {
        ErrorCorrectionLevel::Medium
    }
}

/// Data encoding mode of a segment.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EncodingMode {
    Numeric,
    Alphanumeric,
    Byte,
    Kanji,
}

impl EncodingMode {
    /// Returns the 4-bit mode indicator.
    pub(crate) fn mode_bits(self) -> u32 {
        use EncodingMode::*;
        match self {
            Numeric => 0x1,
            Alphanumeric => 0x2,
            Byte => 0x4,
            Kanji => 0x8,
        }
    }

    pub(crate) fn ordinal(self) -> usize {
        use EncodingMode::*;
        match self {
            Numeric => 0,
            Alphanumeric => 1,
            Byte => 2,
            Kanji => 3,
        }
    }

    pub(crate) fn from_ordinal(i: usize) -> Self {
        use EncodingMode::*;
        match i {
            0 => Numeric,
            1 => Alphanumeric,
            2 => Byte,
            3 => Kanji,
            _ => unreachable!("encoding mode ordinal out of range"),
        }
    }

    /// Returns the bit width of the character count indicator for this mode
    /// at the given version. The width changes at the version band
    /// boundaries 9/10 and 26/27.
    pub(crate) fn char_count_bits(self, ver: Version) -> usize {
        use EncodingMode::*;
        (match self {
            Numeric => [10, 12, 14],
            Alphanumeric => [9, 11, 13],
            Byte => [8, 16, 16],
            Kanji => [8, 10, 12],
        })[usize::from((ver.value() + 7) / 17)]
    }
}

/// The 4-bit mode indicator reserved for structured append headers.
pub(crate) const STRUCTURED_APPEND_MODE_BITS: u32 = 0x3;

/// Mode indicator width in bits, shared by every header including the
/// terminator.
pub(crate) const MODE_INDICATOR_LEN: usize = 4;

/// Structured append header: mode (4) + position (4) + total (4) + parity (8).
pub(crate) const STRUCTURED_APPEND_HEADER_LEN: usize = 20;

static ECC_CODEWORDS_PER_BLOCK: [[i8; 41]; 4] = [
    [
        -1, 7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28, 28, 28, 30,
        30, 26, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Low
    [
        -1, 10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26, 26, 28, 28,
        28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28,
    ], // Medium
    [
        -1, 13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30, 28, 30, 30,
        30, 30, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Quartile
    [
        -1, 17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28, 30, 24, 30,
        30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // High
];

static NUM_ERROR_CORRECTION_BLOCKS: [[i8; 41]; 4] = [
    [
        -1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 6, 6, 6, 6, 7, 8, 8, 9, 9, 10, 12, 12, 12,
        13, 14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 24, 25,
    ], // Low
    [
        -1, 1, 1, 1, 2, 2, 4, 4, 4, 5, 5, 5, 8, 9, 9, 10, 10, 11, 13, 14, 16, 17, 17, 18, 20, 21,
        23, 25, 26, 28, 29, 31, 33, 35, 37, 38, 40, 43, 45, 47, 49,
    ], // Medium
    [
        -1, 1, 1, 2, 2, 4, 4, 6, 6, 8, 8, 8, 10, 12, 16, 12, 17, 16, 18, 21, 20, 23, 23, 25, 27, 29,
        34, 34, 35, 38, 40, 43, 45, 48, 51, 53, 56, 59, 62, 65, 68,
    ], // Quartile
    [
        -1, 1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25, 25, 34, 30, 32, 35,
        37, 40, 42, 45, 48, 51, 54, 57, 60, 63, 66, 70, 74, 77, 81,
    ], // High
];
