//! A single QR symbol: character accumulation against the data capacity,
//! bit-stream assembly, Reed-Solomon block interleaving, and the sealed
//! read-only view handed out by [`Symbols`].

use std::path::Path;

use tracing::debug;

use crate::bits::BitSequence;
use crate::charset::ByteCharset;
use crate::error::{Error, Result};
use crate::galois::ReedSolomon;
use crate::masking;
use crate::matrix::{self, ModuleMatrix};
use crate::render;
use crate::segments::SegmentEncoder;
use crate::symbols::Symbols;
use crate::types::{
    EncodingMode, ErrorCorrectionLevel, Version, MODE_INDICATOR_LEN, STRUCTURED_APPEND_HEADER_LEN,
    STRUCTURED_APPEND_MODE_BITS,
};

/// Shared, copyable build parameters, passed into per-symbol operations in
/// place of a child-to-parent pointer.
#[derive(Clone, Copy)]
pub(crate) struct BuildParams {
    pub ec_level: ErrorCorrectionLevel,
    pub max_version: Version,
    pub structured_append: bool,
    pub charset: ByteCharset,
}

/// Why a character could not be placed in the current symbol.
pub(crate) enum FitError {
    /// Out of capacity at the maximum version; the caller may retry the
    /// character in a fresh symbol.
    Overflow,
    /// The character has no representation in the segment's mode.
    Unencodable,
}

/// Build state of one symbol.
pub(crate) struct SymbolState {
    position: usize,
    version: Version,
    data_bit_capacity: usize,
    data_bit_counter: usize,
    curr_mode: Option<EncodingMode>,
    segments: Vec<SegmentEncoder>,
    /// Segments started per mode, used to re-account character count
    /// indicator widths when the version crosses a band boundary.
    segment_counts: [usize; 4],
}

impl SymbolState {
    pub fn new(position: usize, start_version: Version, params: &BuildParams) -> Self {
        Self {
            position,
            version: start_version,
            data_bit_capacity: Self::capacity_bits(start_version, params),
            data_bit_counter: 0,
            curr_mode: None,
            segments: Vec::new(),
            segment_counts: [0; 4],
        }
    }

    fn capacity_bits(version: Version, params: &BuildParams) -> usize {
        let mut capacity = 8 * version.num_data_codewords(params.ec_level);
        if params.structured_append {
            capacity -= STRUCTURED_APPEND_HEADER_LEN;
        }
        capacity
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn current_mode(&self) -> Option<EncodingMode> {
        self.curr_mode
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    #[cfg(test)]
    pub fn data_bit_counter(&self) -> usize {
        self.data_bit_counter
    }

    /// Escalates to the next version: per-mode segment counts re-account
    /// the character count indicator widths, and the capacity is recomputed.
    fn select_version(&mut self, params: &BuildParams) {
        let next = Version::new(self.version.value() + 1);
        for (ordinal, &count) in self.segment_counts.iter().enumerate() {
            let mode = EncodingMode::from_ordinal(ordinal);
            self.data_bit_counter += count * mode.char_count_bits(next);
            self.data_bit_counter -= count * mode.char_count_bits(self.version);
        }
        self.version = next;
        self.data_bit_capacity = Self::capacity_bits(next, params);
        debug!(version = next.value(), "escalated symbol version");
    }

    /// Opens a new segment in `mode`, charging its mode and character count
    /// indicators. `c` is the character about to follow; its bits are
    /// included in the capacity check but not appended here.
    pub fn try_set_mode(
        &mut self,
        mode: EncodingMode,
        c: char,
        params: &BuildParams,
    ) -> std::result::Result<(), FitError> {
        let encoder = SegmentEncoder::new(mode, params.charset);
        let bit_length = encoder.bit_length(c).ok_or(FitError::Unencodable)?;

        loop {
            let needed = self.data_bit_counter
                + MODE_INDICATOR_LEN
                + mode.char_count_bits(self.version)
                + bit_length;
            if needed <= self.data_bit_capacity {
                break;
            }
            if self.version >= params.max_version {
                return Err(FitError::Overflow);
            }
            self.select_version(params);
        }

        self.data_bit_counter += MODE_INDICATOR_LEN + mode.char_count_bits(self.version);
        self.segment_counts[mode.ordinal()] += 1;
        self.segments.push(encoder);
        self.curr_mode = Some(mode);
        Ok(())
    }

    /// Appends `c` to the current segment, returning the bytes it
    /// contributes to the structured append parity.
    pub fn try_append(
        &mut self,
        c: char,
        params: &BuildParams,
    ) -> std::result::Result<Vec<u8>, FitError> {
        let bit_length = self
            .segments
            .last()
            .expect("a segment is opened before characters are appended")
            .bit_length(c)
            .ok_or(FitError::Unencodable)?;

        while self.data_bit_capacity < self.data_bit_counter + bit_length {
            if self.version >= params.max_version {
                return Err(FitError::Overflow);
            }
            self.select_version(params);
        }

        let parity_bytes = self
            .segments
            .last_mut()
            .unwrap()
            .append(c)
            .ok_or(FitError::Unencodable)?;
        self.data_bit_counter += bit_length;
        Ok(parity_bytes)
    }

    /// Assembles the data codeword bytes: structured append header (when
    /// the collection holds several symbols), segment headers and payloads,
    /// terminator, bit padding, and pad codewords.
    pub(crate) fn message_bytes(
        &self,
        ecl: ErrorCorrectionLevel,
        total_symbols: usize,
        parity: u8,
    ) -> Vec<u8> {
        let mut bs = BitSequence::new();

        if total_symbols > 1 {
            bs.append_bits(STRUCTURED_APPEND_MODE_BITS, MODE_INDICATOR_LEN);
            bs.append_bits(self.position as u32, 4);
            bs.append_bits((total_symbols - 1) as u32, 4);
            bs.append_bits(u32::from(parity), 8);
        }

        for segment in &self.segments {
            bs.append_bits(segment.mode().mode_bits(), MODE_INDICATOR_LEN);
            bs.append_bits(
                segment.char_count() as u32,
                segment.mode().char_count_bits(self.version),
            );
            let data = segment.to_bytes();
            if let Some((&last, rest)) = data.split_last() {
                for &byte in rest {
                    bs.append_bits(u32::from(byte), 8);
                }
                let mut last_bits = segment.bit_count() % 8;
                if last_bits == 0 {
                    last_bits = 8;
                }
                bs.append_bits(u32::from(last >> (8 - last_bits)), last_bits);
            }
        }

        let terminator = (self.data_bit_capacity - self.data_bit_counter).min(MODE_INDICATOR_LEN);
        bs.append_bits(0, terminator);
        if bs.len() % 8 > 0 {
            bs.append_bits(0, 8 - bs.len() % 8);
        }

        let num_data_codewords = self.version.num_data_codewords(ecl);
        let mut pad = true;
        while bs.len() < 8 * num_data_codewords {
            bs.append_bits(if pad { 0xEC } else { 0x11 }, 8);
            pad = !pad;
        }

        bs.to_bytes()
    }

    /// Splits the data codewords into Reed-Solomon blocks, computes each
    /// block's EC codewords, and interleaves them column-major for
    /// placement: all data codewords first, then all EC codewords.
    pub(crate) fn encoding_region_bytes(
        &self,
        ecl: ErrorCorrectionLevel,
        total_symbols: usize,
        parity: u8,
    ) -> Vec<u8> {
        let message = self.message_bytes(ecl, total_symbols, parity);

        let num_blocks = ecl.num_ec_blocks(self.version);
        let ec_per_block = ecl.ec_codewords_per_block(self.version);
        let total_codewords = self.version.num_total_codewords();
        let num_short_blocks = num_blocks - total_codewords % num_blocks;
        let short_len = total_codewords / num_blocks - ec_per_block;

        let mut data_blocks: Vec<&[u8]> = Vec::with_capacity(num_blocks);
        let mut offset = 0;
        for i in 0..num_blocks {
            let len = short_len + usize::from(i >= num_short_blocks);
            data_blocks.push(&message[offset..offset + len]);
            offset += len;
        }
        debug_assert_eq!(offset, message.len());

        let rs = ReedSolomon::new(ec_per_block);
        let ec_blocks: Vec<Vec<u8>> = data_blocks
            .iter()
            .map(|block| rs.compute_remainder(block))
            .collect();

        let mut out = Vec::with_capacity(total_codewords);
        let longest = short_len + usize::from(num_short_blocks < num_blocks);
        for column in 0..longest {
            for block in &data_blocks {
                if column < block.len() {
                    out.push(block[column]);
                }
            }
        }
        for column in 0..ec_per_block {
            for block in &ec_blocks {
                out.push(block[column]);
            }
        }
        debug_assert_eq!(out.len(), total_codewords);
        out
    }

    /// Builds the final masked module matrix for this symbol.
    pub(crate) fn build_matrix(
        &self,
        ecl: ErrorCorrectionLevel,
        total_symbols: usize,
        parity: u8,
    ) -> ModuleMatrix {
        let codewords = self.encoding_region_bytes(ecl, total_symbols, parity);
        let mut matrix = matrix::build(self.version, &codewords);
        masking::apply_best_mask(&mut matrix, self.version, ecl);
        matrix
    }
}

/// A sealed symbol of a [`Symbols`] collection.
///
/// This is a borrow view: the collection keeps ownership of the build
/// state, and the view carries the shared parameters (error correction
/// level, symbol count, structured append parity) every rendering
/// operation needs.
#[derive(Clone, Copy)]
pub struct Symbol<'a> {
    parent: &'a Symbols,
    state: &'a SymbolState,
}

impl<'a> Symbol<'a> {
    pub(crate) fn new(parent: &'a Symbols, state: &'a SymbolState) -> Self {
        Self { parent, state }
    }

    /// This symbol's version, in the range [1, 40].
    pub fn version(&self) -> Version {
        self.state.version
    }

    /// This symbol's position in the structured append sequence (0-based).
    pub fn position(&self) -> usize {
        self.state.position
    }

    /// Returns the masked module matrix, a square grid of side
    /// `17 + 4 * version`. Positive cells are dark, negative cells light;
    /// magnitude 2 marks function patterns, magnitude 1 data.
    pub fn module_matrix(&self) -> Vec<Vec<i8>> {
        self.state.build_matrix(
            self.parent.error_correction_level(),
            self.parent.count(),
            self.parent.structured_append_parity(),
        )
    }

    /// Returns a monochrome BMP (DIB) of this symbol.
    ///
    /// `module_size` defaults to 4 pixels per module; `fore` and `back`
    /// default to black on white and accept `#RRGGBB` strings.
    pub fn get_1bpp_dib(
        &self,
        module_size: Option<u32>,
        fore: Option<&str>,
        back: Option<&str>,
    ) -> Result<Vec<u8>> {
        let (module_size, fore, back) = render::check_options(module_size, fore, back)?;
        let matrix = render::place_quiet_zone(&self.module_matrix());
        Ok(render::build_1bpp_dib(&matrix, module_size, fore, back))
    }

    /// Returns a 24-bit-per-pixel BMP (DIB) of this symbol. Parameters as
    /// for [`Symbol::get_1bpp_dib`].
    pub fn get_24bpp_dib(
        &self,
        module_size: Option<u32>,
        fore: Option<&str>,
        back: Option<&str>,
    ) -> Result<Vec<u8>> {
        let (module_size, fore, back) = render::check_options(module_size, fore, back)?;
        let matrix = render::place_quiet_zone(&self.module_matrix());
        Ok(render::build_24bpp_dib(&matrix, module_size, fore, back))
    }

    /// Returns this symbol as an in-memory image, decoded from the
    /// monochrome DIB bytes.
    pub fn get_1bpp_image(
        &self,
        module_size: Option<u32>,
        fore: Option<&str>,
        back: Option<&str>,
    ) -> Result<image::DynamicImage> {
        let dib = self.get_1bpp_dib(module_size, fore, back)?;
        Ok(image::load_from_memory_with_format(&dib, image::ImageFormat::Bmp)?)
    }

    /// Returns this symbol as an in-memory image, decoded from the 24bpp
    /// DIB bytes.
    pub fn get_24bpp_image(
        &self,
        module_size: Option<u32>,
        fore: Option<&str>,
        back: Option<&str>,
    ) -> Result<image::DynamicImage> {
        let dib = self.get_24bpp_dib(module_size, fore, back)?;
        Ok(image::load_from_memory_with_format(&dib, image::ImageFormat::Bmp)?)
    }

    /// Writes the monochrome DIB to `path`.
    pub fn save_1bpp_dib<P: AsRef<Path>>(
        &self,
        path: P,
        module_size: Option<u32>,
        fore: Option<&str>,
        back: Option<&str>,
    ) -> Result<()> {
        let dib = self.get_1bpp_dib(module_size, fore, back)?;
        std::fs::write(path, dib).map_err(Error::Io)
    }

    /// Writes the 24bpp DIB to `path`.
    pub fn save_24bpp_dib<P: AsRef<Path>>(
        &self,
        path: P,
        module_size: Option<u32>,
        fore: Option<&str>,
        back: Option<&str>,
    ) -> Result<()> {
        let dib = self.get_24bpp_dib(module_size, fore, back)?;
        std::fs::write(path, dib).map_err(Error::Io)
    }
}

#[cfg(test)]
mod tests {
    use crate::symbols::Symbols;
    use crate::types::{EncodingMode, ErrorCorrectionLevel};
    use pretty_assertions::assert_eq;

    #[test]
    fn message_bytes_standard_numeric_example() {
        // "01234567" at 1-M, the worked example of the standard's annex.
        let mut symbols = Symbols::new();
        symbols.append_string("01234567").unwrap();
        let symbol = symbols.get(0);
        assert_eq!(symbol.version().value(), 1);
        assert_eq!(
            symbol.state.message_bytes(ErrorCorrectionLevel::Medium, 1, 0),
            vec![
                0x10, 0x20, 0x0C, 0x56, 0x61, 0x80, 0xEC, 0x11, 0xEC, 0x11, 0xEC, 0x11, 0xEC,
                0x11, 0xEC, 0x11,
            ]
        );
    }

    #[test]
    fn encoding_region_appends_ec_codewords() {
        let mut symbols = Symbols::new();
        symbols.append_string("01234567").unwrap();
        let region =
            symbols
                .get(0)
                .state
                .encoding_region_bytes(ErrorCorrectionLevel::Medium, 1, 0);
        assert_eq!(region.len(), 26);
        assert_eq!(
            &region[16..],
            &[0xA5, 0x24, 0xD4, 0xC1, 0xED, 0x36, 0xC7, 0x87, 0x2C, 0x55]
        );
    }

    #[test]
    fn message_bytes_alphanumeric_example() {
        // "HELLO WORLD" at 1-Q: a widely published worked example.
        let mut symbols =
            Symbols::with_options(ErrorCorrectionLevel::Quartile, 40, false, "ISO-8859-1")
                .unwrap();
        symbols.append_string("HELLO WORLD").unwrap();
        let symbol = symbols.get(0);
        assert_eq!(symbol.version().value(), 1);
        assert_eq!(
            symbol.state.message_bytes(ErrorCorrectionLevel::Quartile, 1, 0),
            vec![
                0x20, 0x5B, 0x0B, 0x78, 0xD1, 0x72, 0xDC, 0x4D, 0x43, 0x40, 0xEC, 0x11, 0xEC,
            ]
        );
    }

    #[test]
    fn mixed_input_opens_two_segments() {
        let mut symbols = Symbols::new();
        symbols.append_string("012345abcdefg").unwrap();
        let symbol = symbols.get(0);
        assert_eq!(symbol.version().value(), 1);
        let modes: Vec<EncodingMode> =
            symbol.state.segments.iter().map(|s| s.mode()).collect();
        assert_eq!(modes, vec![EncodingMode::Numeric, EncodingMode::Byte]);
        // Numeric header 4+10, six digits 20 bits; byte header 4+8, seven
        // bytes 56 bits.
        assert_eq!(symbol.state.data_bit_counter(), 102);
    }

    #[test]
    fn kanji_segment_bit_accounting() {
        let mut symbols =
            Symbols::with_options(ErrorCorrectionLevel::Medium, 40, false, "Shift_JIS").unwrap();
        symbols.append_string("日本").unwrap();
        let symbol = symbols.get(0);
        assert_eq!(symbol.version().value(), 1);
        let modes: Vec<EncodingMode> =
            symbol.state.segments.iter().map(|s| s.mode()).collect();
        assert_eq!(modes, vec![EncodingMode::Kanji]);
        // Mode indicator 4, char count 8, two characters at 13 bits.
        assert_eq!(symbol.state.data_bit_counter(), 38);
    }

    #[test]
    fn digits_stay_in_an_open_byte_segment() {
        // Locality rule: '1' is acceptable to the byte segment opened by
        // 'a', so no numeric segment is started.
        let mut symbols = Symbols::new();
        symbols.append_string("a1b").unwrap();
        let symbol = symbols.get(0);
        assert_eq!(symbol.state.segments.len(), 1);
        assert_eq!(symbol.state.segments[0].mode(), EncodingMode::Byte);
        assert_eq!(symbol.state.segments[0].char_count(), 3);
    }

    #[test]
    fn multi_block_interleaving_is_column_major() {
        // 200 digits at level H land on version 8: 242 codewords in six
        // blocks (four of 14 data codewords, two of 15), 26 EC each.
        let digits: String = std::iter::repeat("0123456789").take(20).collect();
        let mut symbols =
            Symbols::with_options(ErrorCorrectionLevel::High, 40, false, "ISO-8859-1").unwrap();
        symbols.append_string(&digits).unwrap();
        let symbol = symbols.get(0);
        assert_eq!(symbol.version().value(), 8);

        let message = symbol.state.message_bytes(ErrorCorrectionLevel::High, 1, 0);
        assert_eq!(message.len(), 86);
        let region = symbol
            .state
            .encoding_region_bytes(ErrorCorrectionLevel::High, 1, 0);
        assert_eq!(region.len(), 242);

        // First interleave column: byte 0 of each data block, at offsets
        // 0, 14, 28, 42, 56, 71 in the message.
        let expected: Vec<u8> = [0usize, 14, 28, 42, 56, 71].iter().map(|&i| message[i]).collect();
        assert_eq!(&region[..6], &expected[..]);
        // Only the two long blocks contribute to the final data column.
        assert_eq!(region[84], message[70]);
        assert_eq!(region[85], message[85]);
    }

    #[test]
    fn structured_append_header_written_for_multiple_symbols() {
        let mut symbols =
            Symbols::with_options(ErrorCorrectionLevel::Medium, 1, true, "ISO-8859-1").unwrap();
        symbols.append_string("abcdefghijklmnopqrstuvwxyz").unwrap();
        assert!(symbols.count() > 1);
        let parity = symbols.structured_append_parity();
        let count = symbols.count();
        let message = symbols
            .get(1)
            .state
            .message_bytes(ErrorCorrectionLevel::Medium, count, parity);
        // Header: 0011 | position 0001 | total-1 | parity, then the byte
        // mode indicator 0100.
        assert_eq!(message[0], 0x30 | 0x01);
        assert_eq!(message[1], ((count as u8 - 1) << 4) | (parity >> 4));
        assert_eq!(message[2] >> 4, (parity & 0x0F));
        assert_eq!(message[2] & 0x0F, 0x4);
    }

    #[test]
    fn empty_collection_renders_padding_only() {
        let symbols = Symbols::new();
        assert_eq!(symbols.count(), 1);
        let message = symbols.get(0).state.message_bytes(ErrorCorrectionLevel::Medium, 1, 0);
        // Terminator plus alternating pad codewords.
        assert_eq!(message.len(), 16);
        assert_eq!(message[0], 0x00);
        assert_eq!(message[1], 0xEC);
        assert_eq!(message[2], 0x11);
    }
}
