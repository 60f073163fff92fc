//! Bitmap rendering: quiet zone, colour parsing, and Windows BMP v3 (DIB)
//! emission in monochrome and 24-bit flavours.
//!
//! The DIB layout follows the classic format: bottom-up rows padded to
//! four-byte boundaries, a 62-byte header with a two-entry palette for
//! 1bpp, a 54-byte header for 24bpp.

use crate::bits::BitSequence;
use crate::error::{Error, Result};
use crate::matrix::ModuleMatrix;

/// Width of the mandatory light border, in modules.
const QUIET_ZONE_WIDTH: usize = 4;

/// Validates and defaults the shared rendering options.
pub(crate) fn check_options(
    module_size: Option<u32>,
    fore: Option<&str>,
    back: Option<&str>,
) -> Result<(usize, [u8; 3], [u8; 3])> {
    let module_size = module_size.unwrap_or(4);
    if module_size < 1 {
        return Err(Error::InvalidArgument(
            "module size must be at least 1".into(),
        ));
    }
    let fore = parse_color(fore.unwrap_or("#000000"))?;
    let back = parse_color(back.unwrap_or("#FFFFFF"))?;
    Ok((module_size as usize, fore, back))
}

/// Parses a `#RRGGBB` hex colour into `[r, g, b]`.
pub(crate) fn parse_color(s: &str) -> Result<[u8; 3]> {
    let invalid = || Error::InvalidArgument(format!("colour must be #RRGGBB, got {:?}", s));
    let hex = s.strip_prefix('#').ok_or_else(invalid)?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let mut rgb = [0u8; 3];
    for (i, chunk) in rgb.iter_mut().enumerate() {
        *chunk = u8::from_str_radix(&hex[2 * i..2 * i + 2], 16).map_err(|_| invalid())?;
    }
    Ok(rgb)
}

/// Surrounds the matrix with the four-module light quiet zone.
pub(crate) fn place_quiet_zone(matrix: &ModuleMatrix) -> ModuleMatrix {
    let n = matrix.len();
    let out_len = n + 2 * QUIET_ZONE_WIDTH;
    let mut out = vec![vec![-2i8; out_len]; out_len];
    for (r, row) in matrix.iter().enumerate() {
        out[r + QUIET_ZONE_WIDTH][QUIET_ZONE_WIDTH..QUIET_ZONE_WIDTH + n].copy_from_slice(row);
    }
    out
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Builds a monochrome BMP. Dark modules map to palette entry 0 (the
/// foreground colour), light modules to entry 1.
pub(crate) fn build_1bpp_dib(
    matrix: &ModuleMatrix,
    module_size: usize,
    fore: [u8; 3],
    back: [u8; 3],
) -> Vec<u8> {
    let n = matrix.len();
    let width = n * module_size;
    let height = width;

    let row_bytes = (width + 7) / 8;
    let pack_8bit = (8 - width % 8) % 8;
    let pack_32bit = 8 * ((4 - row_bytes % 4) % 4);
    let row_size = (width + pack_8bit + pack_32bit) / 8;

    let mut data = Vec::with_capacity(row_size * height);
    let mut bs = BitSequence::new();
    for row in matrix.iter().rev() {
        bs.clear();
        for &cell in row {
            let bit = u32::from(cell <= 0);
            for _ in 0..module_size {
                bs.append_bits(bit, 1);
            }
        }
        bs.append_bits(0, pack_8bit);
        bs.append_bits(0, pack_32bit);
        let bitmap_row = bs.to_bytes();
        for _ in 0..module_size {
            data.extend_from_slice(&bitmap_row);
        }
    }

    let mut out = Vec::with_capacity(62 + data.len());
    // BITMAPFILEHEADER
    out.extend_from_slice(b"BM");
    push_u32(&mut out, (62 + data.len()) as u32);
    push_u16(&mut out, 0);
    push_u16(&mut out, 0);
    push_u32(&mut out, 62);
    // BITMAPINFOHEADER
    push_u32(&mut out, 40);
    push_u32(&mut out, width as u32);
    push_u32(&mut out, height as u32);
    push_u16(&mut out, 1);
    push_u16(&mut out, 1);
    push_u32(&mut out, 0);
    push_u32(&mut out, data.len() as u32);
    push_u32(&mut out, 3780);
    push_u32(&mut out, 3780);
    push_u32(&mut out, 2);
    push_u32(&mut out, 2);
    // Palette, BGR0: foreground first so a 0 bit selects it.
    out.extend_from_slice(&[fore[2], fore[1], fore[0], 0]);
    out.extend_from_slice(&[back[2], back[1], back[0], 0]);
    out.extend_from_slice(&data);
    out
}

/// Builds a 24-bit-per-pixel BMP, three BGR bytes per pixel.
pub(crate) fn build_24bpp_dib(
    matrix: &ModuleMatrix,
    module_size: usize,
    fore: [u8; 3],
    back: [u8; 3],
) -> Vec<u8> {
    let n = matrix.len();
    let width = n * module_size;
    let height = width;

    let row_bytes = 3 * width;
    let pad = (4 - row_bytes % 4) % 4;
    let row_size = row_bytes + pad;

    let mut data = Vec::with_capacity(row_size * height);
    let mut bitmap_row = Vec::with_capacity(row_size);
    for row in matrix.iter().rev() {
        bitmap_row.clear();
        for &cell in row {
            let [r, g, b] = if cell > 0 { fore } else { back };
            for _ in 0..module_size {
                bitmap_row.extend_from_slice(&[b, g, r]);
            }
        }
        bitmap_row.resize(row_size, 0);
        for _ in 0..module_size {
            data.extend_from_slice(&bitmap_row);
        }
    }

    let mut out = Vec::with_capacity(54 + data.len());
    // BITMAPFILEHEADER
    out.extend_from_slice(b"BM");
    push_u32(&mut out, (54 + data.len()) as u32);
    push_u16(&mut out, 0);
    push_u16(&mut out, 0);
    push_u32(&mut out, 54);
    // BITMAPINFOHEADER
    push_u32(&mut out, 40);
    push_u32(&mut out, width as u32);
    push_u32(&mut out, height as u32);
    push_u16(&mut out, 1);
    push_u16(&mut out, 24);
    push_u32(&mut out, 0);
    push_u32(&mut out, data.len() as u32);
    push_u32(&mut out, 3780);
    push_u32(&mut out, 3780);
    push_u32(&mut out, 0);
    push_u32(&mut out, 0);
    out.extend_from_slice(&data);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colours() {
        assert_eq!(parse_color("#000000").unwrap(), [0, 0, 0]);
        assert_eq!(parse_color("#FF8000").unwrap(), [255, 128, 0]);
        assert_eq!(parse_color("#ffffff").unwrap(), [255, 255, 255]);
    }

    #[test]
    fn rejects_malformed_colours() {
        for bad in ["000000", "#12345", "#1234567", "#GGHHII", "", "#"] {
            assert!(
                matches!(parse_color(bad), Err(Error::InvalidArgument(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn rejects_zero_module_size() {
        assert!(matches!(
            check_options(Some(0), None, None),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn quiet_zone_adds_eight() {
        let matrix = vec![vec![1i8; 21]; 21];
        let padded = place_quiet_zone(&matrix);
        assert_eq!(padded.len(), 29);
        assert_eq!(padded[0], vec![-2i8; 29]);
        assert_eq!(padded[4][4], 1);
        assert_eq!(padded[4][3], -2);
        assert_eq!(padded[24][24], 1);
        assert_eq!(padded[25][25], -2);
    }

    fn checker(n: usize) -> ModuleMatrix {
        (0..n)
            .map(|r| (0..n).map(|c| if (r + c) % 2 == 0 { 1i8 } else { -1 }).collect())
            .collect()
    }

    #[test]
    fn dib_1bpp_layout() {
        let dib = build_1bpp_dib(&checker(5), 1, [0, 0, 0], [255, 255, 255]);
        // Row: one data byte padded to four; five rows.
        assert_eq!(dib.len(), 62 + 4 * 5);
        assert_eq!(&dib[..2], b"BM");
        assert_eq!(u32::from_le_bytes(dib[2..6].try_into().unwrap()), dib.len() as u32);
        assert_eq!(u32::from_le_bytes(dib[10..14].try_into().unwrap()), 62);
        assert_eq!(u16::from_le_bytes(dib[28..30].try_into().unwrap()), 1);
        // Palette: foreground (black) then background (white), BGR0.
        assert_eq!(&dib[54..58], &[0, 0, 0, 0]);
        assert_eq!(&dib[58..62], &[255, 255, 255, 0]);
        // Bottom row of the checkerboard starts dark at column 0: bits
        // 01010 padded with zeros.
        assert_eq!(dib[62], 0b0101_0000);
    }

    #[test]
    fn dib_24bpp_layout() {
        let fore = [10, 20, 30];
        let back = [200, 210, 220];
        let dib = build_24bpp_dib(&checker(5), 1, fore, back);
        // Row: 15 pixel bytes padded to 16; five rows.
        assert_eq!(dib.len(), 54 + 16 * 5);
        assert_eq!(u32::from_le_bytes(dib[10..14].try_into().unwrap()), 54);
        assert_eq!(u16::from_le_bytes(dib[28..30].try_into().unwrap()), 24);
        // First stored pixel is the bottom-left module, dark, as BGR.
        assert_eq!(&dib[54..57], &[30, 20, 10]);
        assert_eq!(&dib[57..60], &[220, 210, 200]);
    }

    #[test]
    fn module_size_scales_rows() {
        let dib = build_1bpp_dib(&checker(5), 4, [0, 0, 0], [255, 255, 255]);
        // Width 20 -> 3 row bytes padded to 4; 20 rows.
        assert_eq!(dib.len(), 62 + 4 * 20);
    }
}
