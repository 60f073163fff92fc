//! Module matrix construction: function patterns, data bit routing, and
//! remainder bits.
//!
//! Cell values: 0 unset, ±1 data dark/light, ±2 function-pattern dark/light.
//! Placement never overwrites a non-zero cell, so the order below (finders,
//! separators, timing, alignment, reservations, data) is load-bearing.

use crate::types::Version;

pub(crate) type ModuleMatrix = Vec<Vec<i8>>;

/// Builds the unmasked matrix for `version` holding the interleaved
/// codeword sequence. Format and version information cells are reserved
/// light; the masking stage writes their final values.
pub(crate) fn build(version: Version, codewords: &[u8]) -> ModuleMatrix {
    let n = version.side_len();
    let mut matrix = vec![vec![0i8; n]; n];

    place_finder_patterns(&mut matrix);
    place_separators(&mut matrix);
    place_timing_patterns(&mut matrix);
    if version.value() >= 2 {
        place_alignment_patterns(&mut matrix, version);
    }
    reserve_format_info(&mut matrix);
    if version.value() >= 7 {
        reserve_version_info(&mut matrix);
    }
    place_codewords(&mut matrix, codewords);
    place_remainder_bits(&mut matrix);

    matrix
}

fn place_finder_patterns(matrix: &mut ModuleMatrix) {
    let n = matrix.len();
    for &(top, left) in &[(0usize, 0usize), (0, n - 7), (n - 7, 0)] {
        for dr in 0..7i32 {
            for dc in 0..7i32 {
                // Dark except for the ring one module in from the border.
                let dist = (dr - 3).abs().max((dc - 3).abs());
                matrix[top + dr as usize][left + dc as usize] = if dist == 2 { -2 } else { 2 };
            }
        }
    }
}

fn place_separators(matrix: &mut ModuleMatrix) {
    let n = matrix.len();
    for i in 0..8 {
        // Top-left finder.
        matrix[7][i] = -2;
        matrix[i][7] = -2;
        // Top-right finder.
        matrix[7][n - 8 + i] = -2;
        matrix[i][n - 8] = -2;
        // Bottom-left finder.
        matrix[n - 8][i] = -2;
        matrix[n - 8 + i][7] = -2;
    }
}

fn place_timing_patterns(matrix: &mut ModuleMatrix) {
    let n = matrix.len();
    for i in 8..n - 8 {
        let value = if i % 2 == 0 { 2 } else { -2 };
        matrix[6][i] = value;
        matrix[i][6] = value;
    }
}

/// Alignment pattern centre coordinates, ascending. Empty for version 1.
fn alignment_positions(version: Version) -> Vec<usize> {
    let ver = usize::from(version.value());
    if ver == 1 {
        return Vec::new();
    }
    let numalign = ver / 7 + 2;
    let step = if ver == 32 {
        26
    } else {
        ((ver * 4 + numalign * 2 + 1) / (numalign * 2 - 2)) * 2
    };
    let size = version.side_len();
    let mut result = vec![0usize; numalign];
    for (i, slot) in result.iter_mut().take(numalign - 1).enumerate() {
        *slot = size - 7 - i * step;
    }
    result[numalign - 1] = 6;
    result.reverse();
    result
}

fn place_alignment_patterns(matrix: &mut ModuleMatrix, version: Version) {
    let positions = alignment_positions(version);
    let last = positions.len() - 1;
    for (i, &row) in positions.iter().enumerate() {
        for (j, &col) in positions.iter().enumerate() {
            // The three finder corners host no alignment pattern.
            if (i == 0 && j == 0) || (i == 0 && j == last) || (i == last && j == 0) {
                continue;
            }
            for dr in -2i32..=2 {
                for dc in -2i32..=2 {
                    let r = (row as i32 + dr) as usize;
                    let c = (col as i32 + dc) as usize;
                    if matrix[r][c] == 0 {
                        let dist = dr.abs().max(dc.abs());
                        matrix[r][c] = if dist == 1 { -2 } else { 2 };
                    }
                }
            }
        }
    }
}

/// Marks the 31 format information cells (both copies and the fixed dark
/// module) light so data routing skips them.
fn reserve_format_info(matrix: &mut ModuleMatrix) {
    let n = matrix.len();
    for i in 0..6 {
        matrix[i][8] = -2;
        matrix[8][i] = -2;
    }
    matrix[7][8] = -2;
    matrix[8][8] = -2;
    matrix[8][7] = -2;
    for i in 0..8 {
        matrix[8][n - 1 - i] = -2;
    }
    for i in 0..8 {
        matrix[n - 8 + i][8] = -2;
    }
}

/// Marks the two 3×6 version information blocks for versions 7 and above.
fn reserve_version_info(matrix: &mut ModuleMatrix) {
    let n = matrix.len();
    for r in 0..6 {
        for c in n - 11..n - 8 {
            matrix[r][c] = -2;
            matrix[c][r] = -2;
        }
    }
}

/// Routes the codeword bits through the free cells: column pairs from the
/// right edge, skipping the timing column, zigzagging up then down,
/// most significant bit first.
fn place_codewords(matrix: &mut ModuleMatrix, data: &[u8]) {
    let n = matrix.len() as i32;
    let total_bits = data.len() * 8;
    let mut bit = 0usize;
    let mut col = n - 1;
    let mut upward = true;
    while col >= 1 {
        if col == 6 {
            col -= 1;
        }
        for k in 0..n {
            let row = if upward { n - 1 - k } else { k } as usize;
            for dc in 0..2 {
                let c = (col - dc) as usize;
                if matrix[row][c] == 0 && bit < total_bits {
                    let dark = (data[bit >> 3] >> (7 - (bit & 7))) & 1 == 1;
                    matrix[row][c] = if dark { 1 } else { -1 };
                    bit += 1;
                }
            }
        }
        upward = !upward;
        col -= 2;
    }
    debug_assert_eq!(bit, total_bits, "codeword count does not match free cells");
}

/// The handful of cells past the last codeword hold zero bits.
fn place_remainder_bits(matrix: &mut ModuleMatrix) {
    for row in matrix.iter_mut() {
        for cell in row.iter_mut() {
            if *cell == 0 {
                *cell = -1;
            }
        }
    }
}
