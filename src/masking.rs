//! Data masking: the eight mask conditions, penalty scoring, and the
//! format / version information writers.
//!
//! Each candidate mask is applied to a copy of the matrix together with its
//! format information, scored, and the lowest-penalty candidate wins (ties
//! go to the lower mask reference). Format and version cells are marked ±2
//! so a mask never flips them.

use tracing::debug;

use crate::matrix::ModuleMatrix;
use crate::types::{ErrorCorrectionLevel, Version};

/// Applies the best of the eight masks in place and returns its reference.
pub(crate) fn apply_best_mask(
    matrix: &mut ModuleMatrix,
    version: Version,
    ecl: ErrorCorrectionLevel,
) -> u8 {
    let mut best: Option<(i32, u8, ModuleMatrix)> = None;
    for mask in 0u8..8 {
        let mut candidate = matrix.clone();
        flip_data_cells(&mut candidate, mask);
        place_format_info(&mut candidate, ecl, mask);
        if version.value() >= 7 {
            place_version_info(&mut candidate, version);
        }
        let penalty = penalty_score(&candidate);
        if best.as_ref().map_or(true, |(p, _, _)| penalty < *p) {
            best = Some((penalty, mask, candidate));
        }
    }
    let (penalty, mask, chosen) = best.unwrap();
    debug!(mask, penalty, "selected mask pattern");
    *matrix = chosen;
    mask
}

/// Flips the data cells (±1) selected by the mask condition; function
/// cells (±2) are untouched.
fn flip_data_cells(matrix: &mut ModuleMatrix, mask: u8) {
    for (i, row) in matrix.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            if cell.abs() != 1 {
                continue;
            }
            let (i, j) = (i as u32, j as u32);
            let invert = match mask {
                0 => (i + j) % 2 == 0,
                1 => i % 2 == 0,
                2 => j % 3 == 0,
                3 => (i + j) % 3 == 0,
                4 => (i / 2 + j / 3) % 2 == 0,
                5 => (i * j) % 2 + (i * j) % 3 == 0,
                6 => ((i * j) % 2 + (i * j) % 3) % 2 == 0,
                7 => ((i + j) % 2 + (i * j) % 3) % 2 == 0,
                _ => unreachable!(),
            };
            if invert {
                *cell = -*cell;
            }
        }
    }
}

/// The 15-bit format information: EC indicator and mask reference,
/// BCH(15,5)-protected and XORed with the fixed mask 0x5412.
pub(crate) fn format_info_value(ecl: ErrorCorrectionLevel, mask: u8) -> u32 {
    let data = u32::from((ecl.format_bits() << 3) | mask);
    let mut rem = data;
    for _ in 0..10 {
        rem = (rem << 1) ^ ((rem >> 9) * 0x537);
    }
    ((data << 10) | rem) ^ 0x5412
}

/// The 18-bit version information, BCH(18,6)-protected. Defined for
/// versions 7 and above.
pub(crate) fn version_info_value(version: Version) -> u32 {
    let ver = u32::from(version.value());
    let mut rem = ver;
    for _ in 0..12 {
        rem = (rem << 1) ^ ((rem >> 11) * 0x1F25);
    }
    (ver << 12) | rem
}

/// Writes both copies of the format information and the fixed dark module.
pub(crate) fn place_format_info(matrix: &mut ModuleMatrix, ecl: ErrorCorrectionLevel, mask: u8) {
    let bits = format_info_value(ecl, mask);
    let n = matrix.len();
    let value = |i: usize| if (bits >> i) & 1 != 0 { 2i8 } else { -2i8 };

    // First copy, wrapped around the top-left finder.
    for i in 0..6 {
        matrix[i][8] = value(i);
    }
    matrix[7][8] = value(6);
    matrix[8][8] = value(7);
    matrix[8][7] = value(8);
    for i in 9..15 {
        matrix[8][14 - i] = value(i);
    }

    // Second copy, split between the top-right and bottom-left finders.
    for i in 0..8 {
        matrix[8][n - 1 - i] = value(i);
    }
    for i in 8..15 {
        matrix[n - 15 + i][8] = value(i);
    }
    matrix[n - 8][8] = 2;
}

/// Writes both 3×6 version information blocks (versions 7 and above).
pub(crate) fn place_version_info(matrix: &mut ModuleMatrix, version: Version) {
    let bits = version_info_value(version);
    let n = matrix.len();
    for i in 0..18 {
        let value = if (bits >> i) & 1 != 0 { 2i8 } else { -2i8 };
        let a = n - 11 + i % 3;
        let b = i / 3;
        matrix[b][a] = value;
        matrix[a][b] = value;
    }
}

const PENALTY_N1: i32 = 3;
const PENALTY_N2: i32 = 3;
const PENALTY_N3: i32 = 40;
const PENALTY_N4: i32 = 10;

/// Scores a fully placed candidate matrix. Lower is better.
fn penalty_score(matrix: &ModuleMatrix) -> i32 {
    let n = matrix.len();
    let dark = |r: usize, c: usize| matrix[r][c] > 0;
    let mut result = 0;

    // N1: runs of five or more same-coloured modules, and N3: the finder
    // lookalike 1011101 with four light modules on either side, scanned
    // over every row and column.
    for line in 0..n {
        let row: Vec<bool> = (0..n).map(|c| dark(line, c)).collect();
        let col: Vec<bool> = (0..n).map(|r| dark(r, line)).collect();
        for cells in [&row, &col] {
            result += run_penalty(cells);
            result += finder_lookalike_penalty(cells);
        }
    }

    // N2: 2x2 blocks of a single colour.
    for r in 0..n - 1 {
        for c in 0..n - 1 {
            let colour = dark(r, c);
            if colour == dark(r + 1, c) && colour == dark(r, c + 1) && colour == dark(r + 1, c + 1)
            {
                result += PENALTY_N2;
            }
        }
    }

    // N4: deviation of the dark-module ratio from 50%.
    let dark_count = matrix
        .iter()
        .flat_map(|row| row.iter())
        .filter(|&&cell| cell > 0)
        .count();
    result += dark_ratio_penalty(dark_count, n * n);

    result
}

/// 10 points times the smallest k >= 0 such that the dark-module ratio
/// lies within (45 - 5k)% ..= (55 + 5k)%. A ratio landing exactly on a 5%
/// step stays in the band below it. Symbol sides are odd, so the ratio is
/// never exactly 50% and k never goes negative.
fn dark_ratio_penalty(dark_count: usize, total: usize) -> i32 {
    let dark = dark_count as i64;
    let total = total as i64;
    let k = ((dark * 20 - total * 10).abs() + total - 1) / total - 1;
    PENALTY_N4 * k as i32
}

fn run_penalty(cells: &[bool]) -> i32 {
    let mut result = 0;
    let mut run_colour = cells[0];
    let mut run_len = 0i32;
    for &cell in cells {
        if cell == run_colour {
            run_len += 1;
        } else {
            if run_len >= 5 {
                result += PENALTY_N1 + (run_len - 5);
            }
            run_colour = cell;
            run_len = 1;
        }
    }
    if run_len >= 5 {
        result += PENALTY_N1 + (run_len - 5);
    }
    result
}

fn finder_lookalike_penalty(cells: &[bool]) -> i32 {
    const PATTERN: [bool; 11] = [
        true, false, true, true, true, false, true, false, false, false, false,
    ];
    let mut result = 0;
    for window in cells.windows(11) {
        let forward = window.iter().zip(PATTERN.iter()).all(|(a, b)| a == b);
        let backward = window.iter().rev().zip(PATTERN.iter()).all(|(a, b)| a == b);
        if forward || backward {
            result += PENALTY_N3;
        }
    }
    result
}
