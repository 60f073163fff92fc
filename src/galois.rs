//! GF(2⁸) arithmetic and Reed-Solomon generator polynomials.
//!
//! The field is GF(2⁸) with primitive polynomial x⁸ + x⁴ + x³ + x² + 1
//! (0x11D) and generator α = 2. Exponent and logarithm tables are built at
//! compile time; generator polynomials are kept in the log domain so the
//! long division below runs on table lookups and XORs only.

const PRIMITIVE_POLY: u16 = 0x11D;

const fn build_exp_table() -> [u8; 256] {
    let mut exp = [0u8; 256];
    let mut x: u16 = 1;
    let mut i = 0;
    while i < 255 {
        exp[i] = x as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= PRIMITIVE_POLY;
        }
        i += 1;
    }
    // alpha^255 == alpha^0
    exp[255] = exp[0];
    exp
}

const fn build_log_table() -> [u8; 256] {
    let exp = build_exp_table();
    let mut log = [0u8; 256];
    let mut i = 0;
    while i < 255 {
        log[exp[i] as usize] = i as u8;
        i += 1;
    }
    log
}

static EXP: [u8; 256] = build_exp_table();
static LOG: [u8; 256] = build_log_table();

/// Returns α^i, with the exponent reduced modulo 255.
pub(crate) fn to_int(exponent: usize) -> u8 {
    EXP[exponent % 255]
}

/// Returns the discrete logarithm of a nonzero field element.
pub(crate) fn to_exp(value: u8) -> usize {
    debug_assert!(value != 0, "log of zero is undefined");
    LOG[value as usize] as usize
}

/// Field multiplication through the log/antilog tables.
pub(crate) fn multiply(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        0
    } else {
        to_int(to_exp(a) + to_exp(b))
    }
}

/// The generator polynomial g(x) = ∏_{i=0}^{n−1} (x − α^i) for `n` error
/// correction codewords, with the division register to apply it.
pub(crate) struct ReedSolomon {
    degree: usize,
    /// Logs of the coefficients of x^(degree−1) down to x^0. The leading
    /// x^degree coefficient is 1 and implicit.
    coeff_logs: Vec<u8>,
}

impl ReedSolomon {
    /// Builds the generator polynomial for `degree` EC codewords.
    pub fn new(degree: usize) -> Self {
        assert!((1..=68).contains(&degree), "Degree out of range");

        // Multiply (x - alpha^i) terms together in the integer domain,
        // letting the leading coefficient fall off the top of the array.
        let mut coeffs = vec![0u8; degree];
        coeffs[degree - 1] = 1;
        let mut root: u8 = 1;
        for _ in 0..degree {
            for j in 0..degree {
                coeffs[j] = multiply(coeffs[j], root);
                if j + 1 < degree {
                    coeffs[j] ^= coeffs[j + 1];
                }
            }
            root = multiply(root, 0x02);
        }

        let coeff_logs = coeffs
            .iter()
            .map(|&c| {
                debug_assert!(c != 0, "QR generator polynomials have no zero coefficients");
                to_exp(c) as u8
            })
            .collect();
        Self { degree, coeff_logs }
    }

    /// Polynomial long division of `data`·x^degree by the generator,
    /// returning the `degree` remainder bytes (the EC codewords).
    pub fn compute_remainder(&self, data: &[u8]) -> Vec<u8> {
        let mut reg = vec![0u8; self.degree];
        for &b in data {
            let factor = b ^ reg[0];
            reg.copy_within(1.., 0);
            reg[self.degree - 1] = 0;
            if factor != 0 {
                let flog = to_exp(factor);
                for (r, &clog) in reg.iter_mut().zip(self.coeff_logs.iter()) {
                    *r ^= to_int(clog as usize + flog);
                }
            }
        }
        reg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn exp_table_basics() {
        assert_eq!(to_int(0), 1);
        assert_eq!(to_int(1), 2);
        assert_eq!(to_int(8), 0x1D);
        assert_eq!(to_int(255), 1);
    }

    #[test]
    fn log_is_inverse_of_exp() {
        for i in 0..255 {
            assert_eq!(to_exp(EXP[i]), i);
        }
    }

    #[test]
    fn multiply_agrees_with_carryless_reference() {
        fn reference(x: u8, y: u8) -> u8 {
            let mut z: u8 = 0;
            for i in (0..8).rev() {
                z = (z << 1) ^ ((z >> 7) * 0x1D);
                z ^= ((y >> i) & 1) * x;
            }
            z
        }
        for &(a, b) in &[(0x57, 0x83), (2, 128), (0xFF, 0xFF), (1, 0xB4), (0, 0x55)] {
            assert_eq!(multiply(a, b), reference(a, b));
        }
    }

    #[test]
    fn generator_polynomial_degree_7() {
        // x^7 + a^87 x^6 + a^229 x^5 + a^146 x^4 + a^149 x^3 + a^238 x^2
        //     + a^102 x + a^21
        let rs = ReedSolomon::new(7);
        assert_eq!(rs.coeff_logs, vec![87, 229, 146, 149, 238, 102, 21]);
    }

    #[test]
    fn generator_polynomial_degree_10() {
        let rs = ReedSolomon::new(10);
        assert_eq!(rs.coeff_logs, vec![251, 67, 46, 61, 118, 70, 64, 94, 32, 45]);
    }

    #[test]
    fn remainder_for_standard_example() {
        // "01234567" at version 1-M from the JIS X 0510 annex.
        let data = [
            0x10, 0x20, 0x0C, 0x56, 0x61, 0x80, 0xEC, 0x11, 0xEC, 0x11, 0xEC, 0x11, 0xEC, 0x11,
            0xEC, 0x11,
        ];
        let rs = ReedSolomon::new(10);
        assert_eq!(
            rs.compute_remainder(&data),
            vec![0xA5, 0x24, 0xD4, 0xC1, 0xED, 0x36, 0xC7, 0x87, 0x2C, 0x55]
        );
    }

    #[test]
    fn remainder_zeroes_all_syndromes() {
        // The codeword polynomial data·x^n + remainder must vanish at every
        // root alpha^0..alpha^(n-1) of the generator.
        for degree in [7usize, 13, 22, 30, 68] {
            let data: Vec<u8> = (0..40u8).map(|i| i.wrapping_mul(17).wrapping_add(3)).collect();
            let rs = ReedSolomon::new(degree);
            let ecc = rs.compute_remainder(&data);
            let message: Vec<u8> = data.iter().chain(ecc.iter()).copied().collect();
            for j in 0..degree {
                let mut acc: u8 = 0;
                // Horner evaluation at alpha^j, high-order coefficient first.
                for &cw in &message {
                    acc = multiply(acc, to_int(j)) ^ cw;
                }
                assert_eq!(acc, 0, "syndrome {} nonzero for degree {}", j, degree);
            }
        }
    }
}
