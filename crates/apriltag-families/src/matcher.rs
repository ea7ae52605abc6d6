//! Codebook matching and rotation helpers.

use crate::TagFamily;

/// A codebook match for an observed payload code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match {
    /// Tag id in the family.
    pub id: u32,
    /// Rotation `0..=3` such that: `observed_code == rotate(family_code, rotation)`.
    pub rotation: u8,
    /// Hamming distance between observed and family code (after rotation).
    pub hamming: u8,
}

/// Matcher for a fixed family.
///
/// Implementation note: brute-force search over all ids and rotations. For
/// the built-in family sizes (<=600) this is fast enough and keeps memory
/// small.
#[derive(Clone, Debug)]
pub struct Matcher {
    family: TagFamily,
    max_hamming: u8,
    rotated: Vec<[u64; 4]>,
}

impl Matcher {
    /// Build a matcher for the given family and Hamming threshold.
    ///
    /// `max_hamming` is clamped to the family's `max_correction_bits`.
    pub fn new(family: TagFamily, max_hamming: u8) -> Self {
        let bits = family.bit_count();
        assert!(
            bits <= 64,
            "dim {} implies {} bits > 64 (unsupported)",
            family.dim,
            bits
        );

        let mut rotated = Vec::with_capacity(family.codes.len());
        for &base in family.codes {
            rotated.push([
                rotate_code_u64(base, family.dim, 0),
                rotate_code_u64(base, family.dim, 1),
                rotate_code_u64(base, family.dim, 2),
                rotate_code_u64(base, family.dim, 3),
            ]);
        }

        Self {
            family,
            max_hamming: max_hamming.min(family.max_correction_bits),
            rotated,
        }
    }

    /// Family used by this matcher.
    #[inline]
    pub fn family(&self) -> TagFamily {
        self.family
    }

    /// Maximum Hamming distance allowed for matches.
    #[inline]
    pub fn max_hamming(&self) -> u8 {
        self.max_hamming
    }

    /// Find the best match within `max_hamming`.
    pub fn match_code(&self, observed: u64) -> Option<Match> {
        let mut best: Option<Match> = None;

        for (id, rots) in self.rotated.iter().enumerate() {
            for (rot, &cand) in rots.iter().enumerate() {
                let h = (observed ^ cand).count_ones() as u8;
                if h > self.max_hamming {
                    continue;
                }
                let m = Match {
                    id: id as u32,
                    rotation: rot as u8,
                    hamming: h,
                };
                match best {
                    None => best = Some(m),
                    Some(prev) => {
                        if m.hamming < prev.hamming {
                            best = Some(m);
                            if m.hamming == 0 {
                                return best;
                            }
                        }
                    }
                }
            }
        }

        best
    }
}

/// Rotate a code stored in row-major bits (`idx = y * n + x`) by `rot`
/// clockwise quarter turns.
pub fn rotate_code_u64(code: u64, n: usize, rot: u8) -> u64 {
    let rot = rot & 3;
    if rot == 0 {
        return code;
    }

    #[inline]
    fn get(code: u64, idx: usize) -> u64 {
        (code >> idx) & 1
    }

    let mut out = 0u64;
    for y in 0..n {
        for x in 0..n {
            let (sx, sy) = match rot {
                0 => (x, y),
                1 => (y, n - 1 - x),
                2 => (n - 1 - x, n - 1 - y),
                _ => (n - 1 - y, x),
            };
            let sidx = sy * n + sx;
            let didx = y * n + x;
            out |= get(code, sidx) << didx;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::{TAG16H5, TAG36H11};

    #[test]
    fn rotate_four_times_is_identity() {
        let code = 0x0123_4567_89ab_cdef_u64;
        let n = 8;
        let r = rotate_code_u64(code, n, 1);
        let r = rotate_code_u64(r, n, 1);
        let r = rotate_code_u64(r, n, 1);
        let r = rotate_code_u64(r, n, 1);
        assert_eq!(code, r);
    }

    #[test]
    fn rotation_one_is_clockwise() {
        // Single bit at top-left (0,0) of a 2x2 grid moves to top-right (1,0).
        let code = 1u64; // idx 0 = (x=0, y=0)
        let r = rotate_code_u64(code, 2, 1);
        assert_eq!(r, 1 << 1); // idx 1 = (x=1, y=0)
    }

    #[test]
    fn matcher_finds_rotated_code() {
        let matcher = Matcher::new(TAG36H11, 0);

        let base = TAG36H11.codes[17];
        let observed = rotate_code_u64(base, TAG36H11.dim, 1);
        let m = matcher.match_code(observed).expect("match");
        assert_eq!(m.id, 17);
        assert_eq!(m.rotation, 1);
        assert_eq!(m.hamming, 0);
    }

    #[test]
    fn matcher_corrects_bit_errors_within_budget() {
        let matcher = Matcher::new(TAG36H11, 2);
        let corrupted = TAG36H11.codes[3] ^ 0b101; // two bit errors
        let m = matcher.match_code(corrupted).expect("match");
        assert_eq!(m.id, 3);
        assert_eq!(m.hamming, 2);
    }

    #[test]
    fn matcher_rejects_beyond_budget() {
        let matcher = Matcher::new(TAG16H5, 0);
        let corrupted = TAG16H5.codes[0] ^ 0b11;
        assert!(matcher.match_code(corrupted).is_none());
    }

    #[test]
    fn max_hamming_clamped_to_family() {
        let matcher = Matcher::new(TAG16H5, 40);
        assert_eq!(matcher.max_hamming(), TAG16H5.max_correction_bits);
    }
}
