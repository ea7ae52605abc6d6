//! Tag family metadata and packed payload codes.

use serde::{Deserialize, Serialize};

/// A fixed AprilTag family.
///
/// A family is the codebook defining which payload bit grids are valid tags:
/// the grid size, the set of codewords, and how many bit errors the codebook
/// spacing allows the decoder to correct.
#[derive(Clone, Copy, Debug)]
pub struct TagFamily {
    /// Human-readable name (for logging and config round-trips).
    pub name: &'static str,
    /// Payload side length (number of data modules per side, border excluded).
    pub dim: usize,
    /// Maximum error-correcting Hamming distance supported by the codebook.
    pub max_correction_bits: u8,
    /// One `u64` per tag id, encoding the inner `dim x dim` modules.
    ///
    /// Bits are stored in row-major order (`idx = y * dim + x`) with
    /// **black = 1**.
    pub codes: &'static [u64],
}

impl TagFamily {
    /// Total number of payload bits per tag.
    #[inline]
    pub fn bit_count(&self) -> usize {
        self.dim * self.dim
    }

    /// Number of ids in the family.
    #[inline]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Modules per side of the printed tag: payload plus one black border
    /// module on each side.
    #[inline]
    pub fn total_dim(&self) -> usize {
        self.dim + 2
    }
}

impl Serialize for TagFamily {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}

impl<'de> Deserialize<'de> for TagFamily {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        crate::builtins::builtin_family(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown tag family `{name}`")))
    }
}

#[cfg(test)]
mod tests {
    use crate::builtins::TAG16H5;

    #[test]
    fn serde_round_trips_by_name() {
        let json = serde_json::to_string(&TAG16H5).expect("serialize");
        assert_eq!(json, "\"tag16h5\"");
        let back: super::TagFamily = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.name, TAG16H5.name);
        assert_eq!(back.codes.len(), TAG16H5.codes.len());
    }

    #[test]
    fn unknown_family_fails_to_deserialize() {
        let res: Result<super::TagFamily, _> = serde_json::from_str("\"tag7h3\"");
        assert!(res.is_err());
    }
}
