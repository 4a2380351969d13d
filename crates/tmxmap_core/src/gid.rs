//! Global tile identifiers and their orientation flags.
//!
//! A raw GID is a `u32` whose three high bits carry flip flags and whose low 29 bits
//! carry the bare identifier. `0` always means "no tile".

use serde::{Deserialize, Serialize};

pub const FLIPPED_HORIZONTALLY_FLAG: u32 = 1 << 31;
pub const FLIPPED_VERTICALLY_FLAG: u32 = 1 << 30;
pub const FLIPPED_DIAGONALLY_FLAG: u32 = 1 << 29;

/// Mask selecting the bare identifier bits.
pub const GID_MASK: u32 = !(FLIPPED_HORIZONTALLY_FLAG | FLIPPED_VERTICALLY_FLAG | FLIPPED_DIAGONALLY_FLAG);

/// Orientation flags packed into the high bits of a GID.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileFlags {
    pub horizontal: bool,
    pub vertical: bool,
    pub diagonal: bool,
}

impl TileFlags {
    pub const NONE: Self = Self {
        horizontal: false,
        vertical: false,
        diagonal: false,
    };

    pub const fn new(horizontal: bool, vertical: bool, diagonal: bool) -> Self {
        Self {
            horizontal,
            vertical,
            diagonal,
        }
    }

    /// True when no flip bit is set.
    pub const fn is_empty(self) -> bool {
        !(self.horizontal || self.vertical || self.diagonal)
    }

    /// The flag bits as they appear in a raw GID.
    pub const fn bits(self) -> u32 {
        let mut bits = 0;
        if self.horizontal {
            bits |= FLIPPED_HORIZONTALLY_FLAG;
        }
        if self.vertical {
            bits |= FLIPPED_VERTICALLY_FLAG;
        }
        if self.diagonal {
            bits |= FLIPPED_DIAGONALLY_FLAG;
        }
        bits
    }

    pub const fn from_bits(raw: u32) -> Self {
        Self {
            horizontal: raw & FLIPPED_HORIZONTALLY_FLAG != 0,
            vertical: raw & FLIPPED_VERTICALLY_FLAG != 0,
            diagonal: raw & FLIPPED_DIAGONALLY_FLAG != 0,
        }
    }

    /// `None` for unflipped tiles, which is how the image loader is told "plain tile".
    pub const fn non_empty(self) -> Option<Self> {
        if self.is_empty() { None } else { Some(self) }
    }
}

/// Split a raw GID into its bare identifier and flags.
pub const fn decode_gid(raw: u32) -> (u32, TileFlags) {
    (raw & GID_MASK, TileFlags::from_bits(raw))
}

/// Pack a bare identifier and flags into a raw GID.
///
/// Identifiers wider than 29 bits are truncated so the flags stay authoritative.
pub const fn encode_gid(id: u32, flags: TileFlags) -> u32 {
    (id & GID_MASK) | flags.bits()
}

/// A raw GID as stored in layer data, flags included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gid(pub u32);

impl Gid {
    pub const EMPTY: Gid = Gid(0);

    pub const fn new(id: u32, flags: TileFlags) -> Self {
        Gid(encode_gid(id, flags))
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Bare identifier with the flag bits cleared.
    pub const fn id(self) -> u32 {
        self.0 & GID_MASK
    }

    pub const fn flags(self) -> TileFlags {
        TileFlags::from_bits(self.0)
    }

    /// Same tile without any flip applied.
    pub const fn unflipped(self) -> Self {
        Gid(self.id())
    }

    pub const fn is_empty(self) -> bool {
        self.id() == 0
    }
}

impl From<u32> for Gid {
    fn from(raw: u32) -> Self {
        Gid(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_FLAGS: [TileFlags; 8] = [
        TileFlags::new(false, false, false),
        TileFlags::new(true, false, false),
        TileFlags::new(false, true, false),
        TileFlags::new(false, false, true),
        TileFlags::new(true, true, false),
        TileFlags::new(true, false, true),
        TileFlags::new(false, true, true),
        TileFlags::new(true, true, true),
    ];

    #[test]
    fn test_decode_zero() {
        assert_eq!(decode_gid(0), (0, TileFlags::NONE));
        assert!(Gid(0).is_empty());
    }

    #[test]
    fn test_decode_flag_bits() {
        let (id, flags) = decode_gid(0x8000_0005);
        assert_eq!(id, 5);
        assert_eq!(flags, TileFlags::new(true, false, false));

        let (id, flags) = decode_gid(0x6000_0003);
        assert_eq!(id, 3);
        assert_eq!(flags, TileFlags::new(false, true, true));
    }

    #[test]
    fn test_encode_decode_identity() {
        for id in [0, 1, 2, 17, 4096, 123_456, GID_MASK] {
            for flags in ALL_FLAGS {
                assert_eq!(decode_gid(encode_gid(id, flags)), (id, flags));
            }
        }
    }

    #[test]
    fn test_flagged_gid_is_not_empty() {
        let gid = Gid::new(7, TileFlags::new(false, true, false));
        assert!(!gid.is_empty());
        assert_eq!(gid.id(), 7);
        assert_eq!(gid.unflipped(), Gid(7));
        assert_eq!(gid.flags().non_empty(), Some(TileFlags::new(false, true, false)));
        assert_eq!(Gid(7).flags().non_empty(), None);
    }
}
