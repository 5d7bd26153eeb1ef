//! Content and surface masks carried by brushes, sides and leaves

use bitflags::bitflags;

bitflags! {
    /// What a brush (and therefore a leaf) is made of.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Contents: u32 {
        const SOLID = 0x1;
        const WINDOW = 0x2;
        const AUX = 0x4;
        const GRATE = 0x8;
        const SLIME = 0x10;
        const WATER = 0x20;
        const BLOCKLOS = 0x40;
        const OPAQUE = 0x80;

        const AREAPORTAL = 0x8000;
        const PLAYERCLIP = 0x10000;
        const MONSTERCLIP = 0x20000;

        const ORIGIN = 0x100_0000;
        const DETAIL = 0x800_0000;
        const TRANSLUCENT = 0x1000_0000;
        const LADDER = 0x2000_0000;
    }
}

bitflags! {
    /// Per-face surface flags that steer split selection.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SurfaceFlags: u32 {
        const SKY = 0x4;
        const NODRAW = 0x80;
        const HINT = 0x100;
        const SKIP = 0x200;
    }
}

impl Contents {
    /// Contents a viewer can see the boundary of, from `SOLID` up to `OPAQUE`.
    pub const LAST_VISIBLE: Contents = Contents::OPAQUE;

    /// Contents that stop visibility between clusters.
    pub const VIS_BLOCKING: Contents = Contents::SOLID.union(Contents::OPAQUE);

    /// The strongest visible content bit in `self`, if any.
    pub fn visible(self) -> Contents {
        let mut bit = Contents::SOLID.bits();
        while bit <= Self::LAST_VISIBLE.bits() {
            if self.bits() & bit != 0 {
                return Contents::from_bits_truncate(bit);
            }
            bit <<= 1;
        }
        Contents::empty()
    }

    /// Resolve overlapping solids in one leaf: solid swallows everything else.
    pub fn resolve_leaf(self) -> Contents {
        if self.contains(Contents::SOLID) {
            Contents::SOLID
        } else {
            self
        }
    }

    /// Whether an occupant can flood through a leaf with these contents.
    pub const fn is_passable(self) -> bool {
        !self.contains(Contents::SOLID)
    }

    /// An area portal leaf that is not also filled by a solid.
    pub const fn is_area_portal(self) -> bool {
        self.contains(Contents::AREAPORTAL) && !self.contains(Contents::SOLID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_picks_strongest_bit() {
        let c = Contents::WATER | Contents::SOLID | Contents::DETAIL;
        assert_eq!(c.visible(), Contents::SOLID);
        assert_eq!((Contents::WATER | Contents::DETAIL).visible(), Contents::WATER);
        assert_eq!(Contents::DETAIL.visible(), Contents::empty());
    }

    #[test]
    fn solid_wins_leaf_resolution() {
        let c = Contents::SOLID | Contents::DETAIL | Contents::WATER;
        assert_eq!(c.resolve_leaf(), Contents::SOLID);
        let d = Contents::DETAIL | Contents::WATER;
        assert_eq!(d.resolve_leaf(), d);
    }
}
