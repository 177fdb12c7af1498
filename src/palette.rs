//! Named color lookup over the tailwind palette.

use bevy_color::{Srgba, palettes::tailwind::*};

/// The shade steps available for every [`Chroma`], from lightest to darkest.
pub const SHADES: [u16; 11] = [50, 100, 200, 300, 400, 500, 600, 700, 800, 900, 950];

/// A named hue in the palette.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
pub enum Chroma {
    /// Red.
    Red,
    /// Orange.
    Orange,
    /// Yellow.
    Yellow,
    /// Green.
    Green,
    /// Blue.
    Blue,
    /// Purple.
    Purple,
    /// Gray.
    Gray,
}

impl Chroma {
    /// Look up this hue at the given shade step.
    ///
    /// Shades between steps round toward the darker step, and shades past 950 clamp to 950.
    pub fn shade(self, shade: u16) -> Srgba {
        let index = SHADES
            .iter()
            .position(|&step| step >= shade)
            .unwrap_or(SHADES.len() - 1);
        self.ramp()[index]
    }

    fn ramp(self) -> [Srgba; 11] {
        match self {
            Self::Red => [
                RED_50, RED_100, RED_200, RED_300, RED_400, RED_500, RED_600, RED_700, RED_800,
                RED_900, RED_950,
            ],
            Self::Orange => [
                ORANGE_50, ORANGE_100, ORANGE_200, ORANGE_300, ORANGE_400, ORANGE_500, ORANGE_600,
                ORANGE_700, ORANGE_800, ORANGE_900, ORANGE_950,
            ],
            Self::Yellow => [
                YELLOW_50, YELLOW_100, YELLOW_200, YELLOW_300, YELLOW_400, YELLOW_500, YELLOW_600,
                YELLOW_700, YELLOW_800, YELLOW_900, YELLOW_950,
            ],
            Self::Green => [
                GREEN_50, GREEN_100, GREEN_200, GREEN_300, GREEN_400, GREEN_500, GREEN_600,
                GREEN_700, GREEN_800, GREEN_900, GREEN_950,
            ],
            Self::Blue => [
                BLUE_50, BLUE_100, BLUE_200, BLUE_300, BLUE_400, BLUE_500, BLUE_600, BLUE_700,
                BLUE_800, BLUE_900, BLUE_950,
            ],
            Self::Purple => [
                PURPLE_50, PURPLE_100, PURPLE_200, PURPLE_300, PURPLE_400, PURPLE_500, PURPLE_600,
                PURPLE_700, PURPLE_800, PURPLE_900, PURPLE_950,
            ],
            Self::Gray => [
                GRAY_50, GRAY_100, GRAY_200, GRAY_300, GRAY_400, GRAY_500, GRAY_600, GRAY_700,
                GRAY_800, GRAY_900, GRAY_950,
            ],
        }
    }
}

/// Convert a color to a `#RRGGBB` hex string, or `#RRGGBBAA` if it isn't opaque.
pub fn to_hex(color: impl Into<Srgba>) -> String {
    color.into().to_hex()
}
