//! 8-bit RGBA color with BGRA32 packing.

use std::str::FromStr;

use crate::palette::ParseColorError;

/// An 8-bit-per-channel color.
///
/// The engine stores pixels packed as BGRA32 (`0xAARRGGBB` as a `u32`,
/// blue in the low byte); `Color` is the unpacked form used at API
/// boundaries and in palette math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
    /// Alpha channel (255 = opaque)
    pub a: u8,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    /// Fully transparent black.
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);

    /// Create a color from all four channels.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color.
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Unpack a BGRA32 pixel.
    #[inline]
    pub const fn from_bgra(value: u32) -> Self {
        Self {
            b: value as u8,
            g: (value >> 8) as u8,
            r: (value >> 16) as u8,
            a: (value >> 24) as u8,
        }
    }

    /// Pack into a BGRA32 pixel.
    #[inline]
    pub const fn to_bgra(self) -> u32 {
        (self.a as u32) << 24 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Same color with alpha forced to 255.
    #[inline]
    pub const fn opaque(self) -> Self {
        Self::rgb(self.r, self.g, self.b)
    }

    /// BT.601 luma, rounded.
    #[inline]
    pub fn luminance(self) -> u8 {
        let y = 299 * self.r as u32 + 587 * self.g as u32 + 114 * self.b as u32;
        ((y + 500) / 1000) as u8
    }

    /// 15-bit key keeping the top five bits of each channel
    /// (`0bRRRRRGGGGGBBBBB`). Used to memoize per-color work.
    #[inline]
    pub const fn key15(self) -> u16 {
        ((self.r as u16 >> 3) << 10) | ((self.g as u16 >> 3) << 5) | (self.b as u16 >> 3)
    }

    /// Representative opaque color of a [`key15`](Self::key15) bucket.
    ///
    /// Five-bit channels are widened by bit replication so that the
    /// extremes map back to 0 and 255.
    #[inline]
    pub const fn from_key15(key: u16) -> Self {
        Self::rgb(
            widen5((key >> 10) & 0x1f),
            widen5((key >> 5) & 0x1f),
            widen5(key & 0x1f),
        )
    }

    /// `[R, G, B]` bytes.
    #[inline]
    pub const fn to_rgb_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

#[inline]
const fn widen5(v: u16) -> u8 {
    ((v << 3) | (v >> 2)) as u8
}

impl FromStr for Color {
    type Err = ParseColorError;

    /// Parse `#RRGGBB`, `RRGGBB`, `#RGB` or `RGB` (case-insensitive) into an
    /// opaque color.
    ///
    /// ```
    /// use artpaint_filters::Color;
    ///
    /// let red: Color = "#F00".parse().unwrap();
    /// assert_eq!(red, Color::rgb(255, 0, 0));
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);
        if !s.is_ascii() {
            return Err(ParseColorError::InvalidLength);
        }

        match s.len() {
            3 => {
                let r = u8::from_str_radix(&s[0..1], 16)? * 17;
                let g = u8::from_str_radix(&s[1..2], 16)? * 17;
                let b = u8::from_str_radix(&s[2..3], 16)? * 17;
                Ok(Self::rgb(r, g, b))
            }
            6 => {
                let r = u8::from_str_radix(&s[0..2], 16)?;
                let g = u8::from_str_radix(&s[2..4], 16)?;
                let b = u8::from_str_radix(&s[4..6], 16)?;
                Ok(Self::rgb(r, g, b))
            }
            _ => Err(ParseColorError::InvalidLength),
        }
    }
}
