//! Four-channel RGBW color values.
//!
//! Red, green and blue are integer channels in `0..=255`; white is a real
//! channel in `0.0..=1.0`. Arithmetic does not clamp; intermediates are
//! clamped once with [`ColorValue::clamp`] at the interpolation boundary.

use core::ops::{Add, Mul, Sub};
use palette::Srgb;

/// White values further than this from zero are almost certainly on the
/// wrong scale (0..=255 instead of 0.0..=1.0).
const WHITE_SANITY_LIMIT: f32 = 10.0;

/// An RGBW color, possibly out of range until clamped.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ColorValue {
    pub r: i32,
    pub g: i32,
    pub b: i32,
    pub w: f32,
}

impl ColorValue {
    pub const OFF: Self = Self::new(0, 0, 0, 0.0);
    pub const RED: Self = Self::new(255, 0, 0, 0.0);
    pub const GREEN: Self = Self::new(0, 255, 0, 0.0);
    pub const BLUE: Self = Self::new(0, 0, 255, 0.0);
    pub const WHITE: Self = Self::new(0, 0, 0, 1.0);

    #[inline]
    pub const fn new(r: i32, g: i32, b: i32, w: f32) -> Self {
        Self { r, g, b, w }
    }

    /// Creates a color from RGB components only.
    #[inline]
    pub const fn rgb_only(r: i32, g: i32, b: i32) -> Self {
        Self::new(r, g, b, 0.0)
    }

    /// Converts a `palette` color in the 0.0-1.0 range, adding a white level.
    pub fn from_srgb(color: Srgb, w: f32) -> Self {
        let color: Srgb<u8> = color.into_format();
        Self::new(color.red as i32, color.green as i32, color.blue as i32, w)
    }

    /// Returns the clamped RGB part as an 8-bit `palette` color.
    pub fn rgb(&self) -> Srgb<u8> {
        Srgb::new(
            clamp_rgb(self.r) as u8,
            clamp_rgb(self.g) as u8,
            clamp_rgb(self.b) as u8,
        )
    }

    /// Returns the clamped white channel scaled to `0..=255`.
    pub fn white_u8(&self) -> u8 {
        libm::roundf(clamp_w(self.w) * 255.0) as u8
    }

    /// Clamps every channel into its displayable range.
    ///
    /// A white channel far outside `0.0..=1.0` is logged before clamping;
    /// the color is never rejected.
    pub fn clamp(self) -> Self {
        if !(-WHITE_SANITY_LIMIT..=WHITE_SANITY_LIMIT).contains(&self.w) {
            warn!(
                "white channel {} is far outside 0.0..=1.0; clamping",
                self.w
            );
        }
        Self::new(
            clamp_rgb(self.r),
            clamp_rgb(self.g),
            clamp_rgb(self.b),
            clamp_w(self.w),
        )
    }

    /// Returns true if every channel is already within its displayable range.
    pub fn is_clamped(&self) -> bool {
        (0..=255).contains(&self.r)
            && (0..=255).contains(&self.g)
            && (0..=255).contains(&self.b)
            && (0.0..=1.0).contains(&self.w)
    }

    /// Scales every channel, rounding RGB to the nearest integer. Unclamped.
    #[inline]
    pub fn scale(self, factor: f32) -> Self {
        Self::new(
            scale_channel(self.r, factor),
            scale_channel(self.g, factor),
            scale_channel(self.b, factor),
            self.w * factor,
        )
    }
}

impl Default for ColorValue {
    fn default() -> Self {
        Self::OFF
    }
}

impl From<Srgb<u8>> for ColorValue {
    fn from(color: Srgb<u8>) -> Self {
        Self::rgb_only(color.red as i32, color.green as i32, color.blue as i32)
    }
}

/// Per-channel sum, unclamped.
impl Add for ColorValue {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b, self.w + rhs.w)
    }
}

/// Per-channel difference, unclamped.
impl Sub for ColorValue {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.r - rhs.r, self.g - rhs.g, self.b - rhs.b, self.w - rhs.w)
    }
}

impl Mul<f32> for ColorValue {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        self.scale(rhs)
    }
}

/// Clamps an RGB channel to `0..=255`.
#[inline]
pub fn clamp_rgb(value: i32) -> i32 {
    value.clamp(0, 255)
}

/// Clamps the white channel to `0.0..=1.0`. NaN maps to `0.0`.
#[inline]
pub fn clamp_w(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

#[inline]
fn scale_channel(value: i32, factor: f32) -> i32 {
    libm::roundf(value as f32 * factor) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_bounds_every_channel() {
        let c = ColorValue::new(-20, 300, 128, 4.0).clamp();
        assert_eq!(c, ColorValue::new(0, 255, 128, 1.0));
        assert!(c.is_clamped());

        let c = ColorValue::new(0, 0, 0, -0.5).clamp();
        assert_eq!(c.w, 0.0);
    }

    #[test]
    fn clamp_tolerates_wildly_out_of_range_white() {
        let c = ColorValue::new(10, 10, 10, 255.0).clamp();
        assert_eq!(c.w, 1.0);
        assert_eq!(c.r, 10);
    }

    #[test]
    fn arithmetic_does_not_clamp() {
        let diff = ColorValue::new(0, 0, 0, 0.0) - ColorValue::new(255, 10, 0, 1.0);
        assert_eq!(diff, ColorValue::new(-255, -10, 0, -1.0));

        let sum = ColorValue::RED + ColorValue::RED;
        assert_eq!(sum.r, 510);
    }

    #[test]
    fn scale_rounds_to_nearest() {
        let c = ColorValue::new(255, 100, 3, 1.0).scale(0.5);
        assert_eq!(c.r, 128);
        assert_eq!(c.g, 50);
        assert_eq!(c.b, 2);
        assert_eq!(c.w, 0.5);
    }

    #[test]
    fn palette_interop() {
        let c = ColorValue::from(Srgb::new(1u8, 2, 3));
        assert_eq!(c, ColorValue::new(1, 2, 3, 0.0));

        let c = ColorValue::from_srgb(Srgb::new(1.0, 0.0, 0.0), 0.25);
        assert_eq!(c, ColorValue::new(255, 0, 0, 0.25));

        let out = ColorValue::new(300, -1, 7, 2.0).rgb();
        assert_eq!(out, Srgb::new(255u8, 0, 7));
        assert_eq!(ColorValue::WHITE.white_u8(), 255);
    }
}
