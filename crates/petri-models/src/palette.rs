//! Shared render palette.

use petri_core::Rgb;

/// Paper white.
pub const WHITE: Rgb = Rgb(255, 255, 255);
/// Light gray.
pub const LIGHT_GRAY: Rgb = Rgb(170, 170, 170);
/// Dark gray.
pub const DARK_GRAY: Rgb = Rgb(85, 85, 85);
/// Ink black.
pub const BLACK: Rgb = Rgb(0, 0, 0);
/// Full red.
pub const RED: Rgb = Rgb(255, 0, 0);
/// Full green.
pub const GREEN: Rgb = Rgb(0, 255, 0);
/// Trail purple.
pub const PURPLE: Rgb = Rgb(255, 85, 255);
/// Faint scent blue.
pub const LIGHT_BLUE: Rgb = Rgb(85, 85, 255);
/// Warm scent red.
pub const LIGHT_RED: Rgb = Rgb(255, 85, 85);
/// Hot scent yellow.
pub const YELLOW: Rgb = Rgb(255, 255, 0);
