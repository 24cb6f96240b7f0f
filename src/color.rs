// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Packed ARGB color helpers
//!
//! Colors are stored as a single 32-bit value with 8 bits per channel in
//! `0xAARRGGBB` order, which is also how they are written to disk.

use crate::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An opaque RGB triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl Rgb {
    /// Build a color from its channels
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Unpack the RGB part of a packed ARGB value
    #[must_use]
    pub const fn from_argb(argb: u32) -> Self {
        Self {
            r: red(argb),
            g: green(argb),
            b: blue(argb),
        }
    }
}

impl TryFrom<[i64; 3]> for Rgb {
    type Error = CatalogError;

    fn try_from(channels: [i64; 3]) -> Result<Self> {
        let mut out = [0u8; 3];
        for (slot, value) in out.iter_mut().zip(channels) {
            *slot = u8::try_from(value).map_err(|_| {
                CatalogError::InvalidArgument(format!(
                    "color channel {value} is outside 0-255"
                ))
            })?;
        }
        Ok(Self::new(out[0], out[1], out[2]))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", hex::encode([self.r, self.g, self.b]))
    }
}

impl FromStr for Rgb {
    type Err = CatalogError;

    /// Accepts `#rrggbb` or `r,g,b`
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(digits) = s.strip_prefix('#') {
            let bytes = hex::decode(digits).map_err(|e| {
                CatalogError::InvalidArgument(format!("invalid hex color '{s}': {e}"))
            })?;
            return match bytes.as_slice() {
                [r, g, b] => Ok(Self::new(*r, *g, *b)),
                _ => Err(CatalogError::InvalidArgument(format!(
                    "hex color '{s}' must have six digits"
                ))),
            };
        }

        let channels = s
            .split(',')
            .map(|part| {
                part.trim().parse::<i64>().map_err(|e| {
                    CatalogError::InvalidArgument(format!("invalid color channel '{part}': {e}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let channels: [i64; 3] = channels.try_into().map_err(|_| {
            CatalogError::InvalidArgument(format!("color '{s}' must have three channels"))
        })?;
        Self::try_from(channels)
    }
}

/// Pack an opaque color
#[must_use]
pub const fn make_rgb(r: u8, g: u8, b: u8) -> u32 {
    make_rgba(r, g, b, 255)
}

/// Pack a color with an explicit alpha channel
#[must_use]
pub const fn make_rgba(r: u8, g: u8, b: u8, a: u8) -> u32 {
    ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
}

/// Red channel of a packed value
#[must_use]
pub const fn red(argb: u32) -> u8 {
    ((argb >> 16) & 0xff) as u8
}

/// Green channel of a packed value
#[must_use]
pub const fn green(argb: u32) -> u8 {
    ((argb >> 8) & 0xff) as u8
}

/// Blue channel of a packed value
#[must_use]
pub const fn blue(argb: u32) -> u8 {
    (argb & 0xff) as u8
}

/// Alpha channel of a packed value
#[must_use]
pub const fn alpha(argb: u32) -> u8 {
    ((argb >> 24) & 0xff) as u8
}

/// Convert a 0.0-1.0 alpha to its channel value, truncating toward zero
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn alpha_channel(alpha: f64) -> Result<u8> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(CatalogError::InvalidArgument(format!(
            "alpha {alpha} is outside 0.0-1.0"
        )));
    }
    Ok((255.0 * alpha) as u8)
}
