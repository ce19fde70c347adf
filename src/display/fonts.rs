/*
 *  display/fonts.rs
 *
 *  PiStatus - host status at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Font catalog, startup font loading and text measurement
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::fmt;

use embedded_graphics::mono_font::MonoFont;
use embedded_graphics::mono_font::iso_8859_1::{
    FONT_10X20, FONT_4X6, FONT_5X7, FONT_5X8, FONT_6X10, FONT_6X12, FONT_6X13, FONT_6X9,
    FONT_7X14, FONT_7X14_BOLD, FONT_8X13_BOLD, FONT_9X15, FONT_9X15_BOLD, FONT_9X18,
    FONT_9X18_BOLD,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::FontsConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFamily {
    Regular,
    Bold,
}

/// Font family plus pixel height, as named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FontDescriptor {
    pub family: FontFamily,
    pub size: u32,
}

impl FontDescriptor {
    pub const fn new(family: FontFamily, size: u32) -> Self {
        Self { family, size }
    }

    pub const fn regular(size: u32) -> Self {
        Self::new(FontFamily::Regular, size)
    }

    pub const fn bold(size: u32) -> Self {
        Self::new(FontFamily::Bold, size)
    }

    /// Every descriptor the catalog can satisfy.
    pub fn available() -> impl Iterator<Item = FontDescriptor> {
        const SIZES: [(FontFamily, u32); 15] = [
            (FontFamily::Regular, 6),
            (FontFamily::Regular, 7),
            (FontFamily::Regular, 8),
            (FontFamily::Regular, 9),
            (FontFamily::Regular, 10),
            (FontFamily::Regular, 12),
            (FontFamily::Regular, 13),
            (FontFamily::Regular, 14),
            (FontFamily::Regular, 15),
            (FontFamily::Regular, 18),
            (FontFamily::Regular, 20),
            (FontFamily::Bold, 13),
            (FontFamily::Bold, 14),
            (FontFamily::Bold, 15),
            (FontFamily::Bold, 18),
        ];
        SIZES.into_iter().map(|(family, size)| FontDescriptor::new(family, size))
    }

    fn face(self) -> Option<&'static MonoFont<'static>> {
        use FontFamily::*;
        let face = match (self.family, self.size) {
            (Regular, 6) => &FONT_4X6,
            (Regular, 7) => &FONT_5X7,
            (Regular, 8) => &FONT_5X8,
            (Regular, 9) => &FONT_6X9,
            (Regular, 10) => &FONT_6X10,
            (Regular, 12) => &FONT_6X12,
            (Regular, 13) => &FONT_6X13,
            (Regular, 14) => &FONT_7X14,
            (Regular, 15) => &FONT_9X15,
            (Regular, 18) => &FONT_9X18,
            (Regular, 20) => &FONT_10X20,
            (Bold, 13) => &FONT_8X13_BOLD,
            (Bold, 14) => &FONT_7X14_BOLD,
            (Bold, 15) => &FONT_9X15_BOLD,
            (Bold, 18) => &FONT_9X18_BOLD,
            _ => return None,
        };
        Some(face)
    }
}

impl fmt::Display for FontDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let family = match self.family {
            FontFamily::Regular => "regular",
            FontFamily::Bold => "bold",
        };
        write!(f, "{} {}px", family, self.size)
    }
}

#[derive(Debug, Error)]
pub enum FontError {
    #[error("no {descriptor} font for {role} (available: {available})")]
    NotFound {
        role: String,
        descriptor: FontDescriptor,
        available: String,
    },
}

/// A descriptor that has been resolved to a glyph set.
#[derive(Clone, Copy)]
pub struct Font {
    descriptor: FontDescriptor,
    face: &'static MonoFont<'static>,
}

impl Font {
    /// Resolve a descriptor. `role` only feeds the error message.
    pub fn load(role: &str, descriptor: FontDescriptor) -> Result<Self, FontError> {
        match descriptor.face() {
            Some(face) => Ok(Self { descriptor, face }),
            None => Err(FontError::NotFound {
                role: role.to_string(),
                descriptor,
                available: FontDescriptor::available()
                    .map(|d| d.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    pub fn descriptor(&self) -> FontDescriptor {
        self.descriptor
    }

    pub fn face(&self) -> &'static MonoFont<'static> {
        self.face
    }

    pub fn line_height(&self) -> u32 {
        self.face.character_size.height
    }
}

impl PartialEq for Font {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor == other.descriptor
    }
}

impl Eq for Font {}

impl fmt::Debug for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Font")
            .field("descriptor", &self.descriptor)
            .field("glyph", &format_args!(
                "{}x{}",
                self.face.character_size.width,
                self.face.character_size.height
            ))
            .finish()
    }
}

/// Fonts for every text role, loaded once at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontBook {
    /// stacked mode address line
    pub headline: Font,
    /// stacked mode metric lines
    pub detail: Font,
    /// paged mode title
    pub title: Font,
    /// paged mode value, default
    pub value: Font,
    /// paged mode value when a font rule trips
    pub value_fallback: Font,
}

impl FontBook {
    pub const DEFAULT_HEADLINE: FontDescriptor = FontDescriptor::bold(18);
    pub const DEFAULT_DETAIL: FontDescriptor = FontDescriptor::regular(13);
    pub const DEFAULT_TITLE: FontDescriptor = FontDescriptor::regular(10);
    pub const DEFAULT_VALUE: FontDescriptor = FontDescriptor::regular(20);
    pub const DEFAULT_VALUE_FALLBACK: FontDescriptor = FontDescriptor::bold(13);

    /// Resolve every role. Any miss is fatal for startup.
    pub fn load(config: &FontsConfig) -> Result<Self, FontError> {
        Ok(Self {
            headline: Font::load("headline", config.headline.unwrap_or(Self::DEFAULT_HEADLINE))?,
            detail: Font::load("detail", config.detail.unwrap_or(Self::DEFAULT_DETAIL))?,
            title: Font::load("title", config.title.unwrap_or(Self::DEFAULT_TITLE))?,
            value: Font::load("value", config.value.unwrap_or(Self::DEFAULT_VALUE))?,
            value_fallback: Font::load(
                "value_fallback",
                config.value_fallback.unwrap_or(Self::DEFAULT_VALUE_FALLBACK),
            )?,
        })
    }
}

/// Pixel extents of text in a given font.
pub struct TextMeasurer;

impl TextMeasurer {
    /// Width and height of `text` drawn in `font`; `(0, 0)` for an empty string.
    pub fn measure(text: &str, font: &Font) -> (u32, u32) {
        let chars = text.chars().count() as u32;
        if chars == 0 {
            return (0, 0);
        }
        let face = font.face();
        let width = chars * face.character_size.width
            + (chars - 1) * face.character_spacing;
        (width, face.character_size.height)
    }
}
