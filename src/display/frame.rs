/*
 *  display/frame.rs
 *
 *  PiStatus - host status at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  One monochrome frame, sized at runtime
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

use core::convert::Infallible;
use std::io::{self, Write};

use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;

/// A 1-bit canvas. Out-of-bounds pixels are silently dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    buf: Vec<BinaryColor>,
    w: u32,
    h: u32,
}

impl Frame {
    /// All pixels off.
    pub fn new(width: u32, height: u32) -> Self {
        Self { buf: vec![BinaryColor::Off; width as usize * height as usize], w: width, h: height }
    }

    pub fn width(&self) -> u32 { self.w }
    pub fn height(&self) -> u32 { self.h }

    #[inline]
    fn idx(&self, p: Point) -> Option<usize> {
        if p.x >= 0 && p.y >= 0 {
            let (x, y) = (p.x as u32, p.y as u32);
            if x < self.w && y < self.h {
                return Some(y as usize * self.w as usize + x as usize);
            }
        }
        None
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<BinaryColor> {
        let p = Point::new(i32::try_from(x).ok()?, i32::try_from(y).ok()?);
        self.idx(p).map(|i| self.buf[i])
    }

    pub fn count_on_pixels(&self) -> usize {
        self.buf.iter().filter(|p| p.is_on()).count()
    }

    /// Every lit pixel, row-major.
    pub fn lit_pixels(&self) -> impl Iterator<Item = Pixel<BinaryColor>> + '_ {
        let w = self.w as usize;
        self.buf
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_on())
            .map(move |(i, _)| Pixel(Point::new((i % w) as i32, (i / w) as i32), BinaryColor::On))
    }

    /// 8 pixels per byte, row-major, LSB first.
    pub fn to_packed_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; self.buf.len().div_ceil(8)];
        for (i, pixel) in self.buf.iter().enumerate() {
            if pixel.is_on() {
                bytes[i / 8] |= 1 << (i % 8);
            }
        }
        bytes
    }

    /// Plain PBM (P1), handy for looking at frames without a panel.
    pub fn write_pbm<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "P1")?;
        writeln!(out, "{} {}", self.w, self.h)?;
        if self.w == 0 {
            return Ok(());
        }
        for row in self.buf.chunks(self.w as usize) {
            let line: Vec<&str> = row.iter().map(|p| if p.is_on() { "1" } else { "0" }).collect();
            writeln!(out, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

impl OriginDimensions for Frame {
    fn size(&self) -> Size {
        Size::new(self.w, self.h)
    }
}

impl DrawTarget for Frame {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            if let Some(i) = self.idx(p) {
                self.buf[i] = c;
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.buf.fill(color);
        Ok(())
    }
}
