/*
 *  display/traits.rs
 *
 *  PiStatus - host status at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Core trait definitions for display surface abstraction
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

use crate::display::error::DisplayError;
use crate::display::frame::Frame;

/// Display capabilities and metadata
#[derive(Debug, Clone)]
pub struct DisplayCapabilities {
    /// Display width in pixels (after rotation)
    pub width: u32,

    /// Display height in pixels (after rotation)
    pub height: u32,
}

/// The panel a frame ends up on.
///
/// A surface is a persistent, stateful device: it is initialised once, then
/// every `push` replaces the whole visible image. Surfaces are owned by a
/// single refresh loop and never pushed to concurrently.
pub trait DisplaySurface: Send {
    /// Returns the capabilities of this display
    fn capabilities(&self) -> &DisplayCapabilities;

    /// Returns the display dimensions as (width, height)
    fn dimensions(&self) -> (u32, u32) {
        let caps = self.capabilities();
        (caps.width, caps.height)
    }

    /// Bring the panel up. Called once before the first push.
    fn init(&mut self) -> Result<(), DisplayError>;

    /// Replace the visible image with `frame`.
    ///
    /// `frame` must match `dimensions()`; a mismatch is reported as
    /// `DisplayError::FrameSizeMismatch` and nothing is sent.
    fn push(&mut self, frame: &Frame) -> Result<(), DisplayError>;

    /// Blank the panel.
    fn clear(&mut self) -> Result<(), DisplayError> {
        let (width, height) = self.dimensions();
        self.push(&Frame::new(width, height))
    }

    /// Set display brightness (0-255)
    ///
    /// Returns an error if the display doesn't support brightness control.
    fn set_brightness(&mut self, _value: u8) -> Result<(), DisplayError> {
        Err(DisplayError::UnsupportedOperation)
    }
}

/// Type alias for boxed display surface trait objects
pub type BoxedSurface = Box<dyn DisplaySurface>;

impl<T: DisplaySurface + ?Sized> DisplaySurface for Box<T> {
    fn capabilities(&self) -> &DisplayCapabilities {
        (**self).capabilities()
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        (**self).init()
    }

    fn push(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        (**self).push(frame)
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        (**self).clear()
    }

    fn set_brightness(&mut self, value: u8) -> Result<(), DisplayError> {
        (**self).set_brightness(value)
    }
}

/// Reject frames that do not match the surface.
pub(crate) fn check_frame_size(caps: &DisplayCapabilities, frame: &Frame) -> Result<(), DisplayError> {
    if frame.width() != caps.width || frame.height() != caps.height {
        return Err(DisplayError::FrameSizeMismatch {
            expected: (caps.width, caps.height),
            actual: (frame.width(), frame.height()),
        });
    }
    Ok(())
}
