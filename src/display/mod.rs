/*
 *  display/mod.rs
 *
 *  PiStatus - host status at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display pipeline: fonts, layout, frames and the surfaces they land on
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

// Core trait definitions
pub mod traits;
pub mod error;
pub mod factory;

// Text and geometry
pub mod fonts;
pub mod layout;

// Pixels
pub mod frame;
pub mod render;

// Display surfaces (ssd1306 conditionally compiled)
pub mod drivers;

// Re-exports for convenience
pub use traits::{BoxedSurface, DisplayCapabilities, DisplaySurface};
pub use error::{DisplayError, DisplayFactoryError};
pub use factory::DisplaySurfaceFactory;
pub use fonts::{Font, FontBook, FontDescriptor, FontError, FontFamily, TextMeasurer};
pub use layout::{
    FontPolicy, FontRule, LayoutEngine, LayoutResult, PageLayout, Placement, StackedLayout, TextLine,
};
pub use frame::Frame;
pub use render::FrameRenderer;
pub use drivers::headless::HeadlessDriver;

#[cfg(feature = "driver-ssd1306")]
pub use drivers::ssd1306::Ssd1306Driver;
