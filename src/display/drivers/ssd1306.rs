/*
 *  display/drivers/ssd1306.rs
 *
 *  PiStatus - host status at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  SSD1306 OLED display surface over Linux I2C
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

use linux_embedded_hal::I2cdev;
use ssd1306::{
    // trait only, for init(); the name belongs to config::DisplayConfig here
    mode::{BufferedGraphicsMode, DisplayConfig as _},
    prelude::*,
    size::{DisplaySize128x32, DisplaySize128x64},
    I2CDisplayInterface,
    Ssd1306,
};

use embedded_graphics::prelude::*;

use crate::config::DisplayConfig;
use crate::display::error::DisplayError;
use crate::display::frame::Frame;
use crate::display::traits::{check_frame_size, DisplayCapabilities, DisplaySurface};

use log::{debug, info};

type Panel<SIZE> = Ssd1306<I2CInterface<I2cdev>, SIZE, BufferedGraphicsMode<SIZE>>;

/// Supported SSD1306 geometries
enum Ssd1306Variants {
    Size128x64(Panel<DisplaySize128x64>),
    Size128x32(Panel<DisplaySize128x32>),
}

// both variants expose the same API with different size parameters
macro_rules! with_panel {
    ($variants:expr, $panel:ident => $body:expr) => {
        match $variants {
            Ssd1306Variants::Size128x64($panel) => $body,
            Ssd1306Variants::Size128x32($panel) => $body,
        }
    };
}

/// SSD1306 display surface
pub struct Ssd1306Driver {
    display: Ssd1306Variants,
    capabilities: DisplayCapabilities,
    brightness: Option<u8>,
}

fn rotation_for(degrees: u16) -> Result<DisplayRotation, DisplayError> {
    match degrees {
        0 => Ok(DisplayRotation::Rotate0),
        90 => Ok(DisplayRotation::Rotate90),
        180 => Ok(DisplayRotation::Rotate180),
        270 => Ok(DisplayRotation::Rotate270),
        _ => Err(DisplayError::InvalidRotation(degrees)),
    }
}

fn brightness_for(value: u8) -> Brightness {
    match value {
        0..=63 => Brightness::DIMMEST,
        64..=127 => Brightness::DIM,
        128..=191 => Brightness::NORMAL,
        _ => Brightness::BRIGHTEST,
    }
}

impl Ssd1306Driver {
    /// Open the panel on `i2c_bus_path` at `address` (typically 0x3C or 0x3D).
    ///
    /// The bus is opened here; the controller is not touched until `init`.
    pub fn new_i2c(
        i2c_bus_path: &str,
        address: u8,
        config: &DisplayConfig,
    ) -> Result<Self, DisplayError> {
        info!("Opening SSD1306 on {} at address 0x{:02X}", i2c_bus_path, address);

        let i2c = I2cdev::new(i2c_bus_path)
            .map_err(|e| DisplayError::I2cError(format!("Failed to open {}: {}", i2c_bus_path, e)))?;
        let interface = I2CDisplayInterface::new_custom_address(i2c, address);

        let width = config.width.unwrap_or(128);
        let height = config.height.unwrap_or(64);
        let degrees = config.rotate_deg.unwrap_or(0);
        let rotation = rotation_for(degrees)?;

        let display = match (width, height) {
            (128, 64) => Ssd1306Variants::Size128x64(
                Ssd1306::new(interface, DisplaySize128x64, rotation).into_buffered_graphics_mode(),
            ),
            (128, 32) => Ssd1306Variants::Size128x32(
                Ssd1306::new(interface, DisplaySize128x32, rotation).into_buffered_graphics_mode(),
            ),
            _ => {
                return Err(DisplayError::InvalidConfiguration(
                    format!("Unsupported SSD1306 size: {}x{}", width, height)
                ));
            }
        };

        // frames are composed in the rotated orientation
        let (width, height) = match degrees {
            90 | 270 => (height, width),
            _ => (width, height),
        };

        Ok(Self {
            display,
            capabilities: DisplayCapabilities { width, height },
            brightness: config.brightness,
        })
    }
}

impl DisplaySurface for Ssd1306Driver {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        with_panel!(&mut self.display, panel => panel.init())
            .map_err(|e| DisplayError::InitializationFailed(format!("{:?}", e)))?;
        if let Some(value) = self.brightness {
            self.set_brightness(value)?;
        }
        info!("SSD1306 initialized ({}x{})", self.capabilities.width, self.capabilities.height);
        Ok(())
    }

    fn push(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        check_frame_size(&self.capabilities, frame)?;
        with_panel!(&mut self.display, panel => {
            panel.clear_buffer();
            panel.draw_iter(frame.lit_pixels())?;
            panel.flush()
        })?;
        debug!("SSD1306 flushed {} lit pixels", frame.count_on_pixels());
        Ok(())
    }

    fn set_brightness(&mut self, value: u8) -> Result<(), DisplayError> {
        let level = brightness_for(value);
        with_panel!(&mut self.display, panel => panel.set_brightness(level))?;
        self.brightness = Some(value);
        Ok(())
    }
}
