/*
 *  display/factory.rs
 *
 *  PiStatus - host status at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Factory for creating display surfaces from configuration
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

use crate::config::{DisplayConfig, DriverKind};
use crate::display::drivers::headless::HeadlessDriver;
use crate::display::error::DisplayFactoryError;
use crate::display::traits::BoxedSurface;
use log::info;

#[cfg(feature = "driver-ssd1306")]
use crate::config::BusConfig;

#[cfg(feature = "driver-ssd1306")]
use crate::display::drivers::ssd1306::Ssd1306Driver;

/// Factory for creating display surfaces from configuration
pub struct DisplaySurfaceFactory;

impl DisplaySurfaceFactory {
    /// Create a display surface from configuration.
    ///
    /// The driver defaults to SSD1306 on `/dev/i2c-1` at 0x3C. The returned
    /// surface is opened but not initialised; call `init()` before pushing.
    ///
    /// ```ignore
    /// let config = DisplayConfig {
    ///     driver: Some(DriverKind::Headless),
    ///     ..Default::default()
    /// };
    /// let mut surface = DisplaySurfaceFactory::create_from_config(&config)?;
    /// surface.init()?;
    /// ```
    pub fn create_from_config(
        config: &DisplayConfig
    ) -> Result<BoxedSurface, DisplayFactoryError> {
        let driver_kind = config.driver.unwrap_or(DriverKind::Ssd1306);
        info!("Creating {:?} display surface", driver_kind);

        match driver_kind {
            DriverKind::Headless => Ok(Box::new(HeadlessDriver::new(config)?)),

            #[cfg(feature = "driver-ssd1306")]
            DriverKind::Ssd1306 => {
                let BusConfig::I2c { bus, address } = config.bus.clone().unwrap_or_default();
                Ok(Box::new(Ssd1306Driver::new_i2c(&bus, address, config)?))
            }

            #[cfg(not(feature = "driver-ssd1306"))]
            DriverKind::Ssd1306 => Err(DisplayFactoryError::DriverNotEnabled("driver-ssd1306")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::error::DisplayError;
    use crate::display::traits::DisplaySurface;

    #[test]
    fn test_create_headless_surface() {
        let config = DisplayConfig {
            driver: Some(DriverKind::Headless),
            width: Some(128),
            height: Some(32),
            ..Default::default()
        };
        let surface = DisplaySurfaceFactory::create_from_config(&config).unwrap();
        assert_eq!(surface.dimensions(), (128, 32));
    }

    #[test]
    fn test_bad_rotation_is_init_failure() {
        let config = DisplayConfig {
            driver: Some(DriverKind::Headless),
            rotate_deg: Some(45),
            ..Default::default()
        };
        let err = DisplaySurfaceFactory::create_from_config(&config).err();
        assert!(matches!(
            err,
            Some(DisplayFactoryError::DriverInitFailed(DisplayError::InvalidRotation(45)))
        ));
    }

    #[cfg(not(feature = "driver-ssd1306"))]
    #[test]
    fn test_disabled_driver_is_reported() {
        let err = DisplaySurfaceFactory::create_from_config(&DisplayConfig::default()).err();
        assert!(matches!(err, Some(DisplayFactoryError::DriverNotEnabled("driver-ssd1306"))));
    }
}
