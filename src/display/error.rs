/*
 *  display/error.rs
 *
 *  PiStatus - host status at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Unified error types for display subsystem
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
use std::error::Error;

/// Unified error type for all display operations
#[derive(Debug)]
pub enum DisplayError {
    /// Hardware initialization failed
    InitializationFailed(String),

    /// I2C communication error
    I2cError(String),

    /// Invalid configuration
    InvalidConfiguration(String),

    /// Unsupported operation for this display
    UnsupportedOperation,

    /// Invalid rotation angle
    InvalidRotation(u16),

    /// Frame does not match the panel
    FrameSizeMismatch { expected: (u32, u32), actual: (u32, u32) },

    /// Display interface error
    InterfaceError(display_interface::DisplayError),

    /// Snapshot or device file error
    Io(std::io::Error),

    /// Generic error with message
    Other(String),
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::InitializationFailed(msg) =>
                write!(f, "Display initialization failed: {}", msg),
            DisplayError::I2cError(msg) =>
                write!(f, "I2C communication error: {}", msg),
            DisplayError::InvalidConfiguration(msg) =>
                write!(f, "Invalid configuration: {}", msg),
            DisplayError::UnsupportedOperation =>
                write!(f, "Operation not supported by this display"),
            DisplayError::InvalidRotation(degrees) =>
                write!(f, "Invalid rotation angle: {} (must be 0, 90, 180, or 270)", degrees),
            DisplayError::FrameSizeMismatch { expected, actual } =>
                write!(f, "Frame size mismatch: expected {}x{}, got {}x{}",
                    expected.0, expected.1, actual.0, actual.1),
            DisplayError::InterfaceError(err) =>
                write!(f, "Display interface error: {:?}", err),
            DisplayError::Io(err) =>
                write!(f, "I/O error: {}", err),
            DisplayError::Other(msg) =>
                write!(f, "{}", msg),
        }
    }
}

impl Error for DisplayError {
    // display_interface::DisplayError doesn't implement std::error::Error
    // so only I/O errors carry a source
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DisplayError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<display_interface::DisplayError> for DisplayError {
    fn from(err: display_interface::DisplayError) -> Self {
        DisplayError::InterfaceError(err)
    }
}

impl From<std::io::Error> for DisplayError {
    fn from(err: std::io::Error) -> Self {
        DisplayError::Io(err)
    }
}

/// Factory error types
#[derive(Debug)]
pub enum DisplayFactoryError {
    /// Driver compiled out of this build
    DriverNotEnabled(&'static str),

    /// Display driver initialization failed
    DriverInitFailed(DisplayError),
}

impl fmt::Display for DisplayFactoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayFactoryError::DriverNotEnabled(feature) =>
                write!(f, "Display driver not enabled. Rebuild with --features {}", feature),
            DisplayFactoryError::DriverInitFailed(err) =>
                write!(f, "Driver initialization failed: {}", err),
        }
    }
}

impl Error for DisplayFactoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DisplayFactoryError::DriverInitFailed(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DisplayError> for DisplayFactoryError {
    fn from(err: DisplayError) -> Self {
        DisplayFactoryError::DriverInitFailed(err)
    }
}
