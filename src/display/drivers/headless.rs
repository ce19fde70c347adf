/*
 *  display/drivers/headless.rs
 *
 *  PiStatus - host status at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Headless display surface - no hardware, frames kept in memory
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

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, info};

use crate::config::DisplayConfig;
use crate::display::error::DisplayError;
use crate::display::frame::Frame;
use crate::display::traits::{check_frame_size, DisplayCapabilities, DisplaySurface};

/// Display surface without a panel.
///
/// Useful for:
/// - Unit and integration tests
/// - Development without hardware (`driver: headless`, optionally with a
///   PBM snapshot path that is rewritten on every push)
///
/// All observable state lives behind a shared handle so tests can inspect
/// it after the surface has been moved into the refresh loop.
#[derive(Debug, Clone)]
pub struct HeadlessDriver {
    capabilities: DisplayCapabilities,
    snapshot: Option<PathBuf>,
    state: Arc<Mutex<HeadlessState>>,
}

/// Shared state for inspection
#[derive(Debug, Default)]
pub struct HeadlessState {
    /// Number of times init() was called
    pub init_count: usize,

    /// Number of frames accepted
    pub push_count: usize,

    /// Number of pushes rejected (simulated or size mismatch)
    pub failed_pushes: usize,

    /// Most recently accepted frame
    pub last_frame: Option<Frame>,

    /// Last brightness value set
    pub last_brightness: Option<u8>,

    /// Simulate failures (for error testing)
    pub simulate_push_failure: bool,
    pub simulate_init_failure: bool,
}

impl HeadlessDriver {
    pub fn new(config: &DisplayConfig) -> Result<Self, DisplayError> {
        let width = config.width.unwrap_or(128);
        let height = config.height.unwrap_or(64);
        let (width, height) = match config.rotate_deg.unwrap_or(0) {
            0 | 180 => (width, height),
            90 | 270 => (height, width),
            other => return Err(DisplayError::InvalidRotation(other)),
        };

        info!("Headless display {}x{}", width, height);
        if let Some(path) = config.snapshot.as_ref() {
            info!("Frames will be written to {}", path.display());
        }

        Ok(Self {
            capabilities: DisplayCapabilities { width, height },
            snapshot: config.snapshot.clone(),
            state: Arc::new(Mutex::new(HeadlessState::default())),
        })
    }

    /// Create a headless surface with specific dimensions
    pub fn new_with_size(width: u32, height: u32) -> Result<Self, DisplayError> {
        let config = DisplayConfig {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        };
        Self::new(&config)
    }

    /// Handle to the shared state
    pub fn state(&self) -> Arc<Mutex<HeadlessState>> {
        Arc::clone(&self.state)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HeadlessState>, DisplayError> {
        self.state
            .lock()
            .map_err(|_| DisplayError::Other("headless state lock poisoned".to_string()))
    }

    fn write_snapshot(&self, frame: &Frame) -> Result<(), DisplayError> {
        if let Some(path) = self.snapshot.as_ref() {
            let mut out = BufWriter::new(File::create(path)?);
            frame.write_pbm(&mut out)?;
            out.flush()?;
            debug!("snapshot written to {}", path.display());
        }
        Ok(())
    }
}

impl DisplaySurface for HeadlessDriver {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        let mut state = self.lock()?;
        if state.simulate_init_failure {
            return Err(DisplayError::InitializationFailed("simulated init failure".to_string()));
        }
        state.init_count += 1;
        Ok(())
    }

    fn push(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        let mut state = self.lock()?;
        if state.simulate_push_failure {
            state.failed_pushes += 1;
            return Err(DisplayError::Other("simulated push failure".to_string()));
        }
        // a frame only counts once everything it is written to has it
        if let Err(e) = check_frame_size(&self.capabilities, frame)
            .and_then(|()| self.write_snapshot(frame))
        {
            state.failed_pushes += 1;
            return Err(e);
        }
        state.push_count += 1;
        state.last_frame = Some(frame.clone());
        Ok(())
    }

    fn set_brightness(&mut self, value: u8) -> Result<(), DisplayError> {
        self.lock()?.last_brightness = Some(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::pixelcolor::BinaryColor;
    use embedded_graphics::prelude::*;
    use embedded_graphics::primitives::{Line, PrimitiveStyle};

    #[test]
    fn test_headless_creation() {
        let driver = HeadlessDriver::new_with_size(128, 64).unwrap();
        assert_eq!(driver.dimensions(), (128, 64));
        assert!(driver.state().lock().unwrap().last_frame.is_none());
    }

    #[test]
    fn test_rotation_swaps_dimensions() {
        let config = DisplayConfig {
            width: Some(128),
            height: Some(32),
            rotate_deg: Some(90),
            ..Default::default()
        };
        let driver = HeadlessDriver::new(&config).unwrap();
        assert_eq!(driver.dimensions(), (32, 128));

        let bad = DisplayConfig { rotate_deg: Some(45), ..Default::default() };
        assert!(matches!(HeadlessDriver::new(&bad), Err(DisplayError::InvalidRotation(45))));
    }

    #[test]
    fn test_headless_init() {
        let mut driver = HeadlessDriver::new_with_size(128, 64).unwrap();
        driver.init().unwrap();
        assert_eq!(driver.state().lock().unwrap().init_count, 1);

        driver.state().lock().unwrap().simulate_init_failure = true;
        assert!(driver.init().is_err());
    }

    #[test]
    fn test_push_keeps_last_frame() {
        let mut driver = HeadlessDriver::new_with_size(128, 64).unwrap();
        let mut frame = Frame::new(128, 64);
        Line::new(Point::new(0, 0), Point::new(10, 10))
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(&mut frame)
            .unwrap();

        driver.push(&frame).unwrap();

        let state = driver.state();
        let state = state.lock().unwrap();
        assert_eq!(state.push_count, 1);
        assert_eq!(state.last_frame.as_ref(), Some(&frame));
    }

    #[test]
    fn test_clear_pushes_blank_frame() {
        let mut driver = HeadlessDriver::new_with_size(64, 32).unwrap();
        driver.clear().unwrap();
        let state = driver.state();
        let state = state.lock().unwrap();
        assert_eq!(state.last_frame.as_ref().map(|f| f.count_on_pixels()), Some(0));
    }

    #[test]
    fn test_size_mismatch_is_rejected() {
        let mut driver = HeadlessDriver::new_with_size(128, 64).unwrap();
        let err = driver.push(&Frame::new(128, 32)).unwrap_err();
        assert!(matches!(err, DisplayError::FrameSizeMismatch { expected: (128, 64), actual: (128, 32) }));
        assert_eq!(driver.state().lock().unwrap().failed_pushes, 1);
    }

    #[test]
    fn test_simulated_push_failure() {
        let mut driver = HeadlessDriver::new_with_size(128, 64).unwrap();
        driver.state().lock().unwrap().simulate_push_failure = true;
        assert!(driver.push(&Frame::new(128, 64)).is_err());

        driver.state().lock().unwrap().simulate_push_failure = false;
        assert!(driver.push(&Frame::new(128, 64)).is_ok());
        assert_eq!(driver.state().lock().unwrap().push_count, 1);
    }

    #[test]
    fn test_snapshot_written() {
        let path = std::env::temp_dir().join(format!("pistatus-snapshot-{}.pbm", std::process::id()));
        let config = DisplayConfig {
            width: Some(8),
            height: Some(2),
            snapshot: Some(path.clone()),
            ..Default::default()
        };
        let mut driver = HeadlessDriver::new(&config).unwrap();
        driver.push(&Frame::new(8, 2)).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("P1\n8 2\n"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_failed_snapshot_is_not_counted() {
        let config = DisplayConfig {
            width: Some(8),
            height: Some(2),
            snapshot: Some(PathBuf::from("/nonexistent/pistatus/frame.pbm")),
            ..Default::default()
        };
        let mut driver = HeadlessDriver::new(&config).unwrap();
        let err = driver.push(&Frame::new(8, 2)).unwrap_err();
        assert!(matches!(err, DisplayError::Io(_)));

        let state = driver.state();
        let state = state.lock().unwrap();
        assert_eq!(state.push_count, 0);
        assert_eq!(state.failed_pushes, 1);
        assert!(state.last_frame.is_none());
    }
}
