//! Synthetic camera source for tests and demo runs.

use anyhow::{anyhow, Result};
use std::time::SystemTime;

use super::CameraStream;
use crate::frame::Frame;

/// Generates synthetic frames for `stub://` URLs.
///
/// The pixel pattern shifts slowly over time so downstream stages see
/// something that changes like a real scene would.
pub struct SyntheticCamera {
    camera_id: String,
    url: String,
    width: u32,
    height: u32,
    frame_count: u64,
    connected: bool,
}

impl SyntheticCamera {
    pub fn new(camera_id: &str, url: &str, width: u32, height: u32) -> Self {
        Self {
            camera_id: camera_id.to_string(),
            url: url.to_string(),
            width,
            height,
            frame_count: 0,
            connected: false,
        }
    }

    fn generate_pixels(&self) -> Vec<u8> {
        let pixel_count = (self.width * self.height * 3) as usize; // RGB
        let mut pixels = vec![0u8; pixel_count];
        let shift = self.frame_count / 25;
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + shift) % 256) as u8;
        }
        pixels
    }
}

impl CameraStream for SyntheticCamera {
    fn camera_id(&self) -> &str {
        &self.camera_id
    }

    fn connect(&mut self) -> Result<()> {
        self.connected = true;
        log::info!("camera {}: connected to {} (synthetic)", self.camera_id, self.url);
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        if !self.connected {
            return Err(anyhow!("camera {} is not connected", self.camera_id));
        }
        self.frame_count += 1;
        Ok(Some(Frame {
            data: self.generate_pixels(),
            width: self.width,
            height: self.height,
            captured_at: SystemTime::now(),
            source: self.url.clone(),
        }))
    }

    fn disconnect(&mut self) {
        if self.connected {
            self.connected = false;
            log::info!("camera {}: stream closed", self.camera_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_frames_after_connect() {
        let mut camera = SyntheticCamera::new("cam_test", "stub://test", 640, 480);
        camera.connect().unwrap();

        let frame = camera.read_frame().unwrap().unwrap();
        assert_eq!(frame.width, 640);
        assert_eq!(frame.height, 480);
        assert_eq!(frame.data.len(), 640 * 480 * 3);
        assert_eq!(frame.source, "stub://test");
    }

    #[test]
    fn read_before_connect_fails() {
        let mut camera = SyntheticCamera::new("cam_test", "stub://test", 640, 480);
        assert!(camera.read_frame().is_err());
    }

    #[test]
    fn disconnect_is_idempotent() {
        let mut camera = SyntheticCamera::new("cam_test", "stub://test", 640, 480);
        camera.connect().unwrap();
        camera.disconnect();
        camera.disconnect();
        assert!(camera.read_frame().is_err());
    }
}
