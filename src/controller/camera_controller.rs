use std::f32::consts::FRAC_PI_2;

use crate::model::Camera;

/// Handles camera orientation and zoom from mouse input
pub struct CameraController {
    pub look_sensitivity: f32,
    pub scroll_sensitivity: f32,
}

impl CameraController {
    pub fn new(look_sensitivity: f32, scroll_sensitivity: f32) -> Self {
        Self { look_sensitivity, scroll_sensitivity }
    }

    /// Apply mouse look delta to camera
    pub fn apply_look(&self, camera: &mut Camera, dx: f32, dy: f32) {
        camera.theta -= dx * self.look_sensitivity;
        camera.phi = (camera.phi + dy * self.look_sensitivity).clamp(-FRAC_PI_2, FRAC_PI_2);
    }

    /// Wheel moves the zoom radius; never reaches zero
    pub fn apply_zoom(&self, camera: &mut Camera, delta_y: f32) {
        camera.distance = (camera.distance - delta_y * self.scroll_sensitivity).max(f32::EPSILON);
    }
}
